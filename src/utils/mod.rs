//! Shared utilities

pub mod logger;
mod timer;

pub use timer::Timer;
