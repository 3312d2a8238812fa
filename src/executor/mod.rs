//! Test execution engine
//!
//! The dispatcher fans groups out to isolated worker processes and joins on
//! all of them; the worker runs one group's suites sequentially inside such a
//! process.

mod dispatcher;
mod worker;

pub use dispatcher::{SelfLauncher, WorkerDispatcher, WorkerLauncher};
pub use worker::GroupWorker;
