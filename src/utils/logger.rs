//! Logging setup
//!
//! Logs go to stderr so the report on stdout stays machine-readable.

use std::str::FromStr;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Pick the default level. A valid `--log-level` wins over `--verbose`;
/// an unknown level name is ignored.
pub fn resolve_level(explicit: Option<&str>, verbose: bool) -> Level {
    match explicit.map(Level::from_str) {
        Some(Ok(level)) => level,
        _ if verbose => Level::DEBUG,
        _ => Level::INFO,
    }
}

fn directive(level: Level) -> String {
    format!(
        "{}={}",
        env!("CARGO_PKG_NAME"),
        level.as_str().to_ascii_lowercase()
    )
}

/// Install the global subscriber; `RUST_LOG` takes precedence over `level`
pub fn init_logger(level: Level) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive(level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_level() {
        assert_eq!(resolve_level(None, false), Level::INFO);
        assert_eq!(resolve_level(None, true), Level::DEBUG);
        assert_eq!(resolve_level(Some("warn"), true), Level::WARN);
        assert_eq!(resolve_level(Some("TRACE"), false), Level::TRACE);
        assert_eq!(resolve_level(Some("loud"), false), Level::INFO);
    }

    #[test]
    fn test_directive_targets_crate() {
        assert_eq!(directive(Level::WARN), "partest=warn");
    }
}
