//! Logging initialization for the CLI.
//!
//! The library only emits `tracing` events; the subscriber is installed here.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the subscriber. Output goes to stderr so stdout stays JSON.
///
/// # Arguments
/// * `verbosity` - 0 = WARN, 1 = INFO, 2 = DEBUG, 3+ = TRACE
/// * `json` - If true, log lines are JSON objects
pub fn init(verbosity: u8, json: bool) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(verbosity, rust_log.as_deref());

    let subscriber = tracing_subscriber::registry().with(filter);

    if json {
        subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        subscriber
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}

fn level_for(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// A valid `RUST_LOG` is used as is; otherwise `-v` sets the `esparse` level.
fn build_filter(verbosity: u8, rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(format!("warn,esparse={}", level_for(verbosity))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_sets_library_level() {
        let filter = build_filter(2, None).to_string().to_lowercase();
        assert!(filter.contains("esparse=debug"), "{filter}");
    }

    #[test]
    fn test_rust_log_wins() {
        let filter = build_filter(3, Some("esparse=error")).to_string().to_lowercase();
        assert!(filter.contains("esparse=error"), "{filter}");
        assert!(!filter.contains("trace"), "{filter}");
    }

    #[test]
    fn test_invalid_rust_log_falls_back() {
        let filter = build_filter(1, Some("esparse=loudest")).to_string().to_lowercase();
        assert!(filter.contains("esparse=info"), "{filter}");
    }
}
