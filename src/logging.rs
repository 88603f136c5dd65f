//! Diagnostic logging setup
//!
//! Progress lines go to stdout; tracing output goes to stderr so the two
//! never interleave on the same stream.

use clap::ValueEnum;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

/// Output format for log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Install the global subscriber. `RUST_LOG` overrides the default `info` level.
pub fn init(format: LogFormat) {
    let env_filter = build_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref());

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);

    // A subscriber may already be installed, e.g. by a test harness.
    let _ = match format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

/// Filter from `RUST_LOG`-style directives, `info` when none are given.
fn build_filter(directives: Option<&str>) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .parse_lossy(directives.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_formats_case_insensitively() {
        assert_eq!(LogFormat::from_str("json", true), Ok(LogFormat::Json));
        assert_eq!(LogFormat::from_str("Pretty", true), Ok(LogFormat::Pretty));
        assert!(LogFormat::from_str("xml", true).is_err());
    }

    #[test]
    fn defaults_to_info_without_directives() {
        assert_eq!(build_filter(None).to_string(), "info");
        assert_eq!(build_filter(Some("")).to_string(), "info");
    }

    #[test]
    fn env_directives_are_not_overridden() {
        let filter = build_filter(Some("debug"));
        assert_eq!(filter.to_string(), "debug");

        let filter = build_filter(Some("sentinel_smoke=trace"));
        assert!(filter.to_string().contains("sentinel_smoke=trace"));
        assert!(!filter.to_string().contains("info"));
    }

    #[test]
    fn init_twice_does_not_panic() {
        init(LogFormat::Pretty);
        init(LogFormat::Json);
    }
}
