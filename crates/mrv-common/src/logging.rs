//! Process-wide tracing setup.
//!
//! `init` installs the global subscriber the first time it is called; later
//! calls return without touching it. `RUST_LOG`, when set, takes precedence
//! over the configured level.

use std::str::FromStr;
use std::sync::Once;

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            other => Err(format!(
                "Invalid log format: {}. Must be one of: [\"json\", \"pretty\"]",
                other
            )),
        }
    }
}

/// Parse a log level name, falling back to INFO.
pub fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Filter from `RUST_LOG`-style directives, or `level` when they are absent or invalid.
pub fn build_filter(level: Level, directives: Option<&str>) -> EnvFilter {
    directives
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::default().add_directive(level.into()))
}

/// Install the global subscriber once per process.
pub fn init(level: Level, format: LogFormat) {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
        let builder = tracing_subscriber::fmt()
            .with_env_filter(build_filter(level, rust_log.as_deref()))
            .with_target(true)
            .with_writer(std::io::stderr);

        // try_init: a subscriber installed elsewhere (e.g. by a test harness) wins.
        let _ = match format {
            LogFormat::Json => builder.json().try_init(),
            LogFormat::Pretty => builder.pretty().try_init(),
        };
    });
}
