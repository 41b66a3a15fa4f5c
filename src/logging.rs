//! Logging setup, powered by tracing-subscriber.
//!
//! Log output goes to stderr so the interactive surface on stdout stays clean.

use tracing_subscriber::EnvFilter;

/// Log format type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON Lines format for structured logging
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "compact" => Ok(LogFormat::Text),
            "json" | "jsonl" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

/// Build the filter from `RUST_LOG`, or `default_level` with noisy crates quieted.
fn build_env_filter(default_level: &str) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }

    let mut directives = vec![default_level.to_string()];
    for (target, level) in [("hyper", "warn"), ("hyper_util", "warn"), ("reqwest", "warn"), ("h2", "warn")] {
        directives.push(format!("{}={}", target, level));
    }
    EnvFilter::new(directives.join(","))
}

/// Install the global subscriber.
///
/// Returns an error if a subscriber is already installed.
pub fn init(format: LogFormat, default_level: &str) -> anyhow::Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(build_env_filter(default_level))
        .with_writer(std::io::stderr)
        .with_target(false);

    match format {
        LogFormat::Text => builder
            .compact()
            .try_init()
            .map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e)),
        LogFormat::Json => builder
            .json()
            .try_init()
            .map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e)),
    }
}
