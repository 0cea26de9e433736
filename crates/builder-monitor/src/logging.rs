//! Tracing subscriber setup

use crate::config::LogLevel;
use tracing_subscriber::EnvFilter;

/// AWS SDK crates are noisy below warn
const QUIET_TARGETS: &[&str] = &[
    "aws_config",
    "aws_sdk_appstream",
    "aws_sdk_dynamodb",
    "aws_sdk_sns",
    "aws_smithy_runtime",
    "aws_smithy_runtime_api",
    "hyper",
];

/// Build the filter: `RUST_LOG` if set, otherwise `LOG_LEVEL` with the AWS
/// SDK capped at warn.
pub fn env_filter(level: LogLevel) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    QUIET_TARGETS.iter().fold(
        EnvFilter::new(level.tracing_level().to_string()),
        |filter, target| match format!("{target}=warn").parse() {
            Ok(directive) => filter.add_directive(directive),
            Err(_) => filter,
        },
    )
}

/// Install the global fmt subscriber
pub fn init(level: LogLevel) {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(level))
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_includes_level_and_quiet_targets() {
        // Only meaningful when RUST_LOG is not set
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        let filter = env_filter(LogLevel::Debug).to_string().to_lowercase();
        assert!(filter.contains("debug"), "{filter}");
        assert!(filter.contains("aws_sdk_appstream=warn"), "{filter}");
    }
}
