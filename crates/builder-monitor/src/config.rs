//! Monitor configuration
//!
//! Every setting is bound to an environment variable so the binary can be
//! driven entirely by its scheduler's environment. Values are validated
//! once at start-up and handed to the monitor as a [`MonitorConfig`].

use crate::error::ConfigError;
use builder_monitor_common::{BuilderKind, Thresholds};
use std::str::FromStr;
use tracing::{debug, warn};

/// Raw settings as read from the command line and environment
#[derive(clap::Args, Debug, Clone)]
pub struct ConfigArgs {
    /// DynamoDB table tracking active app block builders
    #[arg(long, env = "ABB_TABLE_NAME")]
    pub abb_table_name: String,

    /// Hours an app block builder may be active before notifications start (<= 0 disables)
    #[arg(long, env = "ABB_NOTIFY_HOURS", allow_negative_numbers = true)]
    pub abb_notify_hours: f64,

    /// Minimum hours between two notifications for one app block builder
    #[arg(long, env = "ABB_NOTIFY_INTERVAL_HOURS", allow_negative_numbers = true)]
    pub abb_notify_interval_hours: f64,

    /// Hours an app block builder may be active before it is stopped (<= 0 disables)
    #[arg(long, env = "ABB_STOP_HOURS", allow_negative_numbers = true)]
    pub abb_stop_hours: f64,

    /// Notify when stopping an app block builder ("Yes" or "No")
    #[arg(long, env = "ABB_STOP_NOTIFY")]
    pub abb_stop_notify: String,

    /// DynamoDB table tracking active image builders
    #[arg(long, env = "IB_TABLE_NAME")]
    pub ib_table_name: String,

    /// Hours an image builder may be active before notifications start (<= 0 disables)
    #[arg(long, env = "IB_NOTIFY_HOURS", allow_negative_numbers = true)]
    pub ib_notify_hours: f64,

    /// Minimum hours between two notifications for one image builder
    #[arg(long, env = "IB_NOTIFY_INTERVAL_HOURS", allow_negative_numbers = true)]
    pub ib_notify_interval_hours: f64,

    /// Hours an image builder may be active before it is stopped (<= 0 disables)
    #[arg(long, env = "IB_STOP_HOURS", allow_negative_numbers = true)]
    pub ib_stop_hours: f64,

    /// Notify when stopping an image builder ("Yes" or "No")
    #[arg(long, env = "IB_STOP_NOTIFY")]
    pub ib_stop_notify: String,

    /// SNS topic receiving notifications
    #[arg(long, env = "SNS_TOPIC_ARN")]
    pub sns_topic_arn: String,

    /// Log severity (DEBUG, INFO, WARNING, ERROR, CRITICAL)
    #[arg(long, env = "LOG_LEVEL")]
    pub log_level: String,

    /// Home region; selects the partition whose regions are monitored
    #[arg(long = "home-region", env = "AWS_REGION")]
    pub home_region: String,
}

/// Log severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum LogLevel {
    #[display("DEBUG")]
    Debug,
    #[display("INFO")]
    Info,
    #[display("WARNING")]
    Warning,
    #[display("ERROR")]
    Error,
    #[display("CRITICAL")]
    Critical,
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARNING" | "WARN" => Ok(LogLevel::Warning),
            "ERROR" => Ok(LogLevel::Error),
            "CRITICAL" => Ok(LogLevel::Critical),
            _ => Err(ConfigError::InvalidLogLevel(s.to_string())),
        }
    }
}

impl LogLevel {
    /// Equivalent `tracing` level (there is no separate critical level)
    pub fn tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warning => tracing::Level::WARN,
            LogLevel::Error | LogLevel::Critical => tracing::Level::ERROR,
        }
    }
}

/// Interpret a `*_STOP_NOTIFY` value.
///
/// Only the exact strings `Yes` and `No` are recognized; anything else keeps
/// stop notifications enabled.
pub fn parse_stop_notify(variable: &str, value: &str) -> bool {
    match value {
        "Yes" => true,
        "No" => false,
        other => {
            warn!(
                variable,
                value = other,
                "Unsupported stop-notify value, defaulting to enabled"
            );
            true
        }
    }
}

/// Settings for one builder kind
#[derive(Debug, Clone, PartialEq)]
pub struct KindConfig {
    pub kind: BuilderKind,
    pub table_name: String,
    pub thresholds: Thresholds,
}

impl KindConfig {
    fn from_raw(
        kind: BuilderKind,
        table_name: &str,
        notify_hours: f64,
        notify_interval_hours: f64,
        stop_hours: f64,
        stop_notify: &str,
    ) -> Result<Self, ConfigError> {
        let var = |suffix: &str| format!("{}_{suffix}", kind.env_prefix());

        if table_name.trim().is_empty() {
            return Err(ConfigError::Empty(var("TABLE_NAME")));
        }
        for (suffix, value) in [
            ("NOTIFY_HOURS", notify_hours),
            ("NOTIFY_INTERVAL_HOURS", notify_interval_hours),
            ("STOP_HOURS", stop_hours),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::InvalidHours {
                    name: var(suffix),
                    value,
                });
            }
        }

        Ok(Self {
            kind,
            table_name: table_name.to_string(),
            thresholds: Thresholds {
                stop_after_hours: stop_hours,
                notify_after_hours: notify_hours,
                notify_interval_hours,
                stop_notify: parse_stop_notify(&var("STOP_NOTIFY"), stop_notify),
            },
        })
    }

    fn log_resolved(&self) {
        let prefix = self.kind.env_prefix();
        let t = &self.thresholds;
        debug!("{prefix}_TABLE_NAME: {}", self.table_name);
        debug!(
            "{prefix}_NOTIFY_HOURS: {}{}",
            t.notify_after_hours,
            disabled_suffix(t.notify_enabled())
        );
        debug!("{prefix}_NOTIFY_INTERVAL_HOURS: {}", t.notify_interval_hours);
        debug!(
            "{prefix}_STOP_HOURS: {}{}",
            t.stop_after_hours,
            disabled_suffix(t.stop_enabled())
        );
        debug!(
            "{prefix}_STOP_NOTIFY: {}{}",
            t.stop_notify,
            disabled_suffix(t.stop_notify)
        );
    }
}

fn disabled_suffix(enabled: bool) -> &'static str {
    if enabled { "" } else { " (disabled)" }
}

/// Validated configuration of one monitoring pass
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    pub app_block_builders: KindConfig,
    pub image_builders: KindConfig,
    pub sns_topic_arn: String,
    pub home_region: String,
    pub log_level: LogLevel,
}

impl MonitorConfig {
    pub fn from_args(args: &ConfigArgs) -> Result<Self, ConfigError> {
        let log_level = args.log_level.parse()?;

        if args.sns_topic_arn.trim().is_empty() {
            return Err(ConfigError::Empty("SNS_TOPIC_ARN".to_string()));
        }
        if args.home_region.trim().is_empty() {
            return Err(ConfigError::Empty("AWS_REGION".to_string()));
        }

        Ok(Self {
            app_block_builders: KindConfig::from_raw(
                BuilderKind::AppBlockBuilder,
                &args.abb_table_name,
                args.abb_notify_hours,
                args.abb_notify_interval_hours,
                args.abb_stop_hours,
                &args.abb_stop_notify,
            )?,
            image_builders: KindConfig::from_raw(
                BuilderKind::ImageBuilder,
                &args.ib_table_name,
                args.ib_notify_hours,
                args.ib_notify_interval_hours,
                args.ib_stop_hours,
                &args.ib_stop_notify,
            )?,
            sns_topic_arn: args.sns_topic_arn.clone(),
            home_region: args.home_region.clone(),
            log_level,
        })
    }

    /// Settings for a builder kind
    pub fn kind(&self, kind: BuilderKind) -> &KindConfig {
        match kind {
            BuilderKind::AppBlockBuilder => &self.app_block_builders,
            BuilderKind::ImageBuilder => &self.image_builders,
        }
    }

    /// Log every resolved value at debug level
    pub fn log_resolved(&self) {
        debug!("Version: {}", env!("CARGO_PKG_VERSION"));
        for kind in BuilderKind::ALL {
            self.kind(kind).log_resolved();
        }
        debug!("SNS_TOPIC_ARN: {}", self.sns_topic_arn);
        debug!("AWS_REGION: {}", self.home_region);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser, Debug)]
    struct TestCli {
        #[command(flatten)]
        config: ConfigArgs,
    }

    fn parse(extra: &[&str]) -> Result<ConfigArgs, clap::Error> {
        let mut argv = vec![
            "builder-monitor",
            "--abb-table-name",
            "abb-tracking",
            "--abb-notify-hours",
            "2",
            "--abb-notify-interval-hours",
            "1",
            "--abb-stop-hours",
            "4",
            "--abb-stop-notify",
            "Yes",
            "--ib-table-name",
            "ib-tracking",
            "--ib-notify-hours",
            "-1",
            "--ib-notify-interval-hours",
            "24",
            "--ib-stop-hours",
            "0",
            "--ib-stop-notify",
            "No",
            "--sns-topic-arn",
            "arn:aws:sns:us-east-1:123456789012:builders",
            "--home-region",
            "us-east-1",
        ];
        argv.extend_from_slice(extra);
        if !extra.contains(&"--log-level") {
            argv.extend_from_slice(&["--log-level", "INFO"]);
        }
        TestCli::try_parse_from(argv).map(|cli| cli.config)
    }

    #[test]
    fn test_full_config() {
        let config = MonitorConfig::from_args(&parse(&[]).unwrap()).unwrap();

        let abb = &config.app_block_builders;
        assert_eq!(abb.table_name, "abb-tracking");
        assert_eq!(abb.thresholds.notify_after_hours, 2.0);
        assert_eq!(abb.thresholds.notify_interval_hours, 1.0);
        assert_eq!(abb.thresholds.stop_after_hours, 4.0);
        assert!(abb.thresholds.stop_notify);

        let ib = config.kind(BuilderKind::ImageBuilder);
        assert_eq!(ib.table_name, "ib-tracking");
        assert!(!ib.thresholds.notify_enabled());
        assert!(!ib.thresholds.stop_enabled());
        assert!(!ib.thresholds.stop_notify);

        assert_eq!(config.log_level, LogLevel::Info);
        assert_eq!(config.home_region, "us-east-1");
    }

    #[test]
    fn test_missing_required_value() {
        let err = TestCli::try_parse_from(["builder-monitor", "--abb-table-name", "t"]);
        assert!(err.is_err());
    }

    #[test]
    fn test_unparseable_hours_rejected() {
        let err = TestCli::try_parse_from([
            "builder-monitor",
            "--abb-notify-hours",
            "soon",
        ]);
        assert!(err.is_err());
    }

    #[test]
    fn test_nan_hours_rejected() {
        let mut args = parse(&[]).unwrap();
        args.ib_stop_hours = f64::NAN;
        assert!(matches!(
            MonitorConfig::from_args(&args),
            Err(ConfigError::InvalidHours { name, .. }) if name == "IB_STOP_HOURS"
        ));

        let mut args = parse(&[]).unwrap();
        args.abb_notify_interval_hours = f64::INFINITY;
        assert!(matches!(
            MonitorConfig::from_args(&args),
            Err(ConfigError::InvalidHours { name, .. }) if name == "ABB_NOTIFY_INTERVAL_HOURS"
        ));
    }

    #[test]
    fn test_empty_table_name_rejected() {
        let mut args = parse(&[]).unwrap();
        args.abb_table_name = " ".to_string();
        let err = MonitorConfig::from_args(&args).unwrap_err();
        assert_eq!(err.to_string(), "ABB_TABLE_NAME cannot be empty");

        let mut args = parse(&[]).unwrap();
        args.ib_table_name = String::new();
        let err = MonitorConfig::from_args(&args).unwrap_err();
        assert_eq!(err.to_string(), "IB_TABLE_NAME cannot be empty");
    }

    #[test]
    fn test_log_levels() {
        assert_eq!("debug".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert_eq!("WARNING".parse::<LogLevel>().unwrap(), LogLevel::Warning);
        assert_eq!("Warn".parse::<LogLevel>().unwrap(), LogLevel::Warning);
        assert_eq!(
            "CRITICAL".parse::<LogLevel>().unwrap().tracing_level(),
            tracing::Level::ERROR
        );
        assert!(matches!(
            "VERBOSE".parse::<LogLevel>(),
            Err(ConfigError::InvalidLogLevel(_))
        ));
    }

    #[test]
    fn test_invalid_log_level_is_fatal() {
        let args = parse(&["--log-level", "LOUD"]).unwrap();
        assert!(matches!(
            MonitorConfig::from_args(&args),
            Err(ConfigError::InvalidLogLevel(level)) if level == "LOUD"
        ));
    }

    #[test]
    fn test_stop_notify_values() {
        assert!(parse_stop_notify("IB_STOP_NOTIFY", "Yes"));
        assert!(!parse_stop_notify("IB_STOP_NOTIFY", "No"));
        // Case-sensitive; unknown values fall back to enabled
        assert!(parse_stop_notify("IB_STOP_NOTIFY", "no"));
        assert!(parse_stop_notify("IB_STOP_NOTIFY", ""));
    }

    #[test]
    fn test_disabled_suffix() {
        assert_eq!(disabled_suffix(true), "");
        assert_eq!(disabled_suffix(false), " (disabled)");
    }
}
