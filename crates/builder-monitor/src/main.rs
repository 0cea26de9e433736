//! builder-monitor: notifies about and stops long-running AppStream 2.0 builders
//!
//! Intended to be run on a schedule. Each `run` is one monitoring pass over
//! every AppStream 2.0 region of the home partition.

use anyhow::Result;
use builder_monitor::aws::select_regions;
use builder_monitor::config::{ConfigArgs, LogLevel, MonitorConfig};
use builder_monitor::{logging, monitor};
use builder_monitor_common::BuilderKind;
use clap::{Parser, Subcommand};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "builder-monitor")]
#[command(about = "Notify about and stop long-running AppStream 2.0 builders")]
#[command(version)]
struct Args {
    #[command(flatten)]
    config: ConfigArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one monitoring pass
    Run {
        /// Only monitor these regions (repeatable; default: all regions of the partition)
        #[arg(long = "region")]
        regions: Vec<String>,

        /// Print the pass report as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Print the resolved configuration and the regions that would be monitored
    ShowConfig,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&e);
        std::process::exit(1);
    }
}

/// Print error in a user-friendly way
fn print_error(e: &anyhow::Error) {
    use std::io::Write;

    let mut stderr = std::io::stderr();

    let _ = writeln!(stderr, "\n\x1b[1;31mError:\x1b[0m {e}");

    // Print error chain (causes)
    let mut source = e.source();
    while let Some(cause) = source {
        let _ = writeln!(stderr, "  \x1b[33mCaused by:\x1b[0m {cause}");
        source = cause.source();
    }

    if std::env::var("RUST_BACKTRACE").is_err() {
        let _ = writeln!(
            stderr,
            "\n\x1b[2mSet RUST_BACKTRACE=1 for a detailed backtrace\x1b[0m"
        );
    } else {
        let backtrace = e.backtrace();
        if backtrace.status() == std::backtrace::BacktraceStatus::Captured {
            let _ = writeln!(stderr, "\n\x1b[2mBacktrace:\x1b[0m\n{backtrace}");
        }
    }
}

async fn run() -> Result<()> {
    let args = Args::parse();

    // Logging comes first so configuration warnings are visible
    let log_level: LogLevel = args.config.log_level.parse()?;
    logging::init(log_level);

    let config = MonitorConfig::from_args(&args.config)?;
    config.log_resolved();

    match args.command {
        Command::Run { regions, json } => {
            let regions = select_regions(&config.home_region, &regions)?;
            let report = monitor::run(&config, &regions).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            if report.failures() > 0 || report.listing_failures() > 0 {
                info!(
                    failures = report.failures(),
                    listing_failures = report.listing_failures(),
                    "Some builders were not processed; the next pass will retry"
                );
            }
        }

        Command::ShowConfig => {
            let regions = select_regions(&config.home_region, &[])?;
            print_config(&config, &regions);
        }
    }

    Ok(())
}

/// Print the resolved configuration
fn print_config(config: &MonitorConfig, regions: &[String]) {
    println!(
        "{:<20} {:<30} {:>8} {:>10} {:>8} {:>12}",
        "KIND", "TABLE", "NOTIFY_H", "INTERVAL_H", "STOP_H", "STOP_NOTIFY"
    );
    println!("{}", "-".repeat(93));
    for kind in BuilderKind::ALL {
        let settings = config.kind(kind);
        let t = &settings.thresholds;
        println!(
            "{:<20} {:<30} {:>8} {:>10} {:>8} {:>12}",
            kind.to_string(),
            settings.table_name,
            hours_or_off(t.notify_after_hours),
            t.notify_interval_hours,
            hours_or_off(t.stop_after_hours),
            if t.stop_notify { "Yes" } else { "No" },
        );
    }
    println!();
    println!("SNS topic:   {}", config.sns_topic_arn);
    println!("Log level:   {}", config.log_level);
    println!("Home region: {}", config.home_region);
    println!("Regions:     {}", regions.join(", "));
}

fn hours_or_off(hours: f64) -> String {
    if hours > 0.0 {
        hours.to_string()
    } else {
        "off".to_string()
    }
}
