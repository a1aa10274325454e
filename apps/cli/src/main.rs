use std::{path::PathBuf, time::Duration};

use anyhow::Result;
use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use joinwatch_core::{AggregatorConfig, MetricAggregator, events::BusConfig, get_root_data_dir};
use tracing::{error, info};

use crate::pipeline::{PipelineSettings, start_pipeline};

mod model;
mod pipeline;
mod telemetry;
mod workers;

#[derive(Parser)]
#[command(name = "joinwatch")]
#[command(about = "Score a synthetic feature stream and track the live RMSE against ground truth")]
struct Cli {
    /// Directory holding log.txt and errors.txt
    #[arg(long, env = "JOINWATCH_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// JSON model file (`{"weights": [...], "intercept": ...}`); built-in model if omitted
    #[arg(long, env = "JOINWATCH_MODEL")]
    model: Option<PathBuf>,

    /// Milliseconds between generated samples
    #[arg(long, env = "JOINWATCH_INTERVAL_MS", default_value_t = 2000)]
    interval_ms: u64,

    /// Evict the oldest half-joined key beyond this many
    #[arg(long, env = "JOINWATCH_MAX_PENDING")]
    max_pending: Option<usize>,

    /// Fixed generator seed
    #[arg(long, env = "JOINWATCH_SEED")]
    seed: Option<u64>,

    /// Default log filter when RUST_LOG is unset
    #[arg(long, env = "JOINWATCH_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Treat publishing to a topic with no subscriber as an error
    #[arg(long, env = "JOINWATCH_STRICT_ROUTING")]
    strict_routing: bool,
}

fn create_spinner(msg: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")?,
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    Ok(pb)
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("{} {}", style("Error:").red().bold(), message);
    std::process::exit(1);
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init(&cli.log_level)?;

    println!(
        "\n{}  {}\n",
        style("joinwatch").cyan().bold(),
        style("Live RMSE").dim()
    );

    let scorer = match model::load_scorer(cli.model.as_deref()).await {
        Ok(scorer) => scorer,
        Err(e) => fail(e),
    };

    let config = AggregatorConfig::new(cli.data_dir.unwrap_or_else(get_root_data_dir))
        .with_max_pending(cli.max_pending);

    let spinner = create_spinner("Replaying event log...")?;
    let (aggregator, report) = match MetricAggregator::open(&config).await {
        Ok(opened) => opened,
        Err(e) => {
            spinner.finish_and_clear();
            fail(e);
        }
    };
    spinner.finish_with_message(format!(
        "{} Recovered {} events, {} pairs, RMSE {} {}",
        style("✓").green().bold(),
        report.events_replayed,
        report.completed_pairs,
        style(format!("{:.4}", report.rmse)).cyan(),
        style(format!("[{}]", config.data_dir.display())).dim()
    ));
    println!("{}", style("─".repeat(60)).dim());

    let mut handle = start_pipeline(
        PipelineSettings {
            bus: BusConfig {
                strict_routing: cli.strict_routing,
                ..BusConfig::default()
            },
            interval: Duration::from_millis(cli.interval_ms),
            seed: cli.seed,
        },
        aggregator,
        scorer,
    )?;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("interrupted");
            handle.shutdown().await;
            println!("{}", style("─".repeat(60)).dim());
            println!("{} {}", style("Stopped.").dim(), style(config.errors_path().display()).cyan());
            Ok(())
        }
        failed = &mut handle.failed_rx => {
            handle.shutdown().await;
            match failed {
                Ok(failed) => {
                    error!(stage = failed.stage, "pipeline stopped");
                    fail(format!("{} failed: {}", failed.stage, failed.message));
                }
                Err(_) => fail("pipeline stopped without a failure report"),
            }
        }
    }
}
