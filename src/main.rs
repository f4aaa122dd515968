use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{Cli, Commands};
use gradr::config::Config;
use gradr::lms::HttpLmsClient;
use gradr::probe::{AvailabilityProber, ProbeOutcome};
use gradr::review::{GeminiConfig, GeminiReviewer};
use gradr::runner::{BatchRunner, RunOutcome, RunReport};
use gradr::throttle::TokioSleeper;

fn setup_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn print_banner(config: &Config) {
    println!("{}", "Gradr - automated assignment review".bold());
    println!("  Batch size: {}", config.batch_size);
    println!(
        "  Delay between requests: {:.1}-{:.1}s",
        config.min_delay_between_requests, config.max_delay_between_requests
    );
    println!(
        "  Delay between batches: {:.1}-{:.1}s",
        config.min_delay_between_batches, config.max_delay_between_batches
    );
    println!("  Max retries: {}", config.max_retries);
    if config.review_enabled() {
        println!("  AI review: {}", "enabled".green());
    } else {
        println!("  AI review: {}", "disabled (GEMINI_API_KEY not set)".yellow());
    }
    println!();
}

fn print_report(report: &RunReport) {
    let stats = &report.stats;
    println!();
    match &report.outcome {
        RunOutcome::Completed => println!("{}", "Run completed".green().bold()),
        RunOutcome::Aborted(reason) => {
            println!("{} {}", "Run aborted:".red().bold(), reason)
        }
    }
    println!(
        "  Finished at: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    println!("  Elapsed: {:.1}s", stats.elapsed().as_secs_f64());
    println!("  Processed: {}", stats.processed);
    println!("    Reviewed: {}", stats.reviewed);
    println!("    Missing file: {}", stats.missing_file);
    println!("    Legacy document: {}", stats.legacy_document);
    println!("    Invalid format: {}", stats.invalid_format);
    println!("  Failed: {}", stats.failed);
    for item in &stats.failed_items {
        println!("    {} {}", "✗".red(), item);
    }
}

async fn run_probe(config: &Config) -> Result<()> {
    let client = Arc::new(HttpLmsClient::new(config).context("Failed to build LMS client")?);
    let prober = AvailabilityProber::new(client);

    match prober.probe().await {
        ProbeOutcome::Available => println!("{}", "API is accessible".green()),
        ProbeOutcome::RateLimited { wait_minutes } => match wait_minutes {
            Some(minutes) => println!(
                "{} server says wait {minutes:.2} minutes",
                "Rate limited:".red()
            ),
            None => println!("{}", "Rate limited: no wait hint given".red()),
        },
        ProbeOutcome::Other(reason) => println!("{} {reason}", "API unavailable:".red()),
    }

    Ok(())
}

async fn run_batch(config: Config) -> Result<()> {
    if !config.review_enabled() {
        eyre::bail!("GEMINI_API_KEY must be set to run a grading pass");
    }

    let client = Arc::new(HttpLmsClient::new(&config).context("Failed to build LMS client")?);
    let reviewer = Arc::new(
        GeminiReviewer::new(
            config.gemini_api_key.clone(),
            GeminiConfig::with_model(config.gemini_model.clone()),
        )
        .context("Failed to build reviewer")?,
    );
    let sleeper = Arc::new(TokioSleeper);

    let runner = BatchRunner::new(client, reviewer, sleeper, config);
    let report = runner.run().await;

    print_report(&report);
    if report.outcome.is_aborted() {
        std::process::exit(1);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let config = Config::from_env();
    config.validate().context("Invalid configuration")?;
    print_banner(&config);

    match cli.command {
        Some(Commands::Probe) => run_probe(&config).await,
        Some(Commands::Run) | None => run_batch(config).await,
    }
}
