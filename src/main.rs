//! dcvcheck - DNS CNAME domain-control validation batch checker
//!
//! Records are read from standard input (or `--input`), results go to
//! standard output, and diagnostics and logs go to standard error.

use anyhow::{Context, Result};
use clap::Parser;
use dcvcheck::{cli::Cli, config::Config, ValidationPool};
use tokio::io::BufReader;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration by layering sources: defaults, file, environment, and CLI args.
    let config = Config::load(&cli).unwrap_or_else(|err| {
        // Logging is not configured yet, so set it up just for this error.
        init_logging("error");
        error!("Failed to load configuration: {:#}", err);
        std::process::exit(2);
    });

    init_logging(&config.log_level);

    info!("-------------------- Configuration --------------------");
    info!("Workers: {}", config.workers);
    info!("Queue Capacity: {}", config.performance.queue_capacity);
    info!("DNS Resolver: {}", config.dns.resolver);
    info!("DNS Timeout: {}ms", config.dns.timeout_ms);
    info!("CNAME Suffix: {}", config.validation.cname_suffix);
    info!("Output Format: {}", config.output.format);
    match &config.input {
        Some(path) => info!("Input: {}", path.display()),
        None => info!("Input: stdin"),
    }
    info!("-------------------------------------------------------");

    let input = config.input.clone();
    let pool = ValidationPool::builder(config).build().await?;

    let summary = match input {
        Some(path) => {
            let file = tokio::fs::File::open(&path)
                .await
                .with_context(|| format!("failed to open input file {}", path.display()))?;
            pool.run(BufReader::new(file)).await?
        }
        None => pool.run(BufReader::new(tokio::io::stdin())).await?,
    };

    if summary.panicked_tasks > 0 {
        anyhow::bail!("{} tasks panicked during the run", summary.panicked_tasks);
    }
    Ok(())
}
