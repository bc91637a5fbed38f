//! Settle-up command line tool
//!
//! Usage: `settle <request.json|request.toml> [config.toml]`
//!
//! Without a config file the configuration is read from `SETTLE_*`
//! environment variables. The plan is printed to stdout as JSON.

use anyhow::{bail, Context};
use debt_settlement::{Config, SettlementEngine, SettlementRequest};

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let Some(request_path) = args.next() else {
        bail!("usage: settle <request.json|request.toml> [config.toml]");
    };

    // Load configuration
    let config = match args.next() {
        Some(path) => Config::from_file(&path)
            .with_context(|| format!("failed to load config from {}", path))?,
        None => Config::from_env().context("failed to load config from environment")?,
    };
    let pretty = config.output.pretty_print;

    let request = SettlementRequest::from_file(&request_path)
        .with_context(|| format!("failed to read request {}", request_path))?;

    let engine = SettlementEngine::new(config)?;
    let plan = engine.settle(&request)?;

    let output = if pretty {
        serde_json::to_string_pretty(&plan)?
    } else {
        serde_json::to_string(&plan)?
    };
    println!("{}", output);

    Ok(())
}
