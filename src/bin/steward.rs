use anyhow::Context;
use std::path::PathBuf;
use std::sync::Arc;
use steward::{BotConfig, Journal, SimConnector, Supervisor};
use tracing_subscriber::EnvFilter;

fn usage() -> ! {
    eprintln!("Usage: steward [--config PATH]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config PATH   Configuration file, TOML or YAML (default: steward.toml)");
    eprintln!("  --help          Show this help");
    std::process::exit(2);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut config_path = PathBuf::from("steward.toml");
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                config_path = args.next().map(PathBuf::from).unwrap_or_else(|| usage());
            }
            "--help" | "-h" => usage(),
            other => {
                eprintln!("Unknown argument: {}", other);
                usage();
            }
        }
    }

    let config = if config_path.exists() {
        BotConfig::load(&config_path)
            .with_context(|| format!("loading {}", config_path.display()))?
    } else {
        tracing::warn!(path = %config_path.display(), "config file not found, using defaults");
        BotConfig::standard()
    };

    let journal = Journal::open(&config.journal_path)
        .with_context(|| format!("opening journal {}", config.journal_path.display()))?;
    journal.record("steward starting");

    let supervisor = Supervisor::new(Arc::new(SimConnector), Arc::new(config), journal);
    supervisor.run().await;
    Ok(())
}
