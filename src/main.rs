use anyhow::Result;

use tick_spectra::cli::{self, Command};
use tick_spectra::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = cli::parse_command(&args)?;
    if command == Command::Help {
        cli::print_usage();
        return Ok(());
    }

    // Install rustls crypto provider (required by rustls 0.23+)
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {:#}", e);
            eprintln!("Copy config/default.toml or point TICK_SPECTRA_CONFIG at a config file");
            std::process::exit(1);
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        config
            .logging
            .level
            .parse()
            .unwrap_or_else(|_| "info".parse().unwrap())
    });
    if config.logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    tracing::info!(
        symbol = %config.binance.symbol,
        freq = %config.pipeline.freq,
        window_size = config.pipeline.window_size,
        ?command,
        "Starting tick-spectra"
    );

    cli::run(command, &config).await
}
