use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use tokio::sync::watch;

use crate::binance::recorder::TradeRecorder;
use crate::binance::rest::BinanceRestClient;
use crate::config::Config;
use crate::imbalance::orderbook_imbalance;
use crate::pipeline::FeaturePipeline;
use crate::storage;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Pull `minutes` of aggregate trades (or, with `--recent`, the latest
    /// trades page) and store ticks plus bars.
    Fetch { minutes: Option<u64>, recent: bool },
    /// Run the feature pipeline over a tick CSV.
    Features { input: PathBuf, output: Option<PathBuf> },
    /// Append live trades to a CSV until Ctrl+C.
    Record { output: Option<PathBuf> },
    /// Print the current order book imbalance.
    Imbalance,
    Help,
}

pub fn parse_command(args: &[String]) -> Result<Command> {
    let Some(first) = args.first() else {
        return Ok(Command::Help);
    };
    match first.as_str() {
        "fetch" => {
            let mut minutes = None;
            let mut recent = false;
            for raw in &args[1..] {
                if raw == "--recent" {
                    recent = true;
                    continue;
                }
                let m: u64 = raw
                    .parse()
                    .with_context(|| format!("invalid minutes '{}'", raw))?;
                if m == 0 {
                    bail!("`fetch` minutes must be > 0");
                }
                minutes = Some(m);
            }
            if recent && minutes.is_some() {
                bail!("`fetch --recent` does not take a minutes window");
            }
            Ok(Command::Fetch { minutes, recent })
        }
        "features" => {
            let input = args
                .get(1)
                .ok_or_else(|| anyhow!("`features` requires a tick CSV path"))?;
            Ok(Command::Features {
                input: PathBuf::from(input),
                output: args.get(2).map(PathBuf::from),
            })
        }
        "record" => Ok(Command::Record {
            output: args.get(1).map(PathBuf::from),
        }),
        "imbalance" => Ok(Command::Imbalance),
        "help" | "--help" | "-h" => Ok(Command::Help),
        other => bail!(
            "unknown subcommand `{}`. expected one of: fetch|features|record|imbalance",
            other
        ),
    }
}

pub fn print_usage() {
    println!("tick-spectra <command>");
    println!();
    println!("  fetch [minutes]               fetch aggregate trades, write ticks and bars CSV");
    println!("  fetch --recent                same, from the latest recent-trades page");
    println!("  features <ticks.csv> [out]    resample, window and extract spectral features");
    println!("  record [out.csv]              append live trades until Ctrl+C");
    println!("  imbalance                     print top-of-book volume imbalance");
}

pub async fn run(command: Command, config: &Config) -> Result<()> {
    match command {
        Command::Fetch { minutes, recent } => fetch(config, minutes, recent).await,
        Command::Features { input, output } => features(config, &input, output),
        Command::Record { output } => record(config, output).await,
        Command::Imbalance => imbalance(config).await,
        Command::Help => {
            print_usage();
            Ok(())
        }
    }
}

fn data_file(config: &Config, suffix: &str) -> PathBuf {
    config.paths.data_dir.join(format!(
        "{}_{}.csv",
        config.binance.normalized_symbol().to_ascii_lowercase(),
        suffix
    ))
}

async fn fetch(config: &Config, minutes: Option<u64>, recent: bool) -> Result<()> {
    let symbol = config.binance.normalized_symbol();
    let client = BinanceRestClient::new(&config.binance.rest_base_url);
    let ticks = if recent {
        let ticks = client
            .recent_trades(&symbol, config.binance.fetch_limit)
            .await?;
        if ticks.is_empty() {
            bail!("no recent trades returned for {}", symbol);
        }
        ticks
    } else {
        let minutes = minutes.unwrap_or(config.fetch.window_minutes);
        let end_ms = u64::try_from(chrono::Utc::now().timestamp_millis())
            .context("system clock is before the Unix epoch")?;
        let start_ms = end_ms.saturating_sub(minutes.saturating_mul(60_000));
        let ticks = client
            .historical_agg_trades(&symbol, start_ms, Some(end_ms), config.binance.fetch_limit)
            .await?;
        if ticks.is_empty() {
            bail!("no trades returned for {} in the last {} minutes", symbol, minutes);
        }
        ticks
    };

    let ticks_path = data_file(config, "ticks");
    storage::write_ticks(&ticks_path, &ticks)?;

    let pipeline_cfg = config.pipeline.resolve()?;
    let bars = crate::resample::resample(&ticks, pipeline_cfg.freq_ms)?;
    let bars_path = data_file(config, "bars");
    storage::write_bars(&bars_path, &bars)?;

    tracing::info!(
        symbol = %symbol,
        ticks = ticks.len(),
        bars = bars.len(),
        ticks_path = %ticks_path.display(),
        bars_path = %bars_path.display(),
        "Fetch complete"
    );
    println!(
        "{}: {} ticks -> {} bars ({} / {})",
        symbol,
        ticks.len(),
        bars.len(),
        ticks_path.display(),
        bars_path.display()
    );
    Ok(())
}

fn features(config: &Config, input: &Path, output: Option<PathBuf>) -> Result<()> {
    let ticks = storage::read_ticks(input)
        .with_context(|| format!("failed to read ticks from {}", input.display()))?;
    let mut pipeline = FeaturePipeline::new(config.pipeline.resolve()?)?;
    let set = pipeline.run(&ticks)?;

    let output = output.unwrap_or_else(|| data_file(config, "features"));
    storage::write_features(&output, &set)?;

    #[cfg(feature = "plot")]
    render_figures(&config.paths.figures_dir, pipeline.config(), &set)?;

    println!(
        "{} ticks -> {} bars -> {} windows ({})",
        ticks.len(),
        set.bars.len(),
        set.rows.len(),
        output.display()
    );
    Ok(())
}

#[cfg(feature = "plot")]
fn render_figures(
    dir: &Path,
    cfg: &crate::pipeline::PipelineConfig,
    set: &crate::pipeline::FeatureSet,
) -> Result<()> {
    if set.bars.is_empty() {
        return Ok(());
    }
    crate::plot::plot_bars(&dir.join("bars.png"), &set.bars, "Close")?;

    let tail = set.bars.len().min(cfg.window_size);
    let closes: Vec<f64> = set.bars[set.bars.len() - tail..]
        .iter()
        .map(|b| b.close)
        .collect();
    let spectrum = crate::spectral::magnitude_spectrum(&closes, cfg.sample_rate)?;
    crate::plot::plot_spectrum(&dir.join("spectrum.png"), &spectrum, "FFT spectrum (last window)")?;

    let matrix = set.matrix();
    if !matrix.is_empty() {
        crate::plot::plot_feature_scatter(
            &dir.join("features.png"),
            &matrix,
            "f1 vs m1 by next-window direction",
        )?;
    }
    Ok(())
}

async fn record(config: &Config, output: Option<PathBuf>) -> Result<()> {
    let output = output.unwrap_or_else(|| data_file(config, "live_trades"));
    let recorder = TradeRecorder::new(
        &config.binance.ws_base_url,
        &config.binance.normalized_symbol(),
        output,
    );
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let mut worker = tokio::spawn(async move { recorder.run(shutdown_rx).await });
    let written = tokio::select! {
        finished = &mut worker => finished.context("recorder task panicked")??,
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for Ctrl+C")?;
            tracing::info!("Ctrl+C received");
            let _ = shutdown_tx.send(true);
            worker.await.context("recorder task panicked")??
        }
    };
    println!("recorded {} trades", written);
    Ok(())
}

async fn imbalance(config: &Config) -> Result<()> {
    let symbol = config.binance.normalized_symbol();
    let depth = config.pipeline.orderbook_depth;
    let client = BinanceRestClient::new(&config.binance.rest_base_url);
    let snapshot = client
        .depth_snapshot(&symbol, depth_request_limit(depth))
        .await?;
    let value = orderbook_imbalance(&snapshot, depth);
    tracing::info!(
        symbol = %symbol,
        depth,
        imbalance = value,
        best_bid = ?snapshot.best_bid(),
        best_ask = ?snapshot.best_ask(),
        "Order book imbalance"
    );
    println!("{} imbalance(depth={}) = {:.4}", symbol, depth, value);
    Ok(())
}

/// Smallest depth limit Binance accepts that covers `depth` levels.
fn depth_request_limit(depth: usize) -> u32 {
    const ACCEPTED: [u32; 8] = [5, 10, 20, 50, 100, 500, 1000, 5000];
    ACCEPTED
        .iter()
        .copied()
        .find(|&limit| limit as usize >= depth)
        .unwrap_or(5000)
}
