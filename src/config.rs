use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::pipeline::PipelineConfig;
use crate::spectral::ShortInputPolicy;

const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub binance: BinanceConfig,
    pub pipeline: PipelineSection,
    pub fetch: FetchConfig,
    pub paths: PathsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BinanceConfig {
    pub rest_base_url: String,
    pub ws_base_url: String,
    pub symbol: String,
    /// Page size for trade endpoints (Binance caps this at 1000).
    pub fetch_limit: u32,
}

impl Default for BinanceConfig {
    fn default() -> Self {
        Self {
            rest_base_url: "https://api.binance.com".to_string(),
            ws_base_url: "wss://stream.binance.com:9443/ws".to_string(),
            symbol: "BTCUSDT".to_string(),
            fetch_limit: 1000,
        }
    }
}

/// Raw `[pipeline]` table. Resolve into a typed
/// [`PipelineConfig`](crate::pipeline::PipelineConfig) with [`PipelineSection::resolve`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineSection {
    pub freq: String,
    pub window_size: usize,
    pub step_size: Option<usize>,
    pub n_fft_features: usize,
    pub sample_rate: Option<f64>,
    pub short_input: ShortInputPolicy,
    pub orderbook_depth: usize,
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            freq: "100ms".to_string(),
            window_size: 256,
            step_size: None,
            n_fft_features: 10,
            sample_rate: None,
            short_input: ShortInputPolicy::Pad,
            orderbook_depth: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub window_minutes: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { window_minutes: 60 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub data_dir: PathBuf,
    pub figures_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            figures_dir: PathBuf::from("figures"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Parse a bar frequency such as "100ms", "1s", "5m", "1h" or "1d" into milliseconds.
pub fn parse_freq_ms(s: &str) -> Result<u64> {
    let s = s.trim();
    let split = s
        .find(|c: char| !c.is_ascii_digit())
        .with_context(|| format!("invalid frequency '{}': missing unit suffix", s))?;
    let (num_str, suffix) = s.split_at(split);
    if num_str.is_empty() {
        bail!("invalid frequency '{}': expected format like '100ms'", s);
    }
    let n: u64 = num_str.parse().with_context(|| {
        format!(
            "invalid frequency '{}': quantity must be a positive integer",
            s
        )
    })?;
    if n == 0 {
        bail!("invalid frequency '{}': quantity must be > 0", s);
    }

    let unit_ms = match suffix {
        "ms" => 1,
        "s" => 1_000,
        "m" | "min" => 60_000,
        "h" => 3_600_000,
        "d" => 86_400_000,
        _ => bail!(
            "invalid frequency '{}': unsupported suffix '{}', expected one of ms/s/m/h/d",
            s,
            suffix
        ),
    };

    n.checked_mul(unit_ms)
        .with_context(|| format!("invalid frequency '{}': value is too large", s))
}

impl BinanceConfig {
    pub fn normalized_symbol(&self) -> String {
        self.symbol.trim().to_ascii_uppercase()
    }
}

impl PipelineSection {
    pub fn freq_ms(&self) -> Result<u64> {
        parse_freq_ms(&self.freq)
    }

    /// Typed pipeline settings; `sample_rate` defaults to bars per second.
    pub fn resolve(&self) -> Result<PipelineConfig> {
        let freq_ms = self.freq_ms().context("pipeline.freq is invalid")?;
        Ok(PipelineConfig {
            freq_ms,
            window_size: self.window_size,
            step_size: self.step_size,
            n_fft_features: self.n_fft_features,
            sample_rate: self
                .sample_rate
                .unwrap_or_else(|| PipelineConfig::bars_per_second(freq_ms)),
            short_input: self.short_input,
            orderbook_depth: self.orderbook_depth,
        })
    }
}

impl Config {
    /// Load `config/default.toml` (or `$TICK_SPECTRA_CONFIG`) after reading `.env`.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config_path = std::env::var("TICK_SPECTRA_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        Self::load_from_path(&config_path)
    }

    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(config_path)
            .with_context(|| format!("failed to read {}", config_path.display()))?;
        let config: Config = toml::from_str(&config_str)
            .with_context(|| format!("failed to parse {}", config_path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.pipeline
            .freq_ms()
            .context("pipeline.freq is invalid")?;
        if self.pipeline.window_size == 0 {
            bail!("pipeline.window_size must be >= 1");
        }
        if self.pipeline.step_size == Some(0) {
            bail!("pipeline.step_size must be >= 1");
        }
        if self.pipeline.n_fft_features == 0 {
            bail!("pipeline.n_fft_features must be >= 1");
        }
        if let Some(rate) = self.pipeline.sample_rate {
            if !rate.is_finite() || rate <= 0.0 {
                bail!("pipeline.sample_rate must be finite and > 0");
            }
        }
        if self.binance.normalized_symbol().is_empty() {
            bail!("binance.symbol must not be empty");
        }
        Ok(())
    }
}
