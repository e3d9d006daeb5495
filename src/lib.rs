//! Offline feature engineering for crypto tick data.
//!
//! Trades are resampled into epoch-aligned OHLCV bars ([`resample`]), sliced
//! into fixed-length windows ([`window`]) and reduced to frequency-domain
//! feature vectors ([`spectral`]). [`pipeline`] wires the three together and
//! derives labels for external learners; [`imbalance`] turns order book
//! snapshots into a scalar feature.

pub mod binance;
pub mod cli;
pub mod config;
pub mod error;
pub mod imbalance;
pub mod model;
pub mod pipeline;
#[cfg(feature = "plot")]
pub mod plot;
pub mod resample;
pub mod spectral;
pub mod storage;
pub mod window;

pub use error::AppError;
pub use imbalance::orderbook_imbalance;
pub use model::bar::Bar;
pub use model::orderbook::{BookLevel, OrderbookSnapshot};
pub use model::tick::Tick;
pub use pipeline::{FeatureMatrix, FeaturePipeline, FeatureSet, PipelineConfig, WindowFeatures};
pub use resample::resample;
pub use spectral::{fft_features, magnitude_spectrum, ShortInputPolicy, SpectralExtractor, Spectrum};
pub use window::{windows, Windows};
