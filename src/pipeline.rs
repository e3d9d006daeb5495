//! Ticks → bars → windows → spectral feature rows, plus forward-looking labels.

use serde::Serialize;

use crate::error::AppError;
use crate::imbalance::orderbook_imbalance;
use crate::model::bar::Bar;
use crate::model::orderbook::OrderbookSnapshot;
use crate::model::tick::Tick;
use crate::resample::resample;
use crate::spectral::{ShortInputPolicy, SpectralExtractor};
use crate::window::windows;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineConfig {
    pub freq_ms: u64,
    pub window_size: usize,
    /// `None` means non-overlapping windows.
    pub step_size: Option<usize>,
    pub n_fft_features: usize,
    /// Samples per unit time used to label FFT bins.
    pub sample_rate: f64,
    pub short_input: ShortInputPolicy,
    pub orderbook_depth: usize,
}

impl PipelineConfig {
    /// Bars per second for a given bar width.
    pub fn bars_per_second(freq_ms: u64) -> f64 {
        1_000.0 / freq_ms as f64
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            freq_ms: 100,
            window_size: 256,
            step_size: None,
            n_fft_features: 10,
            sample_rate: Self::bars_per_second(100),
            short_input: ShortInputPolicy::Pad,
            orderbook_depth: 5,
        }
    }
}

/// Spectral features of one window of close prices.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowFeatures {
    pub offset: usize,
    pub start_ms: u64,
    /// Exclusive end of the last bar in the window.
    pub end_ms: u64,
    /// Close of the last bar in the window.
    pub close: f64,
    pub features: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WindowLabel {
    /// 1 if the next window closes higher, else 0.
    pub direction: u8,
    pub change: f64,
}

/// Row-aligned arrays for external learners.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureMatrix {
    pub x: Vec<Vec<f64>>,
    pub direction: Vec<u8>,
    pub change: Vec<f64>,
}

impl FeatureMatrix {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct FeatureSet {
    pub bars: Vec<Bar>,
    pub rows: Vec<WindowFeatures>,
}

impl FeatureSet {
    /// One label per row that has a successor; the last row has none.
    pub fn labels(&self) -> Vec<WindowLabel> {
        self.rows
            .windows(2)
            .map(|pair| {
                let change = pair[1].close - pair[0].close;
                WindowLabel {
                    direction: u8::from(change > 0.0),
                    change,
                }
            })
            .collect()
    }

    /// Features of every labelled row, with their labels.
    pub fn matrix(&self) -> FeatureMatrix {
        let labels = self.labels();
        FeatureMatrix {
            x: self
                .rows
                .iter()
                .take(labels.len())
                .map(|r| r.features.clone())
                .collect(),
            direction: labels.iter().map(|l| l.direction).collect(),
            change: labels.iter().map(|l| l.change).collect(),
        }
    }
}

pub struct FeaturePipeline {
    config: PipelineConfig,
    extractor: SpectralExtractor,
}

impl FeaturePipeline {
    pub fn new(config: PipelineConfig) -> Result<Self, AppError> {
        if config.freq_ms == 0 {
            return Err(AppError::invalid("freq_ms must be > 0"));
        }
        // Surface bad window sizes at construction rather than on first run.
        windows::<Bar>(&[], config.window_size, config.step_size)?;
        let extractor = SpectralExtractor::new(config.n_fft_features, config.sample_rate)?
            .with_short_input_policy(config.short_input);
        Ok(Self { config, extractor })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn run(&mut self, ticks: &[Tick]) -> Result<FeatureSet, AppError> {
        let bars = resample(ticks, self.config.freq_ms)?;
        let rows = self.features_for_bars(&bars)?;
        tracing::info!(
            ticks = ticks.len(),
            bars = bars.len(),
            windows = rows.len(),
            "Feature pipeline finished"
        );
        Ok(FeatureSet { bars, rows })
    }

    pub fn features_for_bars(&mut self, bars: &[Bar]) -> Result<Vec<WindowFeatures>, AppError> {
        let iter = windows(bars, self.config.window_size, self.config.step_size)?;
        let mut rows = Vec::with_capacity(iter.len());
        let mut closes = Vec::with_capacity(self.config.window_size);
        for (offset, window) in iter {
            closes.clear();
            closes.extend(window.iter().map(|b| b.close));
            let features = self.extractor.extract(&closes)?;
            let first = &window[0];
            let last = &window[window.len() - 1];
            rows.push(WindowFeatures {
                offset,
                start_ms: first.interval_start_ms,
                end_ms: last.interval_start_ms.saturating_add(self.config.freq_ms),
                close: last.close,
                features,
            });
        }
        if rows.is_empty() {
            tracing::warn!(
                bars = bars.len(),
                window_size = self.config.window_size,
                "Not enough bars for a single window"
            );
        }
        Ok(rows)
    }

    pub fn orderbook_feature(&self, snapshot: &OrderbookSnapshot) -> f64 {
        orderbook_imbalance(snapshot, self.config.orderbook_depth)
    }
}
