//! Frequency-domain features over a regularly sampled series.
//!
//! The series is detrended by its mean, transformed with a forward FFT and
//! reduced to its one-sided magnitude spectrum (`N / 2 + 1` bins spaced
//! `sample_rate / N` apart). Feature vectors keep the `K` strongest bins,
//! re-ordered by frequency and interleaved as `[f1, m1, f2, m2, ...]`.

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;
use serde::Deserialize;

use crate::error::AppError;

/// What to do when the spectrum has fewer bins than requested features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShortInputPolicy {
    /// Append zero-magnitude bins continuing the frequency grid.
    #[default]
    Pad,
    /// Return [`AppError::InsufficientData`].
    Fail,
}

/// One-sided magnitude spectrum of a detrended series.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    pub frequencies: Vec<f64>,
    pub magnitudes: Vec<f64>,
    /// Frequency spacing between adjacent bins.
    pub resolution: f64,
}

impl Spectrum {
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// Frequency and magnitude of the strongest bin; ties go to the higher frequency.
    pub fn dominant(&self) -> Option<(f64, f64)> {
        let idx = top_k_indices(&self.magnitudes, 1).pop()?;
        Some((self.frequencies[idx], self.magnitudes[idx]))
    }
}

/// Reusable extractor; caches FFT plans across windows of equal length.
pub struct SpectralExtractor {
    planner: FftPlanner<f64>,
    n_features: usize,
    sample_rate: f64,
    short_input: ShortInputPolicy,
}

impl SpectralExtractor {
    pub fn new(n_features: usize, sample_rate: f64) -> Result<Self, AppError> {
        if n_features == 0 {
            return Err(AppError::invalid("n_features must be >= 1"));
        }
        if !fits_in_vec(n_features) {
            return Err(AppError::invalid(format!(
                "n_features {n_features} is too large for a feature vector"
            )));
        }
        validate_sample_rate(sample_rate)?;
        Ok(Self {
            planner: FftPlanner::new(),
            n_features,
            sample_rate,
            short_input: ShortInputPolicy::default(),
        })
    }

    pub fn with_short_input_policy(mut self, policy: ShortInputPolicy) -> Self {
        self.short_input = policy;
        self
    }

    /// Length of every vector returned by [`extract`](Self::extract).
    pub fn output_len(&self) -> usize {
        2 * self.n_features
    }

    pub fn spectrum(&mut self, values: &[f64]) -> Result<Spectrum, AppError> {
        if values.is_empty() {
            return Err(AppError::invalid("cannot take the spectrum of an empty series"));
        }
        let n = values.len();
        let mean = values.iter().sum::<f64>() / n as f64;
        let mut buffer: Vec<Complex<f64>> = values
            .iter()
            .map(|&v| Complex::new(v - mean, 0.0))
            .collect();

        let fft = self.planner.plan_fft_forward(n);
        fft.process(&mut buffer);

        let bins = n / 2 + 1;
        let resolution = bin_spacing(n, self.sample_rate);
        if !resolution.is_finite() || resolution <= 0.0 {
            return Err(AppError::invalid(format!(
                "sample_rate {} gives no usable bin spacing for {} samples",
                self.sample_rate, n
            )));
        }
        Ok(Spectrum {
            frequencies: (0..bins).map(|i| i as f64 * resolution).collect(),
            magnitudes: buffer[..bins].iter().map(|c| c.norm()).collect(),
            resolution,
        })
    }

    /// Feature vector of exactly `2 * n_features` values.
    pub fn extract(&mut self, values: &[f64]) -> Result<Vec<f64>, AppError> {
        let spectrum = self.spectrum(values)?;
        let bins = spectrum.len();
        let k = self.n_features;

        if bins < k && self.short_input == ShortInputPolicy::Fail {
            return Err(AppError::InsufficientData {
                needed: k,
                available: bins,
            });
        }

        if k > bins && !((k - 1) as f64 * spectrum.resolution).is_finite() {
            return Err(AppError::invalid(format!(
                "padding to {k} bins overflows the frequency grid"
            )));
        }

        let mut chosen = top_k_indices(&spectrum.magnitudes, k);
        chosen.sort_unstable();

        let mut features = Vec::with_capacity(self.output_len());
        for &idx in &chosen {
            features.push(spectrum.frequencies[idx]);
            features.push(spectrum.magnitudes[idx]);
        }
        for j in bins..k {
            features.push(j as f64 * spectrum.resolution);
            features.push(0.0);
        }
        debug_assert_eq!(features.len(), self.output_len());
        Ok(features)
    }
}

/// Top `n_features` (frequency, magnitude) pairs of `values`, sorted by frequency.
///
/// Short series are padded per [`ShortInputPolicy::Pad`].
pub fn fft_features(
    values: &[f64],
    n_features: usize,
    sample_rate: f64,
) -> Result<Vec<f64>, AppError> {
    SpectralExtractor::new(n_features, sample_rate)?.extract(values)
}

pub fn magnitude_spectrum(values: &[f64], sample_rate: f64) -> Result<Spectrum, AppError> {
    SpectralExtractor::new(1, sample_rate)?.spectrum(values)
}

/// Indices of the `k` largest magnitudes.
///
/// Stable ascending sort, then the last `k`: among equal magnitudes the later
/// (higher-frequency) bin wins. Returned in ascending-magnitude order.
fn top_k_indices(magnitudes: &[f64], k: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..magnitudes.len()).collect();
    order.sort_by(|&a, &b| magnitudes[a].total_cmp(&magnitudes[b]));
    let take = k.min(order.len());
    order.split_off(order.len() - take)
}

fn bin_spacing(n: usize, sample_rate: f64) -> f64 {
    sample_rate / n as f64
}

/// Whether `2 * n_features` f64 values stay within a `Vec`'s size limit.
fn fits_in_vec(n_features: usize) -> bool {
    n_features
        .checked_mul(2 * std::mem::size_of::<f64>())
        .is_some_and(|bytes| bytes <= isize::MAX as usize)
}

fn validate_sample_rate(sample_rate: f64) -> Result<(), AppError> {
    if !sample_rate.is_finite() || sample_rate <= 0.0 {
        return Err(AppError::invalid(format!(
            "sample_rate must be finite and > 0, got {sample_rate}"
        )));
    }
    Ok(())
}
