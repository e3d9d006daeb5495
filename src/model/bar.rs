use serde::{Deserialize, Serialize};

/// One fixed-width OHLCV interval produced by the resampler.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub interval_start_ms: u64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Bar for an interval with no trades: every price field carries `close`.
    pub fn flat(interval_start_ms: u64, close: f64) -> Self {
        Self {
            interval_start_ms,
            open: close,
            high: close,
            low: close,
            close,
            volume: 0.0,
        }
    }
}

/// Aggregates ticks that fall into a single interval bucket.
#[derive(Debug, Clone)]
pub struct BarBuilder {
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
    interval_start_ms: u64,
    interval_end_ms: u64,
}

impl BarBuilder {
    /// Start a new bar. The bucket is aligned to the epoch in `interval_ms` steps.
    pub fn new(price: f64, volume: f64, timestamp_ms: u64, interval_ms: u64) -> Self {
        assert!(interval_ms > 0, "interval_ms must be > 0");
        let interval_start_ms = align_to_interval(timestamp_ms, interval_ms);
        Self {
            open: price,
            high: price,
            low: price,
            close: price,
            volume,
            interval_start_ms,
            interval_end_ms: interval_start_ms.saturating_add(interval_ms),
        }
    }

    pub fn update(&mut self, price: f64, volume: f64) {
        self.high = self.high.max(price);
        self.low = self.low.min(price);
        self.close = price;
        self.volume += volume;
    }

    /// Check if a timestamp belongs to this bar's time bucket.
    pub fn contains(&self, timestamp_ms: u64) -> bool {
        timestamp_ms >= self.interval_start_ms && timestamp_ms < self.interval_end_ms
    }

    pub fn interval_start_ms(&self) -> u64 {
        self.interval_start_ms
    }

    pub fn finish(&self) -> Bar {
        Bar {
            interval_start_ms: self.interval_start_ms,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
        }
    }
}

/// Floor `timestamp_ms` to the nearest `interval_ms` boundary counted from the Unix epoch.
pub fn align_to_interval(timestamp_ms: u64, interval_ms: u64) -> u64 {
    timestamp_ms - (timestamp_ms % interval_ms)
}
