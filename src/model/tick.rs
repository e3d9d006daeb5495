use serde::{Deserialize, Serialize};

/// A single executed trade. `timestamp_ms` is milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    pub timestamp_ms: u64,
    pub price: f64,
    pub volume: f64,
}

impl Tick {
    pub fn new(timestamp_ms: u64, price: f64, volume: f64) -> Self {
        Self {
            timestamp_ms,
            price,
            volume,
        }
    }
}
