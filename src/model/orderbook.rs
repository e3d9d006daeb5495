use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BookLevel {
    pub price: f64,
    pub volume: f64,
}

/// Bid/ask ladders, each ordered best-first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderbookSnapshot {
    pub bids: Vec<BookLevel>,
    pub asks: Vec<BookLevel>,
}

impl OrderbookSnapshot {
    pub fn new(bids: Vec<BookLevel>, asks: Vec<BookLevel>) -> Self {
        Self { bids, asks }
    }

    /// Build from the nested `[[price, volume], ...]` layout exchanges return.
    pub fn from_pairs(bids: &[[f64; 2]], asks: &[[f64; 2]]) -> Self {
        let to_levels = |side: &[[f64; 2]]| {
            side.iter()
                .map(|[price, volume]| BookLevel {
                    price: *price,
                    volume: *volume,
                })
                .collect()
        };
        Self {
            bids: to_levels(bids),
            asks: to_levels(asks),
        }
    }

    /// Same as [`from_pairs`](Self::from_pairs) for string-encoded levels (Binance depth payloads).
    pub fn from_string_pairs(
        bids: &[[String; 2]],
        asks: &[[String; 2]],
    ) -> Result<Self, AppError> {
        fn parse_side(side: &[[String; 2]]) -> Result<Vec<BookLevel>, AppError> {
            side.iter()
                .map(|[price, volume]| {
                    let price = price
                        .parse::<f64>()
                        .map_err(|e| AppError::invalid(format!("bad level price '{price}': {e}")))?;
                    let volume = volume.parse::<f64>().map_err(|e| {
                        AppError::invalid(format!("bad level volume '{volume}': {e}"))
                    })?;
                    Ok(BookLevel { price, volume })
                })
                .collect()
        }
        Ok(Self {
            bids: parse_side(bids)?,
            asks: parse_side(asks)?,
        })
    }

    pub fn best_bid(&self) -> Option<f64> {
        self.bids.first().map(|l| l.price)
    }

    pub fn best_ask(&self) -> Option<f64> {
        self.asks.first().map(|l| l.price)
    }
}
