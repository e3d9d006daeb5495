use crate::model::orderbook::{BookLevel, OrderbookSnapshot};

pub const DEFAULT_DEPTH: usize = 5;

/// Normalized top-of-book volume imbalance in `[-1, 1]`.
///
/// Sums volume over the best `depth` levels of each side (fewer when the book
/// is shallower) and returns `(bid - ask) / (bid + ask)`. Positive means the
/// bid side dominates. An empty book, `depth == 0`, or zero total volume gives
/// exactly `0.0`.
pub fn orderbook_imbalance(snapshot: &OrderbookSnapshot, depth: usize) -> f64 {
    let bid_vol = side_volume(&snapshot.bids, depth);
    let ask_vol = side_volume(&snapshot.asks, depth);
    let total = bid_vol + ask_vol;
    if total == 0.0 {
        return 0.0;
    }
    (bid_vol - ask_vol) / total
}

fn side_volume(levels: &[BookLevel], depth: usize) -> f64 {
    levels.iter().take(depth).map(|l| l.volume).sum()
}
