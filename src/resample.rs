//! Tick-to-bar resampling.
//!
//! Intervals are half-open `[start, start + freq)` and anchored at the Unix
//! epoch, so the same tick set always lands in the same buckets regardless of
//! where the data begins. Every interval between the first and last tick is
//! emitted; intervals without trades repeat the previous close with zero volume.

use std::borrow::Cow;

use crate::error::AppError;
use crate::model::bar::{align_to_interval, Bar, BarBuilder};
use crate::model::tick::Tick;

/// Resample `ticks` into contiguous OHLCV bars of width `freq_ms`.
///
/// Out-of-order input is stably sorted by timestamp first, so trades sharing a
/// millisecond keep their arrival order for open/close.
pub fn resample(ticks: &[Tick], freq_ms: u64) -> Result<Vec<Bar>, AppError> {
    if ticks.is_empty() {
        return Err(AppError::invalid("cannot resample an empty tick sequence"));
    }
    if freq_ms == 0 {
        return Err(AppError::invalid("resample frequency must be > 0 ms"));
    }

    let ordered = in_time_order(ticks);
    let first_start = align_to_interval(ordered[0].timestamp_ms, freq_ms);
    let last_start = align_to_interval(ordered[ordered.len() - 1].timestamp_ms, freq_ms);
    let expected = usize::try_from((last_start - first_start) / freq_ms + 1)
        .map_err(|_| AppError::invalid("tick range spans too many intervals"))?;

    let mut bars = Vec::with_capacity(expected);
    let mut current: Option<BarBuilder> = None;

    for tick in ordered.iter() {
        match current.as_mut() {
            Some(builder) if builder.contains(tick.timestamp_ms) => {
                builder.update(tick.price, tick.volume);
            }
            _ => {
                if let Some(builder) = current.take() {
                    let bar = builder.finish();
                    let last_close = bar.close;
                    let mut gap_start = bar.interval_start_ms + freq_ms;
                    bars.push(bar);

                    let next_start = align_to_interval(tick.timestamp_ms, freq_ms);
                    while gap_start < next_start {
                        bars.push(Bar::flat(gap_start, last_close));
                        gap_start += freq_ms;
                    }
                }
                current = Some(BarBuilder::new(
                    tick.price,
                    tick.volume,
                    tick.timestamp_ms,
                    freq_ms,
                ));
            }
        }
    }
    if let Some(builder) = current {
        bars.push(builder.finish());
    }

    debug_assert_eq!(bars.len(), expected);
    tracing::debug!(
        ticks = ticks.len(),
        bars = bars.len(),
        freq_ms,
        first_start,
        "Resampled ticks"
    );
    Ok(bars)
}

fn in_time_order(ticks: &[Tick]) -> Cow<'_, [Tick]> {
    let sorted = ticks
        .windows(2)
        .all(|pair| pair[0].timestamp_ms <= pair[1].timestamp_ms);
    if sorted {
        return Cow::Borrowed(ticks);
    }

    tracing::warn!(
        ticks = ticks.len(),
        "Tick timestamps out of order, sorting before resample"
    );
    let mut owned = ticks.to_vec();
    // sort_by_key is stable: equal timestamps keep arrival order.
    owned.sort_by_key(|t| t.timestamp_ms);
    Cow::Owned(owned)
}
