use tick_spectra::{resample, AppError, Bar, Tick};

/// Deterministic pseudo-random tick stream with bursts and long gaps.
fn synthetic_ticks(seed: u64, n: usize) -> Vec<Tick> {
    let mut state = seed;
    let mut next = move || {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        state >> 33
    };
    let mut ts = 1_700_000_000_000 + next() % 1_000;
    let mut price = 100.0;
    let mut out = Vec::with_capacity(n);
    for _ in 0..n {
        ts += match next() % 10 {
            0 => 0,
            1..=6 => next() % 50,
            7 | 8 => next() % 400,
            _ => 1_000 + next() % 2_000,
        };
        price += ((next() % 200) as f64 - 100.0) / 100.0;
        let volume = (next() % 1_000) as f64 / 100.0;
        out.push(Tick::new(ts, price, volume));
    }
    out
}

#[test]
fn concrete_two_bar_scenario() {
    let ticks = [
        Tick::new(0, 100.0, 1.0),
        Tick::new(50, 101.0, 2.0),
        Tick::new(150, 99.0, 1.0),
    ];
    let bars = resample(&ticks, 100).unwrap();
    assert_eq!(
        bars,
        vec![
            Bar {
                interval_start_ms: 0,
                open: 100.0,
                high: 101.0,
                low: 100.0,
                close: 101.0,
                volume: 3.0,
            },
            Bar {
                interval_start_ms: 100,
                open: 99.0,
                high: 99.0,
                low: 99.0,
                close: 99.0,
                volume: 1.0,
            },
        ]
    );
}

#[test]
fn total_volume_is_conserved() {
    for seed in 1..20 {
        let ticks = synthetic_ticks(seed, 500);
        for freq in [1, 100, 250, 1_000] {
            let bars = resample(&ticks, freq).unwrap();
            let tick_vol: f64 = ticks.iter().map(|t| t.volume).sum();
            let bar_vol: f64 = bars.iter().map(|b| b.volume).sum();
            assert!(
                (tick_vol - bar_vol).abs() < 1e-6,
                "seed={} freq={} ticks={} bars={}",
                seed,
                freq,
                tick_vol,
                bar_vol
            );
        }
    }
}

#[test]
fn bar_count_covers_range_without_gaps() {
    for seed in 1..20 {
        let ticks = synthetic_ticks(seed, 300);
        let min_ts = ticks.iter().map(|t| t.timestamp_ms).min().unwrap();
        let max_ts = ticks.iter().map(|t| t.timestamp_ms).max().unwrap();
        for freq in [100, 333, 1_000] {
            let bars = resample(&ticks, freq).unwrap();
            let expected = (max_ts / freq - min_ts / freq + 1) as usize;
            assert_eq!(bars.len(), expected, "seed={} freq={}", seed, freq);
            for pair in bars.windows(2) {
                assert_eq!(pair[1].interval_start_ms, pair[0].interval_start_ms + freq);
            }
            assert_eq!(bars[0].interval_start_ms % freq, 0);
        }
    }
}

#[test]
fn empty_intervals_repeat_previous_close() {
    let ticks = synthetic_ticks(7, 400);
    let bars = resample(&ticks, 100).unwrap();
    let mut saw_gap = false;
    for pair in bars.windows(2) {
        if pair[1].volume == 0.0 && pair[1].open == pair[1].close {
            let prev_close = pair[0].close;
            let gap = &pair[1];
            if ticks
                .iter()
                .all(|t| t.timestamp_ms / 100 * 100 != gap.interval_start_ms)
            {
                saw_gap = true;
                assert_eq!(gap.open, prev_close);
                assert_eq!(gap.high, prev_close);
                assert_eq!(gap.low, prev_close);
                assert_eq!(gap.close, prev_close);
            }
        }
    }
    assert!(saw_gap, "synthetic stream should contain empty intervals");
}

#[test]
fn ohlc_envelope_holds_for_every_bar() {
    let ticks = synthetic_ticks(11, 1_000);
    let bars = resample(&ticks, 250).unwrap();
    for bar in &bars {
        assert!(bar.low <= bar.open && bar.open <= bar.high);
        assert!(bar.low <= bar.close && bar.close <= bar.high);
        assert!(bar.volume >= 0.0);
    }
}

#[test]
fn unsorted_input_matches_sorted_input() {
    let mut distinct = synthetic_ticks(3, 200);
    distinct.dedup_by_key(|t| t.timestamp_ms);
    let mut reversed = distinct.clone();
    reversed.reverse();
    assert_eq!(
        resample(&reversed, 100).unwrap(),
        resample(&distinct, 100).unwrap()
    );
}

#[test]
fn invalid_arguments_are_rejected() {
    assert!(matches!(resample(&[], 100), Err(AppError::InvalidInput(_))));
    assert!(matches!(
        resample(&[Tick::new(5, 1.0, 1.0)], 0),
        Err(AppError::InvalidInput(_))
    ));
}
