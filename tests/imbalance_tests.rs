use tick_spectra::imbalance::DEFAULT_DEPTH;
use tick_spectra::{orderbook_imbalance, BookLevel, OrderbookSnapshot};

fn level(price: f64, volume: f64) -> BookLevel {
    BookLevel { price, volume }
}

#[test]
fn single_level_scenario() {
    let snap = OrderbookSnapshot::from_pairs(&[[100.0, 5.0]], &[[101.0, 3.0]]);
    assert!((orderbook_imbalance(&snap, 5) - 0.25).abs() < 1e-12);
}

#[test]
fn balanced_and_empty_books_are_zero() {
    assert_eq!(orderbook_imbalance(&OrderbookSnapshot::default(), DEFAULT_DEPTH), 0.0);
    let balanced = OrderbookSnapshot::new(
        vec![level(99.0, 2.0), level(98.0, 1.0)],
        vec![level(101.0, 1.5), level(102.0, 1.5)],
    );
    assert_eq!(orderbook_imbalance(&balanced, DEFAULT_DEPTH), 0.0);
    let zero_volume = OrderbookSnapshot::new(vec![level(99.0, 0.0)], vec![level(101.0, 0.0)]);
    assert_eq!(orderbook_imbalance(&zero_volume, DEFAULT_DEPTH), 0.0);
}

#[test]
fn one_sided_books_hit_the_bounds() {
    let bids_only = OrderbookSnapshot::new(vec![level(99.0, 4.0)], Vec::new());
    let asks_only = OrderbookSnapshot::new(Vec::new(), vec![level(101.0, 4.0)]);
    assert_eq!(orderbook_imbalance(&bids_only, 3), 1.0);
    assert_eq!(orderbook_imbalance(&asks_only, 3), -1.0);
}

#[test]
fn stays_within_bounds_for_many_books() {
    let mut state: u64 = 42;
    let mut next = move || {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (state >> 33) as f64 / (1u64 << 31) as f64
    };
    for _ in 0..500 {
        let bids: Vec<BookLevel> = (0..(next() * 12.0) as usize)
            .map(|i| level(100.0 - i as f64, next() * 10.0))
            .collect();
        let asks: Vec<BookLevel> = (0..(next() * 12.0) as usize)
            .map(|i| level(101.0 + i as f64, next() * 10.0))
            .collect();
        let snap = OrderbookSnapshot::new(bids, asks);
        for depth in [0, 1, 5, 20] {
            let v = orderbook_imbalance(&snap, depth);
            assert!((-1.0..=1.0).contains(&v), "depth={} value={}", depth, v);
        }
        assert_eq!(orderbook_imbalance(&snap, 0), 0.0);
    }
}

#[test]
fn depth_beyond_book_uses_all_levels() {
    let snap = OrderbookSnapshot::from_pairs(&[[100.0, 1.0], [99.0, 1.0]], &[[101.0, 2.0]]);
    assert_eq!(orderbook_imbalance(&snap, 50), 0.0);
    assert!((orderbook_imbalance(&snap, 1) - (-1.0 / 3.0)).abs() < 1e-12);
}
