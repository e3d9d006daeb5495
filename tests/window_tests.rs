use tick_spectra::window::window_count;
use tick_spectra::{windows, AppError, Bar};

fn bars(n: usize) -> Vec<Bar> {
    (0..n)
        .map(|i| Bar::flat(i as u64 * 100, 100.0 + i as f64))
        .collect()
}

#[test]
fn count_law_holds_across_sizes() {
    for len in 0..40 {
        let data = bars(len);
        for w in 1..12 {
            for s in 1..12 {
                let produced = windows(&data, w, Some(s)).unwrap().count();
                let expected = if len >= w { (len - w) / s + 1 } else { 0 };
                assert_eq!(produced, expected, "len={} w={} s={}", len, w, s);
                assert_eq!(window_count(len, w, s), expected);
            }
        }
    }
}

#[test]
fn every_window_is_the_exact_slice() {
    let data = bars(37);
    for (offset, window) in windows(&data, 8, Some(3)).unwrap() {
        assert_eq!(offset % 3, 0);
        assert_eq!(window, &data[offset..offset + 8]);
    }
}

#[test]
fn iteration_is_restartable() {
    let data = bars(20);
    let first: Vec<(usize, Vec<Bar>)> = windows(&data, 5, Some(2))
        .unwrap()
        .map(|(o, w)| (o, w.to_vec()))
        .collect();
    let second: Vec<(usize, Vec<Bar>)> = windows(&data, 5, Some(2))
        .unwrap()
        .map(|(o, w)| (o, w.to_vec()))
        .collect();
    assert_eq!(first, second);
    assert_eq!(data, bars(20));
}

#[test]
fn cloned_iterator_resumes_independently() {
    let data = bars(10);
    let mut iter = windows(&data, 2, None).unwrap();
    iter.next();
    let snapshot = iter.clone();
    assert_eq!(iter.count(), 4);
    assert_eq!(snapshot.len(), 4);
}

#[test]
fn window_larger_than_input_is_empty_not_error() {
    let data = bars(3);
    let mut iter = windows(&data, 4, None).unwrap();
    assert_eq!(iter.len(), 0);
    assert!(iter.next().is_none());
}

#[test]
fn zero_sizes_are_invalid() {
    let data = bars(3);
    assert!(matches!(windows(&data, 0, Some(1)), Err(AppError::InvalidInput(_))));
    assert!(matches!(windows(&data, 1, Some(0)), Err(AppError::InvalidInput(_))));
}
