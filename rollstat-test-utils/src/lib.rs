//! Brute-force oracles and series generators shared by rollstat's test suites.
//!
//! Oracles recompute every answer from scratch over the true trailing window, so
//! they are slow but obviously correct.

use proptest::prelude::*;

/// Trailing window `values[max(0, end - length + 1)..=end]`.
pub fn trailing(values: &[f64], end: usize, length: usize) -> &[f64] {
    let start = (end + 1).saturating_sub(length);
    &values[start..=end]
}

/// Sum of the last `length` values seen at each step.
pub fn rolling_sums(values: &[f64], length: usize) -> Vec<f64> {
    (0..values.len())
        .map(|end| trailing(values, end, length).iter().sum())
        .collect()
}

/// Mean of the last `min(length, i + 1)` values at each step; zero for `length == 0`.
pub fn rolling_means(values: &[f64], length: usize) -> Vec<f64> {
    if length == 0 {
        return vec![0.0; values.len()];
    }
    (0..values.len())
        .map(|end| {
            let window = trailing(values, end, length);
            window.iter().sum::<f64>() / window.len() as f64
        })
        .collect()
}

/// Maximum of the trailing window at each step.
pub fn rolling_maxima(values: &[f64], length: usize) -> Vec<f64> {
    (0..values.len())
        .map(|end| {
            trailing(values, end, length)
                .iter()
                .copied()
                .fold(f64::NEG_INFINITY, f64::max)
        })
        .collect()
}

/// Minimum of the trailing window at each step.
pub fn rolling_minima(values: &[f64], length: usize) -> Vec<f64> {
    (0..values.len())
        .map(|end| {
            trailing(values, end, length)
                .iter()
                .copied()
                .fold(f64::INFINITY, f64::min)
        })
        .collect()
}

/// Number of members of `window` less than or equal to `x`.
pub fn count_at_or_below(window: &[f64], x: f64) -> usize {
    window.iter().filter(|&&value| value <= x).count()
}

/// Linearly weighted mean of `window`, newest heaviest.
pub fn weighted_mean(window: &[f64]) -> f64 {
    let total: f64 = (1..=window.len()).map(|weight| weight as f64).sum();
    let weighted: f64 = window
        .iter()
        .enumerate()
        .map(|(index, value)| (index + 1) as f64 * value)
        .sum();
    weighted / total
}

/// Two-pass Pearson correlation, zero for fewer than two pairs or a constant side.
pub fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return 0.0;
    }
    let (xs, ys) = (&xs[..n], &ys[..n]);
    let mean_x = xs.iter().sum::<f64>() / n as f64;
    let mean_y = ys.iter().sum::<f64>() / n as f64;

    let mut covariance = 0.0;
    let mut spread_x = 0.0;
    let mut spread_y = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        covariance += dx * dy;
        spread_x += dx * dx;
        spread_y += dy * dy;
    }
    if spread_x == 0.0 || spread_y == 0.0 {
        return 0.0;
    }
    covariance / (spread_x * spread_y).sqrt()
}

/// Asserts two floats agree within a relative-or-absolute tolerance.
#[track_caller]
pub fn assert_close(actual: f64, expected: f64, tolerance: f64) {
    let scale = expected.abs().max(1.0);
    assert!(
        (actual - expected).abs() <= tolerance * scale,
        "{actual} differs from {expected} by more than {tolerance} (scaled by {scale})"
    );
}

/// Asserts two series agree element-wise within `tolerance`.
#[track_caller]
pub fn assert_series_close(actual: &[f64], expected: &[f64], tolerance: f64) {
    assert_eq!(actual.len(), expected.len(), "series lengths differ");
    for (actual, expected) in actual.iter().zip(expected) {
        assert_close(*actual, *expected, tolerance);
    }
}

/// Random positive price series.
pub fn arb_price_series(min_len: usize, max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(1.0..1000.0_f64, min_len..=max_len)
}

/// Random series drawn from a handful of levels, so ties are frequent.
pub fn arb_tied_series(min_len: usize, max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec((0..6_i32).prop_map(f64::from), min_len..=max_len)
}

/// Random paired series of equal length.
pub fn arb_paired_series(
    min_len: usize,
    max_len: usize,
) -> impl Strategy<Value = (Vec<f64>, Vec<f64>)> {
    prop::collection::vec((1.0..100.0_f64, 1.0..100.0_f64), min_len..=max_len)
        .prop_map(|pairs| -> (Vec<f64>, Vec<f64>) { pairs.into_iter().unzip() })
}

/// Deterministic zig-zag series with a slow drift, handy for fixtures.
pub fn zigzag(len: usize) -> Vec<f64> {
    (0..len)
        .map(|i| {
            let swing = if i % 2 == 0 { 3.0 } else { -2.0 };
            100.0 + i as f64 * 0.5 + swing * ((i % 5) as f64)
        })
        .collect()
}
