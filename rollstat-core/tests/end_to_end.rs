//! Indicator-loop scenarios exercising several window structures side by side.

use rollstat_core::averages::{ema, sma, wilder, wma, Ema};
use rollstat_core::{
    mid_ranks, FixedWindowMinMax, Indicator, PercentRank, PipedIndicator, RollingCorrelation,
    RollingSum, SlidingOrderStatistics, WindowError, WindowedSpearman,
};
use rollstat_test_utils::{assert_close, assert_series_close, zigzag};

#[test]
fn sum_and_max_follow_the_documented_sequence() {
    let input = [10.0, 11.0, 9.0, 12.0, 8.0, 13.0];
    let mut sum = RollingSum::new();
    let mut extremes = FixedWindowMinMax::<f64>::new(3).unwrap();

    let mut sums = Vec::new();
    let mut highs = Vec::new();
    for value in input {
        sum.add(value);
        extremes.add(value);
        sums.push(sum.sum(3));
        highs.push(extremes.max());
    }

    assert_eq!(sums, vec![10.0, 21.0, 30.0, 32.0, 29.0, 33.0]);
    assert_eq!(highs, vec![10.0, 11.0, 11.0, 12.0, 12.0, 13.0]);
}

#[test]
fn stochastic_oscillator_from_extremes() {
    // %K = (close - lowest) / (highest - lowest), zero when the range collapses.
    let closes = zigzag(40);
    let mut extremes = FixedWindowMinMax::<f64>::new(14).unwrap();
    for close in closes {
        let extrema = extremes.next(close);
        let range = extrema.max - extrema.min;
        let k = if range == 0.0 {
            0.0
        } else {
            (close - extrema.min) / range
        };
        assert!((0.0..=1.0).contains(&k));
    }
}

#[test]
fn correlation_of_a_series_with_its_lag() {
    let prices = zigzag(60);
    let mut correlation = RollingCorrelation::new();
    for pair in prices.windows(2) {
        correlation.add(pair[0], pair[1]);
    }
    let r = correlation.r(20);
    assert!(r.is_finite());
    assert!((-1.0..=1.0).contains(&r));
    assert_eq!(correlation.count(), 59);
}

#[test]
fn duplicate_eviction_is_first_in_first_out() {
    let mut window = SlidingOrderStatistics::new(3).unwrap();
    for value in [5.0, 5.0, 3.0] {
        window.add(value);
    }

    let mut at_or_below_five = Vec::new();
    let mut below_five = Vec::new();
    for value in [6.0, 6.0, 6.0, 6.0, 6.0] {
        window.add(value);
        at_or_below_five.push(window.count_less_than_or_equal(5.0));
        below_five.push(window.count_less_than(5.0));
    }

    // The first 5 leaves, then the second, then the 3.
    assert_eq!(at_or_below_five, vec![2, 1, 0, 0, 0]);
    assert_eq!(below_five, vec![1, 1, 0, 0, 0]);
}

#[test]
fn spearman_ranks_and_perfect_trend() {
    assert_eq!(mid_ranks(&[1.0, 2.0, 2.0, 3.0]), vec![1.0, 2.5, 2.5, 4.0]);

    let mut rho = WindowedSpearman::<f64>::new(10).unwrap();
    let mut last = 0.0;
    for value in 0..25 {
        last = rho.next(f64::from(value));
    }
    assert_close(last, 1.0, 1e-12);
}

#[test]
fn constant_series_is_a_fixed_point_for_every_kernel() {
    let input = vec![7.25; 50];
    for output in [sma(&input, 9), wma(&input, 9), ema(&input, 9), wilder(&input, 9)] {
        assert_series_close(&output, &input, 1e-12);
    }
}

#[test]
fn percent_rank_of_smoothed_prices() {
    let mut oscillator = PipedIndicator::new(
        Ema::<f64>::new(5).unwrap(),
        PercentRank::<f64>::new(10).unwrap(),
    );
    for price in zigzag(30) {
        let rank = oscillator.next(price);
        assert!(rank > 0.0 && rank <= 1.0);
    }
}

#[test]
fn zero_length_windows_are_rejected() {
    assert!(matches!(
        FixedWindowMinMax::<f64>::new(0),
        Err(WindowError::InvalidLength { length: 0, .. })
    ));
    assert!(SlidingOrderStatistics::new(0).is_err());
    assert!(WindowedSpearman::<f64>::new(0).is_err());
    assert!(PercentRank::<f64>::new(0).is_err());
}
