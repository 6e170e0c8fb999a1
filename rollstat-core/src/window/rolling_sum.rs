//! Trailing sums, means, and variances whose window length is chosen per query.

use crate::core::{finite_or_zero, ratio_or_zero};
use crate::window::accumulator::{CumulativeAccumulator, Retention};

/// Sum and mean over the last `length` observations, where `length` may differ
/// between queries on the same instance.
#[derive(Debug, Clone, Default)]
pub struct RollingSum {
    totals: CumulativeAccumulator,
}

impl RollingSum {
    /// Creates a rolling sum that can answer any trailing length.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a rolling sum that only retains history for lengths up to `max_length`.
    pub fn bounded(max_length: usize) -> Self {
        Self {
            totals: CumulativeAccumulator::with_retention(Retention::Bounded(max_length)),
        }
    }

    /// Records one observation.
    pub fn add(&mut self, value: f64) {
        self.totals.add(value);
    }

    /// Number of observations recorded so far.
    pub fn count(&self) -> usize {
        self.totals.count()
    }

    /// Sum of the last `length` observations.
    pub fn sum(&self, length: usize) -> f64 {
        finite_or_zero(self.totals.window(length))
    }

    /// Mean of the last `length` observations.
    pub fn average(&self, length: usize) -> f64 {
        let n = self.totals.effective_length(length);
        ratio_or_zero(self.totals.window(n), n as f64)
    }

    /// Forgets every recorded observation.
    pub fn reset(&mut self) {
        self.totals.reset();
    }
}

/// Population variance and standard deviation over a per-query trailing length.
#[derive(Debug, Clone, Default)]
pub struct RollingVariance {
    sum: CumulativeAccumulator,
    sum_of_squares: CumulativeAccumulator,
}

impl RollingVariance {
    /// Creates a rolling variance that can answer any trailing length.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a rolling variance retaining history for lengths up to `max_length`.
    pub fn bounded(max_length: usize) -> Self {
        let retention = Retention::Bounded(max_length);
        Self {
            sum: CumulativeAccumulator::with_retention(retention),
            sum_of_squares: CumulativeAccumulator::with_retention(retention),
        }
    }

    /// Records one observation.
    pub fn add(&mut self, value: f64) {
        let value = finite_or_zero(value);
        self.sum.add(value);
        self.sum_of_squares.add(value * value);
    }

    /// Mean of the last `length` observations.
    pub fn mean(&self, length: usize) -> f64 {
        let n = self.sum.effective_length(length);
        ratio_or_zero(self.sum.window(n), n as f64)
    }

    /// Population variance of the last `length` observations.
    pub fn variance(&self, length: usize) -> f64 {
        let n = self.sum.effective_length(length);
        if n == 0 {
            return 0.0;
        }
        let mean = ratio_or_zero(self.sum.window(n), n as f64);
        let mean_of_squares = ratio_or_zero(self.sum_of_squares.window(n), n as f64);
        let variance = mean_of_squares - mean * mean;
        if variance.is_sign_negative() || !variance.is_finite() {
            0.0
        } else {
            variance
        }
    }

    /// Population standard deviation of the last `length` observations.
    pub fn std_dev(&self, length: usize) -> f64 {
        self.variance(length).sqrt()
    }

    /// Forgets every recorded observation.
    pub fn reset(&mut self) {
        self.sum.reset();
        self.sum_of_squares.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(lhs: f64, rhs: f64) {
        assert!((lhs - rhs).abs() <= 1e-9, "{lhs} != {rhs}");
    }

    #[test]
    fn sums_follow_the_trailing_window() {
        let mut rolling = RollingSum::new();
        let mut sums = Vec::new();
        for value in [10.0, 11.0, 9.0, 12.0, 8.0, 13.0] {
            rolling.add(value);
            sums.push(rolling.sum(3));
        }
        assert_eq!(sums, vec![10.0, 21.0, 30.0, 32.0, 29.0, 33.0]);
    }

    #[test]
    fn average_divides_by_available_samples() {
        let mut rolling = RollingSum::new();
        rolling.add(4.0);
        assert_eq!(rolling.average(3), 4.0);
        rolling.add(8.0);
        assert_eq!(rolling.average(3), 6.0);
        assert_eq!(rolling.average(0), 0.0);
    }

    #[test]
    fn lengths_may_change_between_queries() {
        let mut rolling = RollingSum::new();
        for value in 1..=10 {
            rolling.add(f64::from(value));
        }
        assert_eq!(rolling.sum(2), 19.0);
        assert_eq!(rolling.sum(5), 40.0);
        assert_eq!(rolling.sum(2), 19.0);
        assert_eq!(rolling.average(4), 8.5);
    }

    #[test]
    fn empty_stream_answers_zero() {
        let rolling = RollingSum::new();
        assert_eq!(rolling.sum(5), 0.0);
        assert_eq!(rolling.average(5), 0.0);
    }

    #[test]
    fn non_finite_observations_leave_the_window_cleanly() {
        let mut rolling = RollingSum::new();
        let mut variance = RollingVariance::new();
        for value in [1.0, f64::NAN, 2.0, 3.0, 4.0] {
            rolling.add(value);
            variance.add(value);
        }
        assert_eq!(rolling.sum(2), 7.0);
        assert_eq!(rolling.average(3), 3.0);
        // the NaN slot counts as zero while inside the window
        assert_eq!(rolling.sum(4), 9.0);
        assert_close(variance.variance(3), 2.0 / 3.0);

        rolling.add(f64::NEG_INFINITY);
        assert_eq!(rolling.sum(1), 0.0);
        assert_eq!(rolling.sum(3), 7.0);
    }

    #[test]
    fn variance_matches_population_formula() {
        let mut variance = RollingVariance::new();
        for value in [10.0, 11.0, 12.0, 13.0, 14.0] {
            variance.add(value);
        }
        assert_close(variance.mean(5), 12.0);
        assert_close(variance.variance(5), 2.0);
        assert_close(variance.std_dev(5), 2.0_f64.sqrt());
        assert_close(variance.variance(2), 0.25);
    }

    #[test]
    fn constant_series_has_zero_variance() {
        let mut variance = RollingVariance::bounded(4);
        for _ in 0..20 {
            variance.add(3.3);
        }
        assert!(variance.variance(4) >= 0.0);
        assert!(variance.std_dev(4) < 1e-6);
    }
}
