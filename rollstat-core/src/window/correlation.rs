//! Windowed Pearson correlation and covariance of two paired streams.

use crate::core::{finite_or_zero, ratio_or_zero};
use crate::window::accumulator::{CumulativeAccumulator, Retention};

/// Pearson correlation over the last `length` `(x, y)` pairs, with `length` chosen
/// per query.
///
/// Five cumulative totals (Σx, Σy, Σx², Σy², Σxy) are kept so any trailing length is
/// answered in constant time. The sum-of-squares form loses precision on long
/// windows of large, nearly equal values; a spread within the rounding error of the
/// running totals counts as a constant side.
#[derive(Debug, Clone, Default)]
pub struct RollingCorrelation {
    sum_x: CumulativeAccumulator,
    sum_y: CumulativeAccumulator,
    sum_xx: CumulativeAccumulator,
    sum_yy: CumulativeAccumulator,
    sum_xy: CumulativeAccumulator,
}

/// Multiple of machine epsilon allowed per rounding step when judging a spread.
const SPREAD_TOLERANCE: f64 = 4.0;

#[derive(Debug, Clone, Copy)]
struct WindowSums {
    n: f64,
    x: f64,
    y: f64,
    xx: f64,
    yy: f64,
    xy: f64,
    /// Rounding bound on `n·Σx² − (Σx)²`.
    noise_x: f64,
    /// Rounding bound on `n·Σy² − (Σy)²`.
    noise_y: f64,
}

impl WindowSums {
    fn spread_x(&self) -> Option<f64> {
        let spread = self.n * self.xx - self.x * self.x;
        (spread > self.noise_x).then_some(spread)
    }

    fn spread_y(&self) -> Option<f64> {
        let spread = self.n * self.yy - self.y * self.y;
        (spread > self.noise_y).then_some(spread)
    }
}

/// Window sums come from differencing running totals, so their error scales with
/// the totals and the number of additions between the two snapshots.
fn spread_noise(
    n: f64,
    sum: f64,
    totals: &CumulativeAccumulator,
    squares: &CumulativeAccumulator,
) -> f64 {
    let magnitude = n * squares.total().abs() + 2.0 * sum.abs() * totals.total().abs();
    SPREAD_TOLERANCE * f64::EPSILON * (n + 1.0) * magnitude
}

impl RollingCorrelation {
    /// Creates a correlation that can answer any trailing length.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a correlation retaining history for lengths up to `max_length`.
    pub fn bounded(max_length: usize) -> Self {
        let accumulator = || CumulativeAccumulator::with_retention(Retention::Bounded(max_length));
        Self {
            sum_x: accumulator(),
            sum_y: accumulator(),
            sum_xx: accumulator(),
            sum_yy: accumulator(),
            sum_xy: accumulator(),
        }
    }

    /// Records one pair. Non-finite coordinates are recorded as `0.0`.
    pub fn add(&mut self, x: f64, y: f64) {
        let (x, y) = (finite_or_zero(x), finite_or_zero(y));
        self.sum_x.add(x);
        self.sum_y.add(y);
        self.sum_xx.add(x * x);
        self.sum_yy.add(y * y);
        self.sum_xy.add(x * y);
    }

    /// Number of pairs recorded so far.
    pub fn count(&self) -> usize {
        self.sum_x.count()
    }

    fn sums(&self, length: usize) -> Option<WindowSums> {
        let n = self.sum_x.effective_length(length);
        if n == 0 {
            return None;
        }
        let count = n as f64;
        let x = self.sum_x.window(n);
        let y = self.sum_y.window(n);
        Some(WindowSums {
            n: count,
            x,
            y,
            xx: self.sum_xx.window(n),
            yy: self.sum_yy.window(n),
            xy: self.sum_xy.window(n),
            noise_x: spread_noise(count, x, &self.sum_x, &self.sum_xx),
            noise_y: spread_noise(count, y, &self.sum_y, &self.sum_yy),
        })
    }

    /// Pearson correlation coefficient of the last `length` pairs.
    ///
    /// Returns `0.0` for fewer than two pairs, a constant side, or a non-finite result.
    pub fn r(&self, length: usize) -> f64 {
        let Some(s) = self.sums(length) else {
            return 0.0;
        };
        if s.n < 2.0 {
            return 0.0;
        }

        let (Some(spread_x), Some(spread_y)) = (s.spread_x(), s.spread_y()) else {
            return 0.0;
        };
        let numerator = s.n * s.xy - s.x * s.y;
        ratio_or_zero(numerator, (spread_x * spread_y).sqrt()).clamp(-1.0, 1.0)
    }

    /// Population covariance of the last `length` pairs; `0.0` when either side is constant.
    pub fn covariance(&self, length: usize) -> f64 {
        let Some(s) = self.sums(length) else {
            return 0.0;
        };
        if s.spread_x().is_none() || s.spread_y().is_none() {
            return 0.0;
        }
        let mean_x = s.x / s.n;
        let mean_y = s.y / s.n;
        finite_or_zero(ratio_or_zero(s.xy, s.n) - mean_x * mean_y)
    }

    /// Forgets every recorded pair.
    pub fn reset(&mut self) {
        self.sum_x.reset();
        self.sum_y.reset();
        self.sum_xx.reset();
        self.sum_yy.reset();
        self.sum_xy.reset();
    }
}
