//! Tie-aware ranking and Spearman rank correlation.

use std::cmp::Ordering;
use std::marker::PhantomData;

use crate::core::{ensure_length, ratio_or_zero, Indicator, Input, WindowResult};
use crate::window::order_stats::SlidingOrderStatistics;

/// Pearson correlation of an iterator of pairs via the sum-of-products form.
fn correlate(pairs: impl Iterator<Item = (f64, f64)>) -> f64 {
    let mut n = 0.0;
    let (mut sx, mut sy, mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0, 0.0, 0.0);
    for (x, y) in pairs {
        n += 1.0;
        sx += x;
        sy += y;
        sxx += x * x;
        syy += y * y;
        sxy += x * y;
    }
    if n <= 1.0 {
        return 0.0;
    }

    let spread_x = n * sxx - sx * sx;
    let spread_y = n * syy - sy * sy;
    if spread_x <= 0.0 || spread_y <= 0.0 {
        return 0.0;
    }
    ratio_or_zero(n * sxy - sx * sy, (spread_x * spread_y).sqrt()).clamp(-1.0, 1.0)
}

/// Ranks `values` from 1, giving each tied group the average of the ranks it spans.
///
/// `[1, 2, 2, 3]` ranks as `[1, 2.5, 2.5, 4]`.
pub fn mid_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| compare(values[a], values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && compare(values[order[start]], values[order[end]]).is_eq() {
            end += 1;
        }
        // Members start..end occupy ranks start+1..=end.
        let rank = (start + 1 + end) as f64 / 2.0;
        for &index in &order[start..end] {
            ranks[index] = rank;
        }
        start = end;
    }
    ranks
}

fn compare(lhs: f64, rhs: f64) -> Ordering {
    if lhs == rhs {
        Ordering::Equal
    } else {
        lhs.total_cmp(&rhs)
    }
}

/// Spearman rank correlation of two series over their shared prefix.
pub fn spearman(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len().min(ys.len());
    let rank_x = mid_ranks(&xs[..n]);
    let rank_y = mid_ranks(&ys[..n]);
    correlate(rank_x.into_iter().zip(rank_y))
}

/// Spearman correlation of the trailing window against time.
///
/// Values receive tie-aware mid-ranks from the window's order statistics and are
/// correlated with their positions `1..=n`, oldest first. Strictly rising windows
/// score `1`, strictly falling windows `-1`.
#[derive(Debug, Clone)]
pub struct WindowedSpearman<I = f64> {
    window: SlidingOrderStatistics,
    marker: PhantomData<I>,
}

impl<I> WindowedSpearman<I>
where
    I: Input,
{
    /// Creates a rank correlation over the last `length` observations.
    pub fn new(length: usize) -> WindowResult<Self> {
        ensure_length("WindowedSpearman", length)?;
        Ok(Self {
            window: SlidingOrderStatistics::new(length)?,
            marker: PhantomData,
        })
    }

    /// Records one observation.
    pub fn add(&mut self, value: f64) {
        self.window.add(value);
    }

    /// Rank correlation of the current window, `0.0` for fewer than two members.
    pub fn rho(&self) -> f64 {
        let window = &self.window;
        correlate(
            window
                .iter()
                .enumerate()
                .map(|(index, value)| (window.mid_rank(value), (index + 1) as f64)),
        )
    }

    /// Mid-ranks of the window members, oldest first.
    pub fn ranks(&self) -> Vec<f64> {
        self.window
            .iter()
            .map(|value| self.window.mid_rank(value))
            .collect()
    }
}

impl<I> Indicator for WindowedSpearman<I>
where
    I: Input,
{
    type Input = I;
    type Output = f64;

    fn next(&mut self, input: Self::Input) -> Self::Output {
        self.add(input.value());
        self.rho()
    }

    fn reset(&mut self) {
        self.window.reset();
    }
}
