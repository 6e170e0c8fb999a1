//! Order statistics over a fixed trailing window.
//!
//! Members live twice: in arrival order, which decides who is evicted, and in a
//! sorted vector, which answers rank queries by binary search. Values are
//! canonicalized on entry (`-0.0` becomes `0.0`, every NaN becomes the canonical
//! NaN) and ordered with [`f64::total_cmp`], so members that compare equal are
//! bit-identical and removing any one of them removes the oldest occurrence.

use std::cmp::Ordering;
use std::collections::VecDeque;
use std::marker::PhantomData;

use crate::core::{ensure_length, Indicator, Input, WindowResult};

/// Fill state of a fixed-length window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowState {
    /// Fewer than `length` observations have arrived.
    Filling,
    /// The window holds exactly `length` observations; every add evicts the oldest.
    Full,
}

/// Multiset of the last `length` observations with logarithmic rank queries.
#[derive(Debug, Clone)]
pub struct SlidingOrderStatistics {
    length: usize,
    arrivals: VecDeque<f64>,
    sorted: Vec<f64>,
}

fn canonical(value: f64) -> f64 {
    if value.is_nan() {
        f64::NAN
    } else if value == 0.0 {
        0.0
    } else {
        value
    }
}

impl SlidingOrderStatistics {
    /// Creates a window over the last `length` observations.
    pub fn new(length: usize) -> WindowResult<Self> {
        let length = ensure_length("SlidingOrderStatistics", length)?;
        Ok(Self {
            length,
            arrivals: VecDeque::with_capacity(length + 1),
            sorted: Vec::with_capacity(length + 1),
        })
    }

    /// Returns the configured window length.
    pub fn length(&self) -> usize {
        self.length
    }

    /// Number of observations currently in the window.
    pub fn len(&self) -> usize {
        self.arrivals.len()
    }

    /// Returns `true` before the first observation.
    pub fn is_empty(&self) -> bool {
        self.arrivals.is_empty()
    }

    /// Returns `true` once the window holds `length` observations.
    pub fn is_full(&self) -> bool {
        self.state() == WindowState::Full
    }

    /// Current fill state.
    pub fn state(&self) -> WindowState {
        if self.arrivals.len() == self.length {
            WindowState::Full
        } else {
            WindowState::Filling
        }
    }

    /// Inserts the newest observation and, once full, evicts the oldest.
    pub fn add(&mut self, value: f64) {
        let value = canonical(value);
        let slot = self.upper_bound(value);
        self.sorted.insert(slot, value);
        self.arrivals.push_back(value);

        if self.arrivals.len() > self.length {
            if let Some(oldest) = self.arrivals.pop_front() {
                let slot = self.lower_bound(oldest);
                debug_assert!(self
                    .sorted
                    .get(slot)
                    .is_some_and(|found| found.total_cmp(&oldest) == Ordering::Equal));
                self.sorted.remove(slot);
            }
        }
    }

    /// Index of the first member ordered at or after `value`.
    fn lower_bound(&self, value: f64) -> usize {
        self.sorted
            .partition_point(|member| member.total_cmp(&value) == Ordering::Less)
    }

    /// Index of the first member ordered strictly after `value`.
    fn upper_bound(&self, value: f64) -> usize {
        self.sorted
            .partition_point(|member| member.total_cmp(&value) != Ordering::Greater)
    }

    /// Number of window members less than or equal to `x`.
    pub fn count_less_than_or_equal(&self, x: f64) -> usize {
        self.upper_bound(canonical(x))
    }

    /// Number of window members strictly less than `x`.
    pub fn count_less_than(&self, x: f64) -> usize {
        self.lower_bound(canonical(x))
    }

    /// Tie-aware rank of `x` within the window, counting from 1.
    ///
    /// A value tied with `k` members occupying ranks `r..r+k-1` receives the mid-rank
    /// `(2r + k - 1) / 2`; a value absent from the window receives the rank it would
    /// take if inserted ahead of its equals.
    pub fn mid_rank(&self, x: f64) -> f64 {
        let below = self.count_less_than(x);
        let through = self.count_less_than_or_equal(x);
        (below + through + 1) as f64 / 2.0
    }

    /// The `k`-th smallest member, counting from 0.
    pub fn nth_smallest(&self, k: usize) -> Option<f64> {
        self.sorted.get(k).copied()
    }

    /// Median of the window, averaging the two middle members for even sizes.
    pub fn median(&self) -> f64 {
        let n = self.sorted.len();
        match n {
            0 => 0.0,
            _ if n % 2 == 1 => self.sorted[n / 2],
            _ => (self.sorted[n / 2 - 1] + self.sorted[n / 2]) / 2.0,
        }
    }

    /// Window members from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.arrivals.iter().copied()
    }

    /// The most recent observation.
    pub fn newest(&self) -> Option<f64> {
        self.arrivals.back().copied()
    }

    /// Empties the window.
    pub fn reset(&mut self) {
        self.arrivals.clear();
        self.sorted.clear();
    }
}

/// Fraction of the window at or below the newest observation, in `(0, 1]`.
#[derive(Debug, Clone)]
pub struct PercentRank<I = f64> {
    window: SlidingOrderStatistics,
    marker: PhantomData<I>,
}

impl<I> PercentRank<I>
where
    I: Input,
{
    /// Creates a percent-rank oscillator over the last `length` observations.
    pub fn new(length: usize) -> WindowResult<Self> {
        ensure_length("PercentRank", length)?;
        Ok(Self {
            window: SlidingOrderStatistics::new(length)?,
            marker: PhantomData,
        })
    }

    /// Read access to the underlying window.
    pub fn window(&self) -> &SlidingOrderStatistics {
        &self.window
    }
}

impl<I> Indicator for PercentRank<I>
where
    I: Input,
{
    type Input = I;
    type Output = f64;

    fn next(&mut self, input: Self::Input) -> Self::Output {
        let value = input.value();
        self.window.add(value);
        let at_or_below = self.window.count_less_than_or_equal(value);
        at_or_below as f64 / self.window.len() as f64
    }

    fn reset(&mut self) {
        self.window.reset();
    }
}
