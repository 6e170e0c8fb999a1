//! Cumulative totals answering trailing-window aggregates by differencing snapshots.

use std::collections::VecDeque;

use crate::core::finite_or_zero;

/// How many cumulative snapshots an accumulator keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Retention {
    /// Keep every snapshot so any trailing length can be answered.
    #[default]
    Full,
    /// Keep enough snapshots to answer trailing lengths up to the given bound.
    /// Longer queries clamp to the bound.
    Bounded(usize),
}

/// Running total of a stream with enough history to answer "total of the last
/// `length` observations" at any later step.
///
/// `totals[k]` holds the total of every observation up to and including global
/// position `offset + k`; differencing two snapshots yields a window aggregate in
/// constant time regardless of `length`.
#[derive(Debug, Clone, Default)]
pub struct CumulativeAccumulator {
    totals: VecDeque<f64>,
    running: f64,
    seen: usize,
    retention: Retention,
}

impl CumulativeAccumulator {
    /// Creates an accumulator that retains its full history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an accumulator with the provided retention policy.
    ///
    /// `Retention::Bounded(0)` behaves like an accumulator that can only answer
    /// empty windows.
    pub fn with_retention(retention: Retention) -> Self {
        Self {
            retention,
            ..Self::default()
        }
    }

    /// Records one observation. Non-finite values occupy a position but add nothing.
    pub fn add(&mut self, value: f64) {
        self.running += finite_or_zero(value);
        self.totals.push_back(self.running);
        self.seen += 1;

        if let Retention::Bounded(max_length) = self.retention {
            while self.totals.len() > max_length + 1 {
                self.totals.pop_front();
            }
        }
    }

    /// Number of observations recorded so far.
    pub fn count(&self) -> usize {
        self.seen
    }

    /// Largest trailing length the accumulator can currently answer.
    pub fn available(&self) -> usize {
        match self.retention {
            Retention::Full => self.seen,
            Retention::Bounded(max_length) => self.seen.min(max_length),
        }
    }

    /// Number of observations a query for `length` actually covers.
    pub fn effective_length(&self, length: usize) -> usize {
        length.min(self.available())
    }

    /// Total of the last `length` observations, or of all of them when fewer exist.
    pub fn window(&self, length: usize) -> f64 {
        let length = self.effective_length(length);
        if length == 0 {
            return 0.0;
        }

        let end = self.running;
        if length == self.seen {
            return end;
        }

        // Snapshot just before the window starts, at global position seen - length - 1.
        let offset = self.seen - self.totals.len();
        let before = self.seen - length - 1;
        match before
            .checked_sub(offset)
            .and_then(|index| self.totals.get(index))
        {
            Some(start) => end - start,
            None => 0.0,
        }
    }

    /// Total of every observation recorded so far, including those no longer retained.
    pub fn total(&self) -> f64 {
        self.running
    }

    /// Clears all recorded observations, keeping the retention policy.
    pub fn reset(&mut self) {
        self.totals.clear();
        self.running = 0.0;
        self.seen = 0;
    }
}
