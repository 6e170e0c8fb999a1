//! Rolling maximum and minimum over a fixed trailing window using a monotonic deque.
//!
//! The deque holds `(position, value)` candidates that can still become the window
//! extreme. Positions increase from front to back and values are strictly ordered in
//! the extreme's favour, so the front is always the answer. Every observation is
//! pushed and popped at most once, which makes `add` amortized O(1).

use std::collections::VecDeque;
use std::marker::PhantomData;

use crate::core::{ensure_length, Indicator, Input, WindowResult};

/// Decides which of two observations wins a rolling extreme.
pub trait Extreme {
    /// Name used in error messages.
    const NAME: &'static str;

    /// Returns `true` when `incoming` makes the older `candidate` irrelevant.
    fn dominates(incoming: f64, candidate: f64) -> bool;
}

/// Selects the largest value in the window.
#[derive(Debug, Clone, Copy, Default)]
pub struct Highest;

impl Extreme for Highest {
    const NAME: &'static str = "RollingMax";

    fn dominates(incoming: f64, candidate: f64) -> bool {
        incoming >= candidate
    }
}

/// Selects the smallest value in the window.
#[derive(Debug, Clone, Copy, Default)]
pub struct Lowest;

impl Extreme for Lowest {
    const NAME: &'static str = "RollingMin";

    fn dominates(incoming: f64, candidate: f64) -> bool {
        incoming <= candidate
    }
}

/// One-sided rolling extreme over the last `length` observations.
#[derive(Debug, Clone)]
pub struct MonotonicWindow<E, I = f64> {
    length: usize,
    seen: usize,
    candidates: VecDeque<(usize, f64)>,
    marker: PhantomData<(E, I)>,
}

/// Rolling maximum over a fixed trailing window.
pub type RollingMax<I = f64> = MonotonicWindow<Highest, I>;
/// Rolling minimum over a fixed trailing window.
pub type RollingMin<I = f64> = MonotonicWindow<Lowest, I>;

impl<E, I> MonotonicWindow<E, I>
where
    E: Extreme,
{
    /// Creates a window covering the last `length` observations.
    pub fn new(length: usize) -> WindowResult<Self> {
        let length = ensure_length(E::NAME, length)?;
        Ok(Self {
            length,
            seen: 0,
            candidates: VecDeque::with_capacity(length),
            marker: PhantomData,
        })
    }

    /// Returns the configured window length.
    pub fn length(&self) -> usize {
        self.length
    }

    /// Records one observation. NaN advances the window but never becomes the extreme.
    pub fn add(&mut self, value: f64) {
        let position = self.seen;
        self.seen += 1;

        if !value.is_nan() {
            while let Some(&(_, back)) = self.candidates.back() {
                if E::dominates(value, back) {
                    self.candidates.pop_back();
                } else {
                    break;
                }
            }
            self.candidates.push_back((position, value));
        }

        while let Some(&(front, _)) = self.candidates.front() {
            if front + self.length < self.seen {
                self.candidates.pop_front();
            } else {
                break;
            }
        }
    }

    /// Extreme of the last `min(length, seen)` observations, or `0.0` when none qualify.
    pub fn value(&self) -> f64 {
        self.candidates
            .front()
            .map(|&(_, value)| value)
            .unwrap_or(0.0)
    }

    /// How many steps ago the current extreme was observed.
    pub fn periods_since(&self) -> Option<usize> {
        self.candidates
            .front()
            .map(|&(position, _)| self.seen - 1 - position)
    }

    /// Number of candidates currently retained.
    pub fn candidates(&self) -> usize {
        self.candidates.len()
    }

    /// Clears the window.
    pub fn reset(&mut self) {
        self.seen = 0;
        self.candidates.clear();
    }
}

impl<E, I> Indicator for MonotonicWindow<E, I>
where
    E: Extreme,
    I: Input,
{
    type Input = I;
    type Output = f64;

    fn next(&mut self, input: Self::Input) -> Self::Output {
        self.add(input.value());
        self.value()
    }

    fn reset(&mut self) {
        MonotonicWindow::reset(self);
    }
}

/// Both extremes of the window after one step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extrema {
    /// Largest value in the window.
    pub max: f64,
    /// Smallest value in the window.
    pub min: f64,
}

/// Rolling maximum and minimum over the same fixed trailing window.
#[derive(Debug, Clone)]
pub struct FixedWindowMinMax<I = f64> {
    highest: RollingMax,
    lowest: RollingMin,
    marker: PhantomData<I>,
}

impl<I> FixedWindowMinMax<I>
where
    I: Input,
{
    /// Creates a min/max window covering the last `length` observations.
    pub fn new(length: usize) -> WindowResult<Self> {
        ensure_length("FixedWindowMinMax", length)?;
        Ok(Self {
            highest: RollingMax::new(length)?,
            lowest: RollingMin::new(length)?,
            marker: PhantomData,
        })
    }

    /// Returns the configured window length.
    pub fn length(&self) -> usize {
        self.highest.length()
    }

    /// Records one observation.
    pub fn add(&mut self, value: f64) {
        self.highest.add(value);
        self.lowest.add(value);
    }

    /// Largest value in the window.
    pub fn max(&self) -> f64 {
        self.highest.value()
    }

    /// Smallest value in the window.
    pub fn min(&self) -> f64 {
        self.lowest.value()
    }

    /// Steps since the current maximum was observed.
    pub fn periods_since_max(&self) -> Option<usize> {
        self.highest.periods_since()
    }

    /// Steps since the current minimum was observed.
    pub fn periods_since_min(&self) -> Option<usize> {
        self.lowest.periods_since()
    }

    /// Both extremes at once.
    pub fn extrema(&self) -> Extrema {
        Extrema {
            max: self.max(),
            min: self.min(),
        }
    }
}

impl<I> Indicator for FixedWindowMinMax<I>
where
    I: Input,
{
    type Input = I;
    type Output = Extrema;

    fn next(&mut self, input: Self::Input) -> Self::Output {
        self.add(input.value());
        self.extrema()
    }

    fn reset(&mut self) {
        self.highest.reset();
        self.lowest.reset();
    }
}
