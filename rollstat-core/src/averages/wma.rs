//! Weighted Moving Average (WMA) with linear weights.

use std::collections::VecDeque;
use std::marker::PhantomData;

use crate::core::{ensure_length, finite_or_zero, Indicator, Input, WindowResult};

/// Linearly weighted mean: the newest of `k` samples carries weight `k`, the oldest `1`.
///
/// Once warmed up `k == period` and the weights sum to `period * (period + 1) / 2`.
/// During warm-up the weights run `1..=k` over the samples seen so far. Non-finite
/// observations enter the window as `0.0`.
#[derive(Debug, Clone)]
pub struct Wma<I = f64> {
    period: usize,
    sum: f64,
    weighted_sum: f64,
    window: VecDeque<f64>,
    marker: PhantomData<I>,
}

impl<I> Wma<I>
where
    I: Input,
{
    /// Creates a new WMA with the provided period.
    pub fn new(period: usize) -> WindowResult<Self> {
        let period = ensure_length("WMA", period)?;
        Ok(Self {
            period,
            sum: 0.0,
            weighted_sum: 0.0,
            window: VecDeque::with_capacity(period),
            marker: PhantomData,
        })
    }

    /// Returns the configured lookback period.
    pub fn period(&self) -> usize {
        self.period
    }
}

impl<I> Indicator for Wma<I>
where
    I: Input,
{
    type Input = I;
    type Output = f64;

    fn next(&mut self, input: Self::Input) -> Self::Output {
        let value = finite_or_zero(input.value());

        if self.window.len() == self.period {
            // Every retained sample loses one unit of weight; the oldest drops to zero.
            self.weighted_sum -= self.sum;
            if let Some(oldest) = self.window.pop_front() {
                self.sum -= oldest;
            }
        }

        self.window.push_back(value);
        let k = self.window.len() as f64;
        self.weighted_sum += k * value;
        self.sum += value;

        self.weighted_sum / (k * (k + 1.0) / 2.0)
    }

    fn reset(&mut self) {
        self.sum = 0.0;
        self.weighted_sum = 0.0;
        self.window.clear();
    }
}
