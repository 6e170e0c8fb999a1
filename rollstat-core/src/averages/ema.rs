//! Exponential Moving Average (EMA) and Welles Wilder's smoothing.

use std::marker::PhantomData;

use crate::core::{ensure_length, Indicator, Input, WindowResult};

/// Exponentially-weighted moving average seeded by the first observation.
///
/// [`Ema::new`] uses `alpha = 2 / (period + 1)`; [`Ema::wilder`] uses
/// `alpha = 1 / period`, the smoothing behind RSI, ATR, and ADX. Non-finite
/// observations leave the average unchanged.
#[derive(Debug, Clone)]
pub struct Ema<I = f64> {
    period: usize,
    alpha: f64,
    state: Option<f64>,
    marker: PhantomData<I>,
}

impl<I> Ema<I>
where
    I: Input,
{
    /// Creates a new EMA with the provided period.
    pub fn new(period: usize) -> WindowResult<Self> {
        let period = ensure_length("EMA", period)?;
        Ok(Self::with_alpha(period, 2.0 / (period as f64 + 1.0)))
    }

    /// Creates Wilder's smoothed average with the provided period.
    pub fn wilder(period: usize) -> WindowResult<Self> {
        let period = ensure_length("Wilder", period)?;
        Ok(Self::with_alpha(period, 1.0 / period as f64))
    }

    fn with_alpha(period: usize, alpha: f64) -> Self {
        Self {
            period,
            alpha,
            state: None,
            marker: PhantomData,
        }
    }

    /// Returns the configured lookback period.
    pub fn period(&self) -> usize {
        self.period
    }

    /// Returns the smoothing factor.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Returns the current average, if any observation has arrived.
    pub fn value(&self) -> Option<f64> {
        self.state
    }
}

impl<I> Indicator for Ema<I>
where
    I: Input,
{
    type Input = I;
    type Output = f64;

    fn next(&mut self, input: Self::Input) -> Self::Output {
        let value = input.value();
        if !value.is_finite() {
            return self.state.unwrap_or(0.0);
        }
        let next = match self.state {
            Some(current) => (value - current) * self.alpha + current,
            None => value,
        };
        self.state = Some(next);
        next
    }

    fn reset(&mut self) {
        self.state = None;
    }
}

#[cfg(test)]
mod tests {
    use super::Ema;
    use crate::{Indicator, PipedIndicator};

    fn assert_close(lhs: f64, rhs: f64) {
        assert!((lhs - rhs).abs() <= 1e-12, "{lhs} != {rhs}");
    }

    #[test]
    fn seeds_with_the_first_observation() {
        let mut ema = Ema::<f64>::new(3).unwrap();
        assert_eq!(ema.value(), None);
        assert_eq!(ema.next(10.0), 10.0);
        assert_eq!(ema.value(), Some(10.0));
    }

    #[test]
    fn updates_in_constant_time() {
        let mut ema = Ema::<f64>::new(3).unwrap();
        ema.next(2.0);
        // Alpha = 0.5 for period 3, so next value is 0.5*(4-2)+2 = 3
        assert_close(ema.next(4.0), 3.0);
    }

    #[test]
    fn non_finite_inputs_are_skipped() {
        let mut ema = Ema::<f64>::new(3).unwrap();
        assert_eq!(ema.next(f64::NAN), 0.0);
        assert_eq!(ema.value(), None);
        ema.next(2.0);
        assert_eq!(ema.next(f64::INFINITY), 2.0);
        assert_close(ema.next(4.0), 3.0);
    }

    #[test]
    fn wilder_uses_reciprocal_period() {
        let mut wilder = Ema::<f64>::wilder(4).unwrap();
        assert_close(wilder.alpha(), 0.25);
        wilder.next(8.0);
        assert_close(wilder.next(16.0), 10.0);
    }

    #[test]
    fn double_smoothing_through_a_pipe() {
        let mut double = PipedIndicator::new(
            Ema::<f64>::new(3).unwrap(),
            Ema::<f64>::new(3).unwrap(),
        );
        assert_close(double.next(2.0), 2.0);
        // inner: 3.0, outer: 0.5*(3-2)+2 = 2.5
        assert_close(double.next(4.0), 2.5);
    }

    #[test]
    fn reset_clears_state() {
        let mut ema = Ema::<f64>::new(2).unwrap();
        ema.next(1.0);
        ema.next(2.0);
        ema.reset();
        assert_eq!(ema.next(4.0), 4.0);
    }
}
