//! Simple Moving Average (SMA).

use std::collections::VecDeque;
use std::marker::PhantomData;

use crate::core::{ensure_length, finite_or_zero, Indicator, Input, WindowResult};

/// Arithmetic mean over a rolling window.
///
/// Before `period` observations exist the mean covers every observation seen so far.
/// Non-finite observations enter the window as `0.0`.
#[derive(Debug, Clone)]
pub struct Sma<I = f64> {
    period: usize,
    sum: f64,
    window: VecDeque<f64>,
    marker: PhantomData<I>,
}

impl<I> Sma<I>
where
    I: Input,
{
    /// Creates a new SMA with the provided period.
    pub fn new(period: usize) -> WindowResult<Self> {
        let period = ensure_length("SMA", period)?;
        Ok(Self {
            period,
            sum: 0.0,
            window: VecDeque::with_capacity(period + 1),
            marker: PhantomData,
        })
    }

    /// Returns the configured lookback period.
    pub fn period(&self) -> usize {
        self.period
    }
}

impl<I> Indicator for Sma<I>
where
    I: Input,
{
    type Input = I;
    type Output = f64;

    fn next(&mut self, input: Self::Input) -> Self::Output {
        let value = finite_or_zero(input.value());
        self.window.push_back(value);
        self.sum += value;

        if self.window.len() > self.period {
            if let Some(oldest) = self.window.pop_front() {
                self.sum -= oldest;
            }
        }

        self.sum / self.window.len() as f64
    }

    fn reset(&mut self) {
        self.sum = 0.0;
        self.window.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rust_decimal::Decimal;

    use super::Sma;
    use crate::Indicator;

    #[test]
    fn averages_available_samples_during_warmup() {
        let mut sma = Sma::<f64>::new(3).unwrap();
        assert_eq!(sma.next(1.0), 1.0);
        assert_eq!(sma.next(2.0), 1.5);
        assert_eq!(sma.next(3.0), 2.0);
    }

    #[test]
    fn rolls_forward_in_constant_time() {
        let mut sma = Sma::<f64>::new(3).unwrap();
        sma.next(1.0);
        sma.next(2.0);
        sma.next(3.0);
        assert_eq!(sma.next(4.0), 3.0);
        assert_eq!(sma.next(5.0), 4.0);
    }

    #[test]
    fn accepts_decimal_observations() {
        let mut sma = Sma::<Decimal>::new(2).unwrap();
        sma.next(Decimal::from_str("1.5").unwrap());
        assert_eq!(sma.next(Decimal::from_str("2.5").unwrap()), 2.0);
    }

    #[test]
    fn non_finite_inputs_do_not_stick() {
        let mut sma = Sma::<f64>::new(2).unwrap();
        let outputs: Vec<f64> = [1.0, f64::NAN, 2.0, 3.0, 4.0]
            .into_iter()
            .map(|value| sma.next(value))
            .collect();
        assert_eq!(outputs, vec![1.0, 0.5, 1.0, 2.5, 3.5]);
    }

    #[test]
    fn reset_clears_internal_state() {
        let mut sma = Sma::<f64>::new(2).unwrap();
        sma.next(5.0);
        sma.next(7.0);
        assert_eq!(sma.next(9.0), 8.0);
        sma.reset();
        assert_eq!(sma.next(9.0), 9.0);
    }
}
