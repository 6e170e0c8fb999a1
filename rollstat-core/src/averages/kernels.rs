//! One-pass batch kernels mapping a whole series to a moving average of equal length.
//!
//! Each kernel drives its streaming counterpart over the input. A zero period or an
//! empty input produces an all-zero output rather than an error; only a mismatched
//! output buffer is rejected.

use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::averages::{Ema, Sma, Wma};
use crate::core::{Indicator, WindowError, WindowResult};

/// Moving-average families available as batch kernels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MovingAverage {
    /// Trailing arithmetic mean.
    Simple,
    /// Linearly weighted mean, newest heaviest.
    Weighted,
    /// Exponential smoothing with `alpha = 2 / (period + 1)`.
    Exponential,
    /// Welles Wilder's smoothing with `alpha = 1 / period`.
    Wilder,
}

impl MovingAverage {
    /// Every supported family.
    pub const ALL: [MovingAverage; 4] = [
        MovingAverage::Simple,
        MovingAverage::Weighted,
        MovingAverage::Exponential,
        MovingAverage::Wilder,
    ];

    /// Short lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            MovingAverage::Simple => "sma",
            MovingAverage::Weighted => "wma",
            MovingAverage::Exponential => "ema",
            MovingAverage::Wilder => "wilder",
        }
    }

    /// Computes the moving average of `input` into a new vector.
    pub fn apply(self, input: &[f64], period: usize) -> Vec<f64> {
        let mut output = vec![0.0; input.len()];
        self.fill(input, &mut output, period);
        output
    }

    /// Computes the moving average of `input` into `output`.
    pub fn apply_into(self, input: &[f64], output: &mut [f64], period: usize) -> WindowResult<()> {
        if output.len() != input.len() {
            return Err(WindowError::length_mismatch(
                self.name(),
                input.len(),
                output.len(),
            ));
        }
        self.fill(input, output, period);
        Ok(())
    }

    /// Writes one value per input slot; callers guarantee equal lengths.
    fn fill(self, input: &[f64], output: &mut [f64], period: usize) {
        match self {
            MovingAverage::Simple => drive(self, input, output, period, Sma::<f64>::new),
            MovingAverage::Weighted => drive(self, input, output, period, Wma::<f64>::new),
            MovingAverage::Exponential => drive(self, input, output, period, Ema::<f64>::new),
            MovingAverage::Wilder => drive(self, input, output, period, Ema::<f64>::wilder),
        }
    }
}

impl fmt::Display for MovingAverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MovingAverage {
    type Err = WindowError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        MovingAverage::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| WindowError::invalid_parameter("MovingAverage", "kind", value))
    }
}

/// Runs a streaming indicator over `input`, or zero-fills on degenerate arguments.
fn drive<F, S>(kind: MovingAverage, input: &[f64], output: &mut [f64], period: usize, build: F)
where
    F: FnOnce(usize) -> WindowResult<S>,
    S: Indicator<Input = f64, Output = f64>,
{
    let indicator = if input.is_empty() { None } else { build(period).ok() };
    let Some(mut indicator) = indicator else {
        debug!(
            kernel = kind.name(),
            period,
            len = input.len(),
            "degenerate kernel input; zero-filling"
        );
        output.fill(0.0);
        return;
    };

    for (slot, &value) in output.iter_mut().zip(input) {
        *slot = indicator.next(value);
    }
}

/// Simple moving average into `output`; early slots average the samples available.
pub fn sma_into(input: &[f64], output: &mut [f64], period: usize) -> WindowResult<()> {
    MovingAverage::Simple.apply_into(input, output, period)
}

/// Linearly weighted moving average into `output`.
pub fn wma_into(input: &[f64], output: &mut [f64], period: usize) -> WindowResult<()> {
    MovingAverage::Weighted.apply_into(input, output, period)
}

/// Exponential moving average into `output`, seeded by the first observation.
pub fn ema_into(input: &[f64], output: &mut [f64], period: usize) -> WindowResult<()> {
    MovingAverage::Exponential.apply_into(input, output, period)
}

/// Wilder's smoothed average into `output`, seeded by the first observation.
pub fn wilder_into(input: &[f64], output: &mut [f64], period: usize) -> WindowResult<()> {
    MovingAverage::Wilder.apply_into(input, output, period)
}

/// Simple moving average of `input`.
pub fn sma(input: &[f64], period: usize) -> Vec<f64> {
    MovingAverage::Simple.apply(input, period)
}

/// Linearly weighted moving average of `input`.
pub fn wma(input: &[f64], period: usize) -> Vec<f64> {
    MovingAverage::Weighted.apply(input, period)
}

/// Exponential moving average of `input`.
pub fn ema(input: &[f64], period: usize) -> Vec<f64> {
    MovingAverage::Exponential.apply(input, period)
}

/// Wilder's smoothed average of `input`.
pub fn wilder(input: &[f64], period: usize) -> Vec<f64> {
    MovingAverage::Wilder.apply(input, period)
}
