//! Core traits, input conversion, and the error type shared by every window structure.

use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use thiserror::Error;

/// Result alias used by fallible constructors and `*_into` kernels.
pub type WindowResult<T> = Result<T, WindowError>;

/// Contract violations raised when a structure is misconfigured.
///
/// Degenerate data (short history, zero denominators, non-finite results) is never
/// reported here; queries normalize those cases to `0.0`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WindowError {
    /// A fixed window length of zero was requested.
    #[error("{name} requires a window length greater than zero (got {length})")]
    InvalidLength {
        /// Structure that rejected the length.
        name: &'static str,
        /// Offending length.
        length: usize,
    },
    /// A parameter other than the window length is out of range.
    #[error("{name} received an invalid value for {parameter}: {value}")]
    InvalidParameter {
        /// Structure that rejected the parameter.
        name: &'static str,
        /// Parameter name.
        parameter: &'static str,
        /// Rendered offending value.
        value: String,
    },
    /// An output buffer does not match the input length.
    #[error("{name} output buffer holds {output} slots but the input has {input} values")]
    LengthMismatch {
        /// Kernel that rejected the buffers.
        name: &'static str,
        /// Input length.
        input: usize,
        /// Output length.
        output: usize,
    },
}

impl WindowError {
    /// Builds an [`WindowError::InvalidLength`].
    pub fn invalid_length(name: &'static str, length: usize) -> Self {
        Self::InvalidLength { name, length }
    }

    /// Builds an [`WindowError::InvalidParameter`].
    pub fn invalid_parameter(
        name: &'static str,
        parameter: &'static str,
        value: impl ToString,
    ) -> Self {
        Self::InvalidParameter {
            name,
            parameter,
            value: value.to_string(),
        }
    }

    /// Builds an [`WindowError::LengthMismatch`].
    pub fn length_mismatch(name: &'static str, input: usize, output: usize) -> Self {
        Self::LengthMismatch {
            name,
            input,
            output,
        }
    }
}

/// Rejects zero-length windows at construction time.
pub(crate) fn ensure_length(name: &'static str, length: usize) -> WindowResult<usize> {
    if length == 0 {
        Err(WindowError::invalid_length(name, length))
    } else {
        Ok(length)
    }
}

/// Values that can be fed into a window as a single observation.
pub trait Input {
    /// Returns the observation as an `f64`.
    fn value(&self) -> f64;
}

impl Input for f64 {
    fn value(&self) -> f64 {
        *self
    }
}

impl Input for f32 {
    fn value(&self) -> f64 {
        f64::from(*self)
    }
}

impl Input for Decimal {
    fn value(&self) -> f64 {
        self.to_f64().unwrap_or(f64::NAN)
    }
}

macro_rules! integer_input {
    ($($ty:ty),*) => {
        $(
            impl Input for $ty {
                fn value(&self) -> f64 {
                    self.to_f64().unwrap_or(f64::NAN)
                }
            }
        )*
    };
}

integer_input!(i32, i64, u32, u64, usize);

impl<T: Input + ?Sized> Input for &T {
    fn value(&self) -> f64 {
        (**self).value()
    }
}

/// A streaming computation fed one observation per step.
///
/// Implementors answer after every step; "not enough history" degrades to a result
/// over the samples seen so far instead of withholding output.
pub trait Indicator {
    /// Observation type consumed per step.
    type Input;
    /// Value produced per step.
    type Output;

    /// Feeds the next observation and returns the updated value.
    fn next(&mut self, input: Self::Input) -> Self::Output;

    /// Returns the indicator to its freshly-constructed state.
    fn reset(&mut self);
}

/// Collapses NaN and infinities to zero.
#[inline]
pub(crate) fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Divides, mapping a zero or non-finite denominator to zero.
#[inline]
pub(crate) fn ratio_or_zero(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 || !denominator.is_finite() {
        return 0.0;
    }
    finite_or_zero(numerator / denominator)
}
