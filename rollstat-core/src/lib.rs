#![deny(missing_docs)]
#![doc = include_str!("../README.md")]

//! Streaming sliding-window statistics and moving-average kernels for indicator loops.

/// Moving averages: streaming indicators and batch kernels.
pub mod averages;
/// Indicator composition helpers such as `PipedIndicator`.
pub mod combinators;
/// Foundational traits, input conversion, and the error type.
pub mod core;
/// Sliding-window statistics structures.
pub mod window;

/// Re-export of the piped indicator combinator for convenience.
pub use crate::combinators::PipedIndicator;
/// Re-export of the core traits and error type to make the crate easy to consume.
pub use crate::core::{Indicator, Input, WindowError, WindowResult};
/// Re-export of the moving-average selector.
pub use crate::averages::MovingAverage;
/// Re-export of every window structure.
pub use crate::window::{
    mid_ranks, spearman, CumulativeAccumulator, Extrema, FixedWindowMinMax, PercentRank,
    Retention, RollingCorrelation, RollingMax, RollingMin, RollingSum, RollingVariance,
    SlidingOrderStatistics, WindowState, WindowedSpearman,
};
