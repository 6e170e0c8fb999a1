//! Sliding-window statistics fed one observation per step.
//!
//! Two window contracts coexist. Cumulative structures ([`RollingSum`],
//! [`RollingVariance`], [`RollingCorrelation`]) take the trailing length per query
//! and keep history to answer any of them. Fixed structures ([`FixedWindowMinMax`],
//! [`SlidingOrderStatistics`], [`WindowedSpearman`]) take the length at construction
//! and keep only the window.

pub mod accumulator;
pub mod correlation;
pub mod extrema;
pub mod order_stats;
pub mod rank;
pub mod rolling_sum;

pub use accumulator::{CumulativeAccumulator, Retention};
pub use correlation::RollingCorrelation;
pub use extrema::{
    Extrema, Extreme, FixedWindowMinMax, Highest, Lowest, MonotonicWindow, RollingMax, RollingMin,
};
pub use order_stats::{PercentRank, SlidingOrderStatistics, WindowState};
pub use rank::{mid_ranks, spearman, WindowedSpearman};
pub use rolling_sum::{RollingSum, RollingVariance};
