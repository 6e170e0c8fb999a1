//! Moving averages: streaming indicators and the batch kernels built on them.

pub mod ema;
pub mod kernels;
pub mod sma;
pub mod wma;

pub use ema::Ema;
pub use kernels::{
    ema, ema_into, sma, sma_into, wilder, wilder_into, wma, wma_into, MovingAverage,
};
pub use sma::Sma;
pub use wma::Wma;
