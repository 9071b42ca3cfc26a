pub mod atr;
pub mod ema;

pub use atr::atr_series;
pub use ema::ema_series;
