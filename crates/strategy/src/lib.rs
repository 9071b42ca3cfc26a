pub mod breakout;
pub mod indicators;

pub use breakout::compute_signal;
