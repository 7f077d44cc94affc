pub mod sma;
pub mod volatility;

pub use sma::{sma, TrailingSma};
