//! Data preprocessing module
//!
//! Feature standardization applied before fitting and at prediction time.

mod scaler;

pub use scaler::StandardScaler;
