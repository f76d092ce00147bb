#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// edge detection pipeline module.
pub mod canny;

/// color reduction module.
pub mod color;

/// pipeline error types.
pub mod error;
pub use error::CannyError;

/// image filtering module.
pub mod filter;

/// gradient magnitude and direction module.
pub mod gradient;

/// edge linking module.
pub mod hysteresis;

/// non-maximum suppression module.
pub mod nms;

/// module containing parallization utilities.
pub mod parallel;

/// operations to threshold images.
pub mod threshold;
