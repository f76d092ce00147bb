#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Error types for I/O operations.
pub mod error;
pub use error::IoError;

/// High-level image reading and writing functions.
///
/// See [`functional::read_image_any_rgba8`] for automatic format detection and
/// [`functional::write_image_gray8`] for extension based encoding.
pub mod functional;

/// JPEG image encoding.
pub mod jpeg;

/// PNG image encoding.
pub mod png;
