//! Filter operations
//!
//! This module provides the filter bank and the convolution engine of the
//! pipeline. All filters address out-of-range neighbors by replicating the
//! nearest border pixel.

/// Filter kernels
pub mod kernels;

/// Separable filter operations
mod separable_filter;
pub use separable_filter::*;

/// Dense 2D convolution
mod convolution;
pub use convolution::*;

/// Errors produced while building or applying filter kernels.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    /// The kernel size is even or below the minimum.
    #[error("Kernel size must be odd and >= {min}, got {size}")]
    InvalidKernelSize {
        /// The requested size.
        size: usize,
        /// The smallest accepted size.
        min: usize,
    },

    /// The gaussian variance is not strictly positive.
    #[error("Gaussian variance must be > 0, got {0}")]
    InvalidVariance(f32),

    /// The dense kernel data does not form a square.
    #[error("Kernel data of length {0} is not a {1}x{1} square")]
    NonSquareKernel(usize, usize),

    /// An image operation failed.
    #[error(transparent)]
    Image(#[from] canny_image::ImageError),
}

/// Map a possibly out-of-range coordinate to the nearest valid one.
///
/// PRECONDITION: `len > 0`.
#[inline]
pub(crate) fn replicate_index(i: isize, len: usize) -> usize {
    i.clamp(0, len as isize - 1) as usize
}

/// Conversion of pixel values to and from the f32 accumulator of the filters.
pub trait FloatConversion {
    /// Convert the type to f32
    fn to_f32(&self) -> f32;
    /// Convert the type from f32, rounding and saturating if needed.
    fn from_f32(val: f32) -> Self;
}

impl FloatConversion for f32 {
    fn to_f32(&self) -> f32 {
        *self
    }

    fn from_f32(val: f32) -> Self {
        val
    }
}

impl FloatConversion for u8 {
    fn to_f32(&self) -> f32 {
        *self as f32
    }

    fn from_f32(val: f32) -> Self {
        val.round().clamp(0.0, 255.0) as u8
    }
}

impl FloatConversion for i16 {
    fn to_f32(&self) -> f32 {
        *self as f32
    }

    fn from_f32(val: f32) -> Self {
        val.round().clamp(i16::MIN as f32, i16::MAX as f32) as i16
    }
}
