use canny_image::ImageError;

use crate::filter::FilterError;

/// Errors returned by the edge detection pipeline.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CannyError {
    /// The smoothing kernel width is even or smaller than 3.
    #[error("Smoothing kernel width must be odd and >= 3, got {0}")]
    InvalidSmoothingWidth(usize),

    /// The gradient kernel width is even or smaller than 3.
    #[error("Gradient kernel width must be odd and >= 3, got {0}")]
    InvalidGradientWidth(usize),

    /// The smoothing variance is not strictly positive.
    #[error("Smoothing variance must be > 0, got {0}")]
    InvalidVariance(f32),

    /// The high threshold is below the low threshold.
    #[error("High threshold ({high}) must be >= low threshold ({low})")]
    InvalidThresholds {
        /// The low threshold.
        low: u16,
        /// The high threshold.
        high: u16,
    },

    /// The input image has zero width or height.
    #[error("Input image has zero width or height ({0}x{1})")]
    EmptyImage(usize, usize),

    /// A filter could not be built or applied.
    #[error(transparent)]
    Filter(#[from] FilterError),

    /// An image operation failed.
    #[error(transparent)]
    Image(#[from] ImageError),
}
