use canny_image::{Image, ImageError};

use crate::parallel::{self, ExecutionStrategy};

/// The class of a pixel after double thresholding.
///
/// The discriminants are the values written into a classified map, so the map
/// can be saved and inspected as a regular grayscale image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EdgeClass {
    /// Below the low threshold.
    NonEdge = 0,
    /// Between the low and the high threshold. Kept only if linked to a strong pixel.
    Weak = 128,
    /// At or above the high threshold.
    Strong = 255,
}

impl EdgeClass {
    /// Classify a magnitude against the `[low, high)` band.
    ///
    /// PRECONDITION: `low <= high`.
    #[inline]
    pub fn from_magnitude(magnitude: u8, low: u16, high: u16) -> Self {
        let m = magnitude as u16;
        if m >= high {
            EdgeClass::Strong
        } else if m >= low {
            EdgeClass::Weak
        } else {
            EdgeClass::NonEdge
        }
    }

    /// Decode a classified map value. Values other than the three encodings are
    /// treated as [`EdgeClass::NonEdge`].
    #[inline]
    pub fn from_value(value: u8) -> Self {
        match value {
            v if v == EdgeClass::Strong as u8 => EdgeClass::Strong,
            v if v == EdgeClass::Weak as u8 => EdgeClass::Weak,
            _ => EdgeClass::NonEdge,
        }
    }

    /// The map encoding of the class.
    #[inline]
    pub fn value(self) -> u8 {
        self as u8
    }
}

/// Apply a double threshold to a thinned magnitude image.
///
/// Every pixel of `dst` receives the [`EdgeClass`] encoding of the matching
/// pixel of `src`.
///
/// # Arguments
///
/// * `src` - The thinned gradient magnitude.
/// * `dst` - The classified map.
/// * `low` - The low threshold, inclusive.
/// * `high` - The high threshold, inclusive. Must be `>= low`.
/// * `strategy` - The execution strategy.
///
/// # Example
///
/// ```
/// use canny_image::Image;
/// use canny_imgproc::parallel::ExecutionStrategy;
/// use canny_imgproc::threshold::classify;
///
/// let thin = Image::<u8, 1>::new([4, 1].into(), vec![10, 50, 99, 100]).unwrap();
/// let mut classified = Image::<u8, 1>::from_size_val(thin.size(), 0).unwrap();
///
/// classify(&thin, &mut classified, 50, 100, ExecutionStrategy::Serial).unwrap();
/// assert_eq!(classified.as_slice(), &[0, 128, 128, 255]);
/// ```
pub fn classify(
    src: &Image<u8, 1>,
    dst: &mut Image<u8, 1>,
    low: u16,
    high: u16,
    strategy: ExecutionStrategy,
) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    parallel::iter_rows_val(src, dst, strategy, |&m, class| {
        *class = EdgeClass::from_magnitude(m, low, high).value();
    });

    Ok(())
}
