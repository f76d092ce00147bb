use canny_image::{Image, ImageError};

use crate::parallel::{self, ExecutionStrategy};

/// One of the four canonical gradient orientations used by non-maximum suppression.
///
/// Image coordinates have `y` pointing down, so an angle of `+45°` points to the
/// bottom-right neighbor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradientOrientation {
    /// Gradient along the x axis, angle within 22.5° of 0° or 180°.
    Horizontal,
    /// Gradient towards the bottom-right or top-left, angle near 45°.
    Diagonal,
    /// Gradient along the y axis, angle near 90°.
    Vertical,
    /// Gradient towards the bottom-left or top-right, angle near 135°.
    AntiDiagonal,
}

impl GradientOrientation {
    /// Quantize an angle in radians, as returned by `atan2(gy, gx)`.
    ///
    /// Opposite directions fall in the same bucket. Non-finite angles map to
    /// [`GradientOrientation::Horizontal`].
    pub fn from_angle(angle: f32) -> Self {
        if !angle.is_finite() {
            return GradientOrientation::Horizontal;
        }

        let deg = angle.to_degrees().rem_euclid(180.0);
        if !(22.5..157.5).contains(&deg) {
            GradientOrientation::Horizontal
        } else if deg < 67.5 {
            GradientOrientation::Diagonal
        } else if deg < 112.5 {
            GradientOrientation::Vertical
        } else {
            GradientOrientation::AntiDiagonal
        }
    }

    /// The `(dx, dy)` offsets of the two neighbors lying along the orientation.
    pub fn neighbor_offsets(&self) -> [(isize, isize); 2] {
        match self {
            GradientOrientation::Horizontal => [(1, 0), (-1, 0)],
            GradientOrientation::Diagonal => [(1, 1), (-1, -1)],
            GradientOrientation::Vertical => [(0, 1), (0, -1)],
            GradientOrientation::AntiDiagonal => [(-1, 1), (1, -1)],
        }
    }
}

/// Per-pixel gradient magnitude and direction.
///
/// Both images are co-indexed and have the size of the derivative images they
/// were built from.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientField {
    /// `sqrt(gx² + gy²)` rounded and saturated to 255.
    pub magnitude: Image<u8, 1>,
    /// `atan2(gy, gx)` in radians, in `[-π, π]`.
    pub direction: Image<f32, 1>,
}

/// Gradient magnitude of a pair of derivatives, saturated to the `u8` range.
#[inline]
pub fn magnitude_u8(gx: i16, gy: i16) -> u8 {
    let gx = gx as f32;
    let gy = gy as f32;
    (gx * gx + gy * gy).sqrt().round().min(255.0) as u8
}

/// Compute the gradient magnitude image.
///
/// # Arguments
///
/// * `gx` - The derivative along x.
/// * `gy` - The derivative along y.
/// * `dst` - The magnitude image.
/// * `strategy` - The execution strategy.
pub fn gradient_magnitude(
    gx: &Image<i16, 1>,
    gy: &Image<i16, 1>,
    dst: &mut Image<u8, 1>,
    strategy: ExecutionStrategy,
) -> Result<(), ImageError> {
    check_same_size(gx, gy)?;
    check_same_size(gx, dst)?;

    parallel::iter_rows_val_two(gx, gy, dst, strategy, |&x, &y, m| {
        *m = magnitude_u8(x, y);
    });

    Ok(())
}

/// Compute the gradient direction image in radians.
///
/// # Arguments
///
/// * `gx` - The derivative along x.
/// * `gy` - The derivative along y.
/// * `dst` - The direction image.
/// * `strategy` - The execution strategy.
pub fn gradient_direction(
    gx: &Image<i16, 1>,
    gy: &Image<i16, 1>,
    dst: &mut Image<f32, 1>,
    strategy: ExecutionStrategy,
) -> Result<(), ImageError> {
    check_same_size(gx, gy)?;
    check_same_size(gx, dst)?;

    parallel::iter_rows_val_two(gx, gy, dst, strategy, |&x, &y, d| {
        *d = (y as f32).atan2(x as f32);
    });

    Ok(())
}

/// Combine the derivatives into a [`GradientField`].
///
/// # Arguments
///
/// * `gx` - The derivative along x.
/// * `gy` - The derivative along y.
/// * `strategy` - The execution strategy.
pub fn gradient_field(
    gx: &Image<i16, 1>,
    gy: &Image<i16, 1>,
    strategy: ExecutionStrategy,
) -> Result<GradientField, ImageError> {
    let mut magnitude = Image::from_size_val(gx.size(), 0u8)?;
    gradient_magnitude(gx, gy, &mut magnitude, strategy)?;

    let mut direction = Image::from_size_val(gx.size(), 0f32)?;
    gradient_direction(gx, gy, &mut direction, strategy)?;

    Ok(GradientField {
        magnitude,
        direction,
    })
}

fn check_same_size<T1, T2>(a: &Image<T1, 1>, b: &Image<T2, 1>) -> Result<(), ImageError> {
    if a.size() != b.size() {
        return Err(ImageError::InvalidImageSize(
            a.cols(),
            a.rows(),
            b.cols(),
            b.rows(),
        ));
    }
    Ok(())
}
