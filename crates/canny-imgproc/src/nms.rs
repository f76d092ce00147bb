use canny_image::{Image, ImageError};

use crate::gradient::{GradientField, GradientOrientation};
use crate::parallel::{self, ExecutionStrategy};

/// Thin a gradient magnitude image to its ridges.
///
/// For every interior pixel the magnitude is compared with the two neighbors
/// lying along the quantized gradient direction (see
/// [`GradientOrientation::from_angle`]). The magnitude is kept when it is
/// greater than or equal to both neighbors and set to zero otherwise. Pixels on
/// the image border are always set to zero.
///
/// # Arguments
///
/// * `magnitude` - The gradient magnitude.
/// * `direction` - The gradient direction in radians.
/// * `dst` - The thinned magnitude.
/// * `strategy` - The execution strategy.
pub fn non_maximum_suppression(
    magnitude: &Image<u8, 1>,
    direction: &Image<f32, 1>,
    dst: &mut Image<u8, 1>,
    strategy: ExecutionStrategy,
) -> Result<(), ImageError> {
    for (cols, rows) in [
        (direction.cols(), direction.rows()),
        (dst.cols(), dst.rows()),
    ] {
        if (magnitude.cols(), magnitude.rows()) != (cols, rows) {
            return Err(ImageError::InvalidImageSize(
                magnitude.cols(),
                magnitude.rows(),
                cols,
                rows,
            ));
        }
    }

    let rows = magnitude.rows();
    let cols = magnitude.cols();
    let mag = magnitude.as_slice();
    let dir = direction.as_slice();

    parallel::iter_rows_indexed(dst.as_slice_mut(), cols, strategy, |r, row_dst| {
        if r == 0 || r + 1 >= rows {
            row_dst.fill(0);
            return;
        }

        for (c, out) in row_dst.iter_mut().enumerate() {
            if c == 0 || c + 1 >= cols {
                *out = 0;
                continue;
            }

            let idx = r * cols + c;
            let center = mag[idx];
            let is_max = GradientOrientation::from_angle(dir[idx])
                .neighbor_offsets()
                .iter()
                .all(|&(dx, dy)| {
                    let y = (r as isize + dy) as usize;
                    let x = (c as isize + dx) as usize;
                    center >= mag[y * cols + x]
                });

            *out = if is_max { center } else { 0 };
        }
    });

    Ok(())
}

/// Thin a [`GradientField`] into a new magnitude image.
///
/// # Arguments
///
/// * `field` - The gradient field.
/// * `strategy` - The execution strategy.
pub fn suppress_gradient_field(
    field: &GradientField,
    strategy: ExecutionStrategy,
) -> Result<Image<u8, 1>, ImageError> {
    let mut thinned = Image::from_size_val(field.magnitude.size(), 0u8)?;
    non_maximum_suppression(&field.magnitude, &field.direction, &mut thinned, strategy)?;
    Ok(thinned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_nms_vertical_ridge() -> Result<(), ImageError> {
        // a vertical ridge at x = 2 with a horizontal gradient
        #[rustfmt::skip]
        let magnitude = Image::<u8, 1>::new(
            [5, 4].into(),
            vec![
                10, 50, 90, 50, 10,
                10, 50, 90, 50, 10,
                10, 50, 90, 50, 10,
                10, 50, 90, 50, 10,
            ],
        )?;
        let direction = Image::<f32, 1>::from_size_val(magnitude.size(), 0.0)?;

        let mut thinned = Image::<u8, 1>::from_size_val(magnitude.size(), 0)?;
        non_maximum_suppression(&magnitude, &direction, &mut thinned, ExecutionStrategy::Serial)?;

        #[rustfmt::skip]
        assert_eq!(
            thinned.as_slice(),
            &[
                0, 0, 0, 0, 0,
                0, 0, 90, 0, 0,
                0, 0, 90, 0, 0,
                0, 0, 0, 0, 0,
            ]
        );

        Ok(())
    }

    #[test]
    fn test_nms_direction_matters() -> Result<(), ImageError> {
        // same ridge but the gradient points along y: every interior pixel is a
        // plateau along its column and survives
        #[rustfmt::skip]
        let magnitude = Image::<u8, 1>::new(
            [5, 4].into(),
            vec![
                10, 50, 90, 50, 10,
                10, 50, 90, 50, 10,
                10, 50, 90, 50, 10,
                10, 50, 90, 50, 10,
            ],
        )?;
        let direction = Image::<f32, 1>::from_size_val(magnitude.size(), FRAC_PI_2)?;

        let field = GradientField {
            magnitude,
            direction,
        };
        let thinned = suppress_gradient_field(&field, ExecutionStrategy::Parallel)?;

        #[rustfmt::skip]
        assert_eq!(
            thinned.as_slice(),
            &[
                0, 0, 0, 0, 0,
                0, 50, 90, 50, 0,
                0, 50, 90, 50, 0,
                0, 0, 0, 0, 0,
            ]
        );

        Ok(())
    }

    #[test]
    fn test_nms_diagonal() -> Result<(), ImageError> {
        // the center is a maximum along the 45 degree diagonal only
        #[rustfmt::skip]
        let magnitude = Image::<u8, 1>::new(
            [3, 3].into(),
            vec![
                10, 99, 10,
                99, 40, 99,
                10, 99, 10,
            ],
        )?;

        let mut thinned = Image::<u8, 1>::from_size_val(magnitude.size(), 0)?;

        let diagonal = Image::<f32, 1>::from_size_val(magnitude.size(), 45f32.to_radians())?;
        non_maximum_suppression(&magnitude, &diagonal, &mut thinned, ExecutionStrategy::Serial)?;
        assert_eq!(thinned.as_slice()[4], 40);

        let anti = Image::<f32, 1>::from_size_val(magnitude.size(), 135f32.to_radians())?;
        non_maximum_suppression(&magnitude, &anti, &mut thinned, ExecutionStrategy::Serial)?;
        assert_eq!(thinned.as_slice()[4], 40);

        let vertical = Image::<f32, 1>::from_size_val(magnitude.size(), FRAC_PI_2)?;
        non_maximum_suppression(&magnitude, &vertical, &mut thinned, ExecutionStrategy::Serial)?;
        assert_eq!(thinned.as_slice()[4], 0);

        Ok(())
    }

    #[test]
    fn test_nms_small_images_are_all_border() -> Result<(), ImageError> {
        for size in [[1, 1], [2, 5], [5, 2]] {
            let magnitude = Image::<u8, 1>::from_size_val(size.into(), 200)?;
            let direction = Image::<f32, 1>::from_size_val(size.into(), 0.0)?;
            let mut thinned = Image::<u8, 1>::from_size_val(size.into(), 7)?;
            non_maximum_suppression(
                &magnitude,
                &direction,
                &mut thinned,
                ExecutionStrategy::Serial,
            )?;
            assert!(thinned.as_slice().iter().all(|&v| v == 0));
        }
        Ok(())
    }

    #[test]
    fn test_nms_size_mismatch() -> Result<(), ImageError> {
        let magnitude = Image::<u8, 1>::from_size_val([3, 3].into(), 0)?;
        let direction = Image::<f32, 1>::from_size_val([3, 4].into(), 0.0)?;
        let mut thinned = Image::<u8, 1>::from_size_val([3, 3].into(), 0)?;
        assert_eq!(
            non_maximum_suppression(&magnitude, &direction, &mut thinned, ExecutionStrategy::Serial),
            Err(ImageError::InvalidImageSize(3, 3, 3, 4))
        );
        Ok(())
    }
}
