use canny_image::{Image, ImageError};

use crate::parallel::{self, ExecutionStrategy};

/// BT.601 luma weights scaled by 2^16. They sum to 65536.
const RW: u32 = 19595;
const GW: u32 = 38470;
const BW: u32 = 7471;

/// Luminance of an 8-bit RGB triplet.
///
/// Y = (19595 * R + 38470 * G + 7471 * B + 32768) >> 16
#[inline]
pub fn luminance_u8(r: u8, g: u8, b: u8) -> u8 {
    ((RW * r as u32 + GW * g as u32 + BW * b as u32 + (1 << 15)) >> 16) as u8
}

fn check_same_size<const C: usize>(
    src: &Image<u8, C>,
    dst: &Image<u8, 1>,
) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }
    Ok(())
}

/// Convert an RGBA8 image to grayscale. The alpha channel is ignored.
///
/// # Arguments
///
/// * `src` - The input RGBA8 image.
/// * `dst` - The output grayscale image.
/// * `strategy` - The execution strategy.
///
/// Precondition: the input and output images must have the same size.
///
/// # Example
///
/// ```
/// use canny_image::Image;
/// use canny_imgproc::color::gray_from_rgba_u8;
/// use canny_imgproc::parallel::ExecutionStrategy;
///
/// let image = Image::<u8, 4>::new([2, 1].into(), vec![255, 255, 255, 0, 255, 0, 0, 255]).unwrap();
/// let mut gray = Image::<u8, 1>::from_size_val(image.size(), 0).unwrap();
///
/// gray_from_rgba_u8(&image, &mut gray, ExecutionStrategy::Serial).unwrap();
/// assert_eq!(gray.as_slice(), &[255, 76]);
/// ```
pub fn gray_from_rgba_u8(
    src: &Image<u8, 4>,
    dst: &mut Image<u8, 1>,
    strategy: ExecutionStrategy,
) -> Result<(), ImageError> {
    check_same_size(src, dst)?;

    parallel::iter_rows(src, dst, strategy, |src_pixel, dst_pixel| {
        dst_pixel[0] = luminance_u8(src_pixel[0], src_pixel[1], src_pixel[2]);
    });

    Ok(())
}
