use canny_image::{Image, ImageError};

use super::{kernels::Kernel2d, replicate_index, FilterError, FloatConversion};
use crate::parallel::{self, ExecutionStrategy};

/// Apply a dense square kernel to a single channel image.
///
/// Each output pixel is the weighted sum of the `r`-radius neighborhood of the
/// source pixel, with out-of-range neighbors replaced by the nearest border
/// pixel. Results are rounded and saturated to the destination type.
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W, 1).
/// * `dst` - The destination image with shape (H, W, 1).
/// * `kernel` - The square kernel.
/// * `strategy` - The execution strategy.
pub fn filter2d<T1, T2>(
    src: &Image<T1, 1>,
    dst: &mut Image<T2, 1>,
    kernel: &Kernel2d,
    strategy: ExecutionStrategy,
) -> Result<(), FilterError>
where
    T1: FloatConversion + Send + Sync,
    T2: FloatConversion + Send + Sync,
{
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        )
        .into());
    }

    let rows = src.rows();
    let cols = src.cols();
    if rows == 0 || cols == 0 {
        return Ok(());
    }

    let radius = kernel.radius() as isize;
    let src_data = src.as_slice();

    parallel::iter_rows_indexed(dst.as_slice_mut(), cols, strategy, |r, row_dst| {
        for (c, out) in row_dst.iter_mut().enumerate() {
            let mut acc = 0.0f32;
            for (dy, row_weights) in kernel.as_slice().chunks_exact(kernel.size()).enumerate() {
                let y = replicate_index(r as isize + dy as isize - radius, rows);
                let row_src = &src_data[y * cols..(y + 1) * cols];
                for (dx, &k) in row_weights.iter().enumerate() {
                    let x = replicate_index(c as isize + dx as isize - radius, cols);
                    acc += row_src[x].to_f32() * k;
                }
            }
            *out = T2::from_f32(acc);
        }
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{apply_separable_kernel, kernels::SeparableKernel};
    use approx::assert_relative_eq;

    #[test]
    fn test_filter2d_identity() -> Result<(), FilterError> {
        let img = Image::<u8, 1>::new([3, 2].into(), vec![1, 2, 3, 4, 5, 6])?;
        let kernel = Kernel2d::new(3, vec![0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0])?;

        let mut dst = Image::<u8, 1>::from_size_val(img.size(), 0)?;
        filter2d(&img, &mut dst, &kernel, ExecutionStrategy::Serial)?;
        assert_eq!(dst.as_slice(), img.as_slice());

        Ok(())
    }

    #[test]
    fn test_filter2d_corner_clamped() -> Result<(), FilterError> {
        #[rustfmt::skip]
        let img = Image::<f32, 1>::new(
            [4, 4].into(),
            vec![
                1.0, 2.0, 3.0, 4.0,
                5.0, 6.0, 7.0, 8.0,
                9.0, 10.0, 11.0, 12.0,
                13.0, 14.0, 15.0, 16.0,
            ],
        )?;
        let kernel = SeparableKernel::sobel_x(3)?.to_kernel2d()?;

        let mut dst = Image::<f32, 1>::from_size_val(img.size(), 0.0)?;
        filter2d(&img, &mut dst, &kernel, ExecutionStrategy::Serial)?;

        // top-left corner, neighborhood with replicated rows/cols:
        // 1 1 2
        // 1 1 2
        // 5 5 6
        let expected = ((2.0 - 1.0) + 2.0 * (2.0 - 1.0) + (6.0 - 5.0)) / 4.0;
        assert_relative_eq!(dst.as_slice()[0], expected);

        Ok(())
    }

    #[test]
    fn test_filter2d_matches_separable() -> Result<(), FilterError> {
        let size = [9, 7].into();
        let data = (0..63).map(|i| ((i * 53) % 256) as f32).collect();
        let img = Image::<f32, 1>::new(size, data)?;

        for kernel in [
            SeparableKernel::gaussian(5, 1.5)?,
            SeparableKernel::sobel_x(3)?,
            SeparableKernel::sobel_y(5)?,
        ] {
            let mut sep = Image::<f32, 1>::from_size_val(size, 0.0)?;
            apply_separable_kernel(&img, &mut sep, &kernel, ExecutionStrategy::Serial)?;

            let mut dense = Image::<f32, 1>::from_size_val(size, 0.0)?;
            filter2d(
                &img,
                &mut dense,
                &kernel.to_kernel2d()?,
                ExecutionStrategy::Parallel,
            )?;

            for (a, b) in sep.as_slice().iter().zip(dense.as_slice()) {
                assert_relative_eq!(*a, *b, epsilon = 1e-2);
            }
        }

        Ok(())
    }

    #[test]
    fn test_filter2d_size_mismatch() -> Result<(), FilterError> {
        let img = Image::<u8, 1>::from_size_val([3, 3].into(), 0)?;
        let mut dst = Image::<u8, 1>::from_size_val([2, 3].into(), 0)?;
        let kernel = Kernel2d::new(1, vec![1.0])?;
        assert_eq!(
            filter2d(&img, &mut dst, &kernel, ExecutionStrategy::Serial),
            Err(FilterError::Image(ImageError::InvalidImageSize(3, 3, 2, 3)))
        );
        Ok(())
    }
}
