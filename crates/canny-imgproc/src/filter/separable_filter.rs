use canny_image::{Image, ImageError};

use super::{kernels::SeparableKernel, replicate_index, FilterError, FloatConversion};
use crate::parallel::{self, ExecutionStrategy};

/// A separable 2D filter that applies horizontal and vertical 1D convolutions sequentially.
///
/// This struct borrows the kernel data and precomputes the tap offsets.
struct SeparableFilter<'a> {
    kernel_x: &'a [f32],
    kernel_y: &'a [f32],
    offsets_x: Vec<isize>,
    offsets_y: Vec<isize>,
}

impl<'a> SeparableFilter<'a> {
    /// Create a new separable filter with the given kernels.
    ///
    /// # Arguments
    ///
    /// * `kernel_x` - The horizontal convolution kernel
    /// * `kernel_y` - The vertical convolution kernel
    fn new(kernel_x: &'a [f32], kernel_y: &'a [f32]) -> Self {
        let half_x = (kernel_x.len() / 2) as isize;
        let half_y = (kernel_y.len() / 2) as isize;

        let offsets_x = (0..kernel_x.len() as isize).map(|i| i - half_x).collect();
        let offsets_y = (0..kernel_y.len() as isize).map(|i| i - half_y).collect();

        Self {
            kernel_x,
            kernel_y,
            offsets_x,
            offsets_y,
        }
    }

    /// Apply the filter to an image.
    ///
    /// Performs horizontal filtering into an f32 buffer followed by vertical
    /// filtering into the destination. The intermediate buffer is dropped on return.
    fn apply<T1, T2, const C: usize>(
        &self,
        src: &Image<T1, C>,
        dst: &mut Image<T2, C>,
        strategy: ExecutionStrategy,
    ) -> Result<(), ImageError>
    where
        T1: FloatConversion + Send + Sync,
        T2: FloatConversion + Send + Sync,
    {
        let rows = src.rows();
        let cols = src.cols();
        if rows == 0 || cols == 0 {
            return Ok(());
        }

        let src_data = src.as_slice();
        let mut temp = Image::<f32, C>::from_size_val(src.size(), 0.0)?;

        // horizontal
        parallel::iter_rows_indexed(temp.as_slice_mut(), cols * C, strategy, |r, row_temp| {
            let row_src = &src_data[r * cols * C..(r + 1) * cols * C];
            for c in 0..cols {
                let mut acc = [0.0f32; C];
                for (&k, &off) in self.kernel_x.iter().zip(self.offsets_x.iter()) {
                    let x = replicate_index(c as isize + off, cols);
                    for (ch, acc_val) in acc.iter_mut().enumerate() {
                        *acc_val += row_src[x * C + ch].to_f32() * k;
                    }
                }
                row_temp[c * C..(c + 1) * C].copy_from_slice(&acc);
            }
        });

        // vertical
        let temp_data = temp.as_slice();
        parallel::iter_rows_indexed(dst.as_slice_mut(), cols * C, strategy, |r, row_dst| {
            for c in 0..cols {
                let mut acc = [0.0f32; C];
                for (&k, &off) in self.kernel_y.iter().zip(self.offsets_y.iter()) {
                    let y = replicate_index(r as isize + off, rows);
                    let idx = (y * cols + c) * C;
                    for (ch, acc_val) in acc.iter_mut().enumerate() {
                        *acc_val += temp_data[idx + ch] * k;
                    }
                }
                for (ch, &acc_val) in acc.iter().enumerate() {
                    row_dst[c * C + ch] = T2::from_f32(acc_val);
                }
            }
        });

        Ok(())
    }
}

/// Apply a separable filter with execution strategy control.
///
/// Out-of-range taps replicate the nearest border pixel, so the filter never
/// reads outside the source image. Results are rounded and saturated to the
/// destination type.
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W, C).
/// * `dst` - The destination image with shape (H, W, C).
/// * `kernel_x` - The horizontal kernel. Must have odd length.
/// * `kernel_y` - The vertical kernel. Must have odd length.
/// * `strategy` - Execution strategy: `Serial`, `Parallel`, or `Auto`.
pub fn separable_filter_with_strategy<T1, T2, const C: usize>(
    src: &Image<T1, C>,
    dst: &mut Image<T2, C>,
    kernel_x: &[f32],
    kernel_y: &[f32],
    strategy: ExecutionStrategy,
) -> Result<(), FilterError>
where
    T1: FloatConversion + Send + Sync,
    T2: FloatConversion + Send + Sync,
{
    for len in [kernel_x.len(), kernel_y.len()] {
        if len % 2 == 0 {
            return Err(FilterError::InvalidKernelSize { size: len, min: 1 });
        }
    }

    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        )
        .into());
    }

    let filter = SeparableFilter::new(kernel_x, kernel_y);
    filter.apply(src, dst, strategy)?;

    Ok(())
}

/// Apply a separable filter to an image.
///
/// Uses [`ExecutionStrategy::Auto`]. For explicit control, use
/// [`separable_filter_with_strategy`].
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W, C).
/// * `dst` - The destination image with shape (H, W, C).
/// * `kernel_x` - The horizontal kernel.
/// * `kernel_y` - The vertical kernel.
pub fn separable_filter<T1, T2, const C: usize>(
    src: &Image<T1, C>,
    dst: &mut Image<T2, C>,
    kernel_x: &[f32],
    kernel_y: &[f32],
) -> Result<(), FilterError>
where
    T1: FloatConversion + Send + Sync,
    T2: FloatConversion + Send + Sync,
{
    separable_filter_with_strategy(src, dst, kernel_x, kernel_y, ExecutionStrategy::Auto)
}

/// Apply a [`SeparableKernel`] to an image.
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W, C).
/// * `dst` - The destination image with shape (H, W, C).
/// * `kernel` - The kernel to apply.
/// * `strategy` - The execution strategy.
pub fn apply_separable_kernel<T1, T2, const C: usize>(
    src: &Image<T1, C>,
    dst: &mut Image<T2, C>,
    kernel: &SeparableKernel,
    strategy: ExecutionStrategy,
) -> Result<(), FilterError>
where
    T1: FloatConversion + Send + Sync,
    T2: FloatConversion + Send + Sync,
{
    separable_filter_with_strategy(src, dst, kernel.kernel_x(), kernel.kernel_y(), strategy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use canny_image::ImageSize;

    #[test]
    fn test_separable_filter_f32() -> Result<(), FilterError> {
        let size = ImageSize {
            width: 5,
            height: 5,
        };

        #[rustfmt::skip]
        let img = Image::<f32, 1>::new(
            size,
            vec![
                0.0, 0.0, 0.0, 0.0, 0.0,
                0.0, 0.0, 0.0, 0.0, 0.0,
                0.0, 0.0, 1.0, 0.0, 0.0,
                0.0, 0.0, 0.0, 0.0, 0.0,
                0.0, 0.0, 0.0, 0.0, 0.0,
            ],
        )?;

        let mut dst = Image::<f32, 1>::from_size_val(img.size(), 0.0)?;
        let kernel_x = vec![1.0, 1.0, 1.0];
        let kernel_y = vec![1.0, 1.0, 1.0];
        separable_filter(&img, &mut dst, &kernel_x, &kernel_y)?;

        #[rustfmt::skip]
        assert_eq!(
            dst.as_slice(),
            &[
                0.0, 0.0, 0.0, 0.0, 0.0,
                0.0, 1.0, 1.0, 1.0, 0.0,
                0.0, 1.0, 1.0, 1.0, 0.0,
                0.0, 1.0, 1.0, 1.0, 0.0,
                0.0, 0.0, 0.0, 0.0, 0.0,
            ]
        );

        let xsum = dst.as_slice().iter().sum::<f32>();
        assert_eq!(xsum, 9.0);

        Ok(())
    }

    #[test]
    fn test_separable_filter_replicates_border() -> Result<(), FilterError> {
        // a single bright corner pixel is counted once per clamped tap
        let mut img = Image::<f32, 1>::from_size_val([3, 3].into(), 0.0)?;
        img.as_slice_mut()[0] = 1.0;

        let mut dst = Image::<f32, 1>::from_size_val(img.size(), 0.0)?;
        separable_filter(&img, &mut dst, &[1.0, 1.0, 1.0], &[1.0, 1.0, 1.0])?;

        #[rustfmt::skip]
        assert_eq!(
            dst.as_slice(),
            &[
                4.0, 2.0, 0.0,
                2.0, 1.0, 0.0,
                0.0, 0.0, 0.0,
            ]
        );

        Ok(())
    }

    #[test]
    fn test_separable_filter_u8_saturates() -> Result<(), FilterError> {
        let mut img = Image::<u8, 1>::from_size_val([5, 5].into(), 0)?;
        img.as_slice_mut()[12] = 255;

        let mut dst = Image::<u8, 1>::from_size_val(img.size(), 0)?;
        separable_filter(&img, &mut dst, &[1.0, 1.0, 1.0], &[1.0, 1.0, 1.0])?;

        #[rustfmt::skip]
        assert_eq!(
            dst.as_slice(),
            &[
                0, 0, 0, 0, 0,
                0, 255, 255, 255, 0,
                0, 255, 255, 255, 0,
                0, 255, 255, 255, 0,
                0, 0, 0, 0, 0,
            ]
        );
        Ok(())
    }

    #[test]
    fn test_separable_filter_signed_output() -> Result<(), FilterError> {
        // a vertical step edge from 0 to 10
        #[rustfmt::skip]
        let img = Image::<u8, 1>::new(
            [4, 3].into(),
            vec![
                0, 0, 10, 10,
                0, 0, 10, 10,
                0, 0, 10, 10,
            ],
        )?;

        let kernel = SeparableKernel::sobel_x(3)?;
        let mut gx = Image::<i16, 1>::from_size_val(img.size(), 0)?;
        apply_separable_kernel(&img, &mut gx, &kernel, ExecutionStrategy::Serial)?;

        #[rustfmt::skip]
        assert_eq!(
            gx.as_slice(),
            &[
                0, 10, 10, 0,
                0, 10, 10, 0,
                0, 10, 10, 0,
            ]
        );

        let flipped = Image::<u8, 1>::new(
            img.size(),
            img.as_slice().iter().map(|&v| 10 - v).collect(),
        )?;
        apply_separable_kernel(&flipped, &mut gx, &kernel, ExecutionStrategy::Serial)?;
        assert_eq!(gx.as_slice()[1], -10);

        Ok(())
    }

    #[test]
    fn test_separable_filter_with_strategy() -> Result<(), FilterError> {
        let size = ImageSize {
            width: 7,
            height: 6,
        };
        let data = (0..size.num_pixels())
            .map(|i| ((i * 37) % 251) as u8)
            .collect();
        let img = Image::<u8, 1>::new(size, data)?;
        let kernel = SeparableKernel::gaussian(5, 1.0)?;

        let mut outputs = Vec::new();
        for strategy in [
            ExecutionStrategy::Serial,
            ExecutionStrategy::Parallel,
            ExecutionStrategy::Auto,
        ] {
            let mut dst = Image::<u8, 1>::from_size_val(size, 0)?;
            apply_separable_kernel(&img, &mut dst, &kernel, strategy)?;
            outputs.push(dst);
        }

        assert_eq!(outputs[0], outputs[1]);
        assert_eq!(outputs[0], outputs[2]);

        Ok(())
    }

    #[test]
    fn test_separable_filter_errors() -> Result<(), FilterError> {
        let img = Image::<u8, 1>::from_size_val([3, 3].into(), 0)?;
        let mut dst = Image::<u8, 1>::from_size_val([3, 2].into(), 0)?;

        let res = separable_filter(&img, &mut dst, &[1.0], &[1.0]);
        assert_eq!(
            res,
            Err(FilterError::Image(ImageError::InvalidImageSize(3, 3, 3, 2)))
        );

        let mut dst = Image::<u8, 1>::from_size_val([3, 3].into(), 0)?;
        let res = separable_filter(&img, &mut dst, &[1.0, 1.0], &[1.0]);
        assert_eq!(res, Err(FilterError::InvalidKernelSize { size: 2, min: 1 }));

        let res = separable_filter(&img, &mut dst, &[1.0], &[]);
        assert_eq!(res, Err(FilterError::InvalidKernelSize { size: 0, min: 1 }));

        Ok(())
    }
}
