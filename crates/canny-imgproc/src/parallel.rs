use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use canny_image::Image;

/// Controls how the per-pixel work of a stage is executed.
///
/// Every strategy produces bit-identical results; only the scheduling changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStrategy {
    /// Run in parallel on the global Rayon thread pool for large images and
    /// serially otherwise. See [`ExecutionStrategy::AUTO_MIN_PIXELS`].
    #[default]
    Auto,

    /// Process rows in parallel on the global Rayon thread pool.
    Parallel,

    /// Run sequentially on the current thread.
    ///
    /// Useful for small images, debugging, or when the overhead of parallelization
    /// outweighs the benefits.
    Serial,
}

impl ExecutionStrategy {
    /// Number of pixels from which [`ExecutionStrategy::Auto`] goes parallel.
    pub const AUTO_MIN_PIXELS: usize = 100_000;

    /// Whether an image with `num_pixels` pixels is processed in parallel.
    pub fn is_parallel(&self, num_pixels: usize) -> bool {
        match self {
            ExecutionStrategy::Auto => num_pixels >= Self::AUTO_MIN_PIXELS,
            ExecutionStrategy::Parallel => true,
            ExecutionStrategy::Serial => false,
        }
    }
}

/// Run `f` on every row of `dst` together with the row index.
///
/// `row_len` is the number of elements in a row (width * channels). Rows are
/// disjoint so workers never alias each other's output.
pub fn iter_rows_indexed<T: Send>(
    dst: &mut [T],
    row_len: usize,
    strategy: ExecutionStrategy,
    f: impl Fn(usize, &mut [T]) + Send + Sync,
) {
    if row_len == 0 {
        return;
    }

    let num_pixels = dst.len();
    if strategy.is_parallel(num_pixels) {
        dst.par_chunks_exact_mut(row_len)
            .enumerate()
            .for_each(|(r, row)| f(r, row));
    } else {
        dst.chunks_exact_mut(row_len)
            .enumerate()
            .for_each(|(r, row)| f(r, row));
    }
}

/// Apply a function to each pixel in the image.
///
/// The pixel slices have `C1` and `C2` elements respectively.
///
/// PRECONDITION: `src` and `dst` must have the same size.
pub fn iter_rows<T1, const C1: usize, T2, const C2: usize>(
    src: &Image<T1, C1>,
    dst: &mut Image<T2, C2>,
    strategy: ExecutionStrategy,
    f: impl Fn(&[T1], &mut [T2]) + Send + Sync,
) where
    T1: Send + Sync,
    T2: Send + Sync,
{
    let cols = src.cols();
    if cols == 0 {
        return;
    }

    let row_pixels = |(src_chunk, dst_chunk): (&[T1], &mut [T2])| {
        src_chunk
            .chunks_exact(C1)
            .zip(dst_chunk.chunks_exact_mut(C2))
            .for_each(|(src_pixel, dst_pixel)| {
                f(src_pixel, dst_pixel);
            });
    };

    if strategy.is_parallel(src.size().num_pixels()) {
        src.as_slice()
            .par_chunks_exact(C1 * cols)
            .zip(dst.as_slice_mut().par_chunks_exact_mut(C2 * cols))
            .for_each(row_pixels);
    } else {
        src.as_slice()
            .chunks_exact(C1 * cols)
            .zip(dst.as_slice_mut().chunks_exact_mut(C2 * cols))
            .for_each(row_pixels);
    }
}

/// Apply a function to each value in the image.
///
/// PRECONDITION: `src` and `dst` must have the same size and channels.
pub fn iter_rows_val<T1, T2, const C: usize>(
    src: &Image<T1, C>,
    dst: &mut Image<T2, C>,
    strategy: ExecutionStrategy,
    f: impl Fn(&T1, &mut T2) + Send + Sync,
) where
    T1: Send + Sync,
    T2: Send + Sync,
{
    iter_rows(src, dst, strategy, |src_pixel, dst_pixel| {
        src_pixel
            .iter()
            .zip(dst_pixel.iter_mut())
            .for_each(|(s, d)| f(s, d));
    });
}

/// Apply a function to each pair of co-indexed values of two images.
///
/// PRECONDITION: `src1`, `src2` and `dst` must have the same size.
pub fn iter_rows_val_two<T1, T2, T3>(
    src1: &Image<T1, 1>,
    src2: &Image<T2, 1>,
    dst: &mut Image<T3, 1>,
    strategy: ExecutionStrategy,
    f: impl Fn(&T1, &T2, &mut T3) + Send + Sync,
) where
    T1: Send + Sync,
    T2: Send + Sync,
    T3: Send + Sync,
{
    let cols = src1.cols();
    if cols == 0 {
        return;
    }

    let row_values = |((src1_chunk, src2_chunk), dst_chunk): ((&[T1], &[T2]), &mut [T3])| {
        src1_chunk
            .iter()
            .zip(src2_chunk.iter())
            .zip(dst_chunk.iter_mut())
            .for_each(|((a, b), d)| f(a, b, d));
    };

    if strategy.is_parallel(src1.size().num_pixels()) {
        src1.as_slice()
            .par_chunks_exact(cols)
            .zip(src2.as_slice().par_chunks_exact(cols))
            .zip(dst.as_slice_mut().par_chunks_exact_mut(cols))
            .for_each(row_values);
    } else {
        src1.as_slice()
            .chunks_exact(cols)
            .zip(src2.as_slice().chunks_exact(cols))
            .zip(dst.as_slice_mut().chunks_exact_mut(cols))
            .for_each(row_values);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canny_image::ImageError;

    #[test]
    fn test_is_parallel() {
        assert!(ExecutionStrategy::Parallel.is_parallel(1));
        assert!(!ExecutionStrategy::Serial.is_parallel(usize::MAX));
        assert!(!ExecutionStrategy::Auto.is_parallel(ExecutionStrategy::AUTO_MIN_PIXELS - 1));
        assert!(ExecutionStrategy::Auto.is_parallel(ExecutionStrategy::AUTO_MIN_PIXELS));
    }

    #[test]
    fn test_iter_rows_indexed() {
        for strategy in [ExecutionStrategy::Serial, ExecutionStrategy::Parallel] {
            let mut dst = vec![0usize; 6];
            iter_rows_indexed(&mut dst, 2, strategy, |r, row| {
                row.iter_mut().for_each(|v| *v = r);
            });
            assert_eq!(dst, vec![0, 0, 1, 1, 2, 2]);
        }
    }

    #[test]
    fn test_iter_rows_channels() -> Result<(), ImageError> {
        let src = Image::<u8, 2>::new([2, 1].into(), vec![1, 2, 3, 4])?;
        let mut dst = Image::<u16, 1>::from_size_val(src.size(), 0)?;
        iter_rows(&src, &mut dst, ExecutionStrategy::Parallel, |s, d| {
            d[0] = s[0] as u16 + s[1] as u16;
        });
        assert_eq!(dst.as_slice(), &[3, 7]);
        Ok(())
    }

    #[test]
    fn test_iter_rows_val_two() -> Result<(), ImageError> {
        let a = Image::<i16, 1>::new([2, 2].into(), vec![1, -2, 3, -4])?;
        let b = Image::<i16, 1>::new([2, 2].into(), vec![10, 20, 30, 40])?;
        for strategy in [ExecutionStrategy::Serial, ExecutionStrategy::Parallel] {
            let mut dst = Image::<i32, 1>::from_size_val(a.size(), 0)?;
            iter_rows_val_two(&a, &b, &mut dst, strategy, |x, y, d| {
                *d = *x as i32 * *y as i32;
            });
            assert_eq!(dst.as_slice(), &[10, -40, 90, -160]);
        }
        Ok(())
    }

    #[test]
    fn test_strategy_serde() -> Result<(), serde_json::Error> {
        let s: ExecutionStrategy = serde_json::from_str("\"serial\"")?;
        assert_eq!(s, ExecutionStrategy::Serial);
        assert_eq!(serde_json::to_string(&ExecutionStrategy::Auto)?, "\"auto\"");
        Ok(())
    }
}
