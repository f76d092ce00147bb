use super::FilterError;

/// Check that a kernel size is odd and at least `min`.
fn check_kernel_size(kernel_size: usize, min: usize) -> Result<(), FilterError> {
    if kernel_size < min || kernel_size % 2 == 0 {
        return Err(FilterError::InvalidKernelSize {
            size: kernel_size,
            min,
        });
    }
    Ok(())
}

/// Create a gaussian blur kernel.
///
/// The weights are `exp(-x² / (2 * variance))` for `x` in `[-r, r]`, normalized
/// to sum to one.
///
/// # Arguments
///
/// * `kernel_size` - The size of the kernel. Must be odd.
/// * `variance` - The variance (sigma squared) of the gaussian. Must be positive.
///
/// # Returns
///
/// A vector of the kernel.
pub fn gaussian_kernel_1d(kernel_size: usize, variance: f32) -> Result<Vec<f32>, FilterError> {
    check_kernel_size(kernel_size, 1)?;

    if variance.is_nan() || variance <= 0.0 {
        return Err(FilterError::InvalidVariance(variance));
    }

    let mean = (kernel_size - 1) as f32 / 2.0;

    // compute the kernel
    let mut kernel = (0..kernel_size)
        .map(|i| {
            let x = i as f32 - mean;
            (-(x * x) / (2.0 * variance)).exp()
        })
        .collect::<Vec<_>>();

    // normalize the kernel
    let norm = kernel.iter().sum::<f32>();
    kernel.iter_mut().for_each(|k| *k /= norm);

    Ok(kernel)
}

/// Create a binomial kernel, i.e. a row of Pascal's triangle.
///
/// # Arguments
///
/// * `kernel_size` - The number of coefficients. Must be at least 1.
pub fn binomial_kernel_1d(kernel_size: usize) -> Result<Vec<f32>, FilterError> {
    if kernel_size == 0 {
        return Err(FilterError::InvalidKernelSize { size: 0, min: 1 });
    }

    let mut row = vec![1.0f32];
    for _ in 1..kernel_size {
        let mut next = vec![1.0f32; row.len() + 1];
        for (i, w) in row.windows(2).enumerate() {
            next[i + 1] = w[0] + w[1];
        }
        row = next;
    }
    Ok(row)
}

/// Create a sobel kernel pair.
///
/// The smoothing part is the binomial row of `kernel_size` coefficients and the
/// derivative part is the binomial row of `kernel_size - 2` coefficients
/// convolved with the central difference `[-1, 0, 1]`.
///
/// The smoothing part is normalized to sum to one and the positive weights of
/// the derivative part sum to one, so the response to a step of height `h` is
/// at most `h` for every kernel size. On `u8` input each derivative stays
/// within `[-255, 255]`.
///
/// # Arguments
///
/// * `kernel_size` - The size of the kernel. Must be odd and at least 3.
///
/// # Returns
///
/// A tuple `(derivative, smoothing)`.
pub fn sobel_kernel_1d(kernel_size: usize) -> Result<(Vec<f32>, Vec<f32>), FilterError> {
    check_kernel_size(kernel_size, 3)?;

    let smoothing = binomial_kernel_1d(kernel_size)?;
    let inner = binomial_kernel_1d(kernel_size - 2)?;

    // inner * [-1, 0, 1]
    let mut derivative = vec![0.0f32; kernel_size];
    for (i, &b) in inner.iter().enumerate() {
        derivative[i] -= b;
        derivative[i + 2] += b;
    }

    let gain = derivative.iter().filter(|&&d| d > 0.0).sum::<f32>();
    derivative.iter_mut().for_each(|d| *d /= gain);

    let norm = smoothing.iter().sum::<f32>();
    let smoothing = smoothing.into_iter().map(|s| s / norm).collect();

    Ok((derivative, smoothing))
}

/// A kernel made of a horizontal and a vertical 1D component.
///
/// Applying it is equivalent to applying the dense 2D kernel
/// `k[dy][dx] = kernel_y[dy] * kernel_x[dx]`.
#[derive(Debug, Clone, PartialEq)]
pub struct SeparableKernel {
    kernel_x: Vec<f32>,
    kernel_y: Vec<f32>,
}

impl SeparableKernel {
    /// Create a new separable kernel.
    ///
    /// # Arguments
    ///
    /// * `kernel_x` - The kernel applied along rows (x axis). Must have odd length.
    /// * `kernel_y` - The kernel applied along columns (y axis). Must have odd length.
    pub fn new(kernel_x: Vec<f32>, kernel_y: Vec<f32>) -> Result<Self, FilterError> {
        check_kernel_size(kernel_x.len(), 1)?;
        check_kernel_size(kernel_y.len(), 1)?;
        Ok(Self { kernel_x, kernel_y })
    }

    /// Create a symmetric gaussian kernel of the given size and variance.
    pub fn gaussian(kernel_size: usize, variance: f32) -> Result<Self, FilterError> {
        let kernel = gaussian_kernel_1d(kernel_size, variance)?;
        Self::new(kernel.clone(), kernel)
    }

    /// Create the sobel kernel differentiating along x (across columns).
    pub fn sobel_x(kernel_size: usize) -> Result<Self, FilterError> {
        let (derivative, smoothing) = sobel_kernel_1d(kernel_size)?;
        Self::new(derivative, smoothing)
    }

    /// Create the sobel kernel differentiating along y (across rows).
    pub fn sobel_y(kernel_size: usize) -> Result<Self, FilterError> {
        let (derivative, smoothing) = sobel_kernel_1d(kernel_size)?;
        Self::new(smoothing, derivative)
    }

    /// The horizontal component.
    pub fn kernel_x(&self) -> &[f32] {
        &self.kernel_x
    }

    /// The vertical component.
    pub fn kernel_y(&self) -> &[f32] {
        &self.kernel_y
    }

    /// The radius `(rx, ry)` of the kernel.
    pub fn radius(&self) -> (usize, usize) {
        (self.kernel_x.len() / 2, self.kernel_y.len() / 2)
    }

    /// Expand into the equivalent dense kernel.
    ///
    /// Only square kernels can be expanded.
    pub fn to_kernel2d(&self) -> Result<Kernel2d, FilterError> {
        let size = self.kernel_x.len();
        let data = self
            .kernel_y
            .iter()
            .flat_map(|&ky| self.kernel_x.iter().map(move |&kx| ky * kx))
            .collect::<Vec<_>>();
        Kernel2d::new(size, data)
    }
}

/// A dense square kernel stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel2d {
    size: usize,
    data: Vec<f32>,
}

impl Kernel2d {
    /// Create a new square kernel.
    ///
    /// # Arguments
    ///
    /// * `size` - The side of the kernel. Must be odd.
    /// * `data` - The `size * size` weights in row-major order.
    pub fn new(size: usize, data: Vec<f32>) -> Result<Self, FilterError> {
        check_kernel_size(size, 1)?;
        if data.len() != size * size {
            return Err(FilterError::NonSquareKernel(data.len(), size));
        }
        Ok(Self { size, data })
    }

    /// The side of the kernel.
    pub fn size(&self) -> usize {
        self.size
    }

    /// The radius of the kernel.
    pub fn radius(&self) -> usize {
        self.size / 2
    }

    /// The weights in row-major order.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// The weight at row `dy` and column `dx` of the kernel.
    pub fn weight(&self, dy: usize, dx: usize) -> f32 {
        self.data[dy * self.size + dx]
    }
}
