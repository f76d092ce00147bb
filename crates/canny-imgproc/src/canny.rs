use serde::{Deserialize, Serialize};

use canny_image::{Image, ImageSize};

use crate::color::gray_from_rgba_u8;
use crate::error::CannyError;
use crate::filter::{apply_separable_kernel, kernels::SeparableKernel};
use crate::gradient::{gradient_field, GradientField};
use crate::hysteresis::{hysteresis, HysteresisMode};
use crate::nms::suppress_gradient_field;
use crate::parallel::ExecutionStrategy;
use crate::threshold::classify;

/// Parameters of the edge detector.
///
/// Missing fields take their default value when deserializing, so a partial
/// JSON document such as `{"low_threshold": 20}` is a valid configuration.
///
/// The thresholds are on the scale of the gradient magnitude, where a sharp
/// step of height `h` responds with at most `h`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CannyConfig {
    /// Width of the gaussian smoothing kernel. Odd and >= 3.
    pub smoothing_kernel_width: usize,
    /// Variance of the gaussian smoothing kernel. Strictly positive.
    pub smoothing_variance: f32,
    /// Width of the sobel derivative kernels. Odd and >= 3.
    pub gradient_kernel_width: usize,
    /// Magnitudes at or above this value are weak edges.
    pub low_threshold: u16,
    /// Magnitudes at or above this value are strong edges.
    pub high_threshold: u16,
    /// How the per-pixel stages are scheduled.
    pub strategy: ExecutionStrategy,
    /// How weak edges are linked.
    pub hysteresis: HysteresisMode,
}

impl Default for CannyConfig {
    fn default() -> Self {
        Self {
            smoothing_kernel_width: 5,
            smoothing_variance: 1.0,
            gradient_kernel_width: 3,
            low_threshold: 12,
            high_threshold: 25,
            strategy: ExecutionStrategy::Auto,
            hysteresis: HysteresisMode::Relaxation,
        }
    }
}

impl CannyConfig {
    /// Check the parameters without building anything.
    pub fn validate(&self) -> Result<(), CannyError> {
        let valid_width = |w: usize| w >= 3 && w % 2 == 1;

        if !valid_width(self.smoothing_kernel_width) {
            return Err(CannyError::InvalidSmoothingWidth(
                self.smoothing_kernel_width,
            ));
        }
        if self.smoothing_variance.is_nan() || self.smoothing_variance <= 0.0 {
            return Err(CannyError::InvalidVariance(self.smoothing_variance));
        }
        if !valid_width(self.gradient_kernel_width) {
            return Err(CannyError::InvalidGradientWidth(self.gradient_kernel_width));
        }
        if self.high_threshold < self.low_threshold {
            return Err(CannyError::InvalidThresholds {
                low: self.low_threshold,
                high: self.high_threshold,
            });
        }
        Ok(())
    }
}

/// The buffers produced by a run of the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct CannyOutputs {
    /// The smoothed grayscale image.
    pub blurred: Image<u8, 1>,
    /// The gradient magnitude of the smoothed image.
    pub magnitude: Image<u8, 1>,
    /// The magnitude after non-maximum suppression.
    pub thinned: Image<u8, 1>,
    /// The double threshold classification, see [`crate::threshold::EdgeClass`].
    pub classified: Image<u8, 1>,
    /// The final binary edge map.
    pub edges: Image<u8, 1>,
}

impl CannyOutputs {
    /// The outputs paired with the file stem they are saved under.
    pub fn named(&self) -> [(&'static str, &Image<u8, 1>); 5] {
        [
            ("blurred", &self.blurred),
            ("gradient", &self.magnitude),
            ("thin", &self.thinned),
            ("threshold", &self.classified),
            ("edges", &self.edges),
        ]
    }
}

/// A configured Canny edge detector.
///
/// The kernels are built once by [`CannyPipeline::new`] and reused by every
/// run. Each stage is also exposed on its own so callers can inspect or time
/// intermediate buffers.
///
/// # Example
///
/// ```
/// use canny_image::Image;
/// use canny_imgproc::canny::{CannyConfig, CannyPipeline};
///
/// let pipeline = CannyPipeline::new(CannyConfig::default()).unwrap();
///
/// // a bright square on a dark background
/// let mut data = vec![0u8; 16 * 16 * 4];
/// for y in 4..12 {
///     for x in 4..12 {
///         data[(y * 16 + x) * 4..(y * 16 + x) * 4 + 3].fill(255);
///     }
/// }
/// let image = Image::<u8, 4>::new([16, 16].into(), data).unwrap();
///
/// let outputs = pipeline.run(&image).unwrap();
/// assert!(outputs.edges.as_slice().iter().any(|&v| v == 255));
/// ```
#[derive(Debug, Clone)]
pub struct CannyPipeline {
    config: CannyConfig,
    smoothing: SeparableKernel,
    sobel_x: SeparableKernel,
    sobel_y: SeparableKernel,
}

impl CannyPipeline {
    /// Validate the configuration and build the filter bank.
    ///
    /// No image buffer is allocated before the configuration is accepted.
    pub fn new(config: CannyConfig) -> Result<Self, CannyError> {
        config.validate()?;

        let smoothing =
            SeparableKernel::gaussian(config.smoothing_kernel_width, config.smoothing_variance)?;
        let sobel_x = SeparableKernel::sobel_x(config.gradient_kernel_width)?;
        let sobel_y = SeparableKernel::sobel_y(config.gradient_kernel_width)?;

        Ok(Self {
            config,
            smoothing,
            sobel_x,
            sobel_y,
        })
    }

    /// Reduce an RGBA image to luminance.
    pub fn grayscale(&self, src: &Image<u8, 4>) -> Result<Image<u8, 1>, CannyError> {
        check_not_empty(src.size())?;
        let mut gray = Image::from_size_val(src.size(), 0u8)?;
        gray_from_rgba_u8(src, &mut gray, self.config.strategy)?;
        log::debug!("grayscale: {}", src.size());
        Ok(gray)
    }

    /// Smooth a grayscale image with the gaussian kernel.
    pub fn blur(&self, gray: &Image<u8, 1>) -> Result<Image<u8, 1>, CannyError> {
        let mut blurred = Image::from_size_val(gray.size(), 0u8)?;
        apply_separable_kernel(gray, &mut blurred, &self.smoothing, self.config.strategy)?;
        log::debug!(
            "blur: {} kernel {} variance {}",
            gray.size(),
            self.config.smoothing_kernel_width,
            self.config.smoothing_variance
        );
        Ok(blurred)
    }

    /// Compute the x and y derivatives of an image.
    ///
    /// The two passes read the same input and run concurrently when the
    /// execution strategy is parallel for this image size.
    pub fn gradients(
        &self,
        src: &Image<u8, 1>,
    ) -> Result<(Image<i16, 1>, Image<i16, 1>), CannyError> {
        let strategy = self.config.strategy;
        let mut gx = Image::from_size_val(src.size(), 0i16)?;
        let mut gy = Image::from_size_val(src.size(), 0i16)?;

        let (res_x, res_y) = if strategy.is_parallel(src.size().num_pixels()) {
            rayon::join(
                || apply_separable_kernel(src, &mut gx, &self.sobel_x, strategy),
                || apply_separable_kernel(src, &mut gy, &self.sobel_y, strategy),
            )
        } else {
            (
                apply_separable_kernel(src, &mut gx, &self.sobel_x, strategy),
                apply_separable_kernel(src, &mut gy, &self.sobel_y, strategy),
            )
        };
        res_x?;
        res_y?;

        log::debug!(
            "gradients: {} kernel {}",
            src.size(),
            self.config.gradient_kernel_width
        );
        Ok((gx, gy))
    }

    /// Combine the derivatives into magnitude and direction.
    pub fn gradient_field(
        &self,
        gx: &Image<i16, 1>,
        gy: &Image<i16, 1>,
    ) -> Result<GradientField, CannyError> {
        let field = gradient_field(gx, gy, self.config.strategy)?;
        log::debug!("gradient field: {}", gx.size());
        Ok(field)
    }

    /// Thin the gradient magnitude with non-maximum suppression.
    pub fn suppress(&self, field: &GradientField) -> Result<Image<u8, 1>, CannyError> {
        let thinned = suppress_gradient_field(field, self.config.strategy)?;
        log::debug!("non-maximum suppression: {}", thinned.size());
        Ok(thinned)
    }

    /// Classify the thinned magnitude into strong, weak and non edges.
    pub fn classify(&self, thinned: &Image<u8, 1>) -> Result<Image<u8, 1>, CannyError> {
        let mut classified = Image::from_size_val(thinned.size(), 0u8)?;
        classify(
            thinned,
            &mut classified,
            self.config.low_threshold,
            self.config.high_threshold,
            self.config.strategy,
        )?;
        log::debug!(
            "double threshold: low {} high {}",
            self.config.low_threshold,
            self.config.high_threshold
        );
        Ok(classified)
    }

    /// Link weak edges to strong ones and produce the binary edge map.
    pub fn link(&self, classified: &Image<u8, 1>) -> Result<Image<u8, 1>, CannyError> {
        let mut edges = Image::from_size_val(classified.size(), 0u8)?;
        hysteresis(
            classified,
            &mut edges,
            self.config.hysteresis,
            self.config.strategy,
        )?;
        log::debug!("hysteresis: {:?}", self.config.hysteresis);
        Ok(edges)
    }

    /// Run every stage on an RGBA image.
    pub fn run(&self, src: &Image<u8, 4>) -> Result<CannyOutputs, CannyError> {
        let gray = self.grayscale(src)?;
        self.run_gray(&gray)
    }

    /// Run every stage after the color reduction on a grayscale image.
    pub fn run_gray(&self, gray: &Image<u8, 1>) -> Result<CannyOutputs, CannyError> {
        check_not_empty(gray.size())?;

        let blurred = self.blur(gray)?;
        let (gx, gy) = self.gradients(&blurred)?;
        let field = self.gradient_field(&gx, &gy)?;
        drop((gx, gy));

        let thinned = self.suppress(&field)?;
        let classified = self.classify(&thinned)?;
        let edges = self.link(&classified)?;

        Ok(CannyOutputs {
            blurred,
            magnitude: field.magnitude,
            thinned,
            classified,
            edges,
        })
    }
}

fn check_not_empty(size: ImageSize) -> Result<(), CannyError> {
    if size.is_empty() {
        return Err(CannyError::EmptyImage(size.width, size.height));
    }
    Ok(())
}
