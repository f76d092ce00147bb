use argh::FromArgs;
use std::{fs::File, io::BufReader, path::PathBuf, time::Instant};

use canny::imgproc::canny::{CannyConfig, CannyOutputs, CannyPipeline};
use canny::imgproc::hysteresis::HysteresisMode;
use canny::imgproc::parallel::ExecutionStrategy;
use canny::io::functional as F;

#[derive(FromArgs)]
/// Detect edges in an image and save every intermediate stage
struct Args {
    /// path to an input image
    #[argh(option, short = 'i')]
    image_path: PathBuf,

    /// directory where the stage images are written
    #[argh(option, short = 'o', default = "PathBuf::from(\"output\")")]
    output_dir: PathBuf,

    /// json file with the detector configuration
    #[argh(option, short = 'c')]
    config: Option<PathBuf>,

    /// width of the gaussian smoothing kernel
    #[argh(option)]
    smoothing_kernel_width: Option<usize>,

    /// variance of the gaussian smoothing kernel
    #[argh(option)]
    smoothing_variance: Option<f32>,

    /// width of the sobel kernels
    #[argh(option)]
    gradient_kernel_width: Option<usize>,

    /// low hysteresis threshold
    #[argh(option)]
    low_threshold: Option<u16>,

    /// high hysteresis threshold
    #[argh(option)]
    high_threshold: Option<u16>,

    /// execution strategy: auto, parallel or serial
    #[argh(option, from_str_fn(to_strategy))]
    strategy: Option<ExecutionStrategy>,

    /// hysteresis algorithm: relaxation or worklist
    #[argh(option, from_str_fn(to_hysteresis))]
    hysteresis: Option<HysteresisMode>,

    /// output format: png or jpg
    #[argh(option, short = 'f', default = "String::from(\"png\")")]
    format: String,
}

fn to_strategy(value: &str) -> Result<ExecutionStrategy, String> {
    match value {
        "auto" => Ok(ExecutionStrategy::Auto),
        "parallel" => Ok(ExecutionStrategy::Parallel),
        "serial" => Ok(ExecutionStrategy::Serial),
        _ => Err(format!("Unsupported execution strategy: {value}")),
    }
}

fn to_hysteresis(value: &str) -> Result<HysteresisMode, String> {
    match value {
        "relaxation" => Ok(HysteresisMode::Relaxation),
        "worklist" => Ok(HysteresisMode::Worklist),
        _ => Err(format!("Unsupported hysteresis mode: {value}")),
    }
}

fn load_config(args: &Args) -> Result<CannyConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => serde_json::from_reader(BufReader::new(File::open(path)?))?,
        None => CannyConfig::default(),
    };

    if let Some(v) = args.smoothing_kernel_width {
        config.smoothing_kernel_width = v;
    }
    if let Some(v) = args.smoothing_variance {
        config.smoothing_variance = v;
    }
    if let Some(v) = args.gradient_kernel_width {
        config.gradient_kernel_width = v;
    }
    if let Some(v) = args.low_threshold {
        config.low_threshold = v;
    }
    if let Some(v) = args.high_threshold {
        config.high_threshold = v;
    }
    if let Some(v) = args.strategy {
        config.strategy = v;
    }
    if let Some(v) = args.hysteresis {
        config.hysteresis = v;
    }

    Ok(config)
}

/// Run `f` and log how long it took.
fn timed<T>(stage: &str, f: impl FnOnce() -> T) -> T {
    let start = Instant::now();
    let out = f();
    log::info!(
        "{stage:<24} {:>9.3} ms",
        start.elapsed().as_secs_f64() * 1e3
    );
    out
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args: Args = argh::from_env();

    if !matches!(args.format.as_str(), "png" | "jpg") {
        return Err(format!("Unsupported output format: {}", args.format).into());
    }

    let config = load_config(&args)?;
    log::info!("{config:?}");

    let pipeline = CannyPipeline::new(config)?;

    let image = timed("read image", || F::read_image_any_rgba8(&args.image_path))?;
    log::info!(
        "loaded {} ({})",
        args.image_path.display(),
        image.size()
    );

    let total = Instant::now();

    let gray = timed("grayscale", || pipeline.grayscale(&image))?;
    let blurred = timed("gaussian blur", || pipeline.blur(&gray))?;
    let (gx, gy) = timed("sobel gradients", || pipeline.gradients(&blurred))?;
    let field = timed("magnitude and direction", || pipeline.gradient_field(&gx, &gy))?;
    let thinned = timed("non-maximum suppression", || pipeline.suppress(&field))?;
    let classified = timed("double threshold", || pipeline.classify(&thinned))?;
    let edges = timed("hysteresis", || pipeline.link(&classified))?;

    log::info!(
        "{:<24} {:>9.3} ms",
        "total",
        total.elapsed().as_secs_f64() * 1e3
    );

    let outputs = CannyOutputs {
        blurred,
        magnitude: field.magnitude,
        thinned,
        classified,
        edges,
    };

    let num_edges = outputs.edges.as_slice().iter().filter(|&&v| v > 0).count();
    log::info!("{num_edges} edge pixels");

    std::fs::create_dir_all(&args.output_dir)?;
    for (name, stage) in outputs.named() {
        let path = args.output_dir.join(format!("{name}.{}", args.format));
        F::write_image_gray8(&path, stage)?;
        log::info!("wrote {}", path.display());
    }

    Ok(())
}
