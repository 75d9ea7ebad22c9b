use crate::zoo::parse_mean;
use clap::{CommandFactory, Parser};
use inference::{ComputeBackend, ComputeTarget};
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;

/// Run a classification network on a camera, video or image stream and
/// overlay the predicted class and timing information.
#[derive(Debug, Clone, Parser)]
#[command(name = "classification", version, about, long_about = None)]
pub struct Cli {
    /// Model alias in the catalog to take preprocessing parameters from.
    pub alias: Option<String>,

    /// Catalog with preprocessing parameters per model alias.
    #[arg(long, default_value = "models.yml")]
    pub zoo: PathBuf,

    /// Image, directory, glob pattern, video file or camera index.
    /// Captures from camera 0 when omitted.
    #[arg(short, long)]
    pub input: Option<String>,

    /// Framework the model comes from. Detected from file extensions when omitted.
    #[arg(short, long)]
    pub framework: Option<String>,

    /// Text file with one class name per line.
    #[arg(long)]
    pub classes: Option<PathBuf>,

    /// Computation backend: 0 default, 1 halide, 2 inference-engine, 3 opencv, 5 cuda.
    #[arg(long, default_value = "0")]
    pub backend: ComputeBackend,

    /// Target device: 0 cpu, 1 opencl, 2 opencl-fp16, 3 vpu, 6 cuda, 7 cuda-fp16.
    #[arg(long, default_value = "0")]
    pub target: ComputeTarget,

    /// Number of identical copies of each frame per forward pass.
    #[arg(
        long = "batch-size",
        visible_alias = "batch_size",
        default_value_t = 1,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub batch_size: u32,

    /// Model weights file.
    #[arg(short, long)]
    pub model: Option<String>,

    /// Network description file, for frameworks that split it from the weights.
    #[arg(short, long)]
    pub config: Option<String>,

    /// Per-channel mean subtracted before scaling, e.g. "104 117 123".
    #[arg(long, value_parser = parse_mean)]
    pub mean: Option<[f32; 3]>,

    /// Multiplier applied after mean subtraction.
    #[arg(long)]
    pub scale: Option<f32>,

    /// Network input width. Zero or negative keeps the frame width.
    #[arg(long, allow_negative_numbers = true)]
    pub width: Option<i32>,

    /// Network input height. Zero or negative keeps the frame height.
    #[arg(long, allow_negative_numbers = true)]
    pub height: Option<i32>,

    /// Feed channels in RGB instead of BGR order.
    #[arg(
        long,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    pub rgb: Option<bool>,

    /// Output layer to read class scores from. Defaults to the first model output.
    #[arg(long)]
    pub output_layer: Option<String>,

    /// Forward passes run and discarded before timing.
    #[arg(long, default_value_t = inference::benchmark::DEFAULT_WARMUP_PASSES)]
    pub warmup: u32,

    /// Timed forward passes per frame.
    #[arg(
        long,
        default_value_t = inference::benchmark::DEFAULT_TIMED_PASSES,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub reps: u32,

    /// Log overlays instead of opening a window.
    #[arg(long)]
    pub headless: bool,
}

/// Result of reading the command line: either arguments to run with, or the
/// exit code of an invocation that ends here.
#[derive(Debug)]
pub enum ParseOutcome {
    Run(Box<Cli>),
    Exit(ExitCode),
}

/// Parse `args` (program name first). A bare invocation prints usage and
/// exits successfully, as do `--help` and `--version`. Invalid arguments
/// print the error and exit with failure.
pub fn parse_args<I, T>(args: I) -> ParseOutcome
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
    if args.len() <= 1 {
        return match Cli::command().print_help() {
            Ok(()) => ParseOutcome::Exit(ExitCode::SUCCESS),
            Err(_) => ParseOutcome::Exit(ExitCode::FAILURE),
        };
    }

    match Cli::try_parse_from(args) {
        Ok(cli) => ParseOutcome::Run(Box::new(cli)),
        Err(e) => {
            let _ = e.print();
            ParseOutcome::Exit(if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            })
        }
    }
}
