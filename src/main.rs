use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use landing_site::driver::{
    DirectorySink, DisplaySink, DriverOptions, FrameDriver, ImageSequence, LogSink,
    spawn_stdin_commands,
};
use landing_site::{DetectError, DetectionPipeline, DetectorConfig, logger};

#[derive(Parser)]
#[command(name = "landing_site")]
#[command(about = "Detect blue/red circular landing site markers in a video stream")]
struct Cli {
    /// Video source: image file, animated GIF or directory of frames
    #[arg(value_name = "SOURCE")]
    source: Option<PathBuf>,

    /// JSON detector configuration
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Target colors to detect (default: every configured color)
    #[arg(long = "color", value_name = "NAME")]
    colors: Vec<String>,

    /// Write annotated frames and masks to this directory
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Save per-step masks to directory (must be empty)
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,

    /// Stop after this many frames instead of looping forever
    #[arg(long, value_name = "N")]
    max_frames: Option<u64>,

    /// Milliseconds to wait for input between frames
    #[arg(long, default_value_t = 30)]
    poll_ms: u64,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    logger::init_tracing(args.verbose);

    let Some(source_path) = args.source else {
        eprintln!("error: {}", DetectError::MissingSourceArgument);
        eprintln!("usage: landing_site <SOURCE> [--color blue] [--output DIR]");
        std::process::exit(2);
    };

    let mut config = match &args.config {
        Some(path) => DetectorConfig::load_json(path)?,
        None => DetectorConfig::default(),
    };
    if !args.colors.is_empty() {
        config.select_targets(&args.colors)?;
    }

    let mut pipeline = DetectionPipeline::new(config)?.with_verbose(args.verbose);
    if let Some(debug_dir) = args.debug_out {
        pipeline = pipeline.with_debug(debug_dir)?;
    }

    let mut source = ImageSequence::open(&source_path)?;
    let mut sink: Box<dyn DisplaySink> = match args.output {
        Some(dir) => Box::new(DirectorySink::new(dir)?),
        None => Box::new(LogSink::default()),
    };

    let options = DriverOptions {
        poll_interval: Duration::from_millis(args.poll_ms),
        max_frames: args.max_frames,
    };

    println!("Type p + Enter to pause, q + Enter to quit");
    let commands = spawn_stdin_commands();
    let driver = FrameDriver::new(pipeline, options);
    let stats = driver.run(&mut source, sink.as_mut(), &commands)?;

    info!(
        frames = stats.frames,
        skipped = stats.skipped,
        detections = stats.detections,
        loops = stats.loops,
        "done"
    );
    Ok(())
}
