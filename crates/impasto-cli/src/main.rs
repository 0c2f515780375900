//! Stylize a photo into an oil-painting-style PNG.
//!
//! This binary plays the role of the service layer around the pipeline:
//! it reads the input file, resolves raw slider values (0-100) into
//! pipeline parameters, enforces the input-size ceiling, runs the
//! pipeline on a worker thread so a `--timeout` can cancel it, and
//! writes the result.

use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;

use clap::Parser;
use impasto_pipeline::{
    CancelToken, MAX_INPUT_BYTES, StagedOutput, StyleParams, codec, stylize_staged,
};

/// Convert a photo to an oil-painting-style PNG.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Input image (PNG, JPEG, or WebP).
    input: PathBuf,

    /// Output PNG path.
    #[arg(short, long)]
    output: PathBuf,

    /// Effect intensity slider, 0-100.
    #[arg(long, default_value_t = 50)]
    intensity: u32,

    /// Brush size slider, 0-100.
    #[arg(long, default_value_t = 50)]
    brush_size: u32,

    /// Color vibrance slider; clamped to 1-200 (100 = neutral).
    #[arg(long, default_value_t = 100)]
    color_vibrance: i64,

    /// Fix the random seed for reproducible output.
    #[arg(long)]
    seed: Option<u64>,

    /// Abort if the conversion takes longer than this many seconds.
    #[arg(long, value_name = "SECONDS")]
    timeout: Option<u64>,

    /// Write every intermediate stage as a PNG into this directory.
    #[arg(long, value_name = "DIR")]
    dump_stages: Option<PathBuf>,

    /// Increase log verbosity (-v: debug, -vv: trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(args.verbose)?;

    let bytes = std::fs::read(&args.input)?;
    if bytes.len() > MAX_INPUT_BYTES {
        return Err(format!(
            "input is {} bytes; the limit is {MAX_INPUT_BYTES} (10 MB)",
            bytes.len()
        )
        .into());
    }

    let params = StyleParams::from_sliders(
        args.brush_size,
        args.intensity,
        Some(args.color_vibrance),
    );
    log::info!(
        "resolved sliders to radius={} intensity={} brush_count={} vibrance={}",
        params.radius,
        params.intensity,
        params.brush_count,
        params.color_vibrance
    );

    let staged = run_pipeline(bytes, params, args.seed, args.timeout.map(Duration::from_secs))?;

    if let Some(dir) = &args.dump_stages {
        dump_stages(&staged, dir)?;
    }

    let png = codec::encode_png(staged.final_image())?;
    std::fs::write(&args.output, png)?;
    log::info!("wrote {}", args.output.display());
    Ok(())
}

fn init_logging(verbose: u8) -> Result<(), Box<dyn std::error::Error>> {
    let level = match verbose {
        0 => simplelog::LevelFilter::Info,
        1 => simplelog::LevelFilter::Debug,
        _ => simplelog::LevelFilter::Trace,
    };
    simplelog::TermLogger::init(
        level,
        simplelog::Config::default(),
        simplelog::TerminalMode::Stderr,
        simplelog::ColorChoice::Auto,
    )?;
    Ok(())
}

/// Decode and stylize on a worker thread, optionally bounded by a
/// timeout that flips the pipeline's cancel token.
fn run_pipeline(
    bytes: Vec<u8>,
    params: StyleParams,
    seed: Option<u64>,
    timeout: Option<Duration>,
) -> Result<StagedOutput, Box<dyn std::error::Error>> {
    let cancel = CancelToken::new();
    let worker_cancel = cancel.clone();
    let (tx, rx) = mpsc::channel();

    std::thread::spawn(move || {
        let result = codec::decode(&bytes)
            .map(codec::downscale_if_large)
            .and_then(|working| stylize_staged(&working, &params, seed, &worker_cancel));
        // The receiver may have given up after a timeout; a send error
        // here just means no one is listening anymore.
        let _ = tx.send(result);
    });

    let outcome = match timeout {
        Some(limit) => rx.recv_timeout(limit).map_err(|_| {
            cancel.cancel();
            format!("conversion did not finish within {}s", limit.as_secs())
        })?,
        None => rx.recv().map_err(|_| "conversion worker disappeared")?,
    };

    Ok(outcome?)
}

/// Save every intermediate raster as `<dir>/<NN>-<stage>.png`.
fn dump_stages(staged: &StagedOutput, dir: &std::path::Path) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(dir)?;
    let stages = [
        ("01-working", &staged.working),
        ("02-smoothed", &staged.smoothed),
        ("03-canvas", &staged.canvas),
        ("04-brushed", &staged.brushed),
        ("05-enhanced", &staged.enhanced),
        ("06-quantized", &staged.quantized),
        ("07-composed", &staged.composed),
        ("08-etched", &staged.etched),
    ];
    for (name, raster) in stages {
        let path = dir.join(format!("{name}.png"));
        std::fs::write(&path, codec::encode_png(raster)?)?;
        log::debug!("dumped {}", path.display());
    }
    Ok(())
}
