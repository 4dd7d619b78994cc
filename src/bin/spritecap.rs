use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Fixed simulated frame time used to drive the settle delay deterministically.
const TICK: Duration = Duration::from_micros(16_667);

#[derive(Parser, Debug)]
#[command(name = "spritecap", version)]
struct Cli {
    /// Log filter used when `RUST_LOG` is unset (e.g. `info`, `spritecap=debug`).
    #[arg(long, global = true, default_value = "info")]
    log: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Capture every unmuted track of a scene to numbered PNG files.
    Capture(CaptureArgs),
    /// Render a single preview frame at a normalized time.
    Preview(PreviewArgs),
}

#[derive(Args, Debug)]
struct CameraArgs {
    /// Output size: `N` for square or `WxH`.
    #[arg(long)]
    size: Option<spritecap::OutputSize>,

    /// Orthographic zoom (half-height of the view in world units).
    #[arg(long)]
    zoom: Option<f64>,
}

#[derive(Parser, Debug)]
struct CaptureArgs {
    /// Input scene JSON.
    #[arg(long)]
    scene: PathBuf,

    /// Capture config JSON; command-line flags override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Frames per track.
    #[arg(long)]
    frames: Option<u32>,

    /// Also capture the final pose (frames + 1 files per track).
    #[arg(long)]
    include_final: bool,

    /// Output root folder.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Settle delay between tracks, in milliseconds of simulated time.
    #[arg(long)]
    settle_ms: Option<u64>,

    #[command(flatten)]
    camera: CameraArgs,
}

#[derive(Parser, Debug)]
struct PreviewArgs {
    /// Input scene JSON.
    #[arg(long)]
    scene: PathBuf,

    /// Normalized time in [0, 1] of the active duration.
    #[arg(long, default_value_t = 0.0)]
    time: f64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    #[command(flatten)]
    camera: CameraArgs,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log);
    match cli.cmd {
        Command::Capture(args) => cmd_capture(args),
        Command::Preview(args) => cmd_preview(args),
    }
}

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_scene(path: &Path) -> anyhow::Result<spritecap::Director> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("open scene '{}'", path.display()))?;
    let director = spritecap::Director::from_json_str(&text)
        .with_context(|| format!("load scene '{}'", path.display()))?;
    Ok(director)
}

fn make_capturer(
    cfg: &spritecap::CaptureConfig,
) -> anyhow::Result<spritecap::OffscreenCapturer<spritecap::CpuDevice>> {
    let device = spritecap::CpuDevice::new(spritecap::CpuDeviceOpts {
        screen: cfg.output_size,
        zoom: cfg.zoom,
    })
    .context("create render device")?;
    Ok(spritecap::OffscreenCapturer::new(device))
}

fn apply_camera_args(cfg: &mut spritecap::CaptureConfig, camera: &CameraArgs) {
    if let Some(size) = camera.size {
        cfg.output_size = size;
    }
    if let Some(zoom) = camera.zoom {
        cfg.zoom = zoom;
    }
}

fn cmd_capture(args: CaptureArgs) -> anyhow::Result<()> {
    let director = read_scene(&args.scene)?;

    let mut cfg = match &args.config {
        Some(p) => spritecap::CaptureConfig::from_json_file(p)?,
        None => spritecap::CaptureConfig::default(),
    };
    if let Some(frames) = args.frames {
        cfg.frame_count = frames;
    }
    if args.include_final {
        cfg.include_final_frame = true;
    }
    if let Some(out) = args.out {
        cfg.output_root = out;
    }
    if let Some(ms) = args.settle_ms {
        cfg.settle_delay_ms = ms;
    }
    apply_camera_args(&mut cfg, &args.camera);

    cfg.validate()?;
    let max_ticks = tick_budget(spritecap::Timeline::track_count(&director), &cfg);

    let capturer = make_capturer(&cfg)?;
    let clock = spritecap::ManualClock::new();
    let mut seq = spritecap::CaptureSequencer::new(director, capturer, clock.clone(), cfg);

    let report = seq.run_session(max_ticks, |_| clock.advance(TICK))?;

    for t in &report.tracks {
        match &t.status {
            spritecap::TrackStatus::Captured { frames } => {
                eprintln!("  {}: {frames} frames", t.name);
            }
            spritecap::TrackStatus::Skipped => eprintln!("  {}: skipped (muted)", t.name),
            spritecap::TrackStatus::Aborted { frames, reason } => {
                eprintln!("  {}: aborted after {frames} frames: {reason}", t.name);
            }
        }
    }
    eprintln!(
        "wrote {} frames under {}",
        report.frames_written(),
        seq.config().output_root.display()
    );

    if report.has_failures() {
        anyhow::bail!("one or more tracks failed to capture");
    }
    Ok(())
}

/// Upper bound on the ticks a session needs at [`TICK`] per step, saturating on huge delays.
fn tick_budget(tracks: usize, cfg: &spritecap::CaptureConfig) -> u64 {
    let settle_ticks = (cfg.settle_delay_ms.saturating_mul(60) / 1000).saturating_add(2);
    let per_track = u64::from(cfg.frame_stop_count())
        .saturating_add(settle_ticks)
        .saturating_add(8);
    let tracks = u64::try_from(tracks).unwrap_or(u64::MAX);
    tracks
        .saturating_add(1)
        .saturating_mul(per_track)
        .saturating_add(8)
}

fn cmd_preview(args: PreviewArgs) -> anyhow::Result<()> {
    let director = read_scene(&args.scene)?;

    let mut cfg = spritecap::CaptureConfig::default();
    apply_camera_args(&mut cfg, &args.camera);
    cfg.validate()?;

    let capturer = make_capturer(&cfg)?;
    let size = cfg.output_size;
    let mut seq =
        spritecap::CaptureSequencer::new(director, capturer, spritecap::SystemClock::start(), cfg);
    seq.set_preview_time(args.time);
    seq.step();

    let (director, mut capturer, _) = seq.into_parts();
    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    spritecap::FrameCapturer::<spritecap::Director>::set_output_size(&mut capturer, size);
    spritecap::FrameCapturer::capture(&mut capturer, &director, &args.out)
        .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}
