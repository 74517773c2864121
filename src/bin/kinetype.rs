use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "kinetype", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a single preview frame as a PNG.
    Frame(FrameArgs),
    /// Export a video (requires `ffmpeg` on PATH).
    Render(RenderArgs),
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input render request JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Clock position in milliseconds.
    #[arg(long, default_value_t = 0.0)]
    at_ms: f64,

    /// Replace the request's script text.
    #[arg(long)]
    text: Option<String>,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input render request JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Replace the request's script text.
    #[arg(long)]
    text: Option<String>,

    /// Output path; the container extension is appended when missing.
    #[arg(long)]
    out: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Render(args) => cmd_render(args),
    }
}

fn read_request(path: &Path, text: Option<String>) -> anyhow::Result<kinetype::RenderRequest> {
    let mut req = kinetype::RenderRequest::from_path(path)
        .with_context(|| format!("load render request '{}'", path.display()))?;
    if let Some(text) = text {
        req.script = kinetype::config::ScriptSource::Text { text };
    }
    // Relative asset paths resolve against the request file.
    let root = path.parent().unwrap_or_else(|| Path::new("."));
    for p in [&mut req.audio, &mut req.font_path, &mut req.transcript]
        .into_iter()
        .flatten()
    {
        if p.is_relative() {
            *p = root.join(&*p);
        }
    }
    match &mut req.background {
        kinetype::config::BackgroundDesc::Image { source }
        | kinetype::config::BackgroundDesc::Video { source }
            if source.is_relative() =>
        {
            *source = root.join(&*source);
        }
        _ => {}
    }
    Ok(req)
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let req = read_request(&args.in_path, args.text)?;
    let script = kinetype::resolve_script(&req, None)?;
    let mut preview = kinetype::PreviewSession::from_request(&req, &script)?;
    let frame = preview
        .frame_at(args.at_ms)?
        .context("preview produced no frame")?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    image::save_buffer_with_format(
        &args.out,
        &frame.to_straight_rgba(),
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

/// Prints progress in 10% steps.
#[derive(Default)]
struct StderrProgress {
    last_decile: Option<u8>,
}

impl kinetype::ExportObserver for StderrProgress {
    fn on_progress(&mut self, percent: u8) {
        let decile = percent / 10;
        if self.last_decile != Some(decile) {
            self.last_decile = Some(decile);
            eprintln!("progress {}%", decile * 10);
        }
    }

    fn on_complete(&mut self, artifact: &kinetype::Artifact) {
        eprintln!(
            "encoded {} bytes as {}",
            artifact.bytes.len(),
            artifact.mime_type
        );
    }

    fn on_error(&mut self, message: &str) {
        eprintln!("export failed: {message}");
    }
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let req = read_request(&args.in_path, args.text)?;
    let script = kinetype::resolve_script(&req, None)?;
    let factory = kinetype::FfmpegRecorderFactory::detect();

    let mut session = kinetype::ExportSession::from_request(req, script, Box::new(factory))?
        .with_observer(Box::new(StderrProgress::default()));
    let artifact = session.run()?;

    let mut out = args.out;
    if out.extension().is_none() {
        out.set_extension(artifact.file_extension());
    }
    kinetype::write_artifact(&out, &artifact.bytes)?;

    eprintln!("wrote {}", out.display());
    Ok(())
}
