use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "inkframe", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Summarize an annotation bundle.
    Inspect(InspectArgs),
    /// Render one tick's annotation as PNG.
    Render(RenderArgs),
    /// Print focus weights around a tick.
    Focus(FocusArgs),
}

#[derive(Parser, Debug)]
struct InspectArgs {
    /// Bundle directory.
    #[arg(long)]
    bundle: PathBuf,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Bundle directory.
    #[arg(long)]
    bundle: PathBuf,

    /// Tick value in the bundle's rate.
    #[arg(long, allow_hyphen_values = true)]
    tick: i64,

    /// Output PNG path for the full-frame image.
    #[arg(long)]
    out: PathBuf,

    /// Output PNG path for the thumbnail image.
    #[arg(long)]
    thumb_out: Option<PathBuf>,

    /// Full-frame width in display points.
    #[arg(long, default_value_t = 1024.0)]
    width: f64,

    /// Full-frame height in display points.
    #[arg(long, default_value_t = 576.0)]
    height: f64,

    /// Device pixel ratio (overrides `INKFRAME_SCREEN_SCALE`).
    #[arg(long)]
    scale: Option<f64>,
}

#[derive(Parser, Debug)]
struct FocusArgs {
    /// Bundle directory.
    #[arg(long)]
    bundle: PathBuf,

    /// Tick value in the bundle's rate.
    #[arg(long, allow_hyphen_values = true)]
    tick: i64,

    /// Half span in ticks (defaults to half a second).
    #[arg(long)]
    half_span: Option<i64>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("INKFRAME_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Inspect(args) => cmd_inspect(args),
        Command::Render(args) => cmd_render(args),
        Command::Focus(args) => cmd_focus(args),
    }
}

fn load(bundle: &std::path::Path) -> anyhow::Result<(inkframe::Document, inkframe::MovieRef)> {
    let doc = inkframe::Document::load(bundle)
        .with_context(|| format!("load bundle '{}'", bundle.display()))?;
    let movie = doc
        .movie
        .clone()
        .context("bundle has no movie reference")?;
    Ok((doc, movie))
}

fn cmd_inspect(args: InspectArgs) -> anyhow::Result<()> {
    let (doc, movie) = load(&args.bundle)?;
    let summary = doc.summary();
    let base = args.bundle.parent().unwrap_or_else(|| std::path::Path::new("."));
    let resolved = match movie.resolve(base) {
        Ok(p) => p.display().to_string(),
        Err(e) => format!("unresolved ({e})"),
    };

    println!("movie: {} ({})", movie.location.display(), resolved);
    println!("rate: {}/s", movie.rate.per_second);
    println!(
        "static: {} ticks, {} strokes, {} samples",
        summary.static_ticks, summary.strokes, summary.samples
    );
    println!(
        "dynamic: {} ticks, {} samples",
        summary.dynamic_ticks, summary.dynamic_samples
    );
    if let (Some(first), Some(last)) = (
        doc.static_drawings.keys().next(),
        doc.static_drawings.keys().next_back(),
    ) {
        println!(
            "static span: {:.3}s .. {:.3}s",
            movie.rate.tick(*first).as_secs(),
            movie.rate.tick(*last).as_secs()
        );
    }
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let (doc, movie) = load(&args.bundle)?;
    let base = inkframe::SessionOpts::default().with_env_overrides().annotation;
    let full = inkframe::Size::new(args.width, args.height);
    let opts = inkframe::AnnotationOpts {
        full_frame_size: full,
        thumbnail_size: inkframe::Size::new(
            base.thumbnail_size.width,
            base.thumbnail_size.width * args.height / args.width.max(f64::EPSILON),
        ),
        pixel_ratio: args.scale.unwrap_or(base.pixel_ratio),
        style: base.style,
    };

    let mut store = doc.into_store(opts)?;
    let tick = movie.rate.tick(args.tick);
    let rendered = store
        .rendered_images_at(tick)?
        .with_context(|| format!("no annotation rendered at tick {}", args.tick))?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    rendered.full.save_png(&args.out)?;
    eprintln!("wrote {}", args.out.display());
    if let Some(thumb_out) = &args.thumb_out {
        rendered.thumb.save_png(thumb_out)?;
        eprintln!("wrote {}", thumb_out.display());
    }

    println!(
        "tick {} strokes {} image {}",
        args.tick,
        rendered.strokes.len(),
        inkframe::fingerprint_image(&rendered.full)
    );
    Ok(())
}

fn cmd_focus(args: FocusArgs) -> anyhow::Result<()> {
    let (doc, movie) = load(&args.bundle)?;
    let opts = inkframe::SessionOpts::default().with_env_overrides();
    let half_span = args
        .half_span
        .unwrap_or_else(|| opts.focus_half_span_in(movie.rate));
    let store = doc.into_store(opts.annotation)?;

    let points = store.focus_weights_at(movie.rate.tick(args.tick), half_span)?;
    for p in &points {
        println!(
            "{}\t{:.4}\t{:.2}\t{:.2}",
            p.tick.value, p.weight, p.point.x, p.point.y
        );
    }
    eprintln!("{} focus points within {} ticks", points.len(), half_span);
    Ok(())
}
