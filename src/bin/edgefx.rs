use std::{
    cell::RefCell,
    io::Write as _,
    path::{Path, PathBuf},
    rc::Rc,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use edgefx::{ElementKind, EventLoop, Options, Orchestrator, Outline, Pacing, RecordingSurface, Scene};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "edgefx", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the full effect lifecycle over a scene and dump the render timeline.
    Run(RunArgs),
    /// Print every element's outline as an SVG path.
    Outline(OutlineArgs),
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Scene JSON.
    #[arg(long)]
    scene: PathBuf,

    /// Options JSON; defaults apply when omitted.
    #[arg(long)]
    options: Option<PathBuf>,

    /// Output timeline JSON (stdout when omitted).
    #[arg(long)]
    out: Option<PathBuf>,

    /// Sleep between timers instead of jumping the virtual clock.
    #[arg(long)]
    realtime: bool,
}

#[derive(Parser, Debug)]
struct OutlineArgs {
    /// Scene JSON.
    #[arg(long)]
    scene: PathBuf,

    /// Outline inset, as the stroke width would apply it.
    #[arg(long, default_value_t = 2.0)]
    stroke_width: f64,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Run(args) => cmd_run(args),
        Command::Outline(args) => cmd_outline(args),
    }
}

fn read_scene(path: &Path) -> anyhow::Result<Scene> {
    Scene::from_path(path).with_context(|| format!("load scene '{}'", path.display()))
}

fn cmd_run(args: RunArgs) -> anyhow::Result<()> {
    let scene = read_scene(&args.scene)?;
    let options = match &args.options {
        Some(path) => {
            Options::from_path(path).with_context(|| format!("load options '{}'", path.display()))?
        }
        None => Options::default(),
    };

    let recording = Rc::new(RefCell::new(RecordingSurface::new()));
    let event_loop = EventLoop::new();
    let handle = Orchestrator::new()
        .run(scene, options, recording.clone(), event_loop)
        .context("start run")?;

    let pacing = if args.realtime {
        Pacing::RealTime
    } else {
        Pacing::Virtual
    };
    let report = handle.wait(pacing).context("run did not complete")?;

    let doc = serde_json::json!({
        "timeline": &*recording.borrow(),
        "report": report,
    });
    let text = serde_json::to_string_pretty(&doc).context("serialize timeline")?;

    match &args.out {
        Some(out) => {
            if let Some(parent) = out.parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create output dir '{}'", parent.display()))?;
            }
            std::fs::write(out, text).with_context(|| format!("write '{}'", out.display()))?;
            eprintln!(
                "wrote {} ({} commands, {} jobs, {})",
                out.display(),
                recording.borrow().len(),
                report.outcomes.len(),
                report.elapsed()
            );
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{text}").context("write stdout")?;
        }
    }
    Ok(())
}

fn cmd_outline(args: OutlineArgs) -> anyhow::Result<()> {
    anyhow::ensure!(
        args.stroke_width.is_finite() && args.stroke_width >= 0.0,
        "stroke width must be a non-negative number"
    );
    let scene = read_scene(&args.scene)?;
    let mut stdout = std::io::stdout().lock();
    for element in &scene.elements {
        let (w, h) = (element.rect.width().abs(), element.rect.height().abs());
        let outline = match (&element.kind, &element.mask) {
            (ElementKind::Image, Some(mask)) => Outline::from_mask(mask, w, h, args.stroke_width),
            _ => Outline::rounded(w, h, element.radii, args.stroke_width),
        }
        .with_context(|| format!("outline element '{}'", element.id))?;
        writeln!(
            stdout,
            "{}\t{:.3}\t{}",
            element.id,
            outline.length(),
            outline.to_svg()
        )
        .context("write stdout")?;
    }
    Ok(())
}
