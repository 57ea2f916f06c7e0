//! omr-layout CLI: inspect, repair and render answer-sheet templates.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Args, Parser, Subcommand, ValueEnum};
use omr_layout::capture::{CaptureController, CaptureParams, Origin, StillImageBackend};
use omr_layout::core::{load_json_file, parse_level, Dimensions};
use omr_layout::editor::{render_editor, render_overlay, BackgroundImage, ViewState};
use omr_layout::{AlignmentQuality, LoadedTemplate, Template};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "omr-layout")]
#[command(about = "Inspect, repair and render OMR answer-sheet templates")]
#[command(version)]
struct Cli {
    /// Log level: off, error, warn, info, debug or trace.
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Emit structured JSON logs (requires the `tracing` feature).
    #[cfg(feature = "tracing")]
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a template leniently and print a summary with any repairs.
    Inspect {
        template: PathBuf,
    },

    /// Load, repair and write canonical template JSON.
    Normalize {
        template: PathBuf,
        /// Output file; stdout when omitted.
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Append default field blocks.
    AddBlock {
        template: PathBuf,
        /// Number of blocks to append.
        #[arg(long, default_value_t = 1)]
        count: usize,
        /// Output file; stdout when omitted.
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Render the editor canvas as SVG.
    Render(RenderArgs),

    /// Render the camera alignment overlay as SVG.
    Overlay(OverlayArgs),

    /// Grade a photographed sheet and optionally save it as a capture.
    CheckFrame(CheckFrameArgs),
}

#[derive(Debug, Clone, Args)]
struct RenderArgs {
    template: PathBuf,
    /// Output SVG file; stdout when omitted.
    #[arg(short, long)]
    out: Option<PathBuf>,
    /// Zoom factor, clamped to [0.5, 3].
    #[arg(long, default_value_t = 1.0)]
    zoom: f64,
    /// Hide the background grid.
    #[arg(long)]
    no_grid: bool,
    /// Print block origins next to each block.
    #[arg(long)]
    coords: bool,
    /// PNG or JPEG drawn behind the page.
    #[arg(long)]
    background: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
struct OverlayArgs {
    template: PathBuf,
    #[arg(long)]
    frame_width: u32,
    #[arg(long)]
    frame_height: u32,
    #[arg(long, value_enum, default_value_t = QualityArg::Poor)]
    quality: QualityArg,
    /// Output SVG file; stdout when omitted.
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
struct CheckFrameArgs {
    template: PathBuf,
    /// Photo of the sheet (PNG or JPEG).
    #[arg(long)]
    image: PathBuf,
    /// Capture settings (JSON); defaults when omitted.
    #[arg(long)]
    params: Option<PathBuf>,
    /// Save the frame as a JPEG capture here when alignment is good.
    #[arg(long)]
    capture_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum QualityArg {
    Good,
    Warning,
    Poor,
}

impl From<QualityArg> for AlignmentQuality {
    fn from(q: QualityArg) -> Self {
        match q {
            QualityArg::Good => AlignmentQuality::Good,
            QualityArg::Warning => AlignmentQuality::Warning,
            QualityArg::Poor => AlignmentQuality::Poor,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);
    if let Err(e) = run(cli.command) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

#[cfg(not(feature = "tracing"))]
fn init_logging(cli: &Cli) {
    if let Err(e) = omr_layout::core::init_with_level(parse_level(&cli.log_level)) {
        eprintln!("warning: logger not installed: {e}");
    }
}

#[cfg(feature = "tracing")]
fn init_logging(cli: &Cli) {
    if let Err(e) = tracing_log::LogTracer::init_with_filter(parse_level(&cli.log_level)) {
        eprintln!("warning: log bridge not installed: {e}");
    }
    omr_layout::core::init_tracing(parse_level(&cli.log_level), cli.log_json);
}

fn run(command: Commands) -> CliResult<()> {
    match command {
        Commands::Inspect { template } => run_inspect(&template),
        Commands::Normalize { template, out } => {
            let loaded = load(&template)?;
            write_template(&loaded.template, out.as_deref())
        }
        Commands::AddBlock {
            template,
            count,
            out,
        } => {
            let mut loaded = load(&template)?;
            for _ in 0..count {
                let id = loaded.template.add_field_block();
                log::info!("added {id}");
            }
            write_template(&loaded.template, out.as_deref())
        }
        Commands::Render(args) => run_render(&args),
        Commands::Overlay(args) => run_overlay(&args),
        Commands::CheckFrame(args) => run_check_frame(&args),
    }
}

fn load(path: &Path) -> CliResult<LoadedTemplate> {
    let loaded = load_json_file(path)?;
    for issue in &loaded.issues {
        eprintln!("repaired: {issue}");
    }
    Ok(loaded)
}

fn write_output(out: Option<&Path>, text: &str) -> CliResult<()> {
    match out {
        Some(path) => std::fs::write(path, text)?,
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(text.as_bytes())?;
            stdout.write_all(b"\n")?;
        }
    }
    Ok(())
}

fn write_template(template: &Template, out: Option<&Path>) -> CliResult<()> {
    match out {
        Some(path) => Ok(template.write_json(path)?),
        None => write_output(None, &template.to_json_string()?),
    }
}

fn run_inspect(path: &Path) -> CliResult<()> {
    let loaded = load_json_file(path)?;
    let t = &loaded.template;
    let page = t.page_dimensions();
    let mut out = String::new();
    out.push_str(&format!("page: {} x {}\n", page.width, page.height));
    out.push_str(&format!(
        "bubble: {} x {}\n",
        t.bubble_dimensions().width, t.bubble_dimensions().height
    ));
    out.push_str(&format!("empty value: {:?}\n", t.empty_value));
    out.push_str(&format!("blocks: {}\n", t.len()));
    for block in t.blocks() {
        let bounds = t.geometry(block).bounds();
        let labels = block.field_labels();
        let range = match (labels.first(), labels.last()) {
            (Some(first), Some(last)) => format!("{first}..{last}"),
            _ => String::from("-"),
        };
        out.push_str(&format!(
            "  {}: origin ({}, {}), {} bubbles, labels {}, bounds {:.1} x {:.1}\n",
            block.id(),
            block.origin().x,
            block.origin().y,
            block.bubble_count(),
            range,
            bounds.width,
            bounds.height
        ));
    }
    if loaded.is_clean() {
        out.push_str("issues: none");
    } else {
        out.push_str(&format!("issues: {}", loaded.issues.len()));
        for issue in &loaded.issues {
            out.push_str(&format!("\n  - {issue}"));
        }
    }
    write_output(None, &out)
}

fn run_render(args: &RenderArgs) -> CliResult<()> {
    let loaded = load(&args.template)?;
    let mut view = ViewState::default();
    view.set_zoom(args.zoom);
    view.show_grid = !args.no_grid;
    view.show_coordinates = args.coords;
    let background = args
        .background
        .as_deref()
        .map(BackgroundImage::open)
        .transpose()?;
    let scene = render_editor(&loaded.template, &view, background.as_ref());
    write_output(args.out.as_deref(), &scene.to_svg())
}

fn run_overlay(args: &OverlayArgs) -> CliResult<()> {
    if args.frame_width == 0 || args.frame_height == 0 {
        return Err("frame size must be non-zero".into());
    }
    let loaded = load(&args.template)?;
    let frame = Dimensions::new(args.frame_width as f64, args.frame_height as f64);
    let scene = render_overlay(&loaded.template, frame, args.quality.into());
    write_output(args.out.as_deref(), &scene.to_svg())
}

fn run_check_frame(args: &CheckFrameArgs) -> CliResult<()> {
    let loaded = load(&args.template)?;
    let params = match &args.params {
        Some(path) => CaptureParams::load_json(path)?,
        None => CaptureParams::default(),
    };
    let backend = StillImageBackend::open(&args.image)?;
    let page = loaded.template.page_dimensions();
    let mut ctl = CaptureController::new(backend, Origin::localhost(), page, params);
    ctl.open()?;
    ctl.tick(Instant::now());

    let quality = ctl.quality();
    let mut out = format!("alignment: {quality}");
    if let Some(report) = ctl.last_report() {
        let [top, right, bottom, left] = report.per_edge;
        out.push_str(&format!(
            "\nedges: top {top:.2}, right {right:.2}, bottom {bottom:.2}, left {left:.2}\ninterior: {:.0}",
            report.interior_mean
        ));
    }

    write_output(None, &out)?;

    if let Some(dir) = &args.capture_dir {
        let artifact = ctl.capture_frame()?;
        let path = artifact.write_to_dir(dir)?;
        write_output(None, &format!("captured: {}", path.display()))?;
    }
    ctl.close();
    Ok(())
}
