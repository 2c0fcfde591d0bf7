use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use textstamp::config::{self, LayoutConfig};
use textstamp::imaging::{
    ExportFormat, FontCatalog, ImageBackend, RenderPlan, Resolution, RustBackend,
};
use textstamp::output::{self, CheckSummary};
use textstamp::process::{self, BatchJob, ImageSource};
use textstamp::{input, logging, package};
use tracing::info;

/// Shared flags for commands that plan a batch.
#[derive(clap::Args, Clone)]
struct BatchArgs {
    /// Sample image the layout was designed against
    #[arg(long)]
    sample: PathBuf,

    /// Text file, one overlay line per image
    #[arg(long)]
    text: PathBuf,

    /// Target images or directories of images, in batch order
    #[arg(long, num_args = 1.., required = true)]
    images: Vec<PathBuf>,

    /// Layout file (see 'textstamp gen-config')
    #[arg(long)]
    layout: Option<PathBuf>,

    /// Output format, overrides the layout file
    #[arg(long, value_enum)]
    format: Option<ExportFormat>,

    /// Print resolution, overrides the layout file
    #[arg(long, value_enum)]
    resolution: Option<Resolution>,

    /// JPEG quality 1-100, overrides the layout file
    #[arg(long)]
    quality: Option<u32>,

    /// Extra TTF/OTF font file (repeatable)
    #[arg(long = "font")]
    fonts: Vec<PathBuf>,

    /// Use only fonts given explicitly, not the system fonts
    #[arg(long)]
    no_system_fonts: bool,
}

#[derive(clap::Args, Clone)]
struct ProcessArgs {
    #[command(flatten)]
    batch: BatchArgs,

    /// Output file, or directory to receive processed_images.zip/.pdf
    #[arg(long, short, default_value = ".")]
    output: PathBuf,

    /// Write a JSON report of rendered and failed items
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Parser)]
#[command(name = "textstamp")]
#[command(about = "Stamp one line of text per image onto a batch of photos")]
#[command(long_about = "\
Stamp one line of text per image onto a batch of photos

A layout file places and styles a text box on a sample image. Every target
image is fitted onto a print canvas without cropping and receives the text
line with the same index, at the same relative position.

  textstamp process --sample sample.jpg --text lines.txt --images photos/

Pairing:
  image 1 <-> line 1, image 2 <-> line 2, ...
  Surplus images or lines are ignored. Blank lines are skipped.

Output:
  png, jpg -> processed_images.zip (processed_image_001.png, ...)
  pdf      -> processed_images.pdf (one A4 page per image)

Run 'textstamp gen-config' to generate a documented layout file.")]
#[command(version)]
struct Cli {
    /// Log progress details to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render the batch and write the ZIP or PDF package
    Process(ProcessArgs),
    /// Validate inputs and show the pairing plan without rendering
    Check(BatchArgs),
    /// Print a stock layout file with all options documented
    GenConfig,
}

/// Everything resolved from the command line before rendering.
struct Prepared {
    backend: RustBackend,
    plan: RenderPlan,
    job: BatchJob,
    sample_name: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Command::Process(args) => {
            let prepared = prepare(&args.batch)?;
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_process_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let outcome = process::run_batch(
                &prepared.backend,
                &prepared.plan,
                &prepared.job,
                Some(tx),
                None,
            )?;
            printer.join().map_err(|_| "progress printer panicked")?;

            if let Some(report_path) = &args.report {
                let json = serde_json::to_string_pretty(&outcome.report())?;
                std::fs::write(report_path, json)?;
                info!(path = %report_path.display(), "wrote batch report");
            }

            if outcome.results.is_empty() {
                output::print_batch_summary(&outcome, None);
                return Err("no images were rendered".into());
            }
            let export = prepared.plan.export;
            let bundle = package::package(&outcome.results, export.format, export.orientation)?;
            let written = package::write_package(&bundle, &args.output)?;
            output::print_batch_summary(&outcome, Some(&written));
        }
        Command::Check(args) => {
            let prepared = prepare(&args)?;
            let family = &prepared.plan.text_box.style.font_family;
            let summary = CheckSummary {
                sample_name: &prepared.sample_name,
                design: prepared.plan.design,
                export: prepared.plan.export,
                pairs: prepared
                    .job
                    .pairs()
                    .map(|(_, image, line)| (image.name(), line))
                    .collect(),
                ignored_images: prepared.job.ignored_images(),
                ignored_lines: prepared.job.ignored_lines(),
                font_family: family,
                resolved_font: prepared.backend.fonts().resolve(family),
            };
            output::print_check_output(&summary);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load the layout, apply command-line overrides, and read every input.
fn prepare(args: &BatchArgs) -> Result<Prepared, Box<dyn std::error::Error>> {
    let config = layout_with_overrides(args)?;
    let backend = RustBackend::new(font_catalog(args, &config)?);

    let sample = std::fs::read(&args.sample)?;
    let design = backend.identify(&sample)?;
    let plan = config.render_plan(design);
    info!(%design, canvas = %plan.canvas(), "planned export");

    let lines = input::read_text_lines(&args.text)?;
    let images = input::collect_images(&args.images)?;
    let job = BatchJob::new(images.into_iter().map(ImageSource::from).collect(), lines);

    Ok(Prepared {
        backend,
        plan,
        job,
        sample_name: ImageSource::from(args.sample.as_path()).name(),
    })
}

fn layout_with_overrides(args: &BatchArgs) -> Result<LayoutConfig, config::ConfigError> {
    let mut config = config::load_config(args.layout.as_deref())?;
    if let Some(format) = args.format {
        config.export.format = format;
    }
    if let Some(resolution) = args.resolution {
        config.export.resolution = resolution;
    }
    if let Some(quality) = args.quality {
        config.export.jpeg_quality = quality;
    }
    config.validate()?;
    Ok(config)
}

/// System fonts (unless disabled), then layout fonts, then `--font` files.
fn font_catalog(
    args: &BatchArgs,
    config: &LayoutConfig,
) -> Result<FontCatalog, Box<dyn std::error::Error>> {
    let mut catalog = if args.no_system_fonts {
        FontCatalog::empty()
    } else {
        FontCatalog::with_system_fonts()
    };
    let layout_dir = args
        .layout
        .as_deref()
        .and_then(Path::parent)
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    for path in config.font_files(layout_dir).iter().chain(&args.fonts) {
        let name = catalog.register_file(path)?;
        info!(font = %name, path = %path.display(), "registered font");
    }
    Ok(catalog)
}
