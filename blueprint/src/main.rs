use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use blueprint_core::{SvgOptions, build_sketch_svg, encode_rgba_to_png_bytes};
use clap::{Parser, ValueEnum};
use log::{info, warn};
use sketch_core::{InspectionFeed, LayoutConfig};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Svg,
    Png,
    /// Layout geometry as JSON
    Json,
}

/// Render an inspection feed (rooms, openings, adjacencies) as a sketch.
#[derive(Parser, Debug)]
#[command(name = "blueprint")]
#[command(version)]
struct Cli {
    /// Inspection feed JSON
    input: PathBuf,

    /// Output file
    output: PathBuf,

    /// Output format; taken from the output extension when omitted
    #[arg(short, long, value_enum)]
    format: Option<Format>,

    /// Use the full-canvas layout density
    #[arg(long)]
    expanded: bool,

    /// Layout config JSON; fields left out keep their preset value
    #[arg(long)]
    config: Option<PathBuf>,

    /// Drawing units per foot, overrides the preset
    #[arg(long)]
    scale: Option<f64>,

    /// Output pixels per drawing unit
    #[arg(long, default_value = "2.0")]
    px_per_unit: f64,

    /// Draw the snap grid
    #[arg(long)]
    grid: bool,

    /// Extra font file for PNG text
    #[arg(long)]
    font: Option<PathBuf>,
}

fn load_config(cli: &Cli) -> Result<LayoutConfig> {
    let mut cfg = match &cli.config {
        Some(path) => {
            let txt = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            LayoutConfig::from_json_str(&txt)?
        }
        None if cli.expanded => LayoutConfig::expanded(),
        None => LayoutConfig::compact(),
    };
    if let Some(scale) = cli.scale {
        cfg.scale = scale;
    }
    cfg.validate()?;
    Ok(cfg)
}

fn format_for(cli: &Cli) -> Result<Format> {
    if let Some(f) = cli.format {
        return Ok(f);
    }
    match cli.output.extension().and_then(|e| e.to_str()) {
        Some(e) if e.eq_ignore_ascii_case("svg") => Ok(Format::Svg),
        Some(e) if e.eq_ignore_ascii_case("png") => Ok(Format::Png),
        Some(e) if e.eq_ignore_ascii_case("json") => Ok(Format::Json),
        _ => bail!(
            "cannot infer format from {}, pass --format",
            cli.output.display()
        ),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let cli = Cli::parse();
    let format = format_for(&cli)?;
    let cfg = load_config(&cli)?;
    let txt = fs::read_to_string(&cli.input)
        .with_context(|| format!("reading {}", cli.input.display()))?;
    let feed = InspectionFeed::from_json_str(&txt)
        .with_context(|| format!("parsing {}", cli.input.display()))?;
    let layout = feed.layout(&cfg);
    if layout.is_empty() {
        warn!("{} has no top-level rooms", cli.input.display());
    }

    match format {
        Format::Json => {
            let out = serde_json::to_string_pretty(&layout)?;
            fs::write(&cli.output, out)
                .with_context(|| format!("writing {}", cli.output.display()))?;
        }
        Format::Svg | Format::Png => {
            let opts = SvgOptions {
                px_per_unit: cli.px_per_unit,
                grid: cli.grid.then_some(cfg.grid_size),
            };
            let (svg, w_px, h_px) = build_sketch_svg(&layout, &opts);
            if format == Format::Svg {
                fs::write(&cli.output, svg)
                    .with_context(|| format!("writing {}", cli.output.display()))?;
            } else {
                let pixmap = rasterize(&svg, w_px, h_px, cli.font.as_deref())?;
                let bytes = encode_rgba_to_png_bytes(pixmap.width(), pixmap.height(), pixmap.data())?;
                fs::write(&cli.output, bytes)
                    .with_context(|| format!("writing {}", cli.output.display()))?;
            }
        }
    }
    info!(
        "wrote {} ({} rooms, {} sections)",
        cli.output.display(),
        layout.rooms.len(),
        layout.sections.len()
    );
    Ok(())
}

fn rasterize(svg: &str, w_px: u32, h_px: u32, font: Option<&Path>) -> Result<tiny_skia::Pixmap> {
    let mut opt = usvg::Options::default();
    let mut fontdb = usvg::fontdb::Database::new();
    fontdb.load_system_fonts();
    if let Some(path) = font {
        fontdb
            .load_font_file(path)
            .with_context(|| format!("loading font {}", path.display()))?;
        // Map generic 'sans-serif' to the supplied font family
        let family_name = fontdb
            .faces()
            .last()
            .and_then(|face| face.families.first().map(|(n, _)| n.clone()));
        if let Some(name) = family_name {
            fontdb.set_sans_serif_family(name);
        }
    }
    if fontdb.is_empty() {
        warn!("no fonts available, PNG text will be missing");
    }
    opt.fontdb = std::sync::Arc::new(fontdb);
    let tree = usvg::Tree::from_str(svg, &opt).map_err(|e| anyhow!("SVG parse error: {e:?}"))?;
    let mut pixmap =
        tiny_skia::Pixmap::new(w_px, h_px).ok_or_else(|| anyhow!("pixmap alloc failed"))?;
    let mut pm = pixmap.as_mut();
    resvg::render(&tree, tiny_skia::Transform::identity(), &mut pm);
    Ok(pixmap)
}
