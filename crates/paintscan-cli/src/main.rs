//! `paintscan` command-line tool: rectify a photo from four known corners.

use clap::{Parser, Subcommand};
use log::info;
#[cfg(not(feature = "tracing"))]
use log::LevelFilter;
use paintscan::core::{ImagePoint, Interpolation};
use paintscan::{
    annotate_corners, default_ring_radius, load_image, rectify_quad, save_image, CaptureError,
    ConfigError, OutputFormat, PersistError, ScanConfig,
};
use std::path::{Path, PathBuf};

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Persist(#[from] PersistError),
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[cfg(not(feature = "tracing"))]
    #[error(transparent)]
    Logger(#[from] log::SetLoggerError),
}

type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "paintscan")]
#[command(about = "Rectify photographed planar targets into a square image")]
#[command(version)]
struct Cli {
    /// Log debug output.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Warp the quadrilateral given by four image corners into a square.
    Rectify {
        /// Input photo.
        #[arg(long)]
        image: PathBuf,

        /// Corners in pixels, winding order TL TR BR BL: "x,y x,y x,y x,y".
        #[arg(long, value_parser = parse_corners)]
        corners: Corners,

        /// Output path; `.jpg`/`.jpeg` writes JPEG, anything else PNG.
        #[arg(long)]
        out: PathBuf,

        /// Output edge length in pixels (overrides the config).
        #[arg(long)]
        size: Option<usize>,

        /// Nearest-neighbour sampling instead of bilinear.
        #[arg(long)]
        nearest: bool,

        /// JSON config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Also write the input with the corners marked.
        #[arg(long)]
        marked: Option<PathBuf>,

        /// Write the corners and homography as JSON.
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Write a config file with every option at its default.
    InitConfig {
        #[arg(long)]
        out: PathBuf,
    },
}

#[derive(Clone, Copy, Debug)]
struct Corners([ImagePoint; 4]);

fn parse_corners(raw: &str) -> Result<Corners, String> {
    let points = raw
        .split(|c: char| c.is_whitespace() || c == ';')
        .filter(|s| !s.is_empty())
        .map(parse_point)
        .collect::<Result<Vec<_>, _>>()?;
    let points: [ImagePoint; 4] = points
        .try_into()
        .map_err(|v: Vec<ImagePoint>| format!("expected 4 corners, got {}", v.len()))?;
    Ok(Corners(points))
}

fn parse_point(raw: &str) -> Result<ImagePoint, String> {
    let (x, y) = raw
        .split_once(',')
        .ok_or_else(|| format!("corner `{raw}` is not `x,y`"))?;
    let parse = |s: &str| {
        s.trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| format!("invalid coordinate `{s}` in `{raw}`"))
    };
    Ok(ImagePoint::new(parse(x)?, parse(y)?))
}

fn format_for(path: &Path, fallback: OutputFormat) -> OutputFormat {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("jpg" | "jpeg") => OutputFormat::Jpeg,
        Some("png") => OutputFormat::Png,
        _ => fallback,
    }
}

#[cfg(not(feature = "tracing"))]
fn init_logging(verbose: bool) -> CliResult<()> {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    paintscan::core::init_with_level(level)?;
    Ok(())
}

/// `RUST_LOG` controls the filter; `--verbose` has no effect here.
#[cfg(feature = "tracing")]
fn init_logging(_verbose: bool) -> CliResult<()> {
    paintscan::core::init_tracing(false);
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    let outcome = init_logging(cli.verbose).and_then(|_| run(cli.command));
    if let Err(e) = outcome {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(command: Commands) -> CliResult<()> {
    match command {
        Commands::Rectify {
            image,
            corners,
            out,
            size,
            nearest,
            config,
            marked,
            report,
        } => {
            let mut cfg = match config {
                Some(path) => ScanConfig::load_json(path)?,
                None => ScanConfig::default(),
            };
            if let Some(size) = size {
                cfg.output_size = size;
            }
            if nearest {
                cfg.interpolation = Interpolation::Nearest;
            }
            run_rectify(
                &image,
                &corners.0,
                &out,
                &cfg,
                marked.as_deref(),
                report.as_deref(),
            )
        }
        Commands::InitConfig { out } => {
            ScanConfig::default().write_json(&out)?;
            info!("wrote {}", out.display());
            Ok(())
        }
    }
}

fn run_rectify(
    image_path: &Path,
    corners: &[ImagePoint; 4],
    out: &Path,
    cfg: &ScanConfig,
    marked: Option<&Path>,
    report: Option<&Path>,
) -> CliResult<()> {
    let photo = load_image(image_path)?;
    info!(
        "loaded {} ({}x{})",
        image_path.display(),
        photo.width,
        photo.height
    );

    let (rectified, homography) = rectify_quad(&photo, corners, &cfg.capture_params())?;
    save_image(&rectified, out, format_for(out, cfg.image_format))?;
    info!(
        "wrote {} ({}x{})",
        out.display(),
        rectified.width,
        rectified.height
    );

    if let Some(path) = marked {
        let radius = default_ring_radius(photo.width, photo.height);
        let overlay = annotate_corners(&photo, corners, radius);
        save_image(&overlay, path, format_for(path, cfg.image_format))?;
        info!("wrote {}", path.display());
    }

    if let Some(path) = report {
        let json = serde_json::json!({
            "image": image_path.to_string_lossy(),
            "corners": corners.map(|p| [p.x, p.y]),
            "output_size": cfg.output_size,
            "interpolation": cfg.interpolation,
            "homography": homography.to_array(),
        });
        std::fs::write(path, serde_json::to_string_pretty(&json)?)?;
        info!("wrote {}", path.display());
    }
    Ok(())
}
