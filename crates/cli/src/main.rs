//! Mosaic CLI - landscape class metrics and legend-colored maps

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use mosaic_colormap::{ClassColorTable, Legend, UnmappedPolicy};
use mosaic_core::io::read_class_raster;
use mosaic_core::{Neighborhood, Raster};
use mosaic_landscape::{analyze, write_class_metrics_file, ClassMetricsParams, LandscapeReport};
use mosaic_map::{class_overlay_map, MapBounds, OverlayOptions};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "mosaic")]
#[command(author, version, about = "Landscape class metrics and legend-colored maps", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a class raster
    Info {
        #[command(flatten)]
        raster: RasterArgs,
    },
    /// Compute per-class landscape metrics to a tab-separated file
    Metrics {
        #[command(flatten)]
        raster: RasterArgs,
        /// Output metrics file
        output: PathBuf,
        #[command(flatten)]
        metrics: MetricsArgs,
    },
    /// Print the class colors defined by a legend file
    Colormap {
        /// Legend file (xlsx, xls, ods, csv, tsv) with Class_ID and Color columns
        legend: PathBuf,
        /// Report which classes of this raster the legend does not cover
        #[arg(short, long)]
        raster: Option<PathBuf>,
        /// Unmapped classes: transparent, error, or a #RRGGBB[AA] color
        #[arg(short, long, default_value = "transparent")]
        unmapped: UnmappedPolicy,
    },
    /// Render a class raster as a legend-colored HTML map
    Map {
        #[command(flatten)]
        raster: RasterArgs,
        /// Output HTML file
        output: PathBuf,
        #[command(flatten)]
        map: MapArgs,
    },
    /// Compute metrics and render the map in one pass
    Run {
        #[command(flatten)]
        raster: RasterArgs,
        /// Output metrics file
        #[arg(long, default_value = "metrics_output.csv")]
        metrics_output: PathBuf,
        /// Output HTML file
        #[arg(long, default_value = "map_output.html")]
        map_output: PathBuf,
        #[command(flatten)]
        metrics: MetricsArgs,
        #[command(flatten)]
        map: MapArgs,
    },
}

#[derive(Args)]
struct RasterArgs {
    /// Input class raster (GeoTIFF)
    input: PathBuf,
    /// No-data value, e.g. 0, -9999 or nan [default: the file's GDAL_NODATA, else 0]
    #[arg(short, long, allow_negative_numbers = true)]
    nodata: Option<f64>,
}

#[derive(Args)]
struct MetricsArgs {
    /// Patch connectivity: 4 (rook) or 8 (queen)
    #[arg(short, long, default_value = "8")]
    connectivity: Neighborhood,
    /// Count raster border and no-data boundaries as edge
    #[arg(long)]
    count_boundary: bool,
}

#[derive(Args)]
struct MapArgs {
    /// Legend file (xlsx, xls, ods, csv, tsv) with Class_ID and Color columns
    #[arg(short, long)]
    legend: PathBuf,
    /// Unmapped classes: transparent, error, or a #RRGGBB[AA] color
    #[arg(short, long, default_value = "transparent")]
    unmapped: UnmappedPolicy,
    /// Overlay opacity (0-1)
    #[arg(long, default_value = "0.6")]
    opacity: f64,
    /// Initial zoom level
    #[arg(short, long, default_value = "10")]
    zoom: u8,
    /// Omit the class legend control
    #[arg(long)]
    no_legend: bool,
}

impl MetricsArgs {
    fn params(&self) -> ClassMetricsParams {
        ClassMetricsParams {
            nodata: None,
            neighborhood: self.connectivity,
            count_boundary: self.count_boundary,
        }
    }
}

impl MapArgs {
    fn options(&self, input: &Path) -> OverlayOptions {
        let name = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Classes".to_string());
        OverlayOptions {
            opacity: self.opacity,
            zoom: self.zoom,
            name,
            show_legend: !self.no_legend,
            ..Default::default()
        }
    }
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to install logger")?;
    Ok(())
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Read a class raster and settle its no-data value.
fn read_classes(args: &RasterArgs) -> Result<Raster<f64>> {
    let pb = spinner("Reading raster...");
    let raster = read_class_raster(&args.input, args.nodata)
        .with_context(|| format!("Failed to read raster {}", args.input.display()))?;
    pb.finish_and_clear();

    debug!("No-data: {:?} (flag: {:?})", raster.nodata(), args.nodata);

    info!("Input: {} x {}", raster.cols(), raster.rows());
    Ok(raster)
}

fn read_legend(path: &Path, policy: UnmappedPolicy) -> Result<ClassColorTable> {
    let legend = Legend::from_path(path)
        .with_context(|| format!("Failed to read legend {}", path.display()))?;
    if !legend.duplicates().is_empty() {
        warn!(
            "Legend repeats class IDs {:?}; the last row of each wins",
            legend.duplicates()
        );
    }
    info!("Legend: {} classes", legend.len());
    Ok(ClassColorTable::from_legend(&legend, policy))
}

fn report_coverage(table: &ClassColorTable, raster: &Raster<f64>) -> Vec<i32> {
    let missing = table.check_coverage(raster.class_counts().into_keys());
    if !missing.is_empty() {
        warn!(
            "Classes {:?} are not in the legend (unmapped: {})",
            missing,
            table.policy()
        );
    }
    missing
}

fn compute_metrics(raster: &Raster<f64>, args: &MetricsArgs, output: &Path) -> Result<LandscapeReport> {
    let pb = spinner("Computing class metrics...");
    let start = Instant::now();
    let report = analyze(raster, &args.params()).context("Failed to compute class metrics")?;
    let elapsed = start.elapsed();
    pb.finish_and_clear();

    let landscape = &report.landscape;
    info!(
        "{} classes, {} patches, {:.4} ha",
        landscape.number_of_classes, landscape.number_of_patches, landscape.total_area
    );
    info!(
        "Shannon {:.4}, Simpson {:.4}, evenness {:.4}",
        landscape.shannon_diversity_index,
        landscape.simpson_diversity_index,
        landscape.shannon_evenness_index
    );

    write_class_metrics_file(&report.classes, output)
        .with_context(|| format!("Failed to write metrics {}", output.display()))?;
    done("Metrics", output, elapsed);
    Ok(report)
}

fn render_map(raster: &Raster<f64>, args: &RasterArgs, map: &MapArgs, output: &Path) -> Result<()> {
    let table = read_legend(&map.legend, map.unmapped)?;
    report_coverage(&table, raster);

    if let Some(crs) = raster.crs() {
        if !crs.is_wgs84() && !crs.is_web_mercator() {
            warn!(
                "CRS {} is not EPSG:4326 or EPSG:3857; bounds are used as latitude/longitude",
                crs
            );
        }
    }

    let pb = spinner("Rendering map...");
    let start = Instant::now();
    let overlay = class_overlay_map(raster, &table, &map.options(&args.input))
        .context("Failed to render map")?;
    overlay
        .save(output)
        .with_context(|| format!("Failed to write map {}", output.display()))?;
    let elapsed = start.elapsed();
    pb.finish_and_clear();

    let bounds = MapBounds::from_raster(raster)?;
    debug!(
        "Bounds: S {:.6} W {:.6} N {:.6} E {:.6}",
        bounds.south, bounds.west, bounds.north, bounds.east
    );
    done("Map", output, elapsed);
    Ok(())
}

fn done(name: &str, path: &Path, elapsed: std::time::Duration) {
    println!("{} saved to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    match cli.command {
        Commands::Info { raster: args } => {
            let raster = read_classes(&args)?;
            let (rows, cols) = raster.shape();
            let bounds = raster.bounds();
            let summary = raster.class_summary();

            println!("File: {}", args.input.display());
            println!("Dimensions: {} x {} ({} cells)", cols, rows, raster.len());
            println!("Cell size: {}", raster.cell_size());
            println!(
                "Bounds: ({:.6}, {:.6}) - ({:.6}, {:.6})",
                bounds.0, bounds.1, bounds.2, bounds.3
            );
            if let Some(crs) = raster.crs() {
                println!("CRS: {}", crs);
            }
            if let Some(nodata) = raster.nodata() {
                println!("NoData: {}", nodata);
            }
            println!(
                "Valid cells: {} ({:.1}%)",
                summary.valid_count,
                100.0 * summary.valid_count as f64 / raster.len().max(1) as f64
            );
            if let (Some(min), Some(max)) = (summary.min_class, summary.max_class) {
                println!("Class range: {} - {}", min, max);
            }
            println!("\nClasses ({}):", summary.class_count);
            for (class, count) in raster.class_counts() {
                println!("  {:>6}: {} cells", class, count);
            }
        }

        Commands::Metrics {
            raster: args,
            output,
            metrics,
        } => {
            let raster = read_classes(&args)?;
            compute_metrics(&raster, &metrics, &output)?;
        }

        Commands::Colormap {
            legend,
            raster,
            unmapped,
        } => {
            let table = read_legend(&legend, unmapped)?;
            println!("class\thex\trgba\tnormalized");
            for (id, color) in table.iter() {
                let [r, g, b, a] = color.to_unit();
                println!(
                    "{}\t{}\t({}, {}, {}, {})\t({:.4}, {:.4}, {:.4}, {:.4})",
                    id,
                    color.rgb(),
                    color.r,
                    color.g,
                    color.b,
                    color.a,
                    r,
                    g,
                    b,
                    a
                );
            }
            println!("unmapped\t{}", table.policy());

            if let Some(path) = raster {
                let raster = read_classes(&RasterArgs {
                    input: path,
                    nodata: None,
                })?;
                let missing = report_coverage(&table, &raster);
                if missing.is_empty() {
                    println!("All raster classes are covered by the legend.");
                }
            }
        }

        Commands::Map {
            raster: args,
            output,
            map,
        } => {
            let raster = read_classes(&args)?;
            render_map(&raster, &args, &map, &output)?;
        }

        Commands::Run {
            raster: args,
            metrics_output,
            map_output,
            metrics,
            map,
        } => {
            let raster = read_classes(&args)?;
            compute_metrics(&raster, &metrics, &metrics_output)?;
            render_map(&raster, &args, &map, &map_output)?;
            println!("Process completed successfully.");
        }
    }

    Ok(())
}
