use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use geojson::GeoJson;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use icelane_lib::{
    export_route, plan_route, Classifier, CorridorConfig, CorridorModel, Crs, Geocoder,
    RouteRequest,
};

mod raster_io;

#[derive(Parser, Debug)]
#[command(author, version, about = "Sea-ice navigability and route planning utilities")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify a raster and report traversable/blocked cell counts.
    Classify {
        /// Georeferenced ice raster (PNG or TIFF with a world-file sidecar).
        #[arg(long)]
        raster: PathBuf,
        /// EPSG code of the raster projection.
        #[arg(long, default_value_t = 4326)]
        epsg: u32,
        /// Write the binary navigability map to this PNG path.
        #[arg(long)]
        navmap: Option<PathBuf>,
    },
    /// Compute a route between two WGS84 points over a classified raster.
    Route {
        /// Georeferenced ice raster (PNG or TIFF with a world-file sidecar).
        #[arg(long)]
        raster: PathBuf,
        /// EPSG code of the raster projection.
        #[arg(long, default_value_t = 4326)]
        epsg: u32,
        /// Start longitude in decimal degrees.
        #[arg(long, allow_negative_numbers = true)]
        from_lon: f64,
        /// Start latitude in decimal degrees.
        #[arg(long, allow_negative_numbers = true)]
        from_lat: f64,
        /// Goal longitude in decimal degrees.
        #[arg(long, allow_negative_numbers = true)]
        to_lon: f64,
        /// Goal latitude in decimal degrees.
        #[arg(long, allow_negative_numbers = true)]
        to_lat: f64,
        /// Optional GeoJSON file of preferred shipping lanes.
        #[arg(long)]
        corridors: Option<PathBuf>,
        /// Corridor buffer distance in meters.
        #[arg(long, default_value_t = 5000.0)]
        corridor_buffer: f64,
        /// Cost multiplier applied inside the corridor buffer.
        #[arg(long, default_value_t = 0.5)]
        corridor_bonus: f64,
        /// Snap radius in pixels for endpoints on blocked cells.
        #[arg(long, default_value_t = 10)]
        snap_radius: usize,
        /// Abort the search after this many node expansions.
        #[arg(long)]
        max_expansions: Option<usize>,
        /// Output GeoJSON path for the computed route.
        #[arg(long, default_value = "route_wgs84.geojson")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Classify {
            raster,
            epsg,
            navmap,
        } => handle_classify(&raster, epsg, navmap.as_deref()),
        Command::Route {
            raster,
            epsg,
            from_lon,
            from_lat,
            to_lon,
            to_lat,
            corridors,
            corridor_buffer,
            corridor_bonus,
            snap_radius,
            max_expansions,
            output,
        } => handle_route(RouteArgs {
            raster,
            epsg,
            from_lon,
            from_lat,
            to_lon,
            to_lat,
            corridors,
            corridor_buffer,
            corridor_bonus,
            snap_radius,
            max_expansions,
            output,
        }),
    }
}

fn handle_classify(raster: &Path, epsg: u32, navmap: Option<&Path>) -> Result<()> {
    let raster = raster_io::load_raster(raster, epsg)?;
    let classifier = Classifier::for_raster(&raster)?;
    let grid = classifier.classify(&raster)?;

    let summary = grid.summary();
    println!(
        "Classified {}x{} raster ({}): {} traversable, {} blocked",
        grid.width(),
        grid.height(),
        raster.crs(),
        summary.traversable,
        summary.blocked
    );

    if let Some(path) = navmap {
        raster_io::write_navmap(&grid, path)?;
        println!("Navigability map written to {}", path.display());
    }

    Ok(())
}

struct RouteArgs {
    raster: PathBuf,
    epsg: u32,
    from_lon: f64,
    from_lat: f64,
    to_lon: f64,
    to_lat: f64,
    corridors: Option<PathBuf>,
    corridor_buffer: f64,
    corridor_bonus: f64,
    snap_radius: usize,
    max_expansions: Option<usize>,
    output: PathBuf,
}

fn handle_route(args: RouteArgs) -> Result<()> {
    let raster = raster_io::load_raster(&args.raster, args.epsg)?;
    let classifier = Classifier::for_raster(&raster)?;
    let grid = classifier.classify(&raster)?;
    let geocoder = Geocoder::for_raster(&raster);

    let corridor = args
        .corridors
        .as_deref()
        .map(|path| -> Result<CorridorModel> {
            let lanes = raster_io::load_corridors(path)?;
            let crs = corridor_crs(raster.crs());
            let model = CorridorModel::from_wgs84_lanes(
                &lanes,
                crs,
                CorridorConfig {
                    buffer_m: args.corridor_buffer,
                    max_bonus: args.corridor_bonus,
                },
            )?;
            Ok(model)
        })
        .transpose()?;

    let mut request =
        RouteRequest::new(args.from_lon, args.from_lat, args.to_lon, args.to_lat)
            .with_snap_radius(args.snap_radius);
    if let Some(max_expansions) = args.max_expansions {
        request = request.with_max_expansions(max_expansions);
    }

    let plan = plan_route(&grid, &geocoder, corridor.as_ref(), &request)
        .context("route planning failed")?;

    for warning in &plan.warnings {
        eprintln!("warning: {warning:?}");
    }
    if plan.is_empty() {
        bail!(
            "no open-water route between ({}, {}) and ({}, {})",
            args.from_lon,
            args.from_lat,
            args.to_lon,
            args.to_lat
        );
    }

    println!(
        "Route: {} cells, cost {:.1}, {} nodes expanded",
        plan.cell_count(),
        plan.total_cost,
        plan.expanded
    );

    let (route, metadata) = export_route(&plan, &geocoder, raster.source())?;
    let collection = route.to_feature_collection(&metadata);
    fs::write(&args.output, GeoJson::from(collection).to_string())
        .with_context(|| format!("failed to write route to {}", args.output.display()))?;
    println!(
        "Route GeoJSON written to {} ({} segment(s))",
        args.output.display(),
        route.segment_count()
    );

    Ok(())
}

/// Planar reference used for corridor distances: the raster's own projection
/// when it is planar, otherwise the north polar stereographic default.
fn corridor_crs(raster_crs: Crs) -> Crs {
    if raster_crs.is_planar() {
        raster_crs
    } else {
        Crs::PolarStereoNorth
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
