//! CLI for tilegeom - run GeoJSON features through the tile geometry pipeline
//!
//! This is a thin wrapper around the tilegeom-core library, meant for
//! inspecting what a feature looks like once it is ready to encode into a
//! particular tile.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use geojson::{FeatureCollection, GeoJson, JsonObject};
use serde_json::{Map, Value};
use tilegeom_core::config::{PipelineConfig, SimplifyConfig};
use tilegeom_core::extent::Extent;
use tilegeom_core::geometry::Geometry;
use tilegeom_core::pipeline::{Feature, ProcessedFeature, TileProcessor};
use tilegeom_core::tile::{tiles_for_bbox, Tile, TileCoord};
use tilegeom_core::webmercator::{xy_to_lon_lat, Srid};

#[derive(Parser, Debug)]
#[command(
    name = "tilegeom",
    about = "Project, simplify and repair GeoJSON geometry for a vector tile",
    version
)]
struct Args {
    /// Input GeoJSON file (geometry, feature or feature collection)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Tile to process, as z/x/y
    #[arg(long, conflicts_with = "zoom")]
    tile: Option<String>,

    /// Process every tile at this zoom that the input touches
    #[arg(long)]
    zoom: Option<u8>,

    /// SRID of the input coordinates (4326 or 3857)
    #[arg(long, default_value = "4326")]
    srid: u32,

    /// Tile side length in pixels
    #[arg(long)]
    extent: Option<f64>,

    /// Buffer around the tile in pixels
    #[arg(long)]
    buffer: Option<f64>,

    /// Skip simplification
    #[arg(long)]
    no_simplify: bool,

    /// Highest zoom at which geometry is simplified
    #[arg(long)]
    simplify_max_zoom: Option<u8>,

    /// JSON file with pipeline settings; command line flags win
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Process features on all cores
    #[arg(long)]
    parallel: bool,

    /// Output GeoJSON file (stdout when omitted)
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    /// Defaults, then the options environment variable, then the config
    /// file, then flags.
    fn pipeline_config(&self) -> Result<PipelineConfig> {
        let base = PipelineConfig::default().with_simplify(SimplifyConfig::from_env());
        let mut config = match &self.config {
            Some(path) => apply_config_file(base, path)?,
            None => base,
        };

        if let Some(extent) = self.extent {
            config = config.with_extent(extent);
        }
        if let Some(buffer) = self.buffer {
            config = config.with_buffer(buffer);
        }
        if self.no_simplify {
            config.simplify = config.simplify.with_enabled(false);
        }
        if let Some(max_zoom) = self.simplify_max_zoom {
            config.simplify = config.simplify.with_max_zoom(max_zoom);
        }
        Ok(config)
    }
}

/// Overlay the keys present in a JSON config file on `base`. Keys the file
/// leaves out keep their value from `base`.
fn apply_config_file(base: PipelineConfig, path: &Path) -> Result<PipelineConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let overlay: Value = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse config {}", path.display()))?;

    let mut merged = serde_json::to_value(base).context("Failed to serialize base config")?;
    merge_json(&mut merged, overlay);
    serde_json::from_value(merged)
        .with_context(|| format!("Invalid settings in config {}", path.display()))
}

fn merge_json(base: &mut Value, overlay: Value) {
    match overlay {
        Value::Object(overlay) => {
            if !base.is_object() {
                *base = Value::Object(Map::new());
            }
            if let Value::Object(base) = base {
                for (key, value) in overlay {
                    merge_json(base.entry(key).or_insert(Value::Null), value);
                }
            }
        }
        overlay => *base = overlay,
    }
}

fn parse_tile(s: &str) -> Result<TileCoord> {
    let parts: Vec<&str> = s.split('/').collect();
    let [z, x, y] = parts.as_slice() else {
        bail!("Tile must be z/x/y, got {:?}", s);
    };
    Ok(TileCoord::new(
        x.parse().with_context(|| format!("Bad tile column {:?}", x))?,
        y.parse().with_context(|| format!("Bad tile row {:?}", y))?,
        z.parse().with_context(|| format!("Bad zoom {:?}", z))?,
    ))
}

fn read_features(path: &Path, srid: Srid) -> Result<Vec<Feature>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let geojson: GeoJson = text
        .parse()
        .with_context(|| format!("Failed to parse GeoJSON in {}", path.display()))?;

    let raw: Vec<(Option<u64>, geojson::Geometry)> = match geojson {
        GeoJson::Geometry(g) => vec![(None, g)],
        GeoJson::Feature(f) => f.geometry.map(|g| (feature_id(&f.id), g)).into_iter().collect(),
        GeoJson::FeatureCollection(fc) => fc
            .features
            .into_iter()
            .filter_map(|f| {
                let id = feature_id(&f.id);
                f.geometry.map(|g| (id, g))
            })
            .collect(),
    };

    raw.into_iter()
        .enumerate()
        .map(|(index, (id, g))| {
            let geo = geo::Geometry::<f64>::try_from(g)
                .with_context(|| format!("Unsupported geometry in feature {}", index))?;
            Ok(Feature::new(Geometry::from(geo), srid).with_id(id.unwrap_or(index as u64)))
        })
        .collect()
}

fn feature_id(id: &Option<geojson::feature::Id>) -> Option<u64> {
    match id {
        Some(geojson::feature::Id::Number(n)) => n.as_u64(),
        Some(geojson::feature::Id::String(s)) => s.parse().ok(),
        None => None,
    }
}

/// Tiles at `zoom` touched by the features' combined bounds.
fn covering_tiles(features: &[Feature], srid: Srid, zoom: u8) -> Result<Vec<TileCoord>> {
    let mut bbox = Extent::empty();
    for feature in features {
        if let Some(e) = Extent::from_geometry(&feature.geometry) {
            bbox.expand(&e);
        }
    }
    if !bbox.is_valid() {
        return Ok(Vec::new());
    }

    let bbox = match srid {
        Srid::Wgs84 => bbox,
        Srid::WebMercator => {
            let min = xy_to_lon_lat(&[bbox.min_x, bbox.min_y])?;
            let max = xy_to_lon_lat(&[bbox.max_x, bbox.max_y])?;
            Extent::new(min[0], min[1], max[0], max[1])
        }
        Srid::Other(code) => bail!("Unsupported SRID {}", code),
    };
    Ok(tiles_for_bbox(&bbox, zoom).collect())
}

fn to_geojson(coord: TileCoord, processed: &ProcessedFeature) -> geojson::Feature {
    let geometry = processed.geometry.geometry().to_geo();
    let mut properties = JsonObject::new();
    properties.insert("tile".to_string(), coord.to_string().into());
    properties.insert(
        "type".to_string(),
        processed.geometry.geometry().type_name().into(),
    );

    geojson::Feature {
        bbox: None,
        geometry: Some(geojson::Geometry::new(geojson::Value::from(&geometry))),
        id: processed
            .id
            .map(|id| geojson::feature::Id::Number(serde_json::Number::from(id))),
        properties: Some(properties),
        foreign_members: None,
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config = args
        .pipeline_config()
        .context("Failed to build pipeline configuration")?;
    let srid = Srid::from(args.srid);
    let features = read_features(&args.input, srid)?;
    log::info!("Read {} features from {}", features.len(), args.input.display());

    let coords = match (&args.tile, args.zoom) {
        (Some(tile), _) => vec![parse_tile(tile)?],
        (None, Some(zoom)) => covering_tiles(&features, srid, zoom)?,
        (None, None) => bail!("One of --tile or --zoom is required"),
    };

    let mut output = Vec::new();
    for coord in coords {
        let tile = Tile::from_coord(coord).with_context(|| format!("Invalid tile {}", coord))?;
        let processor = TileProcessor::new(tile, &config);
        let processed = if args.parallel {
            processor.process_all_parallel(&features)
        } else {
            processor.process_all(&features)
        };
        log::debug!("Tile {}: {} of {} features kept", coord, processed.len(), features.len());
        output.extend(processed.iter().map(|p| to_geojson(coord, p)));
    }

    log::info!("Writing {} processed features", output.len());
    let collection = FeatureCollection {
        bbox: None,
        features: output,
        foreign_members: None,
    };
    let json = serde_json::to_string_pretty(&collection).context("Failed to serialize output")?;

    match &args.output {
        Some(path) => fs::write(path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", json).context("Failed to write to stdout")?;
        }
    }

    Ok(())
}
