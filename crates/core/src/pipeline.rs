//! Per-feature orchestration of the geometry stages.
//!
//! [`process_feature`] is the polygon path: simplify, then repair against the
//! clip extent. [`TileProcessor`] wraps the full journey of a source feature
//! into one tile: reprojection, tile-pixel projection, simplification,
//! repair or clipping, and a final degenerate filter.
//!
//! Nothing here holds state across features. A `TileProcessor` is `Send +
//! Sync` and can be shared by reference between worker threads.

use rayon::prelude::*;

use crate::clip::clip_geometry;
use crate::config::PipelineConfig;
use crate::cursor::TileCursor;
use crate::extent::Extent;
use crate::geometry::{Geometry, G};
use crate::makevalid;
use crate::simplify::{simplify, simplify_for_tile};
use crate::tile::Tile;
use crate::validate::filter_valid_geometry;
use crate::webmercator::{to_web_mercator, Srid};
use crate::Result;

/// Simplify (when enabled) and then repair a polygonal geometry.
///
/// - `None` in gives `Ok(None)` out.
/// - A geometry that simplifies away entirely gives `Ok(None)`.
/// - Otherwise the repaired geometry is returned, which may itself be an
///   empty multipolygon when nothing lies inside `extent`.
///
/// Simplification always runs before repair so the triangulation only sees
/// the reduced vertex count.
///
/// # Example
///
/// ```
/// use tilegeom_core::extent::Extent;
/// use tilegeom_core::pipeline::process_feature;
///
/// let out = process_feature(None, &Extent::new(0.0, 0.0, 1.0, 1.0), 1.0, true).unwrap();
/// assert!(out.is_none());
/// ```
pub fn process_feature(
    geometry: Option<&Geometry>,
    extent: &Extent,
    tolerance: f64,
    simplify_enabled: bool,
) -> Result<Option<G>> {
    let Some(geometry) = geometry else {
        return Ok(None);
    };

    let simplified;
    let geometry = if simplify_enabled {
        simplified = simplify(geometry, tolerance)?;
        if simplified.is_empty() {
            log::trace!("{} simplified away", geometry.type_name());
            return Ok(None);
        }
        simplified.geometry()
    } else {
        geometry
    };

    makevalid::clean(geometry, extent).map(Some)
}

/// A source feature: geometry plus the SRID it is expressed in.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub id: Option<u64>,
    pub geometry: Geometry,
    pub srid: Srid,
}

impl Feature {
    pub fn new(geometry: Geometry, srid: Srid) -> Self {
        Self {
            id: None,
            geometry,
            srid,
        }
    }

    pub fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }
}

/// A feature ready to encode: tile-pixel geometry, simple and non-degenerate.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedFeature {
    pub id: Option<u64>,
    pub geometry: G,
}

/// Runs features through every stage for one tile.
#[derive(Debug, Clone)]
pub struct TileProcessor {
    cursor: TileCursor,
    clip_extent: Extent,
    config: PipelineConfig,
}

impl TileProcessor {
    /// Bind `tile` to `config`. The config's extent, buffer and tolerance
    /// replace the tile's own.
    pub fn new(tile: Tile, config: &PipelineConfig) -> Self {
        let tile = tile
            .with_extent(config.extent)
            .with_buffer(config.buffer)
            .with_tolerance(config.tolerance);
        Self {
            cursor: TileCursor::new(tile),
            clip_extent: tile.pixel_buffered_extent(),
            config: *config,
        }
    }

    pub fn tile(&self) -> &Tile {
        self.cursor.tile()
    }

    /// The buffered pixel extent everything is clipped to.
    pub fn clip_extent(&self) -> &Extent {
        &self.clip_extent
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Process one geometry given in `srid`.
    ///
    /// `Ok(None)` means the feature has no part in this tile.
    pub fn process(&self, geometry: &Geometry, srid: Srid) -> Result<Option<G>> {
        let mercator = to_web_mercator(srid, geometry)?;
        let pixels = self.cursor.project_geometry(mercator.geometry())?;
        let tile = self.cursor.tile();

        let processed = if pixels.geometry().is_polygonal() {
            process_feature(
                Some(pixels.geometry()),
                &self.clip_extent,
                tile.z_epsilon(),
                self.config.simplify.applies_to(tile.z()),
            )?
        } else {
            let simplified = simplify_for_tile(pixels.geometry(), tile, &self.config.simplify)?;
            clip_geometry(simplified.geometry(), &self.clip_extent)?
        };

        Ok(processed
            .and_then(|g| filter_valid_geometry(g.geometry()))
            .map(G::from))
    }

    /// Process a feature, carrying its id along.
    pub fn process_one(&self, feature: &Feature) -> Result<Option<ProcessedFeature>> {
        Ok(self
            .process(&feature.geometry, feature.srid)?
            .map(|geometry| ProcessedFeature {
                id: feature.id,
                geometry,
            }))
    }

    /// Process features in order. Failing features are logged and skipped.
    pub fn process_all(&self, features: &[Feature]) -> Vec<ProcessedFeature> {
        features
            .iter()
            .enumerate()
            .filter_map(|(index, feature)| self.process_logged(index, feature))
            .collect()
    }

    /// Like [`TileProcessor::process_all`], fanned out over the rayon pool.
    /// Output order follows input order.
    pub fn process_all_parallel(&self, features: &[Feature]) -> Vec<ProcessedFeature> {
        features
            .par_iter()
            .enumerate()
            .filter_map(|(index, feature)| self.process_logged(index, feature))
            .collect()
    }

    fn process_logged(&self, index: usize, feature: &Feature) -> Option<ProcessedFeature> {
        match self.process_one(feature) {
            Ok(processed) => processed,
            Err(e) => {
                log::warn!(
                    "tile {}: skipping feature {} ({}): {}",
                    self.tile().coord(),
                    index,
                    feature.geometry.type_name(),
                    e
                );
                None
            }
        }
    }
}
