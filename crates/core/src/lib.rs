//! Core geometry pipeline for building vector tiles.
//!
//! This library turns source geometry (points, lines, polygons and their
//! multi-variants, possibly topologically invalid) into the geometry a single
//! tile needs: projected into tile-pixel space, simplified for the zoom level
//! and repaired so that every polygon is simple and correctly wound.
//!
//! # Stages
//!
//! ```text
//! source SRID ──► web mercator ──► tile pixels ──► simplify ──► make valid
//!   (webmercator)                    (cursor)     (simplify)   (makevalid)
//! ```
//!
//! # Examples
//!
//! ```
//! use tilegeom_core::config::PipelineConfig;
//! use tilegeom_core::geometry::{Geometry, LineString, Point, Polygon};
//! use tilegeom_core::pipeline::TileProcessor;
//! use tilegeom_core::tile::Tile;
//! use tilegeom_core::webmercator::Srid;
//!
//! let square = Geometry::Polygon(Polygon::new(vec![LineString::new(vec![
//!     Point::new(-10.0, -10.0),
//!     Point::new(10.0, -10.0),
//!     Point::new(10.0, 10.0),
//!     Point::new(-10.0, 10.0),
//! ])]));
//!
//! let tile = Tile::new(0, 0, 0).unwrap();
//! let processor = TileProcessor::new(tile, &PipelineConfig::default());
//! let processed = processor.process(&square, Srid::Wgs84).unwrap();
//! assert!(processed.is_some());
//! ```

use thiserror::Error;

pub mod clip;
pub mod config;
pub mod cursor;
pub mod extent;
pub mod geometry;
pub mod makevalid;
pub mod pipeline;
pub mod simplify;
pub mod tile;
pub mod transform;
pub mod validate;
pub mod webmercator;

pub use config::{PipelineConfig, SimplifyConfig};
pub use extent::Extent;
pub use geometry::{Geometry, G};
pub use pipeline::{process_feature, TileProcessor};
pub use tile::{Tile, TileCoord};
pub use webmercator::Srid;

/// Errors that can occur while processing a feature's geometry.
///
/// Every variant is scoped to the feature being processed: callers log the
/// error and carry on with the remaining features of the tile.
#[derive(Error, Debug)]
pub enum Error {
    #[error("unknown geometry: {0}")]
    UnknownGeometry(String),

    #[error("unknown geometry type: {0}")]
    UnknownGeometryType(String),

    #[error("function did not return minimum number of coordinates: got {got}, expected {expected}")]
    InsufficientCoordinates { expected: usize, got: usize },

    #[error("unsupported SRID {0}: only 4326 and 3857 are known")]
    UnsupportedSrid(u32),

    #[error("unsupported geometry type for repair: {0}")]
    UnsupportedGeometryType(String),

    #[error("error converting {kind}({index}) of {parent}: {source}")]
    Child {
        kind: &'static str,
        parent: &'static str,
        index: usize,
        source: Box<Error>,
    },

    #[error("internal invariant violated: {0}")]
    InvariantViolation(String),

    #[error("triangulation failed: {0}")]
    Triangulation(String),

    #[error("invalid extent: {0}")]
    InvalidExtent(String),

    #[error("invalid tile: {0}")]
    InvalidTile(String),
}

impl Error {
    /// Wrap a child failure with its position inside the parent geometry.
    pub(crate) fn child(kind: &'static str, parent: &'static str, index: usize, err: Error) -> Self {
        Error::Child {
            kind,
            parent,
            index,
            source: Box::new(err),
        }
    }

    /// Report a defect in the recursive dispatch.
    ///
    /// Logged at error level when raised; the error only fails the current
    /// feature.
    pub(crate) fn invariant(message: impl Into<String>) -> Self {
        let message = message.into();
        log::error!("geometry engine invariant violated: {}", message);
        Error::InvariantViolation(message)
    }

    /// The innermost error, following positional wrappers.
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::Child { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
