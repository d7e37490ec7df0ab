//! Tile addressing and tile-space math
//!
//! A [`Tile`] couples a `z/x/y` address with the pixel grid the tile is encoded
//! in (extent and buffer) and the base simplification tolerance. It provides
//! the affine mapping from web mercator meters to tile pixels that the
//! [`crate::cursor::TileCursor`] applies, and the zoom-scaled tolerance used by
//! the simplifier.

use std::f64::consts::PI;

use crate::extent::Extent;
use crate::webmercator::{lon_lat_to_xy, Srid, WORLD_HALF_SIZE};
use crate::{Error, Result};

/// Zoom at and above which geometry is no longer simplified.
pub const MAX_ZOOM: u8 = 20;

/// Highest zoom a tile address may carry.
pub const MAX_TILE_ZOOM: u8 = 30;

/// Side length of a tile in pixels.
pub const DEFAULT_EXTENT: f64 = 4096.0;

/// Pixels of overscan kept around the tile.
pub const DEFAULT_BUFFER: f64 = 64.0;

/// Simplification tolerance at zoom 0, in pixels.
pub const DEFAULT_TOLERANCE: f64 = 10.0;

/// Tile coordinates: x, y, and zoom level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
    pub z: u8,
}

impl TileCoord {
    /// Create a new tile coordinate
    pub fn new(x: u32, y: u32, z: u8) -> Self {
        Self { x, y, z }
    }

    /// True when the address lies inside the grid of its zoom level.
    pub fn is_valid(&self) -> bool {
        if self.z > MAX_TILE_ZOOM {
            return false;
        }
        let n = 1u64 << self.z;
        u64::from(self.x) < n && u64::from(self.y) < n
    }

    /// Bounds of the tile in web mercator meters.
    pub fn mercator_bounds(&self) -> Extent {
        let span = tile_span(self.z);
        let min_x = -WORLD_HALF_SIZE + self.x as f64 * span;
        let max_y = WORLD_HALF_SIZE - self.y as f64 * span;
        Extent::new(min_x, max_y - span, min_x + span, max_y)
    }

    /// Bounds of the tile in longitude/latitude degrees.
    pub fn lng_lat_bounds(&self) -> Extent {
        let n = 2_f64.powi(self.z as i32);
        let lng = |x: f64| x / n * 360.0 - 180.0;
        let lat = |y: f64| (PI * (1.0 - 2.0 * y / n)).sinh().atan().to_degrees();

        Extent::new(
            lng(self.x as f64),
            lat(self.y as f64 + 1.0),
            lng(self.x as f64 + 1.0),
            lat(self.y as f64),
        )
    }
}

impl std::fmt::Display for TileCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

/// Width of one tile in web mercator meters at zoom `z`.
fn tile_span(z: u8) -> f64 {
    2.0 * WORLD_HALF_SIZE / 2_f64.powi(z as i32)
}

/// A tile address together with its pixel grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tile {
    coord: TileCoord,
    extent: f64,
    buffer: f64,
    tolerance: f64,
    bounds: Extent,
}

impl Tile {
    /// Tile `z/x/y` with the default extent, buffer and tolerance.
    pub fn new(z: u8, x: u32, y: u32) -> Result<Self> {
        Self::from_coord(TileCoord::new(x, y, z))
    }

    pub fn from_coord(coord: TileCoord) -> Result<Self> {
        if !coord.is_valid() {
            return Err(Error::InvalidTile(format!(
                "{} is outside the grid of zoom {}",
                coord, coord.z
            )));
        }
        Ok(Self {
            coord,
            extent: DEFAULT_EXTENT,
            buffer: DEFAULT_BUFFER,
            tolerance: DEFAULT_TOLERANCE,
            bounds: coord.mercator_bounds(),
        })
    }

    /// Set the side length in pixels
    pub fn with_extent(mut self, extent: f64) -> Self {
        self.extent = extent;
        self
    }

    /// Set the buffer in pixels
    pub fn with_buffer(mut self, buffer: f64) -> Self {
        self.buffer = buffer;
        self
    }

    /// Set the zoom-0 simplification tolerance in pixels
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn coord(&self) -> TileCoord {
        self.coord
    }

    pub fn z(&self) -> u8 {
        self.coord.z
    }

    pub fn extent(&self) -> f64 {
        self.extent
    }

    pub fn buffer(&self) -> f64 {
        self.buffer
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Bounds of the tile in web mercator meters.
    pub fn bounds(&self) -> Extent {
        self.bounds
    }

    /// Map a coordinate in `srid` to tile pixels.
    ///
    /// The origin is the top-left corner of the tile and y grows downward.
    /// The result is not rounded.
    pub fn to_pixel(&self, srid: Srid, pt: [f64; 2]) -> Result<[f64; 2]> {
        let [mx, my] = match srid {
            Srid::WebMercator => pt,
            Srid::Wgs84 => {
                let xy = lon_lat_to_xy(&pt)?;
                [xy[0], xy[1]]
            }
            Srid::Other(code) => return Err(Error::UnsupportedSrid(code)),
        };
        let span = self.bounds.width();
        Ok([
            (mx - self.bounds.min_x) / span * self.extent,
            (self.bounds.max_y - my) / span * self.extent,
        ])
    }

    /// `[0, extent]` on both axes.
    pub fn pixel_extent(&self) -> Extent {
        Extent::new(0.0, 0.0, self.extent, self.extent)
    }

    /// The pixel extent grown by the buffer on every side.
    pub fn pixel_buffered_extent(&self) -> Extent {
        self.pixel_extent().buffered(self.buffer)
    }

    /// Simplification tolerance for this tile's zoom.
    ///
    /// Halves with every zoom level and is 0 from [`MAX_ZOOM`] on.
    pub fn z_epsilon(&self) -> f64 {
        if self.coord.z >= MAX_ZOOM {
            return 0.0;
        }
        self.tolerance / 2_f64.powi(self.coord.z as i32)
    }
}

/// Convert longitude/latitude to tile coordinates at a given zoom level
///
/// Inputs outside the web mercator square are clamped onto the edge tiles.
pub fn lng_lat_to_tile(lng: f64, lat: f64, zoom: u8) -> TileCoord {
    let n = 2_f64.powi(zoom as i32);
    let max_index = n - 1.0;

    let x = ((lng + 180.0) / 360.0 * n).floor().clamp(0.0, max_index);

    let lat_rad = lat
        .clamp(-crate::webmercator::MAX_LATITUDE, crate::webmercator::MAX_LATITUDE)
        .to_radians();
    let y = ((1.0 - lat_rad.tan().asinh() / PI) / 2.0 * n)
        .floor()
        .clamp(0.0, max_index);

    TileCoord::new(x as u32, y as u32, zoom)
}

/// Every tile at `zoom` that intersects a longitude/latitude extent,
/// row by row from the north-west corner.
pub fn tiles_for_bbox(bbox: &Extent, zoom: u8) -> impl Iterator<Item = TileCoord> {
    let north_west = lng_lat_to_tile(bbox.min_x, bbox.max_y, zoom);
    let south_east = lng_lat_to_tile(bbox.max_x, bbox.min_y, zoom);

    (north_west.y..=south_east.y).flat_map(move |y| {
        (north_west.x..=south_east.x).map(move |x| TileCoord::new(x, y, zoom))
    })
}
