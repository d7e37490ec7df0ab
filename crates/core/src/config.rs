//! Pipeline configuration.
//!
//! Configuration is built once, before any tile is processed, and passed by
//! reference into every [`crate::pipeline::TileProcessor`]. Nothing in the
//! library reads the environment on its own.
//!
//! The simplification switches can be given as an option string, the same
//! grammar the tile server accepts in its environment:
//!
//! ```text
//! TILEGEOM_OPTIONS="dontsimplifygeo"          # never simplify
//! TILEGEOM_OPTIONS="simplifymaxzoom=14"       # simplify up to and including z14
//! ```

use serde::{Deserialize, Serialize};

use crate::tile::{DEFAULT_BUFFER, DEFAULT_EXTENT, DEFAULT_TOLERANCE};

/// Environment variable read by [`SimplifyConfig::from_env`].
pub const OPTIONS_ENV: &str = "TILEGEOM_OPTIONS";

/// Default highest zoom that is still simplified. Tiles from z10 on keep
/// their full detail.
pub const DEFAULT_SIMPLIFY_MAX_ZOOM: u8 = 9;

const DISABLE_TOKEN: &str = "dontsimplifygeo";
const MAX_ZOOM_KEY: &str = "simplifymaxzoom=";
const VALUE_TERMINATORS: &[char] = &[',', '.', '\t', ' ', '\n'];

/// Whether, and up to which zoom, geometry is simplified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimplifyConfig {
    pub enabled: bool,
    /// Highest zoom (inclusive) at which simplification runs.
    pub max_zoom: u8,
}

impl Default for SimplifyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_zoom: DEFAULT_SIMPLIFY_MAX_ZOOM,
        }
    }
}

impl SimplifyConfig {
    /// Parse an option string. Matching is case-insensitive; unknown tokens
    /// are ignored and a malformed max zoom keeps the default.
    pub fn from_options(options: &str) -> Self {
        let options = options.to_lowercase();
        let mut config = Self::default();

        if options.contains(DISABLE_TOKEN) {
            config.enabled = false;
            log::info!("simplification of geometries is off");
        }

        if let Some(idx) = options.find(MAX_ZOOM_KEY) {
            let rest = &options[idx + MAX_ZOOM_KEY.len()..];
            let value = rest
                .find(VALUE_TERMINATORS)
                .map_or(rest, |end| &rest[..end]);

            match value.parse::<u8>() {
                Ok(zoom) => {
                    config.max_zoom = zoom;
                    log::info!("setting simplify max zoom to {}", zoom);
                }
                Err(_) => log::warn!(
                    "did not understand the value ({:?}) for simplifymaxzoom, using default ({})",
                    value,
                    config.max_zoom
                ),
            }
        }

        config
    }

    /// Read [`OPTIONS_ENV`]. An unset variable yields the defaults.
    pub fn from_env() -> Self {
        std::env::var(OPTIONS_ENV)
            .map(|options| Self::from_options(&options))
            .unwrap_or_default()
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_max_zoom(mut self, max_zoom: u8) -> Self {
        self.max_zoom = max_zoom;
        self
    }

    /// True when geometry at `zoom` should be simplified.
    pub fn applies_to(&self, zoom: u8) -> bool {
        self.enabled && zoom <= self.max_zoom
    }
}

/// Everything a [`crate::pipeline::TileProcessor`] needs besides the tile
/// address.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub simplify: SimplifyConfig,
    /// Tile side length in pixels (default: 4096)
    pub extent: f64,
    /// Overscan around the tile in pixels (default: 64)
    pub buffer: f64,
    /// Simplification tolerance at zoom 0 in pixels (default: 10)
    pub tolerance: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            simplify: SimplifyConfig::default(),
            extent: DEFAULT_EXTENT,
            buffer: DEFAULT_BUFFER,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

impl PipelineConfig {
    /// Set the tile extent.
    pub fn with_extent(mut self, extent: f64) -> Self {
        self.extent = extent;
        self
    }

    /// Set the buffer in pixels.
    pub fn with_buffer(mut self, buffer: f64) -> Self {
        self.buffer = buffer;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_simplify(mut self, simplify: SimplifyConfig) -> Self {
        self.simplify = simplify;
        self
    }
}
