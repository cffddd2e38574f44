// Data-driven navigation configuration.
//
// Tunables live in `NavConfig`, loaded from JSON at startup, so the engine
// has no magic numbers of its own: the default traversal mask, the path
// length cap, the optional expansion budget, the collision tolerance, and the
// area cost table. Every field has a default, so a config file only needs
// to name what it overrides.
//
// See also: `pathfinding.rs` for `SearchRequest`, which `NavConfig::request`
// builds from these defaults, `collision.rs` for the overlap threshold.

use crate::area::AreaCostTable;
use crate::error::NavError;
use crate::pathfinding::SearchRequest;
use crate::types::{GridPoint, NodeFlags};
use serde::{Deserialize, Serialize};

/// Path length cap used when a request does not set its own.
pub const DEFAULT_MAX_PATH_LENGTH: u32 = 1024;

/// Minimum sphere penetration, in world units, that counts as an overlap.
pub const DEFAULT_COLLISION_THRESHOLD: f32 = 0.1;

/// All tunable navigation parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    /// Traversal mask for requests built with `request()`.
    pub default_allowed_flags: NodeFlags,

    /// Maximum number of retraced nodes (the start node is added on top).
    pub default_max_path_length: u32,

    /// Maximum number of voxels a search may close before giving up with the
    /// best partial path. `None` means unbounded.
    pub default_max_expansions: Option<u32>,

    /// See `DEFAULT_COLLISION_THRESHOLD`.
    pub collision_threshold: f32,

    /// Area cost modifiers shared by every search.
    pub areas: AreaCostTable,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            default_allowed_flags: NodeFlags::ALL,
            default_max_path_length: DEFAULT_MAX_PATH_LENGTH,
            default_max_expansions: None,
            collision_threshold: DEFAULT_COLLISION_THRESHOLD,
            areas: AreaCostTable::new(),
        }
    }
}

impl NavConfig {
    /// Parse a config from a JSON string. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, NavError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, NavError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// A search request from `start` to `end` using this config's defaults.
    pub fn request(&self, start: GridPoint, end: GridPoint) -> SearchRequest {
        let request = SearchRequest::new(start, end)
            .with_allowed_flags(self.default_allowed_flags)
            .with_max_path_length(self.default_max_path_length);
        match self.default_max_expansions {
            Some(budget) => request.with_max_expansions(budget),
            None => request,
        }
    }
}
