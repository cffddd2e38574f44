// voxel_nav: parallel A* pathfinding over 3D voxel grids.
//
// Agents search a shared, read-only voxel grid for routes between voxels,
// honoring per-voxel traversal flags and per-area cost modifiers, and fall
// back to the closest reachable voxel when the goal is out of reach. Many
// searches run at once over the same grid; each owns a private scratch
// arena. A separate broad-phase detector reports overlapping agent spheres.
//
// Module overview:
// - `types.rs`:       GridPoint, NodeFlags bitmask, PathStatus.
// - `grid.rs`:        Dense 3D voxel grid (flags + navigable centers).
// - `area.rs`:        AreaDefinition / AreaCostTable, per-flag cost modifiers.
// - `queue.rs`:       OpenQueue, a min-priority queue with FIFO tiebreak.
// - `scratch.rs`:     SearchScratch, a stamp-based per-search arena.
// - `pathfinding.rs`: Pathfinder, SearchRequest, SearchResult (the A* search).
// - `batch.rs`:       Parallel batch dispatch over rayon.
// - `collision.rs`:   All-pairs sphere overlap detection.
// - `config.rs`:      NavConfig with JSON-loadable defaults and tunables.
// - `error.rs`:       NavError.
//
// Grid construction (voxelization, navigability classification) and job
// scheduling belong to the caller. This crate only needs a populated
// `NavGrid` and a list of requests.
//
// **Critical constraint: determinism.** Given the same grid, area table, and
// request, a search always returns the same result, whether it runs alone,
// in a batch, or on a reused scratch arena.

pub mod area;
pub mod batch;
pub mod collision;
pub mod config;
pub mod error;
pub mod grid;
pub mod pathfinding;
pub mod queue;
pub mod scratch;
pub mod types;

pub use area::{AreaCostTable, AreaDefinition};
pub use collision::{CollisionDetector, Overlaps};
pub use config::NavConfig;
pub use error::NavError;
pub use grid::{GridCell, NavGrid};
pub use pathfinding::{PathNode, Pathfinder, SearchRequest, SearchResult};
pub use scratch::SearchScratch;
pub use types::{GridPoint, NodeFlags, PathStatus};
