// Core types shared across the pathfinding engine.
//
// Defines voxel coordinates (`GridPoint`), the per-voxel traversal bitmask
// (`NodeFlags`), and the outcome of a search (`PathStatus`). All types derive
// `Serialize` and `Deserialize` so requests, results, and grids can be
// snapshotted or shipped across a process boundary.
//
// See also: `grid.rs` for the voxel storage these types index into,
// `pathfinding.rs` which consumes them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

// ---------------------------------------------------------------------------
// Spatial types
// ---------------------------------------------------------------------------

/// A position in the 3D voxel grid. Each component is in voxel units.
///
/// Valid points lie in `[0, size_x) × [0, size_y) × [0, size_z)` of the grid
/// they are used with. Negative components are representable so that
/// neighbor arithmetic at the grid boundary does not need special cases;
/// they are simply out of bounds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPoint {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl GridPoint {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Chebyshev (chessboard) distance: the number of 26-connected steps
    /// between two points on an unobstructed grid.
    pub fn chebyshev_distance(self, other: Self) -> u32 {
        (self.x - other.x)
            .unsigned_abs()
            .max((self.y - other.y).unsigned_abs())
            .max((self.z - other.z).unsigned_abs())
    }

    /// Returns `true` if `other` is one of the 26 voxels surrounding `self`.
    pub fn is_adjacent(self, other: Self) -> bool {
        self != other && self.chebyshev_distance(other) == 1
    }
}

impl fmt::Display for GridPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

impl From<(i32, i32, i32)> for GridPoint {
    fn from((x, y, z): (i32, i32, i32)) -> Self {
        Self::new(x, y, z)
    }
}

// ---------------------------------------------------------------------------
// Traversal flags
// ---------------------------------------------------------------------------

/// Bitmask of traversability and area-membership properties for one voxel.
///
/// The grid builder decides what each bit means; the engine only ever asks
/// whether two masks intersect. The named constants are a conventional
/// layout used by the defaults in `config.rs` and by the tests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeFlags(pub u64);

impl NodeFlags {
    pub const NONE: Self = Self(0);
    pub const WALKABLE: Self = Self(1 << 0);
    pub const CLIMBABLE: Self = Self(1 << 1);
    pub const WATER: Self = Self(1 << 2);
    pub const ROAD: Self = Self(1 << 3);
    pub const ALL: Self = Self(u64::MAX);

    pub const fn bits(self) -> u64 {
        self.0
    }

    /// True if any bit is shared with `other`.
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// True if every bit of `other` is also set in `self`.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for NodeFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for NodeFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for NodeFlags {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

// ---------------------------------------------------------------------------
// Search outcome
// ---------------------------------------------------------------------------

/// How a search ended. Not finding the goal is a normal outcome, never an
/// error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathStatus {
    /// The goal was reached; the path ends at the goal.
    Complete,
    /// The goal was unreachable; the path ends at the explored voxel closest
    /// to the goal by heuristic.
    Partial,
    /// Nothing beyond the start was reachable. The path is empty.
    Failed,
}

impl PathStatus {
    pub fn is_complete(self) -> bool {
        self == Self::Complete
    }
}
