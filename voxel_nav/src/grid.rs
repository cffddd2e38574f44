// Dense 3D voxel grid the pathfinder searches.
//
// Cells are stored as a flat `Vec<GridCell>` indexed by
// `x + z * size_x + y * size_x * size_z`, giving O(1) lookup. Each cell holds
// only structural data: its traversal flags and the navigable center used for
// distance computation. Per-search scratch (costs, parents, stamps) lives in
// `scratch.rs`, so a `NavGrid` is never written during a search and can be
// shared by reference across any number of concurrent searches.
//
// Voxelization and navigability classification are the caller's job; this
// module only offers constructors and setters to populate the grid.
//
// See also: `pathfinding.rs` for the A* search over this grid,
// `scratch.rs` for the per-search arena indexed the same way.

use crate::error::NavError;
use crate::types::{GridPoint, NodeFlags};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Structural data for one voxel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GridCell {
    pub flags: NodeFlags,
    /// Position that represents this voxel for distance computation, in
    /// grid-local space. Not necessarily the geometric center of the voxel
    /// (e.g. the point on the floor surface an agent would stand on).
    pub center: Vec3,
}

/// Dense 3D voxel grid.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NavGrid {
    /// Flat storage: index = x + z * size_x + y * size_x * size_z.
    cells: Vec<GridCell>,
    size_x: u32,
    size_y: u32,
    size_z: u32,
}

impl NavGrid {
    /// Create a grid with unit spacing and no flags set. Each cell's center is
    /// its integer coordinate.
    pub fn new(size_x: u32, size_y: u32, size_z: u32) -> Result<Self, NavError> {
        Self::uniform(size_x, size_y, size_z, 1.0, NodeFlags::NONE)
    }

    /// Create a grid where every cell carries `flags` and centers are spaced
    /// `cell_size` apart along each axis, starting at the origin.
    pub fn uniform(
        size_x: u32,
        size_y: u32,
        size_z: u32,
        cell_size: f32,
        flags: NodeFlags,
    ) -> Result<Self, NavError> {
        Self::from_fn(size_x, size_y, size_z, |p| GridCell {
            flags,
            center: Vec3::new(p.x as f32, p.y as f32, p.z as f32) * cell_size,
        })
    }

    /// Create a grid by evaluating `f` for every point. Points are visited in
    /// storage order.
    pub fn from_fn(
        size_x: u32,
        size_y: u32,
        size_z: u32,
        mut f: impl FnMut(GridPoint) -> GridCell,
    ) -> Result<Self, NavError> {
        let total = checked_cell_count(size_x, size_y, size_z)?;
        let mut grid = Self {
            cells: Vec::with_capacity(total),
            size_x,
            size_y,
            size_z,
        };
        for i in 0..total {
            let point = grid.point_of(i);
            grid.cells.push(f(point));
        }
        Ok(grid)
    }

    pub fn size_x(&self) -> u32 {
        self.size_x
    }

    pub fn size_y(&self) -> u32 {
        self.size_y
    }

    pub fn size_z(&self) -> u32 {
        self.size_z
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Check whether a point is within bounds.
    pub fn in_bounds(&self, point: GridPoint) -> bool {
        point.x >= 0
            && point.y >= 0
            && point.z >= 0
            && (point.x as u32) < self.size_x
            && (point.y as u32) < self.size_y
            && (point.z as u32) < self.size_z
    }

    /// Convert a point to a flat index. Returns `None` if out of bounds.
    pub fn index(&self, point: GridPoint) -> Option<usize> {
        if self.in_bounds(point) {
            Some(self.index_unchecked(point))
        } else {
            None
        }
    }

    /// Like `index`, but reports the offending point as an error.
    pub fn require_index(&self, point: GridPoint) -> Result<usize, NavError> {
        self.index(point).ok_or(NavError::OutOfBounds { point })
    }

    fn index_unchecked(&self, point: GridPoint) -> usize {
        let sx = self.size_x as usize;
        let sz = self.size_z as usize;
        point.x as usize + point.z as usize * sx + point.y as usize * sx * sz
    }

    /// Inverse of `index`. `index` must be below `len()`.
    pub fn point_of(&self, index: usize) -> GridPoint {
        let sx = self.size_x as usize;
        let layer = sx * self.size_z as usize;
        let y = index / layer;
        let rem = index % layer;
        GridPoint::new((rem % sx) as i32, y as i32, (rem / sx) as i32)
    }

    /// Read a cell. Returns `None` for out-of-bounds points.
    pub fn cell(&self, point: GridPoint) -> Option<&GridCell> {
        self.index(point).map(|i| &self.cells[i])
    }

    /// Read a cell by flat index. Panics if `index >= len()`.
    pub fn cell_at(&self, index: usize) -> &GridCell {
        &self.cells[index]
    }

    /// Overwrite a cell. No-op for out-of-bounds points.
    pub fn set_cell(&mut self, point: GridPoint, cell: GridCell) {
        if let Some(i) = self.index(point) {
            self.cells[i] = cell;
        }
    }

    /// Overwrite a cell's flags. No-op for out-of-bounds points.
    pub fn set_flags(&mut self, point: GridPoint, flags: NodeFlags) {
        if let Some(i) = self.index(point) {
            self.cells[i].flags = flags;
        }
    }

    /// Overwrite a cell's navigable center. No-op for out-of-bounds points.
    pub fn set_center(&mut self, point: GridPoint, center: Vec3) {
        if let Some(i) = self.index(point) {
            self.cells[i].center = center;
        }
    }

    /// Flat indices of the up-to-26 voxels surrounding `point`, clipped to
    /// the grid bounds, in x-major, then y, then z order. `point` itself is
    /// excluded.
    pub fn neighbor_indices(&self, point: GridPoint) -> impl Iterator<Item = usize> + '_ {
        let clip = |v: i32, size: u32| (v - 1).max(0)..=(v + 1).min(size as i32 - 1);
        let xs = clip(point.x, self.size_x);
        let ys = clip(point.y, self.size_y);
        let zs = clip(point.z, self.size_z);
        xs.flat_map(move |x| {
            let zs = zs.clone();
            ys.clone()
                .flat_map(move |y| zs.clone().map(move |z| GridPoint::new(x, y, z)))
        })
        .filter(move |&p| p != point)
        .map(move |p| self.index_unchecked(p))
    }
}

/// Cell count for the given dimensions. Parent links in the search scratch
/// are stored as `u32`, so the count must fit in one, and each axis must fit
/// in the `i32` components of `GridPoint`.
fn checked_cell_count(size_x: u32, size_y: u32, size_z: u32) -> Result<usize, NavError> {
    let invalid = NavError::InvalidDimensions {
        size_x,
        size_y,
        size_z,
    };
    let axis_ok = |s: u32| s > 0 && s <= i32::MAX as u32;
    if !(axis_ok(size_x) && axis_ok(size_y) && axis_ok(size_z)) {
        return Err(invalid);
    }
    let total = (size_x as u64)
        .checked_mul(size_y as u64)
        .and_then(|n| n.checked_mul(size_z as u64))
        .filter(|&n| n <= u32::MAX as u64)
        .ok_or(invalid)?;
    Ok(total as usize)
}
