// Per-search scratch arena.
//
// Every search needs mutable per-voxel state: g/h/f scores, a parent link,
// and open/closed membership. None of it lives in `NavGrid`; instead each
// search borrows a `SearchScratch`, an arena indexed exactly like the grid's
// flat storage. Concurrent searches each hold their own arena, so they never
// write to shared memory and the grid stays immutable.
//
// Arenas are meant to be reused. Rather than clearing every node between
// searches, `begin()` bumps a stamp, and a node's scores only count when its
// `open_stamp` / `closed_stamp` equals the current stamp. Anything left over
// from an earlier search is therefore "unvisited". The stamp is a `u32`; on
// the rare wrap the arena is wiped once and counting restarts.
//
// The arena also owns the open queue so its heap allocation survives between
// searches too.
//
// See also: `pathfinding.rs` (the only writer), `batch.rs` which keeps one
// arena per rayon job split.

use crate::grid::NavGrid;
use crate::queue::OpenQueue;
use tracing::debug;

/// Sentinel parent for nodes with no predecessor (the start node).
pub const NO_PARENT: u32 = u32::MAX;

/// Mutable search state for one voxel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScratchNode {
    /// Best known cost from the start.
    pub g_score: f32,
    /// Heuristic estimate to the goal.
    pub h_score: f32,
    /// `g_score + h_score`.
    pub f_score: f32,
    /// Flat grid index of the predecessor on the best known path.
    pub parent: u32,
    pub open_stamp: u32,
    pub closed_stamp: u32,
}

impl Default for ScratchNode {
    fn default() -> Self {
        Self {
            g_score: 0.0,
            h_score: 0.0,
            f_score: 0.0,
            parent: NO_PARENT,
            open_stamp: 0,
            closed_stamp: 0,
        }
    }
}

/// Scratch arena for one search at a time.
///
/// Callers only create arenas and hand them to `Pathfinder::find_path_with`.
/// Node state is written by the search alone:
///
/// ```compile_fail
/// let mut scratch = voxel_nav::SearchScratch::new();
/// scratch.begin(8);
/// scratch.mark_closed(3);
/// ```
#[derive(Clone, Debug, Default)]
pub struct SearchScratch {
    nodes: Vec<ScratchNode>,
    /// Identifier of the search currently using this arena. Zero means no
    /// search has begun, so default node stamps never match.
    stamp: u32,
    pub(crate) open: OpenQueue<u32>,
}

impl SearchScratch {
    /// An empty arena. It is sized on the first `begin()`.
    pub fn new() -> Self {
        Self::default()
    }

    /// An arena pre-sized for `grid`.
    pub fn for_grid(grid: &NavGrid) -> Self {
        Self {
            nodes: vec![ScratchNode::default(); grid.len()],
            stamp: 0,
            open: OpenQueue::new(),
        }
    }

    /// Start a new search over a grid of `cell_count` voxels and return its
    /// stamp. Resizes (and wipes) the arena if it was sized for a different
    /// grid.
    pub fn begin(&mut self, cell_count: usize) -> u32 {
        if self.nodes.len() != cell_count {
            self.nodes.clear();
            self.nodes.resize(cell_count, ScratchNode::default());
            self.stamp = 0;
        }
        if self.stamp == u32::MAX {
            debug!(cells = cell_count, "search stamp wrapped, wiping scratch arena");
            self.nodes.fill(ScratchNode::default());
            self.stamp = 0;
        }
        self.stamp += 1;
        self.open.clear();
        self.stamp
    }

    /// Stamp of the search in progress.
    pub fn stamp(&self) -> u32 {
        self.stamp
    }

    /// Number of voxels the arena is sized for.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn is_open(&self, index: usize) -> bool {
        self.nodes[index].open_stamp == self.stamp
    }

    pub fn is_closed(&self, index: usize) -> bool {
        self.nodes[index].closed_stamp == self.stamp
    }

    pub(crate) fn mark_open(&mut self, index: usize) {
        self.nodes[index].open_stamp = self.stamp;
    }

    pub(crate) fn mark_closed(&mut self, index: usize) {
        self.nodes[index].closed_stamp = self.stamp;
    }

    pub fn node(&self, index: usize) -> &ScratchNode {
        &self.nodes[index]
    }

    pub(crate) fn node_mut(&mut self, index: usize) -> &mut ScratchNode {
        &mut self.nodes[index]
    }

    #[cfg(test)]
    pub(crate) fn force_stamp(&mut self, stamp: u32) {
        self.stamp = stamp;
    }
}
