// A* pathfinding over the voxel grid.
//
// One call searches from a start voxel to a goal voxel of a shared
// `NavGrid`, stepping between 26-connected neighbors. A neighbor is
// traversable when its flags intersect the request's `allowed_flags`. Step
// cost is the Euclidean distance between navigable centers, minus the area
// modifier of the voxel being left (see `area.rs`). The heuristic is the
// Euclidean distance to the goal's center.
//
// If the goal cannot be reached the search still returns the path to the
// explored voxel with the smallest heuristic (`PathStatus::Partial`), or an
// empty path when nothing beyond the start was reachable
// (`PathStatus::Failed`). Only malformed requests are errors.
//
// All per-voxel search state lives in a caller-supplied `SearchScratch`; the
// grid is only ever read. That makes `Pathfinder` `Sync` and lets any number
// of searches share one grid, each with its own scratch (see `batch.rs`).
//
// See also: `grid.rs` for the grid layout, `queue.rs` for the open set,
// `scratch.rs` for the stamp-based arena.
//
// **Critical constraint: determinism.** A search is a pure function of the
// grid, the area table, and the request. Neighbor order is fixed, queue ties
// are FIFO, and no wall-clock limits are used.

use crate::area::AreaCostTable;
use crate::config::DEFAULT_MAX_PATH_LENGTH;
use crate::error::NavError;
use crate::grid::NavGrid;
use crate::scratch::{NO_PARENT, SearchScratch};
use crate::types::{GridPoint, NodeFlags, PathStatus};
use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One agent's path query.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub start: GridPoint,
    pub end: GridPoint,
    /// Voxels whose flags do not intersect this mask are impassable.
    pub allowed_flags: NodeFlags,
    /// Maximum number of nodes the retrace walks back from the terminal node.
    /// The returned path can be one longer, since the start is always added.
    pub max_path_length: u32,
    /// Grid-to-world transform. When present (and not identity or all-zero)
    /// the result carries world-space positions alongside the grid path.
    pub world_transform: Option<Mat4>,
    /// Stop after closing this many voxels and return the best partial path.
    pub max_expansions: Option<u32>,
}

impl SearchRequest {
    /// A request that may traverse any flagged voxel, with the default path
    /// length cap and no expansion budget.
    pub fn new(start: GridPoint, end: GridPoint) -> Self {
        Self {
            start,
            end,
            allowed_flags: NodeFlags::ALL,
            max_path_length: DEFAULT_MAX_PATH_LENGTH,
            world_transform: None,
            max_expansions: None,
        }
    }

    pub fn with_allowed_flags(mut self, flags: NodeFlags) -> Self {
        self.allowed_flags = flags;
        self
    }

    pub fn with_max_path_length(mut self, max_path_length: u32) -> Self {
        self.max_path_length = max_path_length;
        self
    }

    pub fn with_world_transform(mut self, transform: Mat4) -> Self {
        self.world_transform = Some(transform);
        self
    }

    pub fn with_max_expansions(mut self, max_expansions: u32) -> Self {
        self.max_expansions = Some(max_expansions);
        self
    }

    /// The transform to apply to path nodes, if any. The all-zero matrix is
    /// accepted as "no transform", as is identity (it would reproduce the
    /// grid centers).
    fn effective_transform(&self) -> Option<Mat4> {
        self.world_transform
            .filter(|m| *m != Mat4::ZERO && *m != Mat4::IDENTITY)
    }
}

/// Snapshot of one voxel on a returned path, taken when the path was
/// retraced.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PathNode {
    pub point: GridPoint,
    pub flags: NodeFlags,
    pub center: Vec3,
    pub g_score: f32,
    pub h_score: f32,
    pub f_score: f32,
}

/// Outcome of one search.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub status: PathStatus,
    /// Start-to-terminal path. Empty when `status` is `Failed`.
    pub grid_path: Vec<PathNode>,
    /// `grid_path` centers mapped through the request's world transform.
    /// Empty when no effective transform was given.
    pub world_path: Vec<Vec3>,
    /// Number of voxels the search closed.
    pub nodes_expanded: u32,
    /// True if the search stopped because `max_expansions` ran out.
    pub budget_exhausted: bool,
}

impl SearchResult {
    fn failed(nodes_expanded: u32, budget_exhausted: bool) -> Self {
        Self {
            status: PathStatus::Failed,
            grid_path: Vec::new(),
            world_path: Vec::new(),
            nodes_expanded,
            budget_exhausted,
        }
    }

    /// Grid coordinates of the path, in order.
    pub fn points(&self) -> impl Iterator<Item = GridPoint> + '_ {
        self.grid_path.iter().map(|node| node.point)
    }

    /// Accumulated search cost at the terminal node (area modifiers included).
    pub fn total_cost(&self) -> f32 {
        self.grid_path.last().map_or(0.0, |node| node.g_score)
    }

    /// Sum of Euclidean distances between consecutive path centers.
    pub fn travel_distance(&self) -> f32 {
        self.grid_path
            .windows(2)
            .map(|pair| pair[0].center.distance(pair[1].center))
            .sum()
    }
}

/// A* searcher over one grid and area table. Cheap to construct; holds only
/// references.
#[derive(Clone, Copy, Debug)]
pub struct Pathfinder<'a> {
    grid: &'a NavGrid,
    areas: &'a AreaCostTable,
}

impl<'a> Pathfinder<'a> {
    pub fn new(grid: &'a NavGrid, areas: &'a AreaCostTable) -> Self {
        Self { grid, areas }
    }

    pub fn grid(&self) -> &'a NavGrid {
        self.grid
    }

    pub fn areas(&self) -> &'a AreaCostTable {
        self.areas
    }

    /// Search with a freshly allocated scratch arena. Prefer `find_path_with`
    /// when running many searches on one thread.
    pub fn find_path(&self, request: &SearchRequest) -> Result<SearchResult, NavError> {
        let mut scratch = SearchScratch::for_grid(self.grid);
        self.find_path_with(request, &mut scratch)
    }

    /// Search using `scratch` for all per-voxel state.
    ///
    /// Returns `NavError::OutOfBounds` if either endpoint is outside the
    /// grid. Every other outcome is reported through `SearchResult::status`.
    pub fn find_path_with(
        &self,
        request: &SearchRequest,
        scratch: &mut SearchScratch,
    ) -> Result<SearchResult, NavError> {
        let start = self.grid.require_index(request.start)?;
        let end = self.grid.require_index(request.end)?;
        let end_center = self.grid.cell_at(end).center;

        let stamp = scratch.begin(self.grid.len());
        {
            let h = self.grid.cell_at(start).center.distance(end_center);
            let node = scratch.node_mut(start);
            node.g_score = 0.0;
            node.h_score = h;
            node.f_score = h;
            node.parent = NO_PARENT;
        }
        scratch.mark_open(start);
        scratch.open.enqueue(start as u32, 0.0);

        // Best-heuristic voxel seen so far, for the partial-path fallback.
        // `None` until some neighbor has been scored.
        let mut closest = start;
        let mut closest_h: Option<f32> = None;
        let mut nodes_expanded = 0u32;
        let mut budget_exhausted = false;

        while !scratch.open.is_empty() {
            let current = scratch.open.dequeue()? as usize;
            // Stale duplicate left behind by a re-insertion.
            if scratch.is_closed(current) {
                continue;
            }
            if request.max_expansions.is_some_and(|limit| nodes_expanded >= limit) {
                budget_exhausted = true;
                break;
            }

            scratch.mark_open(current);
            scratch.mark_closed(current);
            nodes_expanded += 1;

            if current == end {
                let result = self.retrace(
                    PathStatus::Complete,
                    start,
                    current,
                    request,
                    scratch,
                    nodes_expanded,
                    false,
                );
                log_finished(request, &result, stamp);
                return Ok(result);
            }

            let current_cell = *self.grid.cell_at(current);
            let current_g = scratch.node(current).g_score;

            for neighbor in self.grid.neighbor_indices(self.grid.point_of(current)) {
                let cell = self.grid.cell_at(neighbor);
                if !cell.flags.intersects(request.allowed_flags) {
                    continue;
                }
                if scratch.is_closed(neighbor) {
                    continue;
                }

                let distance = current_cell.center.distance(cell.center);
                // Area modifiers are attributed to the voxel being left.
                let area_modifier = self.areas.modifier(current_cell.flags, distance);
                let tentative_g = current_g + distance - area_modifier;

                let was_open = scratch.is_open(neighbor);
                if was_open && tentative_g >= scratch.node(neighbor).g_score {
                    continue;
                }

                let h = cell.center.distance(end_center);
                let f = tentative_g + h;
                let node = scratch.node_mut(neighbor);
                node.g_score = tentative_g;
                node.h_score = h;
                node.f_score = f;
                node.parent = current as u32;

                if closest_h.is_none_or(|best| h < best) {
                    closest = neighbor;
                    closest_h = Some(h);
                }

                // First opening, or a cheaper route to a voxel that is
                // already queued; the older entry goes stale.
                scratch.open.enqueue(neighbor as u32, f);
                scratch.mark_open(neighbor);
            }
        }

        let result = if closest == start {
            SearchResult::failed(nodes_expanded, budget_exhausted)
        } else {
            self.retrace(
                PathStatus::Partial,
                start,
                closest,
                request,
                scratch,
                nodes_expanded,
                budget_exhausted,
            )
        };
        log_finished(request, &result, stamp);
        Ok(result)
    }

    /// Walk parent links back from `terminal`, at most `max_path_length`
    /// steps, then prepend the start and return the path in start-to-goal
    /// order.
    #[allow(clippy::too_many_arguments)]
    fn retrace(
        &self,
        status: PathStatus,
        start: usize,
        terminal: usize,
        request: &SearchRequest,
        scratch: &SearchScratch,
        nodes_expanded: u32,
        budget_exhausted: bool,
    ) -> SearchResult {
        let cap = request.max_path_length as usize;
        let mut grid_path = Vec::new();
        let mut current = terminal;

        while current != start && grid_path.len() < cap {
            grid_path.push(self.snapshot(current, scratch));
            let parent = scratch.node(current).parent;
            if parent == NO_PARENT {
                break;
            }
            current = parent as usize;
        }
        grid_path.push(self.snapshot(start, scratch));
        grid_path.reverse();

        let world_path = match request.effective_transform() {
            Some(transform) => grid_path
                .iter()
                .map(|node| transform.transform_point3(node.center))
                .collect(),
            None => Vec::new(),
        };

        SearchResult {
            status,
            grid_path,
            world_path,
            nodes_expanded,
            budget_exhausted,
        }
    }

    fn snapshot(&self, index: usize, scratch: &SearchScratch) -> PathNode {
        let cell = self.grid.cell_at(index);
        let node = scratch.node(index);
        PathNode {
            point: self.grid.point_of(index),
            flags: cell.flags,
            center: cell.center,
            g_score: node.g_score,
            h_score: node.h_score,
            f_score: node.f_score,
        }
    }
}

fn log_finished(request: &SearchRequest, result: &SearchResult, stamp: u32) {
    debug!(
        start = %request.start,
        end = %request.end,
        status = ?result.status,
        path_len = result.grid_path.len(),
        expanded = result.nodes_expanded,
        budget_exhausted = result.budget_exhausted,
        stamp,
        "path search finished"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    fn open_grid(x: u32, y: u32, z: u32) -> NavGrid {
        NavGrid::uniform(x, y, z, 1.0, NodeFlags::WALKABLE).unwrap()
    }

    fn search(grid: &NavGrid, areas: &AreaCostTable, request: &SearchRequest) -> SearchResult {
        Pathfinder::new(grid, areas).find_path(request).unwrap()
    }

    #[test]
    fn start_equals_end_is_single_node() {
        let grid = open_grid(3, 3, 3);
        let p = GridPoint::new(1, 1, 1);
        let result = search(&grid, &AreaCostTable::new(), &SearchRequest::new(p, p));
        assert_eq!(result.status, PathStatus::Complete);
        assert_eq!(result.points().collect::<Vec<_>>(), vec![p]);
        assert_eq!(result.total_cost(), 0.0);
    }

    #[test]
    fn flat_diagonal_example() {
        let grid = open_grid(5, 1, 5);
        let request = SearchRequest::new(GridPoint::new(0, 0, 0), GridPoint::new(4, 0, 4));
        let result = search(&grid, &AreaCostTable::new(), &request);

        assert_eq!(result.status, PathStatus::Complete);
        assert_eq!(result.grid_path.len(), 5);
        let expected: Vec<GridPoint> = (0..5).map(|i| GridPoint::new(i, 0, i)).collect();
        assert_eq!(result.points().collect::<Vec<_>>(), expected);
        for pair in result.grid_path.windows(2) {
            assert!(pair[1].g_score >= pair[0].g_score);
        }
        assert!((result.total_cost() - 4.0 * 2f32.sqrt()).abs() < EPS);
        assert!(result.world_path.is_empty());
    }

    #[test]
    fn out_of_bounds_endpoints_are_rejected() {
        let grid = open_grid(4, 4, 4);
        let areas = AreaCostTable::new();
        let finder = Pathfinder::new(&grid, &areas);
        let bad = GridPoint::new(4, 0, 0);
        assert_eq!(
            finder.find_path(&SearchRequest::new(GridPoint::new(0, 0, 0), bad)),
            Err(NavError::OutOfBounds { point: bad })
        );
        assert_eq!(
            finder.find_path(&SearchRequest::new(GridPoint::new(0, -1, 0), bad)),
            Err(NavError::OutOfBounds {
                point: GridPoint::new(0, -1, 0)
            })
        );
    }

    #[test]
    fn boxed_in_start_fails_with_empty_path() {
        let mut grid = NavGrid::uniform(3, 3, 3, 1.0, NodeFlags::WATER).unwrap();
        let start = GridPoint::new(1, 1, 1);
        grid.set_flags(start, NodeFlags::WALKABLE);
        let request = SearchRequest::new(start, GridPoint::new(0, 0, 0))
            .with_allowed_flags(NodeFlags::WALKABLE);
        let result = search(&grid, &AreaCostTable::new(), &request);
        assert_eq!(result.status, PathStatus::Failed);
        assert!(result.grid_path.is_empty());
        assert_eq!(result.nodes_expanded, 1);
    }

    #[test]
    fn unreachable_goal_yields_partial_path_to_closest_voxel() {
        // 7x1x1 corridor with a wall at x=4.
        let mut grid = open_grid(7, 1, 1);
        grid.set_flags(GridPoint::new(4, 0, 0), NodeFlags::NONE);
        let request = SearchRequest::new(GridPoint::new(0, 0, 0), GridPoint::new(6, 0, 0));
        let result = search(&grid, &AreaCostTable::new(), &request);

        assert_eq!(result.status, PathStatus::Partial);
        let points: Vec<GridPoint> = result.points().collect();
        assert_eq!(points.first(), Some(&GridPoint::new(0, 0, 0)));
        assert_eq!(points.last(), Some(&GridPoint::new(3, 0, 0)));
        assert_eq!(points.len(), 4);
    }

    #[test]
    fn disallowed_goal_is_never_entered() {
        let mut grid = open_grid(4, 1, 4);
        let goal = GridPoint::new(3, 0, 3);
        grid.set_flags(goal, NodeFlags::WATER);
        let request = SearchRequest::new(GridPoint::new(0, 0, 0), goal)
            .with_allowed_flags(NodeFlags::WALKABLE);
        let result = search(&grid, &AreaCostTable::new(), &request);
        assert_eq!(result.status, PathStatus::Partial);
        let last = *result.grid_path.last().unwrap();
        assert!(last.point.is_adjacent(goal));
    }

    #[test]
    fn retrace_is_capped_by_max_path_length() {
        let grid = open_grid(20, 1, 1);
        let request = SearchRequest::new(GridPoint::new(0, 0, 0), GridPoint::new(19, 0, 0))
            .with_max_path_length(3);
        let result = search(&grid, &AreaCostTable::new(), &request);
        assert_eq!(result.status, PathStatus::Complete);
        assert_eq!(result.grid_path.len(), 4);
        assert_eq!(result.grid_path[0].point, GridPoint::new(0, 0, 0));
        assert_eq!(result.grid_path[3].point, GridPoint::new(19, 0, 0));
    }

    #[test]
    fn area_modifier_is_charged_to_departure_voxel() {
        let mut grid = open_grid(3, 1, 1);
        grid.set_flags(GridPoint::new(1, 0, 0), NodeFlags::WALKABLE | NodeFlags::ROAD);
        let areas = AreaCostTable::new().with(NodeFlags::ROAD, 0.5);
        let request = SearchRequest::new(GridPoint::new(0, 0, 0), GridPoint::new(2, 0, 0));
        let result = search(&grid, &areas, &request);

        let g: Vec<f32> = result.grid_path.iter().map(|n| n.g_score).collect();
        // Entering the road is full price; leaving it is half price.
        assert!((g[1] - 1.0).abs() < EPS);
        assert!((g[2] - 1.5).abs() < EPS);
    }

    #[test]
    fn discounted_route_is_preferred() {
        // Two equal-length lanes around a wall at z=1; the z=2 lane is road.
        //   z=0: W W W W W
        //   z=1: S . . . G    ('.' blocked)
        //   z=2: R R R R R
        let mut grid = open_grid(5, 1, 3);
        for x in 1..4 {
            grid.set_flags(GridPoint::new(x, 0, 1), NodeFlags::NONE);
            grid.set_flags(GridPoint::new(x, 0, 2), NodeFlags::WALKABLE | NodeFlags::ROAD);
        }
        let areas = AreaCostTable::new().with(NodeFlags::ROAD, 0.5);
        let request = SearchRequest::new(GridPoint::new(0, 0, 1), GridPoint::new(4, 0, 1));
        let result = search(&grid, &areas, &request);

        assert_eq!(result.status, PathStatus::Complete);
        let interior: Vec<GridPoint> = result.points().skip(1).take(3).collect();
        assert!(interior.iter().all(|p| p.z == 2), "took {interior:?}");
        // Same geometric length as the plain lane, but cheaper.
        assert!(result.total_cost() < result.travel_distance());
    }

    #[test]
    fn world_path_applies_transform() {
        let grid = open_grid(4, 1, 1);
        let transform = Mat4::from_scale_rotation_translation(
            Vec3::splat(2.0),
            glam::Quat::IDENTITY,
            Vec3::new(10.0, 0.0, -5.0),
        );
        let request = SearchRequest::new(GridPoint::new(0, 0, 0), GridPoint::new(3, 0, 0))
            .with_world_transform(transform);
        let result = search(&grid, &AreaCostTable::new(), &request);

        assert_eq!(result.world_path.len(), result.grid_path.len());
        for (world, node) in result.world_path.iter().zip(&result.grid_path) {
            assert_eq!(*world, transform.transform_point3(node.center));
        }
        assert_eq!(result.world_path[3], Vec3::new(16.0, 0.0, -5.0));
    }

    #[test]
    fn identity_or_zero_transform_gives_no_world_path() {
        let grid = open_grid(4, 1, 1);
        let base = SearchRequest::new(GridPoint::new(0, 0, 0), GridPoint::new(3, 0, 0));
        for transform in [Mat4::IDENTITY, Mat4::ZERO] {
            let request = base.clone().with_world_transform(transform);
            let result = search(&grid, &AreaCostTable::new(), &request);
            assert_eq!(result.status, PathStatus::Complete);
            assert!(result.world_path.is_empty());
        }
    }

    #[test]
    fn zero_budget_fails_without_expanding() {
        let grid = open_grid(5, 1, 5);
        let request = SearchRequest::new(GridPoint::new(0, 0, 0), GridPoint::new(4, 0, 4))
            .with_max_expansions(0);
        let result = search(&grid, &AreaCostTable::new(), &request);
        assert_eq!(result.status, PathStatus::Failed);
        assert_eq!(result.nodes_expanded, 0);
        assert!(result.budget_exhausted);
    }

    #[test]
    fn small_budget_returns_partial_progress() {
        let grid = open_grid(5, 1, 5);
        let request = SearchRequest::new(GridPoint::new(0, 0, 0), GridPoint::new(4, 0, 4))
            .with_max_expansions(1);
        let result = search(&grid, &AreaCostTable::new(), &request);
        assert_eq!(result.status, PathStatus::Partial);
        assert_eq!(result.nodes_expanded, 1);
        assert!(result.budget_exhausted);
        assert_eq!(
            result.points().collect::<Vec<_>>(),
            vec![GridPoint::new(0, 0, 0), GridPoint::new(1, 0, 1)]
        );
    }

    #[test]
    fn ample_budget_matches_unbounded_search() {
        let grid = open_grid(6, 2, 6);
        let request = SearchRequest::new(GridPoint::new(0, 0, 0), GridPoint::new(5, 1, 4));
        let unbounded = search(&grid, &AreaCostTable::new(), &request);
        let bounded = search(
            &grid,
            &AreaCostTable::new(),
            &request.clone().with_max_expansions(10_000),
        );
        assert_eq!(unbounded, bounded);
        assert!(!bounded.budget_exhausted);
    }

    #[test]
    fn cheaper_route_found_after_first_discovery() {
        // The goal's first discovered route runs through a costly voxel;
        // a later expansion finds a cheaper one through road voxels.
        //   x: 0 1 2
        //   z=0: S M G
        //   z=1: R R .
        let mut grid = open_grid(3, 1, 2);
        grid.set_flags(GridPoint::new(2, 0, 1), NodeFlags::NONE);
        grid.set_flags(GridPoint::new(1, 0, 0), NodeFlags::WALKABLE | NodeFlags::WATER);
        grid.set_flags(GridPoint::new(0, 0, 1), NodeFlags::WALKABLE | NodeFlags::ROAD);
        grid.set_flags(GridPoint::new(1, 0, 1), NodeFlags::WALKABLE | NodeFlags::ROAD);
        let areas = AreaCostTable::new()
            .with(NodeFlags::WATER, -5.0)
            .with(NodeFlags::ROAD, 0.9);
        let request = SearchRequest::new(GridPoint::new(0, 0, 0), GridPoint::new(2, 0, 0));
        let result = search(&grid, &areas, &request);

        assert_eq!(result.status, PathStatus::Complete);
        assert!(
            !result.points().any(|p| p == GridPoint::new(1, 0, 0)),
            "path should avoid the penalized voxel"
        );
    }

    #[test]
    fn reused_scratch_matches_fresh_scratch() {
        let mut grid = open_grid(6, 3, 6);
        for y in 0..3 {
            for z in 0..5 {
                grid.set_flags(GridPoint::new(3, y, z), NodeFlags::NONE);
            }
        }
        let areas = AreaCostTable::new();
        let finder = Pathfinder::new(&grid, &areas);
        let requests = [
            SearchRequest::new(GridPoint::new(0, 0, 0), GridPoint::new(5, 2, 0)),
            SearchRequest::new(GridPoint::new(5, 1, 5), GridPoint::new(0, 0, 1)),
            SearchRequest::new(GridPoint::new(2, 2, 2), GridPoint::new(2, 2, 2)),
            SearchRequest::new(GridPoint::new(0, 0, 0), GridPoint::new(3, 0, 0)),
        ];

        let mut scratch = SearchScratch::new();
        for _ in 0..3 {
            for request in &requests {
                let reused = finder.find_path_with(request, &mut scratch).unwrap();
                let fresh = finder.find_path(request).unwrap();
                assert_eq!(reused, fresh);
            }
        }
    }

    #[test]
    fn search_result_serializes() {
        let grid = open_grid(3, 1, 3);
        let request = SearchRequest::new(GridPoint::new(0, 0, 0), GridPoint::new(2, 0, 2));
        let result = search(&grid, &AreaCostTable::new(), &request);
        let json = serde_json::to_string(&result).unwrap();
        let restored: SearchResult = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.status, PathStatus::Complete);
        assert_eq!(restored.grid_path.len(), result.grid_path.len());
    }
}
