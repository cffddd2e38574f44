// Parallel dispatch of many path searches over one grid.
//
// Each request is an independent task. Tasks run on the rayon pool. rayon
// calls the `map_init` / `for_each_init` initializer once per job split, so
// each split gets its own `SearchScratch` and reuses it for every request in
// that split. An arena is never shared between threads and the grid is only
// read. Arenas start empty and are sized by their first search, so a split
// that never runs a search allocates nothing.
//
// Results come back in request order and are identical to running the same
// requests one after another with `Pathfinder::find_path`.

use crate::error::NavError;
use crate::pathfinding::{Pathfinder, SearchRequest, SearchResult};
use crate::scratch::SearchScratch;
use rayon::prelude::*;
use tracing::trace;

/// Output slot for one request in `find_paths_into`. `None` until the batch
/// has run.
pub type SearchSlot = Option<Result<SearchResult, NavError>>;

impl Pathfinder<'_> {
    /// Run every request in parallel and return the outcomes in order.
    pub fn find_paths(&self, requests: &[SearchRequest]) -> Vec<Result<SearchResult, NavError>> {
        trace!(requests = requests.len(), "dispatching path search batch");
        requests
            .par_iter()
            .map_init(
                SearchScratch::new,
                |scratch, request| self.find_path_with(request, scratch),
            )
            .collect()
    }

    /// Run every request in parallel, writing each outcome into the slot at
    /// the same index. `slots` must be exactly as long as `requests`.
    pub fn find_paths_into(
        &self,
        requests: &[SearchRequest],
        slots: &mut [SearchSlot],
    ) -> Result<(), NavError> {
        if requests.len() != slots.len() {
            return Err(NavError::MismatchedBatch {
                requests: requests.len(),
                slots: slots.len(),
            });
        }
        trace!(requests = requests.len(), "dispatching path search batch into slots");
        slots.par_iter_mut().zip(requests.par_iter()).for_each_init(
            SearchScratch::new,
            |scratch, (slot, request)| {
                *slot = Some(self.find_path_with(request, scratch));
            },
        );
        Ok(())
    }
}
