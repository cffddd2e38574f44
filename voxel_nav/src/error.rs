// Error taxonomy for the pathfinding engine.
//
// Only structural problems are errors: a bad coordinate, a malformed grid,
// mismatched batch inputs, or an unreadable config. Whether a path was found
// is reported through `PathStatus` instead (see `types.rs`).

use crate::types::GridPoint;

/// Errors surfaced synchronously to the caller of the engine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum NavError {
    /// A start or end point lies outside the grid extents.
    #[error("grid point {point} is out of bounds")]
    OutOfBounds { point: GridPoint },

    /// `dequeue` was called on an empty open queue.
    #[error("dequeue called on an empty queue")]
    EmptyQueue,

    /// Grid dimensions are zero or too large to index.
    #[error("invalid grid dimensions: {size_x}x{size_y}x{size_z}")]
    InvalidDimensions {
        size_x: u32,
        size_y: u32,
        size_z: u32,
    },

    /// A batch was given a different number of output slots than requests.
    #[error("batch has {requests} requests but {slots} output slots")]
    MismatchedBatch { requests: usize, slots: usize },

    /// A per-agent collision input (radii or velocities) is not as long as
    /// the positions slice.
    #[error("{field} has {len} entries for {agents} agents")]
    MismatchedAgentData {
        agents: usize,
        field: &'static str,
        len: usize,
    },

    /// The navigation config could not be parsed.
    #[error("invalid nav config: {0}")]
    Config(String),
}

impl From<serde_json::Error> for NavError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(err.to_string())
    }
}
