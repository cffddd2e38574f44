// Broad-phase agent overlap detection.
//
// Agents are spheres (position + collider radius). For every agent the
// detector checks every other agent and reports the ones it overlaps by at
// least `threshold` world units of penetration:
// `r1 + r2 - distance >= threshold`. The check is all-pairs, so quadratic in
// agent count, and runs in parallel over the observing agent since it only
// reads the shared inputs.
//
// `detect_moving` adds a velocity gate: agents with zero velocity do not
// probe and get an empty report, though moving agents that run into them
// still list them.
//
// This is detection only. No resolution or response policy lives here, and
// nothing here interacts with pathfinding.

use crate::config::{DEFAULT_COLLISION_THRESHOLD, NavConfig};
use crate::error::NavError;
use glam::Vec3;
use rayon::prelude::*;
use smallvec::SmallVec;

/// Indices of the agents one agent overlaps, ascending.
pub type Overlaps = SmallVec<[u32; 4]>;

/// True if two spheres interpenetrate by at least `threshold`.
pub fn spheres_overlap(p1: Vec3, r1: f32, p2: Vec3, r2: f32, threshold: f32) -> bool {
    r1 + r2 - p1.distance(p2) >= threshold
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CollisionDetector {
    threshold: f32,
}

impl Default for CollisionDetector {
    fn default() -> Self {
        Self::new(DEFAULT_COLLISION_THRESHOLD)
    }
}

impl CollisionDetector {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    pub fn from_config(config: &NavConfig) -> Self {
        Self::new(config.collision_threshold)
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// For each agent, the agents it currently overlaps. `positions` and
    /// `radii` are parallel arrays indexed by agent.
    pub fn detect(&self, positions: &[Vec3], radii: &[f32]) -> Result<Vec<Overlaps>, NavError> {
        check_len(positions.len(), "radii", radii.len())?;
        Ok((0..positions.len())
            .into_par_iter()
            .map(|id| self.overlaps_for(id, positions, radii))
            .collect())
    }

    /// Like `detect`, but stationary agents (zero velocity) skip their own
    /// check and report nothing.
    pub fn detect_moving(
        &self,
        positions: &[Vec3],
        velocities: &[Vec3],
        radii: &[f32],
    ) -> Result<Vec<Overlaps>, NavError> {
        check_len(positions.len(), "radii", radii.len())?;
        check_len(positions.len(), "velocities", velocities.len())?;
        Ok((0..positions.len())
            .into_par_iter()
            .map(|id| {
                if velocities[id] == Vec3::ZERO {
                    Overlaps::new()
                } else {
                    self.overlaps_for(id, positions, radii)
                }
            })
            .collect())
    }

    /// Like `detect`, but only counts overlaps per agent.
    pub fn overlap_counts(&self, positions: &[Vec3], radii: &[f32]) -> Result<Vec<usize>, NavError> {
        Ok(self
            .detect(positions, radii)?
            .into_iter()
            .map(|overlaps| overlaps.len())
            .collect())
    }

    fn overlaps_for(&self, id: usize, positions: &[Vec3], radii: &[f32]) -> Overlaps {
        let (position, radius) = (positions[id], radii[id]);
        positions
            .iter()
            .zip(radii)
            .enumerate()
            .filter(|&(other, (&p, &r))| {
                other != id && spheres_overlap(position, radius, p, r, self.threshold)
            })
            .map(|(other, _)| other as u32)
            .collect()
    }
}

fn check_len(agents: usize, field: &'static str, len: usize) -> Result<(), NavError> {
    if agents == len {
        Ok(())
    } else {
        Err(NavError::MismatchedAgentData { agents, field, len })
    }
}
