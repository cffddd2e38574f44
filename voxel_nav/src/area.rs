// Per-area traversal cost modifiers.
//
// An `AreaDefinition` ties a flag mask to a weight. When the search steps
// out of a voxel whose flags intersect the mask, `weight * step_distance` is
// subtracted from the step's cost, so positive weights make an area cheaper
// (roads) and negative weights make it more expensive (mud, water). Multiple
// matching definitions accumulate.
//
// The modifier is attributed to the voxel being *left*, not the one being
// entered. Callers tuning weights should keep that in mind: the first step
// out of a road voxel is discounted, the step onto it is not.
//
// See also: `pathfinding.rs` where `modifier()` feeds the tentative g-score,
// `config.rs` where the default table is loaded.

use crate::types::NodeFlags;
use serde::{Deserialize, Serialize};

/// One weighted area: voxels whose flags intersect `flags` are affected.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AreaDefinition {
    pub flags: NodeFlags,
    pub weight: f32,
}

impl AreaDefinition {
    pub const fn new(flags: NodeFlags, weight: f32) -> Self {
        Self { flags, weight }
    }
}

/// Ordered list of area definitions, built once and shared by all searches.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AreaCostTable {
    areas: Vec<AreaDefinition>,
}

impl AreaCostTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, area: AreaDefinition) {
        self.areas.push(area);
    }

    /// Builder-style `push`.
    pub fn with(mut self, flags: NodeFlags, weight: f32) -> Self {
        self.push(AreaDefinition::new(flags, weight));
        self
    }

    pub fn areas(&self) -> &[AreaDefinition] {
        &self.areas
    }

    pub fn len(&self) -> usize {
        self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }

    /// Total cost adjustment for a step of length `distance` leaving a voxel
    /// with `departure_flags`. Subtract the result from the raw step cost.
    pub fn modifier(&self, departure_flags: NodeFlags, distance: f32) -> f32 {
        self.areas
            .iter()
            .filter(|area| departure_flags.intersects(area.flags))
            .map(|area| area.weight * distance)
            .sum()
    }
}

impl FromIterator<AreaDefinition> for AreaCostTable {
    fn from_iter<I: IntoIterator<Item = AreaDefinition>>(iter: I) -> Self {
        Self {
            areas: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_table_has_no_modifier() {
        let table = AreaCostTable::new();
        assert_eq!(table.modifier(NodeFlags::ALL, 3.0), 0.0);
    }

    #[test]
    fn matching_areas_accumulate() {
        let table = AreaCostTable::new()
            .with(NodeFlags::ROAD, 0.25)
            .with(NodeFlags::WALKABLE, 0.5)
            .with(NodeFlags::WATER, 10.0);
        let flags = NodeFlags::WALKABLE | NodeFlags::ROAD;
        assert!((table.modifier(flags, 2.0) - 1.5).abs() < 1e-6);
    }

    #[test]
    fn negative_weight_is_a_penalty() {
        let table = AreaCostTable::new().with(NodeFlags::WATER, -1.0);
        let step = 2.0;
        let cost = step - table.modifier(NodeFlags::WATER, step);
        assert_eq!(cost, 4.0);
    }

    #[test]
    fn table_serializes_as_list() {
        let table = AreaCostTable::new().with(NodeFlags::ROAD, 0.5);
        let json = serde_json::to_string(&table).unwrap();
        assert_eq!(json, r#"[{"flags":8,"weight":0.5}]"#);
    }
}
