use std::collections::{BTreeMap, BTreeSet};

use super::grid::GridCoord;
use super::terrain::{ResourceKind, TileGrid};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisibilityChanges {
    pub regenerated: Vec<GridCoord>,
    pub depleted: Vec<GridCoord>,
}

impl VisibilityChanges {
    pub fn is_empty(&self) -> bool {
        self.regenerated.is_empty() && self.depleted.is_empty()
    }
}

/// Active/inactive partition of the resource-bearing cells.
///
/// The key set is fixed at construction; depletion lists only move keys
/// between the two maps.
#[derive(Debug, Clone, Default)]
pub struct ResourceVisibilityTracker {
    active: BTreeMap<GridCoord, ResourceKind>,
    inactive: BTreeMap<GridCoord, ResourceKind>,
}

impl ResourceVisibilityTracker {
    pub fn from_tiles(tiles: &TileGrid) -> Self {
        Self {
            active: tiles.resource_tiles().collect(),
            inactive: BTreeMap::new(),
        }
    }

    pub fn apply_depletion_list(&mut self, coords: &[GridCoord]) -> VisibilityChanges {
        let depleted_now = coords.iter().copied().collect::<BTreeSet<_>>();
        let mut changes = VisibilityChanges::default();

        let regenerated = self
            .inactive
            .keys()
            .filter(|coord| !depleted_now.contains(coord))
            .copied()
            .collect::<Vec<_>>();
        for coord in regenerated {
            if let Some(kind) = self.inactive.remove(&coord) {
                self.active.insert(coord, kind);
                changes.regenerated.push(coord);
            }
        }

        for coord in depleted_now {
            if let Some(kind) = self.active.remove(&coord) {
                self.inactive.insert(coord, kind);
                changes.depleted.push(coord);
            }
        }

        changes
    }

    pub fn is_active(&self, coord: GridCoord) -> bool {
        self.active.contains_key(&coord)
    }

    pub fn is_inactive(&self, coord: GridCoord) -> bool {
        self.inactive.contains_key(&coord)
    }

    pub fn active(&self) -> &BTreeMap<GridCoord, ResourceKind> {
        &self.active
    }

    pub fn inactive(&self) -> &BTreeMap<GridCoord, ResourceKind> {
        &self.inactive
    }

    pub fn resource_count(&self) -> usize {
        self.active.len() + self.inactive.len()
    }
}
