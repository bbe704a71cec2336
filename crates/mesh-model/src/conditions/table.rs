use serde::{Deserialize, Serialize};

use crate::topology::store::ConditionId;

/// Conditions assigned to one edge position of a polygon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeConditions {
    pub fluid: ConditionId,
    pub thermal: ConditionId,
    /// Passive-scalar conditions, indexed by scalar number.
    pub other: Vec<ConditionId>,
}

/// Outcome of writing one slot of the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SlotWrite {
    Unchanged,
    Written { previous: Option<ConditionId> },
}

/// Boundary conditions of a polygon, keyed by 1-based edge position.
///
/// Fluid and thermal slots exist for every edge position. Passive-scalar
/// slots only exist up to the highest scalar index written for that edge;
/// lower indices are backfilled with fresh default conditions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundaryConditionTable {
    entries: Vec<EdgeConditions>,
}

impl BoundaryConditionTable {
    /// Number of edge positions covered.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[EdgeConditions] {
        &self.entries
    }

    fn entry(&self, edge: usize) -> Option<&EdgeConditions> {
        self.entries.get(edge.checked_sub(1)?)
    }

    fn entry_mut(&mut self, edge: usize) -> Option<&mut EdgeConditions> {
        self.entries.get_mut(edge.checked_sub(1)?)
    }

    pub(crate) fn push_edge(&mut self, fluid: ConditionId, thermal: ConditionId) {
        self.entries.push(EdgeConditions {
            fluid,
            thermal,
            other: Vec::new(),
        });
    }

    pub fn fluid(&self, edge: usize) -> Option<ConditionId> {
        self.entry(edge).map(|e| e.fluid)
    }

    pub fn thermal(&self, edge: usize) -> Option<ConditionId> {
        self.entry(edge).map(|e| e.thermal)
    }

    /// Passive-scalar condition, or `None` if the edge position is out of
    /// range or `scalar` is past the last index written for that edge.
    pub fn other(&self, edge: usize, scalar: usize) -> Option<ConditionId> {
        self.entry(edge)?.other.get(scalar).copied()
    }

    /// Number of passive-scalar slots materialised for an edge position.
    pub fn other_count(&self, edge: usize) -> Option<usize> {
        self.entry(edge).map(|e| e.other.len())
    }

    pub(crate) fn write_fluid(&mut self, edge: usize, condition: ConditionId) -> SlotWrite {
        match self.entry_mut(edge) {
            Some(entry) => replace_slot(&mut entry.fluid, condition),
            None => SlotWrite::Unchanged,
        }
    }

    pub(crate) fn write_thermal(&mut self, edge: usize, condition: ConditionId) -> SlotWrite {
        match self.entry_mut(edge) {
            Some(entry) => replace_slot(&mut entry.thermal, condition),
            None => SlotWrite::Unchanged,
        }
    }

    /// Write a passive-scalar slot. Missing lower slots are filled with
    /// conditions produced by `make_default`.
    pub(crate) fn write_other(
        &mut self,
        edge: usize,
        scalar: usize,
        condition: ConditionId,
        mut make_default: impl FnMut() -> ConditionId,
    ) -> SlotWrite {
        let Some(entry) = self.entry_mut(edge) else {
            return SlotWrite::Unchanged;
        };
        if let Some(slot) = entry.other.get_mut(scalar) {
            return replace_slot(slot, condition);
        }
        while entry.other.len() < scalar {
            entry.other.push(make_default());
        }
        entry.other.push(condition);
        SlotWrite::Written { previous: None }
    }

    /// Whether any slot holds `condition`.
    pub fn references(&self, condition: ConditionId) -> bool {
        self.condition_ids().any(|id| id == condition)
    }

    /// Every condition handle in the table, fluid then thermal then
    /// passive-scalar for each edge position in turn.
    pub fn condition_ids(&self) -> impl Iterator<Item = ConditionId> + '_ {
        self.entries.iter().flat_map(|e| {
            [e.fluid, e.thermal]
                .into_iter()
                .chain(e.other.iter().copied())
        })
    }

    /// Same layout with every handle passed through `map`.
    pub(crate) fn map_ids(&self, mut map: impl FnMut(ConditionId) -> ConditionId) -> Self {
        let entries = self
            .entries
            .iter()
            .map(|e| EdgeConditions {
                fluid: map(e.fluid),
                thermal: map(e.thermal),
                other: e.other.iter().map(|id| map(*id)).collect(),
            })
            .collect();
        Self { entries }
    }
}

fn replace_slot(slot: &mut ConditionId, condition: ConditionId) -> SlotWrite {
    if *slot == condition {
        return SlotWrite::Unchanged;
    }
    let previous = std::mem::replace(slot, condition);
    SlotWrite::Written {
        previous: Some(previous),
    }
}
