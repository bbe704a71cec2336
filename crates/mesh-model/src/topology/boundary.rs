//! Boundary conditions as store entities, and the per-polygon table
//! operations that assign them to edge positions.

use std::ops::Deref;

use tracing::{debug, trace};

use crate::conditions::table::SlotWrite;
use crate::conditions::{BoundaryCondition, BoundaryConditionTable, BoundaryConditionType};
use crate::entity::EntityKey;

use super::store::{ConditionId, MeshStore, PolygonId};

/// A boundary condition together with its handle.
#[derive(Debug, Clone, Copy)]
pub struct ConditionRef<'a> {
    id: ConditionId,
    condition: &'a BoundaryCondition,
}

impl<'a> ConditionRef<'a> {
    pub fn id(&self) -> ConditionId {
        self.id
    }

    pub fn condition(&self) -> &'a BoundaryCondition {
        self.condition
    }
}

impl Deref for ConditionRef<'_> {
    type Target = BoundaryCondition;

    fn deref(&self) -> &BoundaryCondition {
        self.condition
    }
}

#[derive(Debug, Clone, Copy)]
enum Slot {
    Fluid,
    Thermal,
}

impl MeshStore {
    // ── Conditions ─────────────────────────────────────────────────────────

    pub fn add_condition(&mut self, condition: BoundaryCondition) -> ConditionId {
        let id = self.conditions.insert(condition);
        debug!(?id, "boundary condition added");
        id
    }

    pub fn condition(&self, id: ConditionId) -> Option<&BoundaryCondition> {
        self.conditions.get(id)
    }

    pub fn condition_ref(&self, id: ConditionId) -> Option<ConditionRef<'_>> {
        self.conditions
            .get(id)
            .map(|condition| ConditionRef { id, condition })
    }

    /// Change a condition's type. Every polygon using it is notified.
    pub fn set_condition_type(&mut self, id: ConditionId, kind: BoundaryConditionType) -> bool {
        let changed = self
            .conditions
            .get_mut(id)
            .map(|c| c.set_kind(kind))
            .unwrap_or(false);
        if changed {
            self.notify(id.into());
        }
        changed
    }

    pub fn set_condition_values(&mut self, id: ConditionId, values: &[f64]) -> bool {
        let changed = self
            .conditions
            .get_mut(id)
            .map(|c| c.set_values(values))
            .unwrap_or(false);
        if changed {
            self.notify(id.into());
        } else {
            trace!(?id, count = values.len(), "condition values not applied");
        }
        changed
    }

    pub fn copy_condition(&mut self, source: ConditionId, target: ConditionId) -> bool {
        let Some(value) = self.conditions.get(source).cloned() else {
            return false;
        };
        let changed = self
            .conditions
            .get_mut(target)
            .map(|c| c.assign(&value))
            .unwrap_or(false);
        if changed {
            self.notify(target.into());
        }
        changed
    }

    pub fn clone_condition(&mut self, source: ConditionId) -> Option<ConditionId> {
        let value = self.conditions.get(source)?.clone();
        Some(self.add_condition(value))
    }

    // ── Per-polygon table ──────────────────────────────────────────────────

    pub fn boundary_conditions(&self, polygon: PolygonId) -> Option<&BoundaryConditionTable> {
        self.polygons.get(polygon).map(|p| p.conditions())
    }

    /// Fluid condition of a 1-based edge position, `None` if out of range.
    pub fn fluid_condition(&self, polygon: PolygonId, edge: usize) -> Option<ConditionRef<'_>> {
        let id = self.boundary_conditions(polygon)?.fluid(edge)?;
        self.condition_ref(id)
    }

    pub fn thermal_condition(&self, polygon: PolygonId, edge: usize) -> Option<ConditionRef<'_>> {
        let id = self.boundary_conditions(polygon)?.thermal(edge)?;
        self.condition_ref(id)
    }

    /// Passive-scalar condition, `None` past the highest index written for
    /// that edge position.
    pub fn other_condition(&self, polygon: PolygonId, edge: usize, scalar: usize) -> Option<ConditionRef<'_>> {
        let id = self.boundary_conditions(polygon)?.other(edge, scalar)?;
        self.condition_ref(id)
    }

    pub fn set_fluid_condition(&mut self, polygon: PolygonId, edge: usize, condition: ConditionId) -> bool {
        self.write_slot(polygon, edge, condition, Slot::Fluid)
    }

    pub fn set_thermal_condition(&mut self, polygon: PolygonId, edge: usize, condition: ConditionId) -> bool {
        self.write_slot(polygon, edge, condition, Slot::Thermal)
    }

    fn write_slot(&mut self, polygon: PolygonId, edge: usize, condition: ConditionId, slot: Slot) -> bool {
        if !self.conditions.contains_key(condition) {
            trace!(?condition, "unknown condition");
            return false;
        }
        let Some(p) = self.polygons.get_mut(polygon) else {
            return false;
        };
        let write = match slot {
            Slot::Fluid => p.conditions_mut().write_fluid(edge, condition),
            Slot::Thermal => p.conditions_mut().write_thermal(edge, condition),
        };
        self.finish_write(polygon, condition, write, Vec::new())
    }

    /// Assign a passive-scalar condition. Lower scalar indices that were
    /// never written are filled with default conditions.
    pub fn set_other_condition(
        &mut self,
        polygon: PolygonId,
        edge: usize,
        scalar: usize,
        condition: ConditionId,
    ) -> bool {
        if !self.conditions.contains_key(condition) {
            trace!(?condition, "unknown condition");
            return false;
        }
        let Some(p) = self.polygons.get_mut(polygon) else {
            return false;
        };
        let conditions = &mut self.conditions;
        let mut backfilled = Vec::new();
        let write = p.conditions_mut().write_other(edge, scalar, condition, || {
            let id = conditions.insert(BoundaryCondition::default());
            backfilled.push(id);
            id
        });
        self.finish_write(polygon, condition, write, backfilled)
    }

    fn finish_write(
        &mut self,
        polygon: PolygonId,
        condition: ConditionId,
        write: SlotWrite,
        backfilled: Vec<ConditionId>,
    ) -> bool {
        let SlotWrite::Written { previous } = write else {
            trace!(?polygon, "boundary condition slot unchanged");
            return false;
        };
        for id in backfilled.into_iter().chain([condition]) {
            self.link(id.into(), polygon.into());
        }
        if let Some(previous) = previous {
            let still_used = self
                .boundary_conditions(polygon)
                .is_some_and(|t| t.references(previous));
            if !still_used {
                self.unlink(previous.into(), polygon.into());
                self.release([EntityKey::Condition(previous)]);
            }
        }
        self.notify(polygon.into());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observe::listener;
    use crate::topology::store::{EdgeId, VertexId};
    use crate::topology::vertex::Vertex;
    use std::cell::Cell;
    use std::rc::Rc;

    fn triangle_polygon(store: &mut MeshStore) -> PolygonId {
        let vertices: Vec<VertexId> = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]
            .iter()
            .map(|p| store.add_vertex(Vertex::at((*p).into())))
            .collect();
        let edges: Vec<EdgeId> = (0..3)
            .map(|i| {
                let e = store.add_edge(vertices[i], vertices[(i + 1) % 3]).unwrap();
                store.set_id(e, i as i32 + 1);
                e
            })
            .collect();
        store.add_polygon(&edges, &vertices).unwrap()
    }

    fn counter(store: &mut MeshStore, key: impl Into<EntityKey>) -> Rc<Cell<usize>> {
        let count = Rc::new(Cell::new(0));
        let sink = count.clone();
        store.register(key, listener(move |_, _| sink.set(sink.get() + 1)));
        count
    }

    #[test]
    fn test_fresh_slots_hold_defaults() {
        let mut store = MeshStore::new();
        let p = triangle_polygon(&mut store);
        for edge in 1..=3 {
            assert!(store.fluid_condition(p, edge).unwrap().is_default());
            assert!(store.thermal_condition(p, edge).unwrap().is_default());
            assert!(store.other_condition(p, edge, 0).is_none());
        }
        assert!(store.fluid_condition(p, 0).is_none());
        assert!(store.fluid_condition(p, 4).is_none());
    }

    #[test]
    fn test_slot_writes_notify_once() {
        let mut store = MeshStore::new();
        let p = triangle_polygon(&mut store);
        let count = counter(&mut store, p);
        let wall = store.add_condition(BoundaryCondition::new(BoundaryConditionType::Wall));

        assert!(store.set_fluid_condition(p, 2, wall));
        assert!(!store.set_fluid_condition(p, 2, wall));
        assert!(!store.set_fluid_condition(p, 4, wall));
        assert_eq!(count.get(), 1);
        assert_eq!(store.fluid_condition(p, 2).map(|c| c.id()), Some(wall));
    }

    #[test]
    fn test_unknown_condition_is_rejected() {
        let mut store = MeshStore::new();
        let p = triangle_polygon(&mut store);
        let gone = store.add_condition(BoundaryCondition::default());
        store.conditions.remove(gone);
        let count = counter(&mut store, p);

        assert!(!store.set_thermal_condition(p, 1, gone));
        assert!(!store.set_other_condition(p, 1, 0, gone));
        assert!(store.other_condition(p, 1, 0).is_none());
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn test_condition_edits_reach_polygon() {
        let mut store = MeshStore::new();
        let p = triangle_polygon(&mut store);
        let fluid = store.fluid_condition(p, 1).unwrap().id();
        let count = counter(&mut store, p);

        assert!(store.set_condition_type(fluid, BoundaryConditionType::Flux));
        assert!(store.set_condition_values(fluid, &[2.5]));
        assert!(!store.set_condition_values(fluid, &[2.5, 1.0]));
        assert_eq!(count.get(), 2);
        assert_eq!(store.fluid_condition(p, 1).unwrap().values(), &[2.5]);
    }

    #[test]
    fn test_replaced_condition_stops_notifying() {
        let mut store = MeshStore::new();
        let p = triangle_polygon(&mut store);
        let old = store.thermal_condition(p, 3).unwrap().id();
        let new = store.add_condition(BoundaryCondition::new(BoundaryConditionType::Insulated));
        assert!(store.set_thermal_condition(p, 3, new));

        let count = counter(&mut store, p);
        store.set_condition_type(old, BoundaryConditionType::Wall);
        assert_eq!(count.get(), 0);
        store.set_condition_type(new, BoundaryConditionType::Wall);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_replaced_condition_is_freed() {
        let mut store = MeshStore::new();
        let p = triangle_polygon(&mut store);
        let conditions = store.counts().3;

        for _ in 0..20 {
            let fresh = store.add_condition(BoundaryCondition::new(BoundaryConditionType::Wall));
            assert!(store.set_fluid_condition(p, 1, fresh));
        }
        assert_eq!(store.counts().3, conditions);

        let watched = store.fluid_condition(p, 1).unwrap().id();
        let count = counter(&mut store, watched);
        let fresh = store.add_condition(BoundaryCondition::default());
        assert!(store.set_fluid_condition(p, 1, fresh));
        assert!(store.condition(watched).is_some());
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn test_shared_condition_stays_wired() {
        let mut store = MeshStore::new();
        let p = triangle_polygon(&mut store);
        let flux = store.add_condition(BoundaryCondition::new(BoundaryConditionType::Flux));
        store.set_fluid_condition(p, 1, flux);
        store.set_fluid_condition(p, 2, flux);
        let replacement = store.add_condition(BoundaryCondition::default());
        store.set_fluid_condition(p, 1, replacement);

        let count = counter(&mut store, p);
        store.set_condition_values(flux, &[1.0]);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_other_condition_backfill() {
        let mut store = MeshStore::new();
        let p = triangle_polygon(&mut store);
        let flux = store.add_condition(BoundaryCondition::new(BoundaryConditionType::Flux));

        assert!(store.set_other_condition(p, 2, 1, flux));
        assert_eq!(store.other_condition(p, 2, 1).map(|c| c.kind()), Some(BoundaryConditionType::Flux));
        assert!(store.other_condition(p, 2, 0).unwrap().is_default());
        assert!(store.other_condition(p, 2, 2).is_none());
        assert!(store.other_condition(p, 1, 0).is_none());

        // A backfilled default is wired like any other slot.
        let filler = store.other_condition(p, 2, 0).unwrap().id();
        let count = counter(&mut store, p);
        store.set_condition_type(filler, BoundaryConditionType::Outflow);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_copy_and_clone_condition() {
        let mut store = MeshStore::new();
        let source = store.add_condition(
            BoundaryCondition::with_values(BoundaryConditionType::DirichletVelocity, vec![1.0, 2.0, 3.0]).unwrap(),
        );
        let target = store.add_condition(BoundaryCondition::default());
        assert!(store.copy_condition(source, target));
        assert!(!store.copy_condition(source, target));
        assert_eq!(store.condition(source), store.condition(target));

        let clone = store.clone_condition(source).unwrap();
        store.set_condition_values(source, &[0.0, 0.0, 0.0]);
        assert_eq!(store.condition(clone).unwrap().values(), &[1.0, 2.0, 3.0]);
    }
}
