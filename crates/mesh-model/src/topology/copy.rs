use std::collections::HashMap;

use crate::conditions::BoundaryConditionTable;
use crate::entity::EntityInfo;

use super::polygon::PolygonProperties;
use super::store::{ConditionId, EdgeId, MeshStore, PolygonId, VertexId};

/// Old-to-new handle maps for one deep copy. Reusing a `Remap` across
/// several polygons keeps parts they share shared in the copy.
#[derive(Debug, Default)]
pub(crate) struct Remap {
    vertices: HashMap<VertexId, VertexId>,
    edges: HashMap<EdgeId, EdgeId>,
    conditions: HashMap<ConditionId, ConditionId>,
}

/// Freshly duplicated contents of a polygon, not yet owned by one.
pub(crate) struct PolygonParts {
    pub info: EntityInfo,
    pub properties: PolygonProperties,
    pub edges: Vec<EdgeId>,
    pub vertices: Vec<VertexId>,
    pub conditions: BoundaryConditionTable,
}

impl MeshStore {
    fn duplicate_vertex(&mut self, remap: &mut Remap, id: VertexId) -> VertexId {
        if let Some(&copy) = remap.vertices.get(&id) {
            return copy;
        }
        // Callers only pass handles read from live entities.
        let copy = match self.vertices.get(id).cloned() {
            Some(vertex) => self.vertices.insert(vertex),
            None => id,
        };
        remap.vertices.insert(id, copy);
        copy
    }

    fn duplicate_edge(&mut self, remap: &mut Remap, id: EdgeId) -> EdgeId {
        if let Some(&copy) = remap.edges.get(&id) {
            return copy;
        }
        let Some(mut edge) = self.edges.get(id).cloned() else {
            return id;
        };
        let ends = edge
            .ends()
            .map(|[s, e]| [self.duplicate_vertex(remap, s), self.duplicate_vertex(remap, e)]);
        edge.set_ends(ends);
        edge.refresh_length(&self.vertices);
        let copy = self.edges.insert(edge);
        for v in ends.into_iter().flatten() {
            self.link(v.into(), copy.into());
        }
        remap.edges.insert(id, copy);
        copy
    }

    fn duplicate_condition(&mut self, remap: &mut Remap, id: ConditionId) -> ConditionId {
        if let Some(&copy) = remap.conditions.get(&id) {
            return copy;
        }
        let copy = match self.conditions.get(id).cloned() {
            Some(condition) => self.conditions.insert(condition),
            None => id,
        };
        remap.conditions.insert(id, copy);
        copy
    }

    /// Duplicate every vertex, edge and condition reachable from a polygon.
    pub(crate) fn duplicate_polygon(&mut self, source: PolygonId, remap: &mut Remap) -> Option<PolygonParts> {
        let polygon = self.polygons.get(source)?.clone();

        let vertices = polygon
            .vertices()
            .iter()
            .map(|v| self.duplicate_vertex(remap, *v))
            .collect();
        let edges = polygon
            .edges()
            .iter()
            .map(|e| self.duplicate_edge(remap, *e))
            .collect();

        let table = polygon.conditions();
        for id in table.condition_ids().collect::<Vec<_>>() {
            self.duplicate_condition(remap, id);
        }
        let conditions = table.map_ids(|id| remap.conditions.get(&id).copied().unwrap_or(id));

        Some(PolygonParts {
            info: polygon.info.clone(),
            properties: polygon.properties().clone(),
            edges,
            vertices,
            conditions,
        })
    }

    pub(crate) fn clone_polygon_with(&mut self, source: PolygonId, remap: &mut Remap) -> Option<PolygonId> {
        let parts = self.duplicate_polygon(source, remap)?;
        let id = self.new_polygon();
        if let Some(p) = self.polygons.get_mut(id) {
            p.adopt(parts);
        }
        for key in self.polygon_sources(id) {
            self.link(key, id.into());
        }
        Some(id)
    }
}
