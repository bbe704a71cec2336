use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace};

use crate::entity::{EntityInfo, EntityKey, DEFAULT_ID};
use crate::geometry::point::Point3d;
use crate::observe::Subscribers;

use super::store::{EdgeId, MeshStore, VertexId};

/// A point in 3-D space. Referenced, never owned, by edges and polygons.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vertex {
    pub info: EntityInfo,
    location: Point3d,
    #[serde(skip)]
    pub(crate) subscribers: Subscribers,
}

impl Vertex {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self::at(Point3d::new(x, y, z))
    }

    pub fn at(location: Point3d) -> Self {
        Self {
            info: EntityInfo::labelled("Vertex", DEFAULT_ID),
            location,
            subscribers: Subscribers::default(),
        }
    }

    /// Same vertex with a different numeric id; the default name follows it.
    pub fn with_id(mut self, id: i32) -> Self {
        self.info = EntityInfo {
            description: self.info.description,
            ..EntityInfo::labelled("Vertex", id)
        };
        self
    }

    pub fn location(&self) -> Point3d {
        self.location
    }

    pub(crate) fn set_location(&mut self, location: Point3d) -> bool {
        if self.location == location {
            return false;
        }
        self.location = location;
        true
    }

    /// Copy every value field of `other`.
    pub(crate) fn assign(&mut self, other: &Vertex) -> bool {
        let changed = self.info != other.info || self.location != other.location;
        self.info = other.info.clone();
        self.location = other.location;
        changed
    }
}

impl Default for Vertex {
    fn default() -> Self {
        Self::at(Point3d::ORIGIN)
    }
}

impl PartialEq for Vertex {
    fn eq(&self, other: &Self) -> bool {
        self.info == other.info && self.location == other.location
    }
}

impl Hash for Vertex {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.info.hash(state);
        self.location.hash(state);
    }
}

// ─── Store Operations ───────────────────────────────────────────────────────

impl MeshStore {
    pub fn vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.vertices.get(id)
    }

    pub fn vertex_keys(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.vertices.keys()
    }

    #[instrument(skip(self, vertex), fields(id = vertex.info.id))]
    pub fn add_vertex(&mut self, vertex: Vertex) -> VertexId {
        let id = self.vertices.insert(vertex);
        debug!(?id, "vertex added");
        id
    }

    pub fn vertex_location(&self, id: VertexId) -> Option<Point3d> {
        self.vertices.get(id).map(Vertex::location)
    }

    /// Move a vertex. Every edge using it is recomputed before listeners
    /// run.
    pub fn set_vertex_location(&mut self, id: VertexId, location: Point3d) -> bool {
        let changed = self
            .vertices
            .get_mut(id)
            .map(|v| v.set_location(location))
            .unwrap_or(false);
        if changed {
            self.notify(id.into());
        } else {
            trace!(?id, "vertex location unchanged");
        }
        changed
    }

    fn set_vertex_axis(&mut self, id: VertexId, axis: usize, value: f64) -> bool {
        match self.vertex_location(id) {
            Some(location) => self.set_vertex_location(id, location.with_axis(axis, value)),
            None => false,
        }
    }

    pub fn set_vertex_x(&mut self, id: VertexId, x: f64) -> bool {
        self.set_vertex_axis(id, 0, x)
    }

    pub fn set_vertex_y(&mut self, id: VertexId, y: f64) -> bool {
        self.set_vertex_axis(id, 1, y)
    }

    pub fn set_vertex_z(&mut self, id: VertexId, z: f64) -> bool {
        self.set_vertex_axis(id, 2, z)
    }

    /// Delete a vertex. Edges that used it lose both ends and fall back to
    /// the invalid length; polygons drop it from their vertex lists.
    #[instrument(skip(self))]
    pub fn remove_vertex(&mut self, id: VertexId) -> bool {
        let Some(vertex) = self.vertices.remove(id) else {
            return false;
        };
        let dependents: Vec<EdgeId> = vertex
            .subscribers
            .dependents()
            .iter()
            .filter_map(|key| match key {
                EntityKey::Edge(edge) => Some(*edge),
                _ => None,
            })
            .collect();

        for &edge_id in &dependents {
            let Some(edge) = self.edges.get_mut(edge_id) else {
                continue;
            };
            let former = edge.invalidate();
            for other in former.into_iter().flatten().filter(|v| *v != id) {
                self.unlink(other.into(), edge_id.into());
            }
        }
        let mut listing = Vec::new();
        for (polygon_id, polygon) in self.polygons.iter_mut() {
            if polygon.contains_vertex(id) {
                polygon.forget_vertex(id);
                listing.push(EntityKey::Polygon(polygon_id));
            }
        }

        debug!(edges = dependents.len(), polygons = listing.len(), "vertex removed");
        let origins: Vec<EntityKey> = dependents
            .into_iter()
            .map(EntityKey::Edge)
            .chain(listing)
            .collect();
        let order = self.propagate(&origins);
        self.deliver(&order);
        true
    }

    /// Copy the value fields of `source` onto `target`.
    pub fn copy_vertex(&mut self, source: VertexId, target: VertexId) -> bool {
        let Some(value) = self.vertices.get(source).cloned() else {
            return false;
        };
        let changed = self
            .vertices
            .get_mut(target)
            .map(|v| v.assign(&value))
            .unwrap_or(false);
        if changed {
            self.notify(target.into());
        }
        changed
    }

    pub fn clone_vertex(&mut self, source: VertexId) -> Option<VertexId> {
        let value = self.vertices.get(source)?.clone();
        Some(self.add_vertex(value))
    }
}
