use std::collections::HashSet;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SlotMap};
use tracing::{debug, trace};

use crate::conditions::BoundaryCondition;
use crate::config::ModelConfig;
use crate::entity::{EntityInfo, EntityKey, EntityRef};
use crate::observe::{Subscribers, UpdateListener};

use super::edge::Edge;
use super::mesh::Mesh;
use super::polygon::Polygon;
use super::vertex::Vertex;

// ─── Entity Keys ─────────────────────────────────────────────────────────────

new_key_type! {
    pub struct VertexId;
    pub struct EdgeId;
    pub struct PolygonId;
    pub struct ConditionId;
    pub struct MeshId;
}

// ─── Entity Store ────────────────────────────────────────────────────────────

/// Arena holding every entity of a mesh model.
///
/// Entities refer to each other by key, never by pointer. A key is the
/// identity of an entity: two handles are "the same instance" exactly when
/// their keys are equal. The numeric id inside [`EntityInfo`] is an ordinary
/// value field.
///
/// All mutation goes through store methods so that change notifications
/// can be propagated: a vertex edit recomputes every edge subscribed to the
/// vertex, then reaches the polygons holding those edges and the meshes
/// holding those polygons.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct MeshStore {
    #[serde(default)]
    pub(crate) config: ModelConfig,
    pub(crate) vertices: SlotMap<VertexId, Vertex>,
    pub(crate) edges: SlotMap<EdgeId, Edge>,
    pub(crate) polygons: SlotMap<PolygonId, Polygon>,
    pub(crate) conditions: SlotMap<ConditionId, BoundaryCondition>,
    pub(crate) meshes: SlotMap<MeshId, Mesh>,
}

impl MeshStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ModelConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Count entities: (vertices, edges, polygons, conditions, meshes).
    pub fn counts(&self) -> (usize, usize, usize, usize, usize) {
        (
            self.vertices.len(),
            self.edges.len(),
            self.polygons.len(),
            self.conditions.len(),
            self.meshes.len(),
        )
    }

    pub fn contains(&self, key: impl Into<EntityKey>) -> bool {
        self.entity(key).is_some()
    }

    /// Borrow an entity as its concrete variant.
    pub fn entity(&self, key: impl Into<EntityKey>) -> Option<EntityRef<'_>> {
        match key.into() {
            EntityKey::Vertex(id) => self.vertices.get(id).map(EntityRef::Vertex),
            EntityKey::Edge(id) => self.edges.get(id).map(EntityRef::Edge),
            EntityKey::Polygon(id) => self.polygons.get(id).map(EntityRef::Polygon),
            EntityKey::Condition(id) => self.conditions.get(id).map(EntityRef::Condition),
            EntityKey::Mesh(id) => self.meshes.get(id).map(EntityRef::Mesh),
        }
    }

    /// Every entity in the store, grouped by kind.
    pub fn entities(&self) -> impl Iterator<Item = (EntityKey, EntityRef<'_>)> + '_ {
        let vertices = self
            .vertices
            .iter()
            .map(|(k, v)| (EntityKey::Vertex(k), EntityRef::Vertex(v)));
        let edges = self
            .edges
            .iter()
            .map(|(k, e)| (EntityKey::Edge(k), EntityRef::Edge(e)));
        let polygons = self
            .polygons
            .iter()
            .map(|(k, p)| (EntityKey::Polygon(k), EntityRef::Polygon(p)));
        let conditions = self
            .conditions
            .iter()
            .map(|(k, c)| (EntityKey::Condition(k), EntityRef::Condition(c)));
        let meshes = self
            .meshes
            .iter()
            .map(|(k, m)| (EntityKey::Mesh(k), EntityRef::Mesh(m)));
        vertices
            .chain(edges)
            .chain(polygons)
            .chain(conditions)
            .chain(meshes)
    }

    // ── Identity fields ────────────────────────────────────────────────────

    pub fn info(&self, key: impl Into<EntityKey>) -> Option<&EntityInfo> {
        self.entity(key)?.info()
    }

    fn info_mut(&mut self, key: EntityKey) -> Option<&mut EntityInfo> {
        match key {
            EntityKey::Vertex(id) => self.vertices.get_mut(id).map(|v| &mut v.info),
            EntityKey::Edge(id) => self.edges.get_mut(id).map(|e| &mut e.info),
            EntityKey::Polygon(id) => self.polygons.get_mut(id).map(|p| &mut p.info),
            EntityKey::Mesh(id) => self.meshes.get_mut(id).map(|m| &mut m.info),
            EntityKey::Condition(_) => None,
        }
    }

    fn update_info(&mut self, key: EntityKey, apply: impl FnOnce(&mut EntityInfo) -> bool) -> bool {
        let changed = self.info_mut(key).map(apply).unwrap_or(false);
        if changed {
            self.notify(key);
        }
        changed
    }

    pub fn set_id(&mut self, key: impl Into<EntityKey>, id: i32) -> bool {
        self.update_info(key.into(), |info| info.set_id(id))
    }

    pub fn set_name(&mut self, key: impl Into<EntityKey>, name: &str) -> bool {
        self.update_info(key.into(), |info| info.set_name(name))
    }

    pub fn set_description(&mut self, key: impl Into<EntityKey>, description: &str) -> bool {
        self.update_info(key.into(), |info| info.set_description(description))
    }

    // ── Subscriptions ──────────────────────────────────────────────────────

    pub(crate) fn subscribers(&self, key: EntityKey) -> Option<&Subscribers> {
        match key {
            EntityKey::Vertex(id) => self.vertices.get(id).map(|v| &v.subscribers),
            EntityKey::Edge(id) => self.edges.get(id).map(|e| &e.subscribers),
            EntityKey::Polygon(id) => self.polygons.get(id).map(|p| &p.subscribers),
            EntityKey::Condition(id) => self.conditions.get(id).map(|c| &c.subscribers),
            EntityKey::Mesh(id) => self.meshes.get(id).map(|m| &m.subscribers),
        }
    }

    pub(crate) fn subscribers_mut(&mut self, key: EntityKey) -> Option<&mut Subscribers> {
        match key {
            EntityKey::Vertex(id) => self.vertices.get_mut(id).map(|v| &mut v.subscribers),
            EntityKey::Edge(id) => self.edges.get_mut(id).map(|e| &mut e.subscribers),
            EntityKey::Polygon(id) => self.polygons.get_mut(id).map(|p| &mut p.subscribers),
            EntityKey::Condition(id) => self.conditions.get_mut(id).map(|c| &mut c.subscribers),
            EntityKey::Mesh(id) => self.meshes.get_mut(id).map(|m| &mut m.subscribers),
        }
    }

    /// Make `dependent` react to changes of `source`.
    pub(crate) fn link(&mut self, source: EntityKey, dependent: EntityKey) {
        if let Some(subs) = self.subscribers_mut(source) {
            subs.subscribe(dependent);
        }
    }

    pub(crate) fn unlink(&mut self, source: EntityKey, dependent: EntityKey) {
        if let Some(subs) = self.subscribers_mut(source) {
            subs.unsubscribe(dependent);
        }
    }

    /// Register an external listener on an entity. Returns false if the
    /// entity does not exist or the listener is already registered there.
    pub fn register(&mut self, key: impl Into<EntityKey>, listener: Rc<dyn UpdateListener>) -> bool {
        self.subscribers_mut(key.into())
            .map(|s| s.register(listener))
            .unwrap_or(false)
    }

    pub fn unregister(&mut self, key: impl Into<EntityKey>, listener: &Rc<dyn UpdateListener>) -> bool {
        self.subscribers_mut(key.into())
            .map(|s| s.unregister(listener))
            .unwrap_or(false)
    }

    /// Entities that will be refreshed and notified after `key` changes.
    pub fn dependents(&self, key: impl Into<EntityKey>) -> Vec<EntityKey> {
        self.subscribers(key.into())
            .map(|s| s.dependents().to_vec())
            .unwrap_or_default()
    }

    /// Recreate all internal subscriptions from the entity graph. External
    /// listeners are untouched.
    ///
    /// Needed after deserialising, since subscriber lists are not stored.
    pub fn rebuild_subscriptions(&mut self) {
        for (_, v) in self.vertices.iter_mut() {
            v.subscribers.clear_dependents();
        }
        for (_, e) in self.edges.iter_mut() {
            e.subscribers.clear_dependents();
        }
        for (_, p) in self.polygons.iter_mut() {
            p.subscribers.clear_dependents();
        }
        for (_, c) in self.conditions.iter_mut() {
            c.subscribers.clear_dependents();
        }
        for (_, m) in self.meshes.iter_mut() {
            m.subscribers.clear_dependents();
        }

        let mut links: Vec<(EntityKey, EntityKey)> = Vec::new();
        for (edge_id, edge) in &self.edges {
            for vertex in edge.ends().into_iter().flatten() {
                links.push((vertex.into(), edge_id.into()));
            }
        }
        for (polygon_id, polygon) in &self.polygons {
            for source in polygon.sources() {
                links.push((source, polygon_id.into()));
            }
        }
        for (mesh_id, mesh) in &self.meshes {
            for &polygon in mesh.polygons() {
                links.push((polygon.into(), mesh_id.into()));
            }
        }
        for (source, dependent) in links {
            self.link(source, dependent);
        }
    }

    // ── Reclaiming ─────────────────────────────────────────────────────────

    fn is_unobserved(&self, key: EntityKey) -> bool {
        self.subscribers(key)
            .is_some_and(|s| s.dependents().is_empty() && s.listener_count() == 0)
    }

    /// Free entities left behind by a replacement once nothing refers to
    /// them: no dependent entity, no external listener and, for vertices,
    /// no polygon vertex list. Freeing a polygon or an edge may orphan the
    /// parts it held; those are checked in turn. Meshes are never freed.
    pub(crate) fn release(&mut self, candidates: impl IntoIterator<Item = EntityKey>) {
        let mut pending: Vec<EntityKey> = candidates.into_iter().collect();
        let mut freed = 0usize;
        while let Some(key) = pending.pop() {
            if !self.is_unobserved(key) {
                continue;
            }
            match key {
                EntityKey::Vertex(id) => {
                    if self.polygons.values().any(|p| p.contains_vertex(id)) {
                        continue;
                    }
                    self.vertices.remove(id);
                }
                EntityKey::Edge(id) => {
                    let Some(edge) = self.edges.remove(id) else {
                        continue;
                    };
                    for vertex in edge.ends().into_iter().flatten() {
                        self.unlink(vertex.into(), key);
                        pending.push(vertex.into());
                    }
                }
                EntityKey::Condition(id) => {
                    self.conditions.remove(id);
                }
                EntityKey::Polygon(id) => {
                    let Some(polygon) = self.polygons.remove(id) else {
                        continue;
                    };
                    for source in polygon.sources() {
                        self.unlink(source, key);
                        pending.push(source);
                    }
                    pending.extend(polygon.vertices().iter().map(|v| EntityKey::Vertex(*v)));
                }
                EntityKey::Mesh(_) => continue,
            }
            freed += 1;
        }
        if freed > 0 {
            debug!(freed, "unreferenced entities released");
        }
    }

    // ── Notification ───────────────────────────────────────────────────────

    /// Propagate a change of `origin` through its dependents, then call the
    /// external listeners of every entity reached.
    pub(crate) fn notify(&mut self, origin: EntityKey) {
        let order = self.propagate(&[origin]);
        self.deliver(&order);
    }

    /// Depth-first walk from the changed entities. Each entity is visited
    /// once; derived state is refreshed on the way down. Returns the
    /// visiting order.
    pub(crate) fn propagate(&mut self, origins: &[EntityKey]) -> Vec<EntityKey> {
        let mut order = Vec::new();
        let mut seen = HashSet::new();
        let mut stack: Vec<(EntityKey, bool)> = origins.iter().rev().map(|k| (*k, true)).collect();

        while let Some((key, is_origin)) = stack.pop() {
            if !seen.insert(key) {
                continue;
            }
            if !is_origin {
                self.refresh(key);
            }
            order.push(key);
            let dependents = self
                .subscribers(key)
                .map(|s| s.dependents().to_vec())
                .unwrap_or_default();
            for dependent in dependents.into_iter().rev() {
                if !seen.contains(&dependent) {
                    stack.push((dependent, false));
                }
            }
        }

        trace!(origins = ?origins, reached = order.len(), "change propagated");
        order
    }

    /// Recompute state derived from other entities.
    fn refresh(&mut self, key: EntityKey) {
        if let EntityKey::Edge(id) = key {
            if let Some(edge) = self.edges.get_mut(id) {
                edge.refresh_length(&self.vertices);
            }
        }
    }

    pub(crate) fn deliver(&self, order: &[EntityKey]) {
        for &key in order {
            let listeners = self
                .subscribers(key)
                .map(|s| s.listeners())
                .unwrap_or_default();
            for listener in listeners {
                listener.update(self, key);
            }
        }
    }
}

impl Clone for MeshStore {
    /// Independent copy with the same keys. Internal wiring is rebuilt;
    /// external listeners are not carried over.
    fn clone(&self) -> Self {
        let mut store = Self {
            config: self.config.clone(),
            vertices: self.vertices.clone(),
            edges: self.edges.clone(),
            polygons: self.polygons.clone(),
            conditions: self.conditions.clone(),
            meshes: self.meshes.clone(),
        };
        store.rebuild_subscriptions();
        store
    }
}
