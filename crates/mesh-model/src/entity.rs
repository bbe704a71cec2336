//! Identity shared by every entity, plus the closed set of entity variants.

use serde::{Deserialize, Serialize};

use crate::conditions::BoundaryCondition;
use crate::topology::edge::Edge;
use crate::topology::mesh::Mesh;
use crate::topology::polygon::Polygon;
use crate::topology::store::{ConditionId, EdgeId, MeshId, PolygonId, VertexId};
use crate::topology::vertex::Vertex;

/// Identifier used when none is assigned.
pub const DEFAULT_ID: i32 = 1;

/// Numeric id, name and description carried by vertices, edges, polygons
/// and meshes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityInfo {
    pub id: i32,
    pub name: String,
    pub description: String,
}

impl EntityInfo {
    /// Info whose name is `label` followed by the id, e.g. "Vertex 1".
    pub fn labelled(label: &str, id: i32) -> Self {
        Self {
            id,
            name: format!("{label} {id}"),
            description: String::new(),
        }
    }

    pub fn set_id(&mut self, id: i32) -> bool {
        if self.id == id {
            return false;
        }
        self.id = id;
        true
    }

    pub fn set_name(&mut self, name: &str) -> bool {
        if self.name == name {
            return false;
        }
        self.name = name.to_string();
        true
    }

    pub fn set_description(&mut self, description: &str) -> bool {
        if self.description == description {
            return false;
        }
        self.description = description.to_string();
        true
    }
}

/// Handle to any entity held by a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKey {
    Vertex(VertexId),
    Edge(EdgeId),
    Polygon(PolygonId),
    Condition(ConditionId),
    Mesh(MeshId),
}

impl EntityKey {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityKey::Vertex(_) => EntityKind::Vertex,
            EntityKey::Edge(_) => EntityKind::Edge,
            EntityKey::Polygon(_) => EntityKind::Polygon,
            EntityKey::Condition(_) => EntityKind::Condition,
            EntityKey::Mesh(_) => EntityKind::Mesh,
        }
    }
}

impl From<VertexId> for EntityKey {
    fn from(id: VertexId) -> Self {
        EntityKey::Vertex(id)
    }
}

impl From<EdgeId> for EntityKey {
    fn from(id: EdgeId) -> Self {
        EntityKey::Edge(id)
    }
}

impl From<PolygonId> for EntityKey {
    fn from(id: PolygonId) -> Self {
        EntityKey::Polygon(id)
    }
}

impl From<ConditionId> for EntityKey {
    fn from(id: ConditionId) -> Self {
        EntityKey::Condition(id)
    }
}

impl From<MeshId> for EntityKey {
    fn from(id: MeshId) -> Self {
        EntityKey::Mesh(id)
    }
}

/// Discriminant of an entity without its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Vertex,
    Edge,
    Polygon,
    Condition,
    Mesh,
}

/// A borrowed entity, for `match`-based dispatch on its concrete variant.
#[derive(Debug, Clone, Copy)]
pub enum EntityRef<'a> {
    Vertex(&'a Vertex),
    Edge(&'a Edge),
    Polygon(&'a Polygon),
    Condition(&'a BoundaryCondition),
    Mesh(&'a Mesh),
}

impl<'a> EntityRef<'a> {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityRef::Vertex(_) => EntityKind::Vertex,
            EntityRef::Edge(_) => EntityKind::Edge,
            EntityRef::Polygon(_) => EntityKind::Polygon,
            EntityRef::Condition(_) => EntityKind::Condition,
            EntityRef::Mesh(_) => EntityKind::Mesh,
        }
    }

    /// Identity header, if the variant carries one. Boundary conditions don't.
    pub fn info(&self) -> Option<&'a EntityInfo> {
        match self {
            EntityRef::Vertex(v) => Some(&v.info),
            EntityRef::Edge(e) => Some(&e.info),
            EntityRef::Polygon(p) => Some(&p.info),
            EntityRef::Mesh(m) => Some(&m.info),
            EntityRef::Condition(_) => None,
        }
    }
}
