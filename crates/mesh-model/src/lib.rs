//! Mesh data model with change propagation.
//!
//! Vertices, edges, polygons, boundary conditions and meshes live in a
//! [`MeshStore`] and refer to each other by key. Editing an entity through
//! the store recomputes whatever depends on it (an edge's length after a
//! vertex moves) and then calls the listeners registered on every entity
//! the change reached.

pub mod audit;
pub mod conditions;
pub mod config;
pub mod entity;
pub mod error;
pub mod geometry;
pub mod observe;
pub mod topology;

pub use audit::{ConsistencyError, StoreAudit};
pub use conditions::{BoundaryCondition, BoundaryConditionTable, BoundaryConditionType, EdgeConditions};
pub use config::ModelConfig;
pub use entity::{EntityInfo, EntityKey, EntityKind, EntityRef};
pub use error::MeshError;
pub use geometry::Point3d;
pub use observe::{listener, UpdateListener};
pub use topology::{
    ConditionId, ConditionRef, Edge, EdgeEnd, EdgeId, EdgeRef, Mesh, MeshCategory, MeshId, MeshRef, MeshStore,
    Polygon, PolygonId, PolygonProperties, PolygonRef, Vertex, VertexId, VertexRef, INVALID_LENGTH,
};
