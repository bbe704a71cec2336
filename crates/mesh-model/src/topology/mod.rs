//! Entities and their store.
//!
//! [`MeshStore`] owns every vertex, edge, polygon, boundary condition and
//! mesh. The per-kind files add the operations for that kind as further
//! `impl MeshStore` blocks.

pub mod boundary;
pub(crate) mod copy;
pub mod edge;
pub mod mesh;
pub mod polygon;
pub mod store;
pub mod vertex;
pub mod view;

pub use boundary::ConditionRef;
pub use edge::{Edge, EdgeEnd, INVALID_LENGTH};
pub use mesh::Mesh;
pub use polygon::{MeshCategory, Polygon, PolygonProperties};
pub use store::{ConditionId, EdgeId, MeshId, MeshStore, PolygonId, VertexId};
pub use vertex::Vertex;
pub use view::{EdgeRef, MeshRef, PolygonRef, VertexRef};
