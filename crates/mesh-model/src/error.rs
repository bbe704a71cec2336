use crate::topology::store::{EdgeId, VertexId};

/// Errors raised while constructing edges and polygons.
///
/// Mutations after construction never fail loudly; they report whether
/// anything changed instead.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MeshError {
    #[error("vertex not found: {id:?}")]
    VertexNotFound { id: VertexId },

    #[error("edge not found: {id:?}")]
    EdgeNotFound { id: EdgeId },

    #[error("an edge needs exactly 2 vertices, got {count}")]
    WrongVertexCount { count: usize },

    #[error("edge would join vertex {vertex:?} to itself")]
    DegenerateEdge { vertex: VertexId },

    #[error("edge {edge:?} has no valid vertex pair")]
    InvalidEdge { edge: EdgeId },

    #[error("edge {edge:?} uses vertex {vertex:?}, which is not part of the polygon")]
    ForeignVertex { edge: EdgeId, vertex: VertexId },

    #[error("edge identifier {id} is used more than once in the polygon")]
    DuplicateEdgeId { id: i32 },

    #[error("a polygon needs at least one edge")]
    EmptyPolygon,

    #[error("edge at position {position} does not join its neighbouring vertices")]
    OpenLoop { position: usize },
}
