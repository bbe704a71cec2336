use tracing::{info, instrument};

use crate::topology::edge::{span_length, INVALID_LENGTH};
use crate::topology::store::{ConditionId, EdgeId, MeshId, MeshStore, PolygonId, VertexId};

/// Result of checking every cross-reference held by a store.
#[derive(Debug, Clone, Default)]
pub struct StoreAudit {
    pub edges_consistent: bool,
    pub polygons_consistent: bool,
    pub meshes_consistent: bool,
    pub errors: Vec<ConsistencyError>,
}

impl StoreAudit {
    pub fn is_valid(&self) -> bool {
        self.edges_consistent && self.polygons_consistent && self.meshes_consistent
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConsistencyError {
    MissingVertex {
        edge: EdgeId,
        vertex: VertexId,
    },
    DegenerateEdge {
        edge: EdgeId,
    },
    StaleLength {
        edge: EdgeId,
        cached: f64,
        actual: f64,
    },
    MissingEdge {
        polygon: PolygonId,
        edge: EdgeId,
    },
    MissingPolygonVertex {
        polygon: PolygonId,
        vertex: VertexId,
    },
    MissingCondition {
        polygon: PolygonId,
        condition: ConditionId,
    },
    TableMismatch {
        polygon: PolygonId,
        edges: usize,
        entries: usize,
    },
    MissingPolygon {
        mesh: MeshId,
        polygon: PolygonId,
    },
}

impl MeshStore {
    /// Check that every handle resolves and every cached length is current.
    #[instrument(skip(self))]
    pub fn audit(&self) -> StoreAudit {
        let mut errors = Vec::new();

        for (id, edge) in &self.edges {
            let Some([s, e]) = edge.ends() else {
                if edge.length() != INVALID_LENGTH {
                    errors.push(ConsistencyError::StaleLength {
                        edge: id,
                        cached: edge.length(),
                        actual: INVALID_LENGTH,
                    });
                }
                continue;
            };
            if s == e {
                errors.push(ConsistencyError::DegenerateEdge { edge: id });
            }
            let mut resolved = Vec::with_capacity(2);
            for vertex in [s, e] {
                match self.vertices.get(vertex) {
                    Some(v) => resolved.push(v.location()),
                    None => errors.push(ConsistencyError::MissingVertex { edge: id, vertex }),
                }
            }
            if let [a, b] = resolved[..] {
                let actual = span_length(&a, &b);
                if !self.config.lengths_match(edge.length(), actual) {
                    errors.push(ConsistencyError::StaleLength {
                        edge: id,
                        cached: edge.length(),
                        actual,
                    });
                }
            }
        }
        let edges_consistent = errors.is_empty();

        let before = errors.len();
        for (id, polygon) in &self.polygons {
            for &edge in polygon.edges() {
                if !self.edges.contains_key(edge) {
                    errors.push(ConsistencyError::MissingEdge { polygon: id, edge });
                }
            }
            for &vertex in polygon.vertices() {
                if !self.vertices.contains_key(vertex) {
                    errors.push(ConsistencyError::MissingPolygonVertex { polygon: id, vertex });
                }
            }
            for condition in polygon.conditions().condition_ids() {
                if !self.conditions.contains_key(condition) {
                    errors.push(ConsistencyError::MissingCondition { polygon: id, condition });
                }
            }
            let (edges, entries) = (polygon.edges().len(), polygon.conditions().len());
            if edges != entries {
                errors.push(ConsistencyError::TableMismatch {
                    polygon: id,
                    edges,
                    entries,
                });
            }
        }
        let polygons_consistent = errors.len() == before;

        let before = errors.len();
        for (id, mesh) in &self.meshes {
            for &polygon in mesh.polygons() {
                if !self.polygons.contains_key(polygon) {
                    errors.push(ConsistencyError::MissingPolygon { mesh: id, polygon });
                }
            }
        }
        let meshes_consistent = errors.len() == before;

        let audit = StoreAudit {
            edges_consistent,
            polygons_consistent,
            meshes_consistent,
            errors,
        };
        info!(
            valid = audit.is_valid(),
            edges_consistent,
            polygons_consistent,
            meshes_consistent,
            error_count = audit.errors.len(),
            "store audit complete"
        );
        audit
    }
}
