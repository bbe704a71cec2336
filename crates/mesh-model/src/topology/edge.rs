use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use tracing::{debug, instrument, trace};

use crate::entity::{EntityInfo, DEFAULT_ID};
use crate::error::MeshError;
use crate::geometry::point::Point3d;
use crate::observe::Subscribers;

use super::store::{EdgeId, MeshStore, VertexId};
use super::vertex::Vertex;

/// Length reported by an edge that has no valid vertex pair.
pub const INVALID_LENGTH: f64 = -1.0;

/// Length of the segment between two locations.
///
/// Distances too large for an `f64` saturate at `f64::MAX`, and an
/// undefined distance reads as [`INVALID_LENGTH`], so a cached length is
/// always a finite number.
pub(crate) fn span_length(start: &Point3d, end: &Point3d) -> f64 {
    let length = start.distance_to(end);
    if length.is_nan() {
        INVALID_LENGTH
    } else {
        length.min(f64::MAX)
    }
}

/// Which end of an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeEnd {
    Start,
    End,
}

impl EdgeEnd {
    fn index(self) -> usize {
        match self {
            EdgeEnd::Start => 0,
            EdgeEnd::End => 1,
        }
    }
}

/// A straight segment between two distinct vertices.
///
/// The length is cached and kept equal to the distance between the two
/// vertices by the store's change propagation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub info: EntityInfo,
    ends: Option<[VertexId; 2]>,
    length: f64,
    #[serde(skip)]
    pub(crate) subscribers: Subscribers,
}

impl Edge {
    fn between(start: VertexId, end: VertexId) -> Self {
        Self {
            info: EntityInfo::labelled("Edge", DEFAULT_ID),
            ends: Some([start, end]),
            length: INVALID_LENGTH,
            subscribers: Subscribers::default(),
        }
    }

    /// Both vertex handles, or `None` once the edge has lost a vertex.
    pub fn ends(&self) -> Option<[VertexId; 2]> {
        self.ends
    }

    pub fn start(&self) -> Option<VertexId> {
        self.ends.map(|[s, _]| s)
    }

    pub fn end(&self) -> Option<VertexId> {
        self.ends.map(|[_, e]| e)
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn is_valid(&self) -> bool {
        self.ends.is_some()
    }

    pub fn uses(&self, vertex: VertexId) -> bool {
        self.ends.is_some_and(|ends| ends.contains(&vertex))
    }

    /// The end opposite `vertex`.
    pub fn other_end(&self, vertex: VertexId) -> Option<VertexId> {
        match self.ends? {
            [s, e] if s == vertex => Some(e),
            [s, e] if e == vertex => Some(s),
            _ => None,
        }
    }

    pub(crate) fn refresh_length(&mut self, vertices: &SlotMap<VertexId, Vertex>) -> bool {
        let length = self
            .ends
            .and_then(|[s, e]| {
                let s = vertices.get(s)?.location();
                let e = vertices.get(e)?.location();
                Some(span_length(&s, &e))
            })
            .unwrap_or(INVALID_LENGTH);
        let changed = length != self.length;
        self.length = length;
        changed
    }

    /// Drop both ends, returning the ones held before.
    pub(crate) fn invalidate(&mut self) -> Option<[VertexId; 2]> {
        self.length = INVALID_LENGTH;
        self.ends.take()
    }

    pub(crate) fn set_ends(&mut self, ends: Option<[VertexId; 2]>) {
        self.ends = ends;
    }
}

// ─── Store Operations ───────────────────────────────────────────────────────

impl MeshStore {
    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id)
    }

    pub fn edge_keys(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.edges.keys()
    }

    /// Create an edge between two distinct vertices of this store.
    #[instrument(skip(self))]
    pub fn add_edge(&mut self, start: VertexId, end: VertexId) -> Result<EdgeId, MeshError> {
        for id in [start, end] {
            if !self.vertices.contains_key(id) {
                return Err(MeshError::VertexNotFound { id });
            }
        }
        if start == end {
            return Err(MeshError::DegenerateEdge { vertex: start });
        }

        let mut edge = Edge::between(start, end);
        edge.refresh_length(&self.vertices);
        let length = edge.length;
        let id = self.edges.insert(edge);
        self.link(start.into(), id.into());
        self.link(end.into(), id.into());
        debug!(?id, length, "edge added");
        Ok(id)
    }

    /// Create an edge from a list that must hold exactly two vertices.
    pub fn add_edge_from(&mut self, vertices: &[VertexId]) -> Result<EdgeId, MeshError> {
        match vertices {
            [start, end] => self.add_edge(*start, *end),
            _ => Err(MeshError::WrongVertexCount {
                count: vertices.len(),
            }),
        }
    }

    /// Cached length, [`INVALID_LENGTH`] for an edge without vertices.
    pub fn edge_length(&self, id: EdgeId) -> Option<f64> {
        self.edges.get(id).map(Edge::length)
    }

    pub fn edge_vertices(&self, id: EdgeId) -> Option<[VertexId; 2]> {
        self.edges.get(id)?.ends()
    }

    /// Numeric ids of the two ends, `[-1, -1]` if the edge is invalid or
    /// unknown.
    pub fn edge_vertex_ids(&self, id: EdgeId) -> [i32; 2] {
        let ids = self.edge_vertices(id).and_then(|[s, e]| {
            Some([self.vertices.get(s)?.info.id, self.vertices.get(e)?.info.id])
        });
        ids.unwrap_or([-1, -1])
    }

    fn end_location(&self, id: EdgeId, end: EdgeEnd) -> Option<Point3d> {
        let vertex = self.edge_vertices(id)?[end.index()];
        self.vertex_location(vertex)
    }

    pub fn edge_start_location(&self, id: EdgeId) -> Option<Point3d> {
        self.end_location(id, EdgeEnd::Start)
    }

    pub fn edge_end_location(&self, id: EdgeId) -> Option<Point3d> {
        self.end_location(id, EdgeEnd::End)
    }

    /// Point one end of an edge at a different vertex.
    ///
    /// Rejected if the edge is invalid, the vertex is unknown, or the edge
    /// would join a vertex to itself.
    #[instrument(skip(self))]
    pub fn set_edge_vertex(&mut self, edge: EdgeId, end: EdgeEnd, vertex: VertexId) -> bool {
        let Some(mut ends) = self.edge_vertices(edge) else {
            trace!("edge has no vertex pair");
            return false;
        };
        if !self.vertices.contains_key(vertex) {
            trace!("unknown vertex");
            return false;
        }
        let slot = end.index();
        if ends[slot] == vertex {
            return false;
        }
        if ends[1 - slot] == vertex {
            trace!("would make a degenerate edge");
            return false;
        }
        let previous = std::mem::replace(&mut ends[slot], vertex);
        self.replace_end(edge, ends, previous, vertex);
        true
    }

    /// Replace whichever end carries the same numeric id as `vertex`.
    ///
    /// Succeeds, and notifies, even when the replacement is already that
    /// end: the caller asks for the edge to be re-read from its vertex.
    #[instrument(skip(self))]
    pub fn rebind_vertex(&mut self, edge: EdgeId, vertex: VertexId) -> bool {
        let Some(mut ends) = self.edge_vertices(edge) else {
            return false;
        };
        let Some(target_id) = self.vertices.get(vertex).map(|v| v.info.id) else {
            return false;
        };
        let Some(slot) = ends
            .iter()
            .position(|v| self.vertices.get(*v).is_some_and(|v| v.info.id == target_id))
        else {
            trace!(target_id, "no end with matching id");
            return false;
        };
        if ends[1 - slot] == vertex {
            return false;
        }
        let previous = std::mem::replace(&mut ends[slot], vertex);
        self.replace_end(edge, ends, previous, vertex);
        true
    }

    fn replace_end(&mut self, edge: EdgeId, ends: [VertexId; 2], previous: VertexId, vertex: VertexId) {
        if previous != vertex {
            self.unlink(previous.into(), edge.into());
            self.link(vertex.into(), edge.into());
        }
        if let Some(e) = self.edges.get_mut(edge) {
            e.set_ends(Some(ends));
            e.refresh_length(&self.vertices);
        }
        self.notify(edge.into());
    }

    /// Copy identity and vertex pair of `source` onto `target`. The two
    /// edges then share their vertices.
    pub fn copy_edge(&mut self, source: EdgeId, target: EdgeId) -> bool {
        if source == target {
            return false;
        }
        let Some(value) = self.edges.get(source).cloned() else {
            return false;
        };
        let Some(old_ends) = self.edges.get(target).map(Edge::ends) else {
            return false;
        };
        for v in old_ends.into_iter().flatten() {
            self.unlink(v.into(), target.into());
        }
        for v in value.ends.into_iter().flatten() {
            self.link(v.into(), target.into());
        }
        if let Some(e) = self.edges.get_mut(target) {
            e.info = value.info;
            e.set_ends(value.ends);
            e.refresh_length(&self.vertices);
        }
        self.notify(target.into());
        true
    }

    /// New edge equal to `source`, over the same vertices.
    pub fn clone_edge(&mut self, source: EdgeId) -> Option<EdgeId> {
        let value = self.edges.get(source)?.clone();
        let id = self.edges.insert(value);
        for v in self.edge_vertices(id).into_iter().flatten() {
            self.link(v.into(), id.into());
        }
        Some(id)
    }
}
