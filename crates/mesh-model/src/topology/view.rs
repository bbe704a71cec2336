//! Borrowed views that compare and hash entities by value.
//!
//! Handles compare by identity. A view compares what the entity means:
//! an edge by the vertices it joins, a polygon by its edges, a mesh by its
//! polygons. Views from different stores can be compared with each other.

use std::hash::{Hash, Hasher};

use super::edge::Edge;
use super::mesh::Mesh;
use super::polygon::Polygon;
use super::store::{EdgeId, MeshId, MeshStore, PolygonId, VertexId};
use super::vertex::Vertex;

#[derive(Debug, Clone, Copy)]
pub struct VertexRef<'a> {
    pub id: VertexId,
    pub vertex: &'a Vertex,
}

impl PartialEq for VertexRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.vertex == other.vertex
    }
}

impl Eq for VertexRef<'_> {}

impl Hash for VertexRef<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.vertex.hash(state);
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EdgeRef<'a> {
    pub id: EdgeId,
    pub edge: &'a Edge,
    store: &'a MeshStore,
}

impl<'a> EdgeRef<'a> {
    /// The two end vertices, if the edge still has them.
    pub fn vertices(&self) -> Option<[&'a Vertex; 2]> {
        let [s, e] = self.edge.ends()?;
        Some([self.store.vertex(s)?, self.store.vertex(e)?])
    }
}

impl PartialEq for EdgeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.vertices() == other.vertices()
    }
}

impl Eq for EdgeRef<'_> {}

impl Hash for EdgeRef<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.vertices().hash(state);
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PolygonRef<'a> {
    pub id: PolygonId,
    pub polygon: &'a Polygon,
    store: &'a MeshStore,
}

impl<'a> PolygonRef<'a> {
    pub fn edges(&self) -> impl Iterator<Item = Option<EdgeRef<'a>>> + 'a {
        let store = self.store;
        self.polygon.edges().iter().map(move |e| store.edge_ref(*e))
    }
}

impl PartialEq for PolygonRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.edges().eq(other.edges())
    }
}

impl Eq for PolygonRef<'_> {}

impl Hash for PolygonRef<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.polygon.edges().len().hash(state);
        for edge in self.edges() {
            edge.hash(state);
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MeshRef<'a> {
    pub id: MeshId,
    pub mesh: &'a Mesh,
    store: &'a MeshStore,
}

impl<'a> MeshRef<'a> {
    pub fn polygons(&self) -> impl Iterator<Item = Option<PolygonRef<'a>>> + 'a {
        let store = self.store;
        self.mesh.polygons().iter().map(move |p| store.polygon_ref(*p))
    }
}

impl PartialEq for MeshRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.polygons().eq(other.polygons())
    }
}

impl Eq for MeshRef<'_> {}

impl Hash for MeshRef<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.mesh.polygons().len().hash(state);
        for polygon in self.polygons() {
            polygon.hash(state);
        }
    }
}

impl MeshStore {
    pub fn vertex_ref(&self, id: VertexId) -> Option<VertexRef<'_>> {
        self.vertices.get(id).map(|vertex| VertexRef { id, vertex })
    }

    pub fn edge_ref(&self, id: EdgeId) -> Option<EdgeRef<'_>> {
        self.edges.get(id).map(|edge| EdgeRef {
            id,
            edge,
            store: self,
        })
    }

    pub fn polygon_ref(&self, id: PolygonId) -> Option<PolygonRef<'_>> {
        self.polygons.get(id).map(|polygon| PolygonRef {
            id,
            polygon,
            store: self,
        })
    }

    pub fn mesh_ref(&self, id: MeshId) -> Option<MeshRef<'_>> {
        self.meshes.get(id).map(|mesh| MeshRef {
            id,
            mesh,
            store: self,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of<T: Hash>(value: &T) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    fn segment(store: &mut MeshStore, a: [f64; 3], b: [f64; 3]) -> EdgeId {
        let a = store.add_vertex(Vertex::at(a.into()));
        let b = store.add_vertex(Vertex::at(b.into()));
        store.add_edge(a, b).unwrap()
    }

    #[test]
    fn test_edges_compare_by_vertices() {
        let mut store = MeshStore::new();
        let first = segment(&mut store, [0.0; 3], [1.0, 0.0, 0.0]);
        let second = segment(&mut store, [0.0; 3], [1.0, 0.0, 0.0]);
        let reversed = segment(&mut store, [1.0, 0.0, 0.0], [0.0; 3]);

        store.set_name(second, "renamed");
        let (a, b) = (store.edge_ref(first).unwrap(), store.edge_ref(second).unwrap());
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
        assert_ne!(a, store.edge_ref(reversed).unwrap());
    }

    #[test]
    fn test_views_across_stores() {
        let mut left = MeshStore::new();
        let mut right = MeshStore::new();
        right.add_vertex(Vertex::default());
        let l = segment(&mut left, [0.0; 3], [0.0, 2.0, 0.0]);
        let r = segment(&mut right, [0.0; 3], [0.0, 2.0, 0.0]);
        assert_eq!(left.edge_ref(l), right.edge_ref(r));
    }

    #[test]
    fn test_invalid_edges_are_equal() {
        let mut store = MeshStore::new();
        let first = segment(&mut store, [0.0; 3], [1.0, 0.0, 0.0]);
        let second = segment(&mut store, [0.0; 3], [3.0, 0.0, 0.0]);
        for e in [first, second] {
            let start = store.edge_vertices(e).unwrap()[0];
            store.remove_vertex(start);
        }
        assert_eq!(store.edge_ref(first), store.edge_ref(second));
    }

    #[test]
    fn test_vertex_ref_equality() {
        let mut store = MeshStore::new();
        let a = store.add_vertex(Vertex::new(1.0, 2.0, 3.0));
        let b = store.add_vertex(Vertex::new(1.0, 2.0, 3.0));
        assert_eq!(store.vertex_ref(a), store.vertex_ref(b));
        assert_eq!(hash_of(&store.vertex_ref(a)), hash_of(&store.vertex_ref(b)));
        store.set_description(b, "moved later");
        assert_ne!(store.vertex_ref(a), store.vertex_ref(b));
    }
}
