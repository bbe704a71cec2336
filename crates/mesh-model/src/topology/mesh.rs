use std::collections::HashSet;
use std::hash::Hash;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace};

use crate::entity::{EntityInfo, EntityKey, DEFAULT_ID};
use crate::observe::Subscribers;

use super::copy::Remap;
use super::polygon::MeshCategory;
use super::store::{EdgeId, MeshId, MeshStore, PolygonId, VertexId};

/// A set of polygons. Edges and vertices are reached through them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mesh {
    pub info: EntityInfo,
    polygons: Vec<PolygonId>,
    #[serde(skip)]
    pub(crate) subscribers: Subscribers,
}

impl Mesh {
    fn empty() -> Self {
        Self {
            info: EntityInfo::labelled("Mesh", DEFAULT_ID),
            polygons: Vec::new(),
            subscribers: Subscribers::default(),
        }
    }

    pub fn polygons(&self) -> &[PolygonId] {
        &self.polygons
    }

    pub fn contains(&self, polygon: PolygonId) -> bool {
        self.polygons.contains(&polygon)
    }
}

/// First occurrence of each item, in order.
fn dedup<T: Copy + Eq + Hash>(items: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut seen = HashSet::new();
    items.into_iter().filter(|item| seen.insert(*item)).collect()
}

fn next_id(ids: impl Iterator<Item = i32>) -> i32 {
    ids.max().map_or(DEFAULT_ID, |max| max.saturating_add(1))
}

// ─── Store Operations ───────────────────────────────────────────────────────

impl MeshStore {
    pub fn mesh(&self, id: MeshId) -> Option<&Mesh> {
        self.meshes.get(id)
    }

    pub fn mesh_keys(&self) -> impl Iterator<Item = MeshId> + '_ {
        self.meshes.keys()
    }

    pub fn new_mesh(&mut self) -> MeshId {
        let id = self.meshes.insert(Mesh::empty());
        debug!(?id, "mesh added");
        id
    }

    pub fn mesh_polygons(&self, mesh: MeshId) -> &[PolygonId] {
        self.meshes.get(mesh).map(Mesh::polygons).unwrap_or(&[])
    }

    /// Add a polygon. Rejects unknown handles and polygons already present.
    pub fn mesh_add_polygon(&mut self, mesh: MeshId, polygon: PolygonId) -> bool {
        if !self.polygons.contains_key(polygon) {
            trace!(?polygon, "unknown polygon");
            return false;
        }
        match self.meshes.get_mut(mesh) {
            Some(m) if !m.contains(polygon) => m.polygons.push(polygon),
            _ => return false,
        }
        self.link(polygon.into(), mesh.into());
        self.notify(mesh.into());
        true
    }

    /// Remove a polygon from the mesh. The polygon, its edges and its
    /// vertices stay in the store.
    pub fn mesh_remove_polygon(&mut self, mesh: MeshId, polygon: PolygonId) -> bool {
        self.mesh_remove_polygons(mesh, &[polygon])
    }

    /// Remove several polygons with a single notification.
    #[instrument(skip(self, polygons), fields(count = polygons.len()))]
    pub fn mesh_remove_polygons(&mut self, mesh: MeshId, polygons: &[PolygonId]) -> bool {
        let Some(m) = self.meshes.get_mut(mesh) else {
            return false;
        };
        let before = m.polygons.len();
        m.polygons.retain(|p| !polygons.contains(p));
        if m.polygons.len() == before {
            return false;
        }
        for &polygon in polygons {
            self.unlink(polygon.into(), mesh.into());
        }
        self.notify(mesh.into());
        true
    }

    /// Replace the polygon list. Unknown handles and repeats are skipped.
    #[instrument(skip(self, polygons), fields(count = polygons.len()))]
    pub fn mesh_set_polygons(&mut self, mesh: MeshId, polygons: &[PolygonId]) -> bool {
        let next = dedup(
            polygons
                .iter()
                .copied()
                .filter(|p| self.polygons.contains_key(*p)),
        );
        let previous = match self.meshes.get_mut(mesh) {
            Some(m) if m.polygons != next => std::mem::replace(&mut m.polygons, next.clone()),
            _ => return false,
        };
        for polygon in previous {
            self.unlink(polygon.into(), mesh.into());
        }
        for polygon in next {
            self.link(polygon.into(), mesh.into());
        }
        self.notify(mesh.into());
        true
    }

    /// Every edge of every polygon in the mesh, each listed once.
    pub fn mesh_edges(&self, mesh: MeshId) -> Vec<EdgeId> {
        dedup(
            self.mesh_polygons(mesh)
                .iter()
                .flat_map(|p| self.polygon_edges(*p).iter().copied()),
        )
    }

    /// Every vertex of every polygon in the mesh, each listed once.
    pub fn mesh_vertices(&self, mesh: MeshId) -> Vec<VertexId> {
        dedup(
            self.mesh_polygons(mesh)
                .iter()
                .flat_map(|p| self.polygon_vertices(*p).iter().copied()),
        )
    }

    pub fn mesh_entities_from_category(&self, mesh: MeshId, category: MeshCategory) -> Vec<EntityKey> {
        match category {
            MeshCategory::Edges => self.mesh_edges(mesh).into_iter().map(EntityKey::Edge).collect(),
            MeshCategory::Vertices => self
                .mesh_vertices(mesh)
                .into_iter()
                .map(EntityKey::Vertex)
                .collect(),
        }
    }

    pub fn edges_from_vertex(&self, mesh: MeshId, vertex: VertexId) -> Vec<EdgeId> {
        self.mesh_edges(mesh)
            .into_iter()
            .filter(|e| self.edges.get(*e).is_some_and(|edge| edge.uses(vertex)))
            .collect()
    }

    pub fn polygons_from_vertex(&self, mesh: MeshId, vertex: VertexId) -> Vec<PolygonId> {
        self.mesh_polygons(mesh)
            .iter()
            .copied()
            .filter(|p| self.polygon_vertices(*p).contains(&vertex))
            .collect()
    }

    pub fn polygons_from_edge(&self, mesh: MeshId, edge: EdgeId) -> Vec<PolygonId> {
        self.mesh_polygons(mesh)
            .iter()
            .copied()
            .filter(|p| self.polygon_edges(*p).contains(&edge))
            .collect()
    }

    /// The first edge of the mesh joining `a` and `b`, in either direction.
    pub fn edge_from_vertices(&self, mesh: MeshId, a: VertexId, b: VertexId) -> Option<EdgeId> {
        if a == b {
            return None;
        }
        self.mesh_edges(mesh).into_iter().find(|e| {
            self.edges
                .get(*e)
                .is_some_and(|edge| edge.other_end(a) == Some(b))
        })
    }

    /// Polygons of the mesh built only from vertices in `vertices`.
    pub fn polygons_from_vertices(&self, mesh: MeshId, vertices: &[VertexId]) -> Vec<PolygonId> {
        let allowed: HashSet<VertexId> = vertices.iter().copied().collect();
        self.mesh_polygons(mesh)
            .iter()
            .copied()
            .filter(|p| {
                let own = self.polygon_vertices(*p);
                !own.is_empty() && own.iter().all(|v| allowed.contains(v))
            })
            .collect()
    }

    /// One more than the highest numeric polygon id in the mesh, or 1.
    pub fn next_polygon_id(&self, mesh: MeshId) -> i32 {
        next_id(
            self.mesh_polygons(mesh)
                .iter()
                .filter_map(|p| self.polygons.get(*p))
                .map(|p| p.info.id),
        )
    }

    pub fn next_edge_id(&self, mesh: MeshId) -> i32 {
        next_id(
            self.mesh_edges(mesh)
                .iter()
                .filter_map(|e| self.edges.get(*e))
                .map(|e| e.info.id),
        )
    }

    pub fn next_vertex_id(&self, mesh: MeshId) -> i32 {
        next_id(
            self.mesh_vertices(mesh)
                .iter()
                .filter_map(|v| self.vertices.get(*v))
                .map(|v| v.info.id),
        )
    }

    fn duplicate_mesh_polygons(&mut self, source: MeshId) -> Option<Vec<PolygonId>> {
        let polygons = self.meshes.get(source)?.polygons.clone();
        let mut remap = Remap::default();
        Some(
            polygons
                .into_iter()
                .filter_map(|p| self.clone_polygon_with(p, &mut remap))
                .collect(),
        )
    }

    /// Deep copy of a mesh. Edges and vertices shared between its polygons
    /// are shared between the copied polygons too.
    #[instrument(skip(self))]
    pub fn clone_mesh(&mut self, source: MeshId) -> Option<MeshId> {
        let info = self.meshes.get(source)?.info.clone();
        let polygons = self.duplicate_mesh_polygons(source)?;
        let id = self.new_mesh();
        if let Some(m) = self.meshes.get_mut(id) {
            m.info = info;
            m.polygons = polygons.clone();
        }
        for polygon in polygons {
            self.link(polygon.into(), id.into());
        }
        Some(id)
    }

    /// Replace `target` with a deep copy of `source`. Polygons it held
    /// before are freed unless something else refers to them.
    #[instrument(skip(self))]
    pub fn copy_mesh(&mut self, source: MeshId, target: MeshId) -> bool {
        if source == target || !self.meshes.contains_key(target) {
            return false;
        }
        let Some(info) = self.meshes.get(source).map(|m| m.info.clone()) else {
            return false;
        };
        let Some(polygons) = self.duplicate_mesh_polygons(source) else {
            return false;
        };
        let previous = match self.meshes.get_mut(target) {
            Some(m) => {
                m.info = info;
                std::mem::replace(&mut m.polygons, polygons.clone())
            }
            None => return false,
        };
        for &polygon in &previous {
            self.unlink(polygon.into(), target.into());
        }
        for polygon in polygons {
            self.link(polygon.into(), target.into());
        }
        self.release(previous.into_iter().map(EntityKey::Polygon));
        self.notify(target.into());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::vertex::Vertex;

    /// Two triangles sharing the edge between vertices 2 and 3.
    fn two_triangles(store: &mut MeshStore) -> (MeshId, [PolygonId; 2], Vec<VertexId>, Vec<EdgeId>) {
        let v: Vec<VertexId> = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0]]
            .iter()
            .enumerate()
            .map(|(i, p)| store.add_vertex(Vertex::at((*p).into()).with_id(i as i32 + 1)))
            .collect();
        let pairs = [(0, 1), (1, 2), (2, 0), (1, 3), (3, 2)];
        let e: Vec<EdgeId> = pairs
            .iter()
            .enumerate()
            .map(|(i, (a, b))| {
                let id = store.add_edge(v[*a], v[*b]).unwrap();
                store.set_id(id, i as i32 + 1);
                id
            })
            .collect();
        let first = store.add_polygon(&[e[0], e[1], e[2]], &[v[0], v[1], v[2]]).unwrap();
        let second = store.add_polygon(&[e[3], e[4], e[1]], &[v[1], v[3], v[2]]).unwrap();
        store.set_id(second, 2);
        let mesh = store.new_mesh();
        store.mesh_add_polygon(mesh, first);
        store.mesh_add_polygon(mesh, second);
        (mesh, [first, second], v, e)
    }

    #[test]
    fn test_reachable_sets_are_deduplicated() {
        let mut store = MeshStore::new();
        let (mesh, _, v, e) = two_triangles(&mut store);
        assert_eq!(store.mesh_edges(mesh).len(), 5);
        assert_eq!(store.mesh_vertices(mesh).len(), 4);
        assert_eq!(store.mesh_edges(mesh).iter().filter(|x| **x == e[1]).count(), 1);
        assert_eq!(
            store.mesh_entities_from_category(mesh, MeshCategory::Vertices).len(),
            v.len()
        );
    }

    #[test]
    fn test_add_and_remove() {
        let mut store = MeshStore::new();
        let (mesh, [first, second], _, e) = two_triangles(&mut store);
        assert!(!store.mesh_add_polygon(mesh, first));

        assert!(store.mesh_remove_polygon(mesh, first));
        assert!(!store.mesh_remove_polygon(mesh, first));
        assert_eq!(store.mesh_polygons(mesh), &[second]);
        assert_eq!(store.mesh_edges(mesh), vec![e[3], e[4], e[1]]);
        assert_eq!(store.mesh_vertices(mesh).len(), 3);
        // Removal from the mesh does not delete the polygon.
        assert!(store.polygon(first).is_some());
    }

    #[test]
    fn test_set_polygons_skips_repeats() {
        let mut store = MeshStore::new();
        let (mesh, [first, second], _, _) = two_triangles(&mut store);
        assert!(store.mesh_set_polygons(mesh, &[second, second]));
        assert_eq!(store.mesh_polygons(mesh), &[second]);
        assert!(!store.mesh_set_polygons(mesh, &[second]));
        assert!(store.mesh_set_polygons(mesh, &[first, second]));
        assert!(store.dependents(second).contains(&EntityKey::Mesh(mesh)));
    }

    #[test]
    fn test_lookup_queries() {
        let mut store = MeshStore::new();
        let (mesh, [first, second], v, e) = two_triangles(&mut store);

        assert_eq!(store.edges_from_vertex(mesh, v[1]), vec![e[0], e[1], e[3]]);
        assert_eq!(store.polygons_from_vertex(mesh, v[0]), vec![first]);
        assert_eq!(store.polygons_from_edge(mesh, e[1]), vec![first, second]);
        assert_eq!(store.edge_from_vertices(mesh, v[2], v[1]), Some(e[1]));
        assert_eq!(store.edge_from_vertices(mesh, v[0], v[3]), None);
        assert_eq!(store.edge_from_vertices(mesh, v[0], v[0]), None);
        assert_eq!(store.polygons_from_vertices(mesh, &[v[1], v[2], v[3]]), vec![second]);
        assert!(store.polygons_from_vertices(mesh, &[v[0], v[1]]).is_empty());
    }

    #[test]
    fn test_next_ids() {
        let mut store = MeshStore::new();
        let empty = store.new_mesh();
        assert_eq!(store.next_polygon_id(empty), 1);
        assert_eq!(store.next_edge_id(empty), 1);
        assert_eq!(store.next_vertex_id(empty), 1);

        let (mesh, _, _, _) = two_triangles(&mut store);
        assert_eq!(store.next_polygon_id(mesh), 3);
        assert_eq!(store.next_edge_id(mesh), 6);
        assert_eq!(store.next_vertex_id(mesh), 5);

        assert_eq!(next_id([3, i32::MAX].into_iter()), i32::MAX);
    }

    #[test]
    fn test_clone_preserves_sharing() {
        let mut store = MeshStore::new();
        let (mesh, _, _, e) = two_triangles(&mut store);
        let copy = store.clone_mesh(mesh).unwrap();

        assert_eq!(store.mesh_ref(mesh), store.mesh_ref(copy));
        assert_eq!(store.mesh_edges(copy).len(), 5);
        assert_eq!(store.mesh_vertices(copy).len(), 4);
        assert!(!store.mesh_edges(copy).contains(&e[1]));

        let [a, b] = [store.mesh_polygons(copy)[0], store.mesh_polygons(copy)[1]];
        let shared = store.polygon_edges(a)[1];
        assert_eq!(store.polygon_edges(b)[2], shared);
    }

    #[test]
    fn test_copy_mesh() {
        let mut store = MeshStore::new();
        let (mesh, _, v, _) = two_triangles(&mut store);
        let target = store.new_mesh();
        assert!(store.copy_mesh(mesh, target));
        assert_eq!(store.mesh_ref(mesh), store.mesh_ref(target));

        store.set_vertex_x(v[0], -1.0);
        assert_ne!(store.mesh_ref(mesh), store.mesh_ref(target));
    }

    #[test]
    fn test_copy_mesh_frees_replaced_polygons() {
        let mut store = MeshStore::new();
        let (mesh, _, _, _) = two_triangles(&mut store);
        let target = store.new_mesh();
        assert!(store.copy_mesh(mesh, target));
        let after_first = store.counts();

        for _ in 0..5 {
            assert!(store.copy_mesh(mesh, target));
        }
        assert_eq!(store.counts(), after_first);
        assert_eq!(store.counts(), (8, 10, 4, 24, 2));
        assert!(store.audit().is_valid());
    }
}
