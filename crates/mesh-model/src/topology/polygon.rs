use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace};

use crate::conditions::{BoundaryCondition, BoundaryConditionTable};
use crate::config::ModelConfig;
use crate::entity::{EntityInfo, EntityKey, DEFAULT_ID};
use crate::error::MeshError;
use crate::observe::Subscribers;

use super::copy::{PolygonParts, Remap};
use super::store::{EdgeId, MeshStore, PolygonId, VertexId};

/// Material and group assignment of a polygon.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PolygonProperties {
    pub material_id: String,
    pub group: i32,
}

impl PolygonProperties {
    /// Properties checked against `config`. A rejected field falls back to
    /// the configured default.
    pub fn validated(config: &ModelConfig, material_id: &str, group: i32) -> Self {
        let material_id = if config.accepts_material_id(material_id) {
            material_id.to_string()
        } else {
            config.default_material_id.clone()
        };
        let group = if config.accepts_group(group) {
            group
        } else {
            config.default_group
        };
        Self { material_id, group }
    }

    pub fn defaults(config: &ModelConfig) -> Self {
        Self {
            material_id: config.default_material_id.clone(),
            group: config.default_group,
        }
    }
}

impl Default for PolygonProperties {
    fn default() -> Self {
        Self::defaults(&ModelConfig::default())
    }
}

/// The kinds of part a polygon or mesh can be asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MeshCategory {
    Edges,
    Vertices,
}

impl MeshCategory {
    pub fn label(&self) -> &'static str {
        match self {
            MeshCategory::Edges => "Edges",
            MeshCategory::Vertices => "Vertices",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Edges" => Some(MeshCategory::Edges),
            "Vertices" => Some(MeshCategory::Vertices),
            _ => None,
        }
    }
}

/// A face bounded by edges, with boundary conditions per edge position.
///
/// Edges and vertices are shared with sibling polygons; the boundary
/// condition table belongs to this polygon alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Polygon {
    pub info: EntityInfo,
    edges: Vec<EdgeId>,
    vertices: Vec<VertexId>,
    conditions: BoundaryConditionTable,
    properties: PolygonProperties,
    #[serde(skip)]
    pub(crate) subscribers: Subscribers,
}

impl Polygon {
    fn empty(properties: PolygonProperties) -> Self {
        Self {
            info: EntityInfo::labelled("Polygon", DEFAULT_ID),
            edges: Vec::new(),
            vertices: Vec::new(),
            conditions: BoundaryConditionTable::default(),
            properties,
            subscribers: Subscribers::default(),
        }
    }

    pub fn edges(&self) -> &[EdgeId] {
        &self.edges
    }

    pub fn vertices(&self) -> &[VertexId] {
        &self.vertices
    }

    pub fn conditions(&self) -> &BoundaryConditionTable {
        &self.conditions
    }

    pub(crate) fn conditions_mut(&mut self) -> &mut BoundaryConditionTable {
        &mut self.conditions
    }

    pub fn properties(&self) -> &PolygonProperties {
        &self.properties
    }

    pub fn contains_edge(&self, edge: EdgeId) -> bool {
        self.edges.contains(&edge)
    }

    pub fn contains_vertex(&self, vertex: VertexId) -> bool {
        self.vertices.contains(&vertex)
    }

    /// Owned copy of one category of parts.
    pub fn entities(&self, category: MeshCategory) -> Vec<EntityKey> {
        match category {
            MeshCategory::Edges => self.edges.iter().map(|e| EntityKey::Edge(*e)).collect(),
            MeshCategory::Vertices => self.vertices.iter().map(|v| EntityKey::Vertex(*v)).collect(),
        }
    }

    pub(crate) fn forget_vertex(&mut self, vertex: VertexId) {
        self.vertices.retain(|v| *v != vertex);
    }

    /// Entities this polygon listens to: its edges, then its conditions.
    pub(crate) fn sources(&self) -> Vec<EntityKey> {
        self.edges
            .iter()
            .map(|e| EntityKey::Edge(*e))
            .chain(self.conditions.condition_ids().map(EntityKey::Condition))
            .collect()
    }

    pub(crate) fn adopt(&mut self, parts: PolygonParts) {
        self.info = parts.info;
        self.properties = parts.properties;
        self.edges = parts.edges;
        self.vertices = parts.vertices;
        self.conditions = parts.conditions;
    }
}

// ─── Store Operations ───────────────────────────────────────────────────────

impl MeshStore {
    pub fn polygon(&self, id: PolygonId) -> Option<&Polygon> {
        self.polygons.get(id)
    }

    pub fn polygon_keys(&self) -> impl Iterator<Item = PolygonId> + '_ {
        self.polygons.keys()
    }

    /// An empty polygon with default properties.
    pub fn new_polygon(&mut self) -> PolygonId {
        let id = self
            .polygons
            .insert(Polygon::empty(PolygonProperties::defaults(&self.config)));
        debug!(?id, "empty polygon added");
        id
    }

    /// Create a polygon from edges and the vertices they join.
    ///
    /// Every edge must be valid and use only vertices from `vertices`, and
    /// numeric edge ids must be distinct. With
    /// [`ModelConfig::require_closed_loop`] edge `i` must also join vertex
    /// `i` to vertex `i + 1`, wrapping at the end.
    #[instrument(skip(self, edges, vertices), fields(edges = edges.len(), vertices = vertices.len()))]
    pub fn add_polygon(&mut self, edges: &[EdgeId], vertices: &[VertexId]) -> Result<PolygonId, MeshError> {
        self.check_polygon(edges, vertices)?;

        let id = self.new_polygon();
        if let Some(polygon) = self.polygons.get_mut(id) {
            polygon.vertices = vertices.to_vec();
        }
        for &edge in edges {
            self.attach_edge(id, edge);
        }
        debug!(?id, "polygon added");
        Ok(id)
    }

    fn check_polygon(&self, edges: &[EdgeId], vertices: &[VertexId]) -> Result<(), MeshError> {
        if edges.is_empty() {
            return Err(MeshError::EmptyPolygon);
        }
        for &id in vertices {
            if !self.vertices.contains_key(id) {
                return Err(MeshError::VertexNotFound { id });
            }
        }
        let vertex_set: HashSet<VertexId> = vertices.iter().copied().collect();
        let mut edge_ids = HashSet::new();
        for &id in edges {
            let edge = self.edges.get(id).ok_or(MeshError::EdgeNotFound { id })?;
            let ends = edge.ends().ok_or(MeshError::InvalidEdge { edge: id })?;
            if let Some(&vertex) = ends.iter().find(|v| !vertex_set.contains(*v)) {
                return Err(MeshError::ForeignVertex { edge: id, vertex });
            }
            if !edge_ids.insert(edge.info.id) {
                return Err(MeshError::DuplicateEdgeId { id: edge.info.id });
            }
        }

        if self.config.require_closed_loop {
            let n = vertices.len();
            if edges.len() != n {
                return Err(MeshError::OpenLoop {
                    position: edges.len().min(n),
                });
            }
            for (i, &edge) in edges.iter().enumerate() {
                let joined = (vertices[i], vertices[(i + 1) % n]);
                let closes = self
                    .edge_vertices(edge)
                    .is_some_and(|[s, e]| (s, e) == joined || (e, s) == joined);
                if !closes {
                    return Err(MeshError::OpenLoop { position: i });
                }
            }
        }
        Ok(())
    }

    /// Append an edge position: default fluid and thermal conditions, and
    /// the wiring that lets the polygon hear about the edge.
    fn attach_edge(&mut self, polygon: PolygonId, edge: EdgeId) {
        let fluid = self.conditions.insert(BoundaryCondition::default());
        let thermal = self.conditions.insert(BoundaryCondition::default());
        if let Some(p) = self.polygons.get_mut(polygon) {
            p.edges.push(edge);
            p.conditions.push_edge(fluid, thermal);
        }
        self.link(edge.into(), polygon.into());
        self.link(fluid.into(), polygon.into());
        self.link(thermal.into(), polygon.into());
    }

    /// Append an edge without the construction checks. Rejects unknown
    /// handles and edges already in the polygon.
    pub fn polygon_add_edge(&mut self, polygon: PolygonId, edge: EdgeId) -> bool {
        if !self.edges.contains_key(edge) {
            trace!(?edge, "unknown edge");
            return false;
        }
        match self.polygons.get(polygon) {
            Some(p) if !p.contains_edge(edge) => {}
            _ => return false,
        }
        self.attach_edge(polygon, edge);
        self.notify(polygon.into());
        true
    }

    pub fn polygon_add_vertex(&mut self, polygon: PolygonId, vertex: VertexId) -> bool {
        if !self.vertices.contains_key(vertex) {
            trace!(?vertex, "unknown vertex");
            return false;
        }
        match self.polygons.get_mut(polygon) {
            Some(p) if !p.contains_vertex(vertex) => p.vertices.push(vertex),
            _ => return false,
        }
        self.notify(polygon.into());
        true
    }

    pub(crate) fn polygon_sources(&self, polygon: PolygonId) -> Vec<EntityKey> {
        self.polygons.get(polygon).map(Polygon::sources).unwrap_or_default()
    }

    pub fn polygon_edges(&self, polygon: PolygonId) -> &[EdgeId] {
        self.polygons.get(polygon).map(Polygon::edges).unwrap_or(&[])
    }

    pub fn polygon_vertices(&self, polygon: PolygonId) -> &[VertexId] {
        self.polygons.get(polygon).map(Polygon::vertices).unwrap_or(&[])
    }

    /// Owned list of a polygon's edges or vertices. Empty for an unknown
    /// polygon.
    pub fn entities_from_category(&self, polygon: PolygonId, category: MeshCategory) -> Vec<EntityKey> {
        self.polygons
            .get(polygon)
            .map(|p| p.entities(category))
            .unwrap_or_default()
    }

    pub fn polygon_properties(&self, polygon: PolygonId) -> Option<&PolygonProperties> {
        self.polygons.get(polygon).map(Polygon::properties)
    }

    /// Set material and group. Invalid values are replaced by the
    /// configured defaults before comparing with the current ones.
    pub fn set_polygon_properties(&mut self, polygon: PolygonId, material_id: &str, group: i32) -> bool {
        let properties = PolygonProperties::validated(&self.config, material_id, group);
        let changed = match self.polygons.get_mut(polygon) {
            Some(p) if p.properties != properties => {
                p.properties = properties;
                true
            }
            _ => false,
        };
        if changed {
            self.notify(polygon.into());
        }
        changed
    }

    /// Replace `target` with a deep copy of `source`: fresh vertices,
    /// edges and boundary conditions, wired like the originals. Former
    /// parts of `target` that nothing else refers to are freed.
    #[instrument(skip(self))]
    pub fn copy_polygon(&mut self, source: PolygonId, target: PolygonId) -> bool {
        if source == target || !self.polygons.contains_key(target) {
            return false;
        }
        let mut remap = Remap::default();
        let Some(parts) = self.duplicate_polygon(source, &mut remap) else {
            return false;
        };

        let mut replaced = self.polygon_sources(target);
        for &key in &replaced {
            self.unlink(key, target.into());
        }
        if let Some(p) = self.polygons.get_mut(target) {
            replaced.extend(p.entities(MeshCategory::Vertices));
            p.adopt(parts);
        }
        for key in self.polygon_sources(target) {
            self.link(key, target.into());
        }
        self.release(replaced);
        self.notify(target.into());
        true
    }

    /// Deep copy of a polygon as a new entity.
    pub fn clone_polygon(&mut self, source: PolygonId) -> Option<PolygonId> {
        let mut remap = Remap::default();
        self.clone_polygon_with(source, &mut remap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conditions::BoundaryConditionType;
    use crate::topology::vertex::Vertex;

    fn triangle(store: &mut MeshStore) -> (Vec<EdgeId>, Vec<VertexId>) {
        let vertices: Vec<VertexId> = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]
            .iter()
            .enumerate()
            .map(|(i, p)| store.add_vertex(Vertex::at((*p).into()).with_id(i as i32 + 1)))
            .collect();
        let edges = (0..3)
            .map(|i| {
                let e = store.add_edge(vertices[i], vertices[(i + 1) % 3]).unwrap();
                store.set_id(e, i as i32 + 1);
                e
            })
            .collect();
        (edges, vertices)
    }

    #[test]
    fn test_add_polygon_wires_edges_and_defaults() {
        let mut store = MeshStore::new();
        let (edges, vertices) = triangle(&mut store);
        let p = store.add_polygon(&edges, &vertices).unwrap();

        assert_eq!(store.polygon_edges(p), edges.as_slice());
        assert_eq!(store.polygon_vertices(p), vertices.as_slice());
        assert_eq!(store.polygon(p).unwrap().conditions().len(), 3);
        assert!(store.dependents(edges[0]).contains(&EntityKey::Polygon(p)));
        assert_eq!(store.polygon_properties(p), Some(&PolygonProperties::default()));
    }

    #[test]
    fn test_add_polygon_rejections() {
        let mut store = MeshStore::new();
        let (edges, vertices) = triangle(&mut store);

        assert_eq!(store.add_polygon(&[], &vertices), Err(MeshError::EmptyPolygon));
        assert_eq!(
            store.add_polygon(&edges, &vertices[..2]),
            Err(MeshError::ForeignVertex {
                edge: edges[1],
                vertex: vertices[2]
            })
        );

        store.set_id(edges[2], 1);
        assert_eq!(
            store.add_polygon(&edges, &vertices),
            Err(MeshError::DuplicateEdgeId { id: 1 })
        );
        assert_eq!(store.counts().2, 0);
    }

    #[test]
    fn test_strict_loop_order() {
        let mut store = MeshStore::with_config(ModelConfig::strict());
        let (edges, vertices) = triangle(&mut store);
        let reordered = [edges[1], edges[0], edges[2]];
        assert_eq!(
            store.add_polygon(&reordered, &vertices),
            Err(MeshError::OpenLoop { position: 0 })
        );
        assert!(store.add_polygon(&edges, &vertices).is_ok());

        // The lenient store takes the same input.
        let mut lenient = MeshStore::new();
        let (edges, vertices) = triangle(&mut lenient);
        assert!(lenient.add_polygon(&[edges[1], edges[0], edges[2]], &vertices).is_ok());
    }

    #[test]
    fn test_category_copies_are_detached() {
        let mut store = MeshStore::new();
        let (edges, vertices) = triangle(&mut store);
        let p = store.add_polygon(&edges, &vertices).unwrap();

        let mut listed = store.entities_from_category(p, MeshCategory::Edges);
        listed.clear();
        assert_eq!(store.entities_from_category(p, MeshCategory::Edges).len(), 3);
        assert_eq!(store.entities_from_category(p, MeshCategory::Vertices).len(), 3);
        assert_eq!(MeshCategory::from_label("Vertices"), Some(MeshCategory::Vertices));
        assert_eq!(MeshCategory::from_label("Faces"), None);
    }

    #[test]
    fn test_lenient_additions() {
        let mut store = MeshStore::new();
        let (edges, vertices) = triangle(&mut store);
        let p = store.new_polygon();

        assert!(store.polygon_add_edge(p, edges[0]));
        assert!(!store.polygon_add_edge(p, edges[0]));
        assert!(store.polygon_add_vertex(p, vertices[0]));
        assert!(!store.polygon_add_vertex(p, vertices[0]));
        assert_eq!(store.polygon(p).unwrap().conditions().len(), 1);
    }

    #[test]
    fn test_properties_validation() {
        let mut store = MeshStore::new();
        let p = store.new_polygon();
        assert!(store.set_polygon_properties(p, "54g", 3));
        assert!(!store.set_polygon_properties(p, "54g", 3));
        assert!(store.set_polygon_properties(p, "too long", -2));
        let props = store.polygon_properties(p).unwrap();
        assert_eq!(props.material_id, "nul1");
        assert_eq!(props.group, 0);
    }

    #[test]
    fn test_copy_is_deep() {
        let mut store = MeshStore::new();
        let (edges, vertices) = triangle(&mut store);
        let source = store.add_polygon(&edges, &vertices).unwrap();
        let fluid = store.fluid_condition(source, 1).unwrap().id();
        store.set_condition_type(fluid, BoundaryConditionType::Wall);

        let target = store.new_polygon();
        assert!(store.copy_polygon(source, target));
        assert!(!store.copy_polygon(source, source));
        assert_eq!(store.polygon_ref(source), store.polygon_ref(target));

        let copied_vertices = store.polygon_vertices(target).to_vec();
        assert!(copied_vertices.iter().all(|v| !vertices.contains(v)));
        assert_eq!(
            store.fluid_condition(target, 1).map(|c| c.kind()),
            Some(BoundaryConditionType::Wall)
        );
        assert_ne!(store.fluid_condition(target, 1).map(|c| c.id()), Some(fluid));

        store.set_name(vertices[0], "moved");
        assert_ne!(store.polygon_ref(source), store.polygon_ref(target));
    }
}
