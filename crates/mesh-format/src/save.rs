use mesh_model::MeshStore;
use serde::Serialize;
use tracing::debug;

use crate::metadata::DocumentMetadata;

/// Format identifier written into every document.
pub const FORMAT_ID: &str = "mesh-model";

/// Current document format version.
pub const FORMAT_VERSION: u32 = 1;

/// The top-level document structure.
#[derive(Debug, Serialize)]
pub struct MeshDocument<'a> {
    /// Format identifier.
    pub format: &'a str,
    /// Format version number.
    pub version: u32,
    pub metadata: &'a DocumentMetadata,
    /// Every entity of the store. Listeners are not persisted.
    pub store: &'a MeshStore,
}

/// Serialize a store to a pretty-printed JSON string.
pub fn save_document(store: &MeshStore, metadata: &DocumentMetadata) -> String {
    let document = MeshDocument {
        format: FORMAT_ID,
        version: FORMAT_VERSION,
        metadata,
        store,
    };
    let (vertices, edges, polygons, conditions, meshes) = store.counts();
    debug!(
        name = %metadata.name,
        vertices,
        edges,
        polygons,
        conditions,
        meshes,
        "saving mesh document"
    );
    serde_json::to_string_pretty(&document).expect("MeshStore serialization should never fail")
}
