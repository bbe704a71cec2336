use mesh_model::MeshStore;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::errors::LoadError;
use crate::metadata::DocumentMetadata;
use crate::save::{FORMAT_ID, FORMAT_VERSION};

/// The top-level document structure for deserialization. The store stays
/// untyped until migrations have run.
#[derive(Debug, Clone, Deserialize)]
pub struct MeshDocumentRaw {
    pub format: String,
    pub version: u32,
    pub metadata: DocumentMetadata,
    pub store: Value,
}

/// Deserialize a document from a JSON string.
///
/// Validates the format identifier and version, migrates older layouts,
/// rewires the change subscriptions between entities and audits the
/// resulting graph. Returns the store and its metadata.
#[instrument(skip(json), fields(bytes = json.len()))]
pub fn load_document(json: &str) -> Result<(MeshStore, DocumentMetadata), LoadError> {
    let raw: MeshDocumentRaw =
        serde_json::from_str(json).map_err(|e| LoadError::ParseError(e.to_string()))?;

    if raw.format != FORMAT_ID {
        warn!(format = %raw.format, "rejecting document with unknown format");
        return Err(LoadError::UnknownFormat(raw.format));
    }

    if raw.version > FORMAT_VERSION {
        warn!(version = raw.version, "rejecting document from a newer format");
        return Err(LoadError::FutureVersion {
            file_version: raw.version,
            supported_version: FORMAT_VERSION,
        });
    }

    let tree = if raw.version < FORMAT_VERSION {
        crate::migrate::migrate(raw.store, raw.version, FORMAT_VERSION)?
    } else {
        raw.store
    };

    let mut store: MeshStore =
        serde_json::from_value(tree).map_err(|e| LoadError::ParseError(e.to_string()))?;

    let audit = store.audit();
    if !audit.is_valid() {
        warn!(errors = audit.errors.len(), "rejecting inconsistent document");
        return Err(LoadError::Inconsistent(audit.errors));
    }
    store.rebuild_subscriptions();

    let (vertices, edges, polygons, conditions, meshes) = store.counts();
    debug!(
        name = %raw.metadata.name,
        vertices,
        edges,
        polygons,
        conditions,
        meshes,
        "loaded mesh document"
    );
    Ok((store, raw.metadata))
}

/// Load a document into an existing store.
///
/// On error `target` is left exactly as it was, listeners included. On
/// success its entities are replaced and its external listeners dropped,
/// since they were registered against the old graph.
pub fn load_into(target: &mut MeshStore, json: &str) -> Result<DocumentMetadata, LoadError> {
    let (store, metadata) = load_document(json)?;
    *target = store;
    Ok(metadata)
}
