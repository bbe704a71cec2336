//! Versioned JSON documents holding a whole [`mesh_model::MeshStore`].

pub mod errors;
pub mod load;
pub mod metadata;
pub mod migrate;
pub mod save;

pub use errors::LoadError;
pub use load::{load_document, load_into};
pub use metadata::DocumentMetadata;
pub use save::{save_document, FORMAT_ID, FORMAT_VERSION};
