use mesh_model::ConsistencyError;

/// Errors during document loading.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LoadError {
    #[error("failed to parse document: {0}")]
    ParseError(String),

    #[error("unknown document format: {0}")]
    UnknownFormat(String),

    #[error("document version {file_version} is newer than supported version {supported_version}")]
    FutureVersion {
        file_version: u32,
        supported_version: u32,
    },

    #[error("migration failed from version {from} to {to}: {reason}")]
    MigrationFailed { from: u32, to: u32, reason: String },

    #[error("document describes an inconsistent mesh graph ({} problems)", .0.len())]
    Inconsistent(Vec<ConsistencyError>),
}
