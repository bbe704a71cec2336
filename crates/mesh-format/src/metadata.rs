use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata stored alongside the mesh store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Human-readable document name.
    pub name: String,
    /// When the document was first created.
    pub created: DateTime<Utc>,
    /// When the document was last modified.
    pub modified: DateTime<Utc>,
}

impl DocumentMetadata {
    /// Create metadata with the given name and current timestamp.
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            created: now,
            modified: now,
        }
    }

    /// Mark the document as modified now.
    pub fn touch(&mut self) {
        self.modified = Utc::now();
    }
}
