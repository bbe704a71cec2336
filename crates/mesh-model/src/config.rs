//! Configuration for a mesh store.

use serde::{Deserialize, Serialize};

/// Material id assigned when none (or an invalid one) is given.
pub const DEFAULT_MATERIAL_ID: &str = "nul1";

/// Settings that control validation and defaulting inside a [`MeshStore`].
///
/// [`MeshStore`]: crate::topology::store::MeshStore
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Longest accepted polygon material id, in characters.
    pub material_id_max_len: usize,
    /// Material id used for new polygons and to replace rejected input.
    pub default_material_id: String,
    /// Group number used for new polygons and to replace rejected input.
    pub default_group: i32,
    /// Require polygon edge `i` to join vertex `i` and vertex `i + 1`
    /// (wrapping), so that the edges form one closed loop.
    pub require_closed_loop: bool,
    /// Allowed drift between a cached edge length and the distance between
    /// its vertices before the audit reports it as stale.
    pub length_tolerance: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            material_id_max_len: 4,
            default_material_id: DEFAULT_MATERIAL_ID.to_string(),
            default_group: 0,
            require_closed_loop: false,
            length_tolerance: 1e-12,
        }
    }
}

impl ModelConfig {
    /// Default settings plus the closed-loop requirement on polygons.
    pub fn strict() -> Self {
        Self {
            require_closed_loop: true,
            ..Self::default()
        }
    }

    /// Whether `material_id` may be stored as-is.
    pub fn accepts_material_id(&self, material_id: &str) -> bool {
        !material_id.is_empty() && material_id.chars().count() <= self.material_id_max_len
    }

    /// Whether `group` may be stored as-is.
    pub fn accepts_group(&self, group: i32) -> bool {
        group >= 0
    }

    /// Whether a cached length still matches the measured one. The
    /// tolerance is relative for lengths above 1.
    pub fn lengths_match(&self, cached: f64, actual: f64) -> bool {
        cached == actual
            || (cached - actual).abs() <= self.length_tolerance * actual.abs().max(1.0)
    }
}
