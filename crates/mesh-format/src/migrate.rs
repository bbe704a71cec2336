use serde_json::Value;

use crate::errors::LoadError;

/// Apply format migrations to the raw `store` tree from `from_version` to
/// `to_version`.
///
/// Migrations run on the untyped JSON so that older layouts never have to
/// deserialize into the current types. Version 1 is the only version, so
/// there are no migration steps yet.
pub fn migrate(store: Value, from_version: u32, to_version: u32) -> Result<Value, LoadError> {
    if from_version == to_version {
        return Ok(store);
    }
    Err(LoadError::MigrationFailed {
        from: from_version,
        to: to_version,
        reason: format!("no migration path from v{} to v{}", from_version, to_version),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_same_version_is_identity() {
        let tree = json!({ "vertices": [] });
        assert_eq!(migrate(tree.clone(), 1, 1).unwrap(), tree);
    }

    #[test]
    fn test_unknown_path_fails() {
        let result = migrate(json!({}), 0, 1);
        assert!(matches!(
            result,
            Err(LoadError::MigrationFailed { from: 0, to: 1, .. })
        ));
    }
}
