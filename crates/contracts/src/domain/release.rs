//! Release entity wire types.

use serde::{Deserialize, Serialize};

/// Request body for the version-uniqueness check the release form runs
/// while the user types.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckVersionRequest {
    #[serde(rename = "projectID")]
    pub project_id: i64,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckVersionData {
    #[serde(rename = "isUnique")]
    pub is_unique: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_check_version_wire_shape() {
        let req = CheckVersionRequest {
            project_id: 42,
            version: "1.2.0".into(),
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({"projectID": 42, "version": "1.2.0"})
        );
        let data: CheckVersionData =
            serde_json::from_value(json!({"isUnique": false})).unwrap();
        assert!(!data.is_unique);
    }
}
