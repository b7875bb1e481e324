//! Upload collaborator contract.
//!
//! The engine never moves file bytes; an external uploader answers with
//! the standard envelope and the form keeps only this reference.

use serde::{Deserialize, Serialize};

/// Raw upload response payload: `data: { uuid, name }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadData {
    pub uuid: String,
    pub name: String,
}

/// Resolved upload reference stored in the draft: opaque id + display
/// name. Once present it behaves like any other field value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadRef {
    pub uuid: String,
    #[serde(rename = "fileName")]
    pub file_name: String,
}

impl From<UploadData> for UploadRef {
    fn from(data: UploadData) -> Self {
        Self {
            uuid: data.uuid,
            file_name: data.name,
        }
    }
}
