//! Remote collection response envelope.
//!
//! Every backend call answers `{ success, data?, err: { msg } }`; the
//! store adapter maps it onto the `CrudError` taxonomy.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::shared::error::CrudError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub msg: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub err: Option<ApiError>,
}

impl<T> ApiResponse<T> {
    fn rejection(err: Option<ApiError>) -> CrudError {
        CrudError::RemoteRejection(
            err.map(|e| e.msg)
                .unwrap_or_else(|| "request rejected".to_string()),
        )
    }

    /// Unwrap a payload-carrying response.
    pub fn into_result(self) -> Result<T, CrudError> {
        if self.success {
            self.data
                .ok_or_else(|| CrudError::Transport("response carried no data".to_string()))
        } else {
            Err(Self::rejection(self.err))
        }
    }

    /// Unwrap a response whose payload (if any) is irrelevant (delete).
    pub fn into_unit_result(self) -> Result<(), CrudError> {
        if self.success {
            Ok(())
        } else {
            Err(Self::rejection(self.err))
        }
    }
}

/// Paged list payload: `data: { list, total }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagingData {
    #[serde(default)]
    pub list: Vec<Value>,
    #[serde(default)]
    pub total: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_with_data() {
        let resp: ApiResponse<PagingData> = serde_json::from_value(json!({
            "success": true,
            "data": {"list": [{"id": "1"}], "total": 1}
        }))
        .unwrap();
        let page = resp.into_result().unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.list.len(), 1);
    }

    #[test]
    fn test_failure_maps_to_remote_rejection() {
        let resp: ApiResponse<Value> = serde_json::from_value(json!({
            "success": false,
            "err": {"msg": "version already exists"}
        }))
        .unwrap();
        assert_eq!(
            resp.into_result(),
            Err(CrudError::RemoteRejection("version already exists".into()))
        );
    }

    #[test]
    fn test_failure_without_err_body() {
        let resp: ApiResponse<Value> =
            serde_json::from_value(json!({"success": false})).unwrap();
        assert_eq!(
            resp.into_unit_result(),
            Err(CrudError::RemoteRejection("request rejected".into()))
        );
    }

    #[test]
    fn test_unit_result_ignores_missing_data() {
        let resp: ApiResponse<Value> =
            serde_json::from_value(json!({"success": true})).unwrap();
        assert_eq!(resp.into_unit_result(), Ok(()));
    }
}
