mod fields;
mod upload;

use std::collections::HashMap;
use std::sync::Arc;

use contracts::domain::certificate::CertificateType;
use contracts::shared::metadata::{ColumnSpec, FieldSpec};
use contracts::shared::permissions::can_perform;
use leptos::prelude::*;
use serde_json::Value;

use crate::shared::crud::{
    record_id, CrudPage, PayloadPrepare, PermissionCheck, RestStore, RowAction,
};
use crate::shared::date_utils::format_datetime;

pub use fields::certificate_fields;
pub use upload::upload_renderer;

fn certificate_columns() -> Vec<ColumnSpec> {
    vec![
        ColumnSpec::new("Name", "name").width(200),
        ColumnSpec::new("Description", "desc"),
        ColumnSpec::new("Type", "type").render(|value, _record| {
            value
                .and_then(Value::as_str)
                .and_then(CertificateType::from_str)
                .map(|t| t.label().to_string())
                .unwrap_or_else(|| "-".to_string())
        }),
        ColumnSpec::new("Created", "createdAt")
            .width(180)
            .render(|value, _record| {
                value
                    .and_then(Value::as_str)
                    .map(format_datetime)
                    .unwrap_or_else(|| "-".to_string())
            }),
    ]
}

fn downloadable(record: &Value) -> bool {
    matches!(
        record["type"].as_str().and_then(CertificateType::from_str),
        Some(CertificateType::Ios) | Some(CertificateType::Android)
    )
}

fn is_message(record: &Value) -> bool {
    matches!(
        record["type"].as_str().and_then(CertificateType::from_str),
        Some(CertificateType::Message)
    )
}

fn download_certificate(record: Value) {
    let Some(id) = record_id(&record) else {
        return;
    };
    let url = format!("/api/certificates/{}/actions/download", id);
    if let Some(window) = web_sys::window() {
        let _ = window.open_with_url(&url);
    }
}

/// Message certificates carry a single uploaded file; its download goes
/// straight to the file store rather than the certificate action.
fn message_file_url(record: &Value) -> Option<String> {
    record["messageInfo"]["uuid"]
        .as_str()
        .map(|uuid| format!("/api/files/{uuid}"))
}

fn download_message_file(record: Value) {
    let Some(url) = message_file_url(&record) else {
        return;
    };
    if let Some(window) = web_sys::window() {
        let _ = window.open_with_url(&url);
    }
}

/// The `manualCreate` radio edits as the strings "true"/"false"; the
/// wire type is a boolean.
fn prepare_payload(mut payload: Value) -> Value {
    let flag = payload["androidInfo"]["manualCreate"]
        .as_str()
        .map(|s| s == "true");
    if let Some(flag) = flag {
        payload["androidInfo"]["manualCreate"] = Value::Bool(flag);
    }
    payload
}

#[component]
pub fn CertificatePage(
    /// Role of the signed-in user, checked against the permission tables.
    role: String,
) -> impl IntoView {
    let store = Arc::new(RestStore::new("/api/certificates"));

    let can: PermissionCheck = {
        let role = role.clone();
        Arc::new(move |action: &str| match action {
            "create" => can_perform("certificate.create", &role),
            "delete" => can_perform("certificate.delete", &role),
            "download" => can_perform("certificate.download", &role),
            _ => true,
        })
    };

    let row_actions = {
        let can = can.clone();
        if can("download") {
            vec![
                RowAction::new("Download", Callback::new(download_certificate))
                    .icon("download")
                    .visible_when(downloadable),
                RowAction::new("Download", Callback::new(download_message_file))
                    .icon("download")
                    .visible_when(is_message),
            ]
        } else {
            Vec::new()
        }
    };

    let filter_fields =
        vec![FieldSpec::input("q").label("Search").placeholder("Search by name")];

    let mut renderers = HashMap::new();
    renderers.insert("upload".to_string(), upload_renderer());

    let prepare: PayloadPrepare = Arc::new(prepare_payload);

    view! {
        <CrudPage
            title="Certificates".to_string()
            entity_name="Certificate".to_string()
            columns=certificate_columns()
            fields=certificate_fields()
            store=store
            filter_fields=filter_fields
            row_actions=row_actions
            renderers=renderers
            prepare=prepare
            can=can
        />
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_type_column_renders_label() {
        let columns = certificate_columns();
        let type_col = columns.iter().find(|c| c.title == "Type").unwrap();
        assert_eq!(type_col.cell_text(&json!({"type": "IOS"})), "iOS");
        assert_eq!(type_col.cell_text(&json!({"type": "bogus"})), "-");
    }

    #[test]
    fn test_created_column_formats_timestamp() {
        let columns = certificate_columns();
        let created = columns.iter().find(|c| c.title == "Created").unwrap();
        assert_eq!(
            created.cell_text(&json!({"createdAt": "2024-03-15T14:02:26.123Z"})),
            "2024-03-15 14:02:26"
        );
    }

    #[test]
    fn test_download_only_for_signing_types() {
        assert!(downloadable(&json!({"type": "IOS"})));
        assert!(downloadable(&json!({"type": "Android"})));
        assert!(!downloadable(&json!({"type": "Message"})));
        assert!(!downloadable(&json!({})));
    }

    #[test]
    fn test_message_download_targets_its_file() {
        // Message rows download too, through the file store.
        assert!(is_message(&json!({"type": "Message"})));
        assert!(!is_message(&json!({"type": "IOS"})));
        assert_eq!(
            message_file_url(&json!({"messageInfo": {"uuid": "f-42"}})).as_deref(),
            Some("/api/files/f-42")
        );
        assert_eq!(message_file_url(&json!({"type": "Message"})), None);
    }

    #[test]
    fn test_manual_create_coerced_to_bool() {
        let payload = prepare_payload(json!({
            "name": "c",
            "androidInfo": {"manualCreate": "false"}
        }));
        assert_eq!(payload["androidInfo"]["manualCreate"], json!(false));

        // payloads without the discriminant pass through untouched
        let payload = prepare_payload(json!({"name": "c", "type": "IOS"}));
        assert_eq!(payload, json!({"name": "c", "type": "IOS"}));
    }
}
