//! Release list and form.
//!
//! The version field carries the engine's only async rule: a debounced
//! uniqueness probe against the check-version endpoint.

use std::collections::HashMap;
use std::sync::Arc;

use contracts::domain::release::{CheckVersionData, CheckVersionRequest};
use contracts::shared::envelope::ApiResponse;
use contracts::shared::metadata::{ColumnSpec, FieldSpec, PatternRule};
use contracts::shared::permissions::can_perform;
use gloo_net::http::Request;
use leptos::prelude::*;
use serde_json::Value;

use crate::shared::components::ui::Textarea;
use crate::shared::crud::form_view::{CustomFieldCtx, CustomRenderer};
use crate::shared::crud::{CrudPage, PermissionCheck, RestStore};
use crate::shared::date_utils::format_datetime;

const CHECK_VERSION_URL: &str = "/api/releases/actions/check-version";
const VERSION_PATTERN: &str = r"^[A-Za-z0-9._+-]+$";
const VERSION_PATTERN_MSG: &str =
    "Only letters, digits and . _ + - are allowed";

async fn version_is_unique(project_id: i64, version: String) -> Result<bool, String> {
    let request = CheckVersionRequest {
        project_id,
        version,
    };
    let response = Request::post(CHECK_VERSION_URL)
        .json(&request)
        .map_err(|err| err.to_string())?
        .send()
        .await
        .map_err(|err| err.to_string())?;
    let envelope: ApiResponse<CheckVersionData> =
        response.json().await.map_err(|err| err.to_string())?;
    envelope
        .into_result()
        .map(|data| data.is_unique)
        .map_err(|err| err.notification())
}

fn release_fields(project_id: i64) -> Vec<FieldSpec> {
    vec![
        FieldSpec::hidden("id"),
        FieldSpec::input("version")
            .label("Version")
            .max_length(30)
            .rule(PatternRule::new(VERSION_PATTERN, VERSION_PATTERN_MSG))
            .async_rule(move |value, _values| {
                Box::pin(async move {
                    let Some(version) = value.as_str().map(str::to_string) else {
                        return Ok(());
                    };
                    if version.is_empty() {
                        return Ok(());
                    }
                    match version_is_unique(project_id, version).await {
                        Ok(true) => Ok(()),
                        Ok(false) => Err("Version already exists".to_string()),
                        // An unreachable checker must not block typing; the
                        // server re-validates on submit anyway.
                        Err(err) => {
                            log::warn!("version check failed: {err}");
                            Ok(())
                        }
                    }
                })
            }),
        FieldSpec::input("applicationName")
            .label("Application")
            .max_length(100)
            .disabled_on_edit(),
        FieldSpec::input("labels.gitBranch")
            .label("Git Branch")
            .optional(),
        FieldSpec::select(
            "tag",
            [("stable", "Stable"), ("beta", "Beta"), ("alpha", "Alpha")],
        )
        .label("Tag")
        .optional(),
        FieldSpec::custom("changelog", "textarea")
            .label("Changelog")
            .optional(),
    ]
}

fn release_columns() -> Vec<ColumnSpec> {
    vec![
        ColumnSpec::new("Version", "version").width(160),
        ColumnSpec::new("Application", "applicationName"),
        ColumnSpec::new("Git Branch", "labels.gitBranch"),
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

fn textarea_renderer() -> CustomRenderer {
    Arc::new(|ctx: CustomFieldCtx| {
        let label = ctx.spec.label.clone();
        let value = {
            let ctx = ctx.clone();
            Signal::derive(move || ctx.text())
        };
        let on_input = {
            let ctx = ctx.clone();
            Callback::new(move |text: String| {
                let value = if text.is_empty() {
                    Value::Null
                } else {
                    Value::String(text)
                };
                ctx.set_value(value);
            })
        };
        view! {
            <Textarea
                label=label
                value=value
                on_input=on_input
                rows=6
            />
        }
        .into_any()
    })
}

#[component]
pub fn ReleasePage(
    /// Role of the signed-in user, checked against the permission tables.
    role: String,
    /// Scope for the version-uniqueness check.
    #[prop(default = 1)]
    project_id: i64,
) -> impl IntoView {
    let store = Arc::new(
        RestStore::new("/api/releases")
            .with_extra_query([("projectId", project_id.to_string())]),
    );

    let can: PermissionCheck = {
        let role = role.clone();
        Arc::new(move |action: &str| match action {
            "create" => can_perform("release.create", &role),
            "edit" => can_perform("release.edit", &role),
            "delete" => can_perform("release.delete", &role),
            _ => true,
        })
    };

    let filter_fields =
        vec![FieldSpec::input("q").label("Search").placeholder("Search by version")];

    let mut renderers = HashMap::new();
    renderers.insert("textarea".to_string(), textarea_renderer());

    view! {
        <CrudPage
            title="Releases".to_string()
            entity_name="Release".to_string()
            columns=release_columns()
            fields=release_fields(project_id)
            store=store
            filter_fields=filter_fields
            renderers=renderers
            can=can
        />
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::crud::form_state::{active_fields, validate_all_sync};
    use serde_json::json;

    #[test]
    fn test_version_pattern() {
        let fields = release_fields(1);
        let values = json!({"version": "1 .0", "applicationName": "app"});
        let active = active_fields(&fields, &values);
        let errors = validate_all_sync(&active, &values);
        assert!(errors
            .iter()
            .any(|e| e.path == "version" && e.message == VERSION_PATTERN_MSG));

        let values = json!({"version": "v1.2.0+build-3", "applicationName": "app"});
        let active = active_fields(&fields, &values);
        assert!(validate_all_sync(&active, &values).is_empty());
    }

    #[test]
    fn test_nested_branch_column() {
        let columns = release_columns();
        let branch = columns.iter().find(|c| c.title == "Git Branch").unwrap();
        assert_eq!(
            branch.cell_text(&json!({"labels": {"gitBranch": "main"}})),
            "main"
        );
        assert_eq!(branch.cell_text(&json!({})), "-");
    }
}
