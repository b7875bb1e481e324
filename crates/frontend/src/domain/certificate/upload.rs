//! File-upload renderer for `FieldKind::Custom` fields.
//!
//! Posts the picked file to the upload endpoint and stores only the
//! returned reference in the draft: uuid under the spec's path, display
//! name under the sibling `fileName` path. Writing through `set_value`
//! fires the spec's linked resets, so stale secrets die with the file.

use std::sync::Arc;

use contracts::shared::envelope::ApiResponse;
use contracts::shared::path::FieldPath;
use contracts::shared::upload::{UploadData, UploadRef};
use gloo_net::http::Request;
use leptos::prelude::*;
use serde_json::json;
use wasm_bindgen_futures::spawn_local;

use crate::shared::crud::form_view::{CustomFieldCtx, CustomRenderer};
use crate::shared::icons::icon;

const UPLOAD_URL: &str = "/api/files";

pub fn upload_renderer() -> CustomRenderer {
    Arc::new(|ctx: CustomFieldCtx| view! { <UploadField ctx=ctx /> }.into_any())
}

fn sibling(path: &FieldPath, segment: &str) -> FieldPath {
    let mut segments: Vec<String> = path.segments().to_vec();
    segments.pop();
    segments.push(segment.to_string());
    FieldPath::new(segments)
}

async fn upload_file(file: web_sys::File) -> Result<UploadRef, String> {
    let form = web_sys::FormData::new().map_err(|_| "upload form unavailable".to_string())?;
    form.append_with_blob_and_filename("file", &file, &file.name())
        .map_err(|_| "could not attach file".to_string())?;
    let response = Request::post(UPLOAD_URL)
        .body(form)
        .map_err(|err| err.to_string())?
        .send()
        .await
        .map_err(|err| err.to_string())?;
    let envelope: ApiResponse<UploadData> =
        response.json().await.map_err(|err| err.to_string())?;
    envelope
        .into_result()
        .map(UploadRef::from)
        .map_err(|err| err.notification())
}

#[component]
fn UploadField(ctx: CustomFieldCtx) -> impl IntoView {
    let uploading = RwSignal::new(false);
    let label = ctx.spec.label.clone();
    let file_name_path = sibling(&ctx.spec.name, "fileName");
    let disabled = ctx.disabled;

    let display_name = {
        let ctx = ctx.clone();
        let file_name_path = file_name_path.clone();
        Signal::derive(move || ctx.text_of(&file_name_path))
    };
    let error = {
        let ctx = ctx.clone();
        Signal::derive(move || ctx.error())
    };

    let handle_pick = {
        let ctx = ctx.clone();
        move |ev: leptos::ev::Event| {
            let input: web_sys::HtmlInputElement = event_target(&ev);
            let Some(file) = input.files().and_then(|files| files.get(0)) else {
                return;
            };
            uploading.set(true);
            let ctx = ctx.clone();
            let file_name_path = file_name_path.clone();
            spawn_local(async move {
                match upload_file(file).await {
                    Ok(upload_ref) => {
                        // uuid first: its resets clear the old fileName too
                        ctx.set_value(json!(upload_ref.uuid));
                        ctx.set_path(&file_name_path, json!(upload_ref.file_name));
                    }
                    Err(message) => {
                        let name = ctx.spec.name.clone();
                        ctx.draft.try_update(|d| d.set_error(&name, message));
                    }
                }
                uploading.try_set(false);
            });
        }
    };

    view! {
        <div class="form__group">
            <label class="form__label">{label}</label>
            <label class="button button--secondary form__upload">
                {icon("upload")}
                {move || {
                    if uploading.get() {
                        "Uploading...".to_string()
                    } else {
                        let name = display_name.get();
                        if name.is_empty() { "Choose file".to_string() } else { name }
                    }
                }}
                <input
                    type="file"
                    style="display: none;"
                    disabled=move || disabled.get() || uploading.get()
                    on:change=handle_pick
                />
            </label>
            {move || error.get().map(|e| view! {
                <div class="form__error">{e}</div>
            })}
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sibling_path() {
        let uuid = FieldPath::parse("iosInfo.keyChainP12.uuid");
        assert_eq!(
            sibling(&uuid, "fileName").dotted(),
            "iosInfo.keyChainP12.fileName"
        );
    }
}
