//! Declarative form renderer.
//!
//! Renders the active field set for the current draft, wires sync rules
//! inline and async rules through a debounce guard, and hands a clean
//! payload to the orchestrator on submit. The form never talks to the
//! store itself.

use std::collections::HashMap;
use std::sync::Arc;

use contracts::shared::metadata::{FieldKind, FieldSpec};
use contracts::shared::path::FieldPath;
use gloo_timers::future::TimeoutFuture;
use leptos::prelude::*;
use serde_json::Value;
use wasm_bindgen_futures::spawn_local;

use crate::shared::components::ui::{Input, RadioGroup, Select};
use crate::shared::crud::fetch_guard::SequenceGuard;
use crate::shared::crud::form_state::{
    active_fields, build_payload, validate_all_sync, FormDraft,
};
use crate::shared::icons::icon;

/// How long a keystroke may rest before its async rule fires.
const ASYNC_RULE_DEBOUNCE_MS: u32 = 500;

/// Host-provided renderer for `FieldKind::Custom` fields, keyed by the
/// spec's renderer id.
pub type CustomRenderer = Arc<dyn Fn(CustomFieldCtx) -> AnyView + Send + Sync>;
pub type RendererMap = HashMap<String, CustomRenderer>;

/// Everything a custom renderer needs to participate in the draft.
#[derive(Clone)]
pub struct CustomFieldCtx {
    pub spec: FieldSpec,
    pub draft: RwSignal<FormDraft>,
    pub disabled: Signal<bool>,
}

impl CustomFieldCtx {
    pub fn value(&self) -> Option<Value> {
        self.draft.with(|d| d.value_at(&self.spec.name).cloned())
    }

    pub fn text(&self) -> String {
        self.draft.with(|d| d.text_at(&self.spec.name))
    }

    pub fn text_of(&self, path: &FieldPath) -> String {
        self.draft.with(|d| d.text_at(path))
    }

    pub fn error(&self) -> Option<String> {
        self.draft.with(|d| d.error_at(&self.spec.name).cloned())
    }

    /// Write through the spec: fires its linked resets.
    pub fn set_value(&self, value: Value) {
        let spec = self.spec.clone();
        self.draft.update(|d| d.apply_change(&spec, value));
    }

    /// Write a companion path (file name next to an upload uuid) without
    /// reset side effects.
    pub fn set_path(&self, path: &FieldPath, value: Value) {
        self.draft.update(|d| d.set_path(path, value));
    }
}

#[component]
pub fn CrudForm(
    /// Modal header title ("New Certificate" / "Edit Certificate").
    title: String,
    /// Declared form fields, in render order.
    fields: Vec<FieldSpec>,
    /// The editing session's draft, owned by the orchestrator.
    draft: RwSignal<FormDraft>,
    /// True when editing an existing record (locks `disabled_on_edit` fields).
    #[prop(optional)]
    editing: bool,
    /// True while a submit is in flight; the whole form locks.
    #[prop(into)]
    submitting: Signal<bool>,
    /// Form-level message (remote rejection, transport failure).
    #[prop(into)]
    form_error: Signal<Option<String>>,
    /// Renderers for `FieldKind::Custom` fields.
    #[prop(optional)]
    renderers: RendererMap,
    /// Receives the validated payload.
    on_submit: Callback<Value>,
    on_cancel: Callback<()>,
) -> impl IntoView {
    let fields = StoredValue::new(fields);
    let renderers = StoredValue::new(renderers);

    let handle_save = move |_| {
        if submitting.get_untracked() {
            return;
        }
        let specs = fields.get_value();
        let values = draft.with_untracked(|d| d.values.clone());
        let active: Vec<FieldSpec> = active_fields(&specs, &values)
            .into_iter()
            .cloned()
            .collect();
        let refs: Vec<&FieldSpec> = active.iter().collect();
        let mut errors = validate_all_sync(&refs, &values);

        // Async rules run once more at submit time, skipping fields that
        // already failed synchronously.
        let async_checks: Vec<(FieldPath, contracts::shared::metadata::AsyncRule)> = active
            .iter()
            .filter(|spec| {
                spec.async_rule.is_some()
                    && !errors.iter().any(|e| e.path == spec.name.dotted())
            })
            .filter_map(|spec| {
                spec.async_rule
                    .clone()
                    .map(|rule| (spec.name.clone(), rule))
            })
            .collect();

        spawn_local(async move {
            for (path, rule) in async_checks {
                let value = path.get(&values).cloned().unwrap_or(Value::Null);
                if let Err(message) = rule(value, values.clone()).await {
                    errors.push(contracts::shared::error::FieldError::new(
                        path.dotted(),
                        message,
                    ));
                }
            }
            if errors.is_empty() {
                let refs: Vec<&FieldSpec> = active.iter().collect();
                let payload = build_payload(&refs, &values);
                on_submit.run(payload);
            } else {
                draft.try_update(|d| d.replace_errors(&errors));
            }
        });
    };

    view! {
        <div class="details-form">
            <div class="header">
                <div class="header__content">
                    <h2 class="header__title">{title}</h2>
                </div>
            </div>

            <form class="form" on:submit=move |ev| ev.prevent_default()>
                // fieldset-level disable locks every widget while the submit is in flight
                <fieldset class="form__fieldset" disabled=move || submitting.get()>
                <For
                    each=move || {
                        let specs = fields.get_value();
                        draft.with(|d| {
                            active_fields(&specs, &d.values)
                                .into_iter()
                                .cloned()
                                .collect::<Vec<FieldSpec>>()
                        })
                    }
                    key=|spec| spec.name.dotted()
                    children=move |spec| {
                        render_field(spec, draft, submitting, editing, renderers)
                    }
                />
                </fieldset>
            </form>

            {move || form_error.get().map(|message| view! {
                <div class="form__error form__error--summary">{message}</div>
            })}

            <div class="form__actions">
                <button
                    class="button button--primary"
                    disabled=move || submitting.get()
                    on:click=handle_save
                >
                    {icon("save")}
                    {move || if submitting.get() { "Saving..." } else { "Save" }}
                </button>
                <button
                    class="button button--secondary"
                    on:click=move |_| on_cancel.run(())
                >
                    {icon("cancel")}
                    "Cancel"
                </button>
            </div>
        </div>
    }
}

/// Render one active field by its declared kind.
fn render_field(
    spec: FieldSpec,
    draft: RwSignal<FormDraft>,
    submitting: Signal<bool>,
    editing: bool,
    renderers: StoredValue<RendererMap>,
) -> AnyView {
    let locked = editing && spec.disabled_on_edit;
    let is_disabled = Signal::derive(move || locked || submitting.get());

    match spec.kind {
        FieldKind::Hidden => ().into_any(),
        FieldKind::Custom => {
            let id = spec.render.clone().unwrap_or_default();
            let ctx = CustomFieldCtx {
                spec: spec.clone(),
                draft,
                disabled: is_disabled,
            };
            match renderers.with_value(|map| map.get(&id).cloned()) {
                Some(render) => render(ctx),
                None => {
                    log::error!("no renderer registered for `{id}`");
                    ().into_any()
                }
            }
        }
        FieldKind::Input | FieldKind::Password => {
            let name = spec.name.clone();
            let value = {
                let name = name.clone();
                Signal::derive(move || draft.with(|d| d.text_at(&name)))
            };
            let error = {
                let name = name.clone();
                Signal::derive(move || draft.with(|d| d.error_at(&name).cloned()))
            };
            let input_type = match spec.kind {
                FieldKind::Password => "password",
                _ => "text",
            };
            let on_input = text_change_handler(spec.clone(), draft);
            view! {
                <Input
                    label=spec.label.clone()
                    value=value
                    on_input=on_input
                    input_type=input_type.to_string()
                    error=error
                    disabled=locked
                    required=spec.required
                    max_length=spec.max_length
                    placeholder=spec.placeholder.clone().unwrap_or_default()
                />
            }
            .into_any()
        }
        FieldKind::Select => {
            let name = spec.name.clone();
            let value = {
                let name = name.clone();
                Signal::derive(move || draft.with(|d| d.text_at(&name)))
            };
            let error = {
                let name = name.clone();
                Signal::derive(move || draft.with(|d| d.error_at(&name).cloned()))
            };
            let on_change = text_change_handler(spec.clone(), draft);
            view! {
                <Select
                    label=spec.label.clone()
                    value=value
                    on_change=on_change
                    options=spec.options.clone()
                    error=error
                    disabled=locked
                    required=spec.required
                    placeholder=spec.placeholder.clone().unwrap_or_default()
                />
            }
            .into_any()
        }
        FieldKind::RadioGroup => {
            let name = spec.name.clone();
            let value = {
                let name = name.clone();
                Signal::derive(move || draft.with(|d| d.text_at(&name)))
            };
            let error = {
                let name = name.clone();
                Signal::derive(move || draft.with(|d| d.error_at(&name).cloned()))
            };
            let on_change = text_change_handler(spec.clone(), draft);
            view! {
                <RadioGroup
                    label=spec.label.clone()
                    value=value
                    on_change=on_change
                    name=spec.name.dotted()
                    options=spec.options.clone()
                    error=error
                    disabled=locked
                />
            }
            .into_any()
        }
    }
}

/// Whether a field's async rule should be armed for the current draft:
/// it must declare one, and every synchronous rule must pass first.
fn async_check_due(spec: &FieldSpec, values: &Value) -> bool {
    spec.async_rule.is_some() && spec.validate_sync(values).is_none()
}

/// Shared change handler for text-valued widgets: write the draft, then
/// arm the field's debounced async rule if it declares one and the new
/// value passes its pattern rules. Only the most recently issued check
/// may publish its verdict.
fn text_change_handler(spec: FieldSpec, draft: RwSignal<FormDraft>) -> Callback<String> {
    let guard = SequenceGuard::new();
    {
        let guard = guard.clone();
        on_cleanup(move || guard.cancel_all());
    }
    Callback::new(move |text: String| {
        let value = if text.is_empty() {
            Value::Null
        } else {
            Value::String(text)
        };
        {
            let spec = spec.clone();
            draft.update(|d| d.apply_change(&spec, value));
        }
        let Some(rule) = spec.async_rule.clone() else {
            return;
        };
        let current = draft.with_untracked(|d| d.values.clone());
        if !async_check_due(&spec, &current) {
            // Locally invalid: never reaches the remote validator, and
            // any check in flight for an older value is superseded.
            guard.issue();
            return;
        }
        let seq = guard.issue();
        let guard = guard.clone();
        let name = spec.name.clone();
        spawn_local(async move {
            TimeoutFuture::new(ASYNC_RULE_DEBOUNCE_MS).await;
            if !guard.is_current(seq) {
                return;
            }
            let values = match draft.try_with_untracked(|d| d.values.clone()) {
                Some(values) => values,
                None => return,
            };
            let value = name.get(&values).cloned().unwrap_or(Value::Null);
            let verdict = rule(value, values).await;
            if !guard.is_current(seq) {
                // A newer edit superseded this check while it was in flight.
                return;
            }
            draft.try_update(|d| match verdict {
                Ok(()) => d.clear_error(&name),
                Err(message) => d.set_error(&name, message),
            });
        });
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::shared::metadata::PatternRule;
    use serde_json::json;

    #[test]
    fn test_async_check_gated_by_sync_rules() {
        let spec = FieldSpec::input("version")
            .label("Version")
            .rule(PatternRule::new(
                r"^[A-Za-z0-9._+-]+$",
                "Only letters, digits and . _ + - are allowed",
            ))
            .async_rule(|_, _| Box::pin(async { Ok(()) }));
        // pattern failure keeps the remote check unarmed
        assert!(!async_check_due(&spec, &json!({"version": "1 0"})));
        assert!(async_check_due(&spec, &json!({"version": "1.0"})));
        // blank required value is a sync failure too
        assert!(!async_check_due(&spec, &json!({})));
    }

    #[test]
    fn test_no_async_rule_means_nothing_due() {
        let spec = FieldSpec::input("name").label("Name");
        assert!(!async_check_due(&spec, &json!({"name": "x"})));
    }
}
