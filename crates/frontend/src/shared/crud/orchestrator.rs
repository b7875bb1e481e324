//! The CRUD page orchestrator.
//!
//! One component owns the whole lifecycle of a collection screen: the
//! query state, the fetched page, the workflow state machine, the form
//! modal and the delete confirmation. Host pages only declare columns,
//! fields and a store adapter.

use std::sync::Arc;

use contracts::shared::error::CrudError;
use contracts::shared::metadata::{ColumnSpec, FieldKind, FieldSpec};
use contracts::shared::query::{FilterValue, QueryState};
use leptos::prelude::*;
use serde_json::Value;
use wasm_bindgen_futures::spawn_local;

use crate::shared::components::filter_panel::FilterPanel;
use crate::shared::components::pagination_controls::PaginationControls;
use crate::shared::components::ui::{Input, Select};
use crate::shared::crud::fetch_guard::SequenceGuard;
use crate::shared::crud::form_state::FormDraft;
use crate::shared::crud::form_view::{CrudForm, RendererMap};
use crate::shared::crud::list_view::{record_id, CrudTable, RowAction};
use crate::shared::crud::store::DataStore;
use crate::shared::crud::workflow::WorkflowState;
use crate::shared::icons::icon;
use crate::shared::modal_stack::ModalStackService;

/// Permission predicate over page action names ("create", "delete", ...).
pub type PermissionCheck = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Payload transform applied after validation, right before the store
/// call (wire-type coercions the widgets cannot express).
pub type PayloadPrepare = Arc<dyn Fn(Value) -> Value + Send + Sync>;

#[component]
pub fn CrudPage(
    /// Page header title ("Certificates").
    title: String,
    /// Singular entity name for form titles ("Certificate").
    entity_name: String,
    columns: Vec<ColumnSpec>,
    fields: Vec<FieldSpec>,
    store: Arc<dyn DataStore>,
    /// Filter widgets rendered in the collapsible panel.
    #[prop(optional)]
    filter_fields: Vec<FieldSpec>,
    /// Extra per-row actions (download, ...).
    #[prop(optional)]
    row_actions: Vec<RowAction>,
    /// Renderers for `FieldKind::Custom` form fields.
    #[prop(optional)]
    renderers: RendererMap,
    /// When absent every action is allowed.
    #[prop(optional)]
    can: Option<PermissionCheck>,
    /// Last touch on the submit payload before create/update.
    #[prop(optional)]
    prepare: Option<PayloadPrepare>,
) -> impl IntoView {
    let query = RwSignal::new(QueryState::default());
    let items = RwSignal::new(Vec::<Value>::new());
    let total = RwSignal::new(0u64);
    let workflow = RwSignal::new(WorkflowState::Idle);
    let notice = RwSignal::new(None::<String>);
    let form_error = RwSignal::new(None::<String>);
    let draft = RwSignal::new(FormDraft::new());
    let filter_expanded = RwSignal::new(false);

    let modal_stack =
        use_context::<ModalStackService>().expect("ModalStackService not found in context");

    let allowed = {
        let can = can.clone();
        move |action: &str| can.as_ref().map_or(true, |p| p(action))
    };
    let can_create = allowed("create");
    let can_delete = allowed("delete");

    let guard = SequenceGuard::new();
    let refetch = {
        let guard = guard.clone();
        let store = store.clone();
        Callback::new(move |_: ()| {
            let seq = guard.issue();
            let guard = guard.clone();
            let store = store.clone();
            let query_now = query.get_untracked();
            spawn_local(async move {
                match store.list(&query_now).await {
                    Ok(page) => {
                        if !guard.is_current(seq) {
                            log::debug!(
                                "discarding stale list page for pageNo={}",
                                query_now.page_no
                            );
                            return;
                        }
                        if page.items.is_empty() && query_now.page_no > 1 {
                            // Fell off the end (deletes elsewhere); step
                            // back and let the query effect refetch.
                            query.try_update(|q| q.step_back_if_empty(0));
                            return;
                        }
                        items.try_set(page.items);
                        total.try_set(page.total);
                        notice.try_set(None);
                    }
                    Err(err) => {
                        if guard.is_current(seq) {
                            notice.try_set(Some(err.notification()));
                        }
                    }
                }
            });
        })
    };
    on_cleanup(move || guard.cancel_all());

    // Every query mutation (page, size, filters) refetches; this is also
    // the initial load.
    Effect::new(move |_| {
        query.with(|_| ());
        refetch.run(());
    });

    // ---- form ----------------------------------------------------------

    let open_form = {
        let entity_name = entity_name.clone();
        let fields = fields.clone();
        let renderers = renderers.clone();
        let store = store.clone();
        let prepare = prepare.clone();
        Callback::new(move |record: Option<Value>| {
            let id = record.as_ref().and_then(record_id);
            let Some(next) = workflow.get_untracked().open_form(id.clone()) else {
                log::warn!("ignoring open-form while busy");
                return;
            };
            workflow.set(next);
            form_error.set(None);
            draft.set(match &record {
                Some(r) => FormDraft::from_record(r.clone()),
                None => FormDraft::new(),
            });

            let editing = id.is_some();
            let form_title = if editing {
                format!("Edit {entity_name}")
            } else {
                format!("New {entity_name}")
            };
            let fields = fields.clone();
            let renderers = renderers.clone();
            let store = store.clone();
            let prepare = prepare.clone();

            // Overlay click and Escape must not interrupt an in-flight submit.
            let can_close: Arc<dyn Fn() -> bool + Send + Sync> = Arc::new(move || {
                !matches!(workflow.get_untracked(), WorkflowState::Submitting { .. })
            });

            // A dismissal is a cancel: the machine returns to Idle and
            // the draft dies with the modal.
            let on_dismiss: Arc<dyn Fn() + Send + Sync> = Arc::new(move || {
                if let Some(next) = workflow.get_untracked().cancel_form() {
                    workflow.set(next);
                }
            });

            modal_stack.push_with_frame(
                Some("max-width: min(640px, 95vw); width: min(640px, 95vw);".to_string()),
                Some("crud-form-modal".to_string()),
                Some(can_close),
                Some(on_dismiss),
                move |handle| {
                    let on_cancel = {
                        let handle = handle.clone();
                        Callback::new(move |_| {
                            if let Some(next) = workflow.get_untracked().cancel_form() {
                                workflow.set(next);
                            }
                            handle.close();
                        })
                    };

                    let on_submit = {
                        let store = store.clone();
                        let handle = handle.clone();
                        let id = id.clone();
                        let prepare = prepare.clone();
                        Callback::new(move |payload: Value| {
                            let Some(next) = workflow.get_untracked().begin_submit() else {
                                return;
                            };
                            workflow.set(next);
                            form_error.set(None);
                            let payload = match &prepare {
                                Some(adjust) => adjust(payload),
                                None => payload,
                            };
                            let store = store.clone();
                            let handle = handle.clone();
                            let id = id.clone();
                            spawn_local(async move {
                                let result = match &id {
                                    Some(id) => store.update(id, payload).await,
                                    None => store.create(payload).await,
                                };
                                match result {
                                    Ok(_) => {
                                        if let Some(next) =
                                            workflow.get_untracked().submit_succeeded()
                                        {
                                            workflow.set(next);
                                        }
                                        handle.close();
                                        if id.is_none() {
                                            // A created record may land on any
                                            // page; show the list from the top.
                                            query.try_update(|q| q.reset_to_first_page());
                                        } else {
                                            refetch.run(());
                                        }
                                    }
                                    Err(CrudError::NotFound) => {
                                        if let Some(next) =
                                            workflow.get_untracked().submit_succeeded()
                                        {
                                            workflow.set(next);
                                        }
                                        handle.close();
                                        notice.try_set(Some(
                                            "This record no longer exists".to_string(),
                                        ));
                                        refetch.run(());
                                    }
                                    Err(err) => {
                                        if let Some(next) =
                                            workflow.get_untracked().submit_failed()
                                        {
                                            workflow.set(next);
                                        }
                                        form_error.try_set(Some(err.notification()));
                                    }
                                }
                            });
                        })
                    };

                    let submitting = Signal::derive(move || {
                        matches!(workflow.get(), WorkflowState::Submitting { .. })
                    });

                    view! {
                        <CrudForm
                            title=form_title.clone()
                            fields=fields.clone()
                            draft=draft
                            editing=editing
                            submitting=submitting
                            form_error=form_error
                            renderers=renderers.clone()
                            on_submit=on_submit
                            on_cancel=on_cancel
                        />
                    }
                    .into_any()
                },
            );
        })
    };

    // ---- delete --------------------------------------------------------

    let on_delete_request = Callback::new(move |id: String| {
        match workflow.get_untracked().request_delete(id) {
            Some(next) => workflow.set(next),
            None => log::warn!("ignoring delete request while busy"),
        }
    });

    let on_delete_cancel = Callback::new(move |_: ()| {
        if let Some(next) = workflow.get_untracked().resolve_delete() {
            workflow.set(next);
        }
    });

    let on_delete_confirm = {
        let store = store.clone();
        Callback::new(move |id: String| {
            let Some(next) = workflow.get_untracked().resolve_delete() else {
                return;
            };
            workflow.set(next);
            let remaining = items.with_untracked(|rows| {
                rows.iter()
                    .filter(|r| record_id(r).as_deref() != Some(id.as_str()))
                    .count()
            });
            let store = store.clone();
            spawn_local(async move {
                match store.delete(&id).await {
                    Ok(()) => {
                        // The update always notifies the query effect, so
                        // this refetches even when the page stays put.
                        query.try_update(|q| q.step_back_if_empty(remaining));
                    }
                    Err(CrudError::NotFound) => {
                        notice.try_set(Some("This record no longer exists".to_string()));
                        query.try_update(|q| q.step_back_if_empty(remaining));
                    }
                    Err(err) => {
                        notice.try_set(Some(err.notification()));
                    }
                }
            });
        })
    };

    let on_edit = Callback::new(move |record: Value| {
        open_form.run(Some(record));
    });

    let pending_delete =
        Signal::derive(move || workflow.get().pending_delete().map(str::to_string));

    // ---- filters -------------------------------------------------------

    let filter_fields = StoredValue::new(filter_fields);
    let active_filter_count = Signal::derive(move || query.with(|q| q.active_filter_count()));

    view! {
        <div class="page">
            <div class="header">
                <div class="header__content">
                    <h1 class="header__title">{title}</h1>
                </div>
                <div class="header__actions">
                    <Show when=move || can_create>
                        <button
                            class="button button--primary"
                            on:click=move |_| open_form.run(None)
                        >
                            {icon("plus")}
                            "New"
                        </button>
                    </Show>
                    <button
                        class="button button--secondary"
                        on:click=move |_| refetch.run(())
                    >
                        {icon("refresh")}
                        "Refresh"
                    </button>
                </div>
            </div>

            {move || notice.get().map(|message| view! {
                <div class="warning-box" style="background: var(--color-error-50); border-color: var(--color-error-100);">
                    <span class="warning-box__icon" style="color: var(--color-error);">"⚠"</span>
                    <span class="warning-box__text" style="color: var(--color-error);">{message}</span>
                </div>
            })}

            <FilterPanel
                is_expanded=filter_expanded
                active_filters_count=active_filter_count
                pagination_controls=move || view! {
                    <PaginationControls
                        current_page=Signal::derive(move || query.with(|q| q.page_no))
                        total_pages=Signal::derive(move || {
                            query.with(|q| q.total_pages(total.get()))
                        })
                        total_count=total
                        page_size=Signal::derive(move || query.with(|q| q.page_size))
                        on_page_change=Callback::new(move |page| {
                            query.update(|q| q.set_page(page));
                        })
                        on_page_size_change=Callback::new(move |size| {
                            query.update(|q| q.set_page_size(size));
                        })
                    />
                }.into_any()
                filter_content=move || {
                    filter_fields.with_value(|specs| {
                        specs
                            .iter()
                            .cloned()
                            .map(|spec| render_filter_field(spec, query))
                            .collect_view()
                    }).into_any()
                }
            />

            <CrudTable
                columns=columns.clone()
                items=items
                pending_delete=pending_delete
                on_edit=on_edit
                on_delete_request=on_delete_request
                on_delete_confirm=on_delete_confirm
                on_delete_cancel=on_delete_cancel
                can_delete=can_delete
                row_actions=row_actions.clone()
            />
        </div>
    }
}

/// Filter widgets write straight into the query's filter map; every
/// submitted change restarts from the first page.
fn render_filter_field(spec: FieldSpec, query: RwSignal<QueryState>) -> AnyView {
    let key = spec.name.dotted();
    let value = {
        let key = key.clone();
        Signal::derive(move || {
            query.with(|q| q.filter_text(&key).unwrap_or_default().to_string())
        })
    };
    let on_change = Callback::new(move |text: String| {
        query.update(|q| q.apply_filter(key.clone(), Some(FilterValue::Text(text))));
    });

    match spec.kind {
        FieldKind::Select => view! {
            <Select
                label=spec.label.clone()
                value=value
                on_change=on_change
                options=spec.options.clone()
                placeholder=spec.placeholder.clone().unwrap_or_default()
            />
        }
        .into_any(),
        _ => view! {
            <Input
                label=spec.label.clone()
                value=value
                on_input=on_change
                placeholder=spec.placeholder.clone().unwrap_or_default()
            />
        }
        .into_any(),
    }
}
