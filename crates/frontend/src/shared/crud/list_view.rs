//! Declarative table over one page of records.
//!
//! The table owns no data and makes no requests: it projects records
//! through the declared columns and reports row intents (edit, delete,
//! custom actions) upward through callbacks. Delete is two-phase: the
//! first click only arms the row, the destructive call happens after
//! the explicit confirm click.

use contracts::shared::metadata::ColumnSpec;
use leptos::prelude::*;
use serde_json::Value;
use std::sync::Arc;

use crate::shared::icons::icon;

/// Record identity as the engine sees it: the top-level `id` value,
/// stringified. Records without one cannot be edited or deleted.
pub fn record_id(record: &Value) -> Option<String> {
    match record.get("id") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

/// Extra per-row action declared by the host page (download, clone, ...).
#[derive(Clone)]
pub struct RowAction {
    pub label: String,
    pub icon: Option<String>,
    /// Row-level visibility; absent means shown on every row.
    pub visible_when: Option<Arc<dyn Fn(&Value) -> bool + Send + Sync>>,
    pub run: Callback<Value>,
}

impl RowAction {
    pub fn new(label: impl Into<String>, run: Callback<Value>) -> Self {
        Self {
            label: label.into(),
            icon: None,
            visible_when: None,
            run,
        }
    }

    pub fn icon(mut self, name: impl Into<String>) -> Self {
        self.icon = Some(name.into());
        self
    }

    pub fn visible_when(
        mut self,
        predicate: impl Fn(&Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.visible_when = Some(Arc::new(predicate));
        self
    }

    fn is_visible(&self, record: &Value) -> bool {
        self.visible_when.as_ref().map_or(true, |p| p(record))
    }
}

#[component]
pub fn CrudTable(
    /// Declared columns, projected left to right.
    columns: Vec<ColumnSpec>,
    /// Current page of records.
    #[prop(into)]
    items: Signal<Vec<Value>>,
    /// Row id currently armed for deletion, if any.
    #[prop(into)]
    pending_delete: Signal<Option<String>>,
    /// Row click opens the editor with the row's record.
    on_edit: Callback<Value>,
    /// First delete click: arm the row.
    on_delete_request: Callback<String>,
    /// Second click on the armed row: perform the delete.
    on_delete_confirm: Callback<String>,
    /// Explicit back-off from an armed delete.
    on_delete_cancel: Callback<()>,
    /// Whether the current role may delete at all.
    #[prop(optional)]
    can_delete: bool,
    /// Page-declared extra actions.
    #[prop(optional)]
    row_actions: Vec<RowAction>,
) -> impl IntoView {
    let columns = StoredValue::new(columns);
    let row_actions = StoredValue::new(row_actions);
    let has_actions = can_delete || !row_actions.with_value(|a| a.is_empty());

    view! {
        <div class="table">
            <table class="table__data table--striped">
                <thead class="table__head">
                    <tr>
                        {columns.with_value(|cols| {
                            cols.iter()
                                .map(|col| {
                                    let style = col
                                        .width
                                        .map(|w| format!("width: {w}px;"))
                                        .unwrap_or_default();
                                    view! {
                                        <th class="table__header-cell" style=style>
                                            {col.title.clone()}
                                        </th>
                                    }
                                })
                                .collect_view()
                        })}
                        <Show when=move || has_actions>
                            <th class="table__header-cell table__header-cell--actions"></th>
                        </Show>
                    </tr>
                </thead>
                <tbody>
                    {move || {
                        items
                            .get()
                            .into_iter()
                            .map(|record| {
                                let id = record_id(&record);
                                let cells = columns.with_value(|cols| {
                                    cols.iter()
                                        .map(|col| col.cell_text(&record))
                                        .collect::<Vec<String>>()
                                });
                                let record_for_edit = record.clone();
                                let armed = {
                                    let id = id.clone();
                                    Signal::derive(move || {
                                        id.is_some() && pending_delete.get() == id
                                    })
                                };
                                view! {
                                    <tr
                                        class="table__row"
                                        class:table__row--selected=armed
                                        on:click=move |_| on_edit.run(record_for_edit.clone())
                                    >
                                        {cells
                                            .into_iter()
                                            .map(|text| view! { <td class="table__cell">{text}</td> })
                                            .collect_view()}
                                        <Show when=move || has_actions>
                                            <td
                                                class="table__cell table__cell--actions"
                                                on:click=move |ev| ev.stop_propagation()
                                            >
                                                {row_actions.with_value(|actions| {
                                                    actions
                                                        .iter()
                                                        .filter(|action| action.is_visible(&record))
                                                        .map(|action| {
                                                            let run = action.run;
                                                            let record = record.clone();
                                                            view! {
                                                                <button
                                                                    class="button button--secondary button--small"
                                                                    title=action.label.clone()
                                                                    on:click=move |_| run.run(record.clone())
                                                                >
                                                                    {action.icon.as_deref().map(icon)}
                                                                    {action.label.clone()}
                                                                </button>
                                                            }
                                                        })
                                                        .collect_view()
                                                })}
                                                {id
                                                    .clone()
                                                    .filter(|_| can_delete)
                                                    .map(|id| {
                                                        let id_for_request = id.clone();
                                                        let id_for_confirm = id.clone();
                                                        view! {
                                                            <Show
                                                                when=move || armed.get()
                                                                fallback=move || {
                                                                    let id = id_for_request.clone();
                                                                    view! {
                                                                        <button
                                                                            class="button button--secondary button--small"
                                                                            title="Delete"
                                                                            on:click=move |_| {
                                                                                on_delete_request.run(id.clone())
                                                                            }
                                                                        >
                                                                            {icon("delete")}
                                                                        </button>
                                                                    }
                                                                }
                                                            >
                                                                {
                                                                    let id = id_for_confirm.clone();
                                                                    view! {
                                                                        <button
                                                                            class="button button--danger button--small"
                                                                            on:click=move |_| {
                                                                                on_delete_confirm.run(id.clone())
                                                                            }
                                                                        >
                                                                            "Confirm"
                                                                        </button>
                                                                        <button
                                                                            class="button button--secondary button--small"
                                                                            on:click=move |_| on_delete_cancel.run(())
                                                                        >
                                                                            "Cancel"
                                                                        </button>
                                                                    }
                                                                }
                                                            </Show>
                                                        }
                                                    })}
                                            </td>
                                        </Show>
                                    </tr>
                                }
                            })
                            .collect_view()
                    }}
                </tbody>
            </table>
            <Show when=move || items.get().is_empty()>
                <div class="table__empty">"No data"</div>
            </Show>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_id_stringifies() {
        assert_eq!(record_id(&json!({"id": "a1"})), Some("a1".to_string()));
        assert_eq!(record_id(&json!({"id": 7})), Some("7".to_string()));
        assert_eq!(record_id(&json!({"name": "x"})), None);
    }

    #[test]
    fn test_row_action_visibility() {
        let action = RowAction::new("Download", Callback::new(|_| {}))
            .visible_when(|record| record["type"] == json!("IOS"));
        assert!(action.is_visible(&json!({"type": "IOS"})));
        assert!(!action.is_visible(&json!({"type": "Android"})));
        let always = RowAction::new("Clone", Callback::new(|_| {}));
        assert!(always.is_visible(&json!({})));
    }
}
