//! The declarative CRUD engine: pages declare columns, fields and a
//! store adapter; the engine owns fetching, editing, validation and
//! deletion.

pub mod fetch_guard;
pub mod form_state;
pub mod form_view;
pub mod list_view;
pub mod orchestrator;
pub mod store;
pub mod workflow;

pub use fetch_guard::SequenceGuard;
pub use form_state::FormDraft;
pub use form_view::{CrudForm, CustomFieldCtx, CustomRenderer, RendererMap};
pub use list_view::{record_id, CrudTable, RowAction};
pub use orchestrator::{CrudPage, PayloadPrepare, PermissionCheck};
pub use store::{DataStore, ListPage, RestStore, StoreFuture};
pub use workflow::WorkflowState;
