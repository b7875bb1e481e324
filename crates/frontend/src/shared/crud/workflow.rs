//! List/form workflow state machine.
//!
//! Transitions fire only on explicit user actions; there is no
//! background transition. Illegal transitions are ignored and logged by
//! the orchestrator rather than panicking mid-interaction.

/// Orchestrator state over the list/form relationship.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WorkflowState {
    /// List shown, nothing in flight.
    #[default]
    Idle,
    /// Form open; `id` is `None` for create, `Some` for edit.
    Editing { id: Option<String> },
    /// Submit in flight for the open form.
    Submitting { id: Option<String> },
    /// Row delete requested, waiting for the explicit confirm click.
    ConfirmingDelete { id: String },
}

impl WorkflowState {
    /// Row id pending delete confirmation, if any.
    pub fn pending_delete(&self) -> Option<&str> {
        match self {
            Self::ConfirmingDelete { id } => Some(id),
            _ => None,
        }
    }

    /// open-create / open-edit from the list.
    pub fn open_form(&self, id: Option<String>) -> Option<Self> {
        match self {
            Self::Idle | Self::ConfirmingDelete { .. } => Some(Self::Editing { id }),
            _ => None,
        }
    }

    /// Submit clicked with a locally valid form.
    pub fn begin_submit(&self) -> Option<Self> {
        match self {
            Self::Editing { id } => Some(Self::Submitting { id: id.clone() }),
            _ => None,
        }
    }

    /// Adapter success: form closes, list refreshes.
    pub fn submit_succeeded(&self) -> Option<Self> {
        match self {
            Self::Submitting { .. } => Some(Self::Idle),
            _ => None,
        }
    }

    /// Validation or remote failure: back to editing, draft preserved.
    pub fn submit_failed(&self) -> Option<Self> {
        match self {
            Self::Submitting { id } => Some(Self::Editing { id: id.clone() }),
            _ => None,
        }
    }

    /// Cancel from the form discards the draft unconditionally.
    pub fn cancel_form(&self) -> Option<Self> {
        match self {
            Self::Editing { .. } | Self::Submitting { .. } => Some(Self::Idle),
            _ => None,
        }
    }

    /// First click of the two-phase delete.
    pub fn request_delete(&self, id: String) -> Option<Self> {
        match self {
            Self::Idle | Self::ConfirmingDelete { .. } => Some(Self::ConfirmingDelete { id }),
            _ => None,
        }
    }

    /// Confirm or cancel of the pending delete; either way the machine
    /// returns to Idle (the delete call itself is the orchestrator's).
    pub fn resolve_delete(&self) -> Option<Self> {
        match self {
            Self::ConfirmingDelete { .. } => Some(Self::Idle),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_submit_cycle() {
        let state = WorkflowState::Idle;
        let state = state.open_form(None).unwrap();
        assert_eq!(state, WorkflowState::Editing { id: None });
        let state = state.begin_submit().unwrap();
        assert_eq!(state, WorkflowState::Submitting { id: None });
        assert_eq!(state.submit_succeeded().unwrap(), WorkflowState::Idle);
    }

    #[test]
    fn test_failed_submit_returns_to_editing() {
        let state = WorkflowState::Submitting {
            id: Some("7".into()),
        };
        assert_eq!(
            state.submit_failed().unwrap(),
            WorkflowState::Editing {
                id: Some("7".into())
            }
        );
    }

    #[test]
    fn test_delete_requires_intent_then_confirm() {
        // A single click only reaches ConfirmingDelete; the delete call
        // is gated behind resolve_delete.
        let state = WorkflowState::Idle;
        let state = state.request_delete("3".into()).unwrap();
        assert_eq!(state.pending_delete(), Some("3"));
        assert_eq!(state.resolve_delete().unwrap(), WorkflowState::Idle);
    }

    #[test]
    fn test_no_background_transitions_from_submitting() {
        let state = WorkflowState::Submitting { id: None };
        assert_eq!(state.open_form(None), None);
        assert_eq!(state.request_delete("1".into()), None);
        assert_eq!(state.begin_submit(), None);
    }

    #[test]
    fn test_cancel_discards_editing() {
        let state = WorkflowState::Editing { id: Some("9".into()) };
        assert_eq!(state.cancel_form().unwrap(), WorkflowState::Idle);
        assert_eq!(WorkflowState::Idle.cancel_form(), None);
    }

    #[test]
    fn test_reopen_after_dismissed_form() {
        // Escape / overlay dismissal cancels the editing session; the
        // next open-create must succeed instead of being swallowed.
        let state = WorkflowState::Idle.open_form(Some("5".into())).unwrap();
        assert_eq!(state.open_form(None), None);
        let state = state.cancel_form().unwrap();
        assert_eq!(
            state.open_form(None),
            Some(WorkflowState::Editing { id: None })
        );
    }

    #[test]
    fn test_second_delete_intent_replaces_first() {
        let state = WorkflowState::Idle.request_delete("1".into()).unwrap();
        let state = state.request_delete("2".into()).unwrap();
        assert_eq!(state.pending_delete(), Some("2"));
    }
}
