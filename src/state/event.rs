use super::model::EditState;

/// Events the session controller feeds into the edit state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditEvent {
    /// Click-to-edit: captures the role's current value.
    BeginEdit { role: String, original_value: String },
    /// A validated keystroke or picker change.
    Preview { value: String },
    Save,
    Cancel,
}

/// A single applied transition, kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateTransition {
    pub from: Option<EditState>,
    pub event: EditEvent,
    pub to: EditState,
}

impl StateTransition {
    pub fn new(from: Option<EditState>, event: EditEvent, to: EditState) -> Self {
        Self { from, event, to }
    }
}
