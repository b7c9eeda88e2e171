use super::error::{StateError, StateResult};
use super::event::{EditEvent, StateTransition};
use super::model::EditState;

/// Finite state machine for one role-edit session: `Idle`, `Editing`, and
/// `LivePreviewing`, with save/cancel collapsing back to `Idle`.
#[derive(Debug, Default)]
pub struct EditStateMachine {
    state: EditState,
    transition_history: Vec<StateTransition>,
}

impl EditStateMachine {
    pub fn new() -> Self {
        Self {
            state: EditState::Idle,
            transition_history: Vec::new(),
        }
    }

    pub fn state(&self) -> &EditState {
        &self.state
    }

    pub fn can_transition(&self, event: &EditEvent) -> bool {
        self.next_state(event).is_some()
    }

    pub fn next_state(&self, event: &EditEvent) -> Option<EditState> {
        use EditEvent::*;
        match (&self.state, event) {
            (
                EditState::Idle,
                BeginEdit {
                    role,
                    original_value,
                },
            ) => Some(EditState::Editing {
                role: role.clone(),
                original_value: original_value.clone(),
            }),
            (
                EditState::Editing {
                    role,
                    original_value,
                }
                | EditState::LivePreviewing {
                    role,
                    original_value,
                    ..
                },
                Preview { value },
            ) => Some(EditState::LivePreviewing {
                role: role.clone(),
                original_value: original_value.clone(),
                temp_value: value.clone(),
            }),
            (EditState::Editing { .. } | EditState::LivePreviewing { .. }, Save | Cancel) => {
                Some(EditState::Idle)
            }
            _ => None,
        }
    }

    pub fn transition(&mut self, event: EditEvent) -> StateResult<&EditState> {
        tracing::debug!(from = ?self.state, event = ?event, "request edit state transition");
        let next = self.next_state(&event).ok_or_else(|| {
            tracing::warn!(from = ?self.state, event = ?event, "invalid edit state transition requested");
            StateError::InvalidStateTransition {
                from: self.state.clone(),
                event: event.clone(),
            }
        })?;

        let record = StateTransition::new(Some(self.state.clone()), event, next.clone());
        self.state = next;
        self.transition_history.push(record);

        Ok(&self.state)
    }
}

#[cfg(test)]
impl EditStateMachine {
    fn history(&self) -> &[StateTransition] {
        &self.transition_history
    }
}
