use super::event::EditEvent;
use super::model::EditState;
use thiserror::Error;

pub type StateResult<T> = std::result::Result<T, StateError>;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("invalid edit state transition: from {from:?} using event {event:?}")]
    InvalidStateTransition { from: EditState, event: EditEvent },
}
