use crate::color::ColorError;
use crate::editor::EditorError;
use crate::sharing::SharingError;
use crate::state::StateError;
use crate::theme::ThemeError;
use thiserror::Error;

pub type AppResult<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Color(#[from] ColorError),
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Theme(#[from] ThemeError),
    #[error(transparent)]
    Editor(#[from] EditorError),
    #[error(transparent)]
    Sharing(#[from] SharingError),
}
