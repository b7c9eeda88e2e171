//! Read-only seam to the theme sharing service. The host wires
//! [`SharedThemeSource`] to its network layer; the core only consumes
//! fetched configs and never writes back.

use thiserror::Error;

use crate::theme::ThemeConfig;

pub type SharingResult<T> = std::result::Result<T, SharingError>;

#[derive(Debug, Error)]
pub enum SharingError {
    #[error("shared theme id is empty")]
    MissingThemeId,
    #[error("failed to fetch shared theme {id}: {message}")]
    Fetch { id: String, message: String },
}

pub trait SharedThemeSource {
    /// `Ok(None)` means the id is unknown, which callers treat as a fresh
    /// start rather than a failure.
    fn fetch_theme(&self, id: &str) -> SharingResult<Option<ThemeConfig>>;
}

pub fn load_shared_theme<S: SharedThemeSource>(
    source: &S,
    id: &str,
) -> SharingResult<Option<ThemeConfig>> {
    if id.is_empty() {
        return Err(SharingError::MissingThemeId);
    }
    let fetched = source.fetch_theme(id)?;
    if fetched.is_none() {
        tracing::debug!(%id, "shared theme not found");
    }
    Ok(fetched)
}
