pub mod color;
pub mod contrast;
pub mod editor;
pub mod error;
pub mod history;
pub mod logging;
pub mod sharing;
pub mod state;
pub mod theme;

pub use error::{AppError, AppResult};

/// Entrypoint used by host integrations embedding a standalone session.
pub fn init() {
    logging::init();
    tracing::info!("huelab core initialized");
}
