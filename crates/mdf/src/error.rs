//! CLI error types.

use mdf_config::ConfigError;
use mdf_render::RenderError;
use mdf_version::ValidationFailure;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Render(#[from] RenderError),

    #[error("{0}")]
    Version(#[from] ValidationFailure),

    #[error("{0}")]
    Json(#[from] serde_json::Error),
}
