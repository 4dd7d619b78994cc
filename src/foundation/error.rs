use std::path::{Path, PathBuf};

/// Convenience result type used across spritecap.
pub type CaptureResult<T> = Result<T, CaptureError>;

/// Top-level error taxonomy used by capture APIs.
#[derive(thiserror::Error, Debug)]
pub enum CaptureError {
    /// Invalid user-provided configuration (frame count, zoom, sizes).
    #[error("validation error: {0}")]
    Validation(String),

    /// Invalid timeline access or malformed scene data.
    #[error("timeline error: {0}")]
    Timeline(String),

    /// Render target allocation or rasterization failures.
    #[error("render error: {0}")]
    Render(String),

    /// Image encoding failures.
    #[error("encode error: {0}")]
    Encode(String),

    /// Filesystem failure tied to a concrete path.
    #[error("io error at '{}': {source}", path.display())]
    Io {
        /// Path that was being created or written.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// Wrapped lower-level error from dependencies.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CaptureError {
    /// Build a [`CaptureError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`CaptureError::Timeline`] value.
    pub fn timeline(msg: impl Into<String>) -> Self {
        Self::Timeline(msg.into())
    }

    /// Build a [`CaptureError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`CaptureError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`CaptureError::Io`] value for `path`.
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
