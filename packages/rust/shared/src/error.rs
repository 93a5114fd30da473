//! Error types for the curriculum builder.
//!
//! Library crates use [`CurriculumError`] via `thiserror`.
//! The CLI app wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all curriculum operations.
///
/// Every variant except a linking [`Transport`](CurriculumError::Transport)
/// failure is fatal for the run that raised it.
#[derive(Debug, thiserror::Error)]
pub enum CurriculumError {
    /// Pre-flight configuration error (missing credential, missing owner/repo).
    #[error("config error: {message}")]
    Config { message: String },

    /// A reasoning-service response could not be turned into the target schema.
    #[error("cannot normalize {source_shape} response to {schema}: {message}")]
    Normalization {
        source_shape: String,
        schema: &'static str,
        message: String,
    },

    /// The Markdown stage changed the shape of the curriculum.
    #[error("structural mismatch: {message}")]
    StructuralMismatch { message: String },

    /// Network or HTTP failure on a single external call.
    #[error("transport error during {operation}: {message}")]
    Transport { operation: String, message: String },

    /// A field value violates a model invariant.
    #[error("validation error at {path}: {message}")]
    Validation { path: String, message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, CurriculumError>;

impl CurriculumError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a normalization error for `schema` from a response of shape `source_shape`.
    pub fn normalization(
        source_shape: impl Into<String>,
        schema: &'static str,
        msg: impl Into<String>,
    ) -> Self {
        Self::Normalization {
            source_shape: source_shape.into(),
            schema,
            message: msg.into(),
        }
    }

    /// Create a structural mismatch error.
    pub fn structural_mismatch(msg: impl Into<String>) -> Self {
        Self::StructuralMismatch {
            message: msg.into(),
        }
    }

    /// Create a transport error for the named operation.
    pub fn transport(operation: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Transport {
            operation: operation.into(),
            message: msg.into(),
        }
    }

    /// Create a validation error at a field path such as `subtopics[1].difficulty_level`.
    pub fn validation_at(path: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Validation {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Prefix the field path of a validation error, leaving other variants untouched.
    pub fn within(self, prefix: &str) -> Self {
        match self {
            Self::Validation { path, message } => Self::Validation {
                path: format!("{prefix}.{path}"),
                message,
            },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = CurriculumError::config("missing API key");
        assert_eq!(err.to_string(), "config error: missing API key");

        let err = CurriculumError::normalization("text", "SubTopic", "expected value");
        let msg = err.to_string();
        assert!(msg.contains("text"));
        assert!(msg.contains("SubTopic"));
    }

    #[test]
    fn validation_path_is_prefixed() {
        let err = CurriculumError::validation_at("difficulty_level", "must be within 1..=5")
            .within("subtopics[2]");
        match err {
            CurriculumError::Validation { path, .. } => {
                assert_eq!(path, "subtopics[2].difficulty_level");
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn within_leaves_other_variants_alone() {
        let err = CurriculumError::transport("create_issue", "HTTP 500").within("subtopics[0]");
        assert!(matches!(err, CurriculumError::Transport { .. }));
    }
}
