//! Delta generator error types.

use thiserror::Error;

/// Broad class of a [`DeltaError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The generator API was misused (wrong handle for the operation).
    Usage,
    /// A widget or element received a bad argument.
    Validation,
    /// An operation name did not resolve on a handle.
    NameResolution,
    /// A message could not be encoded for export.
    Serialization,
}

#[derive(Debug, Error)]
pub enum DeltaError {
    #[error("usage error: {0}")]
    Usage(String),

    #[error("{widget} must have a label")]
    MissingLabel { widget: &'static str },

    #[error("invalid `{argument}`: {message}")]
    Validation {
        argument: &'static str,
        message: String,
    },

    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    #[error("wrong number of arguments to add_rows(): {0}")]
    Arity(String),

    #[error("Method `{name}()` does not exist for `{handle}`. Did you mean `rv.{name}()`?")]
    MethodNotOnHandle { name: String, handle: &'static str },

    #[error("`{name}()` is not a valid Rivulet command.")]
    InvalidCommand { name: String },

    #[error("chart component not implemented: {0}")]
    UnsupportedChartComponent(String),

    #[error("unknown chart component: {0}")]
    UnknownChartComponent(String),

    #[error("encode error: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DeltaError {
    pub(crate) fn validation(argument: &'static str, message: impl Into<String>) -> Self {
        DeltaError::Validation {
            argument,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DeltaError::Usage(_) => ErrorKind::Usage,
            DeltaError::MissingLabel { .. }
            | DeltaError::Validation { .. }
            | DeltaError::TypeMismatch(_)
            | DeltaError::Arity(_)
            | DeltaError::UnsupportedChartComponent(_)
            | DeltaError::UnknownChartComponent(_) => ErrorKind::Validation,
            DeltaError::MethodNotOnHandle { .. } | DeltaError::InvalidCommand { .. } => {
                ErrorKind::NameResolution
            }
            DeltaError::Encode(_) | DeltaError::Json(_) => ErrorKind::Serialization,
        }
    }

    /// Name shown as the exception type when the error is rendered.
    pub fn type_name(&self) -> &'static str {
        match self {
            DeltaError::Usage(_) => "UsageError",
            DeltaError::MissingLabel { .. } => "LabelError",
            DeltaError::Validation { .. } => "ValidationError",
            DeltaError::TypeMismatch(_) => "TypeMismatchError",
            DeltaError::Arity(_) => "ArityError",
            DeltaError::MethodNotOnHandle { .. } | DeltaError::InvalidCommand { .. } => {
                "NameError"
            }
            DeltaError::UnsupportedChartComponent(_) | DeltaError::UnknownChartComponent(_) => {
                "ChartError"
            }
            DeltaError::Encode(_) | DeltaError::Json(_) => "SerializationError",
        }
    }
}
