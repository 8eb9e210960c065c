use crate::models::TargetId;
use crate::registry::RegistryError;
use crate::schema::SchemaError;
use crate::transport::ConnectionError;
use std::time::Duration;
use thiserror::Error;

/// Every outcome a control call can report other than success.
///
/// `Unsupported` is an expected answer, not a failure: callers typically
/// grey out the corresponding control. Use [`SupportExt::optional`] to fold
/// it into `Ok(None)` where that distinction does not matter.
#[derive(Debug, Error)]
pub enum ControlError {
    #[error("{target} does not support {operation}")]
    Unsupported { target: TargetId, operation: String },
    #[error("schema mismatch: {0}")]
    Schema(#[from] SchemaError),
    #[error("{target} is unavailable: {reason}")]
    RemoteUnavailable { target: TargetId, reason: String },
    #[error("{object} no longer exists in {target}")]
    ObjectGone { target: TargetId, object: String },
    #[error("could not connect to {target}: {source}")]
    Connection {
        target: TargetId,
        source: ConnectionError,
    },
    #[error("{target} did not answer {operation} within {timeout:?}")]
    RemoteTimeout {
        target: TargetId,
        operation: String,
        timeout: Duration,
    },
    #[error("invalid {parameter}: {reason}")]
    InvalidParameter {
        parameter: &'static str,
        reason: String,
    },
    #[error("type mismatch on {property}: {detail}")]
    TypeMismatch { property: String, detail: String },
    #[error("property {property} is write-only")]
    PropertyNotReadable { property: String },
    #[error("property {property} is read-only")]
    PropertyNotWritable { property: String },
    #[error("{target} rejected {operation} (error {code}): {message}")]
    CommandFailed {
        target: TargetId,
        operation: String,
        code: i32,
        message: String,
    },
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Fieldless view of [`ControlError`] for matching on the outcome class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Unsupported,
    Schema,
    RemoteUnavailable,
    ObjectGone,
    Connection,
    RemoteTimeout,
    InvalidParameter,
    TypeMismatch,
    PropertyNotReadable,
    PropertyNotWritable,
    CommandFailed,
    Registry,
}

impl ControlError {
    pub fn unsupported(target: &TargetId, operation: impl Into<String>) -> Self {
        ControlError::Unsupported {
            target: target.clone(),
            operation: operation.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ControlError::Unsupported { .. } => ErrorKind::Unsupported,
            ControlError::Schema(_) => ErrorKind::Schema,
            ControlError::RemoteUnavailable { .. } => ErrorKind::RemoteUnavailable,
            ControlError::ObjectGone { .. } => ErrorKind::ObjectGone,
            ControlError::Connection { .. } => ErrorKind::Connection,
            ControlError::RemoteTimeout { .. } => ErrorKind::RemoteTimeout,
            ControlError::InvalidParameter { .. } => ErrorKind::InvalidParameter,
            ControlError::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            ControlError::PropertyNotReadable { .. } => ErrorKind::PropertyNotReadable,
            ControlError::PropertyNotWritable { .. } => ErrorKind::PropertyNotWritable,
            ControlError::CommandFailed { .. } => ErrorKind::CommandFailed,
            ControlError::Registry(_) => ErrorKind::Registry,
        }
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, ControlError::Unsupported { .. })
    }

    /// The target, or the addressed object within it, cannot be reached.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            ControlError::RemoteUnavailable { .. }
                | ControlError::ObjectGone { .. }
                | ControlError::Connection { .. }
        )
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ControlError::RemoteTimeout { .. })
    }
}

pub type ControlResult<T> = Result<T, ControlError>;

/// Opt-in folding of `Unsupported` into an absent value.
pub trait SupportExt<T> {
    fn optional(self) -> ControlResult<Option<T>>;
}

impl<T> SupportExt<T> for ControlResult<T> {
    fn optional(self) -> ControlResult<Option<T>> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_unsupported() => Ok(None),
            Err(err) => Err(err),
        }
    }
}
