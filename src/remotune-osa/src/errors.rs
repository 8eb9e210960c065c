//! Translation of AppleScript error numbers into transport errors.

use remotune_core::models::AccessState;
use remotune_core::transport::{ConnectionError, RemoteError};

pub const ERR_NOT_RUNNING: i32 = -600;
pub const ERR_CONNECTION_INVALID: i32 = -609;
pub const ERR_COERCION: i32 = -1700;
pub const ERR_NOT_UNDERSTOOD: i32 = -1708;
pub const ERR_TIMEOUT: i32 = -1712;
pub const ERR_NO_SUCH_OBJECT: i32 = -1728;
pub const ERR_ACCESS_DENIED: i32 = -1743;
pub const ERR_CONSENT_REQUIRED: i32 = -1744;
pub const ERR_TYPE_MISMATCH: i32 = -10001;
pub const ERR_NOT_MODIFIABLE: i32 = -10003;
pub const ERR_READ_ONLY: i32 = -10006;
pub const ERR_APPLICATION_NOT_FOUND: i32 = -10814;

/// Error for a call on an established connection.
///
/// Failures without a number are reported as code 0.
pub fn remote_error(code: Option<i32>, message: &str) -> RemoteError {
    match code {
        Some(ERR_TIMEOUT) => RemoteError::Timeout,
        Some(ERR_NOT_RUNNING | ERR_CONNECTION_INVALID | ERR_ACCESS_DENIED | ERR_CONSENT_REQUIRED) => {
            RemoteError::ConnectionLost
        }
        Some(ERR_NO_SUCH_OBJECT) => RemoteError::ObjectNotFound,
        Some(ERR_NOT_UNDERSTOOD) => RemoteError::NotUnderstood,
        Some(ERR_NOT_MODIFIABLE | ERR_READ_ONLY) => RemoteError::ReadOnly,
        Some(ERR_COERCION | ERR_TYPE_MISMATCH) => RemoteError::Coercion(message.to_owned()),
        Some(code) => RemoteError::Failed {
            code,
            message: message.to_owned(),
        },
        None => RemoteError::Failed {
            code: 0,
            message: message.to_owned(),
        },
    }
}

/// Error while establishing a connection.
pub fn connection_error(code: Option<i32>, message: &str) -> ConnectionError {
    match code {
        Some(ERR_NOT_RUNNING | ERR_CONNECTION_INVALID) => ConnectionError::NotRunning,
        Some(ERR_ACCESS_DENIED) => ConnectionError::AccessDenied,
        Some(ERR_CONSENT_REQUIRED) => ConnectionError::AccessPending,
        Some(ERR_NO_SUCH_OBJECT | ERR_APPLICATION_NOT_FOUND) => ConnectionError::NotInstalled,
        Some(ERR_TIMEOUT) => ConnectionError::Transport("access check timed out".to_owned()),
        _ => ConnectionError::Transport(message.to_owned()),
    }
}

/// The access state a connection failure reveals, if any.
pub fn access_state(error: &ConnectionError) -> Option<AccessState> {
    match error {
        ConnectionError::AccessDenied => Some(AccessState::AccessDenied),
        ConnectionError::AccessPending => Some(AccessState::AccessPending),
        ConnectionError::NotRunning => Some(AccessState::NotRunning),
        _ => None,
    }
}
