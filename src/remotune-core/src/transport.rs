//! The seam between the core and whatever actually talks to the target.
//!
//! The core never marshals anything itself. It hands object paths, property
//! names, and command invocations to a [`RemoteObjectProxy`] and gets typed
//! values or typed errors back.

pub mod memory;

use crate::models::{AccessState, TargetId};
use crate::value::{ObjectPath, Value};
use std::time::Duration;
use thiserror::Error;

/// A live channel to one running target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Connection {
    pub id: u64,
    pub target: TargetId,
}

/// A command sent to a remote object.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub command: String,
    /// Direct parameter, if the command takes one.
    pub direct: Option<Value>,
    /// Labelled parameters in the order they were added.
    pub params: Vec<(String, Value)>,
}

impl Invocation {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            direct: None,
            params: Vec::new(),
        }
    }

    pub fn with_direct(mut self, value: Value) -> Self {
        self.direct = Some(value);
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: Value) -> Self {
        self.params.push((name.into(), value));
        self
    }

    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params
            .iter()
            .find(|(label, _)| label == name)
            .map(|(_, value)| value)
    }
}

/// Failures reported by the proxy for an individual remote call.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RemoteError {
    #[error("remote call timed out")]
    Timeout,
    #[error("connection to the target was lost")]
    ConnectionLost,
    #[error("object not found")]
    ObjectNotFound,
    #[error("target did not understand the request")]
    NotUnderstood,
    #[error("property is read-only")]
    ReadOnly,
    #[error("value could not be coerced: {0}")]
    Coercion(String),
    #[error("remote error {code}: {message}")]
    Failed { code: i32, message: String },
}

/// Failures establishing a connection.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConnectionError {
    #[error("target is not installed")]
    NotInstalled,
    #[error("target is not running")]
    NotRunning,
    #[error("automation access was denied")]
    AccessDenied,
    #[error("automation access has not been granted yet")]
    AccessPending,
    #[error("failed to launch target: {0}")]
    LaunchFailed(String),
    #[error("transport failure: {0}")]
    Transport(String),
}

/// Transport to scriptable applications.
///
/// Every call blocks until the target answers or `timeout` elapses. Calls on
/// one connection are issued in order; implementations never retry.
pub trait RemoteObjectProxy: Send + Sync {
    fn connect(&self, target: &TargetId, launch_if_needed: bool) -> Result<Connection, ConnectionError>;

    fn get_property(
        &self,
        connection: &Connection,
        object: &ObjectPath,
        property: &str,
        timeout: Duration,
    ) -> Result<Value, RemoteError>;

    fn set_property(
        &self,
        connection: &Connection,
        object: &ObjectPath,
        property: &str,
        value: &Value,
        timeout: Duration,
    ) -> Result<(), RemoteError>;

    fn invoke(
        &self,
        connection: &Connection,
        object: &ObjectPath,
        invocation: &Invocation,
        timeout: Duration,
    ) -> Result<Value, RemoteError>;

    /// Paths of the elements of `class` contained in `object`, in order.
    fn enumerate_children(
        &self,
        connection: &Connection,
        object: &ObjectPath,
        class: &str,
        timeout: Duration,
    ) -> Result<Vec<ObjectPath>, RemoteError>;

    /// Reports whether the target runs and may be automated, without
    /// prompting the user.
    fn access_state(&self, target: &TargetId) -> AccessState;

    fn disconnect(&self, _connection: &Connection) {}
}
