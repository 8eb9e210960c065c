//! [`RemoteObjectProxy`] over `osascript`.

use crate::errors::{self, ERR_ACCESS_DENIED, ERR_CONSENT_REQUIRED};
use crate::host::{HostConfig, HostError, ScriptHost};
use crate::parse::parse_result;
use crate::script;
use remotune_core::models::{AccessState, TargetId};
use remotune_core::transport::{
    Connection, ConnectionError, Invocation, RemoteError, RemoteObjectProxy,
};
use remotune_core::value::{ObjectPath, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Allowance for process start-up on top of the AppleScript timeout.
const HOST_GRACE: Duration = Duration::from_secs(1);
const PROBE_TIMEOUT: Duration = Duration::from_secs(2);
/// Long enough for the user to answer the automation consent prompt.
const CONSENT_TIMEOUT: Duration = Duration::from_secs(30);
const LAUNCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Talks to targets by running one AppleScript per call.
///
/// Connections are bookkeeping only: each call verifies the target still
/// runs, and a quit target invalidates every connection to it.
pub struct OsaProxy {
    host: ScriptHost,
    connections: Mutex<HashMap<u64, TargetId>>,
    access: Mutex<HashMap<TargetId, AccessState>>,
    next_id: AtomicU64,
}

impl Default for OsaProxy {
    fn default() -> Self {
        Self::new(ScriptHost::new(HostConfig::default()))
    }
}

impl OsaProxy {
    pub fn new(host: ScriptHost) -> Self {
        Self {
            host,
            connections: Mutex::new(HashMap::new()),
            access: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    fn connections(&self) -> MutexGuard<'_, HashMap<u64, TargetId>> {
        self.connections.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record_access(&self, target: &TargetId, state: AccessState) {
        self.access
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(target.clone(), state);
    }

    fn last_access(&self, target: &TargetId) -> Option<AccessState> {
        self.access
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(target)
            .copied()
    }

    fn forget_target(&self, target: &TargetId) {
        self.connections().retain(|_, connected| connected != target);
    }

    fn is_running(&self, target: &TargetId) -> Result<bool, HostError> {
        let output = self.host.run(&script::is_running(target), PROBE_TIMEOUT)?;
        Ok(matches!(parse_result(&output), Ok(Value::Bool(true))))
    }

    fn launch(&self, target: &TargetId) -> Result<(), ConnectionError> {
        match self.host.launch(target.as_str(), LAUNCH_TIMEOUT) {
            Ok(()) => {
                tracing::info!(target_id = %target, "launched target");
                Ok(())
            }
            Err(HostError::ScriptError { message, .. })
                if message.contains("Unable to find application") =>
            {
                Err(ConnectionError::NotInstalled)
            }
            Err(err) => Err(ConnectionError::LaunchFailed(err.to_string())),
        }
    }

    /// Runs a trivial command inside a tell block; this is what triggers
    /// the consent prompt the first time.
    fn check_access(&self, target: &TargetId) -> Result<(), ConnectionError> {
        let source = script::wrap(target, script::ACCESS_CHECK, CONSENT_TIMEOUT);
        match self.host.run(&source, CONSENT_TIMEOUT + HOST_GRACE) {
            Ok(_) => {
                self.record_access(target, AccessState::Available);
                Ok(())
            }
            Err(HostError::ScriptError { code, message }) => {
                let error = errors::connection_error(code, &message);
                if let Some(state) = errors::access_state(&error) {
                    self.record_access(target, state);
                }
                Err(error)
            }
            Err(err) => Err(ConnectionError::Transport(err.to_string())),
        }
    }

    fn run(&self, connection: &Connection, statement: &str, timeout: Duration) -> Result<Value, RemoteError> {
        if !self.connections().contains_key(&connection.id) {
            return Err(RemoteError::ConnectionLost);
        }
        let source = script::wrap(&connection.target, statement, timeout);
        let output = match self.host.run(&source, timeout + HOST_GRACE) {
            Ok(output) => output,
            Err(HostError::TimedOut(_)) => return Err(RemoteError::Timeout),
            Err(HostError::ScriptError { code, message }) => {
                match code {
                    Some(ERR_ACCESS_DENIED) => {
                        self.record_access(&connection.target, AccessState::AccessDenied)
                    }
                    Some(ERR_CONSENT_REQUIRED) => {
                        self.record_access(&connection.target, AccessState::AccessPending)
                    }
                    _ => {}
                }
                let error = errors::remote_error(code, &message);
                if error == RemoteError::ConnectionLost {
                    self.forget_target(&connection.target);
                }
                return Err(error);
            }
            Err(err) => {
                return Err(RemoteError::Failed {
                    code: 0,
                    message: err.to_string(),
                })
            }
        };
        parse_result(&output).map_err(|err| RemoteError::Failed {
            code: 0,
            message: format!("unreadable result: {err}"),
        })
    }
}

impl RemoteObjectProxy for OsaProxy {
    fn connect(&self, target: &TargetId, launch_if_needed: bool) -> Result<Connection, ConnectionError> {
        let running = self
            .is_running(target)
            .map_err(|err| ConnectionError::Transport(err.to_string()))?;
        if !running {
            if !launch_if_needed {
                return Err(ConnectionError::NotRunning);
            }
            self.launch(target)?;
        }
        self.check_access(target)?;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.connections().insert(id, target.clone());
        Ok(Connection {
            id,
            target: target.clone(),
        })
    }

    fn get_property(
        &self,
        connection: &Connection,
        object: &ObjectPath,
        property: &str,
        timeout: Duration,
    ) -> Result<Value, RemoteError> {
        self.run(connection, &script::get_property(object, property), timeout)
    }

    fn set_property(
        &self,
        connection: &Connection,
        object: &ObjectPath,
        property: &str,
        value: &Value,
        timeout: Duration,
    ) -> Result<(), RemoteError> {
        self.run(connection, &script::set_property(object, property, value), timeout)
            .map(|_| ())
    }

    fn invoke(
        &self,
        connection: &Connection,
        object: &ObjectPath,
        invocation: &Invocation,
        timeout: Duration,
    ) -> Result<Value, RemoteError> {
        self.run(connection, &script::invoke(object, invocation), timeout)
    }

    /// Elements are addressed by id so paths stay valid when siblings move.
    fn enumerate_children(
        &self,
        connection: &Connection,
        object: &ObjectPath,
        class: &str,
        timeout: Duration,
    ) -> Result<Vec<ObjectPath>, RemoteError> {
        let ids = match self.run(connection, &script::child_ids(object, class), timeout)? {
            Value::List(ids) => ids,
            other => {
                return Err(RemoteError::Coercion(format!(
                    "expected a list of {class} ids, got {}",
                    other.kind()
                )))
            }
        };
        ids.iter()
            .map(|id| {
                id.as_i64()
                    .map(|id| object.element_id(class, id))
                    .ok_or_else(|| RemoteError::Coercion(format!("{class} id is {}", id.kind())))
            })
            .collect()
    }

    /// Never prompts. Access is known only after a connection attempt; until
    /// then a running target is assumed available.
    fn access_state(&self, target: &TargetId) -> AccessState {
        match self.is_running(target) {
            Ok(true) => match self.last_access(target) {
                Some(AccessState::NotRunning) | None => AccessState::Available,
                Some(state) => state,
            },
            Ok(false) => AccessState::NotRunning,
            Err(err) => {
                tracing::warn!(target_id = %target, error = %err, "access check failed");
                AccessState::NotRunning
            }
        }
    }

    fn disconnect(&self, connection: &Connection) {
        self.connections().remove(&connection.id);
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::host::fake_tool;
    use std::path::PathBuf;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn proxy_with(tool: &tempfile::TempPath) -> OsaProxy {
        OsaProxy::new(ScriptHost::new(HostConfig {
            osascript: tool.to_path_buf(),
            open: PathBuf::from("/bin/false"),
        }))
    }

    fn jukebox() -> TargetId {
        TargetId::from("com.example.Jukebox")
    }

    /// Answers `is running` with true and everything else with `reply`.
    fn scripted(reply: &str) -> tempfile::TempPath {
        fake_tool(&format!(
            "source=$(cat)\ncase \"$source\" in\n  *\"is running then\"*) {reply} ;;\n  *\"is running\"*) echo true ;;\n  *) {reply} ;;\nesac"
        ))
    }

    #[test]
    fn connects_and_reads_properties() {
        let tool = scripted("echo '{name:\"Song\", sound volume:40}'");
        let proxy = proxy_with(&tool);
        let connection = proxy.connect(&jukebox(), false).expect("connects");
        assert_eq!(proxy.access_state(&jukebox()), AccessState::Available);

        let value = proxy
            .get_property(&connection, &ObjectPath::application(), "properties", TIMEOUT)
            .expect("reads");
        let Value::Record(fields) = value else {
            panic!("expected a record");
        };
        assert_eq!(fields["sound volume"], Value::Integer(40));
    }

    #[test]
    fn enumerates_children_by_id() {
        let tool = scripted("echo '{12, 34}'");
        let proxy = proxy_with(&tool);
        let connection = proxy.connect(&jukebox(), false).expect("connects");
        let windows = proxy
            .enumerate_children(&connection, &ObjectPath::application(), "window", TIMEOUT)
            .expect("enumerates");
        assert_eq!(
            windows,
            vec![
                ObjectPath::application().element_id("window", 12),
                ObjectPath::application().element_id("window", 34),
            ]
        );
    }

    #[test]
    fn denied_access_is_remembered() {
        let tool = scripted(
            "echo '0:1: execution error: Not authorized to send Apple events to Jukebox. (-1743)' >&2; exit 1",
        );
        let proxy = proxy_with(&tool);
        assert_eq!(
            proxy.connect(&jukebox(), false).unwrap_err(),
            ConnectionError::AccessDenied
        );
        assert_eq!(proxy.access_state(&jukebox()), AccessState::AccessDenied);
    }

    #[test]
    fn not_running_without_launch() {
        let tool = fake_tool("cat > /dev/null\necho false");
        let proxy = proxy_with(&tool);
        assert_eq!(proxy.access_state(&jukebox()), AccessState::NotRunning);
        assert_eq!(
            proxy.connect(&jukebox(), false).unwrap_err(),
            ConnectionError::NotRunning
        );
        assert!(matches!(
            proxy.connect(&jukebox(), true).unwrap_err(),
            ConnectionError::LaunchFailed(_)
        ));
    }

    #[test]
    fn quit_target_loses_every_connection() {
        let tool = scripted(
            "echo '0:1: execution error: target is not running (-600)' >&2; exit 1",
        );
        let proxy = proxy_with(&tool);
        proxy.connections().insert(7, jukebox());
        let connection = Connection {
            id: 7,
            target: jukebox(),
        };
        let err = proxy
            .invoke(&connection, &ObjectPath::application(), &Invocation::new("play"), TIMEOUT)
            .unwrap_err();
        assert_eq!(err, RemoteError::ConnectionLost);
        assert!(proxy.connections().is_empty());
        assert_eq!(
            proxy
                .get_property(&connection, &ObjectPath::application(), "name", TIMEOUT)
                .unwrap_err(),
            RemoteError::ConnectionLost
        );
    }
}
