//! Routing of hardware media keys to whichever target is running.

use crate::config::MediaKeysConfig;
use crate::dispatcher::Dispatcher;
use crate::error::ControlResult;
use crate::models::{AccessState, TargetId};
use crate::registry::Remote;
use crate::schema::GenericOperation;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKey {
    PlayPause,
    NextTrack,
    PreviousTrack,
    FastForward,
    Rewind,
}

/// What to do with a key press when no registered target is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetNotRunningAction {
    /// Consume the key so the system does not act on it.
    Swallow,
    /// Hand the key back to the system.
    #[default]
    Propagate,
    /// Launch the preferred (or first) target and consume the key.
    LaunchTarget,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDisposition {
    Handled,
    Propagate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    None,
    Dispatched(GenericOperation),
    /// Connected to a target whose automation consent is outstanding, which
    /// prompts the user.
    RequestedAccess,
    Launched,
}

#[derive(Debug)]
pub struct RoutedKey {
    pub disposition: KeyDisposition,
    pub target: Option<TargetId>,
    pub action: KeyAction,
    /// Result of whatever was sent to the target, if anything was.
    pub outcome: Option<ControlResult<()>>,
}

impl RoutedKey {
    fn handled() -> Self {
        Self {
            disposition: KeyDisposition::Handled,
            target: None,
            action: KeyAction::None,
            outcome: None,
        }
    }

    fn propagate() -> Self {
        Self {
            disposition: KeyDisposition::Propagate,
            ..Self::handled()
        }
    }
}

pub struct MediaKeyRouter {
    remote: Remote,
    enabled: bool,
    not_running: TargetNotRunningAction,
    dispatchers: HashMap<TargetId, Dispatcher>,
}

impl MediaKeyRouter {
    pub fn new(remote: Remote, not_running: TargetNotRunningAction) -> Self {
        Self {
            remote,
            enabled: true,
            not_running,
            dispatchers: HashMap::new(),
        }
    }

    pub fn from_config(remote: Remote, config: &MediaKeysConfig) -> Self {
        let mut router = Self::new(remote, config.target_not_running);
        router.set_enabled(config.enabled);
        router
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.dispatchers.clear();
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn not_running_action(&self) -> TargetNotRunningAction {
        self.not_running
    }

    /// Routes one key event. Only key-down events act; key-up events are
    /// consumed so the system never sees half a press.
    pub fn handle(&mut self, key: MediaKey, pressed: bool) -> RoutedKey {
        if !self.enabled {
            return RoutedKey::propagate();
        }
        if !pressed {
            return RoutedKey::handled();
        }

        let Some((target, access)) = self.remote.first_running() else {
            return self.handle_nothing_running();
        };
        let id = target.id.clone();

        match access {
            AccessState::AccessPending => {
                tracing::info!(target_id = %id, "requesting automation access");
                let outcome = self.remote.dispatcher_with(&id, false).map(|_| ());
                RoutedKey {
                    target: Some(id),
                    action: KeyAction::RequestedAccess,
                    outcome: Some(outcome),
                    ..RoutedKey::handled()
                }
            }
            AccessState::AccessDenied | AccessState::NotRunning => {
                tracing::debug!(target_id = %id, ?access, "media key not sent");
                RoutedKey {
                    target: Some(id),
                    ..RoutedKey::handled()
                }
            }
            AccessState::Available => {
                let (operation, outcome) = match self.dispatcher(&id) {
                    Ok(dispatcher) => send(dispatcher, key),
                    Err(err) => (None, Some(Err(err))),
                };
                if matches!(&outcome, Some(Err(err)) if err.is_unavailable()) {
                    self.dispatchers.remove(&id);
                }
                RoutedKey {
                    target: Some(id),
                    action: operation.map_or(KeyAction::None, KeyAction::Dispatched),
                    outcome,
                    ..RoutedKey::handled()
                }
            }
        }
    }

    fn handle_nothing_running(&mut self) -> RoutedKey {
        match self.not_running {
            TargetNotRunningAction::Swallow => RoutedKey::handled(),
            TargetNotRunningAction::Propagate => RoutedKey::propagate(),
            TargetNotRunningAction::LaunchTarget => {
                let Some(target) = self.remote.candidates().into_iter().next() else {
                    return RoutedKey::handled();
                };
                tracing::info!(target_id = %target.id, "launching target for media key");
                let outcome = self
                    .remote
                    .dispatcher_with(&target.id, true)
                    .map(|dispatcher| {
                        self.dispatchers.insert(target.id.clone(), dispatcher);
                    });
                RoutedKey {
                    target: Some(target.id.clone()),
                    action: KeyAction::Launched,
                    outcome: Some(outcome),
                    ..RoutedKey::handled()
                }
            }
        }
    }

    fn dispatcher(&mut self, id: &TargetId) -> ControlResult<&mut Dispatcher> {
        let stale = self
            .dispatchers
            .get(id)
            .is_some_and(|dispatcher| !dispatcher.session().is_live());
        if stale {
            self.dispatchers.remove(id);
        }
        if !self.dispatchers.contains_key(id) {
            let dispatcher = self.remote.dispatcher_with(id, false)?;
            self.dispatchers.insert(id.clone(), dispatcher);
        }
        self.dispatchers
            .get_mut(id)
            .ok_or_else(|| crate::registry::RegistryError::NotFound(id.clone()).into())
    }
}

fn send(dispatcher: &mut Dispatcher, key: MediaKey) -> (Option<GenericOperation>, Option<ControlResult<()>>) {
    match key {
        MediaKey::PlayPause => (
            Some(GenericOperation::PlayPause),
            Some(dispatcher.play_pause()),
        ),
        MediaKey::NextTrack => (Some(GenericOperation::Next), Some(dispatcher.next())),
        MediaKey::PreviousTrack => match dispatcher.skip_back() {
            Err(err) if err.is_unsupported() => (
                Some(GenericOperation::Previous),
                Some(dispatcher.previous()),
            ),
            result => (Some(GenericOperation::SkipBack), Some(result)),
        },
        MediaKey::FastForward | MediaKey::Rewind => (None, None),
    }
}
