//! The target registry and the id-addressed [`Remote`] built on it.

use crate::config::Config;
use crate::dispatcher::Dispatcher;
use crate::error::ControlResult;
use crate::models::{AccessState, TargetId};
use crate::object::{Session, SessionOptions};
use crate::schema::{SchemaError, Target};
use crate::transport::RemoteObjectProxy;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum RegistryError {
    #[error("target {0} is already registered")]
    Duplicate(TargetId),
    #[error("target {0} is not registered")]
    NotFound(TargetId),
    #[error("target {target} has an invalid schema: {source}")]
    InvalidSchema { target: TargetId, source: SchemaError },
}

/// Registered targets, in registration order.
///
/// Lookups take a read lock and return an `Arc` snapshot; the lock is never
/// held while a target is being talked to.
#[derive(Debug, Default)]
pub struct TargetRegistry {
    targets: RwLock<Vec<Arc<Target>>>,
}

impl TargetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Arc<Target>>> {
        self.targets.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Arc<Target>>> {
        self.targets.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Validates the schema and adds the target.
    pub fn register(&self, target: Target) -> Result<Arc<Target>, RegistryError> {
        if let Err(source) = target.schema.validate() {
            tracing::warn!(target_id = %target.id, error = %source, "rejecting invalid schema");
            return Err(RegistryError::InvalidSchema {
                target: target.id,
                source,
            });
        }
        let mut targets = self.write();
        if targets.iter().any(|existing| existing.id == target.id) {
            return Err(RegistryError::Duplicate(target.id));
        }
        let target = Arc::new(target);
        targets.push(Arc::clone(&target));
        tracing::info!(target_id = %target.id, name = %target.name, "target registered");
        Ok(target)
    }

    pub fn remove(&self, id: &TargetId) -> Result<Arc<Target>, RegistryError> {
        let mut targets = self.write();
        let index = targets
            .iter()
            .position(|target| &target.id == id)
            .ok_or_else(|| RegistryError::NotFound(id.clone()))?;
        let removed = targets.remove(index);
        tracing::info!(target_id = %id, "target removed");
        Ok(removed)
    }

    /// Snapshot of every registered target.
    pub fn active_targets(&self) -> Vec<Arc<Target>> {
        self.read().clone()
    }

    pub fn resolve(&self, id: &TargetId) -> Result<Arc<Target>, RegistryError> {
        self.read()
            .iter()
            .find(|target| &target.id == id)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(id.clone()))
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

/// Registry, transport and session settings bundled for callers that want
/// to address targets by id.
#[derive(Clone)]
pub struct Remote {
    registry: Arc<TargetRegistry>,
    proxy: Arc<dyn RemoteObjectProxy>,
    options: SessionOptions,
    preferred: Option<TargetId>,
}

impl Remote {
    pub fn new(registry: Arc<TargetRegistry>, proxy: Arc<dyn RemoteObjectProxy>, options: SessionOptions) -> Self {
        Self {
            registry,
            proxy,
            options,
            preferred: None,
        }
    }

    /// Session options and preferred target taken from a loaded config.
    pub fn from_config(registry: Arc<TargetRegistry>, proxy: Arc<dyn RemoteObjectProxy>, config: &Config) -> Self {
        Self::new(registry, proxy, config.session_options()).with_preferred(config.targets.preferred_id())
    }

    pub fn with_preferred(mut self, preferred: Option<TargetId>) -> Self {
        self.preferred = preferred;
        self
    }

    pub fn registry(&self) -> &Arc<TargetRegistry> {
        &self.registry
    }

    pub fn preferred(&self) -> Option<&TargetId> {
        self.preferred.as_ref()
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn access_state(&self, id: &TargetId) -> AccessState {
        self.proxy.access_state(id)
    }

    /// Opens a session to `id` with the configured options.
    pub fn dispatcher(&self, id: &TargetId) -> ControlResult<Dispatcher> {
        self.dispatcher_with(id, self.options.launch_if_needed)
    }

    pub fn dispatcher_with(&self, id: &TargetId, launch_if_needed: bool) -> ControlResult<Dispatcher> {
        let target = self.registry.resolve(id)?;
        let options = SessionOptions {
            launch_if_needed,
            ..self.options
        };
        let session = Session::open(target, Arc::clone(&self.proxy), &options)?;
        Ok(Dispatcher::new(session))
    }

    /// Registered targets with the preferred one, if registered, first.
    pub fn candidates(&self) -> Vec<Arc<Target>> {
        let mut targets = self.registry.active_targets();
        if let Some(preferred) = &self.preferred {
            if let Some(index) = targets.iter().position(|target| &target.id == preferred) {
                let target = targets.remove(index);
                targets.insert(0, target);
            }
        }
        targets
    }

    /// The first candidate whose process is running, with its access state.
    pub fn first_running(&self) -> Option<(Arc<Target>, AccessState)> {
        self.candidates().into_iter().find_map(|target| {
            let access = self.proxy.access_state(&target.id);
            access.is_running().then_some((target, access))
        })
    }
}

impl std::fmt::Debug for Remote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Remote")
            .field("registry", &self.registry)
            .field("options", &self.options)
            .field("preferred", &self.preferred)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ControlError, ErrorKind};
    use crate::fixtures;
    use crate::schema::{
        CapabilitySchema, GenericOperation, TargetOperation,
    };

    fn registry() -> Arc<TargetRegistry> {
        let registry = Arc::new(TargetRegistry::new());
        registry
            .register(Target::new("test.jukebox", "Jukebox", fixtures::JUKEBOX))
            .unwrap();
        registry
            .register(Target::new("test.toggle", "Toggle", fixtures::TOGGLE_ONLY))
            .unwrap();
        registry
    }

    #[test]
    fn register_keeps_order_and_rejects_duplicates() {
        let registry = registry();
        let ids: Vec<_> = registry
            .active_targets()
            .iter()
            .map(|target| target.id.to_string())
            .collect();
        assert_eq!(ids, ["test.jukebox", "test.toggle"]);

        let err = registry
            .register(Target::new("test.jukebox", "Again", fixtures::JUKEBOX))
            .unwrap_err();
        assert_eq!(err, RegistryError::Duplicate(TargetId::from("test.jukebox")));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn invalid_schema_is_rejected() {
        static BROKEN: CapabilitySchema = CapabilitySchema {
            operations: &[(GenericOperation::Play, TargetOperation::new(" "))],
            ..CapabilitySchema::EMPTY
        };
        let registry = TargetRegistry::new();
        let err = registry
            .register(Target::new("test.broken", "Broken", BROKEN))
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidSchema { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn resolve_and_remove() {
        let registry = registry();
        let id = TargetId::from("test.toggle");
        assert_eq!(registry.resolve(&id).unwrap().name, "Toggle");
        registry.remove(&id).unwrap();
        assert_eq!(registry.resolve(&id).unwrap_err(), RegistryError::NotFound(id.clone()));
        assert!(matches!(registry.remove(&id), Err(RegistryError::NotFound(_))));
    }

    #[test]
    fn snapshots_survive_removal() {
        let registry = registry();
        let snapshot = registry.active_targets();
        registry.remove(&TargetId::from("test.jukebox")).unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn remote_prefers_configured_target_when_running() {
        let registry = registry();
        let jukebox = registry.resolve(&TargetId::from("test.jukebox")).unwrap();
        let toggle = registry.resolve(&TargetId::from("test.toggle")).unwrap();
        let proxy = fixtures::simulated(&[&jukebox, &toggle]);
        let remote = Remote::new(registry, proxy.clone(), SessionOptions::default())
            .with_preferred(Some(TargetId::from("test.toggle")));

        let (first, access) = remote.first_running().unwrap();
        assert_eq!(first.id, toggle.id);
        assert_eq!(access, AccessState::Available);

        proxy.set_running(&toggle.id, false);
        assert_eq!(remote.first_running().unwrap().0.id, jukebox.id);

        proxy.set_running(&jukebox.id, false);
        assert!(remote.first_running().is_none());
    }

    #[test]
    fn remote_dispatcher_reports_unknown_and_stopped_targets() {
        let registry = registry();
        let jukebox = registry.resolve(&TargetId::from("test.jukebox")).unwrap();
        let proxy = fixtures::simulated(&[&jukebox]);
        let remote = Remote::new(registry, proxy.clone(), SessionOptions::default());

        let err = remote.dispatcher(&TargetId::from("test.nothing")).unwrap_err();
        assert!(matches!(err, ControlError::Registry(RegistryError::NotFound(_))));

        proxy.set_running(&jukebox.id, false);
        let err = remote.dispatcher(&jukebox.id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connection);

        let mut dispatcher = remote.dispatcher_with(&jukebox.id, true).unwrap();
        assert!(dispatcher.play().is_ok());
    }

    #[test]
    fn concurrent_register_remove_and_resolve() {
        let registry = registry();
        let jukebox = TargetId::from("test.jukebox");
        std::thread::scope(|scope| {
            for worker in 0..4 {
                let registry = &registry;
                scope.spawn(move || {
                    for round in 0..50 {
                        let id = format!("test.worker{worker}.{round}");
                        registry
                            .register(Target::new(id.as_str(), "Worker", fixtures::TOGGLE_ONLY))
                            .unwrap();
                        assert_eq!(registry.resolve(&TargetId::from(id.as_str())).unwrap().name, "Worker");
                        registry.remove(&TargetId::from(id)).unwrap();
                    }
                });
            }
            for _ in 0..4 {
                let registry = &registry;
                let jukebox = &jukebox;
                scope.spawn(move || {
                    for _ in 0..200 {
                        assert_eq!(&registry.resolve(jukebox).unwrap().id, jukebox);
                        let snapshot = registry.active_targets();
                        assert!(snapshot.len() >= 2);
                        assert_eq!(snapshot[0].id, *jukebox);
                    }
                });
            }
        });
        assert_eq!(registry.len(), 2);
    }
}
