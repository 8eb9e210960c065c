//! In-process stand-in for scriptable applications.
//!
//! `MemoryProxy` keeps a small object graph per simulated target, applies
//! commands to it, and records every call it receives so tests can assert on
//! what the core sent (and, just as often, on what it did not send).

use super::{Connection, ConnectionError, Invocation, RemoteError, RemoteObjectProxy};
use crate::models::{AccessState, PlaybackState, TargetId};
use crate::schema::{
    Canonical, GenericElement, GenericOperation, GenericProperty, PropertyOwner, Target,
    TargetProperty,
};
use crate::value::{Enumerator, ObjectPath, Value, ValueKind};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// A call as the proxy received it.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    Connect {
        target: TargetId,
        launch: bool,
    },
    Get {
        target: TargetId,
        object: ObjectPath,
        property: String,
    },
    Set {
        target: TargetId,
        object: ObjectPath,
        property: String,
        value: Value,
    },
    Invoke {
        target: TargetId,
        object: ObjectPath,
        invocation: Invocation,
    },
    Enumerate {
        target: TargetId,
        object: ObjectPath,
        class: String,
    },
}

impl RecordedCall {
    /// Whether the call could have changed remote state.
    pub fn is_mutation(&self) -> bool {
        match self {
            RecordedCall::Set { .. } => true,
            RecordedCall::Invoke { invocation, .. } => invocation.command != "exists",
            _ => false,
        }
    }
}

/// Builder and state for one simulated application.
#[derive(Debug, Clone)]
pub struct SimulatedApp {
    running: bool,
    access: AccessState,
    commands: HashSet<String>,
    transitions: HashMap<String, (String, Value)>,
    toggles: HashMap<String, (String, Value, Value)>,
    objects: HashMap<ObjectPath, BTreeMap<String, Value>>,
    read_only: HashSet<(ObjectPath, String)>,
    children: HashMap<(ObjectPath, String), Vec<ObjectPath>>,
    next_id: i64,
}

impl Default for SimulatedApp {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedApp {
    /// A running, accessible application with no properties or commands.
    pub fn new() -> Self {
        let mut objects = HashMap::new();
        objects.insert(ObjectPath::application(), BTreeMap::new());
        Self {
            running: true,
            access: AccessState::Available,
            commands: HashSet::new(),
            transitions: HashMap::new(),
            toggles: HashMap::new(),
            objects,
            read_only: HashSet::new(),
            children: HashMap::new(),
            next_id: 100,
        }
    }

    /// Seeds an application that answers everything `target`'s schema
    /// declares, with plausible non-zero values.
    pub fn from_target(target: &Target) -> Self {
        let schema = &target.schema;
        let root = ObjectPath::application();
        let mut app = Self::new();

        for (_, operation) in schema.operations {
            app.commands.insert(operation.command.to_owned());
        }

        if let Some(state) = schema.lookup_property(GenericProperty::PlayerState) {
            let code_for = |playback| state.encode_enum(Canonical::Playback(playback)).ok();
            for (generic, operation) in schema.operations {
                let playback = match generic {
                    GenericOperation::Play => PlaybackState::Playing,
                    GenericOperation::Pause => PlaybackState::Paused,
                    GenericOperation::Stop => PlaybackState::Stopped,
                    _ => continue,
                };
                if let Some(code) = code_for(playback) {
                    app.transitions
                        .insert(operation.command.to_owned(), (state.name.to_owned(), code));
                }
            }
            if let (Some(toggle), Some(playing), Some(paused)) = (
                schema.lookup_operation(GenericOperation::PlayPause),
                code_for(PlaybackState::Playing),
                code_for(PlaybackState::Paused),
            ) {
                app.toggles.insert(
                    toggle.command.to_owned(),
                    (state.name.to_owned(), playing, paused),
                );
            }
        }

        let track_path = schema.current_track.map(|name| root.property(name));
        if let Some(path) = &track_path {
            app.objects.insert(path.clone(), BTreeMap::new());
        }

        let mut entry_paths = Vec::new();
        if let Some(entries) = schema.lookup_element(GenericElement::PlaylistEntries) {
            let container = entries
                .container
                .map(|name| root.property(name))
                .unwrap_or_else(ObjectPath::application);
            app.objects.entry(container.clone()).or_default();
            for id in 1..=2 {
                let path = container.element_id(entries.class, id);
                app.objects.insert(path.clone(), BTreeMap::new());
                app.children
                    .entry((container.clone(), entries.class.to_owned()))
                    .or_default()
                    .push(path.clone());
                entry_paths.push(path);
            }
        }

        let mut window_paths = Vec::new();
        if let Some(windows) = schema.lookup_element(GenericElement::Windows) {
            let path = root.element_id(windows.class, 1);
            app.objects.insert(path.clone(), BTreeMap::new());
            app.children
                .entry((root.clone(), windows.class.to_owned()))
                .or_default()
                .push(path.clone());
            window_paths.push(path);
        }

        for (generic, property) in schema.properties {
            let owners: Vec<&ObjectPath> = match property.owner {
                PropertyOwner::Application => vec![&root],
                PropertyOwner::Track => track_path.iter().chain(entry_paths.iter()).collect(),
                PropertyOwner::Window => window_paths.iter().collect(),
            };
            let value = default_value(*generic, property);
            for owner in owners {
                app.objects
                    .entry(owner.clone())
                    .or_default()
                    .insert(property.name.to_owned(), value.clone());
                if !property.access.writable() {
                    app.read_only
                        .insert((owner.clone(), property.name.to_owned()));
                }
            }
        }

        app
    }

    pub fn not_running(mut self) -> Self {
        self.running = false;
        self
    }

    pub fn with_access(mut self, access: AccessState) -> Self {
        self.access = access;
        self
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.commands.insert(command.into());
        self
    }

    /// `command` sets application property `property` to `value`.
    pub fn with_transition(
        mut self,
        command: impl Into<String>,
        property: impl Into<String>,
        value: Value,
    ) -> Self {
        let command = command.into();
        self.commands.insert(command.clone());
        self.transitions.insert(command, (property.into(), value));
        self
    }

    pub fn with_object(mut self, path: ObjectPath) -> Self {
        self.objects.entry(path).or_default();
        self
    }

    pub fn with_property(mut self, object: &ObjectPath, name: impl Into<String>, value: Value) -> Self {
        self.objects
            .entry(object.clone())
            .or_default()
            .insert(name.into(), value);
        self
    }

    pub fn with_read_only(mut self, object: &ObjectPath, name: impl Into<String>) -> Self {
        self.read_only.insert((object.clone(), name.into()));
        self
    }

    pub fn with_children(mut self, parent: &ObjectPath, class: impl Into<String>, children: Vec<ObjectPath>) -> Self {
        for child in &children {
            self.objects.entry(child.clone()).or_default();
        }
        self.children.insert((parent.clone(), class.into()), children);
        self
    }

    fn exists(&self, path: &ObjectPath) -> bool {
        self.objects.contains_key(path)
    }

    fn get(&self, object: &ObjectPath, property: &str) -> Result<Value, RemoteError> {
        let properties = self.objects.get(object).ok_or(RemoteError::ObjectNotFound)?;
        properties
            .get(property)
            .cloned()
            .ok_or(RemoteError::NotUnderstood)
    }

    fn set(&mut self, object: &ObjectPath, property: &str, value: &Value) -> Result<(), RemoteError> {
        if !self.exists(object) {
            return Err(RemoteError::ObjectNotFound);
        }
        if self.read_only.contains(&(object.clone(), property.to_owned())) {
            return Err(RemoteError::ReadOnly);
        }
        let properties = self.objects.entry(object.clone()).or_default();
        if let Some(current) = properties.get(property) {
            let compatible = current.kind() == value.kind()
                || current.is_missing()
                || (current.kind() == ValueKind::Real && value.kind() == ValueKind::Integer);
            if !compatible {
                return Err(RemoteError::Coercion(format!(
                    "can't make {} into type {}",
                    value.kind(),
                    current.kind()
                )));
            }
        }
        properties.insert(property.to_owned(), value.clone());
        Ok(())
    }

    fn remove(&mut self, path: &ObjectPath) {
        self.objects.retain(|candidate, _| !starts_with(candidate, path));
        self.read_only.retain(|(candidate, _)| !starts_with(candidate, path));
        for list in self.children.values_mut() {
            list.retain(|child| child != path);
        }
    }

    fn invoke(&mut self, object: &ObjectPath, invocation: &Invocation) -> Result<Value, RemoteError> {
        let command = invocation.command.as_str();
        if command == "exists" {
            return Ok(Value::Bool(self.exists(object)));
        }
        if !self.exists(object) {
            return Err(RemoteError::ObjectNotFound);
        }
        match command {
            "delete" | "close" if !object.is_root() => {
                self.remove(object);
                Ok(Value::Missing)
            }
            "duplicate" if !object.is_root() => {
                let destination = destination(invocation, object)?;
                let class = object.element_class().unwrap_or("item").to_owned();
                self.next_id += 1;
                let copy = destination.element_id(class.clone(), self.next_id);
                let mut properties = self.objects.get(object).cloned().unwrap_or_default();
                if let Some(Value::Record(overrides)) = invocation.param("with properties") {
                    properties.extend(overrides.clone());
                }
                self.objects.insert(copy.clone(), properties);
                self.children
                    .entry((destination, class))
                    .or_default()
                    .push(copy.clone());
                Ok(Value::Object(copy))
            }
            "move" if !object.is_root() => {
                let destination = destination(invocation, object)?;
                let last = object.last().cloned().ok_or(RemoteError::NotUnderstood)?;
                let class = object.element_class().unwrap_or("item").to_owned();
                let moved = destination.join(last);
                let properties = self.objects.get(object).cloned().unwrap_or_default();
                self.remove(object);
                self.objects.insert(moved.clone(), properties);
                self.children
                    .entry((destination, class))
                    .or_default()
                    .push(moved.clone());
                Ok(Value::Object(moved))
            }
            "quit" if object.is_root() && self.commands.contains(command) => {
                self.running = false;
                Ok(Value::Missing)
            }
            _ if object.is_root() && self.commands.contains(command) => {
                if let Some((property, value)) = self.transitions.get(command).cloned() {
                    self.objects
                        .entry(ObjectPath::application())
                        .or_default()
                        .insert(property, value);
                } else if let Some((property, on, off)) = self.toggles.get(command).cloned() {
                    let root = self.objects.entry(ObjectPath::application()).or_default();
                    let next = if root.get(&property) == Some(&on) { off } else { on };
                    root.insert(property, next);
                }
                Ok(Value::Missing)
            }
            _ => Err(RemoteError::NotUnderstood),
        }
    }

    fn enumerate(&self, object: &ObjectPath, class: &str) -> Result<Vec<ObjectPath>, RemoteError> {
        if !self.exists(object) {
            return Err(RemoteError::ObjectNotFound);
        }
        Ok(self
            .children
            .get(&(object.clone(), class.to_owned()))
            .cloned()
            .unwrap_or_default())
    }
}

fn starts_with(path: &ObjectPath, prefix: &ObjectPath) -> bool {
    path.specifiers().starts_with(prefix.specifiers())
}

fn destination(invocation: &Invocation, object: &ObjectPath) -> Result<ObjectPath, RemoteError> {
    match invocation.param("to") {
        Some(Value::Object(path)) => Ok(path.clone()),
        Some(other) => Err(RemoteError::Coercion(format!(
            "can't make {} into a location",
            other.kind()
        ))),
        None => object.parent().ok_or(RemoteError::NotUnderstood),
    }
}

fn default_value(generic: GenericProperty, property: &TargetProperty) -> Value {
    if let Some(table) = property.enumeration {
        let preferred = match generic {
            GenericProperty::PlayerState => property
                .encode_enum(Canonical::Playback(PlaybackState::Stopped))
                .ok(),
            _ => None,
        };
        return preferred.unwrap_or_else(|| {
            table
                .entries
                .first()
                .map(|entry| Value::Enumerator(Enumerator::Code(entry.code)))
                .unwrap_or(Value::Missing)
        });
    }
    match property.kind {
        ValueKind::Bool => Value::Bool(false),
        ValueKind::Integer => match property.range {
            Some(range) => Value::Integer(range.snap((range.min + range.max) / 2.0) as i64),
            None => Value::Integer(1),
        },
        ValueKind::Real => match property.range {
            Some(range) => Value::Real(range.snap((range.min + range.max) / 2.0)),
            None => Value::Real(1.0),
        },
        ValueKind::Text if is_count(generic) => Value::Text("1".to_owned()),
        ValueKind::Text => Value::Text(format!("Sample {}", property.name)),
        ValueKind::List if generic == GenericProperty::WindowBounds => Value::List(
            [0, 0, 800, 600].into_iter().map(Value::Integer).collect(),
        ),
        ValueKind::List => Value::List(Vec::new()),
        ValueKind::Record => Value::Record(BTreeMap::new()),
        _ => Value::Missing,
    }
}

/// Counters some targets report as text.
fn is_count(generic: GenericProperty) -> bool {
    matches!(
        generic,
        GenericProperty::TrackNumber
            | GenericProperty::DiscNumber
            | GenericProperty::Year
            | GenericProperty::BitRate
            | GenericProperty::PlayCount
    )
}

#[derive(Default)]
struct State {
    apps: HashMap<TargetId, SimulatedApp>,
    live: HashMap<u64, TargetId>,
    calls: Vec<RecordedCall>,
    failures: VecDeque<RemoteError>,
}

/// A [`RemoteObjectProxy`] over simulated applications.
#[derive(Default)]
pub struct MemoryProxy {
    state: Mutex<State>,
    next_connection: AtomicU64,
}

impl MemoryProxy {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Installs a schema-seeded simulation of `target`.
    pub fn simulate(&self, target: &Target) {
        self.insert_app(target.id.clone(), SimulatedApp::from_target(target));
    }

    pub fn insert_app(&self, id: TargetId, app: SimulatedApp) {
        self.lock().apps.insert(id, app);
    }

    pub fn set_value(&self, id: &TargetId, object: &ObjectPath, property: &str, value: Value) {
        if let Some(app) = self.lock().apps.get_mut(id) {
            app.objects
                .entry(object.clone())
                .or_default()
                .insert(property.to_owned(), value);
        }
    }

    /// Current value without recording a call.
    pub fn value(&self, id: &TargetId, object: &ObjectPath, property: &str) -> Option<Value> {
        self.lock()
            .apps
            .get(id)
            .and_then(|app| app.get(object, property).ok())
    }

    pub fn remove_object(&self, id: &TargetId, object: &ObjectPath) {
        if let Some(app) = self.lock().apps.get_mut(id) {
            app.remove(object);
        }
    }

    pub fn set_children(&self, id: &TargetId, parent: &ObjectPath, class: &str, children: Vec<ObjectPath>) {
        if let Some(app) = self.lock().apps.get_mut(id) {
            for child in &children {
                app.objects.entry(child.clone()).or_default();
            }
            app.children.insert((parent.clone(), class.to_owned()), children);
        }
    }

    pub fn set_running(&self, id: &TargetId, running: bool) {
        let mut state = self.lock();
        if let Some(app) = state.apps.get_mut(id) {
            app.running = running;
        }
        if !running {
            state.live.retain(|_, target| target != id);
        }
    }

    pub fn set_access(&self, id: &TargetId, access: AccessState) {
        if let Some(app) = self.lock().apps.get_mut(id) {
            app.access = access;
        }
    }

    pub fn is_running(&self, id: &TargetId) -> bool {
        self.lock().apps.get(id).is_some_and(|app| app.running)
    }

    /// The next remote call (of any kind, on any target) fails with `error`.
    pub fn fail_next(&self, error: RemoteError) {
        self.lock().failures.push_back(error);
    }

    /// Severs every live connection, as if the targets crashed and relaunched.
    pub fn drop_connections(&self) {
        self.lock().live.clear();
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    pub fn mutation_count(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| call.is_mutation())
            .count()
    }

    /// Commands invoked so far, in order.
    pub fn invoked_commands(&self) -> Vec<String> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                RecordedCall::Invoke { invocation, .. } => Some(invocation.command.clone()),
                _ => None,
            })
            .collect()
    }

    fn with_app<T>(
        &self,
        connection: &Connection,
        call: RecordedCall,
        action: impl FnOnce(&mut SimulatedApp) -> Result<T, RemoteError>,
    ) -> Result<T, RemoteError> {
        let mut guard = self.lock();
        let state = &mut *guard;
        state.calls.push(call);
        if let Some(error) = state.failures.pop_front() {
            if error == RemoteError::ConnectionLost {
                state.live.remove(&connection.id);
            }
            return Err(error);
        }
        if !state.live.contains_key(&connection.id) {
            return Err(RemoteError::ConnectionLost);
        }
        let Some(app) = state
            .apps
            .get_mut(&connection.target)
            .filter(|app| app.running)
        else {
            state.live.remove(&connection.id);
            return Err(RemoteError::ConnectionLost);
        };
        let result = action(app);
        if !app.running {
            state.live.retain(|_, live| *live != connection.target);
        }
        result
    }
}

impl RemoteObjectProxy for MemoryProxy {
    fn connect(&self, target: &TargetId, launch_if_needed: bool) -> Result<Connection, ConnectionError> {
        let mut guard = self.lock();
        let state = &mut *guard;
        state.calls.push(RecordedCall::Connect {
            target: target.clone(),
            launch: launch_if_needed,
        });
        let app = state
            .apps
            .get_mut(target)
            .ok_or(ConnectionError::NotInstalled)?;
        if !app.running {
            if !launch_if_needed {
                return Err(ConnectionError::NotRunning);
            }
            app.running = true;
        }
        match app.access {
            AccessState::AccessDenied => return Err(ConnectionError::AccessDenied),
            AccessState::AccessPending => return Err(ConnectionError::AccessPending),
            AccessState::NotRunning | AccessState::Available => {}
        }
        let id = self.next_connection.fetch_add(1, Ordering::Relaxed) + 1;
        state.live.insert(id, target.clone());
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
        _timeout: Duration,
    ) -> Result<Value, RemoteError> {
        let call = RecordedCall::Get {
            target: connection.target.clone(),
            object: object.clone(),
            property: property.to_owned(),
        };
        self.with_app(connection, call, |app| app.get(object, property))
    }

    fn set_property(
        &self,
        connection: &Connection,
        object: &ObjectPath,
        property: &str,
        value: &Value,
        _timeout: Duration,
    ) -> Result<(), RemoteError> {
        let call = RecordedCall::Set {
            target: connection.target.clone(),
            object: object.clone(),
            property: property.to_owned(),
            value: value.clone(),
        };
        self.with_app(connection, call, |app| app.set(object, property, value))
    }

    fn invoke(
        &self,
        connection: &Connection,
        object: &ObjectPath,
        invocation: &Invocation,
        _timeout: Duration,
    ) -> Result<Value, RemoteError> {
        let call = RecordedCall::Invoke {
            target: connection.target.clone(),
            object: object.clone(),
            invocation: invocation.clone(),
        };
        self.with_app(connection, call, |app| app.invoke(object, invocation))
    }

    fn enumerate_children(
        &self,
        connection: &Connection,
        object: &ObjectPath,
        class: &str,
        _timeout: Duration,
    ) -> Result<Vec<ObjectPath>, RemoteError> {
        let call = RecordedCall::Enumerate {
            target: connection.target.clone(),
            object: object.clone(),
            class: class.to_owned(),
        };
        self.with_app(connection, call, |app| app.enumerate(object, class))
    }

    fn access_state(&self, target: &TargetId) -> AccessState {
        match self.lock().apps.get(target) {
            Some(app) if app.running => app.access,
            _ => AccessState::NotRunning,
        }
    }

    fn disconnect(&self, connection: &Connection) {
        self.lock().live.remove(&connection.id);
    }
}
