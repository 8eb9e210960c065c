//! Typed handles over remote objects.
//!
//! A [`Session`] owns the connection to one target. Handles created from it
//! hold only a weak reference: once the session is closed, or the transport
//! reports the connection lost, every handle fails with `RemoteUnavailable`
//! instead of talking to a stale connection.

use crate::error::{ControlError, ControlResult};
use crate::models::{NowPlayingInfo, SaveOption};
use crate::schema::{
    Canonical, GenericElement, GenericProperty, ObjectKind, PropertyOwner, SchemaError,
    StructuralOperation, Target, TargetProperty, SAVE_OPTIONS,
};
use crate::transport::{Connection, Invocation, RemoteError, RemoteObjectProxy};
use crate::value::{ObjectPath, Value, ValueKind};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// Upper bound for every remote call made through the session.
    pub timeout: Duration,
    pub launch_if_needed: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            launch_if_needed: false,
        }
    }
}

pub(crate) struct SessionInner {
    target: Arc<Target>,
    proxy: Arc<dyn RemoteObjectProxy>,
    connection: Connection,
    timeout: Duration,
    live: AtomicBool,
}

impl SessionInner {
    fn invalidate(&self) -> bool {
        self.live.swap(false, Ordering::AcqRel)
    }
}

/// An open connection to one target.
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Session {
    pub fn open(
        target: Arc<Target>,
        proxy: Arc<dyn RemoteObjectProxy>,
        options: &SessionOptions,
    ) -> ControlResult<Self> {
        let connection = proxy
            .connect(&target.id, options.launch_if_needed)
            .map_err(|source| ControlError::Connection {
                target: target.id.clone(),
                source,
            })?;
        tracing::info!(
            target_id = %target.id,
            connection = connection.id,
            launch = options.launch_if_needed,
            "session opened"
        );
        Ok(Self {
            inner: Arc::new(SessionInner {
                target,
                proxy,
                connection,
                timeout: options.timeout,
                live: AtomicBool::new(true),
            }),
        })
    }

    pub fn target(&self) -> &Arc<Target> {
        &self.inner.target
    }

    pub fn timeout(&self) -> Duration {
        self.inner.timeout
    }

    /// False once closed or once the transport reported the connection lost.
    pub fn is_live(&self) -> bool {
        self.inner.live.load(Ordering::Acquire)
    }

    pub fn application(&self) -> Application {
        Application {
            handle: RemoteHandle::new(
                Arc::downgrade(&self.inner),
                Arc::clone(&self.inner.target),
                ObjectPath::application(),
                ObjectKind::Application,
            ),
        }
    }

    /// Closes the connection; outstanding handles become unusable.
    pub fn close(self) {
        drop(self);
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.inner.invalidate() {
            self.inner.proxy.disconnect(&self.inner.connection);
            tracing::info!(
                target_id = %self.inner.target.id,
                connection = self.inner.connection.id,
                "session closed"
            );
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("target", &self.inner.target.id)
            .field("connection", &self.inner.connection.id)
            .field("live", &self.is_live())
            .finish()
    }
}

/// Untyped reference to one object inside a target.
#[derive(Clone)]
pub struct RemoteHandle {
    session: Weak<SessionInner>,
    target: Arc<Target>,
    path: ObjectPath,
    kind: ObjectKind,
}

impl std::fmt::Debug for RemoteHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteHandle")
            .field("target", &self.target.id)
            .field("path", &self.path.to_string())
            .field("kind", &self.kind)
            .finish()
    }
}

impl RemoteHandle {
    fn new(session: Weak<SessionInner>, target: Arc<Target>, path: ObjectPath, kind: ObjectKind) -> Self {
        Self {
            session,
            target,
            path,
            kind,
        }
    }

    fn sibling(&self, path: ObjectPath, kind: ObjectKind) -> Self {
        Self::new(self.session.clone(), Arc::clone(&self.target), path, kind)
    }

    pub fn path(&self) -> &ObjectPath {
        &self.path
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    pub fn target(&self) -> &Arc<Target> {
        &self.target
    }

    fn session(&self) -> ControlResult<Arc<SessionInner>> {
        let session = self
            .session
            .upgrade()
            .ok_or_else(|| ControlError::RemoteUnavailable {
                target: self.target.id.clone(),
                reason: "session closed".to_owned(),
            })?;
        if !session.live.load(Ordering::Acquire) {
            return Err(ControlError::RemoteUnavailable {
                target: self.target.id.clone(),
                reason: "connection lost".to_owned(),
            });
        }
        Ok(session)
    }

    fn map_remote(&self, session: &SessionInner, error: RemoteError, operation: &str) -> ControlError {
        let target = self.target.id.clone();
        match error {
            RemoteError::Timeout => ControlError::RemoteTimeout {
                target,
                operation: format!("{operation} of {}", self.path),
                timeout: session.timeout,
            },
            RemoteError::ConnectionLost => {
                if session.invalidate() {
                    tracing::warn!(
                        target_id = %target,
                        connection = session.connection.id,
                        "connection lost; session invalidated"
                    );
                }
                ControlError::RemoteUnavailable {
                    target,
                    reason: "connection lost".to_owned(),
                }
            }
            RemoteError::ObjectNotFound => ControlError::ObjectGone {
                target,
                object: self.path.to_string(),
            },
            RemoteError::NotUnderstood => ControlError::Unsupported {
                target,
                operation: operation.to_owned(),
            },
            RemoteError::ReadOnly => ControlError::PropertyNotWritable {
                property: operation.to_owned(),
            },
            RemoteError::Coercion(detail) => ControlError::TypeMismatch {
                property: operation.to_owned(),
                detail,
            },
            RemoteError::Failed { code, message } => ControlError::CommandFailed {
                target,
                operation: operation.to_owned(),
                code,
                message,
            },
        }
    }

    pub fn get_property(&self, name: &str) -> ControlResult<Value> {
        let session = self.session()?;
        tracing::debug!(target_id = %self.target.id, object = %self.path, property = name, "get");
        session
            .proxy
            .get_property(&session.connection, &self.path, name, session.timeout)
            .map_err(|err| self.map_remote(&session, err, name))
    }

    pub fn set_property(&self, name: &str, value: &Value) -> ControlResult<()> {
        let session = self.session()?;
        tracing::debug!(target_id = %self.target.id, object = %self.path, property = name, "set");
        session
            .proxy
            .set_property(&session.connection, &self.path, name, value, session.timeout)
            .map_err(|err| self.map_remote(&session, err, name))
    }

    pub fn invoke(&self, invocation: &Invocation) -> ControlResult<Value> {
        let session = self.session()?;
        tracing::debug!(
            target_id = %self.target.id,
            object = %self.path,
            command = %invocation.command,
            "invoke"
        );
        session
            .proxy
            .invoke(&session.connection, &self.path, invocation, session.timeout)
            .map_err(|err| self.map_remote(&session, err, &invocation.command))
    }

    pub fn children(&self, class: &str) -> ControlResult<Vec<ObjectPath>> {
        let session = self.session()?;
        tracing::debug!(target_id = %self.target.id, object = %self.path, class, "enumerate");
        session
            .proxy
            .enumerate_children(&session.connection, &self.path, class, session.timeout)
            .map_err(|err| self.map_remote(&session, err, class))
    }

    /// Reads a schema property, checking access and the reported shape.
    ///
    /// `missing value` is passed through; anything else must match the
    /// declared kind or the target has drifted from its schema.
    pub fn read(&self, property: &TargetProperty) -> ControlResult<Value> {
        if !property.access.readable() {
            return Err(ControlError::PropertyNotReadable {
                property: property.name.to_owned(),
            });
        }
        let value = self.get_property(property.name)?;
        let term_for_enum =
            property.kind == ValueKind::Enumerator && value.kind() == ValueKind::Text;
        if value.is_missing() || term_for_enum || property.kind.accepts(&value) {
            return Ok(value);
        }
        Err(SchemaError::UnexpectedValue {
            property: property.name,
            expected: property.kind,
            found: value.kind(),
        }
        .into())
    }

    pub fn write(&self, property: &TargetProperty, value: Value) -> ControlResult<()> {
        if !property.access.writable() {
            return Err(ControlError::PropertyNotWritable {
                property: property.name.to_owned(),
            });
        }
        if !property.kind.accepts(&value) {
            return Err(ControlError::TypeMismatch {
                property: property.name.to_owned(),
                detail: format!("expected {}, got {}", property.kind, value.kind()),
            });
        }
        self.set_property(property.name, &value)
    }

    fn require(&self, operation: StructuralOperation) -> ControlResult<()> {
        if self.target.schema.supports_structural(self.kind, operation) {
            Ok(())
        } else {
            Err(ControlError::unsupported(
                &self.target.id,
                format!("{} {}", operation.command(), self.kind.as_str()),
            ))
        }
    }

    /// `exists` without consulting the structural capability set.
    fn is_present(&self) -> ControlResult<bool> {
        match self.invoke(&Invocation::new("exists")) {
            Ok(Value::Bool(present)) => Ok(present),
            Ok(other) => Err(SchemaError::UnexpectedValue {
                property: "exists",
                expected: ValueKind::Bool,
                found: other.kind(),
            }
            .into()),
            Err(ControlError::ObjectGone { .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }

    fn property_for(&self, generic: GenericProperty) -> ControlResult<&'static TargetProperty> {
        self.target
            .schema
            .lookup_property(generic)
            .ok_or_else(|| ControlError::unsupported(&self.target.id, generic.as_str()))
    }
}

/// Structural operations shared by every handle kind.
///
/// Each method first checks the target's structural capability set and
/// returns `Unsupported` without contacting the target when the kind does
/// not accept the operation.
pub trait RemoteObject {
    fn handle(&self) -> &RemoteHandle;

    fn exists(&self) -> ControlResult<bool> {
        let handle = self.handle();
        handle.require(StructuralOperation::Exists)?;
        handle.is_present()
    }

    fn close_saving(&self, saving: SaveOption, destination: Option<&Path>) -> ControlResult<()> {
        let handle = self.handle();
        handle.require(StructuralOperation::Close)?;
        let mut invocation = Invocation::new(StructuralOperation::Close.command())
            .with_param("saving", SAVE_OPTIONS.to_target(Canonical::Save(saving))?);
        if let Some(path) = destination {
            invocation = invocation.with_param("saving in", Value::File(path.to_path_buf()));
        }
        handle.invoke(&invocation).map(|_| ())
    }

    fn delete(&self) -> ControlResult<()> {
        let handle = self.handle();
        handle.require(StructuralOperation::Delete)?;
        handle
            .invoke(&Invocation::new(StructuralOperation::Delete.command()))
            .map(|_| ())
    }

    /// Copies the object into `destination`, overriding `properties` on the
    /// copy, and returns a handle to the copy.
    fn duplicate_to(
        &self,
        destination: &ObjectPath,
        properties: BTreeMap<String, Value>,
    ) -> ControlResult<RemoteHandle> {
        let handle = self.handle();
        handle.require(StructuralOperation::Duplicate)?;
        let mut invocation = Invocation::new(StructuralOperation::Duplicate.command())
            .with_param("to", Value::Object(destination.clone()));
        if !properties.is_empty() {
            invocation = invocation.with_param("with properties", Value::Record(properties));
        }
        let copy = handle.invoke(&invocation)?;
        relocated(handle, copy, "duplicate")
    }

    fn move_to(&self, destination: &ObjectPath) -> ControlResult<RemoteHandle> {
        let handle = self.handle();
        handle.require(StructuralOperation::Move)?;
        let invocation = Invocation::new(StructuralOperation::Move.command())
            .with_param("to", Value::Object(destination.clone()));
        let moved = handle.invoke(&invocation)?;
        relocated(handle, moved, "move")
    }
}

fn relocated(handle: &RemoteHandle, result: Value, command: &'static str) -> ControlResult<RemoteHandle> {
    match result {
        Value::Object(path) => Ok(handle.sibling(path, handle.kind)),
        other => Err(SchemaError::UnexpectedValue {
            property: command,
            expected: ValueKind::Object,
            found: other.kind(),
        }
        .into()),
    }
}

/// The target application itself.
#[derive(Debug, Clone)]
pub struct Application {
    handle: RemoteHandle,
}

impl RemoteObject for Application {
    fn handle(&self) -> &RemoteHandle {
        &self.handle
    }

    /// Whether the target process is still running.
    fn exists(&self) -> ControlResult<bool> {
        let session = self.handle.session()?;
        Ok(session.proxy.access_state(&self.handle.target.id).is_running())
    }
}

impl Application {
    pub fn target(&self) -> &Arc<Target> {
        &self.handle.target
    }

    /// Schema entry for `generic`, or `Unsupported`.
    pub fn property(&self, generic: GenericProperty) -> ControlResult<&'static TargetProperty> {
        self.handle.property_for(generic)
    }

    pub fn read(&self, property: &TargetProperty) -> ControlResult<Value> {
        self.handle.read(property)
    }

    pub fn write(&self, property: &TargetProperty, value: Value) -> ControlResult<()> {
        self.handle.write(property, value)
    }

    pub fn invoke(&self, invocation: &Invocation) -> ControlResult<Value> {
        self.handle.invoke(invocation)
    }

    /// The item currently loaded in the player.
    ///
    /// Resolved lazily: reading from it fails with `ObjectGone` when nothing
    /// is loaded.
    pub fn current_track(&self) -> ControlResult<PlaylistEntry> {
        let name = self
            .handle
            .target
            .schema
            .current_track
            .ok_or_else(|| ControlError::unsupported(&self.handle.target.id, "current track"))?;
        Ok(PlaylistEntry {
            handle: self
                .handle
                .sibling(ObjectPath::application().property(name), ObjectKind::PlaylistEntry),
        })
    }

    /// Like [`current_track`](Self::current_track) but asks the target
    /// whether anything is loaded.
    pub fn loaded_track(&self) -> ControlResult<Option<PlaylistEntry>> {
        let entry = self.current_track()?;
        Ok(entry.handle.is_present()?.then_some(entry))
    }

    fn elements(&self, element: GenericElement, kind: ObjectKind) -> ControlResult<Vec<RemoteHandle>> {
        let schema = &self.handle.target.schema;
        let declared = schema
            .lookup_element(element)
            .ok_or_else(|| ControlError::unsupported(&self.handle.target.id, element.as_str()))?;
        let container = match declared.container {
            Some(property) => ObjectPath::application().property(property),
            None => ObjectPath::application(),
        };
        let paths = self
            .handle
            .sibling(container, ObjectKind::Application)
            .children(declared.class)?;
        Ok(paths
            .into_iter()
            .map(|path| self.handle.sibling(path, kind))
            .collect())
    }

    /// An empty list means the target has no windows open; `Unsupported`
    /// means it has no window model at all.
    pub fn windows(&self) -> ControlResult<Vec<Window>> {
        Ok(self
            .elements(GenericElement::Windows, ObjectKind::Window)?
            .into_iter()
            .map(|handle| Window { handle })
            .collect())
    }

    pub fn playlist_entries(&self) -> ControlResult<Vec<PlaylistEntry>> {
        Ok(self
            .elements(GenericElement::PlaylistEntries, ObjectKind::PlaylistEntry)?
            .into_iter()
            .map(|handle| PlaylistEntry { handle })
            .collect())
    }

    /// Application-level now-playing fields (stream titles and the like).
    pub(crate) fn fill_metadata(&self, info: &mut NowPlayingInfo) -> ControlResult<()> {
        fill_fields(&self.handle, PropertyOwner::Application, info)
    }
}

/// Window rectangle in screen points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub left: i64,
    pub top: i64,
    pub right: i64,
    pub bottom: i64,
}

impl Bounds {
    fn from_value(value: &Value) -> Option<Self> {
        match value.as_list()? {
            [left, top, right, bottom] => Some(Self {
                left: left.as_i64()?,
                top: top.as_i64()?,
                right: right.as_i64()?,
                bottom: bottom.as_i64()?,
            }),
            _ => None,
        }
    }

    fn to_value(self) -> Value {
        Value::List(
            [self.left, self.top, self.right, self.bottom]
                .into_iter()
                .map(Value::Integer)
                .collect(),
        )
    }
}

#[derive(Debug, Clone)]
pub struct Window {
    handle: RemoteHandle,
}

impl RemoteObject for Window {
    fn handle(&self) -> &RemoteHandle {
        &self.handle
    }
}

impl Window {
    pub fn name(&self) -> ControlResult<Option<String>> {
        let property = self.handle.property_for(GenericProperty::WindowName)?;
        let value = self.handle.read(property)?;
        Ok(value.as_text().map(str::to_owned).filter(|name| !name.is_empty()))
    }

    pub fn bounds(&self) -> ControlResult<Bounds> {
        let property = self.handle.property_for(GenericProperty::WindowBounds)?;
        let value = self.handle.read(property)?;
        Bounds::from_value(&value).ok_or_else(|| {
            SchemaError::UnexpectedValue {
                property: property.name,
                expected: ValueKind::List,
                found: value.kind(),
            }
            .into()
        })
    }

    pub fn set_bounds(&self, bounds: Bounds) -> ControlResult<()> {
        if bounds.right < bounds.left || bounds.bottom < bounds.top {
            return Err(ControlError::InvalidParameter {
                parameter: "bounds",
                reason: format!("{bounds:?} has negative extent"),
            });
        }
        let property = self.handle.property_for(GenericProperty::WindowBounds)?;
        self.handle.write(property, bounds.to_value())
    }

    /// Front-to-back position, starting at 1.
    pub fn index(&self) -> ControlResult<i64> {
        let property = self.handle.property_for(GenericProperty::WindowIndex)?;
        let value = self.handle.read(property)?;
        value.as_i64().ok_or_else(|| {
            SchemaError::UnexpectedValue {
                property: property.name,
                expected: ValueKind::Integer,
                found: value.kind(),
            }
            .into()
        })
    }
}

/// A track or stream, either in a playlist or as the current item.
#[derive(Debug, Clone)]
pub struct PlaylistEntry {
    handle: RemoteHandle,
}

impl RemoteObject for PlaylistEntry {
    fn handle(&self) -> &RemoteHandle {
        &self.handle
    }
}

impl PlaylistEntry {
    /// Reads every track field the schema declares, one call per field.
    ///
    /// A field the target lacks, leaves blank, or reports as zero where zero
    /// means unknown is `None`; so is every field when the entry has gone
    /// away. Other failures abort the read.
    pub fn metadata(&self) -> ControlResult<NowPlayingInfo> {
        let mut info = NowPlayingInfo::default();
        fill_fields(&self.handle, PropertyOwner::Track, &mut info)?;
        Ok(info)
    }
}

fn fill_fields(handle: &RemoteHandle, owner: PropertyOwner, info: &mut NowPlayingInfo) -> ControlResult<()> {
    for (generic, property) in handle.target.schema.properties {
        if property.owner != owner || !generic.is_now_playing_field() {
            continue;
        }
        if let Some(value) = read_optional(handle, property)? {
            apply_field(info, *generic, property, &value);
        }
    }
    Ok(())
}

pub(crate) fn read_optional(handle: &RemoteHandle, property: &TargetProperty) -> ControlResult<Option<Value>> {
    match handle.read(property) {
        Ok(value) if value.is_blank() => Ok(None),
        Ok(value) if property.zero_is_unknown && value.as_f64() == Some(0.0) => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(
            ControlError::Unsupported { .. }
            | ControlError::ObjectGone { .. }
            | ControlError::PropertyNotReadable { .. },
        ) => Ok(None),
        Err(err) => Err(err),
    }
}

fn apply_field(info: &mut NowPlayingInfo, generic: GenericProperty, property: &TargetProperty, value: &Value) {
    let text = || value.as_text().map(str::to_owned);
    let count = || {
        let raw = value
            .as_i64()
            .or_else(|| value.as_text()?.trim().parse().ok())?;
        u32::try_from(raw).ok()
    };
    match generic {
        GenericProperty::Title => info.title = text(),
        GenericProperty::Artist => info.artist = text(),
        GenericProperty::Album => info.album = text(),
        GenericProperty::AlbumArtist => info.album_artist = text(),
        GenericProperty::Genre => info.genre = text(),
        GenericProperty::Duration => {
            info.duration_seconds = value.as_f64().map(|raw| property.unit.to_seconds(raw))
        }
        GenericProperty::TrackNumber => info.track_number = count(),
        GenericProperty::DiscNumber => info.disc_number = count(),
        GenericProperty::Year => info.year = count(),
        GenericProperty::BitRate => info.bitrate_kbps = count(),
        GenericProperty::PlayCount => info.play_count = count(),
        GenericProperty::PlayInfoText => info.play_info_text = text(),
        GenericProperty::FormattedSpamText => info.formatted_spam_text = text(),
        GenericProperty::SourceUrl => info.source_url = text(),
        GenericProperty::ArtworkUrl => info.artwork_url = text(),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::fixtures;
    use crate::transport::memory::RecordedCall;

    fn open(target: &Arc<Target>) -> (Session, Arc<crate::transport::memory::MemoryProxy>) {
        let proxy = fixtures::simulated(&[target]);
        let session = Session::open(Arc::clone(target), proxy.clone(), &SessionOptions::default())
            .expect("session opens");
        (session, proxy)
    }

    #[test]
    fn handles_fail_after_session_closes() {
        let target = fixtures::jukebox();
        let (session, _proxy) = open(&target);
        let windows = session.application().windows().unwrap();
        assert_eq!(windows.len(), 1);
        session.close();
        let err = windows[0].name().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RemoteUnavailable);
    }

    #[test]
    fn lost_connection_invalidates_session() {
        let target = fixtures::jukebox();
        let (session, proxy) = open(&target);
        let app = session.application();
        proxy.drop_connections();
        let err = app.invoke(&Invocation::new("play")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RemoteUnavailable);
        assert!(!session.is_live());

        proxy.clear_calls();
        let again = app.invoke(&Invocation::new("play")).unwrap_err();
        assert!(again.is_unavailable());
        assert!(proxy.calls().is_empty());
    }

    #[test]
    fn timeout_leaves_handle_usable() {
        let target = fixtures::jukebox();
        let (session, proxy) = open(&target);
        let app = session.application();
        proxy.fail_next(RemoteError::Timeout);
        let err = app.invoke(&Invocation::new("play")).unwrap_err();
        assert!(err.is_timeout());
        assert!(app.invoke(&Invocation::new("play")).is_ok());
    }

    #[test]
    fn read_and_write_enforce_access_and_kind() {
        let target = fixtures::jukebox();
        let (session, proxy) = open(&target);
        let app = session.application();
        let state = app.property(GenericProperty::PlayerState).unwrap();
        let err = app.write(state, Value::code(b"kPSP")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PropertyNotWritable);

        let volume = app.property(GenericProperty::SoundVolume).unwrap();
        let err = app.write(volume, Value::from("loud")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
        assert_eq!(proxy.mutation_count(), 0);

        let write_only = TargetProperty {
            access: crate::schema::Access::WriteOnly,
            ..*volume
        };
        let err = app.read(&write_only).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PropertyNotReadable);
    }

    #[test]
    fn read_reports_schema_drift() {
        let target = fixtures::jukebox();
        let (session, proxy) = open(&target);
        proxy.set_value(&target.id, &ObjectPath::application(), "sound volume", Value::from("loud"));
        let app = session.application();
        let volume = app.property(GenericProperty::SoundVolume).unwrap();
        let err = app.read(volume).unwrap_err();
        assert!(matches!(
            err,
            ControlError::Schema(SchemaError::UnexpectedValue { .. })
        ));
    }

    #[test]
    fn close_saving_sends_standard_save_codes() {
        let target = fixtures::jukebox();
        let (session, proxy) = open(&target);
        let windows = session.application().windows().unwrap();
        windows[0].close_saving(SaveOption::Ask, None).unwrap();

        let invocation = proxy
            .calls()
            .into_iter()
            .find_map(|call| match call {
                RecordedCall::Invoke { invocation, .. } => Some(invocation),
                _ => None,
            })
            .expect("close was sent");
        assert_eq!(invocation.command, "close");
        assert_eq!(invocation.param("saving"), Some(&Value::code(b"ask ")));
        assert!(invocation.param("saving in").is_none());
        assert!(session.application().windows().unwrap().is_empty());
    }

    #[test]
    fn close_saving_no_with_destination() {
        let target = fixtures::jukebox();
        let (session, proxy) = open(&target);
        let windows = session.application().windows().unwrap();
        windows[0]
            .close_saving(SaveOption::No, Some(Path::new("/tmp/queue.m3u")))
            .unwrap();
        let commands: Vec<_> = proxy
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                RecordedCall::Invoke { invocation, .. } => Some(invocation),
                _ => None,
            })
            .collect();
        assert_eq!(commands[0].param("saving"), Some(&Value::code(b"no  ")));
        assert_eq!(
            commands[0].param("saving in"),
            Some(&Value::File("/tmp/queue.m3u".into()))
        );
    }

    #[test]
    fn unsupported_structural_operation_makes_no_remote_call() {
        let target = fixtures::jukebox();
        let (session, proxy) = open(&target);
        let windows = session.application().windows().unwrap();
        proxy.clear_calls();
        let err = windows[0].delete().unwrap_err();
        assert!(err.is_unsupported());
        let err = windows[0]
            .duplicate_to(&ObjectPath::application(), BTreeMap::new())
            .unwrap_err();
        assert!(err.is_unsupported());
        assert!(proxy.calls().is_empty());
    }

    #[test]
    fn entries_duplicate_move_and_delete() {
        let target = fixtures::jukebox();
        let (session, _proxy) = open(&target);
        let app = session.application();
        let entries = app.playlist_entries().unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].exists().unwrap());

        let mut overrides = BTreeMap::new();
        overrides.insert("name".to_owned(), Value::from("Flamenco Sketches"));
        let copy = entries[0]
            .duplicate_to(&ObjectPath::application().property("current playlist"), overrides)
            .unwrap();
        assert_eq!(copy.get_property("name").unwrap(), Value::from("Flamenco Sketches"));
        assert_eq!(app.playlist_entries().unwrap().len(), 3);

        entries[1].delete().unwrap();
        assert!(!entries[1].exists().unwrap());
        assert_eq!(app.playlist_entries().unwrap().len(), 2);
    }

    #[test]
    fn window_geometry_round_trips() {
        let target = fixtures::jukebox();
        let (session, _proxy) = open(&target);
        let window = session.application().windows().unwrap().remove(0);
        assert_eq!(window.index().unwrap(), 1);
        assert_eq!(window.name().unwrap().as_deref(), Some("Sample name"));
        let bounds = Bounds {
            left: 10,
            top: 20,
            right: 410,
            bottom: 320,
        };
        window.set_bounds(bounds).unwrap();
        assert_eq!(window.bounds().unwrap(), bounds);
        let err = window
            .set_bounds(Bounds {
                left: 10,
                top: 20,
                right: 0,
                bottom: 0,
            })
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
    }

    #[test]
    fn windows_unsupported_differs_from_none_open() {
        let toggle = fixtures::toggle_only();
        let (session, _proxy) = open(&toggle);
        assert!(session.application().windows().unwrap_err().is_unsupported());

        let target = fixtures::jukebox();
        let (session, proxy) = open(&target);
        proxy.set_children(&target.id, &ObjectPath::application(), "window", Vec::new());
        assert!(session.application().windows().unwrap().is_empty());
    }

    #[test]
    fn metadata_skips_unknown_fields() {
        let target = fixtures::jukebox();
        let (session, proxy) = open(&target);
        let track = ObjectPath::application().property("current track");
        proxy.set_value(&target.id, &track, "year", Value::Integer(0));
        proxy.set_value(&target.id, &track, "album", Value::from(""));
        proxy.set_value(&target.id, &track, "duration", Value::Integer(325_000));

        let info = session.application().current_track().unwrap().metadata().unwrap();
        assert_eq!(info.title.as_deref(), Some("Sample name"));
        assert_eq!(info.album, None);
        assert_eq!(info.year, None);
        assert_eq!(info.album_artist, None);
        assert_eq!(info.duration_seconds, Some(325.0));
    }

    #[test]
    fn missing_current_track_reads_as_empty() {
        let target = fixtures::jukebox();
        let (session, proxy) = open(&target);
        proxy.remove_object(&target.id, &ObjectPath::application().property("current track"));
        let app = session.application();
        assert!(app.loaded_track().unwrap().is_none());
        let info = app.current_track().unwrap().metadata().unwrap();
        assert!(info.is_empty());
    }

    #[test]
    fn application_exists_checks_without_commands() {
        let target = fixtures::jukebox();
        let (session, proxy) = open(&target);
        proxy.clear_calls();
        assert!(session.application().exists().unwrap());
        assert!(proxy.calls().is_empty());
    }
}
