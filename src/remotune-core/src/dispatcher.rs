//! Generic media-control intent mapped onto one target's schema.

use crate::error::{ControlError, ControlResult};
use crate::models::{NowPlayingInfo, PlaybackState, RepeatMode};
use crate::object::{Application, PlaylistEntry, Session, Window};
use crate::schema::{Canonical, GenericOperation, GenericProperty, SchemaError, Target, TargetOperation};
use crate::transport::Invocation;
use crate::value::{Value, ValueKind};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlState {
    Idle,
    /// A remote call is in flight.
    AwaitingRemote,
}

/// Drives one target through its session.
///
/// Every method takes `&mut self`, so calls against one target are issued one
/// at a time and in order.
#[derive(Debug)]
pub struct Dispatcher {
    session: Session,
    application: Application,
    state: ControlState,
}

impl Dispatcher {
    pub fn new(session: Session) -> Self {
        let application = session.application();
        Self {
            session,
            application,
            state: ControlState::Idle,
        }
    }

    pub fn target(&self) -> &Arc<Target> {
        self.session.target()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn application(&self) -> &Application {
        &self.application
    }

    pub fn state(&self) -> ControlState {
        self.state
    }

    pub fn close(self) {
        self.session.close();
    }

    fn call<T>(&mut self, action: impl FnOnce(&Application) -> ControlResult<T>) -> ControlResult<T> {
        self.state = ControlState::AwaitingRemote;
        let result = action(&self.application);
        self.state = ControlState::Idle;
        result
    }

    fn property(&self, generic: GenericProperty) -> ControlResult<&'static crate::schema::TargetProperty> {
        self.application.property(generic)
    }

    /// Sends the target's command for `operation`.
    ///
    /// An operation missing from the schema is reported as `Unsupported`
    /// without contacting the target.
    pub fn dispatch(&mut self, operation: GenericOperation) -> ControlResult<()> {
        self.dispatch_with(operation, &[])
    }

    /// Like [`dispatch`](Self::dispatch), passing labelled parameters the
    /// schema declares for the command. Unknown labels and values of the
    /// wrong kind are rejected before any remote call.
    pub fn dispatch_with(&mut self, operation: GenericOperation, params: &[(&'static str, Value)]) -> ControlResult<()> {
        let target = self.target();
        let spec = target
            .schema
            .lookup_operation(operation)
            .ok_or_else(|| ControlError::unsupported(&target.id, operation.as_str()))?;
        let invocation = build_invocation(spec, params)?;
        self.call(|app| app.invoke(&invocation).map(|_| ()))
    }

    pub fn play(&mut self) -> ControlResult<()> {
        self.dispatch(GenericOperation::Play)
    }

    pub fn pause(&mut self) -> ControlResult<()> {
        self.dispatch(GenericOperation::Pause)
    }

    pub fn play_pause(&mut self) -> ControlResult<()> {
        self.dispatch(GenericOperation::PlayPause)
    }

    pub fn stop(&mut self) -> ControlResult<()> {
        self.dispatch(GenericOperation::Stop)
    }

    pub fn next(&mut self) -> ControlResult<()> {
        self.dispatch(GenericOperation::Next)
    }

    pub fn previous(&mut self) -> ControlResult<()> {
        self.dispatch(GenericOperation::Previous)
    }

    pub fn skip_back(&mut self) -> ControlResult<()> {
        self.dispatch(GenericOperation::SkipBack)
    }

    pub fn quit(&mut self) -> ControlResult<()> {
        self.dispatch(GenericOperation::Quit)
    }

    /// Everything the target reports about the current item.
    ///
    /// Fields are read independently. An empty snapshot is a valid answer
    /// (nothing loaded); timeouts, lost connections and schema drift are not
    /// folded into it.
    pub fn now_playing(&mut self) -> ControlResult<NowPlayingInfo> {
        self.call(|app| {
            let mut info = match app.current_track() {
                Ok(track) => track.metadata()?,
                Err(err) if err.is_unsupported() => NowPlayingInfo::default(),
                Err(err) => return Err(err),
            };
            app.fill_metadata(&mut info)?;
            Ok(info)
        })
    }

    pub fn playback_state(&mut self) -> ControlResult<PlaybackState> {
        let property = self.property(GenericProperty::PlayerState)?;
        let value = self.call(|app| app.read(property))?;
        match property.decode_enum(&value)? {
            Canonical::Playback(state) => Ok(state),
            other => Err(SchemaError::UnmappedCanonical {
                table: property.enumeration.map_or(property.name, |table| table.name),
                canonical: other,
            }
            .into()),
        }
    }

    /// Output volume on the target's own scale, usually 0-100.
    pub fn volume(&mut self) -> ControlResult<u8> {
        let property = self.property(GenericProperty::SoundVolume)?;
        let value = self.call(|app| app.read(property))?;
        let raw = value.as_f64().ok_or(SchemaError::UnexpectedValue {
            property: property.name,
            expected: property.kind,
            found: value.kind(),
        })?;
        let in_range = property.range.map_or(true, |range| range.contains(raw));
        if !raw.is_finite() || !in_range || raw < 0.0 || raw.round() > f64::from(u8::MAX) {
            return Err(SchemaError::OutOfRange {
                property: property.name,
                value: raw,
            }
            .into());
        }
        Ok(raw.round() as u8)
    }

    /// Rejects values outside the schema's range or off its step before any
    /// remote call.
    pub fn set_volume(&mut self, volume: u8) -> ControlResult<()> {
        let property = self.property(GenericProperty::SoundVolume)?;
        let requested = f64::from(volume);
        if let Some(range) = property.range {
            if !range.contains(requested) {
                return Err(ControlError::InvalidParameter {
                    parameter: "volume",
                    reason: format!("{volume} is outside {}..={}", range.min, range.max),
                });
            }
            if !range.is_on_step(requested) {
                return Err(ControlError::InvalidParameter {
                    parameter: "volume",
                    reason: format!("{volume} is not a multiple of {}", range.step),
                });
            }
        }
        let value = match property.kind {
            ValueKind::Real => Value::Real(requested),
            _ => Value::Integer(i64::from(volume)),
        };
        self.call(|app| app.write(property, value))
    }

    /// Playback position in seconds; `None` when nothing is loaded.
    pub fn position(&mut self) -> ControlResult<Option<f64>> {
        let property = self.property(GenericProperty::PlayerPosition)?;
        let value = self.call(|app| app.read(property))?;
        if value.is_missing() {
            return Ok(None);
        }
        let raw = value.as_f64().ok_or(SchemaError::UnexpectedValue {
            property: property.name,
            expected: property.kind,
            found: value.kind(),
        })?;
        Ok(Some(property.unit.to_seconds(raw)))
    }

    pub fn set_position(&mut self, seconds: f64) -> ControlResult<()> {
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(ControlError::InvalidParameter {
                parameter: "position",
                reason: format!("{seconds} is not a playback position"),
            });
        }
        let property = self.property(GenericProperty::PlayerPosition)?;
        let raw = property.unit.from_seconds(seconds);
        let value = match property.kind {
            ValueKind::Integer => Value::Integer(raw.round() as i64),
            _ => Value::Real(raw),
        };
        self.call(|app| app.write(property, value))
    }

    pub fn repeat_mode(&mut self) -> ControlResult<RepeatMode> {
        let property = self.property(GenericProperty::RepeatMode)?;
        let value = self.call(|app| app.read(property))?;
        if property.kind == ValueKind::Bool {
            return match value {
                Value::Bool(true) => Ok(RepeatMode::All),
                Value::Bool(false) => Ok(RepeatMode::Off),
                other => Err(SchemaError::UnexpectedValue {
                    property: property.name,
                    expected: ValueKind::Bool,
                    found: other.kind(),
                }
                .into()),
            };
        }
        match property.decode_enum(&value)? {
            Canonical::Repeat(mode) => Ok(mode),
            other => Err(SchemaError::UnmappedCanonical {
                table: property.enumeration.map_or(property.name, |table| table.name),
                canonical: other,
            }
            .into()),
        }
    }

    /// Targets with an on/off repeat switch cannot repeat a single item.
    pub fn set_repeat_mode(&mut self, mode: RepeatMode) -> ControlResult<()> {
        let property = self.property(GenericProperty::RepeatMode)?;
        let value = if property.kind == ValueKind::Bool {
            match mode {
                RepeatMode::Off => Value::Bool(false),
                RepeatMode::All => Value::Bool(true),
                RepeatMode::One => {
                    return Err(ControlError::InvalidParameter {
                        parameter: "repeat mode",
                        reason: format!("{} can only repeat everything or nothing", self.target().name),
                    })
                }
            }
        } else {
            property.encode_enum(Canonical::Repeat(mode))?
        };
        self.call(|app| app.write(property, value))
    }

    pub fn windows(&mut self) -> ControlResult<Vec<Window>> {
        self.call(Application::windows)
    }

    /// The loaded item, or `None` when the player is empty.
    pub fn current_entry(&mut self) -> ControlResult<Option<PlaylistEntry>> {
        self.call(Application::loaded_track)
    }

    pub fn playlist_entries(&mut self) -> ControlResult<Vec<PlaylistEntry>> {
        self.call(Application::playlist_entries)
    }
}

fn build_invocation(spec: &TargetOperation, params: &[(&'static str, Value)]) -> ControlResult<Invocation> {
    let mut invocation = Invocation::new(spec.command);
    for (name, value) in params {
        let declared = spec.param(name).ok_or_else(|| ControlError::InvalidParameter {
            parameter: *name,
            reason: format!("{} takes no such parameter", spec.command),
        })?;
        if !declared.accepts(value) {
            return Err(ControlError::InvalidParameter {
                parameter: declared.name,
                reason: format!("expected {}, got {}", declared.kind, value.kind()),
            });
        }
        invocation = invocation.with_param(declared.name, value.clone());
    }
    if let Some(missing) = spec
        .params
        .iter()
        .find(|param| param.required && !params.iter().any(|(name, _)| *name == param.name))
    {
        return Err(ControlError::InvalidParameter {
            parameter: missing.name,
            reason: format!("{} requires it", spec.command),
        });
    }
    Ok(invocation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::fixtures;
    use crate::object::SessionOptions;
    use crate::transport::memory::{MemoryProxy, RecordedCall};
    use crate::value::ObjectPath;

    fn dispatcher(target: &Arc<Target>) -> (Dispatcher, Arc<MemoryProxy>) {
        let proxy = fixtures::simulated(&[target]);
        let session = Session::open(Arc::clone(target), proxy.clone(), &SessionOptions::default())
            .expect("session opens");
        (Dispatcher::new(session), proxy)
    }

    #[test]
    fn unsupported_operation_never_reaches_the_target() {
        let target = fixtures::toggle_only();
        let (mut dispatcher, proxy) = dispatcher(&target);
        proxy.clear_calls();
        let err = dispatcher.stop().unwrap_err();
        assert!(err.is_unsupported());
        assert!(dispatcher.skip_back().unwrap_err().is_unsupported());
        assert!(dispatcher.volume().unwrap_err().is_unsupported());
        assert!(proxy.calls().is_empty());
        assert_eq!(dispatcher.state(), ControlState::Idle);
    }

    #[test]
    fn stop_twice_stays_stopped() {
        let target = fixtures::jukebox();
        let (mut dispatcher, _proxy) = dispatcher(&target);
        dispatcher.play().unwrap();
        assert_eq!(dispatcher.playback_state().unwrap(), PlaybackState::Playing);
        dispatcher.stop().unwrap();
        dispatcher.stop().unwrap();
        assert_eq!(dispatcher.playback_state().unwrap(), PlaybackState::Stopped);
    }

    #[test]
    fn play_pause_toggles() {
        let target = fixtures::jukebox();
        let (mut dispatcher, _proxy) = dispatcher(&target);
        dispatcher.play_pause().unwrap();
        assert_eq!(dispatcher.playback_state().unwrap(), PlaybackState::Playing);
        dispatcher.play_pause().unwrap();
        assert_eq!(dispatcher.playback_state().unwrap(), PlaybackState::Paused);
    }

    #[test]
    fn volume_round_trips_and_rejects_off_step_values() {
        let target = fixtures::jukebox();
        let (mut dispatcher, proxy) = dispatcher(&target);
        dispatcher.set_volume(40).unwrap();
        assert_eq!(dispatcher.volume().unwrap(), 40);

        proxy.clear_calls();
        let err = dispatcher.set_volume(42).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
        let err = dispatcher.set_volume(105).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
        assert_eq!(proxy.mutation_count(), 0);
        assert_eq!(dispatcher.volume().unwrap(), 40);
    }

    #[test]
    fn invocations_follow_the_declared_parameters() {
        use crate::schema::ParamSpec;
        static PARAMS: [ParamSpec; 2] = [
            ParamSpec::optional("once", ValueKind::Bool),
            ParamSpec {
                name: "to",
                kind: ValueKind::Real,
                required: true,
            },
        ];
        let spec = TargetOperation::new("seek").with_params(&PARAMS);

        let invocation = build_invocation(&spec, &[("to", Value::Integer(30)), ("once", Value::Bool(true))]).unwrap();
        assert_eq!(invocation.command, "seek");
        assert_eq!(invocation.param("to"), Some(&Value::Integer(30)));
        assert_eq!(invocation.param("once"), Some(&Value::Bool(true)));

        let err = build_invocation(&spec, &[("once", Value::Bool(false))]).unwrap_err();
        assert!(matches!(err, ControlError::InvalidParameter { parameter: "to", .. }));
        let err = build_invocation(&spec, &[("to", Value::from("soon"))]).unwrap_err();
        assert!(matches!(err, ControlError::InvalidParameter { parameter: "to", .. }));
        let err = build_invocation(&spec, &[("to", Value::Real(1.0)), ("loud", Value::Bool(true))]).unwrap_err();
        assert!(matches!(err, ControlError::InvalidParameter { parameter: "loud", .. }));
    }

    #[test]
    fn volume_outside_the_declared_range_is_a_schema_error() {
        let target = fixtures::jukebox();
        let (mut dispatcher, proxy) = dispatcher(&target);
        let app = ObjectPath::application();
        proxy.set_value(&target.id, &app, "sound volume", Value::Integer(250));
        let err = dispatcher.volume().unwrap_err();
        assert!(matches!(
            err,
            ControlError::Schema(SchemaError::OutOfRange { property: "sound volume", .. })
        ));

        proxy.set_value(&target.id, &app, "sound volume", Value::Integer(-3));
        assert_eq!(dispatcher.volume().unwrap_err().kind(), ErrorKind::Schema);

        proxy.set_value(&target.id, &app, "sound volume", Value::Integer(100));
        assert_eq!(dispatcher.volume().unwrap(), 100);
    }

    #[test]
    fn now_playing_reads_only_metadata_properties() {
        let target = fixtures::jukebox();
        let (mut dispatcher, proxy) = dispatcher(&target);
        let app = ObjectPath::application();
        proxy.set_value(&target.id, &app, "sound volume", Value::from("loud"));
        proxy.clear_calls();

        let info = dispatcher.now_playing().unwrap();
        assert_eq!(info.play_info_text.as_deref(), Some("Sample current stream title"));
        let read: Vec<String> = proxy
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                RecordedCall::Get { property, .. } => Some(property),
                _ => None,
            })
            .collect();
        assert!(read.iter().any(|property| property == "current stream title"));
        for skipped in ["player state", "sound volume", "player position", "song repeat"] {
            assert!(!read.iter().any(|property| property == skipped), "{skipped} was read");
        }
    }

    #[test]
    fn partial_metadata_keeps_known_fields() {
        let target = fixtures::jukebox();
        let (mut dispatcher, proxy) = dispatcher(&target);
        let track = ObjectPath::application().property("current track");
        proxy.set_value(&target.id, &track, "name", Value::from("Blue in Green"));
        proxy.set_value(&target.id, &track, "artist", Value::from("Miles Davis"));

        let info = dispatcher.now_playing().unwrap();
        assert_eq!(info.title.as_deref(), Some("Blue in Green"));
        assert_eq!(info.artist.as_deref(), Some("Miles Davis"));
        assert_eq!(info.album_artist, None);
        assert_eq!(info.play_info_text.as_deref(), Some("Sample current stream title"));
    }

    #[test]
    fn nothing_loaded_yields_empty_track_fields() {
        let target = fixtures::jukebox();
        let (mut dispatcher, proxy) = dispatcher(&target);
        proxy.remove_object(&target.id, &ObjectPath::application().property("current track"));
        proxy.set_value(&target.id, &ObjectPath::application(), "current stream title", Value::Missing);
        assert!(dispatcher.now_playing().unwrap().is_empty());
        assert!(dispatcher.current_entry().unwrap().is_none());
    }

    #[test]
    fn now_playing_propagates_timeouts() {
        let target = fixtures::jukebox();
        let (mut dispatcher, proxy) = dispatcher(&target);
        proxy.fail_next(crate::transport::RemoteError::Timeout);
        let err = dispatcher.now_playing().unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(dispatcher.state(), ControlState::Idle);
    }

    #[test]
    fn unknown_player_state_is_a_schema_error() {
        let target = fixtures::jukebox();
        let (mut dispatcher, proxy) = dispatcher(&target);
        proxy.set_value(&target.id, &ObjectPath::application(), "player state", Value::code(b"kPSX"));
        let err = dispatcher.playback_state().unwrap_err();
        assert!(matches!(
            err,
            ControlError::Schema(SchemaError::UnknownEnumerator { .. })
        ));
    }

    #[test]
    fn position_converts_and_validates() {
        let target = fixtures::jukebox();
        let (mut dispatcher, proxy) = dispatcher(&target);
        dispatcher.set_position(12.5).unwrap();
        assert_eq!(dispatcher.position().unwrap(), Some(12.5));

        proxy.set_value(&target.id, &ObjectPath::application(), "player position", Value::Missing);
        assert_eq!(dispatcher.position().unwrap(), None);

        let err = dispatcher.set_position(-1.0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
    }

    #[test]
    fn repeat_mode_uses_the_enumeration() {
        let target = fixtures::jukebox();
        let (mut dispatcher, proxy) = dispatcher(&target);
        dispatcher.set_repeat_mode(RepeatMode::One).unwrap();
        assert_eq!(
            proxy.value(&target.id, &ObjectPath::application(), "song repeat"),
            Some(Value::code(b"kRp1"))
        );
        assert_eq!(dispatcher.repeat_mode().unwrap(), RepeatMode::One);
    }

    #[test]
    fn element_collections_are_exposed() {
        let target = fixtures::jukebox();
        let (mut dispatcher, _proxy) = dispatcher(&target);
        assert_eq!(dispatcher.windows().unwrap().len(), 1);
        assert_eq!(dispatcher.playlist_entries().unwrap().len(), 2);
        assert!(dispatcher.current_entry().unwrap().is_some());
    }
}
