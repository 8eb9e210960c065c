//! Schemas shared by the unit tests in this crate.

use crate::models::{PlaybackState, RepeatMode};
use crate::schema::{
    CapabilitySchema, Canonical, EnumEntry, EnumTable, GenericElement, GenericOperation,
    GenericProperty, ObjectKind, PropertyOwner, StructuralOperation, StructuralSupport, Target,
    TargetElement, TargetOperation, TargetProperty,
};
use crate::transport::memory::MemoryProxy;
use crate::value::ValueKind;
use std::sync::Arc;

pub static PLAYER_STATES: EnumTable = EnumTable {
    name: "jukebox player state",
    entries: &[
        EnumEntry::new(b"kPSS", "stopped", Canonical::Playback(PlaybackState::Stopped)),
        EnumEntry::new(b"kPSP", "playing", Canonical::Playback(PlaybackState::Playing)),
        EnumEntry::new(b"kPSp", "paused", Canonical::Playback(PlaybackState::Paused)),
    ],
};

pub static REPEAT_MODES: EnumTable = EnumTable {
    name: "jukebox repeat",
    entries: &[
        EnumEntry::new(b"kRpO", "off", Canonical::Repeat(RepeatMode::Off)),
        EnumEntry::new(b"kRp1", "one", Canonical::Repeat(RepeatMode::One)),
        EnumEntry::new(b"kAll", "all", Canonical::Repeat(RepeatMode::All)),
    ],
};

/// A full-featured player: windows, a playlist, millisecond durations.
pub static JUKEBOX: CapabilitySchema = CapabilitySchema {
    operations: &[
        (GenericOperation::Play, TargetOperation::new("play")),
        (GenericOperation::Pause, TargetOperation::new("pause")),
        (GenericOperation::PlayPause, TargetOperation::new("playpause")),
        (GenericOperation::Stop, TargetOperation::new("stop")),
        (GenericOperation::Next, TargetOperation::new("next track")),
        (GenericOperation::Previous, TargetOperation::new("previous track")),
        (GenericOperation::Quit, TargetOperation::new("quit")),
    ],
    properties: &[
        (
            GenericProperty::PlayerState,
            TargetProperty::read_only("player state", PropertyOwner::Application, ValueKind::Enumerator)
                .with_enum(&PLAYER_STATES),
        ),
        (
            GenericProperty::SoundVolume,
            TargetProperty::read_write("sound volume", PropertyOwner::Application, ValueKind::Integer)
                .with_range(0.0, 100.0, 5.0),
        ),
        (
            GenericProperty::PlayerPosition,
            TargetProperty::read_write("player position", PropertyOwner::Application, ValueKind::Real),
        ),
        (
            GenericProperty::RepeatMode,
            TargetProperty::read_write("song repeat", PropertyOwner::Application, ValueKind::Enumerator)
                .with_enum(&REPEAT_MODES),
        ),
        (
            GenericProperty::PlayInfoText,
            TargetProperty::read_only("current stream title", PropertyOwner::Application, ValueKind::Text),
        ),
        (
            GenericProperty::Title,
            TargetProperty::read_write("name", PropertyOwner::Track, ValueKind::Text),
        ),
        (
            GenericProperty::Artist,
            TargetProperty::read_write("artist", PropertyOwner::Track, ValueKind::Text),
        ),
        (
            GenericProperty::Album,
            TargetProperty::read_write("album", PropertyOwner::Track, ValueKind::Text),
        ),
        (
            GenericProperty::Duration,
            TargetProperty::read_only("duration", PropertyOwner::Track, ValueKind::Integer)
                .in_milliseconds(),
        ),
        (
            GenericProperty::Year,
            TargetProperty::read_write("year", PropertyOwner::Track, ValueKind::Integer)
                .zero_is_unknown(),
        ),
        (
            GenericProperty::WindowName,
            TargetProperty::read_only("name", PropertyOwner::Window, ValueKind::Text),
        ),
        (
            GenericProperty::WindowBounds,
            TargetProperty::read_write("bounds", PropertyOwner::Window, ValueKind::List),
        ),
        (
            GenericProperty::WindowIndex,
            TargetProperty::read_write("index", PropertyOwner::Window, ValueKind::Integer),
        ),
    ],
    elements: &[
        (GenericElement::Windows, TargetElement::of_application("window")),
        (
            GenericElement::PlaylistEntries,
            TargetElement::within("track", "current playlist"),
        ),
    ],
    structural: &[
        StructuralSupport {
            kind: ObjectKind::Window,
            operations: &[StructuralOperation::Exists, StructuralOperation::Close],
        },
        StructuralSupport {
            kind: ObjectKind::PlaylistEntry,
            operations: &[
                StructuralOperation::Exists,
                StructuralOperation::Delete,
                StructuralOperation::Duplicate,
                StructuralOperation::Move,
            ],
        },
    ],
    current_track: Some("current track"),
};

/// A player that can only toggle playback and report its state.
pub static TOGGLE_ONLY: CapabilitySchema = CapabilitySchema {
    operations: &[(GenericOperation::PlayPause, TargetOperation::new("play"))],
    properties: &[(
        GenericProperty::PlayerState,
        TargetProperty::read_only("player state", PropertyOwner::Application, ValueKind::Enumerator)
            .with_enum(&PLAYER_STATES),
    )],
    ..CapabilitySchema::EMPTY
};

pub fn jukebox() -> Arc<Target> {
    Arc::new(Target::new("test.jukebox", "Jukebox", JUKEBOX))
}

pub fn toggle_only() -> Arc<Target> {
    Arc::new(Target::new("test.toggle", "Toggle", TOGGLE_ONLY))
}

/// A proxy simulating each of `targets` from its schema.
pub fn simulated(targets: &[&Arc<Target>]) -> Arc<MemoryProxy> {
    let proxy = Arc::new(MemoryProxy::new());
    for target in targets {
        proxy.simulate(target);
    }
    proxy
}
