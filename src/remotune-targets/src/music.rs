//! Apple Music.
//!
//! The richest dictionary of the built-ins: a full track model, windows, a
//! current playlist whose tracks can be rearranged, and a three-way repeat
//! switch. Durations are reported in seconds.

use remotune_core::models::{PlaybackState, RepeatMode};
use remotune_core::schema::{
    CapabilitySchema, Canonical, EnumEntry, EnumTable, GenericElement, GenericOperation,
    GenericProperty, ObjectKind, ParamSpec, PropertyOwner, StructuralOperation, StructuralSupport, Target,
    TargetElement, TargetOperation, TargetProperty,
};
use remotune_core::value::ValueKind;

pub const ID: &str = "com.apple.Music";
pub const NAME: &str = "Music";

/// `play once true` stops after the current track.
const PLAY_PARAMS: &[ParamSpec] = &[ParamSpec::optional("once", ValueKind::Bool)];

/// Seeking either way still counts as playing.
pub static PLAYER_STATES: EnumTable = EnumTable {
    name: "Music player state",
    entries: &[
        EnumEntry::new(b"kPSS", "stopped", Canonical::Playback(PlaybackState::Stopped)),
        EnumEntry::new(b"kPSP", "playing", Canonical::Playback(PlaybackState::Playing)),
        EnumEntry::new(b"kPSp", "paused", Canonical::Playback(PlaybackState::Paused)),
        EnumEntry::new(b"kPSF", "fast forwarding", Canonical::Playback(PlaybackState::Playing)),
        EnumEntry::new(b"kPSR", "rewinding", Canonical::Playback(PlaybackState::Playing)),
    ],
};

pub static REPEAT_MODES: EnumTable = EnumTable {
    name: "Music song repeat",
    entries: &[
        EnumEntry::new(b"kRpO", "off", Canonical::Repeat(RepeatMode::Off)),
        EnumEntry::new(b"kRp1", "one", Canonical::Repeat(RepeatMode::One)),
        EnumEntry::new(b"kAll", "all", Canonical::Repeat(RepeatMode::All)),
    ],
};

pub static SCHEMA: CapabilitySchema = CapabilitySchema {
    operations: &[
        (
            GenericOperation::Play,
            TargetOperation::new("play").with_params(PLAY_PARAMS),
        ),
        (GenericOperation::Pause, TargetOperation::new("pause")),
        (GenericOperation::PlayPause, TargetOperation::new("playpause")),
        (GenericOperation::Stop, TargetOperation::new("stop")),
        (GenericOperation::Next, TargetOperation::new("next track")),
        (GenericOperation::Previous, TargetOperation::new("previous track")),
        (GenericOperation::SkipBack, TargetOperation::new("back track")),
        (GenericOperation::Quit, TargetOperation::new("quit")),
    ],
    properties: &[
        (
            GenericProperty::PlayerState,
            TargetProperty::read_only("player state", PropertyOwner::Application, ValueKind::Enumerator)
                .with_enum(&PLAYER_STATES),
        ),
        (
            GenericProperty::PlayerPosition,
            TargetProperty::read_write("player position", PropertyOwner::Application, ValueKind::Real),
        ),
        (
            GenericProperty::SoundVolume,
            TargetProperty::read_write("sound volume", PropertyOwner::Application, ValueKind::Integer)
                .with_range(0.0, 100.0, 1.0),
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
            GenericProperty::SourceUrl,
            TargetProperty::read_only("current stream URL", PropertyOwner::Application, ValueKind::Text),
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
            GenericProperty::AlbumArtist,
            TargetProperty::read_write("album artist", PropertyOwner::Track, ValueKind::Text),
        ),
        (
            GenericProperty::Genre,
            TargetProperty::read_write("genre", PropertyOwner::Track, ValueKind::Text),
        ),
        (
            GenericProperty::Duration,
            TargetProperty::read_only("duration", PropertyOwner::Track, ValueKind::Real),
        ),
        (
            GenericProperty::TrackNumber,
            TargetProperty::read_write("track number", PropertyOwner::Track, ValueKind::Integer)
                .zero_is_unknown(),
        ),
        (
            GenericProperty::DiscNumber,
            TargetProperty::read_write("disc number", PropertyOwner::Track, ValueKind::Integer)
                .zero_is_unknown(),
        ),
        (
            GenericProperty::Year,
            TargetProperty::read_write("year", PropertyOwner::Track, ValueKind::Integer)
                .zero_is_unknown(),
        ),
        (
            GenericProperty::BitRate,
            TargetProperty::read_only("bit rate", PropertyOwner::Track, ValueKind::Integer)
                .zero_is_unknown(),
        ),
        (
            GenericProperty::PlayCount,
            TargetProperty::read_write("played count", PropertyOwner::Track, ValueKind::Integer),
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

pub fn target() -> Target {
    Target::new(ID, NAME, SCHEMA)
}
