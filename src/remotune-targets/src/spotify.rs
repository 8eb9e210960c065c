//! Spotify.
//!
//! Track metadata is read-only and has no genre or year. Durations come in
//! milliseconds, repeat is a plain on/off switch, and there is no stop
//! command.

use remotune_core::models::PlaybackState;
use remotune_core::schema::{
    CapabilitySchema, Canonical, EnumEntry, EnumTable, GenericOperation, GenericProperty,
    PropertyOwner, Target, TargetOperation, TargetProperty,
};
use remotune_core::value::ValueKind;

pub const ID: &str = "com.spotify.client";
pub const NAME: &str = "Spotify";

pub static PLAYER_STATES: EnumTable = EnumTable {
    name: "Spotify player state",
    entries: &[
        EnumEntry::new(b"kPSS", "stopped", Canonical::Playback(PlaybackState::Stopped)),
        EnumEntry::new(b"kPSP", "playing", Canonical::Playback(PlaybackState::Playing)),
        EnumEntry::new(b"kPSp", "paused", Canonical::Playback(PlaybackState::Paused)),
    ],
};

pub static SCHEMA: CapabilitySchema = CapabilitySchema {
    operations: &[
        (GenericOperation::Play, TargetOperation::new("play")),
        (GenericOperation::Pause, TargetOperation::new("pause")),
        (GenericOperation::PlayPause, TargetOperation::new("playpause")),
        (GenericOperation::Next, TargetOperation::new("next track")),
        (GenericOperation::Previous, TargetOperation::new("previous track")),
        (GenericOperation::SkipBack, TargetOperation::new("previous track")),
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
            TargetProperty::read_write("repeating", PropertyOwner::Application, ValueKind::Bool),
        ),
        (
            GenericProperty::Title,
            TargetProperty::read_only("name", PropertyOwner::Track, ValueKind::Text),
        ),
        (
            GenericProperty::Artist,
            TargetProperty::read_only("artist", PropertyOwner::Track, ValueKind::Text),
        ),
        (
            GenericProperty::Album,
            TargetProperty::read_only("album", PropertyOwner::Track, ValueKind::Text),
        ),
        (
            GenericProperty::AlbumArtist,
            TargetProperty::read_only("album artist", PropertyOwner::Track, ValueKind::Text),
        ),
        (
            GenericProperty::Duration,
            TargetProperty::read_only("duration", PropertyOwner::Track, ValueKind::Integer)
                .in_milliseconds(),
        ),
        (
            GenericProperty::TrackNumber,
            TargetProperty::read_only("track number", PropertyOwner::Track, ValueKind::Integer)
                .zero_is_unknown(),
        ),
        (
            GenericProperty::DiscNumber,
            TargetProperty::read_only("disc number", PropertyOwner::Track, ValueKind::Integer)
                .zero_is_unknown(),
        ),
        (
            GenericProperty::PlayCount,
            TargetProperty::read_only("played count", PropertyOwner::Track, ValueKind::Integer),
        ),
        (
            GenericProperty::SourceUrl,
            TargetProperty::read_only("spotify url", PropertyOwner::Track, ValueKind::Text),
        ),
        (
            GenericProperty::ArtworkUrl,
            TargetProperty::read_only("artwork url", PropertyOwner::Track, ValueKind::Text),
        ),
    ],
    current_track: Some("current track"),
    ..CapabilitySchema::EMPTY
};

pub fn target() -> Target {
    Target::new(ID, NAME, SCHEMA)
}
