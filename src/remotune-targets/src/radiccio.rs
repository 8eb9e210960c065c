//! Radiccio.
//!
//! Uses its own player-state codes. Volume moves in steps of five and the
//! playback position cannot be set.

use remotune_core::models::PlaybackState;
use remotune_core::schema::{
    CapabilitySchema, Canonical, EnumEntry, EnumTable, GenericOperation, GenericProperty,
    PropertyOwner, Target, TargetOperation, TargetProperty,
};
use remotune_core::value::ValueKind;

pub const ID: &str = "computer.crispycrunchy.radiccio";
pub const NAME: &str = "Radiccio";

pub const VOLUME_STEP: u8 = 5;

pub static PLAYER_STATES: EnumTable = EnumTable {
    name: "Radiccio player state",
    entries: &[
        EnumEntry::new(b"rdST", "stopped", Canonical::Playback(PlaybackState::Stopped)),
        EnumEntry::new(b"rdPL", "playing", Canonical::Playback(PlaybackState::Playing)),
        EnumEntry::new(b"rdPA", "paused", Canonical::Playback(PlaybackState::Paused)),
    ],
};

pub static SCHEMA: CapabilitySchema = CapabilitySchema {
    operations: &[
        (GenericOperation::Play, TargetOperation::new("play")),
        (GenericOperation::Pause, TargetOperation::new("pause")),
        (GenericOperation::PlayPause, TargetOperation::new("playpause")),
        (GenericOperation::Stop, TargetOperation::new("stop")),
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
            TargetProperty::read_only("player position", PropertyOwner::Application, ValueKind::Real),
        ),
        (
            GenericProperty::SoundVolume,
            TargetProperty::read_write("sound volume", PropertyOwner::Application, ValueKind::Integer)
                .with_range(0.0, 100.0, VOLUME_STEP as f64),
        ),
    ],
    ..CapabilitySchema::EMPTY
};

pub fn target() -> Target {
    Target::new(ID, NAME, SCHEMA)
}
