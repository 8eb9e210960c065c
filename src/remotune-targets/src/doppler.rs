//! Doppler. Transport control and player state only.

use remotune_core::models::PlaybackState;
use remotune_core::schema::{
    CapabilitySchema, Canonical, EnumEntry, EnumTable, GenericOperation, GenericProperty,
    PropertyOwner, Target, TargetOperation, TargetProperty,
};
use remotune_core::value::ValueKind;

pub const ID: &str = "co.brushedtype.doppler-macos";
pub const NAME: &str = "Doppler";

pub static PLAYER_STATES: EnumTable = EnumTable {
    name: "Doppler player state",
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
    properties: &[(
        GenericProperty::PlayerState,
        TargetProperty::read_only("player state", PropertyOwner::Application, ValueKind::Enumerator)
            .with_enum(&PLAYER_STATES),
    )],
    ..CapabilitySchema::EMPTY
};

pub fn target() -> Target {
    Target::new(ID, NAME, SCHEMA)
}
