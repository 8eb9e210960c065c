//! Cog.
//!
//! Cog's `play` command toggles playback, so it backs play/pause and there
//! is no separate play. It reports no player state. The item being played
//! is `current entry`; its play count is text, its length is in seconds.

use remotune_core::schema::{
    CapabilitySchema, GenericElement, GenericOperation, GenericProperty, ObjectKind,
    PropertyOwner, StructuralOperation, StructuralSupport, Target, TargetElement,
    TargetOperation, TargetProperty,
};
use remotune_core::value::ValueKind;

pub const ID: &str = "org.cogx.cog";
pub const NAME: &str = "Cog";

pub static SCHEMA: CapabilitySchema = CapabilitySchema {
    operations: &[
        (GenericOperation::PlayPause, TargetOperation::new("play")),
        (GenericOperation::Pause, TargetOperation::new("pause")),
        (GenericOperation::Stop, TargetOperation::new("stop")),
        (GenericOperation::Next, TargetOperation::new("next")),
        (GenericOperation::Previous, TargetOperation::new("previous")),
        (GenericOperation::SkipBack, TargetOperation::new("previous")),
        (GenericOperation::Quit, TargetOperation::new("quit")),
    ],
    properties: &[
        (
            GenericProperty::Title,
            TargetProperty::read_only("title", PropertyOwner::Track, ValueKind::Text),
        ),
        (
            GenericProperty::Artist,
            TargetProperty::read_write("artist", PropertyOwner::Track, ValueKind::Text),
        ),
        (
            GenericProperty::Album,
            TargetProperty::read_only("album", PropertyOwner::Track, ValueKind::Text),
        ),
        (
            GenericProperty::AlbumArtist,
            TargetProperty::read_only("albumartist", PropertyOwner::Track, ValueKind::Text),
        ),
        (
            GenericProperty::Genre,
            TargetProperty::read_only("genre", PropertyOwner::Track, ValueKind::Text),
        ),
        (
            GenericProperty::Duration,
            TargetProperty::read_only("length", PropertyOwner::Track, ValueKind::Real),
        ),
        (
            GenericProperty::TrackNumber,
            TargetProperty::read_only("track", PropertyOwner::Track, ValueKind::Integer)
                .zero_is_unknown(),
        ),
        (
            GenericProperty::DiscNumber,
            TargetProperty::read_only("disc", PropertyOwner::Track, ValueKind::Integer)
                .zero_is_unknown(),
        ),
        (
            GenericProperty::Year,
            TargetProperty::read_only("year", PropertyOwner::Track, ValueKind::Integer)
                .zero_is_unknown(),
        ),
        (
            GenericProperty::BitRate,
            TargetProperty::read_only("bitrate", PropertyOwner::Track, ValueKind::Integer)
                .zero_is_unknown(),
        ),
        (
            GenericProperty::PlayCount,
            TargetProperty::read_only("playcount", PropertyOwner::Track, ValueKind::Text),
        ),
        (
            GenericProperty::PlayInfoText,
            TargetProperty::read_only("playinfo", PropertyOwner::Track, ValueKind::Text),
        ),
        (
            GenericProperty::FormattedSpamText,
            TargetProperty::read_only("spam", PropertyOwner::Track, ValueKind::Text),
        ),
        (
            GenericProperty::SourceUrl,
            TargetProperty::read_only("url", PropertyOwner::Track, ValueKind::Text),
        ),
        (
            GenericProperty::WindowName,
            TargetProperty::read_write("name", PropertyOwner::Window, ValueKind::Text),
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
    elements: &[(GenericElement::Windows, TargetElement::of_application("window"))],
    structural: &[StructuralSupport {
        kind: ObjectKind::Window,
        operations: &[StructuralOperation::Exists, StructuralOperation::Close],
    }],
    current_track: Some("current entry"),
};

pub fn target() -> Target {
    Target::new(ID, NAME, SCHEMA)
}
