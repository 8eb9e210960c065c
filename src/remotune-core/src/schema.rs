//! Static capability schemas.
//!
//! A schema is the whole of what the core knows about a target: which generic
//! operations map to which remote commands, which generic properties map to
//! which remote properties (with kind, access, unit, enumeration, and range),
//! which element collections exist, and which structural operations each
//! object kind accepts. Absence of an entry means the target does not support
//! it. Schemas are plain `'static` data and are validated once on registration.

use crate::models::{PlaybackState, RepeatMode, SaveOption, TargetId};
use crate::value::{Enumerator, FourCharCode, Value, ValueKind};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenericOperation {
    Play,
    Pause,
    PlayPause,
    Stop,
    Next,
    Previous,
    /// Restart the current item, or go to the previous one near its start.
    SkipBack,
    Quit,
}

impl GenericOperation {
    pub const ALL: [GenericOperation; 8] = [
        GenericOperation::Play,
        GenericOperation::Pause,
        GenericOperation::PlayPause,
        GenericOperation::Stop,
        GenericOperation::Next,
        GenericOperation::Previous,
        GenericOperation::SkipBack,
        GenericOperation::Quit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GenericOperation::Play => "play",
            GenericOperation::Pause => "pause",
            GenericOperation::PlayPause => "play_pause",
            GenericOperation::Stop => "stop",
            GenericOperation::Next => "next",
            GenericOperation::Previous => "previous",
            GenericOperation::SkipBack => "skip_back",
            GenericOperation::Quit => "quit",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenericProperty {
    PlayerState,
    PlayerPosition,
    SoundVolume,
    RepeatMode,
    Title,
    Artist,
    Album,
    AlbumArtist,
    Genre,
    Duration,
    TrackNumber,
    DiscNumber,
    Year,
    BitRate,
    PlayCount,
    PlayInfoText,
    FormattedSpamText,
    SourceUrl,
    ArtworkUrl,
    WindowName,
    WindowBounds,
    WindowIndex,
}

impl GenericProperty {
    pub const ALL: [GenericProperty; 22] = [
        GenericProperty::PlayerState,
        GenericProperty::PlayerPosition,
        GenericProperty::SoundVolume,
        GenericProperty::RepeatMode,
        GenericProperty::Title,
        GenericProperty::Artist,
        GenericProperty::Album,
        GenericProperty::AlbumArtist,
        GenericProperty::Genre,
        GenericProperty::Duration,
        GenericProperty::TrackNumber,
        GenericProperty::DiscNumber,
        GenericProperty::Year,
        GenericProperty::BitRate,
        GenericProperty::PlayCount,
        GenericProperty::PlayInfoText,
        GenericProperty::FormattedSpamText,
        GenericProperty::SourceUrl,
        GenericProperty::ArtworkUrl,
        GenericProperty::WindowName,
        GenericProperty::WindowBounds,
        GenericProperty::WindowIndex,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GenericProperty::PlayerState => "player_state",
            GenericProperty::PlayerPosition => "player_position",
            GenericProperty::SoundVolume => "sound_volume",
            GenericProperty::RepeatMode => "repeat_mode",
            GenericProperty::Title => "title",
            GenericProperty::Artist => "artist",
            GenericProperty::Album => "album",
            GenericProperty::AlbumArtist => "album_artist",
            GenericProperty::Genre => "genre",
            GenericProperty::Duration => "duration",
            GenericProperty::TrackNumber => "track_number",
            GenericProperty::DiscNumber => "disc_number",
            GenericProperty::Year => "year",
            GenericProperty::BitRate => "bit_rate",
            GenericProperty::PlayCount => "play_count",
            GenericProperty::PlayInfoText => "play_info_text",
            GenericProperty::FormattedSpamText => "formatted_spam_text",
            GenericProperty::SourceUrl => "source_url",
            GenericProperty::ArtworkUrl => "artwork_url",
            GenericProperty::WindowName => "window_name",
            GenericProperty::WindowBounds => "window_bounds",
            GenericProperty::WindowIndex => "window_index",
        }
    }

    /// The object a target property for this generic property must live on.
    pub fn owner(&self) -> PropertyOwner {
        match self {
            GenericProperty::PlayerState
            | GenericProperty::PlayerPosition
            | GenericProperty::SoundVolume
            | GenericProperty::RepeatMode
            | GenericProperty::PlayInfoText
            | GenericProperty::FormattedSpamText
            | GenericProperty::SourceUrl => PropertyOwner::Application,
            GenericProperty::WindowName
            | GenericProperty::WindowBounds
            | GenericProperty::WindowIndex => PropertyOwner::Window,
            _ => PropertyOwner::Track,
        }
    }

    /// Whether this property is one of the now-playing metadata fields.
    pub fn is_now_playing_field(&self) -> bool {
        !matches!(
            self,
            GenericProperty::PlayerState
                | GenericProperty::PlayerPosition
                | GenericProperty::SoundVolume
                | GenericProperty::RepeatMode
                | GenericProperty::WindowName
                | GenericProperty::WindowBounds
                | GenericProperty::WindowIndex
        )
    }

    /// Whether a target may declare this property on either the application
    /// or the track. Stream URLs and display strings live on the application
    /// for some targets and on the track for others.
    fn owner_is_flexible(&self) -> bool {
        matches!(
            self,
            GenericProperty::SourceUrl
                | GenericProperty::PlayInfoText
                | GenericProperty::FormattedSpamText
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenericElement {
    Windows,
    PlaylistEntries,
}

impl GenericElement {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenericElement::Windows => "windows",
            GenericElement::PlaylistEntries => "playlist_entries",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyOwner {
    Application,
    Track,
    Window,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    ReadOnly,
    ReadWrite,
    WriteOnly,
}

impl Access {
    pub fn readable(&self) -> bool {
        !matches!(self, Access::WriteOnly)
    }

    pub fn writable(&self) -> bool {
        !matches!(self, Access::ReadOnly)
    }
}

/// Unit a numeric time value is reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unit {
    Native,
    Milliseconds,
}

impl Unit {
    pub fn to_seconds(&self, value: f64) -> f64 {
        match self {
            Unit::Native => value,
            Unit::Milliseconds => value / 1000.0,
        }
    }

    pub fn from_seconds(&self, seconds: f64) -> f64 {
        match self {
            Unit::Native => seconds,
            Unit::Milliseconds => seconds * 1000.0,
        }
    }
}

/// Accepted numeric values: `min..=max` in multiples of `step` from `min`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl Range {
    pub const fn new(min: f64, max: f64, step: f64) -> Self {
        Self { min, max, step }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn is_on_step(&self, value: f64) -> bool {
        let steps = (value - self.min) / self.step;
        (steps - steps.round()).abs() < 1e-9
    }

    /// Nearest value inside the range that sits on a step.
    pub fn snap(&self, value: f64) -> f64 {
        let clamped = value.clamp(self.min, self.max);
        let snapped = self.min + ((clamped - self.min) / self.step).round() * self.step;
        snapped.min(self.max)
    }
}

/// The core's own vocabulary for enumerated values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Canonical {
    Playback(PlaybackState),
    Repeat(RepeatMode),
    Save(SaveOption),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumEntry {
    pub code: FourCharCode,
    pub term: &'static str,
    pub canonical: Canonical,
}

impl EnumEntry {
    pub const fn new(code: &[u8; 4], term: &'static str, canonical: Canonical) -> Self {
        Self {
            code: FourCharCode::new(code),
            term,
            canonical,
        }
    }
}

/// Bidirectional translation between target codes and canonical values.
///
/// Several target codes may map to one canonical value; the first entry for a
/// canonical value is the one sent back to the target.
#[derive(Debug, PartialEq, Eq)]
pub struct EnumTable {
    pub name: &'static str,
    pub entries: &'static [EnumEntry],
}

impl EnumTable {
    pub fn to_canonical(&self, value: &Value) -> Result<Canonical, SchemaError> {
        let found = match value {
            Value::Enumerator(Enumerator::Code(code)) => {
                self.entries.iter().find(|entry| entry.code == *code)
            }
            Value::Enumerator(Enumerator::Term(term)) | Value::Text(term) => self
                .entries
                .iter()
                .find(|entry| entry.term.eq_ignore_ascii_case(term.trim())),
            Value::Integer(raw) => u32::try_from(*raw)
                .ok()
                .and_then(|raw| self.entries.iter().find(|entry| entry.code.as_u32() == raw)),
            _ => None,
        };
        found
            .map(|entry| entry.canonical)
            .ok_or_else(|| SchemaError::UnknownEnumerator {
                table: self.name,
                value: describe(value),
            })
    }

    pub fn to_target(&self, canonical: Canonical) -> Result<Value, SchemaError> {
        self.entries
            .iter()
            .find(|entry| entry.canonical == canonical)
            .map(|entry| Value::Enumerator(Enumerator::Code(entry.code)))
            .ok_or(SchemaError::UnmappedCanonical {
                table: self.name,
                canonical,
            })
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Enumerator(enumerator) => enumerator.to_string(),
        Value::Text(text) => format!("{text:?}"),
        Value::Integer(raw) => raw.to_string(),
        other => other.kind().to_string(),
    }
}

/// Standard Suite `savo` enumeration.
pub static SAVE_OPTIONS: EnumTable = EnumTable {
    name: "save options",
    entries: &[
        EnumEntry::new(b"yes ", "yes", Canonical::Save(SaveOption::Yes)),
        EnumEntry::new(b"no  ", "no", Canonical::Save(SaveOption::No)),
        EnumEntry::new(b"ask ", "ask", Canonical::Save(SaveOption::Ask)),
    ],
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetProperty {
    pub name: &'static str,
    pub owner: PropertyOwner,
    pub kind: ValueKind,
    pub access: Access,
    pub unit: Unit,
    pub enumeration: Option<&'static EnumTable>,
    pub range: Option<Range>,
    /// The target reports `0` when it does not know the value.
    pub zero_is_unknown: bool,
}

impl TargetProperty {
    pub const fn read_only(name: &'static str, owner: PropertyOwner, kind: ValueKind) -> Self {
        Self {
            name,
            owner,
            kind,
            access: Access::ReadOnly,
            unit: Unit::Native,
            enumeration: None,
            range: None,
            zero_is_unknown: false,
        }
    }

    pub const fn read_write(name: &'static str, owner: PropertyOwner, kind: ValueKind) -> Self {
        Self {
            access: Access::ReadWrite,
            ..Self::read_only(name, owner, kind)
        }
    }

    pub const fn with_access(self, access: Access) -> Self {
        Self { access, ..self }
    }

    pub const fn in_milliseconds(self) -> Self {
        Self {
            unit: Unit::Milliseconds,
            ..self
        }
    }

    pub const fn with_enum(self, table: &'static EnumTable) -> Self {
        Self {
            enumeration: Some(table),
            ..self
        }
    }

    pub const fn with_range(self, min: f64, max: f64, step: f64) -> Self {
        Self {
            range: Some(Range::new(min, max, step)),
            ..self
        }
    }

    pub const fn zero_is_unknown(self) -> Self {
        Self {
            zero_is_unknown: true,
            ..self
        }
    }

    pub fn decode_enum(&self, value: &Value) -> Result<Canonical, SchemaError> {
        let table = self.enumeration.ok_or(SchemaError::MissingEnumeration {
            property: self.name,
        })?;
        table.to_canonical(value)
    }

    pub fn encode_enum(&self, canonical: Canonical) -> Result<Value, SchemaError> {
        let table = self.enumeration.ok_or(SchemaError::MissingEnumeration {
            property: self.name,
        })?;
        table.to_target(canonical)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ValueKind,
    pub required: bool,
}

impl ParamSpec {
    pub const fn optional(name: &'static str, kind: ValueKind) -> Self {
        Self {
            name,
            kind,
            required: false,
        }
    }

    /// Integers are accepted where a real is declared.
    pub fn accepts(&self, value: &Value) -> bool {
        let found = value.kind();
        found == self.kind || (self.kind == ValueKind::Real && found == ValueKind::Integer)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetOperation {
    pub command: &'static str,
    /// Labelled parameters the command accepts.
    pub params: &'static [ParamSpec],
}

impl TargetOperation {
    pub const fn new(command: &'static str) -> Self {
        Self {
            command,
            params: &[],
        }
    }

    pub const fn with_params(self, params: &'static [ParamSpec]) -> Self {
        Self { params, ..self }
    }

    pub fn param(&self, name: &str) -> Option<&'static ParamSpec> {
        self.params.iter().find(|param| param.name == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetElement {
    pub class: &'static str,
    /// Application property the elements hang off; `None` for direct
    /// elements of the application.
    pub container: Option<&'static str>,
}

impl TargetElement {
    pub const fn of_application(class: &'static str) -> Self {
        Self {
            class,
            container: None,
        }
    }

    pub const fn within(class: &'static str, container: &'static str) -> Self {
        Self {
            class,
            container: Some(container),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Application,
    Window,
    PlaylistEntry,
}

impl ObjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Application => "application",
            ObjectKind::Window => "window",
            ObjectKind::PlaylistEntry => "playlist entry",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StructuralOperation {
    Exists,
    Close,
    Delete,
    Duplicate,
    Move,
}

impl StructuralOperation {
    pub fn command(&self) -> &'static str {
        match self {
            StructuralOperation::Exists => "exists",
            StructuralOperation::Close => "close",
            StructuralOperation::Delete => "delete",
            StructuralOperation::Duplicate => "duplicate",
            StructuralOperation::Move => "move",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StructuralSupport {
    pub kind: ObjectKind,
    pub operations: &'static [StructuralOperation],
}

#[derive(Debug, Clone, Copy)]
pub struct CapabilitySchema {
    pub operations: &'static [(GenericOperation, TargetOperation)],
    pub properties: &'static [(GenericProperty, TargetProperty)],
    pub elements: &'static [(GenericElement, TargetElement)],
    pub structural: &'static [StructuralSupport],
    /// Application property that refers to the item being played.
    pub current_track: Option<&'static str>,
}

impl CapabilitySchema {
    pub const EMPTY: CapabilitySchema = CapabilitySchema {
        operations: &[],
        properties: &[],
        elements: &[],
        structural: &[],
        current_track: None,
    };

    pub fn lookup_operation(&self, operation: GenericOperation) -> Option<&'static TargetOperation> {
        self.operations
            .iter()
            .find(|(generic, _)| *generic == operation)
            .map(|(_, target)| target)
    }

    pub fn lookup_property(&self, property: GenericProperty) -> Option<&'static TargetProperty> {
        self.properties
            .iter()
            .find(|(generic, _)| *generic == property)
            .map(|(_, target)| target)
    }

    pub fn lookup_element(&self, element: GenericElement) -> Option<&'static TargetElement> {
        self.elements
            .iter()
            .find(|(generic, _)| *generic == element)
            .map(|(_, target)| target)
    }

    pub fn supports_structural(&self, kind: ObjectKind, operation: StructuralOperation) -> bool {
        self.structural
            .iter()
            .any(|support| support.kind == kind && support.operations.contains(&operation))
    }

    /// Translates a value reported by the target into the core vocabulary.
    pub fn enum_from_target(
        &self,
        property: GenericProperty,
        value: &Value,
    ) -> Result<Canonical, SchemaError> {
        self.lookup_property(property)
            .ok_or(SchemaError::MissingEnumeration {
                property: property.as_str(),
            })?
            .decode_enum(value)
    }

    pub fn enum_to_target(
        &self,
        property: GenericProperty,
        canonical: Canonical,
    ) -> Result<Value, SchemaError> {
        self.lookup_property(property)
            .ok_or(SchemaError::MissingEnumeration {
                property: property.as_str(),
            })?
            .encode_enum(canonical)
    }

    pub fn validate(&self) -> Result<(), SchemaError> {
        for (index, (operation, target)) in self.operations.iter().enumerate() {
            if self.operations[..index].iter().any(|(seen, _)| seen == operation) {
                return Err(SchemaError::DuplicateEntry {
                    entry: operation.as_str(),
                });
            }
            if target.command.trim().is_empty() {
                return Err(SchemaError::InvalidEntry {
                    entry: operation.as_str(),
                    reason: "empty command name",
                });
            }
            if target.params.iter().any(|param| param.required) {
                return Err(SchemaError::InvalidEntry {
                    entry: operation.as_str(),
                    reason: "generic operations cannot supply required parameters",
                });
            }
        }

        for (index, (property, target)) in self.properties.iter().enumerate() {
            if self.properties[..index].iter().any(|(seen, _)| seen == property) {
                return Err(SchemaError::DuplicateEntry {
                    entry: property.as_str(),
                });
            }
            validate_property(*property, target)?;
            let needs_container = match target.owner {
                PropertyOwner::Application => None,
                PropertyOwner::Track => (self.current_track.is_none()
                    && self.lookup_element(GenericElement::PlaylistEntries).is_none())
                .then_some("track property without current track or playlist entries"),
                PropertyOwner::Window => self
                    .lookup_element(GenericElement::Windows)
                    .is_none()
                    .then_some("window property without a windows element"),
            };
            if let Some(reason) = needs_container {
                return Err(SchemaError::InvalidEntry {
                    entry: property.as_str(),
                    reason,
                });
            }
        }

        for (index, (element, target)) in self.elements.iter().enumerate() {
            if self.elements[..index].iter().any(|(seen, _)| seen == element) {
                return Err(SchemaError::DuplicateEntry {
                    entry: element.as_str(),
                });
            }
            if target.class.trim().is_empty() {
                return Err(SchemaError::InvalidEntry {
                    entry: element.as_str(),
                    reason: "empty element class",
                });
            }
        }

        for (index, support) in self.structural.iter().enumerate() {
            if self.structural[..index]
                .iter()
                .any(|seen| seen.kind == support.kind)
            {
                return Err(SchemaError::DuplicateEntry {
                    entry: support.kind.as_str(),
                });
            }
        }

        Ok(())
    }
}

fn validate_property(property: GenericProperty, target: &TargetProperty) -> Result<(), SchemaError> {
    let entry = property.as_str();
    if target.name.trim().is_empty() {
        return Err(SchemaError::InvalidEntry {
            entry,
            reason: "empty property name",
        });
    }
    let owner_ok = target.owner == property.owner()
        || (property.owner_is_flexible() && target.owner != PropertyOwner::Window);
    if !owner_ok {
        return Err(SchemaError::InvalidEntry {
            entry,
            reason: "property declared on the wrong object",
        });
    }

    if let Some(table) = target.enumeration {
        if table.entries.is_empty() {
            return Err(SchemaError::EmptyEnumeration { table: table.name });
        }
        let expected: fn(&Canonical) -> bool = match property {
            GenericProperty::PlayerState => {
                |canonical: &Canonical| matches!(canonical, Canonical::Playback(_))
            }
            GenericProperty::RepeatMode => {
                |canonical: &Canonical| matches!(canonical, Canonical::Repeat(_))
            }
            _ => |_: &Canonical| true,
        };
        if !table.entries.iter().all(|entry| expected(&entry.canonical)) {
            return Err(SchemaError::InvalidEntry {
                entry,
                reason: "enumeration maps to the wrong vocabulary",
            });
        }
    } else if target.kind == ValueKind::Enumerator {
        return Err(SchemaError::MissingEnumeration { property: entry });
    }

    if let Some(range) = target.range {
        let numeric = matches!(target.kind, ValueKind::Integer | ValueKind::Real);
        if !numeric || range.min > range.max || range.step <= 0.0 {
            return Err(SchemaError::InvalidRange { property: entry });
        }
    }

    match property {
        GenericProperty::PlayerState if target.kind != ValueKind::Enumerator => {
            Err(SchemaError::InvalidEntry {
                entry,
                reason: "player state must be an enumerator",
            })
        }
        GenericProperty::RepeatMode
            if !matches!(target.kind, ValueKind::Enumerator | ValueKind::Bool) =>
        {
            Err(SchemaError::InvalidEntry {
                entry,
                reason: "repeat mode must be an enumerator or a boolean",
            })
        }
        _ => Ok(()),
    }
}

/// A registered scripting target.
#[derive(Debug, Clone)]
pub struct Target {
    pub id: TargetId,
    pub name: String,
    pub schema: CapabilitySchema,
}

impl Target {
    pub fn new(id: impl Into<TargetId>, name: impl Into<String>, schema: CapabilitySchema) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            schema,
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SchemaError {
    #[error("{table}: target reported unknown enumerator {value}")]
    UnknownEnumerator { table: &'static str, value: String },
    #[error("{table}: no target value for {canonical:?}")]
    UnmappedCanonical {
        table: &'static str,
        canonical: Canonical,
    },
    #[error("property {property} returned {found}, expected {expected}")]
    UnexpectedValue {
        property: &'static str,
        expected: ValueKind,
        found: ValueKind,
    },
    #[error("property {property} returned {value}, outside its declared range")]
    OutOfRange { property: &'static str, value: f64 },
    #[error("property {property} has no enumeration table")]
    MissingEnumeration { property: &'static str },
    #[error("duplicate schema entry for {entry}")]
    DuplicateEntry { entry: &'static str },
    #[error("invalid range on {property}")]
    InvalidRange { property: &'static str },
    #[error("enumeration {table} has no entries")]
    EmptyEnumeration { table: &'static str },
    #[error("invalid schema entry {entry}: {reason}")]
    InvalidEntry {
        entry: &'static str,
        reason: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATES: EnumTable = EnumTable {
        name: "player state",
        entries: &[
            EnumEntry::new(b"kPSS", "stopped", Canonical::Playback(PlaybackState::Stopped)),
            EnumEntry::new(b"kPSP", "playing", Canonical::Playback(PlaybackState::Playing)),
            EnumEntry::new(b"kPSF", "fast forwarding", Canonical::Playback(PlaybackState::Playing)),
            EnumEntry::new(b"kPSp", "paused", Canonical::Playback(PlaybackState::Paused)),
        ],
    };

    const EMPTY_TABLE: EnumTable = EnumTable {
        name: "nothing",
        entries: &[],
    };

    const STATE: TargetProperty =
        TargetProperty::read_only("player state", PropertyOwner::Application, ValueKind::Enumerator)
            .with_enum(&STATES);

    static SCHEMA: CapabilitySchema = CapabilitySchema {
        operations: &[
            (GenericOperation::Play, TargetOperation::new("play")),
            (GenericOperation::Stop, TargetOperation::new("stop")),
        ],
        properties: &[
            (GenericProperty::PlayerState, STATE),
            (
                GenericProperty::SoundVolume,
                TargetProperty::read_write("sound volume", PropertyOwner::Application, ValueKind::Integer)
                    .with_range(0.0, 100.0, 5.0),
            ),
        ],
        elements: &[],
        structural: &[StructuralSupport {
            kind: ObjectKind::Window,
            operations: &[StructuralOperation::Close],
        }],
        current_track: None,
    };

    #[test]
    fn lookups_return_declared_entries_only() {
        assert_eq!(
            SCHEMA.lookup_operation(GenericOperation::Play).map(|op| op.command),
            Some("play")
        );
        assert!(SCHEMA.lookup_operation(GenericOperation::SkipBack).is_none());
        assert!(SCHEMA.lookup_property(GenericProperty::AlbumArtist).is_none());
        assert!(SCHEMA.lookup_element(GenericElement::Windows).is_none());
        assert!(SCHEMA.supports_structural(ObjectKind::Window, StructuralOperation::Close));
        assert!(!SCHEMA.supports_structural(ObjectKind::Window, StructuralOperation::Delete));
        assert!(SCHEMA.validate().is_ok());
    }

    #[test]
    fn lookup_finds_exactly_the_declared_vocabulary() {
        for operation in GenericOperation::ALL {
            let declared = matches!(operation, GenericOperation::Play | GenericOperation::Stop);
            assert_eq!(SCHEMA.lookup_operation(operation).is_some(), declared, "{operation:?}");
        }
        assert_eq!(SCHEMA.lookup_operation(GenericOperation::Stop).map(|op| op.command), Some("stop"));

        for property in GenericProperty::ALL {
            let declared = matches!(property, GenericProperty::PlayerState | GenericProperty::SoundVolume);
            assert_eq!(SCHEMA.lookup_property(property).is_some(), declared, "{property:?}");
        }
        assert_eq!(
            SCHEMA.lookup_property(GenericProperty::SoundVolume).map(|p| p.name),
            Some("sound volume")
        );
        assert!(SCHEMA.lookup_element(GenericElement::Windows).is_none());
    }

    #[test]
    fn now_playing_fields_exclude_transport_and_window_properties() {
        let fields: Vec<_> = GenericProperty::ALL
            .into_iter()
            .filter(GenericProperty::is_now_playing_field)
            .collect();
        assert_eq!(fields.first(), Some(&GenericProperty::Title));
        assert_eq!(fields.last(), Some(&GenericProperty::ArtworkUrl));
        assert_eq!(fields.len(), 15);
        assert!(!GenericProperty::SoundVolume.is_now_playing_field());
        assert!(!GenericProperty::WindowName.is_now_playing_field());
    }

    #[test]
    fn enum_translation_accepts_codes_terms_and_raw_integers() {
        let playing = Canonical::Playback(PlaybackState::Playing);
        assert_eq!(
            SCHEMA.enum_from_target(GenericProperty::PlayerState, &Value::code(b"kPSP")),
            Ok(playing)
        );
        assert_eq!(
            SCHEMA.enum_from_target(GenericProperty::PlayerState, &Value::term("Playing")),
            Ok(playing)
        );
        assert_eq!(
            SCHEMA.enum_from_target(GenericProperty::PlayerState, &Value::Integer(0x6b50_5346)),
            Ok(playing)
        );
        assert_eq!(
            SCHEMA.enum_to_target(GenericProperty::PlayerState, playing),
            Ok(Value::code(b"kPSP"))
        );
    }

    #[test]
    fn unknown_code_is_a_schema_error() {
        let result = SCHEMA.enum_from_target(GenericProperty::PlayerState, &Value::code(b"kPSX"));
        assert!(matches!(result, Err(SchemaError::UnknownEnumerator { .. })));
        let result = SCHEMA.enum_to_target(
            GenericProperty::PlayerState,
            Canonical::Repeat(RepeatMode::All),
        );
        assert!(matches!(result, Err(SchemaError::UnmappedCanonical { .. })));
    }

    #[test]
    fn save_options_use_standard_codes() {
        assert_eq!(
            SAVE_OPTIONS.to_target(Canonical::Save(SaveOption::No)),
            Ok(Value::code(b"no  "))
        );
        assert_eq!(
            SAVE_OPTIONS.to_target(Canonical::Save(SaveOption::Ask)),
            Ok(Value::code(b"ask "))
        );
    }

    #[test]
    fn validation_rejects_malformed_entries() {
        static DUPLICATE: CapabilitySchema = CapabilitySchema {
            operations: &[
                (GenericOperation::Play, TargetOperation::new("play")),
                (GenericOperation::Play, TargetOperation::new("playpause")),
            ],
            ..CapabilitySchema::EMPTY
        };
        assert!(matches!(
            DUPLICATE.validate(),
            Err(SchemaError::DuplicateEntry { entry: "play" })
        ));

        static NO_TABLE: CapabilitySchema = CapabilitySchema {
            properties: &[(
                GenericProperty::PlayerState,
                TargetProperty::read_only("player state", PropertyOwner::Application, ValueKind::Enumerator),
            )],
            ..CapabilitySchema::EMPTY
        };
        assert!(matches!(
            NO_TABLE.validate(),
            Err(SchemaError::MissingEnumeration { .. })
        ));

        static EMPTY_ENUM: CapabilitySchema = CapabilitySchema {
            properties: &[(GenericProperty::PlayerState, STATE.with_enum(&EMPTY_TABLE))],
            ..CapabilitySchema::EMPTY
        };
        assert!(matches!(
            EMPTY_ENUM.validate(),
            Err(SchemaError::EmptyEnumeration { .. })
        ));

        static TEXT_RANGE: CapabilitySchema = CapabilitySchema {
            properties: &[(
                GenericProperty::PlayInfoText,
                TargetProperty::read_only("stream title", PropertyOwner::Application, ValueKind::Text)
                    .with_range(0.0, 1.0, 1.0),
            )],
            ..CapabilitySchema::EMPTY
        };
        assert!(matches!(
            TEXT_RANGE.validate(),
            Err(SchemaError::InvalidRange { .. })
        ));

        static ORPHAN_TRACK: CapabilitySchema = CapabilitySchema {
            properties: &[(
                GenericProperty::Title,
                TargetProperty::read_only("name", PropertyOwner::Track, ValueKind::Text),
            )],
            ..CapabilitySchema::EMPTY
        };
        assert!(matches!(
            ORPHAN_TRACK.validate(),
            Err(SchemaError::InvalidEntry { .. })
        ));
    }

    #[test]
    fn range_checks_bounds_and_steps() {
        let range = Range::new(0.0, 100.0, 5.0);
        assert!(range.contains(100.0));
        assert!(!range.contains(101.0));
        assert!(range.is_on_step(45.0));
        assert!(!range.is_on_step(42.0));
        assert_eq!(range.snap(42.0), 40.0);
        assert_eq!(range.snap(150.0), 100.0);
    }
}
