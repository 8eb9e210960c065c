//! Values and object specifiers exchanged with a scripting transport.
//!
//! Targets describe their data in terms of the Apple Event object model: an
//! application root, properties hanging off objects, and elements addressed
//! by index, id, or name. Nothing here assumes a particular marshaling format.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// A four-character Apple Event code such as `kPSP`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FourCharCode(pub [u8; 4]);

impl FourCharCode {
    pub const fn new(code: &[u8; 4]) -> Self {
        Self(*code)
    }

    pub const fn from_u32(value: u32) -> Self {
        Self(value.to_be_bytes())
    }

    pub const fn as_u32(self) -> u32 {
        u32::from_be_bytes(self.0)
    }

    /// Parses exactly four bytes; anything else is not a code.
    pub fn parse(text: &str) -> Option<Self> {
        match text.as_bytes() {
            [a, b, c, d] => Some(Self([*a, *b, *c, *d])),
            _ => None,
        }
    }
}

impl fmt::Display for FourCharCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

impl fmt::Debug for FourCharCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{self}'")
    }
}

/// An enumerated value as reported by a target.
///
/// Depending on how the transport marshals results, an enumerator arrives
/// either as its raw code or as the terminology term from the scripting
/// dictionary ("playing", "ask").
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Enumerator {
    Code(FourCharCode),
    Term(String),
}

impl fmt::Display for Enumerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Enumerator::Code(code) => write!(f, "{code:?}"),
            Enumerator::Term(term) => f.write_str(term),
        }
    }
}

/// The shape of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Missing,
    Bool,
    Integer,
    Real,
    Text,
    Enumerator,
    Object,
    File,
    List,
    Record,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Missing => "missing value",
            ValueKind::Bool => "boolean",
            ValueKind::Integer => "integer",
            ValueKind::Real => "real",
            ValueKind::Text => "text",
            ValueKind::Enumerator => "enumerator",
            ValueKind::Object => "object specifier",
            ValueKind::File => "file",
            ValueKind::List => "list",
            ValueKind::Record => "record",
        }
    }

    /// Whether a value may be stored into a property declared with this kind.
    ///
    /// Integers widen to reals; `Missing` is only accepted by `Missing`.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value.kind()) {
            (expected, found) if *expected == found => true,
            (ValueKind::Real, ValueKind::Integer) => true,
            _ => false,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Missing,
    Bool(bool),
    Integer(i64),
    Real(f64),
    Text(String),
    Enumerator(Enumerator),
    Object(ObjectPath),
    File(PathBuf),
    List(Vec<Value>),
    Record(BTreeMap<String, Value>),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Missing => ValueKind::Missing,
            Value::Bool(_) => ValueKind::Bool,
            Value::Integer(_) => ValueKind::Integer,
            Value::Real(_) => ValueKind::Real,
            Value::Text(_) => ValueKind::Text,
            Value::Enumerator(_) => ValueKind::Enumerator,
            Value::Object(_) => ValueKind::Object,
            Value::File(_) => ValueKind::File,
            Value::List(_) => ValueKind::List,
            Value::Record(_) => ValueKind::Record,
        }
    }

    pub fn code(code: &[u8; 4]) -> Self {
        Value::Enumerator(Enumerator::Code(FourCharCode::new(code)))
    }

    pub fn term(term: impl Into<String>) -> Self {
        Value::Enumerator(Enumerator::Term(term.into()))
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// `missing value` or whitespace-only text: the target has nothing to report.
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Missing => true,
            Value::Text(text) => text.trim().is_empty(),
            _ => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Integers, and reals without a fractional part.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(value) => Some(*value),
            Value::Real(value) if value.fract() == 0.0 && value.is_finite() => Some(*value as i64),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(value) => Some(*value as f64),
            Value::Real(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectPath> {
        match self {
            Value::Object(path) => Some(path),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Real(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<Enumerator> for Value {
    fn from(value: Enumerator) -> Self {
        Value::Enumerator(value)
    }
}

impl From<ObjectPath> for Value {
    fn from(value: ObjectPath) -> Self {
        Value::Object(value)
    }
}

/// One step in an object specifier, relative to its container.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Specifier {
    /// `current track`
    Property(String),
    /// `window 2`
    Index { class: String, index: i64 },
    /// `track id 4711`
    Id { class: String, id: i64 },
    /// `playlist "Library"`
    Name { class: String, name: String },
}

impl fmt::Display for Specifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Specifier::Property(name) => f.write_str(name),
            Specifier::Index { class, index } => write!(f, "{class} {index}"),
            Specifier::Id { class, id } => write!(f, "{class} id {id}"),
            Specifier::Name { class, name } => write!(f, "{class} {name:?}"),
        }
    }
}

/// Path from the application root to a remote object, outermost first.
///
/// The empty path is the application itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ObjectPath {
    specifiers: Vec<Specifier>,
}

impl ObjectPath {
    pub fn application() -> Self {
        Self::default()
    }

    pub fn from_specifiers(specifiers: Vec<Specifier>) -> Self {
        Self { specifiers }
    }

    pub fn is_root(&self) -> bool {
        self.specifiers.is_empty()
    }

    pub fn specifiers(&self) -> &[Specifier] {
        &self.specifiers
    }

    pub fn last(&self) -> Option<&Specifier> {
        self.specifiers.last()
    }

    pub fn parent(&self) -> Option<ObjectPath> {
        let (_, rest) = self.specifiers.split_last()?;
        Some(Self::from_specifiers(rest.to_vec()))
    }

    pub fn join(&self, specifier: Specifier) -> Self {
        let mut specifiers = self.specifiers.clone();
        specifiers.push(specifier);
        Self { specifiers }
    }

    pub fn property(&self, name: impl Into<String>) -> Self {
        self.join(Specifier::Property(name.into()))
    }

    pub fn element_index(&self, class: impl Into<String>, index: i64) -> Self {
        self.join(Specifier::Index {
            class: class.into(),
            index,
        })
    }

    pub fn element_id(&self, class: impl Into<String>, id: i64) -> Self {
        self.join(Specifier::Id {
            class: class.into(),
            id,
        })
    }

    pub fn element_named(&self, class: impl Into<String>, name: impl Into<String>) -> Self {
        self.join(Specifier::Name {
            class: class.into(),
            name: name.into(),
        })
    }

    /// Class of the element this path ends in, if it ends in an element.
    pub fn element_class(&self) -> Option<&str> {
        match self.last()? {
            Specifier::Property(_) => None,
            Specifier::Index { class, .. }
            | Specifier::Id { class, .. }
            | Specifier::Name { class, .. } => Some(class),
        }
    }
}

impl fmt::Display for ObjectPath {
    /// Renders innermost first, the way scripting dictionaries read:
    /// `track id 7 of current playlist of application`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for specifier in self.specifiers.iter().rev() {
            write!(f, "{specifier} of ")?;
        }
        f.write_str("application")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_char_code_round_trips_through_u32() {
        let code = FourCharCode::new(b"kPSP");
        assert_eq!(code.as_u32(), 0x6b50_5350);
        assert_eq!(FourCharCode::from_u32(0x6b50_5350), code);
        assert_eq!(code.to_string(), "kPSP");
        assert_eq!(FourCharCode::parse("no  "), Some(FourCharCode::new(b"no  ")));
        assert_eq!(FourCharCode::parse("toolong"), None);
    }

    #[test]
    fn real_accepts_integer_but_not_text() {
        assert!(ValueKind::Real.accepts(&Value::Integer(3)));
        assert!(ValueKind::Real.accepts(&Value::Real(3.5)));
        assert!(!ValueKind::Real.accepts(&Value::from("3.5")));
        assert!(!ValueKind::Integer.accepts(&Value::Real(3.5)));
        assert!(!ValueKind::Text.accepts(&Value::Missing));
    }

    #[test]
    fn blank_values_are_missing_or_empty_text() {
        assert!(Value::Missing.is_blank());
        assert!(Value::from("  ").is_blank());
        assert!(!Value::from("Blue in Green").is_blank());
        assert!(!Value::Integer(0).is_blank());
    }

    #[test]
    fn path_displays_innermost_first() {
        let path = ObjectPath::application()
            .property("current playlist")
            .element_id("track", 7);
        assert_eq!(
            path.to_string(),
            "track id 7 of current playlist of application"
        );
        assert_eq!(path.element_class(), Some("track"));
        assert_eq!(
            path.parent(),
            Some(ObjectPath::application().property("current playlist"))
        );
        assert!(ObjectPath::application().parent().is_none());
    }
}
