//! AppleScript source for each proxy request.

use remotune_core::models::TargetId;
use remotune_core::transport::Invocation;
use remotune_core::value::{Enumerator, ObjectPath, Specifier, Value};
use std::time::Duration;

/// Checked before the tell block so a quit target is not relaunched.
const NOT_RUNNING: i32 = -600;

/// Statement used to confirm automation access once connected.
pub const ACCESS_CHECK: &str = "get name";

pub fn quote(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for c in text.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            other => quoted.push(other),
        }
    }
    quoted.push('"');
    quoted
}

fn specifier(specifier: &Specifier) -> String {
    match specifier {
        Specifier::Property(name) => name.clone(),
        Specifier::Index { class, index } => format!("{class} {index}"),
        Specifier::Id { class, id } => format!("{class} id {id}"),
        Specifier::Name { class, name } => format!("{class} {}", quote(name)),
    }
}

/// `track id 7 of current playlist`; `None` for the application itself.
pub fn path(path: &ObjectPath) -> Option<String> {
    if path.is_root() {
        return None;
    }
    let segments: Vec<String> = path.specifiers().iter().rev().map(specifier).collect();
    Some(segments.join(" of "))
}

fn of_path(subject: &str, object: &ObjectPath) -> String {
    match path(object) {
        Some(object) => format!("{subject} of {object}"),
        None => subject.to_owned(),
    }
}

fn record_key(key: &str) -> String {
    let plain = key
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == ' ' || c == '_');
    if plain && !key.is_empty() {
        key.to_owned()
    } else {
        format!("|{key}|")
    }
}

pub fn value(value: &Value) -> String {
    match value {
        Value::Missing => "missing value".to_owned(),
        Value::Bool(flag) => flag.to_string(),
        Value::Integer(number) => number.to_string(),
        Value::Real(number) if number.is_finite() && number.fract() == 0.0 => format!("{number:.1}"),
        Value::Real(number) => number.to_string(),
        Value::Text(text) => quote(text),
        Value::Enumerator(Enumerator::Code(code)) => format!("«constant ****{code}»"),
        Value::Enumerator(Enumerator::Term(term)) => term.clone(),
        Value::Object(object) => path(object).unwrap_or_else(|| "it".to_owned()),
        Value::File(file) => format!("POSIX file {}", quote(&file.to_string_lossy())),
        Value::List(items) => {
            let items: Vec<String> = items.iter().map(self::value).collect();
            format!("{{{}}}", items.join(", "))
        }
        Value::Record(fields) => {
            let fields: Vec<String> = fields
                .iter()
                .map(|(key, field)| format!("{}:{}", record_key(key), self::value(field)))
                .collect();
            format!("{{{}}}", fields.join(", "))
        }
    }
}

pub fn get_property(object: &ObjectPath, property: &str) -> String {
    format!("get {}", of_path(property, object))
}

pub fn set_property(object: &ObjectPath, property: &str, new_value: &Value) -> String {
    format!("set {} to {}", of_path(property, object), value(new_value))
}

/// The object is the direct parameter unless the invocation brings its own,
/// in which case the command is sent to the object.
pub fn invoke(object: &ObjectPath, invocation: &Invocation) -> String {
    let mut labelled = String::new();
    for (label, param) in &invocation.params {
        labelled.push(' ');
        labelled.push_str(label);
        labelled.push(' ');
        labelled.push_str(&value(param));
    }
    let command = &invocation.command;
    let direct = invocation.direct.as_ref().map(value);
    match (path(object), direct) {
        (None, None) => format!("{command}{labelled}"),
        (None, Some(direct)) | (Some(direct), None) => format!("{command} {direct}{labelled}"),
        (Some(object), Some(direct)) => format!("tell {object} to {command} {direct}{labelled}"),
    }
}

pub fn child_ids(object: &ObjectPath, class: &str) -> String {
    format!("get id of every {}", of_path(class, object))
}

pub fn is_running(target: &TargetId) -> String {
    format!("application id {} is running", quote(target.as_str()))
}

/// Whole seconds, rounded up, never zero.
fn timeout_seconds(timeout: Duration) -> u64 {
    let seconds = timeout.as_secs() + u64::from(timeout.subsec_nanos() > 0);
    seconds.max(1)
}

/// Wraps a statement so it runs against `target` only while it is running,
/// bounded by an AppleScript timeout.
pub fn wrap(target: &TargetId, statement: &str, timeout: Duration) -> String {
    let application = quote(target.as_str());
    let seconds = timeout_seconds(timeout);
    format!(
        "if application id {application} is running then\n\
         \twith timeout of {seconds} seconds\n\
         \t\ttell application id {application}\n\
         \t\t\t{statement}\n\
         \t\tend tell\n\
         \tend timeout\n\
         else\n\
         \terror \"target is not running\" number {NOT_RUNNING}\n\
         end if\n"
    )
}
