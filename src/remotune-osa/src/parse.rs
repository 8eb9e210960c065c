//! Reader for the source-form results printed by `osascript -s s`.

use remotune_core::value::{Enumerator, FourCharCode, ObjectPath, Specifier, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unexpected end of output")]
    UnexpectedEnd,
    #[error("unexpected {found:?} at offset {offset}")]
    Unexpected { found: char, offset: usize },
    #[error("unterminated string")]
    UnterminatedString,
    #[error("trailing output at offset {0}")]
    Trailing(usize),
}

/// Parses one script result. Commands without a result print nothing,
/// which reads as `missing value`.
pub fn parse_result(output: &str) -> Result<Value, ParseError> {
    let input = output.trim();
    if input.is_empty() {
        return Ok(Value::Missing);
    }
    let mut parser = Parser { input, pos: 0 };
    let value = parser.value()?;
    parser.skip_ws();
    if parser.pos < input.len() {
        return Err(ParseError::Trailing(parser.pos));
    }
    Ok(value)
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    fn expect(&mut self, want: char) -> Result<(), ParseError> {
        match self.bump() {
            Some(c) if c == want => Ok(()),
            Some(found) => Err(ParseError::Unexpected {
                found,
                offset: self.pos - found.len_utf8(),
            }),
            None => Err(ParseError::UnexpectedEnd),
        }
    }

    fn at_value_end(&self) -> bool {
        matches!(self.peek(), None | Some(',') | Some('}'))
    }

    fn value(&mut self) -> Result<Value, ParseError> {
        self.skip_ws();
        let start = self.pos;
        let value = match self.peek() {
            None => return Err(ParseError::UnexpectedEnd),
            Some(found @ (',' | '}')) => {
                return Err(ParseError::Unexpected {
                    found,
                    offset: self.pos,
                })
            }
            Some('{') => self.collection()?,
            Some('"') => Value::Text(self.string()?),
            Some('«') => self.chevron()?,
            Some(c) if c == '-' || c.is_ascii_digit() => self.number()?,
            Some(_) => return self.words(),
        };
        // `«class cTrk» id 5 of ...` and friends continue past the first token.
        self.skip_ws();
        if self.at_value_end() {
            Ok(value)
        } else {
            self.pos = start;
            self.words()
        }
    }

    fn collection(&mut self) -> Result<Value, ParseError> {
        self.expect('{')?;
        self.skip_ws();
        if self.peek() == Some('}') {
            self.bump();
            return Ok(Value::List(Vec::new()));
        }
        if self.at_record_key() {
            return self.record();
        }
        let mut items = Vec::new();
        loop {
            items.push(self.value()?);
            self.skip_ws();
            match self.bump() {
                Some(',') => continue,
                Some('}') => return Ok(Value::List(items)),
                Some(found) => {
                    return Err(ParseError::Unexpected {
                        found,
                        offset: self.pos - found.len_utf8(),
                    })
                }
                None => return Err(ParseError::UnexpectedEnd),
            }
        }
    }

    fn at_record_key(&self) -> bool {
        let rest = &self.input[self.pos..];
        if rest.starts_with('|') {
            return true;
        }
        rest.chars()
            .find(|c| matches!(c, ',' | '{' | '}' | '"' | '«' | ':'))
            .is_some_and(|c| c == ':')
    }

    fn record(&mut self) -> Result<Value, ParseError> {
        let mut fields = BTreeMap::new();
        loop {
            self.skip_ws();
            let key = self.key()?;
            self.expect(':')?;
            let value = self.value()?;
            fields.insert(key, value);
            self.skip_ws();
            match self.bump() {
                Some(',') => continue,
                Some('}') => return Ok(Value::Record(fields)),
                Some(found) => {
                    return Err(ParseError::Unexpected {
                        found,
                        offset: self.pos - found.len_utf8(),
                    })
                }
                None => return Err(ParseError::UnexpectedEnd),
            }
        }
    }

    fn key(&mut self) -> Result<String, ParseError> {
        if self.peek() == Some('|') {
            self.bump();
            let start = self.pos;
            loop {
                match self.bump() {
                    Some('|') => return Ok(self.input[start..self.pos - 1].to_owned()),
                    Some(_) => {}
                    None => return Err(ParseError::UnexpectedEnd),
                }
            }
        }
        let start = self.pos;
        while let Some(c) = self.peek() {
            if matches!(c, ':' | ',' | '{' | '}') {
                break;
            }
            self.bump();
        }
        Ok(self.input[start..self.pos].trim().to_owned())
    }

    fn string(&mut self) -> Result<String, ParseError> {
        self.expect('"')?;
        let mut text = String::new();
        loop {
            match self.bump() {
                Some('"') => return Ok(text),
                Some('\\') => match self.bump() {
                    Some('n') => text.push('\n'),
                    Some('r') => text.push('\r'),
                    Some('t') => text.push('\t'),
                    Some(other) => text.push(other),
                    None => return Err(ParseError::UnterminatedString),
                },
                Some(c) => text.push(c),
                None => return Err(ParseError::UnterminatedString),
            }
        }
    }

    fn chevron(&mut self) -> Result<Value, ParseError> {
        self.expect('«')?;
        let start = self.pos;
        loop {
            match self.bump() {
                Some('»') => break,
                Some(_) => {}
                None => return Err(ParseError::UnexpectedEnd),
            }
        }
        let inner = &self.input[start..self.pos - '»'.len_utf8()];
        let code = inner
            .strip_prefix("constant ")
            .map(|raw| raw.trim_start_matches("****"))
            .and_then(FourCharCode::parse);
        Ok(match code {
            Some(code) => Value::Enumerator(Enumerator::Code(code)),
            None => Value::term(format!("«{inner}»")),
        })
    }

    fn number(&mut self) -> Result<Value, ParseError> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E'))
        {
            self.bump();
        }
        let text = &self.input[start..self.pos];
        if let Ok(integer) = text.parse::<i64>() {
            return Ok(Value::Integer(integer));
        }
        match text.parse::<f64>() {
            Ok(real) => Ok(Value::Real(real)),
            Err(_) => {
                // Not a number after all, e.g. a term that starts with a digit.
                self.pos = start;
                self.words()
            }
        }
    }

    /// A run of bare words up to the next top-level `,` or `}`.
    fn words(&mut self) -> Result<Value, ParseError> {
        let start = self.pos;
        let mut in_string = false;
        let mut escaped = false;
        let mut in_chevron = false;
        let mut depth = 0usize;
        while let Some(c) = self.peek() {
            if in_string {
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == '"' {
                    in_string = false;
                }
            } else if in_chevron {
                in_chevron = c != '»';
            } else {
                match c {
                    '"' => in_string = true,
                    '«' => in_chevron = true,
                    '{' => depth += 1,
                    '}' | ',' if depth == 0 => break,
                    '}' => depth -= 1,
                    _ => {}
                }
            }
            self.bump();
        }
        if in_string {
            return Err(ParseError::UnterminatedString);
        }
        Ok(interpret_words(self.input[start..self.pos].trim()))
    }
}

fn interpret_words(text: &str) -> Value {
    match text {
        "missing value" => return Value::Missing,
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    if text.starts_with("application ") || text.contains(" of application ") {
        return Value::Object(parse_specifier(text));
    }
    let quoted = |prefix: &str| {
        text.strip_prefix(prefix)
            .filter(|rest| rest.starts_with('"'))
            .map(unquote)
    };
    if let Some(path) = quoted("POSIX file ") {
        return Value::File(PathBuf::from(path));
    }
    if let Some(path) = quoted("file ").or_else(|| quoted("alias ")) {
        return Value::File(hfs_to_posix(&path));
    }
    if let Some(date) = quoted("date ") {
        return Value::Text(date);
    }
    Value::term(text)
}

/// `track id 7 of playlist "Library" of application "Music"`, innermost first.
fn parse_specifier(text: &str) -> ObjectPath {
    let specifiers = split_outside_quotes(text, " of ")
        .into_iter()
        .filter(|segment| !segment.starts_with("application"))
        .rev()
        .map(parse_segment)
        .collect();
    ObjectPath::from_specifiers(specifiers)
}

fn parse_segment(segment: &str) -> Specifier {
    if segment.ends_with('"') {
        if let Some((class, quoted)) = segment.split_once(" \"") {
            return Specifier::Name {
                class: class.to_owned(),
                name: unquote(&format!("\"{quoted}")),
            };
        }
    }
    if let Some((head, last)) = segment.rsplit_once(' ') {
        if let Ok(number) = last.parse::<i64>() {
            return match head.strip_suffix(" id") {
                Some(class) => Specifier::Id {
                    class: class.to_owned(),
                    id: number,
                },
                None => Specifier::Index {
                    class: head.to_owned(),
                    index: number,
                },
            };
        }
    }
    Specifier::Property(segment.to_owned())
}

fn split_outside_quotes<'t>(text: &'t str, separator: &str) -> Vec<&'t str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, c) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        if c == '"' {
            in_string = true;
        } else if offset >= start && text[offset..].starts_with(separator) {
            parts.push(&text[start..offset]);
            start = offset + separator.len();
        }
    }
    parts.push(&text[start..]);
    parts
}

fn unquote(text: &str) -> String {
    let mut parser = Parser {
        input: text.trim(),
        pos: 0,
    };
    parser.string().unwrap_or_else(|_| text.trim().to_owned())
}

/// `Macintosh HD:Users:me:a.mp3` becomes `/Users/me/a.mp3`.
fn hfs_to_posix(hfs: &str) -> PathBuf {
    let rest = hfs.split_once(':').map_or(hfs, |(_, rest)| rest);
    PathBuf::from(format!("/{}", rest.replace(':', "/")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scalars() {
        assert_eq!(parse_result("missing value\n"), Ok(Value::Missing));
        assert_eq!(parse_result(""), Ok(Value::Missing));
        assert_eq!(parse_result("true"), Ok(Value::Bool(true)));
        assert_eq!(parse_result("42"), Ok(Value::Integer(42)));
        assert_eq!(parse_result("-3"), Ok(Value::Integer(-3)));
        assert_eq!(parse_result("12.5"), Ok(Value::Real(12.5)));
        assert_eq!(parse_result("1.0E+4"), Ok(Value::Real(10_000.0)));
        assert_eq!(
            parse_result(r#""He said \"hi\"\nbye""#),
            Ok(Value::Text("He said \"hi\"\nbye".into()))
        );
    }

    #[test]
    fn parses_enumerators() {
        assert_eq!(parse_result("playing"), Ok(Value::term("playing")));
        assert_eq!(
            parse_result("«constant ****kPSP»"),
            Ok(Value::code(b"kPSP"))
        );
        assert_eq!(parse_result("«constant ****no  »"), Ok(Value::code(b"no  ")));
    }

    #[test]
    fn parses_lists_and_records() {
        assert_eq!(
            parse_result("{0, 0, 800, 600}"),
            Ok(Value::List(vec![
                Value::Integer(0),
                Value::Integer(0),
                Value::Integer(800),
                Value::Integer(600),
            ]))
        );
        let Ok(Value::Record(fields)) =
            parse_result(r#"{name:"Song", sound volume:50, player state:paused, |odd key|:{}}"#)
        else {
            panic!("expected a record");
        };
        assert_eq!(fields["name"], Value::Text("Song".into()));
        assert_eq!(fields["sound volume"], Value::Integer(50));
        assert_eq!(fields["player state"], Value::term("paused"));
        assert_eq!(fields["odd key"], Value::List(Vec::new()));
    }

    #[test]
    fn parses_object_specifiers() {
        assert_eq!(
            parse_result(r#"file track id 7 of user playlist id 3 of source id 64 of application "Music""#),
            Ok(Value::Object(
                ObjectPath::application()
                    .element_id("source", 64)
                    .element_id("user playlist", 3)
                    .element_id("file track", 7)
            ))
        );
        assert_eq!(
            parse_result(r#"{window 1 of application "Jukebox", playlist "Top \"25\"" of application "Jukebox"}"#),
            Ok(Value::List(vec![
                Value::Object(ObjectPath::application().element_index("window", 1)),
                Value::Object(ObjectPath::application().element_named("playlist", "Top \"25\"")),
            ]))
        );
        assert_eq!(
            parse_result(r#"current track of application "Jukebox""#),
            Ok(Value::Object(ObjectPath::application().property("current track")))
        );
        assert_eq!(
            parse_result(r#"application "Jukebox""#),
            Ok(Value::Object(ObjectPath::application()))
        );
    }

    #[test]
    fn parses_files_and_dates() {
        assert_eq!(
            parse_result(r#"file "Macintosh HD:Users:me:song.mp3""#),
            Ok(Value::File(PathBuf::from("/Users/me/song.mp3")))
        );
        assert_eq!(
            parse_result(r#"date "Sunday, 18 October 2026 at 10:00:00""#),
            Ok(Value::Text("Sunday, 18 October 2026 at 10:00:00".into()))
        );
    }

    #[test]
    fn reports_malformed_output() {
        assert_eq!(parse_result(r#""open"#), Err(ParseError::UnterminatedString));
        assert_eq!(parse_result("{1, 2"), Err(ParseError::UnexpectedEnd));
        assert!(matches!(
            parse_result("{1, , 2}"),
            Err(ParseError::Unexpected { found: ',', .. })
        ));
        assert!(matches!(
            parse_result("{name:}"),
            Err(ParseError::Unexpected { found: '}', .. })
        ));
    }
}
