//! Field rules for JSON request bodies.
//!
//! Each rule is checked in order (presence, type, minimum length, maximum
//! length, character set) and only the first violation is reported, so a
//! body with two bad fields always yields exactly two errors. Lengths are
//! counted in UTF-16 code units to stay consistent with the browser clients
//! that produce these bodies.

use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// Constraints on a single string field.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    /// JSON key of the field.
    pub name: &'static str,
    pub min_len: usize,
    pub max_len: usize,
    /// When set, the value must consist of `[A-Za-z0-9_-]` and this is the
    /// message reported when it does not.
    pub name_charset: Option<&'static str>,
}

pub const PARTICIPANT_NAME: FieldRule = FieldRule {
    name: "participantName",
    min_len: 1,
    max_len: 50,
    name_charset: Some("Invalid participant name format"),
};

pub const ROOM_NAME: FieldRule = FieldRule {
    name: "roomName",
    min_len: 1,
    max_len: 100,
    name_charset: Some("Invalid room name format"),
};

pub const STATUS: FieldRule = FieldRule {
    name: "status",
    min_len: 1,
    max_len: 50,
    name_charset: None,
};

/// A single field violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// All violations found in one request body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid input: {}", .errors.len())]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    /// Renders the violations as `"<field>: <message>"` strings.
    pub fn details(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl FieldRule {
    /// Checks a raw string against this rule.
    pub fn check(&self, value: &str) -> Result<(), FieldError> {
        let len = value.encode_utf16().count();
        let message = if len < self.min_len {
            format!(
                "String must contain at least {} character(s)",
                self.min_len
            )
        } else if len > self.max_len {
            format!("String must contain at most {} character(s)", self.max_len)
        } else if let Some(msg) = self.name_charset.filter(|_| !value.chars().all(is_name_char)) {
            msg.to_string()
        } else {
            return Ok(());
        };

        Err(FieldError {
            field: self.name,
            message,
        })
    }

    fn check_value(&self, value: Option<&Value>) -> Result<String, FieldError> {
        match value {
            None => Err(FieldError {
                field: self.name,
                message: "Required".to_string(),
            }),
            Some(Value::String(s)) => self.check(s).map(|()| s.clone()),
            Some(other) => Err(FieldError {
                field: self.name,
                message: format!("Expected string, received {}", json_type_name(other)),
            }),
        }
    }
}

/// Collects field violations while extracting values from a JSON object.
///
/// ```
/// use handoff_types::validation::{Validator, ROOM_NAME, STATUS};
///
/// let body = serde_json::json!({ "roomName": "room-1", "status": "PENDING" });
/// let mut v = Validator::new(&body).unwrap();
/// let room = v.string(&ROOM_NAME);
/// let status = v.string(&STATUS);
/// v.finish().unwrap();
/// assert_eq!((room.as_str(), status.as_str()), ("room-1", "PENDING"));
/// ```
#[derive(Debug)]
pub struct Validator<'a> {
    body: &'a Map<String, Value>,
    errors: Vec<FieldError>,
}

impl<'a> Validator<'a> {
    /// Starts validating `body`, which must be a JSON object.
    pub fn new(body: &'a Value) -> Result<Self, ValidationErrors> {
        match body {
            Value::Object(map) => Ok(Self {
                body: map,
                errors: Vec::new(),
            }),
            other => Err(ValidationErrors {
                errors: vec![FieldError {
                    field: "body",
                    message: format!("Expected object, received {}", json_type_name(other)),
                }],
            }),
        }
    }

    /// Extracts a string field. On violation the error is recorded and an
    /// empty string is returned; callers must not use the value unless
    /// [`Validator::finish`] succeeds.
    pub fn string(&mut self, rule: &FieldRule) -> String {
        match rule.check_value(self.body.get(rule.name)) {
            Ok(value) => value,
            Err(e) => {
                self.errors.push(e);
                String::new()
            }
        }
    }

    /// Records an extra violation found by the caller.
    pub fn reject(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn finish(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors {
                errors: self.errors,
            })
        }
    }
}
