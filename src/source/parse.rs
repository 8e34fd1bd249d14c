//! Line tokenizer for the storage subsystem's event stream.
//!
//! Each line has the shape
//!
//! ```text
//! [<timestamp>] <action> <object> key:value key:value ...
//! ```
//!
//! e.g. `2017-02-15T12:57:53.000000-08:00 change peer-device name:r0
//! conn-name:peer volume:0 replication:SyncSource`.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local};
use thiserror::Error;

use crate::data::{Event, Target, Timestamp};

/// What happened to the object a line describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Part of the initial state dump.
    Exists,
    Create,
    Change,
    Destroy,
    /// A helper script was invoked.
    Call,
    /// A helper script returned.
    Response,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Exists => "exists",
            Action::Create => "create",
            Action::Change => "change",
            Action::Destroy => "destroy",
            Action::Call => "call",
            Action::Response => "response",
        }
    }
}

impl FromStr for Action {
    type Err = LineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exists" => Ok(Action::Exists),
            "create" => Ok(Action::Create),
            "change" => Ok(Action::Change),
            "destroy" => Ok(Action::Destroy),
            "call" => Ok(Action::Call),
            "response" => Ok(Action::Response),
            other => Err(LineError::UnknownAction(other.to_string())),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tokenized line: the action and the event it carries.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub action: Action,
    pub event: Event,
}

/// Reasons a line could not be tokenized.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LineError {
    #[error("empty line")]
    Empty,

    #[error("unknown action: {0}")]
    UnknownAction(String),

    #[error("{0} line has no object")]
    MissingObject(Action),

    #[error("malformed field {0:?}, expected key:value")]
    MalformedField(String),

    #[error("invalid timestamp {value:?}: {source}")]
    BadTimestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// Tokenize one line.
///
/// Returns `Ok(None)` for the `exists -` marker that ends the initial state
/// dump. Lines without a leading timestamp are stamped with the local time.
pub fn parse_line(line: &str) -> Result<Option<Record>, LineError> {
    let mut tokens = line.split_whitespace().peekable();

    let first = tokens.peek().copied().ok_or(LineError::Empty)?;
    let timestamp = if first.starts_with(|c: char| c.is_ascii_digit()) {
        tokens.next();
        parse_timestamp(first)?
    } else {
        Local::now().fixed_offset()
    };

    let action: Action = tokens.next().ok_or(LineError::Empty)?.parse()?;
    let object = tokens.next().ok_or(LineError::MissingObject(action))?;
    if action == Action::Exists && object == "-" {
        return Ok(None);
    }

    let mut fields = HashMap::new();
    for token in tokens {
        match token.split_once(':') {
            Some((key, value)) if !key.is_empty() => {
                fields.insert(key.to_string(), value.to_string());
            }
            _ => return Err(LineError::MalformedField(token.to_string())),
        }
    }

    let target = match object.parse::<Target>() {
        Ok(target) => target,
        Err(never) => match never {},
    };

    Ok(Some(Record {
        action,
        event: Event::from_fields(timestamp, target, fields),
    }))
}

fn parse_timestamp(token: &str) -> Result<Timestamp, LineError> {
    DateTime::parse_from_rfc3339(token).map_err(|source| LineError::BadTimestamp {
        value: token.to_string(),
        source,
    })
}
