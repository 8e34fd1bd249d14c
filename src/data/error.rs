//! Error types for the aggregation engine.

use std::num::ParseIntError;

use thiserror::Error;

use super::event::Target;

/// A field's raw value could not be converted to the expected numeric type.
///
/// Non-fatal: the field is skipped, every other field of the same event is
/// still applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid value {value:?} for field {field}: {source}")]
pub struct ParseError {
    /// Wire name of the offending field.
    pub field: &'static str,
    /// The raw value as received.
    pub value: String,
    #[source]
    pub source: ParseIntError,
}

impl ParseError {
    pub fn new(field: &'static str, value: &str, source: ParseIntError) -> Self {
        Self {
            field,
            value: value.to_string(),
            source,
        }
    }
}

/// Errors reported by the registry when ingesting an event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpdateError {
    /// A field failed to parse; the rest of the event was applied.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The event's target is not an entity kind the engine tracks.
    #[error("unknown event target: {0}")]
    UnknownTarget(String),

    /// An identity field needed to route the event is absent.
    #[error("{target} event is missing required field {field}")]
    MissingKey {
        target: Target,
        field: &'static str,
    },
}

/// Keeps the first error seen while the remaining fields are still applied.
pub(crate) fn keep_first<T>(first: &mut Option<ParseError>, result: Result<T, ParseError>) {
    if let Err(e) = result {
        first.get_or_insert(e);
    }
}
