//! Key camelization for response records (`block_number` -> `blockNumber`).

use serde_json::{Map, Value};

use crate::transform::{Outcome, RecordTransform, TransformFuture};

/// Transform that camelizes every object key, recursively.
#[derive(Debug, Clone, Copy, Default)]
pub struct CamelizeKeys;

impl RecordTransform for CamelizeKeys {
    fn apply(&self, record: Value) -> TransformFuture<'_> {
        Box::pin(std::future::ready(Ok(Outcome::Record(camelize_keys(record)))))
    }
}

/// Camelize the keys of every object inside `value`, descending into arrays.
///
/// Scalars are returned untouched. When two keys collapse to the same
/// camelized key the later one wins.
pub fn camelize_keys(value: Value) -> Value {
    match value {
        Value::Object(object) => {
            let mut out = Map::with_capacity(object.len());
            for (key, value) in object {
                out.insert(camelize(&key), camelize_keys(value));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(camelize_keys).collect()),
        scalar => scalar,
    }
}

/// Camelize a single key.
///
/// Runs of `-`, `_` and whitespace are removed and the character following
/// them is upper-cased; the first character is lower-cased. Numeric keys are
/// kept as they are.
pub fn camelize(key: &str) -> String {
    if is_numeric(key) {
        return key.to_owned();
    }

    let mut out = String::with_capacity(key.len());
    let mut chars = key.chars().peekable();
    while let Some(ch) = chars.next() {
        if !is_separator(ch) {
            out.push(ch);
            continue;
        }
        while chars.peek().copied().is_some_and(is_separator) {
            chars.next();
        }
        if let Some(next) = chars.next() {
            out.extend(next.to_uppercase());
        }
    }

    let mut chars = out.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn is_separator(ch: char) -> bool {
    ch == '-' || ch == '_' || ch.is_whitespace()
}

fn is_numeric(key: &str) -> bool {
    let trimmed = key.trim();
    trimmed.is_empty() || trimmed.parse::<f64>().is_ok_and(|number| !number.is_nan())
}
