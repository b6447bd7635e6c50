//! Lenient field access over loosely-typed JSON records.
//!
//! Identifying fields go through [`required_id`] and fail the record when
//! unusable; everything else falls back to a default.

use serde_json::{Map, Value};

use crate::{
    api::EntityKind,
    app_error::{AppError, AppResult},
};

pub type Record = Map<String, Value>;

/// The record array under the kind's collection key. A missing or `null`
/// key is an empty collection.
pub fn collection(document: &Value, kind: EntityKind) -> AppResult<&[Value]> {
    let Some(root) = document.as_object() else {
        return Err(AppError::malformed_document(kind, "document is not a JSON object"));
    };

    match root.get(kind.collection_key()) {
        None | Some(Value::Null) => Ok([].as_slice()),
        Some(Value::Array(records)) => Ok(records.as_slice()),
        Some(_) => Err(AppError::malformed_document(
            kind,
            format!("`{}` is not an array", kind.collection_key()),
        )),
    }
}

pub fn as_record(value: &Value, kind: EntityKind, index: usize) -> AppResult<&Record> {
    value
        .as_object()
        .ok_or_else(|| AppError::malformed(kind, index, "record is not a JSON object"))
}

pub fn required_id(record: &Record, key: &str, kind: EntityKind, index: usize) -> AppResult<i64> {
    record.get(key).and_then(coerce_int).ok_or_else(|| {
        AppError::malformed(kind, index, format!("`{key}` is missing or not an integer"))
    })
}

pub fn int_or_default(record: &Record, key: &str) -> i64 {
    record.get(key).and_then(coerce_int).unwrap_or_default()
}

pub fn float_or_default(record: &Record, key: &str) -> f64 {
    record.get(key).and_then(coerce_float).unwrap_or_default()
}

pub fn text_or_default(record: &Record, key: &str) -> String {
    match record.get(key) {
        Some(Value::String(text)) => text.clone(),
        Some(value @ (Value::Number(_) | Value::Bool(_))) => value.to_string(),
        _ => String::new(),
    }
}

/// Integers, integral floats and integer strings, when they fit an `i64`.
fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn coerce_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}
