use std::collections::BTreeSet;

use deckscan_core::errors::{ErrorInfo, ScanError};
use serde_json::{Map, Value};

use crate::merge::deep_update_in_place;
use crate::Sample;

/// Separator between the segments of a flat key such as `"block:var1"`.
pub const FLAT_KEY_SEPARATOR: char = ':';

/// Expands a flat key and its value into a nested mapping.
///
/// `expand_flat_key("a:b:c", 1)` yields `{"a": {"b": {"c": 1}}}`.
pub fn expand_flat_key(flat_key: &str, value: Value) -> Result<Value, ScanError> {
    match flat_key.split_once(FLAT_KEY_SEPARATOR) {
        Some((head, rest)) => {
            check_segment(flat_key, head)?;
            let nested = expand_flat_key(rest, value).map_err(|err| match err {
                ScanError::Spec(info) => {
                    ScanError::Spec(info.with_context("flat_key", flat_key.to_string()))
                }
                other => other,
            })?;
            Ok(singleton(head, nested))
        }
        None => {
            check_segment(flat_key, flat_key)?;
            Ok(singleton(flat_key, value))
        }
    }
}

/// Expands every entry of a flat sample and merges the results.
///
/// Keys are applied in sorted order, so no key may be a path prefix of
/// another (`"a"` next to `"a:b"`); such samples are rejected instead of
/// letting one entry silently replace the other.
pub fn expand_flat_sample(sample: &Sample) -> Result<Value, ScanError> {
    check_prefix_clash(sample.keys().map(String::as_str))?;
    let mut result = Value::Object(Map::new());
    for (key, value) in sample {
        deep_update_in_place(&mut result, expand_flat_key(key, value.clone())?);
    }
    Ok(result)
}

/// Checks every segment of `flat_key` without expanding it.
pub(crate) fn check_flat_key(flat_key: &str) -> Result<(), ScanError> {
    flat_key
        .split(FLAT_KEY_SEPARATOR)
        .try_for_each(|segment| check_segment(flat_key, segment))
}

/// Rejects key sets where one key is a path prefix of another.
pub(crate) fn check_prefix_clash<'a>(keys: impl IntoIterator<Item = &'a str>) -> Result<(), ScanError> {
    let keys: BTreeSet<&str> = keys.into_iter().collect();
    for key in &keys {
        let prefix = format!("{key}{FLAT_KEY_SEPARATOR}");
        if let Some(nested) = keys.range(prefix.as_str()..).next().filter(|k| k.starts_with(&prefix)) {
            return Err(ScanError::Spec(
                ErrorInfo::new("flat-key-prefix-clash", "flat key is a prefix of another key")
                    .with_context("flat_key", key.to_string())
                    .with_context("nested_key", nested.to_string()),
            ));
        }
    }
    Ok(())
}

fn singleton(key: &str, value: Value) -> Value {
    let mut map = Map::new();
    map.insert(key.to_string(), value);
    Value::Object(map)
}

fn check_segment(flat_key: &str, segment: &str) -> Result<(), ScanError> {
    if segment.is_empty() {
        return Err(ScanError::Spec(
            ErrorInfo::new("flat-key-empty-segment", "flat key contains an empty segment")
                .with_context("flat_key", flat_key.to_string())
                .with_hint("use non-empty colon separated segments, e.g. `block:name`"),
        ));
    }
    Ok(())
}
