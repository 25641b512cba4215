//! Dotted-path reads and patches used by configuration editors.
//!
//! Paths look like `routes.0.popup.1.label`: object keys and list indices separated by dots.

use serde_json::{Map, Value};

use crate::{Error, deep_merge};

/// Read the value at `path`.
pub fn get_path<'a>(config: &'a Value, path: &str) -> Option<&'a Value> {
    segments(path).ok()?.into_iter().try_fold(config, |v, seg| match v {
        Value::Array(items) => items.get(seg.parse::<usize>().ok()?),
        Value::Object(map) => map.get(seg),
        _ => None,
    })
}

/// Return a copy of `config` with `value` written at `path`.
///
/// The leaf write is a [`deep_merge`] of `{key: value}` into the parent object, so an object
/// value overlays the existing one and `null` removes the key. List elements are updated in place;
/// an index one past the end appends.
pub fn set_path(config: &Value, path: &str, value: &Value) -> Result<Value, Error> {
    let segs = segments(path)?;
    apply(config, &segs, value, path)
}

/// Return a copy of `config` with the key at `path` removed.
pub fn remove_path(config: &Value, path: &str) -> Result<Value, Error> {
    set_path(config, path, &Value::Null)
}

/// Split and sanity-check a dotted path.
fn segments(path: &str) -> Result<Vec<&str>, Error> {
    if path.is_empty() {
        return Err(Error::validation(path, "empty config path"));
    }
    let segs: Vec<&str> = path.split('.').collect();
    if segs.iter().any(|s| s.is_empty()) {
        return Err(Error::validation(path, "config path has an empty segment"));
    }
    Ok(segs)
}

/// Write `value` at `segs` below `base`.
fn apply(base: &Value, segs: &[&str], value: &Value, path: &str) -> Result<Value, Error> {
    let Some((seg, rest)) = segs.split_first() else {
        return Ok(value.clone());
    };

    if let Value::Array(items) = base {
        let idx: usize = seg.parse().map_err(|_| {
            Error::validation(path, format!("`{seg}` is not a list index"))
        })?;
        if idx > items.len() {
            return Err(Error::validation(
                path,
                format!("index {idx} is out of range for a list of {}", items.len()),
            ));
        }
        let mut items = items.clone();
        if rest.is_empty() && value.is_null() {
            if idx < items.len() {
                items.remove(idx);
            }
            return Ok(Value::Array(items));
        }
        let current = items.get(idx).unwrap_or(&Value::Null);
        let updated = if rest.is_empty() {
            deep_merge(current, Some(value)).into_owned()
        } else {
            apply(current, rest, value, path)?
        };
        if idx == items.len() {
            items.push(updated);
        } else {
            items[idx] = updated;
        }
        return Ok(Value::Array(items));
    }

    let empty = Map::new();
    let obj = base.as_object().unwrap_or(&empty);
    if rest.is_empty() {
        let mut patch = Map::new();
        patch.insert((*seg).to_string(), value.clone());
        let base = Value::Object(obj.clone());
        return Ok(deep_merge(&base, Some(&Value::Object(patch))).into_owned());
    }

    let child = obj.get(*seg).unwrap_or(&Value::Null);
    let updated = apply(child, rest, value, path)?;
    let mut out = obj.clone();
    out.insert((*seg).to_string(), updated);
    Ok(Value::Object(out))
}
