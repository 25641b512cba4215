//! Deep merge of partial configuration overlays.

use std::borrow::Cow;

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

/// Merge `patch` over `base` without mutating either.
///
/// Rules, in order:
/// - an array patch replaces the base value wholesale;
/// - two objects merge key by key: a `null` patch value deletes the key, anything else merges
///   recursively, and keys only in `base` survive;
/// - any other present patch wins;
/// - an absent patch returns `base` itself.
///
/// Values are returned borrowed whenever no new structure had to be built.
pub fn deep_merge<'a>(base: &'a Value, patch: Option<&'a Value>) -> Cow<'a, Value> {
    let Some(patch) = patch else {
        return Cow::Borrowed(base);
    };
    match (base, patch) {
        (_, Value::Array(_)) => Cow::Borrowed(patch),
        (Value::Object(b), Value::Object(p)) => {
            let mut out = b.clone();
            for (key, value) in p {
                if value.is_null() {
                    out.remove(key);
                    continue;
                }
                let merged = deep_merge(b.get(key).unwrap_or(&Value::Null), Some(value));
                out.insert(key.clone(), merged.into_owned());
            }
            Cow::Owned(Value::Object(out))
        }
        _ => Cow::Borrowed(patch),
    }
}

/// Owned convenience form of [`deep_merge`].
pub fn merge_values(base: &Value, patch: &Value) -> Value {
    deep_merge(base, Some(patch)).into_owned()
}

/// Merge a JSON `patch` into a typed `base`, round-tripping through its serde form.
pub fn merge_into<T>(base: &T, patch: &Value) -> Result<T, serde_json::Error>
where
    T: Serialize + DeserializeOwned,
{
    let base = serde_json::to_value(base)?;
    serde_json::from_value(merge_values(&base, patch))
}
