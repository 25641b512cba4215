use serde_json::Value;

/// Opening delimiter of an inline template.
const OPEN: &str = "[[[";
/// Closing delimiter of an inline template.
const CLOSE: &str = "]]]";

/// True when the trimmed `s` starts with `[[[` and ends with `]]]`.
pub fn is_template(s: &str) -> bool {
    let t = s.trim();
    t.len() >= OPEN.len() + CLOSE.len() && t.starts_with(OPEN) && t.ends_with(CLOSE)
}

/// True when `value` is a JSON string holding a template. Non-strings are never templates.
pub fn is_template_value(value: &Value) -> bool {
    value.as_str().is_some_and(is_template)
}

/// Strip the delimiters from a template and trim the remaining body.
///
/// Returns `None` when `s` is not a template.
pub fn clean_template(s: &str) -> Option<String> {
    if !is_template(s) {
        return None;
    }
    let t = s.trim();
    let body = &t[OPEN.len()..t.len() - CLOSE.len()];
    Some(body.trim().to_string())
}

/// Wrap `raw` in template delimiters unless it already is a template. `raw` is not trimmed.
pub fn wrap_template(raw: &str) -> String {
    if is_template(raw) {
        raw.to_string()
    } else {
        format!("{OPEN}{raw}{CLOSE}")
    }
}
