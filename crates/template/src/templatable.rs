//! `Literal | Template` values used by configuration records.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::{clean_template, is_template};

/// A string known to be a template (`[[[ ... ]]]`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TemplateString(String);

impl TemplateString {
    /// The original template text, delimiters included.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The delimiter-stripped, trimmed body.
    pub fn body(&self) -> String {
        clean_template(&self.0).unwrap_or_default()
    }
}

impl TryFrom<String> for TemplateString {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        if is_template(&s) {
            Ok(Self(s))
        } else {
            Err(format!("not a template: {s:?}"))
        }
    }
}

impl From<TemplateString> for String {
    fn from(t: TemplateString) -> Self {
        t.0
    }
}

impl fmt::Display for TemplateString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A configuration value that is either a literal `T` or a template producing a `T`.
///
/// Strings are checked for template delimiters first, so a `Templatable<String>` holding
/// `"[[[ return 1 ]]]"` is always a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Templatable<T> {
    /// A template evaluated against live state.
    Template(TemplateString),
    /// A static value.
    Literal(T),
}

impl<T> Templatable<T> {
    /// True when this value needs evaluation.
    pub fn is_template(&self) -> bool {
        matches!(self, Self::Template(_))
    }

    /// The literal value, if this is not a template.
    pub fn as_literal(&self) -> Option<&T> {
        match self {
            Self::Literal(v) => Some(v),
            Self::Template(_) => None,
        }
    }
}

impl<T> From<T> for Templatable<T> {
    fn from(v: T) -> Self {
        Self::Literal(v)
    }
}

/// Conversion of a template result into the type of the field it feeds.
///
/// Results are not validated structurally. Text fields take any scalar, and flags follow
/// JavaScript truthiness, so a template behaves the same whether it returns `5` or `"5"`.
pub trait FromTemplateValue: Sized {
    /// Convert `value`, or describe what was expected.
    fn from_template_value(value: Value) -> Result<Self, String>;
}

impl FromTemplateValue for String {
    fn from_template_value(value: Value) -> Result<Self, String> {
        match value {
            Value::String(s) => Ok(s),
            Value::Null => Ok(String::new()),
            Value::Bool(b) => Ok(b.to_string()),
            Value::Number(n) => Ok(number_text(&n)),
            Value::Array(_) => Err("expected text, got an array".into()),
            Value::Object(_) => Err("expected text, got an object".into()),
        }
    }
}

impl FromTemplateValue for bool {
    fn from_template_value(value: Value) -> Result<Self, String> {
        Ok(truthy(&value))
    }
}

impl FromTemplateValue for i64 {
    fn from_template_value(value: Value) -> Result<Self, String> {
        match &value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
                .ok_or_else(|| format!("expected an integer, got {n}")),
            Value::String(s) => s
                .trim()
                .parse()
                .map_err(|_| format!("expected an integer, got {s:?}")),
            other => Err(format!("expected an integer, got {other}")),
        }
    }
}

impl FromTemplateValue for Value {
    fn from_template_value(value: Value) -> Result<Self, String> {
        Ok(value)
    }
}

/// JavaScript truthiness: only null, false, zero, NaN and the empty string are false.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Display text for a number; integral floats drop their fraction (`5.0` shows as `5`).
fn number_text(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
        _ => n.to_string(),
    }
}

/// Outcome of narrowing a [`Templatable`] against a context.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved<T> {
    /// The literal, or the template's result converted to `T`.
    Value(T),
    /// The template failed, returned nothing, or returned something the field cannot use;
    /// carries the unevaluated template text.
    Fallback(String),
}

impl<T> Resolved<T> {
    /// The resolved value, discarding the fallback text.
    pub fn value(self) -> Option<T> {
        match self {
            Self::Value(v) => Some(v),
            Self::Fallback(_) => None,
        }
    }

    /// The resolved value or `default` when evaluation fell back.
    pub fn unwrap_or(self, default: T) -> T {
        self.value().unwrap_or(default)
    }

    /// True when evaluation fell back to the template text.
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}

impl Resolved<String> {
    /// Text to display: the value, or the literal template text when evaluation fell back.
    pub fn into_text(self) -> String {
        match self {
            Self::Value(s) | Self::Fallback(s) => s,
        }
    }
}
