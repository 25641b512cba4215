//! Error types for configuration loading and validation.

use std::{
    cmp::{max, min},
    fmt::Write as _,
    path::{Path, PathBuf},
};

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Errors produced while loading, parsing, or validating a configuration.
///
/// Any of these aborts applying the configuration as a whole.
pub enum Error {
    #[error("{message}")]
    /// I/O or filesystem read error.
    Read {
        /// Optional path associated with the read error.
        path: Option<PathBuf>,
        /// Human-readable error message.
        message: String,
    },
    #[error("{message}")]
    /// JSON syntax error with a concrete line/column location and excerpt.
    Parse {
        /// Optional path associated with the parse error.
        path: Option<PathBuf>,
        /// 1-based line number.
        line: usize,
        /// 1-based column number.
        col: usize,
        /// Human-readable error message.
        message: String,
        /// Rendered excerpt including a caret at the error location.
        excerpt: String,
    },
    #[error("{field}: {message}")]
    /// Structurally invalid configuration, located by its field path.
    Validation {
        /// Optional file associated with the validation error.
        path: Option<PathBuf>,
        /// Location within the configuration, e.g. `routes[2].tap_action`.
        field: String,
        /// Human-readable error message.
        message: String,
    },
}

impl Error {
    /// Build a validation error for `field`.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            path: None,
            field: field.into(),
            message: message.into(),
        }
    }

    /// Build a parse error from a JSON syntax error in `source`.
    pub fn from_json(source: &str, err: &serde_json::Error, path: Option<&Path>) -> Self {
        if !err.is_syntax() && !err.is_eof() {
            return Self::Validation {
                path: path.map(Path::to_path_buf),
                field: String::new(),
                message: err.to_string(),
            };
        }
        let (line, col) = (err.line().max(1), err.column().max(1));
        Self::Parse {
            path: path.map(Path::to_path_buf),
            line,
            col,
            message: err.to_string(),
            excerpt: excerpt_at(source, line, col),
        }
    }

    /// Attach a file path to this error if it has none.
    pub fn with_path(mut self, file: &Path) -> Self {
        match &mut self {
            Self::Read { path, .. } | Self::Parse { path, .. } | Self::Validation { path, .. } => {
                if path.is_none() {
                    *path = Some(file.to_path_buf());
                }
            }
        }
        self
    }

    /// Render a human-friendly error message including location and an excerpt when available.
    pub fn pretty(&self) -> String {
        match self {
            Self::Read { path, message } => match path {
                Some(p) => format!("Read error at {}: {}", p.display(), message),
                None => format!("Read error: {}", message),
            },
            Self::Parse {
                path,
                line,
                col,
                message,
                excerpt,
            } => match path {
                Some(p) => format!(
                    "Config parse error at {}:{}:{}\n{}\n{}",
                    p.display(),
                    line,
                    col,
                    message,
                    excerpt
                ),
                None => format!(
                    "Config parse error at line {}, column {}\n{}\n{}",
                    line, col, message, excerpt
                ),
            },
            Self::Validation {
                path,
                field,
                message,
            } => match (path, field.is_empty()) {
                (Some(p), false) => format!(
                    "Config validation error in {} at {}\n{}",
                    p.display(),
                    field,
                    message
                ),
                (Some(p), true) => {
                    format!("Config validation error in {}\n{}", p.display(), message)
                }
                (None, false) => format!("Config validation error at {}\n{}", field, message),
                (None, true) => format!("Config validation error\n{}", message),
            },
        }
    }

    /// Access the optional file path attached to this error.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Read { path, .. } | Self::Parse { path, .. } | Self::Validation { path, .. } => {
                path.as_deref()
            }
        }
    }
}

/// Build a small 2–3 line excerpt with a caret at `(line_no, col_no)`.
pub fn excerpt_at(source: &str, line_no: usize, col_no: usize) -> String {
    let lines: Vec<&str> = source.lines().collect();
    let total = lines.len();
    let start = max(1usize, line_no.saturating_sub(2));
    let end = min(total, line_no + 1);

    let mut out = String::new();
    for n in start..=end {
        let text = lines.get(n - 1).copied().unwrap_or("");
        let _ignored = writeln!(out, " {:>4} | {}", n, text);
        if n == line_no {
            let prefix = format!(" {:>4} | ", n);
            let _ignored = writeln!(
                out,
                "{}{}^",
                " ".repeat(prefix.len()),
                " ".repeat(col_no.saturating_sub(1))
            );
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::{Error, excerpt_at};

    #[test]
    fn excerpt_marks_column() {
        let src = "{\n  \"routes\": [\n    oops\n  ]\n}";
        let ex = excerpt_at(src, 3, 5);
        assert!(ex.contains("    3 |     oops"));
        assert!(ex.lines().any(|l| l.trim_end().ends_with('^')));
    }

    #[test]
    fn json_syntax_errors_become_parse_errors() {
        let src = "{\"routes\": [}";
        let err = serde_json::from_str::<serde_json::Value>(src).unwrap_err();
        let err = Error::from_json(src, &err, Some(Path::new("navbar.json")));
        let Error::Parse { line, .. } = &err else {
            panic!("expected parse error, got {err:?}");
        };
        assert_eq!(*line, 1);
        assert!(err.pretty().starts_with("Config parse error at navbar.json:1:"));
    }

    #[test]
    fn validation_pretty_names_field() {
        let err = Error::validation("routes[1]", "route needs an icon or image");
        assert_eq!(
            err.pretty(),
            "Config validation error at routes[1]\nroute needs an icon or image"
        );
        assert_eq!(err.to_string(), "routes[1]: route needs an icon or image");
    }
}
