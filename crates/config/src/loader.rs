//! Parse and load navbar configuration.

use std::{fs, path::Path};

use serde_json::Value;
use tracing::debug;

use crate::{Error, NavbarConfig, TemplateRegistry, validate};

impl NavbarConfig {
    /// Build a configuration from a raw JSON tree.
    ///
    /// The tree is resolved against `registry` when it names a template, validated, and only
    /// then deserialized.
    pub fn from_value(raw: &Value, registry: &TemplateRegistry) -> Result<Self, Error> {
        let resolved = registry.resolve(raw)?;
        validate(&resolved)?;
        serde_json::from_value(resolved.into_owned())
            .map_err(|e| Error::validation("", e.to_string()))
    }
}

/// Parse a configuration from JSON source text.
pub fn load_from_str(source: &str, registry: &TemplateRegistry) -> Result<NavbarConfig, Error> {
    let raw: Value = serde_json::from_str(source).map_err(|e| Error::from_json(source, &e, None))?;
    NavbarConfig::from_value(&raw, registry)
}

/// Load a configuration from the JSON file at `path`.
pub fn load_from_path(path: &Path, registry: &TemplateRegistry) -> Result<NavbarConfig, Error> {
    let source = fs::read_to_string(path).map_err(|e| Error::Read {
        path: Some(path.to_path_buf()),
        message: e.to_string(),
    })?;
    debug!(path = %path.display(), bytes = source.len(), "loading navbar config");
    load_from_str(&source, registry).map_err(|e| e.with_path(path))
}

/// Load a template registry: a JSON object mapping template names to partial configs.
pub fn load_registry_from_path(path: &Path) -> Result<TemplateRegistry, Error> {
    let source = fs::read_to_string(path).map_err(|e| Error::Read {
        path: Some(path.to_path_buf()),
        message: e.to_string(),
    })?;
    serde_json::from_str(&source).map_err(|e| Error::from_json(&source, &e, Some(path)))
}
