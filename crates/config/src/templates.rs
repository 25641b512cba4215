//! Named configuration templates shared across dashboards.

use std::{borrow::Cow, collections::BTreeMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::{Error, deep_merge};

/// Registry of named base configurations.
///
/// A config that sets `template: <name>` is resolved as `deep_merge(registry[name], config)`,
/// so it inherits every key of the template and overrides or nulls out what it names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateRegistry {
    templates: BTreeMap<String, Value>,
}

impl TemplateRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace the template `name`.
    pub fn insert(&mut self, name: impl Into<String>, template: Value) -> Option<Value> {
        self.templates.insert(name.into(), template)
    }

    /// Look up a template by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.templates.get(name)
    }

    /// Registered template names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    /// Resolve `config` against the template it names, if any.
    ///
    /// Configs without a `template` key are returned as-is.
    pub fn resolve<'a>(&'a self, config: &'a Value) -> Result<Cow<'a, Value>, Error> {
        let name = match config.get("template") {
            None | Some(Value::Null) => return Ok(Cow::Borrowed(config)),
            Some(Value::String(name)) => name,
            Some(_) => {
                return Err(Error::validation(
                    "template",
                    "`template` must be the name of a configuration template",
                ));
            }
        };
        let Some(base) = self.templates.get(name) else {
            return Err(Error::validation(
                "template",
                format!("unknown configuration template: {name}"),
            ));
        };
        debug!(template = %name, "resolving config against template");
        Ok(deep_merge(base, Some(config)))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::TemplateRegistry;
    use crate::Error;

    fn registry() -> TemplateRegistry {
        let mut reg = TemplateRegistry::new();
        reg.insert(
            "main",
            json!({
                "routes": [{"url": "/home", "icon": "mdi:home"}],
                "desktop": {"position": "left", "show_labels": true},
                "haptic": true
            }),
        );
        reg
    }

    #[test]
    fn config_without_template_is_borrowed() {
        let reg = registry();
        let cfg = json!({"routes": []});
        assert!(matches!(reg.resolve(&cfg).unwrap(), std::borrow::Cow::Borrowed(_)));
    }

    #[test]
    fn overrides_merge_over_template() {
        let reg = registry();
        let cfg = json!({"template": "main", "desktop": {"position": "top"}, "haptic": null});
        let out = reg.resolve(&cfg).unwrap().into_owned();
        assert_eq!(
            out,
            json!({
                "template": "main",
                "routes": [{"url": "/home", "icon": "mdi:home"}],
                "desktop": {"position": "top", "show_labels": true}
            })
        );
    }

    #[test]
    fn routes_replace_template_routes() {
        let reg = registry();
        let cfg = json!({"template": "main", "routes": [{"url": "/energy", "icon": "mdi:flash"}]});
        let out = reg.resolve(&cfg).unwrap();
        assert_eq!(out["routes"], json!([{"url": "/energy", "icon": "mdi:flash"}]));
    }

    #[test]
    fn unknown_template_is_a_validation_error() {
        let reg = registry();
        let err = reg.resolve(&json!({"template": "nope"})).unwrap_err();
        assert!(matches!(err, Error::Validation { ref field, .. } if field == "template"));
        assert!(err.to_string().contains("nope"));
    }
}
