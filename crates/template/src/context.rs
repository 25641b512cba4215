//! Host state snapshots handed to template bodies.

use std::collections::BTreeMap;

use rhai::{Dynamic, serde::to_dynamic};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// State record of a single entity, as published by the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    /// Current state string (`"on"`, `"21.5"`, `"unavailable"`).
    pub state: String,
    /// Entity attributes.
    #[serde(default)]
    pub attributes: Map<String, Value>,
    /// Any other fields (`last_changed`, `context`, ...), passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EntityState {
    /// Build a state record with no attributes.
    pub fn new(state: impl Into<String>) -> Self {
        Self {
            state: state.into(),
            ..Self::default()
        }
    }
}

/// Descriptor of the logged-in user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// User id.
    #[serde(default)]
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Administrator flag.
    #[serde(default)]
    pub is_admin: bool,
    /// Owner flag.
    #[serde(default)]
    pub is_owner: bool,
    /// Any other fields, passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The host application context (`hass`).
///
/// Only `states` and `user` are interpreted; every other field is passed to templates as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostContext {
    /// Entity states by entity id.
    #[serde(default)]
    pub states: BTreeMap<String, EntityState>,
    /// The logged-in user, if any.
    #[serde(default)]
    pub user: Option<User>,
    /// Every other field of the host context.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The read-only navbar projection visible to templates as `navbar`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavbarState {
    /// Whether the desktop layout is active.
    #[serde(rename = "isDesktop")]
    pub is_desktop: bool,
}

/// Pre-converted template inputs for one host snapshot.
///
/// Build one per state update and reuse it for every field evaluated against that snapshot.
#[derive(Debug, Clone)]
pub struct TemplateContext {
    pub(crate) states: Dynamic,
    pub(crate) user: Dynamic,
    pub(crate) hass: Dynamic,
    pub(crate) navbar: Dynamic,
}

impl TemplateContext {
    /// Snapshot `host` and `navbar` into interpreter values.
    pub fn new(host: &HostContext, navbar: NavbarState) -> Self {
        Self {
            states: shared(&host.states, "states"),
            user: host
                .user
                .as_ref()
                .map_or(Dynamic::UNIT, |u| shared(u, "user")),
            hass: shared(host, "hass"),
            navbar: shared(&navbar, "navbar"),
        }
    }

    /// An empty context: no entities, no user, mobile layout.
    pub fn empty() -> Self {
        Self::new(&HostContext::default(), NavbarState::default())
    }
}

impl Default for TemplateContext {
    fn default() -> Self {
        Self::empty()
    }
}

/// Convert `value` into a shared interpreter value so per-call clones stay cheap.
fn shared<T: Serialize + ?Sized>(value: &T, name: &str) -> Dynamic {
    match to_dynamic(value) {
        Ok(d) => d.into_shared(),
        Err(e) => {
            warn!(input = name, error = %e, "template input could not be converted");
            Dynamic::UNIT
        }
    }
}
