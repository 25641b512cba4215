//! Action configs attached to routes and popup items.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The gesture an action is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gesture {
    Tap,
    Hold,
    DoubleTap,
}

impl Gesture {
    /// Config key holding the action for this gesture.
    pub fn config_key(self) -> &'static str {
        match self {
            Self::Tap => "tap_action",
            Self::Hold => "hold_action",
            Self::DoubleTap => "double_tap_action",
        }
    }

    /// All gestures, in config key order.
    pub const ALL: [Self; 3] = [Self::Tap, Self::Hold, Self::DoubleTap];
}

impl fmt::Display for Gesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Tap => "tap",
            Self::Hold => "hold",
            Self::DoubleTap => "double_tap",
        };
        f.write_str(s)
    }
}

/// Which list the quickbar opens with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuickbarMode {
    Commands,
    Devices,
    #[default]
    Entities,
}

impl QuickbarMode {
    /// Keyboard shortcut the host binds to this quickbar mode.
    pub fn hotkey(self) -> char {
        match self {
            Self::Commands => 'c',
            Self::Devices => 'd',
            Self::Entities => 'e',
        }
    }

    /// Parse a config value (`commands`, `devices`, `entities`).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "commands" => Some(Self::Commands),
            "devices" => Some(Self::Devices),
            "entities" => Some(Self::Entities),
            _ => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Commands => "commands",
            Self::Devices => "devices",
            Self::Entities => "entities",
        }
    }
}

/// A host-native action (`navigate`, `call-service`, `more-info`, ...).
///
/// The navbar never interprets these; the whole object is forwarded to the host action bus.
#[derive(Debug, Clone, PartialEq)]
pub struct HostAction {
    /// The `action` tag.
    pub action: String,
    /// Every other field of the action object.
    pub fields: Map<String, Value>,
}

impl HostAction {
    /// The full action object as the host expects it.
    pub fn to_value(&self) -> Value {
        let mut obj = self.fields.clone();
        obj.insert("action".into(), Value::String(self.action.clone()));
        Value::Object(obj)
    }
}

/// An action config, discriminated by its `action` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum ActionConfig {
    /// Open the popup listing the route's popup items.
    OpenPopup,
    /// Go back in navigation history.
    NavigateBack,
    /// Open the notification drawer.
    ShowNotifications,
    /// Open the host quickbar in the given mode.
    Quickbar { mode: QuickbarMode },
    /// Switch the dashboard into edit mode.
    OpenEditMode,
    /// Toggle the host side menu.
    ToggleMenu,
    /// Log the current user out.
    Logout,
    /// Run an inline script through the template evaluator.
    CustomJs { code: String },
    /// Anything else is forwarded to the host untouched.
    Host(HostAction),
}

impl ActionConfig {
    /// The `action` tag of this config.
    pub fn tag(&self) -> &str {
        match self {
            Self::OpenPopup => "open-popup",
            Self::NavigateBack => "navigate-back",
            Self::ShowNotifications => "show-notifications",
            Self::Quickbar { .. } => "quickbar",
            Self::OpenEditMode => "open-edit-mode",
            Self::ToggleMenu => "toggle-menu",
            Self::Logout => "logout",
            Self::CustomJs { .. } => "custom-js-action",
            Self::Host(h) => &h.action,
        }
    }

    /// True for actions that open the popup overlay.
    pub fn opens_popup(&self) -> bool {
        matches!(self, Self::OpenPopup)
    }

    /// Parse an action object. Errors describe what is wrong without location.
    pub fn from_value(value: &Value) -> Result<Self, String> {
        let Value::Object(obj) = value else {
            return Err(format!("action must be an object, got {}", kind(value)));
        };
        let Some(tag) = obj.get("action") else {
            return Err("action config is missing the `action` field".to_string());
        };
        let Some(tag) = tag.as_str() else {
            return Err(format!("`action` must be a string, got {}", kind(tag)));
        };
        Ok(match tag {
            "open-popup" => Self::OpenPopup,
            "navigate-back" => Self::NavigateBack,
            "show-notifications" => Self::ShowNotifications,
            "open-edit-mode" => Self::OpenEditMode,
            "toggle-menu" => Self::ToggleMenu,
            "logout" => Self::Logout,
            "quickbar" => {
                let mode = match obj.get("mode") {
                    None | Some(Value::Null) => QuickbarMode::default(),
                    Some(Value::String(s)) => QuickbarMode::parse(s)
                        .ok_or_else(|| format!("unknown quickbar mode: {s}"))?,
                    Some(other) => {
                        return Err(format!("quickbar mode must be a string, got {}", kind(other)));
                    }
                };
                Self::Quickbar { mode }
            }
            "custom-js-action" => match obj.get("code") {
                Some(Value::String(code)) => Self::CustomJs { code: code.clone() },
                _ => return Err("custom-js-action requires a `code` string".to_string()),
            },
            other => {
                let mut fields = obj.clone();
                fields.remove("action");
                Self::Host(HostAction {
                    action: other.to_string(),
                    fields,
                })
            }
        })
    }
}

impl TryFrom<Value> for ActionConfig {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(&value)
    }
}

impl From<ActionConfig> for Value {
    fn from(action: ActionConfig) -> Self {
        let mut obj = Map::new();
        match &action {
            ActionConfig::Host(h) => return h.to_value(),
            ActionConfig::Quickbar { mode } => {
                obj.insert("mode".into(), Value::String(mode.as_str().into()));
            }
            ActionConfig::CustomJs { code } => {
                obj.insert("code".into(), Value::String(code.clone()));
            }
            _ => {}
        }
        obj.insert("action".into(), Value::String(action.tag().into()));
        Value::Object(obj)
    }
}

/// Short JSON type name for error messages.
pub(crate) fn kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}
