//! Typed navbar configuration records.
//!
//! Every field a user may compute from live state is a [`Templatable`]; resolving those is the
//! caller's job (see `navbar-engine`).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use template::Templatable;

use crate::{ActionConfig, Gesture};

/// Default desktop breakpoint in pixels.
pub const DEFAULT_MIN_WIDTH: u32 = 768;

/// Badge shown on a route or popup item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Badge {
    /// Whether the badge is visible.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show: Option<Templatable<bool>>,
    /// Count or short text rendered inside the badge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<Templatable<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Templatable<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_color: Option<Templatable<String>>,
}

/// Fields shared by routes and popup items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NavItem {
    /// Navigation target used for plain taps when no tap action is configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<Templatable<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<Templatable<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_selected: Option<Templatable<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<Templatable<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_selected: Option<Templatable<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<Templatable<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge: Option<Badge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden: Option<Templatable<bool>>,
    /// Overrides the "current path matches url" selection rule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected: Option<Templatable<bool>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tap_action: Option<ActionConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hold_action: Option<ActionConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub double_tap_action: Option<ActionConfig>,
}

impl NavItem {
    /// The action bound to `gesture`, if any.
    pub fn action(&self, gesture: Gesture) -> Option<&ActionConfig> {
        match gesture {
            Gesture::Tap => self.tap_action.as_ref(),
            Gesture::Hold => self.hold_action.as_ref(),
            Gesture::DoubleTap => self.double_tap_action.as_ref(),
        }
    }
}

/// An entry in a route's popup.
pub type PopupItem = NavItem;

/// A top-level navbar button.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Route {
    #[serde(flatten)]
    pub item: NavItem,
    /// Items shown by an `open-popup` action.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popup: Option<Vec<PopupItem>>,
}

impl Route {
    /// Popup items, empty when none are configured.
    pub fn popup_items(&self) -> &[PopupItem] {
        self.popup.as_deref().unwrap_or_default()
    }
}

/// Where the bar docks on desktop layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DesktopPosition {
    Top,
    #[default]
    Bottom,
    Left,
    Right,
}

/// Desktop layout options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesktopOptions {
    pub position: DesktopPosition,
    pub show_labels: Templatable<bool>,
    /// Viewport width at or above which the desktop layout is used.
    pub min_width: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hidden: Option<Templatable<bool>>,
}

impl Default for DesktopOptions {
    fn default() -> Self {
        Self {
            position: DesktopPosition::default(),
            show_labels: Templatable::Literal(false),
            min_width: DEFAULT_MIN_WIDTH,
            hidden: None,
        }
    }
}

/// Mobile layout options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MobileOptions {
    pub show_labels: Templatable<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hidden: Option<Templatable<bool>>,
}

impl Default for MobileOptions {
    fn default() -> Self {
        Self {
            show_labels: Templatable::Literal(false),
            hidden: None,
        }
    }
}

/// Media player strip shown above the bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaPlayerConfig {
    /// Media player entity id.
    pub entity: Templatable<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show: Option<Templatable<bool>>,
    #[serde(default)]
    pub album_cover_background: bool,
}

/// Which interactions trigger haptic feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "HapticSpec")]
pub struct HapticConfig {
    pub url: bool,
    pub tap_action: bool,
    pub hold_action: bool,
    pub double_tap_action: bool,
}

impl HapticConfig {
    /// Whether firing `gesture` (with or without a configured action) should buzz.
    pub fn enabled_for(&self, gesture: Gesture, has_action: bool) -> bool {
        match gesture {
            Gesture::Tap if !has_action => self.url,
            Gesture::Tap => self.tap_action,
            Gesture::Hold => self.hold_action,
            Gesture::DoubleTap => self.double_tap_action,
        }
    }
}

impl Default for HapticConfig {
    fn default() -> Self {
        Self {
            url: false,
            tap_action: false,
            hold_action: true,
            double_tap_action: false,
        }
    }
}

/// Accepts either `haptic: true|false` or a per-interaction object.
#[derive(Deserialize)]
#[serde(untagged)]
enum HapticSpec {
    All(bool),
    Detailed {
        #[serde(default)]
        url: bool,
        #[serde(default)]
        tap_action: bool,
        #[serde(default)]
        hold_action: bool,
        #[serde(default)]
        double_tap_action: bool,
    },
}

impl From<HapticSpec> for HapticConfig {
    fn from(spec: HapticSpec) -> Self {
        match spec {
            HapticSpec::All(on) => Self {
                url: on,
                tap_action: on,
                hold_action: on,
                double_tap_action: on,
            },
            HapticSpec::Detailed {
                url,
                tap_action,
                hold_action,
                double_tap_action,
            } => Self {
                url,
                tap_action,
                hold_action,
                double_tap_action,
            },
        }
    }
}

/// The complete, validated navbar configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NavbarConfig {
    pub routes: Vec<Route>,
    /// Name of the configuration template this config was resolved against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(default)]
    pub desktop: DesktopOptions,
    #[serde(default)]
    pub mobile: MobileOptions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_player: Option<MediaPlayerConfig>,
    #[serde(default)]
    pub haptic: HapticConfig,
}

impl NavbarConfig {
    /// The item addressed by `route` and optional popup `item` index.
    pub fn item(&self, route: usize, item: Option<usize>) -> Option<&NavItem> {
        let r = self.routes.get(route)?;
        match item {
            None => Some(&r.item),
            Some(i) => r.popup_items().get(i),
        }
    }
}
