//! Effects reported to the rendering layer.

use config::Gesture;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, trace};

use crate::{ElementId, Error, Result, VisualState};

/// Side effects the engine asks the rendering layer to perform.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum Effect {
    /// Hover/press indicator changed.
    Visual {
        /// The element whose indicator changed.
        element: ElementId,
        /// Its new state.
        state: VisualState,
    },
    /// Clear the hover/press indicator before running an action.
    ResetVisual {
        /// The element about to run an action.
        element: ElementId,
    },
    /// Vibrate for a fired gesture.
    Haptic {
        /// The gesture that fired.
        gesture: Gesture,
    },
    /// Forward an action object to the host action bus unchanged.
    HostAction {
        /// The full action object, `action` tag included.
        action: Value,
    },
    /// Navigate to a dashboard path or URL.
    Navigate {
        /// Destination.
        url: String,
    },
    /// Go back in history.
    NavigateBack,
    /// Open the notification drawer.
    ShowNotifications,
    /// Open the host quickbar by synthesizing its hotkey.
    Quickbar {
        /// Hotkey of the quickbar mode.
        key: char,
    },
    /// Enter dashboard edit mode.
    OpenEditMode,
    /// Toggle the host side menu.
    ToggleMenu,
    /// Log the user out.
    Logout,
    /// Show the popup overlay of `route`.
    OpenPopup {
        /// Route owning the popup.
        route: usize,
        /// Number of popup items.
        items: usize,
    },
    /// Hide the popup overlay of `route`.
    ClosePopup {
        /// Route owning the popup.
        route: usize,
    },
}

/// Sends effects to the rendering layer.
#[derive(Clone, Debug)]
pub struct EffectSink {
    /// Effect channel to the rendering layer.
    tx: UnboundedSender<Effect>,
}

impl EffectSink {
    /// Create a sink from an effect channel.
    pub fn new(tx: UnboundedSender<Effect>) -> Self {
        Self { tx }
    }

    /// Send one effect.
    pub fn send(&self, effect: Effect) -> Result<()> {
        match &effect {
            Effect::Visual { .. } => trace!(?effect, "effect"),
            _ => debug!(?effect, "effect"),
        }
        self.tx.send(effect).map_err(|_| Error::ChannelClosed)
    }

    /// Send an effect when nothing useful can be done about a closed channel.
    pub(crate) fn emit(&self, effect: Effect) {
        if self.send(effect).is_err() {
            trace!("effect dropped: channel closed");
        }
    }
}
