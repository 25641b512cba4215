//! Runs the action bound to a fired gesture.

use config::{ActionConfig, Gesture, HapticConfig, NavItem, PopupItem};
use serde_json::Value;
use template::{TemplateContext, TemplateEvaluator, wrap_template};
use tracing::{debug, error, warn};

use crate::{Effect, EffectSink, ElementId, Error, PopupController, Result};

/// Everything needed to run one fired gesture.
pub struct ActionRequest<'a> {
    /// The element the gesture fired on.
    pub element: ElementId,
    /// Which gesture fired.
    pub gesture: Gesture,
    /// The route or popup item the gesture fired on.
    pub item: &'a NavItem,
    /// Popup items of the route; empty for popup items themselves.
    pub popup_items: &'a [PopupItem],
    /// Haptic policy of the active config.
    pub haptic: HapticConfig,
    /// Template inputs for `url` and custom scripts.
    pub context: &'a TemplateContext,
}

/// Interprets navbar actions and forwards host actions.
#[derive(Clone)]
pub struct ActionExecutor {
    evaluator: TemplateEvaluator,
    popup: PopupController,
    sink: EffectSink,
}

impl ActionExecutor {
    /// Create an executor that opens popups through `popup` and reports to `sink`.
    pub fn new(evaluator: TemplateEvaluator, popup: PopupController, sink: EffectSink) -> Self {
        Self {
            evaluator,
            popup,
            sink,
        }
    }

    /// Run the action of `req`.
    ///
    /// Missing resources are logged and reported without any effect being emitted.
    pub fn execute(&self, req: &ActionRequest<'_>) -> Result<()> {
        let action = req.item.action(req.gesture);
        if let Err(e) = check_resources(req, action) {
            error!(element = %req.element, gesture = %req.gesture, error = %e, "action skipped");
            return Err(e);
        }

        self.sink.send(Effect::ResetVisual {
            element: req.element,
        })?;
        if req.haptic.enabled_for(req.gesture, action.is_some()) {
            self.sink.send(Effect::Haptic {
                gesture: req.gesture,
            })?;
        }
        if !action.is_some_and(ActionConfig::opens_popup) {
            self.popup.close();
        }

        let Some(action) = action else {
            return self.navigate_to_url(req);
        };
        debug!(element = %req.element, gesture = %req.gesture, action = action.tag(), "executing action");
        let effect = match action {
            ActionConfig::Host(host) => Effect::HostAction {
                action: host.to_value(),
            },
            ActionConfig::OpenPopup => {
                self.popup.open(req.element.route, req.popup_items.len());
                return Ok(());
            }
            ActionConfig::NavigateBack => Effect::NavigateBack,
            ActionConfig::ShowNotifications => Effect::ShowNotifications,
            ActionConfig::Quickbar { mode } => Effect::Quickbar { key: mode.hotkey() },
            ActionConfig::OpenEditMode => Effect::OpenEditMode,
            ActionConfig::ToggleMenu => Effect::ToggleMenu,
            ActionConfig::Logout => Effect::Logout,
            ActionConfig::CustomJs { code } => {
                let script = Value::String(wrap_template(code));
                let out = self.evaluator.evaluate(req.context, &script);
                debug!(element = %req.element, result = %out, "custom script ran");
                return Ok(());
            }
        };
        self.sink.send(effect)
    }

    /// Plain taps on items without a tap action follow the item's `url`.
    fn navigate_to_url(&self, req: &ActionRequest<'_>) -> Result<()> {
        if req.gesture != Gesture::Tap {
            debug!(element = %req.element, gesture = %req.gesture, "no action configured");
            return Ok(());
        }
        let Some(url) = req.item.url.as_ref() else {
            debug!(element = %req.element, "tap without action or url");
            return Ok(());
        };
        match self
            .evaluator
            .resolve(req.context, url)
            .value()
            .filter(|u| !u.is_empty())
        {
            Some(url) => self.sink.send(Effect::Navigate { url }),
            None => {
                warn!(element = %req.element, "url template did not resolve; not navigating");
                Ok(())
            }
        }
    }
}

/// Check that everything `action` needs is configured.
fn check_resources(req: &ActionRequest<'_>, action: Option<&ActionConfig>) -> Result<()> {
    match action {
        Some(ActionConfig::OpenPopup) if req.popup_items.is_empty() => Err(Error::MissingResource {
            element: req.element,
            action: "open-popup".into(),
            what: "at least one popup item",
        }),
        _ => Ok(()),
    }
}
