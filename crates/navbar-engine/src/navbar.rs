//! The navbar component core: owns the configuration, host snapshot and interaction machinery.

use std::sync::{Arc, Weak};

use config::{
    DesktopPosition, Gesture, NavItem, NavbarConfig, PopupItem, TemplateRegistry,
};
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;
use template::{
    HostContext, NavbarState, Resolved, Templatable, TemplateContext, TemplateEvaluator,
};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info};

use crate::{
    ActionDispatcher, ActionExecutor, ActionRequest, ActionTarget, Effect, EffectSink, ElementId,
    Error, GestureTiming, PointerEvent, PopupController, Result, WindowListeners,
};

/// Construction options for [`Navbar`].
#[derive(Debug, Clone, Default)]
pub struct NavbarOptions {
    /// Gesture timing for the dispatcher.
    pub timing: GestureTiming,
    /// Named configuration templates available to `template:`.
    pub registry: TemplateRegistry,
}

/// A route or popup item with every templatable field evaluated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedItem {
    /// Where the item lives in the config.
    pub element: ElementId,
    /// Resolved `url`, when it resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// `icon_selected` when selected and configured, else `icon`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// `image_selected` when selected and configured, else `image`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Label text; a failed template shows its own text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// The badge, when visible.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<ResolvedBadge>,
    /// Whether the item matches the current path (or its `selected` template).
    pub selected: bool,
}

/// A visible badge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedBadge {
    /// Badge count as the template returned it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<Value>,
    /// Badge colour.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Badge text colour.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
}

/// A visible route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedRoute {
    /// The route itself.
    #[serde(flatten)]
    pub item: ResolvedItem,
    /// Number of popup items configured (hidden ones included).
    pub popup_items: usize,
}

/// Layout decisions for the current viewport.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedLayout {
    /// Whether the desktop layout is active.
    pub is_desktop: bool,
    /// Dock position; desktop only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<DesktopPosition>,
    /// Whether labels are shown.
    pub show_labels: bool,
    /// Whether the whole navbar is hidden.
    pub hidden: bool,
    /// The media player, when configured and resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_player: Option<ResolvedMediaPlayer>,
}

/// A visible media player strip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedMediaPlayer {
    /// Media player entity id.
    pub entity: String,
    /// Whether the album cover fills the background.
    pub album_cover_background: bool,
}

/// Host inputs and the template context derived from them.
struct HostSnapshot {
    host: HostContext,
    navbar: NavbarState,
    path: Option<String>,
    context: Arc<TemplateContext>,
}

impl HostSnapshot {
    /// Re-derive the template context after an input changed.
    fn rebuild(&mut self) {
        self.context = Arc::new(TemplateContext::new(&self.host, self.navbar));
    }
}

/// Shared navbar state.
struct Inner {
    registry: TemplateRegistry,
    evaluator: TemplateEvaluator,
    dispatcher: ActionDispatcher,
    popup: PopupController,
    listeners: WindowListeners,
    executor: ActionExecutor,
    config: RwLock<Option<Arc<NavbarConfig>>>,
    host: RwLock<HostSnapshot>,
}

/// The navbar core.
///
/// Effects for the rendering layer are sent on the channel given to [`Navbar::new`]. Pointer
/// handlers start timers, so the navbar must be driven from within a tokio runtime.
#[derive(Clone)]
pub struct Navbar {
    inner: Arc<Inner>,
}

impl Navbar {
    /// Create an unconfigured navbar sending effects to `tx`.
    pub fn new(
        evaluator: TemplateEvaluator,
        options: NavbarOptions,
        effects: UnboundedSender<Effect>,
    ) -> Self {
        let sink = EffectSink::new(effects);
        let listeners = WindowListeners::new();
        let dispatcher = ActionDispatcher::new(options.timing, sink.clone());
        let popup = PopupController::new(listeners.clone(), dispatcher.clone(), sink.clone());
        let executor = ActionExecutor::new(evaluator.clone(), popup.clone(), sink);
        let host = HostContext::default();
        let navbar = NavbarState::default();
        let context = Arc::new(TemplateContext::new(&host, navbar));
        Self {
            inner: Arc::new(Inner {
                registry: options.registry,
                evaluator,
                dispatcher,
                popup,
                listeners,
                executor,
                config: RwLock::new(None),
                host: RwLock::new(HostSnapshot {
                    host,
                    navbar,
                    path: None,
                    context,
                }),
            }),
        }
    }

    /// The shared template evaluator.
    pub fn evaluator(&self) -> &TemplateEvaluator {
        &self.inner.evaluator
    }

    /// The gesture dispatcher.
    pub fn dispatcher(&self) -> &ActionDispatcher {
        &self.inner.dispatcher
    }

    /// The popup controller.
    pub fn popup(&self) -> &PopupController {
        &self.inner.popup
    }

    /// Window-level key listeners.
    pub fn listeners(&self) -> &WindowListeners {
        &self.inner.listeners
    }

    /// The active configuration.
    pub fn config(&self) -> Result<Arc<NavbarConfig>> {
        self.inner.config.read().clone().ok_or(Error::NotConfigured)
    }

    /// Validate and install a raw configuration.
    ///
    /// On error the previous configuration stays active. On success any open popup is closed and
    /// every gesture session is dropped.
    pub fn apply_config(&self, raw: &Value) -> Result<()> {
        let config = NavbarConfig::from_value(raw, &self.inner.registry)?;
        self.install(config);
        Ok(())
    }

    /// Install an already validated configuration.
    pub fn install(&self, config: NavbarConfig) {
        self.inner.popup.close();
        self.inner.dispatcher.detach_all();
        info!(routes = config.routes.len(), template = ?config.template, "navbar config applied");
        *self.inner.config.write() = Some(Arc::new(config));
    }

    /// Replace the host snapshot templates are evaluated against.
    pub fn set_host_context(&self, host: HostContext) {
        let mut snap = self.inner.host.write();
        snap.host = host;
        snap.rebuild();
    }

    /// Set the current dashboard path, used to select routes.
    pub fn set_current_path(&self, path: Option<String>) {
        self.inner.host.write().path = path;
    }

    /// Switch between the desktop and mobile layouts.
    pub fn set_desktop(&self, is_desktop: bool) {
        let mut snap = self.inner.host.write();
        if snap.navbar.is_desktop != is_desktop {
            snap.navbar.is_desktop = is_desktop;
            snap.rebuild();
        }
    }

    /// Switch layouts from a viewport width using the configured desktop breakpoint.
    pub fn set_viewport_width(&self, width: u32) -> Result<()> {
        let min_width = self.config()?.desktop.min_width;
        self.set_desktop(width >= min_width);
        Ok(())
    }

    /// Template inputs for the current host snapshot.
    pub fn context(&self) -> Arc<TemplateContext> {
        self.inner.host.read().context.clone()
    }

    fn current_path(&self) -> Option<String> {
        self.inner.host.read().path.clone()
    }

    /// Resolve every visible route.
    pub fn resolve_routes(&self) -> Result<Vec<ResolvedRoute>> {
        let cfg = self.config()?;
        let ctx = self.context();
        let path = self.current_path();
        Ok(cfg
            .routes
            .iter()
            .enumerate()
            .filter_map(|(i, route)| {
                let item = self.resolve_item(
                    ElementId::route(i),
                    &route.item,
                    route.popup_items(),
                    &ctx,
                    path.as_deref(),
                )?;
                Some(ResolvedRoute {
                    item,
                    popup_items: route.popup_items().len(),
                })
            })
            .collect())
    }

    /// Resolve the visible popup items of `route`.
    pub fn resolve_popup(&self, route: usize) -> Result<Vec<ResolvedItem>> {
        let cfg = self.config()?;
        let r = cfg
            .routes
            .get(route)
            .ok_or(Error::UnknownElement(ElementId::route(route)))?;
        let ctx = self.context();
        let path = self.current_path();
        Ok(r.popup_items()
            .iter()
            .enumerate()
            .filter_map(|(i, item)| {
                self.resolve_item(
                    ElementId::popup_item(route, i),
                    item,
                    &[],
                    &ctx,
                    path.as_deref(),
                )
            })
            .collect())
    }

    /// Resolve layout options for the current viewport.
    pub fn resolve_layout(&self) -> Result<ResolvedLayout> {
        let cfg = self.config()?;
        let ctx = self.context();
        let is_desktop = self.inner.host.read().navbar.is_desktop;
        let (show_labels, hidden) = if is_desktop {
            (&cfg.desktop.show_labels, cfg.desktop.hidden.as_ref())
        } else {
            (&cfg.mobile.show_labels, cfg.mobile.hidden.as_ref())
        };
        let media_player = cfg.media_player.as_ref().and_then(|mp| {
            if !self.flag(&ctx, mp.show.as_ref(), true) {
                return None;
            }
            let entity = self.inner.evaluator.resolve(&ctx, &mp.entity).value()?;
            Some(ResolvedMediaPlayer {
                entity,
                album_cover_background: mp.album_cover_background,
            })
        });
        Ok(ResolvedLayout {
            is_desktop,
            position: is_desktop.then_some(cfg.desktop.position),
            show_labels: self.flag(&ctx, Some(show_labels), false),
            hidden: self.flag(&ctx, hidden, false),
            media_player,
        })
    }

    fn resolve_item(
        &self,
        element: ElementId,
        item: &NavItem,
        popup: &[PopupItem],
        ctx: &TemplateContext,
        path: Option<&str>,
    ) -> Option<ResolvedItem> {
        if self.flag(ctx, item.hidden.as_ref(), false) {
            return None;
        }
        let url = self.value(ctx, item.url.as_ref());
        let selected = match item.selected.as_ref() {
            Some(sel) => self.flag(ctx, Some(sel), false),
            None => path.is_some_and(|p| {
                url.as_deref() == Some(p)
                    || popup
                        .iter()
                        .any(|pi| self.value(ctx, pi.url.as_ref()).as_deref() == Some(p))
            }),
        };
        let pick = |base: &Option<Templatable<String>>, sel: &Option<Templatable<String>>| {
            let field = if selected { sel.as_ref().or(base.as_ref()) } else { base.as_ref() };
            self.text(ctx, field)
        };
        let badge = item.badge.as_ref().and_then(|b| {
            let show = self.flag(ctx, b.show.as_ref(), b.count.is_some());
            show.then(|| ResolvedBadge {
                count: b
                    .count
                    .as_ref()
                    .and_then(|c| self.inner.evaluator.resolve(ctx, c).value()),
                color: self.text(ctx, b.color.as_ref()),
                text_color: self.text(ctx, b.text_color.as_ref()),
            })
        });
        Some(ResolvedItem {
            element,
            url,
            icon: pick(&item.icon, &item.icon_selected),
            image: pick(&item.image, &item.image_selected),
            label: self.text(ctx, item.label.as_ref()),
            badge,
            selected,
        })
    }

    /// A boolean field, `default` when absent or unresolved.
    fn flag(&self, ctx: &TemplateContext, field: Option<&Templatable<bool>>, default: bool) -> bool {
        field.map_or(default, |f| self.inner.evaluator.resolve(ctx, f).unwrap_or(default))
    }

    /// A display string; a failed template shows its own text.
    fn text(&self, ctx: &TemplateContext, field: Option<&Templatable<String>>) -> Option<String> {
        self.inner
            .evaluator
            .resolve_opt(ctx, field)
            .map(Resolved::into_text)
    }

    /// A string that is only usable when resolved.
    fn value(&self, ctx: &TemplateContext, field: Option<&Templatable<String>>) -> Option<String> {
        self.inner
            .evaluator
            .resolve_opt(ctx, field)
            .and_then(Resolved::value)
    }

    /// Run the action of `gesture` on `element` immediately.
    pub fn execute(&self, element: ElementId, gesture: Gesture) -> Result<()> {
        self.inner.execute(element, gesture)
    }

    fn target(&self, element: ElementId) -> Result<Arc<dyn ActionTarget>> {
        let cfg = self.config()?;
        let item = cfg
            .item(element.route, element.item)
            .ok_or(Error::UnknownElement(element))?;
        Ok(Arc::new(NavTarget {
            navbar: Arc::downgrade(&self.inner),
            id: element,
            actions: Gesture::ALL.map(|g| item.action(g).is_some()),
        }))
    }

    /// Pointer pressed on `element`.
    pub fn on_pointer_down(&self, element: ElementId, event: PointerEvent) -> Result<()> {
        let target = self.target(element)?;
        self.inner.dispatcher.on_pointer_down(event, &target);
        Ok(())
    }

    /// Pointer moved while pressed on `element`.
    pub fn on_pointer_move(&self, element: ElementId, event: PointerEvent) -> Result<()> {
        let target = self.target(element)?;
        self.inner.dispatcher.on_pointer_move(event, &target);
        Ok(())
    }

    /// Pointer released on `element`.
    pub fn on_pointer_up(&self, element: ElementId, event: PointerEvent) -> Result<()> {
        let target = self.target(element)?;
        self.inner.dispatcher.on_pointer_up(event, &target);
        Ok(())
    }

    /// Mouse entered `element`.
    pub fn on_mouse_enter(&self, element: ElementId) -> Result<()> {
        let target = self.target(element)?;
        self.inner.dispatcher.on_mouse_enter(&target);
        Ok(())
    }

    /// Mouse moved over `element`.
    pub fn on_mouse_move(&self, element: ElementId) -> Result<()> {
        let target = self.target(element)?;
        self.inner.dispatcher.on_mouse_move(&target);
        Ok(())
    }

    /// Mouse left `element`.
    pub fn on_mouse_leave(&self, element: ElementId) -> Result<()> {
        let target = self.target(element)?;
        self.inner.dispatcher.on_mouse_leave(&target);
        Ok(())
    }

    /// Forget gesture state of an element that left the page.
    pub fn detach(&self, element: ElementId) {
        self.inner.dispatcher.detach(element);
    }

    /// Deliver a window-level key press.
    pub fn key_down(&self, key: &str) {
        self.inner.listeners.key_down(key);
    }

    /// Deliver an escape key press.
    pub fn press_escape(&self) {
        self.key_down("Escape");
    }
}

impl Inner {
    fn execute(&self, element: ElementId, gesture: Gesture) -> Result<()> {
        let cfg = self.config.read().clone().ok_or(Error::NotConfigured)?;
        let item = cfg
            .item(element.route, element.item)
            .ok_or(Error::UnknownElement(element))?;
        let popup_items = match element.item {
            None => cfg.routes.get(element.route).map(|r| r.popup_items()),
            Some(_) => None,
        }
        .unwrap_or_default();
        let context = self.host.read().context.clone();
        self.executor.execute(&ActionRequest {
            element,
            gesture,
            item,
            popup_items,
            haptic: cfg.haptic,
            context: &context,
        })
    }
}

/// Dispatcher view of one element of a [`Navbar`].
struct NavTarget {
    navbar: Weak<Inner>,
    id: ElementId,
    actions: [bool; 3],
}

impl ActionTarget for NavTarget {
    fn id(&self) -> ElementId {
        self.id
    }

    fn has_action(&self, gesture: Gesture) -> bool {
        let idx = Gesture::ALL.iter().position(|g| *g == gesture);
        idx.is_some_and(|i| self.actions[i])
    }

    fn execute_action(&self, gesture: Gesture) {
        let Some(inner) = self.navbar.upgrade() else {
            debug!(element = %self.id, "navbar dropped before action ran");
            return;
        };
        // MissingResource is already logged by the executor.
        match inner.execute(self.id, gesture) {
            Ok(()) | Err(Error::MissingResource { .. }) => {}
            Err(e) => error!(element = %self.id, %gesture, error = %e, "action failed"),
        }
    }
}
