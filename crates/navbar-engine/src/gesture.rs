//! Tap, hold and double-tap disambiguation.
//!
//! Each actionable element gets a lazily created [`Session`] that lives until the element is
//! detached. A press moves `Idle -> Pressed -> {TapCandidate, HoldFired} -> Idle`; a separate
//! correlation window spans presses so a second tap on the same target can upgrade the first
//! into a double tap.
//!
//! When a double-tap action is configured a single tap cannot be classified until the window has
//! elapsed, so it is deferred by the window length. Without one, taps fire immediately.

use std::{collections::HashMap, sync::Arc, time::Duration};

use config::Gesture;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::{
    Effect, EffectSink, ElementId, PointerEvent, VisualState,
    timer::{TimerKind, Timers},
};

/// Gesture timing knobs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureTiming {
    /// How long a press must last before it counts as a hold.
    pub hold_ms: u64,
    /// Pointer travel, in pixels along either axis, that turns a press into a drag.
    pub move_threshold: f64,
    /// Maximum gap between two taps of a double tap.
    pub double_tap_ms: u64,
    /// Delay between deciding a gesture and running its action. `None` runs it synchronously.
    ///
    /// Works around a re-entrant click the host delivers after a navigation completes within
    /// the same event tick.
    pub dispatch_delay_ms: Option<u64>,
}

impl Default for GestureTiming {
    fn default() -> Self {
        Self {
            hold_ms: 500,
            move_threshold: 10.0,
            double_tap_ms: 250,
            dispatch_delay_ms: Some(10),
        }
    }
}

impl GestureTiming {
    /// Hold delay as a duration.
    pub fn hold(&self) -> Duration {
        Duration::from_millis(self.hold_ms)
    }

    /// Double-tap window as a duration.
    pub fn double_tap_window(&self) -> Duration {
        Duration::from_millis(self.double_tap_ms)
    }

    /// Dispatch delay as a duration, if any.
    pub fn dispatch_delay(&self) -> Option<Duration> {
        self.dispatch_delay_ms.map(Duration::from_millis)
    }
}

/// An element the dispatcher can fire gestures on.
pub trait ActionTarget: Send + Sync + 'static {
    /// The element's address.
    fn id(&self) -> ElementId;

    /// Whether an action is configured for `gesture`.
    fn has_action(&self, gesture: Gesture) -> bool;

    /// Run the action for a fired gesture.
    fn execute_action(&self, gesture: Gesture);
}

/// Per-element gesture state.
#[derive(Debug, Default)]
struct Session {
    /// Pointer position at press.
    start: (f64, f64),
    /// Set by the hold timer while the press is still down.
    hold_triggered: bool,
    /// When the last single tap was released.
    last_tap: Option<Instant>,
    /// Element the last single tap landed on.
    last_tap_target: Option<ElementId>,
    /// Hover and press indicator.
    visual: VisualState,
}

impl Session {
    /// Forget the previous tap so the next one starts a new sequence.
    fn reset_correlation(&mut self) {
        self.last_tap = None;
        self.last_tap_target = None;
    }
}

/// Outcome of a pointer release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Release {
    /// Second tap inside the window.
    DoubleTap,
    /// The hold timer fired before release.
    Hold,
    /// A tap that must wait out the double-tap window.
    DeferredTap,
    /// A tap that fires now.
    Tap,
}

/// Shared dispatcher state.
struct Inner {
    /// Timing knobs.
    timing: GestureTiming,
    /// Hold, deferred-tap and dispatch timers.
    timers: Timers,
    /// Live sessions by element.
    sessions: Mutex<HashMap<ElementId, Session>>,
    /// Where visual changes go.
    sink: EffectSink,
}

/// Turns raw pointer and mouse events into fired gestures.
///
/// Handlers take the element explicitly, so one dispatcher serves every element of a navbar.
/// Must be driven from within a tokio runtime.
#[derive(Clone)]
pub struct ActionDispatcher {
    inner: Arc<Inner>,
}

impl ActionDispatcher {
    /// Create a dispatcher reporting visual changes to `sink`.
    pub fn new(timing: GestureTiming, sink: EffectSink) -> Self {
        Self {
            inner: Arc::new(Inner {
                timing,
                timers: Timers::new(),
                sessions: Mutex::new(HashMap::new()),
                sink,
            }),
        }
    }

    /// The timing this dispatcher was built with.
    pub fn timing(&self) -> &GestureTiming {
        &self.inner.timing
    }

    /// Pending timers, for inspection.
    pub fn timers(&self) -> &Timers {
        &self.inner.timers
    }

    /// Number of elements with a live session.
    pub fn session_count(&self) -> usize {
        self.inner.sessions.lock().len()
    }

    /// Current visual state of `element`.
    pub fn visual_state(&self, element: ElementId) -> VisualState {
        self.inner
            .sessions
            .lock()
            .get(&element)
            .map(|s| s.visual)
            .unwrap_or_default()
    }

    /// Start a press: remember where it began and arm the hold timer.
    pub fn on_pointer_down(&self, event: PointerEvent, target: &Arc<dyn ActionTarget>) {
        let id = target.id();
        self.update_session(id, |s| {
            s.start = (event.x, event.y);
            s.hold_triggered = false;
        });
        self.set_visual(id, |v| v.pressed = true);

        if target.has_action(Gesture::Hold) {
            let weak = Arc::downgrade(&self.inner);
            self.inner
                .timers
                .start(id, TimerKind::Hold, self.inner.timing.hold(), move || {
                    let Some(inner) = weak.upgrade() else {
                        return;
                    };
                    if let Some(s) = inner.sessions.lock().get_mut(&id) {
                        s.hold_triggered = true;
                        trace!(element = %id, "hold_triggered");
                    }
                });
        }
    }

    /// Cancel a pending hold once the pointer drifts past the move threshold.
    pub fn on_pointer_move(&self, event: PointerEvent, target: &Arc<dyn ActionTarget>) {
        let id = target.id();
        if !self.inner.timers.is_pending(id, TimerKind::Hold) {
            return;
        }
        let Some((sx, sy)) = self.inner.sessions.lock().get(&id).map(|s| s.start) else {
            return;
        };
        let threshold = self.inner.timing.move_threshold;
        if (event.x - sx).abs() > threshold || (event.y - sy).abs() > threshold {
            self.inner.timers.cancel(id, TimerKind::Hold);
            debug!(element = %id, "pointer moved past threshold; hold cancelled");
        }
    }

    /// End a press and decide between double tap, hold and tap.
    pub fn on_pointer_up(&self, event: PointerEvent, target: &Arc<dyn ActionTarget>) {
        let id = target.id();
        self.inner.timers.cancel(id, TimerKind::Hold);
        let now = Instant::now();
        let window = self.inner.timing.double_tap_window();
        let has_double = target.has_action(Gesture::DoubleTap);
        let has_hold = target.has_action(Gesture::Hold);
        self.set_visual(id, |v| v.pressed = false);

        let release = self.update_session(id, |s| {
            let within_window = s
                .last_tap
                .is_some_and(|t| now.saturating_duration_since(t) < window);
            let release = if within_window
                && s.last_tap_target == Some(event.target)
                && has_double
            {
                s.reset_correlation();
                Release::DoubleTap
            } else if s.hold_triggered && has_hold {
                s.reset_correlation();
                Release::Hold
            } else {
                s.last_tap = Some(now);
                s.last_tap_target = Some(event.target);
                if has_double {
                    Release::DeferredTap
                } else {
                    Release::Tap
                }
            };
            s.hold_triggered = false;
            release
        });
        debug!(element = %id, ?release, "pointer released");

        match release {
            Release::DoubleTap => {
                self.inner.timers.cancel(id, TimerKind::Tap);
                self.fire(target, Gesture::DoubleTap);
            }
            Release::Hold => self.fire(target, Gesture::Hold),
            Release::Tap => self.fire(target, Gesture::Tap),
            Release::DeferredTap => {
                let this = self.clone();
                let target = target.clone();
                self.inner.timers.start(id, TimerKind::Tap, window, move || {
                    this.fire(&target, Gesture::Tap);
                });
            }
        }
    }

    /// Mark the element hovered.
    pub fn on_mouse_enter(&self, target: &Arc<dyn ActionTarget>) {
        self.set_visual(target.id(), |v| v.hovered = true);
    }

    /// Keep the element hovered; re-entering after a fire lights it again.
    pub fn on_mouse_move(&self, target: &Arc<dyn ActionTarget>) {
        self.set_visual(target.id(), |v| v.hovered = true);
    }

    /// Clear hover and press.
    pub fn on_mouse_leave(&self, target: &Arc<dyn ActionTarget>) {
        self.set_visual(target.id(), |v| *v = VisualState::default());
    }

    /// Cancel every timer of `element` and drop its session.
    pub fn detach(&self, element: ElementId) {
        self.inner.timers.cancel_element(element);
        if self.inner.sessions.lock().remove(&element).is_some() {
            trace!(%element, "session detached");
        }
    }

    /// Detach every element.
    pub fn detach_all(&self) {
        self.inner.timers.clear();
        self.inner.sessions.lock().clear();
    }

    /// Reset the visual state and hand the gesture to the element, after the dispatch delay.
    ///
    /// The reset is announced even if the action is later skipped, so the indicator never
    /// outlives the gesture.
    fn fire(&self, target: &Arc<dyn ActionTarget>, gesture: Gesture) {
        let id = target.id();
        self.set_visual(id, |v| *v = VisualState::default());
        debug!(element = %id, %gesture, "gesture fired");
        match self.inner.timing.dispatch_delay() {
            None => target.execute_action(gesture),
            Some(delay) => {
                let target = target.clone();
                self.inner
                    .timers
                    .start(id, TimerKind::Dispatch, delay, move || {
                        target.execute_action(gesture)
                    });
            }
        }
    }

    /// Run `f` on the session of `id`, creating it on first use.
    fn update_session<R>(&self, id: ElementId, f: impl FnOnce(&mut Session) -> R) -> R {
        let mut sessions = self.inner.sessions.lock();
        f(sessions.entry(id).or_default())
    }

    /// Apply `f` to the element's visual state and announce it when it changed.
    fn set_visual(&self, id: ElementId, f: impl FnOnce(&mut VisualState)) {
        let changed = self.update_session(id, |s| {
            let before = s.visual;
            f(&mut s.visual);
            (s.visual != before).then_some(s.visual)
        });
        if let Some(state) = changed {
            self.inner.sink.emit(Effect::Visual { element: id, state });
        }
    }
}
