//! Popup overlay and the window-level listeners it registers while open.

use std::{
    collections::BTreeMap,
    sync::{Arc, Weak},
};

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::{ActionDispatcher, Effect, EffectSink, ElementId};

/// Handle of a registered window listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

type KeyListener = Arc<dyn Fn(&str) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next: u64,
    listeners: BTreeMap<ListenerId, KeyListener>,
}

/// Window-level key listeners.
#[derive(Clone, Default)]
pub struct WindowListeners {
    registry: Arc<Mutex<Registry>>,
}

impl WindowListeners {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a key-down listener.
    pub fn add(&self, listener: impl Fn(&str) + Send + Sync + 'static) -> ListenerId {
        let mut reg = self.registry.lock();
        reg.next += 1;
        let id = ListenerId(reg.next);
        reg.listeners.insert(id, Arc::new(listener));
        trace!(listener = id.0, "window listener added");
        id
    }

    /// Unregister a listener. Returns false if it was already gone.
    pub fn remove(&self, id: ListenerId) -> bool {
        let removed = self.registry.lock().listeners.remove(&id).is_some();
        if removed {
            trace!(listener = id.0, "window listener removed");
        }
        removed
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.registry.lock().listeners.len()
    }

    /// True when no listener is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver a key-down to every listener.
    pub fn key_down(&self, key: &str) {
        // Listeners may unregister themselves, so call them outside the lock.
        let listeners: Vec<KeyListener> = self.registry.lock().listeners.values().cloned().collect();
        for l in listeners {
            l(key);
        }
    }
}

/// The popup currently shown.
#[derive(Debug)]
struct OpenPopup {
    /// Route owning it.
    route: usize,
    /// Number of items, for detaching their sessions.
    items: usize,
    /// Escape listener to remove on close.
    escape: ListenerId,
}

/// Shared controller state.
struct Inner {
    /// Where the escape listener is registered.
    listeners: WindowListeners,
    /// Used to detach item sessions on close.
    dispatcher: ActionDispatcher,
    /// Where open/close effects go.
    sink: EffectSink,
    /// The open popup, if any.
    open: Mutex<Option<OpenPopup>>,
}

/// Opens and closes the popup overlay of a route.
#[derive(Clone)]
pub struct PopupController {
    inner: Arc<Inner>,
}

impl PopupController {
    /// Create a controller registering on `listeners` and detaching through `dispatcher`.
    pub fn new(listeners: WindowListeners, dispatcher: ActionDispatcher, sink: EffectSink) -> Self {
        Self {
            inner: Arc::new(Inner {
                listeners,
                dispatcher,
                sink,
                open: Mutex::new(None),
            }),
        }
    }

    /// Route whose popup is open, if any.
    pub fn open_route(&self) -> Option<usize> {
        self.inner.open.lock().as_ref().map(|p| p.route)
    }

    /// True while a popup is open.
    pub fn is_open(&self) -> bool {
        self.inner.open.lock().is_some()
    }

    /// Open the popup of `route` showing `items` entries, closing any other popup first.
    pub fn open(&self, route: usize, items: usize) {
        self.close();
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let escape = self.inner.listeners.add(move |key| {
            if key != "Escape" {
                return;
            }
            if let Some(inner) = weak.upgrade() {
                debug!("escape pressed; closing popup");
                PopupController { inner }.close();
            }
        });
        *self.inner.open.lock() = Some(OpenPopup {
            route,
            items,
            escape,
        });
        debug!(route, items, "popup opened");
        self.inner.sink.emit(Effect::OpenPopup { route, items });
    }

    /// Close the open popup. Returns false if none was open.
    ///
    /// Unregisters the escape listener and detaches every popup item, cancelling their timers.
    pub fn close(&self) -> bool {
        let Some(popup) = self.inner.open.lock().take() else {
            return false;
        };
        self.inner.listeners.remove(popup.escape);
        for i in 0..popup.items {
            self.inner
                .dispatcher
                .detach(ElementId::popup_item(popup.route, i));
        }
        debug!(route = popup.route, "popup closed");
        self.inner.sink.emit(Effect::ClosePopup { route: popup.route });
        true
    }
}
