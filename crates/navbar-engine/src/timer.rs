//! One-shot timers keyed per element, with cancellation.
//!
//! Each element has at most one pending hold or tap timer; starting one replaces the previous
//! timer of the same kind. Dispatch timers queue instead, so every decided gesture runs its
//! action. Timers run as tokio tasks and are cancelled through a
//! [`CancellationToken`], so cancellation is synchronous from the caller's point of view: once
//! `cancel` returns, the callback will not run.

use std::{collections::HashMap, fmt, sync::Arc, time::Duration};

use parking_lot::Mutex;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::ElementId;

/// The kinds of deferred work an element can have pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Marks a press as a hold once the hold delay elapses.
    Hold,
    /// A single tap waiting out the double-tap window.
    Tap,
    /// A decided gesture waiting out the dispatch delay.
    Dispatch,
}

impl fmt::Display for TimerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Hold => "hold",
            Self::Tap => "tap",
            Self::Dispatch => "dispatch",
        })
    }
}

impl TimerKind {
    /// Whether a new timer of this kind replaces a pending one on the same element.
    fn replaces(self) -> bool {
        !matches!(self, Self::Dispatch)
    }
}

/// Element, kind and slot; replacing kinds always use slot 0.
type Key = (ElementId, TimerKind, u64);

struct TimerEntry {
    token: CancellationToken,
    generation: u64,
}

#[derive(Default)]
struct State {
    entries: HashMap<Key, TimerEntry>,
    next_generation: u64,
}

/// Registry of pending one-shot timers.
#[derive(Clone, Default)]
pub struct Timers {
    state: Arc<Mutex<State>>,
}

impl Timers {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether a timer of `kind` is pending for `element`.
    pub fn is_pending(&self, element: ElementId, kind: TimerKind) -> bool {
        self.state
            .lock()
            .entries
            .keys()
            .any(|&(e, k, _)| e == element && k == kind)
    }

    /// Number of pending timers.
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// True when nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Start the `kind` timer of `element`; `on_fire` runs once after `delay`.
    ///
    /// Replaces a pending hold or tap timer; dispatch timers accumulate.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<F>(&self, element: ElementId, kind: TimerKind, delay: Duration, on_fire: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let token = CancellationToken::new();
        let (key, generation) = {
            let mut st = self.state.lock();
            st.next_generation += 1;
            let generation = st.next_generation;
            let key = (element, kind, if kind.replaces() { 0 } else { generation });
            let old = st.entries.insert(
                key,
                TimerEntry {
                    token: token.clone(),
                    generation,
                },
            );
            if let Some(old) = old {
                old.token.cancel();
                trace!(%element, %kind, "timer_replaced");
            }
            (key, generation)
        };

        let state = self.state.clone();
        let deadline = time::Instant::now() + delay;
        trace!(%element, %kind, delay_ms = delay.as_millis() as u64, "timer_start");
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    trace!(%element, %kind, "timer_cancelled");
                    return;
                }
                _ = time::sleep_until(deadline) => {}
            }
            {
                let mut st = state.lock();
                // A replacement owns the slot now; leave it alone.
                match st.entries.get(&key) {
                    Some(e) if e.generation == generation => {
                        st.entries.remove(&key);
                    }
                    _ => return,
                }
            }
            trace!(%element, %kind, "timer_fired");
            on_fire();
        });
    }

    /// Cancel every `kind` timer of `element`. Returns true if one was pending.
    pub fn cancel(&self, element: ElementId, kind: TimerKind) -> bool {
        let cancelled = self.remove_where(|&(e, k, _)| e == element && k == kind);
        if cancelled > 0 {
            trace!(%element, %kind, "timer_stop");
        }
        cancelled > 0
    }

    /// Cancel every timer of `element`.
    pub fn cancel_element(&self, element: ElementId) {
        let cancelled = self.remove_where(|&(e, _, _)| e == element);
        if cancelled > 0 {
            trace!(%element, count = cancelled, "timer_stop_element");
        }
    }

    /// Remove and cancel the entries whose key matches `pred`, returning how many there were.
    fn remove_where(&self, pred: impl Fn(&Key) -> bool) -> usize {
        let cancelled: Vec<TimerEntry> = {
            let mut st = self.state.lock();
            let keys: Vec<Key> = st.entries.keys().filter(|k| pred(k)).copied().collect();
            keys.iter().filter_map(|k| st.entries.remove(k)).collect()
        };
        for e in &cancelled {
            e.token.cancel();
        }
        cancelled.len()
    }

    /// Cancel every pending timer.
    pub fn clear(&self) {
        let entries: Vec<TimerEntry> = {
            let mut st = self.state.lock();
            st.entries.drain().map(|(_, e)| e).collect()
        };
        for e in &entries {
            e.token.cancel();
        }
        trace!(count = entries.len(), "timer_clear");
    }
}
