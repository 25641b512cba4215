//! Navbar Engine
//!
//! Turns pointer input on navbar elements into actions:
//! - disambiguates tap, hold and double tap per element ([`ActionDispatcher`])
//! - runs the configured action or forwards it to the host ([`ActionExecutor`])
//! - opens and closes the popup overlay ([`PopupController`])
//!
//! [`Navbar`] wires these together with the active configuration and host snapshot. Everything
//! the rendering layer must do is reported as an [`Effect`] on an unbounded channel.

mod effects;
mod element;
mod error;
mod executor;
mod gesture;
mod navbar;
mod popup;
mod timer;

pub use effects::{Effect, EffectSink};
pub use element::{ElementId, PointerEvent, VisualState};
pub use error::{Error, Result};
pub use executor::{ActionExecutor, ActionRequest};
pub use gesture::{ActionDispatcher, ActionTarget, GestureTiming};
pub use navbar::{
    Navbar, NavbarOptions, ResolvedBadge, ResolvedItem, ResolvedLayout, ResolvedMediaPlayer,
    ResolvedRoute,
};
pub use popup::{ListenerId, PopupController, WindowListeners};
pub use timer::{TimerKind, Timers};
