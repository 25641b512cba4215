//! Navbar configuration: typed records, loading, validation and deep merge.
#![allow(missing_docs)]

mod action;
mod error;
mod loader;
mod merge;
mod path;
mod templates;
mod types;
mod validate;

#[cfg(test)]
mod test_merge;
#[cfg(test)]
mod test_parse;

pub use action::{ActionConfig, Gesture, HostAction, QuickbarMode};
pub use error::Error;
pub use loader::{load_from_path, load_from_str, load_registry_from_path};
pub use merge::{deep_merge, merge_into, merge_values};
pub use path::{get_path, remove_path, set_path};
pub use templates::TemplateRegistry;
pub use types::{
    Badge, DEFAULT_MIN_WIDTH, DesktopOptions, DesktopPosition, HapticConfig, MediaPlayerConfig,
    MobileOptions, NavItem, NavbarConfig, PopupItem, Route,
};
pub use validate::validate;
