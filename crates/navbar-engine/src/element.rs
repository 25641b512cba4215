use std::fmt;

use serde::{Deserialize, Serialize};

/// Address of an actionable element: a route, or an item of that route's popup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId {
    /// Index into `routes`.
    pub route: usize,
    /// Index into the route's `popup`, for popup items.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<usize>,
}

impl ElementId {
    /// A top-level route button.
    pub fn route(route: usize) -> Self {
        Self { route, item: None }
    }

    /// An item of `route`'s popup.
    pub fn popup_item(route: usize, item: usize) -> Self {
        Self {
            route,
            item: Some(item),
        }
    }

    /// True for popup items.
    pub fn is_popup_item(&self) -> bool {
        self.item.is_some()
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.item {
            None => write!(f, "routes[{}]", self.route),
            Some(i) => write!(f, "routes[{}].popup[{}]", self.route, i),
        }
    }
}

/// Position and target of a pointer event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    /// Horizontal position in pixels.
    pub x: f64,
    /// Vertical position in pixels.
    pub y: f64,
    /// Element under the pointer.
    pub target: ElementId,
}

impl PointerEvent {
    /// An event on `target` at `(x, y)`.
    pub fn new(target: ElementId, x: f64, y: f64) -> Self {
        Self { x, y, target }
    }
}

/// Hover and press indicator state of an element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualState {
    /// The pointer is over the element.
    pub hovered: bool,
    /// A press is in progress.
    pub pressed: bool,
}
