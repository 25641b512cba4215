use std::result::Result as StdResult;

use thiserror::Error;

use crate::ElementId;

/// Convenient result type for the engine crate.
pub type Result<T> = StdResult<T, Error>;

/// Unified error type for the navbar engine.
#[derive(Debug, Error)]
pub enum Error {
    /// An action needs something the configuration does not provide.
    #[error("{element}: {action} requires {what}")]
    MissingResource {
        /// Element the action was fired on.
        element: ElementId,
        /// The action tag.
        action: String,
        /// Description of the missing resource.
        what: &'static str,
    },

    /// The element does not exist in the active configuration.
    #[error("unknown element {0}")]
    UnknownElement(ElementId),

    /// No configuration has been applied yet.
    #[error("no navbar configuration applied")]
    NotConfigured,

    /// The rendering layer dropped its effect receiver.
    #[error("effect channel closed")]
    ChannelClosed,

    /// The configuration was rejected.
    #[error(transparent)]
    Config(#[from] config::Error),
}
