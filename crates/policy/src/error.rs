//! Policy error types.

use thiserror::Error;

/// Policy errors.
///
/// Every variant is a configuration mistake discovered at first use. A
/// denied permission is never an error; it is a `false` decision.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A custom capability was queried that the sentinel does not answer.
    #[error("{sentinel} has no capability named '{capability}'")]
    NoSuchCapability {
        sentinel: String,
        capability: String,
    },

    /// An attribute was assigned that the sentinel does not declare.
    #[error("{sentinel} does not declare attribute '{attribute}'")]
    UnknownAttribute { sentinel: String, attribute: String },

    /// A stored attribute could not be read as the requested type.
    #[error("attribute '{attribute}' has an unexpected shape: {source}")]
    Attribute {
        attribute: String,
        #[source]
        source: serde_json::Error,
    },

    /// A sentinel type name does not follow the `<Model>Sentinel` form.
    #[error("cannot derive a model from sentinel name '{0}'")]
    InvalidSentinelName(String),
}

pub type Result<T> = std::result::Result<T, Error>;
