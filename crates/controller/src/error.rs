//! Controller error types.

use thiserror::Error;

/// Controller errors.
///
/// All of these describe misconfiguration. They should abort the request
/// with a server error; a denied permission is reported through the
/// denial handler instead.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// No sentinel type with this name has been registered.
    #[error("sentinel type '{0}' is not registered")]
    PolicyTypeNotFound(String),

    /// A guard names a denial handler that the controller does not define.
    #[error("{controller} has no denial handler named '{handler}'")]
    UnknownDenialHandler { controller: String, handler: String },

    /// A guard needs a sentinel but the controller declares no attachment rule.
    #[error("{controller} guards actions with a sentinel but has no attachment rule")]
    MissingAttachmentRule { controller: String },

    /// An error occurred in the policy layer.
    #[error(transparent)]
    Policy(#[from] policy::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
