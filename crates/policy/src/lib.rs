//! Sentinel policy objects.
//!
//! Core principle: **deny by default.** A sentinel answers a capability
//! with `true` only when its policy explicitly says so.
//!
//! - [`Policy`]: the capability rules of one sentinel type.
//! - [`Sentinel`]: a policy bound to attributes (actor, subject model).
//! - [`Capability`]: the question being asked.
//! - [`scope`]: authorization scopes handed to the data layer.

mod attributes;
mod capability;
mod error;
mod policy;
pub mod scope;
mod sentinel;

pub use attributes::{Attributes, Value};
pub use capability::Capability;
pub use error::{Error, Result};
pub use policy::Policy;
pub use sentinel::Sentinel;
