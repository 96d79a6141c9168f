//! The capability logic behind a sentinel.

use crate::Attributes;

/// Capability rules for one sentinel type.
///
/// Every method receives the sentinel's attributes by shared reference and
/// nothing else, so a decision is a pure function of those attributes and
/// may be evaluated any number of times.
///
/// The five RESTful capabilities deny by default. Override the ones a
/// sentinel grants; answer anything else from [`Policy::custom`].
///
/// # Example
///
/// ```
/// use policy::{Attributes, Policy, Sentinel};
/// use serde_json::json;
///
/// struct ArticleSentinel;
///
/// impl Policy for ArticleSentinel {
///     fn name(&self) -> &str {
///         "ArticleSentinel"
///     }
///
///     fn declares(&self, attribute: &str) -> bool {
///         matches!(attribute, "current_user" | "article")
///     }
///
///     fn read(&self, attrs: &Attributes) -> bool {
///         attrs.get("article").and_then(|a| a["published"].as_bool()) == Some(true)
///     }
/// }
///
/// let sentinel = Sentinel::new(ArticleSentinel, [("article", json!({"published": true}))])?;
/// assert!(sentinel.read());
/// assert!(!sentinel.destroy());
/// # Ok::<(), policy::Error>(())
/// ```
pub trait Policy: Send + Sync {
    /// Sentinel type name, e.g. `ArticleSentinel`.
    fn name(&self) -> &str;

    /// Whether `attribute` is part of this sentinel's schema.
    fn declares(&self, attribute: &str) -> bool;

    fn index(&self, _attrs: &Attributes) -> bool {
        false
    }

    fn create(&self, _attrs: &Attributes) -> bool {
        false
    }

    fn read(&self, _attrs: &Attributes) -> bool {
        false
    }

    fn update(&self, _attrs: &Attributes) -> bool {
        false
    }

    fn destroy(&self, _attrs: &Attributes) -> bool {
        false
    }

    /// Answer a custom capability.
    ///
    /// Return `None` for names this sentinel does not know; the caller
    /// turns that into [`crate::Error::NoSuchCapability`].
    fn custom(&self, _capability: &str, _attrs: &Attributes) -> Option<bool> {
        None
    }
}
