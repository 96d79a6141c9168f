//! Guard entries: which actions are checked, and how.

use crate::HandlerName;
use policy::{Capability, Sentinel};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// A boolean predicate evaluated against `T`.
pub type Predicate<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// The actions a guard applies to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ActionFilter {
    /// Every action.
    #[default]
    All,
    Only(BTreeSet<String>),
    Except(BTreeSet<String>),
}

impl ActionFilter {
    pub fn only<I, S>(actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Only(actions.into_iter().map(Into::into).collect())
    }

    pub fn except<I, S>(actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Except(actions.into_iter().map(Into::into).collect())
    }

    pub fn matches(&self, action: &str) -> bool {
        match self {
            ActionFilter::All => true,
            ActionFilter::Only(actions) => actions.contains(action),
            ActionFilter::Except(actions) => !actions.contains(action),
        }
    }
}

impl fmt::Display for ActionFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |set: &BTreeSet<String>| set.iter().cloned().collect::<Vec<_>>().join(", ");
        match self {
            ActionFilter::All => f.write_str("all actions"),
            ActionFilter::Only(actions) => write!(f, "only [{}]", join(actions)),
            ActionFilter::Except(actions) => write!(f, "except [{}]", join(actions)),
        }
    }
}

/// How a guard reaches its decision.
pub enum Check<C> {
    /// Ask the attached sentinel for a capability.
    Capability(Capability),
    /// Run a predicate against the attached sentinel.
    Sentinel(Predicate<Sentinel>),
    /// Run a predicate against the request context.
    Context(Predicate<C>),
}

impl<C> Check<C> {
    /// Whether evaluating this check needs the attachment rule.
    pub fn needs_sentinel(&self) -> bool {
        !matches!(self, Check::Context(_))
    }

    /// Short description used in logs and listings.
    pub fn label(&self) -> String {
        match self {
            Check::Capability(capability) => capability.to_string(),
            Check::Sentinel(_) => "sentinel predicate".to_string(),
            Check::Context(_) => "context predicate".to_string(),
        }
    }
}

impl<C> Clone for Check<C> {
    fn clone(&self) -> Self {
        match self {
            Check::Capability(capability) => Check::Capability(capability.clone()),
            Check::Sentinel(predicate) => Check::Sentinel(Arc::clone(predicate)),
            Check::Context(predicate) => Check::Context(Arc::clone(predicate)),
        }
    }
}

impl<C> fmt::Debug for Check<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Check::Capability(capability) => f.debug_tuple("Capability").field(capability).finish(),
            Check::Sentinel(_) => f.write_str("Sentinel(..)"),
            Check::Context(_) => f.write_str("Context(..)"),
        }
    }
}

/// One guard: a filter, a check, and the denial handler to run on `false`.
pub struct Guard<C> {
    filter: ActionFilter,
    check: Check<C>,
    denies_with: HandlerName,
}

impl<C> Guard<C> {
    pub fn new(filter: ActionFilter, check: Check<C>) -> Self {
        Self {
            filter,
            check,
            denies_with: HandlerName::DEFAULT,
        }
    }

    pub fn capability(filter: ActionFilter, capability: impl Into<Capability>) -> Self {
        Self::new(filter, Check::Capability(capability.into()))
    }

    pub fn denies_with(mut self, handler: impl Into<HandlerName>) -> Self {
        self.denies_with = handler.into();
        self
    }

    pub fn filter(&self) -> &ActionFilter {
        &self.filter
    }

    pub fn check(&self) -> &Check<C> {
        &self.check
    }

    pub fn denial_handler(&self) -> &HandlerName {
        &self.denies_with
    }

    pub fn applies_to(&self, action: &str) -> bool {
        self.filter.matches(action)
    }
}

impl<C> Clone for Guard<C> {
    fn clone(&self) -> Self {
        Self {
            filter: self.filter.clone(),
            check: self.check.clone(),
            denies_with: self.denies_with.clone(),
        }
    }
}

impl<C> fmt::Debug for Guard<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guard")
            .field("filter", &self.filter)
            .field("check", &self.check)
            .field("denies_with", &self.denies_with)
            .finish()
    }
}
