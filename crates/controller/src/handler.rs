//! Granted and denied handlers.

use crate::{RequestContext, Response};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A response-producing procedure run in the context of the current request.
pub type Handler<C> = Arc<dyn Fn(&mut C) + Send + Sync>;

/// Name of a denial handler. Guards use [`HandlerName::DEFAULT`] unless
/// told otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerName(Cow<'static, str>);

impl HandlerName {
    pub const DEFAULT: HandlerName = HandlerName(Cow::Borrowed("default"));

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for HandlerName {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<&'static str> for HandlerName {
    fn from(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }
}

impl From<String> for HandlerName {
    fn from(name: String) -> Self {
        Self(Cow::Owned(name))
    }
}

impl fmt::Display for HandlerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Granted handler plus the named denial handlers of one controller.
pub struct Handlers<C> {
    granted: Handler<C>,
    denied: BTreeMap<HandlerName, Handler<C>>,
}

impl<C: RequestContext> Handlers<C> {
    pub fn granted(&self) -> &Handler<C> {
        &self.granted
    }

    pub fn denied(&self, name: &HandlerName) -> Option<&Handler<C>> {
        self.denied.get(name)
    }

    pub fn has_denied(&self, name: &HandlerName) -> bool {
        self.denied.contains_key(name)
    }

    pub fn denied_names(&self) -> impl Iterator<Item = &HandlerName> {
        self.denied.keys()
    }

    pub(crate) fn set_granted(&mut self, handler: Handler<C>) {
        self.granted = handler;
    }

    pub(crate) fn set_denied(&mut self, name: HandlerName, handler: Handler<C>) {
        self.denied.insert(name, handler);
    }
}

impl<C: RequestContext + 'static> Default for Handlers<C> {
    /// Granted does nothing; `default` denial renders the unauthorized response.
    fn default() -> Self {
        let mut denied: BTreeMap<HandlerName, Handler<C>> = BTreeMap::new();
        denied.insert(
            HandlerName::DEFAULT,
            Arc::new(|ctx: &mut C| {
                let response = Response::unauthorized(&ctx.format());
                ctx.render(response);
            }),
        );
        Self {
            granted: Arc::new(|_: &mut C| {}),
            denied,
        }
    }
}

impl<C> Clone for Handlers<C> {
    fn clone(&self) -> Self {
        Self {
            granted: Arc::clone(&self.granted),
            denied: self.denied.clone(),
        }
    }
}

impl<C> fmt::Debug for Handlers<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handlers")
            .field("denied", &self.denied.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
