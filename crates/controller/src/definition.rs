//! Controller definitions and their builder.
//!
//! A definition is built once at startup and never changes afterwards.
//! A "subclass" is another definition created with
//! [`ControllerDefinition::extend`], which copies every table into a new
//! builder; the child's additions never reach the parent.

use crate::guard::{ActionFilter, Check, Guard};
use crate::handler::{HandlerName, Handlers};
use crate::{Error, RequestContext, Result};
use policy::{Capability, Sentinel};
use std::fmt;
use std::sync::Arc;

/// Builds the sentinel for the current request.
pub type AttachmentRule<C> = Arc<dyn Fn(&C) -> Result<Sentinel> + Send + Sync>;

/// The authorization setup of one controller.
pub struct ControllerDefinition<C> {
    pub(crate) name: String,
    pub(crate) rule: Option<AttachmentRule<C>>,
    pub(crate) guards: Vec<Guard<C>>,
    pub(crate) handlers: Handlers<C>,
}

impl<C: RequestContext + 'static> ControllerDefinition<C> {
    pub fn builder(name: impl Into<String>) -> ControllerBuilder<C> {
        ControllerBuilder {
            name: name.into(),
            rule: None,
            guards: Vec::new(),
            handlers: Handlers::default(),
        }
    }

    /// Start a child definition that inherits this one's rule, guards and
    /// handlers.
    pub fn extend(&self, name: impl Into<String>) -> ControllerBuilder<C> {
        ControllerBuilder {
            name: name.into(),
            rule: self.rule.clone(),
            guards: self.guards.clone(),
            handlers: self.handlers.clone(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Guards in registration order.
    pub fn guards(&self) -> &[Guard<C>] {
        &self.guards
    }

    pub fn handlers(&self) -> &Handlers<C> {
        &self.handlers
    }

    pub fn has_attachment_rule(&self) -> bool {
        self.rule.is_some()
    }

    /// Run the attachment rule for this request.
    pub fn sentinel(&self, ctx: &C) -> Result<Sentinel> {
        let rule = self.rule.as_ref().ok_or_else(|| Error::MissingAttachmentRule {
            controller: self.name.clone(),
        })?;
        rule(ctx)
    }
}

impl<C> fmt::Debug for ControllerDefinition<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerDefinition")
            .field("name", &self.name)
            .field("rule", &self.rule.is_some())
            .field("guards", &self.guards)
            .field("handlers", &self.handlers)
            .finish()
    }
}

/// Collects guards and handlers before the definition is frozen.
pub struct ControllerBuilder<C> {
    name: String,
    rule: Option<AttachmentRule<C>>,
    guards: Vec<Guard<C>>,
    handlers: Handlers<C>,
}

impl<C: RequestContext + 'static> ControllerBuilder<C> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declare how the sentinel is built. Replaces any earlier declaration,
    /// including one inherited through `extend`.
    pub fn controls_access_with<F>(mut self, rule: F) -> Self
    where
        F: Fn(&C) -> Result<Sentinel> + Send + Sync + 'static,
    {
        self.rule = Some(Arc::new(rule));
        self
    }

    /// Register a guard. Guards run in registration order.
    pub fn guard(mut self, guard: Guard<C>) -> Self {
        self.guards.push(guard);
        self
    }

    /// Require `capability` on the matching actions.
    pub fn grants_access_to(self, capability: impl Into<Capability>, filter: ActionFilter) -> Self {
        self.guard(Guard::capability(filter, capability))
    }

    /// Require `capability`, running the named denial handler on `false`.
    pub fn grants_access_to_with(
        self,
        capability: impl Into<Capability>,
        filter: ActionFilter,
        denies_with: impl Into<HandlerName>,
    ) -> Self {
        self.guard(Guard::capability(filter, capability).denies_with(denies_with))
    }

    /// Grant when `predicate` holds for the attached sentinel.
    pub fn grants_access_if<F>(self, filter: ActionFilter, predicate: F) -> Self
    where
        F: Fn(&Sentinel) -> bool + Send + Sync + 'static,
    {
        self.guard(Guard::new(filter, Check::Sentinel(Arc::new(predicate))))
    }

    /// Grant when `predicate` holds for the request context.
    pub fn grants_access_when<F>(self, filter: ActionFilter, predicate: F) -> Self
    where
        F: Fn(&C) -> bool + Send + Sync + 'static,
    {
        self.guard(Guard::new(filter, Check::Context(Arc::new(predicate))))
    }

    /// Register (or replace) a named denial handler.
    pub fn on_denied_with<F>(mut self, name: impl Into<HandlerName>, handler: F) -> Self
    where
        F: Fn(&mut C) + Send + Sync + 'static,
    {
        self.handlers.set_denied(name.into(), Arc::new(handler));
        self
    }

    /// Replace the handler run when a guard grants access.
    pub fn with_access<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut C) + Send + Sync + 'static,
    {
        self.handlers.set_granted(Arc::new(handler));
        self
    }

    /// Validate and freeze the definition.
    ///
    /// Every guard's denial handler must exist, and sentinel-based guards
    /// need an attachment rule.
    pub fn build(self) -> Result<ControllerDefinition<C>> {
        for guard in &self.guards {
            if !self.handlers.has_denied(guard.denial_handler()) {
                return Err(Error::UnknownDenialHandler {
                    controller: self.name,
                    handler: guard.denial_handler().to_string(),
                });
            }
            if guard.check().needs_sentinel() && self.rule.is_none() {
                return Err(Error::MissingAttachmentRule {
                    controller: self.name,
                });
            }
        }

        tracing::debug!(
            controller = %self.name,
            guards = self.guards.len(),
            "controller definition built"
        );

        Ok(ControllerDefinition {
            name: self.name,
            rule: self.rule,
            guards: self.guards,
            handlers: self.handlers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Request;
    use policy::{Attributes, Policy};

    struct Nobody;

    impl Policy for Nobody {
        fn name(&self) -> &str {
            "NobodySentinel"
        }

        fn declares(&self, attribute: &str) -> bool {
            attribute == "current_user"
        }
    }

    fn nobody(_: &Request) -> Result<Sentinel> {
        Ok(Sentinel::new(Nobody, Attributes::new())?)
    }

    #[test]
    fn unknown_denial_handler_fails_at_build() {
        let err = ControllerDefinition::<Request>::builder("PostsController")
            .controls_access_with(nobody)
            .grants_access_to_with(Capability::Read, ActionFilter::only(["show"]), "login")
            .build()
            .unwrap_err();

        assert!(matches!(
            err,
            Error::UnknownDenialHandler { ref controller, ref handler }
                if controller == "PostsController" && handler == "login"
        ));
    }

    #[test]
    fn handler_registered_later_in_the_chain_is_accepted() {
        let definition = ControllerDefinition::<Request>::builder("PostsController")
            .controls_access_with(nobody)
            .grants_access_to_with(Capability::Read, ActionFilter::only(["show"]), "login")
            .on_denied_with("login", |_: &mut Request| {})
            .build()
            .unwrap();

        assert_eq!(definition.guards().len(), 1);
        assert!(definition.handlers().has_denied(&"login".into()));
    }

    #[test]
    fn capability_guard_requires_rule() {
        let err = ControllerDefinition::<Request>::builder("PostsController")
            .grants_access_to(Capability::Index, ActionFilter::All)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::MissingAttachmentRule { .. }));
    }

    #[test]
    fn context_guard_needs_no_rule() {
        let definition = ControllerDefinition::<Request>::builder("HealthController")
            .grants_access_when(ActionFilter::All, |req: &Request| req.action() == "ping")
            .build()
            .unwrap();
        assert!(!definition.has_attachment_rule());
    }

    #[test]
    fn extend_copies_then_diverges() {
        let parent = ControllerDefinition::<Request>::builder("ApplicationController")
            .controls_access_with(nobody)
            .grants_access_to(Capability::Index, ActionFilter::only(["index"]))
            .build()
            .unwrap();

        let child = parent
            .extend("AdminController")
            .grants_access_to(Capability::Destroy, ActionFilter::only(["destroy"]))
            .on_denied_with("redirect", |_: &mut Request| {})
            .build()
            .unwrap();

        assert_eq!(parent.guards().len(), 1);
        assert_eq!(child.guards().len(), 2);
        assert!(child.has_attachment_rule());
        assert!(child.handlers().has_denied(&"redirect".into()));
        assert!(!parent.handlers().has_denied(&"redirect".into()));
    }

    #[test]
    fn sentinel_runs_the_rule() {
        let definition = ControllerDefinition::<Request>::builder("PostsController")
            .controls_access_with(nobody)
            .build()
            .unwrap();
        let sentinel = definition.sentinel(&Request::new("index")).unwrap();
        assert_eq!(sentinel.name(), "NobodySentinel");

        let bare = ControllerDefinition::<Request>::builder("BareController")
            .build()
            .unwrap();
        assert!(matches!(
            bare.sentinel(&Request::new("index")),
            Err(Error::MissingAttachmentRule { .. })
        ));
    }
}
