//! Running guards before an action.

use crate::guard::Check;
use crate::{ControllerDefinition, Error, HandlerName, RequestContext, Result};

/// The decision of one guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    /// Index of the guard in registration order.
    pub guard: usize,
    pub check: String,
    pub granted: bool,
    /// Denial handler that ran, if the guard denied.
    pub denied_with: Option<HandlerName>,
}

/// Result of authorizing one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    evaluations: Vec<Evaluation>,
    performed: bool,
    halted: bool,
}

impl Outcome {
    /// Every guard that ran, in order.
    pub fn evaluations(&self) -> &[Evaluation] {
        &self.evaluations
    }

    /// No matching guard denied.
    pub fn granted(&self) -> bool {
        self.evaluations.iter().all(|e| e.granted)
    }

    /// Whether the host stopped the guard chain early.
    pub fn halted(&self) -> bool {
        self.halted
    }

    /// The underlying action should run: nothing denied and no handler
    /// produced a response.
    pub fn proceeds(&self) -> bool {
        self.granted() && !self.performed
    }
}

impl<C: RequestContext + 'static> ControllerDefinition<C> {
    /// Evaluate every guard that matches the current action.
    ///
    /// Guards run in registration order. A denial does not stop later
    /// guards; only the host's halt signal does. Each guard that needs the
    /// sentinel gets a fresh one from the attachment rule, so it sees any
    /// request state changed by earlier handlers.
    pub fn authorize(&self, ctx: &mut C) -> Result<Outcome> {
        let action = ctx.action().to_string();
        let mut evaluations = Vec::new();
        let mut halted = false;

        for (index, guard) in self.guards.iter().enumerate() {
            if !guard.applies_to(&action) {
                continue;
            }

            let granted = match guard.check() {
                Check::Capability(capability) => self.sentinel(ctx)?.permits(capability)?,
                Check::Sentinel(predicate) => predicate(&self.sentinel(ctx)?),
                Check::Context(predicate) => predicate(ctx),
            };

            let label = guard.check().label();
            let denied_with = if granted {
                tracing::debug!(
                    controller = %self.name,
                    %action,
                    check = %label,
                    "access granted"
                );
                (self.handlers.granted())(ctx);
                None
            } else {
                let name = guard.denial_handler();
                tracing::info!(
                    controller = %self.name,
                    %action,
                    check = %label,
                    handler = %name,
                    "access denied"
                );
                let handler = self
                    .handlers
                    .denied(name)
                    .ok_or_else(|| Error::UnknownDenialHandler {
                        controller: self.name.clone(),
                        handler: name.to_string(),
                    })?;
                handler(ctx);
                Some(name.clone())
            };

            evaluations.push(Evaluation {
                guard: index,
                check: label,
                granted,
                denied_with,
            });

            if ctx.halted() {
                halted = true;
                break;
            }
        }

        Ok(Outcome {
            evaluations,
            performed: ctx.performed(),
            halted,
        })
    }

    /// Authorize, then run `action` only if the outcome proceeds.
    ///
    /// Returns the action's value, or `None` when it was not run.
    pub fn dispatch<F, T>(&self, ctx: &mut C, action: F) -> Result<Option<T>>
    where
        F: FnOnce(&mut C) -> T,
    {
        let outcome = self.authorize(ctx)?;
        if outcome.proceeds() {
            Ok(Some(action(ctx)))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::{ActionFilter, Guard};
    use crate::{Request, Response, UNAUTHORIZED_MESSAGE};
    use http::StatusCode;
    use policy::{Attributes, Capability, Policy, Sentinel};
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Grants `read` when the `readable` attribute is true.
    struct PostSentinel;

    impl Policy for PostSentinel {
        fn name(&self) -> &str {
            "PostSentinel"
        }

        fn declares(&self, attribute: &str) -> bool {
            matches!(attribute, "current_user" | "post")
        }

        fn read(&self, attrs: &Attributes) -> bool {
            attrs.get("post").is_some_and(|p| p["readable"] == true)
        }
    }

    fn post_rule(ctx: &Request) -> Result<Sentinel> {
        let post = ctx.assigned("post").unwrap_or_default();
        Ok(Sentinel::new(PostSentinel, [("post", post)])?)
    }

    fn posts() -> ControllerDefinition<Request> {
        ControllerDefinition::builder("PostsController")
            .controls_access_with(post_rule)
            .grants_access_to(Capability::Read, ActionFilter::only(["show"]))
            .build()
            .unwrap()
    }

    #[test]
    fn granted_read_proceeds() {
        let mut req = Request::new("show").assign("post", json!({"readable": true}));
        let outcome = posts().authorize(&mut req).unwrap();

        assert!(outcome.proceeds());
        assert_eq!(outcome.evaluations().len(), 1);
        assert!(req.response().is_none());
    }

    #[test]
    fn denied_read_renders_401_html() {
        let mut req = Request::new("show")
            .accept("text/html")
            .assign("post", json!({"readable": false}));
        let outcome = posts().authorize(&mut req).unwrap();

        assert!(!outcome.proceeds());
        assert_eq!(outcome.evaluations()[0].denied_with, Some(HandlerName::DEFAULT));
        let resp = req.response().unwrap();
        assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
        assert_eq!(resp.body, UNAUTHORIZED_MESSAGE);
    }

    #[test]
    fn denied_read_renders_empty_401_for_json() {
        let mut req = Request::new("show").accept("application/json");
        posts().authorize(&mut req).unwrap();

        let resp = req.response().unwrap();
        assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
        assert!(resp.body.is_empty());
    }

    #[test]
    fn unmatched_action_skips_guard() {
        let mut req = Request::new("index");
        let outcome = posts().authorize(&mut req).unwrap();
        assert!(outcome.evaluations().is_empty());
        assert!(outcome.proceeds());
    }

    #[test]
    fn guards_run_in_order_after_denial() {
        let seen = Arc::new(AtomicUsize::new(0));
        let second = Arc::clone(&seen);

        let definition = ControllerDefinition::<Request>::builder("PostsController")
            .controls_access_with(post_rule)
            .grants_access_to(Capability::Read, ActionFilter::only(["show"]))
            .grants_access_when(ActionFilter::only(["show"]), move |_: &Request| {
                second.fetch_add(1, Ordering::SeqCst);
                true
            })
            .build()
            .unwrap();

        let mut req = Request::new("show");
        let outcome = definition.authorize(&mut req).unwrap();

        assert_eq!(seen.load(Ordering::SeqCst), 1);
        let order: Vec<usize> = outcome.evaluations().iter().map(|e| e.guard).collect();
        assert_eq!(order, vec![0, 1]);
        assert!(!outcome.evaluations()[0].granted);
        assert!(outcome.evaluations()[1].granted);
        assert!(!outcome.proceeds());
        assert!(!outcome.halted());
    }

    #[test]
    fn host_halt_stops_the_chain() {
        let seen = Arc::new(AtomicUsize::new(0));
        let second = Arc::clone(&seen);

        let definition = ControllerDefinition::<Request>::builder("PostsController")
            .controls_access_with(post_rule)
            .grants_access_to(Capability::Read, ActionFilter::All)
            .grants_access_when(ActionFilter::All, move |_: &Request| {
                second.fetch_add(1, Ordering::SeqCst);
                true
            })
            .build()
            .unwrap();

        let mut req = Request::new("show").halt_on_render(true);
        let outcome = definition.authorize(&mut req).unwrap();

        assert_eq!(seen.load(Ordering::SeqCst), 0);
        assert_eq!(outcome.evaluations().len(), 1);
        assert!(outcome.halted());
    }

    #[test]
    fn sentinel_predicate_and_custom_handler() {
        let definition = ControllerDefinition::<Request>::builder("PostsController")
            .controls_access_with(post_rule)
            .guard(
                Guard::new(
                    ActionFilter::except(["index"]),
                    Check::Sentinel(Arc::new(|s: &Sentinel| {
                        s.get("post").is_some_and(|p| !p.is_null())
                    })),
                )
                .denies_with("not_found"),
            )
            .on_denied_with("not_found", |req: &mut Request| {
                req.render(Response::head(StatusCode::NOT_FOUND));
            })
            .build()
            .unwrap();

        let mut req = Request::new("edit");
        definition.authorize(&mut req).unwrap();
        assert_eq!(req.response().unwrap().status, StatusCode::NOT_FOUND);

        let mut req = Request::new("edit").assign("post", json!({"id": 1}));
        assert!(definition.authorize(&mut req).unwrap().proceeds());
    }

    #[test]
    fn granted_handler_can_short_circuit() {
        let definition = ControllerDefinition::<Request>::builder("PostsController")
            .controls_access_with(post_rule)
            .grants_access_to(Capability::Read, ActionFilter::All)
            .with_access(|req: &mut Request| req.render(Response::head(StatusCode::NOT_MODIFIED)))
            .build()
            .unwrap();

        let mut req = Request::new("show").assign("post", json!({"readable": true}));
        let ran = definition.dispatch(&mut req, |_| "body").unwrap();

        assert_eq!(ran, None);
        assert_eq!(req.response().unwrap().status, StatusCode::NOT_MODIFIED);
    }

    #[test]
    fn dispatch_runs_action_when_granted() {
        let mut req = Request::new("show").assign("post", json!({"readable": true}));
        let ran = posts().dispatch(&mut req, |_| "post body").unwrap();
        assert_eq!(ran, Some("post body"));
    }

    #[test]
    fn rule_runs_for_each_guard() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let definition = ControllerDefinition::<Request>::builder("PostsController")
            .controls_access_with(move |ctx: &Request| {
                counter.fetch_add(1, Ordering::SeqCst);
                post_rule(ctx)
            })
            .grants_access_to(Capability::Read, ActionFilter::All)
            .grants_access_to(Capability::Read, ActionFilter::All)
            .grants_access_when(ActionFilter::All, |_: &Request| true)
            .build()
            .unwrap();

        let mut first = Request::new("show");
        definition.authorize(&mut first).unwrap();
        let mut second = Request::new("show");
        definition.authorize(&mut second).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn later_guards_see_state_set_by_granted_handler() {
        let definition = ControllerDefinition::<Request>::builder("PostsController")
            .controls_access_with(post_rule)
            .grants_access_if(ActionFilter::All, |_: &Sentinel| true)
            .grants_access_to(Capability::Read, ActionFilter::All)
            .with_access(|req: &mut Request| {
                req.set_assigned("post", json!({"readable": true}));
            })
            .build()
            .unwrap();

        let mut req = Request::new("show");
        let outcome = definition.authorize(&mut req).unwrap();

        assert_eq!(outcome.evaluations().len(), 2);
        assert!(outcome.proceeds());
    }

    #[test]
    fn unknown_custom_capability_propagates() {
        let definition = ControllerDefinition::<Request>::builder("PostsController")
            .controls_access_with(post_rule)
            .grants_access_to("publish", ActionFilter::All)
            .build()
            .unwrap();

        let err = definition.authorize(&mut Request::new("show")).unwrap_err();
        assert!(matches!(
            err,
            Error::Policy(policy::Error::NoSuchCapability { .. })
        ));
    }
}
