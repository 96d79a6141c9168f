//! Declarative access control for controller actions.
//!
//! A controller declares which actions need which capability. Before an
//! action runs, the dispatcher builds the request's sentinel through the
//! controller's attachment rule, asks it, and runs either the granted
//! handler or a named denial handler.
//!
//! # Overview
//!
//! - [`ControllerDefinition`] / [`ControllerBuilder`]: attachment rule,
//!   guards and handlers of one controller, frozen at startup.
//! - [`Guard`], [`ActionFilter`], [`Check`]: which actions a guard covers
//!   and how it decides.
//! - [`ControllerDefinition::authorize`]: the dispatcher.
//! - [`RequestContext`]: what the host framework provides per request.
//! - [`convention`]: `ArticlesController` → `ArticleSentinel` wiring.
//! - [`permitted_to`]: the template helper.
//!
//! # Example
//!
//! ```
//! use controller::{ActionFilter, ControllerDefinition, Request};
//! use policy::{Attributes, Capability, Policy, Sentinel};
//! use serde_json::json;
//!
//! struct UserSentinel;
//!
//! impl Policy for UserSentinel {
//!     fn name(&self) -> &str {
//!         "UserSentinel"
//!     }
//!
//!     fn declares(&self, attribute: &str) -> bool {
//!         matches!(attribute, "current_user" | "user")
//!     }
//!
//!     fn index(&self, attrs: &Attributes) -> bool {
//!         attrs.get("current_user").is_some_and(|u| u["admin"] == true)
//!     }
//! }
//!
//! let users = ControllerDefinition::builder("UsersController")
//!     .controls_access_with(|req: &Request| {
//!         use controller::RequestContext;
//!         Ok(Sentinel::new(UserSentinel, [("current_user", req.current_user())])?)
//!     })
//!     .grants_access_to(Capability::Index, ActionFilter::only(["index"]))
//!     .build()?;
//!
//! let mut req = Request::new("index").user(json!({"admin": false}));
//! let listed = users.dispatch(&mut req, |_| "all users")?;
//!
//! assert_eq!(listed, None);
//! assert_eq!(req.response().unwrap().status, 401);
//! # Ok::<(), controller::Error>(())
//! ```

pub mod convention;
mod definition;
mod dispatch;
mod error;
mod guard;
mod handler;
mod request;
mod response;
mod view;

pub use convention::SentinelRegistry;
pub use definition::{AttachmentRule, ControllerBuilder, ControllerDefinition};
pub use dispatch::{Evaluation, Outcome};
pub use error::{Error, Result};
pub use guard::{ActionFilter, Check, Guard, Predicate};
pub use handler::{Handler, HandlerName, Handlers};
pub use request::{Format, Request, RequestContext};
pub use response::{Response, UNAUTHORIZED_MESSAGE};
pub use view::permitted_to;
