//! The host framework's view of one request.

use crate::Response;
use policy::Value;
use std::collections::BTreeMap;

/// Negotiated response format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Format {
    Html,
    Other(String),
}

impl Format {
    /// Negotiate from an `Accept` header.
    ///
    /// The most preferred media type decides: the highest `q`, ties broken
    /// by listing order. HTML types and a leading `*/*` negotiate HTML, as
    /// does an absent or empty header. Types with `q=0` are not acceptable.
    pub fn from_accept(accept: Option<&str>) -> Self {
        let mut types: Vec<(String, f32)> = accept
            .unwrap_or_default()
            .split(',')
            .filter_map(media_range)
            .filter(|(_, quality)| *quality > 0.0)
            .collect();
        // Stable, so equal qualities keep the client's order.
        types.sort_by(|(_, a), (_, b)| b.total_cmp(a));

        match types.into_iter().next() {
            Some((mime, _)) if !is_html_type(&mime) => Format::Other(mime),
            _ => Format::Html,
        }
    }

    pub fn is_html(&self) -> bool {
        matches!(self, Format::Html)
    }
}

/// Media type and quality of one `Accept` entry.
fn media_range(entry: &str) -> Option<(String, f32)> {
    let mut params = entry.split(';');
    let mime = params.next()?.trim().to_ascii_lowercase();
    if mime.is_empty() {
        return None;
    }
    let quality = params
        .filter_map(|param| param.split_once('='))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("q"))
        .and_then(|(_, value)| value.trim().parse::<f32>().ok())
        .unwrap_or(1.0);
    Some((mime, quality))
}

fn is_html_type(mime: &str) -> bool {
    matches!(mime, "text/html" | "application/xhtml+xml" | "*/*")
}

/// What the authorization layer needs from the host for one request.
///
/// Handlers and context predicates receive the implementor, so hosts can
/// expose anything else they need on their own type.
pub trait RequestContext {
    /// Name of the action being dispatched (`index`, `show`, ...).
    fn action(&self) -> &str;

    fn format(&self) -> Format;

    /// The identified actor, `Value::Null` when anonymous.
    fn current_user(&self) -> Value;

    /// A value the controller assigned for this request, such as the
    /// loaded model.
    fn assigned(&self, name: &str) -> Option<Value>;

    fn render(&mut self, response: Response);

    /// Whether a response has already been produced.
    fn performed(&self) -> bool;

    /// Whether the host stops running guards for this request.
    ///
    /// Hosts with "halt once rendered" filter chains return `performed()`.
    fn halted(&self) -> bool {
        false
    }
}

/// In-memory request, for hosts without their own context type and for tests.
#[derive(Debug, Clone, Default)]
pub struct Request {
    action: String,
    format: Option<Format>,
    current_user: Value,
    assigns: BTreeMap<String, Value>,
    response: Option<Response>,
    halt_on_render: bool,
}

impl Request {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            ..Default::default()
        }
    }

    /// Set the format from an `Accept` header.
    pub fn accept(mut self, header: &str) -> Self {
        self.format = Some(Format::from_accept(Some(header)));
        self
    }

    /// Set the identified actor.
    pub fn user(mut self, user: impl Into<Value>) -> Self {
        self.current_user = user.into();
        self
    }

    pub fn assign(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.assigns.insert(name.into(), value.into());
        self
    }

    /// Assign a value after construction, as a handler loading a model would.
    pub fn set_assigned(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.assigns.insert(name.into(), value.into());
    }

    /// Stop evaluating guards once a response is rendered.
    pub fn halt_on_render(mut self, halt: bool) -> Self {
        self.halt_on_render = halt;
        self
    }

    pub fn response(&self) -> Option<&Response> {
        self.response.as_ref()
    }

    pub fn into_response(self) -> Option<Response> {
        self.response
    }
}

impl RequestContext for Request {
    fn action(&self) -> &str {
        &self.action
    }

    fn format(&self) -> Format {
        self.format.clone().unwrap_or(Format::Html)
    }

    fn current_user(&self) -> Value {
        self.current_user.clone()
    }

    fn assigned(&self, name: &str) -> Option<Value> {
        self.assigns.get(name).cloned()
    }

    /// The first rendered response is kept; later renders are ignored.
    fn render(&mut self, response: Response) {
        if self.response.is_some() {
            tracing::debug!(
                action = %self.action,
                status = %response.status,
                "response already rendered"
            );
            return;
        }
        self.response = Some(response);
    }

    fn performed(&self) -> bool {
        self.response.is_some()
    }

    fn halted(&self) -> bool {
        self.halt_on_render && self.performed()
    }
}
