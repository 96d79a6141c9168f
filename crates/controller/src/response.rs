use crate::Format;
use http::StatusCode;

/// Body of the default denial response for HTML requests.
pub const UNAUTHORIZED_MESSAGE: &str =
    "You do not have the proper privileges to access this page.";

/// A rendered response handed back to the host framework.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: String,
}

impl Response {
    /// An HTML response with the given body.
    pub fn html(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: Some("text/html; charset=utf-8".to_string()),
            body: body.into(),
        }
    }

    /// A response with a status code and no body.
    pub fn head(status: StatusCode) -> Self {
        Self {
            status,
            content_type: None,
            body: String::new(),
        }
    }

    /// The default denial: a 401 page for HTML, an empty 401 otherwise.
    pub fn unauthorized(format: &Format) -> Self {
        match format {
            Format::Html => Self::html(StatusCode::UNAUTHORIZED, UNAUTHORIZED_MESSAGE),
            Format::Other(_) => Self::head(StatusCode::UNAUTHORIZED),
        }
    }
}
