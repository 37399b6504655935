//! Error types shared by the content pipeline and the server.
//!
//! Content fetching distinguishes a missing document from every other
//! failure: the detail page turns the former into a 404 and the latter
//! into a failed generation.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};

/// Errors produced while fetching, normalizing or rendering content
#[derive(Debug, thiserror::Error)]
pub enum BlogError {
    /// Transport, status or authorization failure talking to the content API
    #[error("content fetch failed: {0}")]
    ContentFetch(String),

    /// No document matched the lookup
    #[error("document not found: {0}")]
    NotFound(String),

    /// The content API answered with a body we could not decode
    #[error("invalid content API response: {0}")]
    InvalidResponse(#[from] serde_json::Error),

    /// A raw document is missing data the blog cannot do without
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// A pagination cursor that does not point at the content API
    #[error("invalid cursor: {0}")]
    InvalidCursor(String),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("template error: {0}")]
    Render(#[from] tera::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for BlogError {
    fn from(err: reqwest::Error) -> Self {
        Self::ContentFetch(err.to_string())
    }
}

impl BlogError {
    /// Whether this error means "no such document" rather than a failure
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// HTTP status of a request failing with this error
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidCursor(_) => StatusCode::BAD_REQUEST,
            Self::ContentFetch(_) | Self::InvalidResponse(_) | Self::InvalidDocument(_) => {
                StatusCode::BAD_GATEWAY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type Result<T> = std::result::Result<T, BlogError>;

impl IntoResponse for BlogError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (title, message) = match &self {
            Self::NotFound(_) => (
                "Not Found",
                "This post does not exist or is no longer published.".to_string(),
            ),
            Self::InvalidCursor(msg) => (
                "Bad Request",
                format!("The pagination cursor was rejected: {msg}"),
            ),
            _ if status == StatusCode::BAD_GATEWAY => {
                tracing::error!(error = %self, "content generation failed");
                (
                    "Content Unavailable",
                    "The content service could not be reached. Please try again later."
                        .to_string(),
                )
            }
            _ => {
                tracing::error!(error = %self, "internal error");
                (
                    "Internal Error",
                    "An internal error occurred. Please try again later.".to_string(),
                )
            }
        };

        let body = format!(
            "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\"><title>{title}</title>\
             <meta name=\"robots\" content=\"noindex\"></head>\
             <body><main><h1>{title}</h1><p>{}</p><a href=\"/\">Back home</a></main></body></html>",
            html_escape::encode_text(&message)
        );

        (status, Html(body)).into_response()
    }
}
