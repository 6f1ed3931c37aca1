//! Failure taxonomy for the proxy.
//!
//! Errors fall into two groups:
//! * [`ConfigError`] is raised while a proxy is being configured (target
//!   resolution) and never on the request path.
//! * [`ProxyError`] is raised per request and is surfaced to the host through
//!   its [`IntoResponse`] implementation. Nothing from the upstream response is
//!   written once one of these has been produced.
use axum::{
    body::Body as AxumBody,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::ports::http_client::HttpClientError;

/// Boxed error accepted from user supplied hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while configuring a proxy instance.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ConfigError {
    /// The target specification was empty or whitespace only
    #[error("Target specification is empty")]
    EmptyTarget,

    /// The target specification could not be parsed into a host
    #[error("Invalid target '{spec}': {reason}")]
    InvalidTarget { spec: String, reason: String },

    /// The target used a scheme other than http or https
    #[error("Unsupported scheme '{scheme}' in target '{spec}', expected http or https")]
    UnsupportedScheme { spec: String, scheme: String },
}

/// Failure reported by an intercept hook.
#[derive(Error, Debug)]
#[error("Intercept hook failed: {source}")]
pub struct InterceptError {
    source: BoxError,
}

impl InterceptError {
    /// Wrap any error (or a plain message) reported by a hook.
    pub fn new(source: impl Into<BoxError>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

impl From<serde_json::Error> for InterceptError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(err)
    }
}

/// Which side of the exchange overflowed its buffering limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodySide {
    Request,
    Response,
}

impl std::fmt::Display for BodySide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BodySide::Request => f.write_str("request"),
            BodySide::Response => f.write_str("response"),
        }
    }
}

/// Per-request failures.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ProxyError {
    /// The upstream was unreachable or the transfer failed part way
    #[error("Upstream connection failed: {0}")]
    Connection(String),

    /// The intercept hook reported a failure
    #[error(transparent)]
    Intercept(#[from] InterceptError),

    /// A body exceeded the configured buffering ceiling
    #[error("The {side} body exceeds the {limit} byte buffering limit")]
    BodyTooLarge { side: BodySide, limit: usize },

    /// The (possibly decorated) request could not be sent as valid HTTP
    #[error("Invalid outbound request: {0}")]
    InvalidRequest(String),

    /// The inbound body could not be read from the caller
    #[error("Failed to read inbound request body: {0}")]
    InboundBody(String),
}

/// Result type for per-request proxy operations
pub type ProxyResult<T> = Result<T, ProxyError>;

impl From<HttpClientError> for ProxyError {
    fn from(err: HttpClientError) -> Self {
        match err {
            HttpClientError::InvalidRequest(msg) => ProxyError::InvalidRequest(msg),
            other => ProxyError::Connection(other.to_string()),
        }
    }
}

impl ProxyError {
    /// Status code reported to the caller for this failure.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::Connection(_) => StatusCode::BAD_GATEWAY,
            ProxyError::BodyTooLarge {
                side: BodySide::Request,
                ..
            } => StatusCode::PAYLOAD_TOO_LARGE,
            ProxyError::BodyTooLarge {
                side: BodySide::Response,
                ..
            } => StatusCode::BAD_GATEWAY,
            ProxyError::InboundBody(_) => StatusCode::BAD_REQUEST,
            ProxyError::Intercept(_) | ProxyError::InvalidRequest(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut response = Response::new(AxumBody::from(self.to_string()));
        *response.status_mut() = status;
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        response
    }
}
