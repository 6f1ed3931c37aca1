use async_trait::async_trait;
use axum::body::Body as AxumBody;
use hyper::{Request, Response};
use thiserror::Error;

/// Custom error type for upstream transport operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum HttpClientError {
    /// Error when the connection to the upstream fails
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error when the request cannot be sent as-is
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Result type alias for HTTP client operations
pub type HttpClientResult<T> = Result<T, HttpClientError>;

/// HttpClient defines the port (interface) for transmitting a request upstream
#[async_trait]
pub trait HttpClient: Send + Sync + 'static {
    /// Send an HTTP request to the upstream named by its absolute URI
    ///
    /// # Arguments
    /// * `req` - The HTTP request to send, addressed with an absolute URI
    ///
    /// # Returns
    /// A future that resolves to the upstream response head with a streaming
    /// body, or an error if the exchange could not be started
    async fn send_request(&self, req: Request<AxumBody>) -> HttpClientResult<Response<AxumBody>>;
}
