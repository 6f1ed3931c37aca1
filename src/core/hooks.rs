//! Extension points for rewriting traffic.
//!
//! * [`RequestDecorator`] rewrites the outbound request before it is sent.
//!   It is a pure function: it takes the request by value and returns the one
//!   to send. Any `Fn(ProxyRequest) -> ProxyRequest` closure qualifies.
//! * [`Interceptor`] replaces the fully buffered response body. It is awaited
//!   exactly once per request and yields either the new body or a failure.
//!   Synchronous closures can be adapted with [`intercept_fn`].
use std::{fmt, sync::Arc};

use async_trait::async_trait;
use bytes::Bytes;

use crate::{
    core::exchange::{ProxyRequest, ProxyResponse},
    error::InterceptError,
};

/// Rewrites the outbound request before transmission.
pub trait RequestDecorator: Send + Sync + 'static {
    fn decorate(&self, request: ProxyRequest) -> ProxyRequest;
}

impl<F> RequestDecorator for F
where
    F: Fn(ProxyRequest) -> ProxyRequest + Send + Sync + 'static,
{
    fn decorate(&self, request: ProxyRequest) -> ProxyRequest {
        self(request)
    }
}

/// Replaces the buffered upstream body before it is delivered.
///
/// The body is handed over exactly as the upstream sent it. Compressed
/// bodies are not decoded, and the caller's `Accept-Encoding` is forwarded,
/// so an upstream may answer with e.g. gzip. A hook that parses the body
/// should check `Content-Encoding` on `response`, or pair itself with a
/// decorator that removes `Accept-Encoding` from the outbound request.
#[async_trait]
pub trait Interceptor: Send + Sync + 'static {
    /// Produce the body to deliver.
    ///
    /// # Arguments
    /// * `body` - The complete upstream body
    /// * `request` - The inbound request, before decoration
    /// * `response` - The response being assembled; status and header changes
    ///   made here are delivered as-is
    ///
    /// # Returns
    /// The replacement body, or an [`InterceptError`] to abort the request
    async fn intercept(
        &self,
        body: Bytes,
        request: &ProxyRequest,
        response: &mut ProxyResponse,
    ) -> Result<Bytes, InterceptError>;
}

/// Adapter turning a synchronous closure into an [`Interceptor`].
pub struct FnInterceptor<F>(F);

/// Wrap a synchronous closure as an [`Interceptor`].
pub fn intercept_fn<F>(f: F) -> FnInterceptor<F>
where
    F: Fn(Bytes, &ProxyRequest, &mut ProxyResponse) -> Result<Bytes, InterceptError>
        + Send
        + Sync
        + 'static,
{
    FnInterceptor(f)
}

#[async_trait]
impl<F> Interceptor for FnInterceptor<F>
where
    F: Fn(Bytes, &ProxyRequest, &mut ProxyResponse) -> Result<Bytes, InterceptError>
        + Send
        + Sync
        + 'static,
{
    async fn intercept(
        &self,
        body: Bytes,
        request: &ProxyRequest,
        response: &mut ProxyResponse,
    ) -> Result<Bytes, InterceptError> {
        (self.0)(body, request, response)
    }
}

/// The hooks configured on one proxy instance.
#[derive(Clone, Default)]
pub struct HookSet {
    decorator: Option<Arc<dyn RequestDecorator>>,
    interceptor: Option<Arc<dyn Interceptor>>,
}

impl HookSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_decorator(mut self, decorator: impl RequestDecorator) -> Self {
        self.decorator = Some(Arc::new(decorator));
        self
    }

    pub fn with_interceptor(mut self, interceptor: impl Interceptor) -> Self {
        self.interceptor = Some(Arc::new(interceptor));
        self
    }

    pub fn interceptor(&self) -> Option<&Arc<dyn Interceptor>> {
        self.interceptor.as_ref()
    }

    /// Run the decorator if one is configured; otherwise pass the request through.
    pub fn decorate(&self, request: ProxyRequest) -> ProxyRequest {
        match &self.decorator {
            Some(decorator) => decorator.decorate(request),
            None => request,
        }
    }
}

impl fmt::Debug for HookSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookSet")
            .field("decorator", &self.decorator.is_some())
            .field("interceptor", &self.interceptor.is_some())
            .finish()
    }
}
