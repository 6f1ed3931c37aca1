//! Per-instance proxy façade.
//!
//! `ProxyService` ties the pieces together: the target is resolved once at
//! build time and shared read-only; each call to [`ProxyService::handle`] owns
//! its request and response outright, so concurrent invocations never see one
//! another's data. Dropping the future returned by `handle` (for example when
//! the caller disconnects) aborts the upstream transfer and discards any
//! partially buffered body before the intercept hook is reached.
use std::sync::Arc;

use axum::body::Body as AxumBody;
use hyper::{Request, Response};

use crate::{
    adapters::HttpClientAdapter,
    config::models::{BodyLimits, ProxyConfig},
    core::{
        exchange::{ProxyRequest, StagedStatus},
        forwarder::RequestForwarder,
        hooks::{HookSet, Interceptor, RequestDecorator},
        pipeline::ResponsePipeline,
        target::TargetDescriptor,
    },
    error::{ConfigError, ProxyResult},
    ports::http_client::HttpClient,
};

/// A configured reverse proxy bound to one upstream target.
#[derive(Clone)]
pub struct ProxyService {
    target: Arc<TargetDescriptor>,
    hooks: HookSet,
    forwarder: RequestForwarder,
    pipeline: ResponsePipeline,
    limits: BodyLimits,
}

impl ProxyService {
    /// Start configuring a proxy for `target` (bare hostname or full URL).
    pub fn builder(target: impl Into<String>) -> ProxyServiceBuilder {
        ProxyServiceBuilder::new(target)
    }

    /// Build a proxy from loaded configuration, with no hooks.
    pub fn from_config(config: &ProxyConfig) -> Result<Self, ConfigError> {
        Self::builder(config.target.clone())
            .limits(config.limits.clone())
            .build()
    }

    pub fn target(&self) -> &TargetDescriptor {
        &self.target
    }

    /// Forward one inbound request and produce the response for the caller.
    ///
    /// # Errors
    /// * [`ProxyError::Connection`](crate::error::ProxyError::Connection) when the upstream cannot be reached
    /// * [`ProxyError::Intercept`](crate::error::ProxyError::Intercept) when the intercept hook fails
    /// * [`ProxyError::BodyTooLarge`](crate::error::ProxyError::BodyTooLarge) when a buffering ceiling is hit
    pub async fn handle(&self, req: Request<AxumBody>) -> ProxyResult<Response<AxumBody>> {
        let staged = req.extensions().get::<StagedStatus>().copied();

        let inbound = ProxyRequest::from_request(req, self.limits.max_request_body_bytes).await?;
        let upstream = self
            .forwarder
            .forward(inbound.clone(), &self.target, &self.hooks)
            .await?;

        self.pipeline
            .process(upstream, &inbound, staged, &self.hooks)
            .await
    }
}

impl std::fmt::Debug for ProxyService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyService")
            .field("target", &self.target)
            .field("hooks", &self.hooks)
            .field("limits", &self.limits)
            .finish()
    }
}

/// Builder for [`ProxyService`]
pub struct ProxyServiceBuilder {
    target: String,
    hooks: HookSet,
    limits: BodyLimits,
    client: Option<Arc<dyn HttpClient>>,
}

impl ProxyServiceBuilder {
    fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            hooks: HookSet::new(),
            limits: BodyLimits::default(),
            client: None,
        }
    }

    /// Rewrite each outbound request before it is sent
    pub fn decorate(mut self, decorator: impl RequestDecorator) -> Self {
        self.hooks = self.hooks.with_decorator(decorator);
        self
    }

    /// Replace each buffered response body before it is delivered
    pub fn intercept(mut self, interceptor: impl Interceptor) -> Self {
        self.hooks = self.hooks.with_interceptor(interceptor);
        self
    }

    /// Set the buffering ceilings
    pub fn limits(mut self, limits: BodyLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Use a specific transport instead of the default hyper client
    pub fn client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Resolve the target and assemble the service.
    ///
    /// Fails with [`ConfigError`] for an invalid target; this is the only
    /// point where target problems can surface.
    pub fn build(self) -> Result<ProxyService, ConfigError> {
        let target = TargetDescriptor::resolve(&self.target)?;

        let client = match self.client {
            Some(client) => client,
            None => Arc::new(HttpClientAdapter::new()),
        };

        tracing::info!("Proxy configured for target {}", target);

        Ok(ProxyService {
            target: Arc::new(target),
            hooks: self.hooks,
            forwarder: RequestForwarder::new(client, self.limits.max_response_body_bytes),
            pipeline: ResponsePipeline::new(),
            limits: self.limits,
        })
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use bytes::Bytes;
    use hyper::{Method, StatusCode, header};

    use super::*;
    use crate::{
        core::hooks::intercept_fn, error::ProxyError,
        ports::http_client::mock::RecordingClient,
    };

    #[test]
    fn test_build_rejects_invalid_target() {
        let client = Arc::new(RecordingClient::responding(StatusCode::OK, ""));
        let err = ProxyService::builder("")
            .client(client.clone())
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::EmptyTarget));

        let err = ProxyService::builder("gopher://example.com")
            .client(client)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedScheme { .. }));
    }

    #[test]
    fn test_build_resolves_target_once() {
        let proxy = ProxyService::builder("HTTPBIN.org:443")
            .client(Arc::new(RecordingClient::responding(StatusCode::OK, "")))
            .build()
            .unwrap();
        assert_eq!(proxy.target().to_string(), "http://httpbin.org:443");
        assert_eq!(proxy.target().port(), 443);
    }

    #[tokio::test]
    async fn test_handle_end_to_end_with_hooks() {
        let client = Arc::new(
            RecordingClient::responding(StatusCode::OK, "<h1>Oh</h1>")
                .with_header("content-type", "text/html"),
        );
        let proxy = ProxyService::builder("httpbin.org")
            .client(client.clone())
            .decorate(|mut req: ProxyRequest| {
                req.path = "/html".to_string();
                req
            })
            .intercept(intercept_fn(|body, req, _res| {
                // The hook sees the request as the caller sent it
                assert_eq!(req.path, "/page");
                let text = String::from_utf8_lossy(&body).replace("Oh", "<strong>Hey</strong>");
                Ok(Bytes::from(text))
            }))
            .build()
            .unwrap();

        let req = Request::builder()
            .method(Method::GET)
            .uri("/page")
            .body(AxumBody::empty())
            .unwrap();
        let response = proxy.handle(req).await.unwrap();

        assert_eq!(client.recorded()[0].uri.to_string(), "http://httpbin.org/html");
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/html");
        let declared = response.headers()[header::CONTENT_LENGTH].clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body, "<h1><strong>Hey</strong></h1>");
        assert_eq!(declared, body.len().to_string().as_str());
    }

    #[tokio::test]
    async fn test_handle_rejects_oversized_request_body() {
        let client = Arc::new(RecordingClient::responding(StatusCode::OK, ""));
        let proxy = ProxyService::builder("httpbin.org")
            .client(client.clone())
            .limits(BodyLimits {
                max_request_body_bytes: 4,
                ..BodyLimits::default()
            })
            .build()
            .unwrap();

        let req = Request::builder()
            .method(Method::POST)
            .uri("/post")
            .body(AxumBody::from("too large"))
            .unwrap();
        let err = proxy.handle(req).await.unwrap_err();

        assert!(matches!(err, ProxyError::BodyTooLarge { .. }));
        assert!(client.recorded().is_empty());
    }

    #[tokio::test]
    async fn test_staged_status_extension() {
        let client = Arc::new(RecordingClient::responding(StatusCode::OK, "{}"));
        let proxy = ProxyService::builder("httpbin.org")
            .client(client)
            .build()
            .unwrap();

        let mut req = Request::builder()
            .uri("/get")
            .body(AxumBody::empty())
            .unwrap();
        req.extensions_mut()
            .insert(StagedStatus(StatusCode::IM_A_TEAPOT));

        let response = proxy.handle(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
    }
}
