use std::sync::Arc;

use axum::{
    Router,
    extract::{Request, State},
    middleware,
    response::{IntoResponse, Response},
};

use crate::{adapters::middleware::request_timing_middleware, core::ProxyService};

/// Attaches a [`ProxyService`] to an axum application.
///
/// Every request that reaches this handler is forwarded; routing decisions
/// (which paths get proxied) belong to the host router it is mounted in.
#[derive(Clone)]
pub struct HttpHandler {
    proxy: Arc<ProxyService>,
}

impl HttpHandler {
    pub fn new(proxy: Arc<ProxyService>) -> Self {
        Self { proxy }
    }

    /// Proxy a request, turning failures into an error response.
    pub async fn handle_request(&self, req: Request) -> Response {
        let method = req.method().clone();
        let path = req.uri().path().to_string();

        match self.proxy.handle(req).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("Proxying {} {} failed: {}", method, path, e);
                e.into_response()
            }
        }
    }

    /// A router whose fallback proxies every request.
    pub fn router(self) -> Router {
        Router::new()
            .fallback(proxy_handler)
            .with_state(self)
            .layer(middleware::from_fn(request_timing_middleware))
    }
}

async fn proxy_handler(State(handler): State<HttpHandler>, req: Request) -> Response {
    handler.handle_request(req).await
}

/// Convenience for `HttpHandler::new(proxy).router()`.
pub fn proxy_router(proxy: Arc<ProxyService>) -> Router {
    HttpHandler::new(proxy).router()
}
