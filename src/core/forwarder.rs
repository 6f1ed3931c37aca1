//! Builds the outbound request, sends it once, and buffers the reply.
use std::sync::Arc;

use axum::body::Body as AxumBody;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::{Request, Response, Version, header, header::HeaderValue};
use tracing::Instrument;

use crate::{
    core::{
        exchange::{ProxyRequest, ProxyResponse, UpstreamResponse, strip_hop_by_hop_headers},
        hooks::HookSet,
        target::TargetDescriptor,
    },
    error::{BodySide, ProxyError, ProxyResult},
    ports::http_client::HttpClient,
    tracing_setup::create_upstream_span,
};

/// Sends a (possibly decorated) request to the target and returns the complete
/// upstream response.
///
/// Exactly one attempt is made per call; transport failures are reported as
/// [`ProxyError::Connection`] without retrying.
#[derive(Clone)]
pub struct RequestForwarder {
    client: Arc<dyn HttpClient>,
    max_response_body_bytes: usize,
}

impl RequestForwarder {
    pub fn new(client: Arc<dyn HttpClient>, max_response_body_bytes: usize) -> Self {
        Self {
            client,
            max_response_body_bytes,
        }
    }

    /// Decorate, transmit and buffer.
    ///
    /// # Arguments
    /// * `request` - The outbound request, copied from the inbound one
    /// * `target` - Where to send it
    /// * `hooks` - The decoration hook (if any) is applied once here
    ///
    /// # Returns
    /// The upstream status, headers and full body
    pub async fn forward(
        &self,
        request: ProxyRequest,
        target: &TargetDescriptor,
        hooks: &HookSet,
    ) -> ProxyResult<UpstreamResponse> {
        let request = hooks.decorate(request);
        let outbound = Self::build_outbound(request, target)?;

        let span = create_upstream_span(
            &target.to_string(),
            outbound.method().as_str(),
            outbound.uri().path(),
        );

        async {
            tracing::debug!("Forwarding {} {}", outbound.method(), outbound.uri());

            let response = self.client.send_request(outbound).await.map_err(|e| {
                tracing::debug!("Upstream request to {} failed: {}", target, e);
                ProxyError::from(e)
            })?;

            tracing::Span::current().record("http.status_code", response.status().as_u16());
            self.buffer(response).await
        }
        .instrument(span)
        .await
    }

    /// Address the request at `target` and make it valid for the wire.
    fn build_outbound(
        request: ProxyRequest,
        target: &TargetDescriptor,
    ) -> ProxyResult<Request<AxumBody>> {
        let uri = target
            .uri_for(&request.path)
            .map_err(|e| ProxyError::InvalidRequest(format!("path '{}': {e}", request.path)))?;

        let mut headers = request.headers;
        strip_hop_by_hop_headers(&mut headers);

        let host = HeaderValue::from_str(&target.authority())
            .map_err(|e| ProxyError::InvalidRequest(format!("host header: {e}")))?;
        headers.insert(header::HOST, host);

        // The body may have been replaced by the decorator
        headers.remove(header::CONTENT_LENGTH);
        let body = match request.body {
            Some(body) => {
                headers.insert(header::CONTENT_LENGTH, HeaderValue::from(body.len()));
                AxumBody::from(body)
            }
            None => AxumBody::empty(),
        };

        let mut outbound = Request::new(body);
        *outbound.method_mut() = request.method;
        *outbound.uri_mut() = uri;
        *outbound.version_mut() = Version::HTTP_11;
        *outbound.headers_mut() = headers;
        Ok(outbound)
    }

    /// Collect the upstream body in full, bounded by the response ceiling.
    async fn buffer(&self, response: Response<AxumBody>) -> ProxyResult<UpstreamResponse> {
        let (mut parts, body) = response.into_parts();

        let collected = Limited::new(body, self.max_response_body_bytes)
            .collect()
            .await
            .map_err(|e| {
                if e.downcast_ref::<LengthLimitError>().is_some() {
                    tracing::debug!(
                        "Upstream body exceeded {} bytes, aborting",
                        self.max_response_body_bytes
                    );
                    ProxyError::BodyTooLarge {
                        side: BodySide::Response,
                        limit: self.max_response_body_bytes,
                    }
                } else {
                    tracing::debug!("Upstream body transfer failed: {}", e);
                    ProxyError::Connection(format!("body transfer failed: {e}"))
                }
            })?;

        // The body is re-framed when it is delivered
        strip_hop_by_hop_headers(&mut parts.headers);

        Ok(ProxyResponse::new(
            parts.status,
            parts.headers,
            collected.to_bytes(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use bytes::Bytes;
    use hyper::{Method, StatusCode};

    use super::*;
    use crate::ports::http_client::mock::RecordingClient;

    fn target() -> TargetDescriptor {
        TargetDescriptor::resolve("httpbin.org").unwrap()
    }

    #[tokio::test]
    async fn test_forward_addresses_target() {
        let client = Arc::new(RecordingClient::responding(StatusCode::OK, "{}"));
        let forwarder = RequestForwarder::new(client.clone(), 1024);

        let mut request = ProxyRequest::new(Method::GET, "/get?show=1");
        request
            .headers
            .insert(header::USER_AGENT, "node-superagent/1.0".parse().unwrap());

        let response = forwarder
            .forward(request, &target(), &HookSet::new())
            .await
            .unwrap();
        assert_eq!(response.status, StatusCode::OK);

        let recorded = client.recorded();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].uri.to_string(), "http://httpbin.org/get?show=1");
        assert_eq!(recorded[0].headers[header::HOST], "httpbin.org");
        assert_eq!(
            recorded[0].headers[header::USER_AGENT],
            "node-superagent/1.0"
        );
        assert!(!recorded[0].headers.contains_key(header::CONTENT_LENGTH));
    }

    #[tokio::test]
    async fn test_decorator_runs_once_and_is_sent() {
        let client = Arc::new(RecordingClient::responding(StatusCode::OK, "{}"));
        let forwarder = RequestForwarder::new(client.clone(), 1024);
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let hooks = HookSet::new().with_decorator(move |mut req: ProxyRequest| {
            counter.fetch_add(1, Ordering::SeqCst);
            req.method = Method::POST;
            req.path = "/ip".to_string();
            req.with_body("data")
        });

        forwarder
            .forward(ProxyRequest::new(Method::GET, "/user-agent"), &target(), &hooks)
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let recorded = client.recorded();
        assert_eq!(recorded[0].method, Method::POST);
        assert_eq!(recorded[0].uri.path(), "/ip");
        assert_eq!(recorded[0].body, Bytes::from_static(b"data"));
        assert_eq!(recorded[0].headers[header::CONTENT_LENGTH], "4");
    }

    #[tokio::test]
    async fn test_stale_content_length_is_recomputed() {
        let client = Arc::new(RecordingClient::responding(StatusCode::OK, ""));
        let forwarder = RequestForwarder::new(client.clone(), 1024);

        let request = ProxyRequest::new(Method::PUT, "/put")
            .with_header(header::CONTENT_LENGTH, HeaderValue::from(999usize))
            .with_body(r#"{"mypost":"hello"}"#);

        forwarder
            .forward(request, &target(), &HookSet::new())
            .await
            .unwrap();

        let recorded = client.recorded();
        assert_eq!(recorded[0].headers[header::CONTENT_LENGTH], "18");
        assert_eq!(recorded[0].body, r#"{"mypost":"hello"}"#);
    }

    #[tokio::test]
    async fn test_connection_failure_is_single_attempt() {
        let client = Arc::new(RecordingClient::refusing());
        let forwarder = RequestForwarder::new(client.clone(), 1024);

        let err = forwarder
            .forward(ProxyRequest::new(Method::GET, "/get"), &target(), &HookSet::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ProxyError::Connection(_)));
        assert_eq!(client.recorded().len(), 1);
    }

    #[tokio::test]
    async fn test_response_is_buffered_and_reframed() {
        let client = Arc::new(
            RecordingClient::responding(StatusCode::NOT_FOUND, "missing")
                .with_header("transfer-encoding", "chunked")
                .with_header("set-cookie", "a=1; Path=/")
                .with_header("set-cookie", "b=2; Path=/"),
        );
        let forwarder = RequestForwarder::new(client, 1024);

        let response = forwarder
            .forward(ProxyRequest::new(Method::GET, "/missing"), &target(), &HookSet::new())
            .await
            .unwrap();

        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(response.body, "missing");
        assert!(!response.headers.contains_key(header::TRANSFER_ENCODING));
        let cookies: Vec<_> = response.headers.get_all(header::SET_COOKIE).iter().collect();
        assert_eq!(cookies, vec!["a=1; Path=/", "b=2; Path=/"]);
    }

    #[tokio::test]
    async fn test_response_ceiling() {
        let client = Arc::new(RecordingClient::responding(StatusCode::OK, vec![b'x'; 64]));
        let forwarder = RequestForwarder::new(client, 16);

        let err = forwarder
            .forward(ProxyRequest::new(Method::GET, "/bytes"), &target(), &HookSet::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ProxyError::BodyTooLarge {
                side: BodySide::Response,
                limit: 16
            }
        ));
    }
}
