//! Per-invocation views of the request being forwarded and the response being
//! assembled.
//!
//! Both types are owned values that are moved through a single invocation;
//! nothing here is shared between concurrent requests. Headers use
//! [`HeaderMap`], which gives case-insensitive unique names, insertion ordered
//! iteration and multiple values per name (needed for `Set-Cookie`).
use axum::body::{Body as AxumBody, to_bytes};
use bytes::Bytes;
use hyper::{HeaderMap, Method, Request, Response, StatusCode, header};

use crate::error::{BodySide, ProxyError, ProxyResult};

/// Status staged by the host before the proxy runs.
///
/// Host middleware inserts this as a request extension; when present it takes
/// precedence over the upstream status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StagedStatus(pub StatusCode);

/// The outbound request as seen by the decoration hook.
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    pub method: Method,
    /// Path plus query string, e.g. `/get?x=1`
    pub path: String,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl ProxyRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Copy method, path, query, headers and body out of an inbound request.
    ///
    /// The body is buffered in full; a body longer than `max_body_bytes`
    /// is rejected with [`ProxyError::BodyTooLarge`].
    pub async fn from_request(req: Request<AxumBody>, max_body_bytes: usize) -> ProxyResult<Self> {
        let (parts, body) = req.into_parts();

        let bytes = to_bytes(body, max_body_bytes).await.map_err(|e| {
            if is_length_limit(&e) {
                ProxyError::BodyTooLarge {
                    side: BodySide::Request,
                    limit: max_body_bytes,
                }
            } else {
                ProxyError::InboundBody(e.to_string())
            }
        })?;

        let path = parts
            .uri
            .path_and_query()
            .map_or_else(|| "/".to_string(), |pq| pq.as_str().to_string());

        Ok(Self {
            method: parts.method,
            path,
            headers: parts.headers,
            body: (!bytes.is_empty()).then_some(bytes),
        })
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_header(mut self, name: header::HeaderName, value: header::HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// The response under construction, handed to the intercept hook.
#[derive(Debug, Clone)]
pub struct ProxyResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// A complete upstream reply; the body has already been received in full.
pub type UpstreamResponse = ProxyResponse;

impl ProxyResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// Replace the body and make `Content-Length` agree with it.
    pub fn replace_body(&mut self, body: Bytes) {
        self.headers
            .insert(header::CONTENT_LENGTH, header::HeaderValue::from(body.len()));
        self.body = body;
    }

    pub fn into_response(self) -> Response<AxumBody> {
        let mut response = Response::new(AxumBody::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// Headers that describe a single connection and must not be relayed.
const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

fn is_hop_by_hop_header(name: &str) -> bool {
    HOP_BY_HOP_HEADERS
        .iter()
        .any(|hop| hop.eq_ignore_ascii_case(name))
}

/// Remove hop-by-hop headers, including any listed in `Connection`.
pub fn strip_hop_by_hop_headers(headers: &mut HeaderMap) {
    let listed: Vec<String> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(|name| name.trim().to_ascii_lowercase())
        .filter(|name| !name.is_empty())
        .collect();

    let fixed: Vec<_> = headers
        .keys()
        .filter(|name| is_hop_by_hop_header(name.as_str()))
        .cloned()
        .collect();

    for name in listed {
        headers.remove(name.as_str());
    }
    for name in fixed {
        headers.remove(name);
    }
}

fn is_length_limit(err: &axum::Error) -> bool {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(current) = source {
        if current.is::<http_body_util::LengthLimitError>() {
            return true;
        }
        source = current.source();
    }
    false
}
