//! Relay - an embeddable intercepting HTTP reverse proxy.
//!
//! Relay forwards requests received by a host application (axum) to a single
//! upstream target and relays the reply back. Two optional hooks let you
//! rewrite traffic:
//!
//! - **Decoration** rewrites the outbound request (method, path, headers,
//!   body) before it is sent.
//! - **Interception** replaces the response body after it has been buffered
//!   in full, and may adjust status or headers on the way.
//!
//! Everything else is relayed transparently: query strings, cookies,
//! `Set-Cookie`, status codes and headers. `Content-Length` is recomputed when
//! a hook replaces a body.
//!
//! # Quick Example
//! ```no_run
//! use std::sync::Arc;
//!
//! use bytes::Bytes;
//! use relay::{ProxyService, adapters::proxy_router, core::intercept_fn};
//!
//! # #[tokio::main] async fn main() -> eyre::Result<()> {
//! let proxy = ProxyService::builder("httpbin.org")
//!     .intercept(intercept_fn(|body, _req, _res| {
//!         let text = String::from_utf8_lossy(&body).replace("Oh", "<strong>Hey</strong>");
//!         Ok(Bytes::from(text))
//!     }))
//!     .build()?;
//!
//! let app = proxy_router(Arc::new(proxy));
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//! axum::serve(listener, app).await?;
//! # Ok(()) }
//! ```
//!
//! # Architecture
//! The crate separates **ports** (traits) from **adapters** (implementations)
//! while keeping the forwarding logic inside `core`:
//! - `core::target` resolves the configured destination once
//! - `core::forwarder` decorates, sends and buffers
//! - `core::pipeline` applies status precedence and interception
//! - `adapters::http_client` is the hyper/rustls transport
//! - `adapters::http_handler` mounts a proxy into an axum router
//!
//! # Error Handling
//! Setup errors are [`error::ConfigError`] and never occur per request.
//! Per-request failures are [`error::ProxyError`], which implements
//! `IntoResponse` so the host can surface it. No request is ever retried.
//!
//! # Buffering
//! Interception requires the whole upstream body in memory. Bodies larger than
//! [`config::BodyLimits::max_response_body_bytes`] are rejected rather than
//! truncated.
pub mod config;
pub mod error;
pub mod ports;
pub mod tracing_setup;
pub mod utils;

pub mod adapters;
pub mod core;

// Re-export the specific types needed by embedders and the binary crate
pub use crate::{
    adapters::{HttpClientAdapter, HttpHandler},
    core::{ProxyRequest, ProxyResponse, ProxyService, StagedStatus, TargetDescriptor},
    error::{ConfigError, InterceptError, ProxyError},
    ports::http_client::HttpClient,
};
