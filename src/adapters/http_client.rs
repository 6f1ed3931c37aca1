use async_trait::async_trait;
use axum::body::Body as AxumBody;
use hyper::{Request, Response, Version};
use hyper_rustls::HttpsConnector;
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::TokioExecutor,
};
use rustls_native_certs::load_native_certs;

use crate::ports::http_client::{HttpClient, HttpClientError, HttpClientResult};

/// Upstream transport using Hyper with Rustls.
///
/// Responsibilities:
/// * Picks plain TCP or TLS from the request URI scheme
/// * Forces request version to HTTP/1.1
/// * Converts between Hyper body and Axum body types
///
/// Requests are relayed untouched otherwise: headers (including `Host`) are
/// sent as given, no defaults are added and nothing is retried.
pub struct HttpClientAdapter {
    client: Client<HttpsConnector<HttpConnector>, AxumBody>,
}

impl HttpClientAdapter {
    /// Create a new HTTP client adapter trusting the platform's root certificates.
    ///
    /// Certificates that fail to load are skipped with a warning; https
    /// targets signed by them will then fail per request.
    pub fn new() -> Self {
        // Install default crypto provider for rustls if not already set
        let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

        let mut http_connector = HttpConnector::new();
        http_connector.enforce_http(false); // Allow HTTPS URLs

        let mut root_cert_store = rustls::RootCertStore::empty();
        let native_certs = load_native_certs();

        for cert in native_certs.certs {
            if root_cert_store.add(cert).is_err() {
                tracing::warn!("Failed to add native certificate to rustls RootCertStore");
            }
        }
        tracing::debug!("Loaded {} native root certificates.", root_cert_store.len());

        if !native_certs.errors.is_empty() {
            tracing::warn!(
                "Some native certificates failed to load: {:?}",
                native_certs.errors
            );
        }

        let tls_config = rustls::ClientConfig::builder()
            .with_root_certificates(root_cert_store)
            .with_no_client_auth();

        let https_connector = hyper_rustls::HttpsConnectorBuilder::new()
            .with_tls_config(tls_config)
            .https_or_http()
            .enable_http1()
            .wrap_connector(http_connector);

        let client = Client::builder(TokioExecutor::new()).build::<_, AxumBody>(https_connector);

        tracing::debug!("Created upstream HTTP client");
        Self { client }
    }
}

impl Default for HttpClientAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for HttpClientAdapter {
    async fn send_request(
        &self,
        mut req: Request<AxumBody>,
    ) -> HttpClientResult<Response<AxumBody>> {
        if req.uri().scheme().is_none() || req.uri().host().is_none() {
            return Err(HttpClientError::InvalidRequest(format!(
                "Outgoing URI must be absolute: {}",
                req.uri()
            )));
        }
        *req.version_mut() = Version::HTTP_11;

        tracing::debug!("Outgoing request headers: {:?}", req.headers());

        let method_for_error_log = req.method().clone();
        let uri_for_error_log = req.uri().clone();

        match self.client.request(req).await {
            Ok(response) => {
                let (parts, hyper_body) = response.into_parts();
                Ok(Response::from_parts(parts, AxumBody::new(hyper_body)))
            }
            Err(e) => Err(HttpClientError::ConnectionError(format!(
                "Request to {method_for_error_log} {uri_for_error_log} failed: {e}"
            ))),
        }
    }
}
