//! Turns a buffered upstream reply into the response delivered to the caller.
use axum::body::Body as AxumBody;
use hyper::Response;

use crate::{
    core::{
        exchange::{ProxyRequest, StagedStatus, UpstreamResponse},
        hooks::HookSet,
    },
    error::ProxyResult,
};

/// Applies status precedence and the intercept hook.
///
/// Status precedence is fixed: the upstream status is used unless the host
/// staged one, and the intercept hook (if any) sees that value and may still
/// change it. The response is only built once the hook has resolved, so a
/// failing hook leaves nothing written.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponsePipeline;

impl ResponsePipeline {
    pub fn new() -> Self {
        Self
    }

    pub async fn process(
        &self,
        mut response: UpstreamResponse,
        inbound: &ProxyRequest,
        staged: Option<StagedStatus>,
        hooks: &HookSet,
    ) -> ProxyResult<Response<AxumBody>> {
        if let Some(StagedStatus(status)) = staged {
            tracing::debug!(
                "Host staged status {} overrides upstream {}",
                status,
                response.status
            );
            response.status = status;
        }

        if let Some(interceptor) = hooks.interceptor() {
            let upstream_len = response.body.len();
            let body = response.body.clone();
            let replacement = interceptor
                .intercept(body, inbound, &mut response)
                .await
                .inspect_err(|e| tracing::debug!("Aborting response: {}", e))?;

            tracing::debug!(
                "Intercept replaced {} byte body with {} bytes",
                upstream_len,
                replacement.len()
            );
            response.replace_body(replacement);
        }

        Ok(response.into_response())
    }
}
