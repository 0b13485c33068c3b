//! Per-request orchestration: auth gate → rewrite → forward → sanitize.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    http::{header, Request},
    response::Response,
};
use tracing::{debug, info, warn};

use crate::config::ProxyConfig;
use crate::http::error::ProxyError;
use crate::http::request::{rewrite, UpstreamBase, X_REQUEST_ID};
use crate::http::response::sanitize;
use crate::http::upstream::UpstreamClient;
use crate::observability::metrics;
use crate::security::{unauthorized_response, verify};

/// Handles every inbound request against the single configured upstream.
///
/// Holds only immutable state, so one instance is shared by all connections.
#[derive(Clone)]
pub struct EdgeDispatcher {
    config: Arc<ProxyConfig>,
    base: UpstreamBase,
    upstream: UpstreamClient,
}

impl EdgeDispatcher {
    pub fn new(config: Arc<ProxyConfig>) -> Result<Self, ProxyError> {
        let base = UpstreamBase::parse(&config.upstream.base_url)
            .map_err(|e| ProxyError::InvalidUpstreamRequest(e.to_string()))?;
        let upstream = UpstreamClient::new(&config.upstream)?;

        Ok(Self {
            config,
            base,
            upstream,
        })
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// Run one request through the pipeline.
    ///
    /// A failed credential check yields the 401 challenge as an `Ok` response;
    /// only upstream failures are errors.
    pub async fn handle(&self, request: Request<Body>) -> Result<Response, ProxyError> {
        let start = Instant::now();
        let method = request.method().clone();
        let path = request.uri().path().to_string();
        let request_id = request
            .headers()
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
            .to_string();

        let auth = &self.config.auth;
        let gate_enabled = auth.is_enabled();
        if gate_enabled {
            let header_value = request
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("");

            if let Err(reason) = verify(auth.username.as_deref(), auth.password.as_deref(), header_value) {
                debug!(
                    request_id = %request_id,
                    reason = reason.as_str(),
                    "Credential check failed"
                );
                metrics::record_auth_rejection();
                metrics::record_request(method.as_str(), 401, "rejected", start);
                return Ok(unauthorized_response(&auth.realm));
            }
        }

        let outbound = rewrite(request, &self.base, gate_enabled);

        let response = match self.upstream.send(outbound).await {
            Ok(response) => response,
            Err(e) => {
                warn!(
                    request_id = %request_id,
                    method = %method,
                    path = %path,
                    error = %e,
                    "Upstream error"
                );
                metrics::record_upstream_error(e.kind());
                metrics::record_request(method.as_str(), e.status().as_u16(), "error", start);
                return Err(e);
            }
        };

        let (response, class) = sanitize(response, &self.config.streaming);

        metrics::record_upstream_latency(class.as_str(), start);
        metrics::record_request(method.as_str(), response.status().as_u16(), class.as_str(), start);

        info!(
            request_id = %request_id,
            method = %method,
            path = %path,
            status = response.status().as_u16(),
            class = class.as_str(),
            upstream_latency_ms = start.elapsed().as_millis() as u64,
            "Request proxied"
        );

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn config_with_secret() -> Arc<ProxyConfig> {
        let mut config = ProxyConfig::default();
        // Nothing listens here; the gate must answer before any connect.
        config.upstream.base_url = "http://127.0.0.1:9".into();
        config.auth.password = Some("s3cret".into());
        config.auth.realm = "Edge".into();
        Arc::new(config)
    }

    #[tokio::test]
    async fn rejects_without_contacting_upstream() {
        let dispatcher = EdgeDispatcher::new(config_with_secret()).unwrap();
        let request = Request::builder().uri("/anything").body(Body::empty()).unwrap();

        let response = dispatcher.handle(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Basic realm=\"Edge\"");
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert!(!String::from_utf8_lossy(&body).contains("s3cret"));
    }

    #[tokio::test]
    async fn malformed_header_is_treated_as_unauthorized() {
        let dispatcher = EdgeDispatcher::new(config_with_secret()).unwrap();
        let request = Request::builder()
            .uri("/")
            .header(header::AUTHORIZATION, "Basic ***")
            .body(Body::empty())
            .unwrap();

        let response = dispatcher.handle(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn rejects_unparseable_base() {
        let mut config = ProxyConfig::default();
        config.upstream.base_url = "not a url".into();
        assert!(EdgeDispatcher::new(Arc::new(config)).is_err());
    }
}
