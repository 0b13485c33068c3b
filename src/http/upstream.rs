//! Upstream HTTP client.
//!
//! # Responsibilities
//! - Issue exactly one request per inbound request (no retries)
//! - Relay request and response bodies as streams
//! - Map connect failures and header timeouts to distinct errors
//!
//! # Design Decisions
//! - The response timeout only covers waiting for headers; an open event
//!   stream may run indefinitely
//! - Dropping the returned body drops the upstream connection, which is how
//!   caller disconnects cancel in-flight streams
//! - Response bodies are never decompressed here; status, headers and bytes
//!   arrive exactly as the upstream sent them

use axum::{body::Body, http::Response};
use futures_util::TryStreamExt;
use reqwest::{redirect, Client};
use tracing::{debug, warn};

use crate::config::{RedirectMode, UpstreamConfig};
use crate::http::error::ProxyError;
use crate::http::request::OutboundRequest;

/// Client bound to the single configured upstream.
#[derive(Clone)]
pub struct UpstreamClient {
    http_client: Client,
    response_timeout: std::time::Duration,
}

impl UpstreamClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self, ProxyError> {
        let policy = match config.redirect_mode {
            RedirectMode::Manual => redirect::Policy::none(),
            RedirectMode::Follow => redirect::Policy::default(),
        };

        let http_client = Client::builder()
            .redirect(policy)
            .connect_timeout(config.connect_timeout())
            .no_gzip()
            .no_brotli()
            .no_deflate()
            .no_proxy()
            .build()
            .map_err(ProxyError::ClientBuild)?;

        Ok(Self {
            http_client,
            response_timeout: config.response_timeout(),
        })
    }

    /// Send `outbound` and return the upstream response with a streaming body.
    pub async fn send(&self, outbound: OutboundRequest) -> Result<Response<Body>, ProxyError> {
        let OutboundRequest {
            method,
            url,
            headers,
            body,
        } = outbound;

        debug!(upstream_url = %url, method = %method, "Forwarding request to upstream");

        let mut builder = self.http_client.request(method, url.as_str()).headers(headers);
        if let Some(body) = body {
            builder = builder.body(reqwest::Body::wrap_stream(body.into_data_stream()));
        }
        let request = builder
            .build()
            .map_err(|e| ProxyError::InvalidUpstreamRequest(e.to_string()))?;

        let upstream = match tokio::time::timeout(self.response_timeout, self.http_client.execute(request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) if e.is_timeout() => return Err(ProxyError::UpstreamTimeout(self.response_timeout)),
            Ok(Err(e)) if e.is_builder() => return Err(ProxyError::InvalidUpstreamRequest(e.to_string())),
            Ok(Err(e)) => return Err(ProxyError::UpstreamUnreachable(e)),
            Err(_) => return Err(ProxyError::UpstreamTimeout(self.response_timeout)),
        };

        Ok(into_response(upstream, url))
    }
}

/// Convert a reqwest response into an axum response without buffering the body.
fn into_response(upstream: reqwest::Response, url: String) -> Response<Body> {
    let status = upstream.status();
    let headers = upstream.headers().clone();

    // Chunks already relayed stay delivered; the error aborts the caller connection.
    let stream = upstream.bytes_stream().inspect_err(move |e| {
        warn!(upstream_url = %url, error = %e, "Upstream stream interrupted");
    });

    let mut response = Response::new(Body::from_stream(stream));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}
