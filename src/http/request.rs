//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate unique request ID (UUID v4)
//! - Rewrite the inbound request so it targets the upstream origin
//! - Strip the edge credential before forwarding
//!
//! # Design Decisions
//! - Path and query are copied byte-for-byte; only scheme and host change
//! - The body is moved, never collected
//! - `Host` is dropped so the upstream sees its own authority
//! - A request id assigned at the edge is for logs only and is not forwarded

use axum::{
    body::{Body, HttpBody},
    http::{header, HeaderMap, HeaderValue, Method, Request},
};
use tower_http::request_id::{MakeRequestId, RequestId};
use url::Url;
use uuid::Uuid;

/// Header carrying the per-request correlation id.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates a UUID v4 for requests that arrive without an id.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuidV4;

impl MakeRequestId for MakeRequestUuidV4 {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Marks a request whose `x-request-id` was assigned at the edge rather
/// than sent by the caller.
#[derive(Debug, Clone, Copy)]
pub struct EdgeAssignedRequestId;

/// Runs ahead of the request-id layer and tags requests that arrive without
/// an id of their own.
pub async fn mark_missing_request_id(mut request: Request<Body>) -> Request<Body> {
    if !request.headers().contains_key(X_REQUEST_ID) {
        request.extensions_mut().insert(EdgeAssignedRequestId);
    }
    request
}

/// Scheme and authority of the configured upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamBase {
    origin: String,
}

impl UpstreamBase {
    /// Parse a base URL, keeping only its origin.
    pub fn parse(raw: &str) -> Result<Self, url::ParseError> {
        let url = Url::parse(raw)?;
        Ok(Self {
            origin: url.origin().ascii_serialization(),
        })
    }

    /// e.g. `https://backend.example` or `http://127.0.0.1:9000`.
    pub fn origin(&self) -> &str {
        &self.origin
    }
}

/// A request ready to be issued to the upstream.
pub struct OutboundRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    /// `None` when the inbound request is known to have no body.
    pub body: Option<Body>,
}

/// Re-address `inbound` to the upstream origin.
///
/// Headers are copied as received, except that `Host` is dropped, an
/// edge-assigned `x-request-id` is dropped, and, when `credentials_checked`
/// is set, the caller's `Authorization` header is removed so the upstream
/// never sees the edge credential.
pub fn rewrite(
    inbound: Request<Body>,
    base: &UpstreamBase,
    credentials_checked: bool,
) -> OutboundRequest {
    let (parts, body) = inbound.into_parts();

    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let url = if path_and_query.starts_with('/') {
        format!("{}{}", base.origin(), path_and_query)
    } else {
        format!("{}/{}", base.origin(), path_and_query)
    };

    let mut headers = parts.headers;
    headers.remove(header::HOST);
    if parts.extensions.get::<EdgeAssignedRequestId>().is_some() {
        headers.remove(X_REQUEST_ID);
    }
    if credentials_checked {
        headers.remove(header::AUTHORIZATION);
    }

    let body = if body.size_hint().exact() == Some(0) {
        None
    } else {
        Some(body)
    };

    OutboundRequest {
        method: parts.method,
        url,
        headers,
        body,
    }
}
