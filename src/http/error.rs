//! Errors surfaced by the forwarding path.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("upstream unreachable: {0}")]
    UpstreamUnreachable(#[source] reqwest::Error),

    #[error("upstream did not respond within {0:?}")]
    UpstreamTimeout(std::time::Duration),

    #[error("could not build upstream request: {0}")]
    InvalidUpstreamRequest(String),

    #[error("failed to build upstream client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::UpstreamUnreachable(_) | ProxyError::InvalidUpstreamRequest(_) => {
                StatusCode::BAD_GATEWAY
            }
            ProxyError::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::ClientBuild(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::UpstreamUnreachable(_) => "unreachable",
            ProxyError::UpstreamTimeout(_) => "timeout",
            ProxyError::InvalidUpstreamRequest(_) => "invalid_request",
            ProxyError::ClientBuild(_) => "client_build",
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ProxyError::UpstreamTimeout(_) => "Upstream timed out",
            ProxyError::ClientBuild(_) => "Internal error",
            _ => "Upstream request failed",
        };
        (status, message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn maps_to_gateway_statuses() {
        assert_eq!(
            ProxyError::UpstreamTimeout(Duration::from_secs(1)).status(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            ProxyError::InvalidUpstreamRequest("bad".into()).status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[tokio::test]
    async fn response_body_hides_details() {
        let response = ProxyError::InvalidUpstreamRequest("secret detail".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"Upstream request failed");
    }
}
