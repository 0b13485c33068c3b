//! Basic auth challenge response.

use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::Response,
};

/// Build the 401 returned when the auth gate rejects a request.
///
/// The body never says why the check failed.
pub fn unauthorized_response(realm: &str) -> Response {
    let challenge = HeaderValue::from_str(&format!("Basic realm=\"{}\"", realm))
        .unwrap_or_else(|_| HeaderValue::from_static("Basic"));

    let mut response = Response::new(Body::from("Unauthorized"));
    *response.status_mut() = StatusCode::UNAUTHORIZED;
    let headers = response.headers_mut();
    headers.insert(header::WWW_AUTHENTICATE, challenge);
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn challenge_carries_realm_and_no_store() {
        let response = unauthorized_response("Edge");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers()[header::WWW_AUTHENTICATE],
            "Basic realm=\"Edge\""
        );
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");

        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"Unauthorized");
    }

    #[test]
    fn unrepresentable_realm_falls_back_to_bare_scheme() {
        let response = unauthorized_response("line\nbreak");
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Basic");
    }
}
