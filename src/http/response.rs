//! Response classification and header sanitizing.
//!
//! # Responsibilities
//! - Decide whether an upstream response is a live event stream
//! - Rewrite event-stream headers so nothing downstream buffers them
//! - Leave every other response untouched
//!
//! # Design Decisions
//! - Classification looks only at `Content-Type`, case-insensitively
//! - Bufferable bodies are never touched; event-stream bodies are only
//!   decoded when they carry a content coding, still chunk-by-chunk

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Response};
use tracing::warn;

use crate::config::StreamingConfig;
use crate::http::decode::{codings, decode_body};

const EVENT_STREAM: &str = "text/event-stream";

/// Tells nginx-style intermediaries not to buffer the response.
pub const X_ACCEL_BUFFERING: HeaderName = HeaderName::from_static("x-accel-buffering");

/// How an upstream response must be relayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseClass {
    /// Open-ended event stream; delivered incrementally with rewritten headers.
    Streaming,
    /// Anything else; passed through untouched.
    Bufferable,
}

impl ResponseClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseClass::Streaming => "streaming",
            ResponseClass::Bufferable => "bufferable",
        }
    }
}

/// Classify a response from its headers.
pub fn classify(headers: &HeaderMap) -> ResponseClass {
    let is_stream = headers
        .get_all(header::CONTENT_TYPE)
        .iter()
        .any(|value| contains_ignore_ascii_case(value.as_bytes(), EVENT_STREAM.as_bytes()));

    if is_stream {
        ResponseClass::Streaming
    } else {
        ResponseClass::Bufferable
    }
}

fn contains_ignore_ascii_case(haystack: &[u8], needle: &[u8]) -> bool {
    haystack
        .windows(needle.len())
        .any(|window| window.eq_ignore_ascii_case(needle))
}

/// Apply the event-stream header rewrite in place.
pub fn sanitize_stream_headers(headers: &mut HeaderMap, config: &StreamingConfig) {
    headers.remove(header::CONTENT_ENCODING);
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    if config.disable_proxy_buffering {
        headers.insert(X_ACCEL_BUFFERING, HeaderValue::from_static("no"));
    }
}

/// Classify `response` and rewrite it if it is an event stream.
///
/// Bufferable responses come back exactly as they went in. Event streams get
/// their headers rewritten and any content coding removed from the body, so
/// the dropped `Content-Encoding` header stays truthful. A coding that cannot
/// be decoded keeps its header and bytes.
pub fn sanitize(response: Response<Body>, config: &StreamingConfig) -> (Response<Body>, ResponseClass) {
    let class = classify(response.headers());
    if class == ResponseClass::Bufferable {
        return (response, class);
    }

    let (mut parts, body) = response.into_parts();
    let body = match codings(&parts.headers) {
        Some(applied) => {
            sanitize_stream_headers(&mut parts.headers, config);
            if !applied.is_empty() {
                parts.headers.remove(header::CONTENT_LENGTH);
            }
            decode_body(body, &applied)
        }
        None => {
            let encoding = parts.headers.remove(header::CONTENT_ENCODING);
            warn!(content_encoding = ?encoding, "Event stream uses an unsupported content coding");
            sanitize_stream_headers(&mut parts.headers, config);
            if let Some(encoding) = encoding {
                parts.headers.insert(header::CONTENT_ENCODING, encoding);
            }
            body
        }
    };

    (Response::from_parts(parts, body), class)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::StatusCode;

    fn upstream(content_type: &str) -> Response<Body> {
        Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, content_type)
            .header(header::CONTENT_ENCODING, "identity")
            .header(header::CACHE_CONTROL, "max-age=60")
            .header("x-request-id", "req-42")
            .body(Body::from("payload"))
            .unwrap()
    }

    #[test]
    fn classifies_by_content_type() {
        let mut headers = HeaderMap::new();
        assert_eq!(classify(&headers), ResponseClass::Bufferable);

        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        assert_eq!(classify(&headers), ResponseClass::Bufferable);

        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/event-stream; charset=utf-8"),
        );
        assert_eq!(classify(&headers), ResponseClass::Streaming);

        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("Text/Event-Stream"));
        assert_eq!(classify(&headers), ResponseClass::Streaming);
    }

    #[test]
    fn streaming_headers_are_rewritten() {
        let (response, class) = sanitize(
            upstream("text/event-stream; charset=utf-8"),
            &StreamingConfig::default(),
        );

        assert_eq!(class, ResponseClass::Streaming);
        assert_eq!(response.status(), StatusCode::OK);

        let headers = response.headers();
        assert!(headers.get(header::CONTENT_ENCODING).is_none());
        assert_eq!(headers[header::CACHE_CONTROL], "no-cache");
        assert_eq!(headers.get_all(header::CACHE_CONTROL).iter().count(), 1);
        assert_eq!(headers[header::CONNECTION], "keep-alive");
        assert_eq!(headers[X_ACCEL_BUFFERING], "no");
        assert_eq!(headers["x-request-id"], "req-42");
        assert_eq!(headers[header::CONTENT_TYPE], "text/event-stream; charset=utf-8");
    }

    #[test]
    fn proxy_buffering_hint_is_optional() {
        let config = StreamingConfig {
            disable_proxy_buffering: false,
        };
        let (response, _) = sanitize(upstream("text/event-stream"), &config);
        assert!(response.headers().get(X_ACCEL_BUFFERING).is_none());
    }

    #[tokio::test]
    async fn bufferable_response_passes_through_unchanged() {
        let upstream_response = upstream("application/json");
        let expected_headers = upstream_response.headers().clone();

        let (response, class) = sanitize(upstream_response, &StreamingConfig::default());

        assert_eq!(class, ResponseClass::Bufferable);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers(), &expected_headers);
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"payload");
    }

    #[tokio::test]
    async fn encoded_stream_is_decoded_and_loses_length() {
        use flate2::{write::GzEncoder, Compression};
        use std::io::Write;

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"data: hello\n\n").unwrap();
        let compressed = encoder.finish().unwrap();

        let upstream_response = Response::builder()
            .header(header::CONTENT_TYPE, "text/event-stream")
            .header(header::CONTENT_ENCODING, "gzip")
            .header(header::CONTENT_LENGTH, compressed.len())
            .body(Body::from(compressed))
            .unwrap();

        let (response, class) = sanitize(upstream_response, &StreamingConfig::default());

        assert_eq!(class, ResponseClass::Streaming);
        assert!(response.headers().get(header::CONTENT_ENCODING).is_none());
        assert!(response.headers().get(header::CONTENT_LENGTH).is_none());
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"data: hello\n\n");
    }

    #[tokio::test]
    async fn unsupported_stream_coding_is_left_alone() {
        let upstream_response = Response::builder()
            .header(header::CONTENT_TYPE, "text/event-stream")
            .header(header::CONTENT_ENCODING, "zstd")
            .body(Body::from("opaque"))
            .unwrap();

        let (response, _) = sanitize(upstream_response, &StreamingConfig::default());

        assert_eq!(response.headers()[header::CONTENT_ENCODING], "zstd");
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-cache");
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"opaque");
    }
}
