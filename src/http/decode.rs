//! Content-coding removal for relayed event streams.
//!
//! Event streams lose their `Content-Encoding` header on the way out, so any
//! coding the upstream applied has to come off the bytes as well. Decoding
//! runs chunk by chunk over the body stream; nothing is collected.

use std::io;

use async_compression::tokio::bufread::{BrotliDecoder, GzipDecoder, ZlibDecoder};
use axum::body::Body;
use axum::http::{header, HeaderMap};
use bytes::Bytes;
use futures_util::stream::BoxStream;
use futures_util::{StreamExt, TryStreamExt};
use tokio_util::io::{ReaderStream, StreamReader};
use tracing::warn;

/// A single `Content-Encoding` token this gateway can undo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentCoding {
    Gzip,
    Deflate,
    Brotli,
}

impl ContentCoding {
    fn from_token(token: &str) -> Option<Self> {
        if token.eq_ignore_ascii_case("gzip") || token.eq_ignore_ascii_case("x-gzip") {
            Some(ContentCoding::Gzip)
        } else if token.eq_ignore_ascii_case("deflate") {
            Some(ContentCoding::Deflate)
        } else if token.eq_ignore_ascii_case("br") {
            Some(ContentCoding::Brotli)
        } else {
            None
        }
    }
}

/// Codings listed in `Content-Encoding`, in the order they were applied.
///
/// `identity` tokens are skipped. Returns `None` if any token is unknown.
pub fn codings(headers: &HeaderMap) -> Option<Vec<ContentCoding>> {
    let mut applied = Vec::new();
    for value in headers.get_all(header::CONTENT_ENCODING) {
        let value = value.to_str().ok()?;
        for token in value.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            if token.eq_ignore_ascii_case("identity") {
                continue;
            }
            applied.push(ContentCoding::from_token(token)?);
        }
    }
    Some(applied)
}

/// Wrap `body` so the listed codings are removed as chunks arrive.
pub fn decode_body(body: Body, applied: &[ContentCoding]) -> Body {
    if applied.is_empty() {
        return body;
    }

    let mut stream: BoxStream<'static, io::Result<Bytes>> =
        body.into_data_stream().map_err(io::Error::other).boxed();

    // Last applied is outermost, so it comes off first.
    for coding in applied.iter().rev() {
        let reader = StreamReader::new(stream);
        stream = match coding {
            ContentCoding::Gzip => ReaderStream::new(GzipDecoder::new(reader)).boxed(),
            ContentCoding::Deflate => ReaderStream::new(ZlibDecoder::new(reader)).boxed(),
            ContentCoding::Brotli => ReaderStream::new(BrotliDecoder::new(reader)).boxed(),
        };
    }

    Body::from_stream(stream.inspect_err(|e| {
        warn!(error = %e, "Failed to decode event stream");
    }))
}
