//! Basic credential verification.
//!
//! # Responsibilities
//! - Decode `Authorization: Basic <base64(user:secret)>`
//! - Compare provided and expected values without timing leaks
//!
//! # Design Decisions
//! - Comparison always scans `max(len(a), len(b))` bytes and folds the
//!   length check in at the end
//! - Every failure collapses to `false` for the caller; the reason is
//!   only kept for debug logging

use std::hint::black_box;

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;

const BASIC_PREFIX: &str = "Basic ";

/// Standard alphabet that accepts payloads with or without `=` padding.
const BASIC_PAYLOAD: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Why a credential check did not pass. Never returned to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    /// Header absent or not using the `Basic` scheme.
    MissingScheme,
    /// Payload was not valid base64.
    MalformedPayload,
    /// Username or secret did not match.
    Mismatch,
}

impl AuthFailure {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthFailure::MissingScheme => "missing_scheme",
            AuthFailure::MalformedPayload => "malformed_payload",
            AuthFailure::Mismatch => "mismatch",
        }
    }
}

/// Decide whether a request may pass the auth gate.
///
/// With no (or an empty) configured secret the gate is disabled and every
/// request is authorized, including ones with no header at all.
pub fn authorize(
    configured_user: Option<&str>,
    configured_secret: Option<&str>,
    authorization_header: &str,
) -> bool {
    verify(configured_user, configured_secret, authorization_header).is_ok()
}

/// Same decision as [`authorize`], keeping the failure reason.
pub fn verify(
    configured_user: Option<&str>,
    configured_secret: Option<&str>,
    authorization_header: &str,
) -> Result<(), AuthFailure> {
    let expected_secret = match configured_secret {
        Some(secret) if !secret.is_empty() => secret,
        _ => return Ok(()),
    };

    let payload = authorization_header
        .strip_prefix(BASIC_PREFIX)
        .ok_or(AuthFailure::MissingScheme)?;

    let decoded = BASIC_PAYLOAD
        .decode(payload.trim())
        .map_err(|_| AuthFailure::MalformedPayload)?;

    // A payload without ':' yields an empty username and secret.
    let (provided_user, provided_secret) = match decoded.iter().position(|&b| b == b':') {
        Some(idx) => (&decoded[..idx], &decoded[idx + 1..]),
        None => (&decoded[..0], &decoded[..0]),
    };

    if let Some(expected_user) = configured_user.filter(|u| !u.is_empty()) {
        if !constant_time_eq(provided_user, expected_user.as_bytes()) {
            return Err(AuthFailure::Mismatch);
        }
    }

    if constant_time_eq(provided_secret, expected_secret.as_bytes()) {
        Ok(())
    } else {
        Err(AuthFailure::Mismatch)
    }
}

/// Compare two byte strings in time that depends only on the longer length.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    scan(a, b).0
}

/// Returns the comparison result and the number of positions visited.
fn scan(a: &[u8], b: &[u8]) -> (bool, usize) {
    let len = a.len().max(b.len());
    let mut diff: u8 = 0;
    let mut steps = 0usize;

    for i in 0..len {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        diff |= black_box(x ^ y);
        steps += 1;
    }

    let same_len = (a.len() == b.len()) as u8;
    (((diff == 0) as u8 & same_len) == 1, steps)
}
