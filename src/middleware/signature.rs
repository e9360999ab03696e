// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Dispatcher request signature verification.
//!
//! Header format: `x-event-signature: t=<unix seconds>&s=<hex>` where
//! `s = HMAC-SHA256(key, body || t)`.

use crate::error::AppError;
use crate::AppState;
use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-event-signature";

/// Signatures older (or further in the future) than this are rejected.
const MAX_SIGNATURE_AGE_SECS: u64 = 300;
const MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

/// Require a valid signature when a signing key is configured.
pub async fn require_signature(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(key) = state.config.signing_key.as_deref() else {
        return Ok(next.run(request).await);
    };

    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to read request body: {}", e)))?;

    let header = parts
        .headers
        .get(SIGNATURE_HEADER)
        .and_then(|h| h.to_str().ok());

    let Some(header) = header else {
        tracing::warn!(path = %parts.uri.path(), "Blocked unsigned dispatcher request");
        return Err(AppError::Unauthorized);
    };

    if let Err(reason) = verify_signature(key, header, &bytes, chrono::Utc::now().timestamp()) {
        tracing::warn!(
            path = %parts.uri.path(),
            reason,
            "Blocked dispatcher request: bad signature"
        );
        return Err(AppError::Unauthorized);
    }

    Ok(next.run(Request::from_parts(parts, Body::from(bytes))).await)
}

/// Build the signature header value for `body` at `timestamp`.
pub fn sign(key: &[u8], timestamp: i64, body: &[u8]) -> Option<String> {
    let signature = mac(key, timestamp, body)?;
    Some(format!("t={}&s={}", timestamp, hex::encode(signature)))
}

/// Check a signature header against `body`, relative to `now` (unix seconds).
pub fn verify_signature(
    key: &[u8],
    header: &str,
    body: &[u8],
    now: i64,
) -> Result<(), &'static str> {
    let mut timestamp = None;
    let mut signature = None;
    for pair in header.split('&') {
        match pair.split_once('=') {
            Some(("t", value)) => timestamp = value.parse::<i64>().ok(),
            Some(("s", value)) => signature = hex::decode(value).ok(),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or("missing or invalid timestamp")?;
    let signature = signature.ok_or("missing or invalid signature")?;

    if now.abs_diff(timestamp) > MAX_SIGNATURE_AGE_SECS {
        return Err("signature expired");
    }

    let expected = mac(key, timestamp, body).ok_or("invalid signing key")?;
    if bool::from(expected.as_slice().ct_eq(signature.as_slice())) {
        Ok(())
    } else {
        Err("signature mismatch")
    }
}

fn mac(key: &[u8], timestamp: i64, body: &[u8]) -> Option<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(key).ok()?;
    mac.update(body);
    mac.update(timestamp.to_string().as_bytes());
    Some(mac.finalize().into_bytes().to_vec())
}
