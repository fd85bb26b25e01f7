//! Ed25519 signatures on platform callbacks.
//!
//! The platform signs `timestamp ‖ raw body` and sends the signature and
//! timestamp as headers. Requests that fail the check get a 401.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use thiserror::Error;

use crate::error::AppError;

pub const SIGNATURE_HEADER: &str = "x-signature-ed25519";
pub const TIMESTAMP_HEADER: &str = "x-signature-timestamp";

const MAX_BODY_BYTES: usize = 1024 * 1024;
const BAD_SIGNATURE: &str = "Bad request signature";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("platform public key is not set")]
    Missing,

    #[error("platform public key must be 32 hex-encoded bytes")]
    Invalid,
}

/// Checks callback signatures against the application's public key.
#[derive(Debug, Clone)]
pub struct SignatureVerifier {
    key: VerifyingKey,
}

impl SignatureVerifier {
    pub fn new(key: VerifyingKey) -> Self {
        Self { key }
    }

    /// Parse the hex-encoded public key shown in the platform's developer
    /// portal.
    pub fn from_hex(public_key: &str) -> Result<Self, KeyError> {
        let public_key = public_key.trim();
        if public_key.is_empty() {
            return Err(KeyError::Missing);
        }
        let bytes: [u8; 32] = hex::decode(public_key)
            .ok()
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or(KeyError::Invalid)?;
        let key = VerifyingKey::from_bytes(&bytes).map_err(|_| KeyError::Invalid)?;
        Ok(Self { key })
    }

    /// Whether `signature` (hex) signs `timestamp` followed by `body`.
    pub fn verify(&self, signature: &str, timestamp: &str, body: &[u8]) -> bool {
        let Some(bytes) = hex::decode(signature)
            .ok()
            .and_then(|bytes| <[u8; 64]>::try_from(bytes).ok())
        else {
            return false;
        };

        let mut message = Vec::with_capacity(timestamp.len() + body.len());
        message.extend_from_slice(timestamp.as_bytes());
        message.extend_from_slice(body);
        self.key
            .verify(&message, &Signature::from_bytes(&bytes))
            .is_ok()
    }
}

/// Middleware rejecting callbacks without a valid signature.
pub async fn verify_signature(
    State(verifier): State<Arc<SignatureVerifier>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (parts, body) = request.into_parts();
    let header = |name: &str| {
        parts
            .headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
    };
    let (Some(signature), Some(timestamp)) = (header(SIGNATURE_HEADER), header(TIMESTAMP_HEADER))
    else {
        tracing::warn!("callback without signature headers");
        return Err(AppError::unauthorized(BAD_SIGNATURE));
    };

    let bytes = to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|_| AppError::bad_request("request body too large"))?;
    if !verifier.verify(&signature, &timestamp, &bytes) {
        tracing::warn!("callback with invalid signature");
        return Err(AppError::unauthorized(BAD_SIGNATURE));
    }

    Ok(next.run(Request::from_parts(parts, Body::from(bytes))).await)
}
