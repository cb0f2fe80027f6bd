// Copyright 2026 Contributors to the safetynet-rs project.
// SPDX-License-Identifier: Apache-2.0

//! Remote verification of the JWS signature using the Android Device
//! Verification API.
//!
//! The verifier fails closed: any response it can't read as an explicit
//! `"isValidSignature": true` counts as an invalid signature.  Only failures
//! to complete the HTTP exchange are reported as errors, so that callers can
//! tell "the endpoint said no" from "we never got an answer".

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, warn};
use url::Url;

pub const GOOGLE_VERIFICATION_URL: &str =
    "https://www.googleapis.com/androidcheck/v1/attestations/verify";

const IS_VALID_SIGNATURE: &str = "isValidSignature";

/// [`GOOGLE_VERIFICATION_URL`] as a [`Url`]
pub fn default_endpoint() -> Url {
    Url::parse(GOOGLE_VERIFICATION_URL).expect("GOOGLE_VERIFICATION_URL is well-formed")
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    #[error("problem validating JWS message: {0}")]
    Transport(String),
    #[error("verification endpoint returned HTTP {0}")]
    Status(u16),
}

#[async_trait]
pub trait SignatureVerifier {
    /// Ask whether `jws` carries a valid signature.  `Ok(false)` means the
    /// signature is invalid or the answer was ambiguous.
    async fn verify(&self, api_key: &str, jws: &str) -> Result<bool, VerifyError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifyRequest<'a> {
    signed_attestation: &'a str,
}

/// Interpret the body of a verification response
pub fn parse_verdict(body: &str) -> bool {
    let v: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(e) => {
            warn!("unparsable verification response: {e}");
            return false;
        }
    };

    match v.get(IS_VALID_SIGNATURE) {
        Some(Value::Bool(b)) => *b,
        Some(other) => {
            warn!("{IS_VALID_SIGNATURE} is not a bool: {other}");
            false
        }
        None => {
            debug!("{IS_VALID_SIGNATURE} missing from verification response");
            false
        }
    }
}

/// Client of the Android Device Verification API
#[derive(Debug, Clone)]
pub struct GoogleSignatureVerifier {
    endpoint: Url,
    client: reqwest::Client,
}

impl Default for GoogleSignatureVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl GoogleSignatureVerifier {
    pub fn new() -> Self {
        Self::with_endpoint(default_endpoint())
    }

    /// Use a different verification endpoint, e.g., a mock server
    pub fn with_endpoint(endpoint: Url) -> Self {
        Self {
            endpoint,
            client: reqwest::Client::new(),
        }
    }

    fn request_url(&self, api_key: &str) -> Url {
        let mut u = self.endpoint.clone();
        u.query_pairs_mut().append_pair("key", api_key);
        u
    }
}

#[async_trait]
impl SignatureVerifier for GoogleSignatureVerifier {
    async fn verify(&self, api_key: &str, jws: &str) -> Result<bool, VerifyError> {
        let response = self
            .client
            .post(self.request_url(api_key))
            .json(&VerifyRequest {
                signed_attestation: jws,
            })
            .send()
            .await
            .map_err(|e| {
                error!("problem validating JWS message: {e}");
                VerifyError::Transport(e.to_string())
            })?;

        let status = response.status();

        if !status.is_success() {
            error!("verification endpoint returned HTTP {status}");
            return Err(VerifyError::Status(status.as_u16()));
        }

        let body = response.text().await.map_err(|e| {
            error!("problem reading verification response: {e}");
            VerifyError::Transport(e.to_string())
        })?;

        Ok(parse_verdict(&body))
    }
}
