// Copyright 2026 Contributors to the safetynet-rs project.
// SPDX-License-Identifier: Apache-2.0

//! Obtaining a signed attestation from the platform attestation provider.
//!
//! The provider itself is a black box: given a nonce and an API key, it
//! returns a compact JWS.  On a device this is Google Play services; off
//! device, [`HttpAttestationProvider`] talks to a relay that forwards the
//! request, and [`StaticAttestationProvider`] replays a token captured
//! earlier.

use crate::nonce::Nonce;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AttestationError {
    #[error("attestation transport failure: {0}")]
    Transport(String),
    #[error("ApiException[{status_code}] {message}")]
    Api { status_code: i32, message: String },
    #[error("malformed attestation response: {0}")]
    MalformedResponse(String),
    #[error("attestation response carries no JWS")]
    EmptyToken,
}

impl AttestationError {
    /// The provider status code, when the provider reported one
    pub fn status_code(&self) -> Option<i32> {
        match self {
            AttestationError::Api { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }
}

/// Everything the provider needs to produce an attestation
#[derive(Debug)]
pub struct AttestationRequest<'a> {
    pub nonce: &'a Nonce,
    pub api_key: &'a str,
    pub package_name: &'a str,
    pub apk_certificate_digests: &'a [String],
}

#[async_trait]
pub trait AttestationProvider {
    /// Request an attestation bound to the request nonce.  Returns the
    /// compact JWS exactly as the provider produced it.
    async fn attest(&self, req: &AttestationRequest<'_>) -> Result<String, AttestationError>;
}

/// Replays a previously obtained JWS, e.g., one captured on a device and
/// relayed for checking
#[derive(Debug, Clone)]
pub struct StaticAttestationProvider {
    jws: String,
}

impl StaticAttestationProvider {
    pub fn new(jws: impl Into<String>) -> Self {
        Self { jws: jws.into() }
    }
}

#[async_trait]
impl AttestationProvider for StaticAttestationProvider {
    async fn attest(&self, _req: &AttestationRequest<'_>) -> Result<String, AttestationError> {
        if self.jws.is_empty() {
            return Err(AttestationError::EmptyToken);
        }

        Ok(self.jws.clone())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RelayRequest<'a> {
    nonce: String,
    api_key: &'a str,
    package_name: &'a str,
    apk_certificate_digests: &'a [String],
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RelayResponse {
    jws_result: Option<String>,
    error: Option<RelayError>,
}

#[derive(Debug, Deserialize)]
struct RelayError {
    code: i32,
    #[serde(default)]
    message: String,
}

/// Forwards attestation requests to an HTTP relay.
///
/// Request: `POST <url>` with
/// `{"nonce": "<base64>", "apiKey": .., "packageName": .., "apkCertificateDigests": [..]}`.
/// Response: `{"jwsResult": "<jws>"}` or `{"error": {"code": <int>, "message": ".."}}`.
#[derive(Debug, Clone)]
pub struct HttpAttestationProvider {
    url: Url,
    client: reqwest::Client,
}

impl HttpAttestationProvider {
    pub fn new(url: Url) -> Self {
        Self::with_client(url, reqwest::Client::new())
    }

    pub fn with_client(url: Url, client: reqwest::Client) -> Self {
        Self { url, client }
    }
}

#[async_trait]
impl AttestationProvider for HttpAttestationProvider {
    async fn attest(&self, req: &AttestationRequest<'_>) -> Result<String, AttestationError> {
        let body = RelayRequest {
            nonce: req.nonce.to_base64(),
            api_key: req.api_key,
            package_name: req.package_name,
            apk_certificate_digests: req.apk_certificate_digests,
        };

        debug!("requesting attestation from {}", self.url);

        let response = self
            .client
            .post(self.url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| AttestationError::Transport(e.to_string()))?;

        let status = response.status();

        let text = response
            .text()
            .await
            .map_err(|e| AttestationError::Transport(e.to_string()))?;

        // the relay may use the error envelope with any HTTP status, so look
        // for it before judging the status code
        let parsed: Result<RelayResponse, _> = serde_json::from_str(&text);

        if let Some(err) = parsed.as_ref().ok().and_then(|r| r.error.as_ref()) {
            return Err(AttestationError::Api {
                status_code: err.code,
                message: err.message.clone(),
            });
        }

        if !status.is_success() {
            let reason = status.canonical_reason().unwrap_or("Unknown error");

            return Err(AttestationError::Api {
                status_code: i32::from(status.as_u16()),
                message: reason.to_string(),
            });
        }

        let r = match parsed {
            Ok(r) => r,
            Err(e) => return Err(AttestationError::MalformedResponse(e.to_string())),
        };

        match r.jws_result {
            Some(jws) if !jws.is_empty() => Ok(jws),
            _ => Err(AttestationError::EmptyToken),
        }
    }
}
