// Copyright 2026 Contributors to the safetynet-rs project.
// SPDX-License-Identifier: Apache-2.0

//! The token module extracts the SafetyNet claims-set from the compact JWS
//! returned by the Attestation API.
//!
//! Decoding is purely syntactic: the JWS signature is not checked here.  Trust
//! in a positive verdict is established separately, by submitting the whole
//! token to the verification endpoint (see [`crate::verify`]).
//!
//! # Example
//!
//! ```
//! use safetynet::token;
//!
//! const jws: &str = include_str!("../../testdata/pass.jws");
//!
//! let claims = token::decode(jws).expect("decoding SafetyNet JWS");
//!
//! assert!(claims.cts_profile_match);
//! assert!(claims.basic_integrity);
//!
//! // anything that isn't three dot-separated segments is rejected
//! assert!(token::decode("eyJhIjoxfQ==").is_none());
//! ```

pub use self::claims::Claims;
pub use self::errors::Error;
pub use self::jws::AttestationToken;

pub mod base64;
mod claims;
mod common;
mod errors;
mod jws;

use tracing::debug;

/// Decode the claims-set of a compact JWS.  Returns `None` when the token
/// does not have exactly three segments, or when its payload is not base64
/// encoded JSON.
pub fn decode(token: &str) -> Option<Claims> {
    match AttestationToken::parse(token).and_then(|t| t.claims()) {
        Ok(c) => Some(c),
        Err(e) => {
            debug!("JWS decoding failed: {e}");
            None
        }
    }
}
