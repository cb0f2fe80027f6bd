// Copyright 2026 Contributors to the safetynet-rs project.
// SPDX-License-Identifier: Apache-2.0

//! Android SafetyNet attestation checking.
//!
//! This crate runs the client side of a SafetyNet Attestation API round trip
//! and decides how far its verdict can be trusted:
//! * Generating a one-time request nonce
//! * Obtaining a signed attestation (a compact JWS) from the provider
//! * Decoding the JWS claims-set and its integrity verdicts
//! * Having the JWS signature verified by the Android Device Verification
//!   API whenever the verdict is positive
//! * Reporting a single outcome, with a stable error code on failure
//!
//! ```no_run
//! use safetynet::attest::StaticAttestationProvider;
//! use safetynet::config::Config;
//! use safetynet::helper::SafetyNetHelper;
//! use safetynet::verify::GoogleSignatureVerifier;
//!
//! # async fn run(jws: String) {
//! let config = Config {
//!     api_key: "AIza...".to_string(),
//!     ..Default::default()
//! };
//!
//! let mut helper = SafetyNetHelper::new(
//!     config,
//!     StaticAttestationProvider::new(jws),
//!     GoogleSignatureVerifier::new(),
//! );
//!
//! println!("{}", helper.run().await);
//! # }
//! ```

pub mod attest;
pub mod config;
pub mod evaluate;
pub mod helper;
pub mod nonce;
pub mod result;
pub mod token;
pub mod verify;

pub use helper::SafetyNetHelper;
pub use result::{Completion, ErrorKind, VerificationResult};
