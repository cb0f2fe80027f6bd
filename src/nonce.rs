// Copyright 2026 Contributors to the safetynet-rs project.
// SPDX-License-Identifier: Apache-2.0

//! One-time request nonces for the SafetyNet Attestation API.

use crate::token::base64;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};

pub const NONCE_LEN: usize = 32;

/// A single-use challenge.  It is consumed by the attestation round trip it
/// was generated for and deliberately not `Clone`.
#[derive(Debug, PartialEq, Eq)]
pub struct Nonce([u8; NONCE_LEN]);

impl Nonce {
    pub fn as_bytes(&self) -> &[u8; NONCE_LEN] {
        &self.0
    }

    /// Padded standard base64, i.e., the form echoed back in the `nonce` claim
    pub fn to_base64(&self) -> String {
        base64::encode_std(&self.0)
    }
}

impl From<[u8; NONCE_LEN]> for Nonce {
    fn from(v: [u8; NONCE_LEN]) -> Self {
        Self(v)
    }
}

/// Generates nonces from an owned, cryptographically secure RNG.  Production
/// code uses the OS source; tests may inject a seeded generator.
#[derive(Debug)]
pub struct NonceGenerator<R = OsRng> {
    rng: R,
}

impl Default for NonceGenerator<OsRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl NonceGenerator<OsRng> {
    pub fn new() -> Self {
        Self { rng: OsRng }
    }
}

impl<R: RngCore + CryptoRng> NonceGenerator<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// Return 32 fresh random bytes
    pub fn generate(&mut self) -> Nonce {
        let mut v = [0u8; NONCE_LEN];
        self.rng.fill_bytes(&mut v);
        Nonce(v)
    }
}
