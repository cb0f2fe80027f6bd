// Copyright 2026 Contributors to the safetynet-rs project.
// SPDX-License-Identifier: Apache-2.0

use base64::{
    alphabet,
    engine::{general_purpose, DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine as _,
};

use super::errors::Error;

// JWS segments are meant to be unpadded base64url, but tokens relayed through
// other tooling sometimes come back padded or in the standard alphabet.
const LENIENT: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);

const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);

/// decodes bytes from a base64url (or, failing that, standard base64) string,
/// with or without padding
pub fn decode_segment(v: &str) -> Result<Vec<u8>, Error> {
    URL_SAFE_LENIENT
        .decode(v)
        .or_else(|_| STANDARD_LENIENT.decode(v))
        .map_err(|e| Error::Base64(e.to_string()))
}

/// encodes bytes as unpadded base64url, i.e., the encoding of a JWS segment
pub fn encode_segment(v: &[u8]) -> String {
    general_purpose::URL_SAFE_NO_PAD.encode(v)
}

/// encodes bytes as padded standard base64, the way SafetyNet echoes nonces
/// and APK digests
pub fn encode_std(v: &[u8]) -> String {
    general_purpose::STANDARD.encode(v)
}
