// Copyright 2026 Contributors to the safetynet-rs project.
// SPDX-License-Identifier: Apache-2.0

use super::base64;
use super::claims::Claims;
use super::errors::Error;
use jsonwebtoken::Header;

const SEGMENTS: usize = 3;

/// A compact JWS as returned by the SafetyNet Attestation API, i.e.,
/// `header.payload.signature`.  Parsing only checks the shape: the signature
/// is NOT verified here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestationToken {
    raw: String,
}

impl AttestationToken {
    /// Wrap the supplied compact serialization.  Fails unless the string
    /// splits into exactly three `.`-separated segments (empty segments are
    /// allowed at this stage).
    pub fn parse(s: &str) -> Result<AttestationToken, Error> {
        let n = s.split('.').count();

        if n != SEGMENTS {
            return Err(Error::Syntax(format!(
                "expecting {SEGMENTS} segments in compact JWS, got {n}"
            )));
        }

        Ok(Self { raw: s.into() })
    }

    /// The compact serialization, exactly as received
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    fn segment(&self, i: usize) -> &str {
        // parse() guarantees there are three segments
        self.raw.split('.').nth(i).unwrap_or_default()
    }

    pub fn payload_segment(&self) -> &str {
        self.segment(1)
    }

    pub fn signature_segment(&self) -> &str {
        self.segment(2)
    }

    /// Decode the protected header.  For diagnostics only: nothing in the
    /// header is trusted until the signature has been verified remotely.
    pub fn header(&self) -> Result<Header, Error> {
        jsonwebtoken::decode_header(&self.raw).map_err(|e| Error::Syntax(format!("header: {e}")))
    }

    /// Decode the claims-set carried in the payload segment
    pub fn claims(&self) -> Result<Claims, Error> {
        let payload = base64::decode_segment(self.payload_segment())?;

        Claims::decode(&payload)
    }

    /// Number of certificates in the header's `x5c` chain, zero if the header
    /// can't be decoded
    pub fn chain_len(&self) -> usize {
        self.header()
            .ok()
            .and_then(|h| h.x5c)
            .map_or(0, |c| c.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::Algorithm;

    const TEST_JWS_PASS: &str = include_str!("../../testdata/pass.jws");
    const TEST_JWS_CTS_FAIL: &str = include_str!("../../testdata/cts-fail.jws");

    #[test]
    fn parse_good_token() {
        let t = AttestationToken::parse(TEST_JWS_PASS).expect("parsing TEST_JWS_PASS");

        assert_eq!(t.as_str(), TEST_JWS_PASS);
        assert!(!t.payload_segment().is_empty());
        assert!(!t.signature_segment().is_empty());
    }

    #[test]
    fn parse_wrong_segment_count() {
        for s in ["", "a", "a.b", "a.b.c.d", "eyJhIjoxfQ=="] {
            let r = AttestationToken::parse(s);

            assert!(matches!(r, Err(Error::Syntax(_))), "{s:?}");
        }
    }

    #[test]
    fn parse_allows_empty_segments() {
        let t = AttestationToken::parse("eyJhIjoxfQ==..").unwrap();

        assert_eq!(t.payload_segment(), "");
        assert_eq!(t.signature_segment(), "");
    }

    #[test]
    fn claims_from_token() {
        let t = AttestationToken::parse(TEST_JWS_CTS_FAIL).unwrap();

        let c = t.claims().expect("decoding claims");

        assert!(!c.cts_profile_match);
        assert!(c.basic_integrity);
        assert_eq!(
            c.advice.as_deref(),
            Some("RESTORE_TO_FACTORY_ROM,LOCK_BOOTLOADER")
        );
    }

    #[test]
    fn header_from_token() {
        let t = AttestationToken::parse(TEST_JWS_PASS).unwrap();

        let h = t.header().expect("decoding header");

        assert_eq!(h.alg, Algorithm::RS256);
        assert_eq!(t.chain_len(), 2);
    }

    #[test]
    fn empty_payload_is_not_json() {
        let t = AttestationToken::parse("eyJhIjoxfQ==..").unwrap();

        assert!(matches!(t.claims(), Err(Error::Json(_))));
        assert_eq!(t.chain_len(), 0);
    }
}
