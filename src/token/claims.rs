// Copyright 2026 Contributors to the safetynet-rs project.
// SPDX-License-Identifier: Apache-2.0

use super::common::*;
use super::errors::Error;
use bitmask::*;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

const NONCE: &str = "nonce";
const TIMESTAMP_MS: &str = "timestampMs";
const APK_PACKAGE_NAME: &str = "apkPackageName";
const APK_DIGEST_SHA256: &str = "apkDigestSha256";
const CTS_PROFILE_MATCH: &str = "ctsProfileMatch";
const BASIC_INTEGRITY: &str = "basicIntegrity";
const APK_CERTIFICATE_DIGEST_SHA256: &str = "apkCertificateDigestSha256";
const EVALUATION_TYPE: &str = "evaluationType";
const ADVICE: &str = "advice";
const ERROR: &str = "error";

bitmask! {
    #[derive(Debug)]
    mask ClaimsSet: u16 where flags Claim {
        Nonce           = 0x001,
        TimestampMs     = 0x002,
        ApkPackageName  = 0x004,
        ApkDigest       = 0x008,
        CtsProfileMatch = 0x010,
        BasicIntegrity  = 0x020,
        ApkCertDigests  = 0x040,
        EvaluationType  = 0x080,
        Advice          = 0x100,
        Error           = 0x200,
    }
}

/// The SafetyNet attestation claims-set carried in the payload of the JWS.
///
/// Every claim is optional: a claim that is absent, or present with an
/// unexpected JSON type, is left unset (`None`, or `false` for the two
/// integrity verdicts).  Use [`Claims::has_cts_profile_match()`] and
/// [`Claims::has_basic_integrity()`] to tell an absent verdict from a
/// negative one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    /// Base64 echo of the request nonce
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    /// Milliseconds since the UNIX epoch at which the response was generated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp_ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apk_package_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apk_digest_sha256: Option<String>,
    pub cts_profile_match: bool,
    pub basic_integrity: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apk_certificate_digest_sha256: Option<Vec<String>>,
    /// Comma separated list, e.g., "BASIC,HARDWARE_BACKED"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(skip)]
    claims_set: ClaimsSet,
}

impl Default for Claims {
    fn default() -> Self {
        Self::new()
    }
}

impl Claims {
    pub fn new() -> Self {
        Self {
            nonce: None,
            timestamp_ms: None,
            apk_package_name: None,
            apk_digest_sha256: None,
            cts_profile_match: false,
            basic_integrity: false,
            apk_certificate_digest_sha256: None,
            evaluation_type: None,
            advice: None,
            error: None,
            claims_set: ClaimsSet::none(),
        }
    }

    /// Decode a JSON-encoded SafetyNet claims-set.  The only hard failures are
    /// a buffer that is not JSON, and JSON that is not an object.
    pub fn decode(buf: &[u8]) -> Result<Claims, Error> {
        let v: Value = serde_json::from_slice(buf).map_err(|e| Error::Json(e.to_string()))?;

        let mut c: Claims = Default::default();

        if let Value::Object(contents) = v {
            c.parse(&contents);
        } else {
            return Err(Error::Payload(format!("expecting JSON object, got {v}")));
        }

        Ok(c)
    }

    pub fn has_cts_profile_match(&self) -> bool {
        self.claims_set.contains(Claim::CtsProfileMatch)
    }

    pub fn has_basic_integrity(&self) -> bool {
        self.claims_set.contains(Claim::BasicIntegrity)
    }

    /// True when both integrity verdicts are positive
    pub fn is_passing(&self) -> bool {
        self.cts_profile_match && self.basic_integrity
    }

    fn parse(&mut self, contents: &Map<String, Value>) {
        for (k, v) in contents.iter() {
            let r = match k.as_str() {
                NONCE => self.set_nonce(v),
                TIMESTAMP_MS => self.set_timestamp_ms(v),
                APK_PACKAGE_NAME => self.set_apk_package_name(v),
                APK_DIGEST_SHA256 => self.set_apk_digest(v),
                CTS_PROFILE_MATCH => self.set_cts_profile_match(v),
                BASIC_INTEGRITY => self.set_basic_integrity(v),
                APK_CERTIFICATE_DIGEST_SHA256 => self.set_apk_cert_digests(v),
                EVALUATION_TYPE => self.set_evaluation_type(v),
                ADVICE => self.set_advice(v),
                ERROR => self.set_error(v),
                // SafetyNet adds claims over time, ignore what we don't know
                _ => continue,
            };

            // a mistyped claim is left unset rather than failing the whole payload
            if let Err(e) = r {
                warn!("ignoring claim: {e}");
            }
        }
    }

    fn set_nonce(&mut self, v: &Value) -> Result<(), Error> {
        self.nonce = Some(to_tstr(v, NONCE)?);
        self.claims_set.set(Claim::Nonce);
        Ok(())
    }

    fn set_timestamp_ms(&mut self, v: &Value) -> Result<(), Error> {
        self.timestamp_ms = Some(to_int(v, TIMESTAMP_MS)?);
        self.claims_set.set(Claim::TimestampMs);
        Ok(())
    }

    fn set_apk_package_name(&mut self, v: &Value) -> Result<(), Error> {
        self.apk_package_name = Some(to_tstr(v, APK_PACKAGE_NAME)?);
        self.claims_set.set(Claim::ApkPackageName);
        Ok(())
    }

    fn set_apk_digest(&mut self, v: &Value) -> Result<(), Error> {
        self.apk_digest_sha256 = Some(to_tstr(v, APK_DIGEST_SHA256)?);
        self.claims_set.set(Claim::ApkDigest);
        Ok(())
    }

    fn set_cts_profile_match(&mut self, v: &Value) -> Result<(), Error> {
        self.cts_profile_match = to_bool(v, CTS_PROFILE_MATCH)?;
        self.claims_set.set(Claim::CtsProfileMatch);
        Ok(())
    }

    fn set_basic_integrity(&mut self, v: &Value) -> Result<(), Error> {
        self.basic_integrity = to_bool(v, BASIC_INTEGRITY)?;
        self.claims_set.set(Claim::BasicIntegrity);
        Ok(())
    }

    fn set_apk_cert_digests(&mut self, v: &Value) -> Result<(), Error> {
        let digests = to_tstr_array(v, APK_CERTIFICATE_DIGEST_SHA256)?;
        self.apk_certificate_digest_sha256 = Some(digests);
        self.claims_set.set(Claim::ApkCertDigests);
        Ok(())
    }

    fn set_evaluation_type(&mut self, v: &Value) -> Result<(), Error> {
        self.evaluation_type = Some(to_tstr(v, EVALUATION_TYPE)?);
        self.claims_set.set(Claim::EvaluationType);
        Ok(())
    }

    fn set_advice(&mut self, v: &Value) -> Result<(), Error> {
        self.advice = Some(to_tstr(v, ADVICE)?);
        self.claims_set.set(Claim::Advice);
        Ok(())
    }

    fn set_error(&mut self, v: &Value) -> Result<(), Error> {
        self.error = Some(to_tstr(v, ERROR)?);
        self.claims_set.set(Claim::Error);
        Ok(())
    }
}
