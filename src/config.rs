// Copyright 2026 Contributors to the safetynet-rs project.
// SPDX-License-Identifier: Apache-2.0

//! Configuration of a SafetyNet test run.
//!
//! ```json
//! {
//!     "api-key": "AIza...",
//!     "package-name": "com.hominoid.safetynet",
//!     "apk-certificate-digests": [ "Fq1a0DQZ8AmxQ3rxyyNBJh2y8bVSTiQr5Nl2xdM0hdQ=" ],
//!     "verify-url": "https://www.googleapis.com/androidcheck/v1/attestations/verify",
//!     "attestation-url": "https://relay.example/attest"
//! }
//! ```
//!
//! Every key is optional.  An empty `api-key` disables signature
//! verification, which in turn makes any positive verdict fail.

use crate::token::base64;
use crate::verify::default_endpoint;
use openssl::sha::sha256;
use serde::Deserialize;
use std::path::Path;
use url::Url;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("reading {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Syntax error: {0}")]
    Syntax(String),
    #[error("Semantic error: {0}")]
    Sema(String),
}

#[derive(Clone, Deserialize, Debug, PartialEq, Eq)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct Config {
    /// Key for the Android Device Verification API.  Never logged.
    pub api_key: String,

    /// Package name of the app under test
    pub package_name: String,

    /// Base64 SHA-256 digests of the app's signing certificates, see
    /// [`apk_certificate_digest()`]
    pub apk_certificate_digests: Vec<String>,

    /// Endpoint of the signature verification service
    pub verify_url: Url,

    /// Relay that forwards attestation requests to the provider.  Unset when
    /// tokens are supplied directly.
    pub attestation_url: Option<Url>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            package_name: String::new(),
            apk_certificate_digests: Vec::new(),
            verify_url: default_endpoint(),
            attestation_url: None,
        }
    }
}

impl Config {
    /// Parse a configuration from its JSON form
    pub fn load_json(j: &str) -> Result<Config, Error> {
        let c: Config = serde_json::from_str(j).map_err(|e| Error::Syntax(e.to_string()))?;

        c.validate()?;

        Ok(c)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Config, Error> {
        let path = path.as_ref();

        let j = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.display().to_string(),
            source,
        })?;

        Self::load_json(&j)
    }

    /// Layer command line values over the loaded configuration
    pub fn apply(&mut self, o: Overrides) {
        if let Some(k) = o.api_key {
            self.api_key = k;
        }

        if let Some(p) = o.package_name {
            self.package_name = p;
        }

        for der in o.apk_certificates.iter() {
            let d = apk_certificate_digest(der);
            self.apk_certificate_digests.push(d);
        }
    }

    fn validate(&self) -> Result<(), Error> {
        let urls = [Some(&self.verify_url), self.attestation_url.as_ref()];

        for u in urls.into_iter().flatten() {
            if !matches!(u.scheme(), "https" | "http") {
                return Err(Error::Sema(format!("unsupported URL scheme in {u}")));
            }
        }

        for d in self.apk_certificate_digests.iter() {
            let raw = base64::decode_segment(d)
                .map_err(|e| Error::Sema(format!("APK certificate digest {d}: {e}")))?;

            if raw.len() != 32 {
                return Err(Error::Sema(format!(
                    "APK certificate digest {d}: expecting 32 bytes, got {}",
                    raw.len()
                )));
            }
        }

        Ok(())
    }
}

/// Values supplied on the command line.  Set fields replace the configured
/// ones; certificates are appended to `apk-certificate-digests`.
#[derive(Debug, Default)]
pub struct Overrides {
    pub api_key: Option<String>,
    pub package_name: Option<String>,
    /// DER-encoded APK signing certificates
    pub apk_certificates: Vec<Vec<u8>>,
}

/// Digest of an APK signing certificate (DER), in the form SafetyNet reports
/// in the `apkCertificateDigestSha256` claim: base64 of its SHA-256
pub fn apk_certificate_digest(der: &[u8]) -> String {
    base64::encode_std(&sha256(der))
}
