// Copyright 2026 Contributors to the safetynet-rs project.
// SPDX-License-Identifier: Apache-2.0

//! Drives one SafetyNet test: nonce, attestation, decoding, evaluation and,
//! for positive verdicts, signature verification.

use crate::attest::{AttestationError, AttestationProvider, AttestationRequest};
use crate::config::Config;
use crate::evaluate::{evaluate, Decision};
use crate::nonce::{Nonce, NonceGenerator};
use crate::result::{Completion, ErrorKind, VerificationResult};
use crate::token::{self, Claims};
use crate::verify::SignatureVerifier;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use tracing::{debug, info, warn};

/// Runs SafetyNet tests for one app.
///
/// [`SafetyNetHelper::run()`] borrows the helper mutably, so runs on the same
/// helper are serialized; use one helper per concurrent test.
pub struct SafetyNetHelper<P, V, R = OsRng> {
    config: Config,
    provider: P,
    verifier: V,
    nonces: NonceGenerator<R>,
}

impl<P, V> SafetyNetHelper<P, V, OsRng>
where
    P: AttestationProvider,
    V: SignatureVerifier,
{
    pub fn new(config: Config, provider: P, verifier: V) -> Self {
        Self::with_nonce_generator(config, provider, verifier, NonceGenerator::new())
    }
}

impl<P, V, R> SafetyNetHelper<P, V, R>
where
    P: AttestationProvider,
    V: SignatureVerifier,
    R: RngCore + CryptoRng,
{
    pub fn with_nonce_generator(
        config: Config,
        provider: P,
        verifier: V,
        nonces: NonceGenerator<R>,
    ) -> Self {
        Self {
            config,
            provider,
            verifier,
            nonces,
        }
    }

    /// Run a test and report its outcome to `handler`, exactly once
    pub async fn start_test(&mut self, handler: impl Completion) {
        self.run().await.dispatch(handler)
    }

    /// Run a test.  Every failure along the way is folded into the returned
    /// result.
    pub async fn run(&mut self) -> VerificationResult {
        info!("running SafetyNet test for {}", self.config.package_name);
        let digests = &self.config.apk_certificate_digests;
        debug!("apkCertificateDigests: {digests:?}");

        let nonce = self.nonces.generate();
        debug!("request nonce: {}", hex::encode(nonce.as_bytes()));

        let req = AttestationRequest {
            nonce: &nonce,
            api_key: &self.config.api_key,
            package_name: &self.config.package_name,
            apk_certificate_digests: &self.config.apk_certificate_digests,
        };

        let jws = match self.provider.attest(&req).await {
            Ok(jws) => jws,
            Err(e) => return attestation_failure(e),
        };

        let Some(claims) = token::decode(&jws) else {
            return VerificationResult::error(
                ErrorKind::RequestUnsuccessful,
                "SafetyNet request unsuccessful",
            );
        };

        check_nonce_echo(&claims, &nonce);

        match evaluate(&claims, &self.config.api_key) {
            Decision::Report(r) => {
                if r.error_kind() == Some(ErrorKind::FailedSignatureValidationNoApiKey) {
                    warn!("No Google Device Verification ApiKey defined");
                }
                r
            }
            Decision::VerifySignature {
                cts_profile_match,
                basic_integrity,
            } => match self.verifier.verify(&self.config.api_key, &jws).await {
                Ok(true) => VerificationResult::success(cts_profile_match, basic_integrity),
                Ok(false) => VerificationResult::error(
                    ErrorKind::FailedSignatureValidation,
                    "Response signature invalid",
                ),
                Err(e) => VerificationResult::error(
                    ErrorKind::ErrorValidatingSignature,
                    format!("Response signature validation error: {e}"),
                ),
            },
        }
    }
}

fn attestation_failure(e: AttestationError) -> VerificationResult {
    match e {
        AttestationError::Api { .. } => {
            VerificationResult::error(ErrorKind::ValidationFailed, e.to_string())
        }
        // no token at all is the same as one that doesn't decode
        AttestationError::EmptyToken => VerificationResult::error(
            ErrorKind::RequestUnsuccessful,
            "SafetyNet request unsuccessful",
        ),
        AttestationError::Transport(_) | AttestationError::MalformedResponse(_) => {
            debug!("Error: {e}");
            VerificationResult::error(
                ErrorKind::ValidationFailed,
                "Response payload validation failed",
            )
        }
    }
}

// diagnostic only: the verdict is reported regardless
fn check_nonce_echo(claims: &Claims, nonce: &Nonce) {
    match claims.nonce.as_deref() {
        Some(echo) if echo != nonce.to_base64() => {
            warn!("nonce claim {echo} does not match the request nonce")
        }
        Some(_) => debug!("nonce claim matches the request nonce"),
        None => debug!("no nonce claim in response"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attest::StaticAttestationProvider;
    use crate::verify::VerifyError;
    use async_trait::async_trait;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::sync::oneshot;

    const TEST_JWS_PASS: &str = include_str!("../testdata/pass.jws");
    const TEST_JWS_CTS_FAIL: &str = include_str!("../testdata/cts-fail.jws");
    const TEST_JWS_ERROR: &str = include_str!("../testdata/error.jws");

    /// Verifier spy: answers with a canned verdict and counts calls
    struct SpyVerifier {
        verdict: Result<bool, VerifyError>,
        calls: AtomicUsize,
        seen: Mutex<Vec<(String, String)>>,
    }

    impl SpyVerifier {
        fn new(verdict: Result<bool, VerifyError>) -> Self {
            Self {
                verdict,
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl SignatureVerifier for &SpyVerifier {
        async fn verify(&self, api_key: &str, jws: &str) -> Result<bool, VerifyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen
                .lock()
                .unwrap()
                .push((api_key.to_string(), jws.to_string()));
            self.verdict.clone()
        }
    }

    struct FailingProvider(AttestationError);

    #[async_trait]
    impl AttestationProvider for FailingProvider {
        async fn attest(&self, _req: &AttestationRequest<'_>) -> Result<String, AttestationError> {
            Err(self.0.clone())
        }
    }

    /// Records the nonce of each request and answers with a fixed token
    struct RecordingProvider {
        jws: String,
        nonces: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl AttestationProvider for &RecordingProvider {
        async fn attest(&self, req: &AttestationRequest<'_>) -> Result<String, AttestationError> {
            self.nonces.lock().unwrap().push(req.nonce.to_base64());
            Ok(self.jws.clone())
        }
    }

    fn config(api_key: &str) -> Config {
        Config {
            api_key: api_key.to_string(),
            package_name: "com.hominoid.safetynet".to_string(),
            ..Default::default()
        }
    }

    fn message(r: &VerificationResult) -> &str {
        match r {
            VerificationResult::Error { message, .. } => message.as_str(),
            VerificationResult::Success { .. } => "",
        }
    }

    async fn run_failing(e: AttestationError) -> VerificationResult {
        let spy = SpyVerifier::new(Ok(true));
        let mut h = SafetyNetHelper::new(config("K"), FailingProvider(e), &spy);

        let r = h.run().await;

        assert_eq!(spy.calls.load(Ordering::SeqCst), 0);
        r
    }

    fn helper<'a>(
        api_key: &str,
        jws: &str,
        spy: &'a SpyVerifier,
    ) -> SafetyNetHelper<StaticAttestationProvider, &'a SpyVerifier> {
        SafetyNetHelper::new(config(api_key), StaticAttestationProvider::new(jws), spy)
    }

    #[tokio::test]
    async fn negative_verdict_skips_verifier() {
        let spy = SpyVerifier::new(Ok(true));

        for jws in [TEST_JWS_CTS_FAIL, TEST_JWS_ERROR] {
            for key in ["", "K"] {
                let mut h = helper(key, jws, &spy);
                let r = h.run().await;
                assert!(r.is_success());
            }
        }

        assert_eq!(spy.calls.load(Ordering::SeqCst), 0);

        let mut h = helper("K", TEST_JWS_CTS_FAIL, &spy);
        assert_eq!(h.run().await, VerificationResult::success(false, true));
    }

    #[tokio::test]
    async fn positive_verdict_without_key() {
        let spy = SpyVerifier::new(Ok(true));
        let mut h = helper("", TEST_JWS_PASS, &spy);

        let r = h.run().await;

        let kind = r.error_kind();
        assert_eq!(kind, Some(ErrorKind::FailedSignatureValidationNoApiKey));
        assert_eq!(spy.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn positive_verdict_verified() {
        let spy = SpyVerifier::new(Ok(true));
        let mut h = helper("K", TEST_JWS_PASS, &spy);

        assert_eq!(h.run().await, VerificationResult::success(true, true));
        assert_eq!(spy.calls.load(Ordering::SeqCst), 1);

        // the whole token goes to the verifier, untouched
        assert_eq!(
            spy.seen.lock().unwrap()[0],
            ("K".to_string(), TEST_JWS_PASS.to_string())
        );
    }

    #[tokio::test]
    async fn positive_verdict_bad_signature() {
        let spy = SpyVerifier::new(Ok(false));
        let mut h = helper("K", TEST_JWS_PASS, &spy);

        let r = h.run().await;

        assert_eq!(r.error_kind(), Some(ErrorKind::FailedSignatureValidation));
        assert_eq!(message(&r), "Response signature invalid");
    }

    #[tokio::test]
    async fn positive_verdict_verifier_unreachable() {
        let spy = SpyVerifier::new(Err(VerifyError::Transport("connection refused".into())));
        let mut h = helper("K", TEST_JWS_PASS, &spy);

        let r = h.run().await;

        assert_eq!(r.error_kind(), Some(ErrorKind::ErrorValidatingSignature));

        let m = message(&r);
        assert!(m.starts_with("Response signature validation error: "));
        assert!(m.ends_with("connection refused"));
    }

    #[tokio::test]
    async fn undecodable_token() {
        let spy = SpyVerifier::new(Ok(true));

        for jws in ["eyJhIjoxfQ==..", "a.b", "x.bnVsbA.y"] {
            let mut h = helper("K", jws, &spy);
            assert_eq!(
                h.run().await.error_kind(),
                Some(ErrorKind::RequestUnsuccessful)
            );
        }

        assert_eq!(spy.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn provider_api_error() {
        let e = AttestationError::Api {
            status_code: 7,
            message: "network error".into(),
        };

        let r = run_failing(e).await;

        assert_eq!(r.error_kind(), Some(ErrorKind::ValidationFailed));
        assert_eq!(message(&r), "ApiException[7] network error");
    }

    #[tokio::test]
    async fn provider_unusable_response() {
        let failures = [
            AttestationError::Transport("dns".into()),
            AttestationError::MalformedResponse("<html>".into()),
        ];

        for e in failures {
            let r = run_failing(e).await;

            assert_eq!(r.error_kind(), Some(ErrorKind::ValidationFailed));
            assert_eq!(message(&r), "Response payload validation failed");
        }
    }

    #[tokio::test]
    async fn provider_empty_token() {
        let r = run_failing(AttestationError::EmptyToken).await;

        assert_eq!(r.error_kind(), Some(ErrorKind::RequestUnsuccessful));
        assert_eq!(message(&r), "SafetyNet request unsuccessful");
    }

    #[tokio::test]
    async fn fresh_nonce_per_run() {
        let spy = SpyVerifier::new(Ok(true));
        let provider = RecordingProvider {
            jws: TEST_JWS_CTS_FAIL.to_string(),
            nonces: Mutex::new(Vec::new()),
        };

        let mut h = SafetyNetHelper::with_nonce_generator(
            config("K"),
            &provider,
            &spy,
            NonceGenerator::with_rng(StdRng::seed_from_u64(42)),
        );

        h.run().await;
        h.run().await;

        let nonces = provider.nonces.lock().unwrap();
        assert_eq!(nonces.len(), 2);
        assert_ne!(nonces[0], nonces[1]);
    }

    #[tokio::test]
    async fn start_test_reports_once() {
        let spy = SpyVerifier::new(Ok(true));
        let mut h = helper("K", TEST_JWS_PASS, &spy);

        let (tx, rx) = oneshot::channel();
        h.start_test(tx).await;

        let r = rx.await.unwrap();

        assert_eq!(r, VerificationResult::success(true, true));
    }
}
