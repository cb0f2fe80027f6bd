// Copyright 2026 Contributors to the safetynet-rs project.
// SPDX-License-Identifier: Apache-2.0

//! The outcome of a SafetyNet test run and the stable error taxonomy callers
//! branch on.

use serde::Serialize;
use tokio::sync::oneshot;
use tracing::warn;

const SIGNATURE_ERROR: &str = "SafetyNet request: success\nResponse signature validation: error";
const SIGNATURE_FAIL: &str = "SafetyNet request: success\nResponse signature validation: fail";
const VALIDATION_FAIL: &str = "SafetyNet request: success\nResponse validation: fail";
const REQUEST_FAILED: &str = "SafetyNet request failed\n(This could be a networking issue.)";

/// Failure classes, with the stable integer codes reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "i32")]
pub enum ErrorKind {
    /// The attestation request failed, or returned a token that couldn't be
    /// decoded
    RequestUnsuccessful,
    /// The signature verification call itself failed
    ErrorValidatingSignature,
    /// The attestation provider reported an error
    ValidationFailed,
    /// The verification endpoint said the signature is not valid
    FailedSignatureValidation,
    /// Positive verdict, but no API key to have its signature verified
    FailedSignatureValidationNoApiKey,
}

impl ErrorKind {
    pub const fn code(self) -> i32 {
        match self {
            ErrorKind::RequestUnsuccessful => 999,
            ErrorKind::ErrorValidatingSignature => 1000,
            ErrorKind::ValidationFailed => 1001,
            ErrorKind::FailedSignatureValidation => 1002,
            ErrorKind::FailedSignatureValidationNoApiKey => 1003,
        }
    }

    pub fn from_code(code: i32) -> Option<ErrorKind> {
        match code {
            999 => Some(ErrorKind::RequestUnsuccessful),
            1000 => Some(ErrorKind::ErrorValidatingSignature),
            1001 => Some(ErrorKind::ValidationFailed),
            1002 => Some(ErrorKind::FailedSignatureValidation),
            1003 => Some(ErrorKind::FailedSignatureValidationNoApiKey),
            _ => None,
        }
    }

    /// Human readable explanation of where in the flow things went wrong
    pub fn summary(self) -> &'static str {
        match self {
            ErrorKind::RequestUnsuccessful => REQUEST_FAILED,
            ErrorKind::ErrorValidatingSignature => SIGNATURE_ERROR,
            ErrorKind::ValidationFailed => VALIDATION_FAIL,
            ErrorKind::FailedSignatureValidation => SIGNATURE_FAIL,
            ErrorKind::FailedSignatureValidationNoApiKey => REQUEST_FAILED,
        }
    }
}

impl From<ErrorKind> for i32 {
    fn from(k: ErrorKind) -> Self {
        k.code()
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Terminal outcome of one test run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "lowercase")]
pub enum VerificationResult {
    #[serde(rename_all = "camelCase")]
    Success {
        cts_profile_match: bool,
        basic_integrity: bool,
    },
    Error {
        #[serde(rename = "code")]
        kind: ErrorKind,
        message: String,
    },
}

impl VerificationResult {
    pub fn success(cts_profile_match: bool, basic_integrity: bool) -> Self {
        VerificationResult::Success {
            cts_profile_match,
            basic_integrity,
        }
    }

    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        VerificationResult::Error {
            kind,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, VerificationResult::Success { .. })
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            VerificationResult::Error { kind, .. } => Some(*kind),
            VerificationResult::Success { .. } => None,
        }
    }

    /// Hand the result to its completion handler.  Both consume their
    /// receiver, so a result is reported at most once.
    pub fn dispatch(self, handler: impl Completion) {
        match self {
            VerificationResult::Success {
                cts_profile_match,
                basic_integrity,
            } => handler.success(cts_profile_match, basic_integrity),
            VerificationResult::Error { kind, message } => handler.error(kind.code(), message),
        }
    }
}

impl std::fmt::Display for VerificationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VerificationResult::Success {
                cts_profile_match,
                basic_integrity,
            } => {
                writeln!(f, "SafetyNet req success: ")?;
                writeln!(f, "ctsProfileMatch : {cts_profile_match} and ")?;
                write!(f, "basicIntegrity : {basic_integrity}")
            }
            VerificationResult::Error { kind, message } => {
                write!(f, "{}\n\n{message}", kind.summary())
            }
        }
    }
}

/// Caller-supplied receiver of a test run's outcome
pub trait Completion {
    fn success(self, cts_profile_match: bool, basic_integrity: bool);
    fn error(self, error_code: i32, error_message: String);
}

impl Completion for oneshot::Sender<VerificationResult> {
    fn success(self, cts_profile_match: bool, basic_integrity: bool) {
        let r = VerificationResult::success(cts_profile_match, basic_integrity);

        // the receiver may have gone away, nobody is left to tell
        let _ = self.send(r);
    }

    /// Codes outside [`ErrorKind`] are delivered as
    /// [`ErrorKind::RequestUnsuccessful`], with a warning.
    fn error(self, error_code: i32, error_message: String) {
        let kind = match ErrorKind::from_code(error_code) {
            Some(kind) => kind,
            None => {
                warn!("unknown error code {error_code}, delivered as 999");
                ErrorKind::RequestUnsuccessful
            }
        };

        let _ = self.send(VerificationResult::error(kind, error_message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder {
        calls: RefCell<Vec<String>>,
    }

    impl Completion for &Recorder {
        fn success(self, cts_profile_match: bool, basic_integrity: bool) {
            self.calls
                .borrow_mut()
                .push(format!("success {cts_profile_match} {basic_integrity}"));
        }

        fn error(self, error_code: i32, error_message: String) {
            self.calls
                .borrow_mut()
                .push(format!("error {error_code} {error_message}"));
        }
    }

    #[test]
    fn stable_codes() {
        let all = [
            (ErrorKind::RequestUnsuccessful, 999),
            (ErrorKind::ErrorValidatingSignature, 1000),
            (ErrorKind::ValidationFailed, 1001),
            (ErrorKind::FailedSignatureValidation, 1002),
            (ErrorKind::FailedSignatureValidationNoApiKey, 1003),
        ];

        for (k, c) in all {
            assert_eq!(k.code(), c);
            assert_eq!(ErrorKind::from_code(c), Some(k));
        }

        assert_eq!(ErrorKind::from_code(0), None);
    }

    #[test]
    fn dispatch_success_once() {
        let r = Recorder::default();

        VerificationResult::success(true, false).dispatch(&r);

        assert_eq!(r.calls.take(), ["success true false"]);
    }

    #[test]
    fn dispatch_error_once() {
        let r = Recorder::default();

        let e = VerificationResult::error(ErrorKind::FailedSignatureValidation, "bad");
        e.dispatch(&r);

        assert_eq!(r.calls.take(), ["error 1002 bad"]);
    }

    #[test]
    fn dispatch_through_oneshot() {
        let (tx, mut rx) = oneshot::channel();

        let sent = VerificationResult::error(ErrorKind::ValidationFailed, "x");
        sent.clone().dispatch(tx);

        assert_eq!(rx.try_recv().unwrap(), sent);
    }

    #[test]
    fn unknown_code_through_oneshot() {
        let (tx, mut rx) = oneshot::channel();

        tx.error(7, "x".to_string());

        let r = rx.try_recv().unwrap();
        assert_eq!(r.error_kind(), Some(ErrorKind::RequestUnsuccessful));
    }

    #[test]
    fn display() {
        let s = VerificationResult::success(true, true).to_string();
        assert_eq!(
            s,
            "SafetyNet req success: \nctsProfileMatch : true and \nbasicIntegrity : true"
        );

        let e = VerificationResult::error(ErrorKind::FailedSignatureValidation, "bad");
        assert_eq!(
            e.to_string(),
            "SafetyNet request: success\nResponse signature validation: fail\n\nbad"
        );

        let e = VerificationResult::error(ErrorKind::FailedSignatureValidationNoApiKey, "k");
        assert!(e.to_string().starts_with("SafetyNet request failed\n"));
    }

    #[test]
    fn serialize() {
        let v = serde_json::to_value(VerificationResult::success(false, true)).unwrap();

        assert_eq!(v["result"], "success");
        assert_eq!(v["ctsProfileMatch"], false);
        assert_eq!(v["basicIntegrity"], true);

        let e = VerificationResult::error(ErrorKind::FailedSignatureValidationNoApiKey, "no key");
        let v = serde_json::to_value(e).unwrap();

        assert_eq!(v["result"], "error");
        assert_eq!(v["code"], 1003);
        assert_eq!(v["message"], "no key");
    }
}
