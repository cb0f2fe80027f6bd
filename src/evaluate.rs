// Copyright 2026 Contributors to the safetynet-rs project.
// SPDX-License-Identifier: Apache-2.0

use crate::result::{ErrorKind, VerificationResult};
use crate::token::Claims;

const NO_API_KEY: &str = "No Google Device Verification ApiKey defined. Marking as failed.";

/// What to do with a decoded claims-set
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Report this result as-is, no further checks needed
    Report(VerificationResult),
    /// Both verdicts are positive: they can only be trusted once the JWS
    /// signature has been verified
    VerifySignature {
        cts_profile_match: bool,
        basic_integrity: bool,
    },
}

/// Decide whether the claims need their signature verified before being
/// reported.  A negative verdict asserts nothing worth protecting and is
/// reported straight away; a positive one is never reported unverified.
pub fn evaluate(claims: &Claims, api_key: &str) -> Decision {
    let (cts, basic) = (claims.cts_profile_match, claims.basic_integrity);

    if !cts || !basic {
        return Decision::Report(VerificationResult::success(cts, basic));
    }

    if api_key.is_empty() {
        let message = format!("{NO_API_KEY} SafetyNet CtsProfileMatch: {cts}");
        let r = VerificationResult::error(ErrorKind::FailedSignatureValidationNoApiKey, message);

        return Decision::Report(r);
    }

    Decision::VerifySignature {
        cts_profile_match: cts,
        basic_integrity: basic,
    }
}
