// Copyright 2026 Contributors to the safetynet-rs project.
// SPDX-License-Identifier: Apache-2.0

#[derive(thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("Syntax error: {0}")]
    Syntax(String),
    #[error("Base64 error: {0}")]
    Base64(String),
    #[error("JSON error: {0}")]
    Json(String),
    #[error("Payload error: {0}")]
    Payload(String),
    #[error("Claim type mismatch: {0}")]
    TypeMismatch(String),
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Syntax(e)
            | Error::Base64(e)
            | Error::Json(e)
            | Error::Payload(e)
            | Error::TypeMismatch(e) => {
                write!(f, "{}", e)
            }
        }
    }
}
