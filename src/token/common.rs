// Copyright 2026 Contributors to the safetynet-rs project.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use serde_json::Value;

pub fn to_tstr(v: &Value, name: &str) -> Result<String, Error> {
    match v {
        Value::String(s) => Ok(s.clone()),
        _ => Err(Error::TypeMismatch(format!(
            "{name}: expecting string, got {v}"
        ))),
    }
}

pub fn to_bool(v: &Value, name: &str) -> Result<bool, Error> {
    match v {
        Value::Bool(b) => Ok(*b),
        _ => Err(Error::TypeMismatch(format!(
            "{name}: expecting bool, got {v}"
        ))),
    }
}

pub fn to_int(v: &Value, name: &str) -> Result<i64, Error> {
    match v.as_i64() {
        Some(i) => Ok(i),
        None => Err(Error::TypeMismatch(format!(
            "{name}: expecting integer, got {v}"
        ))),
    }
}

pub fn to_tstr_array(v: &Value, name: &str) -> Result<Vec<String>, Error> {
    let Value::Array(items) = v else {
        return Err(Error::TypeMismatch(format!(
            "{name}: expecting array, got {v}"
        )));
    };

    items
        .iter()
        .map(|x| to_tstr(x, name))
        .collect::<Result<Vec<String>, Error>>()
}
