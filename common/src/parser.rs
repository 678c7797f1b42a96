// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

//! Decoding of the sensor JSON payload.
//!
//! The payload is a JSON object with the optional keys `temperature`,
//! `humidity` and `co2`. Each key is extracted on its own, so a broken or
//! missing value only blanks that one field.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde_json::value::RawValue;
use serde_json::Value;

use crate::reading::SensorReading;

/// The payload could not be decoded as a JSON object at all.
#[derive(thiserror::Error, Clone, Debug, PartialEq)]
pub enum ParseError {
    #[error("payload is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("payload is a JSON {0}, expected an object")]
    NotAnObject(&'static str),
}

/// Decodes `body` into a [`SensorReading`].
pub fn parse(body: &[u8]) -> Result<SensorReading, ParseError> {
    // Only check the syntax here, values are decoded per field below so an
    // unrepresentable number blanks just its own field.
    let raw: &RawValue =
        serde_json::from_slice(body).map_err(|e| ParseError::InvalidJson(e.to_string()))?;

    let kind = json_type_name(raw);
    if kind != "object" {
        return Err(ParseError::NotAnObject(kind));
    }

    let object: HashMap<String, &RawValue> =
        serde_json::from_str(raw.get()).map_err(|e| ParseError::InvalidJson(e.to_string()))?;

    Ok(SensorReading::new(
        field::<f64>(&object, "temperature"),
        field::<f64>(&object, "humidity"),
        co2_field(&object),
    ))
}

fn field<T: DeserializeOwned>(object: &HashMap<String, &RawValue>, key: &str) -> Option<T> {
    object
        .get(key)
        .and_then(|raw| serde_json::from_str(raw.get()).ok())
}

// Fractional values are truncated toward zero, negative values are dropped.
fn co2_field(object: &HashMap<String, &RawValue>) -> Option<u64> {
    let value: Value = field(object, "co2")?;

    if let Some(ppm) = value.as_u64() {
        return Some(ppm);
    }

    value
        .as_f64()
        .filter(|ppm| ppm.is_finite() && ppm.trunc() >= 0.0)
        .map(|ppm| ppm.trunc() as u64)
}

fn json_type_name(raw: &RawValue) -> &'static str {
    match raw.get().trim_start().as_bytes().first() {
        Some(b'{') => "object",
        Some(b'[') => "array",
        Some(b'"') => "string",
        Some(b't' | b'f') => "boolean",
        Some(b'n') => "null",
        _ => "number",
    }
}
