//! Decoded API responses.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use serde_json::{Number, Value};

use crate::Error;

/// Largest integer magnitude a double represents exactly (2^53 - 1).
pub const MAX_SAFE_INTEGER: i64 = 9_007_199_254_740_991;

/// A successful response body.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    /// `application/json` body.
    Json(Value),
    /// Raw bytes (downloads, previews, or `application/octet-stream`).
    Binary(Vec<u8>),
    /// Any other body, kept as text.
    Message(String),
}

impl ApiResponse {
    /// Decodes a response body according to its content type.
    ///
    /// JSON numbers keep their exact textual value, so integers beyond
    /// [`MAX_SAFE_INTEGER`] survive decoding; see [`classify_number`].
    pub fn decode(content_type: &str, expect_bytes: bool, body: &[u8]) -> Result<Self, Error> {
        if content_type.contains("application/json") {
            if body.is_empty() {
                return Ok(ApiResponse::Json(Value::Null));
            }
            return Ok(ApiResponse::Json(serde_json::from_slice(body)?));
        }
        if expect_bytes || content_type.contains("application/octet-stream") {
            return Ok(ApiResponse::Binary(body.to_vec()));
        }
        Ok(ApiResponse::Message(
            String::from_utf8_lossy(body).into_owned(),
        ))
    }

    /// Returns the JSON body, if any.
    pub fn json(&self) -> Option<&Value> {
        match self {
            ApiResponse::Json(v) => Some(v),
            _ => None,
        }
    }

    /// Converts into a JSON value.
    ///
    /// Text bodies become `{"message": <text>}`; binary bodies become `null`.
    pub fn into_json(self) -> Value {
        match self {
            ApiResponse::Json(v) => v,
            ApiResponse::Message(text) => serde_json::json!({ "message": text }),
            ApiResponse::Binary(_) => Value::Null,
        }
    }

    /// Converts into raw bytes. JSON and text bodies are returned as their UTF-8 text.
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            ApiResponse::Binary(b) => b,
            ApiResponse::Message(text) => text.into_bytes(),
            ApiResponse::Json(v) => v.to_string().into_bytes(),
        }
    }
}

/// A JSON number classified by how it can be represented without loss.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonNumber {
    /// Integer within `±MAX_SAFE_INTEGER`.
    Int(i64),
    /// Integer outside the safe range, kept at full precision.
    BigInt(BigDecimal),
    /// Number with a fraction or exponent.
    Float(f64),
}

/// Classifies a decoded JSON number.
pub fn classify_number(n: &Number) -> Result<JsonNumber, Error> {
    let text = n.to_string();
    if text.contains(['.', 'e', 'E']) {
        return text
            .parse::<f64>()
            .map(JsonNumber::Float)
            .map_err(|_| Error::Number(text));
    }
    if let Some(i) = n.as_i64()
        && i.abs() <= MAX_SAFE_INTEGER
    {
        return Ok(JsonNumber::Int(i));
    }
    BigDecimal::from_str(&text)
        .map(JsonNumber::BigInt)
        .map_err(|_| Error::Number(text))
}
