//! Client error types.

/// Errors produced by the Appwrite client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with status >= 400.
    #[error("API error {code}: {message}")]
    Api {
        /// `message` of a JSON error body, or the raw response text.
        message: String,
        /// HTTP status code.
        code: u16,
        /// API error discriminator (`type` field), e.g. `storage_file_not_found`.
        kind: Option<String>,
        /// Raw response body.
        response: String,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid number in response: {0}")]
    Number(String),

    #[error("binary field {0:?} cannot be encoded as JSON")]
    BinaryInJson(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("configuration parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Builds an [`Error::Api`] from an error response.
    pub fn from_response(code: u16, content_type: &str, body: &[u8]) -> Self {
        let text = String::from_utf8_lossy(body).into_owned();

        let mut message = text.clone();
        let mut kind = None;
        if content_type.contains("application/json")
            && let Ok(value) = serde_json::from_slice::<serde_json::Value>(body)
        {
            if let Some(m) = value.get("message").and_then(|m| m.as_str()) {
                message = m.to_string();
            }
            kind = value
                .get("type")
                .and_then(|t| t.as_str())
                .map(str::to_string);
        }

        Error::Api {
            message,
            code,
            kind,
            response: text,
        }
    }

    /// HTTP status of an API error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { code, .. } => Some(*code),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns `true` for a 404 API response.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Api { code: 404, .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_error_body() {
        let body = br#"{"message":"File not found","code":404,"type":"storage_file_not_found","version":"1.5"}"#;
        let err = Error::from_response(404, "application/json; charset=utf-8", body);
        match &err {
            Error::Api {
                message,
                code,
                kind,
                response,
            } => {
                assert_eq!(message, "File not found");
                assert_eq!(*code, 404);
                assert_eq!(kind.as_deref(), Some("storage_file_not_found"));
                assert!(response.contains("\"version\""));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.is_not_found());
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn text_error_body() {
        let err = Error::from_response(502, "text/html", b"Bad Gateway");
        match err {
            Error::Api { message, kind, .. } => {
                assert_eq!(message, "Bad Gateway");
                assert!(kind.is_none());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn json_content_type_with_invalid_body_falls_back_to_text() {
        let err = Error::from_response(500, "application/json", b"oops");
        assert_eq!(err.to_string(), "API error 500: oops");
    }

    #[test]
    fn non_api_error_has_no_status() {
        let err = Error::Config("x".into());
        assert_eq!(err.status(), None);
        assert!(!err.is_not_found());
    }
}
