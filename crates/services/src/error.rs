//! Service error types.

/// Errors produced by service calls.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required parameter was empty. No request was sent.
    #[error("missing required parameter: \"{0}\"")]
    MissingParameter(&'static str),

    #[error(transparent)]
    Client(#[from] appwrite_client::Error),

    #[error(transparent)]
    Upload(#[from] appwrite_transfer::UploadError),

    #[error("unexpected response: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// HTTP status of the failed request, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Client(e) => e.status(),
            Error::Upload(e) => e.status(),
            _ => None,
        }
    }
}
