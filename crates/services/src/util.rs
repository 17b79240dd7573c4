use appwrite_transfer::ProgressCallback;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::Error;

/// Optional knobs for upload calls.
#[derive(Default)]
pub struct UploadOptions {
    /// Invoked after each acknowledged chunk.
    pub on_progress: Option<ProgressCallback>,
    /// Stops the upload between chunks when cancelled.
    pub cancel: Option<CancellationToken>,
}

impl UploadOptions {
    pub fn with_progress(mut self, cb: ProgressCallback) -> Self {
        self.on_progress = Some(cb);
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

/// Fails with [`Error::MissingParameter`] when `value` is empty.
pub(crate) fn require(name: &'static str, value: &str) -> Result<(), Error> {
    if value.is_empty() {
        return Err(Error::MissingParameter(name));
    }
    Ok(())
}

pub(crate) fn parse<T: DeserializeOwned>(value: Value) -> Result<T, Error> {
    Ok(serde_json::from_value(value)?)
}
