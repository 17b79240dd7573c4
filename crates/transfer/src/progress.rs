use serde::{Deserialize, Serialize};

/// Callback invoked after each acknowledged chunk.
pub type ProgressCallback = Box<dyn Fn(UploadProgress) + Send + Sync>;

/// Upload progress reported to a [`ProgressCallback`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadProgress {
    /// Server-assigned resource ID (empty until the server returned one).
    pub id: String,
    /// Percentage in `0.0..=100.0`.
    pub progress: f64,
    /// Bytes acknowledged so far.
    pub size_uploaded: u64,
    /// Chunk count echoed by the server.
    pub chunks_total: u64,
    /// Chunks the server holds.
    pub chunks_uploaded: u64,
}
