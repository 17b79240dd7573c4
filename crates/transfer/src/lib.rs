//! Chunked file transfer with resume support and progress reporting.
//!
//! Payloads up to one chunk are sent in a single multipart request. Larger
//! payloads are split into fixed-size chunks sent sequentially with
//! `content-range` headers; the server-assigned resource ID returned by the
//! first chunk is forwarded as `x-appwrite-id` on every later chunk.

mod chunked;
mod progress;
mod source;
mod types;

pub use chunked::ChunkedUploader;
pub use progress::{ProgressCallback, UploadProgress};
pub use source::{BinarySource, FileSource, MemorySource};
pub use types::{ChunkRange, ChunkSession, ID_UNIQUE, UploadTarget, chunk_count, chunk_ranges};

/// Default chunk size: 5 MiB.
pub use appwrite_client::DEFAULT_CHUNK_SIZE;

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error(transparent)]
    Client(#[from] appwrite_client::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("upload cancelled")]
    Cancelled,
}

impl UploadError {
    /// HTTP status of the failed request, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            UploadError::Client(e) => e.status(),
            _ => None,
        }
    }
}
