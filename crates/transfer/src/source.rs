use std::io::SeekFrom;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use appwrite_client::BoxFuture;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::sync::Mutex;

/// A named, sized byte sequence that can be read in arbitrary ranges.
pub trait BinarySource: Send + Sync {
    /// File name sent with each multipart part.
    fn filename(&self) -> &str;

    /// Total size in bytes, known up front.
    fn size(&self) -> u64;

    /// MIME type of the content; `application/octet-stream` when `None`.
    fn mime_type(&self) -> Option<&str> {
        None
    }

    /// Reads `range` (half-open). Called only with in-bounds ranges.
    fn read_range(&self, range: Range<u64>) -> BoxFuture<'_, std::io::Result<Vec<u8>>>;

    /// Reads `range`, which must lie within `0..size()`.
    ///
    /// # Panics
    ///
    /// Panics if the range is inverted or extends past the end of the source.
    fn slice(&self, range: Range<u64>) -> BoxFuture<'_, std::io::Result<Vec<u8>>> {
        assert!(
            range.start <= range.end && range.end <= self.size(),
            "slice {}..{} out of bounds for source of {} bytes",
            range.start,
            range.end,
            self.size()
        );
        self.read_range(range)
    }
}

// ---------------------------------------------------------------------------
// MemorySource
// ---------------------------------------------------------------------------

/// In-memory source.
#[derive(Debug, Clone)]
pub struct MemorySource {
    filename: String,
    data: Arc<[u8]>,
    mime_type: Option<String>,
}

impl MemorySource {
    pub fn new(filename: impl Into<String>, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            filename: filename.into(),
            data: data.into(),
            mime_type: None,
        }
    }

    pub fn with_mime_type(mut self, mime: impl Into<String>) -> Self {
        self.mime_type = Some(mime.into());
        self
    }
}

impl BinarySource for MemorySource {
    fn filename(&self) -> &str {
        &self.filename
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    fn read_range(&self, range: Range<u64>) -> BoxFuture<'_, std::io::Result<Vec<u8>>> {
        let bytes = self.data[range.start as usize..range.end as usize].to_vec();
        Box::pin(async move { Ok(bytes) })
    }
}

// ---------------------------------------------------------------------------
// FileSource
// ---------------------------------------------------------------------------

/// File on disk, read range by range without loading it whole.
pub struct FileSource {
    file: Mutex<File>,
    path: PathBuf,
    filename: String,
    size: u64,
    mime_type: Option<String>,
}

impl FileSource {
    /// Opens `path`. The size is taken from the file metadata at open time.
    pub async fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).await?;
        let size = file.metadata().await?.len();
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".into());
        Ok(Self {
            file: Mutex::new(file),
            path,
            filename,
            size,
            mime_type: None,
        })
    }

    /// Overrides the file name sent to the server.
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }

    pub fn with_mime_type(mut self, mime: impl Into<String>) -> Self {
        self.mime_type = Some(mime.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BinarySource for FileSource {
    fn filename(&self) -> &str {
        &self.filename
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    fn read_range(&self, range: Range<u64>) -> BoxFuture<'_, std::io::Result<Vec<u8>>> {
        Box::pin(async move {
            let mut file = self.file.lock().await;
            file.seek(SeekFrom::Start(range.start)).await?;
            let mut buf = vec![0u8; (range.end - range.start) as usize];
            // A file truncated since open() surfaces as UnexpectedEof.
            file.read_exact(&mut buf).await?;
            Ok(buf)
        })
    }
}

impl std::fmt::Debug for FileSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileSource")
            .field("path", &self.path)
            .field("filename", &self.filename)
            .field("size", &self.size)
            .finish()
    }
}
