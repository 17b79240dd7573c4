use std::ops::Range;

use appwrite_client::{Method, path_segment};
use serde_json::Value;

use crate::UploadProgress;

/// Resource ID sentinel asking the server to mint a new ID.
pub const ID_UNIQUE: &str = "unique()";

/// Destination of a chunked upload.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadTarget {
    /// Write verb, normally `POST`.
    pub method: Method,
    /// Collection path, e.g. `/storage/buckets/{bucketId}/files`.
    pub path: String,
    /// Multipart field holding the binary content (`file`, `code`).
    pub field_name: String,
    /// Client-chosen resource ID; `None` or [`ID_UNIQUE`] lets the server choose.
    pub resource_id: Option<String>,
    /// Probe `{path}/{resource_id}` before uploading to resume a partial upload.
    pub resumable: bool,
}

impl UploadTarget {
    pub fn new(method: Method, path: impl Into<String>, field_name: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            field_name: field_name.into(),
            resource_id: None,
            resumable: false,
        }
    }

    pub fn with_resource_id(mut self, id: impl Into<String>) -> Self {
        self.resource_id = Some(id.into());
        self
    }

    pub fn resumable(mut self) -> Self {
        self.resumable = true;
        self
    }

    /// Resource ID to probe for, when resuming applies.
    pub fn resume_id(&self) -> Option<&str> {
        if !self.resumable {
            return None;
        }
        self.resource_id
            .as_deref()
            .filter(|id| !id.is_empty() && *id != ID_UNIQUE)
    }

    /// `{path}/{id}` with `id` escaped as a single path segment.
    pub fn resource_path(&self, id: &str) -> String {
        format!("{}/{}", self.path, path_segment(id))
    }
}

/// One chunk's byte range. `end` is inclusive, as in `content-range`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkRange {
    pub index: u64,
    pub start: u64,
    pub end: u64,
}

impl ChunkRange {
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Half-open range for slicing the source.
    pub fn byte_range(&self) -> Range<u64> {
        self.start..self.end + 1
    }

    /// `content-range` header value.
    pub fn content_range(&self, total: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, total)
    }
}

/// Number of chunks needed for `size` bytes.
pub fn chunk_count(size: u64, chunk_size: u64) -> u64 {
    size.div_ceil(chunk_size)
}

/// Chunk ranges covering `[0, size)`, starting at chunk `first`.
pub fn chunk_ranges(size: u64, chunk_size: u64, first: u64) -> impl Iterator<Item = ChunkRange> {
    (first..chunk_count(size, chunk_size)).map(move |index| {
        let start = index * chunk_size;
        let end = (start + chunk_size).min(size) - 1;
        ChunkRange { index, start, end }
    })
}

/// Per-call state of a chunked upload.
///
/// Owned by a single `upload()` call and dropped when it returns.
#[derive(Debug)]
pub struct ChunkSession {
    resource_id: Option<String>,
    bytes_sent: u64,
    chunk_size: u64,
    size: u64,
    last_response: Value,
}

impl ChunkSession {
    pub fn new(size: u64, chunk_size: u64) -> Self {
        Self {
            resource_id: None,
            bytes_sent: 0,
            chunk_size,
            size,
            last_response: Value::Null,
        }
    }

    /// Seeds the session from a resume probe response.
    ///
    /// Returns the index of the first chunk still to be sent. The resource ID
    /// is left unset: it is taken from the first chunk response of this call.
    pub fn resume_from(&mut self, probe: Value) -> u64 {
        let uploaded = response_u64(&probe, "chunksUploaded")
            .min(chunk_count(self.size, self.chunk_size));
        self.bytes_sent = (uploaded * self.chunk_size).min(self.size);
        self.last_response = probe;
        uploaded
    }

    pub fn resource_id(&self) -> Option<&str> {
        self.resource_id.as_deref()
    }

    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent
    }

    pub fn is_complete(&self) -> bool {
        self.bytes_sent >= self.size
    }

    /// Records the server's response to `range`.
    ///
    /// The first response that carries `$id` fixes the resource ID.
    pub fn record(&mut self, range: &ChunkRange, response: Value) {
        if self.resource_id.is_none() {
            self.resource_id = response_id(&response);
        }
        self.bytes_sent = range.end + 1;
        self.last_response = response;
    }

    /// Progress after the chunk `range` was acknowledged.
    pub fn progress(&self, range: &ChunkRange) -> UploadProgress {
        let sent = ((range.index + 1) * self.chunk_size).min(self.size);
        UploadProgress {
            id: self.resource_id.clone().unwrap_or_default(),
            progress: percent(sent, self.size),
            size_uploaded: range.end + 1,
            chunks_total: response_u64(&self.last_response, "chunksTotal"),
            chunks_uploaded: response_u64(&self.last_response, "chunksUploaded"),
        }
    }

    /// Progress for a payload that is already fully on the server.
    pub fn completed_progress(&self) -> UploadProgress {
        UploadProgress {
            id: self
                .resource_id
                .clone()
                .or_else(|| response_id(&self.last_response))
                .unwrap_or_default(),
            progress: 100.0,
            size_uploaded: self.size,
            chunks_total: response_u64(&self.last_response, "chunksTotal"),
            chunks_uploaded: response_u64(&self.last_response, "chunksUploaded"),
        }
    }

    pub fn into_response(self) -> Value {
        self.last_response
    }
}

fn percent(sent: u64, size: u64) -> f64 {
    if size == 0 {
        return 100.0;
    }
    sent as f64 / size as f64 * 100.0
}

pub(crate) fn response_id(response: &Value) -> Option<String> {
    response
        .get("$id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

pub(crate) fn response_u64(response: &Value, field: &str) -> u64 {
    response.get(field).and_then(Value::as_u64).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const MIB5: u64 = 5 * 1024 * 1024;

    #[test]
    fn ranges_for_literal_example() {
        let ranges: Vec<_> = chunk_ranges(12_000_000, MIB5, 0).collect();
        assert_eq!(chunk_count(12_000_000, MIB5), 3);
        assert_eq!(
            ranges
                .iter()
                .map(|r| (r.start, r.end))
                .collect::<Vec<_>>(),
            vec![(0, 5_242_879), (5_242_880, 10_485_759), (10_485_760, 11_999_999)]
        );
    }

    #[test]
    fn ranges_partition_without_gaps_or_overlap() {
        for &(size, chunk) in &[(11, 4), (12, 4), (13, 4), (1, 1), (MIB5 + 1, MIB5), (3 * MIB5, MIB5)] {
            let ranges: Vec<_> = chunk_ranges(size, chunk, 0).collect();
            assert_eq!(ranges.first().unwrap().start, 0);
            assert_eq!(ranges.last().unwrap().end, size - 1);
            for pair in ranges.windows(2) {
                assert_eq!(pair[0].end + 1, pair[1].start);
            }
            assert!(ranges.iter().all(|r| r.len() <= chunk && r.end < size));
            assert_eq!(ranges.iter().map(ChunkRange::len).sum::<u64>(), size);
        }
    }

    #[test]
    fn ranges_start_at_resume_index() {
        let ranges: Vec<_> = chunk_ranges(10, 4, 1).collect();
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges[0], ChunkRange { index: 1, start: 4, end: 7 });
        assert_eq!(ranges[1], ChunkRange { index: 2, start: 8, end: 9 });
    }

    #[test]
    fn content_range_header() {
        let r = ChunkRange { index: 2, start: 10_485_760, end: 11_999_999 };
        assert_eq!(r.content_range(12_000_000), "bytes 10485760-11999999/12000000");
        assert_eq!(r.byte_range(), 10_485_760..12_000_000);
    }

    #[test]
    fn resume_id_ignores_unique_sentinel() {
        let t = UploadTarget::new(Method::POST, "/f", "file").with_resource_id(ID_UNIQUE).resumable();
        assert_eq!(t.resume_id(), None);

        let t = UploadTarget::new(Method::POST, "/f", "file").with_resource_id("abc").resumable();
        assert_eq!(t.resume_id(), Some("abc"));

        let t = UploadTarget::new(Method::POST, "/f", "file").with_resource_id("abc");
        assert_eq!(t.resume_id(), None);
    }

    #[test]
    fn session_captures_first_id_only() {
        let mut s = ChunkSession::new(10, 4);
        assert!(s.resource_id().is_none());

        let ranges: Vec<_> = chunk_ranges(10, 4, 0).collect();
        s.record(&ranges[0], json!({"$id": "first"}));
        assert_eq!(s.resource_id(), Some("first"));
        s.record(&ranges[1], json!({"$id": "other"}));
        assert_eq!(s.resource_id(), Some("first"));
        assert_eq!(s.bytes_sent(), 8);
        assert!(!s.is_complete());
        s.record(&ranges[2], json!({"$id": "first"}));
        assert!(s.is_complete());
    }

    #[test]
    fn session_resume_seeds_offset_but_not_id() {
        let mut s = ChunkSession::new(10, 4);
        let next = s.resume_from(json!({"$id": "f1", "chunksUploaded": 2, "chunksTotal": 3}));
        assert_eq!(next, 2);
        assert!(s.resource_id().is_none());
        assert_eq!(s.bytes_sent(), 8);
        assert!(!s.is_complete());

        let last = chunk_ranges(10, 4, next).next().unwrap();
        s.record(&last, json!({"$id": "f1", "chunksUploaded": 3}));
        assert_eq!(s.resource_id(), Some("f1"));
    }

    #[test]
    fn session_resume_clamps_to_chunk_count() {
        let mut s = ChunkSession::new(10, 4);
        assert_eq!(s.resume_from(json!({"$id": "done", "chunksUploaded": 99})), 3);
        assert!(s.is_complete());
        assert_eq!(s.completed_progress().id, "done");
    }

    #[test]
    fn resource_path_escapes_id() {
        let t = UploadTarget::new(Method::POST, "/storage/buckets/b1/files", "file");
        assert_eq!(t.resource_path("file-1"), "/storage/buckets/b1/files/file-1");
        assert_eq!(t.resource_path("a b"), "/storage/buckets/b1/files/a%20b");
        assert_eq!(t.resource_path("x/y?z#"), "/storage/buckets/b1/files/x%2Fy%3Fz%23");
    }

    #[test]
    fn progress_uses_server_counters() {
        let mut s = ChunkSession::new(12_000_000, MIB5);
        let first = chunk_ranges(12_000_000, MIB5, 0).next().unwrap();
        s.record(&first, json!({"$id": "f", "chunksTotal": 3, "chunksUploaded": 1}));
        let p = s.progress(&first);
        assert_eq!(p.id, "f");
        assert_eq!(p.size_uploaded, 5_242_880);
        assert_eq!(p.chunks_total, 3);
        assert_eq!(p.chunks_uploaded, 1);
        assert!((p.progress - 43.690_666).abs() < 0.001);
    }
}
