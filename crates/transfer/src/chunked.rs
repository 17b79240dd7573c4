use appwrite_client::{ApiRequest, Error as ClientError, FilePart, Method, Payload, Transport};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::types::{
    ChunkRange, ChunkSession, UploadTarget, chunk_count, chunk_ranges, response_id, response_u64,
};
use crate::{BinarySource, DEFAULT_CHUNK_SIZE, ProgressCallback, UploadError, UploadProgress};

/// Uploads binary payloads in fixed-size, range-bounded chunks.
///
/// Chunks are sent strictly one after another: chunk N+1 is only read and
/// sent once the response to chunk N has been processed. There is no
/// automatic retry; a failed chunk aborts the upload and calling
/// [`upload`](Self::upload) again with the same resource ID resumes it.
pub struct ChunkedUploader<'a> {
    transport: &'a dyn Transport,
    chunk_size: u64,
    cancel: CancellationToken,
}

impl<'a> ChunkedUploader<'a> {
    /// Creates an uploader. A `chunk_size` of 0 selects [`DEFAULT_CHUNK_SIZE`].
    pub fn new(transport: &'a dyn Transport, chunk_size: u64) -> Self {
        let chunk_size = if chunk_size == 0 {
            DEFAULT_CHUNK_SIZE
        } else {
            chunk_size
        };
        Self {
            transport,
            chunk_size,
            cancel: CancellationToken::new(),
        }
    }

    /// Uses `cancel` to stop the upload between chunks.
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    /// Uploads `source` to `target`, with `extra` sent as form fields on every request.
    ///
    /// Returns the decoded response to the last request.
    pub async fn upload(
        &self,
        target: &UploadTarget,
        source: &dyn BinarySource,
        extra: &Payload,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<Value, UploadError> {
        let size = source.size();

        if size <= self.chunk_size {
            return self.upload_whole(target, source, extra, on_progress).await;
        }

        let total_chunks = chunk_count(size, self.chunk_size);
        let mut session = ChunkSession::new(size, self.chunk_size);
        let mut first = 0;

        if let Some(id) = target.resume_id() {
            self.check_cancelled()?;
            if let Some(probe) = self.probe(target, id).await? {
                first = session.resume_from(probe);
                debug!(
                    id = %id,
                    chunks_uploaded = first,
                    chunks_total = total_chunks,
                    "resuming upload"
                );
            }
        }

        if session.is_complete() {
            let done = session.completed_progress();
            info!(id = %done.id, size, "upload already complete");
            if let Some(cb) = on_progress {
                cb(done);
            }
            return Ok(session.into_response());
        }

        for range in chunk_ranges(size, self.chunk_size, first) {
            self.check_cancelled()?;

            let data = source.slice(range.byte_range()).await?;
            debug!(
                index = range.index,
                start = range.start,
                end = range.end,
                len = range.len(),
                id = session.resource_id().unwrap_or_default(),
                "sending chunk"
            );

            let request = self.part_request(
                target,
                source,
                extra,
                data,
                Some((&range, size)),
                session.resource_id(),
            );
            let response = self.transport.call(request).await?.into_json();

            session.record(&range, response);
            if let Some(cb) = on_progress {
                cb(session.progress(&range));
            }
        }

        info!(
            id = session.resource_id().unwrap_or_default(),
            size,
            bytes = session.bytes_sent(),
            chunks = total_chunks - first,
            "upload complete"
        );
        Ok(session.into_response())
    }

    /// Sends the whole payload in one request without a `content-range` header.
    async fn upload_whole(
        &self,
        target: &UploadTarget,
        source: &dyn BinarySource,
        extra: &Payload,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<Value, UploadError> {
        self.check_cancelled()?;

        let size = source.size();
        let data = source.slice(0..size).await?;
        let request = self.part_request(target, source, extra, data, None, None);
        let response = self.transport.call(request).await?.into_json();

        let id = response_id(&response).unwrap_or_default();
        info!(id = %id, size, "upload complete");

        if let Some(cb) = on_progress {
            cb(UploadProgress {
                id,
                progress: 100.0,
                size_uploaded: size,
                chunks_total: response_u64(&response, "chunksTotal").max(1),
                chunks_uploaded: response_u64(&response, "chunksUploaded").max(1),
            });
        }
        Ok(response)
    }

    /// Checks for a partial upload of `id`.
    ///
    /// Any API error response means there is nothing to resume. Transport
    /// failures are returned, since the chunk requests would fail the same way.
    async fn probe(&self, target: &UploadTarget, id: &str) -> Result<Option<Value>, UploadError> {
        let request = ApiRequest::new(Method::GET, target.resource_path(id));
        match self.transport.call(request).await {
            Ok(response) => Ok(Some(response.into_json())),
            Err(err @ ClientError::Api { .. }) => {
                if err.is_not_found() {
                    debug!(id = %id, "no partial upload found, starting fresh");
                } else {
                    warn!(id = %id, error = %err, "resume probe failed, starting fresh");
                }
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn part_request(
        &self,
        target: &UploadTarget,
        source: &dyn BinarySource,
        extra: &Payload,
        data: Vec<u8>,
        range: Option<(&ChunkRange, u64)>,
        resource_id: Option<&str>,
    ) -> ApiRequest {
        let mut payload = extra.clone();
        payload.insert(
            target.field_name.clone(),
            FilePart {
                filename: source.filename().to_string(),
                data,
                mime_type: source.mime_type().map(str::to_string),
            },
        );

        let mut request = ApiRequest::new(target.method.clone(), target.path.clone())
            .with_header("content-type", "multipart/form-data")
            .with_payload(payload);
        if let Some((range, total)) = range {
            request = request.with_header("content-range", range.content_range(total));
        }
        if let Some(id) = resource_id {
            request = request.with_header("x-appwrite-id", id);
        }
        request
    }

    fn check_cancelled(&self) -> Result<(), UploadError> {
        if self.cancel.is_cancelled() {
            Err(UploadError::Cancelled)
        } else {
            Ok(())
        }
    }
}
