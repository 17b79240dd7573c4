//! Storage service: buckets and files.

use std::sync::Arc;

use appwrite_client::{ApiRequest, Client, Method, Payload, Transport, path_segment};
use appwrite_transfer::{BinarySource, ChunkedUploader, UploadTarget};
use tracing::debug;

use crate::models::{File, FileList};
use crate::util::{UploadOptions, parse, require};
use crate::Error;

/// Storage API.
#[derive(Clone)]
pub struct Storage {
    transport: Arc<dyn Transport>,
    chunk_size: u64,
}

impl Storage {
    pub fn new(client: Client) -> Self {
        let chunk_size = client.chunk_size();
        Self::with_transport(Arc::new(client), chunk_size)
    }

    /// Creates the service on top of any transport.
    pub fn with_transport(transport: Arc<dyn Transport>, chunk_size: u64) -> Self {
        Self {
            transport,
            chunk_size,
        }
    }

    /// Uploads a file to a bucket.
    ///
    /// Files larger than the chunk size are uploaded in chunks. With a
    /// concrete `file_id` (not `unique()`), an interrupted upload of the same
    /// ID resumes from the last chunk the server acknowledged.
    pub async fn create_file(
        &self,
        bucket_id: &str,
        file_id: &str,
        file: &dyn BinarySource,
        permissions: Option<&[String]>,
        options: &UploadOptions,
    ) -> Result<File, Error> {
        require("bucketId", bucket_id)?;
        require("fileId", file_id)?;

        let path = format!("/storage/buckets/{}/files", path_segment(bucket_id));
        let target = UploadTarget::new(Method::POST, path, "file")
            .with_resource_id(file_id)
            .resumable();

        let mut extra = Payload::new().with("fileId", file_id);
        if let Some(permissions) = permissions {
            extra.insert("permissions", permissions.to_vec());
        }

        debug!(bucket = %bucket_id, file = %file_id, size = file.size(), "creating file");
        let mut uploader = ChunkedUploader::new(self.transport.as_ref(), self.chunk_size);
        if let Some(cancel) = &options.cancel {
            uploader = uploader.with_cancel(cancel.clone());
        }
        let response = uploader
            .upload(&target, file, &extra, options.on_progress.as_ref())
            .await?;
        parse(response)
    }

    /// Returns a file's metadata.
    pub async fn get_file(&self, bucket_id: &str, file_id: &str) -> Result<File, Error> {
        require("bucketId", bucket_id)?;
        require("fileId", file_id)?;

        let request = ApiRequest::new(Method::GET, file_path(bucket_id, file_id));
        let response = self.transport.call(request).await?;
        parse(response.into_json())
    }

    /// Lists files in a bucket.
    pub async fn list_files(
        &self,
        bucket_id: &str,
        queries: &[String],
        search: Option<&str>,
    ) -> Result<FileList, Error> {
        require("bucketId", bucket_id)?;

        let mut payload = Payload::new();
        if !queries.is_empty() {
            payload.insert("queries", queries.to_vec());
        }
        if let Some(search) = search {
            payload.insert("search", search);
        }

        let path = format!("/storage/buckets/{}/files", path_segment(bucket_id));
        let request = ApiRequest::new(Method::GET, path).with_payload(payload);
        let response = self.transport.call(request).await?;
        parse(response.into_json())
    }

    /// Deletes a file.
    pub async fn delete_file(&self, bucket_id: &str, file_id: &str) -> Result<(), Error> {
        require("bucketId", bucket_id)?;
        require("fileId", file_id)?;

        let request = ApiRequest::new(Method::DELETE, file_path(bucket_id, file_id))
            .with_header("content-type", "application/json");
        self.transport.call(request).await?;
        Ok(())
    }

    /// Downloads a file's content.
    pub async fn get_file_download(&self, bucket_id: &str, file_id: &str) -> Result<Vec<u8>, Error> {
        require("bucketId", bucket_id)?;
        require("fileId", file_id)?;

        let path = format!("{}/download", file_path(bucket_id, file_id));
        let request = ApiRequest::new(Method::GET, path).expect_bytes();
        let response = self.transport.call(request).await?;
        Ok(response.into_bytes())
    }
}

fn file_path(bucket_id: &str, file_id: &str) -> String {
    format!(
        "/storage/buckets/{}/files/{}",
        path_segment(bucket_id),
        path_segment(file_id)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use appwrite_client::{ApiResponse, BoxFuture, Error as ClientError, PayloadValue};
    use appwrite_transfer::{MemorySource, ProgressCallback};
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockTransport {
        requests: Mutex<Vec<ApiRequest>>,
        responses: Mutex<VecDeque<Result<ApiResponse, ClientError>>>,
    }

    impl MockTransport {
        fn new(responses: Vec<Result<ApiResponse, ClientError>>) -> Arc<Self> {
            Arc::new(Self {
                requests: Mutex::new(Vec::new()),
                responses: Mutex::new(responses.into()),
            })
        }

        fn requests(&self) -> Vec<ApiRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl Transport for MockTransport {
        fn call(&self, request: ApiRequest) -> BoxFuture<'_, Result<ApiResponse, ClientError>> {
            Box::pin(async move {
                self.requests.lock().unwrap().push(request);
                self.responses
                    .lock()
                    .unwrap()
                    .pop_front()
                    .unwrap_or(Ok(ApiResponse::Json(json!({}))))
            })
        }
    }

    fn file_json(id: &str, uploaded: u64, total: u64) -> Result<ApiResponse, ClientError> {
        Ok(ApiResponse::Json(json!({
            "$id": id,
            "bucketId": "b1",
            "name": "a.bin",
            "chunksTotal": total,
            "chunksUploaded": uploaded,
        })))
    }

    fn storage(transport: &Arc<MockTransport>, chunk_size: u64) -> Storage {
        Storage::with_transport(transport.clone(), chunk_size)
    }

    #[tokio::test]
    async fn create_file_small_single_request() {
        let transport = MockTransport::new(vec![file_json("f1", 1, 1)]);
        let source = MemorySource::new("a.bin", vec![1u8; 8]);
        let perms = vec!["read(\"any\")".to_string()];

        let file = storage(&transport, 16)
            .create_file("b1", "unique()", &source, Some(&perms), &UploadOptions::default())
            .await
            .unwrap();
        assert_eq!(file.id, "f1");
        assert!(file.is_complete());

        let reqs = transport.requests();
        assert_eq!(reqs.len(), 1);
        assert_eq!(reqs[0].method, Method::POST);
        assert_eq!(reqs[0].path, "/storage/buckets/b1/files");
        assert_eq!(
            reqs[0].payload.get("fileId"),
            Some(&PayloadValue::String("unique()".into()))
        );
        assert_eq!(
            reqs[0].payload.get("permissions"),
            Some(&PayloadValue::Array(vec![PayloadValue::String(
                "read(\"any\")".into()
            )]))
        );
        assert!(matches!(reqs[0].payload.get("file"), Some(PayloadValue::File(_))));
    }

    #[tokio::test]
    async fn create_file_resumes_with_custom_id() {
        let transport = MockTransport::new(vec![
            file_json("report", 1, 3),
            file_json("report", 2, 3),
            file_json("report", 3, 3),
        ]);
        let source = MemorySource::new("report.pdf", vec![0u8; 10]);
        let progress = Arc::new(Mutex::new(Vec::new()));
        let p = Arc::clone(&progress);
        let cb: ProgressCallback = Box::new(move |e| p.lock().unwrap().push(e.chunks_uploaded));

        let file = storage(&transport, 4)
            .create_file(
                "b1",
                "report",
                &source,
                None,
                &UploadOptions::default().with_progress(cb),
            )
            .await
            .unwrap();
        assert_eq!(file.chunks_uploaded, 3);

        let reqs = transport.requests();
        assert_eq!(reqs[0].method, Method::GET);
        assert_eq!(reqs[0].path, "/storage/buckets/b1/files/report");
        assert_eq!(reqs.len(), 3);
        assert_eq!(reqs[1].header("content-range"), Some("bytes 4-7/10"));
        assert_eq!(reqs[2].header("content-range"), Some("bytes 8-9/10"));
        assert!(reqs[1].header("x-appwrite-id").is_none());
        assert_eq!(reqs[2].header("x-appwrite-id"), Some("report"));
        assert_eq!(*progress.lock().unwrap(), vec![2, 3]);
    }

    #[tokio::test]
    async fn create_file_requires_ids() {
        let transport = MockTransport::new(vec![]);
        let source = MemorySource::new("a", vec![0u8]);
        let s = storage(&transport, 4);

        let err = s
            .create_file("", "unique()", &source, None, &UploadOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MissingParameter("bucketId")));

        let err = s
            .create_file("b1", "", &source, None, &UploadOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MissingParameter("fileId")));

        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn create_file_surfaces_chunk_error_status() {
        let transport = MockTransport::new(vec![
            file_json("f", 1, 3),
            Err(ClientError::Api {
                message: "server error".into(),
                code: 500,
                kind: Some("general_unknown".into()),
                response: String::new(),
            }),
        ]);
        let source = MemorySource::new("a", vec![0u8; 10]);

        let err = storage(&transport, 4)
            .create_file("b1", "unique()", &source, None, &UploadOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn get_file_path() {
        let transport = MockTransport::new(vec![file_json("f 1", 1, 1)]);
        let file = storage(&transport, 4).get_file("b1", "f 1").await.unwrap();
        assert_eq!(file.id, "f 1");
        assert_eq!(transport.requests()[0].path, "/storage/buckets/b1/files/f%201");
    }

    #[tokio::test]
    async fn list_files_sends_queries() {
        let transport = MockTransport::new(vec![Ok(ApiResponse::Json(json!({
            "total": 1,
            "files": [{"$id": "f1"}]
        })))]);
        let queries = vec!["limit(1)".to_string()];
        let list = storage(&transport, 4)
            .list_files("b1", &queries, Some("cat"))
            .await
            .unwrap();
        assert_eq!(list.total, 1);

        let req = &transport.requests()[0];
        assert_eq!(req.method, Method::GET);
        assert_eq!(
            req.payload.to_query(),
            vec![
                ("queries[0]".to_string(), "limit(1)".to_string()),
                ("search".to_string(), "cat".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn delete_file_sends_delete() {
        let transport = MockTransport::new(vec![Ok(ApiResponse::Message(String::new()))]);
        storage(&transport, 4).delete_file("b1", "f1").await.unwrap();
        let req = &transport.requests()[0];
        assert_eq!(req.method, Method::DELETE);
        assert_eq!(req.path, "/storage/buckets/b1/files/f1");
    }

    #[tokio::test]
    async fn download_expects_bytes() {
        let transport = MockTransport::new(vec![Ok(ApiResponse::Binary(vec![7, 8, 9]))]);
        let data = storage(&transport, 4)
            .get_file_download("b1", "f1")
            .await
            .unwrap();
        assert_eq!(data, vec![7, 8, 9]);

        let req = &transport.requests()[0];
        assert!(req.expect_bytes);
        assert_eq!(req.path, "/storage/buckets/b1/files/f1/download");
    }
}
