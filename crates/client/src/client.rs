//! HTTP transport.
//!
//! [`Client`] performs exactly one HTTP exchange per [`ApiRequest`] using
//! `reqwest`, and normalises the result into an [`ApiResponse`] or an
//! [`Error::Api`].

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use tracing::{debug, warn};

use crate::payload::Payload;
use crate::response::ApiResponse;
use crate::{ClientConfig, Error};

const RESPONSE_FORMAT: &str = "1.5.0";
const WARNING_HEADER: &str = "x-appwrite-warning";

/// Boxed future returned by [`Transport`] methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Performs API requests.
///
/// Implemented by [`Client`]; the upload engine and services only depend on
/// this trait, so they can be exercised against in-memory mocks.
pub trait Transport: Send + Sync {
    /// Sends one request and decodes the response.
    fn call(&self, request: ApiRequest) -> BoxFuture<'_, Result<ApiResponse, Error>>;
}

/// A single API request.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Path below the configured endpoint, e.g. `/storage/buckets/b1/files`.
    pub path: String,
    /// Extra headers. Names are stored lowercase.
    pub headers: BTreeMap<String, String>,
    pub payload: Payload,
    /// Decode a non-JSON body as raw bytes instead of text.
    pub expect_bytes: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: BTreeMap::new(),
            payload: Payload::new(),
            expect_bytes: false,
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    /// Marks the response as binary (file downloads).
    pub fn expect_bytes(mut self) -> Self {
        self.expect_bytes = true;
        self
    }

    /// Looks up a header by (case-insensitive) name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Returns `true` when the payload is sent as `multipart/form-data`.
    pub fn is_multipart(&self) -> bool {
        self.header("content-type")
            .is_some_and(|ct| ct.starts_with("multipart/form-data"))
    }
}

/// Appwrite API client.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    config: Arc<ClientConfig>,
}

impl Client {
    /// Creates a client. Project, key and SDK headers are sent on every request.
    pub fn new(config: ClientConfig) -> Result<Self, Error> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("x-sdk-name"),
            HeaderValue::from_static("Rust"),
        );
        headers.insert(
            HeaderName::from_static("x-sdk-version"),
            HeaderValue::from_static(env!("CARGO_PKG_VERSION")),
        );
        headers.insert(
            HeaderName::from_static("x-appwrite-response-format"),
            HeaderValue::from_static(RESPONSE_FORMAT),
        );
        if !config.project.is_empty() {
            headers.insert(
                HeaderName::from_static("x-appwrite-project"),
                HeaderValue::from_str(&config.project)
                    .map_err(|_| Error::Config("invalid project ID".into()))?,
            );
        }
        if let Some(key) = &config.key {
            let mut value = HeaderValue::from_str(key)
                .map_err(|_| Error::Config("invalid API key".into()))?;
            value.set_sensitive(true);
            headers.insert(HeaderName::from_static("x-appwrite-key"), value);
        }

        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .danger_accept_invalid_certs(config.self_signed);
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder.build()?;

        Ok(Self {
            http,
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Upload chunk size configured for this client.
    pub fn chunk_size(&self) -> u64 {
        self.config.chunk_size
    }

    /// Sends a request and decodes the response.
    ///
    /// GET payloads go to the query string, multipart payloads to a form,
    /// everything else to a JSON body. Status >= 400 yields [`Error::Api`].
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, Error> {
        let url = self.config.url(&request.path);
        debug!(method = %request.method, path = %request.path, "sending request");

        let multipart = request.is_multipart();
        let mut builder = self.http.request(request.method.clone(), &url);
        for (name, value) in &request.headers {
            // reqwest sets the multipart content type itself (with boundary).
            if multipart && name == "content-type" {
                continue;
            }
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder = if request.method == Method::GET {
            builder.query(&request.payload.to_query())
        } else if multipart {
            builder.multipart(request.payload.into_form()?)
        } else {
            builder.json(&request.payload.to_json()?)
        };

        let resp = builder.send().await?;
        let status = resp.status();
        log_warnings(resp.headers());

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = resp.bytes().await?;

        if status.as_u16() >= 400 {
            let err = Error::from_response(status.as_u16(), &content_type, &body);
            debug!(status = status.as_u16(), error = %err, "request failed");
            return Err(err);
        }

        ApiResponse::decode(&content_type, request.expect_bytes, &body)
    }
}

impl Transport for Client {
    fn call(&self, request: ApiRequest) -> BoxFuture<'_, Result<ApiResponse, Error>> {
        Box::pin(self.send(request))
    }
}

/// Surfaces server warnings as log output.
fn log_warnings(headers: &HeaderMap) {
    for value in headers.get_all(WARNING_HEADER) {
        let Ok(text) = value.to_str() else {
            continue;
        };
        for warning in text.split(';').map(str::trim).filter(|w| !w.is_empty()) {
            warn!(warning = %warning, "server warning");
        }
    }
}
