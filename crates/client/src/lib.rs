//! Appwrite REST API client.
//!
//! Provides the pieces every service call goes through:
//!
//! - [`ClientConfig`] — endpoint, project and upload settings (TOML-loadable)
//! - [`Payload`] — the key/value request body and its wire encodings
//! - [`Client`] — one HTTP exchange over `reqwest`, with structured errors
//! - [`Transport`] — the seam the upload engine and services talk to

pub mod client;
pub mod config;
pub mod error;
pub mod path;
pub mod payload;
pub mod response;

pub use client::{ApiRequest, BoxFuture, Client, Transport};
pub use config::{ClientConfig, DEFAULT_CHUNK_SIZE};
pub use error::Error;
pub use path::path_segment;
pub use payload::{FilePart, Payload, PayloadValue, flatten};
pub use response::{ApiResponse, JsonNumber, classify_number};

/// HTTP method type used in [`ApiRequest`].
pub use reqwest::Method;
