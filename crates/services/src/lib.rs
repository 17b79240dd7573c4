//! Appwrite service wrappers.
//!
//! Each service validates required parameters, templates the endpoint path
//! and delegates to a [`Transport`](appwrite_client::Transport). Uploads of
//! files and deployment code go through the chunked upload engine.

pub mod error;
pub mod functions;
pub mod id;
pub mod models;
pub mod storage;

mod util;

pub use error::Error;
pub use functions::Functions;
pub use models::{Deployment, DeploymentList, File, FileList};
pub use storage::Storage;
pub use util::UploadOptions;
