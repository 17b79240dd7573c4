//! Functions service: code deployments.

use std::sync::Arc;

use appwrite_client::{ApiRequest, Client, Method, Payload, Transport, path_segment};
use appwrite_transfer::{BinarySource, ChunkedUploader, UploadTarget};
use tracing::debug;

use crate::models::{Deployment, DeploymentList};
use crate::util::{UploadOptions, parse, require};
use crate::Error;

/// Functions API.
#[derive(Clone)]
pub struct Functions {
    transport: Arc<dyn Transport>,
    chunk_size: u64,
}

impl Functions {
    pub fn new(client: Client) -> Self {
        let chunk_size = client.chunk_size();
        Self::with_transport(Arc::new(client), chunk_size)
    }

    pub fn with_transport(transport: Arc<dyn Transport>, chunk_size: u64) -> Self {
        Self {
            transport,
            chunk_size,
        }
    }

    /// Uploads a code archive as a new deployment.
    ///
    /// The server assigns the deployment ID; deployments are not resumable.
    pub async fn create_deployment(
        &self,
        function_id: &str,
        code: &dyn BinarySource,
        activate: bool,
        entrypoint: Option<&str>,
        commands: Option<&str>,
        options: &UploadOptions,
    ) -> Result<Deployment, Error> {
        require("functionId", function_id)?;

        let path = format!("/functions/{}/deployments", path_segment(function_id));
        let target = UploadTarget::new(Method::POST, path, "code");

        let mut extra = Payload::new().with("activate", activate);
        if let Some(entrypoint) = entrypoint {
            extra.insert("entrypoint", entrypoint);
        }
        if let Some(commands) = commands {
            extra.insert("commands", commands);
        }

        debug!(function = %function_id, size = code.size(), "creating deployment");
        let mut uploader = ChunkedUploader::new(self.transport.as_ref(), self.chunk_size);
        if let Some(cancel) = &options.cancel {
            uploader = uploader.with_cancel(cancel.clone());
        }
        let response = uploader
            .upload(&target, code, &extra, options.on_progress.as_ref())
            .await?;
        parse(response)
    }

    pub async fn get_deployment(
        &self,
        function_id: &str,
        deployment_id: &str,
    ) -> Result<Deployment, Error> {
        require("functionId", function_id)?;
        require("deploymentId", deployment_id)?;

        let request = ApiRequest::new(Method::GET, deployment_path(function_id, deployment_id));
        let response = self.transport.call(request).await?;
        parse(response.into_json())
    }

    pub async fn list_deployments(
        &self,
        function_id: &str,
        queries: &[String],
        search: Option<&str>,
    ) -> Result<DeploymentList, Error> {
        require("functionId", function_id)?;

        let mut payload = Payload::new();
        if !queries.is_empty() {
            payload.insert("queries", queries.to_vec());
        }
        if let Some(search) = search {
            payload.insert("search", search);
        }

        let path = format!("/functions/{}/deployments", path_segment(function_id));
        let request = ApiRequest::new(Method::GET, path).with_payload(payload);
        let response = self.transport.call(request).await?;
        parse(response.into_json())
    }

    pub async fn delete_deployment(
        &self,
        function_id: &str,
        deployment_id: &str,
    ) -> Result<(), Error> {
        require("functionId", function_id)?;
        require("deploymentId", deployment_id)?;

        let request = ApiRequest::new(Method::DELETE, deployment_path(function_id, deployment_id))
            .with_header("content-type", "application/json");
        self.transport.call(request).await?;
        Ok(())
    }
}

fn deployment_path(function_id: &str, deployment_id: &str) -> String {
    format!(
        "/functions/{}/deployments/{}",
        path_segment(function_id),
        path_segment(deployment_id)
    )
}
