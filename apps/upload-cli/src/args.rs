use std::path::PathBuf;

use anyhow::Result;
use appwrite_client::ClientConfig;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Connection flags. Values given here override the config file.
#[derive(Args, Debug, Default)]
pub struct ConnectionArgs {
    /// TOML file with endpoint, project, key and chunk_size.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// API endpoint, e.g. https://cloud.appwrite.io/v1
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    #[arg(long, global = true)]
    pub project: Option<String>,

    /// Server API key.
    #[arg(long, global = true)]
    pub key: Option<String>,

    /// Accept self-signed TLS certificates.
    #[arg(long, global = true)]
    pub self_signed: bool,

    /// Upload chunk size in bytes.
    #[arg(long, global = true)]
    pub chunk_size: Option<u64>,
}

impl ConnectionArgs {
    /// Builds the client configuration: file first, then flag overrides.
    pub fn resolve(&self) -> Result<ClientConfig> {
        let mut config = match &self.config {
            Some(path) => ClientConfig::load(path)?,
            None => ClientConfig::default(),
        };
        if let Some(endpoint) = &self.endpoint {
            config.endpoint = endpoint.clone();
        }
        if let Some(project) = &self.project {
            config.project = project.clone();
        }
        if let Some(key) = &self.key {
            config.key = Some(key.clone());
        }
        if self.self_signed {
            config.self_signed = true;
        }
        if let Some(chunk_size) = self.chunk_size {
            config.chunk_size = chunk_size;
        }
        Ok(config)
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Upload a file to a storage bucket.
    File {
        /// Bucket ID.
        #[arg(long)]
        bucket: String,

        /// File ID. A concrete ID makes the upload resumable.
        #[arg(long, default_value = "unique()")]
        id: String,

        /// Permission strings, e.g. 'read("any")'.
        #[arg(long = "permission")]
        permissions: Vec<String>,

        /// Override the MIME type sent with the file.
        #[arg(long)]
        mime_type: Option<String>,

        path: PathBuf,
    },

    /// Upload a code archive as a function deployment.
    Deployment {
        /// Function ID.
        #[arg(long)]
        function: String,

        /// Activate the deployment once built.
        #[arg(long)]
        activate: bool,

        #[arg(long)]
        entrypoint: Option<String>,

        /// Build commands, e.g. 'npm install'.
        #[arg(long)]
        commands: Option<String>,

        path: PathBuf,
    },
}
