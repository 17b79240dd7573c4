//! Appwrite upload CLI entry point.

mod args;

use anyhow::Context;
use appwrite_client::Client;
use appwrite_services::{Functions, Storage, UploadOptions};
use appwrite_transfer::{FileSource, ProgressCallback, UploadProgress};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use args::{Cli, Command};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.connection.resolve()?;
    tracing::info!(endpoint = %config.endpoint, project = %config.project, "configuration loaded");

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run(Client::new(config)?, cli.command))
}

async fn run(client: Client, command: Command) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, stopping after the current chunk");
            signal_cancel.cancel();
        }
    });

    let options = UploadOptions::default()
        .with_progress(log_progress())
        .with_cancel(cancel);

    match command {
        Command::File {
            bucket,
            id,
            permissions,
            mime_type,
            path,
        } => {
            let mut source = FileSource::open(&path)
                .await
                .with_context(|| format!("opening {}", path.display()))?;
            if let Some(mime) = mime_type {
                source = source.with_mime_type(mime);
            }
            let permissions = (!permissions.is_empty()).then_some(permissions.as_slice());

            let file = Storage::new(client)
                .create_file(&bucket, &id, &source, permissions, &options)
                .await?;
            tracing::info!(id = %file.id, bucket = %file.bucket_id, size = file.size_original, "file uploaded");
            println!("{}", serde_json::to_string_pretty(&file)?);
        }
        Command::Deployment {
            function,
            activate,
            entrypoint,
            commands,
            path,
        } => {
            let source = FileSource::open(&path)
                .await
                .with_context(|| format!("opening {}", path.display()))?;

            let deployment = Functions::new(client)
                .create_deployment(
                    &function,
                    &source,
                    activate,
                    entrypoint.as_deref(),
                    commands.as_deref(),
                    &options,
                )
                .await?;
            tracing::info!(id = %deployment.id, status = %deployment.status, "deployment uploaded");
            println!("{}", serde_json::to_string_pretty(&deployment)?);
        }
    }
    Ok(())
}

fn log_progress() -> ProgressCallback {
    Box::new(|p: UploadProgress| {
        tracing::info!(
            id = %p.id,
            chunk = p.chunks_uploaded,
            of = p.chunks_total,
            bytes = p.size_uploaded,
            "{:.1}%",
            p.progress
        );
    })
}
