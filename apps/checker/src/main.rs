mod config;
mod render;

use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{HttpReceiptClient, ReceiptApi};
use shared::domain::{ReceiptUpload, SessionId};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use workflow::{FlowStatus, Settled, WorkflowController};

use crate::config::{config_path, load_settings, prepare_api_base_url};

#[derive(Parser, Debug)]
#[command(about = "Check grocery receipts against recent food recalls")]
struct Args {
    /// Backend base URL; overrides config file and environment.
    #[arg(long, global = true)]
    server_url: Option<String>,
    /// Upper bound for each remote call, in seconds.
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,
    /// Config file path (defaults to checker.toml or $CHECKER_CONFIG).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload a receipt image and check its items against recent recalls.
    Scan {
        path: PathBuf,
        /// Keep the server session instead of deleting it afterwards.
        #[arg(long)]
        keep: bool,
    },
    /// Show a stored receipt session.
    Session { id: SessionId },
    /// List recent recalls.
    Recalls,
    /// Delete a stored receipt session.
    Delete { id: SessionId },
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut settings = load_settings(&config_path(args.config))?;
    if let Some(url) = args.server_url.as_deref() {
        settings.api_base_url = prepare_api_base_url(url)?;
    }
    if let Some(secs) = args.timeout_secs {
        settings.request_timeout_secs = secs;
    }
    info!(api_base_url = %settings.api_base_url, "using receipt backend");

    let api: Arc<dyn ReceiptApi> = Arc::new(HttpReceiptClient::new(&settings.api_base_url)?);

    match args.command {
        Command::Scan { path, keep } => {
            let controller = WorkflowController::with_config(api, settings.workflow_config());
            scan(controller, path, keep).await
        }
        Command::Session { id } => {
            let session = api.fetch_session(&id).await?;
            print!("{}", render::render_session(&session));
            Ok(())
        }
        Command::Recalls => {
            let recalls = api.list_recent_recalls().await?;
            print!("{}", render::render_recalls(&recalls));
            Ok(())
        }
        Command::Delete { id } => {
            api.delete_session(&id).await?;
            println!("Deleted session {id}");
            Ok(())
        }
    }
}

async fn load_receipt(path: PathBuf) -> Result<ReceiptUpload> {
    let bytes = tokio::fs::read(&path)
        .await
        .with_context(|| format!("failed to read receipt '{}'", path.display()))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "receipt".to_string());
    let mime_type = mime_guess::from_path(&path)
        .first_raw()
        .map(ToString::to_string);
    Ok(ReceiptUpload::new(file_name, mime_type, bytes)?)
}

async fn scan(controller: WorkflowController, path: PathBuf, keep: bool) -> Result<()> {
    let upload = load_receipt(path).await?;

    let mut reader = controller.subscribe();
    let view = tokio::spawn(async move {
        while let Some(state) = reader.changed().await {
            eprintln!("{}", render::status_line(&state));
        }
    });

    controller.select_file(upload)?;
    let settled = controller.submit_upload().await?;
    if settled == Settled::Applied(FlowStatus::Ready) {
        controller.request_recall_check().await?;
    }

    let final_state = controller.snapshot();
    print!("{}", render::render_state(&final_state));

    if keep {
        if let Some(session_id) = &final_state.session_id {
            println!("Session kept: {session_id}");
        }
    } else if let Some(cleanup) = controller.discard() {
        if let Err(err) = cleanup.await {
            warn!(%err, "session cleanup task failed");
        }
    }

    drop(controller);
    if let Err(err) = view.await {
        warn!(%err, "status view task failed");
    }

    if final_state.status == FlowStatus::Error {
        bail!(
            "{}",
            final_state
                .error_message()
                .unwrap_or("receipt check failed")
        );
    }
    Ok(())
}
