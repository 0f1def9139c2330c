//! The end-to-end processing workflow
//!
//! One linear run: authenticate, resolve the server-side file id (reuse or
//! upload), wait for validation, submit the order, wait for completion,
//! download every declared result type. Any failure aborts the run; there
//! is no partial-state resume. The single tolerated partial failure is a
//! per-result-type download error, which is logged and skipped because the
//! other result types remain retrievable.

mod download;
mod resolve;

pub use resolve::{MAX_DIRECT_UPLOAD_BYTES, UploadRoute, resolve_file_id, route_for_size};

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::api::{ApiClient, ApiError, OrderStatus, ResultTypeEntry, normalize_result_types};
use crate::config::PollingConfig;
use crate::poll::{self, PollError, PollStep};
use crate::transfer::{BulkUploader, TransferError};

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("bulk transfer failed: {0}")]
    Transfer(#[from] TransferError),

    #[error("file {id} not found on server")]
    FileMissing { id: Uuid },

    #[error("order {id} not found on server")]
    OrderMissing { id: Uuid },

    /// The order reached a terminal failure status. Raised from inside the
    /// completion check, so it aborts without waiting out the poll budget.
    #[error("order {id} finished as {status}")]
    OrderFailed { id: Uuid, status: OrderStatus },

    #[error("{what} did not finish within {waited:?} (last state: {last})")]
    PollTimeout {
        what: &'static str,
        waited: Duration,
        last: String,
    },

    #[error("uploaded file '{name}' did not appear in the api within {waited:?}")]
    ReflectionTimeout { name: String, waited: Duration },

    #[error("local file has no usable file name: {}", .0.display())]
    BadLocalPath(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Inputs for one workflow run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub local_path: PathBuf,
    pub model_name: String,
    pub download_folder: PathBuf,
    /// Reuse the newest server copy with the same name instead of uploading.
    pub reuse_existing: bool,
    pub tags: Vec<Uuid>,
}

/// What a completed run produced.
#[derive(Debug)]
pub struct RunSummary {
    pub file_id: Uuid,
    pub order_id: Uuid,
    pub downloaded: Vec<PathBuf>,
    /// Result types whose download failed and was skipped.
    pub skipped: Vec<String>,
}

/// Drive the whole workflow start to finish.
pub async fn run(
    client: &mut ApiClient,
    uploader: &dyn BulkUploader,
    polling: &PollingConfig,
    options: &RunOptions,
) -> Result<RunSummary, WorkflowError> {
    client.authenticate().await?;

    let file_id = resolve_file_id(
        client,
        uploader,
        &options.local_path,
        options.reuse_existing,
        polling,
    )
    .await?;
    info!(file_id = %file_id, "file resolved");

    wait_for_file_validation(client, file_id, polling).await?;
    info!(file_id = %file_id, "file validated");

    let order_id = client
        .submit_order(file_id, &options.model_name, &options.tags)
        .await?;
    info!(order_id = %order_id, model = %options.model_name, "order submitted");

    let raw_types = wait_for_order_completion(client, order_id, polling).await?;
    info!(order_id = %order_id, "order completed");

    let result_types = normalize_result_types(&raw_types);
    info!(?result_types, folder = %options.download_folder.display(), "downloading results");
    tokio::fs::create_dir_all(&options.download_folder).await?;
    let (downloaded, skipped) =
        download::download_all(client, order_id, &result_types, &options.download_folder).await;

    Ok(RunSummary {
        file_id,
        order_id,
        downloaded,
        skipped,
    })
}

/// Wait until the server finishes checking the file and accepts it.
pub async fn wait_for_file_validation(
    client: &mut ApiClient,
    file_id: Uuid,
    polling: &PollingConfig,
) -> Result<(), WorkflowError> {
    let outcome = poll::poll(
        "file validation",
        polling.interval(),
        polling.validation_timeout(),
        async || {
            let record = client
                .file_status(file_id)
                .await?
                .ok_or(WorkflowError::FileMissing { id: file_id })?;
            if record.is_validated() {
                Ok(PollStep::Ready(()))
            } else {
                Ok(PollStep::Pending(record.validation_state()))
            }
        },
    )
    .await;

    flatten_poll("file validation", outcome)
}

/// Wait for a terminal order status; returns the declared result types.
///
/// A terminal failure status aborts immediately via the check error path
/// rather than running out the timeout.
pub async fn wait_for_order_completion(
    client: &mut ApiClient,
    order_id: Uuid,
    polling: &PollingConfig,
) -> Result<Vec<ResultTypeEntry>, WorkflowError> {
    let outcome = poll::poll(
        "order completion",
        polling.interval(),
        polling.completion_timeout(),
        async || {
            let order = client
                .find_order(order_id)
                .await?
                .ok_or(WorkflowError::OrderMissing { id: order_id })?;
            if order.status.is_terminal_success() {
                info!(order_id = %order_id, status = %order.status, "order reached a terminal status");
                Ok(PollStep::Ready(order.result_types))
            } else if order.status.is_terminal_failure() {
                Err(WorkflowError::OrderFailed {
                    id: order_id,
                    status: order.status,
                })
            } else {
                Ok(PollStep::Pending(format!("status={}", order.status)))
            }
        },
    )
    .await;

    flatten_poll("order completion", outcome)
}

fn flatten_poll<T>(
    what: &'static str,
    outcome: Result<T, PollError<WorkflowError>>,
) -> Result<T, WorkflowError> {
    match outcome {
        Ok(value) => Ok(value),
        Err(PollError::Check(err)) => Err(err),
        Err(PollError::Timeout { waited, last, .. }) => {
            Err(WorkflowError::PollTimeout { what, waited, last })
        }
    }
}
