//! File-id resolution and upload transport selection

use std::path::Path;
use tracing::info;
use uuid::Uuid;

use super::WorkflowError;
use crate::api::ApiClient;
use crate::config::PollingConfig;
use crate::poll::{self, PollError, PollStep};
use crate::transfer::BulkUploader;

/// Size cutoff between direct HTTP upload and bulk transfer. Small files
/// tolerate a synchronous request; anything bigger needs the
/// connection-tolerant channel.
pub const MAX_DIRECT_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadRoute {
    /// Synchronous multipart upload; the server answers with the file id.
    Direct,
    /// SFTP put followed by a reflection wait for the id.
    Bulk,
}

pub fn route_for_size(size_bytes: u64) -> UploadRoute {
    if size_bytes <= MAX_DIRECT_UPLOAD_BYTES {
        UploadRoute::Direct
    } else {
        UploadRoute::Bulk
    }
}

/// Determine the server-side file id for `local_path`: reuse the newest
/// existing copy when allowed, otherwise upload over the size-appropriate
/// transport.
pub async fn resolve_file_id(
    client: &mut ApiClient,
    uploader: &dyn BulkUploader,
    local_path: &Path,
    reuse_existing: bool,
    polling: &PollingConfig,
) -> Result<Uuid, WorkflowError> {
    let file_name = local_path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| WorkflowError::BadLocalPath(local_path.to_path_buf()))?
        .to_string();

    if reuse_existing {
        if let Some(existing) = client.find_newest_file_by_name(&file_name).await? {
            info!(
                file_id = %existing.id,
                created_at = %existing.created_at,
                "reusing newest server copy"
            );
            return Ok(existing.id);
        }
        info!(name = %file_name, "no server copy found, uploading");
    }

    let size_bytes = tokio::fs::metadata(local_path).await?.len();
    match route_for_size(size_bytes) {
        UploadRoute::Direct => {
            info!(name = %file_name, size_bytes, "uploading over http");
            let content = tokio::fs::read(local_path).await?;
            let file_id = client.upload_file(&file_name, content.into()).await?;
            info!(file_id = %file_id, "http upload complete");
            Ok(file_id)
        }
        UploadRoute::Bulk => {
            info!(
                name = %file_name,
                size_bytes,
                limit = MAX_DIRECT_UPLOAD_BYTES,
                "file exceeds direct upload limit, using bulk transfer"
            );
            uploader.upload(local_path, &file_name).await?;
            wait_for_reflection(client, &file_name, polling).await
        }
    }
}

/// After a bulk upload the server ingests the file asynchronously; poll the
/// query API until it shows up.
async fn wait_for_reflection(
    client: &mut ApiClient,
    file_name: &str,
    polling: &PollingConfig,
) -> Result<Uuid, WorkflowError> {
    let outcome = poll::poll(
        "file reflection",
        polling.reflection_interval(),
        polling.reflection_timeout(),
        async || {
            match client.find_newest_file_by_name(file_name).await? {
                Some(record) => Ok(PollStep::Ready(record.id)),
                None => Ok(PollStep::Pending(format!("'{file_name}' not yet visible"))),
            }
        },
    )
    .await;

    match outcome {
        Ok(file_id) => {
            info!(file_id = %file_id, "bulk upload visible in the api");
            Ok(file_id)
        }
        Err(PollError::Check(err)) => Err(err),
        Err(PollError::Timeout { waited, .. }) => Err(WorkflowError::ReflectionTimeout {
            name: file_name.to_string(),
            waited,
        }),
    }
}
