//! Bulk file delivery over SFTP
//!
//! Payloads above the direct-upload limit go over an SFTP channel instead
//! of HTTP. The session is opened, used, and closed within a single upload
//! call; nothing is held across polling waits.

mod sftp;

pub use sftp::SftpUploader;

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("sftp session error: {0}")]
    Session(#[from] ssh2::Error),

    #[error("sftp io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no sftp credentials configured (need a password or a keyfile)")]
    MissingAuth,

    #[error("sftp upload task aborted")]
    Aborted,
}

pub type Result<T> = std::result::Result<T, TransferError>;

/// Upload seam for the large-file path; tests substitute a recording fake.
#[async_trait]
pub trait BulkUploader: Send + Sync {
    /// Put `local_path` into the configured remote folder as `remote_name`,
    /// overwriting any previous copy.
    async fn upload(&self, local_path: &Path, remote_name: &str) -> Result<()>;
}
