use async_trait::async_trait;
use ssh2::Session;
use std::fs::File;
use std::io;
use std::net::TcpStream;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{BulkUploader, Result, TransferError};
use crate::config::SftpConfig;

/// SFTP uploader over libssh2. All socket work is blocking and runs on the
/// blocking pool; one connection per upload.
pub struct SftpUploader {
    config: SftpConfig,
}

impl SftpUploader {
    pub fn new(config: SftpConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl BulkUploader for SftpUploader {
    async fn upload(&self, local_path: &Path, remote_name: &str) -> Result<()> {
        let config = self.config.clone();
        let local_path = local_path.to_path_buf();
        let remote_name = remote_name.to_string();

        info!(
            host = %config.host,
            user = %config.user,
            folder = %config.folder,
            remote_name = %remote_name,
            "starting sftp upload"
        );

        tokio::task::spawn_blocking(move || upload_blocking(&config, &local_path, &remote_name))
            .await
            .map_err(|_| TransferError::Aborted)??;

        info!("sftp upload complete");
        Ok(())
    }
}

fn upload_blocking(config: &SftpConfig, local_path: &Path, remote_name: &str) -> Result<()> {
    let tcp = TcpStream::connect((config.host.as_str(), config.port))?;
    let mut session = Session::new()?;
    session.set_tcp_stream(tcp);
    session.handshake()?;

    match (&config.keyfile, &config.password) {
        (Some(keyfile), _) => {
            session.userauth_pubkey_file(&config.user, None, keyfile, None)?;
        }
        (None, Some(password)) => {
            session.userauth_password(&config.user, password)?;
        }
        (None, None) => return Err(TransferError::MissingAuth),
    }

    let sftp = session.sftp()?;
    let folder = PathBuf::from(&config.folder);
    if sftp.stat(&folder).is_err() {
        debug!(folder = %folder.display(), "remote folder missing, creating");
        sftp.mkdir(&folder, 0o755)?;
    }

    let mut remote = sftp.create(&folder.join(remote_name))?;
    let mut local = File::open(local_path)?;
    let bytes = io::copy(&mut local, &mut remote)?;
    debug!(bytes, "sftp put finished");

    Ok(())
}
