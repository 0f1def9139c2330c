use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub sftp: SftpConfig,
    #[serde(default)]
    pub polling: PollingConfig,
}

/// REST API endpoint configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

fn default_base_url() -> String {
    // Dev environment; point at https://api.galatea.bio/api/v1 for production.
    "https://api.dev.galatea.bio/api/v1".to_string()
}

/// Bulk-transfer (SFTP) endpoint configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SftpConfig {
    #[serde(default = "default_sftp_host")]
    pub host: String,
    #[serde(default = "default_sftp_port")]
    pub port: u16,
    #[serde(default = "default_sftp_user")]
    pub user: String,
    /// Private key for key-based auth; password auth is used when absent.
    pub keyfile: Option<PathBuf>,
    /// Remote folder uploads land in; created on first use.
    #[serde(default = "default_sftp_folder")]
    pub folder: String,
    /// SFTP password (loaded from environment, not from the config file)
    #[serde(skip)]
    pub password: Option<String>,
}

impl Default for SftpConfig {
    fn default() -> Self {
        Self {
            host: default_sftp_host(),
            port: default_sftp_port(),
            user: default_sftp_user(),
            keyfile: None,
            folder: default_sftp_folder(),
            password: None,
        }
    }
}

fn default_sftp_host() -> String {
    "sftp.dev.galatea.bio".to_string()
}

fn default_sftp_port() -> u16 {
    22
}

fn default_sftp_user() -> String {
    "genoflow-internal".to_string()
}

fn default_sftp_folder() -> String {
    "genoflow_uploads".to_string()
}

/// Poll intervals and wall-clock bounds for the three server-side waits
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PollingConfig {
    /// Seconds between validation/completion status checks.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Upper bound on the file-validation wait, in minutes.
    #[serde(default = "default_validation_timeout_mins")]
    pub validation_timeout_mins: u64,
    /// Upper bound on the order-completion wait, in minutes.
    #[serde(default = "default_completion_timeout_mins")]
    pub completion_timeout_mins: u64,
    /// Upper bound on the post-SFTP reflection wait, in seconds.
    #[serde(default = "default_reflection_timeout_secs")]
    pub reflection_timeout_secs: u64,
    #[serde(default = "default_reflection_interval_secs")]
    pub reflection_interval_secs: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            validation_timeout_mins: default_validation_timeout_mins(),
            completion_timeout_mins: default_completion_timeout_mins(),
            reflection_timeout_secs: default_reflection_timeout_secs(),
            reflection_interval_secs: default_reflection_interval_secs(),
        }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn validation_timeout(&self) -> Duration {
        Duration::from_secs(self.validation_timeout_mins * 60)
    }

    pub fn completion_timeout(&self) -> Duration {
        Duration::from_secs(self.completion_timeout_mins * 60)
    }

    pub fn reflection_interval(&self) -> Duration {
        Duration::from_secs(self.reflection_interval_secs)
    }

    pub fn reflection_timeout(&self) -> Duration {
        Duration::from_secs(self.reflection_timeout_secs)
    }
}

fn default_interval_secs() -> u64 {
    60
}

fn default_validation_timeout_mins() -> u64 {
    300
}

fn default_completion_timeout_mins() -> u64 {
    300
}

fn default_reflection_timeout_secs() -> u64 {
    300
}

fn default_reflection_interval_secs() -> u64 {
    30
}
