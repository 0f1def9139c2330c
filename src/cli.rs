use clap::{Parser, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "genoflow")]
#[command(about = "Submit genotype files for remote model execution", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full workflow: deliver a file, wait for validation, submit
    /// an order, wait for completion, download the results
    Run(RunArgs),
    /// Deliver a file (transport picked by size) and print its server id
    Upload(UploadArgs),
    /// Print the organization of the authenticated account
    Whoami(AuthArgs),
    /// Read or persist the local configuration file
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(clap::Args, Debug)]
pub struct AuthArgs {
    /// API account (email address)
    #[arg(long)]
    pub username: String,

    /// API password
    #[arg(long, env = "GENOFLOW_API_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(clap::Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub auth: AuthArgs,

    /// Local file to process
    #[arg(long)]
    pub file: PathBuf,

    /// Model name to execute (e.g. "skywalker")
    #[arg(long)]
    pub model: String,

    /// Folder the results are saved into (created if absent)
    #[arg(long)]
    pub download_folder: PathBuf,

    /// Reuse the newest server copy with the same name instead of uploading
    #[arg(long)]
    pub reuse_existing: bool,

    /// Seconds between status checks (default from config: 60)
    #[arg(long)]
    pub poll_interval: Option<u64>,

    /// Tag id to attach to the order; repeatable
    #[arg(long = "tag")]
    pub tags: Vec<Uuid>,
}

#[derive(clap::Args, Debug)]
pub struct UploadArgs {
    #[command(flatten)]
    pub auth: AuthArgs,

    /// Local file to deliver
    #[arg(long)]
    pub file: PathBuf,

    /// Reuse the newest server copy with the same name instead of uploading
    #[arg(long)]
    pub reuse_existing: bool,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective configuration
    Show,
    /// Update fields in the configuration file
    Set(ConfigSetArgs),
}

#[derive(clap::Args, Debug)]
pub struct ConfigSetArgs {
    #[arg(long)]
    pub api_base_url: Option<String>,

    #[arg(long)]
    pub sftp_host: Option<String>,

    #[arg(long)]
    pub sftp_port: Option<u16>,

    #[arg(long)]
    pub sftp_user: Option<String>,

    #[arg(long)]
    pub sftp_keyfile: Option<PathBuf>,

    #[arg(long)]
    pub sftp_folder: Option<String>,
}
