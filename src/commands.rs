//! Subcommand drivers wiring configuration and CLI arguments into the
//! library components.

use std::sync::Arc;
use tracing::info;

use genoflow::api::{ApiClient, Credentials, HttpSettings, HttpTransport};
use genoflow::config::{Config, config_path};
use genoflow::transfer::SftpUploader;
use genoflow::workflow;

use crate::cli::{AuthArgs, ConfigSetArgs, RunArgs, UploadArgs};

type CommandResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

fn build_client(config: &Config, auth: &AuthArgs) -> Result<ApiClient, Box<dyn std::error::Error + Send + Sync>> {
    let transport = HttpTransport::new(&config.api.base_url, HttpSettings::default())?;
    Ok(ApiClient::new(
        Arc::new(transport),
        Credentials {
            username: auth.username.clone(),
            password: auth.password.clone(),
        },
    ))
}

pub async fn run(args: RunArgs) -> CommandResult {
    let config = Config::load()?;
    let mut client = build_client(&config, &args.auth)?;
    let uploader = SftpUploader::new(config.sftp.clone());

    let mut polling = config.polling.clone();
    if let Some(secs) = args.poll_interval {
        polling.interval_secs = secs;
    }

    let options = workflow::RunOptions {
        local_path: args.file,
        model_name: args.model,
        download_folder: args.download_folder,
        reuse_existing: args.reuse_existing,
        tags: args.tags,
    };

    let summary = workflow::run(&mut client, &uploader, &polling, &options).await?;
    info!(
        order_id = %summary.order_id,
        downloaded = summary.downloaded.len(),
        skipped = summary.skipped.len(),
        "workflow finished"
    );
    Ok(())
}

pub async fn upload(args: UploadArgs) -> CommandResult {
    let config = Config::load()?;
    let mut client = build_client(&config, &args.auth)?;
    let uploader = SftpUploader::new(config.sftp.clone());

    client.authenticate().await?;
    let file_id = workflow::resolve_file_id(
        &mut client,
        &uploader,
        &args.file,
        args.reuse_existing,
        &config.polling,
    )
    .await?;

    println!("{file_id}");
    Ok(())
}

pub async fn whoami(args: AuthArgs) -> CommandResult {
    let config = Config::load()?;
    let mut client = build_client(&config, &args)?;

    client.authenticate().await?;
    let org = client.organization().await?;
    println!("{}", serde_json::to_string_pretty(&org)?);
    Ok(())
}

pub fn config_show() -> CommandResult {
    let config = Config::load()?;
    print!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

pub fn config_set(args: ConfigSetArgs) -> CommandResult {
    let path = config_path();
    let mut config = Config::load()?;

    if let Some(base_url) = args.api_base_url {
        config.api.base_url = base_url;
    }
    if let Some(host) = args.sftp_host {
        config.sftp.host = host;
    }
    if let Some(port) = args.sftp_port {
        config.sftp.port = port;
    }
    if let Some(user) = args.sftp_user {
        config.sftp.user = user;
    }
    if let Some(keyfile) = args.sftp_keyfile {
        config.sftp.keyfile = Some(keyfile);
    }
    if let Some(folder) = args.sftp_folder {
        config.sftp.folder = folder;
    }

    config.store(&path)?;
    info!(path = %path.display(), "configuration written");
    Ok(())
}
