//! The sequential pipeline: configuration, credentials, calendar session,
//! board read.

use std::time::Duration;

use tracing::{debug, info};

use boardsync_providers::github::{ProjectClient, DEFAULT_TARGET_COLUMN};
use boardsync_providers::google::CalendarSession;

use crate::cli::Cli;
use crate::config::{EnvConfig, TOKEN_KEY};
use crate::credentials::{default_google_dir, CredentialPaths};
use crate::error::{ClientError, ClientResult};

/// Runs one pass over the board: bootstrap both services, then read the
/// single priority task and print it.
pub async fn run(cli: &Cli) -> ClientResult<()> {
    let timeout = Duration::from_secs(cli.timeout);

    let config = EnvConfig::load(&cli.env)?;
    debug!("loaded configuration from {}", cli.env.display());

    let google_dir = cli.google_dir.clone().unwrap_or_else(default_google_dir);
    let paths = CredentialPaths::resolve(&google_dir)?;

    let session =
        CalendarSession::bootstrap(&paths.token_cache, &paths.client_secret, timeout).await?;
    info!(
        "calendar session ready, token cache at {}",
        session.token_cache().display()
    );

    let repo = cli.repo.as_deref().ok_or_else(|| {
        ClientError::Config("--repo is required to read the project board".to_string())
    })?;
    let project_name = cli.project.as_deref().ok_or_else(|| {
        ClientError::Config("--project is required to read the project board".to_string())
    })?;
    let token = config.require(TOKEN_KEY)?;

    let client = ProjectClient::authenticate(token, repo, timeout).await?;
    let columns = client.columns(project_name).await?;
    debug!("project \"{}\" has {} columns", project_name, columns.len());

    let task = client
        .extract_priority_task(&columns, DEFAULT_TARGET_COLUMN)
        .await?;
    info!("extracted priority task from \"{DEFAULT_TARGET_COLUMN}\"");

    println!("{}", task.title);
    println!("  {}", task.body);

    Ok(())
}
