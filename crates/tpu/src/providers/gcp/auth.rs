//! Ambient credential and project discovery.
//!
//! Environment variables win; otherwise the `gcloud` CLI is asked.

use tokio::process::Command;
use tracing::debug;

use crate::providers::traits::ProviderError;

/// Environment variables checked for the default project, in order.
const PROJECT_ENV_VARS: [&str; 3] = ["GOOGLE_CLOUD_PROJECT", "CLOUDSDK_CORE_PROJECT", "GCLOUD_PROJECT"];

/// Environment variable holding a ready OAuth access token.
pub const ACCESS_TOKEN_ENV_VAR: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";

/// Resolve the default project.
///
/// # Errors
/// Returns [`ProviderError::Config`] if no project is configured anywhere.
pub async fn discover_project() -> Result<String, ProviderError> {
    if let Some(project) = PROJECT_ENV_VARS.iter().find_map(|var| non_empty_env(var)) {
        return Ok(project);
    }

    let project = gcloud(&["config", "get-value", "project"]).await?;
    if project.is_empty() || project == "(unset)" {
        return Err(ProviderError::Config(
            "no project configured; pass --project or run `gcloud config set project`".into(),
        ));
    }
    Ok(project)
}

/// Resolve an OAuth access token.
///
/// # Errors
/// Returns [`ProviderError::Config`] if neither the environment nor `gcloud`
/// can supply one.
pub async fn discover_access_token() -> Result<String, ProviderError> {
    if let Some(token) = non_empty_env(ACCESS_TOKEN_ENV_VAR) {
        return Ok(token);
    }
    gcloud(&["auth", "print-access-token"]).await
}

fn non_empty_env(var: &str) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

async fn gcloud(args: &[&str]) -> Result<String, ProviderError> {
    run_cli("gcloud", args).await
}

/// Run `program` and return its trimmed stdout.
async fn run_cli(program: &str, args: &[&str]) -> Result<String, ProviderError> {
    debug!(program, args = ?args, "Running CLI");

    let output = Command::new(program)
        .args(args)
        .output()
        .await
        .map_err(|e| ProviderError::Config(format!("failed to run `{program}`: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ProviderError::Config(format!(
            "{program} error: {}",
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
