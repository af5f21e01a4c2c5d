//! GitLab authentication

use super::{AuthSource, token_from_cli, token_from_env};
use crate::error::{Error, Result};
use tracing::debug;

/// Environment variables checked for a GitLab token, in order
pub const GITLAB_TOKEN_VARS: &[&str] = &["GITLAB_TOKEN", "GL_TOKEN"];

/// GitLab authentication configuration
#[derive(Debug, Clone)]
pub struct GitLabAuthConfig {
    /// Authentication token
    pub token: String,
    /// Where the token came from
    pub source: AuthSource,
    /// GitLab host
    pub host: String,
}

/// Resolve a GitLab token: `$GITLAB_TOKEN`/`$GL_TOKEN` first, then `glab config get token`
pub async fn get_gitlab_auth(host: Option<&str>) -> Result<GitLabAuthConfig> {
    let host = host.unwrap_or("gitlab.com").to_string();

    if let Some(token) = token_from_env(GITLAB_TOKEN_VARS, |name| std::env::var(name).ok()) {
        debug!("using GitLab token from environment");
        return Ok(GitLabAuthConfig {
            token,
            source: AuthSource::EnvVar,
            host,
        });
    }

    if let Some(token) = token_from_cli("glab", &["config", "get", "token", "--host", &host]).await
    {
        debug!("using GitLab token from glab CLI");
        return Ok(GitLabAuthConfig {
            token,
            source: AuthSource::Cli,
            host,
        });
    }

    Err(Error::Auth(format!(
        "no GitLab token found for {host}: pass --git-token, set GIT_TOKEN/GITLAB_TOKEN or run `glab auth login`"
    )))
}
