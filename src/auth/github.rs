//! GitHub authentication

use super::{AuthSource, token_from_cli, token_from_env};
use crate::error::{Error, Result};
use tracing::debug;

/// Environment variables checked for a GitHub token, in order
pub const GITHUB_TOKEN_VARS: &[&str] = &["GH_TOKEN", "GITHUB_TOKEN"];

/// GitHub authentication configuration
#[derive(Debug, Clone)]
pub struct GitHubAuthConfig {
    /// Authentication token
    pub token: String,
    /// Where the token came from
    pub source: AuthSource,
    /// Enterprise host, `None` for github.com
    pub host: Option<String>,
}

/// Resolve a GitHub token: `gh auth token` first, then `$GH_TOKEN`/`$GITHUB_TOKEN`
pub async fn get_github_auth(host: Option<&str>) -> Result<GitHubAuthConfig> {
    let mut args = vec!["auth", "token"];
    if let Some(h) = host {
        args.extend(["--hostname", h]);
    }

    if let Some(token) = token_from_cli("gh", &args).await {
        debug!("using GitHub token from gh CLI");
        return Ok(GitHubAuthConfig {
            token,
            source: AuthSource::Cli,
            host: host.map(ToString::to_string),
        });
    }

    if let Some(token) = token_from_env(GITHUB_TOKEN_VARS, |name| std::env::var(name).ok()) {
        debug!("using GitHub token from environment");
        return Ok(GitHubAuthConfig {
            token,
            source: AuthSource::EnvVar,
            host: host.map(ToString::to_string),
        });
    }

    Err(Error::Auth(
        "no GitHub token found: pass --git-token, set GIT_TOKEN/GH_TOKEN/GITHUB_TOKEN or run `gh auth login`"
            .to_string(),
    ))
}
