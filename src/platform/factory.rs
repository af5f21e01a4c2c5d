//! Platform service factory

use crate::auth::{get_github_auth, get_gitlab_auth};
use crate::discovery::ModuleIndex;
use crate::error::Result;
use crate::platform::{
    GitHubModuleIndex, GitHubService, GitLabModuleIndex, GitLabService, ScmService,
    parse_repo_info,
};
use crate::types::{Platform, PlatformConfig};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// Creates hosting service clients on demand
#[async_trait]
pub trait ScmFactory: Send + Sync {
    /// Service bound to the repository at `repo_url`
    async fn service_for(&self, repo_url: &str) -> Result<Arc<dyn ScmService>>;

    /// Index used to discover repositories requiring a Go module
    async fn module_index(&self) -> Result<Arc<dyn ModuleIndex>>;
}

/// [`ScmFactory`] for GitHub and GitLab
///
/// The platform is detected from each URL unless `git_kind` is set. Tokens
/// come from the explicit token when given, else from the platform's CLI or
/// environment.
#[derive(Debug, Clone, Default)]
pub struct PlatformFactory {
    token: Option<String>,
    git_kind: Option<Platform>,
    git_server: Option<String>,
}

impl PlatformFactory {
    /// Create a factory
    pub fn new(token: Option<String>, git_kind: Option<Platform>, git_server: Option<String>) -> Self {
        Self {
            token: token.filter(|t| !t.trim().is_empty()),
            git_kind,
            git_server,
        }
    }

    /// Host of `--git-server`, accepting either a URL or a bare host
    fn server_host(&self) -> Option<String> {
        let server = self.git_server.as_deref()?.trim();
        if server.is_empty() {
            return None;
        }
        Url::parse(server)
            .ok()
            .and_then(|u| u.host_str().map(ToString::to_string))
            .or_else(|| Some(server.trim_end_matches('/').to_string()))
    }

    async fn token_for(&self, platform: Platform, host: Option<&str>) -> Result<String> {
        if let Some(token) = &self.token {
            return Ok(token.clone());
        }
        match platform {
            Platform::GitHub => Ok(get_github_auth(host).await?.token),
            Platform::GitLab => Ok(get_gitlab_auth(host).await?.token),
        }
    }

    /// Create the service for an already parsed repository
    pub async fn create_service(&self, config: &PlatformConfig) -> Result<Arc<dyn ScmService>> {
        let token = self.token_for(config.platform, config.host.as_deref()).await?;
        debug!(platform = %config.platform, repo = %config.full_name(), "creating platform service");
        let service: Arc<dyn ScmService> = match config.platform {
            Platform::GitHub => Arc::new(GitHubService::new(
                &token,
                config.owner.clone(),
                config.repo.clone(),
                config.host.clone(),
            )?),
            Platform::GitLab => Arc::new(GitLabService::new(
                token,
                config.owner.clone(),
                config.repo.clone(),
                config.host.clone(),
            )?),
        };
        Ok(service)
    }
}

#[async_trait]
impl ScmFactory for PlatformFactory {
    async fn service_for(&self, repo_url: &str) -> Result<Arc<dyn ScmService>> {
        let config = parse_repo_info(repo_url, self.git_kind)?;
        self.create_service(&config).await
    }

    async fn module_index(&self) -> Result<Arc<dyn ModuleIndex>> {
        let host = self.server_host();
        let platform = self
            .git_kind
            .or_else(|| host.as_deref().and_then(super::detect_platform))
            .unwrap_or(Platform::GitHub);
        let host = host.filter(|h| h != "github.com" && h != "gitlab.com");
        let token = self.token_for(platform, host.as_deref()).await?;

        let index: Arc<dyn ModuleIndex> = match platform {
            Platform::GitHub => Arc::new(GitHubModuleIndex::new(&token, host.as_deref())?),
            Platform::GitLab => Arc::new(GitLabModuleIndex::new(token, host.as_deref())?),
        };
        Ok(index)
    }
}
