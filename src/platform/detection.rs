//! Platform detection from repository URLs

use crate::error::{Error, Result};
use crate::types::{Platform, PlatformConfig};
use url::Url;

/// Detect the platform from a host name
///
/// `github.com`/`gitlab.com` and hosts containing `github`/`gitlab` (e.g.
/// `github.acme.com`, `gitlab.internal`) are recognised.
pub fn detect_platform(host: &str) -> Option<Platform> {
    let host = host.to_ascii_lowercase();
    if host == "github.com" || host.contains("github") {
        Some(Platform::GitHub)
    } else if host == "gitlab.com" || host.contains("gitlab") {
        Some(Platform::GitLab)
    } else {
        None
    }
}

/// Split a remote URL into host and path
///
/// Accepts `https://host/owner/repo(.git)`, `ssh://git@host/owner/repo.git`
/// and the scp-like `git@host:owner/repo.git`.
fn split_remote(remote: &str) -> Option<(String, String)> {
    let remote = remote.trim();
    if let Ok(url) = Url::parse(remote)
        && let Some(host) = url.host_str()
    {
        let host = match url.port() {
            Some(port) if url.scheme() != "ssh" => format!("{host}:{port}"),
            _ => host.to_string(),
        };
        return Some((host, url.path().to_string()));
    }

    let (user_host, path) = remote.split_once(':')?;
    let host = user_host.rsplit('@').next()?;
    if host.is_empty() || host.contains('/') {
        return None;
    }
    Some((host.to_string(), path.to_string()))
}

/// Parse a repository URL into a [`PlatformConfig`]
///
/// `git_kind` overrides detection for hosts whose name gives no hint.
/// GitLab owners may be nested group paths.
pub fn parse_repo_info(remote: &str, git_kind: Option<Platform>) -> Result<PlatformConfig> {
    let (host, path) =
        split_remote(remote).ok_or_else(|| Error::UnsupportedUrl(remote.to_string()))?;

    let platform = git_kind
        .or_else(|| detect_platform(&host))
        .ok_or_else(|| Error::UnsupportedUrl(remote.to_string()))?;

    let path = path.trim_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);
    let (owner, repo) = path
        .rsplit_once('/')
        .filter(|(owner, repo)| !owner.is_empty() && !repo.is_empty())
        .ok_or_else(|| Error::UnsupportedUrl(remote.to_string()))?;

    if platform == Platform::GitHub && owner.contains('/') {
        return Err(Error::UnsupportedUrl(remote.to_string()));
    }

    let default_host = match platform {
        Platform::GitHub => "github.com",
        Platform::GitLab => "gitlab.com",
    };
    let host = (host != default_host).then_some(host);

    Ok(PlatformConfig {
        platform,
        owner: owner.to_string(),
        repo: repo.to_string(),
        host,
    })
}
