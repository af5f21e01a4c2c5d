//! Pull request title and body defaults

use crate::platform::ScmFactory;
use tracing::debug;

/// Separator placed between the body and an attached changelog
pub const DEFAULT_CHANGELOG_SEPARATOR: &str = "-----";

/// Commit author name used when nothing else is configured
pub const DEFAULT_GIT_USERNAME: &str = "jenkins-x-bot";

/// Commit author email used when none is configured
pub const DEFAULT_GIT_EMAIL: &str = "jenkins-x@googlegroups.com";

/// `owner/repo` from a git URL (`https://host/owner/repo.git` or
/// `git@host:owner/repo.git`)
pub fn application_from_url(git_url: &str) -> Option<String> {
    let trimmed = git_url.trim().trim_end_matches('/');
    let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);
    let mut parts = trimmed.rsplitn(3, ['/', ':']);
    let repo = parts.next().filter(|s| !s.is_empty())?;
    let owner = parts.next().filter(|s| !s.is_empty())?;
    parts.next()?;
    Some(format!("{owner}/{repo}"))
}

/// Default PR title for `version`, naming the application when known
pub fn default_title(application: &str, version: &str) -> String {
    if application.is_empty() {
        format!("chore(deps): upgrade to version {version}")
    } else {
        format!("chore(deps): upgrade {application} to version {version}")
    }
}

/// Default PR body pointing back at the source repository
pub fn default_body(git_url: Option<&str>) -> String {
    git_url.map_or_else(String::new, |url| format!("from: {url}\n"))
}

/// Append `changelog` to `body` after `separator`
pub fn attach_changelog(body: &str, separator: &str, changelog: &str) -> String {
    let changelog = changelog.trim();
    if changelog.is_empty() {
        return body.to_string();
    }
    let separator = if separator.is_empty() {
        DEFAULT_CHANGELOG_SEPARATOR
    } else {
        separator
    };
    format!("{}\n\n{separator}\n\n{changelog}\n", body.trim_end())
}

/// First non-blank candidate, else [`DEFAULT_GIT_USERNAME`]
pub fn git_username<'a>(candidates: impl IntoIterator<Item = Option<&'a str>>) -> String {
    candidates
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
        .unwrap_or(DEFAULT_GIT_USERNAME)
        .to_string()
}

/// Login the hosting service authenticates as for `repo_url`
///
/// Lookup failures are logged and yield `None` so the caller can fall back
/// to the next candidate.
pub async fn scm_username(factory: &dyn ScmFactory, repo_url: &str) -> Option<String> {
    if repo_url.trim().is_empty() {
        return None;
    }
    let service = match factory.service_for(repo_url).await {
        Ok(service) => service,
        Err(e) => {
            debug!(repo_url, error = %e, "no hosting service for username lookup");
            return None;
        }
    };
    match service.current_user().await {
        Ok(login) if !login.trim().is_empty() => Some(login.trim().to_string()),
        Ok(_) => None,
        Err(e) => {
            debug!(repo_url, error = %e, "failed to look up the authenticated user");
            None
        }
    }
}
