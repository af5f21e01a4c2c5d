//! Platform services for GitHub and GitLab
//!
//! Provides a unified interface for the pull request, commit and issue
//! operations the engine needs, plus repository discovery for Go modules.

mod detection;
mod factory;
mod github;
mod gitlab;

pub use detection::{detect_platform, parse_repo_info};
pub use factory::{PlatformFactory, ScmFactory};
pub use github::{GitHubModuleIndex, GitHubService};
pub use gitlab::{GitLabModuleIndex, GitLabService};

use crate::error::Result;
use crate::types::{Commit, CommitListOptions, Fork, PlatformConfig, PullRequest};
use async_trait::async_trait;

/// Default request timeout in seconds
pub(crate) const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Hosting service operations for one repository
///
/// This trait abstracts GitHub and GitLab so the same reconcile and assignee
/// logic works with either platform.
#[async_trait]
pub trait ScmService: Send + Sync {
    /// Open PRs carrying every label in `labels`, newest first
    async fn find_open_prs_with_labels(&self, labels: &[String]) -> Result<Vec<PullRequest>>;

    /// Create a new PR with explicit body and draft options.
    ///
    /// `head` is either a branch of this repository or `owner:branch` for a
    /// branch on a fork.
    async fn create_pr_with_options(
        &self,
        head: &str,
        base: &str,
        title: &str,
        body: Option<&str>,
        draft: bool,
    ) -> Result<PullRequest>;

    /// Replace the title and body of an existing PR
    async fn update_pr(&self, number: u64, title: &str, body: Option<&str>) -> Result<PullRequest>;

    /// Add labels to a PR
    async fn add_labels(&self, number: u64, labels: &[String]) -> Result<()>;

    /// List commits on a ref, newest first
    async fn list_commits(&self, options: &CommitListOptions) -> Result<Vec<Commit>>;

    /// Add assignees to the issue/PR `number`
    async fn assign_issue(&self, number: u64, logins: &[String]) -> Result<()>;

    /// Fork the repository into the authenticated user's namespace
    async fn create_fork(&self) -> Result<Fork>;

    /// Login of the authenticated user, used as the default commit author
    async fn current_user(&self) -> Result<String>;

    /// Get the platform configuration
    fn config(&self) -> &PlatformConfig;
}
