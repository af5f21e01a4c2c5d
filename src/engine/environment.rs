//! Working copies and publishing of their changes
//!
//! An [`Environment`] clones a target repository (optionally sparse, optionally
//! for a fork), and once the changes are applied commits, pushes and either
//! creates a PR or updates a reusable one.

use super::context::{RunContext, RunOptions};
use crate::config::Rule;
use crate::error::{Error, Result};
use crate::git::{CloneOptions, GitOps};
use crate::platform::{ScmFactory, ScmService};
use crate::types::{Fork, PullRequest};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Label that marks PRs for automatic merge
pub const UPDATEBOT_LABEL: &str = "updatebot";

/// A cloned target repository
pub struct Workspace {
    /// Target repository URL
    pub url: String,
    /// Working copy
    pub dir: PathBuf,
    /// Service for the target repository
    pub scm: Arc<dyn ScmService>,
    /// Fork the branch is pushed to, when the rule forks
    pub fork: Option<Fork>,
    /// Branch PRs are opened against
    pub base_branch: String,
}

/// Result of publishing a workspace
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PullRequestResult {
    /// A new PR was opened
    Created(PullRequest),
    /// An open PR was updated
    Reused(PullRequest),
}

impl PullRequestResult {
    /// The PR, however it came about
    pub const fn pull_request(&self) -> &PullRequest {
        match self {
            Self::Created(pr) | Self::Reused(pr) => pr,
        }
    }

    /// Whether an existing PR was reused
    pub const fn is_reused(&self) -> bool {
        matches!(self, Self::Reused(_))
    }
}

/// Branch name for an update: `updatebot/<app>-<version>`
pub fn branch_name(application: &str, version: &str) -> String {
    let sanitize = |s: &str| {
        s.chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                    c
                } else {
                    '-'
                }
            })
            .collect::<String>()
            .trim_matches(['-', '.'])
            .to_string()
    };
    let parts: Vec<String> = [sanitize(application), sanitize(version)]
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect();
    if parts.is_empty() {
        "updatebot/changes".to_string()
    } else {
        format!("updatebot/{}", parts.join("-"))
    }
}

/// Clones, commits and publishes target repositories
pub struct Environment<'a> {
    git: &'a dyn GitOps,
    scm: &'a dyn ScmFactory,
    options: &'a RunOptions,
}

impl<'a> Environment<'a> {
    /// Create an environment
    pub fn new(git: &'a dyn GitOps, scm: &'a dyn ScmFactory, options: &'a RunOptions) -> Self {
        Self { git, scm, options }
    }

    /// Options of the run
    pub const fn options(&self) -> &RunOptions {
        self.options
    }

    /// Clone `url` into `dir` ready for the rule's changes
    pub async fn prepare(
        &self,
        url: &str,
        rule: &Rule,
        sparse_patterns: &[String],
        dir: &Path,
    ) -> Result<Workspace> {
        let scm = self.scm.service_for(url).await?;

        let fork = if rule.fork {
            let fork = scm.create_fork().await?;
            info!(%url, fork_owner = %fork.owner, "using fork");
            Some(fork)
        } else {
            None
        };

        let options = CloneOptions {
            sparse_patterns: sparse_patterns.to_vec(),
            branch: self.options.base_branch.clone(),
        };
        self.git.clone_repo(url, dir, &options).await?;

        let base_branch = match &self.options.base_branch {
            Some(branch) => branch.clone(),
            None => self.git.current_branch(dir).await?,
        };
        debug!(%url, dir = %dir.display(), %base_branch, "workspace ready");

        Ok(Workspace {
            url: url.to_string(),
            dir: dir.to_path_buf(),
            scm,
            fork,
            base_branch,
        })
    }

    /// Commit and push the workspace, then create or update its PR.
    ///
    /// With a `reuse_filter`, the newest open PR carrying every filter label
    /// is updated and its head branch force-pushed. Returns `None` when the
    /// changes left the working copy untouched.
    pub async fn publish(
        &self,
        ws: &Workspace,
        reuse_filter: Option<&[String]>,
        labels: &[String],
        ctx: &mut RunContext,
    ) -> Result<Option<PullRequestResult>> {
        if !self.git.has_changes(&ws.dir).await? {
            info!(url = %ws.url, "no changes, not creating a pull request");
            return Ok(None);
        }

        let existing = match reuse_filter {
            Some(filter) => ws.scm.find_open_prs_with_labels(filter).await?.into_iter().next(),
            None => None,
        };

        let branch = existing.as_ref().map_or_else(
            || branch_name(&self.options.application, &self.options.version),
            |pr| pr.head_ref.clone(),
        );

        self.git.checkout_new_branch(&ws.dir, &branch).await?;
        let sha = self
            .git
            .commit_all(&ws.dir, &self.options.commit_message(), &self.options.author)
            .await?;

        let remote = ws.fork.as_ref().map_or("origin", |f| f.clone_url.as_str());
        self.git.push(&ws.dir, remote, &branch, true).await?;
        ctx.pull_request_shas.insert(ws.url.clone(), sha);

        let body = Some(self.options.body.as_str()).filter(|b| !b.is_empty());
        if let Some(pr) = existing {
            let updated = ws
                .scm
                .update_pr(pr.number, &self.options.title, body)
                .await
                .map_err(|e| {
                    Error::Reconcile(format!("failed to update pull request #{}: {e}", pr.number))
                })?;
            info!(url = %ws.url, pr_number = updated.number, "updated existing pull request");
            return Ok(Some(PullRequestResult::Reused(updated)));
        }

        let head = ws
            .fork
            .as_ref()
            .map_or_else(|| branch.clone(), |f| format!("{}:{branch}", f.owner));
        let mut pr = ws
            .scm
            .create_pr_with_options(&head, &ws.base_branch, &self.options.title, body, false)
            .await
            .map_err(|e| {
                Error::Reconcile(format!(
                    "failed to create pull request from {head} into {}: {e}",
                    ws.base_branch
                ))
            })?;
        ws.scm.add_labels(pr.number, labels).await?;
        for label in labels {
            if !pr.labels.contains(label) {
                pr.labels.push(label.clone());
            }
        }
        info!(url = %ws.url, pr_number = pr.number, html_url = %pr.html_url, "created pull request");
        Ok(Some(PullRequestResult::Created(pr)))
    }
}
