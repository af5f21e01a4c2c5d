//! Assignee resolution
//!
//! Static assignees come from the rule. With `assignAuthorToPullRequests`,
//! the author of the parent of the pipeline commit is added as well.

use super::context::PipelineContext;
use crate::config::Rule;
use crate::error::{Error, Result};
use crate::platform::{ScmFactory, ScmService};
use crate::types::{Commit, CommitListOptions, PullRequest};
use tracing::{debug, info, warn};

/// Commits fetched when looking for a parent commit
pub const PARENT_SEARCH_PAGE_SIZE: u32 = 50;

/// Why a login is in an [`AssigneeSet`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssigneeReason {
    /// Listed in `pullRequestAssignees`
    Configured,
    /// Authored the parent of the pipeline commit
    ParentCommitAuthor,
}

/// Insertion-ordered set of logins to assign
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssigneeSet {
    entries: Vec<(String, AssigneeReason)>,
}

impl AssigneeSet {
    /// Add `login` unless already present or empty; returns whether it was added
    pub fn insert(&mut self, login: &str, reason: AssigneeReason) -> bool {
        let login = login.trim();
        if login.is_empty() || self.entries.iter().any(|(l, _)| l == login) {
            return false;
        }
        self.entries.push((login.to_string(), reason));
        true
    }

    /// Logins in insertion order
    pub fn logins(&self) -> Vec<String> {
        self.entries.iter().map(|(l, _)| l.clone()).collect()
    }

    /// Logins with the reason each was added
    pub fn iter(&self) -> impl Iterator<Item = (&str, AssigneeReason)> {
        self.entries.iter().map(|(l, r)| (l.as_str(), *r))
    }

    /// Number of logins
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there is nobody to assign
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Pick the parent of `sha` from a newest-first commit listing.
///
/// When the target lists parent hashes and its first parent is on the page,
/// that commit is the parent. Otherwise the entry after the target is.
pub fn parent_commit<'a>(commits: &'a [Commit], sha: &str) -> Result<&'a Commit> {
    if commits.len() < 2 {
        return Err(Error::Assignment(format!(
            "no possible parent commit found for commit {sha}"
        )));
    }

    let not_found = || Error::Assignment(format!("no parent commit found for commit {sha}"));
    let position = commits.iter().position(|c| c.sha == sha).ok_or_else(not_found)?;

    if let Some(first_parent) = commits[position].parents.first()
        && let Some(parent) = commits.iter().find(|c| &c.sha == first_parent)
    {
        return Ok(parent);
    }
    commits.get(position + 1).ok_or_else(not_found)
}

/// Login of the author of the parent of `sha` on `base_ref`; empty when the
/// commit has no linked account
pub async fn find_parent_commit_author(
    scm: &dyn ScmService,
    sha: &str,
    base_ref: &str,
) -> Result<String> {
    let options = CommitListOptions {
        r#ref: base_ref.to_string(),
        page: 1,
        size: PARENT_SEARCH_PAGE_SIZE,
    };
    let commits = scm.list_commits(&options).await?;
    let parent = parent_commit(&commits, sha)?;
    info!(parent = %parent.sha, commit = sha, "found parent commit");

    if parent.author_login.is_empty() {
        warn!(commit = sha, parent = %parent.sha, "no author found for parent commit");
    }
    Ok(parent.author_login.clone())
}

/// Assignees for PRs created by `rule`
pub async fn assignees_for(
    rule: &Rule,
    pipeline: &PipelineContext,
    scm: &dyn ScmFactory,
) -> Result<AssigneeSet> {
    let mut set = AssigneeSet::default();
    for login in &rule.pull_request_assignees {
        set.insert(login, AssigneeReason::Configured);
    }

    if rule.assign_author_to_pull_requests {
        if pipeline.repo_url.is_empty() {
            return Err(Error::Assignment(
                "no pipeline repository URL to find the commit author in (--pipeline-repo-url)"
                    .to_string(),
            ));
        }
        let service = scm.service_for(&pipeline.repo_url).await?;
        let author =
            find_parent_commit_author(service.as_ref(), &pipeline.commit_sha, &pipeline.base_ref)
                .await?;
        if set.insert(&author, AssigneeReason::ParentCommitAuthor) {
            debug!(%author, "assigning parent commit author");
        }
    }
    Ok(set)
}

/// Assign `set` to the PR; nothing is called for an empty set
pub async fn assign(scm: &dyn ScmService, pr: &PullRequest, set: &AssigneeSet) -> Result<()> {
    if set.is_empty() {
        return Ok(());
    }
    let logins = set.logins();
    scm.assign_issue(pr.number, &logins)
        .await
        .map_err(|e| Error::Assignment(format!("failed to assign users to PR {}: {e}", pr.number)))?;
    info!(pr_number = pr.number, assignees = ?logins, "assigned users");
    Ok(())
}
