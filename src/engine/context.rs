//! Run options and per-run mutable state

use crate::git::CommitAuthor;
use crate::types::PullRequest;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// The pipeline run that triggered the update
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineContext {
    /// SHA of the commit that triggered the pipeline
    pub commit_sha: String,
    /// Base ref the pipeline ran against
    pub base_ref: String,
    /// URL of the repository the pipeline ran for
    pub repo_url: String,
}

/// Immutable inputs of a run
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Version being promoted (may be empty with `--no-version`)
    pub version: String,
    /// Application name, used for branch names
    pub application: String,
    /// `--labels`; when empty the config's `pullRequestLabels` apply
    pub labels: Vec<String>,
    /// `--pull-request-assign`, assigned on top of each rule's assignees
    pub assignees: Vec<String>,
    /// Add the `updatebot` label and include it in reuse filters
    pub auto_merge: bool,
    /// Base branch for new PRs; defaults to the clone's default branch
    pub base_branch: Option<String>,
    /// Commit identity
    pub author: CommitAuthor,
    /// PR title, also the commit subject
    pub title: String,
    /// PR body, also the commit body
    pub body: String,
    /// Triggering pipeline, for author inference
    pub pipeline: PipelineContext,
    /// Directory under which working copies are cloned
    pub work_root: PathBuf,
}

impl RunOptions {
    /// Commit message: title, blank line, body
    pub fn commit_message(&self) -> String {
        let body = self.body.trim();
        if body.is_empty() {
            self.title.clone()
        } else {
            format!("{}\n\n{body}", self.title)
        }
    }
}

/// Outcome of one rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSummary {
    /// Rule index
    pub index: usize,
    /// Number of repositories processed
    pub repositories: usize,
    /// Skipped because no URLs resolved
    pub skipped: bool,
}

/// A PR touched by the run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestSummary {
    /// Target repository URL
    pub repository: String,
    /// The PR
    pub pull_request: PullRequest,
    /// Whether an open PR was updated rather than created
    pub reused: bool,
}

/// What happened during the run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// One entry per rule processed
    pub rules: Vec<RuleSummary>,
    /// PRs created or reused
    pub pull_requests: Vec<PullRequestSummary>,
    /// Repositories where the changes produced no diff
    pub unchanged: Vec<String>,
}

impl RunSummary {
    /// Number of PRs created
    pub fn created(&self) -> usize {
        self.pull_requests.iter().filter(|p| !p.reused).count()
    }

    /// Number of PRs reused
    pub fn reused(&self) -> usize {
        self.pull_requests.iter().filter(|p| p.reused).count()
    }

    /// Number of rules skipped for lack of URLs
    pub fn skipped_rules(&self) -> usize {
        self.rules.iter().filter(|r| r.skipped).count()
    }
}

/// Mutable state threaded through a run
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    /// Values available to `{{name}}` placeholders
    pub template_data: BTreeMap<String, String>,
    /// Target URL to the SHA pushed for its PR
    pub pull_request_shas: BTreeMap<String, String>,
    /// Run summary
    pub summary: RunSummary,
}

impl RunContext {
    /// Context seeded with the version and application template values
    pub fn new(version: &str, application: &str) -> Self {
        let mut template_data = BTreeMap::new();
        template_data.insert("version".to_string(), version.to_string());
        template_data.insert("app".to_string(), application.to_string());
        Self {
            template_data,
            ..Self::default()
        }
    }

    /// Expand `{{name}}` placeholders from [`Self::template_data`]
    ///
    /// Unknown placeholders are left as they are.
    pub fn expand(&self, text: &str) -> String {
        self.template_data
            .iter()
            .fold(text.to_string(), |acc, (key, value)| {
                acc.replace(&format!("{{{{{key}}}}}"), value)
            })
    }
}
