//! Rule engine
//!
//! - [`rules`]: iterates rules and target repositories
//! - [`environment`]: working copies, commits, pushes and PR publishing
//! - [`pull_request`]: label handling and create-or-reuse reconciliation
//! - [`assignees`]: static and inferred PR assignees
//! - [`message`]: PR title and body defaults
//! - [`context`]: run options and per-run state

pub mod assignees;
pub mod context;
pub mod environment;
pub mod message;
pub mod pull_request;
pub mod rules;

pub use assignees::{
    AssigneeReason, AssigneeSet, assign, assignees_for, find_parent_commit_author, parent_commit,
};
pub use context::{
    PipelineContext, PullRequestSummary, RuleSummary, RunContext, RunOptions, RunSummary,
};
pub use environment::{Environment, PullRequestResult, UPDATEBOT_LABEL, Workspace, branch_name};
pub use message::{
    DEFAULT_CHANGELOG_SEPARATOR, DEFAULT_GIT_EMAIL, DEFAULT_GIT_USERNAME, application_from_url,
    attach_changelog, default_body, default_title, git_username, scm_username,
};
pub use pull_request::{Reconciler, effective_labels, pr_labels, reuse_filter, validate_rules};
pub use rules::RuleEngine;
