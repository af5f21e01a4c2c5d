//! Error types for updatebot

use crate::config::ChangeKind;
use thiserror::Error;

/// Errors raised while processing update rules
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid or inconsistent configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// A required option was not supplied
    #[error("missing option: --{0}")]
    MissingOption(String),

    /// Target repository discovery failed
    #[error("failed to find repositories to update: {0}")]
    Resolution(String),

    /// Sparse checkout requested for a change that may touch any path
    #[error("sparse checkout not supported for {0} change")]
    SparseCheckoutUnsupported(ChangeKind),

    /// A change strategy could not be applied
    #[error("failed to apply {kind} change: {message}")]
    Strategy {
        /// Kind of change that failed
        kind: ChangeKind,
        /// What went wrong
        message: String,
    },

    /// An external command exited unsuccessfully
    #[error("command `{command}` failed: {output}")]
    Command {
        /// Command line that was run
        command: String,
        /// stderr (or stdout when stderr was empty) of the command
        output: String,
    },

    /// A git operation failed
    #[error("git {command} failed in {dir}: {stderr}")]
    Git {
        /// git subcommand and arguments
        command: String,
        /// Working directory
        dir: String,
        /// stderr of the git process
        stderr: String,
    },

    /// A pull request could not be created or reused
    #[error("pull request error: {0}")]
    Reconcile(String),

    /// Assignee resolution or assignment failed
    #[error("assignment error: {0}")]
    Assignment(String),

    /// GitHub API error
    #[error("GitHub API error: {0}")]
    GitHubApi(String),

    /// GitLab API error
    #[error("GitLab API error: {0}")]
    GitLabApi(String),

    /// Generic platform error (used by test doubles and unsupported operations)
    #[error("platform error: {0}")]
    Platform(String),

    /// The repository URL does not belong to a supported hosting service
    #[error("unsupported repository URL: {0}")]
    UnsupportedUrl(String),

    /// No token could be found for the hosting service
    #[error("authentication error: {0}")]
    Auth(String),

    /// A rule failed; the run stops here
    #[error("failed to process rule #{index}")]
    RuleFailed {
        /// Zero-based rule index
        index: usize,
        /// Underlying failure
        #[source]
        source: Box<Error>,
    },

    /// Processing a single target repository failed
    #[error("failed to update repository {url}")]
    RepositoryFailed {
        /// Target repository URL
        url: String,
        /// Underlying failure
        #[source]
        source: Box<Error>,
    },

    /// A change could not be applied to a working copy
    #[error("failed to apply change #{index} ({kind})")]
    ChangeFailed {
        /// Zero-based change index within the rule
        index: usize,
        /// Kind of the change
        kind: ChangeKind,
        /// Underlying failure
        #[source]
        source: Box<Error>,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parse or serialize error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Invalid regular expression
    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),

    /// Invalid glob pattern
    #[error("glob pattern error: {0}")]
    Glob(#[from] glob::PatternError),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// octocrab error
    #[error("GitHub API error: {0}")]
    Octocrab(#[from] octocrab::Error),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Wrap with the index of the rule being processed
    pub fn in_rule(self, index: usize) -> Self {
        Self::RuleFailed {
            index,
            source: Box::new(self),
        }
    }

    /// Wrap with the URL of the repository being processed
    pub fn in_repository(self, url: &str) -> Self {
        Self::RepositoryFailed {
            url: url.to_string(),
            source: Box::new(self),
        }
    }

    /// Wrap with the position and kind of the change being applied
    pub fn in_change(self, index: usize, kind: ChangeKind) -> Self {
        Self::ChangeFailed {
            index,
            kind,
            source: Box::new(self),
        }
    }

    /// The innermost error, skipping rule, repository and change context
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::RuleFailed { source, .. }
            | Self::RepositoryFailed { source, .. }
            | Self::ChangeFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_cause_unwraps_context() {
        let err = Error::Reconcile("boom".to_string())
            .in_repository("https://github.com/o/r")
            .in_rule(2);

        assert_eq!(err.to_string(), "failed to process rule #2");
        assert!(matches!(err.root_cause(), Error::Reconcile(msg) if msg == "boom"));
    }

    #[test]
    fn test_source_chain_carries_repository_url() {
        use std::error::Error as _;

        let err = Error::Assignment("no parent".to_string())
            .in_repository("https://github.com/o/r")
            .in_rule(0);
        let repo = err.source().expect("rule error has a source");
        assert!(repo.to_string().contains("https://github.com/o/r"));
    }

    #[test]
    fn test_strategy_display_names_kind() {
        let err = Error::Strategy {
            kind: ChangeKind::Go,
            message: "module not found".to_string(),
        };
        assert_eq!(err.to_string(), "failed to apply go change: module not found");
    }
}
