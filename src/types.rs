//! Core types shared by the engine and the platform services

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A pull request / merge request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PullRequest {
    /// PR/MR number
    pub number: u64,
    /// Web URL for the PR/MR
    pub html_url: String,
    /// Base branch name
    pub base_ref: String,
    /// Head branch name
    pub head_ref: String,
    /// PR/MR title
    pub title: String,
    /// Label names on the PR
    pub labels: Vec<String>,
}

impl PullRequest {
    /// Whether the PR carries every label in `labels`
    pub fn has_labels(&self, labels: &[String]) -> bool {
        labels.iter().all(|l| self.labels.contains(l))
    }
}

/// A commit from a history listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Commit {
    /// Commit SHA
    pub sha: String,
    /// Login of the commit author on the hosting service (may be empty)
    pub author_login: String,
    /// Parent commit SHAs, when the listing provides them
    pub parents: Vec<String>,
    /// When the commit was authored
    pub authored_at: Option<DateTime<Utc>>,
}

/// Options for listing commits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitListOptions {
    /// Branch or ref to list from
    pub r#ref: String,
    /// 1-based page number
    pub page: u32,
    /// Page size
    pub size: u32,
}

/// A fork created on the hosting service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fork {
    /// Owner of the fork
    pub owner: String,
    /// Clone URL of the fork
    pub clone_url: String,
}

/// Detected platform type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Platform {
    /// GitHub or GitHub Enterprise
    GitHub,
    /// GitLab or self-hosted GitLab
    GitLab,
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GitHub => write!(f, "GitHub"),
            Self::GitLab => write!(f, "GitLab"),
        }
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "github" => Ok(Self::GitHub),
            "gitlab" => Ok(Self::GitLab),
            other => Err(format!("unknown git kind '{other}', expected github or gitlab")),
        }
    }
}

/// Platform configuration for one repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformConfig {
    /// Platform type
    pub platform: Platform,
    /// Repository owner (user, organization or group path)
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Custom host (None for github.com/gitlab.com)
    pub host: Option<String>,
}

impl PlatformConfig {
    /// `owner/repo`
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}
