//! Schema of the `updatebot.yaml` configuration file
//!
//! ```yaml
//! apiVersion: updatebot.jenkins-x.io/v1alpha1
//! kind: UpdateConfig
//! spec:
//!   pullRequestLabels: [dependencies]
//!   rules:
//!     - urls: [https://github.com/acme/app]
//!       reusePullRequest: true
//!       changes:
//!         - regex:
//!             pattern: "version: (.*)"
//!             files: [chart/values.yaml]
//! ```

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Root configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateConfig {
    /// API version of the document
    #[serde(default)]
    pub api_version: String,
    /// Document kind
    #[serde(default)]
    pub kind: String,
    /// The rules and defaults
    #[serde(default)]
    pub spec: UpdateConfigSpec,
}

/// Rules and defaults of an [`UpdateConfig`]
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateConfigSpec {
    /// Rules, processed in order
    #[serde(default)]
    pub rules: Vec<Rule>,
    /// Labels applied to created PRs, also used as the reuse filter
    #[serde(default)]
    pub pull_request_labels: Vec<String>,
}

/// One unit of change propagation
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    /// Target repository URLs (may be extended by discovery)
    #[serde(default)]
    pub urls: Vec<String>,
    /// Changes applied to each target, in order
    #[serde(default)]
    pub changes: Vec<Change>,
    /// Open the PR from a fork of the target
    #[serde(default)]
    pub fork: bool,
    /// Clone only the paths the changes need
    #[serde(default)]
    pub sparse_checkout: bool,
    /// Update an open PR matching the labels instead of opening a new one
    #[serde(default)]
    pub reuse_pull_request: bool,
    /// Assign the author of the pipeline commit's parent
    #[serde(default)]
    pub assign_author_to_pull_requests: bool,
    /// Static assignees
    #[serde(default)]
    pub pull_request_assignees: Vec<String>,
}

/// Kind of a [`Change`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// [`CommandChange`]
    Command,
    /// [`GoChange`]
    Go,
    /// [`RegexChange`]
    Regex,
    /// [`VersionStreamChange`]
    VersionStream,
    /// Nothing recognised was populated
    Unknown,
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Command => write!(f, "command"),
            Self::Go => write!(f, "go"),
            Self::Regex => write!(f, "regex"),
            Self::VersionStream => write!(f, "versionStream"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// A single mutation applied to a target repository
///
/// In YAML a change is a map with exactly one of `command`, `go`, `regex` or
/// `versionStream`. Anything else deserializes to [`Change::Unknown`], which
/// is ignored at apply time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawChange", into = "RawChange")]
pub enum Change {
    /// Run a command in the working copy
    Command(CommandChange),
    /// Bump a Go module requirement
    Go(GoChange),
    /// Regex substitution over selected files
    Regex(RegexChange),
    /// Update a version stream entry
    VersionStream(VersionStreamChange),
    /// Unrecognised or empty change
    Unknown,
}

impl Change {
    /// The kind of this change
    pub const fn kind(&self) -> ChangeKind {
        match self {
            Self::Command(_) => ChangeKind::Command,
            Self::Go(_) => ChangeKind::Go,
            Self::Regex(_) => ChangeKind::Regex,
            Self::VersionStream(_) => ChangeKind::VersionStream,
            Self::Unknown => ChangeKind::Unknown,
        }
    }
}

/// Wire shape of a change: a struct of optional fields
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawChange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    command: Option<CommandChange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    go: Option<GoChange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    regex: Option<RegexChange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    version_stream: Option<VersionStreamChange>,
}

impl From<RawChange> for Change {
    fn from(raw: RawChange) -> Self {
        let populated = usize::from(raw.command.is_some())
            + usize::from(raw.go.is_some())
            + usize::from(raw.regex.is_some())
            + usize::from(raw.version_stream.is_some());
        if populated > 1 {
            warn!(populated, "change populates more than one kind, using the first");
        }

        if let Some(c) = raw.command {
            Self::Command(c)
        } else if let Some(g) = raw.go {
            Self::Go(g)
        } else if let Some(r) = raw.regex {
            Self::Regex(r)
        } else if let Some(v) = raw.version_stream {
            Self::VersionStream(v)
        } else {
            Self::Unknown
        }
    }
}

impl From<Change> for RawChange {
    fn from(change: Change) -> Self {
        let mut raw = Self::default();
        match change {
            Change::Command(c) => raw.command = Some(c),
            Change::Go(g) => raw.go = Some(g),
            Change::Regex(r) => raw.regex = Some(r),
            Change::VersionStream(v) => raw.version_stream = Some(v),
            Change::Unknown => {}
        }
        raw
    }
}

/// An environment variable passed to a command
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnvVar {
    /// Variable name
    pub name: String,
    /// Variable value
    #[serde(default)]
    pub value: String,
}

/// Run an external command in the working copy
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommandChange {
    /// Executable name
    pub name: String,
    /// Arguments
    #[serde(default)]
    pub args: Vec<String>,
    /// Extra environment variables
    #[serde(default)]
    pub env: Vec<EnvVar>,
}

/// Include/exclude name filters
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Patterns {
    /// Names to include (glob syntax); empty means everything
    #[serde(default)]
    pub include: Vec<String>,
    /// Names to exclude (glob syntax)
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl Patterns {
    /// Whether `name` passes the include and exclude filters
    pub fn matches(&self, name: &str) -> bool {
        let hit = |patterns: &[String]| {
            patterns.iter().any(|p| {
                glob::Pattern::new(p).map_or_else(|_| p == name, |pat| pat.matches(name))
            })
        };
        (self.include.is_empty() || hit(&self.include)) && !hit(&self.exclude)
    }
}

/// Bump a Go module requirement in `go.mod`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GoChange {
    /// Module path to upgrade
    pub package: String,
    /// Owners (organizations/groups) searched for repositories requiring the module
    #[serde(default)]
    pub owners: Vec<String>,
    /// Filters applied to discovered repository names
    #[serde(default)]
    pub repositories: Patterns,
    /// Skip `go mod tidy` after rewriting `go.mod`
    #[serde(default)]
    pub no_tidy: bool,
}

/// Regex substitution over selected files
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegexChange {
    /// Regular expression applied to file contents
    pub pattern: String,
    /// Relative file paths
    #[serde(default)]
    pub files: Vec<String>,
    /// Relative glob patterns
    #[serde(default)]
    pub globs: Vec<String>,
    /// Replacement template; `{{version}}` is the target version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replace: Option<String>,
    /// Fail when no file matches
    #[serde(default)]
    pub required: bool,
}

/// Update an existing version stream entry
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct VersionStreamChange {
    /// Entry name or glob, without the `.yml` extension
    pub pattern: String,
    /// Version stream directory (defaults to `charts`)
    #[serde(default)]
    pub kind: String,
}
