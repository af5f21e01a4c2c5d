//! Change strategies applied to a target repository's working copy
//!
//! Each [`Change`] variant maps to one strategy. Dispatch is a single match in
//! [`apply_change`]; an [`Change::Unknown`] entry is logged and skipped so that
//! configs written for newer versions keep working.

mod command;
mod go;
mod regex;
mod sparse;
mod version_stream;

pub use command::apply_command;
pub use go::{apply_go, go_mod_requires, go_module_version, rewrite_requirement};
pub use regex::{apply_regex, substitute};
pub use sparse::{GO_SPARSE_PATTERNS, sparse_checkout_patterns};
pub use version_stream::{DEFAULT_VERSION_STREAM_KIND, apply_version_stream};

use crate::config::Change;
use crate::error::Result;
use crate::runner::CommandRunner;
use glob::MatchOptions;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// What a change needs besides its own parameters
#[derive(Clone, Copy)]
pub struct ChangeContext<'a> {
    /// Version being promoted
    pub version: &'a str,
    /// Runner for external commands (`go`, command changes)
    pub runner: &'a dyn CommandRunner,
}

/// Result of applying one change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeOutcome {
    /// These files (relative to the working copy) were rewritten
    Modified(Vec<PathBuf>),
    /// Nothing needed to change
    Unchanged,
    /// A command ran; its effect on the tree is unknown until git status
    Ran,
    /// The change kind is not recognised
    Ignored,
}

/// Apply a single change to the working copy at `dir`
pub async fn apply_change(
    ctx: &ChangeContext<'_>,
    dir: &Path,
    git_url: &str,
    change: &Change,
) -> Result<ChangeOutcome> {
    debug!(kind = %change.kind(), git_url, "applying change");
    match change {
        Change::Command(c) => apply_command(ctx, dir, c).await,
        Change::Go(g) => apply_go(ctx, dir, g).await,
        Change::Regex(r) => apply_regex(dir, r, ctx.version),
        Change::VersionStream(v) => apply_version_stream(dir, v, ctx.version),
        Change::Unknown => {
            info!(git_url, "ignoring unknown change");
            Ok(ChangeOutcome::Ignored)
        }
    }
}

/// Expand glob patterns relative to `dir` into existing files, deduplicated, in order
pub(crate) fn glob_files(dir: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let base = glob::Pattern::escape(&dir.to_string_lossy());
    let options = MatchOptions {
        require_literal_separator: true,
        ..MatchOptions::new()
    };

    let mut seen = HashSet::new();
    let mut files = Vec::new();
    for pattern in patterns {
        let full = format!("{base}/{}", pattern.trim_start_matches("./"));
        for path in glob::glob_with(&full, options)?.flatten() {
            if path.is_file() && seen.insert(path.clone()) {
                files.push(path);
            }
        }
    }
    Ok(files)
}

/// Path relative to `dir` for reporting
pub(crate) fn relative(dir: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(dir).unwrap_or(path).to_path_buf()
}
