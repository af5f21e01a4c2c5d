use super::{ChangeOutcome, glob_files, relative};
use crate::config::{ChangeKind, VersionStreamChange};
use crate::error::{Error, Result};
use regex::{NoExpand, Regex};
use std::fs;
use std::path::Path;
use tracing::info;

/// Version stream directory used when a change names no kind
pub const DEFAULT_VERSION_STREAM_KIND: &str = "charts";

/// A top-level `version:` line
const VERSION_LINE: &str = r"(?mR)^version:[^\r\n]*$";

fn strategy_error(message: impl Into<String>) -> Error {
    Error::Strategy {
        kind: ChangeKind::VersionStream,
        message: message.into(),
    }
}

/// Update the `version` of every version stream entry matching the change.
///
/// Entries live at `<dir>/<kind>/<pattern>.yml`. At least one entry must
/// match and every matched entry must already carry a top-level `version`;
/// only that line is rewritten so the rest of the file is left as is.
pub fn apply_version_stream(
    dir: &Path,
    change: &VersionStreamChange,
    version: &str,
) -> Result<ChangeOutcome> {
    if change.pattern.trim().is_empty() {
        return Err(strategy_error("no pattern specified"));
    }
    let kind = if change.kind.is_empty() {
        DEFAULT_VERSION_STREAM_KIND
    } else {
        change.kind.as_str()
    };

    let selector = format!("{kind}/{}.yml", change.pattern);
    let files = glob_files(dir, std::slice::from_ref(&selector))?;
    if files.is_empty() {
        return Err(strategy_error(format!(
            "no version stream entries match {selector}"
        )));
    }

    let version_line = Regex::new(VERSION_LINE)?;
    let replacement = format!("version: {version}");
    let mut modified = Vec::new();
    for path in files {
        let rel = relative(dir, &path);
        let text = fs::read_to_string(&path)?;

        let doc: serde_yaml::Value = serde_yaml::from_str(&text)?;
        if doc.get("version").is_none() {
            return Err(strategy_error(format!(
                "{} has no version entry",
                rel.display()
            )));
        }
        if !version_line.is_match(&text) {
            return Err(strategy_error(format!(
                "cannot locate the version line in {}",
                rel.display()
            )));
        }

        let updated = version_line.replacen(&text, 1, NoExpand(&replacement));
        if updated != text {
            fs::write(&path, updated.as_bytes())?;
            info!(file = %rel.display(), version, "updated version stream entry");
            modified.push(rel);
        }
    }

    if modified.is_empty() {
        Ok(ChangeOutcome::Unchanged)
    } else {
        Ok(ChangeOutcome::Modified(modified))
    }
}
