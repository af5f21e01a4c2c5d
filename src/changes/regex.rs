use super::{ChangeOutcome, glob_files, relative};
use crate::config::{ChangeKind, RegexChange};
use crate::error::{Error, Result};
use regex::Regex;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Placeholder for the version in replacement templates
const VERSION_PLACEHOLDER: &str = "{{version}}";

/// Apply a regex change to every selected file under `dir`.
///
/// Files come from `files` (exact paths) and `globs`, deduplicated. Only files
/// whose content actually changes are written.
pub fn apply_regex(dir: &Path, change: &RegexChange, version: &str) -> Result<ChangeOutcome> {
    if change.pattern.is_empty() {
        return Err(Error::Strategy {
            kind: ChangeKind::Regex,
            message: "no pattern specified".to_string(),
        });
    }
    let re = Regex::new(&change.pattern)?;

    let mut selectors: Vec<String> = change
        .files
        .iter()
        .map(|f| glob::Pattern::escape(f))
        .collect();
    selectors.extend(change.globs.iter().cloned());
    let files = glob_files(dir, &selectors)?;

    if files.is_empty() {
        if change.required {
            return Err(Error::Strategy {
                kind: ChangeKind::Regex,
                message: format!(
                    "no files found for files {:?} globs {:?}",
                    change.files, change.globs
                ),
            });
        }
        debug!(pattern = %change.pattern, "no files matched regex change");
        return Ok(ChangeOutcome::Unchanged);
    }

    let mut modified = Vec::new();
    for path in files {
        let text = fs::read_to_string(&path)?;
        let updated = substitute(&re, &text, version, change.replace.as_deref());
        if updated != text {
            fs::write(&path, &updated)?;
            let rel = relative(dir, &path);
            info!(file = %rel.display(), version, "modified file");
            modified.push(rel);
        }
    }

    if modified.is_empty() {
        Ok(ChangeOutcome::Unchanged)
    } else {
        Ok(ChangeOutcome::Modified(modified))
    }
}

/// Substitute `version` into every match of `re` in `text`.
///
/// With a `replace` template each match becomes the template with
/// `{{version}}` expanded (capture references like `${1}` still work).
/// Without one, the capture group named `version` is replaced, or every
/// capture group when none is named so. A pattern without groups leaves the
/// text untouched.
pub fn substitute(re: &Regex, text: &str, version: &str, replace: Option<&str>) -> String {
    if let Some(template) = replace {
        let expanded = template.replace(VERSION_PLACEHOLDER, version);
        return re.replace_all(text, expanded.as_str()).into_owned();
    }

    let named: Vec<usize> = re
        .capture_names()
        .enumerate()
        .filter(|(_, name)| *name == Some("version"))
        .map(|(i, _)| i)
        .collect();
    let targets: Vec<usize> = if named.is_empty() {
        (1..re.captures_len()).collect()
    } else {
        named
    };

    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for caps in re.captures_iter(text) {
        let mut spans: Vec<(usize, usize)> = targets
            .iter()
            .filter_map(|&i| caps.get(i))
            .map(|m| (m.start(), m.end()))
            .collect();
        spans.sort_unstable();
        for (start, end) in spans {
            // nested groups overlap an earlier span
            if start < last {
                continue;
            }
            out.push_str(&text[last..start]);
            out.push_str(version);
            last = end;
        }
    }
    out.push_str(&text[last..]);
    out
}
