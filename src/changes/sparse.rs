use crate::config::{Change, Rule};
use crate::error::{Error, Result};

/// Paths a Go change needs in a sparse working copy
pub const GO_SPARSE_PATTERNS: &[&str] = &["go.mod", "go.sum", "vendor/"];

/// Sparse checkout patterns covering every path the rule's changes touch.
///
/// Command and version stream changes may touch anything, so a sparse rule
/// containing one is rejected. Patterns keep first-seen order without
/// duplicates.
pub fn sparse_checkout_patterns(rule: &Rule) -> Result<Vec<String>> {
    let mut patterns: Vec<String> = Vec::new();
    let mut push = |p: &str| {
        if !patterns.iter().any(|existing| existing == p) {
            patterns.push(p.to_string());
        }
    };

    for change in &rule.changes {
        match change {
            Change::Go(_) => GO_SPARSE_PATTERNS.iter().for_each(|p| push(*p)),
            Change::Regex(r) => r.files.iter().chain(&r.globs).for_each(|p| push(p.as_str())),
            Change::Command(_) | Change::VersionStream(_) => {
                return Err(Error::SparseCheckoutUnsupported(change.kind()));
            }
            Change::Unknown => {}
        }
    }
    Ok(patterns)
}
