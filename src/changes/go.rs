use super::{ChangeContext, ChangeOutcome};
use crate::config::{ChangeKind, GoChange};
use crate::error::{Error, Result};
use crate::runner::CommandSpec;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

fn strategy_error(message: impl Into<String>) -> Error {
    Error::Strategy {
        kind: ChangeKind::Go,
        message: message.into(),
    }
}

/// Go module versions carry a `v` prefix
pub fn go_module_version(version: &str) -> String {
    if version.starts_with('v') {
        version.to_string()
    } else {
        format!("v{version}")
    }
}

/// Upgrade the `require` entry for the change's module in `<dir>/go.mod`.
///
/// Runs `go mod tidy` afterwards unless `noTidy` is set or `go.mod` was
/// already at the target version.
pub async fn apply_go(
    ctx: &ChangeContext<'_>,
    dir: &Path,
    change: &GoChange,
) -> Result<ChangeOutcome> {
    if change.package.trim().is_empty() {
        return Err(strategy_error("no package specified"));
    }

    let go_mod = dir.join("go.mod");
    if !go_mod.is_file() {
        return Err(strategy_error(format!("no go.mod found in {}", dir.display())));
    }

    let content = fs::read_to_string(&go_mod)?;
    let version = go_module_version(ctx.version);
    let updated = rewrite_requirement(&content, &change.package, &version).ok_or_else(|| {
        strategy_error(format!("go.mod does not require module {}", change.package))
    })?;

    if updated == content {
        debug!(module = %change.package, %version, "go.mod already at version");
        return Ok(ChangeOutcome::Unchanged);
    }

    fs::write(&go_mod, &updated)?;
    info!(module = %change.package, %version, "upgraded go.mod requirement");

    if change.no_tidy {
        debug!("skipping go mod tidy");
    } else {
        let spec = CommandSpec::new("go", &["mod", "tidy"], dir);
        ctx.runner.run(&spec).await?.check(&spec)?;
    }

    Ok(ChangeOutcome::Modified(vec![PathBuf::from("go.mod")]))
}

fn requirement_line(module: &str) -> Option<Regex> {
    Regex::new(&format!(
        r"^(\s*(?:require\s+)?)({})(\s+)(\S+)(.*)$",
        regex::escape(module)
    ))
    .ok()
}

/// Rewrite the version of `module` wherever `go.mod` requires it.
///
/// Handles the single-line `require m v1` form and `require ( ... )` blocks,
/// keeping trailing comments such as `// indirect`. Returns `None` when the
/// module is not required at all.
pub fn rewrite_requirement(content: &str, module: &str, version: &str) -> Option<String> {
    let re = requirement_line(module)?;
    let mut found = false;
    let mut in_block = false;
    let mut out = String::with_capacity(content.len());

    for raw in content.split_inclusive('\n') {
        let line = raw.trim_end_matches(['\n', '\r']);
        let ending = &raw[line.len()..];
        let trimmed = line.trim();

        if in_block {
            if trimmed.starts_with(')') {
                in_block = false;
            }
        } else if trimmed.starts_with("require") && trimmed.ends_with('(') {
            in_block = true;
            out.push_str(raw);
            continue;
        }

        let candidate = in_block || trimmed.starts_with("require ");
        if candidate && let Some(caps) = re.captures(line) {
            found = true;
            out.push_str(&caps[1]);
            out.push_str(&caps[2]);
            out.push_str(&caps[3]);
            out.push_str(version);
            out.push_str(&caps[5]);
            out.push_str(ending);
        } else {
            out.push_str(raw);
        }
    }

    found.then_some(out)
}

/// Whether `go.mod` content requires `module`
pub fn go_mod_requires(content: &str, module: &str) -> bool {
    rewrite_requirement(content, module, "v0.0.0").is_some()
}
