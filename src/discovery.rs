//! Target repository discovery
//!
//! Rules normally list their target URLs. Go changes may instead name
//! `owners`, in which case every repository under those owners whose `go.mod`
//! requires the module becomes a target.

use crate::config::{Change, GoChange, Rule};
use crate::error::{Error, Result};
use async_trait::async_trait;
use tracing::{debug, info};

/// Looks up repositories that depend on a Go module
#[async_trait]
pub trait ModuleIndex: Send + Sync {
    /// URLs of repositories under `change.owners` requiring `change.package`,
    /// filtered by `change.repositories` with archived repositories skipped
    async fn find_importers(&self, change: &GoChange) -> Result<Vec<String>>;
}

/// Whether any change in the rule needs discovery
pub fn needs_discovery(rule: &Rule) -> bool {
    rule.changes
        .iter()
        .any(|c| matches!(c, Change::Go(g) if !g.owners.is_empty()))
}

/// Extend `rule.urls` with discovered repositories.
///
/// URLs already present are not added again. Zero results is not an error;
/// a failing index is reported as [`Error::Resolution`].
pub async fn find_urls(rule: &mut Rule, index: &dyn ModuleIndex) -> Result<()> {
    let mut discovered = Vec::new();
    for change in &rule.changes {
        let Change::Go(go) = change else {
            continue;
        };
        if go.owners.is_empty() {
            continue;
        }
        debug!(module = %go.package, owners = ?go.owners, "discovering repositories");
        let urls = index
            .find_importers(go)
            .await
            .map_err(|e| Error::Resolution(format!("module {}: {e}", go.package)))?;
        discovered.extend(urls);
    }

    for url in discovered {
        if !rule.urls.contains(&url) {
            info!(%url, "discovered repository");
            rule.urls.push(url);
        }
    }
    Ok(())
}
