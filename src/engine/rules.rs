//! Rule processing
//!
//! Rules run strictly in order. For each rule the target URLs are resolved,
//! every target is cloned and changed in its own working copy, and the result
//! is handed to the [`Reconciler`]. The first failure stops the run.

use super::context::{PullRequestSummary, RuleSummary, RunContext, RunOptions};
use super::environment::{Environment, PullRequestResult};
use super::pull_request::{Reconciler, effective_labels, pr_labels, reuse_filter, validate_rules};
use crate::changes::{ChangeContext, ChangeOutcome, apply_change, sparse_checkout_patterns};
use crate::config::{Rule, UpdateConfig};
use crate::discovery::{find_urls, needs_discovery};
use crate::error::{Error, Result};
use crate::git::GitOps;
use crate::platform::ScmFactory;
use crate::runner::CommandRunner;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Drives rules through discovery, changes and PR reconciliation
pub struct RuleEngine {
    git: Arc<dyn GitOps>,
    runner: Arc<dyn CommandRunner>,
    scm: Arc<dyn ScmFactory>,
    options: RunOptions,
}

impl RuleEngine {
    /// Create an engine
    pub fn new(
        git: Arc<dyn GitOps>,
        runner: Arc<dyn CommandRunner>,
        scm: Arc<dyn ScmFactory>,
        options: RunOptions,
    ) -> Self {
        Self {
            git,
            runner,
            scm,
            options,
        }
    }

    /// Options of the run
    pub const fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Process every rule of `config` in order.
    ///
    /// URLs found by discovery are written back to their rule.
    pub async fn process_rules(&self, config: &mut UpdateConfig, ctx: &mut RunContext) -> Result<()> {
        let labels = effective_labels(&self.options.labels, &config.spec.pull_request_labels);
        validate_rules(&config.spec.rules, &labels)?;
        let create_labels = pr_labels(&labels, self.options.auto_merge);

        for (index, rule) in config.spec.rules.iter_mut().enumerate() {
            let summary = self
                .process_rule(index, rule, &labels, &create_labels, ctx)
                .await
                .map_err(|e| e.in_rule(index))?;
            ctx.summary.rules.push(summary);
        }
        Ok(())
    }

    async fn process_rule(
        &self,
        index: usize,
        rule: &mut Rule,
        labels: &[String],
        create_labels: &[String],
        ctx: &mut RunContext,
    ) -> Result<RuleSummary> {
        if needs_discovery(rule) {
            let module_index = self
                .scm
                .module_index()
                .await
                .map_err(|e| Error::Resolution(format!("no module index available: {e}")))?;
            find_urls(rule, module_index.as_ref()).await?;
        }

        let urls: Vec<String> = rule
            .urls
            .iter()
            .filter(|url| {
                let blank = url.trim().is_empty();
                if blank {
                    warn!(rule = index, "skipping empty URL");
                }
                !blank
            })
            .cloned()
            .collect();
        if urls.is_empty() {
            warn!(rule = index, "no URLs to update, skipping rule");
            return Ok(RuleSummary {
                index,
                repositories: 0,
                skipped: true,
            });
        }

        let sparse_patterns = if rule.sparse_checkout {
            sparse_checkout_patterns(rule)?
        } else {
            Vec::new()
        };
        let filter = reuse_filter(rule, labels, self.options.auto_merge)?;

        let rule: &Rule = rule;
        let env = Environment::new(self.git.as_ref(), self.scm.as_ref(), &self.options);
        let mut reconciler =
            Reconciler::new(&env, self.scm.as_ref(), rule, filter.as_deref(), create_labels);
        for (n, url) in urls.iter().enumerate() {
            let dir = self.work_dir(index, n, url);
            info!(rule = index, %url, dir = %dir.display(), "updating repository");

            let result = self
                .process_repository(&env, &mut reconciler, rule, url, &sparse_patterns, dir, ctx)
                .await
                .map_err(|e| e.in_repository(url))?;

            match result {
                Some(pr) => ctx.summary.pull_requests.push(PullRequestSummary {
                    repository: url.clone(),
                    reused: pr.is_reused(),
                    pull_request: pr.pull_request().clone(),
                }),
                None => ctx.summary.unchanged.push(url.clone()),
            }
        }

        Ok(RuleSummary {
            index,
            repositories: urls.len(),
            skipped: false,
        })
    }

    #[allow(clippy::too_many_arguments)]
    async fn process_repository(
        &self,
        env: &Environment<'_>,
        reconciler: &mut Reconciler<'_>,
        rule: &Rule,
        url: &str,
        sparse_patterns: &[String],
        dir: PathBuf,
        ctx: &mut RunContext,
    ) -> Result<Option<PullRequestResult>> {
        let ws = env.prepare(url, rule, sparse_patterns, &dir).await?;
        let change_ctx = ChangeContext {
            version: &self.options.version,
            runner: self.runner.as_ref(),
        };
        for (ci, change) in rule.changes.iter().enumerate() {
            let outcome = apply_change(&change_ctx, &ws.dir, url, change)
                .await
                .map_err(|e| e.in_change(ci, change.kind()))?;
            if let ChangeOutcome::Modified(files) = &outcome {
                debug!(%url, change = ci, kind = %change.kind(), files = files.len(), "modified files");
            }
        }
        reconciler.create_or_reuse(&ws, ctx).await
    }

    fn work_dir(&self, rule: usize, n: usize, url: &str) -> PathBuf {
        let name = url
            .trim_end_matches('/')
            .trim_end_matches(".git")
            .rsplit(['/', ':'])
            .next()
            .unwrap_or_default();
        let slug: String = name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
            .collect();
        self.options
            .work_root
            .join(format!("rule-{rule}"))
            .join(format!("{n}-{slug}"))
    }
}
