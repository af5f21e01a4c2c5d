//! Label handling and PR reconciliation

use super::assignees::{AssigneeReason, AssigneeSet, assign, assignees_for};
use super::context::RunContext;
use super::environment::{Environment, PullRequestResult, UPDATEBOT_LABEL, Workspace};
use crate::config::Rule;
use crate::error::{Error, Result};
use crate::platform::ScmFactory;
use tracing::debug;

const REUSE_WITHOUT_LABELS: &str =
    "to be able to reuse pull request you need to supply pullRequestLabels in config file or --labels";

/// Labels for the run: `--labels` when given, else the config's
/// `pullRequestLabels`
pub fn effective_labels(flag_labels: &[String], config_labels: &[String]) -> Vec<String> {
    let source = if flag_labels.is_empty() {
        config_labels
    } else {
        flag_labels
    };
    let mut labels: Vec<String> = Vec::with_capacity(source.len());
    for label in source.iter().map(|l| l.trim()).filter(|l| !l.is_empty()) {
        if !labels.iter().any(|l| l == label) {
            labels.push(label.to_string());
        }
    }
    labels
}

/// Fail when a rule reuses PRs but there are no labels to find them by
pub fn validate_rules(rules: &[Rule], labels: &[String]) -> Result<()> {
    if labels.is_empty() && rules.iter().any(|r| r.reuse_pull_request) {
        return Err(Error::Config(REUSE_WITHOUT_LABELS.to_string()));
    }
    Ok(())
}

/// Labels applied to created PRs
pub fn pr_labels(labels: &[String], auto_merge: bool) -> Vec<String> {
    let mut result = labels.to_vec();
    if auto_merge && !result.iter().any(|l| l == UPDATEBOT_LABEL) {
        result.push(UPDATEBOT_LABEL.to_string());
    }
    result
}

/// Labels an open PR must carry to be reused, or `None` when the rule
/// always opens a new PR
pub fn reuse_filter(rule: &Rule, labels: &[String], auto_merge: bool) -> Result<Option<Vec<String>>> {
    if !rule.reuse_pull_request {
        return Ok(None);
    }
    if labels.is_empty() {
        return Err(Error::Config(REUSE_WITHOUT_LABELS.to_string()));
    }
    Ok(Some(pr_labels(labels, auto_merge)))
}

/// Reconciles one workspace into a PR and assigns it
pub struct Reconciler<'a> {
    env: &'a Environment<'a>,
    scm: &'a dyn ScmFactory,
    rule: &'a Rule,
    reuse_filter: Option<&'a [String]>,
    labels: &'a [String],
    assignees: Option<AssigneeSet>,
}

impl<'a> Reconciler<'a> {
    /// Reconciler for the repositories of `rule`
    pub fn new(
        env: &'a Environment<'a>,
        scm: &'a dyn ScmFactory,
        rule: &'a Rule,
        reuse_filter: Option<&'a [String]>,
        labels: &'a [String],
    ) -> Self {
        Self {
            env,
            scm,
            rule,
            reuse_filter,
            labels,
            assignees: None,
        }
    }

    /// Publish the workspace and assign the resulting PR.
    ///
    /// Assignees are resolved once per rule, on the first PR that needs them.
    pub async fn create_or_reuse(
        &mut self,
        ws: &Workspace,
        ctx: &mut RunContext,
    ) -> Result<Option<PullRequestResult>> {
        let Some(result) = self.env.publish(ws, self.reuse_filter, self.labels, ctx).await? else {
            return Ok(None);
        };

        let set = match self.assignees.take() {
            Some(set) => set,
            None => {
                let options = self.env.options();
                let mut set = assignees_for(self.rule, &options.pipeline, self.scm).await?;
                for login in &options.assignees {
                    set.insert(login, AssigneeReason::Configured);
                }
                set
            }
        };
        debug!(assignees = ?set.logins(), "resolved assignees");
        assign(ws.scm.as_ref(), result.pull_request(), &set).await?;
        self.assignees = Some(set);

        Ok(Some(result))
    }
}
