//! Pr command - create a pull request on each downstream repository

use crate::cli::style::{CHECK, SKIP, Stylize};
use anstream::println;
use clap::{ArgAction, Args};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use updatebot::auth::get_github_auth;
use updatebot::config::{VersionSource, config_path, load_update_config, resolve_version};
use updatebot::engine::{
    DEFAULT_CHANGELOG_SEPARATOR, DEFAULT_GIT_EMAIL, PipelineContext, RuleEngine, RunContext,
    RunOptions, RunSummary, application_from_url, attach_changelog, default_body, default_title,
    effective_labels, git_username, scm_username, validate_rules,
};
use updatebot::error::{Error, Result};
use updatebot::git::{CommitAuthor, GitCli, GitCredentials, GitOps};
use updatebot::platform::PlatformFactory;
use updatebot::runner::ProcessRunner;
use updatebot::types::Platform;
use url::Url;

/// Flags of `updatebot pr`
#[derive(Debug, Clone, Args)]
pub struct PrArgs {
    /// Directory holding the VERSION file and the source repository
    #[arg(short, long, default_value = ".")]
    pub dir: PathBuf,

    /// Update config file; defaults to <dir>/.jx/updatebot.yaml
    #[arg(short, long)]
    pub config_file: Option<PathBuf>,

    /// Version to promote; defaults to the version file, then $VERSION
    #[arg(long)]
    pub version: Option<String>,

    /// File to read the version from; defaults to <dir>/VERSION
    #[arg(long)]
    pub version_file: Option<PathBuf>,

    /// Application being promoted; defaults to owner/repo of <dir>
    #[arg(short, long)]
    pub app: Option<String>,

    /// File whose contents are appended to the PR body as a changelog
    #[arg(long)]
    pub add_changelog: Option<PathBuf>,

    /// Separator between the PR body and the changelog
    #[arg(long, env = "CHANGELOG_SEPARATOR", default_value = DEFAULT_CHANGELOG_SEPARATOR)]
    pub changelog_separator: String,

    /// PR title ({{version}} and {{app}} are expanded)
    #[arg(long, visible_alias = "commit-title")]
    pub pull_request_title: Option<String>,

    /// PR body ({{version}} and {{app}} are expanded)
    #[arg(long, visible_alias = "commit-message")]
    pub pull_request_body: Option<String>,

    /// Commit author name
    #[arg(long)]
    pub git_user_name: Option<String>,

    /// Commit author email
    #[arg(long)]
    pub git_user_email: Option<String>,

    /// SHA of the commit that triggered the pipeline
    #[arg(long, env = "PULL_BASE_SHA", default_value = "")]
    pub pipeline_commit_sha: String,

    /// Base ref of the commit that triggered the pipeline
    #[arg(long, env = "PULL_BASE_REF", default_value = "")]
    pub pipeline_base_ref: String,

    /// URL of the repository that triggered the pipeline
    #[arg(long, env = "REPO_URL", default_value = "")]
    pub pipeline_repo_url: String,

    /// Labels for created PRs (comma-separated); defaults to pullRequestLabels
    #[arg(long, value_delimiter = ',')]
    pub labels: Vec<String>,

    /// Extra assignees for every PR (comma-separated)
    #[arg(long = "pull-request-assign", value_delimiter = ',')]
    pub pull_request_assign: Vec<String>,

    /// Label PRs for automatic merge once their pipeline is green
    #[arg(
        long,
        default_value_t = true,
        action = ArgAction::Set,
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    pub auto_merge: bool,

    /// Allow running without a version
    #[arg(long)]
    pub no_version: bool,

    /// Set up git credentials so pushes can authenticate
    #[arg(long)]
    pub git_credentials: bool,

    /// Hosting service kind (github or gitlab); detected from URLs by default
    #[arg(long)]
    pub git_kind: Option<Platform>,

    /// Git server URL, used for discovery and credentials
    #[arg(long)]
    pub git_server: Option<String>,

    /// Token for the hosting service
    #[arg(long, env = "GIT_TOKEN", hide_env_values = true)]
    pub git_token: Option<String>,

    /// Base branch for new PRs; defaults to each repository's default branch
    #[arg(short, long = "base-branch-name")]
    pub base_branch_name: Option<String>,
}

impl PrArgs {
    fn credentials_host(&self) -> String {
        self.git_server
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map_or_else(
                || "github.com".to_string(),
                |server| {
                    Url::parse(server)
                        .ok()
                        .and_then(|u| u.host_str().map(ToString::to_string))
                        .unwrap_or_else(|| server.trim_end_matches('/').to_string())
                },
            )
    }
}

/// Run the pr command
pub async fn run_pr(args: PrArgs) -> Result<RunSummary> {
    let env_version = std::env::var("VERSION").ok();
    let version = resolve_version(
        &args.dir,
        &VersionSource {
            explicit: args.version.as_deref(),
            version_file: args.version_file.as_deref(),
            env: env_version.as_deref(),
            no_version: args.no_version,
        },
    )?;

    let mut config = load_update_config(&config_path(&args.dir, args.config_file.as_deref()))?;
    validate_rules(
        &config.spec.rules,
        &effective_labels(&args.labels, &config.spec.pull_request_labels),
    )?;

    let git = Arc::new(GitCli::new());
    let git_url = git.remote_url(&args.dir).await?;
    if git_url.is_none() {
        warn!(dir = %args.dir.display(), "failed to find git URL");
    }

    let application = args
        .app
        .clone()
        .filter(|a| !a.trim().is_empty())
        .or_else(|| git_url.as_deref().and_then(application_from_url))
        .unwrap_or_default();

    let mut ctx = RunContext::new(&version, &application);
    let title = args
        .pull_request_title
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .map_or_else(|| default_title(&application, &version), |t| ctx.expand(t));
    let mut body = args
        .pull_request_body
        .as_deref()
        .filter(|b| !b.trim().is_empty())
        .map_or_else(|| default_body(git_url.as_deref()), |b| ctx.expand(b));
    if let Some(path) = &args.add_changelog {
        body = attach_changelog(&body, &args.changelog_separator, &read_changelog(path)?);
    }

    let factory = Arc::new(PlatformFactory::new(
        args.git_token.clone(),
        args.git_kind,
        args.git_server.clone(),
    ));
    let flag_user = args.git_user_name.as_deref().filter(|n| !n.trim().is_empty());
    let service_user = if flag_user.is_some() {
        None
    } else {
        let url = git_url.as_deref().unwrap_or(&args.pipeline_repo_url);
        scm_username(factory.as_ref(), url).await
    };
    let env_git_username = std::env::var("GIT_USERNAME").ok();
    let author = CommitAuthor {
        name: git_username([
            flag_user,
            service_user.as_deref(),
            env_git_username.as_deref(),
        ]),
        email: args
            .git_user_email
            .clone()
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_GIT_EMAIL.to_string()),
    };

    if args.git_credentials {
        setup_credentials(git.as_ref(), &args, &author.name).await?;
    }

    let work_root = tempfile::Builder::new().prefix("updatebot-").tempdir()?;
    let options = RunOptions {
        version: version.clone(),
        application,
        labels: args.labels.clone(),
        assignees: args.pull_request_assign.clone(),
        auto_merge: args.auto_merge,
        base_branch: args.base_branch_name.clone().filter(|b| !b.trim().is_empty()),
        author,
        title,
        body,
        pipeline: PipelineContext {
            commit_sha: args.pipeline_commit_sha.clone(),
            base_ref: args.pipeline_base_ref.clone(),
            repo_url: args.pipeline_repo_url.clone(),
        },
        work_root: work_root.path().to_path_buf(),
    };

    let engine = RuleEngine::new(git, Arc::new(ProcessRunner), factory, options);

    info!(%version, rules = config.spec.rules.len(), "processing rules");
    engine.process_rules(&mut config, &mut ctx).await?;

    print_summary(&version, &ctx.summary);
    Ok(ctx.summary)
}

fn read_changelog(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("failed to read changelog file {}: {e}", path.display()))
    })
}

async fn setup_credentials(git: &dyn GitOps, args: &PrArgs, username: &str) -> Result<()> {
    let host = args.credentials_host();
    let token = match args.git_token.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        Some(token) => token.to_string(),
        None => get_github_auth(None)
            .await
            .map_err(|_| {
                Error::Auth(
                    "missing git token environment variable. Try setting GIT_TOKEN or GITHUB_TOKEN"
                        .to_string(),
                )
            })?
            .token,
    };

    git.setup_credentials(&GitCredentials {
        host,
        username: username.to_string(),
        token,
    })
    .await?;
    info!(user = username, "set up git credentials");
    Ok(())
}

fn print_summary(version: &str, summary: &RunSummary) {
    println!();
    if !summary.pull_requests.is_empty() || !summary.unchanged.is_empty() {
        println!("{}:", "Repositories".emphasis());
    }
    for pr in &summary.pull_requests {
        let verb = if pr.reused { "updated" } else { "created" };
        println!(
            "  {} {} #{} {}",
            CHECK.success(),
            verb,
            pr.pull_request.number.accent(),
            pr.pull_request.html_url.muted()
        );
    }
    for url in &summary.unchanged {
        println!("  {} {} {}", SKIP.muted(), "no changes in".muted(), url.muted());
    }

    let skipped = summary.skipped_rules();
    println!(
        "{} {} rules processed, {} created, {} updated{}",
        format!("{CHECK} Promoted {version}:").success(),
        summary.rules.len().accent(),
        summary.created().accent(),
        summary.reused().accent(),
        if skipped > 0 {
            format!(", {}", format!("{skipped} skipped").warning())
        } else {
            String::new()
        }
    );
}
