//! GitHub platform service implementation

use crate::changes::go_mod_requires;
use crate::config::GoChange;
use crate::discovery::ModuleIndex;
use crate::error::{Error, Result};
use crate::platform::{DEFAULT_TIMEOUT_SECS, ScmService};
use crate::types::{Commit, CommitListOptions, Fork, Platform, PlatformConfig, PullRequest};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use octocrab::Octocrab;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = "updatebot";

/// API base URL for github.com or a GitHub Enterprise host
fn api_base_for(host: Option<&str>) -> String {
    host.map_or_else(
        || "https://api.github.com".to_string(),
        |h| format!("https://{h}/api/v3"),
    )
}

fn http_client() -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
        .build()
        .map_err(|e| Error::GitHubApi(format!("Failed to create HTTP client: {e}")))
}

/// Raw REST access for endpoints the typed client does not cover
#[derive(Clone)]
struct RestClient {
    http: Client,
    token: String,
    api_base: String,
}

impl RestClient {
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{path}", self.api_base))
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
    }
}

#[derive(Deserialize)]
struct CommitResponse {
    sha: String,
    author: Option<UserRef>,
    #[serde(default)]
    parents: Vec<ShaRef>,
    commit: CommitDetail,
}

#[derive(Deserialize)]
struct UserRef {
    login: String,
}

#[derive(Deserialize)]
struct ShaRef {
    sha: String,
}

#[derive(Deserialize)]
struct CommitDetail {
    author: Option<GitSignature>,
}

#[derive(Deserialize)]
struct GitSignature {
    date: Option<DateTime<Utc>>,
}

impl From<CommitResponse> for Commit {
    fn from(c: CommitResponse) -> Self {
        Self {
            sha: c.sha,
            author_login: c.author.map(|a| a.login).unwrap_or_default(),
            parents: c.parents.into_iter().map(|p| p.sha).collect(),
            authored_at: c.commit.author.and_then(|a| a.date),
        }
    }
}

#[derive(Deserialize)]
struct ForkResponse {
    owner: UserRef,
    clone_url: String,
}

#[derive(Deserialize)]
struct RepoResponse {
    name: String,
    html_url: String,
    #[serde(default)]
    archived: bool,
}

/// GitHub service using octocrab
pub struct GitHubService {
    client: Octocrab,
    config: PlatformConfig,
    rest: RestClient,
}

impl GitHubService {
    /// Create a new GitHub service
    pub fn new(token: &str, owner: String, repo: String, host: Option<String>) -> Result<Self> {
        let api_base = api_base_for(host.as_deref());
        let config = PlatformConfig {
            platform: Platform::GitHub,
            owner,
            repo,
            host,
        };
        Self::with_api_base(token, config, &api_base)
    }

    /// Create a service talking to an explicit API base URL
    pub fn with_api_base(token: &str, config: PlatformConfig, api_base: &str) -> Result<Self> {
        let client = Octocrab::builder()
            .personal_token(token.to_string())
            .base_uri(api_base)
            .map_err(|e| Error::GitHubApi(e.to_string()))?
            .build()
            .map_err(|e| Error::GitHubApi(e.to_string()))?;

        Ok(Self {
            client,
            config,
            rest: RestClient {
                http: http_client()?,
                token: token.to_string(),
                api_base: api_base.trim_end_matches('/').to_string(),
            },
        })
    }

    fn repo_path(&self) -> String {
        format!("/repos/{}/{}", self.config.owner, self.config.repo)
    }
}

/// Helper to convert octocrab PR to our `PullRequest` type
fn pr_from_octocrab(pr: &octocrab::models::pulls::PullRequest) -> PullRequest {
    PullRequest {
        number: pr.number,
        html_url: pr
            .html_url
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default(),
        base_ref: pr.base.ref_field.clone(),
        head_ref: pr.head.ref_field.clone(),
        title: pr.title.as_deref().unwrap_or_default().to_string(),
        labels: pr
            .labels
            .as_ref()
            .map(|labels| labels.iter().map(|l| l.name.clone()).collect())
            .unwrap_or_default(),
    }
}

#[async_trait]
impl ScmService for GitHubService {
    async fn find_open_prs_with_labels(&self, labels: &[String]) -> Result<Vec<PullRequest>> {
        debug!(?labels, repo = %self.config.full_name(), "finding open PRs by labels");
        let page = self
            .client
            .pulls(&self.config.owner, &self.config.repo)
            .list()
            .state(octocrab::params::State::Open)
            .per_page(100u8)
            .send()
            .await?;

        let mut prs: Vec<PullRequest> = page
            .items
            .iter()
            .map(pr_from_octocrab)
            .filter(|pr| pr.has_labels(labels))
            .collect();
        prs.sort_by(|a, b| b.number.cmp(&a.number));
        debug!(count = prs.len(), "found matching PRs");
        Ok(prs)
    }

    async fn create_pr_with_options(
        &self,
        head: &str,
        base: &str,
        title: &str,
        body: Option<&str>,
        draft: bool,
    ) -> Result<PullRequest> {
        debug!(head, base, draft, "creating PR");
        let pulls = self.client.pulls(&self.config.owner, &self.config.repo);
        let mut builder = pulls.create(title, head, base).draft(draft);

        if let Some(body_text) = body {
            builder = builder.body(body_text);
        }

        let pr = builder.send().await?;

        let result = pr_from_octocrab(&pr);
        debug!(pr_number = result.number, "created PR");
        Ok(result)
    }

    async fn update_pr(&self, number: u64, title: &str, body: Option<&str>) -> Result<PullRequest> {
        debug!(pr_number = number, "updating PR");
        let pulls = self.client.pulls(&self.config.owner, &self.config.repo);
        let mut builder = pulls.update(number).title(title);
        if let Some(body_text) = body {
            builder = builder.body(body_text);
        }
        let pr = builder.send().await?;
        debug!(pr_number = number, "updated PR");
        Ok(pr_from_octocrab(&pr))
    }

    async fn add_labels(&self, number: u64, labels: &[String]) -> Result<()> {
        if labels.is_empty() {
            return Ok(());
        }
        debug!(pr_number = number, ?labels, "adding labels");
        self.client
            .issues(&self.config.owner, &self.config.repo)
            .add_labels(number, labels)
            .await?;
        Ok(())
    }

    async fn list_commits(&self, options: &CommitListOptions) -> Result<Vec<Commit>> {
        debug!(git_ref = %options.r#ref, page = options.page, size = options.size, "listing commits");
        let commits: Vec<CommitResponse> = self
            .rest
            .request(Method::GET, &format!("{}/commits", self.repo_path()))
            .query(&[
                ("sha", options.r#ref.clone()),
                ("page", options.page.to_string()),
                ("per_page", options.size.to_string()),
            ])
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::GitHubApi(format!("Failed to list commits: {e}")))?
            .json()
            .await?;

        debug!(count = commits.len(), "listed commits");
        Ok(commits.into_iter().map(Into::into).collect())
    }

    async fn assign_issue(&self, number: u64, logins: &[String]) -> Result<()> {
        debug!(issue = number, ?logins, "assigning users");
        let assignees: Vec<&str> = logins.iter().map(String::as_str).collect();
        self.client
            .issues(&self.config.owner, &self.config.repo)
            .add_assignees(number, &assignees)
            .await?;
        Ok(())
    }

    async fn create_fork(&self) -> Result<Fork> {
        debug!(repo = %self.config.full_name(), "creating fork");
        let fork: ForkResponse = self
            .rest
            .request(Method::POST, &format!("{}/forks", self.repo_path()))
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::GitHubApi(format!("Failed to create fork: {e}")))?
            .json()
            .await?;

        debug!(owner = %fork.owner.login, "fork ready");
        Ok(Fork {
            owner: fork.owner.login,
            clone_url: fork.clone_url,
        })
    }

    async fn current_user(&self) -> Result<String> {
        let user = self.client.current().user().await?;
        Ok(user.login)
    }

    fn config(&self) -> &PlatformConfig {
        &self.config
    }
}

/// Finds repositories whose `go.mod` requires a module by scanning owners' repositories
pub struct GitHubModuleIndex {
    rest: RestClient,
}

impl GitHubModuleIndex {
    /// Create an index for github.com or a GitHub Enterprise host
    pub fn new(token: &str, host: Option<&str>) -> Result<Self> {
        Self::with_api_base(token, &api_base_for(host))
    }

    /// Create an index talking to an explicit API base URL
    pub fn with_api_base(token: &str, api_base: &str) -> Result<Self> {
        Ok(Self {
            rest: RestClient {
                http: http_client()?,
                token: token.to_string(),
                api_base: api_base.trim_end_matches('/').to_string(),
            },
        })
    }

    async fn list_repos(&self, owner: &str) -> Result<Vec<RepoResponse>> {
        let mut all = Vec::new();
        let mut kind = "orgs";
        let mut page = 1u32;
        loop {
            let response = self
                .rest
                .request(Method::GET, &format!("/{kind}/{owner}/repos"))
                .query(&[("per_page", "100".to_string()), ("page", page.to_string())])
                .send()
                .await?;

            if response.status() == StatusCode::NOT_FOUND && kind == "orgs" {
                debug!(owner, "not an organization, listing user repositories");
                kind = "users";
                continue;
            }

            let repos: Vec<RepoResponse> = response
                .error_for_status()
                .map_err(|e| Error::GitHubApi(format!("Failed to list repositories: {e}")))?
                .json()
                .await?;
            let done = repos.len() < 100;
            all.extend(repos);
            if done {
                break;
            }
            page += 1;
        }
        Ok(all)
    }

    async fn go_mod(&self, owner: &str, repo: &str) -> Result<Option<String>> {
        let response = self
            .rest
            .request(Method::GET, &format!("/repos/{owner}/{repo}/contents/go.mod"))
            .header("Accept", "application/vnd.github.raw")
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let text = response
            .error_for_status()
            .map_err(|e| Error::GitHubApi(format!("Failed to fetch go.mod: {e}")))?
            .text()
            .await?;
        Ok(Some(text))
    }
}

#[async_trait]
impl ModuleIndex for GitHubModuleIndex {
    async fn find_importers(&self, change: &GoChange) -> Result<Vec<String>> {
        let mut urls = Vec::new();
        for owner in &change.owners {
            let repos = self.list_repos(owner).await?;
            debug!(owner, count = repos.len(), "scanning repositories");
            for repo in repos {
                if repo.archived || !change.repositories.matches(&repo.name) {
                    continue;
                }
                if let Some(go_mod) = self.go_mod(owner, &repo.name).await?
                    && go_mod_requires(&go_mod, &change.package)
                {
                    debug!(repo = %repo.name, module = %change.package, "repository requires module");
                    urls.push(repo.html_url);
                }
            }
        }
        Ok(urls)
    }
}
