//! GitLab platform service implementation

use crate::changes::go_mod_requires;
use crate::config::GoChange;
use crate::discovery::ModuleIndex;
use crate::error::{Error, Result};
use crate::platform::{DEFAULT_TIMEOUT_SECS, ScmService};
use crate::types::{Commit, CommitListOptions, Fork, Platform, PlatformConfig, PullRequest};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

fn http_client() -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
        .build()
        .map_err(|e| Error::GitLabApi(format!("failed to create HTTP client: {e}")))
}

fn base_url_for(host: &str) -> String {
    format!("https://{host}")
}

/// GitLab service using reqwest
pub struct GitLabService {
    client: Client,
    token: String,
    base_url: String,
    config: PlatformConfig,
    project_path: String,
}

#[derive(Deserialize)]
struct MergeRequest {
    iid: u64,
    web_url: String,
    source_branch: String,
    target_branch: String,
    title: String,
    #[serde(default)]
    labels: Vec<String>,
    #[serde(default)]
    assignees: Vec<UserRef>,
}

#[derive(Deserialize)]
struct UserRef {
    id: u64,
}

#[derive(Deserialize)]
struct CurrentUser {
    username: String,
}

#[derive(Deserialize)]
struct CommitResponse {
    id: String,
    #[serde(default)]
    parent_ids: Vec<String>,
    #[serde(default)]
    author_name: String,
    authored_date: Option<DateTime<Utc>>,
}

impl From<MergeRequest> for PullRequest {
    fn from(mr: MergeRequest) -> Self {
        Self {
            number: mr.iid,
            html_url: mr.web_url,
            base_ref: mr.target_branch,
            head_ref: mr.source_branch,
            title: mr.title,
            labels: mr.labels,
        }
    }
}

impl From<CommitResponse> for Commit {
    fn from(c: CommitResponse) -> Self {
        // the commits API carries no account login; the author name stands in for it
        Self {
            sha: c.id,
            author_login: c.author_name,
            parents: c.parent_ids,
            authored_at: c.authored_date,
        }
    }
}

#[derive(Serialize)]
struct CreateMrPayload {
    source_branch: String,
    target_branch: String,
    title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    draft: Option<bool>,
}

impl GitLabService {
    /// Create a new GitLab service
    pub fn new(token: String, owner: String, repo: String, host: Option<String>) -> Result<Self> {
        let host = host.unwrap_or_else(|| "gitlab.com".to_string());
        let config_host = if host == "gitlab.com" {
            None
        } else {
            Some(host.clone())
        };
        let config = PlatformConfig {
            platform: Platform::GitLab,
            owner,
            repo,
            host: config_host,
        };
        Self::with_base_url(token, config, &base_url_for(&host))
    }

    /// Create a service talking to an explicit base URL (scheme and host)
    pub fn with_base_url(token: String, config: PlatformConfig, base_url: &str) -> Result<Self> {
        let project_path = config.full_name();
        Ok(Self {
            client: http_client()?,
            token,
            base_url: base_url.trim_end_matches('/').to_string(),
            config,
            project_path,
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api/v4{}", self.base_url, path)
    }

    fn encoded_project(&self) -> String {
        urlencoding::encode(&self.project_path).into_owned()
    }

    fn mr_url(&self, iid: u64) -> String {
        self.api_url(&format!(
            "/projects/{}/merge_requests/{iid}",
            self.encoded_project()
        ))
    }

    async fn get_mr(&self, iid: u64) -> Result<MergeRequest> {
        Ok(self
            .client
            .get(self.mr_url(iid))
            .header("PRIVATE-TOKEN", &self.token)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::GitLabApi(e.to_string()))?
            .json()
            .await?)
    }

    async fn user_id(&self, username: &str) -> Result<u64> {
        let users: Vec<UserRef> = self
            .client
            .get(self.api_url("/users"))
            .header("PRIVATE-TOKEN", &self.token)
            .query(&[("username", username)])
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::GitLabApi(e.to_string()))?
            .json()
            .await?;

        users
            .first()
            .map(|u| u.id)
            .ok_or_else(|| Error::GitLabApi(format!("user {username} not found")))
    }
}

#[async_trait]
impl ScmService for GitLabService {
    async fn find_open_prs_with_labels(&self, labels: &[String]) -> Result<Vec<PullRequest>> {
        debug!(?labels, project = %self.project_path, "finding open MRs by labels");
        let url = self.api_url(&format!(
            "/projects/{}/merge_requests",
            self.encoded_project()
        ));

        let mut query = vec![
            ("state", "opened".to_string()),
            ("order_by", "created_at".to_string()),
            ("sort", "desc".to_string()),
            ("per_page", "100".to_string()),
        ];
        if !labels.is_empty() {
            query.push(("labels", labels.join(",")));
        }

        let mrs: Vec<MergeRequest> = self
            .client
            .get(&url)
            .header("PRIVATE-TOKEN", &self.token)
            .query(&query)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::GitLabApi(e.to_string()))?
            .json()
            .await?;

        let result: Vec<PullRequest> = mrs
            .into_iter()
            .map(PullRequest::from)
            .filter(|pr| pr.has_labels(labels))
            .collect();
        debug!(count = result.len(), "found matching MRs");
        Ok(result)
    }

    async fn create_pr_with_options(
        &self,
        head: &str,
        base: &str,
        title: &str,
        body: Option<&str>,
        draft: bool,
    ) -> Result<PullRequest> {
        debug!(head, base, draft, "creating MR");
        let url = self.api_url(&format!(
            "/projects/{}/merge_requests",
            self.encoded_project()
        ));

        let payload = CreateMrPayload {
            source_branch: head.to_string(),
            target_branch: base.to_string(),
            title: title.to_string(),
            description: body.map(ToString::to_string),
            draft: if draft { Some(true) } else { None },
        };

        let mr: MergeRequest = self
            .client
            .post(&url)
            .header("PRIVATE-TOKEN", &self.token)
            .json(&payload)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::GitLabApi(e.to_string()))?
            .json()
            .await?;

        let pr: PullRequest = mr.into();
        debug!(mr_iid = pr.number, "created MR");
        Ok(pr)
    }

    async fn update_pr(&self, number: u64, title: &str, body: Option<&str>) -> Result<PullRequest> {
        debug!(mr_iid = number, "updating MR");
        let mut payload = serde_json::json!({ "title": title });
        if let Some(description) = body {
            payload["description"] = serde_json::Value::from(description);
        }

        let mr: MergeRequest = self
            .client
            .put(self.mr_url(number))
            .header("PRIVATE-TOKEN", &self.token)
            .json(&payload)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::GitLabApi(e.to_string()))?
            .json()
            .await?;

        debug!(mr_iid = number, "updated MR");
        Ok(mr.into())
    }

    async fn add_labels(&self, number: u64, labels: &[String]) -> Result<()> {
        if labels.is_empty() {
            return Ok(());
        }
        debug!(mr_iid = number, ?labels, "adding labels");
        self.client
            .put(self.mr_url(number))
            .header("PRIVATE-TOKEN", &self.token)
            .json(&serde_json::json!({ "add_labels": labels.join(",") }))
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::GitLabApi(e.to_string()))?;
        Ok(())
    }

    async fn list_commits(&self, options: &CommitListOptions) -> Result<Vec<Commit>> {
        debug!(git_ref = %options.r#ref, page = options.page, size = options.size, "listing commits");
        let url = self.api_url(&format!(
            "/projects/{}/repository/commits",
            self.encoded_project()
        ));

        let commits: Vec<CommitResponse> = self
            .client
            .get(&url)
            .header("PRIVATE-TOKEN", &self.token)
            .query(&[
                ("ref_name", options.r#ref.clone()),
                ("page", options.page.to_string()),
                ("per_page", options.size.to_string()),
            ])
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::GitLabApi(e.to_string()))?
            .json()
            .await?;

        debug!(count = commits.len(), "listed commits");
        Ok(commits.into_iter().map(Into::into).collect())
    }

    async fn assign_issue(&self, number: u64, logins: &[String]) -> Result<()> {
        debug!(mr_iid = number, ?logins, "assigning users");
        let mr = self.get_mr(number).await?;
        let mut ids: Vec<u64> = mr.assignees.iter().map(|a| a.id).collect();
        for login in logins {
            let id = self.user_id(login).await?;
            if !ids.contains(&id) {
                ids.push(id);
            }
        }

        self.client
            .put(self.mr_url(number))
            .header("PRIVATE-TOKEN", &self.token)
            .json(&serde_json::json!({ "assignee_ids": ids }))
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::GitLabApi(e.to_string()))?;
        Ok(())
    }

    async fn create_fork(&self) -> Result<Fork> {
        Err(Error::Platform(format!(
            "forking is not supported for GitLab project {}",
            self.project_path
        )))
    }

    async fn current_user(&self) -> Result<String> {
        let user: CurrentUser = self
            .client
            .get(self.api_url("/user"))
            .header("PRIVATE-TOKEN", &self.token)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::GitLabApi(e.to_string()))?
            .json()
            .await?;
        Ok(user.username)
    }

    fn config(&self) -> &PlatformConfig {
        &self.config
    }
}

#[derive(Deserialize)]
struct Project {
    id: u64,
    path: String,
    web_url: String,
    #[serde(default)]
    archived: bool,
    default_branch: Option<String>,
}

/// Finds projects whose `go.mod` requires a module by scanning groups' projects
pub struct GitLabModuleIndex {
    client: Client,
    token: String,
    base_url: String,
}

impl GitLabModuleIndex {
    /// Create an index for gitlab.com or a self-hosted instance
    pub fn new(token: String, host: Option<&str>) -> Result<Self> {
        Self::with_base_url(token, &base_url_for(host.unwrap_or("gitlab.com")))
    }

    /// Create an index talking to an explicit base URL (scheme and host)
    pub fn with_base_url(token: String, base_url: &str) -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            token,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api/v4{}", self.base_url, path)
    }

    async fn list_projects(&self, owner: &str) -> Result<Vec<Project>> {
        let encoded = urlencoding::encode(owner).into_owned();
        let mut all = Vec::new();
        let mut path = format!("/groups/{encoded}/projects");
        let mut page = 1u32;
        loop {
            let response = self
                .client
                .get(self.api_url(&path))
                .header("PRIVATE-TOKEN", &self.token)
                .query(&[
                    ("include_subgroups", "true".to_string()),
                    ("per_page", "100".to_string()),
                    ("page", page.to_string()),
                ])
                .send()
                .await?;

            if response.status() == StatusCode::NOT_FOUND && path.starts_with("/groups/") {
                debug!(owner, "not a group, listing user projects");
                path = format!("/users/{encoded}/projects");
                continue;
            }

            let projects: Vec<Project> = response
                .error_for_status()
                .map_err(|e| Error::GitLabApi(e.to_string()))?
                .json()
                .await?;
            let done = projects.len() < 100;
            all.extend(projects);
            if done {
                break;
            }
            page += 1;
        }
        Ok(all)
    }

    async fn go_mod(&self, project: &Project) -> Result<Option<String>> {
        let response = self
            .client
            .get(self.api_url(&format!(
                "/projects/{}/repository/files/go.mod/raw",
                project.id
            )))
            .header("PRIVATE-TOKEN", &self.token)
            .query(&[(
                "ref",
                project.default_branch.as_deref().unwrap_or("HEAD"),
            )])
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let text = response
            .error_for_status()
            .map_err(|e| Error::GitLabApi(e.to_string()))?
            .text()
            .await?;
        Ok(Some(text))
    }
}

#[async_trait]
impl ModuleIndex for GitLabModuleIndex {
    async fn find_importers(&self, change: &GoChange) -> Result<Vec<String>> {
        let mut urls = Vec::new();
        for owner in &change.owners {
            let projects = self.list_projects(owner).await?;
            debug!(owner, count = projects.len(), "scanning projects");
            for project in projects {
                if project.archived || !change.repositories.matches(&project.path) {
                    continue;
                }
                if let Some(go_mod) = self.go_mod(&project).await?
                    && go_mod_requires(&go_mod, &change.package)
                {
                    debug!(project = %project.path, module = %change.package, "project requires module");
                    urls.push(project.web_url);
                }
            }
        }
        Ok(urls)
    }
}
