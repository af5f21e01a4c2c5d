//! Mock hosting service and factory for testing

#![allow(dead_code)]

use super::StaticModuleIndex;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use updatebot::discovery::ModuleIndex;
use updatebot::error::{Error, Result};
use updatebot::platform::{ScmFactory, ScmService};
use updatebot::types::{Commit, CommitListOptions, Fork, Platform, PlatformConfig, PullRequest};

/// Call record for `create_pr_with_options`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePrCall {
    pub head: String,
    pub base: String,
    pub title: String,
    pub body: Option<String>,
}

/// Call record for `update_pr`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatePrCall {
    pub number: u64,
    pub title: String,
    pub body: Option<String>,
}

/// Hand-written [`ScmService`] with call tracking and error injection
pub struct MockScmService {
    config: PlatformConfig,
    next_pr_number: AtomicU64,
    open_prs: Mutex<Vec<PullRequest>>,
    commits: Mutex<Vec<Commit>>,
    fork: Mutex<Option<Fork>>,
    // Call tracking
    pub find_calls: Mutex<Vec<Vec<String>>>,
    pub create_calls: Mutex<Vec<CreatePrCall>>,
    pub update_calls: Mutex<Vec<UpdatePrCall>>,
    pub label_calls: Mutex<Vec<(u64, Vec<String>)>>,
    pub assign_calls: Mutex<Vec<(u64, Vec<String>)>>,
    pub list_commit_calls: Mutex<Vec<CommitListOptions>>,
    pub fork_calls: Mutex<usize>,
    // Error injection
    error_on_assign: Mutex<Option<String>>,
    error_on_create: Mutex<Option<String>>,
}

impl MockScmService {
    /// Create a new mock with the given config
    pub fn with_config(config: PlatformConfig) -> Self {
        Self {
            config,
            next_pr_number: AtomicU64::new(1),
            open_prs: Mutex::new(Vec::new()),
            commits: Mutex::new(Vec::new()),
            fork: Mutex::new(None),
            find_calls: Mutex::new(Vec::new()),
            create_calls: Mutex::new(Vec::new()),
            update_calls: Mutex::new(Vec::new()),
            label_calls: Mutex::new(Vec::new()),
            assign_calls: Mutex::new(Vec::new()),
            list_commit_calls: Mutex::new(Vec::new()),
            fork_calls: Mutex::new(0),
            error_on_assign: Mutex::new(None),
            error_on_create: Mutex::new(None),
        }
    }

    /// Mock for `github.com/acme/app`
    pub fn new() -> Self {
        Self::with_config(github_config("acme", "app"))
    }

    /// Add an open PR returned by label searches
    pub fn add_open_pr(&self, pr: PullRequest) {
        self.open_prs.lock().unwrap().push(pr);
    }

    /// Set the commit listing returned by `list_commits`
    pub fn set_commits(&self, commits: Vec<Commit>) {
        *self.commits.lock().unwrap() = commits;
    }

    /// Set the fork returned by `create_fork`
    pub fn set_fork(&self, fork: Fork) {
        *self.fork.lock().unwrap() = Some(fork);
    }

    /// Make `assign_issue` return an error
    pub fn fail_assign(&self, msg: &str) {
        *self.error_on_assign.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `create_pr_with_options` return an error
    pub fn fail_create(&self, msg: &str) {
        *self.error_on_create.lock().unwrap() = Some(msg.to_string());
    }

    pub fn create_calls(&self) -> Vec<CreatePrCall> {
        self.create_calls.lock().unwrap().clone()
    }

    pub fn update_calls(&self) -> Vec<UpdatePrCall> {
        self.update_calls.lock().unwrap().clone()
    }

    pub fn assign_calls(&self) -> Vec<(u64, Vec<String>)> {
        self.assign_calls.lock().unwrap().clone()
    }

    pub fn label_calls(&self) -> Vec<(u64, Vec<String>)> {
        self.label_calls.lock().unwrap().clone()
    }

    pub fn find_calls(&self) -> Vec<Vec<String>> {
        self.find_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ScmService for MockScmService {
    async fn find_open_prs_with_labels(&self, labels: &[String]) -> Result<Vec<PullRequest>> {
        self.find_calls.lock().unwrap().push(labels.to_vec());
        let mut prs: Vec<PullRequest> = self
            .open_prs
            .lock()
            .unwrap()
            .iter()
            .filter(|pr| pr.has_labels(labels))
            .cloned()
            .collect();
        prs.sort_by(|a, b| b.number.cmp(&a.number));
        Ok(prs)
    }

    async fn create_pr_with_options(
        &self,
        head: &str,
        base: &str,
        title: &str,
        body: Option<&str>,
        _draft: bool,
    ) -> Result<PullRequest> {
        self.create_calls.lock().unwrap().push(CreatePrCall {
            head: head.to_string(),
            base: base.to_string(),
            title: title.to_string(),
            body: body.map(ToString::to_string),
        });
        if let Some(msg) = self.error_on_create.lock().unwrap().as_ref() {
            return Err(Error::Platform(msg.clone()));
        }
        let number = self.next_pr_number.fetch_add(1, Ordering::SeqCst);
        Ok(make_pr(number, head, base, title, &[]))
    }

    async fn update_pr(&self, number: u64, title: &str, body: Option<&str>) -> Result<PullRequest> {
        self.update_calls.lock().unwrap().push(UpdatePrCall {
            number,
            title: title.to_string(),
            body: body.map(ToString::to_string),
        });
        let open = self.open_prs.lock().unwrap();
        let mut pr = open
            .iter()
            .find(|pr| pr.number == number)
            .cloned()
            .ok_or_else(|| Error::Platform(format!("PR {number} not found")))?;
        pr.title = title.to_string();
        Ok(pr)
    }

    async fn add_labels(&self, number: u64, labels: &[String]) -> Result<()> {
        self.label_calls
            .lock()
            .unwrap()
            .push((number, labels.to_vec()));
        Ok(())
    }

    async fn list_commits(&self, options: &CommitListOptions) -> Result<Vec<Commit>> {
        self.list_commit_calls.lock().unwrap().push(options.clone());
        Ok(self.commits.lock().unwrap().clone())
    }

    async fn assign_issue(&self, number: u64, logins: &[String]) -> Result<()> {
        if let Some(msg) = self.error_on_assign.lock().unwrap().as_ref() {
            return Err(Error::Platform(msg.clone()));
        }
        self.assign_calls
            .lock()
            .unwrap()
            .push((number, logins.to_vec()));
        Ok(())
    }

    async fn create_fork(&self) -> Result<Fork> {
        *self.fork_calls.lock().unwrap() += 1;
        self.fork
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| Error::Platform("forking is not supported".to_string()))
    }

    async fn current_user(&self) -> Result<String> {
        Ok("updatebot".to_string())
    }

    fn config(&self) -> &PlatformConfig {
        &self.config
    }
}

/// [`ScmFactory`] handing out the same mock service for every URL
pub struct MockScmFactory {
    pub service: Arc<MockScmService>,
    pub index: Arc<StaticModuleIndex>,
    pub service_calls: Mutex<Vec<String>>,
    pub index_calls: Mutex<usize>,
    index_error: Mutex<Option<String>>,
}

impl MockScmFactory {
    pub fn new(service: Arc<MockScmService>) -> Self {
        Self::with_index(service, StaticModuleIndex::default())
    }

    pub fn with_index(service: Arc<MockScmService>, index: StaticModuleIndex) -> Self {
        Self {
            service,
            index: Arc::new(index),
            service_calls: Mutex::new(Vec::new()),
            index_calls: Mutex::new(0),
            index_error: Mutex::new(None),
        }
    }

    /// Make `module_index` fail as if no token were available
    pub fn fail_index(&self, msg: &str) {
        *self.index_error.lock().unwrap() = Some(msg.to_string());
    }

    pub fn service_calls(&self) -> Vec<String> {
        self.service_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ScmFactory for MockScmFactory {
    async fn service_for(&self, repo_url: &str) -> Result<Arc<dyn ScmService>> {
        self.service_calls.lock().unwrap().push(repo_url.to_string());
        Ok(self.service.clone())
    }

    async fn module_index(&self) -> Result<Arc<dyn ModuleIndex>> {
        *self.index_calls.lock().unwrap() += 1;
        if let Some(msg) = self.index_error.lock().unwrap().as_ref() {
            return Err(Error::Auth(msg.clone()));
        }
        Ok(self.index.clone())
    }
}

// =============================================================================
// Builders
// =============================================================================

pub fn github_config(owner: &str, repo: &str) -> PlatformConfig {
    PlatformConfig {
        platform: Platform::GitHub,
        owner: owner.to_string(),
        repo: repo.to_string(),
        host: None,
    }
}

pub fn make_pr(number: u64, head: &str, base: &str, title: &str, labels: &[&str]) -> PullRequest {
    PullRequest {
        number,
        html_url: format!("https://github.com/acme/app/pull/{number}"),
        base_ref: base.to_string(),
        head_ref: head.to_string(),
        title: title.to_string(),
        labels: labels.iter().map(ToString::to_string).collect(),
    }
}

pub fn make_commit(sha: &str, login: &str, parents: &[&str]) -> Commit {
    Commit {
        sha: sha.to_string(),
        author_login: login.to_string(),
        parents: parents.iter().map(ToString::to_string).collect(),
        authored_at: None,
    }
}
