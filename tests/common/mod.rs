//! Shared test utilities

#![allow(dead_code)]

mod mock_scm;

pub use mock_scm::{
    CreatePrCall, MockScmFactory, MockScmService, UpdatePrCall, github_config, make_commit,
    make_pr,
};

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use updatebot::config::GoChange;
use updatebot::discovery::ModuleIndex;
use updatebot::error::{Error, Result};
use updatebot::git::{CloneOptions, CommitAuthor, GitCredentials, GitOps};
use updatebot::runner::{CommandOutput, CommandRunner, CommandSpec};

/// Call record for `push`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushCall {
    pub remote: String,
    pub branch: String,
    pub force: bool,
}

/// [`GitOps`] that "clones" by writing a fixed set of files
///
/// `has_changes` compares the working copy against those files, so a change
/// that leaves every file as it was produces no commit.
pub struct FakeGit {
    files: BTreeMap<PathBuf, String>,
    branch: String,
    pub calls: Mutex<Vec<String>>,
    pub clones: Mutex<Vec<(String, PathBuf, CloneOptions)>>,
    pub commits: Mutex<Vec<(PathBuf, String)>>,
    pub pushes: Mutex<Vec<PushCall>>,
}

impl FakeGit {
    pub fn new(files: &[(&str, &str)]) -> Self {
        Self {
            files: files
                .iter()
                .map(|(path, content)| (PathBuf::from(path), (*content).to_string()))
                .collect(),
            branch: "main".to_string(),
            calls: Mutex::new(Vec::new()),
            clones: Mutex::new(Vec::new()),
            commits: Mutex::new(Vec::new()),
            pushes: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn pushes(&self) -> Vec<PushCall> {
        self.pushes.lock().unwrap().clone()
    }

    pub fn clones(&self) -> Vec<(String, PathBuf, CloneOptions)> {
        self.clones.lock().unwrap().clone()
    }

    pub fn commits(&self) -> Vec<(PathBuf, String)> {
        self.commits.lock().unwrap().clone()
    }

    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }
}

/// Every file under `dir`, keyed by relative path
pub fn read_tree(dir: &Path) -> BTreeMap<PathBuf, String> {
    fn walk(root: &Path, dir: &Path, out: &mut BTreeMap<PathBuf, String>) {
        for entry in fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                walk(root, &path, out);
            } else {
                let rel = path.strip_prefix(root).unwrap().to_path_buf();
                out.insert(rel, fs::read_to_string(&path).unwrap());
            }
        }
    }
    let mut out = BTreeMap::new();
    if dir.exists() {
        walk(dir, dir, &mut out);
    }
    out
}

#[async_trait]
impl GitOps for FakeGit {
    async fn clone_repo(&self, url: &str, dir: &Path, options: &CloneOptions) -> Result<()> {
        self.record("clone");
        for (rel, content) in &self.files {
            let path = dir.join(rel);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, content)?;
        }
        fs::create_dir_all(dir)?;
        self.clones
            .lock()
            .unwrap()
            .push((url.to_string(), dir.to_path_buf(), options.clone()));
        Ok(())
    }

    async fn current_branch(&self, _dir: &Path) -> Result<String> {
        self.record("current_branch");
        Ok(self.branch.clone())
    }

    async fn checkout_new_branch(&self, _dir: &Path, branch: &str) -> Result<()> {
        self.record(&format!("checkout {branch}"));
        Ok(())
    }

    async fn has_changes(&self, dir: &Path) -> Result<bool> {
        self.record("has_changes");
        Ok(read_tree(dir) != self.files)
    }

    async fn commit_all(&self, dir: &Path, message: &str, _author: &CommitAuthor) -> Result<String> {
        self.record("commit");
        let mut commits = self.commits.lock().unwrap();
        commits.push((dir.to_path_buf(), message.to_string()));
        Ok(format!("sha{}", commits.len()))
    }

    async fn push(&self, _dir: &Path, remote: &str, branch: &str, force: bool) -> Result<()> {
        self.record("push");
        self.pushes.lock().unwrap().push(PushCall {
            remote: remote.to_string(),
            branch: branch.to_string(),
            force,
        });
        Ok(())
    }

    async fn remote_url(&self, _dir: &Path) -> Result<Option<String>> {
        Ok(Some("https://github.com/acme/source.git".to_string()))
    }

    async fn setup_credentials(&self, _credentials: &GitCredentials) -> Result<()> {
        self.record("setup_credentials");
        Ok(())
    }
}

/// [`CommandRunner`] recording commands, failing those whose name is listed
#[derive(Default)]
pub struct FakeRunner {
    pub commands: Mutex<Vec<CommandSpec>>,
    failing: Vec<String>,
}

impl FakeRunner {
    pub fn failing(names: &[&str]) -> Self {
        Self {
            commands: Mutex::new(Vec::new()),
            failing: names.iter().map(ToString::to_string).collect(),
        }
    }

    pub fn command_lines(&self) -> Vec<String> {
        self.commands.lock().unwrap().iter().map(CommandSpec::cli).collect()
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        self.commands.lock().unwrap().push(spec.clone());
        if self.failing.contains(&spec.name) {
            return Ok(CommandOutput {
                success: false,
                stdout: String::new(),
                stderr: format!("{}: exit status 1", spec.name),
            });
        }
        Ok(CommandOutput {
            success: true,
            ..CommandOutput::default()
        })
    }
}

/// [`ModuleIndex`] returning a fixed URL list
#[derive(Default)]
pub struct StaticModuleIndex {
    pub urls: Vec<String>,
    pub fail: bool,
}

impl StaticModuleIndex {
    pub fn with_urls(urls: &[&str]) -> Self {
        Self {
            urls: urls.iter().map(ToString::to_string).collect(),
            fail: false,
        }
    }
}

#[async_trait]
impl ModuleIndex for StaticModuleIndex {
    async fn find_importers(&self, _change: &GoChange) -> Result<Vec<String>> {
        if self.fail {
            return Err(Error::GitHubApi("search failed".to_string()));
        }
        Ok(self.urls.clone())
    }
}

/// Run options for version 1.2.3 with working copies under `work_root`
pub fn run_options(work_root: &Path) -> updatebot::engine::RunOptions {
    updatebot::engine::RunOptions {
        version: "1.2.3".to_string(),
        application: "acme/source".to_string(),
        labels: Vec::new(),
        assignees: Vec::new(),
        auto_merge: false,
        base_branch: None,
        author: CommitAuthor {
            name: "jenkins-x-bot".to_string(),
            email: "jenkins-x@googlegroups.com".to_string(),
        },
        title: "chore(deps): upgrade acme/source to version 1.2.3".to_string(),
        body: "from: https://github.com/acme/source.git\n".to_string(),
        pipeline: updatebot::engine::PipelineContext::default(),
        work_root: work_root.to_path_buf(),
    }
}
