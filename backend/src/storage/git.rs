//! # Git-Backed Store
//!
//! A [`FileStore`] whose data directory is also a git repository. Every write
//! is committed, so the repository history doubles as an audit log of the
//! schedule. The write's description becomes the commit message.
//!
//! Git failures are logged and never fail the write itself: the JSON file on
//! disk is the source of truth.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use git2::{IndexAddOption, Oid, Repository, Signature};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::{debug, error, info, warn};

use super::file::FileStore;
use super::traits::JsonStore;

/// Git manager for handling local repository operations
#[derive(Clone)]
pub struct GitManager {
    author_name: String,
    author_email: String,
}

impl GitManager {
    pub fn new() -> Self {
        Self {
            author_name: "Cleaning Scheduler".to_string(),
            author_email: "scheduler@localhost".to_string(),
        }
    }

    pub fn with_author(author_name: String, author_email: String) -> Self {
        Self {
            author_name,
            author_email,
        }
    }

    /// Initialize a git repository in `repo_path`, creating the directory if needed
    pub fn init_repo<P: AsRef<Path>>(&self, repo_path: P) -> Result<()> {
        let repo_path = repo_path.as_ref();

        if !repo_path.exists() {
            fs::create_dir_all(repo_path)?;
        }

        match Repository::init(repo_path) {
            Ok(_) => {
                info!("Initialized git repository at: {:?}", repo_path);
                Ok(())
            }
            Err(e) => {
                error!("Failed to initialize git repository at {:?}: {}", repo_path, e);
                Err(anyhow!("Failed to initialize git repository: {}", e))
            }
        }
    }

    pub fn ensure_repo_exists<P: AsRef<Path>>(&self, repo_path: P) -> Result<()> {
        let repo_path = repo_path.as_ref();
        if self.is_git_repository(repo_path) {
            return Ok(());
        }
        debug!("Git repository does not exist, initializing at: {:?}", repo_path);
        self.init_repo(repo_path)
    }

    pub fn has_uncommitted_changes<P: AsRef<Path>>(&self, repo_path: P) -> Result<bool> {
        let repo = Repository::open(repo_path.as_ref())?;
        let statuses = repo.statuses(None)?;
        Ok(!statuses.is_empty())
    }

    /// Stage every change in the working tree
    pub fn add_all<P: AsRef<Path>>(&self, repo_path: P) -> Result<()> {
        let repo = Repository::open(repo_path.as_ref())?;
        let mut index = repo.index()?;
        index.add_all(["*.json"].iter(), IndexAddOption::DEFAULT, None)?;
        index.update_all(["*.json"].iter(), None)?;
        index.write()?;
        Ok(())
    }

    /// Commit the staged tree on top of HEAD (or as the root commit)
    pub fn commit<P: AsRef<Path>>(&self, repo_path: P, message: &str) -> Result<Oid> {
        let repo = Repository::open(repo_path.as_ref())?;
        let signature = Signature::now(&self.author_name, &self.author_email)?;

        let mut index = repo.index()?;
        let tree_id = index.write_tree()?;
        let tree = repo.find_tree(tree_id)?;

        let parent_commits = match repo.head() {
            Ok(head) => match head.target() {
                Some(target) => vec![repo.find_commit(target)?],
                None => vec![],
            },
            Err(_) => vec![],
        };

        let commit_id = repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &parent_commits.iter().collect::<Vec<_>>(),
        )?;

        debug!("Created commit {} in {:?}: {}", commit_id, repo_path.as_ref(), message);
        Ok(commit_id)
    }

    /// Stage and commit whatever changed after writing `filename`.
    ///
    /// Non-blocking: every git failure is logged and swallowed.
    pub fn commit_file_change<P: AsRef<Path>>(&self, repo_path: P, filename: &str, message: &str) {
        let repo_path = repo_path.as_ref();

        if let Err(e) = self.ensure_repo_exists(repo_path) {
            warn!("Failed to ensure git repository exists at {:?}: {}", repo_path, e);
            return;
        }

        match self.has_uncommitted_changes(repo_path) {
            Ok(false) => {
                debug!("No changes to commit for {}", filename);
                return;
            }
            Ok(true) => {}
            Err(e) => {
                warn!("Failed to check repository status at {:?}: {}", repo_path, e);
                return;
            }
        }

        if let Err(e) = self.add_all(repo_path) {
            warn!("Failed to stage changes in repository {:?}: {}", repo_path, e);
            return;
        }

        match self.commit(repo_path, message) {
            Ok(commit_id) => info!("Committed {}: {} ({})", filename, message, commit_id),
            Err(e) => warn!("Failed to commit changes in repository {:?}: {}", repo_path, e),
        }
    }

    pub fn is_git_repository<P: AsRef<Path>>(&self, repo_path: P) -> bool {
        repo_path.as_ref().join(".git").exists()
    }
}

impl Default for GitManager {
    fn default() -> Self {
        Self::new()
    }
}

/// File store that commits every write
#[derive(Clone)]
pub struct GitStore {
    files: FileStore,
    git: GitManager,
}

impl GitStore {
    pub fn new<P: AsRef<Path>>(directory: P, git: GitManager) -> Result<Self> {
        let files = FileStore::new(directory)?;
        git.ensure_repo_exists(files.directory())?;
        Ok(Self { files, git })
    }

    pub fn directory(&self) -> &Path {
        self.files.directory()
    }
}

#[async_trait]
impl JsonStore for GitStore {
    async fn read(&self, key: &str) -> Result<Value> {
        self.files.read(key).await
    }

    async fn write(&self, key: &str, value: &Value, description: Option<&str>) -> Result<()> {
        self.files.write(key, value, description).await?;

        let filename = FileStore::file_name(key)?;
        let message = match description {
            Some(description) if !description.trim().is_empty() => description.trim().to_string(),
            _ => format!("Update {}", key),
        };
        self.git
            .commit_file_change(self.files.directory(), &filename, &message);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "git"
    }
}
