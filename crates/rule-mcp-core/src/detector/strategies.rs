//! Detection strategies
//!
//! Each strategy inspects a path independently and either names a project or
//! declines. Repository errors are treated as "no match" so a failing store
//! never aborts the chain.

use super::{is_excluded_dir, DetectionMethod};
use crate::model::Project;
use crate::repository::ProjectRepository;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Marker files and the language tag each one implies, in probe order
pub const LANGUAGE_MARKERS: &[(&str, &str)] = &[
    ("go.mod", "go"),
    ("package.json", "node"),
    ("requirements.txt", "python"),
    ("pom.xml", "java"),
    ("Cargo.toml", "rust"),
    ("composer.json", "php"),
    ("Gemfile", "ruby"),
];

/// One link of the detection chain
#[async_trait]
pub trait DetectionStrategy: Send + Sync {
    /// Method reported when this strategy succeeds
    fn method(&self) -> DetectionMethod;

    /// Try to identify the project at `path`
    async fn detect(&self, path: &Path) -> Option<Project>;

    /// Human readable explanation attached to a successful result
    fn message(&self, path: &Path) -> String;
}

/// Leaf name of a path, empty for roots and `..`
pub fn leaf_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

async fn lookup(
    projects: &dyn ProjectRepository,
    project_id: &str,
    method: DetectionMethod,
) -> Option<Project> {
    match projects.get(project_id).await {
        Ok(found) => found,
        Err(e) => {
            debug!(%method, project_id, error = %e, "Project lookup failed, treating as no match");
            None
        }
    }
}

/// Looks up the leaf directory name as a project ID
pub struct DirectoryNameStrategy {
    projects: Arc<dyn ProjectRepository>,
}

impl DirectoryNameStrategy {
    pub fn new(projects: Arc<dyn ProjectRepository>) -> Self {
        Self { projects }
    }
}

#[async_trait]
impl DetectionStrategy for DirectoryNameStrategy {
    fn method(&self) -> DetectionMethod {
        DetectionMethod::DirectoryName
    }

    async fn detect(&self, path: &Path) -> Option<Project> {
        let leaf = leaf_name(path);
        if leaf.is_empty() || is_excluded_dir(&leaf) {
            return None;
        }
        lookup(self.projects.as_ref(), &leaf, self.method()).await
    }

    fn message(&self, path: &Path) -> String {
        format!("Detected project from directory name '{}'", leaf_name(path))
    }
}

/// Matches remote URLs in `.git/config` against project IDs
pub struct GitRepositoryStrategy {
    projects: Arc<dyn ProjectRepository>,
}

impl GitRepositoryStrategy {
    pub fn new(projects: Arc<dyn ProjectRepository>) -> Self {
        Self { projects }
    }
}

#[async_trait]
impl DetectionStrategy for GitRepositoryStrategy {
    fn method(&self) -> DetectionMethod {
        DetectionMethod::GitRepository
    }

    async fn detect(&self, path: &Path) -> Option<Project> {
        let config = tokio::fs::read_to_string(path.join(".git").join("config"))
            .await
            .ok()?;

        for url in remote_urls(&config) {
            let Some(name) = extract_repo_name(url) else {
                continue;
            };
            if let Some(project) = lookup(self.projects.as_ref(), name, self.method()).await {
                return Some(project);
            }
        }
        None
    }

    fn message(&self, _path: &Path) -> String {
        "Detected project from git repository name".to_string()
    }
}

/// Every `url = ...` value in a git config file, in file order
pub fn remote_urls(config: &str) -> impl Iterator<Item = &str> {
    config
        .lines()
        .map(str::trim)
        .filter_map(|line| line.strip_prefix("url = "))
        .map(str::trim)
}

/// Repository name from an SSH (`git@host:org/repo.git`) or HTTP(S)
/// (`https://host/org/repo.git`) remote URL.
///
/// The name is the last path segment with any `.git` suffix removed.
pub fn extract_repo_name(url: &str) -> Option<&str> {
    let repo_path = if url.starts_with("http://") || url.starts_with("https://") {
        url.split_once("://").map(|(_, rest)| rest)?
    } else if url.contains('@') {
        url.split_once(':').map(|(_, rest)| rest)?
    } else {
        return None;
    };

    let last = repo_path.trim_end_matches('/').rsplit('/').next()?;
    let name = last.strip_suffix(".git").unwrap_or(last);
    (!name.is_empty()).then_some(name)
}

/// Infers a language from ecosystem marker files
pub struct LanguageFilesStrategy {
    projects: Arc<dyn ProjectRepository>,
}

impl LanguageFilesStrategy {
    pub fn new(projects: Arc<dyn ProjectRepository>) -> Self {
        Self { projects }
    }
}

#[async_trait]
impl DetectionStrategy for LanguageFilesStrategy {
    fn method(&self) -> DetectionMethod {
        DetectionMethod::LanguageFiles
    }

    async fn detect(&self, path: &Path) -> Option<Project> {
        for (marker, language) in LANGUAGE_MARKERS {
            if !tokio::fs::try_exists(path.join(marker)).await.unwrap_or(false) {
                continue;
            }
            match self.projects.list_by_language(language).await {
                Ok(projects) => {
                    if let Some(project) = projects.into_iter().next() {
                        return Some(project);
                    }
                }
                Err(e) => {
                    debug!(
                        marker,
                        language,
                        error = %e,
                        "Language lookup failed, trying next marker"
                    );
                }
            }
        }
        None
    }

    fn message(&self, _path: &Path) -> String {
        "Detected project from language files".to_string()
    }
}

/// Falls back to a well-known project ID
pub struct DefaultProjectStrategy {
    projects: Arc<dyn ProjectRepository>,
    project_id: String,
}

impl DefaultProjectStrategy {
    pub fn new(projects: Arc<dyn ProjectRepository>, project_id: impl Into<String>) -> Self {
        Self {
            projects,
            project_id: project_id.into(),
        }
    }
}

#[async_trait]
impl DetectionStrategy for DefaultProjectStrategy {
    fn method(&self) -> DetectionMethod {
        DetectionMethod::DefaultProject
    }

    async fn detect(&self, _path: &Path) -> Option<Project> {
        lookup(self.projects.as_ref(), &self.project_id, self.method()).await
    }

    fn message(&self, _path: &Path) -> String {
        "Using default project".to_string()
    }
}
