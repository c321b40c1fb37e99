//! Project auto-detection
//!
//! [`ProjectDetector`] runs an ordered chain of [`DetectionStrategy`]
//! implementations against a path. Strategies are tried in order; the first
//! one that names a project wins and the rest are never consulted. A strategy
//! that fails (missing files, repository errors) simply declines.
//!
//! | order | method            | confidence |
//! |-------|-------------------|------------|
//! | 1     | `directory_name`  | 0.95       |
//! | 2     | `git_repository`  | 0.90       |
//! | 3     | `language_files`  | 0.85       |
//! | 4     | `default_project` | 0.70       |

pub mod scan;
pub mod strategies;

pub use strategies::{
    extract_repo_name, DefaultProjectStrategy, DetectionStrategy, DirectoryNameStrategy,
    GitRepositoryStrategy, LanguageFilesStrategy, LANGUAGE_MARKERS,
};

use crate::error::{CoreError, Result};
use crate::model::{Project, Rule};
use crate::repository::{Repositories, RuleRepository};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Directory names that never identify a project and are never descended into
pub const EXCLUDED_DIRS: &[&str] = &[
    "node_modules",
    "vendor",
    "dist",
    "build",
    "target",
    ".git",
    ".vscode",
];

/// Project ID used by the fallback strategy unless configured otherwise
pub const DEFAULT_PROJECT_ID: &str = "default";

pub fn is_excluded_dir(name: &str) -> bool {
    EXCLUDED_DIRS.contains(&name)
}

/// How a project was detected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    DirectoryName,
    GitRepository,
    LanguageFiles,
    DefaultProject,
}

impl DetectionMethod {
    /// Fixed trust score of the method
    pub fn confidence(&self) -> f64 {
        match self {
            DetectionMethod::DirectoryName => 0.95,
            DetectionMethod::GitRepository => 0.90,
            DetectionMethod::LanguageFiles => 0.85,
            DetectionMethod::DefaultProject => 0.70,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DetectionMethod::DirectoryName => "directory_name",
            DetectionMethod::GitRepository => "git_repository",
            DetectionMethod::LanguageFiles => "language_files",
            DetectionMethod::DefaultProject => "default_project",
        }
    }
}

impl fmt::Display for DetectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a successful detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub project: Project,
    pub rules: Vec<Rule>,
    pub detection_method: DetectionMethod,
    pub confidence: f64,
    pub message: String,
}

/// Infers project identity from filesystem paths
#[derive(Clone)]
pub struct ProjectDetector {
    rules: Arc<dyn RuleRepository>,
    chain: Vec<Arc<dyn DetectionStrategy>>,
}

impl fmt::Debug for ProjectDetector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjectDetector")
            .field(
                "chain",
                &self.chain.iter().map(|s| s.method()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl ProjectDetector {
    /// Build the standard four-step chain
    pub fn new(repos: &Repositories) -> Self {
        Self::with_default_project_id(repos, DEFAULT_PROJECT_ID)
    }

    /// Build the standard chain with a custom fallback project ID
    pub fn with_default_project_id(repos: &Repositories, default_project_id: &str) -> Self {
        let projects = Arc::clone(&repos.projects);
        let chain: Vec<Arc<dyn DetectionStrategy>> = vec![
            Arc::new(DirectoryNameStrategy::new(Arc::clone(&projects))),
            Arc::new(GitRepositoryStrategy::new(Arc::clone(&projects))),
            Arc::new(LanguageFilesStrategy::new(Arc::clone(&projects))),
            Arc::new(DefaultProjectStrategy::new(projects, default_project_id)),
        ];
        Self {
            rules: Arc::clone(&repos.rules),
            chain,
        }
    }

    /// Methods of the chain, in the order they are tried
    pub fn methods(&self) -> Vec<DetectionMethod> {
        self.chain.iter().map(|s| s.method()).collect()
    }

    /// Detect the project at `path`.
    ///
    /// Returns [`CoreError::NoProjectDetected`] when every strategy declines,
    /// which only happens if the default project is missing too.
    pub async fn auto_detect_project(&self, path: impl AsRef<Path>) -> Result<DetectionResult> {
        let path = path.as_ref();

        for strategy in &self.chain {
            let Some(project) = strategy.detect(path).await else {
                continue;
            };

            let method = strategy.method();
            let rules = match self.rules.list_active(&project.project_id).await {
                Ok(rules) => rules,
                Err(e) => {
                    debug!(
                        project_id = %project.project_id,
                        error = %e,
                        "Rule lookup failed, attaching none"
                    );
                    Vec::new()
                }
            };

            debug!(
                path = %path.display(),
                project_id = %project.project_id,
                %method,
                "Detected project"
            );

            return Ok(DetectionResult {
                message: strategy.message(path),
                confidence: method.confidence(),
                detection_method: method,
                project,
                rules,
            });
        }

        Err(CoreError::NoProjectDetected(path.display().to_string()))
    }

    /// Run detection at every non-excluded directory under `base_path`,
    /// collecting every success in walk order.
    ///
    /// Nested project directories can yield the same project more than once.
    pub async fn scan_local_projects(
        &self,
        base_path: impl AsRef<Path>,
    ) -> Result<Vec<DetectionResult>> {
        let base: PathBuf = base_path.as_ref().to_path_buf();
        let dirs = tokio::task::spawn_blocking(move || scan::collect_directories(&base))
            .await
            .map_err(|e| CoreError::internal(format!("scan task failed: {}", e)))??;

        let mut results = Vec::new();
        for dir in &dirs {
            if let Ok(result) = self.auto_detect_project(dir).await {
                results.push(result);
            }
        }

        debug!(
            base_path = %base_path.as_ref().display(),
            directories = dirs.len(),
            detected = results.len(),
            "Scanned local projects"
        );
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{MemoryStore, SeedData};

    fn detector(seed: SeedData) -> ProjectDetector {
        ProjectDetector::new(&Repositories::from_store(Arc::new(MemoryStore::from_seed(seed))))
    }

    #[test]
    fn test_confidences() {
        assert_eq!(DetectionMethod::DirectoryName.confidence(), 0.95);
        assert_eq!(DetectionMethod::DefaultProject.confidence(), 0.70);
        assert_eq!(
            serde_json::to_value(DetectionMethod::GitRepository).unwrap(),
            serde_json::json!("git_repository")
        );
    }

    #[test]
    fn test_excluded_dirs() {
        assert!(is_excluded_dir("node_modules"));
        assert!(is_excluded_dir(".git"));
        assert!(!is_excluded_dir("src"));
    }

    #[test]
    fn test_chain_order() {
        let d = detector(SeedData::default());
        assert_eq!(
            d.methods(),
            vec![
                DetectionMethod::DirectoryName,
                DetectionMethod::GitRepository,
                DetectionMethod::LanguageFiles,
                DetectionMethod::DefaultProject,
            ]
        );
    }

    #[tokio::test]
    async fn test_no_default_means_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = detector(SeedData::default())
            .auto_detect_project(dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NoProjectDetected(_)));
    }
}
