//! Repository traits consumed by the engine
//!
//! The engine only reads from storage, through three narrow traits. Two
//! implementations ship with the crate:
//!
//! - [`MemoryStore`]: in-process store, loadable from a JSON/YAML seed file
//! - [`SqliteStore`]: relational store backed by SQLite
//!
//! # Ordering contract
//!
//! `list_active` and `list_active_by_language` return rules ordered by
//! severity descending then name ascending (see [`crate::model::rank_order`]).
//! The resolver relies on this and never re-sorts.

pub mod memory;
pub mod sqlite;

pub use memory::{MemoryStore, SeedData};
pub use sqlite::SqliteStore;

use crate::error::RepositoryResult;
use crate::model::{GlobalRule, Project, Rule};
use async_trait::async_trait;
use std::sync::Arc;

/// Read access to projects
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Look up a project by its ID. `Ok(None)` when absent.
    async fn get(&self, project_id: &str) -> RepositoryResult<Option<Project>>;

    /// Projects of one language, newest first
    async fn list_by_language(&self, language: &str) -> RepositoryResult<Vec<Project>>;
}

/// Read access to project-scoped rules
#[async_trait]
pub trait RuleRepository: Send + Sync {
    /// Active rules of a project, in ranking order
    async fn list_active(&self, project_id: &str) -> RepositoryResult<Vec<Rule>>;
}

/// Read access to language-scoped rules
#[async_trait]
pub trait GlobalRuleRepository: Send + Sync {
    /// Active global rules of a language, in ranking order
    async fn list_active_by_language(&self, language: &str) -> RepositoryResult<Vec<GlobalRule>>;
}

/// The three repositories bundled together
#[derive(Clone)]
pub struct Repositories {
    pub projects: Arc<dyn ProjectRepository>,
    pub rules: Arc<dyn RuleRepository>,
    pub global_rules: Arc<dyn GlobalRuleRepository>,
}

impl Repositories {
    /// Use one store for all three repositories
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: ProjectRepository + RuleRepository + GlobalRuleRepository + 'static,
    {
        Self {
            projects: store.clone(),
            rules: store.clone(),
            global_rules: store,
        }
    }
}

impl std::fmt::Debug for Repositories {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repositories").finish_non_exhaustive()
    }
}
