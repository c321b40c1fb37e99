//! Rule resolution
//!
//! Merges a project's own rules with its language's global rules. The two
//! buckets keep their repository ordering and are concatenated, project
//! rules first; the merged list is never re-sorted and rule IDs are never
//! deduplicated across buckets.

use crate::error::{CoreError, Result};
use crate::model::{GlobalRule, ProjectRules};
use crate::repository::Repositories;
use tracing::debug;

/// Fetches and merges rule sets for projects
#[derive(Debug, Clone)]
pub struct RuleResolver {
    repos: Repositories,
}

impl RuleResolver {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    /// Resolve the active rules of a project.
    ///
    /// Returns [`CoreError::Validation`] for an empty ID and
    /// [`CoreError::ProjectNotFound`] when the project does not exist.
    /// Any repository failure is passed through unchanged.
    pub async fn get_project_rules(&self, project_id: &str) -> Result<ProjectRules> {
        if project_id.is_empty() {
            return Err(CoreError::validation("project ID is required"));
        }

        let project = self
            .repos
            .projects
            .get(project_id)
            .await?
            .ok_or_else(|| CoreError::ProjectNotFound(project_id.to_string()))?;

        let mut rules = self.repos.rules.list_active(project_id).await?;
        let own = rules.len();

        if project.apply_global_rules {
            let globals = self
                .repos
                .global_rules
                .list_active_by_language(&project.language)
                .await?;
            rules.extend(globals.iter().map(|g| g.to_project_rule(project_id)));
        }

        debug!(
            project_id,
            language = %project.language,
            project_rules = own,
            global_rules = rules.len() - own,
            "Resolved project rules"
        );

        Ok(ProjectRules {
            project_id: project_id.to_string(),
            rules,
        })
    }

    /// Active global rules of a language
    pub async fn get_global_rules(&self, language: &str) -> Result<Vec<GlobalRule>> {
        Ok(self
            .repos
            .global_rules
            .list_active_by_language(language)
            .await?)
    }
}
