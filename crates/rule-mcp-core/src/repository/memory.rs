//! In-memory repository
//!
//! Backs tests and the file-based deployment mode, where projects and rules
//! are loaded once from a JSON or YAML seed file.

use super::{GlobalRuleRepository, ProjectRepository, RuleRepository};
use crate::error::{RepositoryError, RepositoryResult};
use crate::model::{sort_ranked, GlobalRule, Project, Rule};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Seed document accepted by [`MemoryStore::load_seed_file`] and
/// [`super::SqliteStore::import`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub global_rules: Vec<GlobalRule>,
}

impl SeedData {
    /// Parse a seed file; `.yaml`/`.yml` are read as YAML, anything else as JSON
    pub fn from_file(path: impl AsRef<Path>) -> RepositoryResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        if is_yaml {
            Ok(serde_yaml::from_str(&content)?)
        } else {
            Ok(serde_json::from_str(&content)?)
        }
    }

    /// Sample data used when no store is configured
    pub fn fixtures() -> Self {
        let at = |day: u32| {
            Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0)
                .single()
                .unwrap_or_else(Utc::now)
        };

        let projects = vec![
            Project::new("default", "Default Project", "general")
                .with_description("Default project with common rules")
                .with_global_rules(true)
                .with_created_at(at(1)),
            Project::new("web-app", "Web Application", "javascript")
                .with_description("Web application specific rules")
                .with_global_rules(true)
                .with_created_at(at(5)),
            Project::new("api-service", "API Service", "go")
                .with_description("API service specific rules")
                .with_global_rules(true)
                .with_created_at(at(10)),
            Project::new("team-project", "Team Project", "typescript")
                .with_description("Team collaboration project")
                .with_global_rules(true)
                .with_created_at(at(15)),
        ];

        let rules = vec![
            Rule::new("web-app", "no-console-log", "No Console Log")
                .with_description("Console.log statements should not be in production code")
                .with_type("style")
                .with_severity("warning")
                .with_pattern(r"console\.log")
                .with_message("Console.log detected. Use proper logging framework in production."),
            Rule::new("web-app", "no-debugger", "No Debugger")
                .with_description("Debugger statements should not be in production code")
                .with_type("style")
                .with_severity("error")
                .with_pattern("debugger")
                .with_message("Debugger statement detected. Remove before production."),
            Rule::new("api-service", "no-panic", "No Panic")
                .with_description("Handlers must return errors instead of panicking")
                .with_type("reliability")
                .with_severity("error")
                .with_pattern(r"panic\(")
                .with_message("panic() detected. Return an error instead."),
        ];

        let global_rules = vec![
            GlobalRule::new("javascript", "no-eval", "No Eval")
                .with_severity("error")
                .with_pattern(r"eval\(")
                .with_message("eval() is a security risk."),
            GlobalRule::new("javascript", "no-var", "No Var")
                .with_severity("warning")
                .with_pattern(r"\bvar\s")
                .with_message("Use let or const instead of var."),
            GlobalRule::new("typescript", "no-any", "No Any")
                .with_severity("warning")
                .with_pattern(r":\s*any\b")
                .with_message("Avoid the any type."),
            GlobalRule::new("go", "no-fmt-println", "No fmt.Println")
                .with_severity("info")
                .with_pattern(r"fmt\.Println")
                .with_message("Use the structured logger."),
        ];

        Self {
            projects,
            rules,
            global_rules,
        }
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    projects: Vec<Project>,
    rules: Vec<Rule>,
    global_rules: Vec<GlobalRule>,
}

/// Thread-safe in-memory store implementing all three repositories
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store populated from seed data
    pub fn from_seed(seed: SeedData) -> Self {
        let store = Self::new();
        store.import(seed);
        store
    }

    /// Create a store from a JSON or YAML seed file
    pub fn load_seed_file(path: impl AsRef<Path>) -> RepositoryResult<Self> {
        let path = path.as_ref();
        let seed = SeedData::from_file(path).map_err(|e| match e {
            RepositoryError::Io(io) => {
                RepositoryError::Seed(format!("cannot read {}: {}", path.display(), io))
            }
            other => other,
        })?;
        tracing::info!(
            path = %path.display(),
            projects = seed.projects.len(),
            rules = seed.rules.len(),
            global_rules = seed.global_rules.len(),
            "Loaded seed data"
        );
        Ok(Self::from_seed(seed))
    }

    /// Add every entry of a seed document
    pub fn import(&self, seed: SeedData) {
        for project in seed.projects {
            self.insert_project(project);
        }
        for rule in seed.rules {
            self.insert_rule(rule);
        }
        for rule in seed.global_rules {
            self.insert_global_rule(rule);
        }
    }

    /// Insert or replace a project
    pub fn insert_project(&self, project: Project) {
        let mut state = self.state.write();
        match state
            .projects
            .iter_mut()
            .find(|p| p.project_id == project.project_id)
        {
            Some(existing) => *existing = project,
            None => state.projects.push(project),
        }
    }

    /// Insert or replace a rule keyed by (project ID, rule ID)
    pub fn insert_rule(&self, rule: Rule) {
        let mut state = self.state.write();
        match state
            .rules
            .iter_mut()
            .find(|r| r.project_id == rule.project_id && r.rule_id == rule.rule_id)
        {
            Some(existing) => *existing = rule,
            None => state.rules.push(rule),
        }
    }

    /// Insert or replace a global rule keyed by (language, rule ID)
    pub fn insert_global_rule(&self, rule: GlobalRule) {
        let mut state = self.state.write();
        match state
            .global_rules
            .iter_mut()
            .find(|r| r.language == rule.language && r.rule_id == rule.rule_id)
        {
            Some(existing) => *existing = rule,
            None => state.global_rules.push(rule),
        }
    }

    pub fn project_count(&self) -> usize {
        self.state.read().projects.len()
    }
}

#[async_trait]
impl ProjectRepository for MemoryStore {
    async fn get(&self, project_id: &str) -> RepositoryResult<Option<Project>> {
        Ok(self
            .state
            .read()
            .projects
            .iter()
            .find(|p| p.project_id == project_id)
            .cloned())
    }

    async fn list_by_language(&self, language: &str) -> RepositoryResult<Vec<Project>> {
        let mut projects: Vec<Project> = self
            .state
            .read()
            .projects
            .iter()
            .filter(|p| p.language == language)
            .cloned()
            .collect();
        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(projects)
    }
}

#[async_trait]
impl RuleRepository for MemoryStore {
    async fn list_active(&self, project_id: &str) -> RepositoryResult<Vec<Rule>> {
        let mut rules: Vec<Rule> = self
            .state
            .read()
            .rules
            .iter()
            .filter(|r| r.project_id == project_id && r.is_active)
            .cloned()
            .collect();
        sort_ranked(&mut rules);
        Ok(rules)
    }
}

#[async_trait]
impl GlobalRuleRepository for MemoryStore {
    async fn list_active_by_language(&self, language: &str) -> RepositoryResult<Vec<GlobalRule>> {
        let mut rules: Vec<GlobalRule> = self
            .state
            .read()
            .global_rules
            .iter()
            .filter(|r| r.language == language && r.is_active)
            .cloned()
            .collect();
        sort_ranked(&mut rules);
        Ok(rules)
    }
}
