//! SQLite-backed repository
//!
//! A single connection guarded by a `parking_lot::Mutex`. Queries run on the
//! blocking thread pool so async callers never stall the runtime.

use super::{GlobalRuleRepository, ProjectRepository, RuleRepository, SeedData};
use crate::error::{RepositoryError, RepositoryResult};
use crate::model::{GlobalRule, Project, Rule};
use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS projects (
    project_id          TEXT PRIMARY KEY,
    name                TEXT NOT NULL,
    description         TEXT NOT NULL DEFAULT '',
    language            TEXT NOT NULL,
    apply_global_rules  INTEGER NOT NULL DEFAULT 1,
    created_at          TEXT NOT NULL,
    updated_at          TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS rules (
    project_id   TEXT NOT NULL REFERENCES projects(project_id) ON DELETE CASCADE,
    rule_id      TEXT NOT NULL,
    name         TEXT NOT NULL,
    description  TEXT NOT NULL DEFAULT '',
    type         TEXT NOT NULL DEFAULT '',
    severity     TEXT NOT NULL DEFAULT 'warning',
    pattern      TEXT NOT NULL DEFAULT '',
    message      TEXT NOT NULL DEFAULT '',
    is_active    INTEGER NOT NULL DEFAULT 1,
    UNIQUE(project_id, rule_id)
);

CREATE TABLE IF NOT EXISTS global_rules (
    language     TEXT NOT NULL,
    rule_id      TEXT NOT NULL,
    name         TEXT NOT NULL,
    description  TEXT NOT NULL DEFAULT '',
    type         TEXT NOT NULL DEFAULT '',
    severity     TEXT NOT NULL DEFAULT 'warning',
    pattern      TEXT NOT NULL DEFAULT '',
    message      TEXT NOT NULL DEFAULT '',
    is_active    INTEGER NOT NULL DEFAULT 1,
    UNIQUE(language, rule_id)
);

CREATE INDEX IF NOT EXISTS idx_projects_language ON projects(language);
CREATE INDEX IF NOT EXISTS idx_rules_project ON rules(project_id, is_active);
CREATE INDEX IF NOT EXISTS idx_global_rules_language ON global_rules(language, is_active);
"#;

/// Relational store implementing all three repositories
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore").finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Open (and migrate) a database file, creating parent directories
    pub fn open(path: impl AsRef<Path>) -> RepositoryResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        debug!(path = %path.display(), "Opened SQLite store");
        Self::from_connection(conn)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> RepositoryResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> RepositoryResult<Self> {
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.migrate()?;
        Ok(store)
    }

    /// Create tables and indexes if missing
    pub fn migrate(&self) -> RepositoryResult<()> {
        let conn = self.conn.lock();
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Upsert every entry of a seed document in one transaction
    pub fn import(&self, seed: &SeedData) -> RepositoryResult<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        for p in &seed.projects {
            tx.execute(
                "INSERT OR REPLACE INTO projects
                   (project_id, name, description, language, apply_global_rules, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    p.project_id,
                    p.name,
                    p.description,
                    p.language,
                    p.apply_global_rules,
                    p.created_at,
                    p.updated_at,
                ],
            )?;
        }

        for r in &seed.rules {
            tx.execute(
                "INSERT OR REPLACE INTO rules
                   (project_id, rule_id, name, description, type, severity, pattern, message, is_active)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    r.project_id,
                    r.rule_id,
                    r.name,
                    r.description,
                    r.rule_type,
                    r.severity,
                    r.pattern,
                    r.message,
                    r.is_active,
                ],
            )?;
        }

        for g in &seed.global_rules {
            tx.execute(
                "INSERT OR REPLACE INTO global_rules
                   (language, rule_id, name, description, type, severity, pattern, message, is_active)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    g.language,
                    g.rule_id,
                    g.name,
                    g.description,
                    g.rule_type,
                    g.severity,
                    g.pattern,
                    g.message,
                    g.is_active,
                ],
            )?;
        }

        tx.commit()?;
        debug!(
            projects = seed.projects.len(),
            rules = seed.rules.len(),
            global_rules = seed.global_rules.len(),
            "Imported seed data into SQLite store"
        );
        Ok(())
    }

    /// Number of stored projects
    pub fn project_count(&self) -> RepositoryResult<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM projects", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    async fn with_conn<T, F>(&self, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock();
            f(&guard)
        })
        .await
        .map_err(|e| RepositoryError::Task(e.to_string()))?
        .map_err(RepositoryError::from)
    }
}

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        project_id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        language: row.get(3)?,
        apply_global_rules: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

const PROJECT_COLUMNS: &str =
    "project_id, name, description, language, apply_global_rules, created_at, updated_at";

#[async_trait]
impl ProjectRepository for SqliteStore {
    async fn get(&self, project_id: &str) -> RepositoryResult<Option<Project>> {
        let project_id = project_id.to_string();
        self.with_conn(move |conn| {
            conn.query_row(
                &format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE project_id = ?1"),
                params![project_id],
                project_from_row,
            )
            .optional()
        })
        .await
    }

    async fn list_by_language(&self, language: &str) -> RepositoryResult<Vec<Project>> {
        let language = language.to_string();
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {PROJECT_COLUMNS} FROM projects WHERE language = ?1 ORDER BY created_at DESC"
            ))?;
            let rows = stmt.query_map(params![language], project_from_row)?;
            rows.collect()
        })
        .await
    }
}

#[async_trait]
impl RuleRepository for SqliteStore {
    async fn list_active(&self, project_id: &str) -> RepositoryResult<Vec<Rule>> {
        let project_id = project_id.to_string();
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT project_id, rule_id, name, description, type, severity, pattern, message, is_active
                   FROM rules
                   WHERE project_id = ?1 AND is_active = 1
                   ORDER BY severity DESC, name ASC",
            )?;
            let rows = stmt.query_map(params![project_id], |row| {
                Ok(Rule {
                    project_id: row.get(0)?,
                    rule_id: row.get(1)?,
                    name: row.get(2)?,
                    description: row.get(3)?,
                    rule_type: row.get(4)?,
                    severity: row.get(5)?,
                    pattern: row.get(6)?,
                    message: row.get(7)?,
                    is_active: row.get(8)?,
                })
            })?;
            rows.collect()
        })
        .await
    }
}

#[async_trait]
impl GlobalRuleRepository for SqliteStore {
    async fn list_active_by_language(&self, language: &str) -> RepositoryResult<Vec<GlobalRule>> {
        let language = language.to_string();
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT language, rule_id, name, description, type, severity, pattern, message, is_active
                   FROM global_rules
                   WHERE language = ?1 AND is_active = 1
                   ORDER BY severity DESC, name ASC",
            )?;
            let rows = stmt.query_map(params![language], |row| {
                Ok(GlobalRule {
                    language: row.get(0)?,
                    rule_id: row.get(1)?,
                    name: row.get(2)?,
                    description: row.get(3)?,
                    rule_type: row.get(4)?,
                    severity: row.get(5)?,
                    pattern: row.get(6)?,
                    message: row.get(7)?,
                    is_active: row.get(8)?,
                })
            })?;
            rows.collect()
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryStore;

    fn seeded() -> SqliteStore {
        let store = SqliteStore::open_in_memory().unwrap();
        store.import(&SeedData::fixtures()).unwrap();
        store
    }

    #[tokio::test]
    async fn test_get_project() {
        let store = seeded();
        let project = store.get("web-app").await.unwrap().unwrap();
        assert_eq!(project.language, "javascript");
        assert!(project.apply_global_rules);
        assert!(store.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ordering_matches_memory_store() {
        let sqlite = seeded();
        let memory = MemoryStore::from_seed(SeedData::fixtures());

        let a = sqlite.list_active("web-app").await.unwrap();
        let b = memory.list_active("web-app").await.unwrap();
        assert_eq!(a, b);

        let a = sqlite.list_active_by_language("javascript").await.unwrap();
        let b = memory.list_active_by_language("javascript").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_inactive_rules_excluded() {
        let store = SqliteStore::open_in_memory().unwrap();
        let seed = SeedData {
            projects: vec![Project::new("p", "P", "go")],
            rules: vec![
                Rule::new("p", "on", "On"),
                Rule::new("p", "off", "Off").inactive(),
            ],
            global_rules: vec![GlobalRule::new("go", "g", "G").inactive()],
        };
        store.import(&seed).unwrap();

        let rules = store.list_active("p").await.unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].rule_id, "on");
        assert!(store.list_active_by_language("go").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_open_file_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("rules.db");
        {
            let store = SqliteStore::open(&path).unwrap();
            store.import(&SeedData::fixtures()).unwrap();
        }
        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.project_count().unwrap(), 4);
        assert_eq!(store.list_by_language("go").await.unwrap().len(), 1);
    }
}
