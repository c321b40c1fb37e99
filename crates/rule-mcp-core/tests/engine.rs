//! Integration tests for rule resolution and code validation
//!
//! Runs the resolver and validator against both repository implementations.

use rule_mcp_core::{
    CodeValidator, CoreError, ErrorKind, GlobalRule, MemoryStore, Project, Repositories, Rule,
    RuleResolver, SeedData, SqliteStore,
};
use std::sync::Arc;

/// Project `p1`: one error rule of its own, one warning rule from javascript globals
fn p1_seed() -> SeedData {
    SeedData {
        projects: vec![
            Project::new("p1", "P1", "javascript").with_global_rules(true),
            Project::new("p2", "P2", "javascript"),
        ],
        rules: vec![Rule::new("p1", "no-eval", "No eval")
            .with_severity("error")
            .with_pattern(r"eval\(")
            .with_message("eval is forbidden")],
        global_rules: vec![GlobalRule::new("javascript", "no-var", "No var")
            .with_severity("warning")
            .with_pattern("var ")
            .with_message("prefer let or const")],
    }
}

fn memory_repos(seed: SeedData) -> Repositories {
    Repositories::from_store(Arc::new(MemoryStore::from_seed(seed)))
}

fn sqlite_repos(seed: SeedData) -> Repositories {
    let store = SqliteStore::open_in_memory().unwrap();
    store.import(&seed).unwrap();
    Repositories::from_store(Arc::new(store))
}

#[tokio::test]
async fn test_p1_scenario_memory() {
    let validator = CodeValidator::new(RuleResolver::new(memory_repos(p1_seed())));
    let result = validator.validate_code("p1", "eval(x); var y=1;").await.unwrap();

    assert!(!result.valid);
    assert_eq!(result.errors, vec!["eval is forbidden"]);
    assert_eq!(result.warnings, vec!["prefer let or const"]);
}

#[tokio::test]
async fn test_p1_scenario_sqlite_with_cache() {
    let validator =
        CodeValidator::new(RuleResolver::new(sqlite_repos(p1_seed()))).with_pattern_cache(16);

    for _ in 0..2 {
        let result = validator.validate_code("p1", "eval(x); var y=1;").await.unwrap();
        assert!(!result.valid);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.warnings.len(), 1);
    }
}

#[tokio::test]
async fn test_globals_never_leak_into_opted_out_project() {
    for repos in [memory_repos(p1_seed()), sqlite_repos(p1_seed())] {
        let resolved = RuleResolver::new(repos).get_project_rules("p2").await.unwrap();
        assert!(resolved.rules.is_empty());
    }
}

#[tokio::test]
async fn test_clean_code_is_valid() {
    let validator = CodeValidator::new(RuleResolver::new(memory_repos(p1_seed())));
    let result = validator.validate_code("p1", "let y = 1;").await.unwrap();

    assert!(result.valid);
    assert!(result.errors.is_empty());
    assert!(result.warnings.is_empty());
}

#[tokio::test]
async fn test_validate_unknown_project() {
    let validator = CodeValidator::new(RuleResolver::new(memory_repos(p1_seed())));
    let err = validator.validate_code("nope", "x").await.unwrap_err();

    assert!(matches!(err, CoreError::ProjectNotFound(_)));
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_fixture_data_resolves() {
    let resolver = RuleResolver::new(memory_repos(SeedData::fixtures()));
    let resolved = resolver.get_project_rules("web-app").await.unwrap();
    let ids: Vec<_> = resolved.rules.iter().map(|r| r.rule_id.as_str()).collect();

    // project bucket (warning > error textually), then javascript globals
    assert_eq!(ids, vec!["no-console-log", "no-debugger", "no-var", "no-eval"]);
}
