//! Rule MCP Core
//!
//! Rule resolution, code validation and project auto-detection for the Rule
//! MCP Server.
//!
//! ## Architecture
//!
//! 1. **Repositories** (`repository/`): narrow read traits over projects,
//!    project rules and language-global rules, with an in-memory store and a
//!    SQLite store.
//!
//! 2. **Resolver** (`resolver`): merges a project's rules with its language's
//!    global rules, project bucket first.
//!
//! 3. **Validator** (`validator`): evaluates source text against resolved
//!    rules with unanchored regular-expression searches.
//!
//! 4. **Detector** (`detector/`): an ordered, confidence-ranked chain of
//!    strategies that maps a filesystem path to a project, plus an exhaustive
//!    directory scan built on it.
//!
//! ## Example
//!
//! ```rust,no_run
//! use rule_mcp_core::{CodeValidator, MemoryStore, Repositories, RuleResolver, SeedData};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> rule_mcp_core::Result<()> {
//!     let store = Arc::new(MemoryStore::from_seed(SeedData::fixtures()));
//!     let validator = CodeValidator::new(RuleResolver::new(Repositories::from_store(store)));
//!
//!     let result = validator.validate_code("web-app", "debugger;").await?;
//!     assert!(!result.valid);
//!     Ok(())
//! }
//! ```

pub mod detector;
pub mod error;
pub mod model;
pub mod pattern_cache;
pub mod repository;
pub mod resolver;
pub mod validator;

pub use detector::{DetectionMethod, DetectionResult, ProjectDetector};
pub use error::{CoreError, ErrorKind, RepositoryError, Result};
pub use model::{GlobalRule, Project, ProjectRules, Rule, ValidationResult};
pub use pattern_cache::PatternCache;
pub use repository::{
    GlobalRuleRepository, MemoryStore, ProjectRepository, Repositories, RuleRepository, SeedData,
    SqliteStore,
};
pub use resolver::RuleResolver;
pub use validator::CodeValidator;
