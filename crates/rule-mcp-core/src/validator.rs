//! Code validation against resolved rules

use crate::error::Result;
use crate::model::{severity, Rule, ValidationResult};
use crate::pattern_cache::PatternCache;
use crate::resolver::RuleResolver;
use regex::Regex;
use std::sync::Arc;
use tracing::debug;

/// Evaluates source text against a project's resolved rule set.
///
/// Matching is an unanchored regular-expression search. A rule whose
/// pattern does not compile is skipped without failing the call.
#[derive(Debug, Clone)]
pub struct CodeValidator {
    resolver: RuleResolver,
    cache: Option<Arc<PatternCache>>,
}

impl CodeValidator {
    pub fn new(resolver: RuleResolver) -> Self {
        Self {
            resolver,
            cache: None,
        }
    }

    /// Reuse compiled patterns across calls. A capacity of zero disables the cache.
    pub fn with_pattern_cache(mut self, capacity: usize) -> Self {
        self.cache = (capacity > 0).then(|| Arc::new(PatternCache::new(capacity)));
        self
    }

    pub fn resolver(&self) -> &RuleResolver {
        &self.resolver
    }

    /// Resolve the project's rules and evaluate `code` against them
    pub async fn validate_code(&self, project_id: &str, code: &str) -> Result<ValidationResult> {
        let resolved = self.resolver.get_project_rules(project_id).await?;
        let result = self.evaluate(&resolved.rules, code);
        debug!(
            project_id,
            rules = resolved.rules.len(),
            errors = result.errors.len(),
            warnings = result.warnings.len(),
            "Validated code"
        );
        Ok(result)
    }

    /// Evaluate `code` against an already resolved rule list, in order
    pub fn evaluate(&self, rules: &[Rule], code: &str) -> ValidationResult {
        let mut result = ValidationResult::default();

        for rule in rules {
            if !rule.is_active || rule.pattern.is_empty() {
                continue;
            }

            let re = match self.compile(&rule.pattern) {
                Ok(re) => re,
                Err(e) => {
                    debug!(rule_id = %rule.rule_id, error = %e, "Skipping rule with invalid pattern");
                    continue;
                }
            };

            if !re.is_match(code) {
                continue;
            }

            match rule.severity.as_str() {
                severity::ERROR => result.push_error(rule.report_text()),
                severity::WARNING => result.push_warning(rule.report_text()),
                _ => {}
            }
        }

        result.valid = result.errors.is_empty();
        result
    }

    fn compile(&self, pattern: &str) -> std::result::Result<Regex, regex::Error> {
        match &self.cache {
            Some(cache) => cache.get_or_compile(pattern),
            None => Regex::new(pattern),
        }
    }
}
