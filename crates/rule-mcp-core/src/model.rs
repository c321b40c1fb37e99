//! Domain model: projects, rules, global rules and validation results

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Well-known severity values. The set is open; unknown values are carried
/// through untouched and ignored by the validator.
pub mod severity {
    pub const ERROR: &str = "error";
    pub const WARNING: &str = "warning";
    pub const INFO: &str = "info";
}

fn default_true() -> bool {
    true
}

fn default_severity() -> String {
    severity::WARNING.to_string()
}

/// A project as stored by the persistence layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub project_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub language: String,
    /// Whether the language's global rules are merged into this project's rules
    #[serde(default)]
    pub apply_global_rules: bool,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn new(
        project_id: impl Into<String>,
        name: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            project_id: project_id.into(),
            name: name.into(),
            description: String::new(),
            language: language.into(),
            apply_global_rules: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_global_rules(mut self, apply: bool) -> Self {
        self.apply_global_rules = apply;
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self.updated_at = created_at;
        self
    }
}

/// A project-scoped rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    #[serde(default)]
    pub project_id: String,
    pub rule_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub rule_type: String,
    #[serde(default = "default_severity")]
    pub severity: String,
    /// Regular expression searched for in the code; empty disables matching
    #[serde(default)]
    pub pattern: String,
    #[serde(default)]
    pub message: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Rule {
    pub fn new(
        project_id: impl Into<String>,
        rule_id: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            rule_id: rule_id.into(),
            name: name.into(),
            description: String::new(),
            rule_type: String::new(),
            severity: default_severity(),
            pattern: String::new(),
            message: String::new(),
            is_active: true,
        }
    }

    pub fn with_severity(mut self, severity: impl Into<String>) -> Self {
        self.severity = severity.into();
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_type(mut self, rule_type: impl Into<String>) -> Self {
        self.rule_type = rule_type.into();
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Text reported when the rule matches: message, else name, else description
    pub fn report_text(&self) -> &str {
        [&self.message, &self.name, &self.description]
            .into_iter()
            .find(|s| !s.is_empty())
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// A language-scoped rule applied to every opted-in project of that language
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalRule {
    pub language: String,
    pub rule_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub rule_type: String,
    #[serde(default = "default_severity")]
    pub severity: String,
    #[serde(default)]
    pub pattern: String,
    #[serde(default)]
    pub message: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl GlobalRule {
    pub fn new(
        language: impl Into<String>,
        rule_id: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            language: language.into(),
            rule_id: rule_id.into(),
            name: name.into(),
            description: String::new(),
            rule_type: String::new(),
            severity: default_severity(),
            pattern: String::new(),
            message: String::new(),
            is_active: true,
        }
    }

    pub fn with_severity(mut self, severity: impl Into<String>) -> Self {
        self.severity = severity.into();
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Convert into the project rule shape. Every field maps one-to-one; the
    /// language tag is dropped.
    pub fn to_project_rule(&self, project_id: &str) -> Rule {
        Rule {
            project_id: project_id.to_string(),
            rule_id: self.rule_id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            rule_type: self.rule_type.clone(),
            severity: self.severity.clone(),
            pattern: self.pattern.clone(),
            message: self.message.clone(),
            is_active: self.is_active,
        }
    }
}

/// Rules resolved for a project: its own bucket first, then the global bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRules {
    pub project_id: String,
    pub rules: Vec<Rule>,
}

/// Outcome of validating code against a project's rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

impl ValidationResult {
    pub fn push_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
        self.valid = false;
    }

    pub fn push_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }
}

/// Anything that repositories order by "severity descending, name ascending"
pub trait Ranked {
    fn severity(&self) -> &str;
    fn name(&self) -> &str;
}

impl Ranked for Rule {
    fn severity(&self) -> &str {
        &self.severity
    }
    fn name(&self) -> &str {
        &self.name
    }
}

impl Ranked for GlobalRule {
    fn severity(&self) -> &str {
        &self.severity
    }
    fn name(&self) -> &str {
        &self.name
    }
}

/// Repository ordering: severity text descending, then name ascending.
///
/// Severity is compared as plain text, matching `ORDER BY severity DESC` on a
/// text column.
pub fn rank_order<T: Ranked>(a: &T, b: &T) -> Ordering {
    b.severity()
        .cmp(a.severity())
        .then_with(|| a.name().cmp(b.name()))
}

/// Sort in place with [`rank_order`]
pub fn sort_ranked<T: Ranked>(items: &mut [T]) {
    items.sort_by(rank_order);
}
