//! MCP wire types
//!
//! Request:  `{ "id": string, "method": string, "params": <json> }`
//! Response: `{ "id": string, "result": <json> }` or
//!           `{ "id": string, "error": { "code": int, "message": string } }`

use rule_mcp_core::{DetectionResult, GlobalRule, Rule};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Numeric error codes carried in error envelopes
pub mod codes {
    pub const VALIDATION: i32 = 4000;
    pub const UNAUTHORIZED: i32 = 4001;
    pub const FORBIDDEN: i32 = 4003;
    pub const NOT_FOUND: i32 = 4040;
    pub const CONFLICT: i32 = 4090;
    pub const UNPROCESSABLE: i32 = 4220;
    pub const INTERNAL: i32 = 5000;
}

/// Inbound envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpRequest {
    #[serde(default)]
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

impl McpRequest {
    pub fn new(id: impl Into<String>, method: impl Into<String>, params: Value) -> Self {
        Self {
            id: id.into(),
            method: method.into(),
            params,
        }
    }
}

/// Error payload of an envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McpError {
    pub code: i32,
    pub message: String,
}

impl McpError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Outbound envelope; exactly one of `result` and `error` is set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpResponse {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<McpError>,
}

impl McpResponse {
    pub fn success(id: impl Into<String>, result: Value) -> Self {
        Self {
            id: id.into(),
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: impl Into<String>, code: i32, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            result: None,
            error: Some(McpError::new(code, message)),
        }
    }

    /// Reply to a body that could not be decoded as an envelope
    pub fn invalid_request() -> Self {
        Self::failure("", codes::VALIDATION, "Invalid request format")
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

// Method parameters. Missing optional strings decode as empty.

#[derive(Debug, Default, Deserialize)]
pub struct GetRulesParams {
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub language: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ValidateCodeParams {
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub language: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProjectInfoParams {
    #[serde(default)]
    pub project_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct AutoDetectParams {
    #[serde(default)]
    pub path: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ScanParams {
    #[serde(default)]
    pub base_path: String,
}

// Method results

#[derive(Debug, Serialize)]
pub struct GetRulesResult {
    pub project_id: String,
    pub language: String,
    pub rules: Vec<Rule>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub global_rules: Vec<GlobalRule>,
    pub applied_rules: Vec<Rule>,
}

/// One reported finding of `validateCode`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub rule_id: String,
    pub rule_name: String,
    pub severity: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            rule_id: "validation-error".to_string(),
            rule_name: "Code Validation Error".to_string(),
            severity: "error".to_string(),
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            rule_id: "validation-warning".to_string(),
            rule_name: "Code Validation Warning".to_string(),
            severity: "warning".to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ValidateCodeResult {
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<ValidationIssue>,
    pub applied_rules: Vec<Rule>,
}

#[derive(Debug, Serialize)]
pub struct ScanResult {
    pub projects: Vec<DetectionResult>,
    pub count: usize,
}
