//! Protocol dispatcher
//!
//! Routes an [`McpRequest`] to the engine and turns the outcome into an
//! [`McpResponse`]. Every transport goes through [`ProtocolDispatcher::dispatch`],
//! and [`error_code`] is the only place an [`ErrorKind`] becomes a wire code.

use crate::metrics::{CallStatus, MetricsSink, NoopMetrics};
use crate::protocol::{
    codes, AutoDetectParams, GetRulesParams, GetRulesResult, McpError, McpRequest, McpResponse,
    ProjectInfoParams, ScanParams, ScanResult, ValidateCodeParams, ValidateCodeResult,
    ValidationIssue,
};
use crate::tools;
use rule_mcp_core::{CodeValidator, CoreError, ErrorKind, ProjectDetector, RuleResolver};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, Instrument};

/// Base path scanned when `scanLocalProjects` gets none
pub const DEFAULT_SCAN_BASE: &str = "/";

/// The fixed method catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    ToolsList,
    GetRules,
    ValidateCode,
    GetProjectInfo,
    AutoDetectProject,
    ScanLocalProjects,
}

impl Method {
    pub const ALL: [Method; 6] = [
        Method::ToolsList,
        Method::GetRules,
        Method::ValidateCode,
        Method::GetProjectInfo,
        Method::AutoDetectProject,
        Method::ScanLocalProjects,
    ];

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == name)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::ToolsList => "tools/list",
            Method::GetRules => "getRules",
            Method::ValidateCode => "validateCode",
            Method::GetProjectInfo => "getProjectInfo",
            Method::AutoDetectProject => "autoDetectProject",
            Method::ScanLocalProjects => "scanLocalProjects",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wire code for an error kind
pub fn error_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::Validation => codes::VALIDATION,
        ErrorKind::Unauthorized => codes::UNAUTHORIZED,
        ErrorKind::Forbidden => codes::FORBIDDEN,
        ErrorKind::NotFound => codes::NOT_FOUND,
        ErrorKind::Conflict => codes::CONFLICT,
        ErrorKind::Unprocessable => codes::UNPROCESSABLE,
        ErrorKind::Internal => codes::INTERNAL,
    }
}

/// Decode method parameters; absent params decode like `{}`.
///
/// Only JSON objects are accepted. Arrays would otherwise decode
/// positionally into the parameter struct.
pub fn parse_params<T: DeserializeOwned>(params: Value) -> Result<T, McpError> {
    let params = match params {
        Value::Null => Value::Object(Default::default()),
        object @ Value::Object(_) => object,
        _ => return Err(McpError::new(codes::VALIDATION, "Invalid parameters")),
    };
    serde_json::from_value(params)
        .map_err(|_| McpError::new(codes::VALIDATION, "Invalid parameters"))
}

fn required(message: &str) -> McpError {
    McpError::new(codes::VALIDATION, message)
}

fn to_result<T: Serialize>(value: &T) -> Result<Value, McpError> {
    serde_json::to_value(value).map_err(|e| {
        error!(error = %e, "Failed to serialize result");
        McpError::new(codes::INTERNAL, "Failed to serialize result")
    })
}

/// Map an engine error, prefixing the message with the failed operation.
/// Internal details are logged and not sent to the caller.
fn engine_error(operation: &str, err: CoreError) -> McpError {
    let code = error_code(err.kind());
    if err.is_user_error() {
        McpError::new(code, format!("{}: {}", operation, err))
    } else {
        error!(error = %err, operation, "Engine failure");
        McpError::new(code, format!("{}: internal server error", operation))
    }
}

/// Routes envelopes to the resolver, validator and detector
#[derive(Clone)]
pub struct ProtocolDispatcher {
    resolver: RuleResolver,
    validator: CodeValidator,
    detector: ProjectDetector,
    metrics: Arc<dyn MetricsSink>,
}

impl fmt::Debug for ProtocolDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProtocolDispatcher")
            .field("detector", &self.detector)
            .finish_non_exhaustive()
    }
}

impl ProtocolDispatcher {
    pub fn new(validator: CodeValidator, detector: ProjectDetector) -> Self {
        Self {
            resolver: validator.resolver().clone(),
            validator,
            detector,
            metrics: Arc::new(NoopMetrics),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Handle one call. Never fails: every outcome is an envelope.
    pub async fn dispatch(&self, request: McpRequest) -> McpResponse {
        let span = tracing::info_span!("mcp.dispatch", method = %request.method, id = %request.id);

        async move {
            let Some(method) = Method::parse(&request.method) else {
                debug!("Unknown method");
                return McpResponse::failure(
                    request.id,
                    codes::NOT_FOUND,
                    format!("Method not found: {}", request.method),
                );
            };

            let start = Instant::now();
            let outcome = self.route(method, request.params).await;
            let elapsed = start.elapsed();

            let response = match outcome {
                Ok(result) => McpResponse::success(request.id, result),
                Err(err) => McpResponse::failure(request.id, err.code, err.message),
            };
            let status = if response.is_error() {
                CallStatus::Error
            } else {
                CallStatus::Ok
            };

            self.metrics.record(method.as_str(), status, elapsed);
            debug!(%status, duration_ms = elapsed.as_millis() as u64, "Call completed");
            response
        }
        .instrument(span)
        .await
    }

    async fn route(&self, method: Method, params: Value) -> Result<Value, McpError> {
        match method {
            Method::ToolsList => Ok(tools::catalog()),
            Method::GetRules => self.get_rules(parse_params(params)?).await,
            Method::ValidateCode => self.validate_code(parse_params(params)?).await,
            Method::GetProjectInfo => self.get_project_info(parse_params(params)?),
            Method::AutoDetectProject => self.auto_detect_project(parse_params(params)?).await,
            Method::ScanLocalProjects => self.scan_local_projects(parse_params(params)?).await,
        }
    }

    async fn get_rules(&self, params: GetRulesParams) -> Result<Value, McpError> {
        if params.project_id.is_empty() {
            return Err(required("Project ID is required"));
        }

        let resolved = self
            .resolver
            .get_project_rules(&params.project_id)
            .await
            .map_err(|e| engine_error("Failed to get project rules", e))?;

        let global_rules = if params.language.is_empty() {
            Vec::new()
        } else {
            self.resolver
                .get_global_rules(&params.language)
                .await
                .unwrap_or_else(|e| {
                    debug!(language = %params.language, error = %e, "Global rule lookup failed");
                    Vec::new()
                })
        };

        let mut applied_rules = resolved.rules.clone();
        applied_rules.extend(
            global_rules
                .iter()
                .map(|g| g.to_project_rule(&params.project_id)),
        );

        to_result(&GetRulesResult {
            project_id: params.project_id,
            language: params.language,
            rules: resolved.rules,
            global_rules,
            applied_rules,
        })
    }

    async fn validate_code(&self, params: ValidateCodeParams) -> Result<Value, McpError> {
        if params.project_id.is_empty() || params.code.is_empty() {
            return Err(required("Project ID and code are required"));
        }

        let validation = self
            .validator
            .validate_code(&params.project_id, &params.code)
            .await
            .map_err(|e| engine_error("Failed to validate code", e))?;

        let issues = validation
            .errors
            .iter()
            .map(ValidationIssue::error)
            .chain(validation.warnings.iter().map(ValidationIssue::warning))
            .collect();

        let applied_rules = self
            .resolver
            .get_project_rules(&params.project_id)
            .await
            .map(|resolved| resolved.rules)
            .unwrap_or_default();

        to_result(&ValidateCodeResult {
            is_valid: validation.valid,
            issues,
            applied_rules,
        })
    }

    fn get_project_info(&self, params: ProjectInfoParams) -> Result<Value, McpError> {
        if params.project_id.is_empty() {
            return Err(required("Project ID is required"));
        }
        Err(McpError::new(codes::INTERNAL, "getProjectInfo not yet implemented"))
    }

    async fn auto_detect_project(&self, params: AutoDetectParams) -> Result<Value, McpError> {
        if params.path.is_empty() {
            return Err(required("Path is required"));
        }

        let result = self
            .detector
            .auto_detect_project(&params.path)
            .await
            .map_err(|e| engine_error("Project not found", e))?;

        to_result(&result)
    }

    async fn scan_local_projects(&self, params: ScanParams) -> Result<Value, McpError> {
        let base_path = if params.base_path.is_empty() {
            DEFAULT_SCAN_BASE.to_string()
        } else {
            params.base_path
        };

        let projects = self
            .detector
            .scan_local_projects(&base_path)
            .await
            .map_err(|e| engine_error("Failed to scan local projects", e))?;

        to_result(&ScanResult {
            count: projects.len(),
            projects,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_code_mapping() {
        assert_eq!(error_code(ErrorKind::Validation), 4000);
        assert_eq!(error_code(ErrorKind::Unauthorized), 4001);
        assert_eq!(error_code(ErrorKind::Forbidden), 4003);
        assert_eq!(error_code(ErrorKind::NotFound), 4040);
        assert_eq!(error_code(ErrorKind::Conflict), 4090);
        assert_eq!(error_code(ErrorKind::Unprocessable), 4220);
        assert_eq!(error_code(ErrorKind::Internal), 5000);
    }

    #[test]
    fn test_method_parse() {
        for method in Method::ALL {
            assert_eq!(Method::parse(method.as_str()), Some(method));
        }
        assert_eq!(Method::parse("getrules"), None);
    }

    #[test]
    fn test_parse_params_null_is_empty_object() {
        let params: GetRulesParams = parse_params(Value::Null).unwrap();
        assert!(params.project_id.is_empty());
    }

    #[test]
    fn test_parse_params_wrong_type() {
        let err = parse_params::<GetRulesParams>(json!({"project_id": 7})).unwrap_err();
        assert_eq!(err, McpError::new(4000, "Invalid parameters"));

        let err = parse_params::<GetRulesParams>(json!(["p1"])).unwrap_err();
        assert_eq!(err.code, 4000);
    }

    #[test]
    fn test_engine_error_hides_internal_details() {
        let err = engine_error("Failed", CoreError::internal("secret dsn"));
        assert_eq!(err.code, 5000);
        assert!(!err.message.contains("secret"));

        let err = engine_error("Failed", CoreError::ProjectNotFound("p".into()));
        assert_eq!(err.code, 4040);
        assert_eq!(err.message, "Failed: project 'p' not found");
    }
}
