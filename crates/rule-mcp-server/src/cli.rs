//! Command-line interface
//!
//! ```bash
//! # HTTP + WebSocket server
//! rule-mcp serve --port 18080 --rule-store rules.yaml
//!
//! # MCP over stdin/stdout, for clients that spawn the server
//! rule-mcp stdio
//!
//! # One-shot engine operations, JSON on stdout
//! rule-mcp validate --project web-app src/app.js
//! rule-mcp detect ~/work/my-app
//! rule-mcp scan ~/work
//! ```

use crate::app;
use crate::config::{ConfigError, Environment, ServerConfig};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncRead, AsyncReadExt};

/// Exit codes for CLI operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success, no findings
    Success = 0,
    /// Validation produced errors
    ValidationError = 1,
    /// Validation produced only warnings
    ValidationWarning = 2,
    /// Invalid input or arguments
    InvalidInput = 3,
    /// Project not found or nothing detected
    NotFound = 4,
    /// Internal error
    InternalError = 10,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl ExitCode {
    pub fn from_validation_result(has_errors: bool, has_warnings: bool) -> Self {
        if has_errors {
            ExitCode::ValidationError
        } else if has_warnings {
            ExitCode::ValidationWarning
        } else {
            ExitCode::Success
        }
    }

    pub fn from_error(err: &rule_mcp_core::CoreError) -> Self {
        match err.kind() {
            rule_mcp_core::ErrorKind::NotFound => ExitCode::NotFound,
            rule_mcp_core::ErrorKind::Validation | rule_mcp_core::ErrorKind::Unprocessable => {
                ExitCode::InvalidInput
            }
            _ => ExitCode::InternalError,
        }
    }
}

/// Rule MCP Server
///
/// Serves project coding rules, validates code against them and detects
/// projects from filesystem paths.
#[derive(Parser, Debug)]
#[command(name = "rule-mcp")]
#[command(about = "Rule MCP Server - coding rules over the MCP protocol", long_about = None)]
#[command(version)]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true, env = "RULE_MCP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log filter (e.g. info, debug, rule_mcp_core=trace)
    #[arg(long, global = true, env = "LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Seed file (.json/.yaml) or SQLite database (.db/.sqlite)
    #[arg(long, global = true, env = "RULE_STORE")]
    pub rule_store: Option<PathBuf>,

    /// Project used when detection finds nothing better
    #[arg(long, global = true, env = "DEFAULT_PROJECT_ID")]
    pub default_project_id: Option<String>,

    /// Compiled pattern cache capacity (0 disables)
    #[arg(long, global = true, env = "PATTERN_CACHE_SIZE")]
    pub pattern_cache_size: Option<usize>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP and WebSocket server
    Serve {
        /// Host to bind to
        #[arg(long, env = "HOST")]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long, env = "PORT")]
        port: Option<u16>,

        /// development, staging or production
        #[arg(short, long, env = "ENVIRONMENT")]
        environment: Option<String>,
    },

    /// Serve MCP envelopes over stdin/stdout, one per line
    Stdio,

    /// Validate a file against a project's rules
    Validate {
        /// Project ID
        #[arg(short, long)]
        project: String,

        /// File to validate, `-` for stdin
        file: PathBuf,
    },

    /// Detect the project at a path
    Detect {
        path: PathBuf,
    },

    /// Detect every project under a directory
    Scan {
        #[arg(default_value = ".")]
        base_path: PathBuf,
    },
}

impl Cli {
    /// Merge defaults, the config file and command-line overrides
    pub fn resolve_config(&self) -> Result<ServerConfig, ConfigError> {
        let mut config = ServerConfig::load(self.config.as_deref())?;

        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if let Some(store) = &self.rule_store {
            config.rule_store = Some(store.clone());
        }
        if let Some(id) = &self.default_project_id {
            config.default_project_id = id.clone();
        }
        if let Some(size) = self.pattern_cache_size {
            config.pattern_cache_size = size;
        }

        if let Commands::Serve {
            host,
            port,
            environment,
        } = &self.command
        {
            if let Some(host) = host {
                config.host = host.clone();
            }
            if let Some(port) = port {
                config.port = *port;
            }
            if let Some(env) = environment {
                config.environment = env.parse::<Environment>()?;
            }
        }

        Ok(config)
    }

    /// Whether stdout must stay free of log output
    pub fn logs_to_stderr(&self) -> bool {
        !matches!(self.command, Commands::Serve { .. })
    }
}

/// Source text to validate: `-` reads `stdin` to EOF, anything else is a file path
async fn read_source<R>(file: &Path, mut stdin: R) -> anyhow::Result<String>
where
    R: AsyncRead + Unpin,
{
    if file.as_os_str() == "-" {
        let mut code = String::new();
        stdin.read_to_string(&mut code).await?;
        return Ok(code);
    }

    tokio::fs::read_to_string(file)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read '{}': {}", file.display(), e))
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Execute the parsed command
pub async fn run(cli: Cli, config: ServerConfig) -> anyhow::Result<ExitCode> {
    match cli.command {
        Commands::Serve { .. } => {
            app::serve_http(config).await?;
            Ok(ExitCode::Success)
        }

        Commands::Stdio => {
            app::serve_stdio(config).await?;
            Ok(ExitCode::Success)
        }

        Commands::Validate { project, file } => {
            let code = read_source(&file, tokio::io::stdin()).await?;

            let engine = app::Engine::open(&config)?;
            match engine.validator.validate_code(&project, &code).await {
                Ok(result) => {
                    print_json(&result)?;
                    Ok(ExitCode::from_validation_result(
                        !result.errors.is_empty(),
                        !result.warnings.is_empty(),
                    ))
                }
                Err(e) => {
                    eprintln!("{}", e);
                    Ok(ExitCode::from_error(&e))
                }
            }
        }

        Commands::Detect { path } => {
            let engine = app::Engine::open(&config)?;
            match engine.detector.auto_detect_project(&path).await {
                Ok(result) => {
                    print_json(&result)?;
                    Ok(ExitCode::Success)
                }
                Err(e) => {
                    eprintln!("{}", e);
                    Ok(ExitCode::from_error(&e))
                }
            }
        }

        Commands::Scan { base_path } => {
            let engine = app::Engine::open(&config)?;
            match engine.detector.scan_local_projects(&base_path).await {
                Ok(projects) => {
                    print_json(&serde_json::json!({
                        "projects": projects,
                        "count": projects.len(),
                    }))?;
                    Ok(ExitCode::Success)
                }
                Err(e) => {
                    eprintln!("{}", e);
                    Ok(ExitCode::from_error(&e))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_from_validation_result() {
        assert_eq!(ExitCode::from_validation_result(false, false), ExitCode::Success);
        assert_eq!(ExitCode::from_validation_result(true, true), ExitCode::ValidationError);
        assert_eq!(ExitCode::from_validation_result(false, true), ExitCode::ValidationWarning);
        assert_eq!(i32::from(ExitCode::InternalError), 10);
    }

    #[test]
    fn test_serve_overrides() {
        let cli = Cli::try_parse_from([
            "rule-mcp",
            "serve",
            "--port",
            "9999",
            "--environment",
            "production",
            "--pattern-cache-size",
            "64",
        ])
        .unwrap();

        let config = cli.resolve_config().unwrap();
        assert_eq!(config.port, 9999);
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.pattern_cache_size, 64);
        assert!(!cli.logs_to_stderr());
    }

    #[test]
    fn test_one_shot_commands_log_to_stderr() {
        let cli = Cli::try_parse_from(["rule-mcp", "detect", "/tmp/my-app"]).unwrap();
        assert!(cli.logs_to_stderr());

        let cli = Cli::try_parse_from(["rule-mcp", "stdio"]).unwrap();
        assert!(cli.logs_to_stderr());
    }

    #[tokio::test]
    async fn test_read_source_from_stdin_and_file() {
        let code = read_source(Path::new("-"), &b"debugger;\n"[..]).await.unwrap();
        assert_eq!(code, "debugger;\n");

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.js");
        std::fs::write(&path, "console.log(1);").unwrap();
        let code = read_source(&path, &b"ignored"[..]).await.unwrap();
        assert_eq!(code, "console.log(1);");

        let err = read_source(&dir.path().join("missing.js"), &b""[..])
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("Failed to read"));
    }

    #[test]
    fn test_invalid_environment_rejected() {
        let cli = Cli::try_parse_from(["rule-mcp", "serve", "-e", "qa"]).unwrap();
        assert!(cli.resolve_config().is_err());
    }
}
