//! Rule MCP Server entry point

use clap::Parser;
use rule_mcp_server::cli::{self, Cli, ExitCode};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn writer(to_stderr: bool) -> BoxMakeWriter {
    if to_stderr {
        BoxMakeWriter::new(std::io::stderr)
    } else {
        BoxMakeWriter::new(std::io::stdout)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match cli.resolve_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(ExitCode::InvalidInput.into());
        }
    };

    // stdout carries protocol or command output for everything but `serve`
    let to_stderr = cli.logs_to_stderr();
    let json = config.environment.json_logs();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.log_level.clone()),
        ))
        .with(json.then(|| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(writer(to_stderr))
        }))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(writer(to_stderr))))
        .init();

    let code = match cli::run(cli, config).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("Error: {:#}", e);
            ExitCode::InternalError
        }
    };

    std::process::exit(code.into());
}
