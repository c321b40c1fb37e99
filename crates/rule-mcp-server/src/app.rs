//! Wiring: storage, engine components and transports

use crate::config::{ServerConfig, StoreKind};
use crate::dispatcher::ProtocolDispatcher;
use crate::metrics::{MetricsSink, PrometheusMetrics};
use crate::transport::{http, stdio};
use anyhow::Context;
use rule_mcp_core::{
    CodeValidator, MemoryStore, ProjectDetector, Repositories, RuleResolver, SeedData, SqliteStore,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

/// Open the configured store
pub fn open_repositories(config: &ServerConfig) -> anyhow::Result<Repositories> {
    let repos = match config.store_kind()? {
        StoreKind::Fixtures => {
            info!("No rule store configured, using built-in sample data");
            Repositories::from_store(Arc::new(MemoryStore::from_seed(SeedData::fixtures())))
        }
        StoreKind::SeedFile(path) => {
            let store = MemoryStore::load_seed_file(&path)
                .with_context(|| format!("loading seed file {}", path.display()))?;
            Repositories::from_store(Arc::new(store))
        }
        StoreKind::Sqlite(path) => {
            let store = SqliteStore::open(&path)
                .with_context(|| format!("opening SQLite store {}", path.display()))?;
            info!(path = %path.display(), projects = store.project_count()?, "Opened SQLite store");
            Repositories::from_store(Arc::new(store))
        }
    };
    Ok(repos)
}

/// The engine components built over one store
#[derive(Debug, Clone)]
pub struct Engine {
    pub validator: CodeValidator,
    pub detector: ProjectDetector,
}

impl Engine {
    pub fn new(repos: Repositories, config: &ServerConfig) -> Self {
        let validator = CodeValidator::new(RuleResolver::new(repos.clone()))
            .with_pattern_cache(config.pattern_cache_size);
        let detector = ProjectDetector::with_default_project_id(&repos, &config.default_project_id);
        Self {
            validator,
            detector,
        }
    }

    pub fn open(config: &ServerConfig) -> anyhow::Result<Self> {
        Ok(Self::new(open_repositories(config)?, config))
    }

    pub fn dispatcher(&self, metrics: Arc<dyn MetricsSink>) -> ProtocolDispatcher {
        ProtocolDispatcher::new(self.validator.clone(), self.detector.clone()).with_metrics(metrics)
    }
}

/// Serve HTTP and WebSocket until the process is stopped
pub async fn serve_http(config: ServerConfig) -> anyhow::Result<()> {
    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .with_context(|| format!("invalid bind address {}", config.bind_address()))?;

    let engine = Engine::open(&config)?;
    let metrics = Arc::new(PrometheusMetrics::new()?);
    let dispatcher = engine.dispatcher(metrics.clone());
    let router = http::create_router(http::AppState::new(dispatcher).with_metrics(metrics));

    info!(
        %addr,
        environment = %config.environment,
        version = crate::VERSION,
        "Starting Rule MCP Server"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}

/// Serve newline-delimited envelopes on stdin/stdout until EOF
pub async fn serve_stdio(config: ServerConfig) -> anyhow::Result<()> {
    let engine = Engine::open(&config)?;
    let dispatcher = engine.dispatcher(Arc::new(crate::metrics::NoopMetrics));

    info!(version = crate::VERSION, "Serving MCP over stdio");
    let handled = stdio::serve_stdio(&dispatcher).await?;
    info!(handled, "Stdin closed, exiting");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_open_seed_file_store() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{"projects":[{{"project_id":"solo","name":"Solo","language":"go"}}]}}"#
        )
        .unwrap();

        let config = ServerConfig {
            rule_store: Some(file.path().to_path_buf()),
            ..ServerConfig::default()
        };
        let repos = open_repositories(&config).unwrap();
        assert!(repos.projects.get("solo").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_open_sqlite_store_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            rule_store: Some(dir.path().join("rules.db")),
            ..ServerConfig::default()
        };
        let repos = open_repositories(&config).unwrap();
        assert!(repos.projects.get("default").await.unwrap().is_none());
        assert!(dir.path().join("rules.db").exists());
    }

    #[test]
    fn test_unsupported_store_rejected() {
        let config = ServerConfig {
            rule_store: Some("rules.csv".into()),
            ..ServerConfig::default()
        };
        assert!(open_repositories(&config).is_err());
    }
}
