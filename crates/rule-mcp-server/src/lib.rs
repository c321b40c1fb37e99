//! Rule MCP Server
//!
//! Exposes the rule engine over the MCP envelope protocol.
//!
//! ## Architecture
//!
//! 1. **Protocol** (`protocol`): envelope types, error codes, method
//!    parameters and results.
//!
//! 2. **Dispatcher** (`dispatcher`): routes a method call to the engine and
//!    normalizes every outcome into an envelope; the only place error kinds
//!    become wire codes.
//!
//! 3. **Transports** (`transport/`): HTTP (`POST /mcp/request`), WebSocket
//!    (`GET /mcp/ws`) and stdio, all driving the same dispatcher.
//!
//! 4. **Metrics** (`metrics`): injectable sink with a Prometheus
//!    implementation served on `/metrics`.
//!
//! 5. **CLI** (`cli`) and configuration (`config`).

pub mod app;
pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod metrics;
pub mod protocol;
pub mod tools;
pub mod transport;

pub use config::{Environment, ServerConfig};
pub use dispatcher::{error_code, Method, ProtocolDispatcher};
pub use metrics::{CallStatus, MetricsSink, NoopMetrics, PrometheusMetrics};
pub use protocol::{codes, McpError, McpRequest, McpResponse};
pub use transport::http::{create_router, AppState};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
