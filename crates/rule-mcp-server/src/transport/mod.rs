//! Transports
//!
//! - [`http`]: synchronous `POST /mcp/request`, plus health and metrics routes
//! - [`websocket`]: persistent `GET /mcp/ws`
//! - [`stdio`]: persistent newline-delimited envelopes on stdin/stdout
//!
//! The persistent transports implement [`EnvelopeChannel`] and share
//! [`serve_connection`], which handles one envelope at a time: read, route,
//! write, read again. Responses therefore leave in request order.

pub mod http;
pub mod stdio;
pub mod websocket;

use crate::dispatcher::ProtocolDispatcher;
use crate::protocol::McpRequest;
use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info};

/// Errors that end a persistent connection
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("read failed: {0}")]
    Read(String),

    #[error("write failed: {0}")]
    Write(String),

    #[error("undecodable envelope: {0}")]
    Decode(#[from] serde_json::Error),
}

/// A bidirectional channel carrying one JSON envelope per frame
#[async_trait]
pub trait EnvelopeChannel: Send {
    /// Next inbound frame, `None` once the peer has closed
    async fn recv(&mut self) -> Result<Option<String>, TransportError>;

    async fn send(&mut self, frame: String) -> Result<(), TransportError>;
}

/// Serve one connection until the peer closes or an error occurs.
///
/// Returns the number of envelopes answered when the peer closes cleanly.
pub async fn serve_connection<C>(
    channel: &mut C,
    dispatcher: &ProtocolDispatcher,
) -> Result<u64, TransportError>
where
    C: EnvelopeChannel + ?Sized,
{
    let mut handled = 0u64;

    while let Some(frame) = channel.recv().await? {
        let request: McpRequest = serde_json::from_str(&frame)?;
        let response = dispatcher.dispatch(request).await;
        channel.send(serde_json::to_string(&response)?).await?;
        handled += 1;
    }

    debug!(handled, "Peer closed connection");
    Ok(handled)
}

/// Run [`serve_connection`] and log how the connection ended
pub async fn run_connection<C>(
    mut channel: C,
    dispatcher: ProtocolDispatcher,
    transport: &'static str,
) where
    C: EnvelopeChannel,
{
    info!(transport, "Connection opened");
    match serve_connection(&mut channel, &dispatcher).await {
        Ok(handled) => info!(transport, handled, "Connection closed"),
        Err(e) => info!(transport, error = %e, "Connection terminated"),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::VecDeque;

    /// Scripted channel: yields queued frames, records everything sent
    #[derive(Default)]
    pub struct ScriptedChannel {
        pub inbound: VecDeque<Result<String, String>>,
        pub outbound: Vec<String>,
    }

    impl ScriptedChannel {
        pub fn new<I: IntoIterator<Item = &'static str>>(frames: I) -> Self {
            Self {
                inbound: frames.into_iter().map(|f| Ok(f.to_string())).collect(),
                outbound: Vec::new(),
            }
        }
    }

    #[async_trait]
    impl EnvelopeChannel for ScriptedChannel {
        async fn recv(&mut self) -> Result<Option<String>, TransportError> {
            match self.inbound.pop_front() {
                Some(Ok(frame)) => Ok(Some(frame)),
                Some(Err(e)) => Err(TransportError::Read(e)),
                None => Ok(None),
            }
        }

        async fn send(&mut self, frame: String) -> Result<(), TransportError> {
            self.outbound.push(frame);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::ScriptedChannel;
    use super::*;
    use crate::protocol::McpResponse;
    use rule_mcp_core::{
        CodeValidator, MemoryStore, ProjectDetector, Repositories, RuleResolver, SeedData,
    };
    use std::sync::Arc;

    fn dispatcher() -> ProtocolDispatcher {
        let store = Arc::new(MemoryStore::from_seed(SeedData::fixtures()));
        let repos = Repositories::from_store(store);
        ProtocolDispatcher::new(
            CodeValidator::new(RuleResolver::new(repos.clone())),
            ProjectDetector::new(&repos),
        )
    }

    fn ids(channel: &ScriptedChannel) -> Vec<String> {
        channel
            .outbound
            .iter()
            .map(|f| serde_json::from_str::<McpResponse>(f).unwrap().id)
            .collect()
    }

    #[tokio::test]
    async fn test_responses_in_request_order() {
        let mut channel = ScriptedChannel::new([
            r#"{"id":"1","method":"tools/list"}"#,
            r#"{"id":"2","method":"getRules","params":{"project_id":"web-app"}}"#,
            r#"{"id":"3","method":"nope"}"#,
        ]);

        let handled = serve_connection(&mut channel, &dispatcher()).await.unwrap();
        assert_eq!(handled, 3);
        assert_eq!(ids(&channel), vec!["1", "2", "3"]);
    }

    #[tokio::test]
    async fn test_decode_failure_stops_loop() {
        let mut channel = ScriptedChannel::new([
            r#"{"id":"1","method":"tools/list"}"#,
            "not json",
            r#"{"id":"3","method":"tools/list"}"#,
        ]);

        let err = serve_connection(&mut channel, &dispatcher()).await.unwrap_err();
        assert!(matches!(err, TransportError::Decode(_)));
        assert_eq!(ids(&channel), vec!["1"]);
    }

    #[tokio::test]
    async fn test_read_failure_stops_loop() {
        let mut channel = ScriptedChannel::default();
        channel.inbound.push_back(Err("reset".to_string()));
        channel
            .inbound
            .push_back(Ok(r#"{"id":"1","method":"tools/list"}"#.to_string()));

        let err = serve_connection(&mut channel, &dispatcher()).await.unwrap_err();
        assert!(matches!(err, TransportError::Read(_)));
        assert!(channel.outbound.is_empty());
    }
}
