//! Stdio transport
//!
//! One JSON envelope per line in both directions. Lets MCP clients spawn the
//! server as a subprocess. Logs must go to stderr while this runs.

use super::{serve_connection, EnvelopeChannel, TransportError};
use crate::dispatcher::ProtocolDispatcher;
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, Lines};

/// [`EnvelopeChannel`] over a line-oriented reader and a writer
pub struct LineChannel<R, W> {
    lines: Lines<BufReader<R>>,
    writer: W,
}

impl<R, W> LineChannel<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            lines: BufReader::new(reader).lines(),
            writer,
        }
    }

    pub fn into_writer(self) -> W {
        self.writer
    }
}

#[async_trait]
impl<R, W> EnvelopeChannel for LineChannel<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn recv(&mut self) -> Result<Option<String>, TransportError> {
        loop {
            match self.lines.next_line().await {
                Ok(Some(line)) if line.trim().is_empty() => continue,
                Ok(line) => return Ok(line),
                Err(e) => return Err(TransportError::Read(e.to_string())),
            }
        }
    }

    async fn send(&mut self, mut frame: String) -> Result<(), TransportError> {
        frame.push('\n');
        self.writer
            .write_all(frame.as_bytes())
            .await
            .map_err(|e| TransportError::Write(e.to_string()))?;
        self.writer
            .flush()
            .await
            .map_err(|e| TransportError::Write(e.to_string()))
    }
}

/// Serve envelopes from stdin until EOF
pub async fn serve_stdio(dispatcher: &ProtocolDispatcher) -> Result<u64, TransportError> {
    let mut channel = LineChannel::new(tokio::io::stdin(), tokio::io::stdout());
    serve_connection(&mut channel, dispatcher).await
}

#[cfg(test)]
mod tests {
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

    #[tokio::test]
    async fn test_line_loop_skips_blank_lines() {
        let input = concat!(
            r#"{"id":"a","method":"tools/list"}"#,
            "\n\n   \n",
            r#"{"id":"b","method":"getProjectInfo","params":{"project_id":"web-app"}}"#,
            "\n",
        );
        let mut channel = LineChannel::new(input.as_bytes(), Vec::new());

        let handled = serve_connection(&mut channel, &dispatcher()).await.unwrap();
        assert_eq!(handled, 2);

        let output = String::from_utf8(channel.into_writer()).unwrap();
        let responses: Vec<McpResponse> = output
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0].id, "a");
        assert!(responses[0].result.is_some());
        assert_eq!(responses[1].error.as_ref().unwrap().code, 5000);
    }

    #[tokio::test]
    async fn test_eof_without_trailing_newline() {
        let input = r#"{"id":"only","method":"tools/list"}"#;
        let mut channel = LineChannel::new(input.as_bytes(), Vec::new());

        assert_eq!(serve_connection(&mut channel, &dispatcher()).await.unwrap(), 1);
    }
}
