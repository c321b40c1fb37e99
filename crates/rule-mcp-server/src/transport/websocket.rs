//! WebSocket transport (`GET /mcp/ws`)

use super::{run_connection, EnvelopeChannel, TransportError};
use crate::transport::http::AppState;
use async_trait::async_trait;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};

/// Upgrade the request and serve the socket until it closes
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let dispatcher = state.dispatcher.clone();
    ws.on_upgrade(move |socket| run_connection(WsChannel::new(socket), dispatcher, "websocket"))
}

/// [`EnvelopeChannel`] over an upgraded socket. Each text frame is one envelope.
pub struct WsChannel {
    socket: WebSocket,
}

impl WsChannel {
    pub fn new(socket: WebSocket) -> Self {
        Self { socket }
    }
}

#[async_trait]
impl EnvelopeChannel for WsChannel {
    async fn recv(&mut self) -> Result<Option<String>, TransportError> {
        loop {
            let message = match self.socket.recv().await {
                None => return Ok(None),
                Some(Err(e)) => return Err(TransportError::Read(e.to_string())),
                Some(Ok(message)) => message,
            };

            match message {
                Message::Text(text) => return Ok(Some(text)),
                Message::Binary(bytes) => {
                    return String::from_utf8(bytes)
                        .map(Some)
                        .map_err(|e| TransportError::Read(format!("binary frame: {}", e)));
                }
                Message::Close(_) => return Ok(None),
                // control frames are answered by the socket itself
                Message::Ping(_) | Message::Pong(_) => continue,
            }
        }
    }

    async fn send(&mut self, frame: String) -> Result<(), TransportError> {
        self.socket
            .send(Message::Text(frame))
            .await
            .map_err(|e| TransportError::Write(e.to_string()))
    }
}
