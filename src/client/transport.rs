//! Trait abstraction for the hub link to enable testing

use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::debug;

use super::endpoint::Endpoint;
use crate::error::{RelayError, Result};

/// One open connection to the hub carrying text frames.
#[async_trait]
pub trait RelayLink: Send {
    /// Send one text frame
    async fn send_text(&mut self, text: String) -> Result<()>;

    /// Next text frame; `None` once the hub closed the link
    async fn next_text(&mut self) -> Option<Result<String>>;
}

/// Opens links to the hub.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn RelayLink>>;
}

/// [`Connector`] for real `ws://` / `wss://` hubs.
#[derive(Debug, Clone)]
pub struct WebSocketConnector {
    endpoint: Endpoint,
    timeout: Duration,
}

impl WebSocketConnector {
    #[must_use]
    pub fn new(endpoint: Endpoint, timeout: Duration) -> Self {
        Self { endpoint, timeout }
    }

    #[must_use]
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }
}

#[async_trait]
impl Connector for WebSocketConnector {
    async fn connect(&self) -> Result<Box<dyn RelayLink>> {
        debug!("Connecting to {}", self.endpoint);
        let connecting = tokio_tungstenite::connect_async(self.endpoint.url());
        let (stream, _) = tokio::time::timeout(self.timeout, connecting)
            .await
            .map_err(|_| {
                RelayError::Transport(format!(
                    "connecting to {} timed out after {:?}",
                    self.endpoint, self.timeout
                ))
            })?
            .map_err(|e| RelayError::Transport(format!("connecting to {}: {}", self.endpoint, e)))?;
        Ok(Box::new(WebSocketLink { stream }))
    }
}

/// [`RelayLink`] over a tungstenite stream.
pub struct WebSocketLink {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl RelayLink for WebSocketLink {
    async fn send_text(&mut self, text: String) -> Result<()> {
        self.stream.send(Message::Text(text)).await?;
        Ok(())
    }

    async fn next_text(&mut self) -> Option<Result<String>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text)),
                Ok(Message::Close(_)) => return None,
                Ok(Message::Binary(_)) => debug!("Ignoring binary frame from hub"),
                Ok(_) => {}
                Err(e) => return Some(Err(e.into())),
            }
        }
    }
}
