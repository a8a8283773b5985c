//! # Hub Server
//!
//! Network front-end of the relay hub.
//!
//! ```text
//!  TcpListener (plain) ──┐
//!                        ├─► connection task ──► reader ──► HubCommand ──► hub task (owns RelayHub)
//!  TcpListener + TLS  ───┘         ▲                                            │
//!                                  └──── writer ◄── bounded mpsc queue ◄────────┘
//! ```
//!
//! One task owns the [`RelayHub`] and applies commands in arrival order, so
//! registry updates are serialized without locks. Each connection runs a
//! reader loop and a writer task; writes are time-boxed so a stalled socket
//! is closed instead of holding frames forever.

use std::fs::File;
use std::io::BufReader;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval, timeout, MissedTickBehavior};
use tokio_rustls::rustls::ServerConfig;
use tokio_rustls::TlsAcceptor;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::{ConnectionId, Outbound, RelayHub};
use crate::config::{HubConfig, TlsConfig};
use crate::error::{RelayError, Result};

/// Commands queued to the hub task before connection tasks block.
pub const HUB_COMMAND_QUEUE: usize = 1024;

enum HubCommand {
    Accept {
        addr: SocketAddr,
        tx: Outbound,
        reply: oneshot::Sender<ConnectionId>,
    },
    Message {
        id: ConnectionId,
        text: String,
    },
    Disconnect {
        id: ConnectionId,
    },
}

/// Settings every connection task needs.
#[derive(Debug, Clone, Copy)]
struct ConnectionSettings {
    queue: usize,
    send_timeout: Duration,
}

struct SecureListener {
    listener: TcpListener,
    acceptor: TlsAcceptor,
}

/// Bound hub listeners, ready to [`run`](HubServer::run).
pub struct HubServer {
    config: HubConfig,
    plain: TcpListener,
    secure: Option<SecureListener>,
}

impl HubServer {
    /// Binds the plaintext listener and, when configured, the TLS listener.
    ///
    /// # Errors
    ///
    /// Returns an error if a port cannot be bound or the TLS material is
    /// missing or invalid.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use motion_relay::config::HubConfig;
    /// use motion_relay::hub::HubServer;
    /// use tokio_util::sync::CancellationToken;
    ///
    /// #[tokio::main]
    /// async fn main() -> anyhow::Result<()> {
    ///     let server = HubServer::bind(HubConfig::default()).await?;
    ///     server.run(CancellationToken::new()).await?;
    ///     Ok(())
    /// }
    /// ```
    pub async fn bind(config: HubConfig) -> Result<Self> {
        let plain = TcpListener::bind((config.host.as_str(), config.port)).await?;
        info!("Hub listening on ws://{}", plain.local_addr()?);

        let secure = match &config.tls {
            Some(tls) => {
                let acceptor = load_tls_acceptor(tls)?;
                let listener = TcpListener::bind((config.host.as_str(), tls.port)).await?;
                info!("Hub listening on wss://{}", listener.local_addr()?);
                Some(SecureListener { listener, acceptor })
            }
            None => None,
        };

        Ok(Self {
            config,
            plain,
            secure,
        })
    }

    /// Address of the plaintext listener.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.plain.local_addr()?)
    }

    /// Address of the TLS listener, if one is bound.
    pub fn secure_addr(&self) -> Option<SocketAddr> {
        self.secure.as_ref().and_then(|s| s.listener.local_addr().ok())
    }

    /// Accepts connections until `cancel` fires, then closes every connection.
    ///
    /// # Errors
    ///
    /// Returns an error only if the hub task itself panicked.
    pub async fn run(self, cancel: CancellationToken) -> Result<()> {
        let (commands, command_rx) = mpsc::channel(HUB_COMMAND_QUEUE);
        let hub_task = tokio::spawn(run_hub(
            command_rx,
            self.config.snapshot_interval(),
            cancel.clone(),
        ));
        let settings = ConnectionSettings {
            queue: self.config.outbound_queue,
            send_timeout: self.config.send_timeout(),
        };

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,

                accepted = self.plain.accept() => match accepted {
                    Ok((stream, addr)) => {
                        configure_stream(&stream);
                        tokio::spawn(serve_connection(stream, addr, commands.clone(), settings, cancel.child_token()));
                    }
                    Err(e) => warn!("Failed to accept connection: {}", e),
                },

                accepted = accept_secure(&self.secure) => match accepted {
                    Ok((stream, addr, acceptor)) => {
                        configure_stream(&stream);
                        let commands = commands.clone();
                        let cancel = cancel.child_token();
                        tokio::spawn(async move {
                            match acceptor.accept(stream).await {
                                Ok(tls) => serve_connection(tls, addr, commands, settings, cancel).await,
                                Err(e) => warn!("TLS handshake with {} failed: {}", addr, e),
                            }
                        });
                    }
                    Err(e) => warn!("Failed to accept TLS connection: {}", e),
                },
            }
        }

        info!("Hub shutting down");
        drop(commands);
        hub_task
            .await
            .map_err(|e| RelayError::Transport(format!("hub task failed: {}", e)))
    }
}

/// Loads the certificate chain and private key for the TLS listener.
///
/// # Errors
///
/// Returns [`RelayError::Io`] if a file cannot be read and
/// [`RelayError::Tls`] if it holds no usable certificate or key.
pub fn load_tls_acceptor(tls: &TlsConfig) -> Result<TlsAcceptor> {
    let certs = rustls_pemfile::certs(&mut BufReader::new(File::open(&tls.cert_path)?))
        .collect::<std::io::Result<Vec<_>>>()?;
    if certs.is_empty() {
        return Err(RelayError::Tls(format!(
            "no certificates found in {}",
            tls.cert_path.display()
        )));
    }

    let key = rustls_pemfile::private_key(&mut BufReader::new(File::open(&tls.key_path)?))?
        .ok_or_else(|| {
            RelayError::Tls(format!("no private key found in {}", tls.key_path.display()))
        })?;

    let provider = Arc::new(tokio_rustls::rustls::crypto::ring::default_provider());
    let config = ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| RelayError::Tls(e.to_string()))?
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(|e| RelayError::Tls(e.to_string()))?;

    Ok(TlsAcceptor::from(Arc::new(config)))
}

async fn accept_secure(
    secure: &Option<SecureListener>,
) -> std::io::Result<(TcpStream, SocketAddr, TlsAcceptor)> {
    match secure {
        Some(secure) => {
            let (stream, addr) = secure.listener.accept().await?;
            Ok((stream, addr, secure.acceptor.clone()))
        }
        None => std::future::pending().await,
    }
}

fn configure_stream(stream: &TcpStream) {
    if let Err(e) = stream.set_nodelay(true) {
        debug!("Failed to set TCP_NODELAY: {}", e);
    }
}

/// Owns the registry. Exits when every command sender is gone or on cancel.
async fn run_hub(
    mut commands: mpsc::Receiver<HubCommand>,
    snapshot_interval: Duration,
    cancel: CancellationToken,
) {
    let mut hub = RelayHub::new();
    let mut snapshots = interval(snapshot_interval);
    snapshots.set_missed_tick_behavior(MissedTickBehavior::Delay);
    snapshots.tick().await;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,

            command = commands.recv() => match command {
                Some(HubCommand::Accept { addr, tx, reply }) => {
                    let id = hub.accept(addr, tx);
                    if reply.send(id).is_err() {
                        hub.disconnect(id);
                    }
                }
                Some(HubCommand::Message { id, text }) => {
                    hub.on_message(id, &text);
                }
                Some(HubCommand::Disconnect { id }) => {
                    hub.disconnect(id);
                }
                None => break,
            },

            _ = snapshots.tick() => hub.snapshot().log(),
        }
    }

    hub.shutdown();
}

/// Runs one WebSocket connection over any byte stream (plain or TLS).
async fn serve_connection<S>(
    stream: S,
    addr: SocketAddr,
    commands: mpsc::Sender<HubCommand>,
    settings: ConnectionSettings,
    cancel: CancellationToken,
) where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let ws = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!("WebSocket handshake with {} failed: {}", addr, e);
            return;
        }
    };
    let (sink, mut source) = ws.split();

    let (tx, rx) = mpsc::channel(settings.queue);
    let (reply, assigned) = oneshot::channel();
    if commands.send(HubCommand::Accept { addr, tx, reply }).await.is_err() {
        return;
    }
    let Ok(id) = assigned.await else {
        return;
    };

    let writer = spawn_writer(sink, rx, settings.send_timeout, id, cancel.clone());

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,

            message = source.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    if commands.send(HubCommand::Message { id, text }).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Binary(_))) => {
                    warn!("Ignoring binary frame from {}", id);
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!("Read error on {}: {}", id, e);
                    break;
                }
            },
        }
    }

    let _ = commands.send(HubCommand::Disconnect { id }).await;
    cancel.cancel();
    if let Err(e) = writer.await {
        error!("Writer task for {} failed: {}", id, e);
    }
}

/// Drains the outbound queue into the socket until the queue closes,
/// a write fails or times out, or the connection is cancelled.
fn spawn_writer<W>(
    mut sink: W,
    mut rx: mpsc::Receiver<Arc<str>>,
    send_timeout: Duration,
    id: ConnectionId,
    cancel: CancellationToken,
) -> JoinHandle<()>
where
    W: futures_util::Sink<Message, Error = tokio_tungstenite::tungstenite::Error> + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        loop {
            let frame = tokio::select! {
                _ = cancel.cancelled() => break,
                frame = rx.recv() => match frame {
                    Some(frame) => frame,
                    None => break,
                },
            };

            match timeout(send_timeout, sink.send(Message::Text(frame.to_string()))).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    debug!("Write error on {}: {}", id, e);
                    break;
                }
                Err(_) => {
                    warn!("Send to {} timed out after {:?}, closing", id, send_timeout);
                    break;
                }
            }
        }

        cancel.cancel();
        let _ = timeout(send_timeout, sink.close()).await;
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;
    use tokio::time::sleep;
    use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

    type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

    const SENSOR_FRAME: &str =
        r#"{"type":"sensor_data","data":{"orientation":{"alpha":0,"beta":12.5,"gamma":-3}}}"#;

    fn test_config() -> HubConfig {
        HubConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            ..HubConfig::default()
        }
    }

    async fn start_hub() -> (SocketAddr, CancellationToken, JoinHandle<Result<()>>) {
        let server = HubServer::bind(test_config()).await.unwrap();
        let addr = server.local_addr().unwrap();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(server.run(cancel.clone()));
        (addr, cancel, handle)
    }

    async fn connect(addr: SocketAddr) -> Client {
        let (ws, _) = connect_async(format!("ws://{}", addr)).await.unwrap();
        ws
    }

    async fn register(client: &mut Client, name: &str) {
        let frame = format!(r#"{{"type":"register","deviceId":"{}","timestamp":0,"name":"{}"}}"#, name, name);
        client.send(Message::Text(frame)).await.unwrap();
        // Let the hub task apply the registration before the next step
        sleep(Duration::from_millis(100)).await;
    }

    async fn next_text(client: &mut Client) -> Option<String> {
        loop {
            match timeout(Duration::from_millis(500), client.next()).await {
                Ok(Some(Ok(Message::Text(text)))) => return Some(text),
                Ok(Some(Ok(_))) => continue,
                _ => return None,
            }
        }
    }

    fn parsed(text: &str) -> serde_json::Value {
        serde_json::from_str(text).unwrap()
    }

    // ==================== Listener Tests ====================

    #[tokio::test]
    async fn test_bind_ephemeral_port() {
        let server = HubServer::bind(test_config()).await.unwrap();
        assert_ne!(server.local_addr().unwrap().port(), 0);
        assert!(server.secure_addr().is_none());
    }

    #[tokio::test]
    async fn test_bind_fails_with_missing_tls_material() {
        let config = HubConfig {
            tls: Some(TlsConfig {
                port: 0,
                cert_path: PathBuf::from("/nonexistent/cert.pem"),
                key_path: PathBuf::from("/nonexistent/key.pem"),
            }),
            ..test_config()
        };
        assert!(matches!(HubServer::bind(config).await, Err(RelayError::Io(_))));
    }

    #[test]
    fn test_tls_rejects_empty_pem() {
        let mut cert = NamedTempFile::new().unwrap();
        cert.write_all(b"not a certificate\n").unwrap();
        let key = NamedTempFile::new().unwrap();

        let result = load_tls_acceptor(&TlsConfig {
            port: 0,
            cert_path: cert.path().to_path_buf(),
            key_path: key.path().to_path_buf(),
        });
        assert!(matches!(result, Err(RelayError::Tls(_))));
    }

    // ==================== End-to-end Tests ====================

    #[tokio::test]
    async fn test_relay_between_clients() {
        let (addr, cancel, handle) = start_hub().await;

        let mut alice = connect(addr).await;
        register(&mut alice, "alice").await;
        let mut bob = connect(addr).await;
        register(&mut bob, "bob").await;
        let mut phone = connect(addr).await;

        let join = next_text(&mut alice).await.unwrap();
        assert_eq!(parsed(&join)["type"], "join");
        assert_eq!(parsed(&join)["name"], "bob");

        phone.send(Message::Text(SENSOR_FRAME.to_string())).await.unwrap();
        assert_eq!(next_text(&mut alice).await.as_deref(), Some(SENSOR_FRAME));
        assert_eq!(next_text(&mut bob).await.as_deref(), Some(SENSOR_FRAME));

        // The unregistered phone leaving is silent; alice leaving is not
        phone.close(None).await.unwrap();
        alice.close(None).await.unwrap();

        let leave = next_text(&mut bob).await.unwrap();
        assert_eq!(parsed(&leave)["type"], "leave");
        assert_eq!(parsed(&leave)["name"], "alice");
        assert!(next_text(&mut bob).await.is_none());

        cancel.cancel();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_malformed_frame_keeps_connection_open() {
        let (addr, cancel, handle) = start_hub().await;

        let mut sender = connect(addr).await;
        let mut receiver = connect(addr).await;
        sleep(Duration::from_millis(50)).await;

        sender.send(Message::Text("{oops".to_string())).await.unwrap();
        sender.send(Message::Text(r#"{"type":"nope"}"#.to_string())).await.unwrap();
        sender.send(Message::Text(SENSOR_FRAME.to_string())).await.unwrap();

        assert_eq!(next_text(&mut receiver).await.as_deref(), Some(SENSOR_FRAME));

        cancel.cancel();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_closes_connections() {
        let (addr, cancel, handle) = start_hub().await;
        let mut client = connect(addr).await;
        sleep(Duration::from_millis(50)).await;

        cancel.cancel();
        handle.await.unwrap().unwrap();

        let closed = timeout(Duration::from_secs(2), async {
            loop {
                match client.next().await {
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                    Some(Ok(_)) => continue,
                }
            }
        })
        .await;
        assert!(closed.is_ok(), "client should observe the close");
    }
}
