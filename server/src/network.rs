//! Server network layer handling TCP connections and event loop coordination

use crate::client_manager::ClientId;
use crate::config::ServerConfig;
use crate::dictionary::WordSource;
use crate::error::{DisconnectReason, ServerError};
use crate::room::GameRoom;
use log::{debug, error, info, warn};
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio::sync::mpsc;
use tokio::task::AbortHandle;

/// Largest chunk handed to the event loop per read
const READ_CHUNK: usize = 512;

/// A peer that hangs up with output still unread resets the connection
/// instead of closing it; both are ordinary departures.
fn read_error_reason(e: std::io::Error) -> DisconnectReason {
    match e.kind() {
        ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted => DisconnectReason::Closed,
        _ => DisconnectReason::ReadFailed(e),
    }
}

/// Readiness events sent from connection tasks to the event loop
#[derive(Debug)]
pub enum ServerMessage {
    DataReceived {
        client_id: ClientId,
        data: Vec<u8>,
    },
    ClientClosed {
        client_id: ClientId,
        reason: DisconnectReason,
    },
}

/// Listener plus the game room it feeds
///
/// Only the event loop in [`Server::run`] touches the room. Per-connection
/// reader tasks forward raw bytes to it over a channel and per-connection
/// writer tasks drain each client's outbound queue, so a slow socket never
/// stalls the loop.
pub struct Server {
    listener: TcpListener,
    room: GameRoom,
    outbound_queue: usize,

    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
}

impl Server {
    /// Binds the listening socket and picks the first word.
    pub async fn bind(
        config: &ServerConfig,
        words: Box<dyn WordSource + Send>,
    ) -> Result<Self, ServerError> {
        config.validate()?;
        let addr = config.bind_addr()?;

        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()?
        } else {
            TcpSocket::new_v6()?
        };
        socket.set_reuseaddr(true)?;
        socket
            .bind(addr)
            .map_err(|source| ServerError::Bind { addr, source })?;
        let listener = socket
            .listen(config.backlog)
            .map_err(|source| ServerError::Bind { addr, source })?;
        info!("Server listening on {}", listener.local_addr()?);

        let room = GameRoom::new(config, words)?;
        let (server_tx, server_rx) = mpsc::unbounded_channel();

        Ok(Server {
            listener,
            room,
            outbound_queue: config.outbound_queue,
            server_tx,
            server_rx,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn room(&self) -> &GameRoom {
        &self.room
    }

    /// Spawns the task that forwards everything read from one client
    fn spawn_reader(&self, client_id: ClientId, mut read_half: OwnedReadHalf) -> AbortHandle {
        let server_tx = self.server_tx.clone();

        let task = tokio::spawn(async move {
            let mut buffer = [0u8; READ_CHUNK];

            loop {
                let message = match read_half.read(&mut buffer).await {
                    Ok(0) => ServerMessage::ClientClosed {
                        client_id,
                        reason: DisconnectReason::Closed,
                    },
                    Ok(len) => ServerMessage::DataReceived {
                        client_id,
                        data: buffer[..len].to_vec(),
                    },
                    Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                    Err(e) => ServerMessage::ClientClosed {
                        client_id,
                        reason: read_error_reason(e),
                    },
                };

                let closing = matches!(message, ServerMessage::ClientClosed { .. });
                if server_tx.send(message).is_err() || closing {
                    break;
                }
            }
        });

        task.abort_handle()
    }

    /// Spawns the task that writes one client's outbound queue to its socket
    fn spawn_writer(
        &self,
        client_id: ClientId,
        mut write_half: OwnedWriteHalf,
        mut outbound_rx: mpsc::Receiver<String>,
    ) {
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            while let Some(line) = outbound_rx.recv().await {
                if let Err(e) = write_half.write_all(line.as_bytes()).await {
                    error!("Failed to write to client {}: {}", client_id, e);
                    let _ = server_tx.send(ServerMessage::ClientClosed {
                        client_id,
                        reason: DisconnectReason::WriteFailed,
                    });
                    return;
                }
            }

            // Queue closed: the client was removed, everything queued is flushed.
            if let Err(e) = write_half.shutdown().await {
                debug!("Shutdown of client {} failed: {}", client_id, e);
            }
        });
    }

    /// Wires a new connection into the room as a pending client
    fn handle_accept(&mut self, stream: TcpStream, addr: SocketAddr) {
        if let Err(e) = stream.set_nodelay(true) {
            debug!("Could not set TCP_NODELAY for {}: {}", addr, e);
        }

        let (read_half, write_half) = stream.into_split();
        let (outbound_tx, outbound_rx) = mpsc::channel(self.outbound_queue);

        let client_id = self.room.connect(addr, outbound_tx);
        self.spawn_writer(client_id, write_half, outbound_rx);
        let reader = self.spawn_reader(client_id, read_half);
        self.room.attach_reader(client_id, reader);
    }

    fn handle_message(&mut self, message: ServerMessage) {
        match message {
            ServerMessage::DataReceived { client_id, data } => {
                self.room.receive(client_id, &data);
            }
            ServerMessage::ClientClosed { client_id, reason } => {
                self.room.disconnect(client_id, reason);
            }
        }
    }

    /// Main event loop: accepts connections and dispatches client events, one at a time
    pub async fn run(&mut self) -> Result<(), ServerError> {
        info!("Server started successfully");

        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, addr)) => self.handle_accept(stream, addr),
                        Err(e) if e.kind() == ErrorKind::Interrupted => {}
                        Err(e) => {
                            warn!("Failed to accept connection: {}", e);
                            // Back off briefly, e.g. when out of file descriptors
                            tokio::time::sleep(Duration::from_millis(10)).await;
                        }
                    }
                },

                message = self.server_rx.recv() => {
                    match message {
                        Some(message) => self.handle_message(message),
                        None => {
                            info!("Server shutting down");
                            break;
                        }
                    }
                },
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client_manager::Role;
    use crate::dictionary::WordList;
    use tokio::io::{AsyncBufReadExt, BufReader};
    use tokio_test::assert_ok;

    fn test_config() -> ServerConfig {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            ..ServerConfig::default()
        }
    }

    async fn test_server() -> Server {
        Server::bind(&test_config(), Box::new(WordList::new(["cat"]).unwrap()))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_bind_reports_local_addr() {
        let server = test_server().await;
        let addr = server.local_addr().unwrap();

        assert!(addr.ip().is_loopback());
        assert_ne!(addr.port(), 0);
        assert!(server.room().clients().is_empty());
    }

    #[tokio::test]
    async fn test_bind_rejects_invalid_config() {
        let config = ServerConfig {
            host: "not an ip".to_string(),
            ..test_config()
        };
        let result = Server::bind(&config, Box::new(WordList::new(["cat"]).unwrap())).await;
        assert!(matches!(result, Err(ServerError::Config(_))));
    }

    #[tokio::test]
    async fn test_bind_conflict() {
        let first = test_server().await;
        let config = ServerConfig {
            port: first.local_addr().unwrap().port(),
            ..test_config()
        };

        // A listening socket on the port refuses a second listener
        let result = Server::bind(&config, Box::new(WordList::new(["cat"]).unwrap())).await;
        assert!(matches!(result, Err(ServerError::Bind { .. })));
    }

    #[tokio::test]
    async fn test_accept_sends_welcome_and_registers_pending() {
        let mut server = test_server().await;
        let addr = server.local_addr().unwrap();

        let stream = assert_ok!(TcpStream::connect(addr).await);
        let (accepted, peer) = assert_ok!(server.listener.accept().await);
        server.handle_accept(accepted, peer);

        assert_eq!(server.room().clients().pending_len(), 1);
        let id = server.room().clients().pending_ids()[0];
        assert_eq!(server.room().clients().role(id), Some(Role::Pending));

        let mut lines = BufReader::new(stream).lines();
        let welcome = lines.next_line().await.unwrap().unwrap();
        assert_eq!(welcome.trim_end(), crate::room::WELCOME_MSG);
    }

    #[tokio::test]
    async fn test_reader_reports_data_then_close() {
        let mut server = test_server().await;
        let addr = server.local_addr().unwrap();

        let stream = assert_ok!(TcpStream::connect(addr).await);
        let (accepted, peer) = assert_ok!(server.listener.accept().await);
        server.handle_accept(accepted, peer);

        let mut stream = BufReader::new(stream);
        let mut welcome = String::new();
        assert_ok!(stream.read_line(&mut welcome).await);
        assert_eq!(welcome.trim_end(), crate::room::WELCOME_MSG);

        assert_ok!(stream.get_mut().write_all(b"alice\r\n").await);
        let mut received = Vec::new();
        while received.len() < 7 {
            match server.server_rx.recv().await.unwrap() {
                ServerMessage::DataReceived { data, .. } => received.extend(data),
                other => panic!("Unexpected message: {:?}", other),
            }
        }
        assert_eq!(received, b"alice\r\n");

        drop(stream);
        match server.server_rx.recv().await.unwrap() {
            ServerMessage::ClientClosed { reason, .. } => assert!(reason.is_graceful()),
            other => panic!("Unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_reset_counts_as_graceful_close() {
        for kind in [ErrorKind::ConnectionReset, ErrorKind::ConnectionAborted] {
            let reason = read_error_reason(std::io::Error::from(kind));
            assert!(reason.is_graceful());
        }

        let reason = read_error_reason(std::io::Error::from(ErrorKind::InvalidData));
        assert!(matches!(reason, DisconnectReason::ReadFailed(_)));
        assert!(!reason.is_graceful());
    }

    #[test]
    fn test_client_closed_message() {
        let msg = ServerMessage::ClientClosed {
            client_id: 42,
            reason: DisconnectReason::QueueFull,
        };

        match msg {
            ServerMessage::ClientClosed { client_id, reason } => {
                assert_eq!(client_id, 42);
                assert!(!reason.is_graceful());
            }
            _ => panic!("Unexpected message type"),
        }
    }
}
