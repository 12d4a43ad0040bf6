//! Client registry for the word server
//!
//! This module tracks every connected client from accept to disconnect:
//! - Pending clients, connected but still choosing a display name
//! - Active clients, named and taking part in the turn rotation
//! - Per-client line buffering of raw socket input
//! - Per-client bounded outbound queues drained by writer tasks
//!
//! A client lives in exactly one of the two rosters. Promotion and removal keep
//! the game session's turn order in step with the active roster.

use crate::error::DisconnectReason;
use crate::game::GameSession;
use log::info;
use shared::{frame, LineBuffer, LineError};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::AbortHandle;

/// Connection handle, never reused while the server runs
pub type ClientId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Pending,
    Active,
}

/// Why a requested display name was refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameRejected {
    #[error("Your name cannot be empty.")]
    Empty,
    #[error("Sorry, that name is already taken.")]
    Taken,
    #[error("Your name can be at most {max} characters long.")]
    TooLong { max: usize },
    #[error("You have already chosen a name.")]
    NotPending,
}

/// A connected client and everything needed to talk to it
///
/// Each client holds:
/// - Connection metadata (handle, peer address, connect time)
/// - The display name once registered
/// - Buffered input that has not formed a complete line yet
/// - The sending side of its outbound queue
#[derive(Debug)]
pub struct Client {
    /// Unique connection handle
    pub id: ClientId,
    /// Peer address, for logging
    pub addr: SocketAddr,
    pub connected_at: Instant,
    name: Option<String>,
    role: Role,
    input: LineBuffer,
    outbound: mpsc::Sender<String>,
    reader: Option<AbortHandle>,
}

impl Client {
    /// Creates a pending client with no name and an empty input buffer
    pub fn new(
        id: ClientId,
        addr: SocketAddr,
        max_line_len: usize,
        outbound: mpsc::Sender<String>,
    ) -> Self {
        Self {
            id,
            addr,
            connected_at: Instant::now(),
            name: None,
            role: Role::Pending,
            input: LineBuffer::new(max_line_len),
            outbound,
            reader: None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Name for messages and logs, falling back to the peer address
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => self.addr.to_string(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Queues one line of text for delivery without waiting on the socket.
    ///
    /// A full queue means the peer stopped reading; a closed queue means the
    /// writer task already failed. Either way the client should be dropped.
    pub fn send(&self, text: &str) -> Result<(), DisconnectReason> {
        self.outbound.try_send(frame(text)).map_err(|e| match e {
            TrySendError::Full(_) => DisconnectReason::QueueFull,
            TrySendError::Closed(_) => DisconnectReason::WriteFailed,
        })
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        // Stops the reader task; the writer ends once the queue sender is gone.
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
    }
}

/// Holds the pending and active rosters
///
/// Rosters are keyed by connection handle. Handles are allocated from a
/// counter so a stale event for a departed client can never hit a newer one.
pub struct ClientManager {
    pending: BTreeMap<ClientId, Client>,
    active: BTreeMap<ClientId, Client>,
    next_client_id: ClientId,
    max_line_len: usize,
    max_name_len: usize,
}

impl ClientManager {
    pub fn new(max_line_len: usize, max_name_len: usize) -> Self {
        Self {
            pending: BTreeMap::new(),
            active: BTreeMap::new(),
            next_client_id: 1,
            max_line_len,
            max_name_len,
        }
    }

    /// Registers a freshly accepted connection as pending
    pub fn add_pending(&mut self, addr: SocketAddr, outbound: mpsc::Sender<String>) -> ClientId {
        let client_id = self.next_client_id;
        self.next_client_id += 1;

        let client = Client::new(client_id, addr, self.max_line_len, outbound);
        info!("Client {} connected from {}", client_id, addr);
        self.pending.insert(client_id, client);

        client_id
    }

    /// Ties the client's reader task to its lifetime.
    ///
    /// Hands the task back if the client is already gone.
    pub fn attach_reader(
        &mut self,
        client_id: ClientId,
        reader: AbortHandle,
    ) -> Result<(), AbortHandle> {
        match self.get_mut(client_id) {
            Some(client) => {
                client.reader = Some(reader);
                Ok(())
            }
            None => Err(reader),
        }
    }

    /// Feeds bytes into the client's input buffer and takes one complete line.
    ///
    /// Pass an empty slice to take further lines already buffered. Returns
    /// `Ok(None)` when more input is needed or the client is unknown.
    pub fn read_line(
        &mut self,
        client_id: ClientId,
        data: &[u8],
    ) -> Result<Option<String>, LineError> {
        let Some(client) = self.get_mut(client_id) else {
            return Ok(None);
        };

        if !data.is_empty() {
            client.input.push(data)?;
        }
        client.input.next_line()
    }

    /// Moves a pending client into the active roster under `name`.
    ///
    /// The name is trimmed, must be non-empty, no longer than the configured
    /// limit and not used by any active client (exact, case-sensitive match).
    /// On rejection nothing changes and the client stays pending.
    pub fn promote(
        &mut self,
        client_id: ClientId,
        name: &str,
        session: &mut GameSession,
    ) -> Result<(), NameRejected> {
        let name = name.trim();
        if name.is_empty() {
            return Err(NameRejected::Empty);
        }
        if name.chars().count() > self.max_name_len {
            return Err(NameRejected::TooLong {
                max: self.max_name_len,
            });
        }
        if self.name_taken(name) {
            return Err(NameRejected::Taken);
        }

        let Some(mut client) = self.pending.remove(&client_id) else {
            return Err(NameRejected::NotPending);
        };

        client.name = Some(name.to_string());
        client.role = Role::Active;
        info!("Client {} joined the game as '{}'", client_id, name);
        self.active.insert(client_id, client);
        session.add_player(client_id);

        Ok(())
    }

    /// Removes a client from whichever roster holds it.
    ///
    /// Active clients also leave the turn order; if they held the turn it
    /// passes to the next player. Returns the removed client, or `None` if it
    /// was already gone.
    pub fn remove(&mut self, client_id: ClientId, session: &mut GameSession) -> Option<Client> {
        if let Some(client) = self.pending.remove(&client_id) {
            return Some(client);
        }

        let client = self.active.remove(&client_id)?;
        session.remove_player(client_id);
        Some(client)
    }

    pub fn get(&self, client_id: ClientId) -> Option<&Client> {
        self.active
            .get(&client_id)
            .or_else(|| self.pending.get(&client_id))
    }

    fn get_mut(&mut self, client_id: ClientId) -> Option<&mut Client> {
        match self.active.get_mut(&client_id) {
            Some(client) => Some(client),
            None => self.pending.get_mut(&client_id),
        }
    }

    pub fn role(&self, client_id: ClientId) -> Option<Role> {
        self.get(client_id).map(Client::role)
    }

    pub fn name_of(&self, client_id: ClientId) -> Option<&str> {
        self.active.get(&client_id).and_then(Client::name)
    }

    pub fn name_taken(&self, name: &str) -> bool {
        self.active.values().any(|client| client.name() == Some(name))
    }

    /// Snapshot of active handles, safe to iterate while removing clients
    pub fn active_ids(&self) -> Vec<ClientId> {
        self.active.keys().copied().collect()
    }

    pub fn pending_ids(&self) -> Vec<ClientId> {
        self.pending.keys().copied().collect()
    }

    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Total number of connected clients
    pub fn len(&self) -> usize {
        self.active.len() + self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty() && self.pending.is_empty()
    }
}
