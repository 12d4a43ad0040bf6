//! The single game room: rosters, session and word source behind one owner
//!
//! The network layer turns socket activity into three calls, [`GameRoom::connect`],
//! [`GameRoom::receive`] and [`GameRoom::disconnect`]. Each call runs to
//! completion, including any removals it triggers, before the next event is
//! looked at.

use crate::client_manager::{Client, ClientId, ClientManager, NameRejected, Role};
use crate::config::ServerConfig;
use crate::dictionary::{DictionaryError, WordSource};
use crate::error::DisconnectReason;
use crate::game::{GameSession, GuessError, RoundEnd};
use log::{debug, info, warn};
use std::collections::VecDeque;
use std::net::SocketAddr;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;

pub const WELCOME_MSG: &str = "Welcome to our word game. What is your name?";
pub const NAME_PROMPT: &str = "What is your name?";
pub const GUESS_PROMPT: &str = "Your guess?";

/// A client that was removed and whose departure still has to be announced
pub(crate) struct Departure {
    pub client: Client,
    pub reason: DisconnectReason,
    pub held_turn: bool,
}

pub struct GameRoom {
    pub(crate) clients: ClientManager,
    pub(crate) session: GameSession,
    pub(crate) words: Box<dyn WordSource + Send>,
    pub(crate) departures: VecDeque<Departure>,
    /// Turn holder named by the last turn announcement
    pub(crate) announced_turn: Option<ClientId>,
}

impl GameRoom {
    /// Creates the room and picks the first word.
    pub fn new(
        config: &ServerConfig,
        mut words: Box<dyn WordSource + Send>,
    ) -> Result<Self, DictionaryError> {
        let mut session = GameSession::new(config.max_misses);
        session.start_round(words.as_mut())?;

        Ok(Self {
            clients: ClientManager::new(config.max_line_len, config.max_name_len),
            session,
            words,
            departures: VecDeque::new(),
            announced_turn: None,
        })
    }

    pub fn clients(&self) -> &ClientManager {
        &self.clients
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    /// Registers a new connection as pending and sends it the name prompt.
    pub fn connect(&mut self, addr: SocketAddr, outbound: mpsc::Sender<String>) -> ClientId {
        let client_id = self.clients.add_pending(addr, outbound);
        self.send_to(client_id, WELCOME_MSG);
        self.flush_departures();
        client_id
    }

    /// Hands the reader task to the client so it is stopped on removal.
    pub fn attach_reader(&mut self, client_id: ClientId, reader: AbortHandle) {
        if let Err(reader) = self.clients.attach_reader(client_id, reader) {
            reader.abort();
        }
    }

    /// Processes bytes read from a client's socket.
    ///
    /// Every complete line is handled in order; processing stops as soon as
    /// the client is removed. Data for unknown clients is ignored.
    pub fn receive(&mut self, client_id: ClientId, data: &[u8]) {
        if self.clients.role(client_id).is_none() {
            debug!(
                "Ignoring {} bytes for departed client {}",
                data.len(),
                client_id
            );
            return;
        }

        let mut chunk = data;
        loop {
            let line = match self.clients.read_line(client_id, chunk) {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    self.drop_client(client_id, e.into());
                    break;
                }
            };
            chunk = &[];

            match self.clients.role(client_id) {
                Some(Role::Pending) => self.handle_name(client_id, &line),
                Some(Role::Active) => self.handle_guess(client_id, &line),
                None => break,
            }

            if self.clients.role(client_id).is_none() {
                break;
            }
        }

        self.flush_departures();
    }

    /// Removes a client whose connection closed or failed.
    pub fn disconnect(&mut self, client_id: ClientId, reason: DisconnectReason) {
        self.drop_client(client_id, reason);
        self.flush_departures();
    }

    fn handle_name(&mut self, client_id: ClientId, line: &str) {
        match self.clients.promote(client_id, line, &mut self.session) {
            Ok(()) => {
                let name = self.clients.name_of(client_id).unwrap_or_default().to_string();
                self.broadcast(&format!("{} has just joined.", name));
                self.announce_turn();
            }
            Err(NameRejected::NotPending) => {}
            Err(rejection) => {
                debug!("Client {} name rejected: {}", client_id, rejection);
                self.send_to(client_id, &format!("{} {}", rejection, NAME_PROMPT));
            }
        }
    }

    fn handle_guess(&mut self, client_id: ClientId, line: &str) {
        match self.session.submit_guess(client_id, line.trim()) {
            Ok(report) => {
                self.announce_outcome(client_id, report.letter, report.outcome);
                match report.round_end {
                    Some(RoundEnd::Won { winner }) => self.announce_round_end(Some(winner)),
                    Some(RoundEnd::Lost) => self.announce_round_end(None),
                    None => self.announce_turn(),
                }
            }
            Err(GuessError::NotYourTurn) => {
                self.send_to(client_id, &GuessError::NotYourTurn.to_string());
            }
            Err(rejection) => {
                self.send_to(client_id, &rejection.to_string());
                self.send_to(client_id, GUESS_PROMPT);
            }
        }
    }

    /// Takes the client out of the rosters; the departure is announced later
    /// by [`GameRoom::flush_departures`].
    pub(crate) fn drop_client(&mut self, client_id: ClientId, reason: DisconnectReason) {
        let held_turn = self.session.current_player() == Some(client_id);
        if let Some(client) = self.clients.remove(client_id, &mut self.session) {
            self.departures.push_back(Departure {
                client,
                reason,
                held_turn,
            });
        }
    }

    /// Announces queued departures in the order they happened. Announcing may
    /// drop more clients, which are queued and handled in the same pass. If
    /// the turn moved, the new holder is announced once at the end.
    pub(crate) fn flush_departures(&mut self) {
        let mut turn_passed = false;

        loop {
            while let Some(departure) = self.departures.pop_front() {
                let client = &departure.client;
                if departure.reason.is_graceful() {
                    info!(
                        "Client {} ({}) disconnected after {}s",
                        client.id,
                        client.display_name(),
                        client.connected_at.elapsed().as_secs()
                    );
                } else {
                    warn!(
                        "Dropping client {} ({}): {}",
                        client.id,
                        client.display_name(),
                        departure.reason
                    );
                }

                if client.role() == Role::Active {
                    let goodbye = format!("Goodbye {}", client.display_name());
                    self.broadcast(&goodbye);
                    turn_passed |= departure.held_turn;
                }
            }

            if !turn_passed || self.session.current_player() == self.announced_turn {
                break;
            }
            turn_passed = false;
            self.announce_turn();
        }
    }
}
