//! # Word Game Server Library
//!
//! This library provides the server for a multiplayer, turn-based word guessing
//! game played over plain TCP text connections. It owns the canonical game state,
//! processes one guess at a time from whoever holds the turn, and broadcasts the
//! result to every named player.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Game State
//! The server picks the secret word, tracks which letters have been tried and
//! how many wrong guesses remain, and decides when a round is won or lost.
//! Clients only ever see the masked word and the messages the server sends.
//!
//! ### Client Management
//! Handles the complete lifecycle of a connection:
//! - Welcome message and name prompt on accept
//! - Name validation and promotion from the pending to the active roster
//! - Joining the turn rotation at the back of the current round
//! - Disconnection cleanup, with the turn handed on if the leaver held it
//!
//! ### Broadcasting
//! Every game event (joins, guesses, verdicts, round ends and departures) is
//! announced to the active roster. A client that cannot keep up is removed
//! without disturbing delivery to the others.
//!
//! ## Architecture Design
//!
//! ### Single Event Loop
//! One task owns the [`room::GameRoom`] and handles accepts, received bytes and
//! closures strictly in sequence. Game state is never shared or locked; the
//! reader and writer tasks spawned per connection talk to the loop only through
//! channels.
//!
//! ### Line Protocol
//! Input is buffered per client until a network newline arrives, so a line may
//! be split across reads and a read may carry several lines. Each line is
//! either a name (pending clients) or a guess (active clients). Lines longer
//! than the configured limit disconnect the sender.
//!
//! ## Module Organization
//!
//! ### Client Manager Module (`client_manager`)
//! Pending and active rosters, per-client input buffers and outbound queues.
//!
//! ### Game Module (`game`)
//! Word, guessed letters, miss counter and the turn rotation. Pure state, no I/O.
//!
//! ### Room and Broadcast Modules (`room`, `broadcast`)
//! Glue between the two: routes each line to the right handler and turns game
//! outcomes into messages.
//!
//! ### Network Module (`network`)
//! TCP listener, per-connection tasks and the event loop itself.
//!
//! ### Support Modules (`config`, `dictionary`, `error`)
//! TOML configuration, the word list and the error types shared by the above.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::dictionary::WordList;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::default();
//!     let words = WordList::from_file("/usr/share/dict/words")?;
//!
//!     // Bind the listener and choose the first word
//!     let mut server = Server::bind(&config, Box::new(words)).await?;
//!
//!     // Accept players and run rounds until the process is stopped
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod broadcast;
pub mod client_manager;
pub mod config;
pub mod dictionary;
pub mod error;
pub mod game;
pub mod network;
pub mod room;
