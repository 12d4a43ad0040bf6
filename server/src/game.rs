//! Authoritative word-guessing state: hidden word, guesses, misses and turn order
//!
//! The session is a small state machine:
//!
//! ```text
//! AwaitingPlayers --first player--> InProgress --solved / out of guesses--> RoundOver
//!        ^                               |                                      |
//!        +-------- roster empties -------+<----------- start_round -------------+
//! ```
//!
//! Every mutation happens on the event-loop task, so nothing here is shared or locked.

use crate::client_manager::ClientId;
use crate::dictionary::{DictionaryError, WordSource};
use log::{debug, info};
use shared::HIDDEN_LETTER;
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    AwaitingPlayers,
    InProgress,
    RoundOver,
}

/// Rejections reported back to the player who sent the guess
///
/// None of these mutate the session or consume the player's turn.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuessError {
    #[error("It is not your turn to guess.")]
    NotYourTurn,
    #[error("Invalid guess. Please enter a single letter from a to z.")]
    InvalidGuess,
    #[error("The letter '{0}' has already been guessed. Try again.")]
    AlreadyGuessed(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuessOutcome {
    Correct,
    Incorrect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundEnd {
    Won { winner: ClientId },
    Lost,
}

/// Result of a novel guess
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuessReport {
    pub player: ClientId,
    pub letter: char,
    pub outcome: GuessOutcome,
    pub round_end: Option<RoundEnd>,
}

/// Cyclic turn order over the active players
///
/// `current` is `None` exactly when the order is empty. New players are
/// inserted right before the current turn holder so the running rotation is
/// untouched and the newcomer plays last in it.
#[derive(Debug, Default)]
pub struct TurnOrder {
    order: Vec<ClientId>,
    current: Option<usize>,
}

impl TurnOrder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<ClientId> {
        self.current.map(|index| self.order[index])
    }

    pub fn contains(&self, id: ClientId) -> bool {
        self.order.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Players in rotation order, starting with the current turn holder
    pub fn rotation(&self) -> Vec<ClientId> {
        match self.current {
            Some(index) => self.order[index..]
                .iter()
                .chain(self.order[..index].iter())
                .copied()
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn insert(&mut self, id: ClientId) {
        if self.contains(id) {
            return;
        }

        match self.current {
            Some(index) => {
                self.order.insert(index, id);
                self.current = Some(index + 1);
            }
            None => {
                self.order.push(id);
                self.current = Some(self.order.len() - 1);
            }
        }
    }

    /// Removes a player; if they held the turn it passes to the next player.
    ///
    /// Returns false if the player was not in the rotation.
    pub fn remove(&mut self, id: ClientId) -> bool {
        let Some(position) = self.order.iter().position(|&other| other == id) else {
            return false;
        };
        self.order.remove(position);

        self.current = match self.current {
            _ if self.order.is_empty() => None,
            Some(index) if position < index => Some(index - 1),
            Some(index) if position == index => Some(index % self.order.len()),
            other => other,
        };
        true
    }

    pub fn advance(&mut self) -> Option<ClientId> {
        self.current = match self.current {
            _ if self.order.is_empty() => None,
            Some(index) => Some((index + 1) % self.order.len()),
            None => Some(0),
        };
        self.current()
    }
}

#[derive(Debug)]
pub struct GameSession {
    word: String,
    guessed: BTreeSet<char>,
    misses: u32,
    max_misses: u32,
    turns: TurnOrder,
    phase: Phase,
    round: u32,
}

impl GameSession {
    /// Creates a session with no word yet; call [`GameSession::start_round`]
    /// before accepting guesses.
    pub fn new(max_misses: u32) -> Self {
        Self {
            word: String::new(),
            guessed: BTreeSet::new(),
            misses: 0,
            max_misses: max_misses.max(1),
            turns: TurnOrder::new(),
            phase: Phase::AwaitingPlayers,
            round: 0,
        }
    }

    /// Picks a fresh word and resets guesses and misses. Turn order is kept.
    pub fn start_round(&mut self, words: &mut dyn WordSource) -> Result<(), DictionaryError> {
        let word = words.next_word(words.len())?;
        self.begin_round(&word);
        Ok(())
    }

    /// Starts a round on a known word
    pub fn begin_round(&mut self, word: &str) {
        self.word = word.to_ascii_lowercase();
        self.guessed.clear();
        self.misses = 0;
        self.round += 1;
        self.phase = if self.turns.is_empty() {
            Phase::AwaitingPlayers
        } else {
            Phase::InProgress
        };
        debug!("Round {} started with word '{}'", self.round, self.word);
    }

    pub fn add_player(&mut self, id: ClientId) {
        self.turns.insert(id);
        if self.phase == Phase::AwaitingPlayers && !self.word.is_empty() {
            self.phase = Phase::InProgress;
        }
    }

    /// Drops a player from the rotation, passing the turn on if they held it.
    pub fn remove_player(&mut self, id: ClientId) -> bool {
        let removed = self.turns.remove(id);
        if self.turns.is_empty() && self.phase == Phase::InProgress {
            info!("No players left, waiting for players");
            self.phase = Phase::AwaitingPlayers;
        }
        removed
    }

    pub fn advance_turn(&mut self) -> Option<ClientId> {
        let next = self.turns.advance();
        if next.is_none() {
            self.phase = Phase::AwaitingPlayers;
        }
        next
    }

    /// Applies a guess from `player`.
    ///
    /// `input` must be a single letter; case is ignored. A novel guess always
    /// passes the turn on, whether or not it hit.
    pub fn submit_guess(
        &mut self,
        player: ClientId,
        input: &str,
    ) -> Result<GuessReport, GuessError> {
        if self.phase != Phase::InProgress || self.turns.current() != Some(player) {
            return Err(GuessError::NotYourTurn);
        }

        let letter = normalize_guess(input)?;
        if !self.guessed.insert(letter) {
            return Err(GuessError::AlreadyGuessed(letter));
        }

        let outcome = if self.word.contains(letter) {
            GuessOutcome::Correct
        } else {
            self.misses += 1;
            GuessOutcome::Incorrect
        };
        debug!(
            "Player {} guessed '{}': {:?} ({} of {} misses)",
            player, letter, outcome, self.misses, self.max_misses
        );

        self.turns.advance();

        let round_end = if self.is_solved() {
            Some(RoundEnd::Won { winner: player })
        } else if self.misses >= self.max_misses {
            Some(RoundEnd::Lost)
        } else {
            None
        };
        if round_end.is_some() {
            self.phase = Phase::RoundOver;
        }

        Ok(GuessReport {
            player,
            letter,
            outcome,
            round_end,
        })
    }

    /// The word with every unguessed letter replaced by [`HIDDEN_LETTER`]
    pub fn mask(&self) -> String {
        self.word
            .chars()
            .map(|c| {
                if self.guessed.contains(&c) {
                    c
                } else {
                    HIDDEN_LETTER
                }
            })
            .collect()
    }

    pub fn is_solved(&self) -> bool {
        !self.word.is_empty() && self.word.chars().all(|c| self.guessed.contains(&c))
    }

    pub fn word(&self) -> &str {
        &self.word
    }

    pub fn guessed_letters(&self) -> impl Iterator<Item = char> + '_ {
        self.guessed.iter().copied()
    }

    pub fn misses(&self) -> u32 {
        self.misses
    }

    pub fn guesses_remaining(&self) -> u32 {
        self.max_misses.saturating_sub(self.misses)
    }

    pub fn current_player(&self) -> Option<ClientId> {
        self.turns.current()
    }

    pub fn turns(&self) -> &TurnOrder {
        &self.turns
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn round(&self) -> u32 {
        self.round
    }
}

fn normalize_guess(input: &str) -> Result<char, GuessError> {
    let mut chars = input.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphabetic() => Ok(c.to_ascii_lowercase()),
        _ => Err(GuessError::InvalidGuess),
    }
}
