//! Outbound messaging for the game room
//!
//! Delivery never blocks: text is pushed onto each client's bounded queue and
//! a client whose queue is full or closed is dropped on the spot. Broadcasts
//! iterate over a snapshot of the active roster, so a removal part way through
//! does not disturb delivery to everyone else.

use crate::client_manager::ClientId;
use crate::game::GuessOutcome;
use crate::room::{GameRoom, GUESS_PROMPT};
use log::{error, info, warn};
use shared::NETWORK_NEWLINE;

impl GameRoom {
    /// Sends `text` to every active client.
    pub fn broadcast(&mut self, text: &str) {
        for client_id in self.clients.active_ids() {
            self.send_to(client_id, text);
        }
    }

    /// Sends `text` to every active client except `skip`.
    pub fn broadcast_except(&mut self, skip: ClientId, text: &str) {
        for client_id in self.clients.active_ids() {
            if client_id != skip {
                self.send_to(client_id, text);
            }
        }
    }

    /// Sends `text` to one client, pending or active, dropping it on failure.
    pub fn send_to(&mut self, client_id: ClientId, text: &str) {
        let result = match self.clients.get(client_id) {
            Some(client) => client.send(text),
            None => return,
        };

        if let Err(reason) = result {
            warn!("Write to client {} failed: {}", client_id, reason);
            self.drop_client(client_id, reason);
        }
    }

    /// Broadcasts the game status and whose turn it is, then prompts the
    /// turn holder for a guess.
    pub fn announce_turn(&mut self) {
        if self.session.current_player().is_none() {
            self.announced_turn = None;
            return;
        }

        let status = self.status_message();
        self.broadcast(&status);

        // The status broadcast may have dropped the turn holder.
        let Some(current) = self.session.current_player() else {
            self.announced_turn = None;
            return;
        };
        self.announced_turn = Some(current);
        let name = self.clients.name_of(current).unwrap_or_default().to_string();

        self.broadcast_except(current, &format!("It's {}'s turn.", name));
        self.send_to(current, "It's your turn.");
        self.send_to(current, GUESS_PROMPT);
    }

    /// Tells everyone what `client_id` guessed and whether it was in the word.
    pub fn announce_outcome(&mut self, client_id: ClientId, letter: char, outcome: GuessOutcome) {
        let name = self.clients.name_of(client_id).unwrap_or_default().to_string();
        let verdict = match outcome {
            GuessOutcome::Correct => format!("{} is in the word.", letter),
            GuessOutcome::Incorrect => format!("{} is not in the word.", letter),
        };

        self.broadcast(&format!("{} guesses: {}", name, letter));
        self.broadcast(&verdict);
    }

    /// Reveals the word, names the winner if there is one, and starts the next round.
    pub fn announce_round_end(&mut self, winner: Option<ClientId>) {
        let word = self.session.word().to_string();
        self.broadcast(&format!("The word was {}.", word));

        match winner {
            Some(winner) => {
                let name = self.clients.name_of(winner).unwrap_or_default().to_string();
                info!(
                    "Round {} won by {} with '{}'",
                    self.session.round(),
                    name,
                    word
                );
                self.send_to(winner, "Game over! You win!");
                self.broadcast_except(winner, &format!("Game over! {} won!", name));
            }
            None => {
                info!(
                    "Round {} lost, the word was '{}'",
                    self.session.round(),
                    word
                );
                self.broadcast("No guesses left. Game over!");
            }
        }

        if let Err(e) = self.session.start_round(self.words.as_mut()) {
            error!("Failed to pick a new word, replaying '{}': {}", word, e);
            self.session.begin_round(&word);
        }

        self.broadcast("Let's start a new game.");
        self.announce_turn();
    }

    /// Multi-line status block with the mask, guesses left and letters tried
    pub fn status_message(&self) -> String {
        let guessed: Vec<String> = self
            .session
            .guessed_letters()
            .map(|c| c.to_string())
            .collect();

        [
            "***************".to_string(),
            format!("Word to guess: {}", self.session.mask()),
            format!("Guesses remaining: {}", self.session.guesses_remaining()),
            format!("Letters guessed: {}", guessed.join(" ")),
            "***************".to_string(),
        ]
        .join(NETWORK_NEWLINE)
    }
}
