//! Performance benchmarks for the hot paths of the game server

use server::config::ServerConfig;
use server::dictionary::WordList;
use server::game::{GameSession, RoundEnd};
use server::room::GameRoom;
use shared::LineBuffer;
use std::time::Instant;
use tokio::sync::mpsc;

/// Benchmarks splitting a byte stream into lines
#[test]
fn benchmark_line_buffering() {
    let mut buffer = LineBuffer::new(shared::MAX_LINE_LEN);
    let chunk = b"a\r\nb\r\nsome longer line of text\r\n";

    let iterations = 100_000;
    let start = Instant::now();
    let mut lines = 0;

    for _ in 0..iterations {
        buffer.push(chunk).unwrap();
        while let Some(_line) = buffer.next_line().unwrap() {
            lines += 1;
        }
    }

    let duration = start.elapsed();
    println!(
        "Line buffering: {} lines in {:?} ({:.2} ns/line)",
        lines,
        duration,
        duration.as_nanos() as f64 / lines as f64
    );

    assert_eq!(lines, iterations * 3);
    assert!(buffer.is_empty());
    // Should complete in under 2 seconds
    assert!(duration.as_millis() < 2000);
}

/// Benchmarks full rounds of guessing with a rotating roster
#[test]
fn benchmark_guess_rounds() {
    let mut session = GameSession::new(26);
    for id in 1..=8 {
        session.add_player(id);
    }

    let rounds = 1_000;
    let start = Instant::now();

    for _ in 0..rounds {
        session.begin_round("thequickbrownfoxjumpsoverlazydog");
        let mut ended = false;
        for letter in 'a'..='z' {
            let player = session.current_player().unwrap();
            let report = session.submit_guess(player, &letter.to_string()).unwrap();
            if let Some(RoundEnd::Won { .. }) = report.round_end {
                ended = true;
                break;
            }
        }
        assert!(ended, "pangram should be solved by z");
    }

    let duration = start.elapsed();
    println!(
        "Guess rounds: {} rounds in {:?} ({:.2} μs/round)",
        rounds,
        duration,
        duration.as_micros() as f64 / rounds as f64
    );

    // Should complete in under 2 seconds
    assert!(duration.as_millis() < 2000);
}

/// Stress tests broadcasting to a large roster
#[test]
fn stress_test_broadcast_many_players() {
    let config = ServerConfig::default();
    let mut room = GameRoom::new(&config, Box::new(WordList::new(["cat"]).unwrap())).unwrap();

    let players = 100;
    let mut receivers = Vec::new();
    for i in 0..players {
        let (tx, rx) = mpsc::channel(8192);
        let id = room.connect("127.0.0.1:9000".parse().unwrap(), tx);
        room.receive(id, format!("player{}\r\n", i).as_bytes());
        receivers.push(rx);
    }
    assert_eq!(room.clients().active_len(), players);

    let messages = 50;
    let start = Instant::now();

    for i in 0..messages {
        room.broadcast(&format!("message {}", i));
    }

    let duration = start.elapsed();
    println!(
        "Broadcast: {} messages to {} players in {:?}",
        messages, players, duration
    );

    // Nobody fell behind far enough to be dropped
    assert_eq!(room.clients().active_len(), players);
    for rx in receivers.iter_mut() {
        let mut last = None;
        while let Ok(message) = rx.try_recv() {
            last = Some(message);
        }
        assert_eq!(last.as_deref(), Some("message 49\r\n"));
    }

    // Should complete in under 1 second
    assert!(duration.as_millis() < 1000);
}
