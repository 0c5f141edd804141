/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{collections::HashSet, sync::Arc, thread};

use anyhow::{bail, Result};
use chessie::{Game, Move};
use stockhub::*;

/// Always plays the alphabetically-first legal move.
#[derive(Debug, Default)]
struct FirstMoveEngine {
    game: Game,
}

impl EngineHandle for FirstMoveEngine {
    fn set_fen_position(&mut self, fen: &str) -> Result<()> {
        self.game = Game::from_fen(fen)?;
        Ok(())
    }

    fn fen(&self) -> String {
        self.game.to_fen()
    }

    fn board_visual(&self) -> String {
        self.game.to_string()
    }

    fn is_move_correct(&self, mv: &str) -> bool {
        Move::from_uci(&self.game, mv)
            .map(|mv| self.game.get_legal_moves().into_iter().any(|legal| legal == mv))
            .unwrap_or(false)
    }

    fn make_moves(&mut self, moves: &[&str]) -> Result<()> {
        for mv in moves {
            if !self.is_move_correct(mv) {
                bail!("illegal move {mv}");
            }
            let mv = Move::from_uci(&self.game, mv)?;
            self.game.make_move(mv);
        }
        Ok(())
    }

    fn best_move(&mut self) -> Result<Option<String>> {
        Ok(self
            .game
            .get_legal_moves()
            .into_iter()
            .map(|mv| mv.to_string())
            .min())
    }

    fn evaluation(&mut self) -> Result<Evaluation> {
        Ok(Evaluation::cp(0))
    }

    fn set_elo_rating(&mut self, _elo: u32) -> Result<()> {
        Ok(())
    }
}

fn pool(capacity: usize) -> SessionPool {
    SessionPool::new(capacity, || Ok(FirstMoveEngine::default()))
}

#[test]
fn test_fresh_game_against_engine() {
    let pool = pool(DEFAULT_CAPACITY);
    let handle = pool.allocate().unwrap();
    assert_eq!(handle, 0);

    let mut session = pool.resolve(handle).unwrap();
    let outcome = play_against_engine(&mut *session, "e2e4").unwrap();
    assert!(outcome.valid);
    assert!(outcome.response.is_some());
    assert_eq!(outcome.mate, None);
    drop(session);

    let best = pool.resolve(handle).unwrap().best_move().unwrap();
    assert!(best.is_some());
}

#[test]
fn test_release_requires_reallocation() {
    let pool = pool(2);
    let handle = pool.allocate().unwrap();
    pool.release(handle).unwrap();

    assert!(matches!(
        pool.resolve(handle),
        Err(SessionError::EmptySlot(_))
    ));

    let quiz = QuizCatalog::builtin();
    let fen = quiz.choose(&mut rand::thread_rng()).unwrap();
    assert_eq!(pool.allocate_with_position(fen).unwrap(), handle);
    assert!(pool.resolve(handle).is_ok());
}

#[test]
fn test_concurrent_clients_share_pool() {
    let pool = Arc::new(pool(4));

    // Each client grabs a session, plays a move on it, and then gives it back.
    let clients = (0..12)
        .map(|_| {
            let pool = Arc::clone(&pool);
            thread::spawn(move || -> Option<Handle> {
                let handle = pool.allocate().ok()?;
                let mut session = pool.resolve(handle).ok()?;
                let outcome = apply_player_move(&mut *session, "e2e4").ok()?;
                assert!(outcome.valid, "session {handle} was not at the start position");
                Some(handle)
            })
        })
        .collect::<Vec<_>>();

    let handles = clients
        .into_iter()
        .filter_map(|client| client.join().unwrap())
        .collect::<Vec<_>>();

    // Nobody released anything, so every handle was handed out at most once.
    let unique = handles.iter().collect::<HashSet<_>>();
    assert_eq!(handles.len(), 4);
    assert_eq!(unique.len(), 4);
    assert_eq!(pool.allocated(), pool.capacity());
}
