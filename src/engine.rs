/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use anyhow::Result;
use serde::Serialize;

/// FEN of the standard starting position.
pub const STARTPOS_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// A single chess engine instance, bound to one session.
///
/// Implementors own their current position and are driven by one caller at a time.
/// The pool guarantees this by keeping every engine behind its slot's lock.
pub trait EngineHandle: Send {
    /// Overwrites the current position with the one described by `fen`.
    fn set_fen_position(&mut self, fen: &str) -> Result<()>;

    /// Returns the FEN of the current position.
    fn fen(&self) -> String;

    /// Returns a human-readable rendering of the current board.
    fn board_visual(&self) -> String;

    /// Returns `true` if `mv` (in UCI notation) is legal in the current position.
    fn is_move_correct(&self, mv: &str) -> bool;

    /// Plays every move in `moves`, in order, from the current position.
    fn make_moves(&mut self, moves: &[&str]) -> Result<()>;

    /// Searches the current position and returns the best move for the side to move.
    ///
    /// Returns `None` if the side to move has no legal move.
    fn best_move(&mut self) -> Result<Option<String>>;

    /// Evaluates the current position, from White's point of view.
    fn evaluation(&mut self) -> Result<Evaluation>;

    /// Limits the engine's playing strength to roughly `elo`.
    fn set_elo_rating(&mut self, elo: u32) -> Result<()>;
}

/// Unit of an [`Evaluation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EvaluationKind {
    /// Centipawns.
    Cp,

    /// Moves until mate. Negative when Black mates.
    Mate,
}

/// Position evaluation as reported by an engine, always relative to White.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Evaluation {
    #[serde(rename = "type")]
    pub kind: EvaluationKind,
    pub value: i32,
}

impl Evaluation {
    pub const fn cp(value: i32) -> Self {
        Self {
            kind: EvaluationKind::Cp,
            value,
        }
    }

    pub const fn mate(value: i32) -> Self {
        Self {
            kind: EvaluationKind::Mate,
            value,
        }
    }

    /// Negates the value, switching the point of view to the other side.
    pub const fn flipped(self) -> Self {
        Self {
            kind: self.kind,
            value: -self.value,
        }
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            EvaluationKind::Cp => write!(f, "cp {}", self.value),
            EvaluationKind::Mate => write!(f, "mate {}", self.value),
        }
    }
}

/// Named UCI options sent to every engine when it is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    options: Vec<(String, String)>,
}

impl EngineOptions {
    /// Sets `name` to `value`, replacing any previous value for `name`.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let (name, value) = (name.into(), value.into());
        match self.options.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.options.push((name, value)),
        }
    }

    /// Returns the value of option `name`, if set.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Iterates over all `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.options.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl Default for EngineOptions {
    fn default() -> Self {
        let mut options = Self {
            options: Vec::with_capacity(12),
        };

        for (name, value) in [
            ("Write Debug Log", "false"),
            ("Contempt", "0"),
            ("Min Split Depth", "0"),
            ("Threads", "1"),
            ("Ponder", "false"),
            ("Hash", "16"),
            ("MultiPV", "1"),
            ("Skill Level", "20"),
            ("Move Overhead", "30"),
            ("Minimum Thinking Time", "20"),
            ("Slow Mover", "80"),
            ("UCI_Chess960", "false"),
        ] {
            options.set(name, value);
        }

        options
    }
}
