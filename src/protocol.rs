/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::borrow::Cow;

use anyhow::Result;
use chessie::Color;
use serde::Serialize;

use crate::EngineHandle;

/// Shorthand for queenside castling. Must be checked before [`KINGSIDE_MARKER`], which it contains.
const QUEENSIDE_MARKER: &str = "000";

/// Shorthand for kingside castling.
const KINGSIDE_MARKER: &str = "00";

/// Which side caused a game to end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Termination {
    /// The player's move left the engine without a legal reply.
    Player,

    /// The engine's reply left the player without a legal move.
    #[serde(rename = "stockfish")]
    Engine,
}

impl Termination {
    /// The name clients know this side by.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Player => "player",
            Self::Engine => "stockfish",
        }
    }
}

/// Result of a single player move, without an engine reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveOutcome {
    /// Whether the move was legal, and therefore played.
    pub valid: bool,

    /// Whether the position after the move has no legal continuation.
    pub terminal: bool,
}

/// Result of a player move followed by the engine's reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeOutcome {
    /// Whether the player's move was legal, and therefore played.
    pub valid: bool,

    /// The engine's reply, if one was played.
    pub response: Option<String>,

    /// Which side ended the game, if it ended.
    pub mate: Option<Termination>,
}

/// Whether a proposed move matches the engine's best move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BestMoveCheck {
    pub correct: bool,
    pub best: Option<String>,
}

/// Reads the side to move from the second field of `fen`.
fn side_to_move(fen: &str) -> Color {
    match fen.split_ascii_whitespace().nth(1) {
        Some("b") => Color::Black,
        _ => Color::White,
    }
}

/// Rewrites castling shorthand into the king's UCI move for `side`.
///
/// Anything containing `000` is queenside castling, anything else containing `00` is kingside castling,
/// and every other move is returned untouched.
pub fn normalize(mv: &str, side: Color) -> Cow<'_, str> {
    let rank = if side.is_white() { 1 } else { 8 };

    if mv.contains(QUEENSIDE_MARKER) {
        Cow::Owned(format!("e{rank}c{rank}"))
    } else if mv.contains(KINGSIDE_MARKER) {
        Cow::Owned(format!("e{rank}g{rank}"))
    } else {
        Cow::Borrowed(mv)
    }
}

/// What the side to move can do next, according to the engine.
enum Continuation {
    /// The engine's best move for the side to move.
    Best(String),

    /// The engine has no best move: the side to move has no legal move.
    Terminal,
}

/// Asks the engine for its best move in the current position.
fn continuation(engine: &mut dyn EngineHandle) -> Result<Continuation> {
    Ok(match engine.best_move()? {
        Some(mv) => Continuation::Best(mv),
        None => Continuation::Terminal,
    })
}

/// Returns `true` if the engine reports no best move for the side to move.
///
/// This cannot tell checkmate from stalemate: both are reported as a terminal position.
pub fn has_no_legal_continuation(engine: &mut dyn EngineHandle) -> Result<bool> {
    Ok(matches!(continuation(engine)?, Continuation::Terminal))
}

/// Returns `true` if `mv`, after castling shorthand is expanded, is legal in the current position.
pub fn is_legal_move(engine: &dyn EngineHandle, mv: &str) -> bool {
    engine.is_move_correct(&normalize(mv, side_to_move(&engine.fen())))
}

/// Plays the player's `mv` if it is legal, and reports whether the game ended because of it.
pub fn apply_player_move(engine: &mut dyn EngineHandle, mv: &str) -> Result<MoveOutcome> {
    let mv = normalize(mv, side_to_move(&engine.fen()));

    if !engine.is_move_correct(&mv) {
        tracing::debug!(%mv, "rejected illegal move");
        return Ok(MoveOutcome {
            valid: false,
            terminal: false,
        });
    }

    engine.make_moves(&[&*mv])?;

    Ok(MoveOutcome {
        valid: true,
        terminal: has_no_legal_continuation(engine)?,
    })
}

/// Plays the player's `mv` if it is legal, then lets the engine answer with its best move.
///
/// If the engine has no reply, the player ended the game. If the engine replies and the player
/// is then left without a move, the engine ended it.
pub fn play_against_engine(engine: &mut dyn EngineHandle, mv: &str) -> Result<ExchangeOutcome> {
    let mv = normalize(mv, side_to_move(&engine.fen()));

    if !engine.is_move_correct(&mv) {
        tracing::debug!(%mv, "rejected illegal move");
        return Ok(ExchangeOutcome {
            valid: false,
            response: None,
            mate: None,
        });
    }

    engine.make_moves(&[&*mv])?;

    let Continuation::Best(reply) = continuation(engine)? else {
        return Ok(ExchangeOutcome {
            valid: true,
            response: None,
            mate: Some(Termination::Player),
        });
    };

    engine.make_moves(&[reply.as_str()])?;
    let mate = has_no_legal_continuation(engine)?.then_some(Termination::Engine);

    Ok(ExchangeOutcome {
        valid: true,
        response: Some(reply),
        mate,
    })
}

/// Compares the player's `mv` with the engine's best move, without playing either.
pub fn check_best_move(engine: &mut dyn EngineHandle, mv: &str) -> Result<BestMoveCheck> {
    let mv = normalize(mv, side_to_move(&engine.fen()));
    let best = engine.best_move()?;

    Ok(BestMoveCheck {
        correct: best.as_deref() == Some(&*mv),
        best,
    })
}
