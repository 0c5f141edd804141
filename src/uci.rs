/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{
    io::{BufRead, BufReader, Write},
    path::PathBuf,
    process::{Child, ChildStdin, ChildStdout, Command, Stdio},
};

use anyhow::{bail, Context, Result};
use chessie::{Game, Move};
use uci_parser::{UciCommand, UciSearchOptions};

use crate::{EngineHandle, EngineOptions, Evaluation};

/// Default depth of every search sent to the engine process.
pub const DEFAULT_DEPTH: u32 = 15;

/// How to launch and configure a [`UciEngine`].
#[derive(Debug, Clone)]
pub struct UciEngineConfig {
    /// Path to the engine executable.
    pub path: PathBuf,

    /// Depth of the searches used for best moves and evaluations.
    pub depth: u32,

    /// Options sent to the engine right after the `uci` handshake.
    pub options: EngineOptions,
}

impl Default for UciEngineConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("stockfish"),
            depth: DEFAULT_DEPTH,
            options: EngineOptions::default(),
        }
    }
}

/// A session backed by an external UCI engine process.
///
/// The current position is mirrored locally, so FEN output, board rendering and move legality
/// never need a round-trip to the process. Only searches are delegated to it.
#[derive(Debug)]
pub struct UciEngine {
    /// The engine process itself. Killed when this session is dropped.
    child: Child,

    /// Commands are written here, one per line.
    stdin: ChildStdin,

    /// Responses are read from here, one per line.
    stdout: BufReader<ChildStdout>,

    /// Local copy of the position the engine is playing.
    game: Game,

    /// Depth used for every `go` command.
    depth: u32,
}

impl UciEngine {
    /// Launches the engine at `config.path`, performs the UCI handshake and applies `config.options`.
    pub fn spawn(config: &UciEngineConfig) -> Result<Self> {
        let mut child = Command::new(&config.path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("Failed to launch engine at {:?}", config.path))?;

        let stdin = child.stdin.take().context("Engine process has no stdin")?;
        let stdout = child.stdout.take().context("Engine process has no stdout")?;

        let mut engine = Self {
            child,
            stdin,
            stdout: BufReader::new(stdout),
            game: Game::default(),
            depth: config.depth,
        };

        engine.send(UciCommand::Uci)?;
        engine.read_until(|line| line == "uciok")?;

        for (name, value) in config.options.iter() {
            engine.set_option(name, value)?;
        }

        engine.send(UciCommand::UciNewGame)?;
        engine.sync()?;

        tracing::debug!(pid = engine.child.id(), "engine process ready");
        Ok(engine)
    }

    /// Sends a single command to the engine process.
    fn send(&mut self, cmd: UciCommand) -> Result<()> {
        tracing::trace!(%cmd, "-> engine");
        writeln!(self.stdin, "{cmd}").context("Failed to write to engine process")?;
        self.stdin
            .flush()
            .context("Failed to flush engine process input")
    }

    /// Sends `setoption name <name> value <value>`.
    fn set_option(&mut self, name: &str, value: &str) -> Result<()> {
        self.send(UciCommand::SetOption {
            name: name.to_string(),
            value: Some(value.to_string()),
        })
    }

    /// Blocks until the engine answers `isready` with `readyok`.
    fn sync(&mut self) -> Result<()> {
        self.send(UciCommand::IsReady)?;
        self.read_until(|line| line == "readyok").map(|_| ())
    }

    /// Reads lines from the engine, passing each to `inspect`, until `done` returns `true` for one.
    ///
    /// Returns the line that ended the read.
    fn read_lines(
        &mut self,
        mut inspect: impl FnMut(&str),
        done: impl Fn(&str) -> bool,
    ) -> Result<String> {
        let mut buffer = String::with_capacity(256);

        loop {
            buffer.clear();
            let bytes = self
                .stdout
                .read_line(&mut buffer)
                .context("Failed to read from engine process")?;

            if bytes == 0 {
                bail!("Engine process closed its output unexpectedly");
            }

            let line = buffer.trim();
            tracing::trace!(line, "<- engine");
            if done(line) {
                return Ok(line.to_string());
            }
            inspect(line);
        }
    }

    fn read_until(&mut self, done: impl Fn(&str) -> bool) -> Result<String> {
        self.read_lines(|_| {}, done)
    }

    /// Runs a fixed-depth search on the mirrored position.
    ///
    /// Returns the engine's `bestmove` and the last score it reported, from the side to move's perspective.
    fn search(&mut self) -> Result<(Option<String>, Option<Evaluation>)> {
        self.send(UciCommand::Position {
            fen: Some(self.game.to_fen()),
            moves: Vec::new(),
        })?;
        self.send(UciCommand::Go(UciSearchOptions {
            depth: Some(self.depth as _),
            ..Default::default()
        }))?;

        let mut score = None;
        let line = self.read_lines(
            |line| {
                if let Some(eval) = parse_info_score(line) {
                    score = Some(eval);
                }
            },
            |line| line.starts_with("bestmove"),
        )?;

        Ok((parse_bestmove(&line), score))
    }
}

impl EngineHandle for UciEngine {
    fn set_fen_position(&mut self, fen: &str) -> Result<()> {
        self.game = Game::from_fen(fen).with_context(|| format!("Invalid FEN {fen:?}"))?;
        self.send(UciCommand::UciNewGame)?;
        self.sync()
    }

    fn fen(&self) -> String {
        self.game.to_fen()
    }

    fn board_visual(&self) -> String {
        self.game.to_string()
    }

    fn is_move_correct(&self, mv: &str) -> bool {
        let Ok(mv) = Move::from_uci(&self.game, mv) else {
            return false;
        };

        self.game.get_legal_moves().into_iter().any(|legal| legal == mv)
    }

    fn make_moves(&mut self, moves: &[&str]) -> Result<()> {
        for mv_str in moves {
            if !self.is_move_correct(mv_str) {
                bail!("Illegal move {mv_str:?} in position {}", self.game.to_fen());
            }

            let mv = Move::from_uci(&self.game, mv_str)?;
            self.game.make_move(mv);
        }

        Ok(())
    }

    fn best_move(&mut self) -> Result<Option<String>> {
        // No need to ask the process about a position without legal moves.
        if self.game.get_legal_moves().is_empty() {
            return Ok(None);
        }

        let (bestmove, _) = self.search()?;
        Ok(bestmove)
    }

    fn evaluation(&mut self) -> Result<Evaluation> {
        let (_, score) = self.search()?;
        let Some(score) = score else {
            bail!("Engine reported no score for {}", self.game.to_fen());
        };

        // Engines score from the side to move; callers expect White's point of view.
        if self.game.side_to_move().is_white() {
            Ok(score)
        } else {
            Ok(score.flipped())
        }
    }

    fn set_elo_rating(&mut self, elo: u32) -> Result<()> {
        self.set_option("UCI_LimitStrength", "true")?;
        self.set_option("UCI_Elo", &elo.to_string())?;
        self.sync()
    }
}

impl Drop for UciEngine {
    fn drop(&mut self) {
        // The process may already be gone; nothing useful can be done about errors here.
        _ = self.send(UciCommand::Quit);
        _ = self.child.kill();
        _ = self.child.wait();
    }
}

/// Extracts the move from a `bestmove <move> [ponder <move>]` line.
///
/// Engines report `(none)` or the null move `0000` when there is nothing to play.
fn parse_bestmove(line: &str) -> Option<String> {
    let mut parts = line.split_ascii_whitespace();
    if parts.next()? != "bestmove" {
        return None;
    }

    match parts.next()? {
        "(none)" | "0000" => None,
        mv => Some(mv.to_string()),
    }
}

/// Extracts the `score cp <x>` or `score mate <y>` of an `info` line, if it has one.
fn parse_info_score(line: &str) -> Option<Evaluation> {
    let mut parts = line.split_ascii_whitespace();
    if parts.next()? != "info" {
        return None;
    }

    parts.find(|&token| token == "score")?;
    let kind = parts.next()?;
    let value = parts.next()?.parse().ok()?;

    match kind {
        "cp" => Some(Evaluation::cp(value)),
        "mate" => Some(Evaluation::mate(value)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bestmove() {
        assert_eq!(parse_bestmove("bestmove e2e4"), Some("e2e4".into()));
        assert_eq!(
            parse_bestmove("bestmove g1f3 ponder d7d5"),
            Some("g1f3".into())
        );
        assert_eq!(parse_bestmove("bestmove (none)"), None);
        assert_eq!(parse_bestmove("bestmove 0000"), None);
        assert_eq!(parse_bestmove("info depth 1"), None);
    }

    #[test]
    fn test_parse_info_score() {
        let line = "info depth 12 seldepth 17 multipv 1 score cp 34 nodes 2048 pv e2e4 e7e5";
        assert_eq!(parse_info_score(line), Some(Evaluation::cp(34)));

        let line = "info depth 5 score mate -2 nodes 100 pv h7h8q";
        assert_eq!(parse_info_score(line), Some(Evaluation::mate(-2)));

        assert_eq!(parse_info_score("info string NNUE evaluation enabled"), None);
        assert_eq!(parse_info_score("bestmove e2e4"), None);
    }

    #[test]
    fn test_spawn_missing_engine_fails() {
        let config = UciEngineConfig {
            path: PathBuf::from("/nonexistent/path/to/an/engine"),
            ..Default::default()
        };

        let err = UciEngine::spawn(&config).unwrap_err();
        assert!(err.to_string().contains("Failed to launch engine"));
    }
}
