/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// Command-line configuration of the server.
mod cli;

/// The engine contract every session is built on.
mod engine;

/// Errors surfaced by session operations.
mod error;

/// The fixed-capacity table of engine sessions.
mod pool;

/// Move validation, castling shorthand, and game termination.
mod protocol;

/// Puzzle positions used to seed quiz sessions.
mod quiz;

/// HTTP routes over the session pool.
mod server;

/// Sessions backed by an external UCI engine process.
mod uci;

pub use cli::*;
pub use engine::*;
pub use error::*;
pub use pool::*;
pub use protocol::*;
pub use quiz::*;
pub use server::*;
pub use uci::*;
