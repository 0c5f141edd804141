/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::Handle;

/// Everything that can go wrong when addressing or driving a session.
///
/// An illegal move is not an error: it is reported as a normal outcome by the move protocol.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("every session slot is in use")]
    PoolExhausted,

    #[error("session handle {0} is out of range")]
    InvalidHandle(Handle),

    #[error("no session is bound to handle {0}")]
    EmptySlot(Handle),

    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("engine failure: {0:#}")]
    Engine(#[from] anyhow::Error),
}

impl SessionError {
    /// Returns `true` if this error was caused by the caller rather than the server.
    pub const fn is_client_error(&self) -> bool {
        !matches!(self, Self::Engine(_))
    }
}
