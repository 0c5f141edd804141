/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{
    fmt,
    ops::{Deref, DerefMut},
    sync::{Mutex, MutexGuard, PoisonError},
};

use anyhow::Result;

use crate::{EngineHandle, SessionError};

/// Number of session slots used when no capacity is configured.
pub const DEFAULT_CAPACITY: usize = 10;

/// Integer identifying one session slot. Caller-supplied, so it may be out of range.
pub type Handle = i64;

/// Creates a fresh engine, at the standard starting position, for a newly allocated session.
type Spawner = Box<dyn Fn() -> Result<Box<dyn EngineHandle>> + Send + Sync>;

type Slot = Option<Box<dyn EngineHandle>>;

/// Where a slot is in its lifecycle, as seen by the allocator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotState {
    Free,

    /// Claimed by an allocation whose engine is still starting up.
    Reserved,

    /// Bound to an engine that callers can resolve.
    Bound,
}

/// Locks `mutex`, recovering the data if a previous holder panicked.
///
/// A panic mid-request leaves the engine in whatever position it reached, which is still a valid position.
fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A fixed-size table of engine-backed game sessions.
///
/// Slots are index-stable for the lifetime of the pool, and each is either empty
/// or bound to exactly one engine in a playable position.
///
/// # Locking
///
/// The state table is only ever held for a short, non-blocking critical section.
/// When both locks are needed, the slot's lock is taken first and the table's second,
/// so no thread waits on a slot while holding the table. Engines are spawned with no lock held.
pub struct SessionPool {
    /// What each slot is doing. Claiming a free slot under this lock is what makes first-fit atomic.
    states: Mutex<Vec<SlotState>>,

    /// One lock per session, so requests on the same handle run one after another.
    slots: Box<[Mutex<Slot>]>,

    /// Constructs the engine for every new session.
    spawner: Spawner,
}

impl SessionPool {
    /// Constructs a pool of `capacity` empty slots, filled on demand with engines from `spawn`.
    pub fn new<F, E>(capacity: usize, spawn: F) -> Self
    where
        F: Fn() -> Result<E> + Send + Sync + 'static,
        E: EngineHandle + 'static,
    {
        let spawner: Spawner =
            Box::new(move || -> Result<Box<dyn EngineHandle>> { Ok(Box::new(spawn()?)) });

        Self {
            states: Mutex::new(vec![SlotState::Free; capacity]),
            slots: (0..capacity).map(|_| Mutex::new(None)).collect(),
            spawner,
        }
    }

    /// Total number of slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of slots that are bound to an engine, or about to be.
    pub fn allocated(&self) -> usize {
        lock(&self.states)
            .iter()
            .filter(|&&state| state != SlotState::Free)
            .count()
    }

    /// Binds a fresh engine, at the standard starting position, to the lowest empty slot.
    pub fn allocate(&self) -> Result<Handle, SessionError> {
        self.allocate_with(|_| Ok(()))
    }

    /// Binds a fresh engine, set up at `fen`, to the lowest empty slot.
    pub fn allocate_with_position(&self, fen: &str) -> Result<Handle, SessionError> {
        self.allocate_with(|engine| engine.set_fen_position(fen))
    }

    /// First-fit allocation.
    ///
    /// The slot is reserved up front, then the engine is spawned and `setup` runs on it outside any lock.
    /// A failure at any point frees the reservation again.
    fn allocate_with(
        &self,
        setup: impl FnOnce(&mut dyn EngineHandle) -> Result<()>,
    ) -> Result<Handle, SessionError> {
        let index = {
            let mut states = lock(&self.states);
            let Some(index) = states.iter().position(|&state| state == SlotState::Free) else {
                tracing::warn!(capacity = self.capacity(), "session pool exhausted");
                return Err(SessionError::PoolExhausted);
            };
            states[index] = SlotState::Reserved;
            index
        };

        let engine = (self.spawner)().and_then(|mut engine| {
            setup(engine.as_mut())?;
            Ok(engine)
        });

        let engine = match engine {
            Ok(engine) => engine,
            Err(e) => {
                lock(&self.states)[index] = SlotState::Free;
                return Err(e.into());
            }
        };

        let mut slot = lock(&self.slots[index]);
        *slot = Some(engine);
        lock(&self.states)[index] = SlotState::Bound;
        drop(slot);

        tracing::info!(handle = index, "session allocated");
        Ok(index as Handle)
    }

    /// Empties the slot at `handle`, dropping its engine.
    ///
    /// Waits for any request currently running on this session. Releasing an empty slot is allowed and does nothing.
    pub fn release(&self, handle: Handle) -> Result<(), SessionError> {
        let index = self.index(handle)?;

        let mut slot = lock(&self.slots[index]);
        let engine = slot.take();
        {
            // A reserved slot has no engine yet and belongs to its allocation.
            let mut states = lock(&self.states);
            if states[index] == SlotState::Bound {
                states[index] = SlotState::Free;
            }
        }
        drop(slot);

        if engine.is_some() {
            tracing::info!(handle, "session released");
        }

        Ok(())
    }

    /// Returns exclusive access to the engine bound to `handle`.
    ///
    /// Other requests on the same handle wait until the returned [`Session`] is dropped.
    pub fn resolve(&self, handle: Handle) -> Result<Session<'_>, SessionError> {
        let index = self.index(handle)?;
        let guard = lock(&self.slots[index]);

        if guard.is_none() {
            return Err(SessionError::EmptySlot(handle));
        }

        Ok(Session { handle, guard })
    }

    /// Converts a caller-supplied handle into a slot index, if it is in range.
    fn index(&self, handle: Handle) -> Result<usize, SessionError> {
        usize::try_from(handle)
            .ok()
            .filter(|&index| index < self.capacity())
            .ok_or(SessionError::InvalidHandle(handle))
    }
}

impl fmt::Debug for SessionPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionPool")
            .field("capacity", &self.capacity())
            .field("allocated", &self.allocated())
            .finish()
    }
}

/// Exclusive access to one populated session slot.
pub struct Session<'a> {
    handle: Handle,
    guard: MutexGuard<'a, Slot>,
}

impl Session<'_> {
    /// The handle this session was resolved from.
    pub fn handle(&self) -> Handle {
        self.handle
    }
}

impl Deref for Session<'_> {
    type Target = dyn EngineHandle;

    fn deref(&self) -> &Self::Target {
        // `resolve` only hands out guards over populated slots, and nothing else can empty them while held.
        match self.guard.as_deref() {
            Some(engine) => engine,
            None => unreachable!("session {} was emptied while borrowed", self.handle),
        }
    }
}

impl DerefMut for Session<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        match self.guard.as_deref_mut() {
            Some(engine) => engine,
            None => unreachable!("session {} was emptied while borrowed", self.handle),
        }
    }
}
