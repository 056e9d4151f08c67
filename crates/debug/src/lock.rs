// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-process debug lock state.
//!
//! One instance per actor process. In the root the FIFO mutex is the
//! canonical tree-wide terminal mutex; children use only the local fields
//! (task-in-debug, completion event, REPL handle). All writers run on the
//! process's scheduler; the `parking_lot` mutex keeps the snapshot coherent
//! for the signal path on multi-threaded runtimes.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use smol_str::SmolStr;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use troupe_core::{ActorId, Event, FifoLock, FifoLockError};

use crate::error::DebugError;
use crate::repl::Repl;

#[derive(Default)]
struct LockState {
    /// Identity believed to hold the TTY anywhere in the tree.
    holder: Option<ActorId>,
    /// Name of the local task currently in (or leasing for) a debug session.
    local_task_in_debug: Option<SmolStr>,
    /// Cancel handle of the root-side lease task, for forced release.
    lease_cancel: Option<CancellationToken>,
    /// Cancel handle of the child-side requester task, cancelled when this
    /// actor is asked to cancel over IPC so the request cannot deadlock
    /// against the parent.
    request_cancel: Option<CancellationToken>,
    /// Set when the local REPL exits; wakes local tasks queued behind a
    /// reentrant contender.
    pdb_complete: Option<Event>,
    /// The active local REPL, if any.
    repl: Option<Arc<dyn Repl>>,
    /// Identities forbidden from acquiring (operator escape hatch).
    blocked: HashSet<ActorId>,
    /// Whether the interrupt shield is engaged in this process.
    shielded: bool,
}

/// Actor-global debug lock state.
pub struct DebugLock {
    mutex: FifoLock,
    state: Mutex<LockState>,
}

impl Default for DebugLock {
    fn default() -> Self {
        Self::new()
    }
}

impl DebugLock {
    pub fn new() -> Self {
        Self { mutex: FifoLock::new(), state: Mutex::new(LockState::default()) }
    }

    // --- mutex ---

    /// Acquire the terminal mutex, waiting in strict FIFO order.
    pub async fn acquire(&self, task: &str) -> Result<(), FifoLockError> {
        debug!(%task, "waiting on tty lock");
        self.mutex.acquire(task).await?;
        debug!(%task, "tty lock acquired");
        Ok(())
    }

    pub(crate) fn mutex_release(&self, task: &str) -> Result<(), FifoLockError> {
        self.mutex.release(task)
    }

    pub fn mutex_locked(&self) -> bool {
        self.mutex.locked()
    }

    /// Subscribe to the drain flag: true iff the mutex is neither owned nor
    /// awaited, i.e. no descendant holds or wants the TTY.
    pub fn drained(&self) -> watch::Receiver<bool> {
        self.mutex.drained()
    }

    pub fn is_drained(&self) -> bool {
        self.mutex.is_drained()
    }

    // --- holder / task bookkeeping ---

    pub fn holder(&self) -> Option<ActorId> {
        self.state.lock().holder.clone()
    }

    pub fn set_holder(&self, uid: ActorId) {
        self.state.lock().holder = Some(uid);
    }

    pub fn clear_holder(&self) {
        self.state.lock().holder = None;
    }

    pub fn local_task(&self) -> Option<SmolStr> {
        self.state.lock().local_task_in_debug.clone()
    }

    pub fn set_local_task(&self, task: SmolStr) {
        self.state.lock().local_task_in_debug = Some(task);
    }

    pub fn clear_local_task(&self) {
        self.state.lock().local_task_in_debug = None;
    }

    // --- cancel handles ---

    pub fn lease_cancel(&self) -> Option<CancellationToken> {
        self.state.lock().lease_cancel.clone()
    }

    pub fn set_lease_cancel(&self, token: CancellationToken) {
        self.state.lock().lease_cancel = Some(token);
    }

    pub fn clear_lease_cancel(&self) {
        self.state.lock().lease_cancel = None;
    }

    pub fn request_cancel(&self) -> Option<CancellationToken> {
        self.state.lock().request_cancel.clone()
    }

    pub fn set_request_cancel(&self, token: CancellationToken) {
        self.state.lock().request_cancel = Some(token);
    }

    pub fn clear_request_cancel(&self) {
        self.state.lock().request_cancel = None;
    }

    // --- completion event ---

    /// The current session-completion event, if one exists.
    pub fn pdb_complete(&self) -> Option<Event> {
        self.state.lock().pdb_complete.clone()
    }

    /// Install a fresh unset completion event if the current one is missing
    /// or already fired for a previous session.
    pub fn refresh_pdb_complete(&self) -> Event {
        let mut st = self.state.lock();
        match &st.pdb_complete {
            Some(event) if !event.is_set() => event.clone(),
            _ => {
                let event = Event::new();
                st.pdb_complete = Some(event.clone());
                event
            }
        }
    }

    /// The completion event, created unset if missing.
    pub fn ensure_pdb_complete(&self) -> Event {
        let mut st = self.state.lock();
        st.pdb_complete.get_or_insert_with(Event::new).clone()
    }

    // --- repl handle ---

    pub fn repl(&self) -> Option<Arc<dyn Repl>> {
        self.state.lock().repl.clone()
    }

    pub fn set_repl(&self, repl: Arc<dyn Repl>) {
        self.state.lock().repl = Some(repl);
    }

    // --- blocklist ---

    pub fn block(&self, uid: ActorId) {
        warn!(%uid, "blocking actor from the debug lock");
        self.state.lock().blocked.insert(uid);
    }

    pub fn unblock(&self, uid: &ActorId) {
        self.state.lock().blocked.remove(uid);
    }

    pub fn is_blocked(&self, uid: &ActorId) -> bool {
        self.state.lock().blocked.contains(uid)
    }

    // --- sigint shield ---

    pub fn shield_sigint(&self) {
        self.state.lock().shielded = true;
    }

    pub fn unshield_sigint(&self) {
        self.state.lock().shielded = false;
    }

    pub fn is_shielded(&self) -> bool {
        self.state.lock().shielded
    }

    // --- release ---

    /// Release after a local REPL session.
    ///
    /// Idempotent: overlapping REPL exit hooks may call this more than once.
    /// The only raising case is a true owner mismatch — the mutex is held by
    /// another tag while this task is still recorded as the one in debug —
    /// which means the lock state can no longer be trusted.
    pub fn release(&self, task: &str) -> Result<(), DebugError> {
        let mut st = self.state.lock();

        match self.mutex.release(task) {
            Ok(()) => {}
            Err(FifoLockError::NotLocked) => {}
            Err(FifoLockError::NotOwner { owner, .. }) => {
                if st.local_task_in_debug.as_deref() == Some(task) {
                    return Err(DebugError::LockCorrupted { task: SmolStr::new(task), owner });
                }
                // the mutex already moved on to the next contender and our
                // bookkeeping was cleared by the first release; the new
                // session's state is not ours to touch
                return Ok(());
            }
            Err(FifoLockError::Closed) => {}
        }

        st.holder = None;
        st.local_task_in_debug = None;

        if let Some(event) = &st.pdb_complete {
            event.set();
        }

        st.shielded = false;
        st.repl = None;
        Ok(())
    }
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
