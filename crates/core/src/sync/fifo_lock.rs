// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Strict first-in-first-out asynchronous mutex.
//!
//! Unlike a guard-based mutex, acquisition and release are explicit calls
//! tagged with an owner label. The release site can be far away from the
//! acquire site (a REPL exit hook releases a lock acquired by the task that
//! entered the debugger), which rules out RAII guards.
//!
//! Waiters are granted in strict arrival order. A waiter whose acquire
//! future was dropped before its turn is skipped at grant time.

use parking_lot::Mutex;
use smol_str::SmolStr;
use std::collections::VecDeque;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{oneshot, watch};

/// Errors from explicit lock release.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FifoLockError {
    /// Released while not locked. Benign for overlapping release paths;
    /// callers decide whether to surface it.
    #[error("lock is not held")]
    NotLocked,

    /// Released with a tag that does not match the current owner.
    #[error("lock is held by {owner}, not {tag}")]
    NotOwner { owner: SmolStr, tag: SmolStr },

    /// The lock was torn down while a waiter was queued.
    #[error("lock closed while waiting")]
    Closed,
}

struct Waiter {
    tag: SmolStr,
    tx: oneshot::Sender<()>,
}

#[derive(Default)]
struct State {
    owner: Option<SmolStr>,
    waiters: VecDeque<Waiter>,
}

struct Inner {
    state: Mutex<State>,
    // true iff the lock is neither owned nor awaited; edge-updated on
    // every grant/release transition
    drained: watch::Sender<bool>,
}

/// Strict-FIFO async mutex with explicit, tagged acquire/release.
#[derive(Clone)]
pub struct FifoLock {
    inner: Arc<Inner>,
}

impl Default for FifoLock {
    fn default() -> Self {
        Self::new()
    }
}

impl FifoLock {
    pub fn new() -> Self {
        let (drained, _) = watch::channel(true);
        Self { inner: Arc::new(Inner { state: Mutex::new(State::default()), drained }) }
    }

    /// Acquire the lock, waiting in strict arrival order.
    ///
    /// The `tag` labels the owner for diagnostics and release checking; it
    /// does not need to be globally unique, only unique among concurrent
    /// contenders (task names are).
    pub async fn acquire(&self, tag: &str) -> Result<(), FifoLockError> {
        let rx = {
            let mut st = self.inner.state.lock();
            if st.owner.is_none() && st.waiters.is_empty() {
                st.owner = Some(SmolStr::new(tag));
                self.inner.drained.send_replace(false);
                None
            } else {
                let (tx, rx) = oneshot::channel();
                st.waiters.push_back(Waiter { tag: SmolStr::new(tag), tx });
                self.inner.drained.send_replace(false);
                Some(rx)
            }
        };

        match rx {
            None => Ok(()),
            // The granting side records us as owner before signalling, so a
            // successful recv means the lock is ours.
            Some(rx) => rx.await.map_err(|_| FifoLockError::Closed),
        }
    }

    /// Release the lock and hand it to the next live waiter, if any.
    ///
    /// Fails with [`FifoLockError::NotLocked`] when the lock is free and
    /// [`FifoLockError::NotOwner`] when a different tag holds it. Both leave
    /// the lock state untouched.
    pub fn release(&self, tag: &str) -> Result<(), FifoLockError> {
        let mut st = self.inner.state.lock();
        match &st.owner {
            None => return Err(FifoLockError::NotLocked),
            Some(owner) if owner != tag => {
                return Err(FifoLockError::NotOwner { owner: owner.clone(), tag: SmolStr::new(tag) });
            }
            Some(_) => {}
        }

        st.owner = None;
        while let Some(waiter) = st.waiters.pop_front() {
            let granted = SmolStr::clone(&waiter.tag);
            // send fails when the waiting acquire was dropped; skip it
            if waiter.tx.send(()).is_ok() {
                st.owner = Some(granted);
                break;
            }
        }

        if st.owner.is_none() && st.waiters.is_empty() {
            self.inner.drained.send_replace(true);
        }
        Ok(())
    }

    /// Current owner tag, if held.
    pub fn owner(&self) -> Option<SmolStr> {
        self.inner.state.lock().owner.clone()
    }

    pub fn locked(&self) -> bool {
        self.inner.state.lock().owner.is_some()
    }

    /// Number of queued waiters, including any whose acquire was dropped
    /// but not yet reaped by a release.
    pub fn waiters(&self) -> usize {
        self.inner.state.lock().waiters.len()
    }

    /// Subscribe to the drained flag: true iff the lock is neither owned
    /// nor awaited.
    pub fn drained(&self) -> watch::Receiver<bool> {
        self.inner.drained.subscribe()
    }

    pub fn is_drained(&self) -> bool {
        *self.inner.drained.borrow()
    }
}

#[cfg(test)]
#[path = "fifo_lock_tests.rs"]
mod tests;
