// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Drain waiter: defer root-side teardown while a descendant holds the TTY.
//!
//! Polls rather than waiting on a single event because the holder may change
//! hands between children during the shutdown window; each wait is bounded
//! so a wedged session cannot stall teardown forever.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::debug;

use crate::env;
use crate::runtime::ActorRuntime;

/// Tuning for [`maybe_wait_for_debugger`].
#[derive(Debug, Clone)]
pub struct DrainOpts {
    /// Number of poll rounds before giving up.
    pub poll_steps: usize,
    /// Delay between polls.
    pub poll_delay: Duration,
    /// Wait even when debug mode is off, because the caller knows a child
    /// is in debug.
    pub child_in_debug: bool,
}

impl Default for DrainOpts {
    fn default() -> Self {
        Self { poll_steps: 2, poll_delay: env::drain_poll_delay(), child_in_debug: false }
    }
}

/// Wait until no descendant holds the TTY, bounded by the poll rounds.
///
/// Meaningful only in the root; a no-op elsewhere and when debug mode is
/// off (unless the caller asserts `child_in_debug`).
pub async fn maybe_wait_for_debugger(actor: &Arc<dyn ActorRuntime>, opts: DrainOpts) {
    if !actor.debug_mode() && !opts.child_in_debug {
        return;
    }
    if !actor.is_root() {
        return;
    }

    // If we error in the root while the debugger is engaged somewhere, we
    // must not clobber the tty out from under it; wait for release before
    // tearing down.
    let lock = actor.debug_lock();
    let mut drained = lock.drained();

    for _ in 0..opts.poll_steps {
        let Some(holder) = lock.holder() else {
            debug!("no debugger holder; root may tear down");
            return;
        };
        debug!(%holder, "root polling for debug release");

        tokio::time::sleep(opts.poll_delay).await;
        if !*drained.borrow_and_update() {
            debug!(%holder, "root errored but the debugger is in use; waiting on the tty lock");
            let _ = tokio::time::timeout(opts.poll_delay, wait_drained(&mut drained)).await;
        }
        tokio::time::sleep(opts.poll_delay).await;
    }
}

async fn wait_drained(drained: &mut watch::Receiver<bool>) {
    // errs only if the lock itself is dropped, which also means drained
    let _ = drained.wait_for(|flag| *flag).await;
}

#[cfg(test)]
#[path = "drain_tests.rs"]
mod tests;
