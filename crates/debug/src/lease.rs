// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Root-side lease task: holds the terminal mutex on behalf of one child.
//!
//! Served as an RPC context on the root, one invocation per debug session.
//! The critical region between acquire and release is a state machine with
//! an explicit releasing step that runs on every exit reason — child
//! release, peer loss, lease revocation — so external cancellation can
//! never strand the mutex or leave a stale holder behind.

use std::sync::Arc;

use smol_str::SmolStr;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};
use troupe_core::{ActorId, FifoLockError};
use troupe_wire::{LeaseOutcome, LockStatus, ReplMsg};

use crate::error::RpcError;
use crate::lock::DebugLock;
use crate::runtime::{ActorRuntime, ServerCtx};

/// Errors ending a lease before `pdb_unlock` arrived.
#[derive(Debug, Error)]
pub enum LeaseError {
    /// The root revoked the lease through its cancel handle.
    #[error("tty lease revoked by the root")]
    Revoked,

    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error(transparent)]
    Lock(#[from] FifoLockError),
}

/// Lock the root's TTY for a child actor until it sends `pdb_unlock`.
///
/// Must be invoked in the root. Replies `Locked` once the FIFO mutex is
/// held, then sleeps on the context's stream until the child declares
/// release. Blocklisted identities are cancelled without touching the
/// mutex.
pub async fn lock_tty_for_child(
    actor: &Arc<dyn ActorRuntime>,
    ctx: &mut dyn ServerCtx,
    subactor_uid: ActorId,
) -> Result<LeaseOutcome, LeaseError> {
    let lock = actor.debug_lock();

    if lock.is_blocked(&subactor_uid) {
        warn!(subactor = %subactor_uid, "actor is blocked from acquiring the debug lock");
        // a blocklist rejection must not push the child into a crash REPL
        ctx.set_enter_debugger_on_cancel(false);
        ctx.cancel(&format!("debug lock blocked for {subactor_uid}")).await?;
        return Ok(LeaseOutcome::Blocked);
    }

    debug!(subactor = %subactor_uid, "child is waiting on the stdin hijack lock");
    lock.shield_sigint();

    let outcome = run_lease(&lock, ctx, &subactor_uid).await;

    lock.clear_lease_cancel();
    lock.unshield_sigint();
    outcome
}

/// The critical region: acquire, grant, await release.
async fn run_lease(
    lock: &DebugLock,
    ctx: &mut dyn ServerCtx,
    subactor_uid: &ActorId,
) -> Result<LeaseOutcome, LeaseError> {
    let task = SmolStr::new(format!("lock_tty:{subactor_uid}"));

    lock.acquire(&task).await?;
    // published only by the lease that holds the mutex, so the handle
    // always belongs to the active session
    let lease = CancellationToken::new();
    lock.set_lease_cancel(lease.clone());
    lock.set_holder(subactor_uid.clone());
    debug!(subactor = %subactor_uid, "child acquired the stdin hijack lock");

    let session = async {
        // indicate to the child that we've locked stdio
        ctx.started(LockStatus::Locked).await?;
        // exactly one inbound message ends the session
        let ReplMsg::Unlock = ctx.recv().await?;
        Ok::<(), RpcError>(())
    };

    let result = tokio::select! {
        res = session => res.map_err(LeaseError::from),
        () = lease.cancelled() => Err(LeaseError::Revoked),
    };

    // Releasing step, on every exit reason. A dead child or a revoked lease
    // must never leave the tree with a stuck holder.
    lock.clear_holder();
    if let Err(e) = lock.mutex_release(&task) {
        error!(error = %e, "tty lock release failed in lease teardown");
    }
    if lock.is_drained() {
        debug!(subactor = %subactor_uid, "no more tasks waiting on the tty lock");
    }

    result.map(|()| LeaseOutcome::UnlockComplete)
}

#[cfg(test)]
#[path = "lease_tests.rs"]
mod tests;
