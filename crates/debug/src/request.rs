// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Child-side requester: obtains the root's TTY for one debug session.
//!
//! Runs in the child, one task per breakpoint. Opens the RPC context to the
//! root's lease task, waits for the grant, unblocks the local breakpoint
//! entry, and sends the release message once the local REPL is done. Also
//! backs [`acquire_debug_lock`], which holds the lock across a user block
//! without entering a REPL.

use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use troupe_core::ActorId;
use troupe_wire::{LeaseOutcome, LockStatus, ReplMsg};

use crate::error::{DebugError, RpcError};
use crate::lock::DebugLock;
use crate::runtime::ActorRuntime;

/// Delivered to the breakpoint entry once the root has granted the lock.
/// Cancelling the token releases the session from the child side.
type Grant = Result<CancellationToken, DebugError>;

/// Acquire the root's TTY lock on behalf of `subactor_uid` and hold it
/// until the local session completes.
///
/// Must be started in a new task from a child actor, never the root. The
/// grant (or a pre-grant failure) is delivered through `granted`; from then
/// on the task stays alive until the completion event fires or its request
/// token is cancelled, then closes out the context with `pdb_unlock`.
pub async fn wait_for_parent_stdin_hijack(
    actor: Arc<dyn ActorRuntime>,
    subactor_uid: ActorId,
    granted: oneshot::Sender<Grant>,
) {
    let lock = actor.debug_lock();

    let request = CancellationToken::new();
    lock.set_request_cancel(request.clone());

    let mut granted = Some(granted);
    let result = hijack_root_stdin(&actor, &lock, &subactor_uid, &request, &mut granted).await;

    lock.clear_request_cancel();
    lock.clear_local_task();

    if let Err(e) = result {
        if let DebugError::Rpc(RpcError::ContextCancelled { reason, .. }) = &e {
            warn!(%reason, "root actor cancelled the debug lock");
        }
        match granted.take() {
            // failed before the grant: the breakpoint entry is still waiting
            // on us and decides what to surface
            Some(tx) => {
                let _ = tx.send(Err(e));
            }
            None => debug!(error = %e, "debugger request failed after grant"),
        }
    }
    debug!("exiting debugger request task");
}

async fn hijack_root_stdin(
    actor: &Arc<dyn ActorRuntime>,
    lock: &DebugLock,
    subactor_uid: &ActorId,
    request: &CancellationToken,
    granted: &mut Option<oneshot::Sender<Grant>>,
) -> Result<(), DebugError> {
    let portal = actor.root_portal();
    let (status, mut chan) = portal.open_lock_context(subactor_uid.clone()).await?;
    if status != LockStatus::Locked {
        return Err(RpcError::Protocol(format!("unexpected lock handshake: {status}")).into());
    }
    debug!("locked context with root");

    let complete = lock.ensure_pdb_complete();

    // unblock the local caller; it runs the REPL while we sleep here
    if let Some(tx) = granted.take() {
        let _ = tx.send(Ok(request.clone()));
    }

    tokio::select! {
        () = complete.wait() => {}
        () = request.cancelled() => {}
    }

    chan.send(ReplMsg::Unlock).await?;

    // sync with lease-task termination
    let outcome = chan.result().await?;
    if outcome != LeaseOutcome::UnlockComplete {
        return Err(RpcError::Protocol(format!("unexpected lease outcome: {outcome}")).into());
    }
    Ok(())
}

/// Scoped acquisition of the tree-wide debug lock without entering a REPL.
///
/// For actors that do not need the debugger themselves but must keep the
/// root's TTY quiet across a block — e.g. a nursery-owning actor that would
/// otherwise clobber a child already in debug. No-op when debug mode is
/// off.
pub async fn acquire_debug_lock(
    actor: &Arc<dyn ActorRuntime>,
    subactor_uid: ActorId,
) -> Result<DebugLockGuard, DebugError> {
    if !actor.debug_mode() {
        return Ok(DebugLockGuard { request: None, task: None });
    }

    let (tx, rx) = oneshot::channel();
    let task = tokio::spawn(wait_for_parent_stdin_hijack(actor.clone(), subactor_uid, tx));

    match rx.await {
        Ok(Ok(request)) => Ok(DebugLockGuard { request: Some(request), task: Some(task) }),
        Ok(Err(e)) => {
            let _ = task.await;
            Err(e)
        }
        Err(_) => {
            let _ = task.await;
            Err(DebugError::RequestAborted)
        }
    }
}

/// Holds the tree-wide debug lock until released.
pub struct DebugLockGuard {
    request: Option<CancellationToken>,
    task: Option<JoinHandle<()>>,
}

impl DebugLockGuard {
    /// Release the lock and wait for the requester to close out its context
    /// with the root.
    pub async fn release(mut self) {
        if let Some(request) = self.request.take() {
            request.cancel();
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for DebugLockGuard {
    fn drop(&mut self) {
        // best effort if the guard is dropped without an explicit release;
        // the requester still sends pdb_unlock on its way out
        if let Some(request) = self.request.take() {
            request.cancel();
        }
    }
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
