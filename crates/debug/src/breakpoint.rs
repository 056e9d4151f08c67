// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Breakpoint entry: suspend this task until it is safe to run the REPL
//! here, then run it.
//!
//! Classifies the caller — root vs child, new vs reentrant — then either
//! drives the child-side requester or acquires the root-local mutex
//! directly, and finally invokes the synchronous REPL on the event-loop
//! thread. Concurrent tasks in this actor suspend naturally because no
//! checkpoint is reached until the REPL returns.

use std::sync::Arc;

use tokio::sync::oneshot;
use tracing::{debug, warn};
use troupe_core::ActorId;

use crate::env;
use crate::error::{is_multi_cancelled, DebugError, SpawnError};
use crate::repl::{Repl, ReplError};
use crate::request::wait_for_parent_stdin_hijack;
use crate::runtime::{current_actor, current_task_name, ActorRuntime};

/// The synchronous REPL invocation: either a voluntary stop (`set_trace`)
/// or crash inspection (`post_mortem`).
pub type DebugFn = Box<dyn FnOnce(&ActorId, &dyn Repl) -> Result<(), ReplError> + Send>;

/// Suspend the calling task, acquire the tree-wide TTY lock, run the
/// voluntary-stop REPL, resume.
pub async fn breakpoint() -> Result<(), DebugError> {
    let actor = current_actor()?;
    breakpoint_in(&actor).await
}

/// [`breakpoint`] against an explicit runtime handle.
pub async fn breakpoint_in(actor: &Arc<dyn ActorRuntime>) -> Result<(), DebugError> {
    enter_debugger(actor, Box::new(|uid, repl| repl.set_trace(uid))).await
}

/// Like [`breakpoint`], but enters crash inspection with an error report.
pub async fn post_mortem(report: impl Into<String>) -> Result<(), DebugError> {
    let actor = current_actor()?;
    post_mortem_in(&actor, report).await
}

/// [`post_mortem`] against an explicit runtime handle.
pub async fn post_mortem_in(
    actor: &Arc<dyn ActorRuntime>,
    report: impl Into<String>,
) -> Result<(), DebugError> {
    let report = report.into();
    enter_debugger(actor, Box::new(move |uid, repl| repl.post_mortem(uid, &report))).await
}

/// Enter crash inspection for `err` unless it should be suppressed.
///
/// Suppressed when debug mode is off, when the error is the REPL's own
/// quit (no re-entering the debugger the user just left), and when the
/// error is really tree-wide teardown. Returns whether the debugger ran.
pub async fn maybe_enter_post_mortem(
    actor: &Arc<dyn ActorRuntime>,
    err: &DebugError,
) -> Result<bool, DebugError> {
    if !actor.debug_mode() || err.is_quit() || is_multi_cancelled(err) {
        return Ok(false);
    }

    debug!("actor crashed, entering debug mode");
    let entered = post_mortem_in(actor, err.to_string()).await;
    actor.debug_lock().release(&current_task_name())?;
    match entered {
        Ok(()) | Err(DebugError::Repl(ReplError::Quit)) => Ok(true),
        Err(e) => Err(e),
    }
}

/// The breakpoint entry proper.
pub async fn enter_debugger(
    actor: &Arc<dyn ActorRuntime>,
    debug_func: DebugFn,
) -> Result<(), DebugError> {
    let lock = actor.debug_lock();
    let task = current_task_name();
    let repl = actor.new_repl();

    lock.shield_sigint();
    lock.refresh_pdb_complete();

    if !actor.is_root() && actor.parent_connected() {
        // child actor with a live parent channel
        match lock.local_task() {
            Some(current) if current == task => {
                // reentrant entry by the task already in debug: yield once so
                // cancellation can be delivered, then nothing to do
                tokio::task::yield_now().await;
                return Ok(());
            }
            Some(current) => {
                // another task in this actor holds the lock; block until it
                // finishes its session
                warn!(actor = %actor.uid(), in_debug = %current, "local task already has the debug lock, waiting");
                if let Some(complete) = lock.pdb_complete() {
                    complete.wait().await;
                }
                // let the released task restore signal state before we start
                // a fresh session on a fresh completion event
                tokio::time::sleep(env::reentry_settle()).await;
                lock.refresh_pdb_complete();
            }
            None => {}
        }

        // mark this actor as in debug mode to short-circuit reentries before
        // they reach the root
        lock.set_local_task(task.clone());

        let (tx, rx) = oneshot::channel();
        let hijack = wait_for_parent_stdin_hijack(Arc::clone(actor), actor.uid(), tx);
        if let Err(SpawnError::Cancelling) = actor.spawn_service(Box::pin(hijack)) {
            // the service nursery is gone and we are mid-cancellation; do
            // not leave the root waiting on a request that cannot complete
            debug!("actor is cancelling; dropping debugger request");
            lock.release(&task)?;
            return Ok(());
        }

        match rx.await {
            Ok(Ok(_request)) => {
                lock.set_repl(Arc::clone(&repl));
            }
            Ok(Err(e)) => {
                lock.release(&task)?;
                return Err(e);
            }
            Err(_) => {
                lock.release(&task)?;
                if actor.cancel_requested() {
                    return Ok(());
                }
                return Err(DebugError::RequestAborted);
            }
        }
    } else if actor.is_root() {
        if lock.holder().as_ref() == Some(&actor.uid()) {
            // reentrant root process already has it
            return Ok(());
        }

        // entering the REPL below is synchronous, so the mutex must be
        // released from the REPL's completion hooks rather than a scope exit
        if lock.mutex_locked() {
            warn!(
                holder = ?lock.holder().map(|uid| uid.to_string()),
                "root actor contending for an active tty lock"
            );
        }
        lock.acquire(&task).await?;

        lock.set_holder(actor.uid());
        lock.set_local_task(task.clone());
        lock.set_repl(Arc::clone(&repl));
    }
    // A child without a live parent channel has nobody to coordinate with;
    // its REPL runs locally unlocked.

    debug!(actor = %actor.uid(), "entering the synchronous world of the debugger");
    match debug_func(&actor.uid(), repl.as_ref()) {
        Ok(()) => Ok(()),
        Err(e) => {
            // quit (and any other REPL failure) releases, then unwinds the
            // task that invoked the breakpoint
            lock.release(&task)?;
            Err(e.into())
        }
    }
}

#[cfg(test)]
#[path = "breakpoint_tests.rs"]
mod tests;
