// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Debugger-aware SIGINT policy.
//!
//! While a debug session is in flight anywhere in the tree, Ctrl-C at the
//! terminal must not unwind the root or tear down IPC mid-session: the
//! coordination has to survive long enough to release the lock. Children
//! swallow interrupts while their parent supervises them; the root swallows
//! while a reachable descendant drives the REPL, and falls back to normal
//! cancellation the moment the recorded holder cannot be reached.
//!
//! Interrupts arrive as messages on the scheduler (`tokio::signal`), never
//! as bare handler context, so the policy may read lock state freely.

use std::sync::Arc;

use tracing::{info, warn};
use troupe_core::ActorId;

use crate::env;
use crate::lock::DebugLock;
use crate::runtime::ActorRuntime;

/// What to do with an incoming interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigintAction {
    /// Ignore the signal; a debug session owns the terminal.
    Swallow,
    /// Ignore the signal, but revoke the root-side lease and disengage the
    /// shield so the next interrupt tears down normally.
    CancelLease,
    /// Request cooperative cancellation of this runtime.
    CancelRuntime,
    /// Cancellation was already requested and ignored; force-unwind.
    ForceInterrupt,
}

/// Snapshot of everything the decision reads.
#[derive(Debug, Clone, Default)]
pub struct SigintCtx {
    pub is_root: bool,
    /// Tree-wide identity believed to hold the TTY.
    pub holder: Option<ActorId>,
    /// Peer-registry probe for the holder: `None` when no channels are
    /// known for it, otherwise whether any channel is live.
    pub holder_channels: Option<bool>,
    pub parent_connected: bool,
    /// A local REPL is engaged in this process.
    pub repl_active: bool,
    /// The root-side lease cancel handle exists and is not yet cancelled.
    pub lease_cancellable: bool,
    /// This runtime has already been asked to cancel.
    pub cancel_requested: bool,
}

fn do_cancel(ctx: &SigintCtx) -> SigintAction {
    if ctx.cancel_requested {
        SigintAction::ForceInterrupt
    } else {
        SigintAction::CancelRuntime
    }
}

/// Decide what an interrupt means given the current lock state.
pub fn decide(ctx: &SigintCtx) -> SigintAction {
    // A recorded holder whose known channels are all dead is unreachable:
    // never hang on a vanished child.
    if ctx.holder.is_some() && ctx.holder_channels == Some(false) {
        return do_cancel(ctx);
    }

    if ctx.is_root {
        if ctx.holder.is_some() && ctx.holder_channels == Some(true) {
            // a live descendant drives the REPL
            return SigintAction::Swallow;
        }
        if ctx.lease_cancellable {
            return SigintAction::CancelLease;
        }
        if ctx.repl_active {
            // the root itself is debugging
            return SigintAction::Swallow;
        }
        return do_cancel(ctx);
    }

    // children defer to the supervising parent while the channel is alive
    if !ctx.parent_connected {
        return do_cancel(ctx);
    }
    SigintAction::Swallow
}

fn snapshot(actor: &Arc<dyn ActorRuntime>, lock: &DebugLock) -> SigintCtx {
    let holder = lock.holder();
    let holder_channels = holder.as_ref().and_then(|uid| actor.peer_status(uid));
    SigintCtx {
        is_root: actor.is_root(),
        holder,
        holder_channels,
        parent_connected: actor.parent_connected(),
        repl_active: lock.repl().is_some(),
        lease_cancellable: lock.lease_cancel().is_some_and(|token| !token.is_cancelled()),
        cancel_requested: actor.cancel_requested(),
    }
}

/// Handle one interrupt against this actor's lock state. Returns the action
/// taken.
pub fn handle_interrupt(actor: &Arc<dyn ActorRuntime>) -> SigintAction {
    let lock = actor.debug_lock();
    let ctx = snapshot(actor, &lock);
    let action = decide(&ctx);

    match action {
        SigintAction::Swallow => match &ctx.holder {
            Some(holder) if !ctx.is_root || ctx.holder_channels == Some(true) => {
                info!(%holder, "ignoring SIGINT, actor in debug mode");
            }
            _ => info!("ignoring SIGINT while in debug mode"),
        },
        SigintAction::CancelLease => {
            info!("ignoring SIGINT; revoking the root-side tty lease");
            if let Some(lease) = lock.lease_cancel() {
                lease.cancel();
            }
            // revert to the default disposition asap so a second Ctrl-C
            // tears down normally
            lock.unshield_sigint();
        }
        SigintAction::CancelRuntime => {
            warn!(
                holder = ?ctx.holder.as_ref().map(|uid| uid.to_string()),
                "no reachable debugger holder; allowing SIGINT propagation"
            );
            actor.cancel_soon();
        }
        SigintAction::ForceInterrupt => {
            warn!("runtime already cancelling; forcing interrupt");
            actor.force_interrupt();
        }
    }

    if matches!(action, SigintAction::Swallow | SigintAction::CancelLease) {
        // alert the user that input is still expected: nothing happened in
        // the REPL because the signal was ignored
        if let Some(repl) = lock.repl() {
            if env::shell_name().as_deref() == Some("xonsh") {
                repl.redraw_prompt();
            }
            repl.flush();
        }
    }

    action
}

/// Per-process interrupt listener.
///
/// Routes interrupts through the shield policy while a session is in
/// flight, and through the runtime's default cancel path otherwise.
/// Returns once an interrupt forces unwinding.
pub async fn run_sigint_listener(actor: Arc<dyn ActorRuntime>) -> std::io::Result<()> {
    let mut interrupts =
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt())?;

    while interrupts.recv().await.is_some() {
        let action = if actor.debug_lock().is_shielded() {
            handle_interrupt(&actor)
        } else if actor.cancel_requested() {
            actor.force_interrupt();
            SigintAction::ForceInterrupt
        } else {
            actor.cancel_soon();
            SigintAction::CancelRuntime
        };
        if action == SigintAction::ForceInterrupt {
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "sigint_tests.rs"]
mod tests;
