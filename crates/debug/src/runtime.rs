// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Interfaces consumed from the surrounding actor runtime.
//!
//! The debug subsystem and the RPC layer call into each other: the requester
//! opens a context to the root, and the RPC layer invokes the lease task as
//! a served endpoint. The cycle is broken here at interface level: the
//! runtime satisfies these narrow traits, the subsystem never sees concrete
//! runtime types.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use parking_lot::RwLock;
use smol_str::SmolStr;
use troupe_core::ActorId;
use troupe_wire::{LeaseOutcome, LockStatus, ReplMsg};

use crate::error::{DebugError, RpcError, SpawnError};
use crate::lock::DebugLock;
use crate::repl::Repl;

/// The per-process actor runtime, as the debug subsystem sees it.
pub trait ActorRuntime: Send + Sync {
    /// This process's identity in the tree.
    fn uid(&self) -> ActorId;

    /// Whether this process is the tree root (the terminal owner).
    fn is_root(&self) -> bool;

    /// Tree-wide debug mode flag.
    fn debug_mode(&self) -> bool;

    /// Whether the channel to the parent actor is currently open.
    /// Always false in the root.
    fn parent_connected(&self) -> bool;

    /// Probe the peer-channel registry for an identity.
    ///
    /// `None` when no channels are known for the identity, otherwise
    /// whether any known channel is still connected.
    fn peer_status(&self, uid: &ActorId) -> Option<bool>;

    /// Whether this runtime has already been asked to cancel.
    fn cancel_requested(&self) -> bool;

    /// Request cooperative cancellation of the runtime.
    fn cancel_soon(&self);

    /// Force-unwind the event loop. Called when an interrupt arrives after
    /// cancellation was already requested and ignored.
    fn force_interrupt(&self);

    /// Start a long-lived task on the actor's service nursery so it outlives
    /// the caller's own task scope.
    fn spawn_service(&self, task: BoxFuture<'static, ()>) -> Result<(), SpawnError>;

    /// The per-process debug lock state.
    fn debug_lock(&self) -> Arc<DebugLock>;

    /// Portal for opening RPC contexts against the tree root.
    fn root_portal(&self) -> Arc<dyn RootPortal>;

    /// Construct a REPL bound to this process's terminal.
    fn new_repl(&self) -> Arc<dyn Repl>;
}

/// Opens the debug-lock context against the root actor.
#[async_trait]
pub trait RootPortal: Send + Sync {
    /// Open a `lock_tty_for_child` context for `subactor_uid` and wait for
    /// the started handshake.
    async fn open_lock_context(
        &self,
        subactor_uid: ActorId,
    ) -> Result<(LockStatus, Box<dyn LeaseChannel>), RpcError>;
}

/// Client side of an open lease context, after the started handshake.
#[async_trait]
pub trait LeaseChannel: Send {
    /// Send one in-session stream message to the root.
    async fn send(&mut self, msg: ReplMsg) -> Result<(), RpcError>;

    /// Wait for the context's terminal result.
    async fn result(&mut self) -> Result<LeaseOutcome, RpcError>;
}

/// Server side of a lease context, as handed to the lease task by the RPC
/// layer.
#[async_trait]
pub trait ServerCtx: Send {
    /// Deliver the started handshake value to the caller.
    async fn started(&mut self, status: LockStatus) -> Result<(), RpcError>;

    /// Receive the next in-session stream message. Fails with
    /// [`RpcError::PeerLost`] when the caller's channel dies.
    async fn recv(&mut self) -> Result<ReplMsg, RpcError>;

    /// Cancel the context with a diagnostic reason.
    async fn cancel(&mut self, reason: &str) -> Result<(), RpcError>;

    /// Control whether the caller should still enter its debugger when it
    /// surfaces this context's cancellation.
    fn set_enter_debugger_on_cancel(&mut self, enabled: bool);
}

// The SIGINT handler and the bare `breakpoint()` entry point have no actor
// parameter to hand around; they find the runtime here. Set once at runtime
// startup, cleared at teardown.
static CURRENT_ACTOR: RwLock<Option<Arc<dyn ActorRuntime>>> = RwLock::new(None);

/// Register the process-wide actor runtime.
pub fn set_current_actor(actor: Arc<dyn ActorRuntime>) {
    *CURRENT_ACTOR.write() = Some(actor);
}

/// Clear the process-wide actor runtime at teardown.
pub fn clear_current_actor() {
    *CURRENT_ACTOR.write() = None;
}

/// The process-wide actor runtime, if one is registered.
pub fn current_actor() -> Result<Arc<dyn ActorRuntime>, DebugError> {
    CURRENT_ACTOR.read().clone().ok_or(DebugError::NoRuntime)
}

tokio::task_local! {
    static TASK_NAME: SmolStr;
}

/// Run `fut` with a task name visible to [`current_task_name`].
///
/// The runtime wraps every logical task it starts; the name is what the
/// lock records as `local_task_in_debug` and what tags mutex ownership.
pub async fn with_task_name<F>(name: &str, fut: F) -> F::Output
where
    F: std::future::Future,
{
    TASK_NAME.scope(SmolStr::new(name), fut).await
}

/// Name of the current logical task, or `"main"` outside any named scope.
pub fn current_task_name() -> SmolStr {
    TASK_NAME.try_with(SmolStr::clone).unwrap_or_else(|_| SmolStr::new_static("main"))
}

#[cfg(test)]
#[path = "runtime_tests.rs"]
mod tests;
