// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types of the debug subsystem.

use smol_str::SmolStr;
use thiserror::Error;
use troupe_core::FifoLockError;
use troupe_wire::WireError;

use crate::repl::ReplError;

/// Failure to start a task on an actor's service nursery.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SpawnError {
    /// The nursery is closed because the actor is mid-cancellation.
    #[error("service nursery closed: actor is cancelling")]
    Cancelling,
}

/// Errors surfaced by the RPC context of a debug session.
#[derive(Debug, Error)]
pub enum RpcError {
    /// The peer ended the context before it completed. `enter_debugger`
    /// is false when the peer asked us not to recurse into a crash REPL
    /// over this cancellation (e.g. blocklist rejections).
    #[error("context cancelled by peer: {reason}")]
    ContextCancelled { reason: String, enter_debugger: bool },

    #[error("peer connection lost")]
    PeerLost,

    #[error("context closed before completing")]
    Closed,

    #[error("protocol violation: {0}")]
    Protocol(String),

    #[error(transparent)]
    Wire(#[from] WireError),
}

/// Errors from the breakpoint entry and its collaborators.
#[derive(Debug, Error)]
pub enum DebugError {
    #[error("no actor runtime registered in this process")]
    NoRuntime,

    /// A release was attempted by a task that does not own the mutex while
    /// another task is recorded as the owner. This is a programming error;
    /// the lock state can no longer be trusted.
    #[error("debug lock corrupted: released by {task} while owned by {owner}")]
    LockCorrupted { task: SmolStr, owner: SmolStr },

    /// The requester task ended before delivering a grant or an error.
    #[error("debugger request ended before the lock was granted")]
    RequestAborted,

    /// The surrounding runtime is being cancelled.
    #[error("actor runtime is cancelling")]
    Cancelled,

    #[error(transparent)]
    Lock(#[from] FifoLockError),

    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error(transparent)]
    Repl(#[from] ReplError),
}

impl DebugError {
    /// True when the error is the REPL's own `quit` command.
    pub fn is_quit(&self) -> bool {
        matches!(self, DebugError::Repl(ReplError::Quit))
    }
}

/// Classify errors that are really tree-wide teardown in disguise.
///
/// Post-mortem entry is suppressed for these: during a runtime-wide cancel
/// there are races between the parent killing comms and the child trying to
/// contact it for the tty lock, so entering the debugger would only hang.
pub fn is_multi_cancelled(err: &DebugError) -> bool {
    match err {
        DebugError::Cancelled => true,
        DebugError::Rpc(RpcError::ContextCancelled { enter_debugger, .. }) => !enter_debugger,
        _ => false,
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
