// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-context frame envelope.
//!
//! A debug-lock session is one RPC context: the child opens it, the root
//! answers with a `Started` handshake, the child sends stream messages, and
//! the context ends with either a `Result` or a `Cancelled` frame. The
//! transport must preserve frame order within a context.

use serde::{Deserialize, Serialize};
use troupe_core::ActorId;

use crate::session::{LeaseOutcome, LockStatus, ReplMsg};

/// Endpoint name of the root-side lease task.
pub const LOCK_TTY_ENDPOINT: &str = "lock_tty_for_child";

/// Ordered frames of one debug-lock context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ContextFrame {
    /// Child → root: open the context against a served endpoint.
    Open { endpoint: String, subactor_uid: ActorId },

    /// Root → child: the handshake value (grant or blocklist verdict).
    Started { value: LockStatus },

    /// Child → root: in-session stream message.
    Stream { msg: ReplMsg },

    /// Root → child: terminal result; the context is finished.
    Result { value: LeaseOutcome },

    /// Either direction: the context was cancelled before completing.
    Cancelled {
        reason: String,
        /// Whether the receiving side should still enter its debugger when
        /// it surfaces this cancellation. Cleared for blocklist rejections
        /// so a rejected child does not recurse into a crash REPL.
        #[serde(default = "default_true")]
        enter_debugger: bool,
    },
}

fn default_true() -> bool {
    true
}

impl ContextFrame {
    /// Frame name for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            ContextFrame::Open { .. } => "open",
            ContextFrame::Started { .. } => "started",
            ContextFrame::Stream { .. } => "stream",
            ContextFrame::Result { .. } => "result",
            ContextFrame::Cancelled { .. } => "cancelled",
        }
    }
}
