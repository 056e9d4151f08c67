// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Payload values of a debug-lock session.
//!
//! The serialized forms are fixed protocol strings; changing them breaks
//! sessions against peers running other versions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Handshake value delivered to the requesting child when the root has
/// decided on its request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LockStatus {
    /// The root holds the TTY mutex on the child's behalf; the child may
    /// run its REPL.
    #[serde(rename = "Locked")]
    Locked,
    /// The child's identity is blocklisted; the session ends here.
    #[serde(rename = "pdb_lock_blocked")]
    Blocked,
}

/// Stream messages a child sends during a session. Exactly one is ever
/// sent: the release notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplMsg {
    #[serde(rename = "pdb_unlock")]
    Unlock,
}

/// Terminal result of the root-side lease task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeaseOutcome {
    /// The mutex was released and the session completed.
    #[serde(rename = "pdb_unlock_complete")]
    UnlockComplete,
    /// Sentinel result of a blocklisted request.
    #[serde(rename = "pdb_lock_blocked")]
    Blocked,
}

impl fmt::Display for LockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockStatus::Locked => write!(f, "Locked"),
            LockStatus::Blocked => write!(f, "pdb_lock_blocked"),
        }
    }
}

impl fmt::Display for LeaseOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeaseOutcome::UnlockComplete => write!(f, "pdb_unlock_complete"),
            LeaseOutcome::Blocked => write!(f, "pdb_lock_blocked"),
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
