// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire protocol for debug-lock sessions between a child actor and the root.
//!
//! Wire format: 4-byte length prefix (big-endian) + JSON payload. One RPC
//! context per session; frames on a context are strictly ordered.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod codec;
mod frame;
mod session;

pub use codec::{decode, encode, read_frame, write_frame, WireError, MAX_FRAME_LEN};
pub use frame::{ContextFrame, LOCK_TTY_ENDPOINT};
pub use session::{LeaseOutcome, LockStatus, ReplMsg};
