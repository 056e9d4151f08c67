// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Async coordination primitives: strict-FIFO mutex and one-shot event.

mod event;
mod fifo_lock;

pub use event::Event;
pub use fifo_lock::{FifoLock, FifoLockError};
