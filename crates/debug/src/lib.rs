// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! troupe-debug: the tree-wide debugger mutex.
//!
//! Coordinates exclusive, interactive terminal access across a tree of actor
//! processes. When any task in any actor hits a breakpoint or an uncaught
//! error, exactly one task at a time is granted synchronous control of the
//! root process's stdio so a human can drive a line-oriented REPL, while
//! every other task in the tree waits without clobbering the terminal,
//! deadlocking, or losing the ability to be cancelled.
//!
//! The root owns the canonical FIFO mutex ([`lock::DebugLock`]). A child
//! that wants the terminal opens an RPC context to the root's lease task
//! ([`lease::lock_tty_for_child`]) through a requester task running in the
//! child ([`request::wait_for_parent_stdin_hijack`]). While any session is
//! in flight, the SIGINT shield ([`sigint`]) keeps Ctrl-C from tearing down
//! the coordination that must survive to release the lock.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod breakpoint;
mod drain;
pub mod env;
mod error;
mod lease;
mod lock;
mod repl;
mod request;
mod rpc;
mod runtime;
mod sigint;

pub use breakpoint::{
    breakpoint, breakpoint_in, enter_debugger, maybe_enter_post_mortem, post_mortem,
    post_mortem_in, DebugFn,
};
pub use drain::{maybe_wait_for_debugger, DrainOpts};
pub use error::{is_multi_cancelled, DebugError, RpcError, SpawnError};
pub use lease::{lock_tty_for_child, LeaseError};
pub use lock::DebugLock;
pub use repl::{LineRepl, Repl, ReplError};
pub use request::{acquire_debug_lock, wait_for_parent_stdin_hijack, DebugLockGuard};
pub use rpc::{open_lock_context, serve_lock_context, FramedLeaseChannel};
pub use runtime::{
    clear_current_actor, current_actor, current_task_name, set_current_actor, with_task_name,
    ActorRuntime, LeaseChannel, RootPortal, ServerCtx,
};
pub use sigint::{decide, handle_interrupt, run_sigint_listener, SigintAction, SigintCtx};

#[cfg(any(test, feature = "test-support"))]
pub mod testing;
