// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared helpers for scenario specs.

pub use std::sync::Arc;
pub use std::time::Duration;

pub use troupe_debug::testing::{TestActor, TestTree};
pub use troupe_debug::{
    acquire_debug_lock, breakpoint_in, handle_interrupt, maybe_wait_for_debugger, with_task_name,
    ActorRuntime, DebugError, DrainOpts, RpcError, SigintAction,
};

/// Widen a test actor to the runtime handle the subsystem consumes.
pub fn runtime(actor: &Arc<TestActor>) -> Arc<dyn ActorRuntime> {
    let widened: Arc<dyn ActorRuntime> = actor.clone();
    widened
}

/// Poll until `cond` holds, failing the test after a generous deadline.
pub async fn wait_until(what: &str, mut cond: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !cond() {
        assert!(tokio::time::Instant::now() < deadline, "timed out waiting for {what}");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Initialize test logging once; repeat calls are no-ops.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
