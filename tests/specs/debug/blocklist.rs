// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Blocklisted identities are rejected before the mutex and other children
//! are unaffected.

use crate::prelude::*;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn blocked_child_is_rejected_without_touching_the_mutex() {
    init_tracing();
    let tree = TestTree::new();
    let root = tree.root();
    let alpha = tree.spawn_child("alpha");
    let beta = tree.spawn_child("beta");

    root.debug_lock().block(alpha.uid());

    let actor = runtime(&alpha);
    let err = match with_task_name("bp-alpha", breakpoint_in(&actor)).await {
        Err(e) => e,
        Ok(()) => panic!("blocked child entered the debugger"),
    };
    match err {
        DebugError::Rpc(RpcError::ContextCancelled { reason, enter_debugger }) => {
            assert!(reason.contains("blocked"), "unexpected reason: {reason}");
            assert!(!enter_debugger, "a rejection must not trigger a crash repl");
        }
        other => panic!("expected ContextCancelled, got {:?}", other),
    }

    assert_eq!(alpha.scripted_repl().session_count(), 0);
    assert!(root.debug_lock().is_drained(), "mutex untouched by the blocked request");
    assert!(alpha.debug_lock().local_task().is_none());

    // other children are unaffected
    let actor = runtime(&beta);
    with_task_name("bp-beta", breakpoint_in(&actor)).await.unwrap();
    assert_eq!(beta.scripted_repl().session_count(), 1);
    wait_until("drain after beta", || root.debug_lock().is_drained()).await;

    // unblocking lets alpha back in
    root.debug_lock().unblock(&alpha.uid());
    let actor = runtime(&alpha);
    with_task_name("bp-alpha-2", breakpoint_in(&actor)).await.unwrap();
    assert_eq!(alpha.scripted_repl().session_count(), 1);

    alpha.join_services().await;
    beta.join_services().await;
}
