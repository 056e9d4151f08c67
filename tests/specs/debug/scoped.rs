// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scoped acquisition: holding the lock across a block without a REPL
//! still excludes debugger sessions from other children.

use crate::prelude::*;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn scoped_hold_excludes_a_debugging_child() {
    init_tracing();
    let tree = TestTree::new();
    let root = tree.root();
    let alpha = tree.spawn_child("alpha");
    let beta = tree.spawn_child("beta");

    // alpha holds the tty lock without running a repl
    let actor_alpha = runtime(&alpha);
    let guard = acquire_debug_lock(&actor_alpha, alpha.uid()).await.unwrap();
    assert_eq!(root.debug_lock().holder(), Some(alpha.uid()));

    // beta's breakpoint queues behind the scoped hold
    let beta_bp = {
        let actor = runtime(&beta);
        tokio::spawn(with_task_name("bp-beta", async move { breakpoint_in(&actor).await }))
    };
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(beta.scripted_repl().session_count(), 0, "beta ran during the scoped hold");

    guard.release().await;

    beta_bp.await.unwrap().unwrap();
    assert_eq!(beta.scripted_repl().session_count(), 1);
    wait_until("drain after beta", || root.debug_lock().is_drained()).await;

    beta.join_services().await;
}
