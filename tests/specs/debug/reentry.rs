// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reentrant breakpoints: the task already in debug gets a no-op, another
//! local task waits for the running session to finish.

use crate::prelude::*;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn same_task_reentry_is_a_noop() {
    init_tracing();
    let tree = TestTree::new();
    let root = tree.root();
    let alpha = tree.spawn_child("alpha");
    let actor = runtime(&alpha);

    // the outer session of this task is still live
    alpha.debug_lock().set_local_task("bp-alpha".into());

    with_task_name("bp-alpha", breakpoint_in(&actor)).await.unwrap();

    assert_eq!(alpha.scripted_repl().session_count(), 0, "reentry must not run a second repl");
    assert_eq!(root.serve_count(), 0, "no second context to the root");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn other_local_task_waits_for_the_running_session() {
    init_tracing();
    let tree = TestTree::new();
    let root = tree.root();
    let alpha = tree.spawn_child("alpha");
    let actor = runtime(&alpha);
    let alpha_lock = alpha.debug_lock();

    // simulate a session held by another task in this actor
    alpha_lock.set_local_task("bp-first".into());
    alpha_lock.refresh_pdb_complete();

    let second_bp = {
        let actor = Arc::clone(&actor);
        tokio::spawn(with_task_name("bp-second", async move { breakpoint_in(&actor).await }))
    };

    // the second task is parked on the completion event
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(alpha.scripted_repl().session_count(), 0);
    assert_eq!(root.serve_count(), 0);

    // first session releases; second proceeds through the root
    alpha_lock.release("bp-first").unwrap();

    second_bp.await.unwrap().unwrap();
    assert_eq!(alpha.scripted_repl().session_count(), 1);
    assert_eq!(root.serve_count(), 1);

    wait_until("drain after second session", || root.debug_lock().is_drained()).await;
    alpha.join_services().await;
}
