// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A child dies mid-session: the root lease observes the peer loss,
//! releases the mutex, and the tree keeps working.

use crate::prelude::*;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn dead_holder_never_strands_the_mutex() {
    init_tracing();
    let tree = TestTree::new();
    let root = tree.root();
    let alpha = tree.spawn_child("alpha");
    let beta = tree.spawn_child("beta");

    let drive_alpha = alpha.scripted_repl().manual();

    // alpha wins the lock and sits in its repl
    let alpha_bp = {
        let actor = runtime(&alpha);
        tokio::spawn(with_task_name("bp-alpha", async move { breakpoint_in(&actor).await }))
    };
    wait_until("alpha repl session", || alpha.scripted_repl().session_count() == 1).await;
    let root_lock = root.debug_lock();
    assert_eq!(root_lock.holder(), Some(alpha.uid()));

    // alpha's process dies without ever sending pdb_unlock
    tree.kill_child(&alpha.uid());

    wait_until("lease released after peer loss", || root_lock.is_drained()).await;
    assert!(root_lock.holder().is_none());

    // a later session from a healthy child works normally
    let actor = runtime(&beta);
    with_task_name("bp-beta", breakpoint_in(&actor)).await.unwrap();
    assert_eq!(beta.scripted_repl().session_count(), 1);
    wait_until("drain after beta", || root_lock.is_drained()).await;

    // unwind alpha's wedged repl; its task sees the dead link and unwinds
    drive_alpha.quit_session();
    let result = alpha_bp.await.unwrap();
    assert!(matches!(result, Err(e) if e.is_quit()));

    alpha.join_services().await;
    beta.join_services().await;
}
