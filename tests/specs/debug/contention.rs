// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Two children contend for the debugger: grants are serialized in FIFO
//! order and the drain flag tracks the whole episode.

use crate::prelude::*;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn two_children_contend_one_wins_then_the_other() {
    init_tracing();
    let tree = TestTree::new();
    let root = tree.root();
    let alpha = tree.spawn_child("alpha");
    let beta = tree.spawn_child("beta");

    let drive_alpha = alpha.scripted_repl().manual();
    let drive_beta = beta.scripted_repl().manual();

    let root_lock = root.debug_lock();
    assert!(root_lock.is_drained());

    // alpha hits its breakpoint first and wins the lock
    let alpha_bp = {
        let actor = runtime(&alpha);
        tokio::spawn(with_task_name("bp-alpha", async move { breakpoint_in(&actor).await }))
    };
    wait_until("alpha repl session", || alpha.scripted_repl().session_count() == 1).await;
    assert!(!root_lock.is_drained(), "drain unset from first acquire");
    assert_eq!(root_lock.holder(), Some(alpha.uid()));

    // beta queues up behind alpha and must not get a session yet
    let beta_bp = {
        let actor = runtime(&beta);
        tokio::spawn(with_task_name("bp-beta", async move { breakpoint_in(&actor).await }))
    };
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(beta.scripted_repl().session_count(), 0, "beta granted while alpha held");
    assert_eq!(root_lock.holder(), Some(alpha.uid()));

    // alpha leaves the repl; beta's grant must follow, strictly after
    drive_alpha.continue_session();
    alpha_bp.await.unwrap().unwrap();

    wait_until("beta repl session", || beta.scripted_repl().session_count() == 1).await;
    assert_eq!(root_lock.holder(), Some(beta.uid()));
    assert!(!root_lock.is_drained(), "drain stays unset across back-to-back sessions");

    drive_beta.continue_session();
    beta_bp.await.unwrap().unwrap();

    wait_until("drain after both sessions", || root_lock.is_drained()).await;
    assert!(root_lock.holder().is_none());
    assert_eq!(root.serve_count(), 2);

    alpha.join_services().await;
    beta.join_services().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn session_state_is_clean_between_sessions() {
    init_tracing();
    let tree = TestTree::new();
    let root = tree.root();
    let alpha = tree.spawn_child("alpha");

    // back-to-back sessions from the same child, auto-continued
    for round in 0..3 {
        let actor = runtime(&alpha);
        let task = format!("bp-{round}");
        with_task_name(&task, breakpoint_in(&actor)).await.unwrap();
        wait_until("drain between sessions", || root.debug_lock().is_drained()).await;
        assert!(root.debug_lock().holder().is_none());
        assert!(alpha.debug_lock().local_task().is_none());
    }
    assert_eq!(alpha.scripted_repl().session_count(), 3);
    assert_eq!(root.serve_count(), 3);
    alpha.join_services().await;
}
