// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Interrupts during live sessions: the shield swallows Ctrl-C while a
//! reachable child drives the REPL and cancels once the holder is gone.

use crate::prelude::*;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn interrupt_during_child_session_is_swallowed() {
    init_tracing();
    let tree = TestTree::new();
    let root = tree.root();
    let alpha = tree.spawn_child("alpha");
    let drive = alpha.scripted_repl().manual();

    let bp = {
        let actor = runtime(&alpha);
        tokio::spawn(with_task_name("bp-alpha", async move { breakpoint_in(&actor).await }))
    };
    wait_until("alpha repl session", || alpha.scripted_repl().session_count() == 1).await;

    // a human hits Ctrl-C at the root terminal
    let root_rt = runtime(&root);
    assert_eq!(handle_interrupt(&root_rt), SigintAction::Swallow);
    assert_eq!(root.debug_lock().holder(), Some(alpha.uid()));
    assert_eq!(root.cancel_count(), 0);

    // the session is still usable afterwards
    drive.continue_session();
    bp.await.unwrap().unwrap();
    wait_until("drain after session", || root.debug_lock().is_drained()).await;

    alpha.join_services().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn interrupt_with_vanished_holder_cancels_the_root() {
    init_tracing();
    let tree = TestTree::new();
    let root = tree.root();
    let alpha = tree.spawn_child("alpha");
    let drive = alpha.scripted_repl().manual();

    let bp = {
        let actor = runtime(&alpha);
        tokio::spawn(with_task_name("bp-alpha", async move { breakpoint_in(&actor).await }))
    };
    wait_until("alpha repl session", || alpha.scripted_repl().session_count() == 1).await;

    // alpha dies; the registry now shows its channel down
    tree.kill_child(&alpha.uid());
    wait_until("lease released after peer loss", || root.debug_lock().is_drained()).await;

    // holder is already cleared by the lease teardown, so a late interrupt
    // takes the default cancel path in the root
    let root_rt = runtime(&root);
    assert_eq!(handle_interrupt(&root_rt), SigintAction::CancelRuntime);
    assert_eq!(root.cancel_count(), 1);

    drive.quit_session();
    let _ = bp.await.unwrap();
    alpha.join_services().await;
}
