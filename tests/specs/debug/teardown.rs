// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Root teardown defers while a descendant still owns the TTY.

use crate::prelude::*;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn teardown_waits_for_an_active_session() {
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

    // the root errors and starts tearing down, but alpha is mid-session
    let waiter = {
        let actor = runtime(&root);
        tokio::spawn(async move {
            let opts = DrainOpts {
                poll_steps: 50,
                poll_delay: Duration::from_millis(20),
                child_in_debug: false,
            };
            maybe_wait_for_debugger(&actor, opts).await;
        })
    };

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(!waiter.is_finished(), "teardown proceeded while a child held the tty");

    drive.continue_session();
    bp.await.unwrap().unwrap();

    tokio::time::timeout(Duration::from_secs(5), waiter).await.unwrap().unwrap();
    assert!(root.debug_lock().is_drained());

    alpha.join_services().await;
}
