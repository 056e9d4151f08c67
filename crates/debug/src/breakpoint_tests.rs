// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::runtime::{with_task_name, ActorRuntime};
use crate::testing::{SessionKind, TestTree};
use std::sync::Arc;

#[tokio::test]
async fn root_breakpoint_runs_repl_and_releases() {
    let tree = TestTree::new();
    let root = tree.root();
    let actor: Arc<dyn ActorRuntime> = root.clone();
    let lock = root.debug_lock();

    with_task_name("root-bp", breakpoint_in(&actor)).await.unwrap();

    let sessions = root.scripted_repl().sessions();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].kind, SessionKind::SetTrace);
    assert_eq!(sessions[0].actor, root.uid());

    assert!(lock.is_drained());
    assert!(lock.holder().is_none());
    assert!(lock.local_task().is_none());
    assert!(!lock.is_shielded());
}

#[tokio::test]
async fn root_reentrant_breakpoint_is_noop() {
    let tree = TestTree::new();
    let root = tree.root();
    let actor: Arc<dyn ActorRuntime> = root.clone();

    // the root already holds the tty
    root.debug_lock().set_holder(root.uid());

    breakpoint_in(&actor).await.unwrap();
    assert_eq!(root.scripted_repl().session_count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn root_quit_releases_and_unwinds() {
    let tree = TestTree::new();
    let root = tree.root();
    let actor: Arc<dyn ActorRuntime> = root.clone();
    let driver = root.scripted_repl().manual();

    let bp = tokio::spawn(with_task_name("root-bp", async move { breakpoint_in(&actor).await }));
    driver.quit_session();

    let result = bp.await.unwrap();
    assert!(matches!(result, Err(e) if e.is_quit()));
    assert!(root.debug_lock().is_drained());
    assert!(root.debug_lock().holder().is_none());
}

#[tokio::test]
async fn post_mortem_records_a_crash_session() {
    let tree = TestTree::new();
    let root = tree.root();
    let actor: Arc<dyn ActorRuntime> = root.clone();

    with_task_name("pm", post_mortem_in(&actor, "worker panicked")).await.unwrap();

    let sessions = root.scripted_repl().sessions();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].kind, SessionKind::PostMortem);
}

#[tokio::test]
async fn orphan_child_debugs_locally_without_the_root() {
    let tree = TestTree::new();
    let root = tree.root();
    let child = tree.spawn_child("alpha");
    tree.kill_child(&child.uid());
    let actor: Arc<dyn ActorRuntime> = child.clone();

    with_task_name("orphan-bp", breakpoint_in(&actor)).await.unwrap();

    assert_eq!(child.scripted_repl().session_count(), 1);
    assert_eq!(root.serve_count(), 0, "an orphan has nobody to ask");
    assert!(root.debug_lock().is_drained());
}

#[tokio::test]
async fn spawn_failure_during_cancellation_returns_quietly() {
    let tree = TestTree::new();
    let root = tree.root();
    let child = tree.spawn_child("alpha");
    child.close_nursery();
    let actor: Arc<dyn ActorRuntime> = child.clone();

    with_task_name("bp", breakpoint_in(&actor)).await.unwrap();

    assert_eq!(child.scripted_repl().session_count(), 0, "no repl mid-cancellation");
    assert_eq!(root.serve_count(), 0);
    assert!(child.debug_lock().local_task().is_none());
}

#[tokio::test]
#[serial_test::serial]
async fn global_entry_points_use_the_registered_runtime() {
    let tree = TestTree::new();
    let root = tree.root();
    crate::runtime::set_current_actor(root.clone());

    with_task_name("bp", breakpoint()).await.unwrap();
    with_task_name("pm", post_mortem("boom")).await.unwrap();

    crate::runtime::clear_current_actor();
    assert!(matches!(breakpoint().await, Err(DebugError::NoRuntime)));

    assert_eq!(root.scripted_repl().session_count(), 2);
}

#[tokio::test]
async fn maybe_post_mortem_skips_quit_and_teardown_errors() {
    let tree = TestTree::new();
    let root = tree.root();
    let actor: Arc<dyn ActorRuntime> = root.clone();

    let quit = DebugError::Repl(crate::ReplError::Quit);
    assert!(!maybe_enter_post_mortem(&actor, &quit).await.unwrap());

    let cancelled = DebugError::Cancelled;
    assert!(!maybe_enter_post_mortem(&actor, &cancelled).await.unwrap());

    root.set_debug_mode(false);
    let plain = DebugError::RequestAborted;
    assert!(!maybe_enter_post_mortem(&actor, &plain).await.unwrap());

    assert_eq!(root.scripted_repl().session_count(), 0);
}

#[tokio::test]
async fn maybe_post_mortem_enters_for_real_crashes() {
    let tree = TestTree::new();
    let root = tree.root();
    let actor: Arc<dyn ActorRuntime> = root.clone();

    let err = DebugError::RequestAborted;
    let entered =
        with_task_name("crash", maybe_enter_post_mortem(&actor, &err)).await.unwrap();
    assert!(entered);
    assert_eq!(root.scripted_repl().session_count(), 1);
    assert!(root.debug_lock().is_drained());
}
