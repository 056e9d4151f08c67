// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory actor tree for exercising the debug subsystem without
//! processes.
//!
//! Each [`TestActor`] owns its own [`DebugLock`], exactly as each process
//! would; links between children and the root are in-memory duplex pipes
//! carrying real wire frames, so the full client/server context protocol is
//! exercised. The [`ScriptedRepl`] blocks its session the way the real REPL
//! blocks the event loop — drive it from a multi-thread test runtime.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use parking_lot::{Condvar, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};
use troupe_core::ActorId;
use troupe_wire::LockStatus;

use crate::error::{RpcError, SpawnError};
use crate::lock::DebugLock;
use crate::repl::{Repl, ReplError};
use crate::rpc;
use crate::runtime::{current_task_name, ActorRuntime, LeaseChannel, RootPortal};

/// A simulated actor tree: one root plus any number of children.
pub struct TestTree {
    root: Arc<TestActor>,
    children: Mutex<Vec<Arc<TestActor>>>,
}

impl Default for TestTree {
    fn default() -> Self {
        Self::new()
    }
}

impl TestTree {
    pub fn new() -> Self {
        Self { root: TestActor::new_root(), children: Mutex::new(Vec::new()) }
    }

    pub fn root(&self) -> Arc<TestActor> {
        Arc::clone(&self.root)
    }

    /// Spawn a child with a live channel to the root.
    pub fn spawn_child(&self, name: &str) -> Arc<TestActor> {
        let child = TestActor::new_child(name, Arc::clone(&self.root));
        self.root.peers.lock().insert(child.uid.clone(), true);
        self.children.lock().push(Arc::clone(&child));
        child
    }

    /// Kill a child's process: its channels die without any release message.
    pub fn kill_child(&self, uid: &ActorId) {
        self.root.peers.lock().insert(uid.clone(), false);
        if let Some(kills) = self.root.links.lock().remove(uid) {
            for kill in kills {
                kill.cancel();
            }
        }
        for child in self.children.lock().iter() {
            if &child.uid == uid {
                child.parent_connected.store(false, Ordering::SeqCst);
            }
        }
    }
}

/// One simulated actor process.
pub struct TestActor {
    me: Weak<TestActor>,
    uid: ActorId,
    is_root: bool,
    debug_mode: AtomicBool,
    lock: Arc<DebugLock>,
    repl: Arc<ScriptedRepl>,
    root: Option<Arc<TestActor>>,
    parent_connected: AtomicBool,
    /// Root-side registry view: identity -> any channel connected.
    peers: Mutex<HashMap<ActorId, bool>>,
    /// Root-side per-child link kill switches (peer-loss signals).
    links: Mutex<HashMap<ActorId, Vec<CancellationToken>>>,
    cancel_requested: AtomicBool,
    cancel_count: AtomicUsize,
    interrupt_count: AtomicUsize,
    nursery_closed: AtomicBool,
    services: Mutex<Vec<JoinHandle<()>>>,
    serve_count: AtomicUsize,
}

impl TestActor {
    fn new(uid: ActorId, root: Option<Arc<TestActor>>) -> Arc<Self> {
        let is_root = root.is_none();
        let lock = Arc::new(DebugLock::new());
        let repl = Arc::new(ScriptedRepl::new(Arc::clone(&lock)));
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            uid,
            is_root,
            debug_mode: AtomicBool::new(true),
            lock,
            repl,
            root,
            parent_connected: AtomicBool::new(!is_root),
            peers: Mutex::new(HashMap::new()),
            links: Mutex::new(HashMap::new()),
            cancel_requested: AtomicBool::new(false),
            cancel_count: AtomicUsize::new(0),
            interrupt_count: AtomicUsize::new(0),
            nursery_closed: AtomicBool::new(false),
            services: Mutex::new(Vec::new()),
            serve_count: AtomicUsize::new(0),
        })
    }

    pub fn new_root() -> Arc<Self> {
        Self::new(ActorId::spawned("root"), None)
    }

    pub fn new_child(name: &str, root: Arc<TestActor>) -> Arc<Self> {
        Self::new(ActorId::spawned(name), Some(root))
    }

    pub fn scripted_repl(&self) -> Arc<ScriptedRepl> {
        Arc::clone(&self.repl)
    }

    pub fn set_debug_mode(&self, enabled: bool) {
        self.debug_mode.store(enabled, Ordering::SeqCst);
    }

    /// Mark the service nursery closed, as it is while the actor cancels.
    pub fn close_nursery(&self) {
        self.nursery_closed.store(true, Ordering::SeqCst);
    }

    /// Override the registry's view of a peer's channels.
    pub fn set_peer(&self, uid: ActorId, connected: bool) {
        self.peers.lock().insert(uid, connected);
    }

    /// Contexts this actor has served as the root.
    pub fn serve_count(&self) -> usize {
        self.serve_count.load(Ordering::SeqCst)
    }

    pub fn cancel_count(&self) -> usize {
        self.cancel_count.load(Ordering::SeqCst)
    }

    pub fn interrupt_count(&self) -> usize {
        self.interrupt_count.load(Ordering::SeqCst)
    }

    /// Wait for all service-nursery tasks spawned so far to finish.
    pub async fn join_services(&self) {
        let handles: Vec<_> = self.services.lock().drain(..).collect();
        for handle in handles {
            let _ = handle.await;
        }
    }
}

impl ActorRuntime for TestActor {
    fn uid(&self) -> ActorId {
        self.uid.clone()
    }

    fn is_root(&self) -> bool {
        self.is_root
    }

    fn debug_mode(&self) -> bool {
        self.debug_mode.load(Ordering::SeqCst)
    }

    fn parent_connected(&self) -> bool {
        !self.is_root && self.parent_connected.load(Ordering::SeqCst)
    }

    fn peer_status(&self, uid: &ActorId) -> Option<bool> {
        self.peers.lock().get(uid).copied()
    }

    fn cancel_requested(&self) -> bool {
        self.cancel_requested.load(Ordering::SeqCst)
    }

    fn cancel_soon(&self) {
        self.cancel_requested.store(true, Ordering::SeqCst);
        self.cancel_count.fetch_add(1, Ordering::SeqCst);
    }

    fn force_interrupt(&self) {
        self.interrupt_count.fetch_add(1, Ordering::SeqCst);
    }

    fn spawn_service(&self, task: BoxFuture<'static, ()>) -> Result<(), SpawnError> {
        if self.nursery_closed.load(Ordering::SeqCst) {
            return Err(SpawnError::Cancelling);
        }
        self.services.lock().push(tokio::spawn(task));
        Ok(())
    }

    fn debug_lock(&self) -> Arc<DebugLock> {
        Arc::clone(&self.lock)
    }

    fn root_portal(&self) -> Arc<dyn RootPortal> {
        Arc::new(TestPortal { child: self.me.clone(), root: self.root.clone() })
    }

    fn new_repl(&self) -> Arc<dyn Repl> {
        self.repl.clone()
    }
}

/// Portal from a child to its root over an in-memory framed pipe.
struct TestPortal {
    child: Weak<TestActor>,
    root: Option<Arc<TestActor>>,
}

#[async_trait]
impl RootPortal for TestPortal {
    async fn open_lock_context(
        &self,
        subactor_uid: ActorId,
    ) -> Result<(LockStatus, Box<dyn LeaseChannel>), RpcError> {
        let child = self.child.upgrade().ok_or(RpcError::Closed)?;
        let root = self
            .root
            .clone()
            .ok_or_else(|| RpcError::Protocol("the root has no portal to itself".to_string()))?;
        if !child.parent_connected.load(Ordering::SeqCst) {
            return Err(RpcError::PeerLost);
        }

        let (client_io, server_io) = tokio::io::duplex(8 * 1024);
        let kill = CancellationToken::new();
        root.links.lock().entry(subactor_uid.clone()).or_default().push(kill.clone());
        root.serve_count.fetch_add(1, Ordering::SeqCst);

        let server: Arc<dyn ActorRuntime> = root.clone();
        tokio::spawn(async move {
            if let Err(e) = rpc::serve_lock_context(server, server_io, kill).await {
                debug!(error = %e, "lock context server ended with error");
            }
        });

        let (status, chan) = rpc::open_lock_context(client_io, subactor_uid).await?;
        Ok((status, Box::new(chan)))
    }
}

/// Commands a test feeds into a [`ScriptedRepl`] session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplCmd {
    Continue,
    Quit,
}

/// How a recorded session was entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    SetTrace,
    PostMortem,
}

/// One recorded REPL entry.
#[derive(Debug, Clone)]
pub struct ReplSession {
    pub actor: ActorId,
    pub kind: SessionKind,
    pub entered_at: Instant,
}

struct CmdQueue {
    cmds: Mutex<VecDeque<ReplCmd>>,
    cv: Condvar,
}

impl CmdQueue {
    fn push(&self, cmd: ReplCmd) {
        self.cmds.lock().push_back(cmd);
        self.cv.notify_one();
    }

    fn pop_timeout(&self, timeout: Duration) -> Option<ReplCmd> {
        let deadline = Instant::now() + timeout;
        let mut cmds = self.cmds.lock();
        loop {
            if let Some(cmd) = cmds.pop_front() {
                return Some(cmd);
            }
            if self.cv.wait_until(&mut cmds, deadline).timed_out() {
                return cmds.pop_front();
            }
        }
    }
}

/// Scripted stand-in for the interactive REPL.
///
/// Sessions block the calling thread like the real thing. By default every
/// session continues immediately; switch to [`ScriptedRepl::manual`] to
/// hold sessions open and drive them with a [`ReplDriver`].
pub struct ScriptedRepl {
    lock: Arc<DebugLock>,
    auto_continue: AtomicBool,
    queue: Arc<CmdQueue>,
    sessions: Mutex<Vec<ReplSession>>,
    flushes: AtomicUsize,
    redraws: AtomicUsize,
}

impl ScriptedRepl {
    pub fn new(lock: Arc<DebugLock>) -> Self {
        Self {
            lock,
            auto_continue: AtomicBool::new(true),
            queue: Arc::new(CmdQueue { cmds: Mutex::new(VecDeque::new()), cv: Condvar::new() }),
            sessions: Mutex::new(Vec::new()),
            flushes: AtomicUsize::new(0),
            redraws: AtomicUsize::new(0),
        }
    }

    /// Hold sessions open until driven; returns the driver.
    pub fn manual(&self) -> ReplDriver {
        self.auto_continue.store(false, Ordering::SeqCst);
        ReplDriver { queue: Arc::clone(&self.queue) }
    }

    pub fn sessions(&self) -> Vec<ReplSession> {
        self.sessions.lock().clone()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn flush_count(&self) -> usize {
        self.flushes.load(Ordering::SeqCst)
    }

    pub fn redraw_count(&self) -> usize {
        self.redraws.load(Ordering::SeqCst)
    }

    fn run_session(&self, actor: &ActorId, kind: SessionKind) -> Result<(), ReplError> {
        self.sessions.lock().push(ReplSession {
            actor: actor.clone(),
            kind,
            entered_at: Instant::now(),
        });

        let cmd = if self.auto_continue.load(Ordering::SeqCst) {
            ReplCmd::Continue
        } else {
            // a forgotten driver quits rather than hanging the suite
            self.queue.pop_timeout(Duration::from_secs(10)).unwrap_or(ReplCmd::Quit)
        };

        // release in every exit path, matching the interactive exit hooks
        if let Err(e) = self.lock.release(&current_task_name()) {
            error!(error = %e, "debug lock release failed in scripted repl");
        }
        match cmd {
            ReplCmd::Continue => Ok(()),
            ReplCmd::Quit => Err(ReplError::Quit),
        }
    }
}

impl Repl for ScriptedRepl {
    fn set_trace(&self, actor: &ActorId) -> Result<(), ReplError> {
        self.run_session(actor, SessionKind::SetTrace)
    }

    fn post_mortem(&self, actor: &ActorId, _report: &str) -> Result<(), ReplError> {
        self.run_session(actor, SessionKind::PostMortem)
    }

    fn flush(&self) {
        self.flushes.fetch_add(1, Ordering::SeqCst);
    }

    fn redraw_prompt(&self) {
        self.redraws.fetch_add(1, Ordering::SeqCst);
    }
}

/// Drives sessions held open by [`ScriptedRepl::manual`].
#[derive(Clone)]
pub struct ReplDriver {
    queue: Arc<CmdQueue>,
}

impl ReplDriver {
    /// Let the current (or next) session continue.
    pub fn continue_session(&self) {
        self.queue.push(ReplCmd::Continue);
    }

    /// Make the current (or next) session quit.
    pub fn quit_session(&self) {
        self.queue.push(ReplCmd::Quit);
    }
}
