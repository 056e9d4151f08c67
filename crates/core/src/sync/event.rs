// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One-shot event: starts unset, latches set, wakes all waiters.

use std::sync::Arc;
use tokio::sync::watch;

/// A clonable one-shot event.
///
/// `set()` latches the event; `wait()` returns immediately once set. Events
/// are never reset — consumers that need a fresh cycle replace the event
/// with a new one.
#[derive(Clone)]
pub struct Event {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for Event {
    fn default() -> Self {
        Self::new()
    }
}

impl Event {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn set(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_set(&self) -> bool {
        *self.tx.borrow()
    }

    /// Wait until the event is set. Returns immediately if already set.
    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        // wait_for never errs here: self holds the sender alive
        let _ = rx.wait_for(|set| *set).await;
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
