// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Actor identity.
//!
//! Every process in the tree is named by a `(name, instance)` pair: the name
//! is chosen by whoever spawns the actor, the instance id is generated at
//! spawn time and never reused. Identities are immutable for the life of the
//! process and are the keys of the peer registry and the debug blocklist.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt;

/// Unique identity of one actor process in the tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorId {
    /// Spawn-time name, not necessarily unique across the tree.
    pub name: SmolStr,
    /// Random per-process instance id, unique across the tree.
    pub instance: SmolStr,
}

impl ActorId {
    /// Create an identity from existing parts (for parsing/deserialization).
    pub fn new(name: impl AsRef<str>, instance: impl AsRef<str>) -> Self {
        Self { name: SmolStr::new(name.as_ref()), instance: SmolStr::new(instance.as_ref()) }
    }

    /// Mint the identity of a freshly spawned actor: caller-chosen name,
    /// random instance id.
    pub fn spawned(name: impl AsRef<str>) -> Self {
        Self { name: SmolStr::new(name.as_ref()), instance: SmolStr::new(nanoid::nanoid!(19)) }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instance(&self) -> &str {
        &self.instance
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.instance)
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
