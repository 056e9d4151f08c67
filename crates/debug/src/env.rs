// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the debug subsystem.

use std::path::Path;
use std::time::Duration;

/// Login shell name, with a special check for `xonsh`, which needs its
/// prompt redrawn after a swallowed interrupt.
///
/// `XONSH_LOGIN` wins over `$SHELL` because xonsh sub-shells keep the
/// parent's `$SHELL` value.
pub fn shell_name() -> Option<String> {
    let shpath = std::env::var("SHELL").ok()?;
    let xonsh_login = std::env::var("XONSH_LOGIN").is_ok_and(|v| !v.is_empty());
    if xonsh_login || shpath.contains("xonsh") {
        return Some("xonsh".to_string());
    }
    Path::new(&shpath).file_name().map(|name| name.to_string_lossy().into_owned())
}

/// Pause after a reentrant wait before starting a fresh session, so the
/// released task can finish restoring signal state
/// (default 100ms, configurable via `TROUPE_DEBUG_SETTLE_MS`).
pub fn reentry_settle() -> Duration {
    std::env::var("TROUPE_DEBUG_SETTLE_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_millis(100))
}

/// Delay between drain-waiter polls
/// (default 100ms, configurable via `TROUPE_DEBUG_POLL_MS`).
pub fn drain_poll_delay() -> Duration {
    std::env::var("TROUPE_DEBUG_POLL_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_millis(100))
}
