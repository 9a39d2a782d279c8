//! The lock/conflict handler.
//!
//! ```text
//! IDLE ──detect lock──► INSPECT ──any_browser_process?──► HAS_PROCESSES ──auto_close?──► CLOSING
//!  ▲                       │                                   │       no                │
//!  │                       └── no ──► UNRESOLVED ◄─────────────┘                         │
//!  │                                                                                     │
//!  │                                                      wait ≤ 5s                      ▼
//!  └──────────────────── RELAUNCHED ◄── SUCCESS ◄── retry_query ◄── CLOSED ──────────────┘
//! ```
//!
//! This module only owns the INSPECT/CLOSING/relaunch half of the
//! diagram; the retry_query step belongs to whichever strategy
//! holds the database handle, since this module never touches SQLite.

use std::process::Command;
use std::thread;
use std::time::{Duration, Instant};

use crate::platform;

const CLOSE_WAIT_TIMEOUT: Duration = Duration::from_secs(5);
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Substrings that classify an error as a lock / permission conflict
/// worth attempting recovery for.
const CONFLICT_MARKERS: [&str; 6] = [
    "database is locked",
    "database locked",
    "sqlite_busy",
    "eperm",
    "operation not permitted",
    "permission denied",
];

pub fn is_conflict(message: &str) -> bool {
    let lower = message.to_lowercase();
    CONFLICT_MARKERS.iter().any(|m| lower.contains(m))
}

/// Outcome of the INSPECT → CLOSING half of the state machine. The
/// caller (a browser strategy) decides what to do next: `Closed` means it's
/// safe to retry the query once; the other variants mean give up on
/// this file for this query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    /// INSPECT found no matching process; nothing to close.
    NoProcessRunning,
    /// CLOSING succeeded within the wait budget.
    Closed,
    /// The process was still running after the wait budget elapsed.
    TimedOut,
    /// `force=true` — auto-close is never attempted.
    Bypassed,
}

/// Runs INSPECT and, if warranted, CLOSING for `executable_name`.
pub fn close_and_wait(executable_name: &str, force: bool) -> CloseOutcome {
    if force {
        tracing::debug!(executable_name, "force=true, skipping auto-close");
        return CloseOutcome::Bypassed;
    }

    tracing::debug!(executable_name, "inspecting for a running instance");
    if !platform::process_running(executable_name) {
        return CloseOutcome::NoProcessRunning;
    }

    tracing::warn!(executable_name, "cookie store locked by a running instance, closing it");
    close_gracefully(executable_name);

    let deadline = Instant::now() + CLOSE_WAIT_TIMEOUT;
    while Instant::now() < deadline {
        if !platform::process_running(executable_name) {
            tracing::debug!(executable_name, "instance closed");
            return CloseOutcome::Closed;
        }
        thread::sleep(POLL_INTERVAL);
    }

    tracing::warn!(executable_name, "instance did not close within the wait budget");
    CloseOutcome::TimedOut
}

#[cfg(target_os = "macos")]
fn close_gracefully(executable_name: &str) {
    let _ = Command::new("osascript")
        .arg("-e")
        .arg(format!("tell application \"{executable_name}\" to quit"))
        .output();
}

#[cfg(not(target_os = "macos"))]
fn close_gracefully(executable_name: &str) {
    #[cfg(unix)]
    let _ = Command::new("pkill").arg("-x").arg(executable_name).output();

    #[cfg(windows)]
    let _ = Command::new("taskkill")
        .arg("/IM")
        .arg(format!("{executable_name}.exe"))
        .output();
}

/// Best-effort relaunch after a successful retry. Failure to find or
/// spawn the executable is logged, never propagated.
pub fn relaunch(executable_name: &str) {
    match platform::find_executable(executable_name) {
        Some(path) => {
            if let Err(err) = Command::new(&path).spawn() {
                tracing::warn!(executable_name, %err, "failed to relaunch browser");
            } else {
                tracing::info!(executable_name, "relaunched browser after cookie read");
            }
        }
        None => tracing::warn!(executable_name, "could not find executable to relaunch"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_known_conflict_substrings() {
        assert!(is_conflict("database is locked"));
        assert!(is_conflict("SQLITE_BUSY"));
        assert!(is_conflict("Operation not permitted"));
        assert!(!is_conflict("no such table: cookies"));
    }

    #[test]
    fn force_bypasses_inspection_entirely() {
        assert_eq!(close_and_wait("definitely-not-a-real-process", true), CloseOutcome::Bypassed);
    }

    #[test]
    fn no_matching_process_is_unresolved_without_closing() {
        assert_eq!(
            close_and_wait("definitely-not-a-real-process-xyz123", false),
            CloseOutcome::NoProcessRunning
        );
    }
}
