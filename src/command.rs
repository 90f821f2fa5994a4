// SPDX-License-Identifier: GPL-3.0-only

//! Shell command dispatch with sandbox awareness
//!
//! Module management commands are run through `sh -c` with a `PATH` that
//! includes `/sbin`, where modprobe and modinfo commonly live. Inside a
//! Flatpak sandbox the command is re-issued on the host through
//! `flatpak-spawn`.

use std::path::Path;
use std::process::Command;
use std::sync::OnceLock;
use tracing::debug;

/// Marker file present in every Flatpak sandbox
const FLATPAK_INFO: &str = "/.flatpak-info";

static SANDBOX: OnceLock<bool> = OnceLock::new();

/// Whether this process runs inside a Flatpak sandbox.
///
/// The filesystem check runs at most once; the result is cached for the
/// process lifetime, including under concurrent callers.
pub fn is_flatpak_sandbox() -> bool {
    *SANDBOX.get_or_init(|| Path::new(FLATPAK_INFO).exists())
}

/// Executes shell commands on behalf of the module ensurer.
pub trait CommandRunner {
    /// Run `command` and return its exit status. Returns -1 when the command
    /// could not be spawned or was terminated without a status.
    fn run(&self, command: &str) -> i32;
}

/// Runs commands on the host, brokered through `flatpak-spawn` when sandboxed.
#[derive(Debug, Default, Clone, Copy)]
pub struct HostCommandRunner;

impl CommandRunner for HostCommandRunner {
    fn run(&self, command: &str) -> i32 {
        let mut line = String::from("PATH=\"$PATH:/sbin\" ");

        if is_flatpak_sandbox() {
            line.push_str("flatpak-spawn --host ");
        }

        line.push_str(command);

        debug!(command = %line, "Running command");

        match Command::new("sh").arg("-c").arg(&line).status() {
            Ok(status) => status.code().unwrap_or(-1),
            Err(e) => {
                debug!(error = %e, "Failed to spawn command");
                -1
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_sandbox_detection_runs_once_under_concurrent_callers() {
        let cell: Arc<OnceLock<bool>> = Arc::new(OnceLock::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cell = Arc::clone(&cell);
                let calls = Arc::clone(&calls);
                std::thread::spawn(move || {
                    *cell.get_or_init(|| {
                        calls.fetch_add(1, Ordering::SeqCst);
                        true
                    })
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.join().expect("detection thread panicked"));
        }

        assert_eq!(
            calls.load(Ordering::SeqCst),
            1,
            "detection must run exactly once per process"
        );
    }

    #[test]
    fn test_runner_reports_exit_status() {
        assert_eq!(HostCommandRunner.run("true"), 0);
        assert_eq!(HostCommandRunner.run("exit 7"), 7);
    }
}
