// SPDX-License-Identifier: GPL-3.0-only

//! Loopback kernel module management
//!
//! The v4l2loopback module provides the `/dev/video*` output nodes this
//! crate writes to. Before device negotiation can begin the module must be
//! loaded; loading requires polkit authorisation through pkexec.

use crate::command::{CommandRunner, HostCommandRunner};
use crate::constants::{LOOPBACK_MODULE, MODULE_REGISTRY};
use crate::errors::{SessionResult, VirtualCameraError};
use std::path::PathBuf;
use tracing::{debug, info};

/// Manages presence of the v4l2loopback kernel module.
pub struct LoopbackModule<R = HostCommandRunner> {
    registry: PathBuf,
    runner: R,
}

impl LoopbackModule {
    pub fn new() -> Self {
        Self {
            registry: PathBuf::from(MODULE_REGISTRY),
            runner: HostCommandRunner,
        }
    }
}

impl Default for LoopbackModule {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: CommandRunner> LoopbackModule<R> {
    /// Create a module manager with a custom registry path and runner.
    pub fn with_parts(registry: impl Into<PathBuf>, runner: R) -> Self {
        Self {
            registry: registry.into(),
            runner,
        }
    }

    /// Whether the module is currently loaded.
    ///
    /// Reads the kernel module registry; an unreadable registry is treated
    /// as "not loaded".
    pub fn is_loaded(&self) -> bool {
        match std::fs::read_to_string(&self.registry) {
            Ok(contents) => registry_lists_module(&contents, LOOPBACK_MODULE),
            Err(_) => false,
        }
    }

    /// Whether the module is loaded or at least installed on the system.
    ///
    /// Falls back to a modinfo probe when not loaded. Used for availability
    /// reporting; the start path goes through
    /// [`ensure_loaded`](Self::ensure_loaded) instead.
    pub fn is_available(&self) -> bool {
        if self.is_loaded() {
            return true;
        }

        self.runner
            .run(&format!("modinfo {} >/dev/null 2>&1", LOOPBACK_MODULE))
            == 0
    }

    /// Load the module if it is not already loaded.
    ///
    /// The load command enables exclusive capability mode, sets the card
    /// label other applications will see, and waits briefly for the device
    /// nodes to materialise. A non-zero exit status aborts the start
    /// attempt; there is no automatic retry.
    pub fn ensure_loaded(&self, card_label: &str) -> SessionResult<()> {
        if self.is_loaded() {
            debug!("Loopback module already loaded");
            return Ok(());
        }

        info!(card_label, "Loading loopback kernel module");

        let command = format!(
            "pkexec modprobe {} exclusive_caps=1 card_label='{}' && sleep 0.5",
            LOOPBACK_MODULE, card_label
        );

        let status = self.runner.run(&command);
        if status != 0 {
            return Err(VirtualCameraError::ModuleLoadFailed(status));
        }

        Ok(())
    }
}

/// True if the module name appears on any line of the registry contents.
fn registry_lists_module(contents: &str, module: &str) -> bool {
    contents.lines().any(|line| line.contains(module))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Runner that records commands instead of spawning them.
    struct RecordingRunner {
        commands: RefCell<Vec<String>>,
        status: i32,
    }

    impl RecordingRunner {
        fn new(status: i32) -> Self {
            Self {
                commands: RefCell::new(Vec::new()),
                status,
            }
        }
    }

    impl CommandRunner for RecordingRunner {
        fn run(&self, command: &str) -> i32 {
            self.commands.borrow_mut().push(command.to_string());
            self.status
        }
    }

    fn registry_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "virtual-camera-registry-{}-{}",
            std::process::id(),
            name
        ));
        std::fs::write(&path, contents).expect("write registry fixture");
        path
    }

    #[test]
    fn test_registry_substring_match() {
        let contents = "uvcvideo 106496 0 - Live 0x0000000000000000\n\
                        v4l2loopback 49152 2 - Live 0x0000000000000000\n";
        assert!(registry_lists_module(contents, "v4l2loopback"));
        assert!(!registry_lists_module(
            "uvcvideo 106496 0 - Live\n",
            "v4l2loopback"
        ));
    }

    #[test]
    fn test_is_loaded_treats_unreadable_registry_as_not_loaded() {
        let module = LoopbackModule::with_parts("/nonexistent/modules", RecordingRunner::new(0));
        assert!(!module.is_loaded());
    }

    #[test]
    fn test_ensure_loaded_skips_load_when_module_present() {
        let registry = registry_file("loaded", "v4l2loopback 49152 0 - Live\n");
        let module = LoopbackModule::with_parts(&registry, RecordingRunner::new(0));

        module.ensure_loaded("Test Camera").expect("already loaded");

        assert!(
            module.runner.commands.borrow().is_empty(),
            "load command must not run when the registry reports loaded"
        );
        std::fs::remove_file(registry).ok();
    }

    #[test]
    fn test_ensure_loaded_runs_privileged_command_when_missing() {
        let registry = registry_file("missing", "uvcvideo 106496 0 - Live\n");
        let module = LoopbackModule::with_parts(&registry, RecordingRunner::new(0));

        module.ensure_loaded("Test Camera").expect("load succeeds");

        let commands = module.runner.commands.borrow();
        assert_eq!(commands.len(), 1);
        assert!(commands[0].contains("pkexec modprobe v4l2loopback"));
        assert!(commands[0].contains("exclusive_caps=1"));
        assert!(commands[0].contains("card_label='Test Camera'"));
        assert!(commands[0].contains("sleep 0.5"));
        drop(commands);
        std::fs::remove_file(registry).ok();
    }

    #[test]
    fn test_ensure_loaded_propagates_load_failure() {
        let registry = registry_file("failure", "");
        let module = LoopbackModule::with_parts(&registry, RecordingRunner::new(127));

        match module.ensure_loaded("Test Camera") {
            Err(VirtualCameraError::ModuleLoadFailed(127)) => {}
            other => panic!("expected ModuleLoadFailed(127), got {:?}", other),
        }
        std::fs::remove_file(registry).ok();
    }

    #[test]
    fn test_is_available_falls_back_to_modinfo_probe() {
        let registry = registry_file("probe", "");
        let module = LoopbackModule::with_parts(&registry, RecordingRunner::new(0));

        assert!(module.is_available());
        assert!(
            module.runner.commands.borrow()[0].starts_with("modinfo v4l2loopback"),
            "availability must probe module metadata without loading"
        );
        std::fs::remove_file(registry).ok();
    }
}
