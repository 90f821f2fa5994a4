// SPDX-License-Identifier: GPL-3.0-only

//! Loopback device reporting
//!
//! Capability-based enumeration used by the CLI for status and listing.
//! Negotiation never relies on this module; it opens its own handle and
//! keeps exactly one per session.

use crate::constants::DEVICE_DIR;
use std::path::{Path, PathBuf};
use v4l::Device;
use v4l::capability::Flags;

use super::scan_candidates;

/// Details of a video device node.
#[derive(Debug, Clone)]
pub struct LoopbackDeviceInfo {
    /// Device node path (e.g., /dev/video10)
    pub path: PathBuf,
    /// V4L2 driver name
    pub driver: String,
    /// Human-readable card label
    pub card: String,
    /// Whether the node accepts video output (writable by this crate)
    pub output_capable: bool,
}

impl LoopbackDeviceInfo {
    /// Whether this node is backed by the v4l2loopback driver.
    pub fn is_loopback(&self) -> bool {
        self.output_capable && self.driver.contains("v4l2 loopback")
    }
}

/// Enumerate video nodes and report their capability details.
pub fn enumerate_devices() -> Vec<LoopbackDeviceInfo> {
    enumerate_devices_in(Path::new(DEVICE_DIR))
}

/// Enumerate video nodes under a specific directory.
///
/// Nodes that cannot be opened or queried are skipped.
pub fn enumerate_devices_in(dir: &Path) -> Vec<LoopbackDeviceInfo> {
    let candidates = scan_candidates(dir).unwrap_or_default();
    let mut devices = Vec::new();

    for path in candidates {
        let Ok(device) = Device::with_path(&path) else {
            continue;
        };
        let Ok(caps) = device.query_caps() else {
            continue;
        };

        devices.push(LoopbackDeviceInfo {
            path,
            driver: caps.driver.clone(),
            card: caps.card.clone(),
            output_capable: caps.capabilities.contains(Flags::VIDEO_OUTPUT),
        });
    }

    devices
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loopback_requires_output_capability_and_driver() {
        let info = LoopbackDeviceInfo {
            path: PathBuf::from("/dev/video10"),
            driver: "v4l2 loopback".to_string(),
            card: "Virtual Camera".to_string(),
            output_capable: true,
        };
        assert!(info.is_loopback());

        let capture_only = LoopbackDeviceInfo {
            output_capable: false,
            ..info.clone()
        };
        assert!(!capture_only.is_loopback());

        let webcam = LoopbackDeviceInfo {
            driver: "uvcvideo".to_string(),
            ..info
        };
        assert!(!webcam.is_loopback());
    }
}
