// SPDX-License-Identifier: GPL-3.0-only

//! Error types for virtual camera output

use std::fmt;

/// Result type alias for session operations
pub type SessionResult<T> = Result<T, VirtualCameraError>;

/// Errors that can abort a virtual camera start attempt
///
/// Per-candidate negotiation failures and per-frame write failures are not
/// represented here: rejected candidates are skipped silently and write
/// errors truncate a single frame without affecting the session.
#[derive(Debug, Clone)]
pub enum VirtualCameraError {
    /// The privileged module load command failed with this exit status
    ModuleLoadFailed(i32),
    /// Every candidate device node was rejected during negotiation
    NoUsableDevice,
    /// The device directory could not be scanned
    ScanFailed(String),
    /// The session already has a negotiated device
    AlreadyStreaming,
}

impl fmt::Display for VirtualCameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VirtualCameraError::ModuleLoadFailed(status) => {
                write!(f, "Failed to load v4l2loopback module (exit status {})", status)
            }
            VirtualCameraError::NoUsableDevice => {
                write!(f, "No usable loopback device found")
            }
            VirtualCameraError::ScanFailed(msg) => {
                write!(f, "Device directory scan failed: {}", msg)
            }
            VirtualCameraError::AlreadyStreaming => {
                write!(f, "Virtual camera already streaming")
            }
        }
    }
}

impl std::error::Error for VirtualCameraError {}
