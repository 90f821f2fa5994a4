// SPDX-License-Identifier: GPL-3.0-only

//! Crate-wide constants

/// Name of the loopback kernel module
pub const LOOPBACK_MODULE: &str = "v4l2loopback";

/// Kernel registry of currently loaded modules
pub const MODULE_REGISTRY: &str = "/proc/modules";

/// Directory scanned for candidate device nodes
pub const DEVICE_DIR: &str = "/dev";

/// Name prefix of video device nodes
pub const DEVICE_PREFIX: &str = "video";

/// Card label other applications see by default
pub const DEFAULT_CARD_LABEL: &str = "Virtual Camera";

/// Bytes per pixel of the packed YUYV output format
pub const YUYV_BYTES_PER_PIXEL: u32 = 2;
