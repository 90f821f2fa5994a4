// SPDX-License-Identifier: GPL-3.0-only

//! Loopback device discovery and negotiation
//!
//! Candidate nodes are scanned from the device directory, ordered with a
//! version-aware comparator (video9 before video10, matching device creation
//! order), and tried one by one until a node accepts the full output
//! configuration.

pub mod diagnostics;
mod v4l2;

use crate::constants::DEVICE_PREFIX;
use crate::producer::Framerate;
use std::cmp::Ordering;
use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Output configuration a candidate must accept.
#[derive(Debug, Clone, Copy)]
pub struct OutputSpec {
    pub width: u32,
    pub height: u32,
    pub rate: Framerate,
}

impl OutputSpec {
    /// Size in bytes of one packed YUYV frame.
    pub fn frame_size(&self) -> usize {
        (self.width * self.height * crate::constants::YUYV_BYTES_PER_PIXEL) as usize
    }
}

/// A device node that accepted the output configuration.
///
/// Holds the only open handle to the node; dropping it releases the device.
#[derive(Debug)]
pub struct NegotiatedDevice {
    pub file: File,
    pub path: PathBuf,
}

/// Scan the device directory for candidate nodes.
///
/// Entries are matched on the fixed name prefix and returned in
/// version-aware order. The scan is repeated on every start attempt;
/// candidates are never cached.
pub fn scan_candidates(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut names: Vec<String> = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with(DEVICE_PREFIX) {
            names.push(name.into_owned());
        }
    }

    names.sort_by(|a, b| version_cmp(a, b));
    Ok(names.into_iter().map(|name| dir.join(name)).collect())
}

/// Version-aware string comparison: digit runs compare by numeric value,
/// so "video9" sorts before "video10". Ties between numerically equal runs
/// go to the one with fewer leading zeros.
pub fn version_cmp(a: &str, b: &str) -> Ordering {
    let a = a.as_bytes();
    let b = b.as_bytes();
    let mut i = 0;
    let mut j = 0;

    while i < a.len() && j < b.len() {
        if a[i].is_ascii_digit() && b[j].is_ascii_digit() {
            let (run_a, next_i) = digit_run(a, i);
            let (run_b, next_j) = digit_run(b, j);
            match cmp_digit_runs(run_a, run_b) {
                Ordering::Equal => {
                    i = next_i;
                    j = next_j;
                }
                other => return other,
            }
        } else {
            match a[i].cmp(&b[j]) {
                Ordering::Equal => {
                    i += 1;
                    j += 1;
                }
                other => return other,
            }
        }
    }

    (a.len() - i).cmp(&(b.len() - j))
}

fn digit_run(s: &[u8], start: usize) -> (&[u8], usize) {
    let mut end = start;
    while end < s.len() && s[end].is_ascii_digit() {
        end += 1;
    }
    (&s[start..end], end)
}

fn cmp_digit_runs(a: &[u8], b: &[u8]) -> Ordering {
    let trimmed_a = trim_leading_zeros(a);
    let trimmed_b = trim_leading_zeros(b);

    trimmed_a
        .len()
        .cmp(&trimmed_b.len())
        .then_with(|| trimmed_a.cmp(trimmed_b))
        .then_with(|| a.len().cmp(&b.len()))
}

fn trim_leading_zeros(s: &[u8]) -> &[u8] {
    let mut start = 0;
    while start + 1 < s.len() && s[start] == b'0' {
        start += 1;
    }
    &s[start..]
}

/// Try candidates in order, returning the first accepted device.
///
/// Candidates after the first acceptance are never probed; a rejected
/// candidate leaves nothing open behind it.
pub fn first_usable<D, F>(candidates: &[PathBuf], mut connect: F) -> Option<D>
where
    F: FnMut(&Path) -> Option<D>,
{
    for candidate in candidates {
        if let Some(device) = connect(candidate) {
            return Some(device);
        }
    }
    None
}

/// Attempt to open and fully configure one candidate node.
///
/// Each configuration step rejects the candidate on failure. Every rejection
/// path drops the file handle before returning, so a failed candidate never
/// leaks a descriptor into the next attempt.
pub fn try_connect(path: &Path, spec: &OutputSpec) -> Option<NegotiatedDevice> {
    let file = match OpenOptions::new().read(true).write(true).open(path) {
        Ok(file) => file,
        Err(e) => {
            debug!(device = %path.display(), error = %e, "Open failed");
            return None;
        }
    };
    let fd = file.as_raw_fd();

    let capability = match v4l2::query_capability(fd) {
        Ok(capability) => capability,
        Err(e) => {
            debug!(device = %path.display(), error = %e, "Capability query rejected");
            return None;
        }
    };

    // Round-trip the current format so untouched fields keep driver defaults
    let mut format = match v4l2::output_format(fd) {
        Ok(format) => format,
        Err(e) => {
            debug!(device = %path.display(), error = %e, "Format query rejected");
            return None;
        }
    };

    if let Err(e) = v4l2::set_frame_interval(fd, v4l2::frame_interval(spec.rate)) {
        debug!(device = %path.display(), error = %e, "Stream timing rejected");
        return None;
    }

    let pix = format.pix_mut();
    pix.width = spec.width;
    pix.height = spec.height;
    pix.pixelformat = v4l2::V4L2_PIX_FMT_YUYV;
    pix.sizeimage = spec.frame_size() as u32;

    if let Err(e) = v4l2::set_output_format(fd, &mut format) {
        debug!(device = %path.display(), error = %e, "Format rejected");
        return None;
    }

    debug!(
        device = %path.display(),
        driver = %capability.driver_name(),
        width = spec.width,
        height = spec.height,
        "Device accepted"
    );

    Some(NegotiatedDevice {
        file,
        path: path.to_path_buf(),
    })
}
