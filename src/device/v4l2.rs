// SPDX-License-Identifier: GPL-3.0-only

//! V4L2 output device protocol
//!
//! Minimal ioctl bindings for configuring a loopback output node:
//! capability query, format round-trip, and stream timing. Frame data goes
//! through ordinary write calls on the device file, not through here.

use crate::producer::Framerate;
use std::io;
use std::os::unix::io::RawFd;

// ===== V4L2 ABI Constants =====

/// Single-planar video output buffer type
pub(crate) const V4L2_BUF_TYPE_VIDEO_OUTPUT: u32 = 2;

/// Stream parameter capability flag: device honours timeperframe
pub(crate) const V4L2_CAP_TIMEPERFRAME: u32 = 0x1000;

/// Packed YUYV 4:2:2 pixel format tag
pub(crate) const V4L2_PIX_FMT_YUYV: u32 = u32::from_le_bytes(*b"YUYV");

// ===== V4L2 ioctl Numbers =====
// Calculated as: (dir << 30) | (size << 16) | ('V' << 8) | nr
// where dir: 2=READ, 1=WRITE, 3=READ|WRITE; sizes are the 64-bit layouts.

/// Query device capability (v4l2_capability: 104 bytes)
const VIDIOC_QUERYCAP: libc::c_ulong = 0x80685600;
/// Get current format (v4l2_format: 208 bytes)
const VIDIOC_G_FMT: libc::c_ulong = 0xC0D05604;
/// Set format (v4l2_format: 208 bytes)
const VIDIOC_S_FMT: libc::c_ulong = 0xC0D05605;
/// Set stream parameters (v4l2_streamparm: 204 bytes)
const VIDIOC_S_PARM: libc::c_ulong = 0xC0CC5616;

// ===== V4L2 ioctl Structures =====

/// V4L2 capability structure for VIDIOC_QUERYCAP
#[repr(C)]
pub(crate) struct V4l2Capability {
    pub driver: [u8; 16],
    pub card: [u8; 32],
    pub bus_info: [u8; 32],
    pub version: u32,
    pub capabilities: u32,
    pub device_caps: u32,
    reserved: [u32; 3],
}

impl V4l2Capability {
    /// Driver name up to the first NUL.
    pub(crate) fn driver_name(&self) -> String {
        let len = self
            .driver
            .iter()
            .position(|&c| c == 0)
            .unwrap_or(self.driver.len());
        String::from_utf8_lossy(&self.driver[..len]).to_string()
    }
}

/// V4L2 fraction (numerator/denominator)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub(crate) struct V4l2Fract {
    pub numerator: u32,
    pub denominator: u32,
}

/// Single-planar pixel format member of v4l2_format
#[derive(Clone, Copy)]
#[repr(C)]
pub(crate) struct V4l2PixFormat {
    pub width: u32,
    pub height: u32,
    pub pixelformat: u32,
    pub field: u32,
    pub bytesperline: u32,
    pub sizeimage: u32,
    pub colorspace: u32,
    pub priv_: u32,
    pub flags: u32,
    pub ycbcr_enc: u32,
    pub quantization: u32,
    pub xfer_func: u32,
}

/// V4L2 format structure for VIDIOC_G_FMT/VIDIOC_S_FMT.
///
/// The kernel declares the payload as a union padded to 200 bytes with
/// 8-byte alignment; only the pix member is used here.
#[repr(C)]
pub(crate) struct V4l2Format {
    pub type_: u32,
    fmt: V4l2FormatUnion,
}

#[repr(C)]
union V4l2FormatUnion {
    pix: V4l2PixFormat,
    raw: [u64; 25],
}

impl V4l2Format {
    /// Access the single-planar pixel format member.
    pub(crate) fn pix_mut(&mut self) -> &mut V4l2PixFormat {
        unsafe { &mut self.fmt.pix }
    }
}

/// Output stream parameters member of v4l2_streamparm
#[derive(Clone, Copy)]
#[repr(C)]
struct V4l2OutputParm {
    capability: u32,
    outputmode: u32,
    timeperframe: V4l2Fract,
    extendedmode: u32,
    writebuffers: u32,
    reserved: [u32; 4],
}

/// V4L2 stream parameter structure for VIDIOC_S_PARM.
///
/// The kernel declares the payload as a union padded to 200 bytes.
#[repr(C)]
pub(crate) struct V4l2Streamparm {
    type_: u32,
    parm: V4l2ParmUnion,
}

#[repr(C)]
union V4l2ParmUnion {
    output: V4l2OutputParm,
    raw: [u32; 50],
}

// ===== Device Operations =====

/// Time-per-frame for the device from the producer's frame rate.
///
/// The producer reports rate as num/denom frames per second; the device
/// expects the frame period, so numerator and denominator swap.
pub(crate) fn frame_interval(rate: Framerate) -> V4l2Fract {
    V4l2Fract {
        numerator: rate.denom,
        denominator: rate.num,
    }
}

/// Query device capability.
///
/// The contents are unused beyond confirming the node speaks V4L2; a
/// candidate is rejected when the ioctl itself fails.
pub(crate) fn query_capability(fd: RawFd) -> io::Result<V4l2Capability> {
    let mut cap: V4l2Capability = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::ioctl(fd, VIDIOC_QUERYCAP, &mut cap as *mut V4l2Capability) };
    if result < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(cap)
}

/// Read the current output format from the driver.
///
/// The returned struct round-trips through [`set_output_format`], so fields
/// this protocol does not touch keep their driver defaults.
pub(crate) fn output_format(fd: RawFd) -> io::Result<V4l2Format> {
    let mut format: V4l2Format = unsafe { std::mem::zeroed() };
    format.type_ = V4L2_BUF_TYPE_VIDEO_OUTPUT;

    let result = unsafe { libc::ioctl(fd, VIDIOC_G_FMT, &mut format as *mut V4l2Format) };
    if result < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(format)
}

/// Submit an output format previously read with [`output_format`].
pub(crate) fn set_output_format(fd: RawFd, format: &mut V4l2Format) -> io::Result<()> {
    let result = unsafe { libc::ioctl(fd, VIDIOC_S_FMT, format as *mut V4l2Format) };
    if result < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Configure the frame timing of the output stream.
pub(crate) fn set_frame_interval(fd: RawFd, interval: V4l2Fract) -> io::Result<()> {
    let mut parm: V4l2Streamparm = unsafe { std::mem::zeroed() };
    parm.type_ = V4L2_BUF_TYPE_VIDEO_OUTPUT;
    parm.parm = V4l2ParmUnion {
        output: V4l2OutputParm {
            capability: V4L2_CAP_TIMEPERFRAME,
            outputmode: 0,
            timeperframe: interval,
            extendedmode: 0,
            writebuffers: 0,
            reserved: [0; 4],
        },
    };

    let result = unsafe { libc::ioctl(fd, VIDIOC_S_PARM, &mut parm as *mut V4l2Streamparm) };
    if result < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}
