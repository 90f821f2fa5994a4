// SPDX-License-Identifier: GPL-3.0-only

//! Virtual camera session lifecycle and frame sink
//!
//! A session owns the negotiated device node for its lifetime. Frames are
//! delivered synchronously on the producer's thread; the write loop blocks
//! that thread until the device has taken the whole frame or reported an
//! error, exerting natural backpressure on the producer when the device is
//! slow.

use crate::config::Config;
use crate::device::{self, NegotiatedDevice, OutputSpec};
use crate::errors::{SessionResult, VirtualCameraError};
use crate::module::LoopbackModule;
use crate::producer::{FrameProducer, VideoConversion};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};
use v4l::FourCC;

/// One virtual camera output attempt.
///
/// Created idle; [`start`](Self::start) populates the device handle and
/// frame size, [`stop`](Self::stop) returns the session to a restartable
/// idle state. The producer is owned by the caller; the session only holds
/// a shared reference.
pub struct VirtualCameraSession<P: FrameProducer> {
    producer: Arc<P>,
    config: Config,
    device: Option<NegotiatedDevice>,
    frame_size: usize,
}

impl<P: FrameProducer> VirtualCameraSession<P> {
    /// Create an idle session for the given producer with default settings.
    pub fn new(producer: Arc<P>) -> Self {
        Self::with_config(producer, Config::default())
    }

    /// Create an idle session with explicit settings.
    pub fn with_config(producer: Arc<P>, config: Config) -> Self {
        Self {
            producer,
            config,
            device: None,
            frame_size: 0,
        }
    }

    /// Whether a device is negotiated and frames are being consumed.
    pub fn is_streaming(&self) -> bool {
        self.device.is_some()
    }

    /// Path of the negotiated device node, while streaming.
    pub fn device_path(&self) -> Option<&Path> {
        self.device.as_ref().map(|device| device.path.as_path())
    }

    /// Start streaming: ensure the kernel module is loaded, negotiate a
    /// device node, register the conversion target with the producer, and
    /// signal it to begin delivering frames.
    ///
    /// On any failure no partial state is retained and the session stays
    /// restartable. Callers must not start a session concurrently with an
    /// in-flight start on the same session.
    pub fn start(&mut self) -> SessionResult<()> {
        if self.device.is_some() {
            return Err(VirtualCameraError::AlreadyStreaming);
        }

        LoopbackModule::new().ensure_loaded(&self.config.card_label)?;

        let spec = OutputSpec {
            width: self.producer.output_width(),
            height: self.producer.output_height(),
            rate: self.producer.frame_rate(),
        };
        info!(
            width = spec.width,
            height = spec.height,
            rate = %spec.rate,
            "Starting virtual camera"
        );

        let candidates = device::scan_candidates(&self.config.device_dir)
            .map_err(|e| VirtualCameraError::ScanFailed(e.to_string()))?;

        let Some(negotiated) = device::first_usable(&candidates, |path| {
            device::try_connect(path, &spec)
        }) else {
            warn!("Failed to start virtual camera: no candidate accepted");
            return Err(VirtualCameraError::NoUsableDevice);
        };

        self.producer.set_video_conversion(VideoConversion {
            fourcc: FourCC::new(b"YUYV"),
            width: spec.width,
            height: spec.height,
        });

        info!(device = %negotiated.path.display(), "Virtual camera started");
        self.frame_size = spec.frame_size();
        self.device = Some(negotiated);
        self.producer.begin_capture();
        Ok(())
    }

    /// Stop streaming and release the device node.
    ///
    /// The producer is told to end capture before the handle is closed, so
    /// no delivery can race the close. Safe to call on a session that never
    /// started.
    pub fn stop(&mut self) {
        let Some(device) = self.device.take() else {
            debug!("Stop requested on idle session");
            return;
        };

        self.producer.end_capture();
        drop(device);
        self.frame_size = 0;
        info!("Virtual camera stopped");
    }

    /// Deliver one frame to the device.
    ///
    /// Invoked by the producer on its delivery path at the configured frame
    /// rate. Short writes are continued with the remaining bytes; a write
    /// error abandons the rest of this frame without surfacing an error or
    /// affecting later frames. Delivery on an idle session is a no-op.
    pub fn deliver_frame(&mut self, frame: &[u8]) {
        let frame_size = self.frame_size;
        let Some(device) = self.device.as_mut() else {
            return;
        };

        if frame.len() < frame_size {
            warn!(
                expected = frame_size,
                actual = frame.len(),
                "Short frame dropped"
            );
            return;
        }

        sink_frame(&mut device.file, &frame[..frame_size]);
    }
}

/// Write one frame, tolerating partial writes.
///
/// Stops silently on a write error or a zero-length write; the undelivered
/// remainder is dropped for this frame only.
fn sink_frame<W: Write>(device: &mut W, frame: &[u8]) {
    let mut remaining = frame;
    while !remaining.is_empty() {
        match device.write(remaining) {
            Ok(0) => break,
            Ok(written) => remaining = &remaining[written..],
            Err(e) => {
                debug!(error = %e, dropped = remaining.len(), "Frame write interrupted");
                break;
            }
        }
    }
}

impl<P: FrameProducer> Drop for VirtualCameraSession<P> {
    fn drop(&mut self) {
        if self.is_streaming() {
            self.stop();
        }
    }
}
