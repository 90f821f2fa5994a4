// SPDX-License-Identifier: GPL-3.0-only

//! Test-pattern frame producer
//!
//! Renders moving YUYV colour bars. Used by the CLI streaming mode to drive
//! the whole stack against a real loopback device, and as a producer
//! stand-in for tests.

use crate::producer::{FrameProducer, Framerate, VideoConversion};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// Eight-bar palette in (Y, Cb, Cr): white, yellow, cyan, green, magenta,
/// red, blue, black.
const BARS: [(u8, u8, u8); 8] = [
    (235, 128, 128),
    (210, 16, 146),
    (170, 166, 16),
    (145, 54, 34),
    (106, 202, 222),
    (81, 90, 240),
    (41, 240, 110),
    (16, 128, 128),
];

/// Frame producer that renders scrolling colour bars.
///
/// Width must be even: YUYV packs two pixels into each four-byte group.
pub struct PatternProducer {
    width: u32,
    height: u32,
    rate: Framerate,
    capturing: AtomicBool,
    conversion: Mutex<Option<VideoConversion>>,
}

impl PatternProducer {
    pub fn new(width: u32, height: u32, rate: Framerate) -> Self {
        Self {
            width,
            height,
            rate,
            capturing: AtomicBool::new(false),
            conversion: Mutex::new(None),
        }
    }

    /// Whether a session has signalled capture to begin.
    pub fn is_capturing(&self) -> bool {
        self.capturing.load(Ordering::SeqCst)
    }

    /// The conversion target registered by a session, if any.
    pub fn conversion(&self) -> Option<VideoConversion> {
        self.conversion.lock().ok().and_then(|guard| *guard)
    }

    /// Size in bytes of one frame.
    pub fn frame_size(&self) -> usize {
        (self.width * self.height * 2) as usize
    }

    /// Render frame `index` into `buffer`, sized [`frame_size`](Self::frame_size).
    pub fn render(&self, index: u64, buffer: &mut [u8]) {
        fill_yuyv_bars(buffer, self.width, self.height, index);
    }
}

impl FrameProducer for PatternProducer {
    fn output_width(&self) -> u32 {
        self.width
    }

    fn output_height(&self) -> u32 {
        self.height
    }

    fn frame_rate(&self) -> Framerate {
        self.rate
    }

    fn set_video_conversion(&self, conversion: VideoConversion) {
        if let Ok(mut guard) = self.conversion.lock() {
            *guard = Some(conversion);
        }
    }

    fn begin_capture(&self) {
        self.capturing.store(true, Ordering::SeqCst);
    }

    fn end_capture(&self) {
        self.capturing.store(false, Ordering::SeqCst);
    }
}

/// Fill a packed YUYV buffer with colour bars shifted by `index` pixels.
pub fn fill_yuyv_bars(buffer: &mut [u8], width: u32, height: u32, index: u64) {
    let width = width as usize;
    let height = height as usize;
    let row_bytes = width * 2;
    let bar_width = (width / BARS.len()).max(1);
    let shift = (index as usize) % width.max(1);

    for y in 0..height {
        let row = &mut buffer[y * row_bytes..(y + 1) * row_bytes];
        for pair in 0..width / 2 {
            let x = pair * 2;
            let bar = ((x + shift) / bar_width) % BARS.len();
            let (luma, cb, cr) = BARS[bar];
            row[pair * 4] = luma;
            row[pair * 4 + 1] = cb;
            row[pair * 4 + 2] = luma;
            row[pair * 4 + 3] = cr;
        }
    }
}
