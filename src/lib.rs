// SPDX-License-Identifier: GPL-3.0-only

//! Virtual camera output via the v4l2loopback kernel module
//!
//! Exposes a live video stream to other applications as a standard V4L2
//! capture device. The crate loads the loopback module when needed
//! (privileged, sandbox-aware), negotiates a free `/dev/video*` node,
//! matches its format and timing to the producing pipeline, and feeds it
//! frames for the session's lifetime.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`module`]: loopback kernel module presence checks and loading
//! - [`device`]: device node discovery and format negotiation
//! - [`session`]: session lifecycle and the frame sink
//! - [`producer`]: the trait the frame-producing pipeline implements
//! - [`pattern`]: test-pattern producer for demos and tests
//! - [`config`]: user configuration handling
//!
//! # Example
//!
//! ```ignore
//! let producer = Arc::new(PatternProducer::new(1280, 720, Framerate::from_int(30)));
//! let mut session = VirtualCameraSession::new(Arc::clone(&producer));
//! session.start()?;
//! // ... deliver frames on the producer's cadence ...
//! session.stop();
//! ```

pub mod command;
pub mod config;
pub mod constants;
pub mod device;
pub mod errors;
pub mod module;
pub mod pattern;
pub mod producer;
pub mod session;

// Re-export commonly used types
pub use config::Config;
pub use errors::{SessionResult, VirtualCameraError};
pub use module::LoopbackModule;
pub use producer::{FrameProducer, Framerate, VideoConversion};
pub use session::VirtualCameraSession;
