// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for device negotiation and session lifecycle

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use virtual_camera::device::first_usable;
use virtual_camera::producer::{FrameProducer, Framerate, VideoConversion};
use virtual_camera::session::VirtualCameraSession;

#[derive(Default)]
struct HandleLedger {
    opened: usize,
    closed: usize,
}

/// Stand-in for an open device handle; dropping it counts as a close.
struct MockHandle {
    ledger: Rc<RefCell<HandleLedger>>,
}

impl MockHandle {
    fn open(ledger: &Rc<RefCell<HandleLedger>>) -> Self {
        ledger.borrow_mut().opened += 1;
        Self {
            ledger: Rc::clone(ledger),
        }
    }
}

impl Drop for MockHandle {
    fn drop(&mut self) {
        self.ledger.borrow_mut().closed += 1;
    }
}

fn candidates(count: usize) -> Vec<PathBuf> {
    (0..count)
        .map(|index| PathBuf::from(format!("/dev/video{}", index)))
        .collect()
}

#[test]
fn test_negotiation_opens_and_closes_exact_handle_counts() {
    let failing = 3;
    let ledger = Rc::new(RefCell::new(HandleLedger::default()));
    let mut attempts = 0;

    let accepted = first_usable(&candidates(6), |_path| {
        let handle = MockHandle::open(&ledger);
        let accept = attempts == failing;
        attempts += 1;
        // Rejected handles drop right here, before the next candidate
        accept.then_some(handle)
    });

    assert!(accepted.is_some(), "the candidate after K failures must be accepted");
    assert_eq!(
        ledger.borrow().opened,
        failing + 1,
        "exactly K+1 handles opened"
    );
    assert_eq!(
        ledger.borrow().closed,
        failing,
        "exactly the K failing handles closed"
    );

    drop(accepted);
    assert_eq!(
        ledger.borrow().closed,
        failing + 1,
        "the accepted handle closes when released"
    );
}

#[test]
fn test_negotiation_never_probes_past_first_success() {
    let ledger = Rc::new(RefCell::new(HandleLedger::default()));
    let mut attempts = 0;

    let accepted = first_usable(&candidates(6), |_path| {
        attempts += 1;
        Some(MockHandle::open(&ledger))
    });

    assert!(accepted.is_some());
    assert_eq!(attempts, 1, "no candidate may be probed after an acceptance");
}

#[test]
fn test_negotiation_fails_only_when_all_candidates_rejected() {
    let ledger = Rc::new(RefCell::new(HandleLedger::default()));

    let accepted = first_usable(&candidates(4), |_path| {
        MockHandle::open(&ledger);
        None::<MockHandle>
    });

    assert!(accepted.is_none());
    assert_eq!(ledger.borrow().opened, 4, "every candidate gets one attempt");
    assert_eq!(ledger.borrow().closed, 4, "no handle survives a full rejection");
}

#[test]
fn test_candidates_are_tried_in_given_order() {
    let mut visited = Vec::new();

    let accepted = first_usable(&candidates(3), |path| {
        visited.push(path.to_path_buf());
        None::<()>
    });

    assert!(accepted.is_none());
    assert_eq!(visited, candidates(3));
}

/// Producer stub that counts lifecycle notifications.
#[derive(Default)]
struct StubProducer {
    began: AtomicUsize,
    ended: AtomicUsize,
}

impl FrameProducer for StubProducer {
    fn output_width(&self) -> u32 {
        4
    }

    fn output_height(&self) -> u32 {
        2
    }

    fn frame_rate(&self) -> Framerate {
        Framerate::from_int(30)
    }

    fn set_video_conversion(&self, _conversion: VideoConversion) {}

    fn begin_capture(&self) {
        self.began.fetch_add(1, Ordering::SeqCst);
    }

    fn end_capture(&self) {
        self.ended.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_stop_on_never_started_session_is_a_no_op() {
    let producer = Arc::new(StubProducer::default());
    let mut session = VirtualCameraSession::new(Arc::clone(&producer));

    session.stop();
    session.stop();

    assert!(!session.is_streaming());
    assert!(session.device_path().is_none());
    assert_eq!(
        producer.ended.load(Ordering::SeqCst),
        0,
        "end_capture must not fire for a session that never started"
    );
}

#[test]
fn test_deliver_frame_on_idle_session_is_dropped() {
    let producer = Arc::new(StubProducer::default());
    let mut session = VirtualCameraSession::new(Arc::clone(&producer));

    // Must neither panic nor touch a device
    session.deliver_frame(&[0u8; 16]);
    assert!(!session.is_streaming());
}
