// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for virtual camera operations
//!
//! This module provides command-line functionality for:
//! - Reporting loopback module and device status
//! - Listing video devices
//! - Streaming a test pattern to the virtual camera

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use virtual_camera::config::Config;
use virtual_camera::device::diagnostics::enumerate_devices;
use virtual_camera::module::LoopbackModule;
use virtual_camera::pattern::PatternProducer;
use virtual_camera::producer::Framerate;
use virtual_camera::session::VirtualCameraSession;

/// Report loopback module and device status
pub fn status() -> Result<(), Box<dyn std::error::Error>> {
    let module = LoopbackModule::new();
    let loaded = module.is_loaded();
    let available = loaded || module.is_available();

    println!("v4l2loopback module:");
    println!("  loaded:    {}", if loaded { "yes" } else { "no" });
    println!("  available: {}", if available { "yes" } else { "no" });
    println!();

    let devices = enumerate_devices();
    let loopbacks: Vec<_> = devices.iter().filter(|device| device.is_loopback()).collect();

    if loopbacks.is_empty() {
        println!("No loopback output devices found.");
        if !loaded {
            println!("Run 'virtual-camera stream' to load the module and start streaming.");
        }
    } else {
        println!("Loopback output devices:");
        for device in loopbacks {
            println!("  {} ({})", device.path.display(), device.card);
        }
    }

    Ok(())
}

/// List all video devices with driver details
pub fn list_devices() -> Result<(), Box<dyn std::error::Error>> {
    let devices = enumerate_devices();

    if devices.is_empty() {
        println!("No video devices found.");
        return Ok(());
    }

    println!("Video devices:");
    println!();
    for device in devices {
        println!("  {}", device.path.display());
        println!("      driver: {}", device.driver);
        println!("      card:   {}", device.card);
        println!(
            "      output: {}",
            if device.output_capable { "yes" } else { "no" }
        );
        println!();
    }

    Ok(())
}

/// Stream a test pattern to the virtual camera until Ctrl+C
pub fn stream(
    width: u32,
    height: u32,
    fps: u32,
    label: Option<String>,
    device_dir: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load();
    if let Some(label) = label {
        config.card_label = label;
    }
    if let Some(dir) = device_dir {
        config.device_dir = dir;
    }

    let producer = Arc::new(PatternProducer::new(
        width,
        height,
        Framerate::from_int(fps),
    ));
    let mut session = VirtualCameraSession::with_config(Arc::clone(&producer), config);
    session.start()?;

    let device = session
        .device_path()
        .map(|path| path.display().to_string())
        .unwrap_or_default();
    println!("Streaming {}x{} @ {}fps to {}", width, height, fps, device);
    println!("Press Ctrl+C to stop.");

    // Set up Ctrl+C handler
    let stop_flag = Arc::new(AtomicBool::new(false));
    let stop_flag_clone = stop_flag.clone();
    ctrlc::set_handler(move || {
        stop_flag_clone.store(true, Ordering::SeqCst);
    })?;

    let interval = Duration::from_secs_f64(1.0 / f64::from(fps.max(1)));
    let mut buffer = vec![0u8; producer.frame_size()];
    let mut frames: u64 = 0;
    let start = Instant::now();

    while !stop_flag.load(Ordering::SeqCst) {
        if producer.is_capturing() {
            producer.render(frames, &mut buffer);
            session.deliver_frame(&buffer);
            frames += 1;
        }

        std::thread::sleep(interval);
    }

    println!();
    session.stop();
    println!(
        "Delivered {} frames in {:.1}s",
        frames,
        start.elapsed().as_secs_f64()
    );

    Ok(())
}
