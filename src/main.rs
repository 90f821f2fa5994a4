// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "virtual-camera")]
#[command(about = "Expose a video stream as a virtual camera device")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report loopback module and device status
    Status,

    /// List video devices with driver details
    List,

    /// Stream a test pattern to the virtual camera
    Stream {
        /// Frame width in pixels
        #[arg(long, default_value = "1280")]
        width: u32,

        /// Frame height in pixels
        #[arg(long, default_value = "720")]
        height: u32,

        /// Frames per second
        #[arg(long, default_value = "30")]
        fps: u32,

        /// Card label other applications will see
        #[arg(short, long)]
        label: Option<String>,

        /// Device directory to scan (default: /dev)
        #[arg(long)]
        device_dir: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=virtual_camera=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Status => cli::status(),
        Commands::List => cli::list_devices(),
        Commands::Stream {
            width,
            height,
            fps,
            label,
            device_dir,
        } => cli::stream(width, height, fps, label, device_dir),
    }
}
