//! Capture Studio - camera capture sessions and real-time muxing.
//!
//! The crate decides what a capture session looks like (devices, inputs,
//! outputs, mirroring and orientation) and writes recordings by muxing
//! audio and video samples into a single container. Device enumeration,
//! the physical session and the encoders are supplied by the platform layer
//! through the traits in [`capture`] and [`recorder`].

pub mod camera;
pub mod capture;
pub mod config;
pub mod recorder;
pub mod utils;

pub use camera::{CameraEvent, CaptureOrchestrator};
pub use config::CameraConfig;
pub use utils::error::{CaptureError, CaptureResult};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the default tracing subscriber.
///
/// Honors `RUST_LOG`; does nothing if a subscriber is already installed.
pub fn init_logging() {
    let initialized = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "capture_studio=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok();

    if initialized {
        tracing::info!("Capture Studio v{}", env!("CARGO_PKG_VERSION"));
    }
}
