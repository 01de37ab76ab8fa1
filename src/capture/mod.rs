//! Capture devices and the capture session graph
//!
//! The platform layer provides device enumeration (`DeviceProvider`) and the
//! physical session (`CaptureBackend`); this module decides what to attach.

pub mod catalog;
pub mod graph;
pub mod photo;
pub mod session;
pub mod traits;
pub mod warning;

pub use catalog::{DeviceCatalog, DiscoveryPolicy};
pub use graph::{GraphState, SessionGraph, VideoOutput};
pub use photo::{Photo, PhotoCapabilities, PhotoSettings, QualityPrioritization};
pub use session::{
    CaptureBackend, ConnectionId, ConnectionInfo, InputId, OutputId, OutputSpec, PhotoCompletion,
    SessionPreset,
};
pub use traits::{
    AuthorizationStatus, DeviceDescriptor, DeviceOrientation, DevicePosition, DeviceProvider,
    MediaKind, OrientationSignal, VideoOrientation,
};
pub use warning::{ConfigurationWarning, WarningHandler};
