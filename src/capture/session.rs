//! Physical capture session surface
//!
//! `CaptureBackend` is implemented by the platform layer. The session graph
//! drives it from the serialization queue only.

use super::photo::{Photo, PhotoCapabilities, PhotoSettings, QualityPrioritization};
use super::traits::{DeviceDescriptor, MediaKind, VideoOrientation};
use crate::recorder::container::SampleSink;
use crate::recorder::delegate::RecordingDelegate;
use crate::utils::error::CaptureResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::{Arc, Weak};

/// Handle to an input attached to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InputId(pub u64);

/// Handle to an output attached to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutputId(pub u64);

/// Handle to a connection between an input port and an output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub u64);

/// Quality level requested for the whole session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionPreset {
    Photo,
    #[default]
    High,
    Medium,
    Low,
    Vga640x480,
    Hd1280x720,
    Hd1920x1080,
    Hd4K3840x2160,
    InputPriority,
}

/// Output to attach to the session
pub enum OutputSpec {
    /// Still photo output
    Photo {
        max_quality: QualityPrioritization,
    },
    /// Platform movie recorder that writes files on its own
    MovieFile,
    /// Raw sample buffers delivered to a sink on a capture thread
    SampleData {
        kind: MediaKind,
        sink: Arc<dyn SampleSink>,
    },
}

impl fmt::Debug for OutputSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputSpec::Photo { max_quality } => f
                .debug_struct("Photo")
                .field("max_quality", max_quality)
                .finish(),
            OutputSpec::MovieFile => f.write_str("MovieFile"),
            OutputSpec::SampleData { kind, .. } => {
                f.debug_struct("SampleData").field("kind", kind).finish()
            }
        }
    }
}

/// State of one output connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub id: ConnectionId,
    pub media: MediaKind,
    pub supports_mirroring: bool,
    pub supports_orientation: bool,
    pub is_mirrored: bool,
    pub orientation: VideoOrientation,
}

/// Completion invoked once with the photo or the failure
pub type PhotoCompletion = Box<dyn FnOnce(CaptureResult<Photo>) + Send + 'static>;

/// The platform capture session
pub trait CaptureBackend: Send {
    fn begin_configuration(&mut self);
    fn commit_configuration(&mut self);

    fn can_set_preset(&self, preset: SessionPreset) -> bool;
    fn set_preset(&mut self, preset: SessionPreset);

    /// Open `device` and attach it as an input
    fn add_input(&mut self, device: &DeviceDescriptor, kind: MediaKind) -> CaptureResult<InputId>;
    fn remove_input(&mut self, input: InputId);

    fn add_output(&mut self, output: OutputSpec) -> CaptureResult<OutputId>;
    fn remove_output(&mut self, output: OutputId);

    /// Video connections of every attached output
    fn video_connections(&self) -> Vec<ConnectionInfo>;
    /// Connections of a single output
    fn connections(&self, output: OutputId) -> Vec<ConnectionInfo>;
    fn set_video_mirrored(&mut self, connection: ConnectionId, mirrored: bool);
    fn set_video_orientation(&mut self, connection: ConnectionId, orientation: VideoOrientation);

    fn start_running(&mut self);
    fn stop_running(&mut self);
    fn is_running(&self) -> bool;

    fn photo_capabilities(&self, output: OutputId) -> PhotoCapabilities;
    /// Trigger a capture; `completion` must be called exactly once
    fn capture_photo(
        &mut self,
        output: OutputId,
        settings: PhotoSettings,
        completion: PhotoCompletion,
    );

    /// Start the platform movie recorder; notifications go to `delegate`
    fn start_movie_recording(
        &mut self,
        output: OutputId,
        path: &Path,
        delegate: Weak<dyn RecordingDelegate>,
    ) -> CaptureResult<()>;
    /// Returns false if the movie recorder was not recording
    fn stop_movie_recording(&mut self, output: OutputId) -> bool;
}
