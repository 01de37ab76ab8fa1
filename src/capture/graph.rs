//! Session graph
//!
//! Owns the platform capture session and tracks which inputs and logical
//! outputs are attached. Every structural change is bracketed in a
//! begin/commit configuration transaction. Attach failures are reported as
//! configuration warnings and the graph keeps whatever it managed to attach.

use super::photo::{PhotoSettings, QualityPrioritization};
use super::session::{
    CaptureBackend, ConnectionInfo, InputId, OutputId, OutputSpec, PhotoCompletion, SessionPreset,
};
use super::traits::{DeviceDescriptor, MediaKind, OrientationSignal};
use super::warning::{self, ConfigurationWarning, WarningHandler};
use crate::recorder::container::SampleSink;
use crate::recorder::delegate::RecordingDelegate;
use crate::recorder::settings::RecordingSettings;
use crate::recorder::writer::MuxingWriter;
use crate::utils::error::{CaptureError, CaptureResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, Weak};

/// Lifecycle of the capture graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GraphState {
    Unconfigured,
    Configuring,
    /// Configured, session not running
    Idle,
    /// Configured, session running
    Running,
}

/// Output used for video recording
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoOutput {
    /// Sample data outputs feeding the muxing writer
    Writer {
        video: OutputId,
        audio: Option<OutputId>,
    },
    /// Platform movie recorder, used when no recording settings are set
    Movie(OutputId),
}

pub struct SessionGraph {
    backend: Box<dyn CaptureBackend>,
    warnings: WarningHandler,
    state: GraphState,
    preset: SessionPreset,
    active_device: Option<DeviceDescriptor>,
    video_input: Option<InputId>,
    audio_input: Option<InputId>,
    photo_output: Option<OutputId>,
    video_output: Option<VideoOutput>,
    orientation: OrientationSignal,
}

impl SessionGraph {
    pub fn new(backend: Box<dyn CaptureBackend>, warnings: WarningHandler) -> Self {
        Self {
            backend,
            warnings,
            state: GraphState::Unconfigured,
            preset: SessionPreset::default(),
            active_device: None,
            video_input: None,
            audio_input: None,
            photo_output: None,
            video_output: None,
            orientation: OrientationSignal::default(),
        }
    }

    pub fn state(&self) -> GraphState {
        self.state
    }

    pub fn is_configured(&self) -> bool {
        matches!(self.state, GraphState::Idle | GraphState::Running)
    }

    pub fn is_running(&self) -> bool {
        self.state == GraphState::Running
    }

    pub fn active_device(&self) -> Option<&DeviceDescriptor> {
        self.active_device.as_ref()
    }

    pub fn photo_output(&self) -> Option<OutputId> {
        self.photo_output
    }

    pub fn video_output(&self) -> Option<VideoOutput> {
        self.video_output
    }

    /// Whether the first video connection is mirrored
    pub fn is_video_mirrored(&self) -> bool {
        self.backend
            .video_connections()
            .first()
            .map(|connection| connection.is_mirrored)
            .unwrap_or(false)
    }

    /// Connections of the writer's video data output
    pub fn writer_connections(&self) -> Vec<ConnectionInfo> {
        match self.video_output {
            Some(VideoOutput::Writer { video, .. }) => self.backend.connections(video),
            _ => Vec::new(),
        }
    }

    fn warn(&self, warning: ConfigurationWarning) {
        warning::report(warning, &self.warnings);
    }

    fn transaction<R>(&mut self, apply: impl FnOnce(&mut Self) -> R) -> R {
        self.backend.begin_configuration();
        let result = apply(self);
        self.backend.commit_configuration();
        result
    }

    /// Build the graph for `device`.
    ///
    /// Returns false and stays unconfigured only when there is no device;
    /// every other failure degrades the graph instead.
    pub fn configure(
        &mut self,
        device: Option<&DeviceDescriptor>,
        audio_device: Option<&DeviceDescriptor>,
        preset: SessionPreset,
        settings: Option<&RecordingSettings>,
        writer: &Arc<MuxingWriter>,
    ) -> bool {
        let Some(device) = device else {
            self.warn(ConfigurationWarning::CameraDeviceNotSet);
            return false;
        };
        if self.is_configured() {
            return true;
        }

        self.state = GraphState::Configuring;
        self.transaction(|graph| {
            graph.apply_preset(preset);

            match graph.backend.add_input(device, MediaKind::Video) {
                Ok(input) => graph.video_input = Some(input),
                Err(e) => {
                    tracing::debug!("Video input for {} failed: {}", device.display_name, e);
                    graph.warn(ConfigurationWarning::CannotAddVideoInput);
                }
            }
            graph.active_device = Some(device.clone());

            match graph.backend.add_output(OutputSpec::Photo {
                max_quality: QualityPrioritization::Quality,
            }) {
                Ok(output) => graph.photo_output = Some(output),
                Err(_) => graph.warn(ConfigurationWarning::CannotAddPhotoOutput),
            }

            match audio_device {
                Some(audio_device) => {
                    match graph.backend.add_input(audio_device, MediaKind::Audio) {
                        Ok(input) => graph.audio_input = Some(input),
                        Err(e) => {
                            tracing::debug!("Audio input failed: {}", e);
                            graph.warn(ConfigurationWarning::CannotAddAudioInput);
                        }
                    }
                }
                None => graph.warn(ConfigurationWarning::AudioDeviceNotFound),
            }

            graph.apply_video_output(settings, writer);
        });

        self.state = GraphState::Idle;
        tracing::info!(
            "Capture session configured with {} ({:?}, audio: {})",
            device.display_name,
            self.preset,
            self.audio_input.is_some()
        );
        true
    }

    fn apply_preset(&mut self, preset: SessionPreset) {
        if self.backend.can_set_preset(preset) {
            self.backend.set_preset(preset);
            self.preset = preset;
        } else {
            self.backend.set_preset(SessionPreset::High);
            self.preset = SessionPreset::High;
            self.warn(ConfigurationWarning::CannotSetSessionPreset);
        }
    }

    /// Replace the video input with one for `device`.
    ///
    /// Mirroring and orientation are recomputed even if the new input could
    /// not be attached. Returns false if the graph is not configured.
    pub fn swap_video_input(&mut self, device: &DeviceDescriptor) -> bool {
        if !self.is_configured() {
            return false;
        }

        self.transaction(|graph| {
            if let Some(input) = graph.video_input.take() {
                graph.backend.remove_input(input);
            }

            match graph.backend.add_input(device, MediaKind::Video) {
                Ok(input) => graph.video_input = Some(input),
                Err(e) => {
                    tracing::debug!("Video input for {} failed: {}", device.display_name, e);
                    graph.warn(ConfigurationWarning::CannotAddVideoInput);
                }
            }
            graph.active_device = Some(device.clone());
            graph.refresh_connections();
        });

        tracing::debug!("Video input switched to {}", device.display_name);
        true
    }

    /// Rebuild or reconfigure the recording output for new settings
    pub fn update_video_output(
        &mut self,
        settings: Option<&RecordingSettings>,
        writer: &Arc<MuxingWriter>,
    ) {
        self.transaction(|graph| graph.apply_video_output(settings, writer));
    }

    fn apply_video_output(
        &mut self,
        settings: Option<&RecordingSettings>,
        writer: &Arc<MuxingWriter>,
    ) {
        match (settings, self.video_output) {
            (Some(settings), Some(VideoOutput::Writer { .. })) => {
                writer.configure_output(settings);
            }
            (Some(settings), current) => {
                if let Some(VideoOutput::Movie(output)) = current {
                    self.backend.remove_output(output);
                    self.video_output = None;
                }
                writer.configure_output(settings);
                self.attach_writer_outputs(writer);
            }
            (None, Some(VideoOutput::Movie(_))) => {}
            (None, current) => {
                if let Some(VideoOutput::Writer { video, audio }) = current {
                    // Finalize before the data outputs go away
                    if writer.stop_recording() {
                        tracing::info!("Recording stopped for the switch to movie output");
                    }
                    self.backend.remove_output(video);
                    if let Some(audio) = audio {
                        self.backend.remove_output(audio);
                    }
                    self.video_output = None;
                }
                match self.backend.add_output(OutputSpec::MovieFile) {
                    Ok(output) => self.video_output = Some(VideoOutput::Movie(output)),
                    Err(_) => self.warn(ConfigurationWarning::CannotAddVideoFileOutput),
                }
            }
        }

        self.refresh_connections();
    }

    fn attach_writer_outputs(&mut self, writer: &Arc<MuxingWriter>) {
        let sink: Arc<dyn SampleSink> = writer.clone();

        let video = match self.backend.add_output(OutputSpec::SampleData {
            kind: MediaKind::Video,
            sink: sink.clone(),
        }) {
            Ok(output) => output,
            Err(_) => {
                self.warn(ConfigurationWarning::CannotAddVideoFileOutput);
                return;
            }
        };

        let audio = match self.backend.add_output(OutputSpec::SampleData {
            kind: MediaKind::Audio,
            sink,
        }) {
            Ok(output) => Some(output),
            Err(_) => {
                self.warn(ConfigurationWarning::CannotAddAudioDataOutput);
                None
            }
        };

        self.video_output = Some(VideoOutput::Writer { video, audio });
    }

    /// Record a new orientation signal and apply it; false if unchanged
    pub fn set_orientation(&mut self, orientation: OrientationSignal) -> bool {
        if self.orientation == orientation {
            return false;
        }
        self.orientation = orientation;
        if self.is_configured() {
            self.refresh_connections();
        }
        true
    }

    /// Recompute mirroring and orientation on every video connection.
    ///
    /// Connections that support neither are skipped.
    pub fn refresh_connections(&mut self) {
        let mirrored = self
            .active_device
            .as_ref()
            .map(DeviceDescriptor::is_front)
            .unwrap_or(false);
        let orientation = self.orientation.resolve();

        for connection in self.backend.video_connections() {
            if connection.supports_mirroring {
                self.backend.set_video_mirrored(connection.id, mirrored);
            }
            if connection.supports_orientation {
                self.backend.set_video_orientation(connection.id, orientation);
            }
        }
        tracing::debug!(
            "Connections updated: mirrored={}, orientation={:?}",
            mirrored,
            orientation
        );
    }

    /// Start the session; no-op unless configured and idle
    pub fn start(&mut self) {
        match self.state {
            GraphState::Idle => {
                if !self.backend.is_running() {
                    self.backend.start_running();
                }
                self.state = GraphState::Running;
                tracing::info!("Capture session running");
            }
            GraphState::Running => {}
            GraphState::Unconfigured | GraphState::Configuring => {
                tracing::debug!("Capture session not configured; start ignored");
            }
        }
    }

    /// Stop the session; no-op unless running
    pub fn stop(&mut self) {
        if self.state == GraphState::Running {
            if self.backend.is_running() {
                self.backend.stop_running();
            }
            self.state = GraphState::Idle;
            tracing::info!("Capture session stopped");
        }
    }

    /// Capture a photo; the completion always fires exactly once
    pub fn capture_photo(&mut self, completion: PhotoCompletion) {
        let Some(output) = self.photo_output else {
            completion(Err(CaptureError::NoPhotoOutputConfigured));
            return;
        };
        let settings = PhotoSettings::for_capabilities(&self.backend.photo_capabilities(output));
        tracing::debug!("Capturing photo with {:?}", settings);
        self.backend.capture_photo(output, settings, completion);
    }

    pub fn start_movie_recording(
        &mut self,
        path: &Path,
        delegate: Weak<dyn RecordingDelegate>,
    ) -> CaptureResult<()> {
        match self.video_output {
            Some(VideoOutput::Movie(output)) => {
                self.backend.start_movie_recording(output, path, delegate)
            }
            _ => Err(CaptureError::NoVideoOutputConfigured),
        }
    }

    pub fn stop_movie_recording(&mut self) -> bool {
        match self.video_output {
            Some(VideoOutput::Movie(output)) => self.backend.stop_movie_recording(output),
            _ => false,
        }
    }
}
