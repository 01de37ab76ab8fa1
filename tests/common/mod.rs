//! Scriptable platform fakes shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use capture_studio::capture::{
    AuthorizationStatus, CaptureBackend, ConnectionId, ConnectionInfo, DeviceDescriptor,
    DevicePosition, DeviceProvider, InputId, MediaKind, OutputId, OutputSpec, Photo,
    PhotoCapabilities, PhotoCompletion, PhotoSettings, SessionPreset, VideoOrientation,
};
use capture_studio::recorder::{
    ContainerType, ContainerWriter, ContainerWriterFactory, MediaTime, RecordingDelegate,
    SampleBuffer, SampleSink, TrackInput,
};
use capture_studio::{CaptureError, CaptureResult};
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

pub fn back_camera() -> DeviceDescriptor {
    DeviceDescriptor::new("cam-back", "Back Camera", DevicePosition::Back)
}

pub fn front_camera() -> DeviceDescriptor {
    DeviceDescriptor::new("cam-front", "Front Camera", DevicePosition::Front)
}

pub fn microphone() -> DeviceDescriptor {
    DeviceDescriptor::new("mic", "Built-in Microphone", DevicePosition::Unspecified)
}

pub fn video_at(millis: i64) -> SampleBuffer {
    SampleBuffer::video(MediaTime::new(millis, 1000), vec![0; 16])
}

pub fn audio_at(millis: i64) -> SampleBuffer {
    SampleBuffer::audio(MediaTime::new(millis, 1000), vec![0; 4])
}

// ---- Device provider ----

pub struct FakeProvider {
    devices: Mutex<Vec<DeviceDescriptor>>,
    status: Mutex<AuthorizationStatus>,
    grant: AtomicBool,
    pub authorization_requests: AtomicUsize,
}

impl FakeProvider {
    pub fn new(devices: Vec<DeviceDescriptor>) -> Arc<Self> {
        Arc::new(Self {
            devices: Mutex::new(devices),
            status: Mutex::new(AuthorizationStatus::Authorized),
            grant: AtomicBool::new(true),
            authorization_requests: AtomicUsize::new(0),
        })
    }

    pub fn set_devices(&self, devices: Vec<DeviceDescriptor>) {
        *self.devices.lock() = devices;
    }

    /// Start undetermined; the next request answers `grant`
    pub fn undetermined(&self, grant: bool) {
        *self.status.lock() = AuthorizationStatus::NotDetermined;
        self.grant.store(grant, Ordering::SeqCst);
    }

    pub fn set_status(&self, status: AuthorizationStatus) {
        *self.status.lock() = status;
    }
}

#[async_trait]
impl DeviceProvider for FakeProvider {
    fn devices(&self) -> Vec<DeviceDescriptor> {
        self.devices.lock().clone()
    }

    fn default_video_device(&self) -> Option<DeviceDescriptor> {
        let devices = self.devices.lock();
        devices
            .iter()
            .find(|device| device.position == DevicePosition::Back)
            .or_else(|| devices.first())
            .cloned()
    }

    fn default_audio_device(&self) -> Option<DeviceDescriptor> {
        Some(microphone())
    }

    fn authorization_status(&self) -> AuthorizationStatus {
        *self.status.lock()
    }

    async fn request_authorization(&self) -> bool {
        self.authorization_requests.fetch_add(1, Ordering::SeqCst);
        let granted = self.grant.load(Ordering::SeqCst);
        *self.status.lock() = if granted {
            AuthorizationStatus::Authorized
        } else {
            AuthorizationStatus::Denied
        };
        granted
    }
}

// ---- Capture backend ----

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeOutput {
    Photo,
    Movie,
    Data(MediaKind),
}

/// Everything the fake session has been asked to do
#[derive(Default)]
pub struct BackendState {
    pub running: bool,
    pub preset: Option<SessionPreset>,
    pub reject_presets: bool,
    pub fail_photo_output: bool,
    pub fail_photo_capture: bool,
    pub fail_audio_data_output: bool,
    pub configuration_depth: usize,
    pub commits: usize,
    pub start_calls: usize,
    pub stop_calls: usize,
    next_id: u64,
    pub inputs: Vec<(InputId, String, MediaKind)>,
    pub outputs: Vec<(OutputId, FakeOutput)>,
    pub sinks: Vec<(MediaKind, Arc<dyn SampleSink>)>,
    pub mirrored: HashMap<u64, bool>,
    pub orientations: HashMap<u64, VideoOrientation>,
    pub photo_captures: Vec<PhotoSettings>,
    pub movie: Option<(PathBuf, Weak<dyn RecordingDelegate>)>,
    /// Hold the movie finish notification until `finish_deferred_movie`
    pub defer_movie_finish: bool,
    deferred_finish: Option<(PathBuf, Weak<dyn RecordingDelegate>)>,
}

impl BackendState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn has_input(&self, kind: MediaKind) -> bool {
        self.inputs.iter().any(|(_, _, input)| *input == kind)
    }

    pub fn video_device(&self) -> Option<String> {
        self.inputs
            .iter()
            .find(|(_, _, kind)| *kind == MediaKind::Video)
            .map(|(_, identity, _)| identity.clone())
    }

    pub fn output_kinds(&self) -> Vec<FakeOutput> {
        self.outputs.iter().map(|(_, kind)| *kind).collect()
    }

    fn connection(&self, output: OutputId, kind: FakeOutput) -> Option<ConnectionInfo> {
        let media = match kind {
            FakeOutput::Data(MediaKind::Audio) => MediaKind::Audio,
            _ => MediaKind::Video,
        };
        if !self.has_input(media) {
            return None;
        }
        let video = media == MediaKind::Video;
        Some(ConnectionInfo {
            id: ConnectionId(output.0),
            media,
            supports_mirroring: video,
            supports_orientation: video,
            is_mirrored: self.mirrored.get(&output.0).copied().unwrap_or(false),
            orientation: self
                .orientations
                .get(&output.0)
                .copied()
                .unwrap_or_default(),
        })
    }

    /// Push a sample into every data output of the given kind
    pub fn sinks_for(&self, kind: MediaKind) -> Vec<Arc<dyn SampleSink>> {
        self.sinks
            .iter()
            .filter(|(sink_kind, _)| *sink_kind == kind)
            .map(|(_, sink)| sink.clone())
            .collect()
    }
}

pub struct FakeBackend {
    pub state: Arc<Mutex<BackendState>>,
}

impl FakeBackend {
    pub fn new() -> (Box<dyn CaptureBackend>, Arc<Mutex<BackendState>>) {
        let state = Arc::new(Mutex::new(BackendState::default()));
        (
            Box::new(Self {
                state: state.clone(),
            }),
            state,
        )
    }
}

impl CaptureBackend for FakeBackend {
    fn begin_configuration(&mut self) {
        self.state.lock().configuration_depth += 1;
    }

    fn commit_configuration(&mut self) {
        let mut state = self.state.lock();
        state.configuration_depth -= 1;
        state.commits += 1;
    }

    fn can_set_preset(&self, _preset: SessionPreset) -> bool {
        !self.state.lock().reject_presets
    }

    fn set_preset(&mut self, preset: SessionPreset) {
        self.state.lock().preset = Some(preset);
    }

    fn add_input(&mut self, device: &DeviceDescriptor, kind: MediaKind) -> CaptureResult<InputId> {
        let mut state = self.state.lock();
        if state.has_input(kind) {
            return Err(CaptureError::Platform(format!("{} input already attached", kind)));
        }
        let id = InputId(state.next_id());
        state.inputs.push((id, device.identity.clone(), kind));
        Ok(id)
    }

    fn remove_input(&mut self, input: InputId) {
        self.state.lock().inputs.retain(|(id, _, _)| *id != input);
    }

    fn add_output(&mut self, output: OutputSpec) -> CaptureResult<OutputId> {
        let mut state = self.state.lock();
        let kind = match output {
            OutputSpec::Photo { .. } if state.fail_photo_output => {
                return Err(CaptureError::Platform("photo output refused".into()));
            }
            OutputSpec::Photo { .. } => FakeOutput::Photo,
            OutputSpec::MovieFile => FakeOutput::Movie,
            OutputSpec::SampleData { kind, sink } => {
                if kind == MediaKind::Audio && state.fail_audio_data_output {
                    return Err(CaptureError::Platform("audio data output refused".into()));
                }
                state.sinks.push((kind, sink));
                FakeOutput::Data(kind)
            }
        };
        let id = OutputId(state.next_id());
        state.outputs.push((id, kind));
        Ok(id)
    }

    fn remove_output(&mut self, output: OutputId) {
        let mut state = self.state.lock();
        if let Some(FakeOutput::Data(kind)) = state
            .outputs
            .iter()
            .find(|(id, _)| *id == output)
            .map(|(_, kind)| *kind)
        {
            state.sinks.retain(|(sink_kind, _)| *sink_kind != kind);
        }
        state.outputs.retain(|(id, _)| *id != output);
    }

    fn video_connections(&self) -> Vec<ConnectionInfo> {
        let state = self.state.lock();
        state
            .outputs
            .iter()
            .filter_map(|(id, kind)| state.connection(*id, *kind))
            .filter(|connection| connection.media == MediaKind::Video)
            .collect()
    }

    fn connections(&self, output: OutputId) -> Vec<ConnectionInfo> {
        let state = self.state.lock();
        state
            .outputs
            .iter()
            .filter(|(id, _)| *id == output)
            .filter_map(|(id, kind)| state.connection(*id, *kind))
            .collect()
    }

    fn set_video_mirrored(&mut self, connection: ConnectionId, mirrored: bool) {
        self.state.lock().mirrored.insert(connection.0, mirrored);
    }

    fn set_video_orientation(&mut self, connection: ConnectionId, orientation: VideoOrientation) {
        self.state.lock().orientations.insert(connection.0, orientation);
    }

    fn start_running(&mut self) {
        let mut state = self.state.lock();
        state.running = true;
        state.start_calls += 1;
    }

    fn stop_running(&mut self) {
        let mut state = self.state.lock();
        state.running = false;
        state.stop_calls += 1;
    }

    fn is_running(&self) -> bool {
        self.state.lock().running
    }

    fn photo_capabilities(&self, _output: OutputId) -> PhotoCapabilities {
        PhotoCapabilities {
            available_codecs: vec![
                capture_studio::recorder::VideoCodec::Jpeg,
                capture_studio::recorder::VideoCodec::Hevc,
            ],
            preview_pixel_formats: vec![0x42475241],
        }
    }

    fn capture_photo(
        &mut self,
        _output: OutputId,
        settings: PhotoSettings,
        completion: PhotoCompletion,
    ) {
        let codec = settings.codec.clone();
        let mut state = self.state.lock();
        state.photo_captures.push(settings);
        if state.fail_photo_capture {
            drop(state);
            completion(Err(CaptureError::Photo("sensor busy".into())));
            return;
        }
        drop(state);
        completion(Ok(Photo {
            data: vec![0xFF, 0xD8, 0xFF],
            codec,
            width: 4032,
            height: 3024,
        }));
    }

    fn start_movie_recording(
        &mut self,
        _output: OutputId,
        path: &Path,
        delegate: Weak<dyn RecordingDelegate>,
    ) -> CaptureResult<()> {
        let mut state = self.state.lock();
        if state.movie.is_some() {
            return Err(CaptureError::Platform("movie recorder busy".into()));
        }
        if let Some(delegate) = delegate.upgrade() {
            delegate.on_recording_started(path, &[]);
        }
        state.movie = Some((path.to_path_buf(), delegate));
        Ok(())
    }

    fn stop_movie_recording(&mut self, _output: OutputId) -> bool {
        let mut state = self.state.lock();
        let Some((path, delegate)) = state.movie.take() else {
            return false;
        };
        if state.defer_movie_finish {
            state.deferred_finish = Some((path, delegate));
            return true;
        }
        drop(state);
        if let Some(delegate) = delegate.upgrade() {
            delegate.on_recording_finished(&path, &[], None);
        }
        true
    }
}

/// Deliver a finish notification held back by `defer_movie_finish`
pub fn finish_deferred_movie(state: &Arc<Mutex<BackendState>>) {
    let deferred = state.lock().deferred_finish.take();
    if let Some((path, delegate)) = deferred {
        if let Some(delegate) = delegate.upgrade() {
            delegate.on_recording_finished(&path, &[], None);
        }
    }
}

// ---- Container writer ----

/// Everything written through the fake container
#[derive(Default)]
pub struct ContainerLog {
    pub created: Vec<(PathBuf, ContainerType)>,
    pub tracks: Vec<(MediaKind, Map<String, Value>)>,
    pub session_start: Option<MediaTime>,
    pub session_end: Option<MediaTime>,
    pub video: Vec<MediaTime>,
    pub audio: Vec<MediaTime>,
    pub finished_tracks: Vec<MediaKind>,
    pub finished: Vec<PathBuf>,
}

#[derive(Clone, Default)]
pub struct FakeContainerFactory {
    pub log: Arc<Mutex<ContainerLog>>,
    /// Shared readiness of every track input
    pub ready: Arc<AtomicBool>,
    pub refuse_audio_track: Arc<AtomicBool>,
    pub fail_finish: Arc<AtomicBool>,
}

impl FakeContainerFactory {
    pub fn new() -> Self {
        let factory = Self::default();
        factory.ready.store(true, Ordering::SeqCst);
        factory
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }
}

impl ContainerWriterFactory for FakeContainerFactory {
    fn create(
        &self,
        output_path: &Path,
        container: ContainerType,
    ) -> CaptureResult<Box<dyn ContainerWriter>> {
        self.log
            .lock()
            .created
            .push((output_path.to_path_buf(), container));
        Ok(Box::new(FakeContainer {
            path: output_path.to_path_buf(),
            factory: self.clone(),
        }))
    }
}

struct FakeContainer {
    path: PathBuf,
    factory: FakeContainerFactory,
}

impl ContainerWriter for FakeContainer {
    fn output_path(&self) -> &Path {
        &self.path
    }

    fn add_track(
        &mut self,
        kind: MediaKind,
        output_settings: &Map<String, Value>,
    ) -> Option<Box<dyn TrackInput>> {
        if kind == MediaKind::Audio && self.factory.refuse_audio_track.load(Ordering::SeqCst) {
            return None;
        }
        self.factory
            .log
            .lock()
            .tracks
            .push((kind, output_settings.clone()));
        Some(Box::new(FakeTrack {
            kind,
            factory: self.factory.clone(),
        }))
    }

    fn start_writing(&mut self) -> CaptureResult<()> {
        Ok(())
    }

    fn start_session(&mut self, at: MediaTime) {
        self.factory.log.lock().session_start = Some(at);
    }

    fn end_session(&mut self, at: MediaTime) {
        self.factory.log.lock().session_end = Some(at);
    }

    fn finish_writing(self: Box<Self>) -> CaptureResult<PathBuf> {
        if self.factory.fail_finish.load(Ordering::SeqCst) {
            return Err(CaptureError::Container("encoder failed".into()));
        }
        self.factory.log.lock().finished.push(self.path.clone());
        Ok(self.path)
    }
}

struct FakeTrack {
    kind: MediaKind,
    factory: FakeContainerFactory,
}

impl TrackInput for FakeTrack {
    fn is_ready_for_more_data(&self) -> bool {
        self.factory.ready.load(Ordering::SeqCst)
    }

    fn append(&mut self, buffer: SampleBuffer) -> bool {
        let mut log = self.factory.log.lock();
        match self.kind {
            MediaKind::Video => log.video.push(buffer.presentation_time),
            MediaKind::Audio => log.audio.push(buffer.presentation_time),
        }
        true
    }

    fn mark_as_finished(&mut self) {
        self.factory.log.lock().finished_tracks.push(self.kind);
    }
}

// ---- Delegate ----

#[derive(Debug, Clone, PartialEq)]
pub enum DelegateCall {
    Started(PathBuf),
    Finished(PathBuf, Option<String>),
}

#[derive(Default)]
pub struct RecordingLog {
    pub calls: Mutex<Vec<DelegateCall>>,
}

impl RecordingDelegate for RecordingLog {
    fn on_recording_started(&self, output_path: &Path, _connections: &[ConnectionInfo]) {
        self.calls
            .lock()
            .push(DelegateCall::Started(output_path.to_path_buf()));
    }

    fn on_recording_finished(
        &self,
        output_path: &Path,
        _connections: &[ConnectionInfo],
        error: Option<CaptureError>,
    ) {
        self.calls.lock().push(DelegateCall::Finished(
            output_path.to_path_buf(),
            error.map(|e| e.to_string()),
        ));
    }
}
