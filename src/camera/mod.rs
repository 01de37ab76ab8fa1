//! Capture orchestration
//!
//! `CaptureOrchestrator` is the public face of the crate. It owns the session
//! graph, the muxing writer and the queues they run on:
//!
//! - graph mutations run on the `capture.session` queue, in submission order
//! - recorder notifications arrive on the `capture.callbacks` queue
//! - photo and stop-recording requests resolve through single-slot tickets

pub mod events;
pub mod pending;

pub use events::{CameraEvent, RecordingObserver};
pub use pending::{PendingRequest, PendingTicket};

use crate::capture::catalog::DeviceCatalog;
use crate::capture::graph::{GraphState, SessionGraph, VideoOutput};
use crate::capture::photo::Photo;
use crate::capture::session::CaptureBackend;
use crate::capture::traits::{
    AuthorizationStatus, DeviceDescriptor, DeviceOrientation, DevicePosition, DeviceProvider,
    OrientationSignal,
};
use crate::capture::warning::WarningHandler;
use crate::config::CameraConfig;
use crate::recorder::container::ContainerWriterFactory;
use crate::recorder::delegate::RecordingDelegate;
use crate::recorder::settings::RecordingSettings;
use crate::recorder::state::{RecordingStats, WriterState};
use crate::recorder::writer::MuxingWriter;
use crate::utils::error::{CaptureError, CaptureResult, RequestKind};
use crate::utils::queue::SerialQueue;
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Caller-visible camera state
#[derive(Debug, Clone, Default)]
struct CameraState {
    capture_device: Option<DeviceDescriptor>,
    device_position: DevicePosition,
    devices: Vec<DeviceDescriptor>,
    recording_settings: Option<RecordingSettings>,
    is_preview_paused: bool,
    orientation: OrientationSignal,
}

struct Inner {
    config: CameraConfig,
    catalog: DeviceCatalog,
    session_queue: SerialQueue,
    callback_queue: Arc<SerialQueue>,
    graph: Mutex<SessionGraph>,
    writer: Arc<MuxingWriter>,
    observer: Arc<RecordingObserver>,
    delegate: Weak<dyn RecordingDelegate>,
    photo_request: Arc<PendingRequest<Photo>>,
    stop_request: Arc<PendingRequest<PathBuf>>,
    state: RwLock<CameraState>,
    event_tx: broadcast::Sender<CameraEvent>,
    is_open: AtomicBool,
}

/// Drives a capture session: device selection, preview lifecycle, photo
/// capture and recording.
pub struct CaptureOrchestrator {
    inner: Arc<Inner>,
}

impl CaptureOrchestrator {
    pub fn new(
        config: CameraConfig,
        provider: Arc<dyn DeviceProvider>,
        backend: Box<dyn CaptureBackend>,
        writers: Arc<dyn ContainerWriterFactory>,
    ) -> CaptureResult<Self> {
        let (event_tx, _) = broadcast::channel(config.event_capacity.max(1));

        let callback_queue = Arc::new(SerialQueue::new("capture.callbacks")?);
        let session_queue = SerialQueue::new("capture.session")?;

        let stop_request = Arc::new(PendingRequest::new(RequestKind::StopRecording));
        let photo_request = Arc::new(PendingRequest::new(RequestKind::PhotoCapture));

        let observer = Arc::new(RecordingObserver::new(
            stop_request.clone(),
            event_tx.clone(),
        ));
        let delegate_target: Arc<dyn RecordingDelegate> = observer.clone();
        let delegate = Arc::downgrade(&delegate_target);

        let writer = Arc::new(MuxingWriter::new(
            writers,
            callback_queue.clone(),
            delegate.clone(),
        )?);

        let warning_tx = event_tx.clone();
        let warnings: WarningHandler = Arc::new(move |warning| {
            let _ = warning_tx.send(CameraEvent::Warning { warning });
        });

        let catalog = DeviceCatalog::new(provider, config.discovery);
        let state = CameraState {
            device_position: config.position,
            devices: catalog.list_devices(),
            recording_settings: config.recording.clone(),
            ..CameraState::default()
        };

        tracing::debug!(
            "Camera created: {} device(s), position {}",
            state.devices.len(),
            state.device_position
        );

        Ok(Self {
            inner: Arc::new(Inner {
                config,
                catalog,
                session_queue,
                callback_queue,
                graph: Mutex::new(SessionGraph::new(backend, warnings)),
                writer,
                observer,
                delegate,
                photo_request,
                stop_request,
                state: RwLock::new(state),
                event_tx,
                is_open: AtomicBool::new(false),
            }),
        })
    }

    /// Subscribe to camera events
    pub fn subscribe(&self) -> broadcast::Receiver<CameraEvent> {
        self.inner.event_tx.subscribe()
    }

    pub fn config(&self) -> &CameraConfig {
        &self.inner.config
    }

    // ---- Lifecycle ----

    /// Begin observing orientation and select the device for the current
    /// position. Does not start the session.
    pub fn open(&self) {
        if self.inner.is_open.swap(true, Ordering::SeqCst) {
            return;
        }
        let position = self.inner.state.read().device_position;
        tracing::info!("Camera opened ({})", position);
        self.inner.enqueue_device_for_position(position);
    }

    /// Stop the session and stop observing orientation
    pub fn close(&self) {
        if !self.inner.is_open.swap(false, Ordering::SeqCst) {
            return;
        }
        self.stop();
        tracing::info!("Camera closed");
    }

    pub fn is_open(&self) -> bool {
        self.inner.is_open.load(Ordering::SeqCst)
    }

    /// Check authorization, open the camera if needed, configure the session
    /// on first use and start it.
    ///
    /// While authorization is being requested the session queue is held, so
    /// no graph work runs without access.
    pub async fn start(&self) -> CaptureResult<()> {
        if !self.inner.check_authorization().await {
            tracing::error!("Camera access was not authorized");
            return Err(CaptureError::NotAuthorized);
        }
        self.open();

        let inner = self.inner.clone();
        self.inner.session_queue.dispatch(move || {
            let configured = inner.graph.lock().is_configured();
            if !configured && !inner.configure_session() {
                return;
            }
            inner.graph.lock().start();
        });
        Ok(())
    }

    pub fn stop(&self) {
        let inner = self.inner.clone();
        self.inner.session_queue.dispatch(move || {
            let mut graph = inner.graph.lock();
            if graph.is_configured() {
                graph.stop();
            }
        });
    }

    /// Mark the preview paused; the session keeps running
    pub fn pause(&self) {
        self.inner.state.write().is_preview_paused = true;
        tracing::debug!("Preview paused");
    }

    pub async fn resume(&self) -> CaptureResult<()> {
        self.inner.state.write().is_preview_paused = false;
        tracing::debug!("Preview resumed");
        self.start().await
    }

    /// Wait until queued session work and recorder callbacks have run
    pub async fn flush(&self) {
        self.inner.session_queue.barrier().await;
        self.inner.callback_queue.barrier().await;
    }

    // ---- Photo ----

    /// Capture a single photo.
    ///
    /// Fails immediately with `NoPhotoOutputConfigured` when there is no
    /// photo output, and with `Busy` while another capture is pending.
    pub async fn take_picture(&self) -> CaptureResult<Photo> {
        let has_photo_output = self.inner.graph.lock().photo_output().is_some();
        if !has_photo_output {
            return Err(CaptureError::NoPhotoOutputConfigured);
        }

        let ticket = self.inner.photo_request.register()?;

        let inner = self.inner.clone();
        let dispatched = self.inner.session_queue.dispatch(move || {
            let request = inner.photo_request.clone();
            inner.graph.lock().capture_photo(Box::new(move |result| {
                if let Err(e) = &result {
                    tracing::error!("Photo capture failed: {}", e);
                }
                request.resolve(result);
            }));
        });
        if !dispatched {
            return Err(CaptureError::Platform("capture session queue closed".into()));
        }

        ticket.wait().await
    }

    // ---- Recording ----

    /// Start recording to a new file.
    ///
    /// Completion is reported through `RecordingStarted`; a recording that
    /// cannot start is logged and leaves `is_recording` false.
    pub fn start_recording(&self) {
        if self.is_recording() {
            tracing::debug!("Already recording; start ignored");
            return;
        }
        let inner = self.inner.clone();
        self.inner.session_queue.dispatch(move || inner.start_recording());
    }

    /// Stop recording and wait for the finished file
    pub async fn stop_recording(&self) -> CaptureResult<PathBuf> {
        let has_video_output = self.inner.graph.lock().video_output().is_some();
        if !has_video_output {
            return Err(CaptureError::NoVideoOutputConfigured);
        }

        let ticket = self.inner.stop_request.register()?;

        let inner = self.inner.clone();
        let dispatched = self.inner.session_queue.dispatch(move || {
            let output = inner.graph.lock().video_output();
            let stopping = match output {
                Some(VideoOutput::Writer { .. }) => inner.writer.stop_recording(),
                Some(VideoOutput::Movie(_)) => inner.graph.lock().stop_movie_recording(),
                None => false,
            };
            if !stopping {
                tracing::warn!("Stop requested while not recording");
                inner.stop_request.resolve(Err(CaptureError::NotRecording));
            }
        });
        if !dispatched {
            return Err(CaptureError::Platform("capture session queue closed".into()));
        }

        ticket.wait().await
    }

    // ---- Devices ----

    /// Cycle to the next device in discovery order
    pub fn switch_capture_device(&self) {
        let current = self.inner.state.read().capture_device.clone();
        match self.inner.catalog.next_device(current.as_ref()) {
            Some(next) => {
                self.inner.set_capture_device(next);
            }
            None => tracing::warn!("No capture device to switch to"),
        }
    }

    /// Use `device` for video; no-op if it is already current
    pub fn set_capture_device(&self, device: DeviceDescriptor) {
        self.inner.set_capture_device(device);
    }

    /// Use the device with `identity`
    pub fn set_device_id(&self, identity: &str) -> CaptureResult<()> {
        let device = self
            .inner
            .state
            .read()
            .devices
            .iter()
            .find(|device| device.identity == identity)
            .cloned()
            .or_else(|| self.inner.catalog.find(identity))
            .ok_or_else(|| CaptureError::DeviceNotFound(identity.to_string()))?;
        self.inner.set_capture_device(device);
        Ok(())
    }

    /// Select the device for `position`; no-op if unchanged
    pub fn set_device_position(&self, position: DevicePosition) {
        {
            let mut state = self.inner.state.write();
            if state.device_position == position {
                return;
            }
            state.device_position = position;
        }
        tracing::debug!("Device position set to {}", position);
        self.inner.enqueue_device_for_position(position);
    }

    /// Re-enumerate devices after a connect or disconnect
    pub fn devices_changed(&self) {
        let devices = self.inner.catalog.list_devices();
        let (position, lost_current) = {
            let mut state = self.inner.state.write();
            if state.devices == devices {
                return;
            }
            state.devices = devices.clone();
            let lost_current = state
                .capture_device
                .as_ref()
                .is_some_and(|current| !devices.iter().any(|d| d.identity == current.identity));
            (state.device_position, lost_current)
        };

        tracing::info!("Device list changed: {} available", devices.len());
        let _ = self.inner.event_tx.send(CameraEvent::DevicesChanged { devices });

        if lost_current {
            tracing::warn!("Current capture device disconnected");
            let inner = self.inner.clone();
            self.inner.session_queue.dispatch(move || inner.replace_lost_device(position));
        }
    }

    // ---- Settings and orientation ----

    /// Switch between writer and movie recording, or reconfigure the writer.
    ///
    /// Applied immediately when the session is configured, otherwise at
    /// configuration. No-op when the settings are unchanged.
    pub fn update_recording_settings(&self, settings: Option<RecordingSettings>) {
        {
            let mut state = self.inner.state.write();
            if state.recording_settings == settings {
                return;
            }
            state.recording_settings = settings.clone();
        }
        tracing::debug!("Recording settings changed (writer: {})", settings.is_some());

        let inner = self.inner.clone();
        self.inner.session_queue.dispatch(move || {
            let mut graph = inner.graph.lock();
            if graph.is_configured() {
                graph.update_video_output(settings.as_ref(), &inner.writer);
            }
        });
    }

    pub fn orientation_changed(&self, orientation: DeviceOrientation) {
        self.inner.update_orientation(|signal| signal.device = orientation);
    }

    pub fn screen_orientation_changed(&self, orientation: DeviceOrientation) {
        self.inner.update_orientation(|signal| signal.screen = orientation);
    }

    // ---- Queries ----

    pub fn is_recording(&self) -> bool {
        self.inner.observer.is_recording()
    }

    pub fn is_preview_paused(&self) -> bool {
        self.inner.state.read().is_preview_paused
    }

    pub fn devices(&self) -> Vec<DeviceDescriptor> {
        self.inner.state.read().devices.clone()
    }

    pub fn capture_device(&self) -> Option<DeviceDescriptor> {
        self.inner.state.read().capture_device.clone()
    }

    pub fn device_position(&self) -> DevicePosition {
        self.inner.state.read().device_position
    }

    pub fn recording_settings(&self) -> Option<RecordingSettings> {
        self.inner.state.read().recording_settings.clone()
    }

    pub fn is_video_mirrored(&self) -> bool {
        self.inner.graph.lock().is_video_mirrored()
    }

    pub fn is_configured(&self) -> bool {
        self.inner.graph.lock().is_configured()
    }

    pub fn is_running(&self) -> bool {
        self.inner.graph.lock().is_running()
    }

    pub fn graph_state(&self) -> GraphState {
        self.inner.graph.lock().state()
    }

    pub fn writer_state(&self) -> WriterState {
        self.inner.writer.state()
    }

    pub fn recording_stats(&self) -> Option<RecordingStats> {
        self.inner.writer.stats()
    }
}

impl Drop for CaptureOrchestrator {
    fn drop(&mut self) {
        self.close();
    }
}

impl Inner {
    async fn check_authorization(&self) -> bool {
        let provider = self.catalog.provider();
        match provider.authorization_status() {
            AuthorizationStatus::Authorized => true,
            AuthorizationStatus::NotDetermined => {
                tracing::debug!("Camera access not determined; requesting");
                let _hold = self.session_queue.suspend();
                provider.request_authorization().await
            }
            AuthorizationStatus::Denied => {
                tracing::debug!("Camera access denied");
                false
            }
            AuthorizationStatus::Restricted => {
                tracing::debug!("Camera access restricted");
                false
            }
        }
    }

    /// Runs on the session queue
    fn configure_session(&self) -> bool {
        let (device, settings, orientation) = {
            let mut state = self.state.write();
            if state.capture_device.is_none() {
                state.capture_device = self.catalog.device_for_position(state.device_position);
            }
            (
                state.capture_device.clone(),
                state.recording_settings.clone(),
                state.orientation,
            )
        };
        let audio_device = self.catalog.default_audio_device();

        let mut graph = self.graph.lock();
        graph.set_orientation(orientation);
        graph.configure(
            device.as_ref(),
            audio_device.as_ref(),
            self.config.preset,
            settings.as_ref(),
            &self.writer,
        )
    }

    fn enqueue_device_for_position(self: &Arc<Self>, position: DevicePosition) {
        let inner = self.clone();
        self.session_queue.dispatch(move || {
            match inner.catalog.device_for_position(position) {
                Some(device) => inner.set_capture_device_on_queue(device),
                None => tracing::warn!("Couldn't find a capture device for {}", position),
            }
        });
    }

    /// Runs on the session queue after the current device disappeared
    fn replace_lost_device(&self, position: DevicePosition) {
        let replacement = self
            .catalog
            .device_for_position(position)
            .or_else(|| self.catalog.provider().default_video_device());
        match replacement {
            Some(device) => self.set_capture_device_on_queue(device),
            None => tracing::warn!("No capture device left to fall back to"),
        }
    }

    /// Record the new device and queue the input swap; false if unchanged
    fn set_capture_device(self: &Arc<Self>, device: DeviceDescriptor) -> bool {
        if !self.record_capture_device(&device) {
            return false;
        }
        let inner = self.clone();
        self.session_queue
            .dispatch(move || inner.apply_video_input(&device));
        true
    }

    /// Same as `set_capture_device`, for callers already on the session queue
    fn set_capture_device_on_queue(&self, device: DeviceDescriptor) {
        if self.record_capture_device(&device) {
            self.apply_video_input(&device);
        }
    }

    fn record_capture_device(&self, device: &DeviceDescriptor) -> bool {
        {
            let mut state = self.state.write();
            if state.capture_device.as_ref() == Some(device) {
                return false;
            }
            state.capture_device = Some(device.clone());
        }
        tracing::debug!("Using capture device: {}", device.display_name);
        let _ = self.event_tx.send(CameraEvent::CaptureDeviceChanged {
            device: device.clone(),
        });
        true
    }

    /// Runs on the session queue
    fn apply_video_input(&self, device: &DeviceDescriptor) {
        let mut graph = self.graph.lock();
        if graph.is_configured() && graph.active_device() != Some(device) {
            graph.swap_video_input(device);
        }
    }

    fn update_orientation(self: &Arc<Self>, apply: impl FnOnce(&mut OrientationSignal)) {
        let signal = {
            let mut state = self.state.write();
            let mut signal = state.orientation;
            apply(&mut signal);
            if signal == state.orientation {
                return;
            }
            state.orientation = signal;
            signal
        };

        if !self.is_open.load(Ordering::SeqCst) {
            return;
        }
        let inner = self.clone();
        self.session_queue.dispatch(move || {
            inner.graph.lock().set_orientation(signal);
        });
    }

    /// Runs on the session queue
    fn start_recording(&self) {
        let mut graph = self.graph.lock();
        let output = graph.video_output();
        match output {
            Some(VideoOutput::Writer { .. }) => {
                let Some(container) = self.writer.container_type() else {
                    tracing::error!(
                        "No container type for video codec {:?}; recording not started",
                        self.writer.settings().video.codec
                    );
                    return;
                };
                let path = self.output_path(container.extension());
                let connections = graph.writer_connections();
                drop(graph);
                if !self.writer.start_recording(&path, connections) {
                    tracing::error!("Writer could not start recording to {:?}", path);
                }
            }
            Some(VideoOutput::Movie(_)) => {
                let path = self.output_path("mov");
                if let Err(e) = graph.start_movie_recording(&path, self.delegate.clone()) {
                    tracing::error!("Movie recording could not start: {}", e);
                }
            }
            None => tracing::warn!("No video output configured; start recording ignored"),
        }
    }

    fn output_path(&self, extension: &str) -> PathBuf {
        let dir = self.config.recording_dir();
        if let Err(e) = std::fs::create_dir_all(&dir) {
            tracing::warn!("Cannot create recording directory {:?}: {}", dir, e);
        }
        let id = Uuid::new_v4().simple().to_string();
        dir.join(format!(
            "recording-{}-{}.{}",
            Utc::now().format("%Y%m%d-%H%M%S%3f"),
            &id[..8],
            extension
        ))
    }
}
