//! Real-time muxing writer
//!
//! Interleaves two independent sample streams (audio and video) into one
//! container file. Samples arrive on capture threads; start and stop are
//! driven from the session queue; finalization runs on the writer's own
//! queue and every delegate notification goes through the callback queue.
//!
//! Each track throttles itself: a sample is appended only if its input
//! reports it is ready, otherwise it is dropped. Nothing is buffered.

use super::container::{
    ContainerWriter, ContainerWriterFactory, MediaTime, SampleBuffer, SampleSink, TrackInput,
};
use super::delegate::RecordingDelegate;
use super::settings::{ContainerType, RecordingSettings};
use super::state::{RecordingSession, RecordingStats, WriterState};
use crate::capture::session::ConnectionInfo;
use crate::capture::traits::MediaKind;
use crate::utils::error::CaptureError;
use crate::utils::queue::SerialQueue;
use parking_lot::{Mutex, RwLock};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

/// What happened to a submitted sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Appended,
    Dropped(DropReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Not recording, or the recording is stopping
    NotWriting,
    /// The platform has not filled the buffer yet
    DataNotReady,
    /// The container refused this track when the recording started
    NoTrackInput,
    /// The track input asked for backpressure
    TrackNotReady,
    /// Earlier than the first video sample
    BeforeSessionStart,
    /// The encoder rejected the sample
    Rejected,
}

struct ActiveRecording {
    writer: Box<dyn ContainerWriter>,
    video_input: Option<Box<dyn TrackInput>>,
    audio_input: Option<Box<dyn TrackInput>>,
    connections: Vec<ConnectionInfo>,
    session: RecordingSession,
}

/// Writes audio and video samples into a single container file
pub struct MuxingWriter {
    factory: Arc<dyn ContainerWriterFactory>,
    callback_queue: Arc<SerialQueue>,
    finalize_queue: SerialQueue,
    delegate: Weak<dyn RecordingDelegate>,
    settings: RwLock<RecordingSettings>,

    /// Read lock-free by the sample callbacks
    is_recording: AtomicBool,
    is_stopping: AtomicBool,

    state: RwLock<WriterState>,
    active: Mutex<Option<ActiveRecording>>,
}

impl MuxingWriter {
    /// Create an idle writer that reports to `delegate` on `callback_queue`
    pub fn new(
        factory: Arc<dyn ContainerWriterFactory>,
        callback_queue: Arc<SerialQueue>,
        delegate: Weak<dyn RecordingDelegate>,
    ) -> std::io::Result<Self> {
        Ok(Self {
            factory,
            callback_queue,
            finalize_queue: SerialQueue::new("capture.writer.finalize")?,
            delegate,
            settings: RwLock::new(RecordingSettings::default()),
            is_recording: AtomicBool::new(false),
            is_stopping: AtomicBool::new(false),
            state: RwLock::new(WriterState::Idle),
            active: Mutex::new(None),
        })
    }

    pub fn state(&self) -> WriterState {
        *self.state.read()
    }

    pub fn is_recording(&self) -> bool {
        self.is_recording.load(Ordering::SeqCst)
    }

    pub fn is_stopping(&self) -> bool {
        self.is_stopping.load(Ordering::SeqCst)
    }

    /// Settings used by the next recording
    pub fn configure_output(&self, settings: &RecordingSettings) {
        *self.settings.write() = settings.clone();
        tracing::debug!(
            "Writer configured: video {:?} {}x{}, audio {:?}",
            settings.video.codec,
            settings.video.width,
            settings.video.height,
            settings.audio.format
        );
    }

    pub fn settings(&self) -> RecordingSettings {
        self.settings.read().clone()
    }

    /// Container the next recording will be written as
    pub fn container_type(&self) -> Option<ContainerType> {
        self.settings.read().container_type()
    }

    /// Progress of the current recording
    pub fn stats(&self) -> Option<RecordingStats> {
        self.active
            .lock()
            .as_ref()
            .map(|active| RecordingStats::from(&active.session))
    }

    fn set_state(&self, state: WriterState) {
        let mut current = self.state.write();
        if *current != state {
            tracing::debug!("Writer state {:?} -> {:?}", *current, state);
            *current = state;
        }
    }

    /// Start writing a new container at `output_path`.
    ///
    /// Returns false, without side effects on the running recording, if one
    /// is already in progress or the container cannot be opened.
    pub fn start_recording(
        self: &Arc<Self>,
        output_path: &Path,
        connections: Vec<ConnectionInfo>,
    ) -> bool {
        if !self.state().can_start() {
            tracing::warn!("Writer is already recording; start ignored");
            return false;
        }

        self.set_state(WriterState::Starting);
        let settings = self.settings();

        let Some(container) = settings.container_type() else {
            tracing::error!(
                "No container type for video codec {:?}; set one in the recording settings",
                settings.video.codec
            );
            self.set_state(WriterState::Error);
            return false;
        };

        let mut writer = match self.factory.create(output_path, container) {
            Ok(writer) => writer,
            Err(e) => {
                tracing::error!("Cannot create container writer: {}", e);
                self.set_state(WriterState::Error);
                return false;
            }
        };

        let video_input = writer.add_track(MediaKind::Video, &settings.video.output_settings());
        if video_input.is_none() {
            tracing::error!("Cannot add video track input");
        }

        let audio_input = writer.add_track(MediaKind::Audio, &settings.audio.output_settings());
        if audio_input.is_none() {
            tracing::warn!("Cannot add audio track input; recording video only");
        }

        if let Err(e) = writer.start_writing() {
            tracing::error!("Cannot start writing: {}", e);
            self.set_state(WriterState::Error);
            return false;
        }

        *self.active.lock() = Some(ActiveRecording {
            writer,
            video_input,
            audio_input,
            connections: connections.clone(),
            session: RecordingSession::new(output_path.to_path_buf()),
        });
        self.is_stopping.store(false, Ordering::SeqCst);
        self.is_recording.store(true, Ordering::SeqCst);
        self.set_state(WriterState::Writing);

        tracing::info!(
            "Recording started: {:?} ({})",
            output_path,
            container.extension()
        );

        let delegate = self.delegate.clone();
        let path = output_path.to_path_buf();
        self.callback_queue.dispatch(move || {
            if let Some(delegate) = delegate.upgrade() {
                delegate.on_recording_started(&path, &connections);
            }
        });

        true
    }

    /// Push one sample from a capture thread
    pub fn submit(&self, buffer: SampleBuffer) -> SubmitOutcome {
        if !self.is_recording() || self.is_stopping() {
            return SubmitOutcome::Dropped(DropReason::NotWriting);
        }
        if !buffer.is_data_ready {
            return SubmitOutcome::Dropped(DropReason::DataNotReady);
        }

        let mut guard = self.active.lock();
        let Some(active) = guard.as_mut() else {
            return SubmitOutcome::Dropped(DropReason::NotWriting);
        };
        if active.session.is_stopping {
            return SubmitOutcome::Dropped(DropReason::NotWriting);
        }

        let outcome = match buffer.kind {
            MediaKind::Video => append_video(active, buffer),
            MediaKind::Audio => append_audio(active, buffer),
        };

        if let SubmitOutcome::Dropped(_) = outcome {
            active.session.dropped_samples += 1;
        }
        outcome
    }

    /// Finish the current recording.
    ///
    /// Returns false if nothing is recording or a stop is already under way.
    /// Otherwise the container is finalized asynchronously and the delegate
    /// is told once it is closed.
    pub fn stop_recording(self: &Arc<Self>) -> bool {
        if !self.is_recording() {
            return false;
        }
        if self.is_stopping.swap(true, Ordering::SeqCst) {
            return false;
        }

        self.set_state(WriterState::Stopping);

        let Some(mut active) = self.active.lock().take() else {
            self.is_stopping.store(false, Ordering::SeqCst);
            self.is_recording.store(false, Ordering::SeqCst);
            self.set_state(WriterState::Idle);
            return false;
        };

        active.session.is_stopping = true;
        if let Some(mut input) = active.audio_input.take() {
            input.mark_as_finished();
        }
        if let Some(mut input) = active.video_input.take() {
            input.mark_as_finished();
        }
        if let Some(end) = active.session.last_video_timestamp {
            active.writer.end_session(end);
        }

        self.set_state(WriterState::Finalizing);

        let this = Arc::clone(self);
        self.finalize_queue.dispatch(move || this.finalize(active));
        true
    }

    fn finalize(&self, active: ActiveRecording) {
        let ActiveRecording {
            writer,
            connections,
            session,
            ..
        } = active;

        let (path, error) = match writer.finish_writing() {
            Ok(path) => (path, None),
            Err(e) => {
                tracing::error!("Failed to finalize {:?}: {}", session.output_path, e);
                let error = CaptureError::Finalize {
                    path: session.output_path.clone(),
                    message: e.to_string(),
                };
                (session.output_path.clone(), Some(error))
            }
        };

        tracing::info!(
            "Recording finalized: {:?}, {:.2}s, {} video / {} audio samples, {} dropped",
            path,
            session.duration_secs(),
            session.video_samples,
            session.audio_samples,
            session.dropped_samples
        );

        self.is_stopping.store(false, Ordering::SeqCst);
        self.is_recording.store(false, Ordering::SeqCst);
        self.set_state(if error.is_some() {
            WriterState::Error
        } else {
            WriterState::Idle
        });

        let delegate = self.delegate.clone();
        self.callback_queue.dispatch(move || {
            if let Some(delegate) = delegate.upgrade() {
                delegate.on_recording_finished(&path, &connections, error);
            }
        });
    }
}

impl SampleSink for MuxingWriter {
    fn did_output(&self, buffer: SampleBuffer) {
        let kind = buffer.kind;
        if let SubmitOutcome::Dropped(reason) = self.submit(buffer) {
            tracing::trace!("Dropped {} sample: {:?}", kind, reason);
        }
    }
}

fn append_video(active: &mut ActiveRecording, buffer: SampleBuffer) -> SubmitOutcome {
    let ActiveRecording {
        writer,
        video_input,
        session,
        ..
    } = active;

    let Some(input) = video_input.as_mut() else {
        return SubmitOutcome::Dropped(DropReason::NoTrackInput);
    };
    if !input.is_ready_for_more_data() {
        return SubmitOutcome::Dropped(DropReason::TrackNotReady);
    }

    let time = buffer.presentation_time;
    match session.start_session_timestamp {
        Some(start) if time < start => {
            return SubmitOutcome::Dropped(DropReason::BeforeSessionStart);
        }
        Some(_) => {}
        None => {
            session.start_session_timestamp = Some(time);
            writer.start_session(time);
            tracing::debug!("Writer session opened at {:.3}s", time.as_secs_f64());
        }
    }

    if !input.append(buffer) {
        return SubmitOutcome::Dropped(DropReason::Rejected);
    }
    session.last_video_timestamp = Some(latest(session.last_video_timestamp, time));
    session.video_samples += 1;
    SubmitOutcome::Appended
}

fn append_audio(active: &mut ActiveRecording, buffer: SampleBuffer) -> SubmitOutcome {
    let ActiveRecording {
        audio_input,
        session,
        ..
    } = active;

    // Audio waits for the first video frame so it never leads the picture
    match session.start_session_timestamp {
        Some(start) if buffer.presentation_time >= start => {}
        _ => return SubmitOutcome::Dropped(DropReason::BeforeSessionStart),
    }

    let Some(input) = audio_input.as_mut() else {
        return SubmitOutcome::Dropped(DropReason::NoTrackInput);
    };
    if !input.is_ready_for_more_data() {
        return SubmitOutcome::Dropped(DropReason::TrackNotReady);
    }
    if !input.append(buffer) {
        return SubmitOutcome::Dropped(DropReason::Rejected);
    }
    session.audio_samples += 1;
    SubmitOutcome::Appended
}

fn latest(previous: Option<MediaTime>, time: MediaTime) -> MediaTime {
    previous.map_or(time, |previous| previous.max(time))
}
