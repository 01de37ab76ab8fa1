//! Camera events and the recording observer

use super::pending::PendingRequest;
use crate::capture::session::ConnectionInfo;
use crate::capture::traits::DeviceDescriptor;
use crate::capture::warning::ConfigurationWarning;
use crate::recorder::delegate::RecordingDelegate;
use crate::utils::error::CaptureError;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Events broadcast to subscribers
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CameraEvent {
    #[serde(rename_all = "camelCase")]
    RecordingStarted { output_path: PathBuf },
    #[serde(rename_all = "camelCase")]
    RecordingFinished {
        output_path: PathBuf,
        error: Option<String>,
    },
    CaptureDeviceChanged { device: DeviceDescriptor },
    DevicesChanged { devices: Vec<DeviceDescriptor> },
    Warning { warning: ConfigurationWarning },
}

/// Tracks recording state from recorder notifications and completes the
/// pending stop request.
pub struct RecordingObserver {
    is_recording: AtomicBool,
    stop_request: Arc<PendingRequest<PathBuf>>,
    event_tx: broadcast::Sender<CameraEvent>,
}

impl RecordingObserver {
    pub fn new(
        stop_request: Arc<PendingRequest<PathBuf>>,
        event_tx: broadcast::Sender<CameraEvent>,
    ) -> Self {
        Self {
            is_recording: AtomicBool::new(false),
            stop_request,
            event_tx,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.is_recording.load(Ordering::SeqCst)
    }
}

impl RecordingDelegate for RecordingObserver {
    fn on_recording_started(&self, output_path: &Path, connections: &[ConnectionInfo]) {
        self.is_recording.store(true, Ordering::SeqCst);
        tracing::info!(
            "Recording to {:?} over {} connection(s)",
            output_path,
            connections.len()
        );
        let _ = self.event_tx.send(CameraEvent::RecordingStarted {
            output_path: output_path.to_path_buf(),
        });
    }

    fn on_recording_finished(
        &self,
        output_path: &Path,
        _connections: &[ConnectionInfo],
        error: Option<CaptureError>,
    ) {
        self.is_recording.store(false, Ordering::SeqCst);

        let result = match error {
            None => {
                tracing::info!("Recording finished: {:?}", output_path);
                Ok(output_path.to_path_buf())
            }
            Some(e) => {
                tracing::error!("Recording finished with error: {}", e);
                Err(match e {
                    e @ CaptureError::Finalize { .. } => e,
                    other => CaptureError::Finalize {
                        path: output_path.to_path_buf(),
                        message: other.to_string(),
                    },
                })
            }
        };

        let _ = self.event_tx.send(CameraEvent::RecordingFinished {
            output_path: output_path.to_path_buf(),
            error: result.as_ref().err().map(ToString::to_string),
        });
        self.stop_request.resolve(result);
    }
}
