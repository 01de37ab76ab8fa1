//! Recording state management
//!
//! Defines the writer state machine and the bookkeeping for one recording.

use super::container::MediaTime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Current state of the muxing writer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriterState {
    /// No recording in progress
    Idle,
    /// Creating the container and its track inputs
    Starting,
    /// Accepting samples
    Writing,
    /// Closing track inputs; samples are dropped
    Stopping,
    /// Flushing and closing the container
    Finalizing,
    /// The last recording failed; the writer may start a new one
    Error,
}

impl Default for WriterState {
    fn default() -> Self {
        Self::Idle
    }
}

impl WriterState {
    /// Whether a new recording may be started from this state
    pub fn can_start(&self) -> bool {
        matches!(self, WriterState::Idle | WriterState::Error)
    }
}

/// Bookkeeping for the recording currently being written.
///
/// Created on start, dropped once the container is finalized.
#[derive(Debug, Clone)]
pub struct RecordingSession {
    pub output_path: PathBuf,

    /// Wall-clock time the recording started
    pub started_at: DateTime<Utc>,

    /// Presentation time of the first accepted video sample
    pub start_session_timestamp: Option<MediaTime>,

    /// Presentation time of the latest accepted video sample
    pub last_video_timestamp: Option<MediaTime>,

    pub is_stopping: bool,

    pub video_samples: u64,
    pub audio_samples: u64,
    pub dropped_samples: u64,
}

impl RecordingSession {
    pub fn new(output_path: PathBuf) -> Self {
        Self {
            output_path,
            started_at: Utc::now(),
            start_session_timestamp: None,
            last_video_timestamp: None,
            is_stopping: false,
            video_samples: 0,
            audio_samples: 0,
            dropped_samples: 0,
        }
    }

    /// Media duration between the first and latest video sample, in seconds
    pub fn duration_secs(&self) -> f64 {
        match (self.start_session_timestamp, self.last_video_timestamp) {
            (Some(start), Some(last)) => last.as_secs_f64() - start.as_secs_f64(),
            _ => 0.0,
        }
    }
}

/// Snapshot of a recording, for callers that want progress information
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingStats {
    pub output_path: String,
    pub duration_secs: f64,
    pub video_samples: u64,
    pub audio_samples: u64,
    pub dropped_samples: u64,
}

impl From<&RecordingSession> for RecordingStats {
    fn from(session: &RecordingSession) -> Self {
        Self {
            output_path: session.output_path.to_string_lossy().to_string(),
            duration_secs: session.duration_secs(),
            video_samples: session.video_samples,
            audio_samples: session.audio_samples,
            dropped_samples: session.dropped_samples,
        }
    }
}
