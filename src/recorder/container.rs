//! Container writer surface
//!
//! The encoder and container format live outside this crate. The muxing
//! writer talks to them through these traits and pushes timestamped samples
//! into per-track inputs.

use super::settings::ContainerType;
use crate::capture::traits::MediaKind;
use crate::utils::error::CaptureResult;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::path::{Path, PathBuf};

/// Presentation time expressed as `value / timescale` seconds
#[derive(Debug, Clone, Copy)]
pub struct MediaTime {
    pub value: i64,
    pub timescale: u32,
}

impl MediaTime {
    pub const fn new(value: i64, timescale: u32) -> Self {
        Self { value, timescale }
    }

    pub fn as_secs_f64(&self) -> f64 {
        if self.timescale == 0 {
            return 0.0;
        }
        self.value as f64 / self.timescale as f64
    }
}

impl PartialEq for MediaTime {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for MediaTime {}

impl PartialOrd for MediaTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MediaTime {
    /// Compare across timescales without losing precision
    fn cmp(&self, other: &Self) -> Ordering {
        let lhs = self.value as i128 * other.timescale as i128;
        let rhs = other.value as i128 * self.timescale as i128;
        lhs.cmp(&rhs)
    }
}

/// One timestamped media sample from a capture thread
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    pub kind: MediaKind,
    pub presentation_time: MediaTime,
    pub data: Vec<u8>,
    /// False while the platform is still filling the buffer
    pub is_data_ready: bool,
}

impl SampleBuffer {
    pub fn new(kind: MediaKind, presentation_time: MediaTime, data: Vec<u8>) -> Self {
        Self {
            kind,
            presentation_time,
            data,
            is_data_ready: true,
        }
    }

    pub fn video(presentation_time: MediaTime, data: Vec<u8>) -> Self {
        Self::new(MediaKind::Video, presentation_time, data)
    }

    pub fn audio(presentation_time: MediaTime, data: Vec<u8>) -> Self {
        Self::new(MediaKind::Audio, presentation_time, data)
    }
}

/// Receives samples from a data output on its delivery thread
pub trait SampleSink: Send + Sync {
    fn did_output(&self, buffer: SampleBuffer);
}

/// Encoder input for one track of a container
pub trait TrackInput: Send {
    /// Whether the input can take another sample without blocking
    fn is_ready_for_more_data(&self) -> bool;

    /// Hand a sample to the encoder; false if it was rejected
    fn append(&mut self, buffer: SampleBuffer) -> bool;

    /// No more samples will follow
    fn mark_as_finished(&mut self);
}

/// Writer for one container file
pub trait ContainerWriter: Send {
    fn output_path(&self) -> &Path;

    /// Add a track encoded with `output_settings`; `None` if the container refuses it
    fn add_track(
        &mut self,
        kind: MediaKind,
        output_settings: &Map<String, Value>,
    ) -> Option<Box<dyn TrackInput>>;

    fn start_writing(&mut self) -> CaptureResult<()>;

    /// Open the timing window at the first sample's time
    fn start_session(&mut self, at: MediaTime);

    /// Close the timing window
    fn end_session(&mut self, at: MediaTime);

    /// Flush and close the file; blocks until done
    fn finish_writing(self: Box<Self>) -> CaptureResult<PathBuf>;
}

/// Creates container writers for new recordings
pub trait ContainerWriterFactory: Send + Sync {
    fn create(
        &self,
        output_path: &Path,
        container: ContainerType,
    ) -> CaptureResult<Box<dyn ContainerWriter>>;
}
