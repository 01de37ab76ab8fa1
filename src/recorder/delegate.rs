//! Recording notifications

use crate::capture::session::ConnectionInfo;
use crate::utils::error::CaptureError;
use std::path::Path;

/// Receives the start and finish of every recording.
///
/// Recorders hold their delegate weakly and deliver both calls on a single
/// callback context, start before finish.
pub trait RecordingDelegate: Send + Sync {
    fn on_recording_started(&self, output_path: &Path, connections: &[ConnectionInfo]);

    /// `error` is set when finalizing failed; the file may still be usable
    fn on_recording_finished(
        &self,
        output_path: &Path,
        connections: &[ConnectionInfo],
        error: Option<CaptureError>,
    );
}
