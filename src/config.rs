//! Orchestrator configuration

use crate::capture::catalog::DiscoveryPolicy;
use crate::capture::session::SessionPreset;
use crate::capture::traits::DevicePosition;
use crate::recorder::settings::RecordingSettings;
use crate::utils::error::CaptureResult;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for a `CaptureOrchestrator`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CameraConfig {
    /// Device position selected when the camera opens
    pub position: DevicePosition,

    /// Requested session preset; falls back to `High` if rejected
    pub preset: SessionPreset,

    /// How devices are listed for switching
    pub discovery: DiscoveryPolicy,

    /// Directory for new recordings (system temp directory if unset)
    pub output_dir: Option<PathBuf>,

    /// Initial recording settings; `None` records through the platform movie output
    pub recording: Option<RecordingSettings>,

    /// Buffered events per subscriber
    pub event_capacity: usize,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: DevicePosition::Back,
            preset: SessionPreset::High,
            discovery: DiscoveryPolicy::All,
            output_dir: None,
            recording: None,
            event_capacity: 64,
        }
    }
}

impl CameraConfig {
    pub fn from_json_str(json: &str) -> CaptureResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read configuration from a JSON file
    pub fn load(path: &Path) -> CaptureResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&content)?;
        tracing::debug!("Loaded camera config from {:?}", path);
        Ok(config)
    }

    /// Directory new recordings are written to
    pub fn recording_dir(&self) -> PathBuf {
        self.output_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}
