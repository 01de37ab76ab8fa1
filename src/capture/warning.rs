//! Degraded-configuration warnings
//!
//! Attach failures never abort the session; they are reported here and the
//! graph carries on with whatever it managed to attach.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConfigurationWarning {
    AudioDeviceNotFound,
    CameraDeviceNotSet,
    CannotAddAudioInput,
    CannotAddAudioDataOutput,
    CannotAddPhotoOutput,
    CannotAddVideoFileOutput,
    CannotAddVideoInput,
    CannotSetSessionPreset,
}

impl fmt::Display for ConfigurationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            ConfigurationWarning::AudioDeviceNotFound => "Audio device not found",
            ConfigurationWarning::CameraDeviceNotSet => "Camera device not found",
            ConfigurationWarning::CannotAddAudioInput => "Cannot add audio input",
            ConfigurationWarning::CannotAddAudioDataOutput => "Cannot add audio data output",
            ConfigurationWarning::CannotAddPhotoOutput => "Cannot add photo output",
            ConfigurationWarning::CannotAddVideoFileOutput => "Cannot add video file output",
            ConfigurationWarning::CannotAddVideoInput => "Cannot add video input",
            ConfigurationWarning::CannotSetSessionPreset => "Cannot set requested session preset",
        };
        f.write_str(message)
    }
}

/// Receives every configuration warning after it has been logged
pub type WarningHandler = Arc<dyn Fn(ConfigurationWarning) + Send + Sync>;

/// Log a warning and forward it to the handler
pub fn report(warning: ConfigurationWarning, handler: &WarningHandler) {
    tracing::warn!(?warning, "{}", warning);
    handler(warning);
}
