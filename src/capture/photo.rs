//! Still photo types

use crate::recorder::settings::VideoCodec;
use serde::{Deserialize, Serialize};

/// Decoded still image handed back from a capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Photo {
    /// Encoded image bytes as produced by the platform
    pub data: Vec<u8>,
    /// Codec the image was encoded with, if known
    pub codec: Option<VideoCodec>,
    pub width: u32,
    pub height: u32,
}

/// Speed/quality trade-off for photo processing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityPrioritization {
    Speed,
    #[default]
    Balanced,
    Quality,
}

/// What a photo output can produce
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhotoCapabilities {
    pub available_codecs: Vec<VideoCodec>,
    /// Pixel formats (four-character codes) usable for the embedded preview
    pub preview_pixel_formats: Vec<u32>,
}

/// Per-capture photo settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoSettings {
    /// `None` lets the platform pick its default codec
    pub codec: Option<VideoCodec>,
    pub quality_prioritization: QualityPrioritization,
    pub preview_pixel_format: Option<u32>,
}

impl PhotoSettings {
    /// Settings for one capture: HEVC when offered, balanced quality, first preview format
    pub fn for_capabilities(capabilities: &PhotoCapabilities) -> Self {
        let codec = capabilities
            .available_codecs
            .contains(&VideoCodec::Hevc)
            .then_some(VideoCodec::Hevc);

        Self {
            codec,
            quality_prioritization: QualityPrioritization::Balanced,
            preview_pixel_format: capabilities.preview_pixel_formats.first().copied(),
        }
    }
}
