//! Error types and handling
//!
//! Common error types used across the capture pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Kind of request that owns a single pending slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RequestKind {
    PhotoCapture,
    StopRecording,
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestKind::PhotoCapture => write!(f, "photo capture"),
            RequestKind::StopRecording => write!(f, "stop recording"),
        }
    }
}

/// Crate-wide error type
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("No photo output configured")]
    NoPhotoOutputConfigured,

    #[error("No video output configured")]
    NoVideoOutputConfigured,

    #[error("A {0} request is already pending")]
    Busy(RequestKind),

    #[error("Camera access was not authorized")]
    NotAuthorized,

    #[error("Not recording")]
    NotRecording,

    #[error("Failed to finalize {path:?}: {message}")]
    Finalize { path: PathBuf, message: String },

    /// Reported by the platform when a capture fails
    #[error("Photo capture failed: {0}")]
    Photo(String),

    #[error("Container error: {0}")]
    Container(String),

    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Platform error: {0}")]
    Platform(String),

    #[error("Request was dropped before it resolved")]
    RequestDropped,
}

impl CaptureError {
    /// Stable machine-readable code for this error
    pub fn code(&self) -> &'static str {
        match self {
            CaptureError::Io(_) => "IO_ERROR",
            CaptureError::Serialization(_) => "SERIALIZATION_ERROR",
            CaptureError::NoPhotoOutputConfigured => "NO_PHOTO_OUTPUT",
            CaptureError::NoVideoOutputConfigured => "NO_VIDEO_OUTPUT",
            CaptureError::Busy(_) => "BUSY",
            CaptureError::NotAuthorized => "NOT_AUTHORIZED",
            CaptureError::NotRecording => "NOT_RECORDING",
            CaptureError::Finalize { .. } => "FINALIZE_ERROR",
            CaptureError::Photo(_) => "PHOTO_ERROR",
            CaptureError::Container(_) => "CONTAINER_ERROR",
            CaptureError::DeviceNotFound(_) => "DEVICE_NOT_FOUND",
            CaptureError::Platform(_) => "PLATFORM_ERROR",
            CaptureError::RequestDropped => "REQUEST_DROPPED",
        }
    }

    /// Output path carried alongside a finalize error, if any
    pub fn output_path(&self) -> Option<&PathBuf> {
        match self {
            CaptureError::Finalize { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Error response for callers across a serialization boundary
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl From<CaptureError> for ErrorResponse {
    fn from(error: CaptureError) -> Self {
        ErrorResponse {
            code: error.code().to_string(),
            message: error.to_string(),
        }
    }
}

/// Result type alias using CaptureError
pub type CaptureResult<T> = Result<T, CaptureError>;
