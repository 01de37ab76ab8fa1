//! Capture trait definitions
//!
//! Platform-agnostic descriptions of capture devices and the collaborator
//! surface the platform layer must provide.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Physical position of a capture device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DevicePosition {
    Front,
    #[default]
    Back,
    Unspecified,
}

impl fmt::Display for DevicePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DevicePosition::Front => write!(f, "front"),
            DevicePosition::Back => write!(f, "back"),
            DevicePosition::Unspecified => write!(f, "unspecified"),
        }
    }
}

/// Snapshot of a capture device taken during one enumeration pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDescriptor {
    /// Stable, opaque device identity
    pub identity: String,

    /// Human readable name
    pub display_name: String,

    /// Where the device faces
    pub position: DevicePosition,

    /// Whether the device is currently connected
    pub is_connected: bool,

    /// Whether the device is suspended (e.g. a closed lid)
    pub is_suspended: bool,
}

impl DeviceDescriptor {
    /// Create a connected, active device
    pub fn new(
        identity: impl Into<String>,
        display_name: impl Into<String>,
        position: DevicePosition,
    ) -> Self {
        Self {
            identity: identity.into(),
            display_name: display_name.into(),
            position,
            is_connected: true,
            is_suspended: false,
        }
    }

    /// Whether the device can be used for capture right now
    pub fn is_available(&self) -> bool {
        self.is_connected && !self.is_suspended
    }

    pub fn is_front(&self) -> bool {
        self.position == DevicePosition::Front
    }
}

/// Camera authorization state reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AuthorizationStatus {
    NotDetermined,
    Authorized,
    Denied,
    Restricted,
}

/// Physical orientation of the device running the capture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeviceOrientation {
    #[default]
    Unknown,
    Portrait,
    PortraitUpsideDown,
    LandscapeLeft,
    LandscapeRight,
    FaceUp,
    FaceDown,
}

/// Orientation applied to video connections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VideoOrientation {
    #[default]
    Portrait,
    PortraitUpsideDown,
    LandscapeRight,
    LandscapeLeft,
}

impl From<DeviceOrientation> for VideoOrientation {
    /// Landscape is mirrored: the camera sensor faces away from the screen
    fn from(orientation: DeviceOrientation) -> Self {
        match orientation {
            DeviceOrientation::Portrait => VideoOrientation::Portrait,
            DeviceOrientation::PortraitUpsideDown => VideoOrientation::PortraitUpsideDown,
            DeviceOrientation::LandscapeLeft => VideoOrientation::LandscapeRight,
            DeviceOrientation::LandscapeRight => VideoOrientation::LandscapeLeft,
            _ => VideoOrientation::Portrait,
        }
    }
}

/// Latest orientation signals known to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OrientationSignal {
    /// Orientation reported by the device sensors
    pub device: DeviceOrientation,
    /// Orientation derived from the screen coordinate space
    pub screen: DeviceOrientation,
}

impl OrientationSignal {
    /// Video orientation to apply; an unknown device orientation defers to the screen
    pub fn resolve(&self) -> VideoOrientation {
        match self.device {
            DeviceOrientation::Unknown => VideoOrientation::from(self.screen),
            device => VideoOrientation::from(device),
        }
    }
}

/// Media carried by a connection, track or sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Audio,
    Video,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Audio => write!(f, "audio"),
            MediaKind::Video => write!(f, "video"),
        }
    }
}

/// Platform surface for device enumeration and authorization
#[async_trait]
pub trait DeviceProvider: Send + Sync {
    /// Every discovered video device, unfiltered
    fn devices(&self) -> Vec<DeviceDescriptor>;

    /// The system default video device
    fn default_video_device(&self) -> Option<DeviceDescriptor>;

    /// The system default audio input device
    fn default_audio_device(&self) -> Option<DeviceDescriptor>;

    /// Current camera authorization
    fn authorization_status(&self) -> AuthorizationStatus;

    /// Ask the user for camera access; may wait indefinitely for a decision
    async fn request_authorization(&self) -> bool;
}
