//! Shared utilities

pub mod error;
pub mod queue;

pub use error::{CaptureError, CaptureResult, ErrorResponse, RequestKind};
pub use queue::{SerialQueue, SuspendGuard};
