//! Recording system module
//!
//! - Container and track traits implemented by the encoder layer
//! - MuxingWriter, which interleaves audio and video into one file
//! - Recording settings and the codec to container lookup

pub mod container;
pub mod delegate;
pub mod settings;
pub mod state;
pub mod writer;

pub use container::{
    ContainerWriter, ContainerWriterFactory, MediaTime, SampleBuffer, SampleSink, TrackInput,
};
pub use delegate::RecordingDelegate;
pub use settings::{AudioSettings, ContainerType, RecordingSettings, VideoCodec, VideoSettings};
pub use state::{RecordingSession, RecordingStats, WriterState};
pub use writer::{DropReason, MuxingWriter, SubmitOutcome};
