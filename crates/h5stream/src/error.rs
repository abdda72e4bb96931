//! Error types for the stream logger.

use h5stream_format::{ElementType, FormatError};

use crate::frame::FrameShape;

/// Errors raised by [`LoggerSession`](crate::LoggerSession) operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid stream path {0:?}: no dataset name")]
    InvalidPath(String),

    #[error("stream {0:?} is already registered")]
    DuplicateStream(String),

    #[error("no stream named {0:?}; register it before appending")]
    UnknownStream(String),

    #[error("stream {name:?} expects {expected} frames, got {got}")]
    ShapeMismatch {
        name: String,
        expected: FrameShape,
        got: FrameShape,
    },

    #[error("stream {name:?} stores {expected} elements, got {got}")]
    TypeMismatch {
        name: String,
        expected: ElementType,
        got: ElementType,
    },

    #[error("stream {name:?}: allocated space exhausted after {capacity} frames")]
    CapacityExceeded { name: String, capacity: u64 },

    #[error("stream {0:?}: frame count must be positive")]
    InvalidFrameCount(String),

    #[error("invalid frame: {0}")]
    InvalidFrame(&'static str),

    #[error("logger session is closed")]
    SessionClosed,

    #[error("storage error: {0}")]
    Storage(#[from] FormatError),
}

pub type Result<T> = std::result::Result<T, Error>;
