//! Session configuration.

use serde::Deserialize;

use crate::frame::FrameShape;

/// Where the frame index sits in a stream's dataset shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameAxis {
    /// `frameShape ++ [capacity]`: the frame index is the last axis.
    #[default]
    Trailing,
    /// `[capacity] ++ frameShape`: each frame is one contiguous slab.
    Leading,
}

impl FrameAxis {
    /// Dataset dimensions for a stream of `capacity` frames of `shape`.
    pub fn dataset_dims(self, shape: FrameShape, capacity: u64) -> Vec<u64> {
        let mut dims = shape.dims();
        match self {
            FrameAxis::Trailing => dims.push(capacity),
            FrameAxis::Leading => dims.insert(0, capacity),
        }
        dims
    }

    /// Index of the frame axis in a dataset holding frames of `rank` axes.
    pub fn position(self, rank: usize) -> usize {
        match self {
            FrameAxis::Trailing => rank,
            FrameAxis::Leading => 0,
        }
    }
}

/// Options for a [`LoggerSession`](crate::LoggerSession).
///
/// ```
/// use h5stream::{FrameAxis, SessionOptions};
///
/// let opts = SessionOptions::new()
///     .frame_axis(FrameAxis::Leading)
///     .flush_on_register(true);
/// assert!(!opts.sync_on_append);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionOptions {
    /// Frame axis convention for every stream in the session.
    pub frame_axis: FrameAxis,
    /// Sync raw data to disk after every append.
    pub sync_on_append: bool,
    /// Write a metadata snapshot after every registration.
    pub flush_on_register: bool,
}

impl SessionOptions {
    /// Default options: trailing frame axis, no extra syncing or flushing.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frame_axis(mut self, axis: FrameAxis) -> Self {
        self.frame_axis = axis;
        self
    }

    pub fn sync_on_append(mut self, sync: bool) -> Self {
        self.sync_on_append = sync;
        self
    }

    pub fn flush_on_register(mut self, flush: bool) -> Self {
        self.flush_on_register = flush;
        self
    }
}
