//! Fixed-capacity, append-only stream logging into HDF5 files.
//!
//! A [`LoggerSession`] owns one output file. Each stream is registered up
//! front with a sample frame (a scalar, vector or matrix) and the exact number
//! of frames it will receive; its dataset is allocated at that size and every
//! [`append`](LoggerSession::append) fills the next slot.
//!
//! ```no_run
//! use h5stream::LoggerSession;
//!
//! let mut log = LoggerSession::create("run.h5")?;
//! log.register("/robot/pos", &[0.0f64; 3], 3)?;
//! log.append("pos", &[1.0, 2.0, 3.0])?;
//! log.append("pos", &[4.0, 5.0, 6.0])?;
//! log.append("pos", &[7.0, 8.0, 9.0])?;
//! log.close()?;
//! # Ok::<(), h5stream::Error>(())
//! ```
//!
//! With the default [`FrameAxis::Trailing`] layout `/robot/pos` has shape
//! `[3, 3]` and column `k` holds the `k`-th frame.

pub mod element;
pub mod error;
pub mod frame;
pub mod options;
pub mod path;
pub mod registry;
pub mod session;
pub mod storage;

pub use element::Element;
pub use error::{Error, Result};
pub use frame::{Frame, FrameShape};
pub use options::{FrameAxis, SessionOptions};
pub use registry::{StreamHandle, StreamRegistry};
pub use session::LoggerSession;
pub use storage::{MemoryStorage, Mutation, Storage};

pub use h5stream_format::ElementType;
