//! Stream registration and sequential append.

use std::collections::BTreeMap;
use std::fmt;

use h5stream_format::{ElementType, Selection};
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::frame::{Frame, FrameShape};
use crate::options::FrameAxis;
use crate::path;
use crate::storage::Storage;

/// A registered stream: one pre-sized dataset and its write cursor.
#[derive(Debug, Clone)]
pub struct StreamHandle<D> {
    name: String,
    path: String,
    capacity: u64,
    cursor: u64,
    shape: FrameShape,
    element: ElementType,
    axis: FrameAxis,
    dataset: D,
}

impl<D: Copy> StreamHandle<D> {
    /// Leaf name the stream is appended under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full logical path given at registration.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Number of frames the dataset holds.
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Frames written so far.
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    pub fn remaining(&self) -> u64 {
        self.capacity - self.cursor
    }

    pub fn is_full(&self) -> bool {
        self.cursor == self.capacity
    }

    pub fn shape(&self) -> FrameShape {
        self.shape
    }

    pub fn element(&self) -> ElementType {
        self.element
    }

    pub fn frame_axis(&self) -> FrameAxis {
        self.axis
    }

    /// Shape of the backing dataset.
    pub fn dataset_dims(&self) -> Vec<u64> {
        self.axis.dataset_dims(self.shape, self.capacity)
    }

    /// Storage handle of the backing dataset.
    pub fn dataset(&self) -> D {
        self.dataset
    }

    /// Selection covering frame slot `slot`.
    fn slot_selection(&self, slot: u64) -> Selection {
        let dims = self.dataset_dims();
        Selection::index_along(&dims, self.axis.position(self.shape.rank()), slot)
    }
}

/// Name-keyed collection of stream handles.
pub struct StreamRegistry<D> {
    streams: BTreeMap<String, StreamHandle<D>>,
    axis: FrameAxis,
}

impl<D: fmt::Debug> fmt::Debug for StreamRegistry<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamRegistry")
            .field("streams", &self.streams.keys().collect::<Vec<_>>())
            .field("axis", &self.axis)
            .finish()
    }
}

impl<D: Copy + fmt::Debug> StreamRegistry<D> {
    /// Empty registry whose streams use `axis` for the frame index.
    pub fn new(axis: FrameAxis) -> Self {
        Self {
            streams: BTreeMap::new(),
            axis,
        }
    }

    pub fn get(&self, name: &str) -> Option<&StreamHandle<D>> {
        self.streams.get(name)
    }

    /// Handles ordered by name.
    pub fn iter(&self) -> impl Iterator<Item = &StreamHandle<D>> {
        self.streams.values()
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    /// Declare a stream of `frame_count` frames shaped like `sample`.
    ///
    /// Missing groups along `path` are created and a zero-filled dataset is
    /// allocated under the leaf name. Nothing is created when validation
    /// fails.
    pub fn register<S, F>(
        &mut self,
        storage: &mut S,
        path: &str,
        sample: &F,
        frame_count: u64,
    ) -> Result<&StreamHandle<D>>
    where
        S: Storage<Dataset = D>,
        F: Frame + ?Sized,
    {
        let (_, leaf) = path::split(path)?;
        if frame_count == 0 {
            return Err(Error::InvalidFrameCount(path.to_string()));
        }
        if self.streams.contains_key(leaf) {
            return Err(Error::DuplicateStream(leaf.to_string()));
        }
        let shape = sample.shape()?;
        let element = sample.element_type();

        let (parent, leaf) = path::resolve(storage, path)?;
        let dims = self.axis.dataset_dims(shape, frame_count);
        let dataset = storage.create_dataset(parent, leaf, element, &dims)?;
        debug!(stream = leaf, path, %shape, %element, ?dims, "allocated stream dataset");

        let handle = StreamHandle {
            name: leaf.to_string(),
            path: path.to_string(),
            capacity: frame_count,
            cursor: 0,
            shape,
            element,
            axis: self.axis,
            dataset,
        };
        Ok(self.streams.entry(leaf.to_string()).or_insert(handle))
    }

    /// Write `frame` into the next free slot of stream `name`.
    ///
    /// Returns the slot written. The cursor only advances once the storage
    /// write has succeeded.
    pub fn append<S, F>(&mut self, storage: &mut S, name: &str, frame: &F) -> Result<u64>
    where
        S: Storage<Dataset = D>,
        F: Frame + ?Sized,
    {
        let handle = self
            .streams
            .get_mut(name)
            .ok_or_else(|| Error::UnknownStream(name.to_string()))?;

        let shape = frame.shape()?;
        if shape != handle.shape {
            return Err(Error::ShapeMismatch {
                name: name.to_string(),
                expected: handle.shape,
                got: shape,
            });
        }
        let element = frame.element_type();
        if element != handle.element {
            return Err(Error::TypeMismatch {
                name: name.to_string(),
                expected: handle.element,
                got: element,
            });
        }
        if handle.is_full() {
            return Err(Error::CapacityExceeded {
                name: name.to_string(),
                capacity: handle.capacity,
            });
        }

        let slot = handle.cursor;
        let mut buf = Vec::with_capacity(shape.num_elements() * element.size());
        frame.encode(&mut buf);
        storage.write_selection(handle.dataset, &handle.slot_selection(slot), &buf)?;
        handle.cursor += 1;
        trace!(stream = name, slot, "appended frame");
        Ok(slot)
    }
}
