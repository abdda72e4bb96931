//! Writable HDF5 file with pre-allocated contiguous datasets.
//!
//! Raw data is written straight to its final address. Group and dataset
//! object headers live in memory until [`H5File::flush`], which serializes
//! them into a metadata block and rewrites the superblock to point at it.
//!
//! ```text
//! [superblock 48B][metadata][dataset 0][dataset 1]...[metadata (grown)]
//! ```

use std::fs::File;
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::data_layout::ContiguousLayout;
use crate::dataspace::Dataspace;
use crate::datatype::ElementType;
use crate::error::FormatError;
use crate::link_message::LinkMessage;
use crate::message_type::MessageType;
use crate::object_header_writer::{ObjectHeaderWriter, MSG_FLAG_CONSTANT};
use crate::selection::Selection;
use crate::superblock::{Superblock, SUPERBLOCK_SIZE};
use crate::util::{write_uint, UNDEFINED_ADDRESS};

const OFFSET_SIZE: u8 = 8;
const LENGTH_SIZE: u8 = 8;

/// Fill value message v3: early allocation, fill written if set, no value.
const FILL_VALUE_MESSAGE: [u8; 2] = [3, 0x09];

/// Handle to a group in an [`H5File`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupId(usize);

/// Handle to a dataset in an [`H5File`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DatasetId(usize);

#[derive(Debug)]
enum Node {
    Group {
        name: String,
        children: Vec<usize>,
    },
    Dataset {
        name: String,
        element: ElementType,
        dims: Vec<u64>,
        address: u64,
        size: u64,
    },
}

impl Node {
    fn name(&self) -> &str {
        match self {
            Node::Group { name, .. } | Node::Dataset { name, .. } => name,
        }
    }
}

/// An HDF5 file open for writing.
#[derive(Debug)]
pub struct H5File {
    path: PathBuf,
    file: File,
    nodes: Vec<Node>,
    /// End of allocated space.
    eoa: u64,
    /// Current metadata block: address and capacity in bytes.
    metadata: (u64, u64),
    dirty: bool,
}

impl H5File {
    /// Create a new file, truncating any existing one, and write an empty
    /// root group.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, FormatError> {
        let path = path.as_ref().to_path_buf();
        let file = File::options()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;
        let mut h5 = H5File {
            path,
            file,
            nodes: vec![Node::Group {
                name: String::new(),
                children: Vec::new(),
            }],
            eoa: SUPERBLOCK_SIZE as u64,
            metadata: (SUPERBLOCK_SIZE as u64, 0),
            dirty: true,
        };
        h5.flush()?;
        Ok(h5)
    }

    /// Path this file was created at.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The root group.
    pub fn root(&self) -> GroupId {
        GroupId(0)
    }

    /// Open the child group `name` of `parent`, if one exists.
    ///
    /// A dataset with that name is an error, not `None`.
    pub fn open_group(&self, parent: GroupId, name: &str) -> Result<Option<GroupId>, FormatError> {
        match self.child(parent, name)? {
            None => Ok(None),
            Some(idx) => match &self.nodes[idx] {
                Node::Group { .. } => Ok(Some(GroupId(idx))),
                Node::Dataset { .. } => Err(FormatError::NotAGroup(name.to_string())),
            },
        }
    }

    /// Create the child group `name` of `parent`.
    pub fn create_group(&mut self, parent: GroupId, name: &str) -> Result<GroupId, FormatError> {
        let idx = self.insert_child(
            parent,
            Node::Group {
                name: name.to_string(),
                children: Vec::new(),
            },
        )?;
        Ok(GroupId(idx))
    }

    /// Create a fixed-shape contiguous dataset under `parent`.
    ///
    /// Storage is allocated immediately and reads back as zeros until written.
    pub fn create_dataset(
        &mut self,
        parent: GroupId,
        name: &str,
        element: ElementType,
        dims: &[u64],
    ) -> Result<DatasetId, FormatError> {
        let size = dims
            .iter()
            .try_fold(element.size() as u64, |acc, &d| acc.checked_mul(d))
            .ok_or_else(|| FormatError::DatasetTooLarge(name.to_string()))?;
        let address = self.eoa;
        let end = address
            .checked_add(size)
            .ok_or_else(|| FormatError::DatasetTooLarge(name.to_string()))?;
        // Nothing changes unless the file could be grown.
        self.check_new_child(parent, name)?;
        self.file.set_len(end)?;
        let idx = self.insert_child(
            parent,
            Node::Dataset {
                name: name.to_string(),
                element,
                dims: dims.to_vec(),
                address,
                size,
            },
        )?;
        self.eoa = end;
        Ok(DatasetId(idx))
    }

    /// Write `data` into the region of `dataset` named by `selection`.
    ///
    /// `data` holds the selected elements in row-major order, little-endian.
    pub fn write_selection(
        &mut self,
        dataset: DatasetId,
        selection: &Selection,
        data: &[u8],
    ) -> Result<(), FormatError> {
        let (element, dims, address) = match self.nodes.get(dataset.0) {
            Some(Node::Dataset {
                element,
                dims,
                address,
                ..
            }) => (*element, dims.clone(), *address),
            _ => return Err(FormatError::InvalidHandle(dataset.0)),
        };
        let runs = selection.byte_runs(&dims, element.size())?;
        let expected = selection.num_elements(&dims) as usize * element.size();
        if data.len() != expected {
            return Err(FormatError::BufferSizeMismatch {
                expected,
                got: data.len(),
            });
        }

        let mut consumed = 0;
        for (offset, len) in runs {
            self.file.seek(SeekFrom::Start(address + offset))?;
            self.file.write_all(&data[consumed..consumed + len])?;
            consumed += len;
        }
        Ok(())
    }

    /// Element type of a dataset.
    pub fn dataset_element(&self, dataset: DatasetId) -> Result<ElementType, FormatError> {
        match self.nodes.get(dataset.0) {
            Some(Node::Dataset { element, .. }) => Ok(*element),
            _ => Err(FormatError::InvalidHandle(dataset.0)),
        }
    }

    /// Dimensions of a dataset.
    pub fn dataset_dims(&self, dataset: DatasetId) -> Result<&[u64], FormatError> {
        match self.nodes.get(dataset.0) {
            Some(Node::Dataset { dims, .. }) => Ok(dims),
            _ => Err(FormatError::InvalidHandle(dataset.0)),
        }
    }

    /// Force written raw data to disk.
    pub fn sync_data(&mut self) -> Result<(), FormatError> {
        self.file.sync_data()?;
        Ok(())
    }

    /// Write all object headers and the superblock.
    ///
    /// Does nothing when no group or dataset was created since the last flush.
    pub fn flush(&mut self) -> Result<(), FormatError> {
        if !self.dirty {
            return Ok(());
        }

        // Header sizes do not depend on the addresses they contain.
        let sizes: Vec<u64> = (0..self.nodes.len())
            .map(|idx| self.header_writer(idx, &[]).serialized_len() as u64)
            .collect();
        let total: u64 = sizes.iter().sum();

        if total > self.metadata.1 {
            let end = self
                .eoa
                .checked_add(total)
                .ok_or(FormatError::AddressOverflow)?;
            self.file.set_len(end)?;
            self.metadata = (self.eoa, total);
            self.eoa = end;
        }

        let mut addresses = Vec::with_capacity(sizes.len());
        let mut next = self.metadata.0;
        for size in &sizes {
            addresses.push(next);
            next += size;
        }

        let mut block = Vec::with_capacity(total as usize);
        for idx in 0..self.nodes.len() {
            block.extend_from_slice(&self.header_writer(idx, &addresses).serialize());
        }
        self.file.seek(SeekFrom::Start(self.metadata.0))?;
        self.file.write_all(&block)?;

        let superblock = Superblock::new(addresses[0], self.eoa);
        self.file.seek(SeekFrom::Start(0))?;
        self.file.write_all(&superblock.serialize())?;
        self.file.flush()?;

        self.dirty = false;
        Ok(())
    }

    /// Flush metadata, sync everything to disk and release the file.
    pub fn close(mut self) -> Result<(), FormatError> {
        self.flush()?;
        self.file.sync_all()?;
        Ok(())
    }

    fn child(&self, parent: GroupId, name: &str) -> Result<Option<usize>, FormatError> {
        match self.nodes.get(parent.0) {
            Some(Node::Group { children, .. }) => Ok(children
                .iter()
                .copied()
                .find(|&c| self.nodes[c].name() == name)),
            _ => Err(FormatError::InvalidHandle(parent.0)),
        }
    }

    fn check_new_child(&self, parent: GroupId, name: &str) -> Result<(), FormatError> {
        if name.is_empty() || name.contains('/') || name == "." {
            return Err(FormatError::InvalidName(name.to_string()));
        }
        if self.child(parent, name)?.is_some() {
            return Err(FormatError::NameExists(name.to_string()));
        }
        Ok(())
    }

    fn insert_child(&mut self, parent: GroupId, node: Node) -> Result<usize, FormatError> {
        self.check_new_child(parent, node.name())?;
        let idx = self.nodes.len();
        self.nodes.push(node);
        if let Some(Node::Group { children, .. }) = self.nodes.get_mut(parent.0) {
            children.push(idx);
        }
        self.dirty = true;
        Ok(idx)
    }

    /// Object header for node `idx`. Missing addresses serialize as zero.
    fn header_writer(&self, idx: usize, addresses: &[u64]) -> ObjectHeaderWriter {
        let mut w = ObjectHeaderWriter::new();
        match &self.nodes[idx] {
            Node::Group { children, .. } => {
                let mut link_info = vec![0u8, 0];
                write_uint(&mut link_info, UNDEFINED_ADDRESS, OFFSET_SIZE);
                write_uint(&mut link_info, UNDEFINED_ADDRESS, OFFSET_SIZE);
                w.add_message(MessageType::LinkInfo, link_info);
                w.add_message(MessageType::GroupInfo, vec![0, 0]);
                for &child in children {
                    let address = addresses.get(child).copied().unwrap_or(0);
                    let link = LinkMessage::hard(self.nodes[child].name(), address);
                    w.add_message(MessageType::Link, link.serialize(OFFSET_SIZE));
                }
            }
            Node::Dataset {
                element,
                dims,
                address,
                size,
                ..
            } => {
                w.add_message_with_flags(
                    MessageType::Datatype,
                    element.serialize(),
                    MSG_FLAG_CONSTANT,
                );
                w.add_message(
                    MessageType::Dataspace,
                    Dataspace::simple(dims).serialize(LENGTH_SIZE),
                );
                w.add_message_with_flags(
                    MessageType::FillValue,
                    FILL_VALUE_MESSAGE.to_vec(),
                    MSG_FLAG_CONSTANT,
                );
                let layout = ContiguousLayout {
                    address: Some(*address),
                    size: *size,
                };
                w.add_message(
                    MessageType::DataLayout,
                    layout.serialize(OFFSET_SIZE, LENGTH_SIZE),
                );
            }
        }
        w
    }
}
