//! Storage backends for a logger session.
//!
//! The logger needs five primitives from a hierarchical file: open-or-create
//! groups, create a fixed-shape dataset, write a hyperslab, and close. The
//! [`Storage`] trait names them so a session can run against an on-disk
//! [`H5File`] or the in-memory [`MemoryStorage`].
//!
//! ```text
//! ┌──────────────────────────┐
//! │      LoggerSession       │
//! ├──────────────────────────┤
//! │         Storage          │
//! ├────────────┬─────────────┤
//! │   H5File   │MemoryStorage│
//! └────────────┴─────────────┘
//! ```

use std::fmt;
use std::path::Path;

use h5stream_format::{DatasetId, ElementType, FormatError, GroupId, H5File, Selection};

/// Operations the logger performs on its output file.
pub trait Storage {
    /// Handle to a group.
    type Group: Copy + fmt::Debug;
    /// Handle to a dataset.
    type Dataset: Copy + fmt::Debug;

    /// The root group.
    fn root(&self) -> Self::Group;

    /// Open the child group `name`, or `None` if there is no such child.
    fn open_group(&mut self, parent: Self::Group, name: &str)
        -> Result<Option<Self::Group>, FormatError>;

    /// Create the child group `name`.
    fn create_group(&mut self, parent: Self::Group, name: &str)
        -> Result<Self::Group, FormatError>;

    /// Create a zero-filled dataset of fixed shape.
    fn create_dataset(
        &mut self,
        parent: Self::Group,
        name: &str,
        element: ElementType,
        dims: &[u64],
    ) -> Result<Self::Dataset, FormatError>;

    /// Write row-major little-endian `data` into `selection` of `dataset`.
    fn write_selection(
        &mut self,
        dataset: Self::Dataset,
        selection: &Selection,
        data: &[u8],
    ) -> Result<(), FormatError>;

    /// Make written raw data durable.
    fn sync_data(&mut self) -> Result<(), FormatError>;

    /// Persist a consistent metadata snapshot.
    fn flush(&mut self) -> Result<(), FormatError>;

    /// Flush and release the backend.
    fn close(self) -> Result<(), FormatError>
    where
        Self: Sized;

    /// Location of the backing file, if any.
    fn path(&self) -> Option<&Path> {
        None
    }
}

impl Storage for H5File {
    type Group = GroupId;
    type Dataset = DatasetId;

    fn root(&self) -> GroupId {
        H5File::root(self)
    }

    fn open_group(&mut self, parent: GroupId, name: &str) -> Result<Option<GroupId>, FormatError> {
        H5File::open_group(self, parent, name)
    }

    fn create_group(&mut self, parent: GroupId, name: &str) -> Result<GroupId, FormatError> {
        H5File::create_group(self, parent, name)
    }

    fn create_dataset(
        &mut self,
        parent: GroupId,
        name: &str,
        element: ElementType,
        dims: &[u64],
    ) -> Result<DatasetId, FormatError> {
        H5File::create_dataset(self, parent, name, element, dims)
    }

    fn write_selection(
        &mut self,
        dataset: DatasetId,
        selection: &Selection,
        data: &[u8],
    ) -> Result<(), FormatError> {
        H5File::write_selection(self, dataset, selection, data)
    }

    fn sync_data(&mut self) -> Result<(), FormatError> {
        H5File::sync_data(self)
    }

    fn flush(&mut self) -> Result<(), FormatError> {
        H5File::flush(self)
    }

    fn close(self) -> Result<(), FormatError> {
        H5File::close(self)
    }

    fn path(&self) -> Option<&Path> {
        Some(H5File::path(self))
    }
}

/// One storage call recorded by [`MemoryStorage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    CreateGroup { path: String },
    CreateDataset {
        path: String,
        element: ElementType,
        dims: Vec<u64>,
    },
    Write { path: String, selection: Selection },
    Sync,
    Flush,
}

/// Group handle in a [`MemoryStorage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemoryGroup(usize);

/// Dataset handle in a [`MemoryStorage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemoryDataset(usize);

#[derive(Debug)]
enum MemoryNode {
    Group {
        path: String,
        children: Vec<(String, usize)>,
    },
    Dataset {
        path: String,
        element: ElementType,
        dims: Vec<u64>,
        data: Vec<u8>,
    },
}

impl MemoryNode {
    fn path(&self) -> &str {
        match self {
            MemoryNode::Group { path, .. } | MemoryNode::Dataset { path, .. } => path,
        }
    }
}

/// In-memory storage that records every mutating call.
///
/// Useful for dry runs and for asserting exactly which storage operations a
/// logger call performed.
#[derive(Debug)]
pub struct MemoryStorage {
    nodes: Vec<MemoryNode>,
    log: Vec<Mutation>,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStorage {
    /// Empty storage holding only a root group.
    pub fn new() -> Self {
        Self {
            nodes: vec![MemoryNode::Group {
                path: "/".to_string(),
                children: Vec::new(),
            }],
            log: Vec::new(),
        }
    }

    /// Every mutation so far, oldest first.
    pub fn mutations(&self) -> &[Mutation] {
        &self.log
    }

    /// Whether a group exists at the absolute `path`.
    pub fn has_group(&self, path: &str) -> bool {
        self.nodes
            .iter()
            .any(|n| matches!(n, MemoryNode::Group { path: p, .. } if p == path))
    }

    /// Number of groups, the root included.
    pub fn group_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, MemoryNode::Group { .. }))
            .count()
    }

    /// Shape and raw bytes of the dataset at the absolute `path`.
    pub fn dataset(&self, path: &str) -> Option<(ElementType, &[u64], &[u8])> {
        self.nodes.iter().find_map(|n| match n {
            MemoryNode::Dataset {
                path: p,
                element,
                dims,
                data,
            } if p == path => Some((*element, dims.as_slice(), data.as_slice())),
            _ => None,
        })
    }

    fn children(&self, group: usize) -> Result<&[(String, usize)], FormatError> {
        match self.nodes.get(group) {
            Some(MemoryNode::Group { children, .. }) => Ok(children),
            _ => Err(FormatError::InvalidHandle(group)),
        }
    }

    fn insert(&mut self, parent: usize, name: &str, node: impl FnOnce(String) -> MemoryNode) -> Result<usize, FormatError> {
        if name.is_empty() || name.contains('/') || name == "." {
            return Err(FormatError::InvalidName(name.to_string()));
        }
        if self.children(parent)?.iter().any(|(n, _)| n == name) {
            return Err(FormatError::NameExists(name.to_string()));
        }
        let parent_path = self.nodes[parent].path();
        let path = if parent_path == "/" {
            format!("/{name}")
        } else {
            format!("{parent_path}/{name}")
        };
        let idx = self.nodes.len();
        self.nodes.push(node(path));
        if let Some(MemoryNode::Group { children, .. }) = self.nodes.get_mut(parent) {
            children.push((name.to_string(), idx));
        }
        Ok(idx)
    }
}

impl Storage for MemoryStorage {
    type Group = MemoryGroup;
    type Dataset = MemoryDataset;

    fn root(&self) -> MemoryGroup {
        MemoryGroup(0)
    }

    fn open_group(
        &mut self,
        parent: MemoryGroup,
        name: &str,
    ) -> Result<Option<MemoryGroup>, FormatError> {
        let found = self
            .children(parent.0)?
            .iter()
            .find(|(n, _)| n == name)
            .map(|&(_, idx)| idx);
        match found.map(|idx| (idx, &self.nodes[idx])) {
            None => Ok(None),
            Some((idx, MemoryNode::Group { .. })) => Ok(Some(MemoryGroup(idx))),
            Some((_, MemoryNode::Dataset { .. })) => Err(FormatError::NotAGroup(name.to_string())),
        }
    }

    fn create_group(&mut self, parent: MemoryGroup, name: &str) -> Result<MemoryGroup, FormatError> {
        let idx = self.insert(parent.0, name, |path| MemoryNode::Group {
            path,
            children: Vec::new(),
        })?;
        self.log.push(Mutation::CreateGroup {
            path: self.nodes[idx].path().to_string(),
        });
        Ok(MemoryGroup(idx))
    }

    fn create_dataset(
        &mut self,
        parent: MemoryGroup,
        name: &str,
        element: ElementType,
        dims: &[u64],
    ) -> Result<MemoryDataset, FormatError> {
        let len = dims
            .iter()
            .try_fold(element.size() as u64, |acc, &d| acc.checked_mul(d))
            .and_then(|n| usize::try_from(n).ok())
            .ok_or_else(|| FormatError::DatasetTooLarge(name.to_string()))?;
        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| FormatError::DatasetTooLarge(name.to_string()))?;
        data.resize(len, 0);
        let idx = self.insert(parent.0, name, |path| MemoryNode::Dataset {
            path,
            element,
            dims: dims.to_vec(),
            data,
        })?;
        self.log.push(Mutation::CreateDataset {
            path: self.nodes[idx].path().to_string(),
            element,
            dims: dims.to_vec(),
        });
        Ok(MemoryDataset(idx))
    }

    fn write_selection(
        &mut self,
        dataset: MemoryDataset,
        selection: &Selection,
        bytes: &[u8],
    ) -> Result<(), FormatError> {
        let Some(MemoryNode::Dataset {
            path,
            element,
            dims,
            data,
        }) = self.nodes.get_mut(dataset.0)
        else {
            return Err(FormatError::InvalidHandle(dataset.0));
        };
        let runs = selection.byte_runs(dims, element.size())?;
        let expected = selection.num_elements(dims) as usize * element.size();
        if bytes.len() != expected {
            return Err(FormatError::BufferSizeMismatch {
                expected,
                got: bytes.len(),
            });
        }
        let mut consumed = 0;
        for (offset, len) in runs {
            let start = offset as usize;
            data[start..start + len].copy_from_slice(&bytes[consumed..consumed + len]);
            consumed += len;
        }
        self.log.push(Mutation::Write {
            path: path.clone(),
            selection: selection.clone(),
        });
        Ok(())
    }

    fn sync_data(&mut self) -> Result<(), FormatError> {
        self.log.push(Mutation::Sync);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), FormatError> {
        self.log.push(Mutation::Flush);
        Ok(())
    }

    fn close(self) -> Result<(), FormatError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_groups_and_paths() {
        let mut mem = MemoryStorage::new();
        let root = mem.root();
        let a = mem.create_group(root, "a").unwrap();
        let b = mem.create_group(a, "b").unwrap();
        assert!(mem.has_group("/a/b"));
        assert_eq!(mem.open_group(root, "a").unwrap(), Some(a));
        assert_eq!(mem.open_group(a, "b").unwrap(), Some(b));
        assert_eq!(mem.open_group(b, "c").unwrap(), None);
        assert!(matches!(
            mem.create_group(root, "a"),
            Err(FormatError::NameExists(_))
        ));
        assert_eq!(mem.group_count(), 3);
    }

    #[test]
    fn memory_write_lands_in_selection() {
        let mut mem = MemoryStorage::new();
        let root = mem.root();
        let ds = mem
            .create_dataset(root, "x", ElementType::U8, &[2, 3])
            .unwrap();
        let sel = Selection::index_along(&[2, 3], 1, 2);
        mem.write_selection(ds, &sel, &[7, 9]).unwrap();
        let (element, dims, data) = mem.dataset("/x").unwrap();
        assert_eq!(element, ElementType::U8);
        assert_eq!(dims, &[2, 3]);
        assert_eq!(data, &[0, 0, 7, 0, 0, 9]);
        assert_eq!(mem.mutations().len(), 2);
        assert!(matches!(
            mem.open_group(root, "x"),
            Err(FormatError::NotAGroup(_))
        ));
    }

    #[test]
    fn memory_rejects_bad_writes_without_logging() {
        let mut mem = MemoryStorage::new();
        let root = mem.root();
        let ds = mem.create_dataset(root, "x", ElementType::F32, &[4]).unwrap();
        assert!(mem
            .write_selection(ds, &Selection::slice(&[0..1]), &[0; 8])
            .is_err());
        assert!(mem
            .write_selection(ds, &Selection::slice(&[4..5]), &[0; 4])
            .is_err());
        assert_eq!(mem.mutations().len(), 1);
    }
}
