//! Read-only access to files written by [`H5File`](crate::H5File).
//!
//! The whole file is loaded into memory and objects are located by walking
//! hard links from the root group.

use std::path::Path;

use crate::data_layout::ContiguousLayout;
use crate::dataspace::Dataspace;
use crate::datatype::ElementType;
use crate::error::FormatError;
use crate::link_message::LinkMessage;
use crate::message_type::MessageType;
use crate::object_header::ObjectHeader;
use crate::signature::find_signature;
use crate::superblock::Superblock;

/// Raw contents of one dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetData {
    /// Stored element type.
    pub element: ElementType,
    /// Dataset dimensions.
    pub dims: Vec<u64>,
    /// Row-major little-endian element bytes.
    pub raw: Vec<u8>,
}

impl DatasetData {
    /// Number of elements.
    pub fn len(&self) -> usize {
        self.raw.len() / self.element.size()
    }

    /// Whether the dataset holds no elements.
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// All elements widened to `f64`.
    pub fn to_f64(&self) -> Vec<f64> {
        let size = self.element.size();
        self.raw
            .chunks_exact(size)
            .map(|b| match self.element {
                ElementType::F32 => f32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f64,
                ElementType::F64 => f64::from_le_bytes(le8(b)),
                ty if ty.is_signed_int() => sign_extend(b) as f64,
                _ => zero_extend(b) as f64,
            })
            .collect()
    }

    /// Elements of a signed or unsigned integer dataset as `i64`.
    pub fn to_i64(&self) -> Result<Vec<i64>, FormatError> {
        if self.element.is_float() {
            return Err(FormatError::TypeMismatch {
                expected: ElementType::I64,
                actual: self.element,
            });
        }
        let signed = self.element.is_signed_int();
        Ok(self
            .raw
            .chunks_exact(self.element.size())
            .map(|b| if signed { sign_extend(b) } else { zero_extend(b) as i64 })
            .collect())
    }

    /// Elements of an unsigned integer dataset as `u64`.
    pub fn to_u64(&self) -> Result<Vec<u64>, FormatError> {
        if self.element.is_float() || self.element.is_signed_int() {
            return Err(FormatError::TypeMismatch {
                expected: ElementType::U64,
                actual: self.element,
            });
        }
        Ok(self
            .raw
            .chunks_exact(self.element.size())
            .map(zero_extend)
            .collect())
    }
}

fn le8(b: &[u8]) -> [u8; 8] {
    let mut out = [0u8; 8];
    out.copy_from_slice(&b[..8]);
    out
}

fn zero_extend(b: &[u8]) -> u64 {
    let mut out = [0u8; 8];
    out[..b.len()].copy_from_slice(b);
    u64::from_le_bytes(out)
}

fn sign_extend(b: &[u8]) -> i64 {
    let shift = 64 - 8 * b.len() as u32;
    ((zero_extend(b) << shift) as i64) >> shift
}

/// An HDF5 file loaded for reading.
#[derive(Debug)]
pub struct H5Reader {
    data: Vec<u8>,
    superblock: Superblock,
}

impl H5Reader {
    /// Read and parse a file from disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FormatError> {
        Self::from_bytes(std::fs::read(path)?)
    }

    /// Parse an in-memory file image.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, FormatError> {
        let offset = find_signature(&data)?;
        let superblock = Superblock::parse(&data, offset)?;
        Ok(H5Reader { data, superblock })
    }

    /// The parsed superblock.
    pub fn superblock(&self) -> &Superblock {
        &self.superblock
    }

    /// Names of the child groups of the group at `path`.
    pub fn group_names(&self, path: &str) -> Result<Vec<String>, FormatError> {
        self.children_where(path, |hdr| !is_dataset(hdr))
    }

    /// Names of the datasets directly inside the group at `path`.
    pub fn dataset_names(&self, path: &str) -> Result<Vec<String>, FormatError> {
        self.children_where(path, is_dataset)
    }

    /// Whether `path` names a group.
    pub fn is_group(&self, path: &str) -> bool {
        self.header_at(path).is_ok_and(|hdr| !is_dataset(&hdr))
    }

    /// Load the dataset at `path`.
    ///
    /// An unallocated dataset reads back as zeros.
    pub fn dataset(&self, path: &str) -> Result<DatasetData, FormatError> {
        let hdr = self.header_at(path)?;
        if !is_dataset(&hdr) {
            return Err(FormatError::NotADataset(path.to_string()));
        }
        let sb = &self.superblock;
        let element = ElementType::parse(&hdr.require(MessageType::Datatype)?.data)?;
        let space = Dataspace::parse(&hdr.require(MessageType::Dataspace)?.data, sb.length_size)?;
        let layout = ContiguousLayout::parse(
            &hdr.require(MessageType::DataLayout)?.data,
            sb.offset_size,
            sb.length_size,
        )?;

        let too_far = || FormatError::UnexpectedEof {
            expected: usize::MAX,
            available: self.data.len(),
        };
        let expected = space
            .dimensions
            .iter()
            .try_fold(element.size() as u64, |acc, &d| acc.checked_mul(d))
            .and_then(|n| usize::try_from(n).ok())
            .ok_or_else(too_far)?;
        let raw = match layout.address {
            None => vec![0; expected],
            Some(addr) => {
                let start = sb
                    .base_address
                    .checked_add(addr)
                    .and_then(|a| usize::try_from(a).ok())
                    .ok_or_else(too_far)?;
                let end = start.checked_add(expected).ok_or_else(too_far)?;
                if end > self.data.len() {
                    return Err(FormatError::UnexpectedEof {
                        expected: end,
                        available: self.data.len(),
                    });
                }
                self.data[start..end].to_vec()
            }
        };
        Ok(DatasetData {
            element,
            dims: space.dimensions,
            raw,
        })
    }

    /// Dataset at `path` widened to `f64`.
    pub fn read_f64(&self, path: &str) -> Result<Vec<f64>, FormatError> {
        Ok(self.dataset(path)?.to_f64())
    }

    /// Integer dataset at `path` as `i64`.
    pub fn read_i64(&self, path: &str) -> Result<Vec<i64>, FormatError> {
        self.dataset(path)?.to_i64()
    }

    /// Unsigned integer dataset at `path` as `u64`.
    pub fn read_u64(&self, path: &str) -> Result<Vec<u64>, FormatError> {
        self.dataset(path)?.to_u64()
    }

    fn parse_header(&self, address: u64) -> Result<ObjectHeader, FormatError> {
        let sb = &self.superblock;
        ObjectHeader::parse(
            &self.data,
            (sb.base_address + address) as usize,
            sb.offset_size,
            sb.length_size,
        )
    }

    fn links(&self, hdr: &ObjectHeader) -> Result<Vec<LinkMessage>, FormatError> {
        hdr.all(MessageType::Link)
            .map(|m| LinkMessage::parse(&m.data, self.superblock.offset_size))
            .collect()
    }

    fn header_at(&self, path: &str) -> Result<ObjectHeader, FormatError> {
        let mut hdr = self.parse_header(self.superblock.root_group_address)?;
        for part in path.split('/').filter(|p| !p.is_empty()) {
            if is_dataset(&hdr) {
                return Err(FormatError::NotAGroup(path.to_string()));
            }
            let link = self
                .links(&hdr)?
                .into_iter()
                .find(|l| l.name == part)
                .ok_or_else(|| FormatError::NotFound(path.to_string()))?;
            hdr = self.parse_header(link.address)?;
        }
        Ok(hdr)
    }

    fn children_where(
        &self,
        path: &str,
        keep: impl Fn(&ObjectHeader) -> bool,
    ) -> Result<Vec<String>, FormatError> {
        let hdr = self.header_at(path)?;
        if is_dataset(&hdr) {
            return Err(FormatError::NotAGroup(path.to_string()));
        }
        let mut names = Vec::new();
        for link in self.links(&hdr)? {
            if keep(&self.parse_header(link.address)?) {
                names.push(link.name);
            }
        }
        Ok(names)
    }
}

fn is_dataset(hdr: &ObjectHeader) -> bool {
    hdr.find(MessageType::DataLayout).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(element: ElementType, raw: Vec<u8>) -> DatasetData {
        DatasetData {
            element,
            dims: vec![(raw.len() / element.size()) as u64],
            raw,
        }
    }

    #[test]
    fn widening_conversions() {
        let d = data(ElementType::I16, [-3i16, 7].iter().flat_map(|v| v.to_le_bytes()).collect());
        assert_eq!(d.to_f64(), vec![-3.0, 7.0]);
        assert_eq!(d.to_i64().unwrap(), vec![-3, 7]);
        assert!(d.to_u64().is_err());

        let d = data(ElementType::U8, vec![200, 1]);
        assert_eq!(d.to_i64().unwrap(), vec![200, 1]);
        assert_eq!(d.to_u64().unwrap(), vec![200, 1]);

        let d = data(ElementType::F32, 1.5f32.to_le_bytes().to_vec());
        assert_eq!(d.to_f64(), vec![1.5]);
        assert!(matches!(
            d.to_i64(),
            Err(FormatError::TypeMismatch { actual: ElementType::F32, .. })
        ));
        assert_eq!(d.len(), 1);
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(
            H5Reader::from_bytes(vec![0; 64]),
            Err(FormatError::SignatureNotFound)
        ));
    }
}
