//! HDF5 Dataspace message (message type 0x0001).

use crate::error::FormatError;
use crate::util::{ensure_len, read_uint, write_uint};

/// Parsed dataspace: scalar when `dimensions` is empty, simple otherwise.
///
/// Datasets written by this crate are fixed-size, so no maximum dimensions are
/// emitted; any present in a parsed message are skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataspace {
    /// Current dimension sizes, slowest-varying first.
    pub dimensions: Vec<u64>,
}

impl Dataspace {
    /// A simple dataspace with the given dimensions.
    pub fn simple(dimensions: &[u64]) -> Self {
        Self {
            dimensions: dimensions.to_vec(),
        }
    }

    /// Number of dimensions.
    pub fn rank(&self) -> usize {
        self.dimensions.len()
    }

    /// Total number of elements (1 for a scalar).
    pub fn num_elements(&self) -> u64 {
        self.dimensions.iter().product()
    }

    /// Parse a v1 or v2 dataspace message.
    pub fn parse(data: &[u8], length_size: u8) -> Result<Dataspace, FormatError> {
        ensure_len(data, 0, 4)?;
        let version = data[0];
        let rank = data[1] as usize;
        let header_size = match version {
            1 => 8,
            2 => match data[3] {
                0 | 1 => 4,
                // Null dataspace: no elements at all.
                2 => {
                    return Ok(Dataspace {
                        dimensions: vec![0],
                    })
                }
                t => return Err(FormatError::InvalidDataspaceType(t)),
            },
            v => return Err(FormatError::InvalidDataspaceVersion(v)),
        };

        let mut dimensions = Vec::with_capacity(rank);
        let mut pos = header_size;
        for _ in 0..rank {
            dimensions.push(read_uint(data, pos, length_size)?);
            pos += length_size as usize;
        }
        Ok(Dataspace { dimensions })
    }

    /// Serialize as a v2 dataspace message.
    pub fn serialize(&self, length_size: u8) -> Vec<u8> {
        let mut buf = Vec::with_capacity(4 + self.rank() * length_size as usize);
        buf.push(2);
        buf.push(self.rank() as u8);
        buf.push(0); // no max dimensions
        buf.push(if self.dimensions.is_empty() { 0 } else { 1 });
        for &dim in &self.dimensions {
            write_uint(&mut buf, dim, length_size);
        }
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_roundtrip() {
        let ds = Dataspace::simple(&[3, 4, 10]);
        let parsed = Dataspace::parse(&ds.serialize(8), 8).unwrap();
        assert_eq!(parsed, ds);
        assert_eq!(parsed.num_elements(), 120);
        assert_eq!(parsed.rank(), 3);
    }

    #[test]
    fn scalar_roundtrip() {
        let ds = Dataspace::simple(&[]);
        let bytes = ds.serialize(8);
        assert_eq!(bytes, vec![2, 0, 0, 0]);
        let parsed = Dataspace::parse(&bytes, 8).unwrap();
        assert_eq!(parsed.rank(), 0);
        assert_eq!(parsed.num_elements(), 1);
    }

    #[test]
    fn v1_with_max_dims() {
        let mut buf = vec![1, 1, 0x01, 0, 0, 0, 0, 0];
        buf.extend_from_slice(&7u64.to_le_bytes());
        buf.extend_from_slice(&u64::MAX.to_le_bytes());
        let parsed = Dataspace::parse(&buf, 8).unwrap();
        assert_eq!(parsed.dimensions, vec![7]);
    }

    #[test]
    fn bad_inputs() {
        assert!(Dataspace::parse(&[2], 8).is_err());
        assert!(matches!(
            Dataspace::parse(&[9, 0, 0, 0], 8),
            Err(FormatError::InvalidDataspaceVersion(9))
        ));
        assert!(matches!(
            Dataspace::parse(&[2, 0, 0, 7], 8),
            Err(FormatError::InvalidDataspaceType(7))
        ));
        // rank 2 but only one dimension present
        let mut buf = vec![2, 2, 0, 1];
        buf.extend_from_slice(&5u64.to_le_bytes());
        assert!(matches!(
            Dataspace::parse(&buf, 8),
            Err(FormatError::UnexpectedEof { .. })
        ));
    }
}
