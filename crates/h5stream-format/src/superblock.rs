//! HDF5 superblock, versions 2 and 3.
//!
//! Layout (offsets of 8 bytes):
//!
//! ```text
//! signature(8) version(1) offset_size(1) length_size(1) flags(1)
//! base_address(8) extension_address(8) eof_address(8) root_group_address(8)
//! checksum(4)
//! ```

use crate::checksum::jenkins_lookup3;
use crate::error::FormatError;
use crate::signature::HDF5_SIGNATURE;
use crate::util::{ensure_len, read_uint, write_uint, UNDEFINED_ADDRESS};

/// Serialized size of a v2/v3 superblock with 8-byte offsets.
pub const SUPERBLOCK_SIZE: usize = 48;

/// Parsed v2/v3 superblock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Superblock {
    /// Superblock version (2 or 3).
    pub version: u8,
    /// Size of offsets in bytes (2, 4, or 8).
    pub offset_size: u8,
    /// Size of lengths in bytes (2, 4, or 8).
    pub length_size: u8,
    /// File consistency flags.
    pub consistency_flags: u8,
    /// File base address.
    pub base_address: u64,
    /// Superblock extension address (`u64::MAX` when absent).
    pub extension_address: u64,
    /// End-of-file address.
    pub eof_address: u64,
    /// Root group object header address.
    pub root_group_address: u64,
}

impl Superblock {
    /// A v3 superblock with 8-byte offsets and lengths.
    pub fn new(root_group_address: u64, eof_address: u64) -> Self {
        Self {
            version: 3,
            offset_size: 8,
            length_size: 8,
            consistency_flags: 0,
            base_address: 0,
            extension_address: UNDEFINED_ADDRESS,
            eof_address,
            root_group_address,
        }
    }

    /// Parse a superblock whose signature starts at `signature_offset`.
    pub fn parse(data: &[u8], signature_offset: usize) -> Result<Superblock, FormatError> {
        let d = data.get(signature_offset..).unwrap_or(&[]);
        ensure_len(d, 0, 12)?;
        if d[..8] != HDF5_SIGNATURE {
            return Err(FormatError::SignatureNotFound);
        }

        let version = d[8];
        if !matches!(version, 2 | 3) {
            return Err(FormatError::UnsupportedVersion(version));
        }
        let offset_size = d[9];
        let length_size = d[10];
        for size in [offset_size, length_size] {
            if !matches!(size, 2 | 4 | 8) {
                return Err(FormatError::InvalidOffsetSize(size));
            }
        }
        let consistency_flags = d[11];

        let os = offset_size as usize;
        let body_len = 12 + 4 * os;
        ensure_len(d, 0, body_len + 4)?;

        let stored = read_uint(d, body_len, 4)? as u32;
        let computed = jenkins_lookup3(&d[..body_len]);
        if stored != computed {
            return Err(FormatError::ChecksumMismatch {
                expected: stored,
                computed,
            });
        }

        Ok(Superblock {
            version,
            offset_size,
            length_size,
            consistency_flags,
            base_address: read_uint(d, 12, offset_size)?,
            extension_address: read_uint(d, 12 + os, offset_size)?,
            eof_address: read_uint(d, 12 + 2 * os, offset_size)?,
            root_group_address: read_uint(d, 12 + 3 * os, offset_size)?,
        })
    }

    /// Serialize, appending the checksum.
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(12 + 4 * self.offset_size as usize + 4);
        buf.extend_from_slice(&HDF5_SIGNATURE);
        buf.push(self.version);
        buf.push(self.offset_size);
        buf.push(self.length_size);
        buf.push(self.consistency_flags);
        for addr in [
            self.base_address,
            self.extension_address,
            self.eof_address,
            self.root_group_address,
        ] {
            write_uint(&mut buf, addr, self.offset_size);
        }
        let checksum = jenkins_lookup3(&buf);
        buf.extend_from_slice(&checksum.to_le_bytes());
        buf
    }
}
