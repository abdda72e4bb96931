//! HDF5 file signature (magic bytes) detection.

use crate::error::FormatError;

/// The 8-byte HDF5 magic signature.
pub const HDF5_SIGNATURE: [u8; 8] = [0x89, b'H', b'D', b'F', b'\r', b'\n', 0x1A, b'\n'];

/// Locate the superblock signature.
///
/// It may sit at offset 0 or at any power of two from 512 upward (files with
/// a user block).
pub fn find_signature(data: &[u8]) -> Result<usize, FormatError> {
    let matches_at = |offset: usize| {
        data.get(offset..offset + HDF5_SIGNATURE.len()) == Some(&HDF5_SIGNATURE[..])
    };
    if matches_at(0) {
        return Ok(0);
    }
    let mut offset = 512;
    while offset + HDF5_SIGNATURE.len() <= data.len() {
        if matches_at(offset) {
            return Ok(offset);
        }
        offset *= 2;
    }
    Err(FormatError::SignatureNotFound)
}
