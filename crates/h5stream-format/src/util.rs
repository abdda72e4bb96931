use byteorder::{ByteOrder, LittleEndian};

use crate::error::FormatError;

/// Undefined address marker (all bits set).
pub(crate) const UNDEFINED_ADDRESS: u64 = u64::MAX;

pub(crate) fn ensure_len(data: &[u8], pos: usize, needed: usize) -> Result<(), FormatError> {
    if pos.saturating_add(needed) > data.len() {
        Err(FormatError::UnexpectedEof {
            expected: pos.saturating_add(needed),
            available: data.len(),
        })
    } else {
        Ok(())
    }
}

/// Read a little-endian unsigned integer of `size` bytes at `pos`.
pub(crate) fn read_uint(data: &[u8], pos: usize, size: u8) -> Result<u64, FormatError> {
    ensure_len(data, pos, size as usize)?;
    let slice = &data[pos..pos + size as usize];
    Ok(match size {
        1 => slice[0] as u64,
        2 => LittleEndian::read_u16(slice) as u64,
        4 => LittleEndian::read_u32(slice) as u64,
        8 => LittleEndian::read_u64(slice),
        _ => return Err(FormatError::InvalidOffsetSize(size)),
    })
}

/// Append `val` as a little-endian unsigned integer of `size` bytes.
pub(crate) fn write_uint(buf: &mut Vec<u8>, val: u64, size: u8) {
    match size {
        1 => buf.push(val as u8),
        2 => buf.extend_from_slice(&(val as u16).to_le_bytes()),
        4 => buf.extend_from_slice(&(val as u32).to_le_bytes()),
        _ => buf.extend_from_slice(&val.to_le_bytes()),
    }
}
