//! HDF5 Data Layout message (message type 0x0008), contiguous class only.

use crate::error::FormatError;
use crate::util::{ensure_len, read_uint, write_uint, UNDEFINED_ADDRESS};

const CLASS_CONTIGUOUS: u8 = 1;

/// Contiguous storage: all raw data in one extent of the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContiguousLayout {
    /// File address of the data, or `None` if never allocated.
    pub address: Option<u64>,
    /// Size of the data in bytes.
    pub size: u64,
}

impl ContiguousLayout {
    /// Parse a version 3 or 4 layout message.
    pub fn parse(
        data: &[u8],
        offset_size: u8,
        length_size: u8,
    ) -> Result<ContiguousLayout, FormatError> {
        ensure_len(data, 0, 2)?;
        let version = data[0];
        if !matches!(version, 3 | 4) {
            return Err(FormatError::InvalidLayoutVersion(version));
        }
        let class = data[1];
        if class != CLASS_CONTIGUOUS {
            return Err(FormatError::UnsupportedLayout(class));
        }
        let raw_address = read_uint(data, 2, offset_size)?;
        let size = read_uint(data, 2 + offset_size as usize, length_size)?;
        let undefined = raw_address == UNDEFINED_ADDRESS >> (64 - 8 * offset_size as u32);
        Ok(ContiguousLayout {
            address: (!undefined).then_some(raw_address),
            size,
        })
    }

    /// Serialize as a version 3 layout message.
    pub fn serialize(&self, offset_size: u8, length_size: u8) -> Vec<u8> {
        let mut buf = Vec::with_capacity(2 + (offset_size + length_size) as usize);
        buf.push(3);
        buf.push(CLASS_CONTIGUOUS);
        write_uint(
            &mut buf,
            self.address.unwrap_or(UNDEFINED_ADDRESS),
            offset_size,
        );
        write_uint(&mut buf, self.size, length_size);
        buf
    }
}
