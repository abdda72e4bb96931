//! HDF5 Link message (message type 0x0006), hard links only.
//!
//! Flags byte: bits 0-1 give the width of the name length field, bit 2 marks a
//! creation order field, bit 3 a link type field, bit 4 a character set field.

use crate::error::FormatError;
use crate::util::{ensure_len, read_uint, write_uint};

const FLAG_CREATION_ORDER: u8 = 0x04;
const FLAG_LINK_TYPE: u8 = 0x08;
const FLAG_CHARSET: u8 = 0x10;

/// A hard link from a group to an object header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkMessage {
    /// Name of this link within its group.
    pub name: String,
    /// Address of the target object header.
    pub address: u64,
}

impl LinkMessage {
    /// Create a hard link.
    pub fn hard(name: &str, address: u64) -> Self {
        Self {
            name: name.to_string(),
            address,
        }
    }

    /// Serialize to message bytes.
    pub fn serialize(&self, offset_size: u8) -> Vec<u8> {
        let name = self.name.as_bytes();
        let (size_bits, width) = match name.len() {
            0..=0xFF => (0u8, 1u8),
            0x100..=0xFFFF => (1, 2),
            _ => (2, 4),
        };
        let utf8 = !self.name.is_ascii();

        let mut buf = Vec::with_capacity(4 + name.len() + offset_size as usize);
        buf.push(1);
        buf.push(size_bits | if utf8 { FLAG_CHARSET } else { 0 });
        if utf8 {
            buf.push(1);
        }
        write_uint(&mut buf, name.len() as u64, width);
        buf.extend_from_slice(name);
        write_uint(&mut buf, self.address, offset_size);
        buf
    }

    /// Parse a Link message. Soft and external links are rejected.
    pub fn parse(data: &[u8], offset_size: u8) -> Result<LinkMessage, FormatError> {
        ensure_len(data, 0, 2)?;
        let version = data[0];
        if version != 1 {
            return Err(FormatError::InvalidLinkVersion(version));
        }
        let flags = data[1];
        let mut pos = 2;

        if flags & FLAG_LINK_TYPE != 0 {
            ensure_len(data, pos, 1)?;
            let link_type = data[pos];
            if link_type != 0 {
                return Err(FormatError::UnsupportedLinkType(link_type));
            }
            pos += 1;
        }
        if flags & FLAG_CREATION_ORDER != 0 {
            pos += 8;
        }
        if flags & FLAG_CHARSET != 0 {
            pos += 1;
        }

        let width = 1u8 << (flags & 0x03);
        let name_len = read_uint(data, pos, width)? as usize;
        pos += width as usize;
        ensure_len(data, pos, name_len)?;
        let name = String::from_utf8_lossy(&data[pos..pos + name_len]).into_owned();
        pos += name_len;

        let address = read_uint(data, pos, offset_size)?;
        Ok(LinkMessage { name, address })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_roundtrip() {
        let lm = LinkMessage::hard("velocity", 0x1234);
        let bytes = lm.serialize(8);
        assert_eq!(bytes[1], 0x00);
        assert_eq!(LinkMessage::parse(&bytes, 8).unwrap(), lm);
    }

    #[test]
    fn utf8_name_sets_charset() {
        let lm = LinkMessage::hard("température", 96);
        let bytes = lm.serialize(8);
        assert_eq!(bytes[1] & FLAG_CHARSET, FLAG_CHARSET);
        assert_eq!(LinkMessage::parse(&bytes, 8).unwrap(), lm);
    }

    #[test]
    fn long_name_uses_two_byte_length() {
        let name = "n".repeat(300);
        let lm = LinkMessage::hard(&name, 7);
        let bytes = lm.serialize(8);
        assert_eq!(bytes[1] & 0x03, 1);
        assert_eq!(LinkMessage::parse(&bytes, 8).unwrap().name, name);
    }

    #[test]
    fn creation_order_field_skipped() {
        let mut bytes = vec![1, FLAG_CREATION_ORDER];
        bytes.extend_from_slice(&5u64.to_le_bytes());
        bytes.push(1);
        bytes.push(b'x');
        bytes.extend_from_slice(&800u64.to_le_bytes());
        let lm = LinkMessage::parse(&bytes, 8).unwrap();
        assert_eq!(lm, LinkMessage::hard("x", 800));
    }

    #[test]
    fn soft_link_rejected() {
        let bytes = vec![1, FLAG_LINK_TYPE, 1, 1, b's', 0, 0];
        assert!(matches!(
            LinkMessage::parse(&bytes, 8),
            Err(FormatError::UnsupportedLinkType(1))
        ));
        assert!(matches!(
            LinkMessage::parse(&[2, 0], 8),
            Err(FormatError::InvalidLinkVersion(2))
        ));
    }
}
