//! HDF5 v2 object header parsing.

use crate::checksum::jenkins_lookup3;
use crate::error::FormatError;
use crate::message_type::MessageType;
use crate::util::{ensure_len, read_uint};

const OHDR_SIGNATURE: [u8; 4] = *b"OHDR";
const OCHK_SIGNATURE: [u8; 4] = *b"OCHK";

/// A single parsed header message.
#[derive(Debug, Clone)]
pub struct HeaderMessage {
    /// The message type.
    pub msg_type: MessageType,
    /// Message flags byte.
    pub flags: u8,
    /// Raw message data bytes.
    pub data: Vec<u8>,
}

/// Parsed v2 object header.
#[derive(Debug, Clone)]
pub struct ObjectHeader {
    /// Header version (always 2).
    pub version: u8,
    /// Object header flags.
    pub flags: u8,
    /// All non-NIL messages from every chunk, in file order.
    pub messages: Vec<HeaderMessage>,
}

impl ObjectHeader {
    /// Parse an object header at `offset`.
    ///
    /// `offset_size` and `length_size` come from the superblock and are used to
    /// decode continuation messages.
    pub fn parse(
        data: &[u8],
        offset: usize,
        offset_size: u8,
        length_size: u8,
    ) -> Result<ObjectHeader, FormatError> {
        ensure_len(data, offset, 6)?;
        if data[offset..offset + 4] != OHDR_SIGNATURE {
            return Err(FormatError::InvalidObjectHeaderSignature);
        }
        let version = data[offset + 4];
        if version != 2 {
            return Err(FormatError::InvalidObjectHeaderVersion(version));
        }
        let flags = data[offset + 5];
        let mut pos = offset + 6;

        // Timestamps (bit 5) and attribute phase change values (bit 4).
        if flags & 0x20 != 0 {
            pos += 16;
        }
        if flags & 0x10 != 0 {
            pos += 4;
        }

        let width = 1u8 << (flags & 0x03);
        let chunk0_size = read_uint(data, pos, width)? as usize;
        pos += width as usize;

        let msg_end = pos + chunk0_size;
        verify_checksum(data, offset, msg_end)?;

        let has_creation_order = flags & 0x04 != 0;
        let mut messages = Vec::new();
        let mut continuations = Vec::new();
        parse_messages(
            data,
            pos,
            msg_end,
            has_creation_order,
            (offset_size, length_size),
            &mut messages,
            &mut continuations,
        )?;

        while let Some((cont_offset, cont_length)) = continuations.pop() {
            ensure_len(data, cont_offset, cont_length)?;
            if cont_length < 8 || data[cont_offset..cont_offset + 4] != OCHK_SIGNATURE {
                return Err(FormatError::InvalidObjectHeaderSignature);
            }
            let end = cont_offset + cont_length - 4;
            verify_checksum(data, cont_offset, end)?;
            parse_messages(
                data,
                cont_offset + 4,
                end,
                has_creation_order,
                (offset_size, length_size),
                &mut messages,
                &mut continuations,
            )?;
        }

        Ok(ObjectHeader {
            version,
            flags,
            messages,
        })
    }

    /// First message of the given type.
    pub fn find(&self, msg_type: MessageType) -> Option<&HeaderMessage> {
        self.messages.iter().find(|m| m.msg_type == msg_type)
    }

    /// First message of the given type, or `MissingMessage`.
    pub fn require(&self, msg_type: MessageType) -> Result<&HeaderMessage, FormatError> {
        self.find(msg_type)
            .ok_or(FormatError::MissingMessage(msg_type))
    }

    /// All messages of the given type.
    pub fn all(&self, msg_type: MessageType) -> impl Iterator<Item = &HeaderMessage> {
        self.messages.iter().filter(move |m| m.msg_type == msg_type)
    }
}

fn verify_checksum(data: &[u8], start: usize, end: usize) -> Result<(), FormatError> {
    ensure_len(data, end, 4)?;
    let stored = read_uint(data, end, 4)? as u32;
    let computed = jenkins_lookup3(&data[start..end]);
    if stored != computed {
        return Err(FormatError::ChecksumMismatch {
            expected: stored,
            computed,
        });
    }
    Ok(())
}

fn parse_messages(
    data: &[u8],
    start: usize,
    end: usize,
    has_creation_order: bool,
    (offset_size, length_size): (u8, u8),
    messages: &mut Vec<HeaderMessage>,
    continuations: &mut Vec<(usize, usize)>,
) -> Result<(), FormatError> {
    let msg_header_size = if has_creation_order { 6 } else { 4 };
    let mut pos = start;

    while pos + msg_header_size <= end {
        let msg_type = MessageType::from_u16(data[pos] as u16);
        let size = read_uint(data, pos + 1, 2)? as usize;
        let flags = data[pos + 3];
        pos += msg_header_size;

        if pos + size > end {
            // Trailing gap too small to hold a message.
            break;
        }

        if let MessageType::Unknown(id) = msg_type {
            if flags & 0x08 != 0 {
                return Err(FormatError::UnsupportedMessage(id));
            }
        }

        let body = &data[pos..pos + size];
        match msg_type {
            MessageType::Nil => {}
            MessageType::ObjectHeaderContinuation => {
                let cont_offset = read_uint(body, 0, offset_size)? as usize;
                let cont_length = read_uint(body, offset_size as usize, length_size)? as usize;
                continuations.push((cont_offset, cont_length));
            }
            _ => messages.push(HeaderMessage {
                msg_type,
                flags,
                data: body.to_vec(),
            }),
        }
        pos += size;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object_header_writer::ObjectHeaderWriter;

    #[test]
    fn parses_at_offset() {
        let mut w = ObjectHeaderWriter::new();
        w.add_message(MessageType::GroupInfo, vec![0, 0]);
        let mut data = vec![0xEEu8; 100];
        data.extend_from_slice(&w.serialize());
        let hdr = ObjectHeader::parse(&data, 100, 8, 8).unwrap();
        assert!(hdr.find(MessageType::GroupInfo).is_some());
        assert!(hdr.find(MessageType::Link).is_none());
        assert!(matches!(
            hdr.require(MessageType::DataLayout),
            Err(FormatError::MissingMessage(MessageType::DataLayout))
        ));
    }

    #[test]
    fn corrupted_message_fails_checksum() {
        let mut w = ObjectHeaderWriter::new();
        w.add_message(MessageType::Link, b"payload".to_vec());
        let mut bytes = w.serialize();
        bytes[12] ^= 0x55;
        assert!(matches!(
            ObjectHeader::parse(&bytes, 0, 8, 8),
            Err(FormatError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn nil_messages_skipped() {
        let mut w = ObjectHeaderWriter::new();
        w.add_message(MessageType::Nil, vec![0; 6]);
        w.add_message(MessageType::Dataspace, vec![2, 0, 0, 0]);
        let hdr = ObjectHeader::parse(&w.serialize(), 0, 8, 8).unwrap();
        assert_eq!(hdr.messages.len(), 1);
    }

    #[test]
    fn must_understand_unknown_rejected() {
        let mut w = ObjectHeaderWriter::new();
        w.add_message_with_flags(MessageType::Unknown(0x30), vec![1], 0x08);
        assert!(matches!(
            ObjectHeader::parse(&w.serialize(), 0, 8, 8),
            Err(FormatError::UnsupportedMessage(0x30))
        ));
    }

    #[test]
    fn rejects_v1_and_garbage() {
        assert!(matches!(
            ObjectHeader::parse(&[1, 0, 0, 0, 0, 0, 0, 0], 0, 8, 8),
            Err(FormatError::InvalidObjectHeaderSignature)
        ));
        assert!(matches!(
            ObjectHeader::parse(b"OHDR\x03\x00\x00", 0, 8, 8),
            Err(FormatError::InvalidObjectHeaderVersion(3))
        ));
        assert!(ObjectHeader::parse(b"OHDR\x02\x00", 0, 8, 8).is_err());
    }
}
