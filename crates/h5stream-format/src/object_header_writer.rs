//! Object header writer for the v2 format.

use crate::checksum::jenkins_lookup3;
use crate::message_type::MessageType;

/// Message flag: the message is constant for the object's lifetime.
pub const MSG_FLAG_CONSTANT: u8 = 0x01;

/// Builds a v2 object header (`OHDR` + messages + checksum).
#[derive(Debug, Default)]
pub struct ObjectHeaderWriter {
    messages: Vec<(MessageType, Vec<u8>, u8)>,
}

impl ObjectHeaderWriter {
    /// Create a new empty object header writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a message with default flags (0).
    pub fn add_message(&mut self, msg_type: MessageType, data: Vec<u8>) {
        self.add_message_with_flags(msg_type, data, 0);
    }

    /// Add a message with specific flags.
    pub fn add_message_with_flags(&mut self, msg_type: MessageType, data: Vec<u8>, flags: u8) {
        self.messages.push((msg_type, data, flags));
    }

    /// Serialized length, without building the buffer.
    pub fn serialized_len(&self) -> usize {
        let body = self.body_len();
        6 + chunk_size_width(body) + body + 4
    }

    fn body_len(&self) -> usize {
        self.messages.iter().map(|(_, data, _)| 4 + data.len()).sum()
    }

    /// Serialize the complete header.
    pub fn serialize(&self) -> Vec<u8> {
        let body = self.body_len();
        let width = chunk_size_width(body);
        let mut buf = Vec::with_capacity(self.serialized_len());

        buf.extend_from_slice(b"OHDR");
        buf.push(2);
        // Flags bits 0-1 encode the chunk0 size field width.
        buf.push(match width {
            1 => 0x00,
            2 => 0x01,
            _ => 0x02,
        });
        match width {
            1 => buf.push(body as u8),
            2 => buf.extend_from_slice(&(body as u16).to_le_bytes()),
            _ => buf.extend_from_slice(&(body as u32).to_le_bytes()),
        }

        for (msg_type, data, flags) in &self.messages {
            buf.push(msg_type.to_u16() as u8);
            buf.extend_from_slice(&(data.len() as u16).to_le_bytes());
            buf.push(*flags);
            buf.extend_from_slice(data);
        }

        let checksum = jenkins_lookup3(&buf);
        buf.extend_from_slice(&checksum.to_le_bytes());
        buf
    }
}

fn chunk_size_width(body: usize) -> usize {
    if body <= 0xFF {
        1
    } else if body <= 0xFFFF {
        2
    } else {
        4
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object_header::ObjectHeader;

    #[test]
    fn empty_header_roundtrip() {
        let writer = ObjectHeaderWriter::new();
        let bytes = writer.serialize();
        assert_eq!(bytes.len(), writer.serialized_len());
        let hdr = ObjectHeader::parse(&bytes, 0, 8, 8).unwrap();
        assert_eq!(hdr.version, 2);
        assert!(hdr.messages.is_empty());
    }

    #[test]
    fn two_messages_roundtrip() {
        let mut writer = ObjectHeaderWriter::new();
        writer.add_message(MessageType::Dataspace, vec![1, 2, 3, 4]);
        writer.add_message_with_flags(MessageType::Datatype, vec![5, 6], MSG_FLAG_CONSTANT);
        let bytes = writer.serialize();
        let hdr = ObjectHeader::parse(&bytes, 0, 8, 8).unwrap();
        assert_eq!(hdr.messages.len(), 2);
        assert_eq!(hdr.messages[0].msg_type, MessageType::Dataspace);
        assert_eq!(hdr.messages[0].data, vec![1, 2, 3, 4]);
        assert_eq!(hdr.messages[1].flags, MSG_FLAG_CONSTANT);
        assert_eq!(hdr.messages[1].data, vec![5, 6]);
    }

    #[test]
    fn wide_chunk_size_fields() {
        for payload in [300usize, 70_000] {
            let mut writer = ObjectHeaderWriter::new();
            // Split across messages: a single message length is a u16.
            for _ in 0..(payload / 1000).max(1) {
                writer.add_message(MessageType::Link, vec![0xAA; payload.min(1000)]);
            }
            let bytes = writer.serialize();
            assert_eq!(bytes.len(), writer.serialized_len());
            let hdr = ObjectHeader::parse(&bytes, 0, 8, 8).unwrap();
            assert_eq!(hdr.messages.len(), (payload / 1000).max(1));
        }
    }
}
