//! HDF5 object header message type identifiers.

/// Header message types this crate reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Nil,
    Dataspace,
    LinkInfo,
    Datatype,
    FillValue,
    Link,
    DataLayout,
    GroupInfo,
    ObjectHeaderContinuation,
    /// Any other message type, with its raw type ID.
    Unknown(u16),
}

impl MessageType {
    /// Convert a raw type ID to a `MessageType`.
    pub fn from_u16(val: u16) -> MessageType {
        match val {
            0x0000 => MessageType::Nil,
            0x0001 => MessageType::Dataspace,
            0x0002 => MessageType::LinkInfo,
            0x0003 => MessageType::Datatype,
            0x0005 => MessageType::FillValue,
            0x0006 => MessageType::Link,
            0x0008 => MessageType::DataLayout,
            0x000A => MessageType::GroupInfo,
            0x0010 => MessageType::ObjectHeaderContinuation,
            other => MessageType::Unknown(other),
        }
    }

    /// Convert back to the raw type ID.
    pub fn to_u16(self) -> u16 {
        match self {
            MessageType::Nil => 0x0000,
            MessageType::Dataspace => 0x0001,
            MessageType::LinkInfo => 0x0002,
            MessageType::Datatype => 0x0003,
            MessageType::FillValue => 0x0005,
            MessageType::Link => 0x0006,
            MessageType::DataLayout => 0x0008,
            MessageType::GroupInfo => 0x000A,
            MessageType::ObjectHeaderContinuation => 0x0010,
            MessageType::Unknown(v) => v,
        }
    }
}
