//! Error types for HDF5 format encoding, decoding and file I/O.

use std::fmt;
use std::io;

use crate::datatype::ElementType;
use crate::message_type::MessageType;

/// Errors raised while writing or reading HDF5 structures.
#[derive(Debug)]
pub enum FormatError {
    /// I/O error from the underlying file.
    Io(io::Error),
    /// The HDF5 magic signature was not found at any valid offset.
    SignatureNotFound,
    /// The superblock version is not supported.
    UnsupportedVersion(u8),
    /// Unexpected end of data.
    UnexpectedEof {
        /// Number of bytes expected.
        expected: usize,
        /// Number of bytes actually available.
        available: usize,
    },
    /// Invalid offset or length size (must be 2, 4, or 8).
    InvalidOffsetSize(u8),
    /// Invalid object header signature.
    InvalidObjectHeaderSignature,
    /// Invalid object header version.
    InvalidObjectHeaderVersion(u8),
    /// Unknown message type that is marked as must-understand.
    UnsupportedMessage(u16),
    /// Jenkins lookup3 checksum mismatch.
    ChecksumMismatch {
        /// The checksum stored in the file.
        expected: u32,
        /// The checksum we computed.
        computed: u32,
    },
    /// Unsupported dataspace message version.
    InvalidDataspaceVersion(u8),
    /// Unknown dataspace type byte.
    InvalidDataspaceType(u8),
    /// Unknown datatype class.
    InvalidDatatypeClass(u8),
    /// A datatype this crate cannot map to a numeric element type.
    UnsupportedDatatype(String),
    /// Unsupported link message version.
    InvalidLinkVersion(u8),
    /// Soft and external links are not followed.
    UnsupportedLinkType(u8),
    /// Unsupported data layout message version.
    InvalidLayoutVersion(u8),
    /// Only contiguous layouts are supported.
    UnsupportedLayout(u8),
    /// A required header message was not found.
    MissingMessage(MessageType),
    /// Object names must be non-empty and must not contain `/`.
    InvalidName(String),
    /// A link with this name already exists in the parent group.
    NameExists(String),
    /// No object at the given path.
    NotFound(String),
    /// The object exists but is not a group.
    NotAGroup(String),
    /// The object exists but is not a dataset.
    NotADataset(String),
    /// A group or dataset id that does not belong to this file.
    InvalidHandle(usize),
    /// Selection rank does not match the dataset rank.
    SelectionRankMismatch {
        /// Dataset rank.
        expected: usize,
        /// Selection rank.
        got: usize,
    },
    /// Selection extends past the dataset extent.
    SelectionOutOfBounds {
        /// Offending axis.
        axis: usize,
        /// One past the last selected index on that axis.
        end: u64,
        /// Dataset extent on that axis.
        extent: u64,
    },
    /// Write buffer length does not match the selection size.
    BufferSizeMismatch {
        /// Bytes required by the selection.
        expected: usize,
        /// Bytes supplied.
        got: usize,
    },
    /// Dataset byte size overflows a 64-bit length.
    DatasetTooLarge(String),
    /// Growing the file would run past the 64-bit address space.
    AddressOverflow,
    /// Typed read requested a different element type than stored.
    TypeMismatch {
        /// The type that was requested.
        expected: ElementType,
        /// The stored type.
        actual: ElementType,
    },
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::Io(e) => write!(f, "I/O error: {e}"),
            FormatError::SignatureNotFound => {
                write!(f, "HDF5 signature not found at any valid offset")
            }
            FormatError::UnsupportedVersion(v) => {
                write!(f, "unsupported superblock version: {v}")
            }
            FormatError::UnexpectedEof {
                expected,
                available,
            } => {
                write!(f, "unexpected EOF: need {expected} bytes, have {available}")
            }
            FormatError::InvalidOffsetSize(s) => {
                write!(f, "invalid offset size: {s} (must be 2, 4, or 8)")
            }
            FormatError::InvalidObjectHeaderSignature => {
                write!(f, "invalid object header signature")
            }
            FormatError::InvalidObjectHeaderVersion(v) => {
                write!(f, "invalid object header version: {v}")
            }
            FormatError::UnsupportedMessage(id) => {
                write!(
                    f,
                    "unsupported message type {id:#06x} marked as must-understand"
                )
            }
            FormatError::ChecksumMismatch { expected, computed } => {
                write!(
                    f,
                    "checksum mismatch: expected {expected:#010x}, computed {computed:#010x}"
                )
            }
            FormatError::InvalidDataspaceVersion(v) => {
                write!(f, "invalid dataspace version: {v}")
            }
            FormatError::InvalidDataspaceType(t) => write!(f, "invalid dataspace type: {t}"),
            FormatError::InvalidDatatypeClass(c) => write!(f, "invalid datatype class: {c}"),
            FormatError::UnsupportedDatatype(desc) => {
                write!(f, "unsupported datatype: {desc}")
            }
            FormatError::InvalidLinkVersion(v) => write!(f, "invalid link message version: {v}"),
            FormatError::UnsupportedLinkType(t) => write!(f, "unsupported link type: {t}"),
            FormatError::InvalidLayoutVersion(v) => {
                write!(f, "invalid data layout version: {v}")
            }
            FormatError::UnsupportedLayout(class) => {
                write!(f, "unsupported data layout class: {class}")
            }
            FormatError::MissingMessage(mt) => write!(f, "missing required message: {mt:?}"),
            FormatError::InvalidName(name) => write!(f, "invalid object name: {name:?}"),
            FormatError::NameExists(name) => write!(f, "name already exists: {name}"),
            FormatError::NotFound(path) => write!(f, "object not found: {path}"),
            FormatError::NotAGroup(path) => write!(f, "not a group: {path}"),
            FormatError::NotADataset(path) => write!(f, "not a dataset: {path}"),
            FormatError::InvalidHandle(id) => write!(f, "invalid object handle: {id}"),
            FormatError::SelectionRankMismatch { expected, got } => {
                write!(f, "selection rank {got} does not match dataset rank {expected}")
            }
            FormatError::SelectionOutOfBounds { axis, end, extent } => {
                write!(
                    f,
                    "selection out of bounds on axis {axis}: end {end} exceeds extent {extent}"
                )
            }
            FormatError::BufferSizeMismatch { expected, got } => {
                write!(f, "buffer size mismatch: selection needs {expected} bytes, got {got}")
            }
            FormatError::DatasetTooLarge(name) => {
                write!(f, "dataset {name} is too large to allocate")
            }
            FormatError::AddressOverflow => write!(f, "file address space exhausted"),
            FormatError::TypeMismatch { expected, actual } => {
                write!(f, "type mismatch: requested {expected}, dataset stores {actual}")
            }
        }
    }
}

impl std::error::Error for FormatError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FormatError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for FormatError {
    fn from(e: io::Error) -> Self {
        FormatError::Io(e)
    }
}
