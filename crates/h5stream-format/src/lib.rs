//! Minimal pure-Rust HDF5 writer and reader.
//!
//! This crate implements just enough of the HDF5 binary format to create a
//! file, build a group hierarchy, pre-allocate contiguous numeric datasets and
//! write hyperslabs into them in place. Files use a v3 superblock and v2
//! object headers with compact link storage, so they open with the HDF5 C
//! library, h5py and friends.
//!
//! [`H5File`] is the writable handle; [`H5Reader`] reopens a finished file
//! read-only for verification.

pub mod checksum;
pub mod data_layout;
pub mod dataspace;
pub mod datatype;
pub mod error;
pub mod file;
pub mod link_message;
pub mod message_type;
pub mod object_header;
pub mod object_header_writer;
pub mod reader;
pub mod selection;
pub mod signature;
pub mod superblock;

mod util;

pub use datatype::ElementType;
pub use error::FormatError;
pub use file::{DatasetId, GroupId, H5File};
pub use reader::{DatasetData, H5Reader};
pub use selection::Selection;
