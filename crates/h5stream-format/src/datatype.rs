//! HDF5 Datatype message (message type 0x0003), numeric subset.
//!
//! Only little-endian integers (class 0) and IEEE 754 floats (class 1) are
//! written or understood.

use std::fmt;

use crate::error::FormatError;
use crate::util::{ensure_len, read_uint};

/// Numeric element types storable in a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
}

impl ElementType {
    /// Size of one element in bytes.
    pub fn size(self) -> usize {
        match self {
            ElementType::I8 | ElementType::U8 => 1,
            ElementType::I16 | ElementType::U16 => 2,
            ElementType::I32 | ElementType::U32 | ElementType::F32 => 4,
            ElementType::I64 | ElementType::U64 | ElementType::F64 => 8,
        }
    }

    /// Whether this is a floating-point type.
    pub fn is_float(self) -> bool {
        matches!(self, ElementType::F32 | ElementType::F64)
    }

    /// Whether this is a signed integer type.
    pub fn is_signed_int(self) -> bool {
        matches!(
            self,
            ElementType::I8 | ElementType::I16 | ElementType::I32 | ElementType::I64
        )
    }

    /// Serialize as a version 1 datatype message.
    pub fn serialize(self) -> Vec<u8> {
        let size = self.size() as u32;
        let bits = (size * 8) as u16;
        let mut buf = Vec::with_capacity(20);
        match self {
            ElementType::F32 | ElementType::F64 => {
                let (exp_loc, exp_size, mant_size, bias) = if self == ElementType::F64 {
                    (52u8, 11u8, 52u8, 1023u32)
                } else {
                    (23, 8, 23, 127)
                };
                // bits 4-5: mantissa normalization "implied MSB"; byte 2: sign bit position
                buf.extend_from_slice(&[0x11, 0x20, (bits - 1) as u8, 0]);
                buf.extend_from_slice(&size.to_le_bytes());
                buf.extend_from_slice(&0u16.to_le_bytes());
                buf.extend_from_slice(&bits.to_le_bytes());
                buf.extend_from_slice(&[exp_loc, exp_size, 0, mant_size]);
                buf.extend_from_slice(&bias.to_le_bytes());
            }
            _ => {
                let signed = if self.is_signed_int() { 0x08 } else { 0x00 };
                buf.extend_from_slice(&[0x10, signed, 0, 0]);
                buf.extend_from_slice(&size.to_le_bytes());
                buf.extend_from_slice(&0u16.to_le_bytes());
                buf.extend_from_slice(&bits.to_le_bytes());
            }
        }
        buf
    }

    /// Parse a datatype message.
    pub fn parse(data: &[u8]) -> Result<ElementType, FormatError> {
        ensure_len(data, 0, 8)?;
        let class = data[0] & 0x0F;
        let bf0 = data[1];
        let size = read_uint(data, 4, 4)?;

        match class {
            0 => {
                ensure_len(data, 8, 4)?;
                if bf0 & 0x01 != 0 {
                    return Err(FormatError::UnsupportedDatatype(
                        "big-endian integer".to_string(),
                    ));
                }
                let signed = bf0 & 0x08 != 0;
                match (size, signed) {
                    (1, true) => Ok(ElementType::I8),
                    (2, true) => Ok(ElementType::I16),
                    (4, true) => Ok(ElementType::I32),
                    (8, true) => Ok(ElementType::I64),
                    (1, false) => Ok(ElementType::U8),
                    (2, false) => Ok(ElementType::U16),
                    (4, false) => Ok(ElementType::U32),
                    (8, false) => Ok(ElementType::U64),
                    _ => Err(FormatError::UnsupportedDatatype(format!(
                        "{size}-byte integer"
                    ))),
                }
            }
            1 => {
                ensure_len(data, 8, 12)?;
                if bf0 & 0x41 != 0 {
                    return Err(FormatError::UnsupportedDatatype(
                        "non little-endian float".to_string(),
                    ));
                }
                match size {
                    4 => Ok(ElementType::F32),
                    8 => Ok(ElementType::F64),
                    _ => Err(FormatError::UnsupportedDatatype(format!(
                        "{size}-byte float"
                    ))),
                }
            }
            2..=10 => Err(FormatError::UnsupportedDatatype(format!("class {class}"))),
            _ => Err(FormatError::InvalidDatatypeClass(class)),
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ElementType::I8 => "i8",
            ElementType::I16 => "i16",
            ElementType::I32 => "i32",
            ElementType::I64 => "i64",
            ElementType::U8 => "u8",
            ElementType::U16 => "u16",
            ElementType::U32 => "u32",
            ElementType::U64 => "u64",
            ElementType::F32 => "f32",
            ElementType::F64 => "f64",
        };
        f.write_str(name)
    }
}
