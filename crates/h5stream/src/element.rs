//! Numeric element types a frame may hold.

use h5stream_format::ElementType;

mod sealed {
    pub trait Sealed {}
}

/// A primitive numeric type with a fixed HDF5 element type.
///
/// Implemented for `i8`..`i64`, `u8`..`u64`, `f32` and `f64`.
pub trait Element: Copy + sealed::Sealed {
    /// The stored element type.
    const TYPE: ElementType;

    /// Append the little-endian encoding of `self`.
    fn write_le(self, out: &mut Vec<u8>);
}

macro_rules! impl_element {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl sealed::Sealed for $ty {}

            impl Element for $ty {
                const TYPE: ElementType = ElementType::$variant;

                fn write_le(self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_le_bytes());
                }
            }
        )*
    };
}

impl_element! {
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_little_endian() {
        let mut out = Vec::new();
        0x0102i16.write_le(&mut out);
        1.0f32.write_le(&mut out);
        assert_eq!(out, vec![0x02, 0x01, 0x00, 0x00, 0x80, 0x3f]);
        assert_eq!(<u32 as Element>::TYPE, ElementType::U32);
        assert_eq!(<f64 as Element>::TYPE.size(), 8);
    }
}
