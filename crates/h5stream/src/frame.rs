//! Frames: the unit of data written by one append.
//!
//! A frame is a scalar, a vector or a matrix of one [`Element`] type.
//! Scalars are the element types themselves; vectors are slices, `Vec`s and
//! arrays; matrices are sequences of equal-length rows.

use std::fmt;

use h5stream_format::ElementType;

use crate::element::Element;
use crate::error::{Error, Result};

/// Shape of a single frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameShape {
    Scalar,
    Vector(usize),
    /// Rows, columns.
    Matrix(usize, usize),
}

impl FrameShape {
    /// Number of axes: 0, 1 or 2.
    pub fn rank(self) -> usize {
        match self {
            FrameShape::Scalar => 0,
            FrameShape::Vector(_) => 1,
            FrameShape::Matrix(..) => 2,
        }
    }

    /// Axis extents, outermost first.
    pub fn dims(self) -> Vec<u64> {
        match self {
            FrameShape::Scalar => Vec::new(),
            FrameShape::Vector(n) => vec![n as u64],
            FrameShape::Matrix(r, c) => vec![r as u64, c as u64],
        }
    }

    /// Elements per frame.
    pub fn num_elements(self) -> usize {
        match self {
            FrameShape::Scalar => 1,
            FrameShape::Vector(n) => n,
            FrameShape::Matrix(r, c) => r * c,
        }
    }
}

impl fmt::Display for FrameShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameShape::Scalar => f.write_str("scalar"),
            FrameShape::Vector(n) => write!(f, "vector[{n}]"),
            FrameShape::Matrix(r, c) => write!(f, "matrix[{r}x{c}]"),
        }
    }
}

/// A value that can be logged as one frame.
pub trait Frame {
    /// Element type of every value in the frame.
    type Elem: Element;

    /// Shape of this frame. Empty and ragged frames are rejected.
    fn shape(&self) -> Result<FrameShape>;

    /// Append all elements, row-major, little-endian.
    fn encode(&self, out: &mut Vec<u8>);

    /// Stored element type.
    fn element_type(&self) -> ElementType {
        <Self::Elem as Element>::TYPE
    }
}

macro_rules! impl_scalar_frame {
    ($($ty:ty),*) => {
        $(
            impl Frame for $ty {
                type Elem = $ty;

                fn shape(&self) -> Result<FrameShape> {
                    Ok(FrameShape::Scalar)
                }

                fn encode(&self, out: &mut Vec<u8>) {
                    self.write_le(out);
                }
            }
        )*
    };
}

impl_scalar_frame!(i8, i16, i32, i64, u8, u16, u32, u64, f32, f64);

impl<F: Frame + ?Sized> Frame for &F {
    type Elem = F::Elem;

    fn shape(&self) -> Result<FrameShape> {
        (**self).shape()
    }

    fn encode(&self, out: &mut Vec<u8>) {
        (**self).encode(out)
    }
}

fn vector_shape(len: usize) -> Result<FrameShape> {
    if len == 0 {
        return Err(Error::InvalidFrame("vector frame is empty"));
    }
    Ok(FrameShape::Vector(len))
}

fn matrix_shape<T, R: AsRef<[T]>>(rows: &[R]) -> Result<FrameShape> {
    let Some(first) = rows.first() else {
        return Err(Error::InvalidFrame("matrix frame has no rows"));
    };
    let cols = first.as_ref().len();
    if cols == 0 {
        return Err(Error::InvalidFrame("matrix frame has no columns"));
    }
    if rows.iter().any(|r| r.as_ref().len() != cols) {
        return Err(Error::InvalidFrame("matrix frame rows differ in length"));
    }
    Ok(FrameShape::Matrix(rows.len(), cols))
}

fn encode_rows<T: Element, R: AsRef<[T]>>(rows: &[R], out: &mut Vec<u8>) {
    for row in rows {
        for &v in row.as_ref() {
            v.write_le(out);
        }
    }
}

impl<T: Element> Frame for [T] {
    type Elem = T;

    fn shape(&self) -> Result<FrameShape> {
        vector_shape(self.len())
    }

    fn encode(&self, out: &mut Vec<u8>) {
        out.reserve(self.len() * T::TYPE.size());
        for &v in self {
            v.write_le(out);
        }
    }
}

impl<T: Element> Frame for Vec<T> {
    type Elem = T;

    fn shape(&self) -> Result<FrameShape> {
        self.as_slice().shape()
    }

    fn encode(&self, out: &mut Vec<u8>) {
        self.as_slice().encode(out)
    }
}

impl<T: Element, const N: usize> Frame for [T; N] {
    type Elem = T;

    fn shape(&self) -> Result<FrameShape> {
        self.as_slice().shape()
    }

    fn encode(&self, out: &mut Vec<u8>) {
        self.as_slice().encode(out)
    }
}

impl<T: Element> Frame for [Vec<T>] {
    type Elem = T;

    fn shape(&self) -> Result<FrameShape> {
        matrix_shape::<T, _>(self)
    }

    fn encode(&self, out: &mut Vec<u8>) {
        encode_rows::<T, _>(self, out)
    }
}

impl<T: Element> Frame for Vec<Vec<T>> {
    type Elem = T;

    fn shape(&self) -> Result<FrameShape> {
        matrix_shape::<T, _>(self.as_slice())
    }

    fn encode(&self, out: &mut Vec<u8>) {
        encode_rows::<T, _>(self.as_slice(), out)
    }
}

impl<T: Element, const C: usize> Frame for [[T; C]] {
    type Elem = T;

    fn shape(&self) -> Result<FrameShape> {
        matrix_shape::<T, _>(self)
    }

    fn encode(&self, out: &mut Vec<u8>) {
        encode_rows::<T, _>(self, out)
    }
}

impl<T: Element, const C: usize> Frame for Vec<[T; C]> {
    type Elem = T;

    fn shape(&self) -> Result<FrameShape> {
        matrix_shape::<T, _>(self.as_slice())
    }

    fn encode(&self, out: &mut Vec<u8>) {
        encode_rows::<T, _>(self.as_slice(), out)
    }
}

impl<T: Element, const C: usize, const R: usize> Frame for [[T; C]; R] {
    type Elem = T;

    fn shape(&self) -> Result<FrameShape> {
        matrix_shape::<T, _>(self.as_slice())
    }

    fn encode(&self, out: &mut Vec<u8>) {
        encode_rows::<T, _>(self.as_slice(), out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded<F: Frame + ?Sized>(frame: &F) -> Vec<u8> {
        let mut out = Vec::new();
        frame.encode(&mut out);
        out
    }

    #[test]
    fn scalar_frames() {
        assert_eq!(2.5f64.shape().unwrap(), FrameShape::Scalar);
        assert_eq!(7u16.element_type(), ElementType::U16);
        assert_eq!(encoded(&-1i8), vec![0xff]);
    }

    #[test]
    fn vector_frames() {
        let v = vec![1u8, 2, 3];
        assert_eq!(v.shape().unwrap(), FrameShape::Vector(3));
        assert_eq!([0.0f32; 4].shape().unwrap(), FrameShape::Vector(4));
        assert_eq!(v[..2].shape().unwrap(), FrameShape::Vector(2));
        assert_eq!(encoded(&v), vec![1, 2, 3]);
        assert!(matches!(
            Vec::<f64>::new().shape(),
            Err(Error::InvalidFrame(_))
        ));
    }

    #[test]
    fn matrix_frames() {
        let m = vec![vec![1i32, 2, 3], vec![4, 5, 6]];
        assert_eq!(m.shape().unwrap(), FrameShape::Matrix(2, 3));
        let a = [[1i32, 2, 3], [4, 5, 6]];
        assert_eq!(a.shape().unwrap(), FrameShape::Matrix(2, 3));
        assert_eq!(encoded(&m), encoded(&a));
        assert_eq!(encoded(&vec![[1u16, 2]]), vec![1, 0, 2, 0]);
        assert_eq!(a.element_type(), ElementType::I32);
    }

    #[test]
    fn ragged_and_empty_matrices_rejected() {
        let ragged = vec![vec![1.0f64, 2.0], vec![3.0]];
        assert!(matches!(ragged.shape(), Err(Error::InvalidFrame(_))));
        assert!(Vec::<Vec<f64>>::new().shape().is_err());
        assert!(vec![Vec::<f64>::new()].shape().is_err());
    }

    #[test]
    fn shape_display_and_dims() {
        assert_eq!(FrameShape::Matrix(2, 3).to_string(), "matrix[2x3]");
        assert_eq!(FrameShape::Vector(3).dims(), vec![3]);
        assert_eq!(FrameShape::Scalar.dims(), Vec::<u64>::new());
        assert_eq!(FrameShape::Matrix(2, 3).num_elements(), 6);
        assert_eq!(FrameShape::Scalar.rank(), 0);
    }
}
