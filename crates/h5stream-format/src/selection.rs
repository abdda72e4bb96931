//! Hyperslab selection for partial dataset writes.
//!
//! A [`Selection`] names a rectangular block of a dataset: a start index and
//! an element count per axis. Selections are stride 1, block 1.
//!
//! # Example
//!
//! ```
//! use h5stream_format::Selection;
//!
//! // Column 4 of a 3 x 10 dataset.
//! let sel = Selection::index_along(&[3, 10], 1, 4);
//! assert_eq!(sel.num_elements(&[3, 10]), 3);
//! assert_eq!(sel.output_shape(&[3, 10]), vec![3, 1]);
//! ```

use std::ops::Range;

use crate::error::FormatError;

/// A selection describing which elements of a dataset to access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// The entire dataspace.
    All,
    /// A contiguous block: `start[d]..start[d] + count[d]` on each axis.
    Hyperslab { start: Vec<u64>, count: Vec<u64> },
}

impl Selection {
    /// Create a hyperslab from ranges, one per dimension.
    pub fn slice(ranges: &[Range<u64>]) -> Self {
        Selection::Hyperslab {
            start: ranges.iter().map(|r| r.start).collect(),
            count: ranges
                .iter()
                .map(|r| r.end.saturating_sub(r.start))
                .collect(),
        }
    }

    /// The full extent of every axis except `axis`, which is pinned to `index`.
    pub fn index_along(dims: &[u64], axis: usize, index: u64) -> Self {
        let mut start = vec![0; dims.len()];
        let mut count = dims.to_vec();
        if axis < dims.len() {
            start[axis] = index;
            count[axis] = 1;
        }
        Selection::Hyperslab { start, count }
    }

    /// Number of selected elements for a dataspace shape.
    pub fn num_elements(&self, dims: &[u64]) -> u64 {
        self.output_shape(dims).iter().product()
    }

    /// Shape of the selected region.
    pub fn output_shape(&self, dims: &[u64]) -> Vec<u64> {
        match self {
            Selection::All => dims.to_vec(),
            Selection::Hyperslab { count, .. } => count.clone(),
        }
    }

    /// Check rank and bounds against a dataspace shape.
    pub fn validate(&self, dims: &[u64]) -> Result<(), FormatError> {
        let Selection::Hyperslab { start, count } = self else {
            return Ok(());
        };
        if start.len() != dims.len() || count.len() != dims.len() {
            return Err(FormatError::SelectionRankMismatch {
                expected: dims.len(),
                got: start.len().max(count.len()),
            });
        }
        for (axis, ((&s, &c), &extent)) in start.iter().zip(count).zip(dims).enumerate() {
            let end = s.checked_add(c).unwrap_or(u64::MAX);
            if end > extent {
                return Err(FormatError::SelectionOutOfBounds { axis, end, extent });
            }
        }
        Ok(())
    }

    /// Byte extents `(offset, len)` covered by this selection in a row-major
    /// contiguous buffer of shape `dims`, in selection order.
    ///
    /// Adjacent extents are merged, so a selection of whole trailing axes
    /// collapses to a single run.
    pub fn byte_runs(&self, dims: &[u64], elem_size: usize) -> Result<Vec<(u64, usize)>, FormatError> {
        self.validate(dims)?;
        let rank = dims.len();
        let (start, count) = match self {
            Selection::All => (vec![0; rank], dims.to_vec()),
            Selection::Hyperslab { start, count } => (start.clone(), count.clone()),
        };
        if count.iter().any(|&c| c == 0) {
            return Ok(Vec::new());
        }
        if rank == 0 {
            return Ok(vec![(0, elem_size)]);
        }

        // Element strides of each axis.
        let mut strides = vec![1u64; rank];
        for d in (0..rank - 1).rev() {
            strides[d] = strides[d + 1] * dims[d + 1];
        }

        // Innermost axis that is not fully selected bounds each run.
        let mut inner = rank - 1;
        while inner > 0 && start[inner] == 0 && count[inner] == dims[inner] {
            inner -= 1;
        }
        let run_len = (count[inner] * strides[inner]) as usize * elem_size;

        let mut runs: Vec<(u64, usize)> = Vec::new();
        let mut idx = vec![0u64; inner];
        loop {
            let elem: u64 = (0..inner)
                .map(|d| (start[d] + idx[d]) * strides[d])
                .sum::<u64>()
                + start[inner] * strides[inner];
            let offset = elem * elem_size as u64;
            match runs.last_mut() {
                Some(last) if last.0 + last.1 as u64 == offset => last.1 += run_len,
                _ => runs.push((offset, run_len)),
            }

            // Odometer over the outer axes.
            let mut d = inner;
            loop {
                if d == 0 {
                    return Ok(runs);
                }
                d -= 1;
                idx[d] += 1;
                if idx[d] < count[d] {
                    break;
                }
                idx[d] = 0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_shape() {
        let sel = Selection::slice(&[20..30, 40..60]);
        assert_eq!(sel.num_elements(&[100, 100]), 200);
        assert_eq!(sel.output_shape(&[100, 100]), vec![10, 20]);
        assert_eq!(Selection::All.num_elements(&[4, 5]), 20);
    }

    #[test]
    fn index_along_pins_one_axis() {
        let sel = Selection::index_along(&[2, 3, 10], 2, 7);
        assert_eq!(
            sel,
            Selection::Hyperslab {
                start: vec![0, 0, 7],
                count: vec![2, 3, 1],
            }
        );
    }

    #[test]
    fn validate_bounds_and_rank() {
        let dims = [3, 10];
        assert!(Selection::index_along(&dims, 1, 9).validate(&dims).is_ok());
        assert!(matches!(
            Selection::index_along(&dims, 1, 10).validate(&dims),
            Err(FormatError::SelectionOutOfBounds { axis: 1, end: 11, extent: 10 })
        ));
        assert!(matches!(
            Selection::slice(&[0..1]).validate(&dims),
            Err(FormatError::SelectionRankMismatch { expected: 2, got: 1 })
        ));
    }

    #[test]
    fn trailing_axis_column_is_strided() {
        // vector of 3 along a trailing capacity axis of 10
        let runs = Selection::index_along(&[3, 10], 1, 4)
            .byte_runs(&[3, 10], 8)
            .unwrap();
        assert_eq!(runs, vec![(32, 8), (112, 8), (192, 8)]);
    }

    #[test]
    fn leading_axis_row_is_one_run() {
        let runs = Selection::index_along(&[10, 3], 0, 4)
            .byte_runs(&[10, 3], 8)
            .unwrap();
        assert_eq!(runs, vec![(96, 24)]);

        let runs = Selection::index_along(&[10, 2, 3], 0, 1)
            .byte_runs(&[10, 2, 3], 4)
            .unwrap();
        assert_eq!(runs, vec![(24, 24)]);
    }

    #[test]
    fn matrix_frame_trailing_axis() {
        let dims = [2, 3, 5];
        let runs = Selection::index_along(&dims, 2, 1).byte_runs(&dims, 8).unwrap();
        let expected: Vec<(u64, usize)> = (0..2u64)
            .flat_map(|i| (0..3u64).map(move |j| ((i * 15 + j * 5 + 1) * 8, 8)))
            .collect();
        assert_eq!(runs, expected);
    }

    #[test]
    fn scalar_stream_slot() {
        let runs = Selection::index_along(&[6], 0, 5).byte_runs(&[6], 2).unwrap();
        assert_eq!(runs, vec![(10, 2)]);
    }

    #[test]
    fn whole_dataset_merges() {
        let runs = Selection::All.byte_runs(&[4, 5], 1).unwrap();
        assert_eq!(runs, vec![(0, 20)]);
        let runs = Selection::slice(&[1..3, 0..5]).byte_runs(&[4, 5], 1).unwrap();
        assert_eq!(runs, vec![(5, 10)]);
        assert!(Selection::slice(&[0..0, 0..5])
            .byte_runs(&[4, 5], 1)
            .unwrap()
            .is_empty());
    }
}
