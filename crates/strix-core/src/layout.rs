use crate::error::StrixError;
use crate::index::Frame;
use crate::shape::{AxisVec, Shape};
use crate::Result;

/// Shape/stride/offset descriptor of a tensor view.
///
/// A layout never changes after construction. View operations derive new
/// layouts over the same storage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layout {
    shape: Shape,
    strides: AxisVec<isize>,
    periods: AxisVec<usize>,
    offset: isize,
}

impl Layout {
    /// Default row-major layout for `shape` at offset 0.
    pub fn contiguous(shape: Shape) -> Self {
        let (strides, periods) = shape.strides_and_periods();
        Self {
            shape,
            strides,
            periods,
            offset: 0,
        }
    }

    /// Build a layout from explicit strides and offset.
    ///
    /// Unbound axes must have stride 0.
    pub fn from_parts(shape: Shape, strides: &[isize], offset: isize) -> Result<Self> {
        if strides.len() != shape.ndim() {
            return Err(StrixError::InvalidLayout(format!(
                "{} strides for {}-d shape {}",
                strides.len(),
                shape.ndim(),
                shape
            )));
        }
        if let Some(axis) = (0..shape.ndim()).find(|&k| shape.is_unbound(k) && strides[k] != 0) {
            return Err(StrixError::InvalidLayout(format!(
                "unbound axis {axis} has stride {}",
                strides[axis]
            )));
        }
        Ok(Self::with_strides(shape, strides.iter().copied().collect(), offset))
    }

    pub(crate) fn with_strides(shape: Shape, strides: AxisVec<isize>, offset: isize) -> Self {
        debug_assert_eq!(strides.len(), shape.ndim());
        let (_, periods) = shape.strides_and_periods();
        Self {
            shape,
            strides,
            periods,
            offset,
        }
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn strides(&self) -> &[isize] {
        &self.strides
    }

    /// Axis periods of the canonical form of this layout's shape.
    pub fn periods(&self) -> &[usize] {
        &self.periods
    }

    pub fn offset(&self) -> isize {
        self.offset
    }

    pub fn ndim(&self) -> usize {
        self.shape.ndim()
    }

    pub fn numel(&self) -> usize {
        self.shape.numel()
    }

    /// Whether this layout is the default row-major layout of its shape
    /// (ignoring offset). Any unbound axis makes a layout non-contiguous.
    pub fn is_contiguous(&self) -> bool {
        let mut expected = 1isize;
        for k in (0..self.ndim()).rev() {
            let Some(extent) = self.shape.extent(k) else {
                return false;
            };
            if self.strides[k] != expected {
                return false;
            }
            expected *= extent as isize;
        }
        true
    }

    /// Canonical iteration frame of this layout's own shape.
    pub fn frame(&self) -> Frame {
        Frame::new(&self.shape)
    }

    /// Smallest and largest physical offsets touched by this layout, or
    /// `None` when it has no elements.
    pub fn offset_bounds(&self) -> Option<(isize, isize)> {
        if self.numel() == 0 {
            return None;
        }
        let (mut lo, mut hi) = (self.offset, self.offset);
        for k in 0..self.ndim() {
            let span = self.strides[k] * (self.shape.arith_extent(k) as isize - 1);
            if span < 0 {
                lo += span;
            } else {
                hi += span;
            }
        }
        Some((lo, hi))
    }
}
