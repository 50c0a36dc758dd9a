//! View operations: slice, transpose, broadcast_on, reshape.
//!
//! Slice, transpose and broadcast_on derive a new layout over the same
//! storage. Reshape always copies.

use std::ops::{Range, RangeFrom, RangeFull, RangeTo};

use crate::error::StrixError;
use crate::layout::Layout;
use crate::shape::{AxisVec, Shape};
use crate::tensor::Tensor;
use crate::Result;

/// Per-axis slice selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SliceSpec {
    /// Keep the whole axis.
    Full,
    /// Select one position and drop the axis.
    Index(usize),
    /// Keep the axis, restricted to `start..end` with `step`. Missing bounds
    /// default to the whole axis in the direction of `step`.
    Range {
        start: Option<isize>,
        end: Option<isize>,
        step: isize,
    },
}

impl SliceSpec {
    pub fn range(start: isize, end: isize) -> Self {
        SliceSpec::Range {
            start: Some(start),
            end: Some(end),
            step: 1,
        }
    }

    pub fn stepped(start: Option<isize>, end: Option<isize>, step: isize) -> Self {
        SliceSpec::Range { start, end, step }
    }

    /// The whole axis walked with `step` (reversed when negative).
    pub fn step(step: isize) -> Self {
        SliceSpec::Range {
            start: None,
            end: None,
            step,
        }
    }
}

impl From<usize> for SliceSpec {
    fn from(i: usize) -> Self {
        SliceSpec::Index(i)
    }
}

impl From<RangeFull> for SliceSpec {
    fn from(_: RangeFull) -> Self {
        SliceSpec::Full
    }
}

impl From<Range<isize>> for SliceSpec {
    fn from(r: Range<isize>) -> Self {
        SliceSpec::range(r.start, r.end)
    }
}

impl From<RangeFrom<isize>> for SliceSpec {
    fn from(r: RangeFrom<isize>) -> Self {
        SliceSpec::stepped(Some(r.start), None, 1)
    }
}

impl From<RangeTo<isize>> for SliceSpec {
    fn from(r: RangeTo<isize>) -> Self {
        SliceSpec::stepped(None, Some(r.end), 1)
    }
}

/// Clamp a range against an axis of `extent`, returning the first selected
/// position and the number of selected positions.
fn resolve_range(
    start: Option<isize>,
    end: Option<isize>,
    step: isize,
    extent: usize,
) -> (isize, usize) {
    let ext = extent as isize;
    let (start, count) = if step > 0 {
        let s = start.unwrap_or(0).clamp(0, ext);
        let e = end.unwrap_or(ext).clamp(s, ext);
        (s, (e - s + step - 1) / step)
    } else {
        let s = start.unwrap_or(ext - 1).clamp(-1, ext - 1);
        let e = end.unwrap_or(-1).clamp(-1, s);
        let mag = -step;
        (s, (s - e + mag - 1) / mag)
    };
    if count == 0 {
        (0, 0)
    } else {
        (start, count as usize)
    }
}

impl Layout {
    /// Apply per-axis slice specs. Missing trailing specs keep their axes.
    pub fn slice(&self, specs: &[SliceSpec]) -> Result<Layout> {
        let ndim = self.ndim();
        if specs.len() > ndim {
            return Err(StrixError::InvalidSlice(format!(
                "{} specs for {ndim}-d tensor",
                specs.len()
            )));
        }
        let shape = self.shape();
        let mut new_shape = Shape::scalar();
        let mut new_strides = AxisVec::with_capacity(ndim);
        let mut offset = self.offset();

        for k in 0..ndim {
            let stride = self.strides()[k];
            let extent = shape.extent(k);
            match specs.get(k).copied().unwrap_or(SliceSpec::Full) {
                SliceSpec::Full => {
                    new_shape.push(extent);
                    new_strides.push(stride);
                }
                SliceSpec::Index(i) => {
                    if extent.is_some_and(|e| i >= e) {
                        let mut coords = vec![0; ndim];
                        coords[k] = i;
                        return Err(StrixError::IndexOutOfBounds {
                            coords,
                            shape: shape.clone(),
                        });
                    }
                    offset += stride * i as isize;
                }
                SliceSpec::Range { step: 0, .. } => {
                    return Err(StrixError::InvalidSlice(format!(
                        "zero step on axis {k}"
                    )));
                }
                SliceSpec::Range { start, end, step } => match extent {
                    None => {
                        new_shape.push(None);
                        new_strides.push(0);
                    }
                    Some(e) => {
                        let (first, count) = resolve_range(start, end, step, e);
                        offset += stride * first;
                        new_shape.push(Some(count));
                        new_strides.push(stride * step);
                    }
                },
            }
        }
        Ok(Layout::with_strides(new_shape, new_strides, offset))
    }

    /// Permute axes so that source axis `k` lands at `perm[k]`. `None`
    /// reverses a 2-D layout.
    pub fn transpose(&self, perm: Option<&[usize]>) -> Result<Layout> {
        let ndim = self.ndim();
        let perm: AxisVec<usize> = match perm {
            Some(p) => p.iter().copied().collect(),
            None if ndim == 2 => [1, 0].into_iter().collect(),
            None => {
                return Err(StrixError::InvalidPermutation {
                    perm: Vec::new(),
                    ndim,
                })
            }
        };
        let mut seen: AxisVec<bool> = AxisVec::from_elem(false, ndim);
        let valid = perm.len() == ndim
            && perm
                .iter()
                .all(|&d| d < ndim && !std::mem::replace(&mut seen[d], true));
        if !valid {
            return Err(StrixError::InvalidPermutation {
                perm: perm.to_vec(),
                ndim,
            });
        }

        let mut extents: AxisVec<Option<usize>> = AxisVec::from_elem(None, ndim);
        let mut strides: AxisVec<isize> = AxisVec::from_elem(0, ndim);
        for (src, &dst) in perm.iter().enumerate() {
            extents[dst] = self.shape().extents()[src];
            strides[dst] = self.strides()[src];
        }
        Ok(Layout::with_strides(
            Shape::from_extents(&extents),
            strides,
            self.offset(),
        ))
    }

    /// Insert unbound axes at the given positions of the result.
    pub fn broadcast_on(&self, positions: &[usize]) -> Result<Layout> {
        let rdim = self.ndim() + positions.len();
        let mut inserted: AxisVec<bool> = AxisVec::from_elem(false, rdim);
        for &p in positions {
            if p >= rdim || inserted[p] {
                return Err(StrixError::InvalidAxis { axis: p, ndim: rdim });
            }
            inserted[p] = true;
        }

        let mut shape = Shape::scalar();
        let mut strides = AxisVec::with_capacity(rdim);
        let mut src = 0;
        for is_new in inserted {
            if is_new {
                shape.push(None);
                strides.push(0);
            } else {
                shape.push(self.shape().extents()[src]);
                strides.push(self.strides()[src]);
                src += 1;
            }
        }
        Ok(Layout::with_strides(shape, strides, self.offset()))
    }
}

impl Tensor {
    /// A view restricted by per-axis slice specs.
    pub fn slice(&self, specs: &[SliceSpec]) -> Result<Tensor> {
        Ok(self.view(self.layout().slice(specs)?))
    }

    /// A view with permuted axes. See [`Layout::transpose`].
    pub fn transpose(&self, perm: Option<&[usize]>) -> Result<Tensor> {
        Ok(self.view(self.layout().transpose(perm)?))
    }

    /// Matrix transpose of a 2-D tensor.
    pub fn t(&self) -> Result<Tensor> {
        self.transpose(None)
    }

    /// A view with unbound axes inserted at `positions`.
    pub fn broadcast_on(&self, positions: &[usize]) -> Result<Tensor> {
        Ok(self.view(self.layout().broadcast_on(positions)?))
    }

    /// Copy into a new contiguous tensor of `shape`. Element counts must
    /// agree, with unbound axes counting as 1.
    pub fn reshape(&self, shape: impl Into<Shape>) -> Result<Tensor> {
        let shape = shape.into();
        if shape.numel() != self.numel() {
            return Err(StrixError::InvalidReshape {
                numel: self.numel(),
                shape,
            });
        }
        Ok(Tensor::wrap(self.to_vec(), shape))
    }
}
