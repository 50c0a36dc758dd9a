//! Combining lists of tensors: stack and concat.

use crate::error::StrixError;
use crate::ops::view::SliceSpec;
use crate::shape::Shape;
use crate::tensor::Tensor;
use crate::Result;

/// Merge `extent` into the result extent at `axis`. Unbound sides adopt the
/// bound one; two bound sides must agree.
fn merge_extent(
    merged: &mut [Option<usize>],
    axis: usize,
    extent: Option<usize>,
    source_axis: usize,
) -> Result<()> {
    match (merged[axis], extent) {
        (_, None) => Ok(()),
        (None, side) => {
            merged[axis] = side;
            Ok(())
        }
        (Some(a), Some(b)) if a == b => Ok(()),
        (Some(a), Some(b)) => Err(StrixError::Combine(format!(
            "mismatched extents {a} and {b} along axis {source_axis}"
        ))),
    }
}

fn check_rank(op: &str, dims: usize, t: &Tensor) -> Result<()> {
    if t.dims() == dims {
        Ok(())
    } else {
        Err(StrixError::Combine(format!(
            "cannot {op} {dims}-d tensor with {}-d tensor",
            t.dims()
        )))
    }
}

impl Tensor {
    /// Stack equal-rank tensors along a new axis inserted at `axis`.
    pub fn stack(tensors: &[&Tensor], axis: usize) -> Result<Tensor> {
        let first = tensors.first().ok_or(StrixError::EmptyList("stack"))?;
        let dims = first.dims();
        if axis > dims {
            return Err(StrixError::InvalidAxis {
                axis,
                ndim: dims + 1,
            });
        }

        let mut extents = vec![None; dims + 1];
        for t in tensors {
            check_rank("stack", dims, t)?;
            for (k, &side) in t.shape().extents().iter().enumerate() {
                let dst = if k < axis { k } else { k + 1 };
                merge_extent(&mut extents, dst, side, k)?;
            }
        }
        extents[axis] = Some(tensors.len());

        let result = Tensor::empty(Shape::from_extents(&extents));
        let mut specs = vec![SliceSpec::Full; dims + 1];
        for (i, t) in tensors.iter().enumerate() {
            specs[axis] = SliceSpec::Index(i);
            result.slice(&specs)?.assign(*t)?;
        }
        Ok(result)
    }

    /// Join equal-rank tensors end to end along an existing `axis`, which must
    /// be bound on every input.
    pub fn concat(tensors: &[&Tensor], axis: usize) -> Result<Tensor> {
        let first = tensors.first().ok_or(StrixError::EmptyList("concat"))?;
        let dims = first.dims();
        if axis >= dims {
            return Err(StrixError::InvalidAxis { axis, ndim: dims });
        }

        let mut extents = vec![None; dims];
        let mut combined = 0;
        for t in tensors {
            check_rank("concat", dims, t)?;
            for (k, &side) in t.shape().extents().iter().enumerate() {
                if k != axis {
                    merge_extent(&mut extents, k, side, k)?;
                    continue;
                }
                match side {
                    Some(n) => combined += n,
                    None => {
                        return Err(StrixError::Combine(
                            "cannot concat tensors that are unbound along the combination axis"
                                .into(),
                        ))
                    }
                }
            }
        }
        extents[axis] = Some(combined);

        let result = Tensor::empty(Shape::from_extents(&extents));
        let mut specs = vec![SliceSpec::Full; dims];
        let mut start = 0;
        for t in tensors {
            let side = t.shape().arith_extent(axis) as isize;
            specs[axis] = SliceSpec::range(start, start + side);
            result.slice(&specs)?.assign(*t)?;
            start += side;
        }
        Ok(result)
    }
}
