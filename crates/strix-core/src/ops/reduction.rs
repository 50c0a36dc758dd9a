//! Reduction operations: sum, min, max, norms, argmin/argmax.
//!
//! Reductions walk the source once in canonical order. The output position
//! of each source element comes from an accumulator layout that has the
//! reduced axes unbound, walked with the source's frame.

use crate::error::StrixError;
use crate::index::IndexCache;
use crate::layout::Layout;
use crate::shape::{AxisVec, Shape};
use crate::tensor::Tensor;
use crate::Result;

/// Which axes to reduce and how to return a zero-axis result.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReduceOptions {
    /// Axes to remove. `None` reduces over every position.
    pub axes: Option<Vec<usize>>,
    /// Return a zero-axis tensor instead of a bare scalar.
    pub keep_scalar_as_tensor: bool,
}

impl ReduceOptions {
    /// Reduce over every position.
    pub fn all() -> Self {
        Self::default()
    }

    /// Reduce the listed axes.
    pub fn along(axes: &[usize]) -> Self {
        Self::default().axes(axes)
    }

    pub fn axes(mut self, axes: &[usize]) -> Self {
        self.axes = Some(axes.to_vec());
        self
    }

    pub fn keep_scalar_as_tensor(mut self, keep: bool) -> Self {
        self.keep_scalar_as_tensor = keep;
        self
    }
}

/// Options for argmin/argmax.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ArgOptions {
    /// Axis to search along. `None` searches the whole tensor and reports
    /// canonical positions.
    pub axis: Option<usize>,
    pub keep_scalar_as_tensor: bool,
    /// Also return the extremal values.
    pub include_values: bool,
}

impl ArgOptions {
    pub fn along(axis: usize) -> Self {
        Self {
            axis: Some(axis),
            ..Self::default()
        }
    }

    pub fn keep_scalar_as_tensor(mut self, keep: bool) -> Self {
        self.keep_scalar_as_tensor = keep;
        self
    }

    pub fn include_values(mut self, include: bool) -> Self {
        self.include_values = include;
        self
    }
}

/// Result of a reduction: a bare scalar or a tensor.
#[derive(Clone, Debug, PartialEq)]
pub enum Reduction {
    Scalar(f64),
    Tensor(Tensor),
}

impl Reduction {
    pub fn scalar(&self) -> Option<f64> {
        match self {
            Reduction::Scalar(v) => Some(*v),
            Reduction::Tensor(_) => None,
        }
    }

    pub fn tensor(&self) -> Option<&Tensor> {
        match self {
            Reduction::Tensor(t) => Some(t),
            Reduction::Scalar(_) => None,
        }
    }

    /// The result as a tensor; scalars become zero-axis tensors.
    pub fn into_tensor(self) -> Tensor {
        match self {
            Reduction::Tensor(t) => t,
            Reduction::Scalar(v) => Tensor::scalar(v),
        }
    }

    fn from_values(shape: Shape, values: Vec<f64>, keep_scalar_as_tensor: bool) -> Self {
        if shape.is_scalar() && !keep_scalar_as_tensor {
            Reduction::Scalar(values[0])
        } else {
            Reduction::Tensor(Tensor::wrap(values, shape))
        }
    }
}

/// Positions of argmin/argmax, plus the values when requested.
#[derive(Clone, Debug, PartialEq)]
pub struct ArgResult {
    /// Indices as `f64`; -1 marks an empty search.
    pub indices: Reduction,
    pub values: Option<Reduction>,
}

impl Tensor {
    /// Sum of elements.
    pub fn sum(&self, opts: ReduceOptions) -> Result<Reduction> {
        self.reduce(0.0, |acc, x| acc + x, opts)
    }

    /// Minimum element; `+inf` over an empty range.
    pub fn min(&self, opts: ReduceOptions) -> Result<Reduction> {
        self.reduce(f64::INFINITY, f64::min, opts)
    }

    /// Maximum element; `-inf` over an empty range.
    pub fn max(&self, opts: ReduceOptions) -> Result<Reduction> {
        self.reduce(f64::NEG_INFINITY, f64::max, opts)
    }

    /// Euclidean norm.
    pub fn norm(&self, opts: ReduceOptions) -> Result<Reduction> {
        self.reduce_with(0.0, |acc, x| acc + x * x, f64::sqrt, opts)
    }

    /// `(Σ |x|^p)^(1/p)`.
    pub fn lp_norm(&self, p: f64, opts: ReduceOptions) -> Result<Reduction> {
        self.reduce_with(
            0.0,
            |acc, x| acc + x.abs().powf(p),
            |acc| acc.powf(1.0 / p),
            opts,
        )
    }

    /// Fold elements with `update`, starting each output from `init`.
    pub fn reduce(
        &self,
        init: f64,
        update: impl Fn(f64, f64) -> f64,
        opts: ReduceOptions,
    ) -> Result<Reduction> {
        self.reduce_with(init, update, |acc| acc, opts)
    }

    /// Like [`Tensor::reduce`], passing every accumulator through `finalize`.
    pub fn reduce_with(
        &self,
        init: f64,
        update: impl Fn(f64, f64) -> f64,
        finalize: impl Fn(f64) -> f64,
        opts: ReduceOptions,
    ) -> Result<Reduction> {
        let mask = self.reduced_axes(opts.axes.as_deref())?;
        let (shape, accs) = self.fold_axes(&mask, init, |acc, x, _| *acc = update(*acc, x));
        let values = accs.into_iter().map(finalize).collect();
        Ok(Reduction::from_values(
            shape,
            values,
            opts.keep_scalar_as_tensor,
        ))
    }

    /// Position of the smallest element. Ties keep the first position.
    pub fn argmin(&self, opts: ArgOptions) -> Result<ArgResult> {
        self.arg_extreme(opts, |x, best| x < best)
    }

    /// Position of the largest element. Ties keep the first position.
    pub fn argmax(&self, opts: ArgOptions) -> Result<ArgResult> {
        self.arg_extreme(opts, |x, best| x > best)
    }

    fn arg_extreme(&self, opts: ArgOptions, better: impl Fn(f64, f64) -> bool) -> Result<ArgResult> {
        let mask = match opts.axis {
            None => self.reduced_axes(None)?,
            Some(axis) => self.reduced_axes(Some(std::slice::from_ref(&axis)))?,
        };
        let frame = self.frame();
        let (shape, accs) = self.fold_axes(&mask, (-1isize, f64::NAN), |acc, x, j| {
            let pos = match opts.axis {
                Some(axis) => frame.coord(j, axis),
                None => j,
            };
            if acc.0 < 0 || better(x, acc.1) {
                *acc = (pos as isize, x);
            }
        });

        let (indices, values): (Vec<f64>, Vec<f64>) =
            accs.into_iter().map(|(i, v)| (i as f64, v)).unzip();
        let values = opts.include_values.then(|| {
            Reduction::from_values(shape.clone(), values, opts.keep_scalar_as_tensor)
        });
        Ok(ArgResult {
            indices: Reduction::from_values(shape, indices, opts.keep_scalar_as_tensor),
            values,
        })
    }

    /// Mask of reduced axes; `None` reduces all of them.
    fn reduced_axes(&self, axes: Option<&[usize]>) -> Result<AxisVec<bool>> {
        let ndim = self.dims();
        let Some(axes) = axes else {
            return Ok(AxisVec::from_elem(true, ndim));
        };
        let mut mask = AxisVec::from_elem(false, ndim);
        for &axis in axes {
            if axis >= ndim || mask[axis] {
                return Err(StrixError::InvalidAxis { axis, ndim });
            }
            mask[axis] = true;
        }
        Ok(mask)
    }

    /// Fold every element into the accumulator of its output position.
    /// Returns the output shape and the accumulators in canonical order.
    fn fold_axes<A: Clone>(
        &self,
        mask: &[bool],
        init: A,
        mut update: impl FnMut(&mut A, f64, usize),
    ) -> (Shape, Vec<A>) {
        let mut acc_shape = self.shape().clone();
        let mut out_shape = Shape::scalar();
        for (k, &reduced) in mask.iter().enumerate() {
            if reduced {
                acc_shape.set(k, None);
            } else {
                out_shape.push(self.shape().extents()[k]);
            }
        }
        let acc_layout = Layout::contiguous(acc_shape);

        let frame = self.frame();
        let src = self.indexer().walker_unchecked(&frame);
        let dst = IndexCache::global()
            .indexer(&acc_layout)
            .walker_unchecked(&frame);
        let mut accs = vec![init; acc_layout.numel()];
        let data = self.storage().read();
        for j in 0..frame.len() {
            update(&mut accs[dst.offset(j)], data[src.offset(j)], j);
        }
        (out_shape, accs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Tensor {
        // [[1, 2, 3], [4, 5, 6]]
        Tensor::from_flat(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], [2, 3]).unwrap()
    }

    #[test]
    fn test_sum_all() {
        let s = grid().sum(ReduceOptions::all()).unwrap();
        assert_eq!(s.scalar(), Some(21.0));

        let kept = grid()
            .sum(ReduceOptions::all().keep_scalar_as_tensor(true))
            .unwrap();
        let t = kept.tensor().unwrap();
        assert!(t.shape().is_scalar());
        assert_eq!(t.item().unwrap(), 21.0);
    }

    #[test]
    fn test_sum_along_axes() {
        let rows = grid().sum(ReduceOptions::along(&[1])).unwrap().into_tensor();
        assert_eq!(rows.shape(), &Shape::new(&[2]));
        assert_eq!(rows.to_vec(), vec![6.0, 15.0]);

        let cols = grid().sum(ReduceOptions::along(&[0])).unwrap().into_tensor();
        assert_eq!(cols.to_vec(), vec![5.0, 7.0, 9.0]);

        let both = grid().sum(ReduceOptions::along(&[0, 1])).unwrap();
        assert_eq!(both.scalar(), Some(21.0));
    }

    #[test]
    fn test_reduce_strided_view() {
        let t = grid().t().unwrap();
        let s = t.sum(ReduceOptions::along(&[1])).unwrap().into_tensor();
        assert_eq!(s.to_vec(), vec![5.0, 7.0, 9.0]);
        let m = t.max(ReduceOptions::along(&[0])).unwrap().into_tensor();
        assert_eq!(m.to_vec(), vec![3.0, 6.0]);
    }

    #[test]
    fn test_min_max_norm() {
        let t = Tensor::vector(vec![3.0, -4.0]);
        assert_eq!(t.min(ReduceOptions::all()).unwrap().scalar(), Some(-4.0));
        assert_eq!(t.max(ReduceOptions::all()).unwrap().scalar(), Some(3.0));
        assert_eq!(t.norm(ReduceOptions::all()).unwrap().scalar(), Some(5.0));
        assert_eq!(t.lp_norm(1.0, ReduceOptions::all()).unwrap().scalar(), Some(7.0));
    }

    #[test]
    fn test_invalid_axes() {
        let t = grid();
        assert!(matches!(
            t.sum(ReduceOptions::along(&[2])),
            Err(StrixError::InvalidAxis { axis: 2, ndim: 2 })
        ));
        assert!(t.sum(ReduceOptions::along(&[1, 1])).is_err());
    }

    #[test]
    fn test_argmin_tie_break() {
        let t = Tensor::vector(vec![2.0, 1.0, 1.0]);
        let r = t.argmin(ArgOptions::default()).unwrap();
        assert_eq!(r.indices.scalar(), Some(1.0));
        assert!(r.values.is_none());
    }

    #[test]
    fn test_argmax_along_axis_with_values() {
        // [[1, 9, 3], [7, 5, 7]]
        let t = Tensor::from_flat(vec![1.0, 9.0, 3.0, 7.0, 5.0, 7.0], [2, 3]).unwrap();
        let r = t
            .argmax(ArgOptions::along(1).include_values(true))
            .unwrap();
        assert_eq!(r.indices.into_tensor().to_vec(), vec![1.0, 0.0]);
        assert_eq!(r.values.unwrap().into_tensor().to_vec(), vec![9.0, 7.0]);

        let down = t.argmin(ArgOptions::along(0)).unwrap().indices.into_tensor();
        assert_eq!(down.to_vec(), vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_arg_over_empty() {
        let t = Tensor::zeros([0]);
        let r = t.argmax(ArgOptions::default().include_values(true)).unwrap();
        assert_eq!(r.indices.scalar(), Some(-1.0));
        assert!(r.values.unwrap().scalar().unwrap().is_nan());
    }
}
