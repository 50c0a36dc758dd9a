//! Element-wise and broadcast operations on tensors.

use crate::error::StrixError;
use crate::index::Frame;
use crate::shape::Shape;
use crate::storage::Storage;
use crate::tensor::Tensor;
use crate::Result;

/// Right-hand side of an element-wise operation.
#[derive(Clone, Copy, Debug)]
pub enum Operand<'a> {
    Scalar(f64),
    Tensor(&'a Tensor),
}

impl From<f64> for Operand<'_> {
    fn from(v: f64) -> Self {
        Operand::Scalar(v)
    }
}

impl<'a> From<&'a Tensor> for Operand<'a> {
    fn from(t: &'a Tensor) -> Self {
        Operand::Tensor(t)
    }
}

impl Operand<'_> {
    /// A tensor for this operand. Scalars become a one-element tensor with
    /// `rank` unbound axes.
    fn resolve(self, rank: usize) -> Tensor {
        match self {
            Operand::Scalar(v) => Tensor::wrap(vec![v], Shape::unbound(rank)),
            Operand::Tensor(t) => t.clone(),
        }
    }
}

impl Tensor {
    /// Element-wise addition: self + other.
    pub fn plus<'a>(&self, other: impl Into<Operand<'a>>) -> Result<Tensor> {
        self.elemwise_binary(other, |a, b| a + b)
    }

    /// Element-wise subtraction: self - other.
    pub fn minus<'a>(&self, other: impl Into<Operand<'a>>) -> Result<Tensor> {
        self.elemwise_binary(other, |a, b| a - b)
    }

    /// Element-wise multiplication: self * other.
    pub fn times<'a>(&self, other: impl Into<Operand<'a>>) -> Result<Tensor> {
        self.elemwise_binary(other, |a, b| a * b)
    }

    /// Element-wise division: self / other.
    pub fn div<'a>(&self, other: impl Into<Operand<'a>>) -> Result<Tensor> {
        self.elemwise_binary(other, |a, b| a / b)
    }

    /// Element-wise exponential: e^self.
    pub fn exp(&self) -> Tensor {
        self.map(f64::exp)
    }

    /// Combine two broadcast-compatible operands into a new contiguous tensor.
    ///
    /// Ranks must match; per axis the extents must be equal or at least one
    /// side unbound. The result takes the bound extent.
    pub fn elemwise_binary<'a>(
        &self,
        other: impl Into<Operand<'a>>,
        op: impl Fn(f64, f64) -> f64,
    ) -> Result<Tensor> {
        let other = other.into().resolve(self.dims());
        let shape = self
            .shape()
            .broadcast_with(other.shape())
            .ok_or_else(|| StrixError::Broadcast {
                left: self.shape().clone(),
                right: other.shape().clone(),
            })?;
        let frame = Frame::new(&shape);
        let lhs = self.indexer().walker(&frame)?;
        let rhs = other.indexer().walker(&frame)?;
        let data = Storage::read_pair(self.storage(), other.storage(), |a, b| {
            (0..frame.len())
                .map(|j| op(a[lhs.offset(j)], b[rhs.offset(j)]))
                .collect()
        });
        Ok(Tensor::wrap(data, shape))
    }

    /// Combine `other` into this tensor's storage: `self[c] = op(self[c], other[c])`.
    ///
    /// `other` must broadcast into this tensor's shape. When both views share a
    /// buffer the right side is copied first.
    pub fn elemwise_binary_in_place<'a>(
        &self,
        other: impl Into<Operand<'a>>,
        op: impl Fn(f64, f64) -> f64,
    ) -> Result<()> {
        let other = other.into().resolve(self.dims());
        if !other.shape().broadcasts_into(self.shape()) {
            return Err(StrixError::BroadcastInto {
                from: other.shape().clone(),
                to: self.shape().clone(),
            });
        }
        let other = if other.shares_storage(self) {
            other.copy()
        } else {
            other
        };

        let frame = self.frame();
        let dst_walker = self.indexer().walker_unchecked(&frame);
        let src_walker = other.indexer().walker(&frame)?;
        let src = other.storage().read();
        let mut dst = self.storage().write();
        for j in 0..frame.len() {
            let pos = dst_walker.offset(j);
            dst[pos] = op(dst[pos], src[src_walker.offset(j)]);
        }
        Ok(())
    }

    /// Apply `f` to every element, producing a new contiguous tensor.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Tensor {
        let data = self.to_vec().into_iter().map(f).collect();
        Tensor::wrap(data, self.shape().clone())
    }

    /// Apply `f` to every element in place.
    pub fn map_in_place(&self, f: impl Fn(f64) -> f64) {
        let frame = self.frame();
        let walker = self.indexer().walker_unchecked(&frame);
        let mut data = self.storage().write();
        for j in 0..frame.len() {
            let pos = walker.offset(j);
            data[pos] = f(data[pos]);
        }
    }

    /// Independent contiguous copy.
    pub fn copy(&self) -> Tensor {
        Tensor::wrap(self.to_vec(), self.shape().clone())
    }

    /// Overwrite every element with `value`.
    pub fn set_all(&self, value: f64) {
        self.map_in_place(|_| value);
    }

    /// Write `other` into this view.
    pub fn assign<'a>(&self, other: impl Into<Operand<'a>>) -> Result<()> {
        self.elemwise_binary_in_place(other, |_, y| y)
    }
}
