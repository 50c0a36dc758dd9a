//! Dense linear-algebra helpers: matrix products, dot and outer products.
//!
//! Operands are read through their indexers, so transposed or sliced views
//! are used in place without a contiguous copy.

use crate::error::StrixError;
use crate::shape::Shape;
use crate::storage::Storage;
use crate::tensor::Tensor;
use crate::Result;

fn check_rank(op: &'static str, t: &Tensor, expected: usize) -> Result<()> {
    if t.dims() == expected {
        Ok(())
    } else {
        Err(StrixError::RankMismatch {
            op,
            expected,
            got: t.dims(),
        })
    }
}

/// Shared extent of `left[la]` and `right[rb]`; both must be bound and equal.
fn inner_extent(left: &Shape, la: usize, right: &Shape, rb: usize) -> Result<usize> {
    match (left.extent(la), right.extent(rb)) {
        (Some(a), Some(b)) if a == b => Ok(a),
        _ => Err(StrixError::MatmulDimMismatch {
            left: left.clone(),
            right: right.clone(),
        }),
    }
}

/// Element `i` of a materialized vector whose axis may be unbound.
#[inline]
fn vec_at(v: &[f64], i: usize) -> f64 {
    if v.len() == 1 {
        v[0]
    } else {
        v[i]
    }
}

impl Tensor {
    /// Matrix product.
    ///
    /// Supports:
    /// - [M, K] · [K, N] → [M, N]
    /// - [M, K] · [K] → [M]
    /// - [K] · [K, N] → [N]
    pub fn mat_mul(&self, other: &Tensor) -> Result<Tensor> {
        match (self.dims(), other.dims()) {
            (2, 1) => return self.mat_mul_vec(other),
            (1, 2) => return other.vec_mul_mat_of(self),
            _ => {}
        }
        check_rank("mat_mul", self, 2)?;
        check_rank("mat_mul", other, 2)?;
        let inner = inner_extent(self.shape(), 1, other.shape(), 0)?;
        let out_shape = Shape::from_extents(&[self.shape().extent(0), other.shape().extent(1)]);
        let (h, w) = (self.shape().arith_extent(0), other.shape().arith_extent(1));

        let (ia, ib) = (self.indexer(), other.indexer());
        let data = Storage::read_pair(self.storage(), other.storage(), |a, b| {
            let mut out = Vec::with_capacity(h * w);
            for i in 0..h {
                for j in 0..w {
                    let mut acc = 0.0;
                    for k in 0..inner {
                        acc += a[ia.coords_to_offset(&[i, k])] * b[ib.coords_to_offset(&[k, j])];
                    }
                    out.push(acc);
                }
            }
            out
        });
        Ok(Tensor::wrap(data, out_shape))
    }

    /// Matrix-vector product: [M, K] · [K] → [M].
    pub fn mat_mul_vec(&self, vec: &Tensor) -> Result<Tensor> {
        check_rank("mat_mul_vec", self, 2)?;
        check_rank("mat_mul_vec", vec, 1)?;
        let inner = inner_extent(self.shape(), 1, vec.shape(), 0)?;
        let h = self.shape().arith_extent(0);

        let (im, iv) = (self.indexer(), vec.indexer());
        let data = Storage::read_pair(self.storage(), vec.storage(), |m, v| {
            (0..h)
                .map(|i| {
                    (0..inner)
                        .map(|k| m[im.coords_to_offset(&[i, k])] * v[iv.coords_to_offset(&[k])])
                        .sum()
                })
                .collect()
        });
        Ok(Tensor::wrap(data, Shape::from_extents(&[self.shape().extent(0)])))
    }

    /// Vector-matrix product: [K] · [K, N] → [N].
    pub fn vec_mul_mat(&self, mat: &Tensor) -> Result<Tensor> {
        mat.vec_mul_mat_of(self)
    }

    fn vec_mul_mat_of(&self, vec: &Tensor) -> Result<Tensor> {
        check_rank("vec_mul_mat", vec, 1)?;
        check_rank("vec_mul_mat", self, 2)?;
        let inner = inner_extent(vec.shape(), 0, self.shape(), 0)?;
        let w = self.shape().arith_extent(1);

        let (im, iv) = (self.indexer(), vec.indexer());
        let data = Storage::read_pair(self.storage(), vec.storage(), |m, v| {
            (0..w)
                .map(|j| {
                    (0..inner)
                        .map(|k| v[iv.coords_to_offset(&[k])] * m[im.coords_to_offset(&[k, j])])
                        .sum()
                })
                .collect()
        });
        Ok(Tensor::wrap(data, Shape::from_extents(&[self.shape().extent(1)])))
    }

    /// Inner product of two vectors.
    pub fn dot(&self, other: &Tensor) -> Result<f64> {
        check_rank("dot", self, 1)?;
        check_rank("dot", other, 1)?;
        let n = inner_extent(self.shape(), 0, other.shape(), 0)?;
        let (ia, ib) = (self.indexer(), other.indexer());
        Ok(Storage::read_pair(self.storage(), other.storage(), |a, b| {
            (0..n)
                .map(|k| a[ia.coords_to_offset(&[k])] * b[ib.coords_to_offset(&[k])])
                .sum()
        }))
    }

    /// Outer product of two vectors: [M] ⊗ [N] → [M, N].
    pub fn outer_prod(&self, other: &Tensor) -> Result<Tensor> {
        check_rank("outer_prod", self, 1)?;
        check_rank("outer_prod", other, 1)?;
        let out_shape = Shape::from_extents(&[self.shape().extent(0), other.shape().extent(0)]);
        let (a, b) = (self.to_vec(), other.to_vec());
        let mut data = Vec::with_capacity(out_shape.numel());
        for &x in &a {
            data.extend(b.iter().map(|&y| x * y));
        }
        Ok(Tensor::wrap(data, out_shape))
    }

    /// Rank-1 update in place: `out[i, j] = update(out[i, j], self[i] * other[j])`.
    ///
    /// The vectors are read before `out` is written, so they may alias it.
    pub fn outer_prod_into(
        &self,
        other: &Tensor,
        out: &Tensor,
        update: impl Fn(f64, f64) -> f64,
    ) -> Result<()> {
        check_rank("outer_prod_into", self, 1)?;
        check_rank("outer_prod_into", other, 1)?;
        check_rank("outer_prod_into", out, 2)?;
        let prod_shape = Shape::from_extents(&[self.shape().extent(0), other.shape().extent(0)]);
        if !prod_shape.broadcasts_into(out.shape()) {
            return Err(StrixError::BroadcastInto {
                from: prod_shape,
                to: out.shape().clone(),
            });
        }

        let (a, b) = (self.to_vec(), other.to_vec());
        let (h, w) = (out.shape().arith_extent(0), out.shape().arith_extent(1));
        let idx = out.indexer();
        let mut data = out.storage().write();
        for i in 0..h {
            let x = vec_at(&a, i);
            for j in 0..w {
                let pos = idx.coords_to_offset(&[i, j]);
                data[pos] = update(data[pos], x * vec_at(&b, j));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m23() -> Tensor {
        // [[1, 2, 3], [4, 5, 6]]
        Tensor::from_flat(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], [2, 3]).unwrap()
    }

    #[test]
    fn test_mat_mul() {
        let a = m23();
        let b = a.t().unwrap();
        let c = a.mat_mul(&b).unwrap();
        assert_eq!(c.shape(), &Shape::new(&[2, 2]));
        assert_eq!(c.to_vec(), vec![14.0, 32.0, 32.0, 77.0]);

        let d = b.mat_mul(&a).unwrap();
        assert_eq!(d.shape(), &Shape::new(&[3, 3]));
        assert_eq!(d.get(&[2, 1]).unwrap(), 3.0 * 2.0 + 6.0 * 5.0);
    }

    #[test]
    fn test_mat_vec_products() {
        let a = m23();
        let v3 = Tensor::vector(vec![1.0, 0.0, -1.0]);
        assert_eq!(a.mat_mul_vec(&v3).unwrap().to_vec(), vec![-2.0, -2.0]);
        assert_eq!(a.mat_mul(&v3).unwrap().to_vec(), vec![-2.0, -2.0]);

        let v2 = Tensor::vector(vec![1.0, 1.0]);
        assert_eq!(v2.vec_mul_mat(&a).unwrap().to_vec(), vec![5.0, 7.0, 9.0]);
        assert_eq!(v2.mat_mul(&a).unwrap().to_vec(), vec![5.0, 7.0, 9.0]);
    }

    #[test]
    fn test_shape_errors() {
        let a = m23();
        assert!(matches!(
            a.mat_mul(&a),
            Err(StrixError::MatmulDimMismatch { .. })
        ));
        assert!(matches!(
            a.mat_mul(&Tensor::zeros([2, 3, 1])),
            Err(StrixError::RankMismatch { op: "mat_mul", .. })
        ));
        let unbound = Tensor::scalar(1.0).broadcast_on(&[0]).unwrap();
        assert!(matches!(
            a.mat_mul_vec(&unbound),
            Err(StrixError::MatmulDimMismatch { .. })
        ));
    }

    #[test]
    fn test_dot() {
        let a = Tensor::vector(vec![1.0, 2.0, 3.0]);
        let b = Tensor::vector(vec![4.0, 5.0, 6.0]);
        assert_eq!(a.dot(&b).unwrap(), 32.0);
        assert!(a.dot(&Tensor::vector(vec![1.0])).is_err());
        assert!(matches!(
            a.dot(&m23()),
            Err(StrixError::RankMismatch { op: "dot", .. })
        ));
    }

    #[test]
    fn test_outer_prod() {
        let a = Tensor::vector(vec![1.0, 2.0]);
        let b = Tensor::vector(vec![3.0, 4.0, 5.0]);
        let o = a.outer_prod(&b).unwrap();
        assert_eq!(o.shape(), &Shape::new(&[2, 3]));
        assert_eq!(o.to_vec(), vec![3.0, 4.0, 5.0, 6.0, 8.0, 10.0]);
    }

    #[test]
    fn test_outer_prod_into_view() {
        let out = Tensor::zeros([3, 3]);
        let corner = out
            .slice(&[crate::ops::SliceSpec::range(1, 3), crate::ops::SliceSpec::range(1, 3)])
            .unwrap();
        let v = Tensor::vector(vec![1.0, 2.0]);
        v.outer_prod_into(&v, &corner, |x, y| x - 2.0 * y).unwrap();
        assert_eq!(
            out.to_vec(),
            vec![0.0, 0.0, 0.0, 0.0, -2.0, -4.0, 0.0, -4.0, -8.0]
        );
    }

    #[test]
    fn test_outer_prod_into_aliased_vector() {
        let m = Tensor::from_flat(vec![1.0, 2.0, 3.0, 4.0], [2, 2]).unwrap();
        let row = m.slice(&[crate::ops::SliceSpec::Index(0)]).unwrap();
        row.outer_prod_into(&row, &m, |x, y| x + y).unwrap();
        // row is read before any write: [1, 2] ⊗ [1, 2]
        assert_eq!(m.to_vec(), vec![2.0, 4.0, 5.0, 8.0]);
    }
}
