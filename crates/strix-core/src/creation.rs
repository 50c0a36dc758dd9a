//! Tensor constructors.

use rand::Rng;

use crate::error::StrixError;
use crate::shape::Shape;
use crate::tensor::Tensor;
use crate::Result;

impl Tensor {
    /// Create a tensor from row-major data with the given shape.
    pub fn from_flat(data: Vec<f64>, shape: impl Into<Shape>) -> Result<Tensor> {
        let shape = shape.into();
        if data.len() != shape.numel() {
            return Err(StrixError::DataLength {
                len: data.len(),
                shape,
            });
        }
        Ok(Tensor::wrap(data, shape))
    }

    /// Create a zero-axis tensor holding `value`.
    pub fn scalar(value: f64) -> Tensor {
        Tensor::wrap(vec![value], Shape::scalar())
    }

    /// Create a 1-D tensor.
    pub fn vector(data: Vec<f64>) -> Tensor {
        let shape = Shape::new(&[data.len()]);
        Tensor::wrap(data, shape)
    }

    /// Create the 1-D tensor `[0, 1, ..., n - 1]`.
    pub fn range(n: usize) -> Tensor {
        Tensor::vector((0..n).map(|i| i as f64).collect())
    }

    /// Create a tensor of `shape` filled with `value`.
    pub fn fill(shape: impl Into<Shape>, value: f64) -> Tensor {
        let shape = shape.into();
        Tensor::wrap(vec![value; shape.numel()], shape)
    }

    /// Create a tensor of zeros.
    pub fn zeros(shape: impl Into<Shape>) -> Tensor {
        Tensor::fill(shape, 0.0)
    }

    /// Create a tensor whose contents are meant to be overwritten. The buffer
    /// is zero-initialized.
    pub fn empty(shape: impl Into<Shape>) -> Tensor {
        Tensor::zeros(shape)
    }

    /// Create the `n × n` identity matrix.
    pub fn identity(n: usize) -> Tensor {
        let mut data = vec![0.0; n * n];
        for i in 0..n {
            data[i * n + i] = 1.0;
        }
        Tensor::wrap(data, Shape::new(&[n, n]))
    }

    /// Create a square matrix with `entries` on the diagonal.
    pub fn diagonal(entries: &[f64]) -> Tensor {
        let n = entries.len();
        let mut data = vec![0.0; n * n];
        for (i, &v) in entries.iter().enumerate() {
            data[i * n + i] = v;
        }
        Tensor::wrap(data, Shape::new(&[n, n]))
    }

    /// Create a tensor with values uniformly distributed in [low, high).
    pub fn rand_uniform(shape: impl Into<Shape>, low: f64, high: f64) -> Tensor {
        let shape = shape.into();
        let mut rng = rand::thread_rng();
        let data = (0..shape.numel()).map(|_| rng.gen_range(low..high)).collect();
        Tensor::wrap(data, shape)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_flat_length_check() {
        assert!(matches!(
            Tensor::from_flat(vec![1.0, 2.0, 3.0], [2, 2]),
            Err(StrixError::DataLength { len: 3, .. })
        ));
        let unbound = Tensor::from_flat(vec![5.0, 6.0], [None, Some(2)]).unwrap();
        assert_eq!(unbound.strides(), &[0, 1]);
    }

    #[test]
    fn test_scalar_vector_range() {
        assert!(Tensor::scalar(1.5).shape().is_scalar());
        assert_eq!(Tensor::vector(vec![1.0, 2.0]).shape(), &Shape::new(&[2]));
        assert_eq!(Tensor::range(4).to_vec(), vec![0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_fill_and_zeros() {
        let f = Tensor::fill([2, 2], 3.0);
        assert_eq!(f.to_vec(), vec![3.0; 4]);
        assert!(Tensor::zeros([3]).to_vec().iter().all(|&v| v == 0.0));
        assert_eq!(Tensor::empty([2, 3]).numel(), 6);
    }

    #[test]
    fn test_identity_and_diagonal() {
        let i = Tensor::identity(3);
        assert_eq!(i.get(&[1, 1]).unwrap(), 1.0);
        assert_eq!(i.get(&[0, 1]).unwrap(), 0.0);

        let d = Tensor::diagonal(&[1.0, 2.0]);
        assert_eq!(d.to_vec(), vec![1.0, 0.0, 0.0, 2.0]);
    }

    #[test]
    fn test_rand_uniform_range() {
        let t = Tensor::rand_uniform([10, 10], -1.0, 1.0);
        assert_eq!(t.numel(), 100);
        assert!(t.to_vec().iter().all(|&v| (-1.0..1.0).contains(&v)));
    }
}
