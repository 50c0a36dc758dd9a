//! Nested-list literal form of a tensor.

use serde::{Deserialize, Serialize};

use crate::error::StrixError;
use crate::shape::Shape;
use crate::tensor::Tensor;
use crate::Result;

/// A number or a list of nested values, e.g. `[[1, 2], [3, 4]]`.
///
/// Serializes untagged, so JSON nested arrays map directly onto it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Nested {
    Scalar(f64),
    List(Vec<Nested>),
}

impl From<f64> for Nested {
    fn from(v: f64) -> Self {
        Nested::Scalar(v)
    }
}

impl<T: Into<Nested>> From<Vec<T>> for Nested {
    fn from(items: Vec<T>) -> Self {
        Nested::List(items.into_iter().map(Into::into).collect())
    }
}

impl Nested {
    /// Shape implied by following the first element at every level. An empty
    /// list contributes extent 0 and ends the descent.
    fn infer_shape(&self) -> Shape {
        let mut shape = Shape::scalar();
        let mut node = self;
        while let Nested::List(items) = node {
            shape.push(Some(items.len()));
            match items.first() {
                Some(first) => node = first,
                None => break,
            }
        }
        shape
    }

    fn flatten_into(&self, dims: &[usize], depth: usize, out: &mut Vec<f64>) -> Result<()> {
        match (self, dims.get(depth)) {
            (Nested::Scalar(v), None) => {
                out.push(*v);
                Ok(())
            }
            (Nested::List(items), Some(&extent)) if items.len() == extent => items
                .iter()
                .try_for_each(|item| item.flatten_into(dims, depth + 1, out)),
            (Nested::List(items), Some(&extent)) => Err(StrixError::MalformedNested(format!(
                "irregular shape: expected {extent} items at depth {depth}, found {}",
                items.len()
            ))),
            (Nested::Scalar(v), Some(_)) => Err(StrixError::MalformedNested(format!(
                "found number {v} where a list was expected at depth {depth}"
            ))),
            (Nested::List(_), None) => Err(StrixError::MalformedNested(format!(
                "found a list where a number was expected at depth {depth}"
            ))),
        }
    }
}

impl Tensor {
    /// Build a contiguous tensor from nested lists.
    pub fn from_nested(nested: &Nested) -> Result<Tensor> {
        let shape = nested.infer_shape();
        let dims = shape.dims();
        let mut data = Vec::with_capacity(shape.numel());
        nested.flatten_into(&dims, 0, &mut data)?;
        Ok(Tensor::wrap(data, shape))
    }

    /// Nested-list form in canonical order. Unbound axes contribute one item.
    pub fn to_nested(&self) -> Nested {
        fn build(dims: &[usize], values: &mut impl Iterator<Item = f64>) -> Nested {
            match dims.split_first() {
                None => Nested::Scalar(values.next().unwrap_or(f64::NAN)),
                Some((&extent, rest)) => {
                    Nested::List((0..extent).map(|_| build(rest, &mut *values)).collect())
                }
            }
        }
        build(&self.shape().dims(), &mut self.to_vec().into_iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_nested() {
        let n: Nested = vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]].into();
        let t = Tensor::from_nested(&n).unwrap();
        assert_eq!(t.shape(), &Shape::new(&[2, 3]));
        assert_eq!(t.to_vec(), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_scalar_and_empty() {
        let s = Tensor::from_nested(&Nested::Scalar(4.0)).unwrap();
        assert!(s.shape().is_scalar());
        assert_eq!(s.item().unwrap(), 4.0);

        let e = Tensor::from_nested(&Nested::List(vec![])).unwrap();
        assert_eq!(e.shape(), &Shape::new(&[0]));
    }

    #[test]
    fn test_malformed() {
        let irregular: Nested = vec![vec![1.0, 2.0], vec![3.0]].into();
        assert!(matches!(
            Tensor::from_nested(&irregular),
            Err(StrixError::MalformedNested(_))
        ));

        let mixed = Nested::List(vec![vec![1.0, 2.0].into(), Nested::Scalar(3.0)]);
        assert!(matches!(
            Tensor::from_nested(&mixed),
            Err(StrixError::MalformedNested(_))
        ));

        let too_deep = Nested::List(vec![Nested::Scalar(1.0), vec![2.0].into()]);
        assert!(Tensor::from_nested(&too_deep).is_err());
    }

    #[test]
    fn test_to_nested_of_view() {
        let t = Tensor::from_flat(vec![1.0, 2.0, 3.0, 4.0], [2, 2]).unwrap();
        let expected: Nested = vec![vec![1.0, 3.0], vec![2.0, 4.0]].into();
        assert_eq!(t.t().unwrap().to_nested(), expected);
    }

    #[test]
    fn test_json_round_trip() {
        let n: Nested = serde_json::from_str("[[1, 2.5], [3, -4]]").unwrap();
        let t = Tensor::from_nested(&n).unwrap();
        assert_eq!(t.to_vec(), vec![1.0, 2.5, 3.0, -4.0]);

        let json = serde_json::to_string(&t.to_nested()).unwrap();
        let back: Nested = serde_json::from_str(&json).unwrap();
        assert_eq!(Tensor::from_nested(&back).unwrap(), t);
    }
}
