use crate::shape::Shape;

/// Errors raised by tensor construction, views and operations.
///
/// Every variant is a synchronous, fatal fault for the call that raised it.
/// Shape-related variants carry the offending shapes or axes.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StrixError {
    #[error("shape mismatch: expected {expected}, got {got}")]
    ShapeMismatch { expected: Shape, got: Shape },

    #[error("shapes do not broadcast: {left} vs {right} (use broadcast_on)")]
    Broadcast { left: Shape, right: Shape },

    #[error("shape {from} cannot be broadcast into {to}")]
    BroadcastInto { from: Shape, to: Shape },

    #[error("invalid axis {axis} for {ndim}-d tensor")]
    InvalidAxis { axis: usize, ndim: usize },

    #[error("invalid permutation {perm:?} for {ndim}-d tensor")]
    InvalidPermutation { perm: Vec<usize>, ndim: usize },

    #[error("cannot reshape {numel} elements into {shape}")]
    InvalidReshape { numel: usize, shape: Shape },

    #[error("data length {len} does not agree with shape {shape}")]
    DataLength { len: usize, shape: Shape },

    #[error("malformed nested data: {0}")]
    MalformedNested(String),

    #[error("invalid layout: {0}")]
    InvalidLayout(String),

    #[error("invalid slice: {0}")]
    InvalidSlice(String),

    #[error("coordinates {coords:?} out of bounds for shape {shape}")]
    IndexOutOfBounds { coords: Vec<usize>, shape: Shape },

    #[error("{op} expects a {expected}-d tensor, got {got}-d")]
    RankMismatch {
        op: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("mismatched inner dimensions: {left} vs {right}")]
    MatmulDimMismatch { left: Shape, right: Shape },

    #[error("expected a square matrix, got {0}")]
    NotSquare(Shape),

    #[error("cannot combine tensors: {0}")]
    Combine(String),

    #[error("{0}: empty tensor list")]
    EmptyList(&'static str),
}
