//! Tensor operations: views, element-wise, reduction, linear algebra,
//! combination.
//!
//! Value-producing operations return new contiguous tensors. In-place
//! variants carry an `_in_place`/`_into` suffix or write through `assign`.

pub mod combine;
pub mod elementwise;
pub mod matmul;
pub mod reduction;
pub mod view;

pub use elementwise::Operand;
pub use reduction::{ArgOptions, ArgResult, ReduceOptions, Reduction};
pub use view::SliceSpec;
