//! Convenience re-exports for common strix-core types.
//!
//! ```rust
//! use strix_core::prelude::*;
//! ```

pub use crate::ops::{ArgOptions, ArgResult, Operand, ReduceOptions, Reduction, SliceSpec};
pub use crate::IndexCache;
pub use crate::Nested;
pub use crate::Result;
pub use crate::Shape;
pub use crate::StrixError;
pub use crate::Tensor;
