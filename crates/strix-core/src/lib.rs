//! # strix-core
//!
//! Strided tensor engine for the Strix linear-algebra toolkit.
//!
//! Provides the foundational `Tensor` type with:
//! - Shared `f64` storage and zero-copy views (slice, transpose, broadcast_on)
//! - Unbound (broadcast) axes
//! - An indexing engine that specializes offset computation per layout
//!   signature and caches the resulting plans
//! - Element-wise, reduction and dense matrix operations

pub mod creation;
pub mod error;
pub mod index;
pub mod layout;
pub mod nested;
pub mod ops;
pub mod prelude;
pub mod shape;
pub mod storage;
pub mod tensor;

pub use error::StrixError;
pub use index::IndexCache;
pub use layout::Layout;
pub use nested::Nested;
pub use shape::Shape;
pub use storage::Storage;
pub use tensor::Tensor;

pub type Result<T> = std::result::Result<T, StrixError>;
