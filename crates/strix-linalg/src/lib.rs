//! # strix-linalg
//!
//! Symmetric eigensolver built on `strix-core` tensors.
//!
//! A real symmetric matrix is first reduced to tridiagonal form with
//! Householder reflections ([`sym_hessenberg`]), then diagonalized with
//! shifted implicit QR sweeps ([`tridiagonal_eig`]). [`sym_eig`] chains
//! both phases.

pub mod householder;
pub mod options;
pub mod qr;
pub mod sym_eig;

pub use householder::{sym_hessenberg, Hessenberg};
pub use options::{EigOptions, HessenbergOptions};
pub use qr::{qr_shift, tridiagonal_eig, Eigen};
pub use sym_eig::sym_eig;

use strix_core::{Result, Shape, StrixError, Tensor};

/// Extent of a square, fully bound matrix.
pub(crate) fn square_extent(matrix: &Tensor) -> Result<usize> {
    let shape: &Shape = matrix.shape();
    match shape.extents() {
        [Some(h), Some(w)] if h == w => Ok(*h),
        _ => Err(StrixError::NotSquare(shape.clone())),
    }
}
