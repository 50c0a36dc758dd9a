//! Full symmetric eigen decomposition.

use strix_core::{Result, Tensor};

use crate::householder::sym_hessenberg;
use crate::options::EigOptions;
use crate::qr::{tridiagonal_eig, Eigen};

/// Eigenvalues and (optionally) eigenvectors of a real symmetric matrix.
///
/// Reduces the matrix to tridiagonal form, diagonalizes that, and maps the
/// tridiagonal eigenvectors back through the Householder factor. Symmetry
/// is a precondition and is not checked.
///
/// ```rust
/// use strix_core::Tensor;
/// use strix_linalg::{sym_eig, EigOptions};
///
/// let m = Tensor::from_flat(vec![2.0, 1.0, 1.0, 2.0], [2, 2]).unwrap();
/// let eig = sym_eig(&m, &EigOptions::default()).unwrap();
/// let mut vals = eig.vals.to_vec();
/// vals.sort_by(f64::total_cmp);
/// assert!((vals[0] - 1.0).abs() < 1e-8 && (vals[1] - 3.0).abs() < 1e-8);
/// ```
pub fn sym_eig(matrix: &Tensor, opts: &EigOptions) -> Result<Eigen> {
    let reduced = sym_hessenberg(matrix, opts.hessenberg())?;
    let eig = tridiagonal_eig(&reduced.hessenberg, opts)?;
    let vecs = match (reduced.q, eig.vecs) {
        (Some(q), Some(v)) => Some(q.mat_mul(&v)?),
        _ => None,
    };
    Ok(Eigen {
        vals: eig.vals,
        vecs,
    })
}
