//! Householder reduction of a symmetric matrix to tridiagonal form.
//!
//! Every step works on views of the working copy: the subcolumn under the
//! diagonal, the trailing submatrix and the trailing columns of `q`. The
//! reflections are applied as rank-1 updates through `outer_prod_into`.

use strix_core::ops::{ArgOptions, ReduceOptions, SliceSpec};
use strix_core::{Result, Tensor};

use crate::options::HessenbergOptions;
use crate::square_extent;

/// Output of [`sym_hessenberg`]: `q · hessenberg · qᵀ` reproduces the input.
#[derive(Clone, Debug)]
pub struct Hessenberg {
    /// Tridiagonal matrix. Entries off the band are exactly zero.
    pub hessenberg: Tensor,
    /// Orthogonal factor, when requested.
    pub q: Option<Tensor>,
}

/// Reduce a symmetric matrix to tridiagonal form.
///
/// The input is copied and left untouched. Symmetry is assumed, not checked.
pub fn sym_hessenberg(matrix: &Tensor, opts: HessenbergOptions) -> Result<Hessenberg> {
    let n = square_extent(matrix)?;
    let h = matrix.copy();
    let q = opts.include_q.then(|| Tensor::identity(n));

    for i in 0..n.saturating_sub(2) {
        let below = SliceSpec::range(i as isize + 1, n as isize);
        let col = h.slice(&[below, SliceSpec::Index(i)])?;

        let (arg, largest) = largest_magnitude(&col)?;
        let first = col.get(&[0])?;
        if largest > opts.stability_ratio * first.abs() {
            let (a, b) = (i + 1, i + 1 + arg);
            swap_symmetric(&h, i, a, b)?;
            if let Some(q) = &q {
                swap_columns(q, SliceSpec::Full, a, b)?;
            }
            tracing::debug!(step = i, pivot = b, "pivoted householder column");
        }

        let v = col.copy();
        let norm = v.norm(ReduceOptions::all())?.scalar().unwrap_or(0.0);
        if norm == 0.0 {
            continue;
        }
        let lead = v.get(&[0])?;
        let sign = if lead < 0.0 { -1.0 } else { 1.0 };
        v.update(&[0], |x| x + sign * norm)?;
        let v_norm = v.norm(ReduceOptions::all())?.scalar().unwrap_or(1.0);
        v.map_in_place(|x| x / v_norm);

        let off_diag = h.get(&[i + 1, i])? - 2.0 * v.get(&[0])? * v.dot(&col)?;

        let sub = h.slice(&[below, below])?;
        let row_terms = v.vec_mul_mat(&sub)?;
        v.outer_prod_into(&row_terms, &sub, |x, y| x - 2.0 * y)?;
        let col_terms = sub.mat_mul_vec(&v)?;
        col_terms.outer_prod_into(&v, &sub, |x, y| x - 2.0 * y)?;

        h.set(&[i + 1, i], off_diag)?;
        h.set(&[i, i + 1], off_diag)?;
        let beyond = SliceSpec::range(i as isize + 2, n as isize);
        h.slice(&[SliceSpec::Index(i), beyond])?.set_all(0.0);
        h.slice(&[beyond, SliceSpec::Index(i)])?.set_all(0.0);

        if let Some(q) = &q {
            // Row 0 of q stays e0 in every trailing column.
            let q_sub = q.slice(&[SliceSpec::range(1, n as isize), below])?;
            let q_terms = q_sub.mat_mul_vec(&v)?;
            q_terms.outer_prod_into(&v, &q_sub, |x, y| x - 2.0 * y)?;
        }
    }

    Ok(Hessenberg { hessenberg: h, q })
}

/// Position and magnitude of the largest-magnitude entry of a vector.
fn largest_magnitude(col: &Tensor) -> Result<(usize, f64)> {
    let found = col
        .map(f64::abs)
        .argmax(ArgOptions::default().include_values(true))?;
    let arg = found.indices.scalar().unwrap_or(0.0).max(0.0) as usize;
    let value = found
        .values
        .and_then(|v| v.scalar())
        .unwrap_or(0.0);
    Ok((arg, value))
}

/// Swap rows and columns `a` and `b` of a symmetric matrix, restricted to
/// indices `>= from`.
fn swap_symmetric(m: &Tensor, from: usize, a: usize, b: usize) -> Result<()> {
    let n = m.shape().arith_extent(0) as isize;
    let tail = SliceSpec::range(from as isize, n);
    swap_columns(m, tail, a, b)?;
    swap_rows(m, tail, a, b)
}

fn swap_columns(m: &Tensor, rows: SliceSpec, a: usize, b: usize) -> Result<()> {
    let col_a = m.slice(&[rows, SliceSpec::Index(a)])?;
    let col_b = m.slice(&[rows, SliceSpec::Index(b)])?;
    let saved = col_a.copy();
    col_a.assign(&col_b)?;
    col_b.assign(&saved)
}

fn swap_rows(m: &Tensor, cols: SliceSpec, a: usize, b: usize) -> Result<()> {
    let row_a = m.slice(&[SliceSpec::Index(a), cols])?;
    let row_b = m.slice(&[SliceSpec::Index(b), cols])?;
    let saved = row_a.copy();
    row_a.assign(&row_b)?;
    row_b.assign(&saved)
}
