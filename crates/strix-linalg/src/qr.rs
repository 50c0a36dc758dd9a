//! Shifted implicit QR on a symmetric tridiagonal matrix.
//!
//! The matrix is held as a band: each row keeps the entries in columns
//! `r-1 ..= r+2`, the last slot holding the fill created by a sweep. The
//! eigenvector accumulator is a dense row-major `n × n` buffer.

use strix_core::{Result, Tensor};

use crate::options::EigOptions;
use crate::square_extent;

/// Eigen decomposition: `vecs · diag(vals) · vecsᵀ` reproduces the input.
#[derive(Clone, Debug)]
pub struct Eigen {
    /// Eigenvalues, in diagonal order (not sorted).
    pub vals: Tensor,
    /// Eigenvectors as columns, when requested.
    pub vecs: Option<Tensor>,
}

/// Shift for the 2×2 block `[[a, b], [c, d]]`.
///
/// Returns the block eigenvalue of smaller magnitude.
pub fn qr_shift(a: f64, b: f64, c: f64, d: f64) -> f64 {
    let trace = a + d;
    let desc = ((a - d) * (a - d) + 4.0 * b * c).sqrt();
    if trace > 0.0 {
        (trace - desc) / 2.0
    } else {
        (trace + desc) / 2.0
    }
}

/// Band storage of a tridiagonal matrix plus one column of fill.
struct Band {
    rows: Vec<[f64; 4]>,
    /// Largest input magnitude. Couplings below `EPSILON * scale` are
    /// rounding noise.
    scale: f64,
}

impl Band {
    fn from_tensor(t: &Tensor, n: usize) -> Result<Self> {
        let mut rows = vec![[0.0; 4]; n];
        for (r, row) in rows.iter_mut().enumerate() {
            for c in r.saturating_sub(1)..(r + 2).min(n) {
                row[c + 1 - r] = t.get(&[r, c])?;
            }
        }
        let scale = rows.iter().flatten().fold(0.0, |m: f64, x| m.max(x.abs()));
        Ok(Self { rows, scale })
    }

    #[inline]
    fn at(&self, r: usize, c: usize) -> f64 {
        self.rows[r][c + 1 - r]
    }

    #[inline]
    fn set(&mut self, r: usize, c: usize, value: f64) {
        self.rows[r][c + 1 - r] = value;
    }

    fn diagonal(&self) -> Vec<f64> {
        self.rows.iter().map(|row| row[1]).collect()
    }

    /// Relative size of the coupling between `start` and `start + 1`, or 0
    /// once the coupling is negligible against the whole matrix.
    fn deviation(&self, start: usize) -> f64 {
        let numer = self.at(start, start + 1);
        if numer.abs() <= f64::EPSILON * self.scale {
            0.0
        } else {
            (numer / self.at(start, start)).abs()
        }
    }
}

/// Dense row-major accumulator of the applied rotations.
struct Rotations {
    n: usize,
    data: Vec<f64>,
}

impl Rotations {
    fn identity(n: usize) -> Self {
        let mut data = vec![0.0; n * n];
        for i in 0..n {
            data[i * n + i] = 1.0;
        }
        Self { n, data }
    }

    /// Rotate columns `(i, i + 1)` over rows `0..rows`.
    fn rotate(&mut self, i: usize, rows: usize, cos: f64, sin: f64) {
        for row in self.data.chunks_exact_mut(self.n).take(rows) {
            let (x, y) = (row[i], row[i + 1]);
            row[i] = cos * x + sin * y;
            row[i + 1] = cos * y - sin * x;
        }
    }
}

/// One shifted QR sweep over the active block `start..n`.
///
/// `sweeps` counts the sweeps completed before this one. Column `c` of the
/// accumulator is nonzero only in rows `<= c + sweeps`, so rotation `i` only
/// needs rows below `i + 2 + sweeps`.
fn qr_sweep(
    band: &mut Band,
    mut vecs: Option<&mut Rotations>,
    start: usize,
    sweeps: usize,
    rots: &mut [(f64, f64)],
) {
    let n = band.rows.len();
    let shift = qr_shift(
        band.at(start, start),
        band.at(start, start + 1),
        band.at(start, start + 1),
        band.at(start + 1, start + 1),
    );
    for r in start..n {
        band.rows[r][1] -= shift;
    }

    for i in start..n - 1 {
        let dx = band.at(i, i);
        let dy = band.at(i + 1, i);
        let dr = dx.hypot(dy);
        if dr == 0.0 {
            rots[i] = (1.0, 0.0);
            continue;
        }
        let (cos, sin) = (dx / dr, dy / dr);
        if let Some(v) = vecs.as_deref_mut() {
            v.rotate(i, (i + 2 + sweeps).min(n), cos, sin);
        }

        let next_dx = band.at(i, i + 1);
        let next_dy = band.at(i + 1, i + 1);
        band.set(i, i, dr);
        band.set(i + 1, i, 0.0);
        band.set(i, i + 1, cos * next_dx + sin * next_dy);
        band.set(i + 1, i + 1, cos * next_dy - sin * next_dx);
        if i + 2 < n {
            let last_dy = band.at(i + 1, i + 2);
            band.set(i, i + 2, sin * last_dy);
            band.set(i + 1, i + 2, cos * last_dy);
        }
        rots[i] = (cos, sin);
    }

    for i in start..n - 1 {
        let (cos, sin) = rots[i];
        if i > start {
            let prev_dx = band.at(i - 1, i);
            let prev_dy = band.at(i - 1, i + 1);
            band.set(i - 1, i, cos * prev_dx + sin * prev_dy);
            band.set(i - 1, i + 1, 0.0);
        }

        let dx = band.at(i, i);
        let dy = band.at(i, i + 1);
        band.set(i, i, cos * dx + sin * dy);
        band.set(i, i + 1, cos * dy - sin * dx);

        let next_dx = band.at(i + 1, i);
        let next_dy = band.at(i + 1, i + 1);
        band.set(i + 1, i, cos * next_dx + sin * next_dy);
        band.set(i + 1, i + 1, cos * next_dy - sin * next_dx);
    }

    for r in start..n {
        band.rows[r][1] += shift;
    }
}

/// Diagonalize a symmetric tridiagonal matrix.
///
/// Deflates from the top: index `start` is done once its coupling to
/// `start + 1` falls within `opts.tolerance` of `T[start, start]`, or
/// within machine precision of the largest entry. Running out of `max_iter`
/// sweeps on an index is logged and the current approximation is kept.
pub fn tridiagonal_eig(tridiagonal: &Tensor, opts: &EigOptions) -> Result<Eigen> {
    let n = square_extent(tridiagonal)?;
    let mut band = Band::from_tensor(tridiagonal, n)?;
    let mut vecs = opts.include_vecs.then(|| Rotations::identity(n));
    let mut rots = vec![(1.0, 0.0); n.saturating_sub(1)];

    let mut sweeps = 0usize;
    for start in 0..n.saturating_sub(1) {
        let mut iters = 0usize;
        while band.deviation(start) > opts.tolerance {
            if opts.max_iter.is_some_and(|max| iters >= max) {
                tracing::warn!(
                    start,
                    iters,
                    deviation = band.deviation(start),
                    "QR iteration limit reached before convergence"
                );
                break;
            }
            qr_sweep(&mut band, vecs.as_mut(), start, sweeps, &mut rots);
            iters += 1;
            sweeps += 1;
            tracing::trace!(start, iters, deviation = band.deviation(start), "QR sweep");
        }
    }
    tracing::debug!(n, sweeps, "tridiagonal eigen decomposition done");

    let vals = Tensor::vector(band.diagonal());
    let vecs = match vecs {
        Some(v) => Some(Tensor::from_flat(v.data, [n, n])?),
        None => None,
    };
    Ok(Eigen { vals, vecs })
}

#[cfg(test)]
mod tests {
    use super::*;
    use strix_core::StrixError;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn test_qr_shift() {
        assert_eq!(qr_shift(1.0, 0.0, 0.0, 2.0), 1.0);
        assert_eq!(qr_shift(-1.0, 0.0, 0.0, 2.0), -1.0);
        assert_eq!(qr_shift(2.0, 0.0, 0.0, -1.0), -1.0);
        assert_eq!(qr_shift(2.0, 1.0, 1.0, 2.0), 1.0);
        assert_eq!(qr_shift(3.0, 1.0, 4.0, 3.0), 1.0);
        assert_eq!(qr_shift(0.0, -2.0, -2.0, 0.0).abs(), 2.0);
    }

    #[test]
    fn test_band_layout() {
        let t = Tensor::from_flat(vec![1.0, 2.0, 0.0, 2.0, 3.0, 4.0, 0.0, 4.0, 5.0], [3, 3]).unwrap();
        let band = Band::from_tensor(&t, 3).unwrap();
        assert_eq!(band.rows[0], [0.0, 1.0, 2.0, 0.0]);
        assert_eq!(band.rows[1], [2.0, 3.0, 4.0, 0.0]);
        assert_eq!(band.rows[2], [4.0, 5.0, 0.0, 0.0]);
        assert_eq!(band.diagonal(), vec![1.0, 3.0, 5.0]);
        assert!(close(band.deviation(0), 2.0, 0.0));
        assert_eq!(band.scale, 5.0);
    }

    #[test]
    fn test_two_by_two() {
        let t = Tensor::from_flat(vec![1.0, -2.0, -2.0, 1.0], [2, 2]).unwrap();
        let eig = tridiagonal_eig(&t, &EigOptions::default()).unwrap();
        let mut vals = eig.vals.to_vec();
        vals.sort_by(f64::total_cmp);
        assert!(close(vals[0], -1.0, 1e-8));
        assert!(close(vals[1], 3.0, 1e-8));
    }

    #[test]
    fn test_diagonal_input_is_fixed_point() {
        let t = Tensor::diagonal(&[4.0, -1.0, 2.0]);
        let eig = tridiagonal_eig(&t, &EigOptions::default()).unwrap();
        assert_eq!(eig.vals.to_vec(), vec![4.0, -1.0, 2.0]);
        assert_eq!(eig.vecs.unwrap(), Tensor::identity(3));
    }

    #[test]
    fn test_max_iter_returns_approximation() {
        let t = Tensor::from_flat(
            vec![2.0, 1.0, 0.0, 1.0, 2.0, 1.0, 0.0, 1.0, 2.0],
            [3, 3],
        )
        .unwrap();
        let eig = tridiagonal_eig(&t, &EigOptions::default().with_max_iter(1)).unwrap();
        assert_eq!(eig.vals.numel(), 3);
        let trace: f64 = eig.vals.to_vec().iter().sum();
        assert!(close(trace, 6.0, 1e-12));
    }

    #[test]
    fn test_zero_eigenvalue_deflates() {
        // At a zero eigenvalue the coupling and the diagonal entry are both
        // rounding noise, so their ratio stays large.
        let t = Tensor::from_flat(
            vec![3.0, 0.0, 0.0, 0.0, -1.3e-16, 2.0e-16, 0.0, 2.0e-16, 6.0e-33],
            [3, 3],
        )
        .unwrap();
        let band = Band::from_tensor(&t, 3).unwrap();
        assert_eq!(band.scale, 3.0);
        assert_eq!(band.deviation(1), 0.0);

        let eig = tridiagonal_eig(&t, &EigOptions::default()).unwrap();
        assert_eq!(eig.vals.to_vec()[0], 3.0);
        assert_eq!(eig.vecs.unwrap(), Tensor::identity(3));
    }

    #[test]
    fn test_without_vecs() {
        let t = Tensor::from_flat(vec![1.0, 1.0, 1.0, 1.0], [2, 2]).unwrap();
        let eig = tridiagonal_eig(&t, &EigOptions::default().with_vecs(false)).unwrap();
        assert!(eig.vecs.is_none());
    }

    #[test]
    fn test_degenerate_sizes() {
        let one = Tensor::from_flat(vec![3.0], [1, 1]).unwrap();
        let eig = tridiagonal_eig(&one, &EigOptions::default()).unwrap();
        assert_eq!(eig.vals.to_vec(), vec![3.0]);
        assert_eq!(eig.vecs.unwrap().to_vec(), vec![1.0]);

        let empty = tridiagonal_eig(&Tensor::zeros([0, 0]), &EigOptions::default()).unwrap();
        assert_eq!(empty.vals.numel(), 0);

        assert!(matches!(
            tridiagonal_eig(&Tensor::zeros([2, 1]), &EigOptions::default()),
            Err(StrixError::NotSquare(_))
        ));
    }
}
