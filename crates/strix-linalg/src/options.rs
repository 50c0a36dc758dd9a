//! Solver configuration.

/// Options for [`crate::sym_hessenberg`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HessenbergOptions {
    /// Accumulate the orthogonal factor `q`.
    pub include_q: bool,
    /// Pivot when the largest subcolumn entry exceeds this multiple of the
    /// leading one.
    pub stability_ratio: f64,
}

impl Default for HessenbergOptions {
    fn default() -> Self {
        Self {
            include_q: true,
            stability_ratio: 1024.0,
        }
    }
}

impl HessenbergOptions {
    /// Builder: accumulate `q` or not.
    pub fn with_q(mut self, include_q: bool) -> Self {
        self.include_q = include_q;
        self
    }

    /// Builder: set the pivoting ratio.
    pub fn with_stability_ratio(mut self, ratio: f64) -> Self {
        self.stability_ratio = ratio;
        self
    }
}

/// Options for [`crate::sym_eig`] and [`crate::tridiagonal_eig`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EigOptions {
    /// Return eigenvectors alongside the eigenvalues.
    pub include_vecs: bool,
    /// Cap on QR sweeps per deflation index (None = until converged).
    pub max_iter: Option<usize>,
    /// Deflate once `|T[s, s+1] / T[s, s]|` drops to this value.
    pub tolerance: f64,
    /// Forwarded to the Householder phase.
    pub stability_ratio: f64,
}

impl Default for EigOptions {
    fn default() -> Self {
        Self {
            include_vecs: true,
            max_iter: None,
            tolerance: 1e-8,
            stability_ratio: 1024.0,
        }
    }
}

impl EigOptions {
    /// Builder: return eigenvectors or not.
    pub fn with_vecs(mut self, include_vecs: bool) -> Self {
        self.include_vecs = include_vecs;
        self
    }

    /// Builder: cap the sweeps per index.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = Some(max_iter);
        self
    }

    /// Builder: set the deflation tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Builder: set the Householder pivoting ratio.
    pub fn with_stability_ratio(mut self, ratio: f64) -> Self {
        self.stability_ratio = ratio;
        self
    }

    pub(crate) fn hessenberg(&self) -> HessenbergOptions {
        HessenbergOptions {
            include_q: self.include_vecs,
            stability_ratio: self.stability_ratio,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let h = HessenbergOptions::default();
        assert!(h.include_q);
        assert_eq!(h.stability_ratio, 1024.0);

        let e = EigOptions::default();
        assert!(e.include_vecs);
        assert_eq!(e.max_iter, None);
        assert_eq!(e.tolerance, 1e-8);
    }

    #[test]
    fn test_builders() {
        let e = EigOptions::default()
            .with_vecs(false)
            .with_max_iter(50)
            .with_tolerance(1e-12)
            .with_stability_ratio(8.0);
        assert_eq!(e.max_iter, Some(50));
        assert_eq!(e.tolerance, 1e-12);

        let h = e.hessenberg();
        assert!(!h.include_q);
        assert_eq!(h.stability_ratio, 8.0);
        assert_eq!(HessenbergOptions::default().with_q(false).with_stability_ratio(2.0).stability_ratio, 2.0);
    }
}
