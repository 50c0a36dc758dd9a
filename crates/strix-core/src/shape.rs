use smallvec::SmallVec;
use std::fmt;

/// Per-axis inline storage; most tensors have at most four axes.
pub type AxisVec<T> = SmallVec<[T; 4]>;

/// Tensor shape with stack-allocated storage for ≤4 axes.
///
/// Each axis is either bound to a concrete extent (`Some(n)`) or unbound
/// (`None`). An unbound axis is a broadcast placeholder: it has stride 0 and
/// takes its extent from whichever operand it is combined with.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Shape {
    extents: AxisVec<Option<usize>>,
}

impl Shape {
    /// Create a fully bound shape.
    pub fn new(dims: &[usize]) -> Self {
        Self {
            extents: dims.iter().map(|&d| Some(d)).collect(),
        }
    }

    /// Create a shape where `None` marks an unbound axis.
    pub fn from_extents(extents: &[Option<usize>]) -> Self {
        Self {
            extents: SmallVec::from_slice(extents),
        }
    }

    /// Scalar shape (0 axes).
    pub fn scalar() -> Self {
        Self {
            extents: SmallVec::new(),
        }
    }

    /// A shape of `ndim` unbound axes.
    pub fn unbound(ndim: usize) -> Self {
        Self {
            extents: SmallVec::from_elem(None, ndim),
        }
    }

    /// Number of axes.
    pub fn ndim(&self) -> usize {
        self.extents.len()
    }

    /// Number of canonical positions. Unbound axes count as extent 1.
    pub fn numel(&self) -> usize {
        self.extents.iter().map(|e| e.unwrap_or(1)).product()
    }

    pub fn extents(&self) -> &[Option<usize>] {
        &self.extents
    }

    /// Extent of `axis`, `None` if unbound or out of range.
    pub fn extent(&self, axis: usize) -> Option<usize> {
        self.extents.get(axis).copied().flatten()
    }

    /// Extent used for arithmetic: unbound axes count as 1.
    pub fn arith_extent(&self, axis: usize) -> usize {
        self.extent(axis).unwrap_or(1)
    }

    pub fn is_unbound(&self, axis: usize) -> bool {
        matches!(self.extents.get(axis), Some(None))
    }

    pub fn is_scalar(&self) -> bool {
        self.extents.is_empty()
    }

    /// Bound extents as plain numbers, with unbound axes folded to 1.
    pub fn dims(&self) -> AxisVec<usize> {
        self.extents.iter().map(|e| e.unwrap_or(1)).collect()
    }

    /// Default contiguous row-major strides and axis periods for this shape.
    pub fn strides_and_periods(&self) -> (AxisVec<isize>, AxisVec<usize>) {
        strides_and_periods(&self.extents)
    }

    /// Combine two shapes of equal rank. Per axis, extents must match or at
    /// least one side must be unbound; the result takes the bound extent.
    pub fn broadcast_with(&self, other: &Shape) -> Option<Shape> {
        if self.ndim() != other.ndim() {
            return None;
        }
        let mut extents = AxisVec::with_capacity(self.ndim());
        for (&a, &b) in self.extents.iter().zip(other.extents.iter()) {
            let side = match (a, b) {
                (Some(a), Some(b)) if a == b => Some(a),
                (Some(_), Some(_)) => return None,
                (Some(a), None) | (None, Some(a)) => Some(a),
                (None, None) => None,
            };
            extents.push(side);
        }
        Some(Shape { extents })
    }

    /// Whether this shape broadcasts into `target` without changing it:
    /// equal rank and, per axis, unbound here or equal to the target.
    pub fn broadcasts_into(&self, target: &Shape) -> bool {
        self.ndim() == target.ndim()
            && self
                .extents
                .iter()
                .zip(target.extents.iter())
                .all(|(&a, &b)| a.is_none() || a == b)
    }

    pub(crate) fn push(&mut self, extent: Option<usize>) {
        self.extents.push(extent);
    }

    pub(crate) fn set(&mut self, axis: usize, extent: Option<usize>) {
        self.extents[axis] = extent;
    }
}

/// Default contiguous strides and axis periods, computed right to left.
///
/// The innermost bound axis has stride 1. An unbound axis gets stride 0 and
/// counts as extent 1 in the running product. `periods[k]` is the running
/// product after including axis `k`, so a canonical position `j` decomposes as
/// `coord[k] = (j % periods[k]) / strides[k]` on bound axes.
pub fn strides_and_periods(extents: &[Option<usize>]) -> (AxisVec<isize>, AxisVec<usize>) {
    let ndim = extents.len();
    let mut strides = SmallVec::from_elem(0isize, ndim);
    let mut periods = SmallVec::from_elem(0usize, ndim);
    let mut running = 1usize;
    for k in (0..ndim).rev() {
        strides[k] = match extents[k] {
            Some(_) => running as isize,
            None => 0,
        };
        running *= extents[k].unwrap_or(1);
        periods[k] = running;
    }
    (strides, periods)
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Shape({self})")
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, e) in self.extents.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match e {
                Some(d) => write!(f, "{d}")?,
                None => write!(f, "_")?,
            }
        }
        write!(f, "]")
    }
}

impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Shape::new(dims)
    }
}

impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Shape::new(&dims)
    }
}

impl From<&[Option<usize>]> for Shape {
    fn from(extents: &[Option<usize>]) -> Self {
        Shape::from_extents(extents)
    }
}

impl From<&Shape> for Shape {
    fn from(shape: &Shape) -> Self {
        shape.clone()
    }
}

macro_rules! impl_shape_from_array {
    ($($n:expr),*) => {
        $(
            impl From<[usize; $n]> for Shape {
                fn from(dims: [usize; $n]) -> Self {
                    Shape::new(&dims)
                }
            }

            impl From<[Option<usize>; $n]> for Shape {
                fn from(extents: [Option<usize>; $n]) -> Self {
                    Shape::from_extents(&extents)
                }
            }
        )*
    };
}

impl_shape_from_array!(0, 1, 2, 3, 4, 5, 6);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar() {
        let s = Shape::scalar();
        assert_eq!(s.ndim(), 0);
        assert_eq!(s.numel(), 1);
        assert!(s.is_scalar());
    }

    #[test]
    fn test_strides_and_periods() {
        let (strides, periods) = Shape::new(&[7, 5, 2]).strides_and_periods();
        assert_eq!(strides.as_slice(), &[10, 2, 1]);
        assert_eq!(periods.as_slice(), &[70, 10, 2]);
    }

    #[test]
    fn test_unbound_axes_in_strides() {
        let s = Shape::from_extents(&[Some(3), None, Some(4)]);
        let (strides, periods) = s.strides_and_periods();
        assert_eq!(strides.as_slice(), &[4, 0, 1]);
        assert_eq!(periods.as_slice(), &[12, 4, 4]);
        assert_eq!(s.numel(), 12);

        let (strides, _) = Shape::from_extents(&[Some(2), None]).strides_and_periods();
        assert_eq!(strides.as_slice(), &[1, 0]);
    }

    #[test]
    fn test_broadcast() {
        let a = Shape::from_extents(&[Some(3), None]);
        let b = Shape::from_extents(&[None, Some(4)]);
        assert_eq!(a.broadcast_with(&b), Some(Shape::new(&[3, 4])));

        let c = Shape::from_extents(&[None, None]);
        assert_eq!(c.broadcast_with(&c), Some(Shape::unbound(2)));

        assert!(Shape::new(&[2, 3]).broadcast_with(&Shape::new(&[3])).is_none());
        assert!(Shape::new(&[2, 3]).broadcast_with(&Shape::new(&[4, 3])).is_none());
    }

    #[test]
    fn test_broadcasts_into() {
        let target = Shape::new(&[2, 3]);
        assert!(Shape::from_extents(&[None, Some(3)]).broadcasts_into(&target));
        assert!(Shape::new(&[2, 3]).broadcasts_into(&target));
        assert!(!target.broadcasts_into(&Shape::from_extents(&[None, Some(3)])));
        assert!(!Shape::new(&[3]).broadcasts_into(&target));
    }

    #[test]
    fn test_display() {
        let s = Shape::from_extents(&[Some(2), None, Some(4)]);
        assert_eq!(s.to_string(), "[2, _, 4]");
        assert_eq!(format!("{:?}", Shape::new(&[1])), "Shape([1])");
    }

    #[test]
    fn test_from_array() {
        let s: Shape = [2, 3].into();
        assert_eq!(s.dims().as_slice(), &[2, 3]);

        let s: Shape = [Some(2), None].into();
        assert!(s.is_unbound(1));
        assert_eq!(s.arith_extent(1), 1);
    }
}
