use std::fmt;

use crate::error::StrixError;
use crate::index::{Frame, IndexCache, Indexer};
use crate::layout::Layout;
use crate::shape::Shape;
use crate::storage::Storage;
use crate::Result;

/// A strided view over shared `f64` storage.
///
/// Tensors support:
/// - Arbitrary strides and offsets, including negative steps
/// - Unbound (broadcast) axes with stride 0
/// - Zero-copy views (slice, transpose, broadcast_on share storage)
///
/// Cloning a tensor clones the storage handle, so the clone aliases the same
/// buffer. Use [`Tensor::copy`] for an independent contiguous tensor.
///
/// # Examples
///
/// ```
/// use strix_core::Tensor;
///
/// let t = Tensor::from_flat(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], [2, 3]).unwrap();
/// assert_eq!(t.dims(), 2);
/// assert_eq!(t.get(&[1, 2]).unwrap(), 6.0);
///
/// let col = t.transpose(None).unwrap();
/// col.set(&[2, 0], 30.0).unwrap();
/// assert_eq!(t.get(&[0, 2]).unwrap(), 30.0);
/// ```
#[derive(Clone)]
pub struct Tensor {
    storage: Storage,
    layout: Layout,
}

impl Tensor {
    // =========================================================================
    // Constructors
    // =========================================================================

    /// Create a view over existing storage with an explicit layout.
    ///
    /// Fails if any element of the layout falls outside the buffer.
    pub fn from_storage(storage: Storage, layout: Layout) -> Result<Self> {
        if let Some((lo, hi)) = layout.offset_bounds() {
            let len = storage.len() as isize;
            if lo < 0 || hi >= len {
                return Err(StrixError::InvalidLayout(format!(
                    "layout spans offsets {lo}..={hi} over a buffer of {len} elements"
                )));
            }
        }
        Ok(Self { storage, layout })
    }

    /// Wrap a buffer with contiguous strides. `data.len()` must equal
    /// `shape.numel()`.
    pub(crate) fn wrap(data: Vec<f64>, shape: Shape) -> Self {
        debug_assert_eq!(data.len(), shape.numel());
        Self {
            storage: Storage::new(data),
            layout: Layout::contiguous(shape),
        }
    }

    /// A new view of the same storage.
    pub(crate) fn view(&self, layout: Layout) -> Self {
        Self {
            storage: self.storage.clone(),
            layout,
        }
    }

    // =========================================================================
    // Properties
    // =========================================================================

    pub fn shape(&self) -> &Shape {
        self.layout.shape()
    }

    /// Number of axes.
    pub fn dims(&self) -> usize {
        self.layout.ndim()
    }

    /// Number of canonical positions (unbound axes count as 1).
    pub fn numel(&self) -> usize {
        self.layout.numel()
    }

    pub fn strides(&self) -> &[isize] {
        self.layout.strides()
    }

    pub fn offset(&self) -> isize {
        self.layout.offset()
    }

    pub fn periods(&self) -> &[usize] {
        self.layout.periods()
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Whether both tensors view the same buffer.
    pub fn shares_storage(&self, other: &Tensor) -> bool {
        self.storage.same_buffer(&other.storage)
    }

    /// Whether this tensor is contiguous row-major (offset ignored).
    pub fn is_contiguous(&self) -> bool {
        self.layout.is_contiguous()
    }

    // =========================================================================
    // Indexing
    // =========================================================================

    /// Indexer from the process-wide plan cache.
    pub fn indexer(&self) -> Indexer {
        IndexCache::global().indexer(&self.layout)
    }

    /// Indexer from a caller-supplied plan cache.
    pub fn indexer_in(&self, cache: &IndexCache) -> Indexer {
        cache.indexer(&self.layout)
    }

    /// Canonical iteration frame of this tensor's shape.
    pub fn frame(&self) -> Frame {
        self.layout.frame()
    }

    fn check_coords(&self, coords: &[usize]) -> Result<()> {
        let shape = self.shape();
        let in_range = coords.len() == shape.ndim()
            && coords
                .iter()
                .enumerate()
                .all(|(k, &c)| shape.extent(k).map_or(true, |e| c < e));
        if in_range {
            Ok(())
        } else {
            Err(StrixError::IndexOutOfBounds {
                coords: coords.to_vec(),
                shape: shape.clone(),
            })
        }
    }

    /// Read the element at `coords`. Any coordinate is accepted on an
    /// unbound axis.
    pub fn get(&self, coords: &[usize]) -> Result<f64> {
        self.check_coords(coords)?;
        let pos = self.indexer().coords_to_offset(coords);
        Ok(self.storage.read()[pos])
    }

    /// Write `value` at `coords`. Visible through every view of the storage.
    pub fn set(&self, coords: &[usize], value: f64) -> Result<()> {
        self.update(coords, |_| value)
    }

    /// Replace the element at `coords` with `f(old)`.
    pub fn update(&self, coords: &[usize], f: impl FnOnce(f64) -> f64) -> Result<()> {
        self.check_coords(coords)?;
        let pos = self.indexer().coords_to_offset(coords);
        let mut data = self.storage.write();
        data[pos] = f(data[pos]);
        Ok(())
    }

    /// Elements in canonical (row-major) order.
    pub fn to_vec(&self) -> Vec<f64> {
        let frame = self.frame();
        let walker = self.indexer().walker_unchecked(&frame);
        let data = self.storage.read();
        (0..frame.len()).map(|j| data[walker.offset(j)]).collect()
    }

    /// The single element of a one-element tensor.
    pub fn item(&self) -> Result<f64> {
        if self.numel() != 1 {
            return Err(StrixError::ShapeMismatch {
                expected: Shape::scalar(),
                got: self.shape().clone(),
            });
        }
        let pos = self.indexer().coords_to_offset(&vec![0; self.dims()]);
        Ok(self.storage.read()[pos])
    }
}

impl PartialEq for Tensor {
    /// Equal shapes and equal elements in canonical order.
    fn eq(&self, other: &Self) -> bool {
        self.shape() == other.shape() && self.to_vec() == other.to_vec()
    }
}

impl fmt::Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Tensor(shape={}, strides={:?}, offset={}, contiguous={})",
            self.shape(),
            self.strides(),
            self.offset(),
            self.is_contiguous(),
        )
    }
}

impl fmt::Display for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.to_vec();
        if data.len() <= 20 {
            write!(f, "tensor({:?}, shape={})", data, self.shape())
        } else {
            write!(
                f,
                "tensor([{:.4}, {:.4}, ..., {:.4}], shape={})",
                data[0],
                data[1],
                data[data.len() - 1],
                self.shape()
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn not_simple_mat() -> Tensor {
        let storage = Storage::new(vec![-1000.0, 1.0, 4.0, 2.0, 5.0, 3.0, 6.0, -3000.0]);
        let layout = Layout::from_parts(Shape::new(&[2, 3]), &[1, 2], 1).unwrap();
        Tensor::from_storage(storage, layout).unwrap()
    }

    #[test]
    fn test_from_flat_contiguous() {
        let t = Tensor::from_flat(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], [2, 3]).unwrap();
        assert_eq!(t.dims(), 2);
        assert_eq!(t.numel(), 6);
        assert_eq!(t.strides(), &[3, 1]);
        assert!(t.is_contiguous());
    }

    #[test]
    fn test_strided_view_reads() {
        let t = not_simple_mat();
        assert!(!t.is_contiguous());
        assert_eq!(t.to_vec(), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(t.get(&[1, 0]).unwrap(), 4.0);
        assert_eq!(t.get(&[0, 2]).unwrap(), 3.0);
    }

    #[test]
    fn test_from_storage_rejects_out_of_range_layout() {
        let storage = Storage::new(vec![0.0; 4]);
        let layout = Layout::from_parts(Shape::new(&[2, 3]), &[3, 1], 0).unwrap();
        let err = Tensor::from_storage(storage, layout).unwrap_err();
        assert!(matches!(err, StrixError::InvalidLayout(_)));
    }

    #[test]
    fn test_get_set_update() {
        let t = Tensor::zeros([2, 2]);
        t.set(&[0, 1], 3.0).unwrap();
        t.update(&[0, 1], |v| v * 2.0).unwrap();
        assert_eq!(t.get(&[0, 1]).unwrap(), 6.0);

        assert!(matches!(
            t.get(&[2, 0]),
            Err(StrixError::IndexOutOfBounds { .. })
        ));
        assert!(t.get(&[0]).is_err());
        assert!(t.set(&[0, 0, 0], 1.0).is_err());
    }

    #[test]
    fn test_unbound_axis_accepts_any_coordinate() {
        let t = Tensor::vector(vec![1.0, 2.0, 3.0])
            .broadcast_on(&[0])
            .unwrap();
        assert!(t.shape().is_unbound(0));
        assert_eq!(t.get(&[0, 1]).unwrap(), 2.0);
        assert_eq!(t.get(&[41, 2]).unwrap(), 3.0);
    }

    #[test]
    fn test_clone_aliases_storage() {
        let t = Tensor::zeros([3]);
        let alias = t.clone();
        alias.set(&[1], 5.0).unwrap();
        assert_eq!(t.get(&[1]).unwrap(), 5.0);
        assert!(t.shares_storage(&alias));
    }

    #[test]
    fn test_item() {
        assert_eq!(Tensor::scalar(2.5).item().unwrap(), 2.5);
        let one = Tensor::from_flat(vec![7.0], [1, 1]).unwrap();
        assert_eq!(one.item().unwrap(), 7.0);
        assert!(Tensor::zeros([2]).item().is_err());
    }

    #[test]
    fn test_eq_ignores_layout() {
        let t = not_simple_mat();
        let plain = Tensor::from_flat(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], [2, 3]).unwrap();
        assert_eq!(t, plain);
        assert_ne!(t, plain.reshape([3, 2]).unwrap());
    }

    #[test]
    fn test_display() {
        let t = Tensor::vector(vec![1.0, 2.0]);
        assert_eq!(t.to_string(), "tensor([1.0, 2.0], shape=[2])");
    }
}
