//! Indexing engine: maps coordinates and canonical positions to physical
//! storage offsets.
//!
//! A layout is classified by its [`Signature`] (per-axis class plus offset and
//! contiguity flags). Each signature maps to one cached [`AccessPlan`] that
//! selects a specialized [`Walker`] variant. Binding a plan to a layout copies
//! the numeric strides and offset of the axes that actually move.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

use crate::error::StrixError;
use crate::layout::Layout;
use crate::shape::{AxisVec, Shape};
use crate::Result;

// =============================================================================
// Frame
// =============================================================================

/// Canonical iteration frame: the contiguous strides ("steps") and periods of
/// an iteration shape. Canonical position `j` has coordinate
/// `(j % periods[k]) / steps[k]` on every bound axis and 0 on unbound ones.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    shape: Shape,
    steps: AxisVec<usize>,
    periods: AxisVec<usize>,
}

impl Frame {
    pub fn new(shape: &Shape) -> Self {
        let (strides, periods) = shape.strides_and_periods();
        Self {
            shape: shape.clone(),
            steps: strides.iter().map(|&s| s as usize).collect(),
            periods,
        }
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn steps(&self) -> &[usize] {
        &self.steps
    }

    pub fn periods(&self) -> &[usize] {
        &self.periods
    }

    /// Number of canonical positions.
    pub fn len(&self) -> usize {
        self.shape.numel()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Coordinate of canonical position `j` along `axis`.
    #[inline]
    pub fn coord(&self, j: usize, axis: usize) -> usize {
        match self.steps[axis] {
            0 => 0,
            step => (j % self.periods[axis]) / step,
        }
    }

    /// All coordinates of canonical position `j`.
    pub fn coords(&self, j: usize) -> AxisVec<usize> {
        (0..self.shape.ndim()).map(|k| self.coord(j, k)).collect()
    }

    /// Canonical position of a coordinate tuple (unbound axes ignored).
    pub fn position(&self, coords: &[usize]) -> usize {
        coords
            .iter()
            .zip(self.steps.iter())
            .map(|(&c, &step)| c * step)
            .sum()
    }
}

// =============================================================================
// Signature and plans
// =============================================================================

/// Structural class of one axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AxisClass {
    /// Contributes nothing: stride 0, unbound, or extent at most 1.
    Vanishing,
    /// Stride 1.
    Unit,
    Strided,
}

/// Structural signature of a layout. Two layouts with equal signatures share
/// one [`AccessPlan`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Signature {
    axes: AxisVec<AxisClass>,
    has_offset: bool,
    contiguous: bool,
}

impl Signature {
    pub fn of(layout: &Layout) -> Self {
        let shape = layout.shape();
        let axes = layout
            .strides()
            .iter()
            .enumerate()
            .map(|(k, &stride)| match shape.extent(k) {
                None => AxisClass::Vanishing,
                Some(e) if e <= 1 || stride == 0 => AxisClass::Vanishing,
                Some(_) if stride == 1 => AxisClass::Unit,
                Some(_) => AxisClass::Strided,
            })
            .collect();
        Self {
            axes,
            has_offset: layout.offset() != 0,
            contiguous: layout.is_contiguous(),
        }
    }

    pub fn axes(&self) -> &[AxisClass] {
        &self.axes
    }

    pub fn has_offset(&self) -> bool {
        self.has_offset
    }

    pub fn is_contiguous(&self) -> bool {
        self.contiguous
    }
}

/// Specialization chosen for a signature.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlanKind {
    /// Contiguous at offset 0: the canonical position is the offset.
    Identity,
    /// Contiguous with a base offset.
    Shifted,
    /// No live axes: every position maps to the base offset.
    Constant,
    /// Rank 1 with one live axis.
    Linear,
    /// Exactly two live axes.
    Planar,
    General,
}

/// Access plan for one structural signature. Holds no numeric strides.
#[derive(Debug)]
pub struct AccessPlan {
    kind: PlanKind,
    ndim: usize,
    live: AxisVec<usize>,
}

impl AccessPlan {
    pub fn compile(sig: &Signature) -> Self {
        let live: AxisVec<usize> = sig
            .axes
            .iter()
            .enumerate()
            .filter(|(_, &class)| class != AxisClass::Vanishing)
            .map(|(k, _)| k)
            .collect();
        let ndim = sig.axes.len();
        let kind = if sig.contiguous && !sig.has_offset {
            PlanKind::Identity
        } else if sig.contiguous {
            PlanKind::Shifted
        } else if live.is_empty() {
            PlanKind::Constant
        } else if ndim == 1 && live.len() == 1 {
            PlanKind::Linear
        } else if live.len() == 2 {
            PlanKind::Planar
        } else {
            PlanKind::General
        };
        Self { kind, ndim, live }
    }

    pub fn kind(&self) -> PlanKind {
        self.kind
    }

    pub fn ndim(&self) -> usize {
        self.ndim
    }

    /// Axes that contribute to the offset.
    pub fn live_axes(&self) -> &[usize] {
        &self.live
    }

    /// Attach the numeric strides and offset of `layout`.
    pub fn bind(self: &Arc<Self>, layout: &Layout) -> Indexer {
        debug_assert_eq!(layout.ndim(), self.ndim);
        let strides = self.live.iter().map(|&k| layout.strides()[k]).collect();
        Indexer {
            plan: Arc::clone(self),
            shape: layout.shape().clone(),
            strides,
            offset: layout.offset(),
        }
    }
}

// =============================================================================
// Plan cache
// =============================================================================

/// Append-only map from signature to plan.
///
/// Read-mostly: lookups take the read lock, inserts the write lock. Entries are
/// never invalidated. A process-wide instance is available through
/// [`IndexCache::global`]; tests and embedders may use their own.
#[derive(Debug, Default)]
pub struct IndexCache {
    plans: RwLock<HashMap<Signature, Arc<AccessPlan>>>,
}

impl IndexCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn global() -> &'static IndexCache {
        static GLOBAL: OnceLock<IndexCache> = OnceLock::new();
        GLOBAL.get_or_init(IndexCache::new)
    }

    /// Look up or compile the plan for `layout`'s signature.
    pub fn plan_for(&self, layout: &Layout) -> Arc<AccessPlan> {
        let sig = Signature::of(layout);
        if let Some(plan) = self.plans.read().get(&sig) {
            return Arc::clone(plan);
        }
        let mut plans = self.plans.write();
        let plan = plans.entry(sig).or_insert_with_key(|sig| {
            let plan = AccessPlan::compile(sig);
            tracing::trace!(
                kind = ?plan.kind,
                ndim = plan.ndim,
                live = plan.live.len(),
                "compiled access plan"
            );
            Arc::new(plan)
        });
        Arc::clone(plan)
    }

    /// Plan for `layout`, bound to its strides and offset.
    pub fn indexer(&self, layout: &Layout) -> Indexer {
        self.plan_for(layout).bind(layout)
    }

    /// Number of cached plans.
    pub fn len(&self) -> usize {
        self.plans.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// =============================================================================
// Indexer and walkers
// =============================================================================

/// A plan bound to one layout's numeric strides and offset.
#[derive(Clone, Debug)]
pub struct Indexer {
    plan: Arc<AccessPlan>,
    shape: Shape,
    strides: AxisVec<isize>,
    offset: isize,
}

impl Indexer {
    pub fn kind(&self) -> PlanKind {
        self.plan.kind
    }

    pub fn plan(&self) -> &Arc<AccessPlan> {
        &self.plan
    }

    /// `offset + Σ strides[k] * coords[k]` over live axes.
    ///
    /// Coordinates are not range-checked here.
    #[inline]
    pub fn coords_to_offset(&self, coords: &[usize]) -> usize {
        let pos = self
            .plan
            .live
            .iter()
            .zip(self.strides.iter())
            .fold(self.offset, |acc, (&k, &stride)| {
                acc + stride * coords[k] as isize
            });
        pos as usize
    }

    /// Walker evaluating canonical positions of `frame`.
    ///
    /// The bound layout's shape must broadcast into the frame's shape.
    pub fn walker(&self, frame: &Frame) -> Result<Walker> {
        if !self.shape.broadcasts_into(frame.shape()) {
            return Err(StrixError::BroadcastInto {
                from: self.shape.clone(),
                to: frame.shape().clone(),
            });
        }
        Ok(self.walker_unchecked(frame))
    }

    /// Physical offset of canonical position `j` of `frame`. Builds a walker
    /// per call; hold on to [`Indexer::walker`] when iterating.
    pub fn canonical_to_offset(&self, frame: &Frame, j: usize) -> Result<usize> {
        Ok(self.walker(frame)?.offset(j))
    }

    /// Walker over a frame the caller knows to be compatible, such as the
    /// layout's own frame.
    pub(crate) fn walker_unchecked(&self, frame: &Frame) -> Walker {
        let offset = self.offset;
        if frame.is_empty() {
            return Walker::Constant { offset };
        }
        let term = |i: usize| {
            let k = self.plan.live[i];
            Term {
                period: frame.periods[k],
                step: frame.steps[k],
                stride: self.strides[i],
            }
        };
        match self.plan.kind {
            PlanKind::Identity => Walker::Identity,
            PlanKind::Shifted => Walker::Shifted { offset },
            PlanKind::Constant => Walker::Constant { offset },
            PlanKind::Linear => Walker::Linear {
                offset,
                stride: self.strides[0],
            },
            PlanKind::Planar => Walker::Planar {
                offset,
                outer: term(0),
                inner: term(1),
            },
            PlanKind::General => Walker::General {
                offset,
                terms: (0..self.plan.live.len()).map(term).collect(),
            },
        }
    }
}

/// One live axis of a walker: `stride * ((j % period) / step)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Term {
    period: usize,
    step: usize,
    stride: isize,
}

impl Term {
    #[inline]
    fn at(&self, j: usize) -> isize {
        self.stride * ((j % self.period) / self.step) as isize
    }
}

/// Specialized canonical-position to offset function.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Walker {
    Identity,
    Shifted { offset: isize },
    Constant { offset: isize },
    Linear { offset: isize, stride: isize },
    Planar { offset: isize, outer: Term, inner: Term },
    General { offset: isize, terms: AxisVec<Term> },
}

impl Walker {
    /// Physical offset of canonical position `j`.
    #[inline]
    pub fn offset(&self, j: usize) -> usize {
        let pos = match self {
            Walker::Identity => return j,
            Walker::Shifted { offset } => offset + j as isize,
            Walker::Constant { offset } => *offset,
            Walker::Linear { offset, stride } => offset + stride * j as isize,
            Walker::Planar {
                offset,
                outer,
                inner,
            } => offset + outer.at(j) + inner.at(j),
            Walker::General { offset, terms } => {
                terms.iter().fold(*offset, |acc, t| acc + t.at(j))
            }
        };
        pos as usize
    }
}
