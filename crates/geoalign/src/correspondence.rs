use std::collections::BTreeMap;

use glam::DVec3;

use crate::error::{AlignError, AlignResult};

/// A point in 3D space.
pub type Point3 = DVec3;

/// A claimed correspondence between a source point and a target point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrespondencePair {
    /// Point in the source frame.
    pub source: Point3,
    /// The same physical point in the target frame.
    pub target: Point3,
}

/// Ordered set of source/target correspondences.
///
/// Index `i` of [`CorrespondenceSet::source`] and [`CorrespondenceSet::target`]
/// refers to the same physical entity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorrespondenceSet {
    source: Vec<Point3>,
    target: Vec<Point3>,
}

impl CorrespondenceSet {
    /// Create a correspondence set from two parallel point lists.
    ///
    /// # Errors
    ///
    /// Fails if the lists differ in length or contain non-finite coordinates.
    pub fn new(source: Vec<Point3>, target: Vec<Point3>) -> AlignResult<Self> {
        if source.len() != target.len() {
            return Err(AlignError::MismatchedLengths {
                source_len: source.len(),
                target_len: target.len(),
            });
        }
        if let Some(index) = source
            .iter()
            .zip(target.iter())
            .position(|(s, t)| !s.is_finite() || !t.is_finite())
        {
            return Err(AlignError::NonFinitePoint { index });
        }
        Ok(Self { source, target })
    }

    /// Create a correspondence set from an iterator of pairs.
    pub fn from_pairs<I>(pairs: I) -> AlignResult<Self>
    where
        I: IntoIterator<Item = CorrespondencePair>,
    {
        let (source, target) = pairs.into_iter().map(|p| (p.source, p.target)).unzip();
        Self::new(source, target)
    }

    /// Create a correspondence set from raw `[x, y, z]` arrays.
    pub fn from_arrays(source: &[[f64; 3]], target: &[[f64; 3]]) -> AlignResult<Self> {
        Self::new(
            source.iter().copied().map(DVec3::from_array).collect(),
            target.iter().copied().map(DVec3::from_array).collect(),
        )
    }

    /// Number of correspondences.
    #[inline]
    pub fn len(&self) -> usize {
        self.source.len()
    }

    /// Whether the set holds no correspondences.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    /// Source points, in correspondence order.
    #[inline]
    pub fn source(&self) -> &[Point3] {
        &self.source
    }

    /// Target points, in correspondence order.
    #[inline]
    pub fn target(&self) -> &[Point3] {
        &self.target
    }

    /// The `i`-th correspondence, if any.
    pub fn pair(&self, i: usize) -> Option<CorrespondencePair> {
        Some(CorrespondencePair {
            source: *self.source.get(i)?,
            target: *self.target.get(i)?,
        })
    }

    /// Iterate over the correspondences in order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = CorrespondencePair> + '_ {
        self.source
            .iter()
            .zip(self.target.iter())
            .map(|(&source, &target)| CorrespondencePair { source, target })
    }

    /// Subset of the correspondences at `indices`, in the given order.
    ///
    /// # Panics
    ///
    /// Panics if an index is not smaller than [`CorrespondenceSet::len`].
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            source: indices.iter().map(|&i| self.source[i]).collect(),
            target: indices.iter().map(|&i| self.target[i]).collect(),
        }
    }

    /// Subset of the correspondences whose mask entry is `true`.
    ///
    /// The mask must hold one entry per correspondence.
    pub fn select_mask(&self, mask: &[bool]) -> Self {
        debug_assert_eq!(mask.len(), self.len(), "mask length must match the set");
        let (source, target) = self
            .iter()
            .zip(mask.iter())
            .filter(|&(_, &keep)| keep)
            .map(|(p, _)| (p.source, p.target))
            .unzip();
        Self { source, target }
    }
}

/// Correspondences assembled from two tables sharing the same keys.
#[derive(Debug, Clone)]
pub struct KeyedCorrespondences<K> {
    /// Keys of the matched entries, ascending; `keys[i]` labels correspondence `i`.
    pub keys: Vec<K>,
    /// The paired points.
    pub set: CorrespondenceSet,
}

/// Pair two keyed point tables (e.g. camera centers keyed by image id).
///
/// Only keys present in both tables are kept; the others are logged and dropped.
pub fn pair_by_key<K>(
    source: &BTreeMap<K, Point3>,
    target: &BTreeMap<K, Point3>,
) -> AlignResult<KeyedCorrespondences<K>>
where
    K: Ord + Clone + std::fmt::Debug,
{
    let mut keys = Vec::with_capacity(source.len().min(target.len()));
    let mut src = Vec::with_capacity(keys.capacity());
    let mut dst = Vec::with_capacity(keys.capacity());

    for (key, s) in source {
        match target.get(key) {
            Some(t) => {
                keys.push(key.clone());
                src.push(*s);
                dst.push(*t);
            }
            None => log::warn!("key {key:?} has no target point, skipping"),
        }
    }
    for key in target.keys().filter(|k| !source.contains_key(*k)) {
        log::warn!("key {key:?} has no source point, skipping");
    }

    log::debug!(
        "paired {} of {} source / {} target entries",
        keys.len(),
        source.len(),
        target.len()
    );

    Ok(KeyedCorrespondences {
        keys,
        set: CorrespondenceSet::new(src, dst)?,
    })
}
