//! The compressed array façade.

use plane_codec::{BlockCodec, CodecElement, PlaneCodec};

use crate::alloc::{default_allocator, AllocRef};
use crate::cache::{AccessMode, BlockCache};
use crate::error::{ArrayError, Result};
use crate::layout::Layout;
use crate::policy::RatePolicy;
use crate::storage::CompressedStorage;

/// A 1-4 dimensional numeric array held in block-compressed form.
///
/// Elements are read and written by coordinate as if the array were dense;
/// internally every access resolves to a 4^rank-element block that is
/// faulted into an LRU cache, and dirty blocks are recompressed into
/// storage on eviction or [`flush`](Self::flush). A freshly constructed
/// array reads as all-zero at every coordinate.
///
/// All accessors take `&mut self`: a read can fault a block in and reorder
/// the LRU list. One array is single-threaded by construction; independent
/// arrays share nothing and may run in parallel.
///
/// # Example
///
/// ```
/// use packed_mdarray::{PackedArray, RatePolicy};
///
/// let policy = RatePolicy::fixed_precision(64).unwrap(); // lossless for f64
/// let mut a = PackedArray::<f64>::new(&[8, 8], policy, 2).unwrap();
/// a.set(&[3, 5], 2.5).unwrap();
/// a.flush().unwrap();
/// assert_eq!(a.get(&[3, 5]).unwrap(), 2.5);
/// assert_eq!(a.get(&[0, 0]).unwrap(), 0.0);
/// ```
#[derive(Debug)]
pub struct PackedArray<T: CodecElement, C: BlockCodec = PlaneCodec> {
    layout: Layout,
    policy: RatePolicy,
    codec: C,
    storage: CompressedStorage,
    cache: BlockCache<T>,
    alloc: AllocRef,
}

impl<T: CodecElement> PackedArray<T, PlaneCodec> {
    /// Array with the reference bit-plane codec and heap allocator.
    pub fn new(dims: &[usize], policy: RatePolicy, cache_capacity: usize) -> Result<Self> {
        Self::with_codec(dims, policy, cache_capacity, PlaneCodec::new())
    }
}

impl<T: CodecElement, C: BlockCodec> PackedArray<T, C> {
    /// Array with a caller-supplied codec.
    pub fn with_codec(
        dims: &[usize],
        policy: RatePolicy,
        cache_capacity: usize,
        codec: C,
    ) -> Result<Self> {
        Self::with_allocator(dims, policy, cache_capacity, codec, default_allocator())
    }

    /// Array with a caller-supplied codec and allocation capability.
    pub fn with_allocator(
        dims: &[usize],
        policy: RatePolicy,
        cache_capacity: usize,
        codec: C,
        alloc: AllocRef,
    ) -> Result<Self> {
        let layout = Layout::new(dims)?;
        let slot = policy.slot_bytes(layout.elems_per_block(), T::BITS);
        let storage = CompressedStorage::new(layout.block_count(), slot, alloc.clone())?;
        let cache = BlockCache::new(cache_capacity, layout.elems_per_block(), alloc.clone());
        Ok(Self {
            layout,
            policy,
            codec,
            storage,
            cache,
            alloc,
        })
    }

    /// Declared dimensions.
    pub fn dims(&self) -> &[usize] {
        self.layout.dims()
    }

    pub fn rank(&self) -> usize {
        self.layout.rank()
    }

    /// Total number of elements.
    pub fn len(&self) -> usize {
        self.layout.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The active rate policy.
    pub fn policy(&self) -> &RatePolicy {
        &self.policy
    }

    /// Compressed bytes currently held in storage.
    pub fn compressed_size(&self) -> usize {
        self.storage.compressed_size()
    }

    /// Read-only view of the compressed store, for introspection.
    pub fn storage(&self) -> &CompressedStorage {
        &self.storage
    }

    /// Maximum number of resident decompressed blocks.
    pub fn cache_capacity(&self) -> usize {
        self.cache.capacity()
    }

    /// Block indices currently resident in the cache, ascending.
    pub fn resident_blocks(&self) -> Vec<usize> {
        self.cache.resident_blocks()
    }

    fn check(&self, coord: &[usize]) -> Result<()> {
        if self.layout.contains(coord) {
            Ok(())
        } else {
            Err(ArrayError::OutOfRange {
                coord: coord.to_vec(),
                dims: self.layout.dims().to_vec(),
            })
        }
    }

    /// Read the element at `coord`.
    pub fn get(&mut self, coord: &[usize]) -> Result<T> {
        self.check(coord)?;
        let (block, offset) = self.layout.locate(coord);
        self.cache.with_block(
            &mut self.storage,
            &self.codec,
            self.policy.config(),
            block,
            AccessMode::Read,
            |buf| buf[offset],
        )
    }

    /// Write the element at `coord`. The containing block is marked dirty
    /// and recompressed on eviction or flush.
    pub fn set(&mut self, coord: &[usize], value: T) -> Result<()> {
        self.check(coord)?;
        let (block, offset) = self.layout.locate(coord);
        self.cache.with_block(
            &mut self.storage,
            &self.codec,
            self.policy.config(),
            block,
            AccessMode::Write,
            |buf| buf[offset] = value,
        )
    }

    /// Compress and persist every dirty cached block; blocks stay resident.
    pub fn flush(&mut self) -> Result<()> {
        self.cache
            .flush_all(&mut self.storage, &self.codec, self.policy.config())
    }

    /// Change the cache capacity; shrinking flushes and drops the least
    /// recently used blocks first.
    pub fn set_cache_capacity(&mut self, capacity: usize) -> Result<()> {
        self.cache.set_capacity(
            &mut self.storage,
            &self.codec,
            self.policy.config(),
            capacity,
        )
    }

    /// Change the dimensions.
    ///
    /// Storage is reallocated under the current policy. Elements whose
    /// coordinate is valid in both the old and new dimensions keep their
    /// last-written values; everything else reads as zero afterwards.
    pub fn resize(&mut self, dims: &[usize]) -> Result<()> {
        if dims.len() != self.rank() {
            return Err(ArrayError::InvalidDimensions {
                dims: dims.to_vec(),
            });
        }
        let mut next = Self::with_allocator(
            dims,
            self.policy,
            self.cache.capacity(),
            self.codec.clone(),
            self.alloc.clone(),
        )?;
        let keep: Vec<usize> = dims
            .iter()
            .zip(self.dims())
            .map(|(&new, &old)| new.min(old))
            .collect();
        let total: usize = keep.iter().product();
        for linear in 0..total {
            let coord = decompose(&keep, linear);
            next.set(&coord, self.get(&coord)?)?;
        }
        next.flush()?;
        *self = next;
        Ok(())
    }

    /// Replace the rate policy, recompressing every block.
    ///
    /// This is the only supported way to change the policy of a live
    /// array: every block is decompressed under the old policy and
    /// re-encoded under the new one, so no compressed bytes are ever
    /// interpreted under the wrong parameter set.
    pub fn recompress(&mut self, policy: RatePolicy) -> Result<()> {
        let dims = self.dims().to_vec();
        let mut next = Self::with_allocator(
            &dims,
            policy,
            self.cache.capacity(),
            self.codec.clone(),
            self.alloc.clone(),
        )?;
        for linear in 0..self.len() {
            let coord = self.layout.coord_of(linear);
            next.set(&coord, self.get(&coord)?)?;
        }
        next.flush()?;
        *self = next;
        Ok(())
    }

    /// Deep copy sharing no state with `self`. Flushes first so the copy
    /// starts from persisted bytes with an empty cache.
    pub fn try_clone(&mut self) -> Result<Self> {
        self.flush()?;
        Ok(Self {
            layout: self.layout.clone(),
            policy: self.policy,
            codec: self.codec.clone(),
            storage: self.storage.try_clone()?,
            cache: BlockCache::new(
                self.cache.capacity(),
                self.layout.elems_per_block(),
                self.alloc.clone(),
            ),
            alloc: self.alloc.clone(),
        })
    }

    /// Lazy row-major iteration over `(coordinate, value)` pairs.
    ///
    /// Restart by calling `iter` again. A decode failure ends the
    /// sequence after yielding the error.
    pub fn iter(&mut self) -> ElemIter<'_, T, C> {
        ElemIter {
            array: self,
            pos: 0,
        }
    }
}

/// Row-major element iterator, see [`PackedArray::iter`].
#[derive(Debug)]
pub struct ElemIter<'a, T: CodecElement, C: BlockCodec> {
    array: &'a mut PackedArray<T, C>,
    pos: usize,
}

impl<T: CodecElement, C: BlockCodec> Iterator for ElemIter<'_, T, C> {
    type Item = Result<(Vec<usize>, T)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.array.len() {
            return None;
        }
        let coord = self.array.layout.coord_of(self.pos);
        self.pos += 1;
        match self.array.get(&coord) {
            Ok(value) => Some(Ok((coord, value))),
            Err(e) => {
                self.pos = self.array.len();
                Some(Err(e))
            }
        }
    }
}

/// Row-major decomposition of a linear index against `dims`.
fn decompose(dims: &[usize], mut linear: usize) -> Vec<usize> {
    let mut coord = vec![0usize; dims.len()];
    for axis in (0..dims.len()).rev() {
        coord[axis] = linear % dims[axis];
        linear /= dims[axis];
    }
    coord
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lossless() -> RatePolicy {
        RatePolicy::fixed_precision(64).unwrap()
    }

    #[test]
    fn test_out_of_range_reports_coordinate() {
        let mut a = PackedArray::<f64>::new(&[4, 4], lossless(), 1).unwrap();
        let err = a.get(&[4, 0]).unwrap_err();
        assert!(matches!(err, ArrayError::OutOfRange { .. }));
        let err = a.set(&[0], 1.0).unwrap_err();
        assert!(matches!(err, ArrayError::OutOfRange { .. }));
    }

    #[test]
    fn test_new_array_reads_zero_everywhere() {
        let mut a = PackedArray::<i32>::new(&[3, 5, 2], lossless(), 2).unwrap();
        for i in 0..3 {
            for j in 0..5 {
                for k in 0..2 {
                    assert_eq!(a.get(&[i, j, k]).unwrap(), 0);
                }
            }
        }
    }

    #[test]
    fn test_set_then_get_without_flush() {
        let mut a = PackedArray::<f64>::new(&[10], lossless(), 2).unwrap();
        a.set(&[7], -1.25).unwrap();
        assert_eq!(a.get(&[7]).unwrap(), -1.25);
    }

    #[test]
    fn test_iteration_is_row_major_and_total() {
        let mut a = PackedArray::<i64>::new(&[2, 3], lossless(), 1).unwrap();
        for i in 0..2 {
            for j in 0..3 {
                a.set(&[i, j], (i * 3 + j) as i64).unwrap();
            }
        }
        let items: Vec<(Vec<usize>, i64)> = a.iter().collect::<Result<_>>().unwrap();
        assert_eq!(items.len(), 6);
        for (n, (coord, value)) in items.iter().enumerate() {
            assert_eq!(coord, &vec![n / 3, n % 3]);
            assert_eq!(*value, n as i64);
        }
    }

    #[test]
    fn test_iteration_is_restartable() {
        let mut a = PackedArray::<f32>::new(&[5], lossless(), 1).unwrap();
        a.set(&[2], 9.0).unwrap();
        let first: Vec<_> = a.iter().collect::<Result<Vec<_>>>().unwrap();
        let second: Vec<_> = a.iter().collect::<Result<Vec<_>>>().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_try_clone_is_independent() {
        let mut a = PackedArray::<f64>::new(&[4], lossless(), 1).unwrap();
        a.set(&[0], 5.0).unwrap();
        let mut b = a.try_clone().unwrap();
        b.set(&[0], 6.0).unwrap();
        assert_eq!(a.get(&[0]).unwrap(), 5.0);
        assert_eq!(b.get(&[0]).unwrap(), 6.0);
    }

    #[test]
    fn test_resize_rejects_bad_dimensions() {
        let mut a = PackedArray::<f64>::new(&[4, 4], lossless(), 1).unwrap();
        assert!(matches!(
            a.resize(&[4]),
            Err(ArrayError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            a.resize(&[4, 0]),
            Err(ArrayError::InvalidDimensions { .. })
        ));
        // Failed resize leaves the array intact.
        assert_eq!(a.dims(), &[4, 4]);
    }

    #[test]
    fn test_recompress_switches_mode() {
        let mut a = PackedArray::<f64>::new(&[8], lossless(), 2).unwrap();
        for i in 0..8 {
            a.set(&[i], i as f64 + 0.125).unwrap();
        }
        a.recompress(RatePolicy::fixed_accuracy(0.01).unwrap()).unwrap();
        assert_eq!(a.policy().mode_name(), "fixed-accuracy");
        for i in 0..8 {
            let v = a.get(&[i]).unwrap();
            assert!((v - (i as f64 + 0.125)).abs() <= 0.01);
        }
    }
}
