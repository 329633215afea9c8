//! Bounded LRU cache of decompressed blocks.
//!
//! The cache is the only path between element access and compressed
//! storage. A resident line's buffer is the authoritative value of its
//! block; storage is only brought up to date when a dirty line is evicted
//! or flushed. Write-mode access marks the line dirty before the caller
//! runs, pessimistically: recompression is considered pending whether or
//! not the caller actually mutates.
//!
//! Eviction picks the least-recently-used line; among equally old lines
//! the lowest block index wins, keeping test runs reproducible. Capacity 0
//! is a valid pass-through configuration that decodes into a scratch
//! buffer on every access and re-encodes immediately after a write.

use std::mem;

use plane_codec::{BlockCodec, CodecElement, RateConfig};

use crate::alloc::AllocRef;
use crate::error::Result;
use crate::storage::CompressedStorage;

/// How a block is being accessed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    Read,
    Write,
}

#[derive(Debug, Clone)]
struct CacheLine<T> {
    block: usize,
    data: Vec<T>,
    dirty: bool,
    stamp: u64,
}

/// LRU cache of decompressed block buffers.
#[derive(Debug)]
pub struct BlockCache<T> {
    lines: Vec<CacheLine<T>>,
    capacity: usize,
    elems: usize,
    tick: u64,
    alloc: AllocRef,
    granted: usize,
}

impl<T: CodecElement> BlockCache<T> {
    /// Cache holding at most `capacity` decompressed blocks of `elems`
    /// elements each.
    pub fn new(capacity: usize, elems: usize, alloc: AllocRef) -> Self {
        Self {
            lines: Vec::new(),
            capacity,
            elems,
            tick: 0,
            alloc,
            granted: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of resident lines.
    pub fn resident(&self) -> usize {
        self.lines.len()
    }

    /// Block indices of resident lines, ascending.
    pub fn resident_blocks(&self) -> Vec<usize> {
        let mut blocks: Vec<usize> = self.lines.iter().map(|l| l.block).collect();
        blocks.sort_unstable();
        blocks
    }

    fn line_bytes(&self) -> usize {
        self.elems * mem::size_of::<T>()
    }

    /// Run `f` against the decompressed buffer of `block`, faulting it in
    /// from storage (and evicting if at capacity) as needed.
    ///
    /// On a decode failure no line is left resident for the requested
    /// block and storage is unchanged except for the completed eviction.
    ///
    /// # Panics
    ///
    /// Panics if `block >= storage.block_count()`.
    pub fn with_block<C: BlockCodec, R>(
        &mut self,
        storage: &mut CompressedStorage,
        codec: &C,
        config: &RateConfig,
        block: usize,
        mode: AccessMode,
        f: impl FnOnce(&mut [T]) -> R,
    ) -> Result<R> {
        if self.capacity == 0 {
            let mut data = Self::fault(storage, codec, config, self.elems, block)?;
            let result = f(&mut data);
            if mode == AccessMode::Write {
                let bytes = codec.encode(&data, config)?;
                storage.write(block, &bytes)?;
            }
            return Ok(result);
        }

        if let Some(pos) = self.lines.iter().position(|l| l.block == block) {
            self.tick += 1;
            let line = &mut self.lines[pos];
            line.stamp = self.tick;
            if mode == AccessMode::Write {
                line.dirty = true;
            }
            return Ok(f(&mut line.data));
        }

        if self.lines.len() >= self.capacity {
            self.evict_one(storage, codec, config)?;
        }

        let bytes = self.line_bytes();
        self.alloc.grant(bytes)?;
        let data = match Self::fault(storage, codec, config, self.elems, block) {
            Ok(data) => data,
            Err(e) => {
                self.alloc.release(bytes);
                return Err(e);
            }
        };
        self.granted += bytes;
        self.tick += 1;
        let mut line = CacheLine {
            block,
            data,
            dirty: mode == AccessMode::Write,
            stamp: self.tick,
        };
        let result = f(&mut line.data);
        self.lines.push(line);
        Ok(result)
    }

    /// Compress and persist every dirty line, in ascending block order,
    /// without evicting anything.
    pub fn flush_all<C: BlockCodec>(
        &mut self,
        storage: &mut CompressedStorage,
        codec: &C,
        config: &RateConfig,
    ) -> Result<()> {
        let mut order: Vec<usize> = (0..self.lines.len()).collect();
        order.sort_unstable_by_key(|&i| self.lines[i].block);
        for i in order {
            if self.lines[i].dirty {
                let bytes = codec.encode(&self.lines[i].data, config)?;
                storage.write(self.lines[i].block, &bytes)?;
                self.lines[i].dirty = false;
            }
        }
        Ok(())
    }

    /// Drop every line without persisting. Dirty, unflushed data is
    /// discarded; callers invoke this only when the backing storage is
    /// being replaced.
    pub fn invalidate_all(&mut self) {
        self.lines.clear();
        self.alloc.release(self.granted);
        self.granted = 0;
    }

    /// Change the resident-block limit, flushing and dropping the least
    /// recently used lines when shrinking.
    pub fn set_capacity<C: BlockCodec>(
        &mut self,
        storage: &mut CompressedStorage,
        codec: &C,
        config: &RateConfig,
        capacity: usize,
    ) -> Result<()> {
        while self.lines.len() > capacity {
            self.evict_one(storage, codec, config)?;
        }
        self.capacity = capacity;
        Ok(())
    }

    fn evict_one<C: BlockCodec>(
        &mut self,
        storage: &mut CompressedStorage,
        codec: &C,
        config: &RateConfig,
    ) -> Result<()> {
        let victim = match self
            .lines
            .iter()
            .enumerate()
            .min_by_key(|(_, l)| (l.stamp, l.block))
        {
            Some((pos, _)) => pos,
            None => return Ok(()),
        };
        if self.lines[victim].dirty {
            let bytes = codec.encode(&self.lines[victim].data, config)?;
            storage.write(self.lines[victim].block, &bytes)?;
        }
        self.lines.swap_remove(victim);
        self.alloc.release(self.line_bytes());
        self.granted -= self.line_bytes();
        Ok(())
    }

    fn fault<C: BlockCodec>(
        storage: &CompressedStorage,
        codec: &C,
        config: &RateConfig,
        elems: usize,
        block: usize,
    ) -> Result<Vec<T>> {
        match storage.read(block) {
            Some(bytes) => Ok(codec.decode(bytes, config, elems)?),
            None => Ok(vec![T::zero(); elems]),
        }
    }
}

impl<T> Drop for BlockCache<T> {
    fn drop(&mut self) {
        self.alloc.release(self.granted);
    }
}
