//! Compressed byte store with one slot per block.
//!
//! Fixed-rate and fixed-precision modes partition one byte vector into
//! equal slots sized to the policy's worst case, located arithmetically.
//! Fixed-accuracy mode keeps a growable arena with a per-block
//! (offset, length) span table; a rewrite that fits its old span updates
//! in place, anything larger appends, and the span table stays the stable
//! reference across arena reallocation.
//!
//! A never-written slot is defined to be logically zero: `read` returns
//! `None` instead of handing garbage to the codec.

use crate::alloc::AllocRef;
use crate::error::{ArrayError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    offset: usize,
    len: usize,
}

#[derive(Debug, Clone)]
enum SlotLayout {
    Fixed { slot_bytes: usize },
    Variable { spans: Vec<Option<Span>> },
}

/// Byte store holding the compressed representation of every block.
#[derive(Debug)]
pub struct CompressedStorage {
    bytes: Vec<u8>,
    layout: SlotLayout,
    written: Vec<bool>,
    alloc: AllocRef,
    granted: usize,
}

impl CompressedStorage {
    /// Create storage for `blocks` blocks. `slot_bytes` is the fixed slot
    /// size, or `None` for variable-length slots (fixed-accuracy mode).
    pub fn new(blocks: usize, slot_bytes: Option<usize>, alloc: AllocRef) -> Result<Self> {
        let (bytes, layout, granted) = match slot_bytes {
            Some(slot) => {
                let total = blocks
                    .checked_mul(slot)
                    .ok_or(ArrayError::AllocationFailure {
                        requested: usize::MAX,
                    })?;
                alloc.grant(total)?;
                (vec![0u8; total], SlotLayout::Fixed { slot_bytes: slot }, total)
            }
            None => (
                Vec::new(),
                SlotLayout::Variable {
                    spans: vec![None; blocks],
                },
                0,
            ),
        };
        Ok(Self {
            bytes,
            layout,
            written: vec![false; blocks],
            alloc,
            granted,
        })
    }

    pub fn block_count(&self) -> usize {
        self.written.len()
    }

    /// Whether a block has ever been written.
    ///
    /// # Panics
    ///
    /// Panics if `block >= self.block_count()`.
    pub fn is_written(&self, block: usize) -> bool {
        assert!(
            block < self.written.len(),
            "block index {block} out of range for {} blocks",
            self.written.len()
        );
        self.written[block]
    }

    /// Total compressed bytes held (all slots for fixed modes, the arena
    /// length for variable mode).
    pub fn compressed_size(&self) -> usize {
        self.bytes.len()
    }

    /// Compressed bytes of a block; `None` if the block was never written
    /// (logically all-zero).
    ///
    /// # Panics
    ///
    /// Panics if `block >= self.block_count()`.
    pub fn read(&self, block: usize) -> Option<&[u8]> {
        if !self.is_written(block) {
            return None;
        }
        match &self.layout {
            SlotLayout::Fixed { slot_bytes } => {
                Some(&self.bytes[block * slot_bytes..][..*slot_bytes])
            }
            SlotLayout::Variable { spans } => {
                spans[block].map(|span| &self.bytes[span.offset..span.offset + span.len])
            }
        }
    }

    /// Store the compressed bytes of a block, overwriting in place for
    /// fixed slots and growing the arena when a variable slot no longer fits.
    ///
    /// # Panics
    ///
    /// Panics if `block >= self.block_count()`.
    pub fn write(&mut self, block: usize, data: &[u8]) -> Result<()> {
        assert!(
            block < self.written.len(),
            "block index {block} out of range for {} blocks",
            self.written.len()
        );
        match &mut self.layout {
            SlotLayout::Fixed { slot_bytes } => {
                if data.len() != *slot_bytes {
                    return Err(ArrayError::PolicyViolation(format!(
                        "encoded block is {} bytes but the slot holds {}",
                        data.len(),
                        slot_bytes
                    )));
                }
                self.bytes[block * *slot_bytes..][..*slot_bytes].copy_from_slice(data);
            }
            SlotLayout::Variable { spans } => match spans[block] {
                Some(span) if data.len() <= span.len => {
                    self.bytes[span.offset..span.offset + data.len()].copy_from_slice(data);
                    spans[block] = Some(Span {
                        offset: span.offset,
                        len: data.len(),
                    });
                }
                _ => {
                    self.alloc.grant(data.len())?;
                    self.granted += data.len();
                    let offset = self.bytes.len();
                    self.bytes.extend_from_slice(data);
                    spans[block] = Some(Span {
                        offset,
                        len: data.len(),
                    });
                }
            },
        }
        self.written[block] = true;
        Ok(())
    }

    /// Deep copy under the same allocator.
    pub fn try_clone(&self) -> Result<Self> {
        self.alloc.grant(self.granted)?;
        Ok(Self {
            bytes: self.bytes.clone(),
            layout: self.layout.clone(),
            written: self.written.clone(),
            alloc: self.alloc.clone(),
            granted: self.granted,
        })
    }
}

impl Drop for CompressedStorage {
    fn drop(&mut self) {
        self.alloc.release(self.granted);
    }
}
