//! Injectable allocation capability.
//!
//! Compressed storage and the block cache do not talk to a global allocator
//! directly; they ask an [`Allocator`] capability before growing a buffer.
//! The capability is an accounting seam: `Vec` still owns the memory, the
//! allocator decides whether a buffer of a given size may exist at all.
//! This keeps allocation failure distinct from success and lets tests
//! inject a quota that simulates exhaustion.

use std::fmt::Debug;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::{ArrayError, Result};

/// Grants or refuses buffer space.
pub trait Allocator: Debug + Send + Sync {
    /// Ask for `bytes` of buffer space. An `Err` must leave no space reserved.
    fn grant(&self, bytes: usize) -> Result<()>;

    /// Return previously granted space.
    fn release(&self, bytes: usize);
}

/// Default allocator: every request succeeds.
#[derive(Debug, Default)]
pub struct HeapAllocator;

impl Allocator for HeapAllocator {
    fn grant(&self, _bytes: usize) -> Result<()> {
        Ok(())
    }

    fn release(&self, _bytes: usize) {}
}

/// Allocator with a fixed byte budget, primarily a test double for
/// exercising allocation-failure paths.
#[derive(Debug)]
pub struct QuotaAllocator {
    budget: usize,
    used: AtomicUsize,
}

impl QuotaAllocator {
    pub fn new(budget: usize) -> Self {
        Self {
            budget,
            used: AtomicUsize::new(0),
        }
    }

    /// Bytes currently granted.
    pub fn used(&self) -> usize {
        self.used.load(Ordering::Relaxed)
    }
}

impl Allocator for QuotaAllocator {
    fn grant(&self, bytes: usize) -> Result<()> {
        let mut current = self.used.load(Ordering::Relaxed);
        loop {
            let next = current
                .checked_add(bytes)
                .filter(|&n| n <= self.budget)
                .ok_or(ArrayError::AllocationFailure { requested: bytes })?;
            match self.used.compare_exchange_weak(
                current,
                next,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return Ok(()),
                Err(observed) => current = observed,
            }
        }
    }

    fn release(&self, bytes: usize) {
        self.used.fetch_sub(bytes, Ordering::Relaxed);
    }
}

/// Shared allocator handle used across storage and cache.
pub type AllocRef = Arc<dyn Allocator>;

/// The default shared allocator.
pub fn default_allocator() -> AllocRef {
    Arc::new(HeapAllocator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heap_allocator_always_grants() {
        let alloc = HeapAllocator;
        assert!(alloc.grant(usize::MAX).is_ok());
    }

    #[test]
    fn test_quota_allocator_enforces_budget() {
        let alloc = QuotaAllocator::new(100);
        alloc.grant(60).unwrap();
        alloc.grant(40).unwrap();
        assert!(matches!(
            alloc.grant(1),
            Err(ArrayError::AllocationFailure { requested: 1 })
        ));
        alloc.release(50);
        assert_eq!(alloc.used(), 50);
        assert!(alloc.grant(50).is_ok());
    }
}
