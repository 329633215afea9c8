//! Dimension and block layout for 1-4 dimensional arrays.
//!
//! Arrays are tiled into hyper-rectangular blocks of extent
//! [`BLOCK_EXTENT`] along every used axis, so a block holds `4^rank`
//! elements (4, 16, 64 or 256). A single padded representation covers all
//! ranks: unused axes carry extent 1, so the coordinate-to-block mapping is
//! one uniform code path. Blocks at the array boundary are padded; padded
//! positions exist in the decompressed buffer but are never observable
//! through the array API.

use crate::error::{ArrayError, Result};

/// Elements per axis in one block.
pub const BLOCK_EXTENT: usize = 4;

/// Maximum supported dimensionality.
pub const MAX_RANK: usize = 4;

/// Maps N-dimensional coordinates to (block index, intra-block offset).
///
/// Both mappings are row-major: the last axis varies fastest, matching the
/// element order produced by iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    rank: usize,
    dims: [usize; MAX_RANK],
    blocks: [usize; MAX_RANK],
}

impl Layout {
    /// Build a layout for the given dimensions.
    ///
    /// Fails with `InvalidDimensions` unless the rank is 1..=4 and every
    /// extent is at least 1.
    pub fn new(dims: &[usize]) -> Result<Self> {
        if dims.is_empty() || dims.len() > MAX_RANK || dims.iter().any(|&d| d == 0) {
            return Err(ArrayError::InvalidDimensions {
                dims: dims.to_vec(),
            });
        }
        let mut padded = [1usize; MAX_RANK];
        let mut blocks = [1usize; MAX_RANK];
        for (axis, &d) in dims.iter().enumerate() {
            padded[axis] = d;
            blocks[axis] = d.div_ceil(BLOCK_EXTENT);
        }
        Ok(Self {
            rank: dims.len(),
            dims: padded,
            blocks,
        })
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Declared dimensions.
    pub fn dims(&self) -> &[usize] {
        &self.dims[..self.rank]
    }

    /// Total number of addressable elements.
    pub fn len(&self) -> usize {
        self.dims().iter().product()
    }

    /// Number of blocks per axis.
    pub fn blocks_per_axis(&self) -> &[usize] {
        &self.blocks[..self.rank]
    }

    /// Total number of blocks.
    pub fn block_count(&self) -> usize {
        self.blocks.iter().product()
    }

    /// Elements held by each (padded) block: `4^rank`.
    pub fn elems_per_block(&self) -> usize {
        BLOCK_EXTENT.pow(self.rank as u32)
    }

    /// Block extent along `axis` (1 for unused axes).
    fn extent(&self, axis: usize) -> usize {
        if axis < self.rank {
            BLOCK_EXTENT
        } else {
            1
        }
    }

    /// Whether a coordinate is inside the declared dimensions.
    pub fn contains(&self, coord: &[usize]) -> bool {
        coord.len() == self.rank && coord.iter().zip(self.dims()).all(|(&c, &d)| c < d)
    }

    /// Map a (valid) coordinate to its linear block index and the element
    /// offset inside that block.
    pub fn locate(&self, coord: &[usize]) -> (usize, usize) {
        debug_assert!(self.contains(coord));
        let mut block = 0usize;
        let mut offset = 0usize;
        for axis in 0..MAX_RANK {
            let c = coord.get(axis).copied().unwrap_or(0);
            block = block * self.blocks[axis] + c / BLOCK_EXTENT;
            offset = offset * self.extent(axis) + c % BLOCK_EXTENT;
        }
        (block, offset)
    }

    /// Per-axis block coordinate of a linear block index.
    pub fn block_coord(&self, mut block: usize) -> [usize; MAX_RANK] {
        debug_assert!(block < self.block_count());
        let mut coord = [0usize; MAX_RANK];
        for axis in (0..MAX_RANK).rev() {
            coord[axis] = block % self.blocks[axis];
            block /= self.blocks[axis];
        }
        coord
    }

    /// Coordinate of the `linear`-th element in row-major order.
    pub fn coord_of(&self, mut linear: usize) -> Vec<usize> {
        debug_assert!(linear < self.len());
        let mut coord = vec![0usize; self.rank];
        for axis in (0..self.rank).rev() {
            coord[axis] = linear % self.dims[axis];
            linear /= self.dims[axis];
        }
        coord
    }
}
