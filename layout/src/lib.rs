//! Indexed layout descriptors for non-contiguous buffer transfers.
//!
//! An [`IndexedLayout`] is an immutable list of (length, offset) blocks that
//! names which elements of a flat buffer take part in a transfer. It owns no
//! buffer data; the same descriptor can be applied to any buffer of matching
//! dimension, any number of times.
use serde::{Deserialize, Serialize};
use std::collections::TryReserveError;

mod matrix;
pub use matrix::Matrix;

#[derive(Debug)]
pub enum Error {
    /// Backing storage for the block tables or a buffer could not be
    /// allocated.
    AllocationFailure,

    /// Dimension must be at least 1.
    InvalidDimension,

    /// Buffer does not cover the extent named by the descriptor.
    ShortBuffer,

    /// Element count does not match the descriptor (no partial regions).
    CountMismatch,
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<TryReserveError> for Error {
    fn from(_: TryReserveError) -> Error {
        Error::AllocationFailure
    }
}

/// One contiguous run of elements within a flat buffer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Number of elements in the run.
    pub len: usize,

    /// Flat offset of the first element.
    pub offset: usize,
}

/// Ordered block list describing a strided region of a flat buffer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedLayout {
    blocks: Vec<Block>,
}

impl IndexedLayout {
    /// Build a layout from an explicit block list.
    pub fn new(blocks: Vec<Block>) -> Result<IndexedLayout> {
        if blocks.is_empty() {
            return Err(Error::InvalidDimension);
        }
        Ok(IndexedLayout { blocks })
    }

    /// Layout covering the upper triangle (diagonal included) of a
    /// `dim x dim` row-major matrix: row `r` keeps its last `dim - r`
    /// elements, starting at flat offset `r*dim + r`.
    pub fn upper_triangular(dim: usize) -> Result<IndexedLayout> {
        if dim < 1 {
            return Err(Error::InvalidDimension);
        }
        let mut blocks = Vec::new();
        blocks.try_reserve_exact(dim)?;
        for row in 0..dim {
            blocks.push(Block {
                len: dim - row,
                offset: row * dim + row,
            });
        }
        IndexedLayout::new(blocks)
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Total number of elements named by the layout.
    pub fn total_len(&self) -> usize {
        self.blocks.iter().map(|block| block.len).sum()
    }

    /// One past the highest offset named by the layout.
    pub fn extent(&self) -> usize {
        self.blocks
            .iter()
            .map(|block| block.offset + block.len)
            .max()
            .unwrap_or(0)
    }

    /// Gather the described elements of `buf` into a contiguous vector, in
    /// block order.
    pub fn pack<T: Copy>(&self, buf: &[T]) -> Result<Vec<T>> {
        if buf.len() < self.extent() {
            return Err(Error::ShortBuffer);
        }
        let mut packed = Vec::new();
        packed.try_reserve_exact(self.total_len())?;
        for block in &self.blocks {
            packed.extend_from_slice(&buf[block.offset..block.offset + block.len]);
        }
        Ok(packed)
    }

    /// Scatter `elems` back into `buf` at the described offsets. Offsets not
    /// named by the layout are left untouched.
    pub fn unpack<T: Copy>(&self, elems: &[T], buf: &mut [T]) -> Result<()> {
        if elems.len() != self.total_len() {
            return Err(Error::CountMismatch);
        }
        if buf.len() < self.extent() {
            return Err(Error::ShortBuffer);
        }
        let mut next = 0;
        for block in &self.blocks {
            buf[block.offset..block.offset + block.len]
                .copy_from_slice(&elems[next..next + block.len]);
            next += block.len;
        }
        Ok(())
    }
}
