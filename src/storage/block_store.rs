use bitvec::vec::BitVec;
use log::debug;

use crate::disk_format::block::Block;
use crate::error::{FsError, Resource, Result};
use crate::lfs::BlockNumber;

/// A fixed number of equally sized blocks.
#[derive(Debug)]
pub struct BlockStore {
    block_size: usize,
    blocks: Vec<Block>,
    /// Tracks the allocation status of blocks.
    /// A value of `true` represents "occupied".
    block_bitmap: BitVec,
}

impl BlockStore {
    /// Constructs a store of `num_blocks` free blocks of `block_size` bytes each.
    #[must_use]
    pub fn new(num_blocks: usize, block_size: usize) -> Self {
        let mut block_bitmap = BitVec::new();
        block_bitmap.resize(num_blocks, false);

        Self {
            block_size,
            blocks: vec![Block::new(block_size); num_blocks],
            block_bitmap,
        }
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    pub fn num_free(&self) -> usize {
        self.block_bitmap.count_zeros()
    }

    pub fn is_allocated(&self, block_number: BlockNumber) -> bool {
        self.block_bitmap
            .get(block_number)
            .map(|bit| *bit)
            .unwrap_or(false)
    }

    /// Takes a block out of the free pool.
    pub fn allocate(&mut self) -> Result<BlockNumber> {
        let block_number = self
            .block_bitmap
            .first_zero()
            .ok_or(FsError::ResourceExhausted(Resource::Block))?;

        self.block_bitmap.set(block_number, true);

        Ok(block_number)
    }

    /// Allocates `count` blocks at once. If the pool runs dry partway through, the blocks taken
    /// so far are returned to it before the error is reported.
    pub fn allocate_run(&mut self, count: usize) -> Result<Vec<BlockNumber>> {
        let mut run = Vec::with_capacity(count);

        for _ in 0..count {
            match self.allocate() {
                Ok(block_number) => run.push(block_number),
                Err(err) => {
                    debug!(
                        "rolling back {} of {count} blocks after exhaustion",
                        run.len()
                    );
                    run.into_iter().for_each(|b| self.free(b));

                    return Err(err);
                }
            }
        }

        Ok(run)
    }

    /// Resets the block and returns it to the free pool.
    ///
    /// Freeing a block that is already free is a caller bug and is not detected.
    pub fn free(&mut self, block_number: BlockNumber) {
        self.blocks[block_number].reset();
        self.block_bitmap.set(block_number, false);
    }

    pub fn block(&self, block_number: BlockNumber) -> &Block {
        &self.blocks[block_number]
    }

    pub fn block_mut(&mut self, block_number: BlockNumber) -> &mut Block {
        &mut self.blocks[block_number]
    }
}
