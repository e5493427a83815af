//! Content is stored as a singly linked chain of blocks starting at the inode's `start_block`.
//! The last block is generally only partially used; the inode's `size` says where the content
//! ends.

use log::debug;

use crate::disk_format::inode::Inode;
use crate::error::{FsError, Resource, Result};
use crate::lfs::BlockNumber;

use super::BlockStore;

/// Iterates over the block numbers of a chain, head first.
///
/// Never yields more than `num_blocks` items, so a corrupted chain that loops still terminates.
pub struct ChainIter<'a> {
    store: &'a BlockStore,
    next: Option<BlockNumber>,
    remaining: usize,
}

impl Iterator for ChainIter<'_> {
    type Item = BlockNumber;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        if self.remaining == 0 {
            return None;
        }

        self.remaining -= 1;
        self.next = self.store.block(current).next;

        Some(current)
    }
}

pub fn iter<'a>(store: &'a BlockStore, inode: &Inode) -> ChainIter<'a> {
    ChainIter {
        store,
        next: inode.start_block,
        remaining: store.num_blocks(),
    }
}

/// The number of blocks needed to hold `len` bytes.
pub fn blocks_needed(store: &BlockStore, len: usize) -> usize {
    len.div_ceil(store.block_size())
}

/// Reads the whole content of `inode`.
pub fn read(store: &BlockStore, inode: &Inode) -> Vec<u8> {
    let mut data = Vec::with_capacity(inode.size);

    for block_number in iter(store, inode) {
        data.extend_from_slice(&store.block(block_number).data);
    }

    data.truncate(inode.size);
    data
}

/// Replaces the content of `inode` with `data`.
///
/// On failure the inode keeps its previous content and no block changes hands.
pub fn write(store: &mut BlockStore, inode: &mut Inode, data: &[u8]) -> Result<()> {
    let needed = blocks_needed(store, data.len());
    let reclaimable = iter(store, inode).count();

    if needed > store.num_free() + reclaimable {
        return Err(FsError::ResourceExhausted(Resource::Block));
    }

    free(store, inode);

    if data.is_empty() {
        return Ok(());
    }

    let run = store.allocate_run(needed)?;
    debug!("writing {} bytes across blocks {run:?}", data.len());

    for (i, chunk) in data.chunks(store.block_size()).enumerate() {
        let block = store.block_mut(run[i]);
        block.data[..chunk.len()].copy_from_slice(chunk);
        block.next = run.get(i + 1).copied();
    }

    inode.start_block = Some(run[0]);
    inode.size = data.len();

    Ok(())
}

/// Returns every block of the chain to the free pool and empties the inode.
pub fn free(store: &mut BlockStore, inode: &mut Inode) {
    let mut next = inode.start_block;

    while let Some(block_number) = next {
        next = store.block(block_number).next;
        store.free(block_number);
    }

    inode.start_block = None;
    inode.size = 0;
}
