use bitvec::vec::BitVec;

use crate::disk_format::inode::{Inode, InodeType, FREE_INODE};
use crate::error::{FsError, Resource, Result};
use crate::lfs::InodeNumber;

use super::{chain, BlockStore};

/// A fixed number of inodes.
#[derive(Debug)]
pub struct InodeTable {
    inodes: Vec<Inode>,
    /// Tracks the allocation status of inodes.
    /// A value of `true` represents "occupied".
    inode_bitmap: BitVec,
}

impl InodeTable {
    #[must_use]
    pub fn new(num_inodes: usize) -> Self {
        let mut inode_bitmap = BitVec::new();
        inode_bitmap.resize(num_inodes, false);

        Self {
            inodes: vec![FREE_INODE; num_inodes],
            inode_bitmap,
        }
    }

    pub fn num_inodes(&self) -> usize {
        self.inodes.len()
    }

    pub fn num_free(&self) -> usize {
        self.inode_bitmap.count_zeros()
    }

    pub fn is_allocated(&self, inum: InodeNumber) -> bool {
        self.inode_bitmap
            .get(inum as usize)
            .map(|bit| *bit)
            .unwrap_or(false)
    }

    /// Takes an inode out of the free pool and marks it as being of type `type_`. The inode
    /// starts out empty.
    pub fn allocate(&mut self, type_: InodeType) -> Result<InodeNumber> {
        let index = self
            .inode_bitmap
            .first_zero()
            .ok_or(FsError::ResourceExhausted(Resource::Inode))?;

        self.inode_bitmap.set(index, true);
        self.inodes[index] = Inode {
            type_,
            ..FREE_INODE
        };

        Ok(index as InodeNumber)
    }

    /// Releases the inode's chain, resets the inode and returns it to the free pool.
    pub fn free(&mut self, store: &mut BlockStore, inum: InodeNumber) {
        let inode = &mut self.inodes[inum as usize];
        chain::free(store, inode);
        *inode = FREE_INODE;

        self.inode_bitmap.set(inum as usize, false);
    }

    pub fn inode(&self, inum: InodeNumber) -> &Inode {
        &self.inodes[inum as usize]
    }

    pub fn inode_mut(&mut self, inum: InodeNumber) -> &mut Inode {
        &mut self.inodes[inum as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_sets_type() {
        let mut table = InodeTable::new(4);

        let inum = table.allocate(InodeType::Directory).unwrap();

        assert!(table.is_allocated(inum));
        assert_eq!(table.inode(inum).type_, InodeType::Directory);
        assert_eq!(table.inode(inum).size, 0);
        assert_eq!(table.inode(inum).start_block, None);
        assert_eq!(table.num_free(), 3);
    }

    #[test]
    fn test_no_more_inodes() {
        let mut table = InodeTable::new(1);
        table.allocate(InodeType::Regular).unwrap();

        assert_eq!(
            table.allocate(InodeType::Regular),
            Err(FsError::ResourceExhausted(Resource::Inode))
        );
    }

    #[test]
    fn test_free_releases_chain() {
        let mut store = BlockStore::new(4, 2);
        let mut table = InodeTable::new(4);

        let inum = table.allocate(InodeType::Regular).unwrap();
        chain::write(&mut store, table.inode_mut(inum), b"hello").unwrap();
        assert_eq!(store.num_free(), 1);

        table.free(&mut store, inum);

        assert_eq!(store.num_free(), 4);
        assert_eq!(table.num_free(), 4);
        assert_eq!(*table.inode(inum), FREE_INODE);
    }

    #[test]
    fn test_reallocated_inode_starts_clean() {
        let mut store = BlockStore::new(4, 2);
        let mut table = InodeTable::new(1);

        let inum = table.allocate(InodeType::Directory).unwrap();
        chain::write(&mut store, table.inode_mut(inum), b"abc").unwrap();
        table.free(&mut store, inum);

        let again = table.allocate(InodeType::Regular).unwrap();
        assert_eq!(again, inum);
        assert_eq!(table.inode(again).type_, InodeType::Regular);
        assert_eq!(table.inode(again).size, 0);
        assert_eq!(table.inode(again).start_block, None);
    }
}
