use crate::lfs::{BlockNumber, InodeNumber};

/// The inode of the root directory. It is the first inode allocated on construction.
pub const ROOT_INODE: InodeNumber = 0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Inode {
    /// file type (free when the inode is unused)
    pub type_: InodeType,
    /// content size in bytes
    pub size: usize,
    /// first block of the content chain
    pub start_block: Option<BlockNumber>,
}

pub const FREE_INODE: Inode = Inode {
    type_: InodeType::Free,
    size: 0,
    start_block: None,
};

impl Inode {
    #[must_use]
    pub fn is_used(&self) -> bool {
        self.type_ != InodeType::Free
    }

    #[must_use]
    pub fn is_directory(&self) -> bool {
        self.type_ == InodeType::Directory
    }
}

impl Default for Inode {
    fn default() -> Self {
        FREE_INODE
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InodeType {
    /// This inode is not in use for any file.
    Free,
    /// This inode describes a directory.
    Directory,
    /// This inode describes a regular data file.
    Regular,
}
