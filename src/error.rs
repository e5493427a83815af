use std::fmt;

use thiserror::Error;

use crate::lfs::InodeNumber;

/// The kind of resource an allocation ran out of.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resource {
    Block,
    Inode,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Resource::Block => write!(f, "blocks"),
            Resource::Inode => write!(f, "inodes"),
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum FsError {
    #[error("no free {0} available")]
    ResourceExhausted(Resource),
    #[error("'{0}': no such file or directory")]
    PathNotFound(String),
    #[error("'{0}': not a directory")]
    NotADirectory(String),
    #[error("'{0}': is a directory")]
    IsADirectory(String),
    #[error("'{0}': already exists")]
    AlreadyExists(String),
    #[error("'{0}': directory not empty")]
    DirectoryNotEmpty(String),
    #[error("cannot remove the root directory")]
    RootDirectory,
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
    #[error("invalid geometry: {num_blocks} blocks of {block_size} bytes")]
    InvalidGeometry {
        num_blocks: usize,
        block_size: usize,
    },
    #[error("entry table of inode #{inum} is corrupted: {reason}")]
    Corrupted { inum: InodeNumber, reason: String },
    #[error("filesystem is inconsistent: {0}")]
    Inconsistent(String),
}

pub type Result<T> = std::result::Result<T, FsError>;
