pub mod command;
mod disk_format;
pub mod error;
pub mod lfs;
pub mod path;
mod storage;

pub use disk_format::inode::InodeType;
pub use error::{FsError, Resource, Result};
pub use lfs::{FileSystem, LinkedFs, Usage};
