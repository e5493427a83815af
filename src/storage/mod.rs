/// The block array and its free-block bitmap.
mod block_store;
/// Reading and writing linked block chains.
pub mod chain;
/// The inode array and its free-inode bitmap.
mod inode_table;

pub use block_store::*;
pub use inode_table::*;
