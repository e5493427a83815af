/// Perform a const assertion.
macro_rules! const_assert {
    ($($tt:tt)*) => {
        const _: () = assert!($($tt)*);
    }
}

/// Linked blocks.
pub mod block;
/// Directory entries and the entry-table encoding.
pub mod directory_entry;
/// Inodes.
pub mod inode;
