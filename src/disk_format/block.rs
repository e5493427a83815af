use crate::lfs::BlockNumber;

/// A fixed-size unit of storage that links to the next block of its chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    /// The block contents. Always exactly `block_size` bytes long.
    pub data: Box<[u8]>,
    /// The next block in the chain, or `None` if this block terminates it.
    pub next: Option<BlockNumber>,
}

impl Block {
    /// Constructs a zeroed, unlinked block of `block_size` bytes.
    #[must_use]
    pub fn new(block_size: usize) -> Self {
        Self {
            data: vec![0; block_size].into_boxed_slice(),
            next: None,
        }
    }

    /// Clears the link and the contents.
    pub fn reset(&mut self) {
        self.data.fill(0);
        self.next = None;
    }
}
