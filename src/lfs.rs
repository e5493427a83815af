use std::collections::HashSet;

use log::{debug, info, warn};

use crate::{
    disk_format::{
        directory_entry::{decode_entries, encode_entries, validate_name, EntryMap},
        inode::{InodeType, ROOT_INODE},
    },
    error::{FsError, Result},
    path::{self, DirectoryView},
    storage::{chain, BlockStore, InodeTable},
};

pub type InodeNumber = u32;

pub type BlockNumber = usize;

/// The operations a file namespace offers its users, independent of how content is laid out in
/// blocks.
///
/// Paths are `/`-separated. Paths starting with `/` are resolved from the root, all others from
/// the current directory.
pub trait FileSystem {
    /// Creates an empty directory.
    fn make_directory(&mut self, path: &str) -> Result<()>;

    /// Removes an empty directory other than the root.
    fn remove_directory(&mut self, path: &str) -> Result<()>;

    /// Creates a regular file holding `content`.
    fn make_file(&mut self, path: &str, content: &[u8]) -> Result<()>;

    /// Removes a regular file.
    fn remove_file(&mut self, path: &str) -> Result<()>;

    /// Moves the entry at `source` into the directory `destination`, keeping its name.
    fn move_entry(&mut self, source: &str, destination: &str) -> Result<()>;

    /// Returns the content of a regular file as text.
    fn read(&self, path: &str) -> Result<String>;

    /// Lists a directory (the current one if `path` is `None`) in name order.
    fn list(&self, path: Option<&str>) -> Result<Vec<(String, InodeType)>>;

    fn change_directory(&mut self, path: &str) -> Result<()>;

    /// The absolute path of the current directory.
    fn current_path(&self) -> String;
}

/// Allocation counters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Usage {
    pub block_size: usize,
    pub total_blocks: usize,
    pub free_blocks: usize,
    pub total_inodes: usize,
    pub free_inodes: usize,
}

/// An in-memory filesystem that stores every file and directory as a linked chain of blocks.
#[derive(Debug)]
pub struct LinkedFs {
    blocks: BlockStore,
    inodes: InodeTable,
    current_dir: DirectoryView,
}

impl LinkedFs {
    /// Constructs a filesystem of `num_blocks` blocks of `block_size` bytes each, with one inode
    /// per block and an empty root directory as the current directory.
    pub fn new(num_blocks: usize, block_size: usize) -> Result<Self> {
        let total_size = num_blocks.checked_mul(block_size);
        if num_blocks == 0
            || block_size == 0
            || num_blocks > InodeNumber::MAX as usize
            || total_size.map_or(true, |size| size > isize::MAX as usize)
        {
            return Err(FsError::InvalidGeometry {
                num_blocks,
                block_size,
            });
        }

        let mut inodes = InodeTable::new(num_blocks);
        let root = inodes.allocate(InodeType::Directory)?;
        debug_assert_eq!(root, ROOT_INODE, "the root is the first inode allocated");

        info!("{num_blocks} total blocks of {block_size} bytes");
        info!("{num_blocks} total inodes");

        Ok(Self {
            blocks: BlockStore::new(num_blocks, block_size),
            inodes,
            current_dir: DirectoryView::root(),
        })
    }

    pub fn usage(&self) -> Usage {
        Usage {
            block_size: self.blocks.block_size(),
            total_blocks: self.blocks.num_blocks(),
            free_blocks: self.blocks.num_free(),
            total_inodes: self.inodes.num_inodes(),
            free_inodes: self.inodes.num_free(),
        }
    }

    /// The current directory.
    pub fn current_dir(&self) -> &DirectoryView {
        &self.current_dir
    }

    /// Resolves `path` to a directory.
    ///
    /// `..` moves to the parent of the directory reached so far, and stays put at the root.
    pub fn resolve(&self, path: &str) -> Result<DirectoryView> {
        let mut view = if path::is_absolute(path) {
            DirectoryView::root()
        } else {
            self.current_dir.clone()
        };

        for component in path::components(path) {
            if component == ".." {
                if let Some(parent) = view.parent() {
                    view = parent;
                }

                continue;
            }

            let entries = self.read_entries(view.inode())?;
            let inum = *entries
                .get(component)
                .ok_or_else(|| FsError::PathNotFound(path.to_owned()))?;

            if !self.inodes.inode(inum).is_directory() {
                return Err(FsError::NotADirectory(path.to_owned()));
            }

            view = view.child(component, inum);
        }

        Ok(view)
    }

    /// Returns the raw content of a regular file.
    pub fn read_bytes(&self, path: &str) -> Result<Vec<u8>> {
        let (parent, name) = self.resolve_entry(path)?;
        let inum = self.lookup(&parent, name, path)?;

        let inode = self.inodes.inode(inum);
        if inode.is_directory() {
            return Err(FsError::IsADirectory(path.to_owned()));
        }

        Ok(chain::read(&self.blocks, inode))
    }

    /// Checks the filesystem for consistency. Performs a depth-first traversal of the directory
    /// tree, then compares what was reached against the allocation bitmaps.
    pub fn check_filesystem(&self) -> Result<()> {
        if !self.inodes.inode(ROOT_INODE).is_directory() {
            return Err(inconsistent("root inode does not represent a directory"));
        }

        let mut queue = vec![ROOT_INODE];
        let mut reachable_inodes = HashSet::<InodeNumber>::new();
        let mut chained_blocks = HashSet::<BlockNumber>::new();

        while let Some(inum) = queue.pop() {
            if inum as usize >= self.inodes.num_inodes() {
                return Err(inconsistent(format!("invalid inode number: {inum}")));
            }

            let inode = self.inodes.inode(inum);
            if !self.inodes.is_allocated(inum) || !inode.is_used() {
                return Err(inconsistent(format!(
                    "directory tree includes free inode #{inum}"
                )));
            }

            if !reachable_inodes.insert(inum) {
                return Err(inconsistent(format!(
                    "inode #{inum} is reachable more than once"
                )));
            }

            let block_numbers = chain::iter(&self.blocks, inode).collect::<Vec<_>>();
            if block_numbers.len() != chain::blocks_needed(&self.blocks, inode.size) {
                return Err(inconsistent(format!(
                    "inode #{inum} has {} blocks for {} bytes",
                    block_numbers.len(),
                    inode.size
                )));
            }

            for block_number in block_numbers {
                if !self.blocks.is_allocated(block_number) {
                    return Err(inconsistent(format!(
                        "inode #{inum} chains through free block {block_number}"
                    )));
                }

                if !chained_blocks.insert(block_number) {
                    return Err(inconsistent(format!(
                        "block {block_number} appears in more than one chain position"
                    )));
                }
            }

            if inode.is_directory() {
                for (name, child) in self.read_entries(inum)? {
                    if validate_name(&name).is_err() {
                        return Err(inconsistent(format!(
                            "directory #{inum} has an invalid entry name: {name:?}"
                        )));
                    }

                    queue.push(child);
                }
            }
        }

        let allocated_inodes = self.inodes.num_inodes() - self.inodes.num_free();
        if reachable_inodes.len() != allocated_inodes {
            return Err(inconsistent(format!(
                "{} allocated inodes are not reachable from the root",
                allocated_inodes - reachable_inodes.len()
            )));
        }

        let allocated_blocks = self.blocks.num_blocks() - self.blocks.num_free();
        if chained_blocks.len() != allocated_blocks {
            return Err(inconsistent(format!(
                "{} allocated blocks do not belong to any chain",
                allocated_blocks - chained_blocks.len()
            )));
        }

        Ok(())
    }

    /// Resolves the parent directory of `path` and returns it along with the leaf name, which
    /// must be usable as a new entry name.
    fn resolve_parent<'p>(&self, path: &'p str) -> Result<(DirectoryView, &'p str)> {
        let (parent_path, name) = path::split_leaf(path);
        validate_name(name)?;

        Ok((self.resolve(parent_path)?, name))
    }

    /// Like [`Self::resolve_parent`], for paths naming an existing entry. A path whose leaf is
    /// `.`, `..` or empty names a directory, which is reported as `IsADirectory` once it resolves.
    fn resolve_entry<'p>(&self, path: &'p str) -> Result<(DirectoryView, &'p str)> {
        let (parent_path, name) = path::split_leaf(path);
        if matches!(name, "" | "." | "..") {
            self.resolve(path)?;
            return Err(FsError::IsADirectory(path.to_owned()));
        }

        Ok((self.resolve(parent_path)?, name))
    }

    fn lookup(&self, parent: &DirectoryView, name: &str, path: &str) -> Result<InodeNumber> {
        self.read_entries(parent.inode())?
            .get(name)
            .copied()
            .ok_or_else(|| FsError::PathNotFound(path.to_owned()))
    }

    fn read_entries(&self, inum: InodeNumber) -> Result<EntryMap> {
        let data = chain::read(&self.blocks, self.inodes.inode(inum));
        decode_entries(inum, &data)
    }

    fn write_entries(&mut self, inum: InodeNumber, entries: &EntryMap) -> Result<()> {
        let data = encode_entries(entries);
        debug!(
            "[inode #{inum}] rewriting {} entries ({} bytes)",
            entries.len(),
            data.len()
        );

        chain::write(&mut self.blocks, self.inodes.inode_mut(inum), &data)
    }

    /// Allocates an inode holding `content` and links it into the parent directory of `path`.
    /// Nothing is left allocated if any step fails.
    fn create(&mut self, path: &str, type_: InodeType, content: &[u8]) -> Result<InodeNumber> {
        let (parent, name) = self.resolve_parent(path)?;

        let mut entries = self.read_entries(parent.inode())?;
        if entries.contains_key(name) {
            return Err(FsError::AlreadyExists(name.to_owned()));
        }

        let new_inum = self.inodes.allocate(type_)?;

        let written = chain::write(&mut self.blocks, self.inodes.inode_mut(new_inum), content);
        let linked = written.and_then(|()| {
            entries.insert(name.to_owned(), new_inum);
            self.write_entries(parent.inode(), &entries)
        });

        if let Err(err) = linked {
            self.inodes.free(&mut self.blocks, new_inum);
            return Err(err);
        }

        Ok(new_inum)
    }
}

impl FileSystem for LinkedFs {
    fn make_directory(&mut self, path: &str) -> Result<()> {
        let inum = self.create(path, InodeType::Directory, &[])?;
        info!("[inode #{inum}] created directory {path}");

        Ok(())
    }

    fn remove_directory(&mut self, path: &str) -> Result<()> {
        let target = self.resolve(path)?;
        let Some(parent) = target.parent() else {
            return Err(FsError::RootDirectory);
        };

        if self.current_dir.passes_through(target.inode()) {
            warn!("refusing to remove {path}: it contains the current directory");
            return Err(FsError::InvalidOperation(format!(
                "cannot remove '{path}': it is the current directory or one of its ancestors"
            )));
        }

        if !self.read_entries(target.inode())?.is_empty() {
            return Err(FsError::DirectoryNotEmpty(path.to_owned()));
        }

        let mut entries = self.read_entries(parent.inode())?;
        entries.remove(target.name());
        self.write_entries(parent.inode(), &entries)?;

        self.inodes.free(&mut self.blocks, target.inode());
        info!("[inode #{}] removed directory {path}", target.inode());

        Ok(())
    }

    fn make_file(&mut self, path: &str, content: &[u8]) -> Result<()> {
        let inum = self.create(path, InodeType::Regular, content)?;
        info!(
            "[inode #{inum}] created file {path} ({} bytes)",
            content.len()
        );

        Ok(())
    }

    fn remove_file(&mut self, path: &str) -> Result<()> {
        let (parent, name) = self.resolve_entry(path)?;

        let mut entries = self.read_entries(parent.inode())?;
        let inum = entries
            .remove(name)
            .ok_or_else(|| FsError::PathNotFound(path.to_owned()))?;

        if self.inodes.inode(inum).is_directory() {
            return Err(FsError::IsADirectory(path.to_owned()));
        }

        self.write_entries(parent.inode(), &entries)?;
        self.inodes.free(&mut self.blocks, inum);
        info!("[inode #{inum}] removed file {path}");

        Ok(())
    }

    /// Both entry tables are computed and validated before either is written. The destination is
    /// committed first so that a failure leaves the entry reachable from its source.
    fn move_entry(&mut self, source: &str, destination: &str) -> Result<()> {
        let (source_parent, name) = self.resolve_parent(source)?;
        let target = self.resolve(destination)?;

        let mut source_entries = self.read_entries(source_parent.inode())?;
        let inum = *source_entries
            .get(name)
            .ok_or_else(|| FsError::PathNotFound(source.to_owned()))?;

        let mut target_entries = self.read_entries(target.inode())?;
        if target_entries.contains_key(name) {
            return Err(FsError::AlreadyExists(format!("{destination}/{name}")));
        }

        let is_directory = self.inodes.inode(inum).is_directory();
        if is_directory && target.passes_through(inum) {
            return Err(FsError::InvalidOperation(format!(
                "cannot move '{source}' into itself"
            )));
        }

        source_entries.remove(name);
        target_entries.insert(name.to_owned(), inum);

        self.write_entries(target.inode(), &target_entries)?;
        // the source table only shrinks, so its rewrite never needs new blocks
        self.write_entries(source_parent.inode(), &source_entries)?;

        if is_directory {
            if let Some(relocated) = self.current_dir.relocate(inum, &target) {
                debug!("current directory moved to {}", relocated.path());
                self.current_dir = relocated;
            }
        }

        info!("[inode #{inum}] moved {source} into {}", target.path());

        Ok(())
    }

    fn read(&self, path: &str) -> Result<String> {
        let data = self.read_bytes(path)?;
        Ok(String::from_utf8_lossy(&data).into_owned())
    }

    fn list(&self, path: Option<&str>) -> Result<Vec<(String, InodeType)>> {
        let view = match path {
            Some(path) => self.resolve(path)?,
            None => self.current_dir.clone(),
        };

        // entry maps iterate in name order
        Ok(self
            .read_entries(view.inode())?
            .into_iter()
            .map(|(name, inum)| {
                let type_ = self.inodes.inode(inum).type_;
                (name, type_)
            })
            .collect())
    }

    fn change_directory(&mut self, path: &str) -> Result<()> {
        self.current_dir = self.resolve(path)?;
        Ok(())
    }

    fn current_path(&self) -> String {
        self.current_dir.path()
    }
}

fn inconsistent(reason: impl Into<String>) -> FsError {
    FsError::Inconsistent(reason.into())
}
