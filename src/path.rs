//! Directory views and path splitting.
//!
//! A [`DirectoryView`] is derived from the entry tables while a path is resolved and is never
//! stored in the filesystem itself. It records how the directory was reached, which is what
//! gives `..` its meaning.

use crate::disk_format::inode::ROOT_INODE;
use crate::lfs::InodeNumber;

/// The path separator.
pub const SEPARATOR: char = '/';

/// A directory as reached from the root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirectoryView {
    /// Name and inode of every directory below the root on the way here, this one last.
    trail: Vec<(String, InodeNumber)>,
}

impl DirectoryView {
    #[must_use]
    pub fn root() -> Self {
        Self { trail: vec![] }
    }

    pub fn is_root(&self) -> bool {
        self.trail.is_empty()
    }

    /// The entry name of this directory in its parent, `/` for the root.
    pub fn name(&self) -> &str {
        self.trail.last().map_or("/", |(name, _)| name.as_str())
    }

    pub fn inode(&self) -> InodeNumber {
        self.trail.last().map_or(ROOT_INODE, |&(_, inum)| inum)
    }

    /// The view of the parent directory, `None` for the root.
    #[must_use]
    pub fn parent(&self) -> Option<DirectoryView> {
        let (_, ancestors) = self.trail.split_last()?;

        Some(Self {
            trail: ancestors.to_vec(),
        })
    }

    /// The view of the subdirectory `name` stored in inode `inum`.
    #[must_use]
    pub fn child(&self, name: &str, inum: InodeNumber) -> Self {
        let mut trail = self.trail.clone();
        trail.push((name.to_owned(), inum));

        Self { trail }
    }

    /// Whether `inum` is this directory or one of its ancestors.
    pub fn passes_through(&self, inum: InodeNumber) -> bool {
        inum == ROOT_INODE || self.trail.iter().any(|&(_, i)| i == inum)
    }

    /// Re-derives this view after directory `inum`, one of its ancestors (or itself), was moved
    /// into `new_parent`. Returns `None` if the view does not pass through `inum`.
    #[must_use]
    pub fn relocate(&self, inum: InodeNumber, new_parent: &DirectoryView) -> Option<Self> {
        let position = self.trail.iter().position(|&(_, i)| i == inum)?;

        let mut trail = new_parent.trail.clone();
        trail.extend_from_slice(&self.trail[position..]);

        Some(Self { trail })
    }

    /// The absolute path of this directory.
    pub fn path(&self) -> String {
        if self.is_root() {
            return SEPARATOR.to_string();
        }

        self.trail
            .iter()
            .map(|(name, _)| format!("{SEPARATOR}{name}"))
            .collect()
    }
}

/// Whether resolution of `path` starts at the root rather than the current directory.
pub fn is_absolute(path: &str) -> bool {
    path.starts_with(SEPARATOR)
}

/// The components of `path` that need resolving. Empty components and `.` are skipped.
pub fn components(path: &str) -> impl Iterator<Item = &str> {
    path.split(SEPARATOR)
        .filter(|component| !component.is_empty() && *component != ".")
}

/// Splits `path` at its last separator into the path of the parent directory and the leaf name.
///
/// An empty parent means the current directory. Trailing separators are ignored.
pub fn split_leaf(path: &str) -> (&str, &str) {
    let trimmed = path.trim_end_matches(SEPARATOR);

    match trimmed.rsplit_once(SEPARATOR) {
        Some(("", leaf)) => ("/", leaf),
        Some((parent, leaf)) => (parent, leaf),
        None if is_absolute(path) => ("/", ""),
        None => ("", trimmed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_view() {
        let root = DirectoryView::root();

        assert!(root.is_root());
        assert_eq!(root.name(), "/");
        assert_eq!(root.inode(), ROOT_INODE);
        assert_eq!(root.parent(), None);
        assert_eq!(root.path(), "/");
    }

    #[test]
    fn test_child_and_parent() {
        let a = DirectoryView::root().child("a", 3);
        let b = a.child("b", 7);

        assert_eq!(b.name(), "b");
        assert_eq!(b.inode(), 7);
        assert_eq!(b.path(), "/a/b");
        assert_eq!(b.parent(), Some(a.clone()));
        assert_eq!(a.parent(), Some(DirectoryView::root()));
    }

    #[test]
    fn test_passes_through() {
        let view = DirectoryView::root().child("a", 3).child("b", 7);

        assert!(view.passes_through(ROOT_INODE));
        assert!(view.passes_through(3));
        assert!(view.passes_through(7));
        assert!(!view.passes_through(9));
    }

    #[test]
    fn test_relocate() {
        let cwd = DirectoryView::root().child("a", 3).child("b", 7).child("c", 8);
        let target = DirectoryView::root().child("x", 5);

        let moved = cwd.relocate(7, &target).unwrap();
        assert_eq!(moved.path(), "/x/b/c");
        assert_eq!(moved.inode(), 8);

        assert_eq!(cwd.relocate(42, &target), None);
    }

    #[test]
    fn test_components() {
        assert_eq!(
            components("/a//./b/../c/").collect::<Vec<_>>(),
            ["a", "b", "..", "c"]
        );
        assert_eq!(components("/").count(), 0);
        assert_eq!(components("").count(), 0);
    }

    #[test]
    fn test_split_leaf() {
        assert_eq!(split_leaf("file"), ("", "file"));
        assert_eq!(split_leaf("/file"), ("/", "file"));
        assert_eq!(split_leaf("a/b/file"), ("a/b", "file"));
        assert_eq!(split_leaf("/a/b/"), ("/a", "b"));
        assert_eq!(split_leaf("../file"), ("..", "file"));
        assert_eq!(split_leaf("/"), ("/", ""));
        assert_eq!(split_leaf(""), ("", ""));
    }
}
