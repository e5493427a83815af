//! A directory stores its entries as the content of its own inode. The entry table is rewritten
//! as a whole on every change.
//!
//! An empty table is stored as zero bytes. A non-empty table is the bincode (fixed-width,
//! little-endian) encoding of `(version, entries)`:
//!
//! | field        | encoding                     |
//! |--------------|------------------------------|
//! | version      | `u16`                        |
//! | entry count  | `u64`                        |
//! | name length  | `u64`, once per entry        |
//! | name         | UTF-8 bytes, once per entry  |
//! | inode number | `u32`, once per entry        |
//!
//! Entries are emitted in name order, so the encoding of a given table is deterministic.

use std::collections::BTreeMap;
use std::mem::size_of;

use crate::error::{FsError, Result};
use crate::lfs::InodeNumber;

/// The current version of the entry-table encoding.
pub const ENTRY_TABLE_VERSION: u16 = 1;

/// The number of bytes used to encode an inode number in an entry.
pub const ENTRY_INUM_SIZE: usize = 4;
const_assert!(size_of::<InodeNumber>() == ENTRY_INUM_SIZE);

/// A directory's entries, mapping each child name to its inode.
pub type EntryMap = BTreeMap<String, InodeNumber>;

/// Serializes `entries` into the bytes stored in the directory's chain.
#[must_use]
pub fn encode_entries(entries: &EntryMap) -> Vec<u8> {
    if entries.is_empty() {
        return vec![];
    }

    bincode::serialize(&(ENTRY_TABLE_VERSION, entries))
        .expect("strings and integers always serialize")
}

/// Deserializes the content of directory `inum`.
pub fn decode_entries(inum: InodeNumber, bytes: &[u8]) -> Result<EntryMap> {
    if bytes.is_empty() {
        return Ok(EntryMap::new());
    }

    let (version, entries): (u16, EntryMap) =
        bincode::deserialize(bytes).map_err(|err| FsError::Corrupted {
            inum,
            reason: err.to_string(),
        })?;

    if version != ENTRY_TABLE_VERSION {
        return Err(FsError::Corrupted {
            inum,
            reason: format!("unsupported entry table version {version}"),
        });
    }

    Ok(entries)
}

/// Checks that `name` can be stored as a directory entry.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains('/') {
        return Err(FsError::InvalidOperation(format!(
            "invalid entry name: {name:?}"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_table_encodes_to_nothing() {
        assert!(encode_entries(&EntryMap::new()).is_empty());
        assert_eq!(decode_entries(0, &[]).unwrap(), EntryMap::new());
    }

    #[test]
    fn test_encoding_layout() {
        let entries = EntryMap::from([("a".to_owned(), 7)]);
        let bytes = encode_entries(&entries);

        let mut expected = vec![];
        expected.extend_from_slice(&ENTRY_TABLE_VERSION.to_le_bytes());
        expected.extend_from_slice(&1u64.to_le_bytes());
        expected.extend_from_slice(&1u64.to_le_bytes());
        expected.extend_from_slice(b"a");
        expected.extend_from_slice(&7u32.to_le_bytes());

        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_encoding_is_order_independent() {
        let mut forward = EntryMap::new();
        forward.insert("alpha".to_owned(), 1);
        forward.insert("beta".to_owned(), 2);

        let mut backward = EntryMap::new();
        backward.insert("beta".to_owned(), 2);
        backward.insert("alpha".to_owned(), 1);

        assert_eq!(encode_entries(&forward), encode_entries(&backward));
    }

    #[test]
    fn test_decode_multiple_entries() {
        let entries = EntryMap::from([
            ("notes.txt".to_owned(), 3),
            ("src".to_owned(), 12),
            ("ünïcödé".to_owned(), 40),
        ]);

        let decoded = decode_entries(5, &encode_entries(&entries)).unwrap();
        assert_eq!(decoded, entries);
    }

    #[test]
    fn test_decode_truncated_table() {
        let entries = EntryMap::from([("file".to_owned(), 1)]);
        let bytes = encode_entries(&entries);

        let err = decode_entries(9, &bytes[..bytes.len() - 1]).unwrap_err();
        assert!(matches!(err, FsError::Corrupted { inum: 9, .. }));
    }

    #[test]
    fn test_decode_unknown_version() {
        let mut bytes = encode_entries(&EntryMap::from([("file".to_owned(), 1)]));
        bytes[0] = 0xff;

        let err = decode_entries(2, &bytes).unwrap_err();
        assert!(matches!(err, FsError::Corrupted { inum: 2, .. }));
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("file").is_ok());
        assert!(validate_name(".hidden").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name(".").is_err());
        assert!(validate_name("..").is_err());
        assert!(validate_name("a/b").is_err());
    }
}
