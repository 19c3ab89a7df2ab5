//! # Open-handle table
//!
//! An opaque small integer allocated by the store that produced it. Handles
//! are not portable across stores; using a handle after `close` (or after
//! the owning store's `stop`) is `FsError::bad_handle`.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

use crate::path::UfsPath;
use crate::stat::{OpenMode, Whence};

/// First handle id a fresh `HandleTable` hands out.
///
/// Starting above 0/1/2 keeps handle numbers visually distinct from stdin/
/// stdout/stderr when printed alongside OS descriptors during debugging.
pub const FIRST_HANDLE: u64 = 5;

/// A single open-handle entry: the path it was opened against (for
/// observability), its mode, the updating flag, and its byte cursor.
#[derive(Debug, Clone)]
pub struct HandleEntry {
    /// The path this handle was opened against.
    pub path: UfsPath,
    /// Read, write, or append.
    pub mode: OpenMode,
    /// Whether the handle also supports the other direction (`r+`/`a+`).
    pub updating: bool,
    /// Current byte cursor.
    pub cursor: u64,
}

impl HandleEntry {
    /// A new handle entry at cursor 0, or at end-of-file for append mode
    /// given the current `size`.
    pub fn new(path: UfsPath, mode: OpenMode, updating: bool, size: u64) -> Self {
        let cursor = if mode == OpenMode::Append { size } else { 0 };
        Self {
            path,
            mode,
            updating,
            cursor,
        }
    }

    /// Compute the new cursor position for a `seek`, without mutating.
    pub fn seek_target(&self, pos: i64, whence: Whence, len: u64) -> u64 {
        let base = match whence {
            Whence::Start => 0,
            Whence::Current => self.cursor as i64,
            Whence::End => len as i64,
        };
        (base + pos).max(0) as u64
    }
}

/// A per-store table of open handles, keyed by monotonically increasing ids.
///
/// Internally a `DashMap` for lock-free concurrent access across handles
/// (mirroring the handle/lock tables of `nfs-mamont`), with a separate
/// atomic counter for id allocation. Closing a handle removes its entry;
/// ids are never reused.
#[derive(Debug, Default)]
pub struct HandleTable {
    next_id: AtomicU64,
    entries: DashMap<u64, HandleEntry>,
}

impl HandleTable {
    /// A fresh, empty handle table.
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(FIRST_HANDLE),
            entries: DashMap::new(),
        }
    }

    /// Allocate a new handle id and store its entry.
    pub fn insert(&self, entry: HandleEntry) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.entries.insert(id, entry);
        id
    }

    /// Look up a handle's current entry.
    pub fn get(&self, id: u64) -> Option<HandleEntry> {
        self.entries.get(&id).map(|e| e.clone())
    }

    /// Mutate a handle's entry in place, returning `false` if the handle
    /// does not exist.
    pub fn with_mut<R>(&self, id: u64, f: impl FnOnce(&mut HandleEntry) -> R) -> Option<R> {
        self.entries.get_mut(&id).map(|mut e| f(&mut e))
    }

    /// Remove and return a handle's entry (on `close`).
    pub fn remove(&self, id: u64) -> Option<HandleEntry> {
        self.entries.remove(&id).map(|(_, e)| e)
    }

    /// Number of currently open handles.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` iff no handles are currently open.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_start_at_five_and_increase() {
        let table = HandleTable::new();
        let a = table.insert(HandleEntry::new(UfsPath::new("/a"), OpenMode::Read, false, 0));
        let b = table.insert(HandleEntry::new(UfsPath::new("/b"), OpenMode::Read, false, 0));
        assert_eq!(a, FIRST_HANDLE);
        assert_eq!(b, FIRST_HANDLE + 1);
    }

    #[test]
    fn close_removes_and_lookup_after_close_fails() {
        let table = HandleTable::new();
        let h = table.insert(HandleEntry::new(UfsPath::new("/a"), OpenMode::Read, false, 0));
        assert!(table.get(h).is_some());
        assert!(table.remove(h).is_some());
        assert!(table.get(h).is_none());
    }

    #[test]
    fn append_mode_starts_cursor_at_size() {
        let entry = HandleEntry::new(UfsPath::new("/a"), OpenMode::Append, false, 42);
        assert_eq!(entry.cursor, 42);
    }

    #[test]
    fn seek_target_variants() {
        let mut entry = HandleEntry::new(UfsPath::new("/a"), OpenMode::Read, true, 0);
        entry.cursor = 10;
        assert_eq!(entry.seek_target(5, Whence::Start, 100), 5);
        assert_eq!(entry.seek_target(5, Whence::Current, 100), 15);
        assert_eq!(entry.seek_target(-5, Whence::End, 100), 95);
        assert_eq!(entry.seek_target(-1000, Whence::Start, 100), 0);
    }
}
