//! # Stat, scope, and mode types
//!
//! Fundamental small types shared by the contract, the combinators, and the
//! adapters.

use std::collections::BTreeMap;

/// The type of a filesystem entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EntryType {
    /// A regular file.
    File,
    /// A directory.
    Directory,
}

/// A file/directory stat record.
///
/// `size` is `0` for directories. Timestamps are seconds since epoch;
/// backends MAY omit them (`None`), in which case adapters substitute the
/// current time.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FileStat {
    /// File or directory.
    pub ty: EntryType,
    /// Size in bytes (0 for directories).
    pub size: u64,
    /// Last access time, seconds since epoch.
    pub atime: Option<f64>,
    /// Creation/change time, seconds since epoch.
    pub ctime: Option<f64>,
    /// Last modification time, seconds since epoch.
    pub mtime: Option<f64>,
    /// Backend-specific metadata that doesn't fit the common fields
    /// (e.g. a content hash). Empty for backends with nothing to add.
    #[cfg_attr(feature = "serde", serde(default))]
    pub extra: BTreeMap<String, String>,
}

impl FileStat {
    /// A minimal file stat with the given size and no timestamps.
    pub fn file(size: u64) -> Self {
        Self {
            ty: EntryType::File,
            size,
            atime: None,
            ctime: None,
            mtime: None,
            extra: BTreeMap::new(),
        }
    }

    /// A minimal directory stat.
    pub fn directory() -> Self {
        Self {
            ty: EntryType::Directory,
            size: 0,
            atime: None,
            ctime: None,
            mtime: None,
            extra: BTreeMap::new(),
        }
    }

    /// `true` iff this entry is a regular file.
    pub fn is_file(&self) -> bool {
        self.ty == EntryType::File
    }

    /// `true` iff this entry is a directory.
    pub fn is_dir(&self) -> bool {
        self.ty == EntryType::Directory
    }
}

/// Which outer execution boundaries can safely share a store.
///
/// Ordered `Thread < Process < System < Universe`. Governs which mount
/// strategy is legal (a FUSE mount needs at least `System`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AccessScope {
    /// Only safe to share within the owning thread (e.g. `MemoryUfs`).
    Thread,
    /// Safe to share across threads within a process, or reached through
    /// an out-of-process bridge.
    Process,
    /// Disk-backed; safe to share across processes on the same host.
    System,
    /// Network-reachable; safe to share across hosts.
    Universe,
}

/// The write mode a handle was opened with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OpenMode {
    /// Read-only.
    Read,
    /// Write, truncating any existing content.
    Write,
    /// Write, appending to any existing content.
    Append,
}

impl OpenMode {
    /// Parse a mode string of the grammar in spec §4.1: a write bit
    /// (`r`/`w`/`a`) with an optional updating flag (`+`).
    ///
    /// Returns `(mode, updating)`.
    pub fn parse(raw: &str) -> Option<(OpenMode, bool)> {
        let (base, updating) = match raw.strip_suffix('+') {
            Some(rest) => (rest, true),
            None => (raw, false),
        };
        let mode = match base {
            "r" => OpenMode::Read,
            "w" => OpenMode::Write,
            "a" => OpenMode::Append,
            _ => return None,
        };
        Some((mode, updating))
    }
}

/// The full open-mode grammar: a write bit plus an optional updating flag.
///
/// Payloads are always binary; text handling (encoding, newline
/// translation) belongs to the path adapter, never to a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Mode {
    /// The write bit: read, write, or append.
    pub kind: OpenMode,
    /// Whether the handle also supports the other direction (`r+`/`a+`).
    pub updating: bool,
}

impl Mode {
    /// Read-only.
    pub const READ: Mode = Mode {
        kind: OpenMode::Read,
        updating: false,
    };
    /// Write, truncating.
    pub const WRITE: Mode = Mode {
        kind: OpenMode::Write,
        updating: false,
    };
    /// Append.
    pub const APPEND: Mode = Mode {
        kind: OpenMode::Append,
        updating: false,
    };
    /// Read+write, file must exist.
    pub const READ_UPDATE: Mode = Mode {
        kind: OpenMode::Read,
        updating: true,
    };
    /// Append+read.
    pub const APPEND_UPDATE: Mode = Mode {
        kind: OpenMode::Append,
        updating: true,
    };

    /// `true` iff this mode permits writing.
    pub fn can_write(&self) -> bool {
        matches!(self.kind, OpenMode::Write | OpenMode::Append) || self.updating
    }

    /// `true` iff this mode permits reading.
    pub fn can_read(&self) -> bool {
        matches!(self.kind, OpenMode::Read) || self.updating
    }
}

impl std::str::FromStr for Mode {
    type Err = crate::FsError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        OpenMode::parse(raw)
            .map(|(kind, updating)| Mode { kind, updating })
            .ok_or_else(|| crate::FsError::Unsupported {
                operation: "open",
                detail: format!("unrecognized mode {raw:?}"),
            })
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let base = match self.kind {
            OpenMode::Read => "r",
            OpenMode::Write => "w",
            OpenMode::Append => "a",
        };
        write!(f, "{base}{}", if self.updating { "+" } else { "" })
    }
}

/// `seek` origin, mirroring POSIX `SEEK_SET`/`SEEK_CUR`/`SEEK_END`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Whence {
    /// Offset from the start of the stream.
    Start,
    /// Offset from the current cursor.
    Current,
    /// Offset from the end of the stream.
    End,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_stat_constructors() {
        assert!(FileStat::file(10).is_file());
        assert!(FileStat::directory().is_dir());
        assert_eq!(FileStat::directory().size, 0);
    }

    #[test]
    fn access_scope_ordering() {
        assert!(AccessScope::Thread < AccessScope::Process);
        assert!(AccessScope::Process < AccessScope::System);
        assert!(AccessScope::System < AccessScope::Universe);
    }

    #[test]
    fn open_mode_parse() {
        assert_eq!(OpenMode::parse("r"), Some((OpenMode::Read, false)));
        assert_eq!(OpenMode::parse("w"), Some((OpenMode::Write, false)));
        assert_eq!(OpenMode::parse("a+"), Some((OpenMode::Append, true)));
        assert_eq!(OpenMode::parse("r+"), Some((OpenMode::Read, true)));
        assert_eq!(OpenMode::parse("x"), None);
    }

    #[test]
    fn mode_from_str_and_display_roundtrip() {
        for raw in ["r", "w", "a", "r+", "a+"] {
            let mode: Mode = raw.parse().unwrap();
            assert_eq!(mode.to_string(), raw);
        }
        assert!("x".parse::<Mode>().is_err());
    }

    #[test]
    fn mode_can_read_can_write() {
        assert!(Mode::READ.can_read());
        assert!(!Mode::READ.can_write());
        assert!(Mode::WRITE.can_write());
        assert!(!Mode::WRITE.can_read());
        assert!(Mode::READ_UPDATE.can_read());
        assert!(Mode::READ_UPDATE.can_write());
    }
}
