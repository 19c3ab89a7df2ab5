//! # `MapAdapter` — a directory as a `name -> str | Map` tree
//!
//! Lets config-shaped trees be built and read as nested maps instead of
//! walking paths by hand: assigning a string writes a file, assigning a
//! map creates a directory and recurses into it.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::contract::Ufs;
use crate::error::FsError;
use crate::path::UfsPath;

/// One node of a map-shaped directory tree: either a file's text, or a
/// nested directory.
#[derive(Debug, Clone, PartialEq)]
pub enum MapValue {
    /// A file's full text contents.
    Leaf(String),
    /// A directory, recursively described the same way.
    Map(BTreeMap<String, MapValue>),
}

/// A directory within a store, viewed as a `name -> str | Map` tree.
pub struct MapAdapter {
    store: Arc<dyn Ufs>,
    root: UfsPath,
}

impl MapAdapter {
    /// View `root` (which must already exist as a directory) as a map.
    pub fn new(store: Arc<dyn Ufs>, root: UfsPath) -> Self {
        Self { store, root }
    }

    /// Read the whole subtree rooted here into a [`MapValue::Map`].
    pub fn read(&self) -> Result<MapValue, FsError> {
        self.read_dir(&self.root)
    }

    fn read_dir(&self, path: &UfsPath) -> Result<MapValue, FsError> {
        let mut entries = BTreeMap::new();
        for name in self.store.ls(path)? {
            let child = path.join_name(&name);
            let value = if self.store.info(&child)?.is_dir() {
                self.read_dir(&child)?
            } else {
                let bytes = self.store.cat(&child)?;
                MapValue::Leaf(String::from_utf8(bytes).map_err(FsError::io)?)
            };
            entries.insert(name, value);
        }
        Ok(MapValue::Map(entries))
    }

    /// Write `tree` under the root, creating directories and files as
    /// needed. Existing entries not present in `tree` are left alone.
    pub fn write(&self, tree: &MapValue) -> Result<(), FsError> {
        self.write_at(&self.root, tree)
    }

    fn write_at(&self, path: &UfsPath, value: &MapValue) -> Result<(), FsError> {
        match value {
            MapValue::Leaf(text) => self.store.put(path, text.as_bytes()),
            MapValue::Map(entries) => {
                if self.store.info(path).is_err() {
                    self.store.mkdir(path)?;
                }
                for (name, child) in entries {
                    self.write_at(&path.join_name(name), child)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::MemoryUfs;

    #[test]
    fn write_then_read_roundtrips_nested_tree() {
        let store: Arc<dyn Ufs> = Arc::new(MemoryUfs::new());
        store.mkdir(&UfsPath::root().join_name("cfg")).unwrap();
        let adapter = MapAdapter::new(store.clone(), UfsPath::new("/cfg"));

        let mut db = BTreeMap::new();
        db.insert("host".to_string(), MapValue::Leaf("localhost".into()));
        db.insert("port".to_string(), MapValue::Leaf("5432".into()));
        let mut tree = BTreeMap::new();
        tree.insert("db".to_string(), MapValue::Map(db));
        tree.insert("name".to_string(), MapValue::Leaf("myapp".into()));

        adapter.write(&MapValue::Map(tree.clone())).unwrap();
        assert_eq!(adapter.read().unwrap(), MapValue::Map(tree));
        assert_eq!(store.cat(&UfsPath::new("/cfg/db/host")).unwrap(), b"localhost");
    }

    #[test]
    fn empty_directory_reads_as_empty_map() {
        let store: Arc<dyn Ufs> = Arc::new(MemoryUfs::new());
        store.mkdir(&UfsPath::root().join_name("empty")).unwrap();
        let adapter = MapAdapter::new(store, UfsPath::new("/empty"));
        assert_eq!(adapter.read().unwrap(), MapValue::Map(BTreeMap::new()));
    }
}
