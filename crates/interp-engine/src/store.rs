//! Persistent, content-addressed intertable cache.
//!
//! One file per (source grid id, method, mode) combination, named
//! `{grid_id with '$' replaced by '_'}_{method}_{mode}.itbl`.
//!
//! # Warning
//!
//! The *target* grid identity is not part of the key. Interpolating the same
//! source grid onto two different target grids through one store directory
//! overwrites the first table with the second; callers must use a separate
//! store directory per target grid.

use crate::config::{Method, Mode};
use crate::table::Intertable;
use interp_common::{InterpError, InterpResult};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// File extension for persisted intertables.
const EXTENSION: &str = "itbl";

/// Filesystem-backed table cache.
pub struct IntertableStore {
    dir: PathBuf,
}

impl IntertableStore {
    /// Open a store rooted at `dir`, creating the directory if absent.
    pub fn new(dir: impl Into<PathBuf>) -> InterpResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Store root directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Compose the table file name for a (grid, method, mode) combination.
    pub fn table_name(grid_id: &str, method: Method, mode: Mode) -> String {
        format!(
            "{}_{}_{}.{}",
            grid_id.replace('$', "_"),
            method,
            mode,
            EXTENSION
        )
    }

    /// Full path of a named table.
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Load a table if its file exists.
    ///
    /// A present-but-malformed file is a fatal decode error, not a miss.
    pub fn lookup(&self, name: &str) -> InterpResult<Option<Intertable>> {
        let path = self.path_for(name);
        if !path.exists() {
            return Ok(None);
        }
        debug!(path = %path.display(), "loading intertable");
        let file = File::open(&path)?;
        let mut reader = BufReader::new(file);
        Intertable::read_from(&mut reader).map(Some)
    }

    /// Persist a table atomically (write to a temp file, then rename).
    ///
    /// A build that dies halfway never leaves a partial table behind.
    pub fn store(&self, name: &str, table: &Intertable) -> InterpResult<()> {
        let tmp = NamedTempFile::new_in(&self.dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file());
            table.write_to(&mut writer)?;
            writer.flush()?;
        }
        let path = self.path_for(name);
        tmp.persist(&path)
            .map_err(|err| InterpError::Io(err.to_string()))?;
        debug!(path = %path.display(), "stored intertable");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_table_name_composition() {
        let name = IntertableStore::table_name(
            "0$359.55$M$135$21489$reduced_gg",
            Method::Grib,
            Mode::Invdist,
        );
        assert_eq!(name, "0_359.55_M_135_21489_reduced_gg_grib_invdist.itbl");
    }

    #[test]
    fn test_lookup_miss() {
        let dir = TempDir::new().unwrap();
        let store = IntertableStore::new(dir.path()).unwrap();
        assert!(store.lookup("absent.itbl").unwrap().is_none());
    }

    #[test]
    fn test_store_and_lookup_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = IntertableStore::new(dir.path()).unwrap();
        let table = Intertable::ScipyNearest {
            indexes: vec![3, 1, 4, 1, 5],
        };
        store.store("a_table.itbl", &table).unwrap();
        let loaded = store.lookup("a_table.itbl").unwrap().unwrap();
        assert_eq!(loaded, table);
    }

    #[test]
    fn test_missing_directory_created() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("per-target").join("dem500");
        let store = IntertableStore::new(&nested).unwrap();
        assert!(nested.is_dir());
        assert!(store.lookup("x.itbl").unwrap().is_none());
    }

    #[test]
    fn test_corrupt_file_is_fatal() {
        let dir = TempDir::new().unwrap();
        let store = IntertableStore::new(dir.path()).unwrap();
        std::fs::write(store.path_for("bad.itbl"), b"not a table").unwrap();
        let err = store.lookup("bad.itbl").unwrap_err();
        assert!(matches!(err, InterpError::Decode(_)));
    }

    #[test]
    fn test_overwrite_replaces_table() {
        let dir = TempDir::new().unwrap();
        let store = IntertableStore::new(dir.path()).unwrap();
        let first = Intertable::ScipyNearest { indexes: vec![1] };
        let second = Intertable::ScipyNearest { indexes: vec![2, 3] };
        store.store("t.itbl", &first).unwrap();
        store.store("t.itbl", &second).unwrap();
        assert_eq!(store.lookup("t.itbl").unwrap().unwrap(), second);
    }
}
