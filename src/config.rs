use std::io::{ErrorKind, Write};
use std::path::Path;

use serde_yaml::mapping::Index;
use serde_yaml::{Mapping, Value};
use tempfile::NamedTempFile;

use crate::error::DocumentError;
use crate::types::VersionEntry;

pub const DEFAULT_CONFIG_PATH: &str = "grpc-versions.yaml";
pub const DEFAULT_FETCH_LIMIT: u8 = 20;
pub const DEFAULT_KEEP_ACTIVE: usize = 5;
pub const DEFAULT_MAX_VERSIONS: usize = 20;

const VERSIONS_KEY: &str = "versions";

/// Knobs for a single merge of fetched releases into the document.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateOptions {
    /// How many of the newest fetched releases are marked active when first seen.
    pub keep_active: usize,
    pub mark_new_active: bool,
    /// Entries beyond this many, after sorting, are dropped.
    pub max_versions: usize,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self {
            keep_active: DEFAULT_KEEP_ACTIVE,
            mark_new_active: true,
            max_versions: DEFAULT_MAX_VERSIONS,
        }
    }
}

/// The `grpc-versions.yaml` document.
///
/// Top-level keys other than `versions` are carried through untouched and in
/// their original order. Keys may be any YAML scalar, not just strings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VersionsDocument {
    entries: Mapping,
}

impl VersionsDocument {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| DocumentError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(contents: &str) -> Result<Self, DocumentError> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        let entries: Option<Mapping> = serde_yaml::from_str(contents)?;
        Ok(Self {
            entries: entries.unwrap_or_default(),
        })
    }

    /// Parses the `versions` list. A missing or null list is empty.
    pub fn versions(&self) -> Result<Vec<VersionEntry>, DocumentError> {
        match self.entries.get(VERSIONS_KEY) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(value) => Ok(serde_yaml::from_value(value.clone())?),
        }
    }

    pub fn set_versions(&mut self, versions: Vec<VersionEntry>) -> Result<(), DocumentError> {
        let value = serde_yaml::to_value(versions)?;
        self.entries.insert(Value::from(VERSIONS_KEY), value);
        Ok(())
    }

    pub fn get<I: Index>(&self, key: I) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &Value> {
        self.entries.keys()
    }

    pub fn to_yaml(&self) -> Result<String, DocumentError> {
        Ok(serde_yaml::to_string(&self.entries)?)
    }

    /// Writes the document to `path`, replacing the file atomically.
    ///
    /// A symlinked path is written through to its target, and an existing
    /// file keeps its permissions.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), DocumentError> {
        let path = path.as_ref();
        let contents = self.to_yaml()?;
        let write_err = |source| DocumentError::Write {
            path: path.to_path_buf(),
            source,
        };

        let target = match std::fs::canonicalize(path) {
            Ok(resolved) => resolved,
            Err(e) if e.kind() == ErrorKind::NotFound => path.to_path_buf(),
            Err(e) => return Err(write_err(e)),
        };
        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut temp = NamedTempFile::new_in(dir).map_err(write_err)?;
        temp.write_all(contents.as_bytes()).map_err(write_err)?;
        if let Ok(existing) = std::fs::metadata(&target) {
            temp.as_file()
                .set_permissions(existing.permissions())
                .map_err(write_err)?;
        }
        temp.as_file().sync_all().map_err(write_err)?;
        temp.persist(&target).map_err(|e| write_err(e.error))?;
        Ok(())
    }
}
