//! Persisted version state: the `version.info` file.
//!
//! The file is a two-field JSON object with camelCase keys and 4-space
//! indentation. The format is compatibility-relevant - other tooling reads
//! it - so field order and indentation are kept stable across writes.

use crate::error::{RelflowError, Result};
use crate::version::Version;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// The current/next version pair persisted in the working tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionRecord {
    pub current_version: Version,
    pub next_version: Version,
}

impl VersionRecord {
    pub fn new(current_version: Version, next_version: Version) -> Self {
        VersionRecord {
            current_version,
            next_version,
        }
    }
}

/// Wire form of the record. Versions travel as canonical strings.
#[derive(Debug, Serialize, Deserialize)]
struct RawRecord {
    #[serde(rename = "currentVersion")]
    current_version: String,
    #[serde(rename = "nextVersion")]
    next_version: String,
}

/// Sole reader/writer of the version record file
pub struct VersionStore {
    path: PathBuf,
}

impl VersionStore {
    /// Create a store for the record at `path` (working-tree root + file name)
    pub fn new(path: impl Into<PathBuf>) -> Self {
        VersionStore { path: path.into() }
    }

    /// Path of the record file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a record has been persisted
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read the persisted record
    ///
    /// A record whose versions violate the bump invariant is accepted as-is;
    /// only structural damage (bad JSON, missing field, unparsable version)
    /// is reported as corrupt.
    pub fn read(&self) -> Result<VersionRecord> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RelflowError::RecordNotFound)
            }
            Err(e) => return Err(e.into()),
        };

        let raw: RawRecord = serde_json::from_str(&content)
            .map_err(|e| RelflowError::corrupt(e.to_string()))?;

        let current_version = Version::parse(&raw.current_version)
            .map_err(|_| RelflowError::corrupt(format!("bad currentVersion '{}'", raw.current_version)))?;
        let next_version = Version::parse(&raw.next_version)
            .map_err(|_| RelflowError::corrupt(format!("bad nextVersion '{}'", raw.next_version)))?;

        Ok(VersionRecord {
            current_version,
            next_version,
        })
    }

    /// Persist the record, replacing any previous content
    ///
    /// The write goes to a sibling temp file which is then renamed over the
    /// target, so a crash mid-write leaves the prior content intact.
    pub fn write(&self, record: &VersionRecord) -> Result<()> {
        let raw = RawRecord {
            current_version: record.current_version.to_string(),
            next_version: record.next_version.to_string(),
        };

        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        raw.serialize(&mut ser)
            .map_err(|e| RelflowError::corrupt(e.to_string()))?;
        buf.push(b'\n');

        let mut tmp_name = self.path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = self.path.with_file_name(tmp_name);
        fs::write(&tmp_path, &buf)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    /// Create the record for the first time
    ///
    /// The only creation path; refuses to overwrite an existing record.
    pub fn init(&self, record: &VersionRecord) -> Result<()> {
        if self.exists() {
            return Err(RelflowError::AlreadyInitialized);
        }
        self.write(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RelflowError;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> VersionStore {
        VersionStore::new(dir.path().join("version.info"))
    }

    fn record(cur: (u32, u32, u32), next: (u32, u32, u32)) -> VersionRecord {
        VersionRecord::new(
            Version::new(cur.0, cur.1, cur.2),
            Version::new(next.0, next.1, next.2),
        )
    }

    #[test]
    fn test_read_missing() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        assert!(!store.exists());
        assert!(matches!(store.read(), Err(RelflowError::RecordNotFound)));
    }

    #[test]
    fn test_write_read_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let rec = record((1, 2, 0), (1, 3, 0));

        store.write(&rec).unwrap();
        assert!(store.exists());
        assert_eq!(store.read().unwrap(), rec);
    }

    #[test]
    fn test_written_format_is_stable() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.write(&record((1, 0, 0), (1, 1, 0))).unwrap();

        let content = std::fs::read_to_string(store.path()).unwrap();
        // camelCase keys, currentVersion first, 4-space indent
        assert!(content.contains("    \"currentVersion\": \"1.0.0\""));
        assert!(content.contains("    \"nextVersion\": \"1.1.0\""));
        assert!(content.find("currentVersion").unwrap() < content.find("nextVersion").unwrap());
        assert!(!content.contains("\t"));
    }

    #[test]
    fn test_init_refuses_existing() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.init(&record((1, 0, 0), (1, 0, 0))).unwrap();

        let again = store.init(&record((2, 0, 0), (2, 1, 0)));
        assert!(matches!(again, Err(RelflowError::AlreadyInitialized)));
        // prior content untouched
        assert_eq!(store.read().unwrap(), record((1, 0, 0), (1, 0, 0)));
    }

    #[test]
    fn test_read_corrupt_json() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), "not json at all").unwrap();
        assert!(matches!(store.read(), Err(RelflowError::RecordCorrupt(_))));
    }

    #[test]
    fn test_read_missing_field() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), r#"{"currentVersion": "1.0.0"}"#).unwrap();
        assert!(matches!(store.read(), Err(RelflowError::RecordCorrupt(_))));
    }

    #[test]
    fn test_read_unparsable_version() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        std::fs::write(
            store.path(),
            r#"{"currentVersion": "1.0", "nextVersion": "1.1.0"}"#,
        )
        .unwrap();
        let err = store.read().unwrap_err();
        assert!(err.to_string().contains("currentVersion"));
    }

    #[test]
    fn test_write_replaces_wholesale() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.write(&record((1, 0, 0), (1, 1, 0))).unwrap();
        store.write(&record((1, 1, 0), (1, 2, 0))).unwrap();
        assert_eq!(store.read().unwrap(), record((1, 1, 0), (1, 2, 0)));
    }
}
