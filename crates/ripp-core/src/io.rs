//! Atomic persistence
//!
//! Every artifact is written to a temporary file in its target directory and
//! renamed into place, so a crash or cancellation never leaves a half-written
//! file behind.

use crate::error::{Diagnose, ErrorKind};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Persistence errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Filesystem failure
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Affected path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Serialization failure
    #[error("failed to encode {path}: {message}")]
    Encode {
        /// Target path
        path: PathBuf,
        /// Encoder message
        message: String,
    },

    /// Deserialization failure
    #[error("failed to decode {path}: {message}")]
    Decode {
        /// Source path
        path: PathBuf,
        /// Decoder message
        message: String,
    },
}

impl StoreError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Whether the underlying cause is a missing file
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

impl Diagnose for StoreError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Io { .. } | Self::Encode { .. } => ErrorKind::Io,
            Self::Decode { .. } => ErrorKind::ValidationFailure,
        }
    }

    fn hint(&self) -> Option<String> {
        match self {
            Self::Io { path, .. } if self.is_not_found() => Some(format!(
                "{} does not exist; run the preceding pipeline stage first",
                path.display()
            )),
            Self::Decode { path, .. } => Some(format!(
                "{} is malformed; regenerate it or fix it by hand",
                path.display()
            )),
            _ => None,
        }
    }
}

/// Write `bytes` to `path` atomically, creating parent directories
///
/// # Errors
/// Returns error if the directory, temp file, or rename fails
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent).map_err(|e| StoreError::io(&parent, e))?;

    let mut tmp = NamedTempFile::new_in(&parent).map_err(|e| StoreError::io(&parent, e))?;
    tmp.write_all(bytes).map_err(|e| StoreError::io(path, e))?;
    tmp.as_file().sync_all().map_err(|e| StoreError::io(path, e))?;
    tmp.persist(path).map_err(|e| StoreError::io(path, e.error))?;

    tracing::debug!(path = %path.display(), bytes = bytes.len(), "wrote artifact");
    Ok(())
}

/// Serialize `value` as YAML and write atomically
///
/// # Errors
/// Returns error on encode or write failure
pub fn write_yaml_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let text = serde_yaml::to_string(value).map_err(|e| StoreError::Encode {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    write_atomic(path, text.as_bytes())
}

/// Serialize `value` as pretty JSON and write atomically
///
/// # Errors
/// Returns error on encode or write failure
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let mut text = serde_json::to_string_pretty(value).map_err(|e| StoreError::Encode {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    text.push('\n');
    write_atomic(path, text.as_bytes())
}

/// Read and decode a YAML file
///
/// # Errors
/// Returns error if the file cannot be read or decoded
pub fn read_yaml<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let text = std::fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
    serde_yaml::from_str(&text).map_err(|e| StoreError::Decode {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Read and decode a JSON file
///
/// # Errors
/// Returns error if the file cannot be read or decoded
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let text = std::fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
    serde_json::from_str(&text).map_err(|e| StoreError::Decode {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn atomic_write_creates_parents_and_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a/b/out.txt");

        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"second");
        let leftovers = std::fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn yaml_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.yaml");
        let mut map = BTreeMap::new();
        map.insert("k".to_string(), 3u32);

        write_yaml_atomic(&path, &map).unwrap();
        let back: BTreeMap<String, u32> = read_yaml(&path).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn missing_file_has_hint() {
        let err = read_yaml::<BTreeMap<String, u32>>(Path::new("/nonexistent/x.yaml")).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(err.hint().is_some());
    }
}
