//! Object storage for manifests and training artifacts.

use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Component, Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("Invalid blob key {0:?}")]
    InvalidKey(String),
    #[error("Failed to write blob {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

/// Destination for uploaded blobs.
pub trait BlobStore: Send + Sync {
    /// Store everything read from `reader` under `bucket/key`, returning the
    /// blob's location.
    fn upload(&self, reader: &mut dyn Read, bucket: &str, key: &str) -> Result<String, BlobError>;
}

/// Blob store that writes objects under `<root>/<bucket>/<key>`.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve where `bucket/key` lives on disk.
    pub fn path_for(&self, bucket: &str, key: &str) -> Result<PathBuf, BlobError> {
        let mut path = self.root.clone();
        for part in [bucket, key] {
            let relative = Path::new(part);
            let mut saw_component = false;
            for component in relative.components() {
                match component {
                    Component::Normal(segment) => {
                        path.push(segment);
                        saw_component = true;
                    }
                    Component::CurDir => {}
                    _ => return Err(BlobError::InvalidKey(format!("{bucket}/{key}"))),
                }
            }
            if !saw_component {
                return Err(BlobError::InvalidKey(format!("{bucket}/{key}")));
            }
        }
        Ok(path)
    }
}

impl BlobStore for FsBlobStore {
    fn upload(&self, reader: &mut dyn Read, bucket: &str, key: &str) -> Result<String, BlobError> {
        let path = self.path_for(bucket, key)?;
        let write_err = |source| BlobError::Write {
            path: path.clone(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let tmp_path = path.with_extension("partial");
        let file = File::create(&tmp_path).map_err(write_err)?;
        let mut writer = BufWriter::new(file);
        io::copy(reader, &mut writer).map_err(write_err)?;
        writer.flush().map_err(write_err)?;
        drop(writer);
        fs::rename(&tmp_path, &path).map_err(write_err)?;
        Ok(path.to_string_lossy().into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn upload_writes_under_bucket_and_key() {
        let dir = tempdir().unwrap();
        let store = FsBlobStore::new(dir.path());
        let mut body: &[u8] = b"line one\nline two\n";
        let location = store
            .upload(&mut body, "emld", "u1/models/m1/train.manifest")
            .unwrap();
        let expected = dir.path().join("emld/u1/models/m1/train.manifest");
        assert_eq!(PathBuf::from(location), expected);
        assert_eq!(fs::read_to_string(expected).unwrap(), "line one\nline two\n");
    }

    #[test]
    fn keys_cannot_escape_root() {
        let dir = tempdir().unwrap();
        let store = FsBlobStore::new(dir.path());
        let mut body: &[u8] = b"x";
        assert!(matches!(
            store.upload(&mut body, "emld", "../outside"),
            Err(BlobError::InvalidKey(_))
        ));
        assert!(matches!(
            store.path_for("emld", ""),
            Err(BlobError::InvalidKey(_))
        ));
    }
}
