use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::database::domain::face_database::FaceDatabase;

#[derive(Error, Debug)]
pub enum DatabaseStoreError {
    #[error("failed to access face database at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("face database at {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Reads the whole persisted database blob.
pub fn load(path: &Path) -> Result<FaceDatabase, DatabaseStoreError> {
    let bytes = fs::read(path).map_err(|source| DatabaseStoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| DatabaseStoreError::Corrupt {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes the database as a single JSON blob, replacing any existing file.
pub fn save(path: &Path, database: &FaceDatabase) -> Result<(), DatabaseStoreError> {
    let bytes = serde_json::to_vec(database).map_err(|source| DatabaseStoreError::Corrupt {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, bytes).map_err(|source| DatabaseStoreError::Io {
        path: path.to_path_buf(),
        source,
    })
}
