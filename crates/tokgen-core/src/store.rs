//! Account list input and token list output.
//!
//! Input is a JSON array of `{"uid", "password"}` objects, optionally with a
//! UTF-8 BOM. Output is a JSON array of `{"token"}` objects written to a
//! `.part` file and renamed into place.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::batch::{TokenRecord, WorkItem};

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to encode tokens: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Read the account list for one region.
pub fn read_work_items(path: &Path) -> Result<Vec<WorkItem>, StoreError> {
    let data = fs::read(path).map_err(|source| StoreError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let body = data.strip_prefix(UTF8_BOM).unwrap_or(&data);
    serde_json::from_slice(body).map_err(|source| StoreError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Write the token list, replacing `path` atomically.
pub fn write_tokens(path: &Path, tokens: &[TokenRecord]) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(tokens)?;
    let write_err = |source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    let temp = temp_path(path);
    fs::write(&temp, json).map_err(write_err)?;
    fs::rename(&temp, path).map_err(write_err)?;
    Ok(())
}

/// Path for the temp file: appends `.part` to the final path.
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    PathBuf::from(o)
}
