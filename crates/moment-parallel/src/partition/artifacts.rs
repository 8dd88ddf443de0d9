//! Plain-text integer artifacts.
//!
//! Lists are written one integer per line; pair maps one `key value` pair
//! per line. Readers accept any whitespace between integers. Files are
//! written to a sibling temporary and renamed into place.

use std::fs;
use std::path::{Path, PathBuf};

use super::PartitionError;

/// Write `contents` to `path`, creating parent directories as needed.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), PartitionError> {
    let failure = |source: std::io::Error| PartitionError::ArtifactWriteFailure {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(failure)?;
    }
    let tmp = temporary_path(path);
    fs::write(&tmp, contents).map_err(failure)?;
    fs::rename(&tmp, path).map_err(failure)
}

fn temporary_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

pub fn write_integer_list(path: &Path, values: &[usize]) -> Result<(), PartitionError> {
    let mut text = String::with_capacity(values.len() * 4);
    for value in values {
        text.push_str(&value.to_string());
        text.push('\n');
    }
    write_atomic(path, text.as_bytes())
}

pub fn write_integer_pairs<I>(path: &Path, pairs: I) -> Result<(), PartitionError>
where
    I: IntoIterator<Item = (usize, usize)>,
{
    let mut text = String::new();
    for (key, value) in pairs {
        text.push_str(&format!("{key} {value}\n"));
    }
    write_atomic(path, text.as_bytes())
}

/// Read every whitespace-separated integer of `path`, in file order.
pub fn read_integer_list(path: &Path) -> Result<Vec<usize>, PartitionError> {
    let text = fs::read_to_string(path).map_err(|source| PartitionError::ArtifactRead {
        path: path.to_path_buf(),
        source,
    })?;
    text.split_whitespace()
        .map(|token| {
            token.parse().map_err(|_| PartitionError::ArtifactFormat {
                path: path.to_path_buf(),
                token: token.to_string(),
            })
        })
        .collect()
}
