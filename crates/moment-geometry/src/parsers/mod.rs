//! Mesh file import.
//!
//! Supported formats:
//! - [`.obj`](obj): Wavefront OBJ surface meshes
//!
//! [`load_mesh`] picks the parser from the file extension and derives the
//! RWG edges of the parsed surface.

pub mod obj;

use std::path::Path;

use thiserror::Error;

use crate::mesh::{MeshError, RwgMesh};

/// Errors during mesh file import.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Parse error at line {line}: {message}")]
    FormatError { line: usize, message: String },

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid surface mesh: {0}")]
    Mesh(#[from] MeshError),
}

/// Read a surface mesh file and build its RWG edges.
pub fn load_mesh(path: &Path) -> Result<RwgMesh, ParseError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match extension.as_str() {
        "obj" => {
            let content = std::fs::read_to_string(path)?;
            obj::parse_obj(&content)?.into_rwg()
        }
        other => Err(ParseError::UnsupportedFormat(format!(
            "'{}' ({})",
            other,
            path.display()
        ))),
    }
}
