//! Parser for Wavefront `.obj` surface meshes.
//!
//! Only vertices (`v`) and faces (`f`) are read. Faces are triangulated on
//! parse (quads and n-gons use fan triangulation) and the vertex winding of
//! the file is kept, so a consistently oriented OBJ surface yields
//! consistently oriented RWG edges.
//!
//! Coordinates are taken as metres (no unit conversion).

use super::ParseError;
use crate::mesh::RwgMesh;

/// A parsed triangle surface from an OBJ file.
#[derive(Debug, Clone)]
pub struct ObjMesh {
    /// Vertex positions (0-indexed).
    pub vertices: Vec<[f64; 3]>,
    /// Triangulated face indices (0-indexed into `vertices`).
    pub faces: Vec<[usize; 3]>,
}

impl ObjMesh {
    /// Derive the RWG edges of this surface.
    pub fn into_rwg(self) -> Result<RwgMesh, ParseError> {
        Ok(RwgMesh::from_triangles(self.vertices, &self.faces)?)
    }
}

/// Parse an OBJ file, extracting vertices and triangulated faces.
///
/// Handles `v x y z` and `f v1 v2 v3 ...` lines, where a face token may also
/// be `v/vt`, `v/vt/vn` or `v//vn`; only the vertex index is used. Every other
/// line is ignored.
pub fn parse_obj(content: &str) -> Result<ObjMesh, ParseError> {
    let mut vertices = Vec::new();
    let mut faces = Vec::new();

    for (line_idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut parts = line.split_whitespace();
        let keyword = match parts.next() {
            Some(k) => k,
            None => continue,
        };

        match keyword {
            "v" => {
                let coords: Vec<&str> = parts.collect();
                if coords.len() < 3 {
                    return Err(ParseError::FormatError {
                        line: line_idx + 1,
                        message: format!("Vertex needs at least 3 coordinates, got {}", coords.len()),
                    });
                }
                let mut position = [0.0; 3];
                for (axis, token) in coords.iter().take(3).enumerate() {
                    position[axis] = token.parse().map_err(|_| ParseError::FormatError {
                        line: line_idx + 1,
                        message: format!("Invalid coordinate {}: {}", axis, token),
                    })?;
                }
                vertices.push(position);
            }
            "f" => {
                let indices = parts
                    .enumerate()
                    .map(|(i, token)| {
                        let idx_str = token.split('/').next().unwrap_or(token);
                        let idx: usize = idx_str.parse().map_err(|_| ParseError::FormatError {
                            line: line_idx + 1,
                            message: format!("Invalid face index at position {}: {}", i + 1, token),
                        })?;
                        if idx == 0 {
                            return Err(ParseError::FormatError {
                                line: line_idx + 1,
                                message: "Face index 0 is invalid (OBJ indices are 1-based)".into(),
                            });
                        }
                        Ok(idx - 1)
                    })
                    .collect::<Result<Vec<usize>, ParseError>>()?;

                if indices.len() < 3 {
                    return Err(ParseError::FormatError {
                        line: line_idx + 1,
                        message: format!("Face needs at least 3 vertices, got {}", indices.len()),
                    });
                }

                // fan: (v0,v1,v2), (v0,v2,v3), ...
                for i in 1..indices.len() - 1 {
                    faces.push([indices[0], indices[i], indices[i + 1]]);
                }
            }
            _ => {}
        }
    }

    if faces.is_empty() {
        return Err(ParseError::FormatError {
            line: 0,
            message: "No faces found in OBJ file".into(),
        });
    }

    let n = vertices.len();
    for (fi, face) in faces.iter().enumerate() {
        for &idx in face {
            if idx >= n {
                return Err(ParseError::FormatError {
                    line: 0,
                    message: format!(
                        "Face {} references vertex index {} but only {} vertices exist",
                        fi + 1,
                        idx + 1,
                        n
                    ),
                });
            }
        }
    }

    Ok(ObjMesh { vertices, faces })
}

/// Cube OBJ spanning ±half_size on each axis, outward winding.
#[cfg(test)]
fn cube_obj(half_size: f64) -> String {
    let h = half_size;
    format!(
        "# cube\n\
         v {h} {h} -{h}\n\
         v {h} -{h} -{h}\n\
         v -{h} -{h} -{h}\n\
         v -{h} {h} -{h}\n\
         v {h} {h} {h}\n\
         v {h} -{h} {h}\n\
         v -{h} -{h} {h}\n\
         v -{h} {h} {h}\n\
         f 1 2 3 4\n\
         f 5 8 7 6\n\
         f 1 5 6 2\n\
         f 3 7 8 4\n\
         f 1 4 8 5\n\
         f 2 6 7 3\n"
    )
}
