//! Wavefront OBJ loading.
//!
//! Only `v` and `f` records matter for encoding. Polygons are kept as written
//! (no triangulation) so that voxel faces stay square.

use super::PolygonMesh;
use crate::error::MeshLoadError;
use glam::DVec3;

pub fn is_obj(data: &[u8]) -> bool {
    let head = String::from_utf8_lossy(&data[..data.len().min(4096)]);
    head.lines()
        .map(str::trim)
        .any(|line| line.starts_with("v ") || line.starts_with("f "))
}

pub fn parse_obj(input: &str) -> Result<PolygonMesh, MeshLoadError> {
    let mut mesh = PolygonMesh::default();

    for (index, line) in input.lines().enumerate() {
        let line_no = index + 1;
        let trimmed = line.trim();
        let mut parts = trimmed.split_whitespace();
        match parts.next() {
            Some("v") => {
                let coords: Vec<&str> = parts.take(3).collect();
                if coords.len() < 3 {
                    return Err(parse_error(line_no, "vertex needs three coordinates"));
                }
                let mut xyz = [0.0f64; 3];
                for (slot, raw) in xyz.iter_mut().zip(&coords) {
                    *slot = raw
                        .parse::<f64>()
                        .map_err(|e| parse_error(line_no, format!("bad coordinate {raw:?}: {e}")))?;
                }
                mesh.vertices.push(DVec3::from_array(xyz));
            }
            Some("f") => {
                let mut polygon = Vec::new();
                for part in parts {
                    let raw = part.split('/').next().unwrap_or("");
                    let idx = raw
                        .parse::<i64>()
                        .map_err(|e| parse_error(line_no, format!("bad index {raw:?}: {e}")))?;
                    polygon.push(resolve_index(idx, mesh.vertices.len(), line_no)?);
                }
                if polygon.len() < 3 {
                    return Err(parse_error(line_no, "face needs at least three corners"));
                }
                mesh.polygons.push(polygon);
            }
            _ => {}
        }
    }

    Ok(mesh)
}

/// OBJ indices are 1-based; negative values count back from the latest vertex.
fn resolve_index(idx: i64, vertex_count: usize, line: usize) -> Result<u32, MeshLoadError> {
    let resolved = if idx > 0 {
        idx - 1
    } else if idx < 0 {
        vertex_count as i64 + idx
    } else {
        return Err(parse_error(line, "index 0 is not valid in OBJ"));
    };
    if resolved < 0 || resolved >= vertex_count as i64 {
        return Err(parse_error(
            line,
            format!("index {idx} out of range ({vertex_count} vertices)"),
        ));
    }
    Ok(resolved as u32)
}

fn parse_error(line: usize, message: impl Into<String>) -> MeshLoadError {
    MeshLoadError::Parse {
        line,
        message: message.into(),
    }
}

impl PolygonMesh {
    pub fn from_obj_str(input: &str) -> Result<Self, MeshLoadError> {
        parse_obj(input)
    }

    pub fn from_obj_bytes(data: &[u8]) -> Result<Self, MeshLoadError> {
        parse_obj(std::str::from_utf8(data)?)
    }
}
