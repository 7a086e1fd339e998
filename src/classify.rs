//! Splits a voxelized mesh into the faces that bound voxels from above and below.

use crate::config::EncodeConfig;
use crate::error::GeometryError;
use crate::mesh::MeshView;
use glam::DVec3;
use tracing::debug;

/// A classified face, already in world space.
#[derive(Debug, Clone, PartialEq)]
pub struct VoxelFace {
    /// Dot product of the world normal with +Z.
    pub normal_alignment: f64,
    pub center_world: DVec3,
    pub edge_lengths: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// Top surfaces of voxels (normal close to +Z).
    pub ceiling: Vec<VoxelFace>,
    /// Bottom surfaces of voxels (normal close to -Z).
    pub floor: Vec<VoxelFace>,
    /// World-space edge length of one voxel.
    pub resolution: f64,
    /// Faces that were neither ceiling nor floor (side walls).
    pub discarded: usize,
}

pub fn classify_faces<M: MeshView + ?Sized>(
    mesh: &M,
    config: &EncodeConfig,
) -> Result<Classification, GeometryError> {
    let to_world = mesh.world_transform();
    let mut ceiling = Vec::new();
    let mut floor = Vec::new();
    let mut total = 0usize;

    for face in mesh.faces() {
        total += 1;
        let world = face.transformed(&to_world);
        let alignment = world.normal.dot(DVec3::Z);
        let target = if alignment > config.normal_threshold {
            &mut ceiling
        } else if -alignment > config.normal_threshold {
            &mut floor
        } else {
            continue;
        };
        target.push(VoxelFace {
            normal_alignment: alignment,
            center_world: world.center(),
            edge_lengths: world.edge_lengths(),
        });
    }

    debug!(
        faces = total,
        ceiling = ceiling.len(),
        floor = floor.len(),
        "classified mesh faces"
    );

    if ceiling.is_empty() || floor.is_empty() {
        return Err(GeometryError::Misaligned {
            ceiling: ceiling.len(),
            floor: floor.len(),
        });
    }

    let resolution = measure_resolution(&ceiling[0], config.square_tolerance)?;
    debug!(resolution, "measured voxel resolution");

    let discarded = total - ceiling.len() - floor.len();
    Ok(Classification {
        ceiling,
        floor,
        resolution,
        discarded,
    })
}

/// After a uniform remesh every face is the same square, so any one face
/// gives the voxel size.
fn measure_resolution(face: &VoxelFace, tolerance: f64) -> Result<f64, GeometryError> {
    let (first, second) = match face.edge_lengths.as_slice() {
        [first, second, ..] => (*first, *second),
        [only] => return Err(GeometryError::InvalidResolution(*only)),
        [] => return Err(GeometryError::InvalidResolution(0.0)),
    };
    if !first.is_finite() || first <= 0.0 {
        return Err(GeometryError::InvalidResolution(first));
    }
    if (second - first).abs() > tolerance {
        return Err(GeometryError::NotSquare { first, second });
    }
    Ok(first)
}
