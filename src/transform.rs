//! World space to integer grid coordinates.
//!
//! Points keep an "up is larger" z during this stage: the bottom of the mesh
//! sits at z = 0 and the top of a voxel on level `k` at z = `k + 1`. The flip
//! to the map's top-down depth happens when columns are assembled.

use crate::classify::{Classification, VoxelFace};
use crate::config::{Centering, EncodeConfig, GridDimensions};
use crate::error::GeometryError;
use crate::mesh::Aabb;
use glam::{DMat4, DVec3};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridPoint {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl GridPoint {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

/// Inclusive grid-space bounds of the ceiling points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Footprint {
    pub min_x: i32,
    pub max_x: i32,
    pub min_y: i32,
    pub max_y: i32,
}

impl Footprint {
    fn of_points(points: &[GridPoint]) -> Option<Self> {
        let first = points.first()?;
        let mut fp = Footprint {
            min_x: first.x,
            max_x: first.x,
            min_y: first.y,
            max_y: first.y,
        };
        for p in &points[1..] {
            fp.min_x = fp.min_x.min(p.x);
            fp.max_x = fp.max_x.max(p.x);
            fp.min_y = fp.min_y.min(p.y);
            fp.max_y = fp.max_y.max(p.y);
        }
        Some(fp)
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    pub fn width(&self) -> i32 {
        self.max_x - self.min_x + 1
    }

    pub fn length(&self) -> i32 {
        self.max_y - self.min_y + 1
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridPoints {
    pub ceiling: Vec<GridPoint>,
    pub floor: Vec<GridPoint>,
    pub footprint: Footprint,
}

/// Map classified faces onto the grid.
///
/// `world_bounds` is the mesh's world-space bounding box; its lowest z becomes
/// the ground. `anchor` is only used with [`Centering::Anchor`].
pub fn to_grid(
    classes: &Classification,
    world_bounds: &Aabb,
    anchor: DVec3,
    config: &EncodeConfig,
) -> Result<GridPoints, GeometryError> {
    let grid = config.grid;
    let resolution = classes.resolution;
    if !resolution.is_finite() || resolution <= 0.0 {
        return Err(GeometryError::InvalidResolution(resolution));
    }

    let conversion = DMat4::from_scale(DVec3::splat(1.0 / resolution))
        * DMat4::from_translation(DVec3::new(0.0, 0.0, -world_bounds.min.z));
    let project = |faces: &[VoxelFace]| -> Vec<DVec3> {
        faces
            .iter()
            .map(|f| conversion.transform_point3(f.center_world))
            .collect()
    };
    let ceiling = project(&classes.ceiling);
    let floor = project(&classes.floor);

    let Some(&first) = ceiling.first() else {
        return Err(GeometryError::Misaligned {
            ceiling: 0,
            floor: floor.len(),
        });
    };

    let (center_x, center_y) = match config.centering {
        Centering::Footprint => {
            let (mut min, mut max) = (first, first);
            for p in &ceiling[1..] {
                min = min.min(*p);
                max = max.max(*p);
            }
            debug!(
                min_x = min.x,
                max_x = max.x,
                min_y = min.y,
                max_y = max.y,
                "raw footprint"
            );
            ((max.x + min.x) / 2.0, (max.y + min.y) / 2.0)
        }
        Centering::Anchor => (anchor.x / resolution, anchor.y / resolution),
    };
    let centering = DVec3::new(
        grid.width as f64 / 2.0 - center_x,
        grid.length as f64 / 2.0 - center_y,
        0.0,
    );

    // Odd and even footprints land on different half-voxel lattices; nudge the
    // representative point onto whole numbers and move everything with it.
    let representative = first + centering;
    let parity = DVec3::new(
        half_step(representative.x),
        half_step(representative.y),
        0.0,
    );
    let shift = DMat4::from_translation(centering + parity);

    let snap = |points: &[DVec3]| -> Vec<GridPoint> {
        points
            .iter()
            .map(|p| {
                let q = shift.transform_point3(*p).round();
                GridPoint::new(q.x as i32, q.y as i32, q.z as i32)
            })
            .collect()
    };
    let ceiling = snap(&ceiling);
    let floor = snap(&floor);

    let footprint = Footprint::of_points(&ceiling).ok_or(GeometryError::Misaligned {
        ceiling: 0,
        floor: floor.len(),
    })?;
    debug!(
        min_x = footprint.min_x,
        max_x = footprint.max_x,
        min_y = footprint.min_y,
        max_y = footprint.max_y,
        parity_x = parity.x,
        parity_y = parity.y,
        "grid footprint"
    );

    check_height(&ceiling, &floor, &grid)?;
    if footprint.min_x < 0
        || footprint.min_y < 0
        || footprint.max_x >= grid.width as i32
        || footprint.max_y >= grid.length as i32
    {
        warn!(
            width = footprint.width(),
            length = footprint.length(),
            grid_width = grid.width,
            grid_length = grid.length,
            "mesh footprint is larger than the grid; columns outside it are cropped"
        );
    }

    Ok(GridPoints {
        ceiling,
        floor,
        footprint,
    })
}

/// 0.5 when `v` sits on a half-integer, 0.0 when it sits on an integer.
fn half_step(v: f64) -> f64 {
    ((2.0 * v).round() as i64).rem_euclid(2) as f64 * 0.5
}

/// Heights must stay within `[0, height]`; depths outside it cannot be written
/// as header bytes. Footprints wider than the grid are cropped instead.
fn check_height(
    ceiling: &[GridPoint],
    floor: &[GridPoint],
    grid: &GridDimensions,
) -> Result<(), GeometryError> {
    let zs = ceiling.iter().chain(floor).map(|p| p.z);
    let (min, max) = zs.fold((i32::MAX, i32::MIN), |(lo, hi), z| (lo.min(z), hi.max(z)));
    if min < 0 || max > grid.height as i32 {
        return Err(GeometryError::ExceedsGrid {
            min,
            max,
            limit: grid.height,
        });
    }
    Ok(())
}
