//! Mesh input for the encoder.
//!
//! The encoder never owns a scene. It reads faces through [`MeshView`], which
//! any mesh source can implement: the in-memory [`PolygonMesh`], the OBJ
//! loader in [`obj`], or an adapter over a live editor object.

pub mod obj;

use glam::{DMat4, DVec3};
use rustc_hash::FxHashSet;

/// One polygon of a mesh, in object space.
#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    /// Outward unit normal.
    pub normal: DVec3,
    /// Closed loop of corner positions.
    pub vertices: Vec<DVec3>,
}

impl Face {
    /// Build a face whose normal follows the counter-clockwise winding of `vertices`.
    pub fn new(vertices: Vec<DVec3>) -> Self {
        let normal = newell_normal(&vertices);
        Self { normal, vertices }
    }

    pub fn with_normal(normal: DVec3, vertices: Vec<DVec3>) -> Self {
        Self {
            normal: normal.normalize_or_zero(),
            vertices,
        }
    }

    /// Edges as consecutive vertex pairs, closing back to the first vertex.
    pub fn edges(&self) -> impl Iterator<Item = (DVec3, DVec3)> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }

    pub fn edge_lengths(&self) -> Vec<f64> {
        self.edges().map(|(a, b)| a.distance(b)).collect()
    }

    /// Mean of the corners.
    pub fn center(&self) -> DVec3 {
        if self.vertices.is_empty() {
            return DVec3::ZERO;
        }
        self.vertices.iter().copied().sum::<DVec3>() / self.vertices.len() as f64
    }

    pub fn transformed(&self, matrix: &DMat4) -> Face {
        let normal_matrix = glam::DMat3::from_mat4(*matrix).inverse().transpose();
        Face {
            normal: (normal_matrix * self.normal).normalize_or_zero(),
            vertices: self
                .vertices
                .iter()
                .map(|v| matrix.transform_point3(*v))
                .collect(),
        }
    }
}

fn newell_normal(vertices: &[DVec3]) -> DVec3 {
    let mut normal = DVec3::ZERO;
    for (i, current) in vertices.iter().enumerate() {
        let next = vertices[(i + 1) % vertices.len()];
        normal.x += (current.y - next.y) * (current.z + next.z);
        normal.y += (current.z - next.z) * (current.x + next.x);
        normal.z += (current.x - next.x) * (current.y + next.y);
    }
    normal.normalize_or_zero()
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: DVec3,
    pub max: DVec3,
}

impl Aabb {
    pub fn new(a: DVec3, b: DVec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn from_points<I: IntoIterator<Item = DVec3>>(points: I) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        Some(iter.fold(Aabb::new(first, first), |bb, p| Aabb {
            min: bb.min.min(p),
            max: bb.max.max(p),
        }))
    }

    pub fn corners(&self) -> [DVec3; 8] {
        let (lo, hi) = (self.min, self.max);
        [
            DVec3::new(lo.x, lo.y, lo.z),
            DVec3::new(hi.x, lo.y, lo.z),
            DVec3::new(lo.x, hi.y, lo.z),
            DVec3::new(hi.x, hi.y, lo.z),
            DVec3::new(lo.x, lo.y, hi.z),
            DVec3::new(hi.x, lo.y, hi.z),
            DVec3::new(lo.x, hi.y, hi.z),
            DVec3::new(hi.x, hi.y, hi.z),
        ]
    }

    /// Box enclosing all eight corners after `matrix` is applied.
    pub fn transformed(&self, matrix: &DMat4) -> Aabb {
        let corners = self.corners().map(|c| matrix.transform_point3(c));
        let mut bb = Aabb::new(corners[0], corners[0]);
        for c in &corners[1..] {
            bb.min = bb.min.min(*c);
            bb.max = bb.max.max(*c);
        }
        bb
    }
}

/// Read-only access to a mesh that has already been voxelized.
pub trait MeshView {
    /// Object-space faces.
    fn faces(&self) -> Box<dyn Iterator<Item = Face> + '_>;

    /// Object-to-world transform.
    fn world_transform(&self) -> DMat4 {
        DMat4::IDENTITY
    }

    /// Object-space bounds, `None` for an empty mesh.
    fn bounding_box(&self) -> Option<Aabb> {
        Aabb::from_points(self.faces().flat_map(|f| f.vertices))
    }

    /// World-space position the object is nominally anchored at.
    fn anchor(&self) -> DVec3 {
        self.world_transform().w_axis.truncate()
    }
}

/// Polygon soup held in memory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolygonMesh {
    pub vertices: Vec<DVec3>,
    /// Corner indices into `vertices`, one list per polygon.
    pub polygons: Vec<Vec<u32>>,
    pub transform: Option<DMat4>,
    pub anchor: Option<DVec3>,
}

const CUBE_FACES: [(DVec3, [[f64; 3]; 4]); 6] = [
    (DVec3::Z, [[0., 0., 1.], [1., 0., 1.], [1., 1., 1.], [0., 1., 1.]]),
    (DVec3::NEG_Z, [[0., 0., 0.], [0., 1., 0.], [1., 1., 0.], [1., 0., 0.]]),
    (DVec3::X, [[1., 0., 0.], [1., 1., 0.], [1., 1., 1.], [1., 0., 1.]]),
    (DVec3::NEG_X, [[0., 0., 0.], [0., 0., 1.], [0., 1., 1.], [0., 1., 0.]]),
    (DVec3::Y, [[0., 1., 0.], [0., 1., 1.], [1., 1., 1.], [1., 1., 0.]]),
    (DVec3::NEG_Y, [[0., 0., 0.], [1., 0., 0.], [1., 0., 1.], [0., 0., 1.]]),
];

impl PolygonMesh {
    pub fn new(vertices: Vec<DVec3>, polygons: Vec<Vec<u32>>) -> Self {
        Self {
            vertices,
            polygons,
            transform: None,
            anchor: None,
        }
    }

    /// Closed staircase surface of a set of voxels.
    ///
    /// Cell `(i, j, k)` spans `[i, i+1] x [j, j+1] x [k, k+1]` scaled by
    /// `resolution`. Only faces between a filled cell and an empty one are kept.
    pub fn from_voxels<I>(resolution: f64, cells: I) -> Self
    where
        I: IntoIterator<Item = (i32, i32, i32)>,
    {
        let filled: FxHashSet<(i32, i32, i32)> = cells.into_iter().collect();
        let mut sorted: Vec<_> = filled.iter().copied().collect();
        sorted.sort_unstable();

        let mut mesh = PolygonMesh::default();
        for (x, y, z) in sorted {
            for (direction, corners) in &CUBE_FACES {
                let neighbor = (
                    x + direction.x as i32,
                    y + direction.y as i32,
                    z + direction.z as i32,
                );
                if filled.contains(&neighbor) {
                    continue;
                }
                let base = mesh.vertices.len() as u32;
                for c in corners {
                    mesh.vertices.push(
                        DVec3::new(x as f64 + c[0], y as f64 + c[1], z as f64 + c[2]) * resolution,
                    );
                }
                mesh.polygons.push(vec![base, base + 1, base + 2, base + 3]);
            }
        }
        mesh
    }

    pub fn with_transform(mut self, transform: DMat4) -> Self {
        self.transform = Some(transform);
        self
    }

    pub fn with_anchor(mut self, anchor: DVec3) -> Self {
        self.anchor = Some(anchor);
        self
    }

    /// Append a polygon given by object-space corner positions.
    pub fn push_polygon(&mut self, corners: &[DVec3]) {
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(corners);
        self.polygons
            .push((base..base + corners.len() as u32).collect());
    }

    pub fn face_count(&self) -> usize {
        self.polygons.len()
    }
}

impl MeshView for PolygonMesh {
    fn faces(&self) -> Box<dyn Iterator<Item = Face> + '_> {
        Box::new(self.polygons.iter().map(move |polygon| {
            Face::new(
                polygon
                    .iter()
                    .filter_map(|&i| self.vertices.get(i as usize).copied())
                    .collect(),
            )
        }))
    }

    fn world_transform(&self) -> DMat4 {
        self.transform.unwrap_or(DMat4::IDENTITY)
    }

    fn bounding_box(&self) -> Option<Aabb> {
        Aabb::from_points(self.vertices.iter().copied())
    }

    fn anchor(&self) -> DVec3 {
        self.anchor
            .unwrap_or_else(|| self.world_transform().w_axis.truncate())
    }
}
