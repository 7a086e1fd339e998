use crate::formats::manager::MeshImporter;
use crate::mesh::obj::is_obj;
use crate::mesh::PolygonMesh;
use std::error::Error;

/// Wavefront OBJ meshes, as exported by most modelling tools after a voxel remesh.
pub struct ObjFormat;

impl MeshImporter for ObjFormat {
    fn name(&self) -> String {
        "obj".to_string()
    }

    fn detect(&self, data: &[u8]) -> bool {
        is_obj(data)
    }

    fn read(&self, data: &[u8]) -> Result<PolygonMesh, Box<dyn Error>> {
        Ok(PolygonMesh::from_obj_bytes(data)?)
    }
}
