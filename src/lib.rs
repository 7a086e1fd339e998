//! Encode voxelized staircase meshes into column run-length VXL maps.
//!
//! The input mesh must already be uniformly voxelized: every face is an
//! axis-aligned square of the same size. Upward and downward faces are
//! snapped onto a `width x length x height` grid (512 x 512 x 64 by default),
//! paired per column into solid runs, and written as VXL column records.
//!
//! ```no_run
//! use vxlsmith::{encode_to_vec, EncodeConfig, PolygonMesh};
//!
//! let mesh = PolygonMesh::from_voxels(0.5, [(0, 0, 0), (1, 0, 0), (1, 0, 1)]);
//! let bytes = encode_to_vec(&mesh, &EncodeConfig::default())?;
//! # Ok::<(), vxlsmith::EncodeError>(())
//! ```

pub mod classify;
pub mod color;
pub mod column;
pub mod config;
pub mod encoder;
pub mod error;
pub mod formats;
pub mod mesh;
pub mod transform;

pub use color::{ColorSource, DiagnosticColors, Rgba, SolidColor};
pub use config::{Centering, ChannelOrder, EncodeConfig, GridDimensions};
pub use encoder::{
    encode, encode_to_vec, encode_with_colors, prepare, write_prepared, ColumnTally,
    EncodeReport, PreparedMesh,
};
pub use error::{DecodeError, EncodeError, GeometryError, MeshLoadError};
pub use formats::manager::{get_manager, FormatManager, MapExporter, MeshImporter};
pub use formats::vxl::{read_columns, DecodedColumn, VxlWriter};
pub use mesh::{Aabb, Face, MeshView, PolygonMesh};
