use std::io;

/// Fatal problems with the input geometry. Raised before any bytes are written.
#[derive(Debug, thiserror::Error)]
pub enum GeometryError {
    #[error(
        "misaligned mesh: found {ceiling} upward and {floor} downward faces; \
         apply a uniform remesh so every face is an axis-aligned voxel face"
    )]
    Misaligned { ceiling: usize, floor: usize },
    #[error(
        "faces are not square ({first} vs {second}); \
         apply a uniform remesh so the mesh is uniformly voxelized"
    )]
    NotSquare { first: f64, second: f64 },
    #[error("invalid voxel resolution {0}; apply a uniform remesh with a positive voxel size")]
    InvalidResolution(f64),
    #[error(
        "mesh spans height levels {min}..={max} but the grid only holds {limit}; \
         scale the mesh down or remesh with a larger voxel size"
    )]
    ExceedsGrid { min: i32, max: i32, limit: u32 },
}

/// Error type for a whole encode.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Invalid settings: {0}")]
    Settings(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Errors raised while parsing an encoded VXL stream back into columns.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Stream truncated at byte {offset} while reading column ({x}, {y})")]
    Truncated { offset: usize, x: u32, y: u32 },
    #[error(
        "Record at byte {offset} is malformed (color_count {color_count}, \
         air_start {air_start}, top_start {top_start}, top_end {top_end})"
    )]
    InvalidRecord {
        offset: usize,
        color_count: u8,
        air_start: u8,
        top_start: u8,
        top_end: u8,
    },
    #[error("Column ({x}, {y}) resumes at depth {found}, expected {expected}")]
    Discontinuous {
        x: u32,
        y: u32,
        expected: i32,
        found: i32,
    },
    #[error("Column ({x}, {y}) has a misplaced terminating record")]
    Terminator { x: u32, y: u32 },
    #[error("{0} trailing bytes after the last column")]
    TrailingBytes(usize),
}

/// Errors raised while loading a mesh from text.
#[derive(Debug, thiserror::Error)]
pub enum MeshLoadError {
    #[error("Line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("Mesh data is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, EncodeError>;
