//! Column run-length VXL records.
//!
//! The map is a flat sequence of columns, `y` outer and `x` inner. A column
//! is one or more records laid out as:
//!
//! | Offset | Size | Field |
//! |---|---|---|
//! | 0 | 1 | colour count: 0 on the last record of a column, else run length + 1 |
//! | 1 | 1 | first solid depth of the run (0 = top of the map) |
//! | 2 | 1 | last solid depth of the run, inclusive |
//! | 3 | 1 | depth where the air above the run begins |
//! | 4 | 4 x N | one colour per solid voxel, `N = top_end - top_start + 1` |
//!
//! There is no column length prefix: readers find the end of a column by
//! tracking depth until it reaches the grid height.

use crate::column::Span;
use crate::color::Rgba;
use crate::config::{ChannelOrder, EncodeConfig, GridDimensions};
use crate::error::DecodeError;
use crate::formats::manager::MapExporter;
use crate::mesh::MeshView;
use std::error::Error;
use std::io::{self, Write};

pub const HEADER_LEN: usize = 4;
pub const COLOR_LEN: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub color_count: u8,
    pub top_start: u8,
    pub top_end: u8,
    pub air_start: u8,
}

impl RecordHeader {
    /// Header for a solid span, or `None` if the span does not fit the grid
    /// or runs into the previous one.
    pub fn for_span(span: &Span, height: i32) -> Option<Self> {
        if span.air_start < 0
            || span.air_start > span.top_start
            || span.top_start >= span.bottom
            || span.bottom > height
        {
            return None;
        }
        let color_count = if span.bottom == height {
            0
        } else {
            u8::try_from(span.len() + 1).ok()?
        };
        Some(Self {
            color_count,
            top_start: u8::try_from(span.top_start).ok()?,
            top_end: u8::try_from(span.top_end()).ok()?,
            air_start: u8::try_from(span.air_start).ok()?,
        })
    }

    /// Single bottom voxel under a column of air. Used for every fallback column.
    pub fn fallback(height: u32) -> Self {
        Self::air_to_bottom(height, 0)
    }

    /// Closes a column whose last span stops above the grid floor.
    pub fn air_to_bottom(height: u32, air_start: u8) -> Self {
        let bottom = height.saturating_sub(1) as u8;
        Self {
            color_count: 0,
            top_start: bottom,
            top_end: bottom,
            air_start,
        }
    }

    pub fn run_len(&self) -> usize {
        (self.top_end as usize + 1).saturating_sub(self.top_start as usize)
    }

    pub fn is_last(&self) -> bool {
        self.color_count == 0
    }

    pub fn to_bytes(self) -> [u8; HEADER_LEN] {
        [self.color_count, self.top_start, self.top_end, self.air_start]
    }

    pub fn from_bytes(bytes: [u8; HEADER_LEN]) -> Self {
        Self {
            color_count: bytes[0],
            top_start: bytes[1],
            top_end: bytes[2],
            air_start: bytes[3],
        }
    }

    /// Bytes taken by this header and its colours.
    pub fn encoded_len(&self) -> usize {
        HEADER_LEN + COLOR_LEN * self.run_len()
    }
}

/// Append-only record sink.
pub struct VxlWriter<W: Write> {
    inner: W,
    order: ChannelOrder,
    bytes_written: u64,
    scratch: Vec<Rgba>,
}

impl<W: Write> VxlWriter<W> {
    pub fn new(inner: W, order: ChannelOrder) -> Self {
        Self {
            inner,
            order,
            bytes_written: 0,
            scratch: Vec::new(),
        }
    }

    /// Write one record. `colors` must yield exactly `header.run_len()` colours.
    pub fn record<I>(&mut self, header: RecordHeader, colors: I) -> io::Result<()>
    where
        I: IntoIterator<Item = Rgba>,
    {
        self.scratch.clear();
        let order = self.order;
        self.scratch
            .extend(colors.into_iter().map(|c| order.arrange(c)));
        if self.scratch.len() != header.run_len() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "record spans {} voxels but {} colours were supplied",
                    header.run_len(),
                    self.scratch.len()
                ),
            ));
        }
        self.inner.write_all(&header.to_bytes())?;
        self.inner.write_all(bytemuck::cast_slice(&self.scratch))?;
        self.bytes_written += header.encoded_len() as u64;
        Ok(())
    }

    pub fn fallback(&mut self, height: u32, color: Rgba) -> io::Result<()> {
        self.record(RecordHeader::fallback(height), [color])
    }

    pub fn air_to_bottom(&mut self, height: u32, air_start: u8, color: Rgba) -> io::Result<()> {
        self.record(RecordHeader::air_to_bottom(height, air_start), [color])
    }

    /// Copy pre-encoded records, e.g. a row encoded on another thread.
    pub fn write_encoded(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.inner.write_all(bytes)?;
        self.bytes_written += bytes.len() as u64;
        Ok(())
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedRecord {
    pub header: RecordHeader,
    pub colors: Vec<Rgba>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedColumn {
    pub x: u32,
    pub y: u32,
    pub records: Vec<DecodedRecord>,
}

impl DecodedColumn {
    /// Levels covered by the column's air gaps and solid runs.
    pub fn depth(&self) -> i32 {
        self.records
            .iter()
            .map(|r| r.header.top_end as i32 + 1 - r.header.air_start as i32)
            .sum()
    }

    pub fn solid_voxels(&self) -> usize {
        self.records.iter().map(|r| r.header.run_len()).sum()
    }

    /// The colour of a column made of one single-voxel record, as written for
    /// fallback columns.
    pub fn single_color(&self) -> Option<Rgba> {
        match self.records.as_slice() {
            [only] if only.colors.len() == 1 => Some(only.colors[0]),
            _ => None,
        }
    }
}

/// Parse a whole map back into columns.
pub fn read_columns(
    data: &[u8],
    grid: &GridDimensions,
    order: ChannelOrder,
) -> Result<Vec<DecodedColumn>, DecodeError> {
    let height = grid.height as i32;
    let mut offset = 0usize;
    let mut columns = Vec::with_capacity(grid.column_count());

    for y in 0..grid.length {
        for x in 0..grid.width {
            let mut records = Vec::new();
            let mut depth = 0i32;
            while depth < height {
                let header_bytes: [u8; HEADER_LEN] = data
                    .get(offset..offset + HEADER_LEN)
                    .and_then(|b| b.try_into().ok())
                    .ok_or(DecodeError::Truncated { offset, x, y })?;
                let header = RecordHeader::from_bytes(header_bytes);
                let count_mismatch =
                    !header.is_last() && header.color_count as usize != header.run_len() + 1;
                if header.air_start > header.top_start
                    || header.top_start > header.top_end
                    || header.top_end as i32 >= height
                    || count_mismatch
                {
                    return Err(DecodeError::InvalidRecord {
                        offset,
                        color_count: header.color_count,
                        air_start: header.air_start,
                        top_start: header.top_start,
                        top_end: header.top_end,
                    });
                }
                if header.air_start as i32 != depth {
                    return Err(DecodeError::Discontinuous {
                        x,
                        y,
                        expected: depth,
                        found: header.air_start as i32,
                    });
                }
                let color_start = offset + HEADER_LEN;
                let color_end = color_start + COLOR_LEN * header.run_len();
                let raw = data
                    .get(color_start..color_end)
                    .ok_or(DecodeError::Truncated { offset, x, y })?;
                let colors = raw
                    .chunks_exact(COLOR_LEN)
                    .map(|c| order.restore([c[0], c[1], c[2], c[3]]))
                    .collect();

                depth = header.top_end as i32 + 1;
                if header.is_last() != (depth == height) {
                    return Err(DecodeError::Terminator { x, y });
                }
                records.push(DecodedRecord { header, colors });
                offset = color_end;
            }
            columns.push(DecodedColumn { x, y, records });
        }
    }

    if offset != data.len() {
        return Err(DecodeError::TrailingBytes(data.len() - offset));
    }
    Ok(columns)
}

pub struct VxlFormat;

impl MapExporter for VxlFormat {
    fn name(&self) -> String {
        "vxl".to_string()
    }

    fn extensions(&self) -> Vec<String> {
        vec!["vxl".to_string()]
    }

    fn write(&self, mesh: &dyn MeshView) -> Result<Vec<u8>, Box<dyn Error>> {
        Ok(crate::encoder::encode_to_vec(mesh, &EncodeConfig::default())?)
    }

    fn write_with_settings(
        &self,
        mesh: &dyn MeshView,
        settings: Option<&str>,
    ) -> Result<Vec<u8>, Box<dyn Error>> {
        let config = match settings {
            Some(json) => EncodeConfig::from_json(json)?,
            None => EncodeConfig::default(),
        };
        Ok(crate::encoder::encode_to_vec(mesh, &config)?)
    }

    fn export_settings_schema(&self) -> Option<String> {
        EncodeConfig::settings_schema()
    }
}
