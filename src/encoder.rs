//! Drives a whole encode: classify, snap to the grid, then write every column.

use crate::classify::classify_faces;
use crate::color::{ColorSource, SolidColor};
use crate::column::{AssembledColumn, ColumnIndex, ColumnShape};
use crate::config::EncodeConfig;
use crate::error::{GeometryError, Result};
use crate::formats::vxl::{RecordHeader, VxlWriter};
use crate::mesh::MeshView;
use crate::transform::{to_grid, Footprint};
use rayon::prelude::*;
use std::io::{self, Write};
use tracing::{debug, info, warn};

/// How one column ended up being written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnOutcome {
    Solid,
    OutOfFootprint,
    /// Missing or unpaired faces. `faces` ceiling and floor faces were dropped.
    Degenerate { faces: usize },
    /// Spans overlapped or left the grid.
    Rejected { faces: usize },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnTally {
    pub solid: usize,
    pub out_of_footprint: usize,
    pub degenerate: usize,
    pub rejected: usize,
    /// Ceiling and floor faces dropped with degenerate or rejected columns.
    pub unpaired_faces: usize,
}

impl ColumnTally {
    fn add(&mut self, outcome: ColumnOutcome) {
        match outcome {
            ColumnOutcome::Solid => self.solid += 1,
            ColumnOutcome::OutOfFootprint => self.out_of_footprint += 1,
            ColumnOutcome::Degenerate { faces } => {
                self.degenerate += 1;
                self.unpaired_faces += faces;
            }
            ColumnOutcome::Rejected { faces } => {
                self.rejected += 1;
                self.unpaired_faces += faces;
            }
        }
    }

    fn merge(&mut self, other: ColumnTally) {
        self.solid += other.solid;
        self.out_of_footprint += other.out_of_footprint;
        self.degenerate += other.degenerate;
        self.rejected += other.rejected;
        self.unpaired_faces += other.unpaired_faces;
    }

    pub fn total(&self) -> usize {
        self.solid + self.out_of_footprint + self.degenerate + self.rejected
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EncodeReport {
    pub resolution: f64,
    pub footprint: Footprint,
    pub columns: ColumnTally,
    /// Faces that were neither ceiling nor floor.
    pub discarded_faces: usize,
    pub bytes_written: u64,
}

/// Grid-space view of a mesh, ready to be written.
#[derive(Debug, Clone)]
pub struct PreparedMesh {
    pub resolution: f64,
    pub footprint: Footprint,
    pub discarded_faces: usize,
    index: ColumnIndex,
}

impl PreparedMesh {
    pub fn index(&self) -> &ColumnIndex {
        &self.index
    }
}

/// Run every geometry check. Nothing is written, so a failure here leaves the
/// sink untouched.
pub fn prepare<M: MeshView + ?Sized>(mesh: &M, config: &EncodeConfig) -> Result<PreparedMesh> {
    config.validate()?;
    let classes = classify_faces(mesh, config)?;
    let world_bounds = mesh
        .bounding_box()
        .ok_or(GeometryError::Misaligned {
            ceiling: 0,
            floor: 0,
        })?
        .transformed(&mesh.world_transform());
    let points = to_grid(&classes, &world_bounds, mesh.anchor(), config)?;
    let index = ColumnIndex::new(&points);

    Ok(PreparedMesh {
        resolution: classes.resolution,
        footprint: points.footprint,
        discarded_faces: classes.discarded,
        index,
    })
}

/// Encode with every solid voxel painted the default green.
pub fn encode<M, W>(mesh: &M, sink: W, config: &EncodeConfig) -> Result<EncodeReport>
where
    M: MeshView + ?Sized,
    W: Write,
{
    encode_with_colors(mesh, sink, config, &SolidColor::default())
}

pub fn encode_to_vec<M: MeshView + ?Sized>(mesh: &M, config: &EncodeConfig) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    encode(mesh, &mut out, config)?;
    Ok(out)
}

pub fn encode_with_colors<M, W, C>(
    mesh: &M,
    sink: W,
    config: &EncodeConfig,
    colors: &C,
) -> Result<EncodeReport>
where
    M: MeshView + ?Sized,
    W: Write,
    C: ColorSource + ?Sized,
{
    let prepared = prepare(mesh, config)?;
    write_prepared(&prepared, sink, config, colors)
}

/// Write an already prepared mesh. `config` must be the one it was prepared with.
pub fn write_prepared<W, C>(
    prepared: &PreparedMesh,
    sink: W,
    config: &EncodeConfig,
    colors: &C,
) -> Result<EncodeReport>
where
    W: Write,
    C: ColorSource + ?Sized,
{
    info!(
        resolution = prepared.resolution,
        width = prepared.footprint.width(),
        length = prepared.footprint.length(),
        columns = prepared.index.len(),
        parallel = config.parallel,
        "encoding mesh"
    );
    if prepared.discarded_faces > 0 {
        debug!(faces = prepared.discarded_faces, "ignored side faces");
    }

    let mut writer = VxlWriter::new(sink, config.channel_order);
    let tally = if config.parallel {
        write_rows_parallel(&mut writer, prepared, config, colors)?
    } else {
        let mut tally = ColumnTally::default();
        for y in 0..config.grid.length {
            tally.merge(write_row(&mut writer, prepared, config, colors, y)?);
        }
        tally
    };
    writer.flush()?;

    if tally.degenerate + tally.rejected > 0 {
        warn!(
            degenerate = tally.degenerate,
            rejected = tally.rejected,
            faces = tally.unpaired_faces,
            "columns inside the footprint were replaced by fallback records"
        );
    }
    info!(
        solid = tally.solid,
        out_of_footprint = tally.out_of_footprint,
        bytes = writer.bytes_written(),
        "encode finished"
    );

    Ok(EncodeReport {
        resolution: prepared.resolution,
        footprint: prepared.footprint,
        columns: tally,
        discarded_faces: prepared.discarded_faces,
        bytes_written: writer.bytes_written(),
    })
}

fn write_rows_parallel<W, C>(
    writer: &mut VxlWriter<W>,
    prepared: &PreparedMesh,
    config: &EncodeConfig,
    colors: &C,
) -> io::Result<ColumnTally>
where
    W: Write,
    C: ColorSource + ?Sized,
{
    let rows: Vec<(Vec<u8>, ColumnTally)> = (0..config.grid.length)
        .into_par_iter()
        .map(|y| -> io::Result<(Vec<u8>, ColumnTally)> {
            let mut row = VxlWriter::new(Vec::new(), config.channel_order);
            let tally = write_row(&mut row, prepared, config, colors, y)?;
            Ok((row.into_inner(), tally))
        })
        .collect::<io::Result<_>>()?;

    let mut tally = ColumnTally::default();
    for (bytes, row_tally) in rows {
        writer.write_encoded(&bytes)?;
        tally.merge(row_tally);
    }
    Ok(tally)
}

fn write_row<W, C>(
    writer: &mut VxlWriter<W>,
    prepared: &PreparedMesh,
    config: &EncodeConfig,
    colors: &C,
    y: u32,
) -> io::Result<ColumnTally>
where
    W: Write,
    C: ColorSource + ?Sized,
{
    let mut tally = ColumnTally::default();
    for x in 0..config.grid.width {
        tally.add(write_column(writer, prepared, config, colors, x, y)?);
    }
    Ok(tally)
}

fn write_column<W, C>(
    writer: &mut VxlWriter<W>,
    prepared: &PreparedMesh,
    config: &EncodeConfig,
    colors: &C,
    x: u32,
    y: u32,
) -> io::Result<ColumnOutcome>
where
    W: Write,
    C: ColorSource + ?Sized,
{
    let height = config.grid.height;
    let diagnostics = &config.diagnostics;
    let (gx, gy) = (x as i32, y as i32);

    if !prepared.footprint.contains(gx, gy) {
        writer.fallback(height, diagnostics.out_of_footprint())?;
        return Ok(ColumnOutcome::OutOfFootprint);
    }

    let column = match prepared.index.assemble(gx, gy, height as i32) {
        ColumnShape::Assembled(column) => column,
        ColumnShape::Degenerate { ceiling, floor } => {
            debug!(x, y, ceiling, floor, "degenerate column");
            writer.fallback(height, diagnostics.degenerate())?;
            return Ok(ColumnOutcome::Degenerate {
                faces: ceiling + floor,
            });
        }
    };

    let Some(plan) = plan_records(&column, height) else {
        debug!(x, y, spans = column.spans.len(), "rejected column spans");
        writer.fallback(height, diagnostics.degenerate())?;
        return Ok(ColumnOutcome::Rejected {
            faces: 2 * column.spans.len(),
        });
    };

    for header in plan.headers {
        let depths = header.top_start as u32..=header.top_end as u32;
        writer.record(header, depths.map(|depth| colors.color_at(x, y, depth)))?;
    }
    if let Some(air_start) = plan.trailing_air {
        writer.air_to_bottom(height, air_start, diagnostics.air_to_bottom())?;
    }
    Ok(ColumnOutcome::Solid)
}

struct RecordPlan {
    headers: Vec<RecordHeader>,
    trailing_air: Option<u8>,
}

/// Headers for every span, or `None` if any of them cannot be written. A column
/// is checked as a whole so a bad span never leaves half a column on the wire.
fn plan_records(column: &AssembledColumn, height: u32) -> Option<RecordPlan> {
    let h = height as i32;
    let headers = column
        .spans
        .iter()
        .map(|span| RecordHeader::for_span(span, h))
        .collect::<Option<Vec<_>>>()?;
    let trailing_air = if column.reaches_floor(h) {
        None
    } else {
        if column.remaining_air >= h {
            return None;
        }
        Some(u8::try_from(column.remaining_air).ok()?)
    };
    Some(RecordPlan {
        headers,
        trailing_air,
    })
}
