use glam::DVec3;
use vxlsmith::formats::vxl::RecordHeader;
use vxlsmith::{
    encode, encode_to_vec, encode_with_colors, read_columns, ChannelOrder, DecodedColumn,
    DiagnosticColors, EncodeConfig, EncodeError, GeometryError, GridDimensions, PolygonMesh,
    Rgba,
};

/// `width x length` slab one voxel thick, centred on the origin.
fn slab(width: i32, length: i32, resolution: f64) -> PolygonMesh {
    let cells = (0..width)
        .flat_map(|x| (0..length).map(move |y| (x - width / 2, y - length / 2, 0)));
    PolygonMesh::from_voxels(resolution, cells)
}

/// Four steps along x, two voxels deep along y. Step `i` is `i + 1` voxels tall.
fn staircase() -> PolygonMesh {
    let cells = (0..4).flat_map(|step| {
        (0..2).flat_map(move |y| (0..=step).map(move |z| (step, y, z)))
    });
    PolygonMesh::from_voxels(0.5, cells)
}

fn ceiling_quad(mesh: &mut PolygonMesh, z: f64) {
    mesh.push_polygon(&[
        DVec3::new(0.0, 0.0, z),
        DVec3::new(1.0, 0.0, z),
        DVec3::new(1.0, 1.0, z),
        DVec3::new(0.0, 1.0, z),
    ]);
}

fn floor_quad(mesh: &mut PolygonMesh, z: f64) {
    mesh.push_polygon(&[
        DVec3::new(0.0, 0.0, z),
        DVec3::new(0.0, 1.0, z),
        DVec3::new(1.0, 1.0, z),
        DVec3::new(1.0, 0.0, z),
    ]);
}

fn decode(bytes: &[u8], config: &EncodeConfig) -> Vec<DecodedColumn> {
    read_columns(bytes, &config.grid, config.channel_order).expect("stream should decode")
}

fn column_at<'a>(
    columns: &'a [DecodedColumn],
    grid: &GridDimensions,
    x: u32,
    y: u32,
) -> &'a DecodedColumn {
    &columns[(y * grid.width + x) as usize]
}

/// A flat 4x4 slab becomes 16 single-voxel columns resting on the grid floor.
#[test]
fn flat_slab_encodes_single_span_columns() {
    let config = EncodeConfig::default();
    let mut bytes = Vec::new();
    let report = encode(&slab(4, 4, 1.0), &mut bytes, &config).unwrap();

    assert_eq!(report.columns.solid, 16);
    assert_eq!(report.columns.out_of_footprint, 512 * 512 - 16);
    assert_eq!(report.columns.degenerate, 0);
    assert_eq!(report.columns.rejected, 0);
    // Every column is one header plus one colour.
    assert_eq!(bytes.len(), 512 * 512 * 8);
    assert_eq!(report.bytes_written, bytes.len() as u64);

    let columns = decode(&bytes, &config);
    let fp = report.footprint;
    let mut solid = 0;
    for column in &columns {
        if fp.contains(column.x as i32, column.y as i32) {
            solid += 1;
            assert_eq!(column.records.len(), 1);
            assert_eq!(
                column.records[0].header,
                RecordHeader {
                    color_count: 0,
                    top_start: 63,
                    top_end: 63,
                    air_start: 0
                },
                "slab column ({}, {}) should sit on the grid floor",
                column.x,
                column.y
            );
            assert_eq!(column.records[0].colors, vec![Rgba::GREEN]);
        } else {
            assert_eq!(column.single_color(), Some(Rgba::MAGENTA));
        }
    }
    assert_eq!(solid, 16);
}

/// Three ceilings over two floors in one column: the whole column falls back to red.
#[test]
fn unpaired_column_is_marked_degenerate() {
    let mut mesh = PolygonMesh::default();
    for z in [1.0, 3.0, 5.0] {
        ceiling_quad(&mut mesh, z);
    }
    for z in [0.0, 2.0] {
        floor_quad(&mut mesh, z);
    }
    let config = EncodeConfig::default().with_grid(GridDimensions::new(8, 8, 16));
    let mut bytes = Vec::new();
    let report = encode(&mesh, &mut bytes, &config).unwrap();

    assert_eq!(report.columns.degenerate, 1);
    assert_eq!(report.columns.solid, 0);
    assert_eq!(report.columns.unpaired_faces, 5);
    assert_eq!(report.columns.out_of_footprint, 63);

    let columns = decode(&bytes, &config);
    let (x, y) = (report.footprint.min_x as u32, report.footprint.min_y as u32);
    let column = column_at(&columns, &config.grid, x, y);
    assert_eq!(column.single_color(), Some(Rgba::RED));
    assert_eq!(column.records[0].header, RecordHeader::fallback(16));
}

/// Columns that reach the floor end on their last span; floating ones get a cyan tail.
#[test]
fn trailing_air_record_only_for_floating_stacks() {
    // x = 0 sits on the floor; x = 1 floats one level above it.
    let mesh = PolygonMesh::from_voxels(1.0, [(0, 0, 0), (0, 0, 1), (1, 0, 1)]);
    let config = EncodeConfig::default().with_grid(GridDimensions::new(8, 8, 16));
    let mut bytes = Vec::new();
    let report = encode(&mesh, &mut bytes, &config).unwrap();
    assert_eq!(report.columns.solid, 2);

    let columns = decode(&bytes, &config);
    let y = report.footprint.min_y as u32;
    let grounded = column_at(&columns, &config.grid, report.footprint.min_x as u32, y);
    let floating = column_at(&columns, &config.grid, report.footprint.max_x as u32, y);

    assert_eq!(grounded.records.len(), 1, "grounded column has no tail");
    let header = grounded.records[0].header;
    assert_eq!((header.top_start, header.top_end), (14, 15));
    assert_eq!(header.color_count, 0);
    assert!(!grounded.records.iter().any(|r| r.colors.contains(&Rgba::CYAN)));

    assert_eq!(floating.records.len(), 2);
    assert_eq!(
        floating.records[0].header,
        RecordHeader {
            color_count: 2,
            top_start: 14,
            top_end: 14,
            air_start: 0
        }
    );
    assert_eq!(floating.records[1].header, RecordHeader::air_to_bottom(16, 15));
    assert_eq!(floating.records[1].colors, vec![Rgba::CYAN]);
}

/// A non-square classifying face aborts before any byte is written.
#[test]
fn resolution_mismatch_is_fatal() {
    let mut mesh = PolygonMesh::default();
    mesh.push_polygon(&[
        DVec3::new(0.0, 0.0, 1.0),
        DVec3::new(1.0, 0.0, 1.0),
        DVec3::new(1.0, 1.5, 1.0),
        DVec3::new(0.0, 1.5, 1.0),
    ]);
    floor_quad(&mut mesh, 0.0);

    let mut bytes = Vec::new();
    let err = encode(&mesh, &mut bytes, &EncodeConfig::default()).unwrap_err();
    assert!(
        matches!(err, EncodeError::Geometry(GeometryError::NotSquare { .. })),
        "unexpected error: {err}"
    );
    assert!(bytes.is_empty(), "nothing may be written on a geometry error");
}

#[test]
fn tilted_mesh_is_fatal() {
    let mesh = slab(2, 2, 1.0).with_transform(glam::DMat4::from_rotation_y(0.2));
    let err = encode_to_vec(&mesh, &EncodeConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        EncodeError::Geometry(GeometryError::Misaligned { .. })
    ));
    assert!(err.to_string().contains("remesh"));
}

/// Every column of the grid is present and covers exactly `height` levels.
#[test]
fn every_column_covers_full_height() {
    let config = EncodeConfig::default();
    let bytes = encode_to_vec(&staircase(), &config).unwrap();
    let columns = decode(&bytes, &config);

    assert_eq!(columns.len(), 512 * 512);
    for column in &columns {
        assert_eq!(column.depth(), 64, "column ({}, {})", column.x, column.y);
    }
}

#[test]
fn staircase_steps_grow_towards_the_top() {
    let config = EncodeConfig::default();
    let mut bytes = Vec::new();
    let report = encode(&staircase(), &mut bytes, &config).unwrap();
    assert_eq!(report.footprint.width(), 4);
    assert_eq!(report.footprint.length(), 2);
    assert_eq!(report.columns.solid, 8);
    assert_eq!(report.columns.degenerate + report.columns.rejected, 0);

    let columns = decode(&bytes, &config);
    for step in 0..4u32 {
        let x = report.footprint.min_x as u32 + step;
        for y in report.footprint.min_y as u32..=report.footprint.max_y as u32 {
            let column = column_at(&columns, &config.grid, x, y);
            assert_eq!(column.records.len(), 1);
            assert_eq!(column.solid_voxels(), step as usize + 1);
            assert_eq!(column.records[0].header.top_start as u32, 63 - step);
        }
    }
}

/// Columns outside the footprint are always a magenta fallback, nothing else.
#[test]
fn columns_outside_footprint_are_magenta() {
    let config = EncodeConfig::default().with_grid(GridDimensions::new(32, 16, 16));
    let mut bytes = Vec::new();
    let report = encode(&staircase(), &mut bytes, &config).unwrap();
    let columns = decode(&bytes, &config);

    let outside: Vec<_> = columns
        .iter()
        .filter(|c| !report.footprint.contains(c.x as i32, c.y as i32))
        .collect();
    assert_eq!(outside.len(), 32 * 16 - 8);
    assert_eq!(outside.len(), report.columns.out_of_footprint);
    for column in outside {
        assert_eq!(column.records[0].header, RecordHeader::fallback(16));
        assert_eq!(column.single_color(), Some(Rgba::MAGENTA));
    }
}

#[test]
fn encoding_is_deterministic() {
    let cells = [(3, 1, 0), (4, 1, 0), (4, 2, 1), (9, 5, 0), (9, 5, 1)];
    let mesh = PolygonMesh::from_voxels(0.25, cells);
    let config = EncodeConfig::default();
    let first = encode_to_vec(&mesh, &config).unwrap();
    let second = encode_to_vec(&mesh, &config).unwrap();
    assert_eq!(first, second);
}

#[test]
fn odd_and_even_footprints_fill_whole_columns() {
    let config = EncodeConfig::default();
    for (w, l) in [(3, 3), (4, 5), (5, 2), (1, 1)] {
        let mut bytes = Vec::new();
        let report = encode(&slab(w, l, 0.75), &mut bytes, &config).unwrap();
        assert_eq!(report.footprint.width(), w, "{w}x{l}");
        assert_eq!(report.footprint.length(), l, "{w}x{l}");
        assert_eq!(report.columns.solid, (w * l) as usize, "{w}x{l}");
        assert_eq!(report.columns.degenerate, 0, "{w}x{l}");
    }
}

#[test]
fn parallel_matches_sequential() {
    let mesh = staircase();
    let sequential = encode_to_vec(&mesh, &EncodeConfig::default()).unwrap();
    let parallel = encode_to_vec(&mesh, &EncodeConfig::default().with_parallel(true)).unwrap();
    assert_eq!(sequential.len(), parallel.len());
    assert!(sequential == parallel, "parallel output differs");
}

#[test]
fn suppressed_diagnostics_hide_marker_colours() {
    let grey = Rgba::new(60, 60, 60, 255);
    let mesh = PolygonMesh::from_voxels(1.0, [(0, 0, 0), (1, 0, 1)]);
    let config = EncodeConfig::default()
        .with_grid(GridDimensions::new(8, 8, 16))
        .with_diagnostics(DiagnosticColors::suppressed(grey));
    let bytes = encode_to_vec(&mesh, &config).unwrap();
    let columns = decode(&bytes, &config);

    let markers = [Rgba::MAGENTA, Rgba::RED, Rgba::CYAN];
    for column in &columns {
        for record in &column.records {
            assert!(
                record.colors.iter().all(|c| !markers.contains(c)),
                "marker colour in column ({}, {})",
                column.x,
                column.y
            );
        }
    }
    assert!(columns.iter().any(|c| c.single_color() == Some(grey)));
}

#[test]
fn bgra_order_swaps_red_and_blue() {
    let mesh = slab(2, 2, 1.0);
    let orange = vxlsmith::SolidColor(Rgba::new(250, 120, 10, 255));
    let rgba = EncodeConfig::default().with_grid(GridDimensions::new(4, 4, 8));
    let bgra = rgba.clone().with_channel_order(ChannelOrder::Bgra);

    let mut a = Vec::new();
    let mut b = Vec::new();
    encode_with_colors(&mesh, &mut a, &rgba, &orange).unwrap();
    encode_with_colors(&mesh, &mut b, &bgra, &orange).unwrap();
    assert_eq!(a.len(), b.len());
    assert_ne!(a, b);
    assert_eq!(decode(&a, &rgba), decode(&b, &bgra));
    assert!(b.windows(4).any(|w| w == [10, 120, 250, 255]));
}

#[test]
fn color_source_sees_depth() {
    let mesh = PolygonMesh::from_voxels(1.0, (0..3).map(|z| (0, 0, z)));
    let config = EncodeConfig::default().with_grid(GridDimensions::new(4, 4, 8));
    let shade = |_x: u32, _y: u32, depth: u32| Rgba::new(depth as u8 * 10, 0, 0, 255);
    let mut bytes = Vec::new();
    let report = encode_with_colors(&mesh, &mut bytes, &config, &shade).unwrap();

    let columns = decode(&bytes, &config);
    let column = column_at(
        &columns,
        &config.grid,
        report.footprint.min_x as u32,
        report.footprint.min_y as u32,
    );
    assert_eq!(
        column.records[0].colors,
        vec![
            Rgba::new(50, 0, 0, 255),
            Rgba::new(60, 0, 0, 255),
            Rgba::new(70, 0, 0, 255)
        ]
    );
}

#[test]
fn invalid_grid_is_rejected_before_encoding() {
    let config = EncodeConfig::default().with_grid(GridDimensions::new(8, 8, 0));
    let err = encode_to_vec(&slab(1, 1, 1.0), &config).unwrap_err();
    assert!(matches!(err, EncodeError::Config(_)));
}

/// Runs in a column never overlap and each record holds one colour per solid voxel.
#[test]
fn stacked_runs_are_ordered_top_to_bottom() {
    let mesh = PolygonMesh::from_voxels(1.0, [(0, 0, 0), (0, 0, 1), (0, 0, 4)]);
    let config = EncodeConfig::default().with_grid(GridDimensions::new(4, 4, 16));
    let mut bytes = Vec::new();
    let report = encode(&mesh, &mut bytes, &config).unwrap();

    let columns = decode(&bytes, &config);
    let column = column_at(
        &columns,
        &config.grid,
        report.footprint.min_x as u32,
        report.footprint.min_y as u32,
    );
    let headers: Vec<_> = column.records.iter().map(|r| r.header).collect();
    assert_eq!(
        headers,
        vec![
            RecordHeader {
                color_count: 2,
                top_start: 11,
                top_end: 11,
                air_start: 0
            },
            RecordHeader {
                color_count: 0,
                top_start: 14,
                top_end: 15,
                air_start: 12
            },
        ]
    );
    for pair in headers.windows(2) {
        assert!(pair[0].top_end < pair[1].top_start);
    }
    assert_eq!(column.solid_voxels(), 3);
    for record in &column.records {
        assert_eq!(record.colors.len(), record.header.run_len());
    }
}

/// A footprint wider than the grid is cropped to the columns that fit.
#[test]
fn wide_mesh_is_cropped_to_the_grid() {
    let config = EncodeConfig::default().with_grid(GridDimensions::new(8, 8, 16));
    let mut bytes = Vec::new();
    let report = encode(&slab(10, 1, 1.0), &mut bytes, &config).unwrap();

    assert_eq!(report.footprint.width(), 10);
    assert_eq!((report.footprint.min_x, report.footprint.max_x), (0, 9));
    assert_eq!(report.columns.solid, 8);
    assert_eq!(report.columns.out_of_footprint, 56);
    assert_eq!(report.columns.degenerate + report.columns.rejected, 0);

    let columns = decode(&bytes, &config);
    assert_eq!(columns.len(), 64);
    let y = report.footprint.min_y as u32;
    for x in 0..8 {
        let column = column_at(&columns, &config.grid, x, y);
        assert_eq!(column.records[0].colors, vec![Rgba::GREEN], "column ({x}, {y})");
    }
}
