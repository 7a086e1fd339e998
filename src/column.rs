//! Pairs the ceiling and floor points of each grid column into solid spans.

use crate::transform::GridPoints;
use rustc_hash::FxHashMap;

/// One solid run of a column, in map depth (0 = top of the map).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// Depth where the air above this run begins.
    pub air_start: i32,
    /// First solid depth.
    pub top_start: i32,
    /// Depth just below the last solid voxel.
    pub bottom: i32,
}

impl Span {
    /// Last solid depth (inclusive).
    pub fn top_end(&self) -> i32 {
        self.bottom - 1
    }

    pub fn len(&self) -> i32 {
        self.bottom - self.top_start
    }

    pub fn is_empty(&self) -> bool {
        self.len() <= 0
    }
}

/// Progress of the walk down one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnState {
    BeforeFirstSpan,
    /// A ceiling has been taken; waiting for its floor.
    InSpan { air_start: i32, top_start: i32 },
    BetweenSpans { air_start: i32 },
    /// No points left. Air resumes at `air_start` and runs to the grid floor.
    Done { air_start: i32 },
}

/// Walks paired ceiling/floor depths top to bottom, yielding one [`Span`] per pair.
///
/// Both slices must hold the same number of heights, sorted descending.
#[derive(Debug, Clone)]
pub struct SpanWalker<'a> {
    ceiling: &'a [i32],
    floor: &'a [i32],
    height: i32,
    next: usize,
    state: ColumnState,
}

impl<'a> SpanWalker<'a> {
    fn new(ceiling: &'a [i32], floor: &'a [i32], height: i32) -> Self {
        debug_assert_eq!(ceiling.len(), floor.len());
        Self {
            ceiling,
            floor,
            height,
            next: 0,
            state: ColumnState::BeforeFirstSpan,
        }
    }

    pub fn state(&self) -> ColumnState {
        self.state
    }
}

impl Iterator for SpanWalker<'_> {
    type Item = Span;

    fn next(&mut self) -> Option<Span> {
        loop {
            match self.state {
                ColumnState::BeforeFirstSpan => self.open(0),
                ColumnState::BetweenSpans { air_start } => self.open(air_start),
                ColumnState::InSpan {
                    air_start,
                    top_start,
                } => {
                    let bottom = self.height - self.floor[self.next];
                    self.next += 1;
                    self.state = ColumnState::BetweenSpans { air_start: bottom };
                    return Some(Span {
                        air_start,
                        top_start,
                        bottom,
                    });
                }
                ColumnState::Done { .. } => return None,
            }
        }
    }
}

impl SpanWalker<'_> {
    fn open(&mut self, air_start: i32) {
        self.state = match self.ceiling.get(self.next) {
            Some(&z) => ColumnState::InSpan {
                air_start,
                top_start: self.height - z,
            },
            None => ColumnState::Done { air_start },
        };
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledColumn {
    pub spans: Vec<Span>,
    /// Depth where the air below the last span begins.
    pub remaining_air: i32,
}

impl AssembledColumn {
    pub fn reaches_floor(&self, height: i32) -> bool {
        self.remaining_air == height
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnShape {
    /// No ceiling points, or ceiling and floor counts differ.
    Degenerate { ceiling: usize, floor: usize },
    Assembled(AssembledColumn),
}

/// Heights of the points in one column, sorted descending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnPoints {
    pub ceiling: Vec<i32>,
    pub floor: Vec<i32>,
}

impl ColumnPoints {
    pub fn assemble(&self, height: i32) -> ColumnShape {
        assemble_column(&self.ceiling, &self.floor, height)
    }
}

/// Pair sorted heights into spans.
pub fn assemble_column(ceiling: &[i32], floor: &[i32], height: i32) -> ColumnShape {
    if ceiling.is_empty() || ceiling.len() != floor.len() {
        return ColumnShape::Degenerate {
            ceiling: ceiling.len(),
            floor: floor.len(),
        };
    }

    let mut walker = SpanWalker::new(ceiling, floor, height);
    let spans: Vec<Span> = walker.by_ref().collect();
    let remaining_air = match walker.state() {
        ColumnState::Done { air_start } => air_start,
        // The walker only stops in Done.
        _ => height,
    };
    ColumnShape::Assembled(AssembledColumn {
        spans,
        remaining_air,
    })
}

/// Grid points grouped by `(x, y)`.
#[derive(Debug, Clone, Default)]
pub struct ColumnIndex {
    columns: FxHashMap<(i32, i32), ColumnPoints>,
}

impl ColumnIndex {
    pub fn new(points: &GridPoints) -> Self {
        let mut columns: FxHashMap<(i32, i32), ColumnPoints> = FxHashMap::default();
        for p in &points.ceiling {
            columns.entry((p.x, p.y)).or_default().ceiling.push(p.z);
        }
        for p in &points.floor {
            columns.entry((p.x, p.y)).or_default().floor.push(p.z);
        }
        for column in columns.values_mut() {
            column.ceiling.sort_unstable_by(|a, b| b.cmp(a));
            column.floor.sort_unstable_by(|a, b| b.cmp(a));
        }
        Self { columns }
    }

    pub fn get(&self, x: i32, y: i32) -> Option<&ColumnPoints> {
        self.columns.get(&(x, y))
    }

    /// Shape of column `(x, y)`; a column without any points is degenerate.
    pub fn assemble(&self, x: i32, y: i32, height: i32) -> ColumnShape {
        match self.get(x, y) {
            Some(column) => column.assemble(height),
            None => assemble_column(&[], &[], height),
        }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
