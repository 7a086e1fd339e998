//! Voxel colours and the strategies that pick them.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

#[repr(C)]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Pod, Zeroable, Serialize, Deserialize,
)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const GREEN: Rgba = Rgba::new(0, 255, 0, 255);
    pub const MAGENTA: Rgba = Rgba::new(255, 0, 255, 255);
    pub const RED: Rgba = Rgba::new(255, 0, 0, 255);
    pub const CYAN: Rgba = Rgba::new(0, 255, 255, 255);
    pub const BLACK: Rgba = Rgba::new(0, 0, 0, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Picks the colour of one solid voxel.
///
/// `depth` is the voxel index from the top of the column (0 = topmost level).
pub trait ColorSource: Sync {
    fn color_at(&self, x: u32, y: u32, depth: u32) -> Rgba;
}

/// Paints every solid voxel with the same colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolidColor(pub Rgba);

impl Default for SolidColor {
    fn default() -> Self {
        SolidColor(Rgba::GREEN)
    }
}

impl ColorSource for SolidColor {
    fn color_at(&self, _x: u32, _y: u32, _depth: u32) -> Rgba {
        self.0
    }
}

impl<F> ColorSource for F
where
    F: Fn(u32, u32, u32) -> Rgba + Sync,
{
    fn color_at(&self, x: u32, y: u32, depth: u32) -> Rgba {
        self(x, y, depth)
    }
}

/// Marker colours for records that do not come from real geometry.
///
/// With `enabled` off every marker is replaced by `suppressed`, so production
/// maps carry no debug colours. The record layout never changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticColors {
    pub enabled: bool,
    /// Columns outside the mesh footprint.
    pub out_of_footprint: Rgba,
    /// Columns with missing or unpaired faces.
    pub degenerate: Rgba,
    /// Trailing record below a stack that stops short of the grid floor.
    pub air_to_bottom: Rgba,
    pub suppressed: Rgba,
}

impl Default for DiagnosticColors {
    fn default() -> Self {
        Self {
            enabled: true,
            out_of_footprint: Rgba::MAGENTA,
            degenerate: Rgba::RED,
            air_to_bottom: Rgba::CYAN,
            suppressed: Rgba::BLACK,
        }
    }
}

impl DiagnosticColors {
    /// Diagnostics replaced by a single colour.
    pub fn suppressed(color: Rgba) -> Self {
        Self {
            enabled: false,
            suppressed: color,
            ..Self::default()
        }
    }

    pub fn out_of_footprint(&self) -> Rgba {
        self.pick(self.out_of_footprint)
    }

    pub fn degenerate(&self) -> Rgba {
        self.pick(self.degenerate)
    }

    pub fn air_to_bottom(&self) -> Rgba {
        self.pick(self.air_to_bottom)
    }

    fn pick(&self, marker: Rgba) -> Rgba {
        if self.enabled {
            marker
        } else {
            self.suppressed
        }
    }
}
