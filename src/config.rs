use crate::color::{DiagnosticColors, Rgba};
use crate::error::EncodeError;
use serde::{Deserialize, Serialize};

/// Size of the target voxel map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridDimensions {
    pub width: u32,
    pub length: u32,
    /// Number of height levels. Level 0 is the top of the map.
    pub height: u32,
}

impl Default for GridDimensions {
    fn default() -> Self {
        Self::VXL
    }
}

impl GridDimensions {
    /// The classic 512 x 512 x 64 map.
    pub const VXL: GridDimensions = GridDimensions {
        width: 512,
        length: 512,
        height: 64,
    };

    /// Largest height whose colour count (run length + 1) still fits a signed byte.
    pub const MAX_HEIGHT: u32 = 126;

    pub fn new(width: u32, length: u32, height: u32) -> Self {
        Self {
            width,
            length,
            height,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.width == 0 || self.length == 0 {
            return Err(format!(
                "grid footprint must be at least 1x1 (got {}x{})",
                self.width, self.length
            ));
        }
        if self.height == 0 || self.height > Self::MAX_HEIGHT {
            return Err(format!(
                "grid height must be within 1..={} (got {})",
                Self::MAX_HEIGHT,
                self.height
            ));
        }
        Ok(())
    }

    pub fn column_count(&self) -> usize {
        self.width as usize * self.length as usize
    }
}

/// Byte order of one colour on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelOrder {
    #[default]
    Rgba,
    /// blue = 0, green = 1, red = 2, alpha = 3
    Bgra,
}

impl ChannelOrder {
    pub fn arrange(self, color: Rgba) -> Rgba {
        match self {
            ChannelOrder::Rgba => color,
            ChannelOrder::Bgra => Rgba::new(color.b, color.g, color.r, color.a),
        }
    }

    /// Inverse of [`ChannelOrder::arrange`].
    pub fn restore(self, raw: [u8; 4]) -> Rgba {
        match self {
            ChannelOrder::Rgba => Rgba::new(raw[0], raw[1], raw[2], raw[3]),
            ChannelOrder::Bgra => Rgba::new(raw[2], raw[1], raw[0], raw[3]),
        }
    }
}

/// How the mesh footprint is placed on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Centering {
    /// Centre the bounding box of the upward faces.
    #[default]
    Footprint,
    /// Put the mesh's anchor position at the middle of the grid.
    Anchor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeConfig {
    pub grid: GridDimensions,
    /// Minimum dot product between a face normal and +Z/-Z to count as a ceiling/floor face.
    pub normal_threshold: f64,
    /// Allowed difference between two edges of the face used to measure the resolution.
    pub square_tolerance: f64,
    pub channel_order: ChannelOrder,
    pub centering: Centering,
    pub diagnostics: DiagnosticColors,
    /// Encode rows on the rayon pool. Output is byte-identical to the serial walk.
    pub parallel: bool,
}

impl Default for EncodeConfig {
    fn default() -> Self {
        Self {
            grid: GridDimensions::default(),
            normal_threshold: 0.999,
            square_tolerance: 0.001,
            channel_order: ChannelOrder::default(),
            centering: Centering::default(),
            diagnostics: DiagnosticColors::default(),
            parallel: false,
        }
    }
}

impl EncodeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON settings document. Missing fields keep their defaults.
    pub fn from_json(settings: &str) -> Result<Self, EncodeError> {
        let config: EncodeConfig = serde_json::from_str(settings)?;
        config.validate()?;
        Ok(config)
    }

    /// Pretty-printed defaults, usable as a settings template.
    pub fn settings_schema() -> Option<String> {
        serde_json::to_string_pretty(&EncodeConfig::default()).ok()
    }

    pub fn with_grid(mut self, grid: GridDimensions) -> Self {
        self.grid = grid;
        self
    }

    pub fn with_normal_threshold(mut self, threshold: f64) -> Self {
        self.normal_threshold = threshold;
        self
    }

    pub fn with_square_tolerance(mut self, tolerance: f64) -> Self {
        self.square_tolerance = tolerance;
        self
    }

    pub fn with_channel_order(mut self, order: ChannelOrder) -> Self {
        self.channel_order = order;
        self
    }

    pub fn with_centering(mut self, centering: Centering) -> Self {
        self.centering = centering;
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: DiagnosticColors) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn with_parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }

    pub fn validate(&self) -> Result<(), EncodeError> {
        self.grid.validate().map_err(EncodeError::Config)?;
        if !(self.normal_threshold > 0.0 && self.normal_threshold <= 1.0) {
            return Err(EncodeError::Config(format!(
                "normal_threshold must be within (0, 1] (got {})",
                self.normal_threshold
            )));
        }
        if !self.square_tolerance.is_finite() || self.square_tolerance < 0.0 {
            return Err(EncodeError::Config(format!(
                "square_tolerance must be finite and >= 0 (got {})",
                self.square_tolerance
            )));
        }
        Ok(())
    }
}
