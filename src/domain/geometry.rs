//! Design placement geometry.
//!
//! Editors express positions in pixels at a fixed reference density; the
//! renderer expects whole inches. Conversion rounds to the nearest inch because
//! the renderer ignores sub-inch precision.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Pixel density the editor canvas is normalised to.
pub const REFERENCE_DPI: u32 = 150;

/// Position of the design layer in reference-DPI pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlacementGeometry {
    pub width: u32,
    pub height: u32,
    pub top: u32,
    pub left: u32,
}

/// Position of the design layer in inches, as submitted to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InchGeometry {
    pub width: u32,
    pub height: u32,
    pub top: u32,
    pub left: u32,
}

impl PlacementGeometry {
    pub fn new(width: u32, height: u32, top: u32, left: u32) -> Self {
        Self {
            width,
            height,
            top,
            left,
        }
    }

    pub fn to_inches(&self) -> InchGeometry {
        InchGeometry {
            width: px_to_inches(self.width),
            height: px_to_inches(self.height),
            top: px_to_inches(self.top),
            left: px_to_inches(self.left),
        }
    }
}

/// Integer-rounding division by [`REFERENCE_DPI`].
pub fn px_to_inches(px: u32) -> u32 {
    px.saturating_add(REFERENCE_DPI / 2) / REFERENCE_DPI
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid geometry `{input}`: expected WIDTH,HEIGHT,TOP,LEFT in pixels")]
pub struct ParseGeometryError {
    pub input: String,
}

impl FromStr for PlacementGeometry {
    type Err = ParseGeometryError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let err = || ParseGeometryError {
            input: value.to_string(),
        };
        let parts = value
            .split(',')
            .map(|part| part.trim().parse::<u32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| err())?;
        match parts.as_slice() {
            [width, height, top, left] => Ok(Self::new(*width, *height, *top, *left)),
            _ => Err(err()),
        }
    }
}
