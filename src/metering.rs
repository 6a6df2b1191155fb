// SPDX-License-Identifier: GPL-3.0-only

//! Normalized-point to metering-rectangle mapping
//!
//! Auto-focus and auto-exposure points arrive from the caller as
//! coordinates normalized to [0, 1]. The hardware wants pixel-space
//! rectangles inside the sensor's active (or pixel) array. This module
//! does that conversion.

use crate::constants::{DEFAULT_METERING_WEIGHT, METERING_REGION_FRACTION};
use crate::errors::{ControlError, ControlResult};
use serde::{Deserialize, Serialize};

/// A point normalized to the unit square, origin at the top-left
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPoint {
    pub x: f64,
    pub y: f64,
}

impl NormalizedPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Check both coordinates lie in [0, 1]
    pub fn is_valid(&self) -> bool {
        (0.0..=1.0).contains(&self.x) && (0.0..=1.0).contains(&self.y)
    }
}

/// Pixel-space boundary the metering rectangle must stay inside
///
/// Depending on the device API level this is the sensor's active array
/// or its full pixel array; either way both dimensions must be strictly
/// positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelBoundary {
    width: i32,
    height: i32,
}

impl PixelBoundary {
    /// Construct a boundary, rejecting non-positive dimensions
    pub fn new(width: i32, height: i32) -> ControlResult<Self> {
        if width <= 0 || height <= 0 {
            return Err(ControlError::InvalidBoundary { width, height });
        }
        Ok(Self { width, height })
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }
}

impl std::fmt::Display for PixelBoundary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A weighted pixel-space rectangle for AF/AE metering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeteringRegion {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub weight: i32,
}

impl MeteringRegion {
    /// Check the region lies fully inside the boundary
    pub fn is_within(&self, boundary: &PixelBoundary) -> bool {
        self.x >= 0
            && self.y >= 0
            && self.x + self.width <= boundary.width()
            && self.y + self.height <= boundary.height()
    }
}

/// Convert a normalized point into a 1-weighted metering rectangle
///
/// The rectangle covers `fraction` of each boundary dimension, centered
/// at the point, then shifted (never resized) to stay fully inside the
/// boundary. Fails with `OutOfBounds` when either coordinate falls
/// outside [0, 1].
pub fn point_to_metering_region(
    point: NormalizedPoint,
    boundary: PixelBoundary,
    fraction: f64,
) -> ControlResult<MeteringRegion> {
    if !point.is_valid() {
        return Err(ControlError::OutOfBounds {
            x: point.x,
            y: point.y,
        });
    }

    let width = (fraction * f64::from(boundary.width())).round() as i32;
    let height = (fraction * f64::from(boundary.height())).round() as i32;

    // Interpolate over [0, dim - 1] so a coordinate of 1.0 lands on the
    // last addressable pixel, then shift the naive placement back inside.
    let center_x = (point.x * f64::from(boundary.width() - 1)).round() as i32;
    let center_y = (point.y * f64::from(boundary.height() - 1)).round() as i32;

    let x = (center_x - width / 2).clamp(0, (boundary.width() - 1 - width).max(0));
    let y = (center_y - height / 2).clamp(0, (boundary.height() - 1 - height).max(0));

    Ok(MeteringRegion {
        x,
        y,
        width,
        height,
        weight: DEFAULT_METERING_WEIGHT,
    })
}

/// Convenience wrapper using the fixed default fraction
pub fn default_metering_region(
    point: NormalizedPoint,
    boundary: PixelBoundary,
) -> ControlResult<MeteringRegion> {
    point_to_metering_region(point, boundary, METERING_REGION_FRACTION)
}
