// SPDX-License-Identifier: GPL-3.0-only

//! Digital zoom feature
//!
//! Zoom is expressed to the hardware as a crop rectangle over the sensor
//! array, centered and shrunk proportionally to the requested factor.

use super::{CaptureFeature, FeatureName, FeatureValue, wrong_shape};
use crate::errors::ControlResult;
use crate::hal::request::{CaptureRequestBuilder, ControlKey, ControlValue};
use crate::hal::types::{CameraCharacteristics, CropRect};
use crate::metering::PixelBoundary;
use tracing::debug;

/// Digital zoom; supported when the device advertises a crop capability
#[derive(Debug)]
pub struct ZoomLevelFeature {
    supported: bool,
    sensor_boundary: PixelBoundary,
    max_zoom: f64,
    zoom: f64,
}

impl ZoomLevelFeature {
    pub fn new(characteristics: &CameraCharacteristics) -> Self {
        Self {
            supported: characteristics.max_zoom > 1.0,
            sensor_boundary: characteristics.sensor_boundary,
            max_zoom: characteristics.max_zoom.max(1.0),
            zoom: 1.0,
        }
    }

    /// Current zoom factor after clamping
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Highest zoom factor the device supports
    pub fn max_zoom(&self) -> f64 {
        self.max_zoom
    }

    fn crop_rect(&self) -> CropRect {
        let full_width = self.sensor_boundary.width();
        let full_height = self.sensor_boundary.height();
        let width = ((f64::from(full_width) / self.zoom).round() as i32).min(full_width);
        let height = ((f64::from(full_height) / self.zoom).round() as i32).min(full_height);
        CropRect {
            x: (full_width - width) / 2,
            y: (full_height - height) / 2,
            width,
            height,
        }
    }
}

impl CaptureFeature for ZoomLevelFeature {
    fn name(&self) -> FeatureName {
        FeatureName::ZoomLevel
    }

    fn is_supported(&self) -> bool {
        self.supported
    }

    fn set_value(&mut self, value: FeatureValue) -> ControlResult<()> {
        match value {
            FeatureValue::Zoom(zoom) => {
                let clamped = zoom.clamp(1.0, self.max_zoom);
                if clamped != zoom {
                    debug!(requested = zoom, clamped, "Zoom factor clamped");
                }
                self.zoom = clamped;
                Ok(())
            }
            _ => Err(wrong_shape(self.name(), "a zoom factor")),
        }
    }

    fn update_builder(&self, builder: &mut CaptureRequestBuilder) {
        if !self.supported {
            return;
        }
        builder.set(ControlKey::ScalerCropRegion, ControlValue::Crop(self.crop_rect()));
    }
}
