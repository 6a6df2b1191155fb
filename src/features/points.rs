// SPDX-License-Identifier: GPL-3.0-only

//! Point metering features: focus point, exposure point, and the
//! boundary they map against
//!
//! A normalized point is converted into a 1-weighted metering rectangle
//! each time it is set; only the computed rectangle is kept. Clearing
//! the point (setting it to `None`) removes the region array entirely,
//! returning the hardware to whole-frame metering.

use super::{CaptureFeature, FeatureName, FeatureValue, wrong_shape};
use crate::errors::ControlResult;
use crate::hal::request::{CaptureRequestBuilder, ControlKey, ControlValue};
use crate::hal::types::CameraCharacteristics;
use crate::metering::{MeteringRegion, NormalizedPoint, PixelBoundary, default_metering_region};

/// Exposes the pixel boundary used by the point features
///
/// Derivable from the static characteristics, so always supported. It
/// never writes to the request itself.
#[derive(Debug)]
pub struct RegionBoundariesFeature {
    boundary: PixelBoundary,
}

impl RegionBoundariesFeature {
    pub fn new(characteristics: &CameraCharacteristics) -> Self {
        Self {
            boundary: characteristics.sensor_boundary,
        }
    }

    pub fn boundary(&self) -> PixelBoundary {
        self.boundary
    }
}

impl CaptureFeature for RegionBoundariesFeature {
    fn name(&self) -> FeatureName {
        FeatureName::RegionBoundaries
    }

    fn is_supported(&self) -> bool {
        true
    }

    fn set_value(&mut self, value: FeatureValue) -> ControlResult<()> {
        match value {
            FeatureValue::Boundary(boundary) => {
                self.boundary = boundary;
                Ok(())
            }
            _ => Err(wrong_shape(self.name(), "a pixel boundary")),
        }
    }

    fn update_builder(&self, _builder: &mut CaptureRequestBuilder) {}
}

/// Shared state of the two point features
#[derive(Debug)]
struct PointState {
    supported: bool,
    boundary: PixelBoundary,
    point: Option<NormalizedPoint>,
    region: Option<MeteringRegion>,
}

impl PointState {
    fn new(supported: bool, boundary: PixelBoundary) -> Self {
        Self {
            supported,
            boundary,
            point: None,
            region: None,
        }
    }

    fn set_point(
        &mut self,
        point: Option<NormalizedPoint>,
    ) -> ControlResult<()> {
        match point {
            Some(point) => {
                // Fails with OutOfBounds before any state changes
                let region = default_metering_region(point, self.boundary)?;
                self.point = Some(point);
                self.region = Some(region);
            }
            None => {
                self.point = None;
                self.region = None;
            }
        }
        Ok(())
    }

    fn set_boundary(&mut self, boundary: PixelBoundary) {
        self.boundary = boundary;
        if let Some(point) = self.point {
            // Remap the stored point against the new boundary; the point
            // was validated when set, so this cannot fail
            self.region = default_metering_region(point, boundary).ok();
        }
    }

    fn write(&self, builder: &mut CaptureRequestBuilder, key: ControlKey) {
        if !self.supported {
            return;
        }
        match self.region {
            Some(region) => builder.set(key, ControlValue::Regions(vec![region])),
            None => builder.clear(key),
        }
    }
}

/// Auto-focus metering point; supported when the device has AF regions
#[derive(Debug)]
pub struct FocusPointFeature {
    state: PointState,
}

impl FocusPointFeature {
    pub fn new(characteristics: &CameraCharacteristics) -> Self {
        Self {
            state: PointState::new(
                characteristics.max_af_regions > 0,
                characteristics.sensor_boundary,
            ),
        }
    }

    pub fn point(&self) -> Option<NormalizedPoint> {
        self.state.point
    }

    pub(crate) fn set_boundary(&mut self, boundary: PixelBoundary) {
        self.state.set_boundary(boundary);
    }
}

impl CaptureFeature for FocusPointFeature {
    fn name(&self) -> FeatureName {
        FeatureName::FocusPoint
    }

    fn is_supported(&self) -> bool {
        self.state.supported
    }

    fn set_value(&mut self, value: FeatureValue) -> ControlResult<()> {
        match value {
            FeatureValue::Point(point) => self.state.set_point(point),
            _ => Err(wrong_shape(self.name(), "a normalized point or null")),
        }
    }

    fn update_builder(&self, builder: &mut CaptureRequestBuilder) {
        self.state.write(builder, ControlKey::AfRegions);
    }
}

/// Auto-exposure metering point; supported when the device has AE regions
#[derive(Debug)]
pub struct ExposurePointFeature {
    state: PointState,
}

impl ExposurePointFeature {
    pub fn new(characteristics: &CameraCharacteristics) -> Self {
        Self {
            state: PointState::new(
                characteristics.max_ae_regions > 0,
                characteristics.sensor_boundary,
            ),
        }
    }

    pub fn point(&self) -> Option<NormalizedPoint> {
        self.state.point
    }

    pub(crate) fn set_boundary(&mut self, boundary: PixelBoundary) {
        self.state.set_boundary(boundary);
    }
}

impl CaptureFeature for ExposurePointFeature {
    fn name(&self) -> FeatureName {
        FeatureName::ExposurePoint
    }

    fn is_supported(&self) -> bool {
        self.state.supported
    }

    fn set_value(&mut self, value: FeatureValue) -> ControlResult<()> {
        match value {
            FeatureValue::Point(point) => self.state.set_point(point),
            _ => Err(wrong_shape(self.name(), "a normalized point or null")),
        }
    }

    fn update_builder(&self, builder: &mut CaptureRequestBuilder) {
        self.state.write(builder, ControlKey::AeRegions);
    }
}
