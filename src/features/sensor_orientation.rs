// SPDX-License-Identifier: GPL-3.0-only

//! Sensor-orientation tagging feature
//!
//! Owns the session's [`OrientationReconciler`] and writes the computed
//! rotation into every request's orientation tag. Read-only from the
//! caller's perspective, except for the explicit lock/unlock held around
//! a still capture.

use super::{CaptureFeature, FeatureName, FeatureValue, wrong_shape};
use crate::errors::ControlResult;
use crate::hal::request::{CaptureRequestBuilder, ControlKey, ControlValue};
use crate::hal::types::CameraCharacteristics;
use crate::orientation::{DeviceOrientation, NaturalOrientation, OrientationReconciler};

#[derive(Debug)]
pub struct SensorOrientationFeature {
    reconciler: OrientationReconciler,
}

impl SensorOrientationFeature {
    pub fn new(
        characteristics: &CameraCharacteristics,
        natural_orientation: NaturalOrientation,
    ) -> Self {
        Self {
            reconciler: OrientationReconciler::new(
                characteristics.sensor_orientation_degrees,
                characteristics.lens_facing.is_front(),
                natural_orientation,
            ),
        }
    }

    /// The reconciler, for attaching producers and lifecycle control
    pub fn reconciler(&self) -> &OrientationReconciler {
        &self.reconciler
    }

    /// Mutable reconciler access
    pub fn reconciler_mut(&mut self) -> &mut OrientationReconciler {
        &mut self.reconciler
    }

    /// Pin the orientation tag for an in-flight still capture
    pub fn lock(&mut self, orientation: DeviceOrientation) {
        self.reconciler.lock(orientation);
    }

    /// Release the still-capture pin
    pub fn unlock(&mut self) {
        self.reconciler.unlock();
    }
}

impl CaptureFeature for SensorOrientationFeature {
    fn name(&self) -> FeatureName {
        FeatureName::SensorOrientation
    }

    fn is_supported(&self) -> bool {
        true
    }

    fn set_value(&mut self, value: FeatureValue) -> ControlResult<()> {
        match value {
            FeatureValue::Orientation(Some(orientation)) => {
                self.reconciler.lock(orientation);
                Ok(())
            }
            FeatureValue::Orientation(None) => {
                self.reconciler.unlock();
                Ok(())
            }
            _ => Err(wrong_shape(self.name(), "an orientation or null")),
        }
    }

    fn update_builder(&self, builder: &mut CaptureRequestBuilder) {
        builder.set(
            ControlKey::JpegOrientation,
            ControlValue::Int32(self.reconciler.capture_rotation_degrees(None)),
        );
    }
}
