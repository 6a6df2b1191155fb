// SPDX-License-Identifier: GPL-3.0-only

//! Exposure lock and exposure compensation features

use super::{CaptureFeature, FeatureName, FeatureValue, wrong_shape};
use crate::errors::ControlResult;
use crate::hal::request::{CaptureRequestBuilder, ControlKey, ControlValue};
use crate::hal::types::CameraCharacteristics;
use tracing::debug;

/// AE lock toggle; every device supports it
#[derive(Debug, Default)]
pub struct ExposureLockFeature {
    locked: bool,
}

impl ExposureLockFeature {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }
}

impl CaptureFeature for ExposureLockFeature {
    fn name(&self) -> FeatureName {
        FeatureName::ExposureLock
    }

    fn is_supported(&self) -> bool {
        true
    }

    fn set_value(&mut self, value: FeatureValue) -> ControlResult<()> {
        match value {
            FeatureValue::ExposureLock(locked) => {
                self.locked = locked;
                Ok(())
            }
            _ => Err(wrong_shape(self.name(), "a boolean lock state")),
        }
    }

    fn update_builder(&self, builder: &mut CaptureRequestBuilder) {
        builder.set(ControlKey::AeLock, ControlValue::Bool(self.locked));
    }
}

/// Exposure compensation in EV, quantized to the device's step
///
/// Values outside the advertised range are clamped, not rejected; the
/// stored value reflects the clamp.
#[derive(Debug)]
pub struct ExposureOffsetFeature {
    /// Compensation step range advertised by the device
    range: (i32, i32),
    /// EV value of one step; 0.0 on devices with no compensation at all
    step: f64,
    /// Current value in steps, already clamped
    steps: i32,
}

impl ExposureOffsetFeature {
    pub fn new(characteristics: &CameraCharacteristics) -> Self {
        Self {
            range: characteristics.exposure_compensation_range,
            step: characteristics.exposure_compensation_step,
            steps: 0,
        }
    }

    /// Current offset in EV after clamping and quantization
    pub fn offset_ev(&self) -> f64 {
        f64::from(self.steps) * self.step
    }

    /// Smallest EV increment the device can apply
    pub fn step_ev(&self) -> f64 {
        self.step
    }

    /// Lowest and highest offsets in EV
    pub fn range_ev(&self) -> (f64, f64) {
        (
            f64::from(self.range.0) * self.step,
            f64::from(self.range.1) * self.step,
        )
    }
}

impl CaptureFeature for ExposureOffsetFeature {
    fn name(&self) -> FeatureName {
        FeatureName::ExposureOffset
    }

    fn is_supported(&self) -> bool {
        true
    }

    fn set_value(&mut self, value: FeatureValue) -> ControlResult<()> {
        match value {
            FeatureValue::ExposureOffset(ev) => {
                let requested = if self.step > 0.0 {
                    (ev / self.step).round() as i32
                } else {
                    0
                };
                self.steps = requested.clamp(self.range.0, self.range.1);
                if self.steps != requested {
                    debug!(
                        requested,
                        clamped = self.steps,
                        "Exposure offset clamped to device range"
                    );
                }
                Ok(())
            }
            _ => Err(wrong_shape(self.name(), "an EV offset")),
        }
    }

    fn update_builder(&self, builder: &mut CaptureRequestBuilder) {
        builder.set(
            ControlKey::AeExposureCompensation,
            ControlValue::Int32(self.steps),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::test_support::full_characteristics;
    use crate::hal::types::RequestTemplate;

    #[test]
    fn lock_round_trips_into_the_builder() {
        let mut feature = ExposureLockFeature::new();
        feature.set_value(FeatureValue::ExposureLock(true)).unwrap();
        let mut builder = CaptureRequestBuilder::new(RequestTemplate::Preview);
        feature.update_builder(&mut builder);
        assert_eq!(builder.get(ControlKey::AeLock), Some(&ControlValue::Bool(true)));
    }

    #[test]
    fn offset_is_quantized_to_steps() {
        // Step 1/6 EV, range ±2 EV
        let mut feature = ExposureOffsetFeature::new(&full_characteristics());
        feature.set_value(FeatureValue::ExposureOffset(0.5)).unwrap();
        assert_eq!(feature.offset_ev(), 3.0 / 6.0);

        let mut builder = CaptureRequestBuilder::new(RequestTemplate::Preview);
        feature.update_builder(&mut builder);
        assert_eq!(
            builder.get(ControlKey::AeExposureCompensation),
            Some(&ControlValue::Int32(3))
        );
    }

    #[test]
    fn out_of_range_offset_is_clamped_not_rejected() {
        let mut feature = ExposureOffsetFeature::new(&full_characteristics());
        feature.set_value(FeatureValue::ExposureOffset(9.0)).unwrap();
        assert_eq!(feature.offset_ev(), 2.0);

        feature.set_value(FeatureValue::ExposureOffset(-9.0)).unwrap();
        assert_eq!(feature.offset_ev(), -2.0);
    }
}
