// SPDX-License-Identifier: GPL-3.0-only

//! Noise reduction feature

use super::{CaptureFeature, FeatureName, FeatureValue, wrong_shape};
use crate::errors::ControlResult;
use crate::hal::request::{CaptureRequestBuilder, ControlKey, ControlValue};
use crate::hal::types::{CameraCharacteristics, NoiseReductionMode};

/// Fallback order when the desired mode is not advertised
const MODE_PREFERENCE: [NoiseReductionMode; 4] = [
    NoiseReductionMode::Fast,
    NoiseReductionMode::Minimal,
    NoiseReductionMode::HighQuality,
    NoiseReductionMode::Off,
];

/// Noise reduction; supported when the device advertises any mode
///
/// The applied mode is the desired one when advertised, otherwise the
/// first advertised entry of the preference order.
#[derive(Debug)]
pub struct NoiseReductionFeature {
    advertised: Vec<NoiseReductionMode>,
    desired: NoiseReductionMode,
}

impl NoiseReductionFeature {
    pub fn new(characteristics: &CameraCharacteristics) -> Self {
        Self {
            advertised: characteristics.noise_reduction_modes.clone(),
            desired: NoiseReductionMode::Fast,
        }
    }

    /// The mode that will actually be written, after fallback
    pub fn resolved_mode(&self) -> Option<NoiseReductionMode> {
        if self.advertised.contains(&self.desired) {
            return Some(self.desired);
        }
        MODE_PREFERENCE
            .iter()
            .copied()
            .find(|mode| self.advertised.contains(mode))
    }
}

impl CaptureFeature for NoiseReductionFeature {
    fn name(&self) -> FeatureName {
        FeatureName::NoiseReduction
    }

    fn is_supported(&self) -> bool {
        !self.advertised.is_empty()
    }

    fn set_value(&mut self, value: FeatureValue) -> ControlResult<()> {
        match value {
            FeatureValue::NoiseReduction(mode) => {
                self.desired = mode;
                Ok(())
            }
            _ => Err(wrong_shape(self.name(), "a noise-reduction mode")),
        }
    }

    fn update_builder(&self, builder: &mut CaptureRequestBuilder) {
        if !self.is_supported() {
            return;
        }
        if let Some(mode) = self.resolved_mode() {
            builder.set(ControlKey::NoiseReductionMode, ControlValue::NoiseReduction(mode));
        }
    }
}
