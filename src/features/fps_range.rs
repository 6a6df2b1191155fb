// SPDX-License-Identifier: GPL-3.0-only

//! Preview fps range feature

use super::{CaptureFeature, FeatureName, FeatureValue, wrong_shape};
use crate::constants::MIN_PREVIEW_FPS;
use crate::errors::ControlResult;
use crate::hal::request::{CaptureRequestBuilder, ControlKey, ControlValue};
use crate::hal::types::{CameraCharacteristics, FpsRange};
use tracing::debug;

/// AE target fps range
///
/// Picks, once at construction, the advertised range with the highest
/// upper bound of at least [`MIN_PREVIEW_FPS`]; the choice only changes
/// when the caller sets one explicitly.
#[derive(Debug)]
pub struct FpsRangeFeature {
    range: Option<FpsRange>,
}

impl FpsRangeFeature {
    pub fn new(characteristics: &CameraCharacteristics) -> Self {
        let range = characteristics
            .fps_ranges
            .iter()
            .filter(|range| range.max >= MIN_PREVIEW_FPS)
            .max_by_key(|range| (range.max, range.min))
            .copied();
        if let Some(range) = range {
            debug!(range = %range, "Selected preview fps range");
        }
        Self { range }
    }

    pub fn range(&self) -> Option<FpsRange> {
        self.range
    }
}

impl CaptureFeature for FpsRangeFeature {
    fn name(&self) -> FeatureName {
        FeatureName::FpsRange
    }

    fn is_supported(&self) -> bool {
        true
    }

    fn set_value(&mut self, value: FeatureValue) -> ControlResult<()> {
        match value {
            FeatureValue::Fps(range) => {
                self.range = Some(range);
                Ok(())
            }
            _ => Err(wrong_shape(self.name(), "an fps range")),
        }
    }

    fn update_builder(&self, builder: &mut CaptureRequestBuilder) {
        if let Some(range) = self.range {
            builder.set(ControlKey::AeTargetFpsRange, ControlValue::Fps(range));
        }
    }
}
