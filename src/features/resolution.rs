// SPDX-License-Identifier: GPL-3.0-only

//! Resolution preset feature
//!
//! Resolution shapes the output targets attached at session
//! configuration rather than any per-request control, so this feature
//! never writes to the builder.

use super::{CaptureFeature, FeatureName, FeatureValue, wrong_shape};
use crate::constants::ResolutionPreset;
use crate::errors::ControlResult;
use crate::hal::request::CaptureRequestBuilder;

/// Preview stream is bounded at 1080p regardless of the capture preset
const MAX_PREVIEW_SIZE: (u32, u32) = (1920, 1080);

#[derive(Debug)]
pub struct ResolutionFeature {
    preset: ResolutionPreset,
}

impl ResolutionFeature {
    pub fn new(preset: ResolutionPreset) -> Self {
        Self { preset }
    }

    pub fn preset(&self) -> ResolutionPreset {
        self.preset
    }

    /// Target size for still captures
    pub fn capture_size(&self) -> (u32, u32) {
        self.preset.target_size()
    }

    /// Target size for the preview stream
    pub fn preview_size(&self) -> (u32, u32) {
        let (width, height) = self.preset.target_size();
        (width.min(MAX_PREVIEW_SIZE.0), height.min(MAX_PREVIEW_SIZE.1))
    }
}

impl CaptureFeature for ResolutionFeature {
    fn name(&self) -> FeatureName {
        FeatureName::Resolution
    }

    fn is_supported(&self) -> bool {
        true
    }

    fn set_value(&mut self, value: FeatureValue) -> ControlResult<()> {
        match value {
            FeatureValue::Resolution(preset) => {
                self.preset = preset;
                Ok(())
            }
            _ => Err(wrong_shape(self.name(), "a resolution preset")),
        }
    }

    fn update_builder(&self, _builder: &mut CaptureRequestBuilder) {}
}
