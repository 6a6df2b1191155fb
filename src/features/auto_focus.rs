// SPDX-License-Identifier: GPL-3.0-only

//! Auto-focus feature

use super::{CaptureFeature, FeatureName, FeatureValue, wrong_shape};
use crate::errors::ControlResult;
use crate::hal::request::{CaptureRequestBuilder, ControlKey, ControlValue};
use crate::hal::types::{AfModeValue, CameraCharacteristics};
use serde::{Deserialize, Serialize};

/// Caller-facing focus modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FocusMode {
    /// Continuous auto-focus tuned for still capture
    #[default]
    Auto,
    /// Focus locked at its current position
    Locked,
}

/// Continuous or locked auto-focus
///
/// Supported when the lens is not fixed-focus and the device advertises
/// at least one AF mode besides off.
#[derive(Debug)]
pub struct AutoFocusFeature {
    supported: bool,
    mode: FocusMode,
}

impl AutoFocusFeature {
    pub fn new(characteristics: &CameraCharacteristics) -> Self {
        let has_af_mode = characteristics
            .af_modes
            .iter()
            .any(|mode| *mode != AfModeValue::Off);
        Self {
            supported: characteristics.has_focus_actuator() && has_af_mode,
            mode: FocusMode::default(),
        }
    }

    pub fn mode(&self) -> FocusMode {
        self.mode
    }
}

impl CaptureFeature for AutoFocusFeature {
    fn name(&self) -> FeatureName {
        FeatureName::AutoFocus
    }

    fn is_supported(&self) -> bool {
        self.supported
    }

    fn set_value(&mut self, value: FeatureValue) -> ControlResult<()> {
        match value {
            FeatureValue::FocusMode(mode) => {
                self.mode = mode;
                Ok(())
            }
            _ => Err(wrong_shape(self.name(), "a focus mode")),
        }
    }

    fn update_builder(&self, builder: &mut CaptureRequestBuilder) {
        if !self.supported {
            return;
        }
        let af_mode = match self.mode {
            FocusMode::Auto => AfModeValue::ContinuousPicture,
            FocusMode::Locked => AfModeValue::Auto,
        };
        builder.set(ControlKey::AfMode, ControlValue::Af(af_mode));
    }
}
