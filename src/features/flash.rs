// SPDX-License-Identifier: GPL-3.0-only

//! Flash feature
//!
//! The caller's four flash modes decompose into an AE-mode / flash-mode
//! pair on the wire: the AE algorithm decides whether the flash fires
//! for a capture, while the flash-mode key drives the torch directly.

use super::{CaptureFeature, FeatureName, FeatureValue, wrong_shape};
use crate::errors::ControlResult;
use crate::hal::request::{CaptureRequestBuilder, ControlKey, ControlValue};
use crate::hal::types::{AeModeValue, CameraCharacteristics, FlashModeValue};
use serde::{Deserialize, Serialize};

/// Caller-facing flash modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FlashMode {
    /// Flash never fires
    #[default]
    Off,
    /// AE decides per scene whether to fire
    Auto,
    /// Flash fires on every still capture
    Always,
    /// Flash LED stays on continuously
    Torch,
}

/// Flash control; supported when a flash unit is present
#[derive(Debug)]
pub struct FlashFeature {
    supported: bool,
    mode: FlashMode,
}

impl FlashFeature {
    pub fn new(characteristics: &CameraCharacteristics) -> Self {
        Self {
            supported: characteristics.flash_available,
            mode: FlashMode::default(),
        }
    }

    pub fn mode(&self) -> FlashMode {
        self.mode
    }
}

impl CaptureFeature for FlashFeature {
    fn name(&self) -> FeatureName {
        FeatureName::Flash
    }

    fn is_supported(&self) -> bool {
        self.supported
    }

    fn set_value(&mut self, value: FeatureValue) -> ControlResult<()> {
        match value {
            FeatureValue::Flash(mode) => {
                self.mode = mode;
                Ok(())
            }
            _ => Err(wrong_shape(self.name(), "a flash mode")),
        }
    }

    fn update_builder(&self, builder: &mut CaptureRequestBuilder) {
        if !self.supported {
            return;
        }
        let (ae_mode, flash_mode) = match self.mode {
            FlashMode::Off => (AeModeValue::On, FlashModeValue::Off),
            FlashMode::Auto => (AeModeValue::OnAutoFlash, FlashModeValue::Off),
            FlashMode::Always => (AeModeValue::OnAlwaysFlash, FlashModeValue::Off),
            FlashMode::Torch => (AeModeValue::On, FlashModeValue::Torch),
        };
        builder.set(ControlKey::AeMode, ControlValue::Ae(ae_mode));
        builder.set(ControlKey::FlashMode, ControlValue::Flash(flash_mode));
    }
}
