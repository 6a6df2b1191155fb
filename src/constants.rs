// SPDX-License-Identifier: GPL-3.0-only

//! Control-plane constants

use serde::{Deserialize, Serialize};

/// Fraction of each boundary dimension covered by a point metering region
pub const METERING_REGION_FRACTION: f64 = 0.1;

/// Weight assigned to every metering region
pub const DEFAULT_METERING_WEIGHT: i32 = 1;

/// Half-bucket tolerance added to raw accelerometer angles before
/// bucketing into one of the four cardinal orientations
pub const ORIENTATION_TOLERANCE_DEGREES: i32 = 45;

/// Minimum acceptable upper bound when picking a preview fps range
pub const MIN_PREVIEW_FPS: i32 = 10;

/// Capture resolution presets
///
/// Each preset maps to a target resolution tier; the device's advertised
/// stream configurations are matched against the tier at session setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ResolutionPreset {
    /// 352x288 (CIF)
    Low,
    /// 720x480 (SD)
    Medium,
    /// 1280x720 (HD)
    #[default]
    High,
    /// 1920x1080 (Full HD)
    VeryHigh,
    /// 3840x2160 (4K)
    UltraHigh,
    /// Highest resolution the device advertises
    Max,
}

impl ResolutionPreset {
    /// Get all preset variants, ordered from lowest to highest
    pub const ALL: [ResolutionPreset; 6] = [
        ResolutionPreset::Low,
        ResolutionPreset::Medium,
        ResolutionPreset::High,
        ResolutionPreset::VeryHigh,
        ResolutionPreset::UltraHigh,
        ResolutionPreset::Max,
    ];

    /// Get display name for the preset
    pub fn display_name(&self) -> &'static str {
        match self {
            ResolutionPreset::Low => "Low",
            ResolutionPreset::Medium => "Medium",
            ResolutionPreset::High => "High",
            ResolutionPreset::VeryHigh => "Very High",
            ResolutionPreset::UltraHigh => "Ultra High",
            ResolutionPreset::Max => "Max",
        }
    }

    /// Target (width, height) for the preset
    ///
    /// `Max` has no fixed target of its own; it aims at the largest
    /// advertised size and is capped here at the 4K tier.
    pub fn target_size(&self) -> (u32, u32) {
        match self {
            ResolutionPreset::Low => (352, 288),
            ResolutionPreset::Medium => (720, 480),
            ResolutionPreset::High => (1280, 720),
            ResolutionPreset::VeryHigh => (1920, 1080),
            ResolutionPreset::UltraHigh | ResolutionPreset::Max => (3840, 2160),
        }
    }
}

impl std::fmt::Display for ResolutionPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_ordered_by_area() {
        let mut prev = 0u64;
        for preset in &ResolutionPreset::ALL[..5] {
            let (w, h) = preset.target_size();
            let area = u64::from(w) * u64::from(h);
            assert!(area >= prev, "presets should be ordered low to high");
            prev = area;
        }
    }

    #[test]
    fn metering_fraction_is_a_tenth() {
        assert_eq!(METERING_REGION_FRACTION, 0.1);
    }
}
