// SPDX-License-Identifier: MPL-2.0

//! Integration tests for constants module

use shutter::constants::ResolutionPreset;

#[test]
fn test_resolution_preset_values() {
    // Test that all presets exist (Low through Max)
    assert_eq!(ResolutionPreset::ALL.len(), 6);
}

#[test]
fn test_resolution_preset_ordering() {
    // Test that presets are ordered from lowest to highest resolution
    let mut prev_area = 0u64;
    for preset in ResolutionPreset::ALL {
        let (width, height) = preset.target_size();
        let area = u64::from(width) * u64::from(height);
        assert!(
            area >= prev_area,
            "Presets should be ordered from lowest to highest"
        );
        prev_area = area;
    }
}

#[test]
fn test_resolution_preset_display_names() {
    // Test that all presets have non-empty display names
    for preset in ResolutionPreset::ALL {
        let name = preset.display_name();
        assert!(
            !name.is_empty(),
            "Preset {:?} has empty display name",
            preset
        );
    }
}
