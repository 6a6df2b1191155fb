// SPDX-License-Identifier: GPL-3.0-only

//! Capture feature composition
//!
//! Every tunable capture setting is a [`CaptureFeature`]: a named object
//! that resolves its `supported` flag once from the static camera
//! characteristics and contributes its controls to every outgoing
//! request. An unsupported feature is a complete no-op in
//! [`CaptureFeature::update_builder`] — it must never write a control key
//! the device did not advertise, since doing so can throw at the
//! hardware layer.
//!
//! [`FeatureSet::update_builder`] folds all features over a fresh request
//! template in a fixed order: resolution and fps first, then auto-focus,
//! the metering regions, exposure lock and offset, flash, zoom, noise
//! reduction, and sensor-orientation tagging last.

pub mod auto_focus;
pub mod exposure;
pub mod flash;
pub mod fps_range;
pub mod noise_reduction;
pub mod points;
pub mod resolution;
pub mod sensor_orientation;
pub mod zoom;

pub use auto_focus::{AutoFocusFeature, FocusMode};
pub use exposure::{ExposureLockFeature, ExposureOffsetFeature};
pub use flash::{FlashFeature, FlashMode};
pub use fps_range::FpsRangeFeature;
pub use noise_reduction::NoiseReductionFeature;
pub use points::{ExposurePointFeature, FocusPointFeature, RegionBoundariesFeature};
pub use resolution::ResolutionFeature;
pub use sensor_orientation::SensorOrientationFeature;
pub use zoom::ZoomLevelFeature;

use crate::constants::ResolutionPreset;
use crate::errors::{ControlError, ControlResult};
use crate::hal::request::CaptureRequestBuilder;
use crate::hal::types::{CameraCharacteristics, FpsRange, NoiseReductionMode};
use crate::metering::{NormalizedPoint, PixelBoundary};
use crate::orientation::{DeviceOrientation, NaturalOrientation};
use serde::{Deserialize, Serialize};

/// Names of the tunable capture settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureName {
    AutoFocus,
    ExposureLock,
    ExposureOffset,
    ExposurePoint,
    Flash,
    FocusPoint,
    FpsRange,
    NoiseReduction,
    RegionBoundaries,
    Resolution,
    SensorOrientation,
    ZoomLevel,
}

impl FeatureName {
    /// Parse the wire name used by the bridge layer
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "autoFocus" => Some(Self::AutoFocus),
            "exposureLock" => Some(Self::ExposureLock),
            "exposureOffset" => Some(Self::ExposureOffset),
            "exposurePoint" => Some(Self::ExposurePoint),
            "flash" => Some(Self::Flash),
            "focusPoint" => Some(Self::FocusPoint),
            "fpsRange" => Some(Self::FpsRange),
            "noiseReduction" => Some(Self::NoiseReduction),
            "regionBoundaries" => Some(Self::RegionBoundaries),
            "resolution" => Some(Self::Resolution),
            "sensorOrientation" => Some(Self::SensorOrientation),
            "zoomLevel" => Some(Self::ZoomLevel),
            _ => None,
        }
    }

    /// The wire name used by the bridge layer
    pub fn as_name(&self) -> &'static str {
        match self {
            Self::AutoFocus => "autoFocus",
            Self::ExposureLock => "exposureLock",
            Self::ExposureOffset => "exposureOffset",
            Self::ExposurePoint => "exposurePoint",
            Self::Flash => "flash",
            Self::FocusPoint => "focusPoint",
            Self::FpsRange => "fpsRange",
            Self::NoiseReduction => "noiseReduction",
            Self::RegionBoundaries => "regionBoundaries",
            Self::Resolution => "resolution",
            Self::SensorOrientation => "sensorOrientation",
            Self::ZoomLevel => "zoomLevel",
        }
    }
}

impl std::fmt::Display for FeatureName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_name())
    }
}

/// Typed payloads accepted by [`FeatureSet::set_value`]
///
/// Each feature accepts exactly one variant shape; anything else fails
/// with `InvalidFeatureValue`.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue {
    FocusMode(FocusMode),
    ExposureLock(bool),
    ExposureOffset(f64),
    Flash(FlashMode),
    Fps(FpsRange),
    Zoom(f64),
    Point(Option<NormalizedPoint>),
    Boundary(PixelBoundary),
    NoiseReduction(NoiseReductionMode),
    Resolution(ResolutionPreset),
    Orientation(Option<DeviceOrientation>),
}

/// One independently toggleable capture setting
pub trait CaptureFeature {
    /// The feature's name
    fn name(&self) -> FeatureName;

    /// Whether the device supports this feature, resolved once from the
    /// static characteristics
    fn is_supported(&self) -> bool;

    /// Replace the current value
    ///
    /// Rejects payloads of the wrong shape with `InvalidFeatureValue`.
    /// Values are accepted even while unsupported; support gating
    /// happens in [`Self::update_builder`].
    fn set_value(&mut self, value: FeatureValue) -> ControlResult<()>;

    /// Contribute this feature's controls to an outgoing request
    ///
    /// Must be a complete no-op when unsupported.
    fn update_builder(&self, builder: &mut CaptureRequestBuilder);
}

/// Shape-mismatch helper shared by the feature impls
pub(crate) fn wrong_shape(feature: FeatureName, expected: &str) -> ControlError {
    ControlError::InvalidFeatureValue {
        feature,
        reason: format!("expected {}", expected),
    }
}

/// The full feature set of one capture session
///
/// Constructed once per session from the characteristics snapshot.
/// Features are stored by name; the composition order is the fixed one
/// documented on [`FeatureSet::update_builder`], independent of any
/// insertion order.
pub struct FeatureSet {
    resolution: ResolutionFeature,
    fps_range: FpsRangeFeature,
    auto_focus: AutoFocusFeature,
    focus_point: FocusPointFeature,
    exposure_point: ExposurePointFeature,
    exposure_lock: ExposureLockFeature,
    exposure_offset: ExposureOffsetFeature,
    flash: FlashFeature,
    zoom_level: ZoomLevelFeature,
    noise_reduction: NoiseReductionFeature,
    region_boundaries: RegionBoundariesFeature,
    sensor_orientation: SensorOrientationFeature,
}

impl FeatureSet {
    /// Build every feature from the static characteristics
    pub fn from_characteristics(
        characteristics: &CameraCharacteristics,
        preset: ResolutionPreset,
        natural_orientation: NaturalOrientation,
    ) -> Self {
        Self {
            resolution: ResolutionFeature::new(preset),
            fps_range: FpsRangeFeature::new(characteristics),
            auto_focus: AutoFocusFeature::new(characteristics),
            focus_point: FocusPointFeature::new(characteristics),
            exposure_point: ExposurePointFeature::new(characteristics),
            exposure_lock: ExposureLockFeature::new(),
            exposure_offset: ExposureOffsetFeature::new(characteristics),
            flash: FlashFeature::new(characteristics),
            zoom_level: ZoomLevelFeature::new(characteristics),
            noise_reduction: NoiseReductionFeature::new(characteristics),
            region_boundaries: RegionBoundariesFeature::new(characteristics),
            sensor_orientation: SensorOrientationFeature::new(characteristics, natural_orientation),
        }
    }

    /// Route a typed value to the named feature
    ///
    /// Setting `regionBoundaries` also refreshes the boundary both point
    /// features map against.
    pub fn set_value(&mut self, name: FeatureName, value: FeatureValue) -> ControlResult<()> {
        match name {
            FeatureName::RegionBoundaries => {
                self.region_boundaries.set_value(value)?;
                let boundary = self.region_boundaries.boundary();
                self.focus_point.set_boundary(boundary);
                self.exposure_point.set_boundary(boundary);
                Ok(())
            }
            _ => self.by_name_mut(name).set_value(value),
        }
    }

    /// Fold every feature over the builder in the fixed composition order
    pub fn update_builder(&self, builder: &mut CaptureRequestBuilder) {
        for feature in self.in_order() {
            feature.update_builder(builder);
        }
    }

    /// Features in the fixed composition order, orientation tagging last
    pub fn in_order(&self) -> [&dyn CaptureFeature; 12] {
        [
            &self.resolution,
            &self.fps_range,
            &self.auto_focus,
            &self.focus_point,
            &self.exposure_point,
            &self.exposure_lock,
            &self.exposure_offset,
            &self.flash,
            &self.zoom_level,
            &self.noise_reduction,
            &self.region_boundaries,
            &self.sensor_orientation,
        ]
    }

    fn by_name_mut(&mut self, name: FeatureName) -> &mut dyn CaptureFeature {
        match name {
            FeatureName::AutoFocus => &mut self.auto_focus,
            FeatureName::ExposureLock => &mut self.exposure_lock,
            FeatureName::ExposureOffset => &mut self.exposure_offset,
            FeatureName::ExposurePoint => &mut self.exposure_point,
            FeatureName::Flash => &mut self.flash,
            FeatureName::FocusPoint => &mut self.focus_point,
            FeatureName::FpsRange => &mut self.fps_range,
            FeatureName::NoiseReduction => &mut self.noise_reduction,
            FeatureName::RegionBoundaries => &mut self.region_boundaries,
            FeatureName::Resolution => &mut self.resolution,
            FeatureName::SensorOrientation => &mut self.sensor_orientation,
            FeatureName::ZoomLevel => &mut self.zoom_level,
        }
    }

    /// Typed access to the orientation feature (lock/unlock, tracking)
    pub fn sensor_orientation(&self) -> &SensorOrientationFeature {
        &self.sensor_orientation
    }

    /// Mutable access to the orientation feature
    pub fn sensor_orientation_mut(&mut self) -> &mut SensorOrientationFeature {
        &mut self.sensor_orientation
    }

    /// The resolution feature, consulted when configuring outputs
    pub fn resolution(&self) -> &ResolutionFeature {
        &self.resolution
    }
}

impl std::fmt::Debug for FeatureSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let supported: Vec<&'static str> = self
            .in_order()
            .iter()
            .filter(|feature| feature.is_supported())
            .map(|feature| feature.name().as_name())
            .collect();
        f.debug_struct("FeatureSet")
            .field("supported", &supported)
            .finish()
    }
}
