// SPDX-License-Identifier: GPL-3.0-only

//! Shared types at the hardware boundary
//!
//! Everything here is read-only truth reported by the device: static
//! characteristics consumed once at session open, and the value/mode
//! vocabulary written into capture requests.

use crate::metering::PixelBoundary;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which way the lens faces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LensFacing {
    Front,
    #[default]
    Back,
    External,
}

impl LensFacing {
    pub fn is_front(&self) -> bool {
        matches!(self, LensFacing::Front)
    }
}

/// Auto-focus modes a device may advertise
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfModeValue {
    Off,
    Auto,
    Macro,
    ContinuousVideo,
    ContinuousPicture,
}

/// Auto-exposure modes written into requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AeModeValue {
    Off,
    On,
    OnAutoFlash,
    OnAlwaysFlash,
}

/// Flash unit modes written into requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashModeValue {
    Off,
    Single,
    Torch,
}

/// Noise-reduction processing modes a device may advertise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoiseReductionMode {
    Off,
    Fast,
    HighQuality,
    Minimal,
    ZeroShutterLag,
}

/// An advertised fps range, inclusive on both ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FpsRange {
    pub min: i32,
    pub max: i32,
}

impl FpsRange {
    pub fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }
}

impl std::fmt::Display for FpsRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

/// A pixel-space crop rectangle (digital zoom)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Static camera characteristics, queried once at device open
///
/// Every capture feature resolves its `supported` flag from this
/// snapshot; it never changes for the lifetime of a session.
#[derive(Debug, Clone)]
pub struct CameraCharacteristics {
    /// Which way the lens faces (front sensors are mirrored)
    pub lens_facing: LensFacing,
    /// Fixed mounting angle of the sensor: 0, 90, 180 or 270
    pub sensor_orientation_degrees: i32,
    /// Advertised auto-focus modes
    pub af_modes: Vec<AfModeValue>,
    /// 0.0 means the lens is fixed-focus
    pub min_focus_distance: f32,
    /// Exposure compensation range in steps, inclusive
    pub exposure_compensation_range: (i32, i32),
    /// EV value of one compensation step
    pub exposure_compensation_step: f64,
    /// Whether a flash unit is present
    pub flash_available: bool,
    /// Advertised AE target fps ranges
    pub fps_ranges: Vec<FpsRange>,
    /// Maximum digital zoom ratio; 1.0 means no crop capability
    pub max_zoom: f64,
    /// Active sensor array used as the metering boundary
    pub sensor_boundary: PixelBoundary,
    /// Maximum number of AF metering regions (0 = unsupported)
    pub max_af_regions: u32,
    /// Maximum number of AE metering regions (0 = unsupported)
    pub max_ae_regions: u32,
    /// Advertised noise-reduction modes
    pub noise_reduction_modes: Vec<NoiseReductionMode>,
}

impl CameraCharacteristics {
    /// Whether the lens can focus at all
    pub fn has_focus_actuator(&self) -> bool {
        self.min_focus_distance > 0.0
    }
}

/// What an output stream is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetPurpose {
    Preview,
    StillCapture,
    VideoRecord,
}

/// One output stream attached to the capture session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    pub purpose: TargetPurpose,
    pub width: u32,
    pub height: u32,
}

impl OutputTarget {
    pub fn new(purpose: TargetPurpose, width: u32, height: u32) -> Self {
        Self {
            purpose,
            width,
            height,
        }
    }
}

/// Template a capture request is created from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestTemplate {
    /// Repeating request driving the live preview stream
    Preview,
    /// One-shot request producing a persisted image
    StillCapture,
}

/// Asynchronous completions from the hardware device
///
/// The device API delivers these on an unspecified executor; they must
/// be marshaled onto the session's serialized intake before touching
/// controller state.
#[derive(Debug, Clone)]
pub enum HardwareEvent {
    /// Device opened; carries the static characteristics snapshot
    Opened {
        characteristics: CameraCharacteristics,
    },
    /// Device open failed
    OpenFailed { message: String },
    /// Device disconnected or entered an unrecoverable error state
    Disconnected { message: String },
    /// Output configuration confirmed
    SessionConfigured,
    /// Output configuration rejected
    SessionConfigureFailed { message: String },
    /// Still capture finished and the image was persisted
    CaptureCompleted { path: PathBuf },
    /// Still capture failed
    CaptureFailed { message: String },
}
