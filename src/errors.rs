// SPDX-License-Identifier: MPL-2.0

//! Error types for the camera control core

use std::fmt;

use crate::features::FeatureName;
use crate::permissions::Permission;
use crate::session::SessionState;

/// Result type alias using ControlError
pub type ControlResult<T> = Result<T, ControlError>;

/// Main control-plane error type
///
/// Logical errors (unknown feature, invalid value, concurrent request)
/// are reported to the caller and never change session state. Hardware
/// errors are terminal for the session: the caller must open again.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlError {
    /// A required permission was denied
    PermissionDenied {
        /// The first permission in the group that was refused
        permission: Permission,
    },
    /// A permission request for this group is already outstanding
    RequestOngoing,
    /// A session for this camera id is already in a non-terminal state
    AlreadyOpen {
        /// Camera id of the existing session
        camera_id: String,
    },
    /// Device disconnect, open failure, or session configure failure
    HardwareUnavailable(String),
    /// Feature name not known to this session
    UnknownFeature(String),
    /// Feature value of the wrong shape or outside the accepted domain
    InvalidFeatureValue {
        /// The feature that rejected the value
        feature: FeatureName,
        /// What was wrong with it
        reason: String,
    },
    /// Normalized metering point outside [0, 1]
    OutOfBounds {
        /// Offending x coordinate
        x: f64,
        /// Offending y coordinate
        y: f64,
    },
    /// Metering boundary with a non-positive dimension
    InvalidBoundary {
        /// Boundary width as supplied
        width: i32,
        /// Boundary height as supplied
        height: i32,
    },
    /// A still capture is already pending for this session
    CaptureAlreadyInFlight,
    /// Operation not legal in the session's current state
    InvalidState {
        /// The operation that was attempted
        operation: &'static str,
        /// The state the session was in
        state: SessionState,
    },
}

impl ControlError {
    /// Stable error code for the bridge layer's `(code, message)` pairs
    pub fn code(&self) -> &'static str {
        match self {
            ControlError::PermissionDenied { .. } => "PermissionDenied",
            ControlError::RequestOngoing => "RequestOngoing",
            ControlError::AlreadyOpen { .. } => "AlreadyOpen",
            ControlError::HardwareUnavailable(_) => "HardwareUnavailable",
            ControlError::UnknownFeature(_) => "UnknownFeature",
            ControlError::InvalidFeatureValue { .. } => "InvalidFeatureValue",
            ControlError::OutOfBounds { .. } => "OutOfBounds",
            ControlError::InvalidBoundary { .. } => "InvalidBoundary",
            ControlError::CaptureAlreadyInFlight => "CaptureAlreadyInFlight",
            ControlError::InvalidState { .. } => "InvalidState",
        }
    }

    /// Whether this error is terminal for the session
    ///
    /// Terminal errors require the caller to open the camera again;
    /// everything else leaves the session where it was.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ControlError::HardwareUnavailable(_))
    }
}

impl fmt::Display for ControlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlError::PermissionDenied { permission } => {
                write!(f, "Permission denied: {}", permission)
            }
            ControlError::RequestOngoing => {
                write!(f, "A request for this group is already in progress")
            }
            ControlError::AlreadyOpen { camera_id } => {
                write!(f, "Camera {} is already open", camera_id)
            }
            ControlError::HardwareUnavailable(msg) => {
                write!(f, "Camera hardware unavailable: {}", msg)
            }
            ControlError::UnknownFeature(name) => write!(f, "Unknown feature: {}", name),
            ControlError::InvalidFeatureValue { feature, reason } => {
                write!(f, "Invalid value for {}: {}", feature, reason)
            }
            ControlError::OutOfBounds { x, y } => {
                write!(f, "Point ({}, {}) is outside the unit square", x, y)
            }
            ControlError::InvalidBoundary { width, height } => {
                write!(f, "Invalid metering boundary: {}x{}", width, height)
            }
            ControlError::CaptureAlreadyInFlight => {
                write!(f, "A still capture is already in flight")
            }
            ControlError::InvalidState { operation, state } => {
                write!(f, "Cannot {} while session is {}", operation, state)
            }
        }
    }
}

impl std::error::Error for ControlError {}

impl From<std::io::Error> for ControlError {
    fn from(err: std::io::Error) -> Self {
        ControlError::HardwareUnavailable(err.to_string())
    }
}
