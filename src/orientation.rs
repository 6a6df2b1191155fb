// SPDX-License-Identifier: GPL-3.0-only

//! Device orientation reconciliation
//!
//! Two producers disagree about which way the device is held: the
//! inertial sensor delivers continuous angles, the UI layer delivers one
//! of four discrete rotations. Only one of them is authoritative at a
//! time, gated by the environment's rotation lock. This module reduces
//! both to a single cardinal orientation and notifies the consumer only
//! on actual transitions.
//!
//! Both producers may deliver from different threads; callers must
//! serialize readings before they reach the reconciler, since the
//! notify-on-change invariant needs a consistent view of the last
//! dispatched value.

use crate::constants::ORIENTATION_TOLERANCE_DEGREES;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One of the four 90°-separated device orientations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DeviceOrientation {
    /// Device upright, natural portrait
    #[default]
    PortraitUp,
    /// Device upside down
    PortraitDown,
    /// Device rotated 90° counter-clockwise from portrait
    LandscapeLeft,
    /// Device rotated 90° clockwise from portrait
    LandscapeRight,
}

impl DeviceOrientation {
    /// Base rotation in degrees used for capture tagging
    pub fn base_degrees(&self) -> i32 {
        match self {
            DeviceOrientation::PortraitUp => 0,
            DeviceOrientation::PortraitDown => 180,
            DeviceOrientation::LandscapeLeft => 90,
            DeviceOrientation::LandscapeRight => 270,
        }
    }
}

impl std::fmt::Display for DeviceOrientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DeviceOrientation::PortraitUp => "portraitUp",
            DeviceOrientation::PortraitDown => "portraitDown",
            DeviceOrientation::LandscapeLeft => "landscapeLeft",
            DeviceOrientation::LandscapeRight => "landscapeRight",
        };
        write!(f, "{}", name)
    }
}

/// Discrete UI rotation as reported by the windowing layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiRotation {
    Rotation0,
    Rotation90,
    Rotation180,
    Rotation270,
}

/// Current layout orientation of the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutOrientation {
    Portrait,
    Landscape,
}

/// The device's natural (default) orientation
///
/// Phones are portrait-natural; most tablets and laptops are
/// landscape-natural, which shifts the accelerometer bucketing by 90°.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NaturalOrientation {
    #[default]
    Portrait,
    Landscape,
}

/// Callback invoked on each orientation transition
pub type OrientationCallback = Box<dyn FnMut(DeviceOrientation) + Send>;

/// Reconciles the two orientation producers into one stable signal
///
/// Accelerometer readings are consulted only while rotation lock is off;
/// UI-rotation readings only while it is on. A reading from the inactive
/// producer is discarded, not buffered.
pub struct OrientationReconciler {
    /// Fixed mounting angle of the sensor, from static characteristics
    sensor_orientation_degrees: i32,
    /// Front-facing sensors are mirrored, which flips the tag sign
    front_facing: bool,
    natural_orientation: NaturalOrientation,
    /// True while the environment's rotation lock is enabled
    rotation_locked: bool,
    /// Last cardinal delivered to the consumer
    last_dispatched: Option<DeviceOrientation>,
    /// Last orientation derived from the UI producer
    last_ui_orientation: DeviceOrientation,
    /// Override held for the duration of an in-flight still capture
    locked_orientation: Option<DeviceOrientation>,
    on_change: Option<OrientationCallback>,
}

impl OrientationReconciler {
    pub fn new(
        sensor_orientation_degrees: i32,
        front_facing: bool,
        natural_orientation: NaturalOrientation,
    ) -> Self {
        Self {
            sensor_orientation_degrees: sensor_orientation_degrees.rem_euclid(360),
            front_facing,
            natural_orientation,
            rotation_locked: false,
            last_dispatched: None,
            last_ui_orientation: DeviceOrientation::default(),
            locked_orientation: None,
            on_change: None,
        }
    }

    /// Attach the consumer callback and begin dispatching
    pub fn start(&mut self, on_change: OrientationCallback) {
        debug!(
            sensor_degrees = self.sensor_orientation_degrees,
            front_facing = self.front_facing,
            "Starting orientation tracking"
        );
        self.on_change = Some(on_change);
    }

    /// Detach the consumer and drop tracking state
    pub fn stop(&mut self) {
        debug!("Stopping orientation tracking");
        self.on_change = None;
        self.last_dispatched = None;
        self.locked_orientation = None;
    }

    /// Whether tracking is currently attached
    pub fn is_running(&self) -> bool {
        self.on_change.is_some()
    }

    /// Update the rotation-lock gate
    ///
    /// While locked, only UI-rotation readings are consulted; while
    /// unlocked, only accelerometer readings are.
    pub fn set_rotation_locked(&mut self, locked: bool) {
        self.rotation_locked = locked;
    }

    /// Feed a raw accelerometer angle (degrees, clockwise from upright)
    pub fn handle_sensor_angle(&mut self, angle_degrees: i32) {
        if !self.is_running() || self.rotation_locked {
            return;
        }
        let orientation = self.cardinal_from_angle(angle_degrees);
        self.dispatch(orientation);
    }

    /// Feed a discrete UI rotation reading
    ///
    /// Discarded, not buffered, while the accelerometer producer is the
    /// active one.
    pub fn handle_ui_rotation(&mut self, rotation: UiRotation, layout: LayoutOrientation) {
        if !self.is_running() || !self.rotation_locked {
            return;
        }
        let orientation = cardinal_from_ui(rotation, layout);
        self.last_ui_orientation = orientation;
        self.dispatch(orientation);
    }

    /// Pin the orientation for an in-flight still capture
    ///
    /// Device rotation between issuing the request and its completion
    /// must not alter the already-issued orientation tag.
    pub fn lock(&mut self, orientation: DeviceOrientation) {
        self.locked_orientation = Some(orientation);
    }

    /// Clear the still-capture override
    pub fn unlock(&mut self) {
        self.locked_orientation = None;
    }

    /// The locked override, if a still capture is in flight
    pub fn locked_orientation(&self) -> Option<DeviceOrientation> {
        self.locked_orientation
    }

    /// Most recent reconciled orientation
    pub fn last_orientation(&self) -> DeviceOrientation {
        self.last_dispatched.unwrap_or(self.last_ui_orientation)
    }

    /// Rotation in degrees to write into a capture request's orientation
    /// tag
    ///
    /// Uses the explicit argument when given, else the locked override,
    /// else the last reconciled orientation. Front-facing sensors are
    /// mirrored, so their angle is negated before adding the fixed
    /// sensor mounting angle.
    pub fn capture_rotation_degrees(&self, orientation: Option<DeviceOrientation>) -> i32 {
        let orientation = orientation
            .or(self.locked_orientation)
            .unwrap_or_else(|| self.last_orientation());

        let mut angle = orientation.base_degrees();
        if self.front_facing {
            angle = -angle;
        }
        (angle + self.sensor_orientation_degrees).rem_euclid(360)
    }

    fn cardinal_from_angle(&self, angle_degrees: i32) -> DeviceOrientation {
        let mut angle = angle_degrees + ORIENTATION_TOLERANCE_DEGREES;
        if self.natural_orientation == NaturalOrientation::Landscape {
            angle += 90;
        }
        const BUCKETS: [DeviceOrientation; 4] = [
            DeviceOrientation::PortraitUp,
            DeviceOrientation::LandscapeLeft,
            DeviceOrientation::PortraitDown,
            DeviceOrientation::LandscapeRight,
        ];
        BUCKETS[(angle.rem_euclid(360) / 90) as usize]
    }

    fn dispatch(&mut self, orientation: DeviceOrientation) {
        if self.last_dispatched == Some(orientation) {
            return;
        }
        debug!(orientation = %orientation, "Device orientation changed");
        self.last_dispatched = Some(orientation);
        if let Some(callback) = self.on_change.as_mut() {
            callback(orientation);
        }
    }
}

impl std::fmt::Debug for OrientationReconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrientationReconciler")
            .field("sensor_orientation_degrees", &self.sensor_orientation_degrees)
            .field("front_facing", &self.front_facing)
            .field("rotation_locked", &self.rotation_locked)
            .field("last_dispatched", &self.last_dispatched)
            .field("locked_orientation", &self.locked_orientation)
            .finish()
    }
}

/// Fixed lookup from UI rotation and layout orientation to a cardinal
fn cardinal_from_ui(rotation: UiRotation, layout: LayoutOrientation) -> DeviceOrientation {
    match (layout, rotation) {
        (LayoutOrientation::Portrait, UiRotation::Rotation0 | UiRotation::Rotation90) => {
            DeviceOrientation::PortraitUp
        }
        (LayoutOrientation::Portrait, UiRotation::Rotation180 | UiRotation::Rotation270) => {
            DeviceOrientation::PortraitDown
        }
        (LayoutOrientation::Landscape, UiRotation::Rotation0 | UiRotation::Rotation90) => {
            DeviceOrientation::LandscapeLeft
        }
        (LayoutOrientation::Landscape, UiRotation::Rotation180 | UiRotation::Rotation270) => {
            DeviceOrientation::LandscapeRight
        }
    }
}
