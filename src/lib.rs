// SPDX-License-Identifier: MPL-2.0

//! shutter - a camera device control core
//!
//! This library coordinates one asynchronous hardware camera with
//! permission gating, a set of independently tunable capture settings
//! merged into atomic requests, and two disagreeing sources of device
//! orientation reconciled into a single stable signal.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`session`]: The capture-session state machine
//! - [`service`]: Session arena and serialized event intake
//! - [`features`]: Per-setting capture request composition
//! - [`orientation`]: Accelerometer / UI-rotation reconciliation
//! - [`metering`]: Normalized-point to metering-rectangle mapping
//! - [`permissions`]: Permission request serialization
//! - [`hal`]: The hardware device boundary
//! - [`config`]: Session configuration
//!
//! # Example
//!
//! ```ignore
//! let (mut service, mut notifications) = CameraService::new();
//! service.open("0", handle, permissions, Config::default())?;
//! // ... deliver permission results and hardware events, then:
//! service.configure_session("0", None)?;
//! service.start_preview("0")?;
//! service.capture_still("0", None)?;
//! ```

pub mod config;
pub mod constants;
pub mod errors;
pub mod features;
pub mod hal;
pub mod metering;
pub mod orientation;
pub mod permissions;
pub mod service;
pub mod session;

// Re-export commonly used types
pub use config::Config;
pub use constants::ResolutionPreset;
pub use errors::{ControlError, ControlResult};
pub use features::{CaptureFeature, FeatureName, FeatureSet, FeatureValue};
pub use metering::{MeteringRegion, NormalizedPoint, PixelBoundary};
pub use orientation::{DeviceOrientation, OrientationReconciler};
pub use permissions::{Permission, PermissionGate, PermissionOutcome};
pub use service::{AddressedNotification, CameraService};
pub use session::{CaptureSessionController, SessionNotification, SessionState};
