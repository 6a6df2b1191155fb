// SPDX-License-Identifier: GPL-3.0-only

//! Capture session state machine
//!
//! One [`CaptureSessionController`] drives one logical "camera turned on"
//! lifecycle. Caller intents and hardware completions both funnel into
//! it; the transition table here is the single source of truth for what
//! is legal next.
//!
//! The controller has no internal locking. Callers must serialize
//! intents, and hardware callbacks must be marshaled onto the same
//! execution context as intents before touching controller state —
//! [`crate::service::CameraService`] provides that serialized intake.

use crate::config::Config;
use crate::errors::{ControlError, ControlResult};
use crate::features::{FeatureName, FeatureSet, FeatureValue};
use crate::hal::request::{CaptureRequest, CaptureRequestBuilder};
use crate::hal::types::{HardwareEvent, OutputTarget, RequestTemplate, TargetPurpose};
use crate::hal::CameraHandle;
use crate::orientation::DeviceOrientation;
use crate::permissions::{Permission, PermissionGate, PermissionOutcome, PermissionRequester};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Session lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No hardware held; the only state `open` is legal from
    Closed,
    /// Waiting on the camera permission group
    PermissionPending,
    /// Device open requested, waiting for the hardware callback
    Opening,
    /// Device open, characteristics captured, no session configured yet
    Open,
    /// Output configuration submitted, waiting for confirmation
    ConfiguringSession,
    /// Session configured; preview not yet running
    SessionReady,
    /// Repeating request active
    Previewing,
    /// One still capture pending completion
    StillCaptureInFlight,
    /// Terminal hardware or permission failure; caller must open again
    Error,
}

impl SessionState {
    /// Whether the session still holds (or is acquiring) hardware
    pub fn is_active(&self) -> bool {
        !matches!(self, SessionState::Closed | SessionState::Error)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionState::Closed => "closed",
            SessionState::PermissionPending => "waiting for permissions",
            SessionState::Opening => "opening",
            SessionState::Open => "open",
            SessionState::ConfiguringSession => "configuring",
            SessionState::SessionReady => "ready",
            SessionState::Previewing => "previewing",
            SessionState::StillCaptureInFlight => "capturing",
            SessionState::Error => "errored",
        };
        write!(f, "{}", name)
    }
}

/// Completions delivered into the controller through the serialized
/// intake
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Camera permission group resolved (open flow)
    Permission(PermissionOutcome),
    /// Storage permission group resolved (still-capture flow)
    StoragePermission(PermissionOutcome),
    /// Hardware completion
    Hardware(HardwareEvent),
}

/// Out-of-band notifications for the embedding layer
#[derive(Debug, Clone, PartialEq)]
pub enum SessionNotification {
    /// Device opened and features constructed
    Initialized { camera_id: String },
    /// Reconciled device orientation changed
    OrientationChanged { orientation: DeviceOrientation },
    /// Repeating request stopped on request
    PreviewPaused,
    /// Repeating request re-issued
    PreviewResumed,
    /// Still capture persisted
    StillCaptured { path: PathBuf },
    /// Still capture failed; the session stays usable
    StillCaptureFailed { message: String },
    /// Terminal failure; carries the bridge `(code, message)` pair
    SessionError { code: &'static str, message: String },
    /// Session released its resources
    Closed,
}

/// Where controller-bound completions are sent
pub type EventSink = Arc<dyn Fn(SessionEvent) + Send + Sync>;

/// Where embedder-bound notifications are sent
pub type NotificationSink = Arc<dyn Fn(SessionNotification) + Send + Sync>;

struct PendingStill {
    output_path: PathBuf,
    /// Still waiting on the storage permission group; no hardware
    /// request has been issued yet
    awaiting_permission: bool,
}

/// The top-level capture state machine
pub struct CaptureSessionController {
    camera_id: String,
    state: SessionState,
    handle: Box<dyn CameraHandle>,
    gate: PermissionGate,
    config: Config,
    /// Built once from the characteristics snapshot at device open
    features: Option<FeatureSet>,
    pending_still: Option<PendingStill>,
    preview_paused: bool,
    intake: EventSink,
    notifier: NotificationSink,
}

impl CaptureSessionController {
    pub fn new(
        camera_id: impl Into<String>,
        handle: Box<dyn CameraHandle>,
        requester: Box<dyn PermissionRequester>,
        config: Config,
        intake: EventSink,
        notifier: NotificationSink,
    ) -> Self {
        Self {
            camera_id: camera_id.into(),
            state: SessionState::Closed,
            handle,
            gate: PermissionGate::new(requester),
            config,
            features: None,
            pending_still: None,
            preview_paused: false,
            intake,
            notifier,
        }
    }

    pub fn camera_id(&self) -> &str {
        &self.camera_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The feature set, once the device has opened
    pub fn features(&self) -> Option<&FeatureSet> {
        self.features.as_ref()
    }

    /// Mutable feature access for orientation producer plumbing
    pub fn features_mut(&mut self) -> Option<&mut FeatureSet> {
        self.features.as_mut()
    }

    // ===== Intents =====

    /// Request the camera permission group and begin opening the device
    pub fn open(&mut self) -> ControlResult<()> {
        if self.state != SessionState::Closed {
            return Err(ControlError::AlreadyOpen {
                camera_id: self.camera_id.clone(),
            });
        }

        let mut permissions = vec![Permission::Camera];
        if self.config.enable_audio {
            permissions.push(Permission::Microphone);
        }

        info!(camera_id = %self.camera_id, "Opening camera");
        self.state = SessionState::PermissionPending;

        let intake = Arc::clone(&self.intake);
        let result = self.gate.request(
            permissions,
            Box::new(move |outcome| intake(SessionEvent::Permission(outcome))),
        );
        if let Err(err) = result {
            self.state = SessionState::Closed;
            return Err(err);
        }
        Ok(())
    }

    /// Configure the capture session's output streams
    ///
    /// Valid only once the device is open and before any session exists.
    pub fn configure_session(&mut self, outputs: &[OutputTarget]) -> ControlResult<()> {
        if self.state != SessionState::Open {
            return Err(ControlError::InvalidState {
                operation: "configure session",
                state: self.state,
            });
        }
        debug!(camera_id = %self.camera_id, targets = outputs.len(), "Configuring session");
        self.state = SessionState::ConfiguringSession;
        if let Err(err) = self.handle.configure_session(outputs) {
            self.fail_with(err.clone());
            return Err(err);
        }
        Ok(())
    }

    /// Default output targets derived from the resolution feature
    pub fn default_outputs(&self) -> Vec<OutputTarget> {
        let Some(features) = self.features.as_ref() else {
            return Vec::new();
        };
        let (preview_w, preview_h) = features.resolution().preview_size();
        let (capture_w, capture_h) = features.resolution().capture_size();
        vec![
            OutputTarget::new(TargetPurpose::Preview, preview_w, preview_h),
            OutputTarget::new(TargetPurpose::StillCapture, capture_w, capture_h),
        ]
    }

    /// Issue the repeating request driving the live preview
    pub fn start_preview(&mut self) -> ControlResult<()> {
        if self.state != SessionState::SessionReady {
            return Err(ControlError::InvalidState {
                operation: "start preview",
                state: self.state,
            });
        }
        let request = self.compose_request(RequestTemplate::Preview);
        if let Err(err) = self.handle.set_repeating_request(request) {
            self.fail_with(err.clone());
            return Err(err);
        }
        info!(camera_id = %self.camera_id, "Preview started");
        self.state = SessionState::Previewing;
        self.preview_paused = false;
        Ok(())
    }

    /// Update a feature and, while previewing, re-issue the repeating
    /// request with the new composed controls
    pub fn set_feature(&mut self, name: FeatureName, value: FeatureValue) -> ControlResult<()> {
        if !matches!(
            self.state,
            SessionState::SessionReady | SessionState::Previewing
        ) {
            return Err(ControlError::InvalidState {
                operation: "set feature",
                state: self.state,
            });
        }
        let features = self
            .features
            .as_mut()
            .expect("features exist in ready states");
        features.set_value(name, value)?;
        debug!(camera_id = %self.camera_id, feature = %name, "Feature updated");

        if self.state == SessionState::Previewing && !self.preview_paused {
            let request = self.compose_request(RequestTemplate::Preview);
            if let Err(err) = self.handle.set_repeating_request(request) {
                self.fail_with(err.clone());
                return Err(err);
            }
        }
        Ok(())
    }

    /// Update a feature addressed by its bridge wire name
    pub fn set_feature_named(&mut self, name: &str, value: FeatureValue) -> ControlResult<()> {
        let Some(name) = FeatureName::from_name(name) else {
            return Err(ControlError::UnknownFeature(name.to_string()));
        };
        self.set_feature(name, value)
    }

    /// Take a still picture
    ///
    /// Locks the orientation tag for the duration of the capture. When
    /// storage permission is required and missing, the capture first
    /// routes through the permission gate and no hardware request is
    /// issued until it resolves.
    pub fn capture_still(&mut self, output_path: Option<PathBuf>) -> ControlResult<()> {
        if self.state != SessionState::Previewing {
            return Err(ControlError::InvalidState {
                operation: "capture still",
                state: self.state,
            });
        }
        if self.pending_still.is_some() {
            return Err(ControlError::CaptureAlreadyInFlight);
        }
        let output_path = output_path.unwrap_or_else(|| self.config.default_photo_path());

        if self.config.requires_storage_permission && !self.gate.is_granted(Permission::Storage) {
            let intake = Arc::clone(&self.intake);
            self.gate.request(
                vec![Permission::Storage],
                Box::new(move |outcome| intake(SessionEvent::StoragePermission(outcome))),
            )?;
            self.pending_still = Some(PendingStill {
                output_path,
                awaiting_permission: true,
            });
            return Ok(());
        }

        self.issue_still_capture(output_path)
    }

    /// Stop the repeating request without tearing the session down
    pub fn pause_preview(&mut self) -> ControlResult<()> {
        if self.state != SessionState::Previewing {
            return Err(ControlError::InvalidState {
                operation: "pause preview",
                state: self.state,
            });
        }
        if self.preview_paused {
            return Ok(());
        }
        if let Err(err) = self.handle.stop_repeating() {
            self.fail_with(err.clone());
            return Err(err);
        }
        self.preview_paused = true;
        self.notify(SessionNotification::PreviewPaused);
        Ok(())
    }

    /// Re-issue the repeating request with the current composed controls
    pub fn resume_preview(&mut self) -> ControlResult<()> {
        if self.state != SessionState::Previewing {
            return Err(ControlError::InvalidState {
                operation: "resume preview",
                state: self.state,
            });
        }
        if !self.preview_paused {
            return Ok(());
        }
        let request = self.compose_request(RequestTemplate::Preview);
        if let Err(err) = self.handle.set_repeating_request(request) {
            self.fail_with(err.clone());
            return Err(err);
        }
        self.preview_paused = false;
        self.notify(SessionNotification::PreviewResumed);
        Ok(())
    }

    /// Pin the orientation tag independent of device rotation
    pub fn lock_capture_orientation(
        &mut self,
        orientation: DeviceOrientation,
    ) -> ControlResult<()> {
        let Some(features) = self.features.as_mut() else {
            return Err(ControlError::InvalidState {
                operation: "lock capture orientation",
                state: self.state,
            });
        };
        features.sensor_orientation_mut().lock(orientation);
        Ok(())
    }

    /// Release an explicit orientation pin
    pub fn unlock_capture_orientation(&mut self) -> ControlResult<()> {
        let Some(features) = self.features.as_mut() else {
            return Err(ControlError::InvalidState {
                operation: "unlock capture orientation",
                state: self.state,
            });
        };
        features.sensor_orientation_mut().unlock();
        Ok(())
    }

    /// Release all hardware and tracking resources
    ///
    /// Valid from any state and idempotent: closing a closed session is
    /// a no-op, not an error.
    pub fn close(&mut self) -> ControlResult<()> {
        if self.state == SessionState::Closed {
            return Ok(());
        }
        info!(camera_id = %self.camera_id, state = %self.state, "Closing camera");

        if self.state == SessionState::Previewing && !self.preview_paused {
            // Best effort; the device is going away regardless
            let _ = self.handle.stop_repeating();
        }
        self.handle.close();
        self.release_tracking();
        self.pending_still = None;
        self.preview_paused = false;
        self.state = SessionState::Closed;
        self.notify(SessionNotification::Closed);
        Ok(())
    }

    // ===== Completions =====

    /// Feed one completion from the serialized intake
    pub fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Permission(outcome) => self.on_open_permission(outcome),
            SessionEvent::StoragePermission(outcome) => self.on_storage_permission(outcome),
            SessionEvent::Hardware(event) => self.on_hardware_event(event),
        }
    }

    /// Deliver a platform permission result to this session's gate
    pub fn handle_permission_result(&mut self, request_id: u64, results: &[(Permission, bool)]) {
        self.gate.handle_result(request_id, results);
    }

    fn on_open_permission(&mut self, outcome: PermissionOutcome) {
        if self.state != SessionState::PermissionPending {
            warn!(camera_id = %self.camera_id, state = %self.state, "Stray permission result");
            return;
        }
        match outcome {
            PermissionOutcome::Granted => {
                self.state = SessionState::Opening;
                if let Err(err) = self.handle.open() {
                    self.fail_with(err);
                }
            }
            PermissionOutcome::Denied { missing } => {
                warn!(camera_id = %self.camera_id, missing = %missing, "Camera permission denied");
                let err = ControlError::PermissionDenied {
                    permission: missing,
                };
                self.state = SessionState::Error;
                self.notify(SessionNotification::SessionError {
                    code: err.code(),
                    message: err.to_string(),
                });
            }
        }
    }

    fn on_storage_permission(&mut self, outcome: PermissionOutcome) {
        let Some(pending) = self
            .pending_still
            .take_if(|p| p.awaiting_permission)
        else {
            warn!(camera_id = %self.camera_id, "Stray storage permission result");
            return;
        };
        if self.state != SessionState::Previewing {
            return;
        }
        match outcome {
            PermissionOutcome::Granted => {
                if let Err(err) = self.issue_still_capture(pending.output_path) {
                    self.notify(SessionNotification::StillCaptureFailed {
                        message: err.to_string(),
                    });
                }
            }
            PermissionOutcome::Denied { missing } => {
                let err = ControlError::PermissionDenied {
                    permission: missing,
                };
                self.notify(SessionNotification::SessionError {
                    code: err.code(),
                    message: err.to_string(),
                });
            }
        }
    }

    fn on_hardware_event(&mut self, event: HardwareEvent) {
        match event {
            HardwareEvent::Opened { characteristics } => {
                if self.state != SessionState::Opening {
                    warn!(camera_id = %self.camera_id, state = %self.state, "Stray device-open callback");
                    return;
                }
                info!(
                    camera_id = %self.camera_id,
                    facing = ?characteristics.lens_facing,
                    sensor_degrees = characteristics.sensor_orientation_degrees,
                    "Camera opened"
                );
                let mut features = FeatureSet::from_characteristics(
                    &characteristics,
                    self.config.resolution_preset,
                    self.config.natural_orientation,
                );
                let notifier = Arc::clone(&self.notifier);
                features
                    .sensor_orientation_mut()
                    .reconciler_mut()
                    .start(Box::new(move |orientation| {
                        notifier(SessionNotification::OrientationChanged { orientation });
                    }));
                self.features = Some(features);
                self.state = SessionState::Open;
                self.notify(SessionNotification::Initialized {
                    camera_id: self.camera_id.clone(),
                });
            }
            HardwareEvent::OpenFailed { message } | HardwareEvent::Disconnected { message } => {
                self.fail_with(ControlError::HardwareUnavailable(message));
            }
            HardwareEvent::SessionConfigured => {
                if self.state != SessionState::ConfiguringSession {
                    warn!(camera_id = %self.camera_id, state = %self.state, "Stray configure callback");
                    return;
                }
                debug!(camera_id = %self.camera_id, "Session configured");
                self.state = SessionState::SessionReady;
            }
            HardwareEvent::SessionConfigureFailed { message } => {
                self.fail_with(ControlError::HardwareUnavailable(message));
            }
            HardwareEvent::CaptureCompleted { path } => {
                self.finish_still_capture();
                self.notify(SessionNotification::StillCaptured { path });
            }
            HardwareEvent::CaptureFailed { message } => {
                self.finish_still_capture();
                self.notify(SessionNotification::StillCaptureFailed { message });
            }
        }
    }

    // ===== Internals =====

    fn issue_still_capture(&mut self, output_path: PathBuf) -> ControlResult<()> {
        // Pin the orientation so rotation mid-capture cannot alter the
        // already-issued request's tag
        let features = self
            .features
            .as_mut()
            .expect("features exist while previewing");
        let current = features.sensor_orientation().reconciler().last_orientation();
        features.sensor_orientation_mut().lock(current);

        let request = self.compose_request(RequestTemplate::StillCapture);
        debug!(camera_id = %self.camera_id, path = %output_path.display(), "Issuing still capture");
        if let Err(err) = self.handle.capture(request, &output_path) {
            self.unlock_orientation();
            self.fail_with(err.clone());
            return Err(err);
        }
        self.pending_still = Some(PendingStill {
            output_path,
            awaiting_permission: false,
        });
        self.state = SessionState::StillCaptureInFlight;
        Ok(())
    }

    fn finish_still_capture(&mut self) {
        if self.state != SessionState::StillCaptureInFlight {
            warn!(camera_id = %self.camera_id, state = %self.state, "Stray capture callback");
            return;
        }
        self.pending_still = None;
        self.unlock_orientation();
        self.state = SessionState::Previewing;
    }

    fn unlock_orientation(&mut self) {
        if let Some(features) = self.features.as_mut() {
            features.sensor_orientation_mut().unlock();
        }
    }

    fn compose_request(&self, template: RequestTemplate) -> CaptureRequest {
        let mut builder = CaptureRequestBuilder::new(template);
        if let Some(features) = self.features.as_ref() {
            features.update_builder(&mut builder);
        }
        builder.build()
    }

    fn release_tracking(&mut self) {
        if let Some(features) = self.features.as_mut() {
            features.sensor_orientation_mut().reconciler_mut().stop();
        }
    }

    /// Terminal hardware failure: release everything and report
    fn fail_with(&mut self, err: ControlError) {
        error!(camera_id = %self.camera_id, state = %self.state, error = %err, "Session failed");
        let _ = self.handle.stop_repeating();
        self.handle.close();
        self.release_tracking();
        self.pending_still = None;
        self.preview_paused = false;
        self.state = SessionState::Error;
        self.notify(SessionNotification::SessionError {
            code: err.code(),
            message: err.to_string(),
        });
    }

    fn notify(&self, notification: SessionNotification) {
        (self.notifier)(notification);
    }
}

impl std::fmt::Debug for CaptureSessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureSessionController")
            .field("camera_id", &self.camera_id)
            .field("state", &self.state)
            .field("pending_still", &self.pending_still.is_some())
            .field("preview_paused", &self.preview_paused)
            .finish()
    }
}
