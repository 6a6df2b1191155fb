// SPDX-License-Identifier: GPL-3.0-only

//! Session arena and serialized event intake
//!
//! [`CameraService`] owns every live [`CaptureSessionController`], keyed
//! by the caller-supplied camera id, and enforces the one-session-per-id
//! invariant. It also owns the single event queue: hardware completions,
//! permission results and orientation readings are marshaled onto one
//! `tokio` channel and drained in order, so no controller ever sees two
//! things at once.

use crate::config::Config;
use crate::errors::{ControlError, ControlResult};
use crate::features::{FeatureName, FeatureValue};
use crate::hal::types::{HardwareEvent, OutputTarget};
use crate::hal::CameraHandle;
use crate::orientation::{DeviceOrientation, LayoutOrientation, UiRotation};
use crate::permissions::{Permission, PermissionRequester};
use crate::session::{
    CaptureSessionController, SessionEvent, SessionNotification, SessionState,
};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// A queued completion addressed to one session
#[derive(Debug)]
struct AddressedEvent {
    camera_id: String,
    event: SessionEvent,
}

/// A notification tagged with the session it came from
#[derive(Debug, Clone, PartialEq)]
pub struct AddressedNotification {
    pub camera_id: String,
    pub notification: SessionNotification,
}

/// Arena of capture sessions with a serialized event intake
pub struct CameraService {
    sessions: HashMap<String, CaptureSessionController>,
    events_tx: mpsc::UnboundedSender<AddressedEvent>,
    events_rx: mpsc::UnboundedReceiver<AddressedEvent>,
    notifications_tx: mpsc::UnboundedSender<AddressedNotification>,
}

impl CameraService {
    /// Create the service; the returned receiver carries every session's
    /// out-of-band notifications
    pub fn new() -> (Self, mpsc::UnboundedReceiver<AddressedNotification>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (notifications_tx, notifications_rx) = mpsc::unbounded_channel();
        let service = Self {
            sessions: HashMap::new(),
            events_tx,
            events_rx,
            notifications_tx,
        };
        (service, notifications_rx)
    }

    /// Open a camera, creating its session slot
    ///
    /// Fails with `AlreadyOpen` while a non-terminal session exists for
    /// the id; a slot left in `Closed` or `Error` is replaced.
    pub fn open(
        &mut self,
        camera_id: &str,
        handle: Box<dyn CameraHandle>,
        requester: Box<dyn PermissionRequester>,
        config: Config,
    ) -> ControlResult<()> {
        if let Some(existing) = self.sessions.get(camera_id)
            && existing.state().is_active()
        {
            return Err(ControlError::AlreadyOpen {
                camera_id: camera_id.to_string(),
            });
        }

        let intake = {
            let events_tx = self.events_tx.clone();
            let camera_id = camera_id.to_string();
            Arc::new(move |event: SessionEvent| {
                let _ = events_tx.send(AddressedEvent {
                    camera_id: camera_id.clone(),
                    event,
                });
            })
        };
        let notifier = {
            let notifications_tx = self.notifications_tx.clone();
            let camera_id = camera_id.to_string();
            Arc::new(move |notification: SessionNotification| {
                let _ = notifications_tx.send(AddressedNotification {
                    camera_id: camera_id.clone(),
                    notification,
                });
            })
        };

        let mut controller =
            CaptureSessionController::new(camera_id, handle, requester, config, intake, notifier);
        controller.open()?;
        self.sessions.insert(camera_id.to_string(), controller);
        info!(camera_id, sessions = self.sessions.len(), "Session created");
        Ok(())
    }

    /// Close a session and release its arena slot
    pub fn close(&mut self, camera_id: &str) -> ControlResult<()> {
        // Closing an unknown or already-released id is a no-op
        if let Some(mut controller) = self.sessions.remove(camera_id) {
            controller.close()?;
        }
        Ok(())
    }

    /// Marshal a hardware completion onto the serialized intake
    pub fn push_hardware_event(&self, camera_id: &str, event: HardwareEvent) {
        let _ = self.events_tx.send(AddressedEvent {
            camera_id: camera_id.to_string(),
            event: SessionEvent::Hardware(event),
        });
    }

    /// Deliver a platform permission result to a session's gate
    pub fn permission_result(
        &mut self,
        camera_id: &str,
        request_id: u64,
        results: &[(Permission, bool)],
    ) {
        if let Some(controller) = self.sessions.get_mut(camera_id) {
            controller.handle_permission_result(request_id, results);
        }
        self.drain();
    }

    /// Drain and dispatch every queued event in arrival order
    ///
    /// Sessions that ended up terminal are pruned from the arena so
    /// their id can be opened again.
    pub fn drain(&mut self) {
        while let Ok(AddressedEvent { camera_id, event }) = self.events_rx.try_recv() {
            let Some(controller) = self.sessions.get_mut(&camera_id) else {
                debug!(camera_id, "Dropping event for released session");
                continue;
            };
            controller.handle_event(event);
            if controller.state() == SessionState::Error {
                warn!(camera_id, "Pruning errored session");
                self.sessions.remove(&camera_id);
            }
        }
    }

    /// Serve the intake until the service is dropped
    ///
    /// The async flavor of [`Self::drain`] for embedders running the
    /// service on a task of its own.
    pub async fn run(&mut self) {
        while let Some(AddressedEvent { camera_id, event }) = self.events_rx.recv().await {
            let Some(controller) = self.sessions.get_mut(&camera_id) else {
                debug!(camera_id, "Dropping event for released session");
                continue;
            };
            controller.handle_event(event);
            if controller.state() == SessionState::Error {
                warn!(camera_id, "Pruning errored session");
                self.sessions.remove(&camera_id);
            }
        }
    }

    /// Current state of a session, if the id has one
    pub fn session_state(&self, camera_id: &str) -> Option<SessionState> {
        self.sessions.get(camera_id).map(|c| c.state())
    }

    /// Number of live arena slots
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    // ===== Intent passthroughs =====

    pub fn configure_session(
        &mut self,
        camera_id: &str,
        outputs: Option<Vec<OutputTarget>>,
    ) -> ControlResult<()> {
        let controller = self.controller_mut(camera_id)?;
        let outputs = outputs.unwrap_or_else(|| controller.default_outputs());
        controller.configure_session(&outputs)
    }

    pub fn start_preview(&mut self, camera_id: &str) -> ControlResult<()> {
        self.controller_mut(camera_id)?.start_preview()
    }

    pub fn set_feature(
        &mut self,
        camera_id: &str,
        name: FeatureName,
        value: FeatureValue,
    ) -> ControlResult<()> {
        self.controller_mut(camera_id)?.set_feature(name, value)
    }

    pub fn set_feature_named(
        &mut self,
        camera_id: &str,
        name: &str,
        value: FeatureValue,
    ) -> ControlResult<()> {
        self.controller_mut(camera_id)?.set_feature_named(name, value)
    }

    pub fn capture_still(
        &mut self,
        camera_id: &str,
        output_path: Option<PathBuf>,
    ) -> ControlResult<()> {
        self.controller_mut(camera_id)?.capture_still(output_path)
    }

    pub fn pause_preview(&mut self, camera_id: &str) -> ControlResult<()> {
        self.controller_mut(camera_id)?.pause_preview()
    }

    pub fn resume_preview(&mut self, camera_id: &str) -> ControlResult<()> {
        self.controller_mut(camera_id)?.resume_preview()
    }

    pub fn lock_capture_orientation(
        &mut self,
        camera_id: &str,
        orientation: DeviceOrientation,
    ) -> ControlResult<()> {
        self.controller_mut(camera_id)?
            .lock_capture_orientation(orientation)
    }

    pub fn unlock_capture_orientation(&mut self, camera_id: &str) -> ControlResult<()> {
        self.controller_mut(camera_id)?.unlock_capture_orientation()
    }

    // ===== Orientation producers =====

    /// Feed an accelerometer reading to a session's reconciler
    pub fn sensor_angle(&mut self, camera_id: &str, angle_degrees: i32) {
        if let Some(features) = self
            .sessions
            .get_mut(camera_id)
            .and_then(|c| c.features_mut())
        {
            features
                .sensor_orientation_mut()
                .reconciler_mut()
                .handle_sensor_angle(angle_degrees);
        }
    }

    /// Feed a UI rotation reading to a session's reconciler
    pub fn ui_rotation(
        &mut self,
        camera_id: &str,
        rotation: UiRotation,
        layout: LayoutOrientation,
    ) {
        if let Some(features) = self
            .sessions
            .get_mut(camera_id)
            .and_then(|c| c.features_mut())
        {
            features
                .sensor_orientation_mut()
                .reconciler_mut()
                .handle_ui_rotation(rotation, layout);
        }
    }

    /// Update the environment's rotation-lock gate for a session
    pub fn set_rotation_locked(&mut self, camera_id: &str, locked: bool) {
        if let Some(features) = self
            .sessions
            .get_mut(camera_id)
            .and_then(|c| c.features_mut())
        {
            features
                .sensor_orientation_mut()
                .reconciler_mut()
                .set_rotation_locked(locked);
        }
    }

    fn controller_mut(&mut self, camera_id: &str) -> ControlResult<&mut CaptureSessionController> {
        self.sessions
            .get_mut(camera_id)
            .ok_or_else(|| ControlError::InvalidState {
                operation: "address session",
                state: SessionState::Closed,
            })
    }
}

impl std::fmt::Debug for CameraService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraService")
            .field("sessions", &self.sessions.len())
            .finish()
    }
}
