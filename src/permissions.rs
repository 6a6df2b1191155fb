// SPDX-License-Identifier: GPL-3.0-only

//! Permission request serialization
//!
//! The platform permission subsystem answers one dialog at a time and is
//! allowed to deliver its result more than once. [`PermissionGate`]
//! serializes requests (at most one outstanding, no queueing) and
//! collapses duplicate result deliveries so the rest of the core sees
//! exactly one outcome per request.

use crate::errors::{ControlError, ControlResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Permission groups the camera core cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Permission {
    Camera,
    Microphone,
    Storage,
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Permission::Camera => "camera",
            Permission::Microphone => "microphone",
            Permission::Storage => "storage",
        };
        write!(f, "{}", name)
    }
}

/// Outcome of a permission request for a whole group
#[derive(Debug, Clone, PartialEq)]
pub enum PermissionOutcome {
    /// Every requested permission was granted
    Granted,
    /// At least one permission was refused; carries the first one missing
    Denied { missing: Permission },
}

/// Callback resolving one permission request
pub type PermissionCallback = Box<dyn FnOnce(PermissionOutcome) + Send>;

/// Platform permission subsystem, consumed read-mostly
///
/// `request` initiates the platform dialog; the result is delivered back
/// through [`PermissionGate::handle_result`] with the request id.
pub trait PermissionRequester: Send {
    /// Whether the permission is currently granted
    fn is_granted(&self, permission: Permission) -> bool;

    /// Issue the platform request for the group under the given id
    fn request(&mut self, request_id: u64, permissions: &[Permission]);
}

struct PendingRequest {
    request_id: u64,
    permissions: Vec<Permission>,
    callback: PermissionCallback,
}

/// Serializes permission requests: at most one outstanding at a time
pub struct PermissionGate {
    requester: Box<dyn PermissionRequester>,
    pending: Option<PendingRequest>,
    next_request_id: u64,
}

impl PermissionGate {
    pub fn new(requester: Box<dyn PermissionRequester>) -> Self {
        Self {
            requester,
            pending: None,
            next_request_id: 1,
        }
    }

    /// Whether the permission is currently granted
    pub fn is_granted(&self, permission: Permission) -> bool {
        self.requester.is_granted(permission)
    }

    /// Whether every permission in the group is currently granted
    pub fn all_granted(&self, permissions: &[Permission]) -> bool {
        permissions.iter().all(|p| self.is_granted(*p))
    }

    /// Request a permission group
    ///
    /// Fails immediately with `RequestOngoing` when a request is already
    /// outstanding; there is no queueing. Groups already fully granted
    /// resolve synchronously without touching the platform.
    pub fn request(
        &mut self,
        permissions: Vec<Permission>,
        callback: PermissionCallback,
    ) -> ControlResult<()> {
        if self.pending.is_some() {
            return Err(ControlError::RequestOngoing);
        }
        if permissions.iter().all(|p| self.requester.is_granted(*p)) {
            callback(PermissionOutcome::Granted);
            return Ok(());
        }

        let request_id = self.next_request_id;
        self.next_request_id += 1;

        debug!(request_id, ?permissions, "Requesting permissions");
        self.requester.request(request_id, &permissions);
        self.pending = Some(PendingRequest {
            request_id,
            permissions,
            callback,
        });
        Ok(())
    }

    /// Deliver a platform result
    ///
    /// Only the first delivery for the outstanding request id resolves
    /// it; duplicates and results for unknown ids are ignored.
    pub fn handle_result(&mut self, request_id: u64, granted: &[(Permission, bool)]) {
        let Some(pending) = self.pending.take_if(|p| p.request_id == request_id) else {
            warn!(request_id, "Ignoring stale or duplicate permission result");
            return;
        };

        let missing = pending.permissions.iter().copied().find(|permission| {
            !granted
                .iter()
                .any(|(p, ok)| p == permission && *ok)
        });

        let outcome = match missing {
            None => PermissionOutcome::Granted,
            Some(missing) => PermissionOutcome::Denied { missing },
        };
        debug!(request_id, ?outcome, "Permission request resolved");
        (pending.callback)(outcome);
    }

    /// Whether a request is currently outstanding
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl std::fmt::Debug for PermissionGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionGate")
            .field("pending", &self.pending.as_ref().map(|p| p.request_id))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;

    /// Requester that records issued requests and grants nothing up front
    struct FakeRequester {
        granted: Vec<Permission>,
        issued: Arc<AtomicUsize>,
    }

    impl PermissionRequester for FakeRequester {
        fn is_granted(&self, permission: Permission) -> bool {
            self.granted.contains(&permission)
        }

        fn request(&mut self, _request_id: u64, _permissions: &[Permission]) {
            self.issued.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn gate_with(granted: Vec<Permission>) -> (PermissionGate, Arc<AtomicUsize>) {
        let issued = Arc::new(AtomicUsize::new(0));
        let gate = PermissionGate::new(Box::new(FakeRequester {
            granted,
            issued: Arc::clone(&issued),
        }));
        (gate, issued)
    }

    #[test]
    fn second_request_while_outstanding_fails() {
        let (mut gate, _) = gate_with(vec![]);
        gate.request(vec![Permission::Camera], Box::new(|_| {})).unwrap();
        let err = gate
            .request(vec![Permission::Storage], Box::new(|_| {}))
            .unwrap_err();
        assert_eq!(err, ControlError::RequestOngoing);
    }

    #[test]
    fn duplicate_result_delivery_is_ignored() {
        let (mut gate, _) = gate_with(vec![]);
        let (tx, rx) = mpsc::channel();
        gate.request(
            vec![Permission::Camera],
            Box::new(move |outcome| tx.send(outcome).unwrap()),
        )
        .unwrap();

        gate.handle_result(1, &[(Permission::Camera, true)]);
        gate.handle_result(1, &[(Permission::Camera, false)]);

        assert_eq!(rx.try_recv().unwrap(), PermissionOutcome::Granted);
        assert!(rx.try_recv().is_err(), "only the first delivery may resolve");
        assert!(!gate.has_pending());
    }

    #[test]
    fn any_denial_denies_the_group_naming_the_missing_permission() {
        let (mut gate, _) = gate_with(vec![]);
        let (tx, rx) = mpsc::channel();
        gate.request(
            vec![Permission::Camera, Permission::Microphone],
            Box::new(move |outcome| tx.send(outcome).unwrap()),
        )
        .unwrap();

        gate.handle_result(1, &[(Permission::Camera, true), (Permission::Microphone, false)]);
        assert_eq!(
            rx.recv().unwrap(),
            PermissionOutcome::Denied {
                missing: Permission::Microphone
            }
        );
    }

    #[test]
    fn already_granted_group_resolves_without_platform_roundtrip() {
        let (mut gate, issued) = gate_with(vec![Permission::Camera]);
        let (tx, rx) = mpsc::channel();
        gate.request(
            vec![Permission::Camera],
            Box::new(move |outcome| tx.send(outcome).unwrap()),
        )
        .unwrap();

        assert_eq!(rx.recv().unwrap(), PermissionOutcome::Granted);
        assert_eq!(issued.load(Ordering::SeqCst), 0);
        assert!(!gate.has_pending());
    }

    #[test]
    fn result_for_unknown_id_is_ignored() {
        let (mut gate, _) = gate_with(vec![]);
        let (tx, rx) = mpsc::channel();
        gate.request(
            vec![Permission::Camera],
            Box::new(move |outcome| tx.send(outcome).unwrap()),
        )
        .unwrap();

        gate.handle_result(99, &[(Permission::Camera, true)]);
        assert!(rx.try_recv().is_err());
        assert!(gate.has_pending());
    }

    #[test]
    fn gate_is_reusable_after_resolution() {
        let (mut gate, _) = gate_with(vec![]);
        gate.request(vec![Permission::Camera], Box::new(|_| {})).unwrap();
        gate.handle_result(1, &[(Permission::Camera, false)]);
        // A new request is admitted once the previous one resolved
        gate.request(vec![Permission::Storage], Box::new(|_| {})).unwrap();
        assert!(gate.has_pending());
    }
}
