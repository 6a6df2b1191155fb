// SPDX-License-Identifier: MPL-2.0

//! Integration tests for the capture session state machine

use shutter::config::Config;
use shutter::errors::{ControlError, ControlResult};
use shutter::features::{FeatureName, FeatureValue};
use shutter::hal::request::{CaptureRequest, ControlKey, ControlValue};
use shutter::hal::types::{
    AfModeValue, CameraCharacteristics, FpsRange, HardwareEvent, LensFacing, NoiseReductionMode,
    OutputTarget,
};
use shutter::hal::CameraHandle;
use shutter::metering::PixelBoundary;
use shutter::permissions::{Permission, PermissionRequester};
use shutter::service::{AddressedNotification, CameraService};
use shutter::session::{SessionNotification, SessionState};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::UnboundedReceiver;

/// Calls recorded by the fake hardware handle
#[derive(Debug, Clone, PartialEq)]
enum HandleCall {
    Open,
    Configure(usize),
    Repeating(CaptureRequest),
    StopRepeating,
    Capture(CaptureRequest, PathBuf),
    Close,
}

#[derive(Clone)]
struct FakeHandle {
    camera_id: String,
    log: Arc<Mutex<Vec<HandleCall>>>,
}

impl FakeHandle {
    fn new(camera_id: &str) -> (Self, Arc<Mutex<Vec<HandleCall>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                camera_id: camera_id.to_string(),
                log: Arc::clone(&log),
            },
            log,
        )
    }
}

impl CameraHandle for FakeHandle {
    fn camera_id(&self) -> &str {
        &self.camera_id
    }

    fn open(&mut self) -> ControlResult<()> {
        self.log.lock().unwrap().push(HandleCall::Open);
        Ok(())
    }

    fn configure_session(&mut self, outputs: &[OutputTarget]) -> ControlResult<()> {
        self.log
            .lock()
            .unwrap()
            .push(HandleCall::Configure(outputs.len()));
        Ok(())
    }

    fn set_repeating_request(&mut self, request: CaptureRequest) -> ControlResult<()> {
        self.log.lock().unwrap().push(HandleCall::Repeating(request));
        Ok(())
    }

    fn stop_repeating(&mut self) -> ControlResult<()> {
        self.log.lock().unwrap().push(HandleCall::StopRepeating);
        Ok(())
    }

    fn capture(&mut self, request: CaptureRequest, output_path: &Path) -> ControlResult<()> {
        self.log
            .lock()
            .unwrap()
            .push(HandleCall::Capture(request, output_path.to_path_buf()));
        Ok(())
    }

    fn close(&mut self) {
        self.log.lock().unwrap().push(HandleCall::Close);
    }
}

/// Permission subsystem fake with a configurable granted set
struct FakeRequester {
    granted: Vec<Permission>,
    issued: Arc<Mutex<Vec<(u64, Vec<Permission>)>>>,
}

impl FakeRequester {
    fn new(granted: Vec<Permission>) -> (Self, Arc<Mutex<Vec<(u64, Vec<Permission>)>>>) {
        let issued = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                granted,
                issued: Arc::clone(&issued),
            },
            issued,
        )
    }
}

impl PermissionRequester for FakeRequester {
    fn is_granted(&self, permission: Permission) -> bool {
        self.granted.contains(&permission)
    }

    fn request(&mut self, request_id: u64, permissions: &[Permission]) {
        self.issued
            .lock()
            .unwrap()
            .push((request_id, permissions.to_vec()));
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn characteristics() -> CameraCharacteristics {
    CameraCharacteristics {
        lens_facing: LensFacing::Back,
        sensor_orientation_degrees: 90,
        af_modes: vec![AfModeValue::Auto, AfModeValue::ContinuousPicture],
        min_focus_distance: 0.1,
        exposure_compensation_range: (-12, 12),
        exposure_compensation_step: 1.0 / 6.0,
        flash_available: true,
        fps_ranges: vec![FpsRange::new(15, 30), FpsRange::new(30, 30)],
        max_zoom: 4.0,
        sensor_boundary: PixelBoundary::new(4000, 3000).unwrap(),
        max_af_regions: 1,
        max_ae_regions: 1,
        noise_reduction_modes: vec![NoiseReductionMode::Fast, NoiseReductionMode::Off],
    }
}

struct Harness {
    service: CameraService,
    notifications: UnboundedReceiver<AddressedNotification>,
    handle_log: Arc<Mutex<Vec<HandleCall>>>,
    issued: Arc<Mutex<Vec<(u64, Vec<Permission>)>>>,
}

impl Harness {
    /// Open camera "0" with the camera permission pre-granted
    fn open(config: Config) -> Self {
        Self::open_with(config, vec![Permission::Camera])
    }

    fn open_with(config: Config, granted: Vec<Permission>) -> Self {
        init_tracing();
        let (service, notifications) = CameraService::new();
        let mut harness = Harness {
            service,
            notifications,
            handle_log: Arc::new(Mutex::new(Vec::new())),
            issued: Arc::new(Mutex::new(Vec::new())),
        };
        harness.open_camera("0", granted, config);
        harness
    }

    fn open_camera(&mut self, camera_id: &str, granted: Vec<Permission>, config: Config) {
        let (handle, log) = FakeHandle::new(camera_id);
        let (requester, issued) = FakeRequester::new(granted);
        self.handle_log = log;
        self.issued = issued;
        self.service
            .open(camera_id, Box::new(handle), Box::new(requester), config)
            .unwrap();
        self.service.drain();
    }

    /// Drive camera "0" from fresh open to Previewing
    fn to_previewing(&mut self) {
        self.service
            .push_hardware_event("0", HardwareEvent::Opened {
                characteristics: characteristics(),
            });
        self.service.drain();
        self.service.configure_session("0", None).unwrap();
        self.service
            .push_hardware_event("0", HardwareEvent::SessionConfigured);
        self.service.drain();
        self.service.start_preview("0").unwrap();
    }

    fn state(&self) -> Option<SessionState> {
        self.service.session_state("0")
    }

    fn calls(&self) -> Vec<HandleCall> {
        self.handle_log.lock().unwrap().clone()
    }

    fn capture_calls(&self) -> Vec<(CaptureRequest, PathBuf)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                HandleCall::Capture(request, path) => Some((request, path)),
                _ => None,
            })
            .collect()
    }

    fn notifications(&mut self) -> Vec<SessionNotification> {
        let mut out = Vec::new();
        while let Ok(addressed) = self.notifications.try_recv() {
            out.push(addressed.notification);
        }
        out
    }
}

#[test]
fn lifecycle_reaches_previewing_with_composed_controls() {
    let mut harness = Harness::open(Config::default());
    assert_eq!(harness.state(), Some(SessionState::Opening));
    assert_eq!(harness.calls(), vec![HandleCall::Open]);

    harness.to_previewing();
    assert_eq!(harness.state(), Some(SessionState::Previewing));
    assert!(harness
        .notifications()
        .contains(&SessionNotification::Initialized {
            camera_id: "0".to_string()
        }));

    let calls = harness.calls();
    // Preview + still-capture targets derived from the resolution preset
    assert!(calls.contains(&HandleCall::Configure(2)));
    let Some(HandleCall::Repeating(request)) = calls.last() else {
        panic!("expected a repeating request, got {:?}", calls.last());
    };
    // The composed request carries every supported feature's controls
    assert_eq!(
        request.get(ControlKey::AfMode),
        Some(&ControlValue::Af(AfModeValue::ContinuousPicture))
    );
    assert_eq!(
        request.get(ControlKey::AeTargetFpsRange),
        Some(&ControlValue::Fps(FpsRange::new(30, 30)))
    );
    assert_eq!(request.get(ControlKey::AeLock), Some(&ControlValue::Bool(false)));
    // Sensor mounted at 90 degrees, device upright
    assert_eq!(
        request.get(ControlKey::JpegOrientation),
        Some(&ControlValue::Int32(90))
    );
}

#[test]
fn opening_the_same_id_twice_fails() {
    let mut harness = Harness::open(Config::default());
    let (handle, _) = FakeHandle::new("0");
    let (requester, _) = FakeRequester::new(vec![Permission::Camera]);
    let err = harness
        .service
        .open("0", Box::new(handle), Box::new(requester), Config::default())
        .unwrap_err();
    assert_eq!(
        err,
        ControlError::AlreadyOpen {
            camera_id: "0".to_string()
        }
    );

    // A different id gets its own arena slot
    let (handle, _) = FakeHandle::new("1");
    let (requester, _) = FakeRequester::new(vec![Permission::Camera]);
    harness
        .service
        .open("1", Box::new(handle), Box::new(requester), Config::default())
        .unwrap();
    assert_eq!(harness.service.session_count(), 2);
}

#[test]
fn concurrent_still_capture_is_rejected_without_hardware_request() {
    let mut harness = Harness::open(Config::default());
    harness.to_previewing();

    harness
        .service
        .capture_still("0", Some(PathBuf::from("/tmp/a.jpg")))
        .unwrap();
    assert_eq!(harness.state(), Some(SessionState::StillCaptureInFlight));

    let err = harness
        .service
        .capture_still("0", Some(PathBuf::from("/tmp/b.jpg")))
        .unwrap_err();
    assert_eq!(err, ControlError::CaptureAlreadyInFlight);
    assert_eq!(harness.capture_calls().len(), 1, "no second hardware request");

    harness.service.push_hardware_event("0", HardwareEvent::CaptureCompleted {
        path: PathBuf::from("/tmp/a.jpg"),
    });
    harness.service.drain();
    assert_eq!(harness.state(), Some(SessionState::Previewing));
    assert!(harness
        .notifications()
        .contains(&SessionNotification::StillCaptured {
            path: PathBuf::from("/tmp/a.jpg")
        }));

    // Completion clears the guard
    harness
        .service
        .capture_still("0", Some(PathBuf::from("/tmp/c.jpg")))
        .unwrap();
    assert_eq!(harness.capture_calls().len(), 2);
}

#[test]
fn still_capture_orientation_survives_mid_capture_rotation() {
    let mut harness = Harness::open(Config::default());
    harness.to_previewing();

    // Device held upright when the shutter fires
    harness.service.sensor_angle("0", 0);
    harness
        .service
        .capture_still("0", Some(PathBuf::from("/tmp/a.jpg")))
        .unwrap();

    let (request, _) = harness.capture_calls().pop().unwrap();
    assert_eq!(
        request.get(ControlKey::JpegOrientation),
        Some(&ControlValue::Int32(90))
    );

    // Rotating mid-flight must not alter the issued tag
    harness.service.sensor_angle("0", 90);
    let (request, _) = harness.capture_calls().pop().unwrap();
    assert_eq!(
        request.get(ControlKey::JpegOrientation),
        Some(&ControlValue::Int32(90))
    );

    harness.service.push_hardware_event("0", HardwareEvent::CaptureCompleted {
        path: PathBuf::from("/tmp/a.jpg"),
    });
    harness.service.drain();

    // After completion the lock is released and the next capture tags
    // with the live orientation (landscape-left: 90 + 90)
    harness
        .service
        .capture_still("0", Some(PathBuf::from("/tmp/b.jpg")))
        .unwrap();
    let (request, _) = harness.capture_calls().pop().unwrap();
    assert_eq!(
        request.get(ControlKey::JpegOrientation),
        Some(&ControlValue::Int32(180))
    );
}

#[test]
fn storage_permission_denial_aborts_the_capture() {
    let config = Config {
        requires_storage_permission: true,
        ..Config::default()
    };
    let mut harness = Harness::open(config);
    harness.to_previewing();

    harness
        .service
        .capture_still("0", Some(PathBuf::from("/tmp/a.jpg")))
        .unwrap();
    // Awaiting the storage group: nothing issued yet
    assert!(harness.capture_calls().is_empty());
    let (request_id, permissions) = harness.issued.lock().unwrap().last().unwrap().clone();
    assert_eq!(permissions, vec![Permission::Storage]);

    harness
        .service
        .permission_result("0", request_id, &[(Permission::Storage, false)]);
    assert!(harness.capture_calls().is_empty(), "denied capture must not touch hardware");
    assert!(harness.notifications().iter().any(|n| matches!(
        n,
        SessionNotification::SessionError {
            code: "PermissionDenied",
            ..
        }
    )));

    // The guard is released: a new capture goes back through the gate
    harness
        .service
        .capture_still("0", Some(PathBuf::from("/tmp/b.jpg")))
        .unwrap();
    let (request_id, _) = harness.issued.lock().unwrap().last().unwrap().clone();
    harness
        .service
        .permission_result("0", request_id, &[(Permission::Storage, true)]);
    assert_eq!(harness.capture_calls().len(), 1);
    assert_eq!(harness.state(), Some(SessionState::StillCaptureInFlight));
}

#[test]
fn hardware_disconnect_is_terminal_and_frees_the_slot() {
    let mut harness = Harness::open(Config::default());
    harness.to_previewing();

    harness.service.push_hardware_event("0", HardwareEvent::Disconnected {
        message: "device yanked".to_string(),
    });
    harness.service.drain();

    assert_eq!(harness.state(), None, "errored session is pruned");
    assert!(harness.calls().contains(&HandleCall::Close));
    assert!(harness.notifications().iter().any(|n| matches!(
        n,
        SessionNotification::SessionError {
            code: "HardwareUnavailable",
            ..
        }
    )));

    // The id can be opened again with a fresh handle
    harness.open_camera("0", vec![Permission::Camera], Config::default());
    assert_eq!(harness.state(), Some(SessionState::Opening));
}

#[test]
fn close_is_idempotent() {
    let mut harness = Harness::open(Config::default());
    harness.to_previewing();

    harness.service.close("0").unwrap();
    assert_eq!(harness.state(), None);
    let calls = harness.calls();
    assert!(calls.contains(&HandleCall::StopRepeating));
    assert!(calls.contains(&HandleCall::Close));
    assert!(harness.notifications().contains(&SessionNotification::Closed));

    // Closing again is a no-op, not an error
    harness.service.close("0").unwrap();
}

#[test]
fn set_feature_reissues_the_repeating_request() {
    let mut harness = Harness::open(Config::default());
    harness.to_previewing();
    let baseline = harness.calls().len();

    harness
        .service
        .set_feature("0", FeatureName::ZoomLevel, FeatureValue::Zoom(2.0))
        .unwrap();
    let calls = harness.calls();
    assert_eq!(calls.len(), baseline + 1);
    let Some(HandleCall::Repeating(request)) = calls.last() else {
        panic!("expected a re-issued repeating request");
    };
    let Some(ControlValue::Crop(crop)) = request.get(ControlKey::ScalerCropRegion) else {
        panic!("expected a crop region");
    };
    assert_eq!((crop.width, crop.height), (2000, 1500));
}

#[test]
fn unknown_and_ill_shaped_features_are_local_errors() {
    let mut harness = Harness::open(Config::default());
    harness.to_previewing();

    let err = harness
        .service
        .set_feature_named("0", "bokeh", FeatureValue::Zoom(1.0))
        .unwrap_err();
    assert_eq!(err, ControlError::UnknownFeature("bokeh".to_string()));

    let err = harness
        .service
        .set_feature("0", FeatureName::Flash, FeatureValue::ExposureLock(true))
        .unwrap_err();
    assert!(matches!(err, ControlError::InvalidFeatureValue { .. }));

    // Neither error moved the state machine
    assert_eq!(harness.state(), Some(SessionState::Previewing));
}

#[test]
fn intents_out_of_order_fail_with_invalid_state() {
    let mut harness = Harness::open(Config::default());
    // Still opening: no session to configure, no preview to start
    let err = harness.service.start_preview("0").unwrap_err();
    assert!(matches!(err, ControlError::InvalidState { .. }));
    let err = harness
        .service
        .capture_still("0", None)
        .unwrap_err();
    assert!(matches!(err, ControlError::InvalidState { .. }));
    assert_eq!(harness.state(), Some(SessionState::Opening));
}

#[test]
fn pause_and_resume_preserve_composed_controls() {
    let mut harness = Harness::open(Config::default());
    harness.to_previewing();

    harness.service.pause_preview("0").unwrap();
    assert!(harness.calls().contains(&HandleCall::StopRepeating));
    assert!(harness
        .notifications()
        .contains(&SessionNotification::PreviewPaused));

    // Feature updates while paused do not touch the hardware
    let baseline = harness.calls().len();
    harness
        .service
        .set_feature("0", FeatureName::ExposureLock, FeatureValue::ExposureLock(true))
        .unwrap();
    assert_eq!(harness.calls().len(), baseline);

    harness.service.resume_preview("0").unwrap();
    let calls = harness.calls();
    let Some(HandleCall::Repeating(request)) = calls.last() else {
        panic!("expected the repeating request back");
    };
    assert_eq!(request.get(ControlKey::AeLock), Some(&ControlValue::Bool(true)));
    assert!(harness
        .notifications()
        .contains(&SessionNotification::PreviewResumed));

    // Pausing twice is a no-op
    harness.service.pause_preview("0").unwrap();
    harness.service.pause_preview("0").unwrap();
}

#[test]
fn camera_permission_denial_discards_the_session() {
    let mut harness = Harness::open_with(Config::default(), vec![]);
    assert_eq!(harness.state(), Some(SessionState::PermissionPending));

    let (request_id, permissions) = harness.issued.lock().unwrap().last().unwrap().clone();
    assert_eq!(permissions, vec![Permission::Camera]);

    harness
        .service
        .permission_result("0", request_id, &[(Permission::Camera, false)]);
    assert_eq!(harness.state(), None, "denied session is discarded");
    assert!(harness.notifications().iter().any(|n| matches!(
        n,
        SessionNotification::SessionError {
            code: "PermissionDenied",
            ..
        }
    )));
    assert!(
        !harness.calls().contains(&HandleCall::Open),
        "hardware is never touched without permission"
    );
}

#[test]
fn orientation_changes_notify_once_per_transition() {
    let mut harness = Harness::open(Config::default());
    harness.to_previewing();
    harness.notifications();

    harness.service.sensor_angle("0", 90);
    harness.service.sensor_angle("0", 91);
    harness.service.sensor_angle("0", 89);

    let changes: Vec<_> = harness
        .notifications()
        .into_iter()
        .filter(|n| matches!(n, SessionNotification::OrientationChanged { .. }))
        .collect();
    assert_eq!(changes.len(), 1);
}
