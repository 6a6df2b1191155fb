// SPDX-License-Identifier: GPL-3.0-only

//! Hardware device boundary
//!
//! The control core drives one physical camera through this trait. All
//! calls initiate work; completions come back asynchronously as
//! [`HardwareEvent`] values which the embedder feeds into the session's
//! serialized intake. The transition table in [`crate::session`] is the
//! single source of truth for what is legal next, so this layer carries
//! no state of its own.

pub mod request;
pub mod types;

pub use request::{CaptureRequest, CaptureRequestBuilder, ControlKey, ControlValue};
pub use types::*;

use crate::errors::ControlResult;
use std::path::Path;

/// Handle to one physical camera, bound to a camera id at construction
///
/// Implementations wrap the platform device API (`openCamera`,
/// `createCaptureSession`, `setRepeatingRequest`, `capture`, `close`).
/// They must be cheap to drop: `close` is best-effort and may be called
/// redundantly.
pub trait CameraHandle: Send {
    /// The camera id this handle is bound to
    fn camera_id(&self) -> &str;

    /// Begin opening the device; completion arrives as
    /// [`HardwareEvent::Opened`] or [`HardwareEvent::OpenFailed`]
    fn open(&mut self) -> ControlResult<()>;

    /// Begin configuring the capture session with the given outputs;
    /// completion arrives as `SessionConfigured` / `SessionConfigureFailed`
    fn configure_session(&mut self, outputs: &[OutputTarget]) -> ControlResult<()>;

    /// Install or replace the repeating request driving the preview
    fn set_repeating_request(&mut self, request: CaptureRequest) -> ControlResult<()>;

    /// Stop the repeating request, leaving the session configured
    fn stop_repeating(&mut self) -> ControlResult<()>;

    /// Issue a one-shot still capture persisting to `output_path`;
    /// completion arrives as `CaptureCompleted` / `CaptureFailed`
    fn capture(&mut self, request: CaptureRequest, output_path: &Path) -> ControlResult<()>;

    /// Close the session and device, releasing hardware resources
    fn close(&mut self);
}
