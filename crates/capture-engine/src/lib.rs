//! Photobooth Capture Engine
//!
//! Acquires the camera, tracks the capture session, and turns live video
//! frames into encoded captures.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────┐
//! │                DeviceAccessManager                  │
//! │  PlatformCapabilities ─▶ constraint tiers ─▶ backend │
//! └───────────────────────┬────────────────────────────┘
//!                         │ StreamHandle
//!                         ▼
//! ┌──────────────┐   ┌────────────────┐   ┌───────────────┐
//! │PreviewSurface│   │ CaptureSession │──▶│ FrameCapturer │──▶ CapturedImage
//! │ attach/play  │   │ (state machine)│   │ 4:3 crop + PNG│
//! └──────────────┘   └────────────────┘   └───────────────┘
//! ```

pub mod backend;
pub mod constraints;
pub mod device;
pub mod frame;
pub mod session;
pub mod surface;

pub use backend::{AcquireError, CameraBackend, CameraStream, SyntheticCamera, SyntheticProbe};
#[cfg(all(feature = "v4l", target_os = "linux"))]
pub use backend::V4lCamera;
pub use constraints::*;
pub use device::*;
pub use frame::*;
pub use session::*;
pub use surface::*;
