use image::RgbaImage;

use crate::constraints::MediaConstraints;

pub mod synthetic;
#[cfg(all(feature = "v4l", target_os = "linux"))]
pub mod video4linux;

pub use synthetic::{SyntheticCamera, SyntheticProbe};
#[cfg(all(feature = "v4l", target_os = "linux"))]
pub use video4linux::V4lCamera;

/// Why a single camera request was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AcquireError {
    #[error("permission denied: {0}")]
    NotAllowed(String),

    #[error("no camera satisfies the constraints: {0}")]
    Overconstrained(String),

    #[error("no camera found")]
    NotFound,

    #[error("camera is busy or unreadable: {0}")]
    NotReadable(String),
}

/// Host camera API.
#[async_trait::async_trait]
pub trait CameraBackend: Send + Sync {
    /// Backend name for diagnostics.
    fn name(&self) -> &str;

    /// Request a live stream matching `constraints`.
    async fn get_user_media(
        &self,
        constraints: &MediaConstraints,
    ) -> Result<Box<dyn CameraStream>, AcquireError>;
}

/// A live camera stream made of one or more hardware tracks.
pub trait CameraStream: Send {
    /// Stream identifier.
    fn id(&self) -> &str;

    /// Number of tracks still running.
    fn live_tracks(&self) -> usize;

    /// Stop every track. Calling this on a stopped stream does nothing.
    fn stop(&mut self);

    /// Negotiated pixel size, once known.
    fn intrinsic_size(&self) -> Option<(u32, u32)>;

    /// Current frame, if the stream is live.
    fn grab_frame(&mut self) -> Option<RgbaImage>;
}
