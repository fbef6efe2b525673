//! Camera acquisition and release.

use image::RgbaImage;
use photobooth_common::error::{PhotoboothError, PhotoboothResult};
use photobooth_platform::{NegotiationStrategy, PlatformCapabilities};

use crate::backend::{CameraBackend, CameraStream};
use crate::constraints::{constraint_tiers, MediaConstraints};
use crate::frame::VideoSource;

/// Owner of one live camera stream.
///
/// Closing stops every underlying track. Closing twice is harmless, and a
/// handle that is dropped without being closed closes itself.
pub struct StreamHandle {
    stream: Option<Box<dyn CameraStream>>,
    id: String,
    constraints: MediaConstraints,
    tier: usize,
}

impl StreamHandle {
    pub fn new(stream: Box<dyn CameraStream>, constraints: MediaConstraints, tier: usize) -> Self {
        Self {
            id: stream.id().to_string(),
            stream: Some(stream),
            constraints,
            tier,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Request that produced this stream.
    pub fn constraints(&self) -> &MediaConstraints {
        &self.constraints
    }

    /// Zero-based fallback tier that succeeded.
    pub fn tier(&self) -> usize {
        self.tier
    }

    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    /// Tracks still running.
    pub fn live_tracks(&self) -> usize {
        self.stream.as_ref().map_or(0, |s| s.live_tracks())
    }

    /// Stop every track and release the stream.
    pub fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
            tracing::info!(stream = %self.id, "Camera stream closed");
        }
    }
}

impl VideoSource for StreamHandle {
    fn intrinsic_size(&self) -> Option<(u32, u32)> {
        self.stream.as_ref().and_then(|s| s.intrinsic_size())
    }

    fn read_frame(&mut self) -> Option<RgbaImage> {
        self.stream.as_mut().and_then(|s| s.grab_frame())
    }
}

impl Drop for StreamHandle {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamHandle")
            .field("id", &self.id)
            .field("open", &self.is_open())
            .field("tier", &self.tier)
            .finish()
    }
}

/// Requests and releases camera streams according to the platform's
/// negotiation strategy.
pub struct DeviceAccessManager<B: CameraBackend> {
    backend: B,
    capabilities: PlatformCapabilities,
}

impl<B: CameraBackend> DeviceAccessManager<B> {
    pub fn new(backend: B, capabilities: PlatformCapabilities) -> Self {
        Self {
            backend,
            capabilities,
        }
    }

    pub fn capabilities(&self) -> &PlatformCapabilities {
        &self.capabilities
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Acquire a stream, walking the fallback tiers until one succeeds.
    pub async fn open(&self) -> PhotoboothResult<StreamHandle> {
        if !self.capabilities.camera_api {
            tracing::error!(
                browser = self.capabilities.browser.label(),
                "Camera API not available"
            );
            return Err(PhotoboothError::unsupported(format!(
                "{} does not expose a camera API",
                self.capabilities.browser.label()
            )));
        }

        if self.capabilities.blocked_by_insecure_context() {
            tracing::error!(
                browser = self.capabilities.browser.label(),
                "Camera access requires a secure context"
            );
            return Err(PhotoboothError::insecure_context(
                "camera access on this platform requires HTTPS",
            ));
        }

        let strategy = self.capabilities.negotiation();
        let tiers = constraint_tiers(strategy);
        tracing::info!(
            backend = self.backend.name(),
            ?strategy,
            tiers = tiers.len(),
            "Requesting camera access"
        );

        let mut failures = Vec::with_capacity(tiers.len());
        for (tier, constraints) in tiers.into_iter().enumerate() {
            match self.backend.get_user_media(&constraints).await {
                Ok(stream) => {
                    tracing::info!(tier, stream = stream.id(), "Camera access granted");
                    return Ok(StreamHandle::new(stream, constraints, tier));
                }
                Err(e) => {
                    tracing::warn!(tier, error = %e, "Camera request failed");
                    failures.push(format!("tier {tier}: {e}"));
                }
            }
        }

        tracing::error!(attempts = failures.len(), "All camera requests failed");
        let detail = failures.join("; ");
        Err(match strategy {
            NegotiationStrategy::HandheldTiered => PhotoboothError::camera_unavailable(format!(
                "unable to access camera on handheld device, check privacy settings ({detail})"
            )),
            _ => PhotoboothError::camera_unavailable(detail),
        })
    }

    /// Release a stream. Safe on an already-closed handle.
    pub fn close(&self, handle: &mut StreamHandle) {
        handle.close();
    }
}
