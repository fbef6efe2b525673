//! Preview surfaces that display a live stream.
//!
//! Acquisition and display are separate: the device manager hands out a
//! stream, and whatever renders the booth attaches it to a surface and starts
//! playback. The surface may disappear while acquisition is still pending.

use crate::device::StreamHandle;

/// Where the live preview is shown.
#[async_trait::async_trait]
pub trait PreviewSurface: Send {
    /// The surface still exists and can receive a stream.
    fn is_mounted(&self) -> bool;

    /// Bind a stream to the surface.
    fn attach(&mut self, stream: &StreamHandle) -> Result<(), String>;

    /// Start playback of the attached stream.
    async fn play(&mut self) -> Result<(), String>;

    /// Unbind whatever stream is attached.
    fn detach(&mut self);

    /// Mirror the preview horizontally (selfie view).
    fn set_mirrored(&mut self, _mirrored: bool) {}
}

/// A surface with no visible output, for command-line and test use.
#[derive(Debug, Clone, Default)]
pub struct HeadlessSurface {
    unmounted: bool,
    playback_error: Option<String>,
    attached: Option<String>,
    playing: bool,
    mirrored: bool,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// A surface that has already gone away.
    pub fn unmounted() -> Self {
        Self {
            unmounted: true,
            ..Self::default()
        }
    }

    /// A surface whose `play` always fails with `reason`.
    pub fn rejecting_playback(reason: impl Into<String>) -> Self {
        Self {
            playback_error: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Take the surface away, as when the view unmounts.
    pub fn unmount(&mut self) {
        self.unmounted = true;
        self.detach();
    }

    pub fn attached_stream(&self) -> Option<&str> {
        self.attached.as_deref()
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_mirrored(&self) -> bool {
        self.mirrored
    }
}

#[async_trait::async_trait]
impl PreviewSurface for HeadlessSurface {
    fn is_mounted(&self) -> bool {
        !self.unmounted
    }

    fn attach(&mut self, stream: &StreamHandle) -> Result<(), String> {
        if self.unmounted {
            return Err("surface is not mounted".to_string());
        }
        self.attached = Some(stream.id().to_string());
        Ok(())
    }

    async fn play(&mut self) -> Result<(), String> {
        if self.attached.is_none() {
            return Err("no stream attached".to_string());
        }
        if let Some(reason) = &self.playback_error {
            return Err(reason.clone());
        }
        self.playing = true;
        Ok(())
    }

    fn detach(&mut self) {
        self.attached = None;
        self.playing = false;
    }

    fn set_mirrored(&mut self, mirrored: bool) {
        self.mirrored = mirrored;
    }
}
