//! The booth: one camera, one capture session, one photo set.

use std::sync::Arc;
use std::time::Duration;

use photobooth_capture::{
    CameraBackend, CaptureSession, CaptureTarget, Countdown, DeviceAccessManager, FrameCapturer,
    PreviewSurface, StreamHandle, TickOutcome,
};
use photobooth_common::clock::{Clock, SystemClock};
use photobooth_common::config::BoothDefaults;
use photobooth_common::error::{PhotoboothError, PhotoboothResult};
use photobooth_model::{CapturedImage, FrameColor, Layout, PhotoSet};
use photobooth_platform::PlatformCapabilities;
use photobooth_render::{
    compose, CompositeCanvas, CompositeStyle, DownloadTarget, ExportAdapter, ExportOutcome,
    SurfaceHost,
};

/// Observable booth state for rendering a UI.
#[derive(Debug, Clone)]
pub struct BoothSnapshot {
    pub active: bool,
    pub ready: bool,
    pub loading: bool,
    pub countdown: Option<Countdown>,
    pub layout: Layout,
    pub color: FrameColor,
    pub photos: PhotoSet,
}

/// Drives the whole capture pipeline.
///
/// At most one camera stream is open at a time. Every path out of an active
/// session, including failures, stops the stream's tracks.
pub struct Photobooth<B: CameraBackend, S: PreviewSurface> {
    devices: DeviceAccessManager<B>,
    surface: S,
    session: CaptureSession,
    stream: Option<StreamHandle>,
    capturer: FrameCapturer,
    photos: PhotoSet,
    color: FrameColor,
    style: CompositeStyle,
    exporter: ExportAdapter,
    clock: Arc<dyn Clock>,
    playback_delay: Duration,
}

impl<B: CameraBackend, S: PreviewSurface> Photobooth<B, S> {
    /// A booth with built-in defaults and the system clock.
    pub fn new(backend: B, surface: S, capabilities: PlatformCapabilities) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let defaults = BoothDefaults::default();
        Self {
            exporter: ExportAdapter::from_capabilities(&capabilities, clock.clone()),
            devices: DeviceAccessManager::new(backend, capabilities),
            surface,
            session: CaptureSession::new(defaults.countdown_secs),
            stream: None,
            capturer: FrameCapturer::default(),
            photos: PhotoSet::new(Layout::default()),
            color: FrameColor::default(),
            style: CompositeStyle::from_defaults(&defaults),
            clock,
            playback_delay: Duration::from_millis(defaults.safari_playback_delay_ms),
        }
    }

    /// Apply configured defaults. Unknown layout or color names are rejected.
    pub fn with_defaults(mut self, defaults: &BoothDefaults) -> PhotoboothResult<Self> {
        let layout: Layout = defaults
            .layout
            .parse()
            .map_err(|e| PhotoboothError::config(format!("{e}")))?;
        let color: FrameColor = defaults
            .frame_color
            .parse()
            .map_err(|e| PhotoboothError::config(format!("{e}")))?;

        self.photos = PhotoSet::new(layout);
        self.color = color;
        self.session = CaptureSession::new(defaults.countdown_secs);
        self.style = CompositeStyle::from_defaults(defaults);
        self.playback_delay = Duration::from_millis(defaults.safari_playback_delay_ms);
        Ok(self)
    }

    /// Replace the clock used for date stamps and file names.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.exporter = ExportAdapter::new(self.exporter.strategy(), clock.clone());
        self.clock = clock;
        self
    }

    pub fn capabilities(&self) -> &PlatformCapabilities {
        self.devices.capabilities()
    }

    pub fn backend(&self) -> &B {
        self.devices.backend()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn session(&self) -> &CaptureSession {
        &self.session
    }

    pub fn layout(&self) -> Layout {
        self.photos.layout()
    }

    pub fn color(&self) -> FrameColor {
        self.color
    }

    pub fn photos(&self) -> &PhotoSet {
        &self.photos
    }

    pub fn snapshot(&self) -> BoothSnapshot {
        BoothSnapshot {
            active: self.session.is_active(),
            ready: self.session.is_ready(),
            loading: self.session.is_loading(),
            countdown: self.session.countdown(),
            layout: self.photos.layout(),
            color: self.color,
            photos: self.photos.clone(),
        }
    }

    /// Acquire the camera and start the preview.
    ///
    /// An already-open camera is closed first.
    pub async fn open(&mut self) -> PhotoboothResult<()> {
        if self.session.is_active() {
            tracing::info!("Camera already open, closing before reopening");
            self.close();
        }
        self.session.begin_open()?;

        let mut handle = match self.devices.open().await {
            Ok(handle) => handle,
            Err(e) => {
                self.session.close();
                return Err(e);
            }
        };

        if !self.surface.is_mounted() {
            tracing::warn!(stream = handle.id(), "Preview surface gone before stream arrived");
            handle.close();
            self.session.close();
            return Err(PhotoboothError::camera_unavailable(
                "the preview went away before the camera was ready",
            ));
        }
        if let Err(reason) = self.surface.attach(&handle) {
            tracing::error!(stream = handle.id(), %reason, "Failed to attach stream");
            handle.close();
            self.session.close();
            return Err(PhotoboothError::camera_unavailable(reason));
        }
        self.surface
            .set_mirrored(self.devices.capabilities().mirror_preview());
        self.stream = Some(handle);

        if self.devices.capabilities().delays_playback() && !self.playback_delay.is_zero() {
            tracing::debug!(
                delay_ms = self.playback_delay.as_millis() as u64,
                "Delaying playback for Safari"
            );
            tokio::time::sleep(self.playback_delay).await;
        }

        if let Err(reason) = self.surface.play().await {
            tracing::error!(%reason, "Preview playback rejected");
            self.close();
            return Err(PhotoboothError::playback(reason));
        }
        self.session.mark_ready()
    }

    /// Stop the camera and any countdown. Returns whether anything was open.
    pub fn close(&mut self) -> bool {
        let was_active = self.session.close();
        self.surface.detach();
        if let Some(mut handle) = self.stream.take() {
            self.devices.close(&mut handle);
        }
        if was_active {
            tracing::info!("Camera closed");
        }
        was_active
    }

    /// Take one photo immediately. Returns the slot it went into.
    pub fn capture_now(&mut self) -> PhotoboothResult<usize> {
        self.session.ensure_ready("take a photo")?;
        let image = self.grab()?;
        let slot = self.photos.push(image);
        tracing::info!(slot, photos = self.photos.photo_count(), "Photo captured");
        Ok(slot)
    }

    /// Start a countdown. A multi capture resets the photo set to empty slots.
    pub fn start_timed_capture(&mut self, multi: bool) -> PhotoboothResult<Countdown> {
        let countdown = self.session.start_countdown(multi)?;
        if multi {
            self.photos = PhotoSet::with_empty_slots(self.photos.layout());
        }
        Ok(countdown)
    }

    /// Advance a running countdown by one second, capturing when it hits zero.
    ///
    /// A failed capture cancels the countdown; its slot stays empty.
    pub fn tick(&mut self) -> PhotoboothResult<TickOutcome> {
        let outcome = self.session.tick(self.photos.layout().count())?;
        let TickOutcome::Capture { target, .. } = outcome else {
            return Ok(outcome);
        };

        let image = match self.grab() {
            Ok(image) => image,
            Err(e) => {
                self.session.cancel_countdown();
                return Err(e);
            }
        };
        match target {
            CaptureTarget::Append => {
                let slot = self.photos.push(image);
                tracing::info!(slot, "Timed photo captured");
            }
            CaptureTarget::Slot(slot) => {
                self.photos.place(slot, image).map_err(|e| {
                    self.session.cancel_countdown();
                    PhotoboothError::invalid_state(e.to_string())
                })?;
                tracing::info!(slot, "Multi-capture frame captured");
            }
        }
        Ok(outcome)
    }

    /// Switch layouts and clear the photo set.
    ///
    /// A running countdown cannot be cancelled, so switching is refused
    /// until it finishes.
    pub fn select_layout(&mut self, layout: Layout) -> PhotoboothResult<()> {
        if let Some(countdown) = self.session.countdown() {
            tracing::warn!(
                layout = layout.id(),
                remaining = countdown.remaining,
                "Layout change refused during countdown"
            );
            return Err(PhotoboothError::invalid_state(
                "cannot change the layout while a countdown is running",
            ));
        }
        self.photos = PhotoSet::new(layout);
        tracing::info!(layout = layout.id(), "Layout selected");
        Ok(())
    }

    pub fn select_color(&mut self, color: FrameColor) {
        self.color = color;
        tracing::debug!(color = color.name(), "Frame color selected");
    }

    pub fn clear_photos(&mut self) {
        self.photos.clear();
        tracing::debug!("Photos cleared");
    }

    /// Render the current photo set.
    pub fn compose(&self) -> PhotoboothResult<CompositeCanvas> {
        compose(
            &self.photos,
            self.color,
            &self.style,
            &self.clock.date_stamp(),
        )
    }

    /// Compose and deliver the photo set with the platform's export strategy.
    pub fn export_composite(
        &self,
        downloads: &mut dyn DownloadTarget,
        surfaces: &mut dyn SurfaceHost,
    ) -> PhotoboothResult<ExportOutcome> {
        if !self.photos.has_photos() {
            return Err(PhotoboothError::export("there are no photos to export"));
        }
        let canvas = self.compose()?;
        self.exporter.export(&canvas, downloads, surfaces)
    }

    fn grab(&mut self) -> PhotoboothResult<CapturedImage> {
        let handle = self
            .stream
            .as_mut()
            .ok_or_else(|| PhotoboothError::invalid_state("no camera stream is open"))?;
        self.capturer.capture(handle)
    }
}

impl<B: CameraBackend, S: PreviewSurface> Drop for Photobooth<B, S> {
    fn drop(&mut self) {
        self.close();
    }
}
