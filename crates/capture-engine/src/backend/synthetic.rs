//! Synthetic camera backend.
//!
//! Produces deterministic test-pattern frames so the booth can run without
//! camera hardware. The pattern carries markers at known positions, which
//! makes crops and composites easy to verify by sampling pixels.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use image::{ImageBuffer, Rgba, RgbaImage};
use imageproc::drawing::draw_filled_circle_mut;

use crate::backend::{AcquireError, CameraBackend, CameraStream};
use crate::constraints::{FacingMode, MediaConstraints};

/// Colors cycled through by the center marker, one per frame.
const FRAME_MARKERS: [Rgba<u8>; 4] = [
    Rgba([255, 50, 50, 255]),
    Rgba([50, 255, 50, 255]),
    Rgba([50, 50, 255, 255]),
    Rgba([255, 200, 50, 255]),
];

const BACKGROUND: Rgba<u8> = Rgba([40, 40, 50, 255]);
const GRID_LINE: Rgba<u8> = Rgba([80, 80, 90, 255]);

#[derive(Debug, Default)]
struct SyntheticState {
    attempts: Mutex<Vec<MediaConstraints>>,
    live_tracks: AtomicUsize,
    streams_opened: AtomicUsize,
}

/// A camera that renders test patterns.
#[derive(Debug, Clone)]
pub struct SyntheticCamera {
    native_width: u32,
    native_height: u32,
    reject_first: usize,
    has_rear: bool,
    withhold_dimensions: bool,
    frame_limit: Option<usize>,
    state: Arc<SyntheticState>,
}

/// Read-only view of what a [`SyntheticCamera`] has been asked to do.
#[derive(Debug, Clone)]
pub struct SyntheticProbe {
    state: Arc<SyntheticState>,
}

impl SyntheticProbe {
    /// Every request received, in order.
    pub fn attempts(&self) -> Vec<MediaConstraints> {
        self.state
            .attempts
            .lock()
            .map(|a| a.clone())
            .unwrap_or_default()
    }

    /// Tracks currently running across all streams.
    pub fn live_tracks(&self) -> usize {
        self.state.live_tracks.load(Ordering::SeqCst)
    }

    /// Streams handed out so far.
    pub fn streams_opened(&self) -> usize {
        self.state.streams_opened.load(Ordering::SeqCst)
    }
}

impl SyntheticCamera {
    /// A front and rear camera with the given native resolution.
    pub fn new(native_width: u32, native_height: u32) -> Self {
        Self {
            native_width,
            native_height,
            reject_first: 0,
            has_rear: true,
            withhold_dimensions: false,
            frame_limit: None,
            state: Arc::new(SyntheticState::default()),
        }
    }

    /// Refuse the first `n` requests.
    pub fn rejecting_first(mut self, n: usize) -> Self {
        self.reject_first = n;
        self
    }

    /// Refuse every request.
    pub fn rejecting_all(self) -> Self {
        self.rejecting_first(usize::MAX)
    }

    /// Only a front camera is present.
    pub fn without_rear(mut self) -> Self {
        self.has_rear = false;
        self
    }

    /// Streams never report their pixel size.
    pub fn without_dimensions(mut self) -> Self {
        self.withhold_dimensions = true;
        self
    }

    /// Each stream delivers `n` frames and then none, while still
    /// reporting its size.
    pub fn dropping_frames_after(mut self, n: usize) -> Self {
        self.frame_limit = Some(n);
        self
    }

    pub fn probe(&self) -> SyntheticProbe {
        SyntheticProbe {
            state: Arc::clone(&self.state),
        }
    }
}

impl Default for SyntheticCamera {
    fn default() -> Self {
        Self::new(1280, 720)
    }
}

#[async_trait::async_trait]
impl CameraBackend for SyntheticCamera {
    fn name(&self) -> &str {
        "synthetic"
    }

    async fn get_user_media(
        &self,
        constraints: &MediaConstraints,
    ) -> Result<Box<dyn CameraStream>, AcquireError> {
        let attempt = {
            let mut attempts = self
                .state
                .attempts
                .lock()
                .map_err(|_| AcquireError::NotReadable("attempt log poisoned".to_string()))?;
            attempts.push(constraints.clone());
            attempts.len()
        };

        if attempt <= self.reject_first {
            return Err(AcquireError::NotAllowed(format!(
                "synthetic camera refused request #{attempt}"
            )));
        }
        if constraints.facing() == Some(FacingMode::Environment) && !self.has_rear {
            return Err(AcquireError::Overconstrained("facingMode".to_string()));
        }

        let (width, height) = constraints.resolve_size(self.native_width, self.native_height);
        let serial = self.state.streams_opened.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.live_tracks.fetch_add(1, Ordering::SeqCst);

        tracing::debug!(serial, width, height, "Synthetic stream opened");

        Ok(Box::new(SyntheticStream {
            id: format!("synthetic-{serial}"),
            width,
            height,
            withhold_dimensions: self.withhold_dimensions,
            frame_limit: self.frame_limit,
            live: true,
            frame_index: 0,
            state: Arc::clone(&self.state),
        }))
    }
}

struct SyntheticStream {
    id: String,
    width: u32,
    height: u32,
    withhold_dimensions: bool,
    frame_limit: Option<usize>,
    live: bool,
    frame_index: usize,
    state: Arc<SyntheticState>,
}

impl CameraStream for SyntheticStream {
    fn id(&self) -> &str {
        &self.id
    }

    fn live_tracks(&self) -> usize {
        usize::from(self.live)
    }

    fn stop(&mut self) {
        if self.live {
            self.live = false;
            self.state.live_tracks.fetch_sub(1, Ordering::SeqCst);
        }
    }

    fn intrinsic_size(&self) -> Option<(u32, u32)> {
        (self.live && !self.withhold_dimensions).then_some((self.width, self.height))
    }

    fn grab_frame(&mut self) -> Option<RgbaImage> {
        if !self.live || self.frame_limit.is_some_and(|n| self.frame_index >= n) {
            return None;
        }
        let marker = FRAME_MARKERS[self.frame_index % FRAME_MARKERS.len()];
        self.frame_index += 1;
        Some(render_pattern(self.width, self.height, marker))
    }
}

/// Grid pattern with corner markers and a center marker in `marker` color.
pub fn render_pattern(width: u32, height: u32, marker: Rgba<u8>) -> RgbaImage {
    let mut img: RgbaImage = ImageBuffer::from_pixel(width, height, BACKGROUND);
    if width == 0 || height == 0 {
        return img;
    }

    for x in (0..width).step_by(100) {
        for y in 0..height {
            img.put_pixel(x, y, GRID_LINE);
        }
    }
    for y in (0..height).step_by(100) {
        for x in 0..width {
            img.put_pixel(x, y, GRID_LINE);
        }
    }

    let radius = (width.min(height) / 24).max(2) as i32;
    let inset = radius + 10;
    let corners = [
        (inset, inset),
        (width as i32 - inset, inset),
        (width as i32 - inset, height as i32 - inset),
        (inset, height as i32 - inset),
    ];
    for center in corners {
        draw_filled_circle_mut(&mut img, center, radius, Rgba([255, 255, 255, 255]));
    }

    draw_filled_circle_mut(
        &mut img,
        ((width / 2) as i32, (height / 2) as i32),
        radius * 2,
        marker,
    );

    img
}
