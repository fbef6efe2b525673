//! Video4Linux camera backend.
//!
//! Each stream runs a capture thread that owns the device and its mmap
//! buffers. The thread keeps the most recent decoded frame; `grab_frame`
//! hands out a copy of it. Stopping the stream signals the thread and
//! joins it, which releases the device.

use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use image::{ImageFormat, Rgba, RgbaImage};
use tokio::sync::oneshot;
use v4l::buffer::Type;
use v4l::io::mmap::Stream;
use v4l::io::traits::CaptureStream as V4lCaptureStream;
use v4l::video::Capture;
use v4l::{Device, FourCC};

use crate::backend::{AcquireError, CameraBackend, CameraStream};
use crate::constraints::{FacingMode, MediaConstraints, VideoConstraints};

const BUFFER_COUNT: u32 = 4;

/// Pixel layouts the capture thread can decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PixelLayout {
    Yuyv,
    Mjpeg,
}

impl PixelLayout {
    fn from_fourcc(fourcc: FourCC) -> Option<Self> {
        match &fourcc.repr {
            b"YUYV" => Some(Self::Yuyv),
            b"MJPG" => Some(Self::Mjpeg),
            _ => None,
        }
    }
}

/// Format the driver agreed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Negotiated {
    width: u32,
    height: u32,
    stride: u32,
    layout: PixelLayout,
}

/// Cameras exposed as `/dev/videoN` nodes.
///
/// The front device serves user-facing and unconstrained requests; the
/// rear device, when configured, serves environment-facing ones.
#[derive(Debug, Clone)]
pub struct V4lCamera {
    front: usize,
    rear: Option<usize>,
    serial: Arc<AtomicUsize>,
}

impl V4lCamera {
    /// A camera with only a front device at `/dev/video{index}`.
    pub fn new(index: usize) -> Self {
        Self {
            front: index,
            rear: None,
            serial: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Use `/dev/video{index}` for environment-facing requests.
    pub fn with_rear(mut self, index: usize) -> Self {
        self.rear = Some(index);
        self
    }

    fn device_for(&self, constraints: &MediaConstraints) -> Result<usize, AcquireError> {
        match constraints.facing() {
            Some(FacingMode::Environment) => self
                .rear
                .ok_or_else(|| AcquireError::Overconstrained("facingMode".to_string())),
            _ => Ok(self.front),
        }
    }
}

impl Default for V4lCamera {
    fn default() -> Self {
        Self::new(0)
    }
}

#[async_trait::async_trait]
impl CameraBackend for V4lCamera {
    fn name(&self) -> &str {
        "v4l2"
    }

    async fn get_user_media(
        &self,
        constraints: &MediaConstraints,
    ) -> Result<Box<dyn CameraStream>, AcquireError> {
        let index = self.device_for(constraints)?;
        let serial = self.serial.fetch_add(1, Ordering::SeqCst) + 1;

        let shared = Arc::new(Shared::default());
        let (ready_tx, ready_rx) = oneshot::channel();
        let thread = {
            let constraints = constraints.clone();
            let shared = Arc::clone(&shared);
            std::thread::Builder::new()
                .name(format!("v4l-capture-{index}"))
                .spawn(move || capture_loop(index, &constraints, &shared, ready_tx))
                .map_err(|e| AcquireError::NotReadable(e.to_string()))?
        };

        let negotiated = match ready_rx.await {
            Ok(result) => result?,
            Err(_) => {
                return Err(AcquireError::NotReadable(
                    "capture thread exited before the device opened".to_string(),
                ))
            }
        };

        tracing::info!(
            device = index,
            width = negotiated.width,
            height = negotiated.height,
            layout = ?negotiated.layout,
            "V4L2 stream opened"
        );

        Ok(Box::new(V4lStream {
            id: format!("v4l{index}-{serial}"),
            width: negotiated.width,
            height: negotiated.height,
            shared,
            thread: Some(thread),
        }))
    }
}

#[derive(Debug, Default)]
struct Shared {
    running: AtomicBool,
    latest: Mutex<Option<RgbaImage>>,
}

struct V4lStream {
    id: String,
    width: u32,
    height: u32,
    shared: Arc<Shared>,
    thread: Option<JoinHandle<()>>,
}

impl CameraStream for V4lStream {
    fn id(&self) -> &str {
        &self.id
    }

    fn live_tracks(&self) -> usize {
        usize::from(self.thread.is_some())
    }

    fn stop(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };
        self.shared.running.store(false, Ordering::SeqCst);
        if thread.join().is_err() {
            tracing::warn!(stream = %self.id, "Capture thread panicked");
        }
        if let Ok(mut latest) = self.shared.latest.lock() {
            latest.take();
        }
        tracing::debug!(stream = %self.id, "V4L2 stream stopped");
    }

    fn intrinsic_size(&self) -> Option<(u32, u32)> {
        self.thread.is_some().then_some((self.width, self.height))
    }

    fn grab_frame(&mut self) -> Option<RgbaImage> {
        self.thread.as_ref()?;
        self.shared.latest.lock().ok().and_then(|f| f.clone())
    }
}

impl Drop for V4lStream {
    fn drop(&mut self) {
        self.stop();
    }
}

fn capture_loop(
    index: usize,
    constraints: &MediaConstraints,
    shared: &Shared,
    ready: oneshot::Sender<Result<Negotiated, AcquireError>>,
) {
    let device = match Device::new(index) {
        Ok(device) => device,
        Err(e) => {
            let _ = ready.send(Err(acquire_error(&e)));
            return;
        }
    };
    let negotiated = match negotiate(&device, constraints) {
        Ok(negotiated) => negotiated,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };
    let mut stream = match Stream::with_buffers(&device, Type::VideoCapture, BUFFER_COUNT) {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ready.send(Err(acquire_error(&e)));
            return;
        }
    };

    shared.running.store(true, Ordering::SeqCst);
    if ready.send(Ok(negotiated)).is_err() {
        return;
    }

    while shared.running.load(Ordering::SeqCst) {
        let (buf, meta) = match stream.next() {
            Ok(next) => next,
            Err(e) => {
                tracing::warn!(device = index, error = %e, "V4L2 dequeue failed");
                break;
            }
        };
        let used = (meta.bytesused as usize).min(buf.len());
        let frame = decode_frame(&buf[..used], &negotiated);
        match (frame, shared.latest.lock()) {
            (Some(frame), Ok(mut latest)) => *latest = Some(frame),
            (None, _) => tracing::trace!(device = index, "Dropped undecodable frame"),
            (_, Err(_)) => break,
        }
    }
    shared.running.store(false, Ordering::SeqCst);
}

/// Ask the driver for the constrained size, preferring YUYV.
fn negotiate(device: &Device, constraints: &MediaConstraints) -> Result<Negotiated, AcquireError> {
    let current = device.format().map_err(|e| acquire_error(&e))?;
    let (width, height) = constraints.resolve_size(current.width, current.height);

    let mut last_fourcc = current.fourcc;
    for fourcc in [FourCC::new(b"YUYV"), FourCC::new(b"MJPG")] {
        let mut request = current.clone();
        request.width = width;
        request.height = height;
        request.fourcc = fourcc;
        let granted = device.set_format(&request).map_err(|e| acquire_error(&e))?;
        last_fourcc = granted.fourcc;

        let Some(layout) = PixelLayout::from_fourcc(granted.fourcc) else {
            continue;
        };
        if !within_max(constraints, granted.width, granted.height) {
            return Err(AcquireError::Overconstrained(format!(
                "device offers {}x{}",
                granted.width, granted.height
            )));
        }
        return Ok(Negotiated {
            width: granted.width,
            height: granted.height,
            stride: granted.stride,
            layout,
        });
    }
    Err(AcquireError::Overconstrained(format!(
        "unsupported pixel format {last_fourcc}"
    )))
}

/// Whether a granted size respects the constraints' upper bounds.
fn within_max(constraints: &MediaConstraints, width: u32, height: u32) -> bool {
    match &constraints.video {
        VideoConstraints::Any => true,
        VideoConstraints::Facing {
            width: w, height: h, ..
        } => {
            w.and_then(|r| r.max).map_or(true, |max| width <= max)
                && h.and_then(|r| r.max).map_or(true, |max| height <= max)
        }
    }
}

fn acquire_error(e: &io::Error) -> AcquireError {
    match e.kind() {
        io::ErrorKind::NotFound => AcquireError::NotFound,
        io::ErrorKind::PermissionDenied => AcquireError::NotAllowed(e.to_string()),
        _ => AcquireError::NotReadable(e.to_string()),
    }
}

fn decode_frame(data: &[u8], format: &Negotiated) -> Option<RgbaImage> {
    match format.layout {
        PixelLayout::Yuyv => yuyv_to_rgba(data, format.width, format.height, format.stride),
        PixelLayout::Mjpeg => image::load_from_memory_with_format(data, ImageFormat::Jpeg)
            .ok()
            .map(|img| img.to_rgba8()),
    }
}

/// Convert packed YUYV 4:2:2 with BT.601 studio-swing coefficients.
fn yuyv_to_rgba(data: &[u8], width: u32, height: u32, stride: u32) -> Option<RgbaImage> {
    let stride = (stride as usize).max(width as usize * 2);
    if width % 2 != 0 || data.len() < stride * (height as usize).saturating_sub(1) + width as usize * 2
    {
        return None;
    }

    let mut img = RgbaImage::new(width, height);
    for y in 0..height {
        let row = &data[y as usize * stride..][..width as usize * 2];
        for (pair, px) in row.chunks_exact(4).enumerate() {
            let (u, v) = (px[1], px[3]);
            let x = pair as u32 * 2;
            img.put_pixel(x, y, yuv_to_rgba(px[0], u, v));
            img.put_pixel(x + 1, y, yuv_to_rgba(px[2], u, v));
        }
    }
    Some(img)
}

fn yuv_to_rgba(y: u8, u: u8, v: u8) -> Rgba<u8> {
    let c = i32::from(y) - 16;
    let d = i32::from(u) - 128;
    let e = i32::from(v) - 128;
    let to_u8 = |n: i32| ((n + 128) >> 8).clamp(0, 255) as u8;
    Rgba([
        to_u8(298 * c + 409 * e),
        to_u8(298 * c - 100 * d - 208 * e),
        to_u8(298 * c + 516 * d),
        255,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn studio_black_and_white_map_to_full_range() {
        assert_eq!(yuv_to_rgba(16, 128, 128), Rgba([0, 0, 0, 255]));
        assert_eq!(yuv_to_rgba(235, 128, 128), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn yuyv_rows_honour_stride_padding() {
        // 2x2 image, rows padded to 8 bytes: white row then black row.
        let data = [
            235, 128, 235, 128, 0, 0, 0, 0, //
            16, 128, 16, 128, 0, 0, 0, 0,
        ];
        let img = yuyv_to_rgba(&data, 2, 2, 8).unwrap();
        assert_eq!(*img.get_pixel(1, 0), Rgba([255, 255, 255, 255]));
        assert_eq!(*img.get_pixel(0, 1), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn short_yuyv_buffer_is_rejected() {
        assert!(yuyv_to_rgba(&[16; 6], 2, 2, 4).is_none());
        assert!(yuyv_to_rgba(&[16; 12], 3, 2, 6).is_none());
    }

    #[test]
    fn rear_requests_need_a_rear_device() {
        let camera = V4lCamera::new(2);
        assert_eq!(camera.device_for(&MediaConstraints::any_video()), Ok(2));
        assert!(matches!(
            camera.device_for(&MediaConstraints::rear()),
            Err(AcquireError::Overconstrained(_))
        ));
        assert_eq!(
            camera.with_rear(3).device_for(&MediaConstraints::rear()),
            Ok(3)
        );
    }

    #[test]
    fn granted_size_must_respect_max() {
        let handheld = MediaConstraints::handheld_front();
        assert!(within_max(&handheld, 1280, 720));
        assert!(!within_max(&handheld, 1920, 1080));
        assert!(within_max(&MediaConstraints::any_video(), 4096, 2160));
    }

    #[test]
    fn io_errors_map_to_acquire_errors() {
        let missing = io::Error::from(io::ErrorKind::NotFound);
        assert_eq!(acquire_error(&missing), AcquireError::NotFound);
        let denied = io::Error::from(io::ErrorKind::PermissionDenied);
        assert!(matches!(acquire_error(&denied), AcquireError::NotAllowed(_)));
    }

    #[test]
    fn only_yuyv_and_mjpeg_are_decoded() {
        assert_eq!(PixelLayout::from_fourcc(FourCC::new(b"YUYV")), Some(PixelLayout::Yuyv));
        assert_eq!(PixelLayout::from_fourcc(FourCC::new(b"MJPG")), Some(PixelLayout::Mjpeg));
        assert_eq!(PixelLayout::from_fourcc(FourCC::new(b"NV12")), None);
    }
}
