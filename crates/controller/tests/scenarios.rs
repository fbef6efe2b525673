//! End-to-end booth scenarios against the synthetic camera.

use std::sync::Arc;

use photobooth_capture::{CaptureTarget, HeadlessSurface, SyntheticCamera, TickOutcome};
use photobooth_common::clock::FixedClock;
use photobooth_common::error::{PhotoboothError, PhotoboothResult};
use photobooth_controller::{CountdownEnd, Photobooth};
use photobooth_model::{FrameColor, Layout, Slot};
use photobooth_platform::{ExportStrategy, HostEnvironment, PlatformCapabilities};
use photobooth_render::{DownloadTarget, ExportOutcome, SurfaceHost, SurfaceId};
use tokio::sync::watch;

const IPHONE_UA: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) \
    AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1";
const MAC_SAFARI_UA: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_0) \
    AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Safari/605.1.15";

type TestBooth = Photobooth<SyntheticCamera, HeadlessSurface>;

fn desktop_booth(camera: SyntheticCamera) -> TestBooth {
    let clock = FixedClock::at_date(2024, 3, 9).unwrap();
    Photobooth::new(
        camera,
        HeadlessSurface::new(),
        PlatformCapabilities::detect(&HostEnvironment::local()),
    )
    .with_clock(Arc::new(clock))
}

fn iphone_booth(camera: SyntheticCamera) -> TestBooth {
    let env = HostEnvironment::from_url(IPHONE_UA, "https://booth.example/");
    Photobooth::new(
        camera,
        HeadlessSurface::new(),
        PlatformCapabilities::detect(&env),
    )
}

#[derive(Default)]
struct MemoryDownloads {
    files: Vec<(String, usize)>,
    revoked: usize,
}

impl DownloadTarget for MemoryDownloads {
    fn create_object_url(&mut self, payload: &[u8], _mime: &str) -> PhotoboothResult<String> {
        self.files.push((String::new(), payload.len()));
        Ok(format!("blob:mem/{}", self.files.len()))
    }

    fn trigger(&mut self, _url: &str, file_name: &str) -> PhotoboothResult<String> {
        if let Some(last) = self.files.last_mut() {
            last.0 = file_name.to_string();
        }
        Ok(file_name.to_string())
    }

    fn revoke(&mut self, _url: &str) {
        self.revoked += 1;
    }
}

#[derive(Default)]
struct MemorySurfaces {
    pages: Vec<String>,
}

impl SurfaceHost for MemorySurfaces {
    fn open_surface(&mut self) -> Option<SurfaceId> {
        Some(SurfaceId(self.pages.len() as u64 + 1))
    }

    fn write_document(&mut self, surface: SurfaceId, html: &str) -> PhotoboothResult<String> {
        self.pages.push(html.to_string());
        Ok(format!("surface-{}", surface.0))
    }
}

#[tokio::test]
async fn open_reaches_ready_and_close_releases_tracks() {
    let camera = SyntheticCamera::default();
    let probe = camera.probe();
    let mut booth = desktop_booth(camera);

    booth.open().await.unwrap();
    let snap = booth.snapshot();
    assert!(snap.active && snap.ready && !snap.loading);
    assert!(booth.surface().is_playing());
    assert_eq!(probe.live_tracks(), 1);

    assert!(booth.close());
    assert_eq!(probe.live_tracks(), 0);
    assert!(!booth.close());
    assert_eq!(probe.live_tracks(), 0);
    assert!(!booth.snapshot().active);
}

#[tokio::test]
async fn multi_capture_on_row_fills_three_cells_in_order() {
    let mut booth = desktop_booth(SyntheticCamera::new(1280, 720));
    booth.select_layout(Layout::Row).unwrap();
    booth.open().await.unwrap();
    booth.start_timed_capture(true).unwrap();

    let mut targets = Vec::new();
    for _ in 0..9 {
        if let TickOutcome::Capture { target, .. } = booth.tick().unwrap() {
            targets.push(target);
        }
    }
    assert_eq!(
        targets,
        vec![
            CaptureTarget::Slot(0),
            CaptureTarget::Slot(1),
            CaptureTarget::Slot(2)
        ]
    );
    assert!(booth.snapshot().countdown.is_none());
    assert_eq!(booth.photos().photo_count(), 3);

    let canvas = booth.compose().unwrap();
    assert_eq!((canvas.width(), canvas.height()), (1200, 300));
    let cells: Vec<_> = canvas.placements.iter().map(|p| (p.col, p.row)).collect();
    assert_eq!(cells, vec![(0, 0), (1, 0), (2, 0)]);
}

#[tokio::test]
async fn multi_capture_resets_previous_photos() {
    let mut booth = desktop_booth(SyntheticCamera::default());
    booth.select_layout(Layout::Column).unwrap();
    booth.open().await.unwrap();
    booth.capture_now().unwrap();
    booth.capture_now().unwrap();

    booth.start_timed_capture(true).unwrap();
    let slots = booth.photos().slots();
    assert_eq!(slots.len(), 3);
    assert!(slots.iter().all(Slot::is_empty));
}

#[tokio::test]
async fn unknown_dimensions_capture_blank_default_frame() {
    let mut booth = desktop_booth(SyntheticCamera::default().without_dimensions());
    booth.open().await.unwrap();
    booth.capture_now().unwrap();

    let (_, photo) = booth.photos().photos().next().unwrap();
    assert_eq!((photo.width, photo.height), (640, 480));
}

#[tokio::test]
async fn captures_are_four_three_crops() {
    let mut booth = desktop_booth(SyntheticCamera::new(1920, 1080));
    booth.open().await.unwrap();
    booth.capture_now().unwrap();

    let (_, photo) = booth.photos().photos().next().unwrap();
    assert_eq!(photo.width * 3, photo.height * 4);
}

#[tokio::test]
async fn layout_switch_empties_the_set() {
    let mut booth = desktop_booth(SyntheticCamera::default());
    booth.open().await.unwrap();
    booth.capture_now().unwrap();
    assert!(booth.photos().has_photos());

    booth.select_layout(Layout::Grid).unwrap();
    assert!(booth.photos().is_empty());
    assert_eq!(booth.snapshot().layout, Layout::Grid);
}

#[tokio::test]
async fn layout_switch_is_refused_while_counting_down() {
    let mut booth = desktop_booth(SyntheticCamera::default());
    booth.select_layout(Layout::Row).unwrap();
    booth.open().await.unwrap();
    booth.start_timed_capture(true).unwrap();
    assert_eq!(booth.tick().unwrap(), TickOutcome::Counting(2));

    let err = booth.select_layout(Layout::Grid).unwrap_err();
    assert!(matches!(err, PhotoboothError::InvalidState { .. }));
    let snap = booth.snapshot();
    assert_eq!(snap.countdown.map(|c| c.remaining), Some(2));
    assert_eq!(snap.layout, Layout::Row);
    assert_eq!(booth.photos().slots().len(), 3);
}

#[tokio::test]
async fn failed_timed_capture_cancels_countdown_and_leaves_slot_empty() {
    let mut booth = desktop_booth(SyntheticCamera::default().dropping_frames_after(1));
    booth.select_layout(Layout::Column).unwrap();
    booth.open().await.unwrap();
    booth.start_timed_capture(true).unwrap();

    let mut failure = None;
    for _ in 0..6 {
        if let Err(e) = booth.tick() {
            failure = Some(e);
            break;
        }
    }
    let err = failure.expect("second capture should fail");
    assert!(matches!(err, PhotoboothError::Capture { .. }));

    let snap = booth.snapshot();
    assert!(snap.countdown.is_none());
    assert!(snap.ready);
    let slots = booth.photos().slots();
    assert!(!slots[0].is_empty());
    assert!(slots[1].is_empty() && slots[2].is_empty());
}

#[tokio::test]
async fn export_without_photos_is_an_export_error() {
    let booth = desktop_booth(SyntheticCamera::default());
    let err = booth
        .export_composite(&mut MemoryDownloads::default(), &mut MemorySurfaces::default())
        .unwrap_err();
    assert!(matches!(err, PhotoboothError::Export { .. }));
}

#[tokio::test]
async fn desktop_export_downloads_png() {
    let mut booth = desktop_booth(SyntheticCamera::default());
    booth.select_color(FrameColor::Yellow);
    booth.open().await.unwrap();
    booth.capture_now().unwrap();

    let mut downloads = MemoryDownloads::default();
    let outcome = booth
        .export_composite(&mut downloads, &mut MemorySurfaces::default())
        .unwrap();
    let ExportOutcome::Downloaded { file_name, .. } = outcome else {
        panic!("expected a download, got {outcome:?}");
    };
    assert!(file_name.starts_with("photobooth-") && file_name.ends_with(".png"));
    assert_eq!(downloads.revoked, 1);
}

#[tokio::test(start_paused = true)]
async fn handheld_export_opens_a_surface_without_failing() {
    let mut booth = iphone_booth(SyntheticCamera::default());
    assert_eq!(booth.capabilities().export_strategy(), ExportStrategy::NewSurface);
    booth.open().await.unwrap();
    assert!(booth.surface().is_mirrored());
    booth.capture_now().unwrap();

    let mut surfaces = MemorySurfaces::default();
    let outcome = booth
        .export_composite(&mut MemoryDownloads::default(), &mut surfaces)
        .unwrap();
    assert!(matches!(outcome, ExportOutcome::Surface { .. }));
    assert!(surfaces.pages[0].contains("<img src=\"data:image/png;base64,"));
}

#[tokio::test]
async fn handheld_over_http_is_refused_before_requesting_camera() {
    let camera = SyntheticCamera::default();
    let probe = camera.probe();
    let env = HostEnvironment::from_url(IPHONE_UA, "http://booth.example/");
    let mut booth = Photobooth::new(camera, HeadlessSurface::new(), PlatformCapabilities::detect(&env));

    let err = booth.open().await.unwrap_err();
    assert!(matches!(err, PhotoboothError::InsecureContext { .. }));
    assert!(probe.attempts().is_empty());
    assert!(!booth.snapshot().active);
}

#[tokio::test]
async fn surface_lost_during_acquisition_releases_stream() {
    let camera = SyntheticCamera::default();
    let probe = camera.probe();
    let mut booth = Photobooth::new(
        camera,
        HeadlessSurface::unmounted(),
        PlatformCapabilities::detect(&HostEnvironment::local()),
    );

    let err = booth.open().await.unwrap_err();
    assert!(matches!(err, PhotoboothError::CameraUnavailable { .. }));
    assert_eq!(probe.streams_opened(), 1);
    assert_eq!(probe.live_tracks(), 0);
    assert!(!booth.snapshot().active);
}

#[tokio::test(start_paused = true)]
async fn rejected_playback_closes_the_stream() {
    let camera = SyntheticCamera::default();
    let probe = camera.probe();
    let env = HostEnvironment::from_url(MAC_SAFARI_UA, "https://booth.example/");
    let mut booth = Photobooth::new(
        camera,
        HeadlessSurface::rejecting_playback("NotAllowedError"),
        PlatformCapabilities::detect(&env),
    );

    let err = booth.open().await.unwrap_err();
    assert!(matches!(err, PhotoboothError::Playback { .. }));
    assert_eq!(probe.live_tracks(), 0);
    assert!(!booth.snapshot().active);
}

#[tokio::test(start_paused = true)]
async fn countdown_driver_runs_to_completion() {
    let mut booth = desktop_booth(SyntheticCamera::default());
    booth.select_layout(Layout::Grid).unwrap();
    booth.open().await.unwrap();
    booth.start_timed_capture(true).unwrap();

    let (_tx, rx) = watch::channel(false);
    let started = tokio::time::Instant::now();
    let end = booth.run_countdown(rx).await.unwrap();

    assert_eq!(end, CountdownEnd::Finished { captures: 4 });
    assert_eq!(started.elapsed().as_secs(), 12);
    assert_eq!(booth.photos().photo_count(), 4);
    assert!(booth.snapshot().ready);
}

#[tokio::test(start_paused = true)]
async fn teardown_cancels_countdown_and_closes_camera() {
    let camera = SyntheticCamera::default();
    let probe = camera.probe();
    let mut booth = desktop_booth(camera);
    booth.open().await.unwrap();
    booth.start_timed_capture(false).unwrap();

    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(1500)).await;
        let _ = tx.send(true);
    });

    let end = booth.run_countdown(rx).await.unwrap();
    assert_eq!(end, CountdownEnd::Cancelled { captures: 0 });
    assert!(booth.photos().is_empty());
    assert_eq!(probe.live_tracks(), 0);
    assert!(!booth.snapshot().active);
}
