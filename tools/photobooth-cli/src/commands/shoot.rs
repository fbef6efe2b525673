//! Run a timed capture and export the composite.

use std::path::PathBuf;

use photobooth_capture::{CameraBackend, HeadlessSurface, SyntheticCamera};
use photobooth_common::config::BoothDefaults;
use photobooth_controller::{CountdownEnd, Photobooth};
use photobooth_model::{FrameColor, Layout};
use photobooth_platform::{HostEnvironment, PlatformCapabilities};
use photobooth_render::{DirectoryDownloads, ExportOutcome, HtmlFileSurfaces};
use tokio::sync::watch;

use super::{resolve_color, resolve_layout};

pub struct ShootOptions {
    pub layout: Option<String>,
    pub color: Option<String>,
    pub multi: bool,
    pub count_secs: Option<u8>,
    pub output: Option<PathBuf>,
    pub user_agent: Option<String>,
    pub url: String,
    pub width: u32,
    pub height: u32,
    pub synthetic: bool,
    pub device: usize,
    pub rear_device: Option<usize>,
}

pub async fn run(mut defaults: BoothDefaults, opts: ShootOptions) -> anyhow::Result<()> {
    let layout = resolve_layout(opts.layout, &defaults.layout)?;
    let color = resolve_color(opts.color, &defaults.frame_color)?;
    if let Some(secs) = opts.count_secs {
        defaults.countdown_secs = secs;
    }
    let output = opts.output.unwrap_or_else(|| defaults.output_dir.clone());

    let ua = opts
        .user_agent
        .unwrap_or_else(|| HostEnvironment::local().user_agent);
    let caps = PlatformCapabilities::detect(&HostEnvironment::from_url(ua, &opts.url));

    println!("Photobooth session");
    println!("  Browser: {}", caps.browser.label());
    println!("  Layout: {} ({} photo(s))", layout.name(), layout.count());
    println!("  Frame: {} {}", color.name(), color.hex());

    #[cfg(all(feature = "v4l", target_os = "linux"))]
    if !opts.synthetic {
        let mut camera = photobooth_capture::V4lCamera::new(opts.device);
        if let Some(rear) = opts.rear_device {
            camera = camera.with_rear(rear);
        }
        println!("  Camera: /dev/video{}", opts.device);
        return shoot(camera, caps, defaults, layout, color, opts.multi, output).await;
    }

    if !opts.synthetic {
        tracing::warn!(
            device = opts.device,
            rear_device = ?opts.rear_device,
            "Built without camera hardware support, using the synthetic camera"
        );
    }
    println!("  Camera: synthetic {}x{}", opts.width, opts.height);
    let camera = SyntheticCamera::new(opts.width, opts.height);
    shoot(camera, caps, defaults, layout, color, opts.multi, output).await
}

async fn shoot<B: CameraBackend>(
    camera: B,
    caps: PlatformCapabilities,
    defaults: BoothDefaults,
    layout: Layout,
    color: FrameColor,
    multi: bool,
    output: PathBuf,
) -> anyhow::Result<()> {
    println!("  Output: {}", output.display());
    println!();

    let mut booth =
        Photobooth::new(camera, HeadlessSurface::new(), caps).with_defaults(&defaults)?;
    booth.select_layout(layout)?;
    booth.select_color(color);

    booth.open().await?;
    println!("Camera ready. Press Ctrl+C to cancel.");

    let countdown = booth.start_timed_capture(multi)?;
    println!("Smile! Countdown from {}", countdown.remaining);

    let (teardown_tx, teardown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = teardown_tx.send(true);
        }
    });

    match booth.run_countdown(teardown_rx).await? {
        CountdownEnd::Finished { captures } => println!("Captured {captures} photo(s)"),
        CountdownEnd::Cancelled { captures } => {
            println!("Cancelled after {captures} photo(s)");
            return Ok(());
        }
    }

    let mut downloads = DirectoryDownloads::new(&output);
    let mut surfaces = HtmlFileSurfaces::new(&output);
    let outcome = booth.export_composite(&mut downloads, &mut surfaces)?;
    booth.close();

    match outcome {
        ExportOutcome::Downloaded { location, bytes, .. } => {
            println!("Saved {location} ({bytes} bytes)");
        }
        ExportOutcome::Surface { location, .. } => {
            println!("Open {location} and press and hold the photo to save it");
        }
    }
    Ok(())
}
