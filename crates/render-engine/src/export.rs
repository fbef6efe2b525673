//! Delivering a finished composite to the user.
//!
//! Two strategies exist. Where programmatic downloads work, the PNG payload
//! is handed to a [`DownloadTarget`] through a transient object URL that is
//! always released afterwards. Where they do not (handheld browsers), a new
//! display surface is opened with the image and instructions for saving it
//! by long-pressing.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use photobooth_common::clock::Clock;
use photobooth_common::error::{PhotoboothError, PhotoboothResult};
use photobooth_model::{encode_png, to_data_url, PNG_MIME};
use photobooth_platform::{ExportStrategy, PlatformCapabilities};

use crate::compositor::CompositeCanvas;

/// Receives file downloads.
pub trait DownloadTarget {
    /// Register a payload and return a transient URL referring to it.
    fn create_object_url(&mut self, payload: &[u8], mime: &str) -> PhotoboothResult<String>;

    /// Retrieve the payload behind `url` under `file_name`.
    ///
    /// Returns where the file ended up.
    fn trigger(&mut self, url: &str, file_name: &str) -> PhotoboothResult<String>;

    /// Release a URL from [`create_object_url`](Self::create_object_url).
    fn revoke(&mut self, url: &str);
}

/// Identifies a display surface opened by a [`SurfaceHost`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub u64);

/// Opens new display surfaces (tabs, windows).
pub trait SurfaceHost {
    /// Open a blank surface, or `None` when the host refuses (popup blocked).
    fn open_surface(&mut self) -> Option<SurfaceId>;

    /// Replace the surface's document. Returns where it can be viewed.
    fn write_document(&mut self, surface: SurfaceId, html: &str) -> PhotoboothResult<String>;
}

/// What an export produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Downloaded {
        file_name: String,
        location: String,
        bytes: usize,
    },
    Surface {
        surface: SurfaceId,
        location: String,
    },
}

/// Encodes composites and delivers them with the platform's strategy.
#[derive(Clone)]
pub struct ExportAdapter {
    strategy: ExportStrategy,
    clock: Arc<dyn Clock>,
}

impl ExportAdapter {
    pub fn new(strategy: ExportStrategy, clock: Arc<dyn Clock>) -> Self {
        Self { strategy, clock }
    }

    pub fn from_capabilities(capabilities: &PlatformCapabilities, clock: Arc<dyn Clock>) -> Self {
        Self::new(capabilities.export_strategy(), clock)
    }

    pub fn strategy(&self) -> ExportStrategy {
        self.strategy
    }

    /// `photobooth-<unix millis>.png`
    pub fn file_name(&self) -> String {
        format!("photobooth-{}.png", self.clock.unix_millis())
    }

    /// Encode `canvas` as PNG and deliver it.
    pub fn export(
        &self,
        canvas: &CompositeCanvas,
        downloads: &mut dyn DownloadTarget,
        surfaces: &mut dyn SurfaceHost,
    ) -> PhotoboothResult<ExportOutcome> {
        let payload = encode_png(&canvas.pixels).map_err(|e| {
            tracing::error!(error = %e, "Failed to encode composite");
            PhotoboothError::export(format!("could not encode the photo: {e}"))
        })?;

        match self.strategy {
            ExportStrategy::Download => self.download(&payload, downloads),
            ExportStrategy::NewSurface => {
                let data_url = to_data_url(PNG_MIME, &payload);
                show_on_new_surface(&data_url, &canvas.color.hex(), surfaces)
            }
        }
    }

    fn download(
        &self,
        payload: &[u8],
        downloads: &mut dyn DownloadTarget,
    ) -> PhotoboothResult<ExportOutcome> {
        let file_name = self.file_name();
        let url = downloads.create_object_url(payload, PNG_MIME)?;
        let triggered = downloads.trigger(&url, &file_name);
        downloads.revoke(&url);

        let location = triggered.map_err(|e| {
            tracing::error!(file = %file_name, error = %e, "Download failed");
            e
        })?;
        tracing::info!(file = %file_name, %location, bytes = payload.len(), "Photo downloaded");
        Ok(ExportOutcome::Downloaded {
            file_name,
            location,
            bytes: payload.len(),
        })
    }
}

impl std::fmt::Debug for ExportAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportAdapter")
            .field("strategy", &self.strategy)
            .finish_non_exhaustive()
    }
}

fn show_on_new_surface(
    data_url: &str,
    frame_hex: &str,
    surfaces: &mut dyn SurfaceHost,
) -> PhotoboothResult<ExportOutcome> {
    let Some(surface) = surfaces.open_surface() else {
        tracing::warn!("Surface host refused to open a new surface");
        return Err(PhotoboothError::export(
            "unable to open a new window; check your popup blocker settings",
        ));
    };
    let location = surfaces.write_document(surface, &save_page_html(data_url, frame_hex))?;
    tracing::info!(surface = surface.0, %location, "Photo shown for manual save");
    Ok(ExportOutcome::Surface { surface, location })
}

/// Standalone page showing the photo with long-press save instructions.
pub fn save_page_html(data_url: &str, frame_hex: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    <title>Save Your Photo</title>
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <style>
      body {{ font-family: -apple-system, sans-serif; margin: 0; padding: 20px; text-align: center; background-color: #f8f8f8; }}
      img {{ max-width: 100%; border: 10px solid {frame_hex}; box-shadow: 0 4px 12px rgba(0,0,0,0.1); margin-bottom: 20px; }}
      h2 {{ color: #333; }}
      p {{ color: #666; line-height: 1.5; }}
    </style>
  </head>
  <body>
    <h2>Your Photo is Ready!</h2>
    <img src="{data_url}" alt="Your Photobooth Picture" />
    <p>Press and hold on the image to save it to your photos.</p>
  </body>
</html>
"#
    )
}

/// Downloads land as files in a directory.
#[derive(Debug)]
pub struct DirectoryDownloads {
    dir: PathBuf,
    pending: HashMap<String, Vec<u8>>,
    next_id: u64,
}

impl DirectoryDownloads {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            pending: HashMap::new(),
            next_id: 0,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Object URLs not yet revoked.
    pub fn outstanding_urls(&self) -> usize {
        self.pending.len()
    }
}

impl DownloadTarget for DirectoryDownloads {
    fn create_object_url(&mut self, payload: &[u8], mime: &str) -> PhotoboothResult<String> {
        self.next_id += 1;
        let url = format!("blob:photobooth/{}#{mime}", self.next_id);
        self.pending.insert(url.clone(), payload.to_vec());
        Ok(url)
    }

    fn trigger(&mut self, url: &str, file_name: &str) -> PhotoboothResult<String> {
        let payload = self
            .pending
            .get(url)
            .ok_or_else(|| PhotoboothError::export(format!("unknown object URL {url}")))?;
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(file_name);
        std::fs::write(&path, payload)?;
        Ok(path.display().to_string())
    }

    fn revoke(&mut self, url: &str) {
        self.pending.remove(url);
    }
}

/// Surfaces are HTML files written into a directory.
#[derive(Debug)]
pub struct HtmlFileSurfaces {
    dir: PathBuf,
    blocked: bool,
    next_id: u64,
}

impl HtmlFileSurfaces {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            blocked: false,
            next_id: 0,
        }
    }

    /// A host that refuses every surface, like a popup blocker.
    pub fn blocked(dir: impl Into<PathBuf>) -> Self {
        Self {
            blocked: true,
            ..Self::new(dir)
        }
    }

    fn path_of(&self, surface: SurfaceId) -> PathBuf {
        self.dir.join(format!("photobooth-surface-{}.html", surface.0))
    }
}

impl SurfaceHost for HtmlFileSurfaces {
    fn open_surface(&mut self) -> Option<SurfaceId> {
        if self.blocked {
            return None;
        }
        self.next_id += 1;
        Some(SurfaceId(self.next_id))
    }

    fn write_document(&mut self, surface: SurfaceId, html: &str) -> PhotoboothResult<String> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_of(surface);
        std::fs::write(&path, html)?;
        Ok(path.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use image::{Rgba, RgbaImage};
    use photobooth_common::clock::FixedClock;
    use photobooth_model::{FrameColor, Layout};

    use super::*;

    #[derive(Default)]
    struct RecordingDownloads {
        created: Vec<String>,
        revoked: Vec<String>,
        triggered: Vec<String>,
        fail_trigger: bool,
    }

    impl DownloadTarget for RecordingDownloads {
        fn create_object_url(&mut self, _payload: &[u8], _mime: &str) -> PhotoboothResult<String> {
            let url = format!("blob:test/{}", self.created.len());
            self.created.push(url.clone());
            Ok(url)
        }

        fn trigger(&mut self, _url: &str, file_name: &str) -> PhotoboothResult<String> {
            if self.fail_trigger {
                return Err(PhotoboothError::export("download refused"));
            }
            self.triggered.push(file_name.to_string());
            Ok(format!("memory://{file_name}"))
        }

        fn revoke(&mut self, url: &str) {
            self.revoked.push(url.to_string());
        }
    }

    #[derive(Default)]
    struct RecordingSurfaces {
        blocked: bool,
        documents: Vec<String>,
    }

    impl SurfaceHost for RecordingSurfaces {
        fn open_surface(&mut self) -> Option<SurfaceId> {
            (!self.blocked).then_some(SurfaceId(7))
        }

        fn write_document(&mut self, surface: SurfaceId, html: &str) -> PhotoboothResult<String> {
            self.documents.push(html.to_string());
            Ok(format!("surface://{}", surface.0))
        }
    }

    fn canvas(width: u32, height: u32) -> CompositeCanvas {
        CompositeCanvas {
            pixels: RgbaImage::from_pixel(width, height, Rgba(FrameColor::Green.rgba())),
            layout: Layout::Single,
            color: FrameColor::Green,
            placements: Vec::new(),
            date_stamp: "1/1/2024".to_string(),
        }
    }

    fn adapter(strategy: ExportStrategy) -> ExportAdapter {
        let clock = FixedClock::at_date(2024, 1, 1).unwrap();
        ExportAdapter::new(strategy, Arc::new(clock))
    }

    #[test]
    fn download_names_file_after_clock_and_revokes_url() {
        let adapter = adapter(ExportStrategy::Download);
        let mut downloads = RecordingDownloads::default();
        let mut surfaces = RecordingSurfaces::default();

        let outcome = adapter.export(&canvas(40, 30), &mut downloads, &mut surfaces).unwrap();
        let expected = adapter.file_name();
        assert!(expected.starts_with("photobooth-") && expected.ends_with(".png"));
        assert!(matches!(outcome, ExportOutcome::Downloaded { ref file_name, .. } if *file_name == expected));
        assert_eq!(downloads.triggered, vec![expected]);
        assert_eq!(downloads.revoked, downloads.created);
        assert!(surfaces.documents.is_empty());
    }

    #[test]
    fn failed_trigger_still_revokes_url() {
        let adapter = adapter(ExportStrategy::Download);
        let mut downloads = RecordingDownloads {
            fail_trigger: true,
            ..RecordingDownloads::default()
        };
        let err = adapter
            .export(&canvas(40, 30), &mut downloads, &mut RecordingSurfaces::default())
            .unwrap_err();
        assert!(matches!(err, PhotoboothError::Export { .. }));
        assert_eq!(downloads.revoked.len(), 1);
    }

    #[test]
    fn new_surface_shows_framed_image_with_instructions() {
        let adapter = adapter(ExportStrategy::NewSurface);
        let mut downloads = RecordingDownloads::default();
        let mut surfaces = RecordingSurfaces::default();

        let outcome = adapter.export(&canvas(40, 30), &mut downloads, &mut surfaces).unwrap();
        assert!(matches!(outcome, ExportOutcome::Surface { surface: SurfaceId(7), .. }));
        assert!(downloads.created.is_empty());

        let page = &surfaces.documents[0];
        assert!(page.contains("<title>Save Your Photo</title>"));
        assert!(page.contains(r#"<img src="data:image/png;base64,"#));
        assert!(page.contains("border: 10px solid #b8f9a1"));
        assert!(page.contains("Press and hold"));
    }

    #[test]
    fn blocked_surface_is_an_export_error() {
        let adapter = adapter(ExportStrategy::NewSurface);
        let mut surfaces = RecordingSurfaces {
            blocked: true,
            ..RecordingSurfaces::default()
        };
        let err = adapter
            .export(&canvas(40, 30), &mut RecordingDownloads::default(), &mut surfaces)
            .unwrap_err();
        assert!(matches!(err, PhotoboothError::Export { .. }));
    }

    #[test]
    fn zero_size_canvas_is_an_export_error() {
        let adapter = adapter(ExportStrategy::Download);
        let mut downloads = RecordingDownloads::default();
        let err = adapter
            .export(&canvas(0, 0), &mut downloads, &mut RecordingSurfaces::default())
            .unwrap_err();
        assert!(matches!(err, PhotoboothError::Export { .. }));
        assert!(downloads.created.is_empty());
    }

    #[test]
    fn directory_downloads_write_png_and_release_urls() {
        let dir = std::env::temp_dir().join("photobooth_test_downloads");
        let _ = std::fs::remove_dir_all(&dir);
        let adapter = adapter(ExportStrategy::Download);
        let mut downloads = DirectoryDownloads::new(&dir);

        let outcome = adapter
            .export(&canvas(40, 30), &mut downloads, &mut RecordingSurfaces::default())
            .unwrap();
        let ExportOutcome::Downloaded { file_name, bytes, .. } = outcome else {
            panic!("expected a download");
        };
        let written = std::fs::read(dir.join(&file_name)).unwrap();
        assert_eq!(written.len(), bytes);
        assert_eq!(&written[1..4], b"PNG");
        assert_eq!(downloads.outstanding_urls(), 0);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn html_file_surfaces_honor_blocking() {
        let dir = std::env::temp_dir().join("photobooth_test_surfaces");
        let _ = std::fs::remove_dir_all(&dir);

        let mut blocked = HtmlFileSurfaces::blocked(&dir);
        assert!(blocked.open_surface().is_none());

        let mut surfaces = HtmlFileSurfaces::new(&dir);
        let surface = surfaces.open_surface().unwrap();
        let location = surfaces.write_document(surface, "<html></html>").unwrap();
        assert_eq!(std::fs::read_to_string(location).unwrap(), "<html></html>");

        let _ = std::fs::remove_dir_all(&dir);
    }
}
