//! Compose existing images into a framed layout.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use photobooth_common::clock::{Clock, SystemClock};
use photobooth_common::config::BoothDefaults;
use photobooth_model::{CapturedImage, PhotoSet};
use photobooth_platform::ExportStrategy;
use photobooth_render::{
    compose, CompositeStyle, DirectoryDownloads, ExportAdapter, ExportOutcome, HtmlFileSurfaces,
};

use super::{resolve_color, resolve_layout};

pub fn run(
    defaults: BoothDefaults,
    images: Vec<PathBuf>,
    layout: Option<String>,
    color: Option<String>,
    output: Option<PathBuf>,
    surface: bool,
) -> anyhow::Result<()> {
    let layout = resolve_layout(layout, &defaults.layout)?;
    let color = resolve_color(color, &defaults.frame_color)?;
    let output = output.unwrap_or_else(|| defaults.output_dir.clone());

    if images.len() > layout.count() {
        tracing::warn!(
            given = images.len(),
            used = layout.count(),
            "More images than cells; extra images are ignored"
        );
    }

    let mut photos = PhotoSet::new(layout);
    for path in images.iter().take(layout.count()) {
        let pixels = image::open(path)
            .with_context(|| format!("Failed to read {}", path.display()))?
            .to_rgba8();
        let captured = CapturedImage::from_rgba(&pixels)
            .with_context(|| format!("Failed to encode {}", path.display()))?;
        photos.push(captured);
    }

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let style = CompositeStyle::from_defaults(&defaults);
    let canvas = compose(&photos, color, &style, &clock.date_stamp())?;
    println!(
        "Composed {} photo(s) into a {}x{} {} layout",
        canvas.placements.len(),
        canvas.width(),
        canvas.height(),
        layout.name()
    );

    let strategy = if surface {
        ExportStrategy::NewSurface
    } else {
        ExportStrategy::Download
    };
    let adapter = ExportAdapter::new(strategy, clock);
    let outcome = adapter.export(
        &canvas,
        &mut DirectoryDownloads::new(&output),
        &mut HtmlFileSurfaces::new(&output),
    )?;

    match outcome {
        ExportOutcome::Downloaded { location, .. } => println!("Saved {location}"),
        ExportOutcome::Surface { location, .. } => println!("Wrote save page {location}"),
    }
    Ok(())
}
