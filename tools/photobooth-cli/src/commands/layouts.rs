//! List layouts and frame colors.

use photobooth_common::config::BoothDefaults;
use photobooth_model::{FrameColor, Layout};
use photobooth_render::CompositeStyle;

pub fn run() -> anyhow::Result<()> {
    let style = CompositeStyle::from_defaults(&BoothDefaults::default());

    println!("Layouts:");
    for layout in Layout::ALL {
        let (w, h) = style.canvas_size(layout);
        println!(
            "  {:<8} {:<10} {}x{} cells, {} photo(s), {w}x{h} px",
            layout.id(),
            layout.name(),
            layout.cols(),
            layout.rows(),
            layout.count()
        );
    }
    println!();

    println!("Frame colors:");
    for color in FrameColor::ALL {
        println!("  {:<8} {}", color.name(), color.hex());
    }
    Ok(())
}
