pub mod check;
pub mod compose;
pub mod layouts;
pub mod shoot;

use photobooth_model::{FrameColor, Layout};

/// Resolve a layout flag, falling back to the configured default.
pub(crate) fn resolve_layout(flag: Option<String>, default: &str) -> anyhow::Result<Layout> {
    Ok(flag.as_deref().unwrap_or(default).parse()?)
}

/// Resolve a color flag, falling back to the configured default.
pub(crate) fn resolve_color(flag: Option<String>, default: &str) -> anyhow::Result<FrameColor> {
    Ok(flag.as_deref().unwrap_or(default).parse()?)
}
