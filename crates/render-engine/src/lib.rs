//! Photobooth Render Engine
//!
//! Turns a photo set into a single framed composite image and delivers it.
//!
//! # Pipeline Architecture
//!
//! ```text
//! PhotoSet ──┐
//!            ├── Canvas (cols x rows cells, frame color fill + border)
//! Layout ────┘         │
//!                      ├── Photos (fit + center per cell, slot order)
//! FrameColor ──────────┘         │
//!                                ├── Date watermark (bitmap font)
//! Clock ─────────────────────────┘         │
//!                                          ▼
//!                                     Encode (PNG)
//!                                          │
//!                         ┌────────────────┴────────────────┐
//!                         ▼                                 ▼
//!               DownloadTarget                       SurfaceHost
//!        (object URL, trigger, revoke)       (save page, long-press hint)
//! ```

pub mod compositor;
pub mod export;
pub mod watermark;

pub use compositor::*;
pub use export::*;
pub use watermark::*;
