//! Photobooth Controller
//!
//! The surface a UI talks to. It owns the camera, the capture session, and
//! the photo set, and exposes the booth's operations:
//!
//! - `open` / `close`: acquire and release the camera
//! - `capture_now`: one photo, right away
//! - `start_timed_capture` + `run_countdown`: countdown captures, single or
//!   filling the whole layout
//! - `select_layout` / `select_color` / `clear_photos`
//! - `compose` / `export_composite`
//! - `snapshot`: the observable state to render

pub mod booth;
pub mod driver;

pub use booth::*;
pub use driver::*;
