//! Photobooth Model
//!
//! Defines the data contracts shared by every pipeline stage:
//! - **Layout:** the fixed set of cell arrangements a composite can take
//! - **FrameColor:** the fill/border palette
//! - **CapturedImage:** a frame encoded as a self-describing PNG data URL
//! - **PhotoSet:** index-stable slots of captured images for one layout
//!
//! Nothing here is persisted; every value lives for one page session.

pub mod captured;
pub mod color;
pub mod layout;
pub mod photo_set;

pub use captured::*;
pub use color::*;
pub use layout::*;
pub use photo_set::*;
