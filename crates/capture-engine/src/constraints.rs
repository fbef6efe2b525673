//! Camera request constraints and the per-platform fallback tiers.

use photobooth_platform::NegotiationStrategy;
use serde::{Deserialize, Serialize};

/// Which camera to prefer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacingMode {
    /// Front (selfie) camera.
    User,
    /// Rear camera.
    Environment,
}

/// Preferred and maximum size along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DimensionRange {
    pub ideal: Option<u32>,
    pub max: Option<u32>,
}

impl DimensionRange {
    pub fn ideal(value: u32) -> Self {
        Self {
            ideal: Some(value),
            max: None,
        }
    }

    pub fn bounded(ideal: u32, max: u32) -> Self {
        Self {
            ideal: Some(ideal),
            max: Some(max),
        }
    }

    /// The size a device with `native` pixels along this axis would pick.
    pub fn resolve(&self, native: u32) -> u32 {
        let wanted = self.ideal.unwrap_or(native);
        match self.max {
            Some(max) => wanted.min(max),
            None => wanted,
        }
    }
}

/// Video part of a camera request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum VideoConstraints {
    /// Any camera at any resolution.
    Any,
    /// A camera facing a given way, optionally size-constrained.
    Facing {
        mode: FacingMode,
        width: Option<DimensionRange>,
        height: Option<DimensionRange>,
    },
}

/// A complete camera request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaConstraints {
    pub audio: bool,
    pub video: VideoConstraints,
}

impl MediaConstraints {
    /// Front camera, 640x480 preferred, at most 1280x720.
    pub fn handheld_front() -> Self {
        Self::video(VideoConstraints::Facing {
            mode: FacingMode::User,
            width: Some(DimensionRange::bounded(640, 1280)),
            height: Some(DimensionRange::bounded(480, 720)),
        })
    }

    /// Any camera.
    pub fn any_video() -> Self {
        Self::video(VideoConstraints::Any)
    }

    /// Rear camera, no size preference.
    pub fn rear() -> Self {
        Self::video(VideoConstraints::Facing {
            mode: FacingMode::Environment,
            width: None,
            height: None,
        })
    }

    /// Front camera with a 1280x720 preference.
    pub fn desktop_front() -> Self {
        Self::video(VideoConstraints::Facing {
            mode: FacingMode::User,
            width: Some(DimensionRange::ideal(1280)),
            height: Some(DimensionRange::ideal(720)),
        })
    }

    fn video(video: VideoConstraints) -> Self {
        Self {
            audio: false,
            video,
        }
    }

    /// Requested facing mode, if any.
    pub fn facing(&self) -> Option<FacingMode> {
        match &self.video {
            VideoConstraints::Facing { mode, .. } => Some(*mode),
            VideoConstraints::Any => None,
        }
    }

    /// Resolution a device with the given native size would deliver.
    pub fn resolve_size(&self, native_width: u32, native_height: u32) -> (u32, u32) {
        match &self.video {
            VideoConstraints::Any => (native_width, native_height),
            VideoConstraints::Facing { width, height, .. } => (
                width.map_or(native_width, |w| w.resolve(native_width)),
                height.map_or(native_height, |h| h.resolve(native_height)),
            ),
        }
    }
}

/// Ordered requests to try for a strategy; the first that succeeds wins.
pub fn constraint_tiers(strategy: NegotiationStrategy) -> Vec<MediaConstraints> {
    match strategy {
        NegotiationStrategy::HandheldTiered => vec![
            MediaConstraints::handheld_front(),
            MediaConstraints::any_video(),
            MediaConstraints::rear(),
        ],
        NegotiationStrategy::DesktopPreferred => vec![MediaConstraints::desktop_front()],
        NegotiationStrategy::Unconstrained => vec![MediaConstraints::any_video()],
    }
}
