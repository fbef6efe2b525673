//! Frame colors used to fill and border a composite.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Named fill/border color for a composite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FrameColor {
    #[default]
    Pink,
    Yellow,
    Blue,
    Green,
    Purple,
}

impl FrameColor {
    /// All colors in palette order.
    pub const ALL: [FrameColor; 5] = [
        FrameColor::Pink,
        FrameColor::Yellow,
        FrameColor::Blue,
        FrameColor::Green,
        FrameColor::Purple,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FrameColor::Pink => "Pink",
            FrameColor::Yellow => "Yellow",
            FrameColor::Blue => "Blue",
            FrameColor::Green => "Green",
            FrameColor::Purple => "Purple",
        }
    }

    /// RGB components.
    pub fn rgb(self) -> [u8; 3] {
        match self {
            FrameColor::Pink => [0xff, 0x9e, 0xd8],
            FrameColor::Yellow => [0xf9, 0xf4, 0xa1],
            FrameColor::Blue => [0xa1, 0xe4, 0xf9],
            FrameColor::Green => [0xb8, 0xf9, 0xa1],
            FrameColor::Purple => [0xd8, 0xa1, 0xf9],
        }
    }

    /// Opaque RGBA components.
    pub fn rgba(self) -> [u8; 4] {
        let [r, g, b] = self.rgb();
        [r, g, b, 0xff]
    }

    /// CSS hex notation, e.g. `#ff9ed8`.
    pub fn hex(self) -> String {
        let [r, g, b] = self.rgb();
        format!("#{r:02x}{g:02x}{b:02x}")
    }
}

impl fmt::Display for FrameColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a color name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown frame color: {0}. Use: pink, yellow, blue, green, purple")]
pub struct UnknownColor(pub String);

impl FromStr for FrameColor {
    type Err = UnknownColor;

    /// Accepts a palette name or its hex value.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        FrameColor::ALL
            .into_iter()
            .find(|color| color.name().to_ascii_lowercase() == wanted || color.hex() == wanted)
            .ok_or_else(|| UnknownColor(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_matches_palette() {
        assert_eq!(FrameColor::Pink.hex(), "#ff9ed8");
        assert_eq!(FrameColor::Purple.hex(), "#d8a1f9");
    }

    #[test]
    fn parses_name_or_hex() {
        assert_eq!("green".parse::<FrameColor>().unwrap(), FrameColor::Green);
        assert_eq!("#A1E4F9".parse::<FrameColor>().unwrap(), FrameColor::Blue);
        assert!("teal".parse::<FrameColor>().is_err());
    }
}
