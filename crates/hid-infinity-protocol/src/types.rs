//! Platform and LED color types.

use serde::{Deserialize, Serialize};

/// One of the three figure platforms on the base.
///
/// The numbering matches the platform byte used by the LED commands and the
/// high nibble of each tag index entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    /// Hexagonal centre pad for play-set and toy-box pieces.
    Hexagon = 1,
    /// Left round pad.
    Player1 = 2,
    /// Right round pad.
    Player2 = 3,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::Hexagon, Platform::Player1, Platform::Player2];

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(raw: u8) -> Option<Self> {
        match raw {
            1 => Some(Platform::Hexagon),
            2 => Some(Platform::Player1),
            3 => Some(Platform::Player2),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Platform::Hexagon => "hexagon",
            Platform::Player1 => "player 1",
            Platform::Player2 => "player 2",
        }
    }
}

/// Raw platform byte as sent on the wire.
///
/// The LED commands accept any byte; the base ignores values it does not
/// know. Use [`Platform`] where only the three physical pads make sense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlatformId(pub u8);

impl PlatformId {
    pub fn platform(self) -> Option<Platform> {
        Platform::from_u8(self.0)
    }
}

impl From<Platform> for PlatformId {
    fn from(platform: Platform) -> Self {
        PlatformId(platform.as_u8())
    }
}

impl From<u8> for PlatformId {
    fn from(raw: u8) -> Self {
        PlatformId(raw)
    }
}

impl core::fmt::Display for PlatformId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.platform() {
            Some(platform) => write!(f, "{} ({})", self.0, platform.name()),
            None => write!(f, "{}", self.0),
        }
    }
}

/// 8-bit RGB LED color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const OFF: Color = Color::new(0, 0, 0);
    pub const WHITE: Color = Color::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_bytes(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

impl From<(u8, u8, u8)> for Color {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Color::new(r, g, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_numbering_matches_wire() {
        assert_eq!(Platform::Hexagon.as_u8(), 1);
        assert_eq!(Platform::Player1.as_u8(), 2);
        assert_eq!(Platform::Player2.as_u8(), 3);
    }

    #[test]
    fn platform_from_u8_rejects_unknown() {
        assert_eq!(Platform::from_u8(0), None);
        assert_eq!(Platform::from_u8(4), None);
        for platform in Platform::ALL {
            assert_eq!(Platform::from_u8(platform.as_u8()), Some(platform));
        }
    }

    #[test]
    fn platform_id_display() {
        assert_eq!(PlatformId(1).to_string(), "1 (hexagon)");
        assert_eq!(PlatformId(9).to_string(), "9");
    }

    #[test]
    fn color_bytes_are_rgb_order() {
        assert_eq!(Color::new(200, 56, 7).to_bytes(), [200, 56, 7]);
        assert_eq!(Color::OFF.to_bytes(), [0, 0, 0]);
    }
}
