use serde::{Deserialize, Serialize};
use std::fmt;

pub type GroupId = u64;

/// Intensity level as shown on a slider. Not a wire value.
pub type IntensityLevel = u8;

/// Colours a light group can be set to. Order matches the command table rows.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColorCode {
    Red,
    Orange,
    Yellow,
    Green,
    Blue,
    Indigo,
    Violet,
    White,
}

impl ColorCode {
    pub const ALL: [ColorCode; 8] = [
        ColorCode::Red,
        ColorCode::Orange,
        ColorCode::Yellow,
        ColorCode::Green,
        ColorCode::Blue,
        ColorCode::Indigo,
        ColorCode::Violet,
        ColorCode::White,
    ];

    /// Single-letter tag used on the wire.
    pub fn tag(self) -> char {
        match self {
            ColorCode::Red => 'R',
            ColorCode::Orange => 'O',
            ColorCode::Yellow => 'Y',
            ColorCode::Green => 'G',
            ColorCode::Blue => 'B',
            ColorCode::Indigo => 'I',
            ColorCode::Violet => 'V',
            ColorCode::White => 'W',
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            ColorCode::Red => "Red",
            ColorCode::Orange => "Orange",
            ColorCode::Yellow => "Yellow",
            ColorCode::Green => "Green",
            ColorCode::Blue => "Blue",
            ColorCode::Indigo => "Indigo",
            ColorCode::Violet => "Violet",
            ColorCode::White => "White",
        }
    }

    /// Swatch colour for the touchscreen buttons.
    pub fn swatch(self) -> [u8; 3] {
        match self {
            ColorCode::Red => [255, 0, 0],
            ColorCode::Orange => [255, 165, 0],
            ColorCode::Yellow => [255, 255, 0],
            ColorCode::Green => [0, 128, 0],
            ColorCode::Blue => [0, 0, 255],
            ColorCode::Indigo => [75, 0, 130],
            ColorCode::Violet => [138, 43, 226], // #8A2BE2
            ColorCode::White => [255, 255, 255],
        }
    }
}

impl fmt::Display for ColorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether a group follows its zone's master slider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LockState {
    #[default]
    Normal,
    /// The user parked the slider at 0. Master moves are ignored until a
    /// nonzero value is set on the group itself.
    LockedAtZero,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ZoneId {
    Exterior,
    Interior,
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZoneId::Exterior => f.write_str("Exterior"),
            ZoneId::Interior => f.write_str("Interior"),
        }
    }
}

/// Sent by a controller over the registry channel whenever its intensity changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GroupEvent {
    MemberChanged { group: GroupId, zone: ZoneId },
}
