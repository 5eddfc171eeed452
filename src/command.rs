//! Wire command encoding
//!
//! Every light group speaks the same ASCII protocol, one command per datagram:
//!
//! ```text
//! <GroupPrefix><ColorTag><WireValue>
//! ```
//!
//! `LZ2` + White + level 3 encodes as `LZ2W6`. The wire values are device
//! codes, not percentages, and the table is fixed at six columns no matter
//! what range a group's own slider has.

use crate::error::ControlError;
use crate::model::{ColorCode, IntensityLevel};

/// Device code emitted for an intensity level.
pub type WireValue = u8;

/// Highest level the command table can encode.
pub const TABLE_MAX_LEVEL: IntensityLevel = 5;

pub const WIRE_VALUES: [WireValue; 6] = [0, 2, 4, 6, 8, 10];

/// 8x6 lookup, one row per [`ColorCode`] in declaration order. Every row is
/// currently identical but they are kept separate since the controller
/// firmware addresses them independently.
const COMMAND_TABLE: [[WireValue; 6]; 8] = [WIRE_VALUES; 8];

/// Look up the wire value for `(color, intensity)`.
pub fn encode(color: ColorCode, intensity: IntensityLevel) -> Result<WireValue, ControlError> {
    let row = COMMAND_TABLE
        .get(color.index())
        .ok_or(ControlError::InvalidIndex {
            color: color.index(),
            intensity: intensity as i32,
        })?;
    row.get(intensity as usize)
        .copied()
        .ok_or(ControlError::InvalidIndex {
            color: color.index(),
            intensity: intensity as i32,
        })
}

/// Build the full datagram text for a group.
pub fn compose_message(
    prefix: &str,
    color: ColorCode,
    intensity: IntensityLevel,
) -> Result<String, ControlError> {
    let value = encode(color, intensity)?;
    Ok(format!("{}{}{}", prefix, color.tag(), value))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MisterLevel {
    Low,
    High,
}

impl MisterLevel {
    pub fn label(self) -> &'static str {
        match self {
            MisterLevel::Low => "low",
            MisterLevel::High => "high",
        }
    }
}

/// Scenes on the scenes page. Abductions run a countdown, roaming scenes do not.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SceneCue {
    ClassicalAbduction,
    RomanticAbduction,
    PartyAbduction,
    ClassicRoaming,
    PartyRoaming,
}

impl SceneCue {
    pub const ALL: [SceneCue; 5] = [
        SceneCue::ClassicalAbduction,
        SceneCue::RomanticAbduction,
        SceneCue::PartyAbduction,
        SceneCue::ClassicRoaming,
        SceneCue::PartyRoaming,
    ];

    /// Cue id shared by the lighting controller and QLab.
    pub fn id(self) -> &'static str {
        match self {
            SceneCue::ClassicalAbduction => "SC1",
            SceneCue::RomanticAbduction => "SC2",
            SceneCue::PartyAbduction => "SC3",
            SceneCue::ClassicRoaming => "RO1",
            SceneCue::PartyRoaming => "RO2",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SceneCue::ClassicalAbduction => "Classical Abduction",
            SceneCue::RomanticAbduction => "Romantic Abduction",
            SceneCue::PartyAbduction => "Party Abduction",
            SceneCue::ClassicRoaming => "Classic Roaming",
            SceneCue::PartyRoaming => "Party Roaming",
        }
    }

    pub fn slot(self) -> SceneSlot {
        match self {
            SceneCue::ClassicRoaming | SceneCue::PartyRoaming => SceneSlot::Roaming,
            _ => SceneSlot::Abduction,
        }
    }
}

/// Literal commands for the effect toggles. These share the sink with the
/// light groups but never go through the command table, except the fogger
/// level which reuses the wire values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlCommand {
    FoggerOn,
    FoggerOff,
    FoggerLevel(WireValue),
    MisterOn,
    MisterOff,
    Mister(MisterLevel),
    LedSignsOn,
    LedSignsOff,
    SceneFoggerStart(SceneCue),
    SceneFoggerStop(SceneCue),
    /// Sent after a classical abduction stops.
    ClassicalLightsStop,
    /// Sent after a party abduction stops.
    PartyLightsStop,
    /// Lights-only show, running one of four programs.
    LightsOnlyStart(u8),
    LightsOnlyStop,
}

impl ControlCommand {
    pub fn wire(&self) -> String {
        match self {
            ControlCommand::FoggerOn => "FOG1on".to_string(),
            ControlCommand::FoggerOff => "FOG1OFF".to_string(),
            ControlCommand::FoggerLevel(value) => format!("FOG1{}", value),
            ControlCommand::MisterOn => "MSTON".to_string(),
            ControlCommand::MisterOff => "MSTOFF".to_string(),
            ControlCommand::Mister(level) => format!("MST{}", level.label().to_uppercase()),
            ControlCommand::LedSignsOn => "LEDON".to_string(),
            ControlCommand::LedSignsOff => "LEDOFF".to_string(),
            ControlCommand::SceneFoggerStart(cue) => format!("{}F1start", cue.id()),
            ControlCommand::SceneFoggerStop(cue) => format!("{}F1stop", cue.id()),
            ControlCommand::ClassicalLightsStop => "CALS".to_string(),
            ControlCommand::PartyLightsStop => "PALS".to_string(),
            ControlCommand::LightsOnlyStart(program) => format!("SR{}start", program),
            ControlCommand::LightsOnlyStop => "SRstop".to_string(),
        }
    }
}

/// Abductions and roaming scenes run side by side, one of each at a time.
/// Each slot also has its own mic channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SceneSlot {
    Abduction,
    Roaming,
}

impl SceneSlot {
    pub fn label(self) -> &'static str {
        match self {
            SceneSlot::Abduction => "Abduction",
            SceneSlot::Roaming => "Roaming",
        }
    }

    fn mic_prefix(self) -> &'static str {
        match self {
            SceneSlot::Abduction => "ABD",
            SceneSlot::Roaming => "RO",
        }
    }
}

/// Highest level of the scene mic sliders.
pub const MIC_MAX_LEVEL: u8 = 5;

/// Highest level of the aux (background sound) slider.
pub const AUX_MAX_LEVEL: u8 = 100;

/// QLab cues, fired as OSC messages with no arguments.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QlabCue {
    Scene(SceneCue),
    EmergencyStop,
    Mic(SceneSlot, bool),
    MicLevel(SceneSlot, u8),
    Sound(bool),
    /// Aux level 0..=100, mapped onto QLab's 25 aux cues.
    AuxLevel(u8),
    Pa(bool),
    PaLevel(IntensityLevel),
}

fn on_off(on: bool) -> &'static str {
    if on {
        "ON"
    } else {
        "OFF"
    }
}

impl QlabCue {
    pub fn address(&self) -> String {
        let cue = match self {
            QlabCue::Scene(scene) => scene.id().to_string(),
            QlabCue::EmergencyStop => "EMS".to_string(),
            QlabCue::Mic(slot, on) => format!("{}MIC{}", slot.mic_prefix(), on_off(*on)),
            QlabCue::MicLevel(slot, level) => {
                format!("{}MIC{}", slot.mic_prefix(), (*level).min(MIC_MAX_LEVEL))
            }
            QlabCue::Sound(on) => format!("AUX{}", on_off(*on)),
            QlabCue::AuxLevel(level) => {
                let level = (*level).min(AUX_MAX_LEVEL) as u32;
                format!("AUX{}", (level * 24 + 50) / 100)
            }
            QlabCue::Pa(on) => format!("MIC{}", on_off(*on)),
            QlabCue::PaLevel(level) => {
                format!("MIC{}", WIRE_VALUES[(*level).min(TABLE_MAX_LEVEL) as usize])
            }
        };
        format!("/cue/{}/go", cue)
    }
}
