use crate::model::{GroupId, ZoneId};
use thiserror::Error;

/// Failures inside the lighting core. None of these are fatal: the worst
/// outcome is a physical light that no longer matches the panel.
#[derive(Debug, Error)]
pub enum ControlError {
    #[error("no command table entry for color index {color}, intensity {intensity}")]
    InvalidIndex { color: usize, intensity: i32 },

    #[error("failed to transmit {command:?}: {source}")]
    TransmitFailure {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode {command:?}: {reason}")]
    Encode { command: String, reason: String },

    #[error("group {group} is not registered with zone {zone}")]
    UnregisteredGroup { group: GroupId, zone: ZoneId },

    #[error("unknown light group {0}")]
    UnknownGroup(GroupId),
}
