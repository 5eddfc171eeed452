use crate::command::{ControlCommand, MisterLevel, TABLE_MAX_LEVEL, WIRE_VALUES};
use crate::model::IntensityLevel;
use crate::sink::CommandSink;
use log::{debug, info, warn};
use std::rc::Rc;

/// Fogger, mister and LED-sign toggles. They share the light sink but use
/// fixed literals instead of the colour table.
pub struct EffectsPanel {
    sink: Rc<dyn CommandSink>,
    fogger_on: bool,
    fogger_level: IntensityLevel,
    mister_on: bool,
    mister_level: Option<MisterLevel>,
    led_signs_on: bool,
}

impl EffectsPanel {
    pub fn new(sink: Rc<dyn CommandSink>) -> Self {
        Self {
            sink,
            fogger_on: false,
            fogger_level: 0,
            mister_on: false,
            mister_level: None,
            led_signs_on: false,
        }
    }

    pub fn fogger_on(&self) -> bool {
        self.fogger_on
    }

    pub fn fogger_level(&self) -> IntensityLevel {
        self.fogger_level
    }

    pub fn mister_on(&self) -> bool {
        self.mister_on
    }

    pub fn mister_level(&self) -> Option<MisterLevel> {
        self.mister_level
    }

    pub fn led_signs_on(&self) -> bool {
        self.led_signs_on
    }

    pub fn toggle_fogger(&mut self) {
        self.fogger_on = !self.fogger_on;
        info!("[FX] Fogger toggled: {}", if self.fogger_on { "ON" } else { "OFF" });
        if self.fogger_on {
            self.send(ControlCommand::FoggerOn);
        } else {
            self.send(ControlCommand::FoggerOff);
            self.fogger_level = 0;
        }
    }

    /// Picking a level implicitly switches the fogger on. Level 0 is ignored;
    /// the toggle is the only way off.
    pub fn set_fogger_level(&mut self, level: IntensityLevel) {
        if level == 0 {
            return;
        }
        let level = level.min(TABLE_MAX_LEVEL);
        info!("[FX] Fogger level set to {}", level);
        self.fogger_level = level;
        if !self.fogger_on {
            self.fogger_on = true;
            self.send(ControlCommand::FoggerOn);
        }
        self.send(ControlCommand::FoggerLevel(WIRE_VALUES[level as usize]));
    }

    pub fn set_mister(&mut self, on: bool) {
        info!("[FX] Mister state changed: is_on={}", on);
        self.mister_on = on;
        if !on {
            self.mister_level = None;
        }
        self.send(if on {
            ControlCommand::MisterOn
        } else {
            ControlCommand::MisterOff
        });
    }

    /// Ignored while the misters are off.
    pub fn set_mister_level(&mut self, level: MisterLevel) {
        if !self.mister_on {
            debug!("[FX] Misters are off, ignoring level {}", level.label());
            return;
        }
        info!("[FX] Mister level: {}", level.label());
        self.mister_level = Some(level);
        self.send(ControlCommand::Mister(level));
    }

    pub fn set_led_signs(&mut self, on: bool) {
        info!("[FX] LED Signs: {}", if on { "ON" } else { "OFF" });
        self.led_signs_on = on;
        self.send(if on {
            ControlCommand::LedSignsOn
        } else {
            ControlCommand::LedSignsOff
        });
    }

    fn send(&self, command: ControlCommand) {
        let wire = command.wire();
        if let Err(e) = self.sink.transmit(&wire) {
            warn!("[FX] {}", e);
        }
    }
}
