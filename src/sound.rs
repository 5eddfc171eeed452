use crate::command::{QlabCue, AUX_MAX_LEVEL, TABLE_MAX_LEVEL};
use crate::model::IntensityLevel;
use crate::sink::CommandSink;
use log::{debug, info, warn};
use std::rc::Rc;

/// Background sound (aux) and PA mic, both played out by QLab. Each slider is
/// only live while its channel is switched on.
pub struct SoundPanel {
    cues: Rc<dyn CommandSink>,
    sound_on: bool,
    aux_level: u8,
    pa_on: bool,
    pa_level: IntensityLevel,
}

impl SoundPanel {
    pub fn new(cues: Rc<dyn CommandSink>) -> Self {
        Self {
            cues,
            sound_on: false,
            aux_level: 0,
            pa_on: false,
            pa_level: 0,
        }
    }

    pub fn sound_on(&self) -> bool {
        self.sound_on
    }

    pub fn aux_level(&self) -> u8 {
        self.aux_level
    }

    pub fn pa_on(&self) -> bool {
        self.pa_on
    }

    pub fn pa_level(&self) -> IntensityLevel {
        self.pa_level
    }

    /// Switching off also drops the slider back to 0.
    pub fn set_sound(&mut self, on: bool) {
        info!("[SOUND] Sound: {}", if on { "ON" } else { "OFF" });
        self.sound_on = on;
        if !on {
            self.aux_level = 0;
        }
        self.send(QlabCue::Sound(on));
    }

    pub fn set_aux_level(&mut self, level: u8) {
        if !self.sound_on {
            debug!("[SOUND] Sound is off, ignoring aux level {}", level);
            return;
        }
        self.aux_level = level.min(AUX_MAX_LEVEL);
        info!("[SOUND] Slider 'Aux' changed to value: {}", self.aux_level);
        self.send(QlabCue::AuxLevel(self.aux_level));
    }

    pub fn set_pa(&mut self, on: bool) {
        info!("[SOUND] PA: {}", if on { "ON" } else { "OFF" });
        self.pa_on = on;
        if !on {
            self.pa_level = 0;
        }
        self.send(QlabCue::Pa(on));
    }

    pub fn set_pa_level(&mut self, level: IntensityLevel) {
        if !self.pa_on {
            debug!("[SOUND] PA is off, ignoring level {}", level);
            return;
        }
        self.pa_level = level.min(TABLE_MAX_LEVEL);
        info!("[SOUND] Slider 'PA' changed to value: {}", self.pa_level);
        self.send(QlabCue::PaLevel(self.pa_level));
    }

    fn send(&self, cue: QlabCue) {
        let address = cue.address();
        if let Err(e) = self.cues.transmit(&address) {
            warn!("[SOUND] {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::testing::RecordingSink;

    fn create_test_panel() -> (SoundPanel, Rc<RecordingSink>) {
        let cues = Rc::new(RecordingSink::default());
        (SoundPanel::new(cues.clone()), cues)
    }

    #[test]
    fn test_aux_needs_sound_on() {
        let (mut sound, cues) = create_test_panel();

        sound.set_aux_level(50);
        assert!(cues.sent().is_empty());
        assert_eq!(sound.aux_level(), 0);

        sound.set_sound(true);
        sound.set_aux_level(50);
        sound.set_aux_level(100);
        assert_eq!(cues.sent(), vec!["/cue/AUXON/go", "/cue/AUX12/go", "/cue/AUX24/go"]);

        sound.set_sound(false);
        assert_eq!(sound.aux_level(), 0, "Switching off resets the slider");
        assert_eq!(cues.sent().last().map(String::as_str), Some("/cue/AUXOFF/go"));
    }

    #[test]
    fn test_pa_level_uses_wire_values() {
        let (mut sound, cues) = create_test_panel();

        sound.set_pa(true);
        sound.set_pa_level(3);
        sound.set_pa_level(9);
        sound.set_pa(false);
        sound.set_pa_level(2);

        assert_eq!(
            cues.sent(),
            vec!["/cue/MICON/go", "/cue/MIC6/go", "/cue/MIC10/go", "/cue/MICOFF/go"]
        );
        assert_eq!(sound.pa_level(), 0);
        assert!(!sound.pa_on());
    }
}
