use crate::command::{ControlCommand, QlabCue, SceneCue, SceneSlot, MIC_MAX_LEVEL};
use crate::sink::CommandSink;
use crate::timer::DelayQueue;
use log::{debug, info, warn};
use rand::Rng;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;
use std::time::{Duration, Instant};

/// How long "<scene> Stopped" stays on screen.
pub const STOP_CONFIRMATION: Duration = Duration::from_secs(2);

/// Number of lights-only programs the controller picks from.
pub const LIGHTS_ONLY_PROGRAMS: u8 = 4;

/// Show scenes. Fogger and lights cues go to the lighting controller, sound
/// cues go to QLab.
pub struct ScenePanel {
    lights: Rc<dyn CommandSink>,
    cues: Rc<dyn CommandSink>,
    running: BTreeMap<SceneSlot, SceneCue>,
    stopped: BTreeMap<SceneSlot, SceneCue>,
    confirmations: DelayQueue<SceneSlot>,
    mics: BTreeSet<SceneSlot>,
    mic_levels: BTreeMap<SceneSlot, u8>,
    lights_only: bool,
}

impl ScenePanel {
    pub fn new(lights: Rc<dyn CommandSink>, cues: Rc<dyn CommandSink>) -> Self {
        Self {
            lights,
            cues,
            running: BTreeMap::new(),
            stopped: BTreeMap::new(),
            confirmations: DelayQueue::new(),
            mics: BTreeSet::new(),
            mic_levels: BTreeMap::new(),
            lights_only: false,
        }
    }

    pub fn running(&self, slot: SceneSlot) -> Option<SceneCue> {
        self.running.get(&slot).copied()
    }

    /// Text shown for a short while after a scene in `slot` stopped.
    pub fn confirmation(&self, slot: SceneSlot) -> Option<String> {
        if !self.confirmations.is_pending(&slot) {
            return None;
        }
        self.stopped
            .get(&slot)
            .map(|cue| format!("{} Stopped", cue.name()))
    }

    pub fn lights_only(&self) -> bool {
        self.lights_only
    }

    pub fn mic_on(&self, slot: SceneSlot) -> bool {
        self.mics.contains(&slot)
    }

    pub fn mic_level(&self, slot: SceneSlot) -> u8 {
        self.mic_levels.get(&slot).copied().unwrap_or(0)
    }

    pub fn start_scene(&mut self, cue: SceneCue) {
        let slot = cue.slot();
        info!("[SCENE] Scene started: '{}' (Cue: {})", cue.name(), cue.id());
        if let Some(previous) = self.running.insert(slot, cue) {
            debug!("[SCENE] '{}' replaced by '{}'", previous.name(), cue.name());
        }
        if self.confirmations.cancel(&slot) {
            self.stopped.remove(&slot);
        }

        self.send_light(ControlCommand::SceneFoggerStart(cue));
        self.send_cue(QlabCue::Scene(cue));
    }

    /// Stop the running abduction. Classical and party abductions also switch
    /// their show lights off.
    pub fn stop_abduction(&mut self, now: Instant) -> Option<SceneCue> {
        let Some(cue) = self.running.remove(&SceneSlot::Abduction) else {
            debug!("[SCENE] No abduction running");
            return None;
        };
        info!("[SCENE] Abduction scene stopped: '{}'", cue.name());

        match cue {
            SceneCue::ClassicalAbduction => self.send_light(ControlCommand::ClassicalLightsStop),
            SceneCue::PartyAbduction => self.send_light(ControlCommand::PartyLightsStop),
            _ => {}
        }
        self.send_light(ControlCommand::SceneFoggerStop(cue));
        self.confirm_stop(cue, now);
        Some(cue)
    }

    /// Stop the running roaming scene. The fogger stop is only sent while the
    /// foggers are on.
    pub fn stop_roaming(&mut self, fogger_on: bool, now: Instant) -> Option<SceneCue> {
        let Some(cue) = self.running.remove(&SceneSlot::Roaming) else {
            debug!("[SCENE] No roaming scene running");
            return None;
        };
        info!("[SCENE] Roaming scene stopped: '{}'", cue.name());

        if fogger_on {
            self.send_light(ControlCommand::SceneFoggerStop(cue));
        } else {
            debug!("[SCENE] Foggers off, no fogger stop for {}", cue.id());
        }
        self.confirm_stop(cue, now);
        Some(cue)
    }

    fn confirm_stop(&mut self, cue: SceneCue, now: Instant) {
        self.stopped.insert(cue.slot(), cue);
        self.confirmations.schedule(cue.slot(), STOP_CONFIRMATION, now);
    }

    /// Clear confirmations whose time is up.
    pub fn tick(&mut self, now: Instant) {
        for slot in self.confirmations.poll(now) {
            self.stopped.remove(&slot);
        }
    }

    pub fn next_deadline(&self, now: Instant) -> Option<Duration> {
        self.confirmations.next_deadline(now)
    }

    pub fn set_lights_only(&mut self, on: bool) {
        self.set_lights_only_with(on, &mut rand::thread_rng());
    }

    /// Switching on picks one of the lights-only programs at random.
    pub fn set_lights_only_with<R: Rng>(&mut self, on: bool, rng: &mut R) {
        info!("[SCENE] Lights Only toggled: {}", if on { "ON" } else { "OFF" });
        self.lights_only = on;
        let command = if on {
            ControlCommand::LightsOnlyStart(rng.gen_range(1..=LIGHTS_ONLY_PROGRAMS))
        } else {
            ControlCommand::LightsOnlyStop
        };
        self.send_light(command);
    }

    pub fn emergency_stop(&self) {
        info!("[SCENE] Emergency stop");
        self.send_cue(QlabCue::EmergencyStop);
    }

    pub fn set_mic(&mut self, slot: SceneSlot, on: bool) {
        info!("[SCENE] {} Mic toggled: {}", slot.label(), if on { "ON" } else { "OFF" });
        if on {
            self.mics.insert(slot);
        } else {
            self.mics.remove(&slot);
        }
        self.send_cue(QlabCue::Mic(slot, on));
    }

    /// The mic slider is inactive while its mic is off.
    pub fn set_mic_level(&mut self, slot: SceneSlot, level: u8) {
        if !self.mic_on(slot) {
            debug!("[SCENE] {} mic is off, ignoring level {}", slot.label(), level);
            return;
        }
        let level = level.min(MIC_MAX_LEVEL);
        info!("[SCENE] {} Mic slider changed to: {}", slot.label(), level);
        self.mic_levels.insert(slot, level);
        self.send_cue(QlabCue::MicLevel(slot, level));
    }

    fn send_light(&self, command: ControlCommand) {
        let wire = command.wire();
        if let Err(e) = self.lights.transmit(&wire) {
            warn!("[SCENE] {}", e);
        }
    }

    fn send_cue(&self, cue: QlabCue) {
        let address = cue.address();
        if let Err(e) = self.cues.transmit(&address) {
            warn!("[SCENE] {}", e);
        }
    }
}
