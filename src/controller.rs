use crate::command::compose_message;
use crate::config::GroupConfig;
use crate::model::{ColorCode, GroupEvent, GroupId, IntensityLevel, LockState, ZoneId};
use crate::sink::CommandSink;
use log::{debug, error, info, warn};
use std::rc::Rc;
use std::sync::mpsc::Sender;
use std::time::Duration;

/// State and command emission for one physical light group.
///
/// Every intensity change is encoded and sent through the shared sink, then
/// announced on the zone channel so the owning zone can recompute its master.
pub struct LightGroupController {
    id: GroupId,
    name: String,
    prefix: String,
    zone: Option<ZoneId>,
    max_intensity: IntensityLevel,
    color: ColorCode,
    intensity: IntensityLevel,
    lock: LockState,
    color_selectable: bool,
    debounce: Duration,
    sink: Rc<dyn CommandSink>,
    events: Option<Sender<GroupEvent>>,
}

impl LightGroupController {
    pub fn new(config: &GroupConfig, sink: Rc<dyn CommandSink>) -> Self {
        Self {
            id: config.id,
            name: config.name.clone(),
            prefix: config.prefix.clone(),
            zone: config.zone,
            max_intensity: config.max_intensity,
            color: config.color,
            intensity: config.intensity.min(config.max_intensity),
            lock: LockState::Normal,
            color_selectable: config.color_selectable,
            debounce: Duration::from_millis(config.debounce_ms),
            sink,
            events: None,
        }
    }

    /// Connect the controller to the channel its zone listens on.
    pub fn attach(&mut self, events: Sender<GroupEvent>) {
        self.events = Some(events);
    }

    pub fn id(&self) -> GroupId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn zone(&self) -> Option<ZoneId> {
        self.zone
    }

    pub fn max_intensity(&self) -> IntensityLevel {
        self.max_intensity
    }

    pub fn color(&self) -> ColorCode {
        self.color
    }

    pub fn lock_state(&self) -> LockState {
        self.lock
    }

    pub fn is_color_selectable(&self) -> bool {
        self.color_selectable
    }

    pub fn debounce_window(&self) -> Duration {
        self.debounce
    }

    pub fn current_intensity(&self) -> IntensityLevel {
        self.intensity
    }

    /// Clamp and apply a new level. Returns false when the level did not change,
    /// in which case nothing is sent.
    pub fn set_intensity(&mut self, value: i32) -> bool {
        let clamped = value.clamp(0, self.max_intensity as i32) as IntensityLevel;
        if clamped == self.intensity {
            debug!("[LIGHTS] {} already at {}, nothing to send", self.name, clamped);
            return false;
        }

        info!("[LIGHTS] {} intensity set to {}", self.name, clamped);
        self.intensity = clamped;
        if clamped != 0 && self.lock == LockState::LockedAtZero {
            info!("[LIGHTS] {} unlocked", self.name);
            self.lock = LockState::Normal;
        }

        self.transmit();
        self.notify_zone();
        true
    }

    /// The user let go of this group's slider. Releasing at 0 parks the group
    /// so master moves leave it alone.
    pub fn on_slider_released(&mut self, value: i32) -> bool {
        info!("[LIGHTS] {} slider released at value: {}", self.name, value);
        let changed = self.set_intensity(value);

        match (self.intensity, self.lock) {
            (0, LockState::Normal) => {
                info!("[LIGHTS] {} locked at zero", self.name);
                self.lock = LockState::LockedAtZero;
            }
            (level, LockState::LockedAtZero) if level != 0 => {
                self.lock = LockState::Normal;
            }
            _ => {}
        }
        changed
    }

    /// Switch colour and resend the current level under it. Rate limiting of
    /// repeated taps is done by the caller using [`Self::debounce_window`].
    pub fn select_color(&mut self, color: ColorCode) -> bool {
        if !self.color_selectable {
            warn!("[LIGHTS] {} has a fixed color, ignoring {}", self.name, color);
            return false;
        }
        info!("[LIGHTS] {} color selected: {} (Code: {})", self.name, color, color.tag());
        self.color = color;
        self.transmit();
        true
    }

    /// Follow a master slider move.
    ///
    /// A group sitting at 1 stays there on a downward move unless every member
    /// of the zone is already at 0 or 1 (`synced`), so a bank goes dark together.
    pub fn adjust_by_delta(&mut self, delta: i32, synced: bool) -> bool {
        if self.lock == LockState::LockedAtZero {
            debug!("[LIGHTS] {} locked at zero, ignoring master delta {}", self.name, delta);
            return false;
        }

        let current = self.intensity as i32;
        let proposed = current.saturating_add(delta);
        let result = if current == 1 && proposed < 1 {
            if synced {
                0
            } else {
                1
            }
        } else {
            proposed.clamp(0, self.max_intensity as i32)
        };

        if result != current {
            self.set_intensity(result)
        } else {
            false
        }
    }

    fn transmit(&self) {
        let message = match compose_message(&self.prefix, self.color, self.intensity) {
            Ok(message) => message,
            Err(e) => {
                error!("[LIGHTS] {}: {}. Command dropped", self.name, e);
                return;
            }
        };

        info!("[LIGHTS] Sending UDP from {}: {}", self.name, message);
        if let Err(e) = self.sink.transmit(&message) {
            warn!("[LIGHTS] {}: {}", self.name, e);
        }
    }

    fn notify_zone(&self) {
        let (Some(zone), Some(events)) = (self.zone, &self.events) else {
            return;
        };
        let event = GroupEvent::MemberChanged { group: self.id, zone };
        if events.send(event).is_err() {
            debug!("[LIGHTS] {}: zone channel closed", self.name);
        }
    }
}
