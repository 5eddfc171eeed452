use crate::config::PanelConfig;
use crate::controller::LightGroupController;
use crate::model::{ColorCode, GroupEvent, GroupId, IntensityLevel, ZoneId};
use crate::sink::CommandSink;
use crate::timer::DelayQueue;
use crate::zone::{GroupTable, ZoneAggregator};
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorSelection {
    Applied,
    /// A previous selection on this group is still inside its debounce window.
    Debounced,
    /// Unknown group, or a group with a fixed colour.
    Rejected,
}

/// Owns every light group and zone for the lifetime of the panel.
///
/// Input events enter here, are applied to the controllers, and the resulting
/// member-changed events are drained into the zones before the call returns,
/// so every zone is settled between two user actions.
pub struct LightRegistry {
    groups: GroupTable,
    order: Vec<GroupId>,
    zones: BTreeMap<ZoneId, ZoneAggregator>,
    events: Receiver<GroupEvent>,
    color_gate: DelayQueue<GroupId>,
}

impl LightRegistry {
    pub fn new(config: &PanelConfig, sink: Rc<dyn CommandSink>) -> Self {
        let (tx, rx) = mpsc::channel();

        let zones: BTreeMap<ZoneId, ZoneAggregator> = config
            .zones
            .iter()
            .map(|zone| (zone.id, ZoneAggregator::new(zone)))
            .collect();

        let mut groups = GroupTable::new();
        let mut order = Vec::with_capacity(config.groups.len());
        for group_config in &config.groups {
            if groups.contains_key(&group_config.id) {
                warn!("[LIGHTS] Duplicate group id {}, skipping {}", group_config.id, group_config.name);
                continue;
            }
            let mut controller = LightGroupController::new(group_config, sink.clone());
            controller.attach(tx.clone());
            groups.insert(group_config.id, controller);
            order.push(group_config.id);
        }

        let mut registry = Self {
            groups,
            order,
            zones,
            events: rx,
            color_gate: DelayQueue::new(),
        };
        registry.register_members();
        info!(
            "[LIGHTS] {} light groups in {} zones",
            registry.groups.len(),
            registry.zones.len()
        );
        registry
    }

    fn register_members(&mut self) {
        for id in &self.order {
            let Some(zone_id) = self.groups.get(id).and_then(|g| g.zone()) else {
                continue;
            };
            match self.zones.get_mut(&zone_id) {
                Some(zone) => match zone.register_member(*id, &self.groups) {
                    Ok(master) => debug!("[ZONE] {} seeded at {}", zone.name(), master),
                    Err(e) => warn!("[ZONE] {}", e),
                },
                None => warn!("[ZONE] Group {} names zone {} which is not configured", id, zone_id),
            }
        }
        // Zones nobody registered with still need to show their empty aggregate.
        for zone in self.zones.values_mut() {
            zone.on_member_changed(&self.groups);
        }
    }

    pub fn group(&self, id: GroupId) -> Option<&LightGroupController> {
        self.groups.get(&id)
    }

    /// Groups in configuration order.
    pub fn groups(&self) -> impl Iterator<Item = &LightGroupController> + '_ {
        self.order.iter().filter_map(|id| self.groups.get(id))
    }

    pub fn zone(&self, id: ZoneId) -> Option<&ZoneAggregator> {
        self.zones.get(&id)
    }

    pub fn zones(&self) -> impl Iterator<Item = &ZoneAggregator> + '_ {
        self.zones.values()
    }

    fn group_mut(&mut self, id: GroupId) -> Option<&mut LightGroupController> {
        let group = self.groups.get_mut(&id);
        if group.is_none() {
            warn!("[LIGHTS] unknown light group {}", id);
        }
        group
    }

    pub fn slider_released(&mut self, id: GroupId, value: i32) -> bool {
        let changed = match self.group_mut(id) {
            Some(group) => group.on_slider_released(value),
            None => return false,
        };
        self.pump_events();
        changed
    }

    /// Programmatic set, routed like a slider release but without the lock.
    #[cfg(test)]
    pub fn set_intensity(&mut self, id: GroupId, value: i32) -> bool {
        let changed = match self.group_mut(id) {
            Some(group) => group.set_intensity(value),
            None => return false,
        };
        self.pump_events();
        changed
    }

    /// Accept at most one colour change per group per debounce window.
    pub fn select_color(&mut self, id: GroupId, color: ColorCode, now: Instant) -> ColorSelection {
        if self.color_gate.is_pending(&id) {
            debug!("[LIGHTS] group {} color input still disabled", id);
            return ColorSelection::Debounced;
        }
        let Some(group) = self.group_mut(id) else {
            return ColorSelection::Rejected;
        };
        if !group.select_color(color) {
            return ColorSelection::Rejected;
        }
        let window = group.debounce_window();
        self.color_gate.schedule(id, window, now);
        ColorSelection::Applied
    }

    pub fn color_input_enabled(&self, id: GroupId) -> bool {
        !self.color_gate.is_pending(&id)
    }

    /// Re-enable colour input for every group whose window has elapsed.
    pub fn tick(&mut self, now: Instant) -> Vec<GroupId> {
        let expired = self.color_gate.poll(now);
        for id in &expired {
            debug!("[LIGHTS] group {} color input re-enabled", id);
        }
        expired
    }

    pub fn next_deadline(&self, now: Instant) -> Option<Duration> {
        self.color_gate.next_deadline(now)
    }

    /// Returns the settled master value, or `None` for an unconfigured zone.
    pub fn master_released(&mut self, zone: ZoneId, value: i32) -> Option<IntensityLevel> {
        let Some(aggregator) = self.zones.get_mut(&zone) else {
            warn!("[ZONE] master released on unconfigured zone {}", zone);
            return None;
        };
        aggregator.on_master_slider_released(value, &mut self.groups);
        self.pump_events();
        self.zones.get(&zone).map(|z| z.displayed_master())
    }

    /// Forward queued member-changed events to their zones.
    fn pump_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            match event {
                GroupEvent::MemberChanged { group, zone } => match self.zones.get_mut(&zone) {
                    Some(aggregator) => {
                        if let Err(e) = aggregator.handle_member_event(group, &self.groups) {
                            warn!("[ZONE] {}", e);
                        }
                    }
                    None => warn!("[ZONE] group {} reported to unconfigured zone {}", group, zone),
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GroupConfig, ZoneConfig};
    use crate::model::LockState;
    use crate::sink::testing::RecordingSink;

    const RING_GROUP_2: GroupId = 2;
    const UFO_BEAM: GroupId = 6;
    const TOP_RING_INSIDE: GroupId = 9;
    const LED_SIGNS: GroupId = 12;

    fn create_test_registry() -> (LightRegistry, Rc<RecordingSink>) {
        let sink = Rc::new(RecordingSink::default());
        let registry = LightRegistry::new(&PanelConfig::default(), sink.clone());
        (registry, sink)
    }

    fn exterior_levels(registry: &LightRegistry) -> Vec<IntensityLevel> {
        registry
            .groups()
            .filter(|g| g.zone() == Some(ZoneId::Exterior))
            .map(|g| g.current_intensity())
            .collect()
    }

    #[test]
    fn test_startup_seeds_masters_without_sending() {
        let (registry, sink) = create_test_registry();

        assert_eq!(registry.groups().count(), 12);
        assert_eq!(registry.zone(ZoneId::Exterior).unwrap().displayed_master(), 3);
        assert_eq!(registry.zone(ZoneId::Interior).unwrap().displayed_master(), 3);
        assert_eq!(registry.group(UFO_BEAM).unwrap().current_intensity(), 0);
        assert!(sink.sent().is_empty());
    }

    #[test]
    fn test_group_release_updates_master() {
        let (mut registry, sink) = create_test_registry();

        assert!(registry.slider_released(RING_GROUP_2, 5));
        assert_eq!(sink.sent(), vec!["LZ2W10"]);
        let exterior = registry.zone(ZoneId::Exterior).unwrap();
        assert_eq!(exterior.displayed_master(), 5);
        assert_eq!(exterior.previous_master(), 5);
        assert_eq!(
            registry.zone(ZoneId::Interior).unwrap().displayed_master(),
            3,
            "Other zone untouched"
        );
    }

    #[test]
    fn test_repeated_set_sends_once() {
        let (mut registry, sink) = create_test_registry();

        assert!(registry.set_intensity(TOP_RING_INSIDE, 4));
        assert!(!registry.set_intensity(TOP_RING_INSIDE, 4));
        assert_eq!(sink.sent(), vec!["IZ1W8"]);
    }

    #[test]
    fn test_master_drop_uses_bottom_up_baseline() {
        let (mut registry, _sink) = create_test_registry();
        registry.slider_released(RING_GROUP_2, 5);

        // Baseline is 5 now, so releasing at 3 is a delta of -2 for everyone.
        let settled = registry.master_released(ZoneId::Exterior, 3).unwrap();
        assert_eq!(exterior_levels(&registry), vec![1, 3, 1, 1, 1, 0, 1, 1]);
        assert_eq!(settled, 3);
    }

    #[test]
    fn test_exterior_bank_goes_dark_together() {
        let (mut registry, _sink) = create_test_registry();

        registry.master_released(ZoneId::Exterior, 1);
        assert_eq!(exterior_levels(&registry), vec![1, 1, 1, 1, 1, 0, 1, 1]);

        registry.master_released(ZoneId::Exterior, 0);
        assert_eq!(exterior_levels(&registry), vec![0; 8]);
        assert_eq!(registry.zone(ZoneId::Exterior).unwrap().displayed_master(), 0);
        assert!(registry
            .groups()
            .filter(|g| g.zone() == Some(ZoneId::Exterior))
            .all(|g| g.lock_state() == LockState::Normal));

        registry.master_released(ZoneId::Exterior, 2);
        assert_eq!(exterior_levels(&registry), vec![2; 8]);
    }

    #[test]
    fn test_locked_group_survives_master_moves() {
        let (mut registry, sink) = create_test_registry();
        registry.slider_released(RING_GROUP_2, 0);
        sink.clear();

        registry.master_released(ZoneId::Exterior, 5);
        assert_eq!(registry.group(RING_GROUP_2).unwrap().current_intensity(), 0);
        assert_eq!(registry.group(RING_GROUP_2).unwrap().lock_state(), LockState::LockedAtZero);
        assert!(!sink.sent().iter().any(|c| c.starts_with("LZ2")));

        registry.slider_released(RING_GROUP_2, 2);
        assert_eq!(registry.group(RING_GROUP_2).unwrap().lock_state(), LockState::Normal);
    }

    #[test]
    fn test_zoneless_group_does_not_move_masters() {
        let (mut registry, sink) = create_test_registry();

        registry.slider_released(LED_SIGNS, 5);
        assert_eq!(sink.sent(), vec!["LEDW10"]);
        assert_eq!(registry.zone(ZoneId::Exterior).unwrap().displayed_master(), 3);
        assert_eq!(registry.zone(ZoneId::Interior).unwrap().displayed_master(), 3);
    }

    #[test]
    fn test_color_debounce_window() {
        let (mut registry, sink) = create_test_registry();
        let start = Instant::now();

        assert_eq!(
            registry.select_color(RING_GROUP_2, ColorCode::Blue, start),
            ColorSelection::Applied
        );
        assert!(!registry.color_input_enabled(RING_GROUP_2));
        assert_eq!(
            registry.select_color(RING_GROUP_2, ColorCode::Red, start + Duration::from_millis(400)),
            ColorSelection::Debounced
        );
        assert!(registry.color_input_enabled(LED_SIGNS), "Windows are per group");

        assert!(registry.tick(start + Duration::from_millis(999)).is_empty());
        assert_eq!(registry.tick(start + Duration::from_millis(1000)), vec![RING_GROUP_2]);
        assert_eq!(
            registry.select_color(RING_GROUP_2, ColorCode::Red, start + Duration::from_millis(1000)),
            ColorSelection::Applied
        );
        assert_eq!(sink.sent(), vec!["LZ2B6", "LZ2R6"]);
    }

    #[test]
    fn test_single_button_page_uses_short_window() {
        let (mut registry, _sink) = create_test_registry();
        let start = Instant::now();

        registry.select_color(LED_SIGNS, ColorCode::Green, start);
        assert_eq!(registry.next_deadline(start), Some(Duration::from_millis(500)));
        assert_eq!(registry.tick(start + Duration::from_millis(500)), vec![LED_SIGNS]);
    }

    #[test]
    fn test_fixed_color_and_unknown_groups_rejected() {
        let (mut registry, sink) = create_test_registry();
        let now = Instant::now();

        assert_eq!(
            registry.select_color(UFO_BEAM, ColorCode::Red, now),
            ColorSelection::Rejected
        );
        assert!(registry.color_input_enabled(UFO_BEAM));
        assert_eq!(registry.select_color(404, ColorCode::Red, now), ColorSelection::Rejected);
        assert!(!registry.slider_released(404, 3));
        assert_eq!(registry.master_released(ZoneId::Interior, 9), Some(5));
        assert!(sink.sent().iter().all(|c| c.starts_with("IZ")));
    }

    #[test]
    fn test_group_in_unconfigured_zone_still_works() {
        let sink = Rc::new(RecordingSink::default());
        let config = PanelConfig {
            zones: vec![ZoneConfig {
                id: ZoneId::Exterior,
                name: "Exterior Lights".to_string(),
                master_max: 5,
                initial_master: 3,
            }],
            groups: vec![GroupConfig {
                id: 1,
                name: "Lobby".to_string(),
                prefix: "IZ9".to_string(),
                zone: Some(ZoneId::Interior),
                max_intensity: 5,
                color: ColorCode::White,
                intensity: 2,
                color_selectable: true,
                debounce_ms: 1000,
            }],
            ..PanelConfig::default()
        };
        let mut registry = LightRegistry::new(&config, sink.clone());

        assert!(registry.slider_released(1, 4));
        assert_eq!(sink.sent(), vec!["IZ9W8"]);
        assert_eq!(registry.zone(ZoneId::Exterior).unwrap().displayed_master(), 0);
        assert_eq!(registry.master_released(ZoneId::Interior, 1), None);
    }
}
