use crate::config::ZoneConfig;
use crate::controller::LightGroupController;
use crate::error::ControlError;
use crate::model::{GroupId, IntensityLevel, ZoneId};
use log::{debug, info};
use std::collections::{BTreeMap, BTreeSet};

/// Every controller in the panel, keyed by id.
pub type GroupTable = BTreeMap<GroupId, LightGroupController>;

/// Keeps a zone's master slider and its member groups consistent.
///
/// Bottom-up, the master shows the brightest member. Top-down, a master move is
/// turned into a delta against the last settled master value and handed to
/// every member.
pub struct ZoneAggregator {
    id: ZoneId,
    name: String,
    members: BTreeSet<GroupId>,
    master_max: IntensityLevel,
    previous_master: IntensityLevel,
    displayed: IntensityLevel,
}

impl ZoneAggregator {
    pub fn new(config: &ZoneConfig) -> Self {
        let initial = config.initial_master.min(config.master_max);
        Self {
            id: config.id,
            name: config.name.clone(),
            members: BTreeSet::new(),
            master_max: config.master_max,
            previous_master: initial,
            displayed: initial,
        }
    }

    pub fn id(&self) -> ZoneId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn master_max(&self) -> IntensityLevel {
        self.master_max
    }

    /// Value currently shown on the master slider.
    pub fn displayed_master(&self) -> IntensityLevel {
        self.displayed
    }

    /// Baseline the next master delta is computed against.
    #[cfg(test)]
    pub fn previous_master(&self) -> IntensityLevel {
        self.previous_master
    }

    pub fn contains(&self, group: GroupId) -> bool {
        self.members.contains(&group)
    }

    /// Add a member and reseed the master from the full member set.
    pub fn register_member(
        &mut self,
        group: GroupId,
        groups: &GroupTable,
    ) -> Result<IntensityLevel, ControlError> {
        let controller = groups.get(&group).ok_or(ControlError::UnknownGroup(group))?;
        if controller.zone() != Some(self.id) {
            return Err(ControlError::UnregisteredGroup { group, zone: self.id });
        }

        self.members.insert(group);
        debug!("[ZONE] {} registered {}", self.name, controller.name());
        Ok(self.on_member_changed(groups))
    }

    /// Recompute the aggregate after a member changed and make it the new baseline.
    pub fn on_member_changed(&mut self, groups: &GroupTable) -> IntensityLevel {
        if self.members.is_empty() {
            debug!("[ZONE] {} has no members, aggregate is 0", self.name);
        }

        let aggregate = self
            .members
            .iter()
            .filter_map(|id| groups.get(id))
            .map(|member| member.current_intensity())
            .max()
            .unwrap_or(0)
            .min(self.master_max);

        if aggregate != self.displayed {
            debug!("[ZONE] {} master now {}", self.name, aggregate);
        }
        self.displayed = aggregate;
        self.previous_master = aggregate;
        aggregate
    }

    /// Like [`Self::on_member_changed`], but only for a group that belongs here.
    pub fn handle_member_event(
        &mut self,
        group: GroupId,
        groups: &GroupTable,
    ) -> Result<IntensityLevel, ControlError> {
        if !self.contains(group) {
            return Err(ControlError::UnregisteredGroup { group, zone: self.id });
        }
        Ok(self.on_member_changed(groups))
    }

    /// The user let go of the master slider at `new_value`.
    ///
    /// Returns the settled master value, which can differ from `new_value` when
    /// members are locked, pinned or clamped.
    pub fn on_master_slider_released(
        &mut self,
        new_value: i32,
        groups: &mut GroupTable,
    ) -> IntensityLevel {
        let new_value = new_value.clamp(0, self.master_max as i32);
        let delta = new_value - self.previous_master as i32;
        self.previous_master = new_value as IntensityLevel;
        self.displayed = new_value as IntensityLevel;

        let synced = self
            .members
            .iter()
            .filter_map(|id| groups.get(id))
            .all(|member| matches!(member.current_intensity(), 0 | 1));

        info!(
            "[ZONE] {} master released at {} (delta {}, synced {})",
            self.name, new_value, delta, synced
        );

        if delta != 0 {
            for id in &self.members {
                if let Some(member) = groups.get_mut(id) {
                    member.adjust_by_delta(delta, synced);
                }
            }
        }

        self.on_member_changed(groups)
    }
}
