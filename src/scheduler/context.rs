use crate::types::{
    Day, EngineConfig, FacultyProfile, LunchMode, Room, RoomId, Section, SectionId, SlotId,
    TeacherId, TimeSlot,
};
use std::collections::{BTreeMap, BTreeSet};

/// Shared read-only inputs for one optimizer run. The mutable schedule state
/// lives elsewhere; everything here is fixed once the run starts.
#[derive(Debug, Clone)]
pub struct Context {
    pub sections: BTreeMap<SectionId, Section>,
    pub rooms: BTreeMap<RoomId, Room>,
    pub slots: BTreeMap<SlotId, TimeSlot>,
    /// Active days in week order
    pub active_days: Vec<Day>,
    pub online_days: BTreeSet<Day>,
    pub faculty: BTreeMap<TeacherId, FacultyProfile>,
    pub compatible: BTreeMap<SectionId, Vec<RoomId>>,
    /// Slots each section needs per week, from its session plan
    pub needed_slots: BTreeMap<SectionId, u32>,
    pub config: EngineConfig,
}

impl Context {
    pub fn slot(&self, id: SlotId) -> &TimeSlot {
        &self.slots[&id]
    }

    pub fn last_slot(&self) -> u32 {
        self.slots.keys().last().map(|s| s.0).unwrap_or(0)
    }

    /// Whether `count` slots starting at `start` stay inside the grid
    pub fn range_fits(&self, start: SlotId, count: u32) -> bool {
        count > 0 && start.0 >= 1 && start.0 + count - 1 <= self.last_slot()
    }

    /// Wall-clock span covered by a slot range
    pub fn range_minutes(&self, start: SlotId, count: u32) -> (u32, u32) {
        let begin = self.slot(start).start_minutes;
        let end = self.slot(SlotId(start.0 + count - 1)).end_minutes();
        (begin, end)
    }

    pub fn range_overlaps_lunch(&self, start: SlotId, count: u32) -> bool {
        let Some((lunch_start, lunch_end)) = self.config.lunch_window() else {
            return false;
        };
        if !self.range_fits(start, count) {
            return false;
        }
        let (begin, end) = self.range_minutes(start, count);
        begin < lunch_end && lunch_start < end
    }

    pub fn is_online_day(&self, day: Day) -> bool {
        self.online_days.contains(&day)
    }

    pub fn is_lunch_strict(&self) -> bool {
        self.config.lunch_mode == LunchMode::Strict
    }

    /// Hard daily teaching cap in minutes, honoring a profile override
    pub fn hard_daily_cap_minutes(&self, teacher: TeacherId) -> u32 {
        self.faculty
            .get(&teacher)
            .and_then(|p| p.max_daily_hours)
            .unwrap_or(self.config.max_teacher_hours_per_day)
            * 60
    }

    pub fn profile(&self, teacher: TeacherId) -> Option<&FacultyProfile> {
        self.faculty.get(&teacher)
    }

    /// Days a teacher may be scheduled on at all
    pub fn teacher_allows_day(&self, teacher: Option<TeacherId>, day: Day) -> bool {
        match teacher.and_then(|t| self.faculty.get(&t)) {
            Some(profile) => profile.allows_day(day),
            None => true,
        }
    }
}
